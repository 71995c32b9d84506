//! All error types for the langtemplate crate.
//!
//! Every variant is fatal to the single parse/compile call that produced it. A value that
//! merely does not look like an ICU plural is not an error: it is extracted as a plain string.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("unknown format `{0}`")]
    UnknownFormat(String),

    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("XML parse error: {0}")]
    XmlParse(#[from] quick_xml::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed nesting, unterminated tags or comments, mismatched closing tags.
    #[error("{message} on line {line}")]
    StructuralSyntax { message: String, line: usize },

    #[error("Duplicate string key ('{key}') in line {line}")]
    DuplicateKey { key: String, line: usize },

    #[error(
        "Invalid format of pluralized entry with key: \"{key}\", serialized translations: \
         \"{serialized}\". Could not parse the string at or near the following chunk: \
         \"{chunk}\". It contains either invalid braces (\"{{\", \"}}\") or invalid characters."
    )]
    InvalidPluralContent {
        key: String,
        serialized: String,
        chunk: String,
    },

    #[error(
        "Invalid plural rule(s): \"{}\" in pluralized entry with key: {key}, value: \"{value}\". \
         Allowed values are: {}",
        .invalid.join(", "),
        .allowed.join(", ")
    )]
    InvalidPluralRules {
        key: String,
        value: String,
        invalid: Vec<String>,
        allowed: Vec<&'static str>,
    },

    /// Two groups of one plural select the same rule, eg `=1` and `one`.
    #[error(
        "Plural rules \"{first}\" and \"{second}\" select the same plural form in pluralized \
         entry with key: {key}, value: \"{value}\""
    )]
    DuplicatePluralRule {
        key: String,
        value: String,
        first: String,
        second: String,
    },

    #[error("invalid plural rule: {0}")]
    Rule(String),

    #[error("validation error: {0}")]
    Validation(String),
}

impl Error {
    /// Creates a structural syntax error for the given 1-based line.
    pub fn syntax(message: impl Into<String>, line: usize) -> Self {
        Error::StructuralSyntax {
            message: message.into(),
            line,
        }
    }

    /// Creates a new validation error
    pub fn validation_error(message: impl Into<String>) -> Self {
        Error::Validation(message.into())
    }

    /// The 1-based line number the error points at, when known.
    pub fn line(&self) -> Option<usize> {
        match self {
            Error::StructuralSyntax { line, .. } | Error::DuplicateKey { line, .. } => Some(*line),
            Error::Parse(e) => Some(e.line()),
            _ => None,
        }
    }
}

/// Returns the 1-based line number of byte offset `position` in `source`.
pub(crate) fn line_of(source: &str, position: usize) -> usize {
    let end = position.min(source.len());
    source.as_bytes()[..end].iter().filter(|&&b| b == b'\n').count() + 1
}
