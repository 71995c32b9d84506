#![forbid(unsafe_code)]
//! Template-based string extraction and compilation for localization files.
//!
//! Parsing a document splits it into a *template*, the document with every translatable
//! string replaced by an opaque placeholder, and a *stringset*, the extracted strings in
//! document order. Compiling writes a (translated) stringset back into the template; units
//! without a string are removed together with the separators they leave behind.
//!
//! # Quick Start
//!
//! ```rust
//! use langtemplate::{FormatType, HandlerOptions, OpenString};
//!
//! let handler = FormatType::KeyValueJson.handler(HandlerOptions::default());
//! let (template, stringset) = handler.parse(r#"{"title": "Hello", "body": "World"}"#)?;
//! assert_eq!(stringset.len(), 2);
//!
//! let translated = vec![OpenString::new("title", "Bonjour").with_order(0)];
//! assert_eq!(handler.compile(&template, &translated)?, r#"{"title": "Bonjour"}"#);
//! # Ok::<(), langtemplate::Error>(())
//! ```
//!
//! # Supported Formats
//!
//! - **Key-value JSON**: nested objects and arrays, ICU plurals in values
//! - **Chrome `messages.json`**: `message` values with their `description`
//! - **Android `strings.xml`**: strings, string arrays and plurals
//! - **HTML**: the content of configurable elements
//! - **Apple `.stringsdict`**: plural rules of every format variable

pub mod compiler;
pub mod error;
pub mod formats;
pub mod icu;
pub mod options;
pub mod plural_rules;
pub mod scanner;
pub mod strings;
pub mod traits;
pub mod transcriber;

// Re-export most used types for easy consumption
pub use crate::{
    compiler::{Cleanup, ParseState, StringCursor, Substitution, TemplateWalker},
    error::Error,
    formats::{FormatType, infer_format_from_extension},
    icu::{IcuCompiler, IcuParser, IcuString},
    options::HandlerOptions,
    plural_rules::{PluralRule, PluralValidationReport, collect_plural_issues, validate_plurals},
    strings::{OpenString, StringValue},
    traits::{Handler, Parsed},
    transcriber::{NewlineType, SourceText, Transcriber},
};
