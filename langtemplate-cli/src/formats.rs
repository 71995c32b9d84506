use std::str::FromStr;

use langtemplate::{FormatType, HandlerOptions, NewlineType, infer_format_from_extension};

/// Line endings accepted by `--newline`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum NewlineArg {
    /// `\n`
    Unix,
    /// `\r\n`
    Dos,
}

impl From<NewlineArg> for NewlineType {
    fn from(arg: NewlineArg) -> Self {
        match arg {
            NewlineArg::Unix => NewlineType::Unix,
            NewlineArg::Dos => NewlineType::Dos,
        }
    }
}

/// Handler flags shared by the `parse`, `compile` and `view` commands.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct HandlerArgs {
    /// Document format (json, chrome, android, html, stringsdict); inferred from the file name when omitted
    #[arg(short, long)]
    pub format: Option<String>,

    /// Extract values selecting `=0`, `=1` or `=2` as plain strings instead of plurals
    #[arg(long)]
    pub no_numeric_plurals: bool,

    /// HTML element whose content is translatable; repeat for several tags
    #[arg(long = "tag", value_name = "TAG")]
    pub tags: Vec<String>,

    /// Line endings of the written document; defaults to the input's
    #[arg(long, value_enum)]
    pub newline: Option<NewlineArg>,
}

impl HandlerArgs {
    /// Builds the handler options these flags describe.
    pub fn options(&self) -> HandlerOptions {
        let mut options = HandlerOptions::new()
            .with_numeric_plural_values(!self.no_numeric_plurals)
            .with_newline_type(self.newline.map(NewlineType::from));
        if !self.tags.is_empty() {
            options = options.with_translatable_tags(self.tags.iter().cloned());
        }
        options
    }

    /// Resolves the document format from `--format`, falling back to `path`.
    pub fn resolve_format(&self, path: &str) -> Result<FormatType, String> {
        resolve_format(self.format.as_deref(), path)
    }
}

/// Comma separated list of every format name the CLI accepts.
pub fn get_supported_formats() -> String {
    FormatType::ALL
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parses an explicit format name, or infers one from `path` when none is given.
pub fn resolve_format(explicit: Option<&str>, path: &str) -> Result<FormatType, String> {
    match explicit {
        Some(name) => FormatType::from_str(name).map_err(|e| {
            format!("{}. Supported formats: {}", e, get_supported_formats())
        }),
        None => infer_format_from_extension(path).ok_or_else(|| {
            format!(
                "Cannot infer the format of '{}'. Pass --format with one of: {}",
                path,
                get_supported_formats()
            )
        }),
    }
}
