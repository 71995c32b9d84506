//! Options shared by the format handlers.

use crate::transcriber::NewlineType;

/// Behaviour options for [`crate::traits::Handler`] implementations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerOptions {
    /// Accept `=0`, `=1` and `=2` as plural rule keywords in ICU values.
    pub allow_numeric_plural_values: bool,
    /// Line endings of rendered output; `None` keeps the style detected in the input.
    pub newline_type: Option<NewlineType>,
    /// Elements whose content the HTML handler extracts.
    pub translatable_tags: Vec<String>,
    /// Separator between rule groups when ICU plurals are written back.
    pub plural_delimiter: String,
}

impl Default for HandlerOptions {
    fn default() -> Self {
        HandlerOptions {
            allow_numeric_plural_values: true,
            newline_type: None,
            translatable_tags: vec!["p".to_string()],
            plural_delimiter: " ".to_string(),
        }
    }
}

impl HandlerOptions {
    /// Creates default handler options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables/disables the `=N` plural syntax.
    pub fn with_numeric_plural_values(mut self, allow: bool) -> Self {
        self.allow_numeric_plural_values = allow;
        self
    }

    /// Forces the line endings of rendered output.
    pub fn with_newline_type(mut self, newline_type: Option<NewlineType>) -> Self {
        self.newline_type = newline_type;
        self
    }

    /// Sets the elements the HTML handler extracts.
    pub fn with_translatable_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.translatable_tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the separator used between reserialized plural rules.
    pub fn with_plural_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.plural_delimiter = delimiter.into();
        self
    }
}
