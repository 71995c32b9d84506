//! Chrome extension `messages.json` files.
//!
//! ```json
//! {
//!   "greeting": {
//!     "message": "Hello",
//!     "description": "Shown on the welcome page"
//!   }
//! }
//! ```
//!
//! Only `message` values are extracted; the `description` next to them becomes the developer
//! comment. Everything else stays in the template as is.

use crate::{
    compiler::{ParseState, StringCursor, Substitution, ordered},
    error::Error,
    icu::IcuParser,
    options::HandlerOptions,
    scanner::json::{JsonNode, JsonValue, unescape},
    strings::OpenString,
    traits::{Handler, Parsed},
    transcriber::{SourceText, Transcriber},
};

use super::json::{escape_key, extract_string, substitute};

const MESSAGE_KEY: &str = "message";
const DESCRIPTION_KEY: &str = "description";

/// Handler for Chrome i18n message catalogs.
#[derive(Debug, Clone, Default)]
pub struct ChromeHandler {
    options: HandlerOptions,
}

/// Where a nested entry sits in the document.
#[derive(Debug, Clone, Copy)]
struct Nesting<'a> {
    /// Dotted key of the parent.
    key: &'a str,
    /// Raw name of the top-level member the entry belongs to.
    top: &'a str,
}

impl ChromeHandler {
    pub fn new(options: HandlerOptions) -> Self {
        ChromeHandler { options }
    }

    fn extract(
        &self,
        node: &JsonNode<'_>,
        nesting: Option<Nesting<'_>>,
        document: &serde_json::Value,
        transcriber: &mut Transcriber<'_>,
        state: &mut ParseState,
    ) -> Result<(), Error> {
        let parser = IcuParser::new(self.options.allow_numeric_plural_values);
        for (index, entry) in node.entries().enumerate() {
            let entry = entry?;
            let (key, name) = match (entry.key, nesting) {
                (Some(key), Some(nesting)) => {
                    (format!("{}.{}", nesting.key, escape_key(key.text)), key.text)
                }
                (Some(key), None) => (escape_key(key.text), key.text),
                (None, Some(nesting)) => (format!("{}..{index}..", nesting.key), ""),
                (None, None) => (format!("..{index}.."), ""),
            };
            if let Some(json_key) = entry.key {
                if !state.claim_key(&key) {
                    transcriber.copy_until(json_key.position);
                    return Err(Error::DuplicateKey {
                        key,
                        line: transcriber.line_number(),
                    });
                }
            }
            let top = nesting.map_or(name, |nesting| nesting.top);

            match entry.value {
                JsonValue::String { value, position } => {
                    if name != MESSAGE_KEY || value.trim().is_empty() {
                        continue;
                    }
                    let string = extract_string(&parser, transcriber, state, key, value, position)?
                        .with_developer_comment(description(document, top));
                    state.push(string);
                }
                JsonValue::Container(inner) => {
                    let nesting = Nesting { key: &key, top };
                    self.extract(&inner, Some(nesting), document, transcriber, state)?;
                }
                JsonValue::Other { .. } => {}
            }
        }
        Ok(())
    }

    fn insert(
        &self,
        node: &JsonNode<'_>,
        transcriber: &mut Transcriber<'_>,
        cursor: &mut StringCursor<'_>,
    ) -> Result<(), Error> {
        for entry in node.entries() {
            match entry?.value {
                JsonValue::String { value, position } if !value.trim().is_empty() => {
                    substitute(
                        transcriber,
                        cursor,
                        value,
                        position,
                        Substitution::Translations,
                        &self.options.plural_delimiter,
                    );
                }
                JsonValue::Container(inner) => self.insert(&inner, transcriber, cursor)?,
                _ => {}
            }
        }
        Ok(())
    }
}

/// The `description` of the top-level member `top`, stringified when it is not a string.
fn description(document: &serde_json::Value, top: &str) -> String {
    match document.get(unescape(top)).and_then(|member| member.get(DESCRIPTION_KEY)) {
        Some(serde_json::Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}

impl Handler for ChromeHandler {
    fn name(&self) -> &'static str {
        "CHROME"
    }

    fn extension(&self) -> &'static str {
        "json"
    }

    fn parse(&self, content: &str) -> Result<Parsed, Error> {
        let document: serde_json::Value = serde_json::from_str(content)?;

        let source = SourceText::new(content);
        let mut transcriber = Transcriber::new(&source);
        let mut state = ParseState::new();
        let root = JsonNode::new(source.as_str(), 0)?;
        self.extract(&root, None, &document, &mut transcriber, &mut state)?;
        transcriber.copy_until(source.len());

        log::debug!("extracted {} messages from Chrome catalog", state.len());
        Ok((
            transcriber.get_destination(self.options.newline_type),
            state.into_stringset(),
        ))
    }

    /// Writes the translations in a single pass. Messages without a translation keep their
    /// placeholder; nothing is removed.
    fn compile(&self, template: &str, stringset: &[OpenString]) -> Result<String, Error> {
        let stringset = ordered(stringset);
        let source = SourceText::new(template);
        let mut transcriber = Transcriber::new(&source);
        let mut cursor = StringCursor::new(&stringset);
        let root = JsonNode::new(source.as_str(), 0)?;
        self.insert(&root, &mut transcriber, &mut cursor)?;
        transcriber.copy_until(source.len());
        Ok(transcriber.get_destination(self.options.newline_type))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CATALOG: &str = r#"{
  "greeting": {
    "message": "Hello",
    "description": "Shown on the welcome page"
  },
  "farewell": {
    "message": "Bye",
    "description": 1234
  },
  "plain": {
    "message": "No description"
  }
}"#;

    #[test]
    fn test_parse_messages_only() {
        let (template, stringset) = ChromeHandler::default().parse(CATALOG).unwrap();
        let keys: Vec<_> = stringset.iter().map(|s| s.key.as_str()).collect();
        assert_eq!(keys, vec!["greeting.message", "farewell.message", "plain.message"]);
        assert_eq!(stringset[0].developer_comment, "Shown on the welcome page");
        assert_eq!(stringset[1].developer_comment, "1234");
        assert_eq!(stringset[2].developer_comment, "");
        assert!(template.contains("\"description\": \"Shown on the welcome page\""));
        assert!(!template.contains("Hello"));
    }

    #[test]
    fn test_compile_keeps_untranslated_placeholders() {
        let handler = ChromeHandler::default();
        let (template, stringset) = handler.parse(CATALOG).unwrap();
        let translations = vec![
            OpenString::new("greeting.message", "Bonjour").with_order(0),
            OpenString::new("plain.message", "Sans description").with_order(2),
        ];
        let compiled = handler.compile(&template, &translations).unwrap();
        assert!(compiled.contains("\"message\": \"Bonjour\""));
        assert!(compiled.contains("\"message\": \"Sans description\""));
        assert!(compiled.contains(&stringset[1].template_replacement()));
        assert!(compiled.contains("\"description\": 1234"));
    }

    #[test]
    fn test_round_trip() {
        let handler = ChromeHandler::default();
        let (template, stringset) = handler.parse(CATALOG).unwrap();
        assert_eq!(handler.compile(&template, &stringset).unwrap(), CATALOG);
    }

    #[test]
    fn test_message_plural() {
        let content = r#"{"files": {"message": "{ n, plural, one {# file} other {# files} }"}}"#;
        let (_, stringset) = ChromeHandler::default().parse(content).unwrap();
        assert!(stringset[0].pluralized());
    }
}
