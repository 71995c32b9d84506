//! Key-value JSON documents.
//!
//! Every non-empty string value is extracted. Object members are keyed by their dotted path
//! (`parent.child`), array items by their index (`parent..0..`). A value written as an ICU
//! plural (`{ count, plural, one {...} other {...} }`) becomes one pluralized string whose
//! placeholder stands for the rule groups, while the `{ count, plural,` envelope stays in the
//! template.

use std::collections::BTreeMap;

use lazy_static::lazy_static;

use crate::{
    compiler::{
        Cleanup, ParseState, StringCursor, Substitution, TemplateWalker, compile_in_two_passes,
    },
    error::Error,
    icu::{IcuCompiler, IcuParser, PluralSyntax},
    options::HandlerOptions,
    plural_rules::PluralRule,
    scanner::json::{JsonKind, JsonNode, JsonValue},
    strings::OpenString,
    traits::{Handler, Parsed},
    transcriber::{NewlineType, SourceText, Transcriber},
};

lazy_static! {
    /// Collapses the separators left behind by removed members and items, never inside a
    /// quoted key or value.
    static ref CLEANUP: Cleanup = Cleanup::new([
        (r"\{\s*,", "{"),
        (r",\s*\}", "}"),
        (r"\[\s*,", "["),
        (r",\s*\]", "]"),
        (r",\s*,", ","),
    ])
    .unwrap()
    .outside_literals('"');
}

/// Handler for flat or nested key-value JSON files.
#[derive(Debug, Clone, Default)]
pub struct JsonHandler {
    options: HandlerOptions,
}

impl JsonHandler {
    pub fn new(options: HandlerOptions) -> Self {
        JsonHandler { options }
    }

    pub fn options(&self) -> &HandlerOptions {
        &self.options
    }

    fn extract(
        &self,
        node: &JsonNode<'_>,
        nest: Option<&str>,
        transcriber: &mut Transcriber<'_>,
        state: &mut ParseState,
    ) -> Result<(), Error> {
        let parser = IcuParser::new(self.options.allow_numeric_plural_values);
        for (index, entry) in node.entries().enumerate() {
            let entry = entry?;
            let key = match entry.key {
                Some(key) => {
                    let escaped = escape_key(key.text);
                    let full = match nest {
                        Some(nest) => format!("{nest}.{escaped}"),
                        None => escaped,
                    };
                    if !state.claim_key(&full) {
                        transcriber.copy_until(key.position);
                        return Err(Error::DuplicateKey {
                            key: full,
                            line: transcriber.line_number(),
                        });
                    }
                    full
                }
                None => match nest {
                    Some(nest) => format!("{nest}..{index}.."),
                    None => format!("..{index}.."),
                },
            };

            match entry.value {
                JsonValue::String { value, position } => {
                    if value.trim().is_empty() {
                        continue;
                    }
                    let string = extract_string(&parser, transcriber, state, key, value, position)?;
                    state.push(string);
                }
                JsonValue::Container(inner) => self.extract(&inner, Some(&key), transcriber, state)?,
                JsonValue::Other { .. } => {}
            }
        }
        Ok(())
    }

    /// Writes the members of `node`, returning whether any of them survived.
    fn insert(
        &self,
        node: &JsonNode<'_>,
        transcriber: &mut Transcriber<'_>,
        cursor: &mut StringCursor<'_>,
        substitution: Substitution,
    ) -> Result<bool, Error> {
        let mut survived = false;
        for entry in node.entries() {
            let entry = entry?;
            let anchor = match (node.kind(), entry.key) {
                (JsonKind::Object, Some(key)) => key.position - 1,
                _ => entry.value.anchor(),
            };
            transcriber.copy_until(anchor);
            transcriber.mark_section_start();
            if self.insert_item(&entry.value, transcriber, cursor, substitution)? {
                survived = true;
            }
        }
        Ok(survived)
    }

    fn insert_item(
        &self,
        value: &JsonValue<'_>,
        transcriber: &mut Transcriber<'_>,
        cursor: &mut StringCursor<'_>,
        substitution: Substitution,
    ) -> Result<bool, Error> {
        match *value {
            // never extracted, so there is nothing to look up
            JsonValue::String { value, .. } if value.trim().is_empty() => Ok(true),
            JsonValue::String { value, position } => {
                let delimiter = &self.options.plural_delimiter;
                if substitute(transcriber, cursor, value, position, substitution, delimiter) {
                    Ok(true)
                } else {
                    remove_until(transcriber, value_end(position, value));
                    Ok(false)
                }
            }
            JsonValue::Container(node) => {
                if self.insert(&node, transcriber, cursor, substitution)? {
                    Ok(true)
                } else {
                    remove_until(transcriber, node.end() + 1);
                    Ok(false)
                }
            }
            JsonValue::Other { .. } => Ok(true),
        }
    }
}

impl TemplateWalker for JsonHandler {
    fn walk(
        &self,
        template: &str,
        stringset: &[OpenString],
        substitution: Substitution,
        newline_type: Option<NewlineType>,
    ) -> Result<String, Error> {
        let source = SourceText::new(template);
        let mut transcriber = Transcriber::new(&source);
        let mut cursor = StringCursor::new(stringset);
        let root = JsonNode::new(source.as_str(), 0)?;
        self.insert(&root, &mut transcriber, &mut cursor, substitution)?;
        transcriber.copy_until(source.len());
        Ok(transcriber.get_destination(newline_type))
    }
}

impl Handler for JsonHandler {
    fn name(&self) -> &'static str {
        "KEYVALUEJSON"
    }

    fn extension(&self) -> &'static str {
        "json"
    }

    fn parse(&self, content: &str) -> Result<Parsed, Error> {
        serde_json::from_str::<serde_json::Value>(content)?;

        let source = SourceText::new(content);
        let mut transcriber = Transcriber::new(&source);
        let mut state = ParseState::new();
        let root = JsonNode::new(source.as_str(), 0)?;
        self.extract(&root, None, &mut transcriber, &mut state)?;
        transcriber.copy_until(source.len());

        log::debug!("extracted {} strings from JSON", state.len());
        Ok((
            transcriber.get_destination(self.options.newline_type),
            state.into_stringset(),
        ))
    }

    fn compile(&self, template: &str, stringset: &[OpenString]) -> Result<String, Error> {
        compile_in_two_passes(
            self,
            template,
            stringset,
            &CLEANUP,
            self.options.newline_type,
        )
    }
}

/// Escapes the characters that separate the levels of a dotted key.
pub fn escape_key(key: &str) -> String {
    key.replace('\\', "\\\\").replace('.', "\\.")
}

/// Extracts the raw string `value` starting at `position`, as a plural when it is one.
///
/// The value is replaced in the template by the placeholder of the returned string.
pub(crate) fn extract_string(
    parser: &IcuParser,
    transcriber: &mut Transcriber<'_>,
    state: &mut ParseState,
    key: String,
    value: &str,
    position: usize,
) -> Result<OpenString, Error> {
    if let Some(icu) = parser.parse(&key, value)? {
        let string = OpenString::plural(key, icu.strings_by_rule())
            .with_numeric_rules(icu.numeric_rules())
            .with_order(state.next_order());
        transcriber.copy_until(position + icu.current_position);
        transcriber.add(string.template_replacement());
        transcriber.skip(icu.string_to_replace.len());
        return Ok(string);
    }
    Ok(extract_singular(transcriber, state, key, value, position))
}

/// Extracts `value` as an ordinary string.
pub(crate) fn extract_singular(
    transcriber: &mut Transcriber<'_>,
    state: &mut ParseState,
    key: String,
    value: &str,
    position: usize,
) -> OpenString {
    let string = OpenString::new(key, value).with_order(state.next_order());
    transcriber.copy_until(position);
    transcriber.add(string.template_replacement());
    transcriber.skip(value.len());
    string
}

/// Writes the next string of `cursor` over the raw string `value` if `value` holds its
/// placeholder, returning whether it did.
pub(crate) fn substitute(
    transcriber: &mut Transcriber<'_>,
    cursor: &mut StringCursor<'_>,
    value: &str,
    position: usize,
    substitution: Substitution,
    plural_delimiter: &str,
) -> bool {
    if let Some(string) = cursor.take_plural_within(value) {
        let placeholder = string.template_replacement();
        let offset = value.find(&placeholder).unwrap_or_default();
        let replacement = match (substitution, string.plurals()) {
            (Substitution::Translations, Some(plurals)) => {
                let syntax: BTreeMap<PluralRule, PluralSyntax> = string
                    .numeric_rules
                    .iter()
                    .map(|rule| (*rule, PluralSyntax::Numeric))
                    .collect();
                IcuCompiler::serialize_strings(plurals, plural_delimiter, Some(&syntax))
            }
            _ => placeholder.clone(),
        };
        transcriber.copy_until(position + offset);
        transcriber.add(replacement);
        transcriber.skip(placeholder.len());
        true
    } else if let Some(string) = cursor.take_exact(value) {
        transcriber.copy_until(position);
        match (substitution, string.singular()) {
            (Substitution::Translations, Some(text)) => transcriber.add(text),
            _ => transcriber.add(value),
        }
        transcriber.skip(value.len());
        true
    } else {
        false
    }
}

/// Position right after the closing quote of a string starting at `position`.
fn value_end(position: usize, value: &str) -> usize {
    position + value.len() + 1
}

fn remove_until(transcriber: &mut Transcriber<'_>, end: usize) {
    transcriber.copy_until(end);
    transcriber.mark_section_end();
    transcriber.remove_section(0);
}
