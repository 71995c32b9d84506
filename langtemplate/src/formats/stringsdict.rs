//! Apple `.stringsdict` property lists.
//!
//! Every top-level `<key>` names an entry whose `<dict>` holds a
//! `NSStringLocalizedFormatKey` and one plural `<dict>` per format variable. Each of those
//! becomes a pluralized string keyed by the entry and with the variable as its context; its
//! placeholder stands for all of the rule `<key>`/`<string>` pairs.
//!
//! Text around the first variable of the format string (`Look! There %#@mouse@ here`) is moved
//! into every plural form of that variable so that translators see whole sentences. The
//! template keeps only `%#@mouse@`, so such documents compile back in that normalised shape.

use std::collections::{BTreeMap, HashSet};

use lazy_static::lazy_static;
use regex::Regex;

use super::android_strings::{line_separator, remove_until, validate};
use crate::{
    compiler::{ParseState, StringCursor, ordered},
    error::{Error, line_of},
    options::HandlerOptions,
    plural_rules::PluralRule,
    scanner::xml::XmlNode,
    strings::OpenString,
    traits::{Handler, Parsed},
    transcriber::{SourceText, Transcriber},
};

const DICT_TAG: &str = "<dict";
const DICT: &str = "dict";
const KEY: &str = "key";

const KEY_FORMAT: &str = "NSStringLocalizedFormatKey";
const KEY_SPEC: &str = "NSStringFormatSpecTypeKey";
const KEY_VALUE: &str = "NSStringFormatValueTypeKey";

lazy_static! {
    static ref FORMAT_VALUE: Regex =
        Regex::new(r"(?s)^(?P<prefix>[^@]*)%#@(?P<variable>\w+)@(?P<suffix>.*)$").unwrap();
    static ref PLURAL_PLACEHOLDER: Regex = Regex::new(r"\b[0-9a-f]{32}_pl\b").unwrap();
}

/// Handler for iOS/macOS `.stringsdict` files.
#[derive(Debug, Clone, Default)]
pub struct StringsdictHandler {
    options: HandlerOptions,
}

impl StringsdictHandler {
    pub fn new(options: HandlerOptions) -> Self {
        StringsdictHandler { options }
    }
}

/// Text around the first variable of a format string.
#[derive(Debug)]
struct FormatExtras<'s> {
    variable: &'s str,
    prefix: &'s str,
    suffix: &'s str,
}

/// A `<key>` with the element following it.
type Pair<'s> = (XmlNode<'s>, XmlNode<'s>);

struct Extraction<'t, 's> {
    transcriber: &'t mut Transcriber<'s>,
    state: ParseState,
}

impl<'s> Extraction<'_, 's> {
    /// Strips the text around the first variable from the template and returns it.
    fn format_key(&mut self, value: &XmlNode<'s>) -> Result<Option<FormatExtras<'s>>, Error> {
        let (Some(position), Some(content)) = (value.text_position(), value.content()?) else {
            return Ok(None);
        };
        let Some(captures) = FORMAT_VALUE.captures(content) else {
            return Ok(None);
        };
        let (Some(variable), Some(prefix), Some(suffix)) = (
            captures.name("variable"),
            captures.name("prefix"),
            captures.name("suffix"),
        ) else {
            return Ok(None);
        };
        let extras = FormatExtras {
            variable: variable.as_str(),
            prefix: prefix.as_str(),
            suffix: suffix.as_str(),
        };
        if !extras.prefix.is_empty() || !extras.suffix.is_empty() {
            self.transcriber.copy_until(position);
            self.transcriber.skip(extras.prefix.len());
            self.transcriber
                .copy_until(position + content.len() - extras.suffix.len());
            self.transcriber.skip(extras.suffix.len());
        }
        Ok(Some(extras))
    }

    /// Replaces the rule pairs of the plural `dict` with one placeholder.
    ///
    /// Nothing is extracted when every rule's `<string>` is empty.
    fn plural(
        &mut self,
        main_key: &str,
        variable: &str,
        dict: &XmlNode<'s>,
        extras: Option<&FormatExtras<'s>>,
    ) -> Result<(), Error> {
        let entries = pairs(dict)?;
        let mut strings = BTreeMap::new();
        let mut rules = 0;
        let mut empty = 0;
        for (key, value) in &entries {
            let name = key_content(key)?;
            if name == KEY_SPEC || name == KEY_VALUE {
                continue;
            }
            let rule: PluralRule = name.parse().map_err(|_| {
                error_at(
                    key,
                    format!("The plural <key> tag contains an invalid plural rule: `{name}`"),
                )
            })?;
            let text = value.content()?.unwrap_or_default();
            rules += 1;
            if text.trim().is_empty() {
                empty += 1;
            }
            let text = match extras {
                Some(extras) if extras.variable == variable => {
                    format!("{}{}{}", extras.prefix, text, extras.suffix)
                }
                _ => text.to_string(),
            };
            if strings.insert(rule, text).is_some() {
                return Err(error_at(key, format!("Duplicate plural rule `{name}`")));
            }
        }
        if rules == 0 || empty == rules {
            return Ok(());
        }
        if empty > 0 {
            return Err(error_at(
                dict,
                format!("The plural <dict> of '{variable}' has an empty <string>"),
            ));
        }
        if !self.state.claim(main_key, variable) {
            return Err(Error::DuplicateKey {
                key: main_key.to_string(),
                line: line_of(dict.source(), dict.position()),
            });
        }

        let string = OpenString::plural(main_key, strings)
            .with_context(variable)
            .with_order(self.state.next_order());
        let mut placed = false;
        for (key, value) in &entries {
            let name = key_content(key)?;
            let tail = value.tail_position()?;
            if name == KEY_SPEC || name == KEY_VALUE {
                if placed {
                    self.transcriber.copy_until(tail);
                }
                continue;
            }
            if !placed {
                self.transcriber.copy_until(key.position());
                self.transcriber.add(string.template_replacement());
                placed = true;
            }
            self.transcriber.skip_until(tail);
        }
        self.state.push(string);
        Ok(())
    }
}

/// The `<key>`/value children of `node`, skipping comments.
fn pairs<'s>(node: &XmlNode<'s>) -> Result<Vec<Pair<'s>>, Error> {
    let mut children = node
        .children()
        .filter(|child| !matches!(child, Ok(child) if child.is_comment()));
    let mut pairs = Vec::new();
    while let Some(key) = children.next() {
        let key = key?;
        if key.tag() != KEY {
            return Err(error_at(
                &key,
                format!("Was expecting <key> tag but found <{}> tag", key.tag()),
            ));
        }
        let Some(value) = children.next() else {
            return Err(error_at(&key, "Did not find a value for the <key> tag"));
        };
        pairs.push((key, value?));
    }
    Ok(pairs)
}

fn key_content<'s>(key: &XmlNode<'s>) -> Result<&'s str, Error> {
    Ok(key.content()?.unwrap_or_default())
}

fn expect_dict(node: &XmlNode<'_>) -> Result<(), Error> {
    if node.tag() == DICT {
        Ok(())
    } else {
        Err(error_at(
            node,
            format!("Was expecting <dict> tag but found <{}> tag", node.tag()),
        ))
    }
}

fn error_at(node: &XmlNode<'_>, message: impl Into<String>) -> Error {
    Error::syntax(message, line_of(node.source(), node.position()))
}

fn find_root(text: &str) -> Result<usize, Error> {
    text.find(DICT_TAG)
        .ok_or_else(|| Error::syntax("Could not find a 'dict' tag", 1))
}

/// Writes the translations into one entry, removing each plural whose string is missing.
///
/// Returns `false` when the entry held plurals and none of them survived.
fn compile_entry(
    dict: &XmlNode<'_>,
    transcriber: &mut Transcriber<'_>,
    cursor: &mut StringCursor<'_>,
) -> Result<bool, Error> {
    let mut plurals = 0;
    let mut survived = false;
    let mut previous_tail = dict.text_position().unwrap_or(dict.position());
    for (_, value) in pairs(dict)? {
        let tail = value.tail_position()?;
        let content = value.content()?.unwrap_or_default();
        if value.tag() == DICT && PLURAL_PLACEHOLDER.is_match(content) {
            plurals += 1;
            transcriber.copy_until(previous_tail);
            transcriber.mark_section_start();
            if compile_plural(&value, transcriber, cursor)? {
                survived = true;
            } else {
                remove_until(transcriber, tail);
            }
        }
        previous_tail = tail;
    }
    Ok(plurals == 0 || survived)
}

/// Regenerates a `<key>`/`<string>` pair per rule in place of the placeholder.
fn compile_plural(
    dict: &XmlNode<'_>,
    transcriber: &mut Transcriber<'_>,
    cursor: &mut StringCursor<'_>,
) -> Result<bool, Error> {
    let (Some(position), Some(content)) = (dict.text_position(), dict.content()?) else {
        return Ok(false);
    };
    let Some(string) = cursor.take_plural_within(content) else {
        return Ok(false);
    };
    let Some(plurals) = string.plurals() else {
        return Ok(false);
    };
    let placeholder = string.template_replacement();
    let offset = content.find(&placeholder).unwrap_or_default();
    let separator = line_separator(content, offset);
    let rendered = plurals
        .iter()
        .map(|(rule, text)| format!("<key>{}</key>{separator}<string>{text}</string>", rule.name()))
        .collect::<Vec<_>>()
        .join(&separator);

    transcriber.copy_until(position + offset);
    transcriber.add(rendered);
    transcriber.skip(placeholder.len());
    Ok(true)
}

impl Handler for StringsdictHandler {
    fn name(&self) -> &'static str {
        "STRINGSDICT"
    }

    fn extension(&self) -> &'static str {
        "stringsdict"
    }

    fn parse(&self, content: &str) -> Result<Parsed, Error> {
        let source = SourceText::new(content);
        let text = source.as_str();
        let root = XmlNode::new(text, find_root(text)?)?;

        let mut transcriber = Transcriber::new(&source);
        let mut extraction = Extraction {
            transcriber: &mut transcriber,
            state: ParseState::new(),
        };
        let mut main_keys = HashSet::new();
        for (key, value) in pairs(&root)? {
            let main_key = key_content(&key)?;
            if !main_keys.insert(main_key) {
                return Err(Error::DuplicateKey {
                    key: main_key.to_string(),
                    line: line_of(text, key.position()),
                });
            }
            expect_dict(&value)?;

            let mut extras = None;
            for (inner_key, inner_value) in pairs(&value)? {
                let variable = key_content(&inner_key)?;
                if variable == KEY_FORMAT {
                    extras = extraction.format_key(&inner_value)?;
                    continue;
                }
                expect_dict(&inner_value)?;
                extraction.plural(main_key, variable, &inner_value, extras.as_ref())?;
            }
        }
        let stringset = extraction.state.into_stringset();
        transcriber.copy_until(source.len());
        validate(text)?;

        log::debug!("extracted {} strings from stringsdict", stringset.len());
        Ok((
            transcriber.get_destination(self.options.newline_type),
            stringset,
        ))
    }

    /// Writes the translations in a single pass. A plural without a string is removed with its
    /// `<key>`, and so is an entry none of whose plurals survived.
    fn compile(&self, template: &str, stringset: &[OpenString]) -> Result<String, Error> {
        let stringset = ordered(stringset);
        let source = SourceText::new(template);
        let text = source.as_str();
        let root = XmlNode::new(text, find_root(text)?)?;

        let mut transcriber = Transcriber::new(&source);
        let mut cursor = StringCursor::new(&stringset);
        let mut previous_tail = root.text_position().unwrap_or(root.position());
        for (_, value) in pairs(&root)? {
            let tail = value.tail_position()?;
            transcriber.copy_until(previous_tail);
            transcriber.mark_section_start();
            previous_tail = tail;
            if value.tag() == DICT && !compile_entry(&value, &mut transcriber, &mut cursor)? {
                remove_until(&mut transcriber, tail);
            }
        }
        transcriber.copy_until(source.len());
        Ok(transcriber.get_destination(self.options.newline_type))
    }
}
