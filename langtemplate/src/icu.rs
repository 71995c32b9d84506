//! The subset of ICU MessageFormat used for pluralized strings.
//!
//! A value such as
//!
//! ```text
//! { item_count, plural, one { You have {file_count} file. } other { You have {file_count} files. } }
//! ```
//!
//! is detected as a plural and split into one text per plural rule. Anything that does not
//! have the `{ keyword, plural, ... }` envelope is left to the ordinary-string path.

use std::collections::{BTreeMap, BTreeSet};

use lazy_static::lazy_static;
use regex::Regex;

use crate::{error::Error, plural_rules::PluralRule};

/// The `=N` keywords accepted when numeric plural values are allowed.
pub const NUMERIC_RULES: [&str; 3] = ["=0", "=1", "=2"];

const PLURAL_ARG: &str = "plural";

lazy_static! {
    static ref ENVELOPE: Regex =
        Regex::new(r"(?s)^\s*\{\s*([A-Za-z\-_\d]+)\s*,\s*([A-Za-z_]+)\s*,\s*(.*)\}\s*$").unwrap();
}

/// How a rule was written in the source: `one` or `=1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PluralSyntax {
    Word,
    Numeric,
}

fn rule_for_keyword(keyword: &str) -> Option<(PluralRule, PluralSyntax)> {
    match keyword {
        "=0" => Some((PluralRule::Zero, PluralSyntax::Numeric)),
        "=1" => Some((PluralRule::One, PluralSyntax::Numeric)),
        "=2" => Some((PluralRule::Two, PluralSyntax::Numeric)),
        _ => keyword
            .parse()
            .ok()
            .map(|rule| (rule, PluralSyntax::Word)),
    }
}

/// A pluralized value found by [`IcuParser::parse`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IcuString {
    pub key: String,
    /// `(rule keyword, content with its braces)` in source order.
    pub string_info: Vec<(String, String)>,
    /// Offset (within the value) of the first rule keyword.
    pub current_position: usize,
    /// The part of the value a template replaces with the placeholder: from the first rule
    /// keyword through the closing brace of the last rule.
    pub string_to_replace: String,
}

impl IcuString {
    /// Content per rule, without the enclosing braces.
    pub fn strings_by_rule(&self) -> BTreeMap<PluralRule, String> {
        self.string_info
            .iter()
            .filter_map(|(keyword, content)| {
                let (rule, _) = rule_for_keyword(keyword)?;
                let inner = content.get(1..content.len().saturating_sub(1))?;
                Some((rule, inner.to_string()))
            })
            .collect()
    }

    pub fn syntax_by_rule(&self) -> BTreeMap<PluralRule, PluralSyntax> {
        self.string_info
            .iter()
            .filter_map(|(keyword, _)| rule_for_keyword(keyword))
            .collect()
    }

    /// Rules written as `=N` in the source.
    pub fn numeric_rules(&self) -> BTreeSet<PluralRule> {
        self.syntax_by_rule()
            .into_iter()
            .filter(|(_, syntax)| *syntax == PluralSyntax::Numeric)
            .map(|(rule, _)| rule)
            .collect()
    }
}

/// A `WORD {balanced content}` group inside a plural envelope.
#[derive(Debug, Clone, Copy)]
struct Group<'a> {
    keyword: &'a str,
    content: &'a str,
    start: usize,
    end: usize,
}

/// Finds every `WORD {balanced}` group, scanning left to right and resuming after each match.
fn scan_groups(text: &str) -> Vec<Group<'_>> {
    let mut groups = Vec::new();
    let mut ptr = 0;
    while ptr < text.len() {
        match group_at(text, ptr) {
            Some(group) => {
                ptr = group.end;
                groups.push(group);
            }
            None => {
                ptr += text[ptr..].chars().next().map_or(1, char::len_utf8);
            }
        }
    }
    groups
}

fn group_at(text: &str, start: usize) -> Option<Group<'_>> {
    let is_word = |c: char| c == '=' || c.is_ascii_alphanumeric();
    let word_len = text[start..]
        .find(|c: char| !is_word(c))
        .unwrap_or(text.len() - start);
    if word_len == 0 {
        return None;
    }
    let after_word = start + word_len;
    let brace = after_word
        + text[after_word..]
            .find(|c: char| !c.is_whitespace())
            .unwrap_or(text.len() - after_word);
    if !text[brace..].starts_with('{') {
        return None;
    }

    // quote characters are ordinary content here, only braces nest
    let mut depth = 0usize;
    for (offset, c) in text[brace..].char_indices() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    let end = brace + offset + 1;
                    return Some(Group {
                        keyword: &text[start..after_word],
                        content: &text[brace..end],
                        start,
                        end,
                    });
                }
            }
            _ => {}
        }
    }
    None
}

/// Detects and splits ICU plural values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IcuParser {
    /// Whether `=0`, `=1` and `=2` are accepted as rule keywords. When disabled, a value using
    /// them is treated as an ordinary string.
    pub allow_numeric_plural_values: bool,
}

impl Default for IcuParser {
    fn default() -> Self {
        IcuParser {
            allow_numeric_plural_values: true,
        }
    }
}

impl IcuParser {
    pub fn new(allow_numeric_plural_values: bool) -> Self {
        IcuParser {
            allow_numeric_plural_values,
        }
    }

    /// Rule keywords this parser accepts.
    pub fn allowed_keywords(&self) -> Vec<&'static str> {
        let mut allowed = PluralRule::names();
        if self.allow_numeric_plural_values {
            allowed.extend(NUMERIC_RULES);
        }
        allowed
    }

    /// Returns the plural found in `value`, or `None` when `value` is not a plural.
    ///
    /// Fails when the value has the plural envelope but its rules are malformed.
    pub fn parse(&self, key: &str, value: &str) -> Result<Option<IcuString>, Error> {
        let Some(captures) = ENVELOPE.captures(value) else {
            return Ok(None);
        };
        if &captures[2] != PLURAL_ARG {
            return Ok(None);
        }
        let Some(serialized) = captures.get(3) else {
            return Ok(None);
        };
        let serialized_start = serialized.start();
        let serialized = serialized.as_str();

        let groups = scan_groups(serialized);

        if !self.allow_numeric_plural_values
            && groups
                .iter()
                .any(|group| NUMERIC_RULES.iter().any(|numeric| *numeric == group.keyword))
        {
            return Ok(None);
        }

        let mut leftover = String::new();
        let mut ptr = 0;
        for group in &groups {
            leftover.push_str(&serialized[ptr..group.start]);
            ptr = group.end;
        }
        leftover.push_str(&serialized[ptr..]);
        let leftover = leftover.replace("\\n", "\n").replace("\\t", "\t");
        let leftover = leftover.trim();
        if !leftover.is_empty() {
            return Err(Error::InvalidPluralContent {
                key: key.to_string(),
                serialized: serialized.to_string(),
                chunk: leftover.to_string(),
            });
        }

        let allowed = self.allowed_keywords();
        let invalid: Vec<String> = groups
            .iter()
            .filter(|group| !allowed.iter().any(|keyword| *keyword == group.keyword))
            .map(|group| group.keyword.to_string())
            .collect();
        if !invalid.is_empty() {
            return Err(Error::InvalidPluralRules {
                key: key.to_string(),
                value: value.to_string(),
                invalid,
                allowed,
            });
        }

        let mut seen: BTreeMap<PluralRule, &str> = BTreeMap::new();
        for group in &groups {
            let Some((rule, _)) = rule_for_keyword(group.keyword) else {
                continue;
            };
            if let Some(first) = seen.insert(rule, group.keyword) {
                return Err(Error::DuplicatePluralRule {
                    key: key.to_string(),
                    value: value.to_string(),
                    first: first.to_string(),
                    second: group.keyword.to_string(),
                });
            }
        }

        let (Some(first), Some(last)) = (groups.first(), groups.last()) else {
            return Ok(None);
        };
        let current_position = serialized_start + first.start;
        let replace_end = serialized_start + last.end;

        Ok(Some(IcuString {
            key: key.to_string(),
            string_info: groups
                .iter()
                .map(|group| (group.keyword.to_string(), group.content.to_string()))
                .collect(),
            current_position,
            string_to_replace: value[current_position..replace_end].to_string(),
        }))
    }
}

/// Serializes plural texts back into ICU rule groups.
#[derive(Debug, Clone, Copy, Default)]
pub struct IcuCompiler;

impl IcuCompiler {
    /// Renders `rule {text}` groups in ascending rule order, joined by `delimiter`.
    ///
    /// With `syntax_by_rule`, rules recorded as numeric are written as `=N`.
    pub fn serialize_strings(
        strings_by_rule: &BTreeMap<PluralRule, String>,
        delimiter: &str,
        syntax_by_rule: Option<&BTreeMap<PluralRule, PluralSyntax>>,
    ) -> String {
        strings_by_rule
            .iter()
            .map(|(rule, text)| {
                let numeric = syntax_by_rule
                    .and_then(|syntax| syntax.get(rule))
                    .is_some_and(|syntax| *syntax == PluralSyntax::Numeric);
                if numeric {
                    format!("={} {{{}}}", rule.number(), text)
                } else {
                    format!("{} {{{}}}", rule.name(), text)
                }
            })
            .collect::<Vec<_>>()
            .join(delimiter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(value: &str) -> Result<Option<IcuString>, Error> {
        IcuParser::default().parse("key", value)
    }

    #[test]
    fn test_simple_plural() {
        let value = "{ count, plural, one { {n} item } other { {n} items } }";
        let icu = parse(value).unwrap().unwrap();
        assert_eq!(
            icu.strings_by_rule(),
            BTreeMap::from([
                (PluralRule::One, " {n} item ".to_string()),
                (PluralRule::Other, " {n} items ".to_string()),
            ])
        );
        assert_eq!(icu.current_position, value.find("one").unwrap());
        assert_eq!(icu.string_to_replace, "one { {n} item } other { {n} items }");
        assert_eq!(
            &value[..icu.current_position],
            "{ count, plural, "
        );
    }

    #[test]
    fn test_not_a_plural() {
        assert!(parse("hello world").unwrap().is_none());
        assert!(parse("{ count, select, male {He} other {They} }").unwrap().is_none());
        assert!(parse("{count}").unwrap().is_none());
    }

    #[test]
    fn test_empty_envelope_is_not_a_plural() {
        assert!(parse("{ count, plural, }").unwrap().is_none());
    }

    #[test]
    fn test_nested_braces_and_quotes() {
        let value = "{cnt, plural, one {It's {cnt} table} other {Tables' {cnt} {x}}}";
        let icu = parse(value).unwrap().unwrap();
        let strings = icu.strings_by_rule();
        assert_eq!(strings[&PluralRule::One], "It's {cnt} table");
        assert_eq!(strings[&PluralRule::Other], "Tables' {cnt} {x}");
        assert_eq!(
            icu.string_to_replace,
            "one {It's {cnt} table} other {Tables' {cnt} {x}}"
        );
    }

    #[test]
    fn test_numeric_rules() {
        let value = "{cnt, plural, =1 {table} other {tables}}";
        let icu = parse(value).unwrap().unwrap();
        assert_eq!(
            icu.syntax_by_rule(),
            BTreeMap::from([
                (PluralRule::One, PluralSyntax::Numeric),
                (PluralRule::Other, PluralSyntax::Word),
            ])
        );
        assert_eq!(icu.strings_by_rule()[&PluralRule::One], "table");
        assert_eq!(icu.numeric_rules(), BTreeSet::from([PluralRule::One]));

        let strict = IcuParser::new(false);
        assert!(strict.parse("key", value).unwrap().is_none());
    }

    #[test]
    fn test_invalid_rule_keyword() {
        let err = parse("{cnt, plural, foo {table} other {tables}}").unwrap_err();
        match err {
            Error::InvalidPluralRules {
                invalid, allowed, ..
            } => {
                assert_eq!(invalid, vec!["foo".to_string()]);
                assert!(allowed.contains(&"other"));
                assert!(allowed.contains(&"=1"));
            }
            other => panic!("unexpected error {other:?}"),
        }

        let err = IcuParser::new(false)
            .parse("key", "{cnt, plural, =5 {x} other {y}}")
            .unwrap_err();
        assert!(err.to_string().contains("Invalid plural rule(s): \"=5\""));
    }

    #[test]
    fn test_rules_selecting_the_same_form() {
        let err = parse("{cnt, plural, =1 {exactly one} one {one-ish} other {many}}").unwrap_err();
        match err {
            Error::DuplicatePluralRule { first, second, .. } => {
                assert_eq!(first, "=1");
                assert_eq!(second, "one");
            }
            other => panic!("unexpected error {other:?}"),
        }

        let err = parse("{cnt, plural, other {a} other {b}}").unwrap_err();
        assert!(err.to_string().starts_with("Plural rules \"other\" and \"other\""));
    }

    #[test]
    fn test_invalid_content() {
        let err = parse("{cnt, plural, one {table} other {tables}} junk}").unwrap_err();
        match err {
            Error::InvalidPluralContent { chunk, .. } => assert_eq!(chunk, "} junk"),
            other => panic!("unexpected error {other:?}"),
        }

        let err = parse("{cnt, plural, one {table other {tables}}").unwrap_err();
        assert!(matches!(err, Error::InvalidPluralContent { .. }));
    }

    #[test]
    fn test_escaped_whitespace_between_rules() {
        let value = r"{cnt, plural,\n one {table}\n\t other {tables}\n}";
        let icu = parse(value).unwrap().unwrap();
        assert_eq!(icu.string_info.len(), 2);
        assert_eq!(icu.string_to_replace, r"one {table}\n\t other {tables}");
    }

    #[test]
    fn test_serialize_strings() {
        let strings = BTreeMap::from([
            (PluralRule::Other, "{cnt} chips.".to_string()),
            (PluralRule::One, "{cnt} chip.".to_string()),
        ]);
        assert_eq!(
            IcuCompiler::serialize_strings(&strings, " ", None),
            "one {{cnt} chip.} other {{cnt} chips.}"
        );
        assert_eq!(
            IcuCompiler::serialize_strings(&strings, "\n", None),
            "one {{cnt} chip.}\nother {{cnt} chips.}"
        );
        let syntax = BTreeMap::from([(PluralRule::One, PluralSyntax::Numeric)]);
        assert_eq!(
            IcuCompiler::serialize_strings(&strings, " ", Some(&syntax)),
            "=1 {{cnt} chip.} other {{cnt} chips.}"
        );
    }

    #[test]
    fn test_reserialization_is_semantically_equal() {
        let value = "{ n, plural,   zero {none}    few {a few}  other {many {n}} }";
        let icu = parse(value).unwrap().unwrap();
        let serialized = IcuCompiler::serialize_strings(&icu.strings_by_rule(), " ", None);
        let again = parse(&format!("{{ n, plural, {} }}", serialized))
            .unwrap()
            .unwrap();
        assert_eq!(again.strings_by_rule(), icu.strings_by_rule());
    }
}
