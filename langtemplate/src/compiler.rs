//! Bookkeeping shared by the parse and compile walks of every handler.
//!
//! Parsing threads a [`ParseState`] through the document walk; compiling matches template
//! placeholders against the stringset with a [`StringCursor`]. Formats whose structure leaves
//! punctuation behind when a unit is removed compile in two passes (see
//! [`compile_in_two_passes`]): first every unit without a string is dropped and the leftovers
//! are cleaned up, then the translations are written into the cleaned template.

use std::{collections::HashSet, ops::Range};

use regex::Regex;

use crate::{error::Error, strings::OpenString, transcriber::NewlineType};

/// What a compile walk writes in place of a matched placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Substitution {
    /// The placeholder itself; used to strip missing units from a template.
    Placeholders,
    /// The string's translation.
    Translations,
}

/// Mutable state of one parse walk.
#[derive(Debug, Default)]
pub struct ParseState {
    stringset: Vec<OpenString>,
    keys: HashSet<(String, String)>,
    order: usize,
}

impl ParseState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hands out the next extraction order.
    pub fn next_order(&mut self) -> usize {
        let order = self.order;
        self.order += 1;
        order
    }

    /// Records `key` without a context, returning `false` when it was already seen.
    pub fn claim_key(&mut self, key: &str) -> bool {
        self.claim(key, "")
    }

    /// Records the pair of `key` and `context`, returning `false` when it was already seen.
    pub fn claim(&mut self, key: &str, context: &str) -> bool {
        self.keys.insert((key.to_string(), context.to_string()))
    }

    pub fn push(&mut self, string: OpenString) {
        self.stringset.push(string);
    }

    pub fn len(&self) -> usize {
        self.stringset.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stringset.is_empty()
    }

    pub fn into_stringset(self) -> Vec<OpenString> {
        self.stringset
    }
}

/// Sequential read pointer over a stringset during compilation.
///
/// Only advances on a match, so a placeholder without a string leaves the cursor where it is.
#[derive(Debug)]
pub struct StringCursor<'a> {
    strings: &'a [OpenString],
    index: usize,
}

impl<'a> StringCursor<'a> {
    pub fn new(strings: &'a [OpenString]) -> Self {
        StringCursor { strings, index: 0 }
    }

    pub fn peek(&self) -> Option<&'a OpenString> {
        self.strings.get(self.index)
    }

    pub fn advance(&mut self) {
        self.index += 1;
    }

    /// Returns and consumes the next string if its placeholder equals `value`.
    pub fn take_exact(&mut self, value: &str) -> Option<&'a OpenString> {
        let string = self.peek()?;
        if string.template_replacement() == value {
            self.advance();
            Some(string)
        } else {
            None
        }
    }

    /// Returns and consumes the next string if it is plural and `value` contains its placeholder.
    pub fn take_plural_within(&mut self, value: &str) -> Option<&'a OpenString> {
        let string = self.peek()?;
        if string.pluralized() && value.contains(&string.template_replacement()) {
            self.advance();
            Some(string)
        } else {
            None
        }
    }

    pub fn consumed(&self) -> usize {
        self.index
    }
}

/// Returns the stringset sorted by extraction order.
///
/// The sort is stable; strings without an order keep their relative position after the others.
pub fn ordered(stringset: &[OpenString]) -> Vec<OpenString> {
    let mut strings = stringset.to_vec();
    strings.sort_by_key(|string| (string.order.is_none(), string.order));
    strings
}

/// One compile walk over a template.
pub trait TemplateWalker {
    /// Writes the strings matched in `template` according to `substitution` and removes units
    /// left without a string. `stringset` is already in extraction order.
    fn walk(
        &self,
        template: &str,
        stringset: &[OpenString],
        substitution: Substitution,
        newline_type: Option<NewlineType>,
    ) -> Result<String, Error>;
}

/// Ordered rewrite rules that remove punctuation left dangling by removed units.
#[derive(Debug, Clone)]
pub struct Cleanup {
    rules: Vec<(Regex, String)>,
    quote: Option<char>,
}

impl Cleanup {
    pub fn new<I, P, R>(rules: I) -> Result<Self, regex::Error>
    where
        I: IntoIterator<Item = (P, R)>,
        P: AsRef<str>,
        R: Into<String>,
    {
        let rules: Vec<(Regex, String)> = rules
            .into_iter()
            .map(|(pattern, replacement)| {
                Regex::new(pattern.as_ref()).map(|pattern| (pattern, replacement.into()))
            })
            .collect::<Result<_, _>>()?;
        Ok(Cleanup { rules, quote: None })
    }

    /// A cleanup that changes nothing.
    pub fn none() -> Self {
        Cleanup {
            rules: Vec::new(),
            quote: None,
        }
    }

    /// Leaves text between two unescaped `quote` characters alone, eg JSON keys.
    pub fn outside_literals(mut self, quote: char) -> Self {
        self.quote = Some(quote);
        self
    }

    /// Applies the first rule that matches, one match at a time, until no rule matches.
    ///
    /// Replacements are literal text.
    pub fn apply(&self, text: &str) -> String {
        let mut text = text.to_string();
        'outer: loop {
            let literals = match self.quote {
                Some(quote) => literal_spans(&text, quote),
                None => Vec::new(),
            };
            for (pattern, replacement) in &self.rules {
                if let Some(found) = find_outside(pattern, &text, &literals) {
                    log::trace!("cleanup collapsed {:?} at {}", &text[found.clone()], found.start);
                    text.replace_range(found, replacement);
                    continue 'outer;
                }
            }
            return text;
        }
    }
}

/// Byte ranges of the quoted literals in `text`, quotes included. An unterminated literal
/// runs to the end of the text.
fn literal_spans(text: &str, quote: char) -> Vec<Range<usize>> {
    let mut spans = Vec::new();
    let mut open: Option<usize> = None;
    let mut escaped = false;
    for (index, c) in text.char_indices() {
        match open {
            None if c == quote => open = Some(index),
            None => {}
            Some(_) if escaped => escaped = false,
            Some(_) if c == '\\' => escaped = true,
            Some(start) if c == quote => {
                spans.push(start..index + c.len_utf8());
                open = None;
            }
            Some(_) => {}
        }
    }
    if let Some(start) = open {
        spans.push(start..text.len());
    }
    spans
}

/// The leftmost match of `pattern` that does not touch any of `literals`.
fn find_outside(pattern: &Regex, text: &str, literals: &[Range<usize>]) -> Option<Range<usize>> {
    let mut start = 0;
    while let Some(found) = pattern.find_at(text, start) {
        let Some(literal) = literals
            .iter()
            .find(|literal| literal.start < found.end() && found.start() < literal.end)
        else {
            return Some(found.range());
        };
        start = if found.start() < literal.start {
            found.start() + text[found.start()..].chars().next().map_or(1, char::len_utf8)
        } else {
            literal.end
        };
        if start > text.len() {
            break;
        }
    }
    None
}

/// Compiles `template` in two walks with a cleanup in between.
///
/// The first walk keeps placeholders but drops every unit the stringset has no string for; the
/// cleanup then removes the punctuation those units leave behind; the second walk writes the
/// translations into the cleaned template.
pub fn compile_in_two_passes<W: TemplateWalker + ?Sized>(
    walker: &W,
    template: &str,
    stringset: &[OpenString],
    cleanup: &Cleanup,
    newline_type: Option<NewlineType>,
) -> Result<String, Error> {
    let stringset = ordered(stringset);
    let stripped = walker.walk(template, &stringset, Substitution::Placeholders, None)?;
    let cleaned = cleanup.apply(&stripped);
    walker.walk(&cleaned, &stringset, Substitution::Translations, newline_type)
}
