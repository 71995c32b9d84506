//! Position-aware scanner for JSON documents.
//!
//! A [`JsonNode`] is an object or array whose closing bracket has been located. Its entries
//! are produced lazily and carry the absolute positions of keys and values, so a caller can
//! splice replacements into the original text. String contents are handed out raw, with their
//! escape sequences untouched.

use crate::error::{Error, line_of};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonKind {
    Object,
    Array,
}

impl JsonKind {
    fn closing(&self) -> char {
        match self {
            JsonKind::Object => '}',
            JsonKind::Array => ']',
        }
    }
}

/// A JSON object or array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JsonNode<'s> {
    source: &'s str,
    kind: JsonKind,
    start: usize,
    end: usize,
}

/// Key of an object entry; `position` points right after the opening quote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JsonKey<'s> {
    pub text: &'s str,
    pub position: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonValue<'s> {
    /// A string; `position` points right after the opening quote.
    String { value: &'s str, position: usize },
    Container(JsonNode<'s>),
    /// Numbers, booleans and `null`.
    Other { literal: &'s str, position: usize },
}

impl JsonValue<'_> {
    /// Position of the first byte of the value token (the opening quote for strings).
    pub fn anchor(&self) -> usize {
        match self {
            JsonValue::String { position, .. } => position - 1,
            JsonValue::Container(node) => node.start(),
            JsonValue::Other { position, .. } => *position,
        }
    }

    /// Position right after the value token.
    pub fn token_end(&self) -> usize {
        match self {
            JsonValue::String { value, position } => position + value.len() + 1,
            JsonValue::Container(node) => node.end() + 1,
            JsonValue::Other { literal, position } => position + literal.len(),
        }
    }
}

/// One member of an object (`key` is set) or one item of an array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JsonEntry<'s> {
    pub key: Option<JsonKey<'s>>,
    pub value: JsonValue<'s>,
}

impl<'s> JsonNode<'s> {
    /// Scans the object or array starting at the first non-whitespace byte at or after `start`.
    pub fn new(source: &'s str, start: usize) -> Result<Self, Error> {
        let start = skip_whitespace(source, start);
        let kind = match source[start..].chars().next() {
            Some('{') => JsonKind::Object,
            Some('[') => JsonKind::Array,
            found => {
                return Err(Error::syntax(
                    format!(
                        "Was expecting whitespace or one of `[{{`, found `{}` instead",
                        found.map(String::from).unwrap_or_default()
                    ),
                    line_of(source, start),
                ));
            }
        };
        let end = find_closing_bracket(source, start)?;
        Ok(JsonNode {
            source,
            kind,
            start,
            end,
        })
    }

    pub fn kind(&self) -> JsonKind {
        self.kind
    }

    /// Position of the opening bracket.
    pub fn start(&self) -> usize {
        self.start
    }

    /// Position of the closing bracket.
    pub fn end(&self) -> usize {
        self.end
    }

    pub fn source(&self) -> &'s str {
        self.source
    }

    pub fn entries(&self) -> Entries<'s> {
        Entries {
            node: *self,
            ptr: self.start + 1,
            done: false,
        }
    }
}

/// Lazy iterator over the entries of a [`JsonNode`].
#[derive(Debug)]
pub struct Entries<'s> {
    node: JsonNode<'s>,
    ptr: usize,
    done: bool,
}

impl<'s> Entries<'s> {
    fn error(&self, position: usize, expected: &str) -> Error {
        let source = self.node.source;
        let found = source[position..]
            .chars()
            .next()
            .map(String::from)
            .unwrap_or_default();
        Error::syntax(
            format!("Was expecting {}, found `{}` instead", expected, found),
            line_of(source, position),
        )
    }

    fn expect(&self, position: usize, symbol: char) -> Result<usize, Error> {
        if self.node.source[position..].starts_with(symbol) {
            Ok(position + 1)
        } else {
            Err(self.error(position, &format!("`{}`", symbol)))
        }
    }

    fn read_entry(&mut self) -> Result<Option<JsonEntry<'s>>, Error> {
        let source = self.node.source;
        let closing = self.node.kind.closing();
        let mut ptr = skip_whitespace(source, self.ptr);
        if ptr == self.node.end {
            return Ok(None);
        }

        let key = match self.node.kind {
            JsonKind::Object => {
                let position = self.expect(ptr, '"')?;
                let text = read_string(source, position)?;
                ptr = skip_whitespace(source, position + text.len() + 1);
                ptr = skip_whitespace(source, self.expect(ptr, ':')?);
                Some(JsonKey { text, position })
            }
            JsonKind::Array => None,
        };

        let value = match source[ptr..].chars().next() {
            Some('"') => {
                let position = ptr + 1;
                JsonValue::String {
                    value: read_string(source, position)?,
                    position,
                }
            }
            Some('{') | Some('[') => JsonValue::Container(JsonNode::new(source, ptr)?),
            Some(_) => {
                let length = source[ptr..]
                    .find(|c: char| c == ',' || c == '}' || c == ']' || c.is_whitespace())
                    .unwrap_or(source.len() - ptr);
                if length == 0 {
                    return Err(self.error(ptr, "a value"));
                }
                JsonValue::Other {
                    literal: &source[ptr..ptr + length],
                    position: ptr,
                }
            }
            None => return Err(self.error(ptr, "a value")),
        };

        ptr = skip_whitespace(source, value.token_end());
        if source[ptr..].starts_with(',') {
            self.ptr = ptr + 1;
        } else if ptr == self.node.end {
            self.ptr = ptr;
        } else {
            return Err(self.error(ptr, &format!("`,` or `{}`", closing)));
        }
        Ok(Some(JsonEntry { key, value }))
    }
}

impl<'s> Iterator for Entries<'s> {
    type Item = Result<JsonEntry<'s>, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.read_entry() {
            Ok(Some(entry)) => Some(Ok(entry)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

fn skip_whitespace(source: &str, start: usize) -> usize {
    source[start..]
        .find(|c: char| !c.is_whitespace())
        .map_or(source.len(), |offset| start + offset)
}

/// Raw contents of the string whose first byte (after the opening quote) is at `start`.
fn read_string(source: &str, start: usize) -> Result<&str, Error> {
    let bytes = source.as_bytes();
    let mut ptr = start;
    while ptr < bytes.len() {
        match bytes[ptr] {
            b'\\' => ptr += 2,
            b'"' => return Ok(&source[start..ptr]),
            _ => ptr += 1,
        }
    }
    Err(Error::syntax(
        "String not closed",
        line_of(source, start.saturating_sub(1)),
    ))
}

/// Position of the bracket closing the one at `start`, ignoring brackets inside strings.
fn find_closing_bracket(source: &str, start: usize) -> Result<usize, Error> {
    let bytes = source.as_bytes();
    let mut depth = 0usize;
    let mut ptr = start;
    while ptr < bytes.len() {
        match bytes[ptr] {
            b'"' => {
                let text = read_string(source, ptr + 1)?;
                ptr += text.len() + 2;
                continue;
            }
            b'{' | b'[' => depth += 1,
            b'}' | b']' => {
                depth -= 1;
                if depth == 0 {
                    return Ok(ptr);
                }
            }
            _ => {}
        }
        ptr += 1;
    }
    Err(Error::syntax(
        format!("Bracket `{}` not closed", &source[start..start + 1]),
        line_of(source, start),
    ))
}

/// Escapes text for use inside a JSON string literal.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\u{8}' => out.push_str("\\b"),
            '\u{c}' => out.push_str("\\f"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => out.push(c),
        }
    }
    out
}

/// Reverses [`escape`], also decoding `\/` and `\uXXXX` (surrogate pairs included).
///
/// Malformed escapes are kept verbatim.
pub fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let Some(&(_, next)) = chars.peek() else {
            out.push('\\');
            break;
        };
        let simple = match next {
            '"' => Some('"'),
            '/' => Some('/'),
            '\\' => Some('\\'),
            'b' => Some('\u{8}'),
            'f' => Some('\u{c}'),
            'n' => Some('\n'),
            'r' => Some('\r'),
            't' => Some('\t'),
            _ => None,
        };
        if let Some(decoded) = simple {
            out.push(decoded);
            chars.next();
            continue;
        }
        if next == 'u' {
            if let Some((decoded, consumed)) = decode_unicode_escape(&text[i..]) {
                out.push(decoded);
                for _ in 1..consumed {
                    chars.next();
                }
                continue;
            }
        }
        out.push('\\');
    }
    out
}

/// Decodes `\uXXXX` (or a `\uXXXX\uXXXX` surrogate pair) at the start of `text`.
fn decode_unicode_escape(text: &str) -> Option<(char, usize)> {
    let unit = |s: &str| -> Option<u32> {
        let hex = s.get(2..6)?;
        if s.starts_with("\\u") && hex.chars().all(|c| c.is_ascii_hexdigit()) {
            u32::from_str_radix(hex, 16).ok()
        } else {
            None
        }
    };
    let high = unit(text)?;
    if (0xD800..0xDC00).contains(&high) {
        let low = unit(text.get(6..)?)?;
        if !(0xDC00..0xE000).contains(&low) {
            return None;
        }
        let code = 0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00);
        return char::from_u32(code).map(|c| (c, 12));
    }
    char::from_u32(high).map(|c| (c, 6))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries<'s>(node: &JsonNode<'s>) -> Vec<JsonEntry<'s>> {
        node.entries().collect::<Result<_, _>>().unwrap()
    }

    #[test]
    fn test_object_entries() {
        let source = r#"{"a": "b", "c": 1, "d": {"e": "f"}}"#;
        let root = JsonNode::new(source, 0).unwrap();
        assert_eq!(root.kind(), JsonKind::Object);
        assert_eq!(root.end(), source.len() - 1);

        let items = entries(&root);
        assert_eq!(items.len(), 3);
        assert_eq!(
            items[0].key,
            Some(JsonKey {
                text: "a",
                position: 2
            })
        );
        assert_eq!(
            items[0].value,
            JsonValue::String {
                value: "b",
                position: 7
            }
        );
        assert_eq!(
            items[1].value,
            JsonValue::Other {
                literal: "1",
                position: 16
            }
        );
        let JsonValue::Container(inner) = items[2].value else {
            panic!("expected a container");
        };
        assert_eq!(&source[inner.start()..=inner.end()], r#"{"e": "f"}"#);
        assert_eq!(entries(&inner)[0].key.unwrap().text, "e");
    }

    #[test]
    fn test_array_entries_and_anchors() {
        let source = r#"[ "a", [1, 2], null ]"#;
        let root = JsonNode::new(source, 0).unwrap();
        let items = entries(&root);
        assert_eq!(items.len(), 3);
        assert!(items.iter().all(|entry| entry.key.is_none()));
        assert_eq!(items[0].value.anchor(), 2);
        assert_eq!(items[1].value.anchor(), 7);
        assert_eq!(items[1].value.token_end(), 13);
        assert_eq!(items[2].value.anchor(), 15);
        assert_eq!(items[2].value.token_end(), 19);
    }

    #[test]
    fn test_strings_are_raw() {
        let source = r#"{"k\"ey": "va\\lue \"q\" {[ ]}"}"#;
        let root = JsonNode::new(source, 0).unwrap();
        let items = entries(&root);
        assert_eq!(items[0].key.unwrap().text, r#"k\"ey"#);
        assert_eq!(
            items[0].value,
            JsonValue::String {
                value: r#"va\\lue \"q\" {[ ]}"#,
                position: 11
            }
        );
    }

    #[test]
    fn test_leading_whitespace_and_empty_containers() {
        let source = "\n  {}";
        let root = JsonNode::new(source, 0).unwrap();
        assert_eq!(root.start(), 3);
        assert_eq!(root.entries().count(), 0);
        let array = JsonNode::new("[ ]", 0).unwrap();
        assert_eq!(array.entries().count(), 0);
    }

    #[test]
    fn test_not_a_container() {
        let err = JsonNode::new("\n \"a\"", 0).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Was expecting whitespace or one of `[{`, found `\"` instead on line 2"
        );
    }

    #[test]
    fn test_unclosed_bracket() {
        let err = JsonNode::new("{\"a\": [1, 2}", 0).unwrap_err();
        assert!(err.to_string().contains("not closed"));
    }

    #[test]
    fn test_missing_colon() {
        let root = JsonNode::new("{\"a\" \"b\"}", 0).unwrap();
        let err = root.entries().next().unwrap().unwrap_err();
        assert_eq!(err.to_string(), "Was expecting `:`, found `\"` instead on line 1");
    }

    #[test]
    fn test_escape_unescape() {
        assert_eq!(escape("a \"b\"\n\\"), r#"a \"b\"\n\\"#);
        assert_eq!(unescape(r#"a \"b\"\n\\ \/"#), "a \"b\"\n\\ /");
        assert_eq!(unescape(r"\u00e9\ud83d\ude00"), "é😀");
        assert_eq!(unescape(r"bad \x and \u12"), r"bad \x and \u12");
        assert_eq!(unescape(&escape("tab\there\r\u{8}\u{c}")), "tab\there\r\u{8}\u{c}");
    }
}
