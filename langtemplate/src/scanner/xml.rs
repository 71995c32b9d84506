//! Position-aware scanner for XML-like markup.
//!
//! An [`XmlNode`] describes one tag of a larger document without building a tree. Every
//! position it reports is an absolute byte offset into the scanned source, and every slice it
//! hands out borrows from that source unchanged (nothing is unescaped).
//!
//! For `<a key="value">b</a> tail here`:
//!
//! | accessor          | value                    |
//! |-------------------|--------------------------|
//! | `position()`      | `0`                      |
//! | `tag()`           | `"a"`                    |
//! | `attributes()`    | `[(3, "key", 8, "value")]` |
//! | `text_position()` | `Some(15)`               |
//! | `text()`          | `Some("b")`              |
//! | `content_end()`   | `Some(16)`               |
//! | `tail_position()` | `20`                     |
//! | `tail()`          | `" tail here"`           |
//! | `end()`           | `30`                     |

use std::cell::OnceCell;

use crate::error::{Error, line_of};

/// Tag name reported for `<!-- ... -->` comments.
pub const COMMENT: &str = "!--";

const CDATA_START: &str = "<![CDATA[";
const CDATA_END: &str = "]]>";

const HTML_RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

const HTML_VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param",
    "source", "track", "wbr",
];

/// Markup flavour the scanner follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dialect {
    /// Every element needs a closing tag unless it is written as `<x/>`.
    #[default]
    Xml,
    /// Void elements such as `<br>` have no body; tag names compare case-insensitively.
    Html,
}

impl Dialect {
    fn is_void(&self, tag: &str) -> bool {
        match self {
            Dialect::Xml => false,
            Dialect::Html => HTML_VOID_ELEMENTS
                .iter()
                .any(|void| void.eq_ignore_ascii_case(tag)),
        }
    }

    /// Elements whose body is text up to their closing tag, eg `<script>`.
    fn is_raw_text(&self, tag: &str) -> bool {
        match self {
            Dialect::Xml => false,
            Dialect::Html => HTML_RAW_TEXT_ELEMENTS
                .iter()
                .any(|raw| raw.eq_ignore_ascii_case(tag)),
        }
    }

    fn same_tag(&self, a: &str, b: &str) -> bool {
        match self {
            Dialect::Xml => a == b,
            Dialect::Html => a.eq_ignore_ascii_case(b),
        }
    }
}

/// One attribute of an opening tag, positions pointing at the first byte of key and value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attribute<'s> {
    pub key_position: usize,
    pub key: &'s str,
    pub value_position: usize,
    pub value: &'s str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Closing {
    content_end: Option<usize>,
    tail_position: usize,
}

/// A single tag of a markup document.
#[derive(Debug, Clone)]
pub struct XmlNode<'s> {
    source: &'s str,
    dialect: Dialect,
    position: usize,
    tag: &'s str,
    attributes: Vec<Attribute<'s>>,
    text_position: Option<usize>,
    text: Option<&'s str>,
    closing: OnceCell<Closing>,
}

impl<'s> XmlNode<'s> {
    /// Scans the first tag found at or after `start`.
    pub fn new(source: &'s str, start: usize) -> Result<Self, Error> {
        Self::with_dialect(source, start, Dialect::Xml)
    }

    pub fn with_dialect(source: &'s str, start: usize, dialect: Dialect) -> Result<Self, Error> {
        let position = find_next_lt(source, start);
        let mut node = XmlNode {
            source,
            dialect,
            position,
            tag: "",
            attributes: Vec::new(),
            text_position: None,
            text: None,
            closing: OnceCell::new(),
        };

        if position >= source.len() {
            return Err(node.error("Opening tag not closed"));
        }
        if source[position..].starts_with("<!--") {
            node.scan_comment()?;
            return Ok(node);
        }

        node.tag = node.scan_tag_name()?;
        if node.tag.starts_with('/') {
            return Err(node.error(format!(
                "Invalid closing of tag '{}'",
                &node.tag[1..]
            )));
        }
        if node.tag.starts_with('?') || node.tag.starts_with('!') {
            node.scan_declaration()?;
            return Ok(node);
        }

        let ptr = node.scan_attributes()?;
        node.scan_opening_end(ptr)?;
        Ok(node)
    }

    /// Iterates the sibling nodes that make up a markup fragment, starting at `start`.
    pub fn top_level(source: &'s str, start: usize) -> TopLevel<'s> {
        Self::top_level_with_dialect(source, start, Dialect::Xml)
    }

    pub fn top_level_with_dialect(source: &'s str, start: usize, dialect: Dialect) -> TopLevel<'s> {
        TopLevel {
            source,
            dialect,
            next: Some(start),
        }
    }

    fn scan_comment(&mut self) -> Result<(), Error> {
        self.tag = COMMENT;
        let text_position = self.position + "<!--".len();
        let Some(offset) = self.source[text_position..].find("-->") else {
            return Err(self.error("Comment not closed"));
        };
        let content_end = text_position + offset;
        self.text_position = Some(text_position);
        self.text = Some(&self.source[text_position..content_end]);
        let _ = self.closing.set(Closing {
            content_end: Some(content_end),
            tail_position: content_end + "-->".len(),
        });
        Ok(())
    }

    fn scan_tag_name(&self) -> Result<&'s str, Error> {
        let start = self.position + 1;
        // a leading '/' belongs to the name so that stray closing tags can be reported
        let skip = usize::from(self.source[start..].starts_with('/'));
        for (offset, c) in self.source[start + skip..].char_indices() {
            if c == '/' || c == '>' || c.is_whitespace() {
                return Ok(&self.source[start..start + skip + offset]);
            }
        }
        Err(self.error("Opening tag not closed"))
    }

    fn scan_declaration(&mut self) -> Result<(), Error> {
        let Some(offset) = self.source[self.position..].find('>') else {
            return Err(self.error(format!("Opening tag '{}' not closed", self.tag)));
        };
        let _ = self.closing.set(Closing {
            content_end: None,
            tail_position: self.position + offset + 1,
        });
        Ok(())
    }

    /// Reads the attributes and returns the position of the `/` or `>` ending the opening tag.
    fn scan_attributes(&mut self) -> Result<usize, Error> {
        enum State {
            Between,
            InKey,
            KeyEnd,
            AfterKey,
            InValue(char),
            InBareValue,
        }

        let bytes_start = self.position + 1 + self.tag.len();
        let mut state = State::Between;
        let mut key_position = 0;
        let mut key_end = 0;
        let mut value_position = 0;

        for (offset, c) in self.source[bytes_start..].char_indices() {
            let ptr = bytes_start + offset;
            match state {
                State::Between => {
                    if c == '/' || c == '>' {
                        return Ok(ptr);
                    } else if !c.is_whitespace() {
                        state = State::InKey;
                        key_position = ptr;
                        key_end = ptr + c.len_utf8();
                    }
                }
                State::InKey => {
                    if c == '=' {
                        state = State::AfterKey;
                    } else if c == '/' || c == '>' {
                        self.push_attribute(key_position, key_end, ptr, ptr);
                        return Ok(ptr);
                    } else if c.is_whitespace() {
                        state = State::KeyEnd;
                    } else {
                        key_end = ptr + c.len_utf8();
                    }
                }
                State::KeyEnd => {
                    if c == '=' {
                        state = State::AfterKey;
                    } else if c == '/' || c == '>' {
                        self.push_attribute(key_position, key_end, ptr, ptr);
                        return Ok(ptr);
                    } else if !c.is_whitespace() {
                        // `<input disabled name="x">`
                        self.push_attribute(key_position, key_end, key_end, key_end);
                        state = State::InKey;
                        key_position = ptr;
                        key_end = ptr + c.len_utf8();
                    }
                }
                State::AfterKey => {
                    if c == '"' || c == '\'' {
                        state = State::InValue(c);
                        value_position = ptr + 1;
                    } else if c == '>' {
                        self.push_attribute(key_position, key_end, ptr, ptr);
                        return Ok(ptr);
                    } else if !c.is_whitespace() {
                        state = State::InBareValue;
                        value_position = ptr;
                    }
                }
                State::InValue(quote) => {
                    if c == quote {
                        self.push_attribute(key_position, key_end, value_position, ptr);
                        state = State::Between;
                    }
                }
                State::InBareValue => {
                    if c.is_whitespace() {
                        self.push_attribute(key_position, key_end, value_position, ptr);
                        state = State::Between;
                    } else if c == '>' {
                        self.push_attribute(key_position, key_end, value_position, ptr);
                        return Ok(ptr);
                    }
                }
            }
        }
        Err(self.error(format!("Opening tag '{}' not closed", self.tag)))
    }

    fn push_attribute(&mut self, key_position: usize, key_end: usize, value_position: usize, value_end: usize) {
        self.attributes.push(Attribute {
            key_position,
            key: &self.source[key_position..key_end],
            value_position,
            value: &self.source[value_position..value_end],
        });
    }

    fn scan_opening_end(&mut self, ptr: usize) -> Result<(), Error> {
        if self.source[ptr..].starts_with('/') {
            // self-closing, eg `<br />`
            for (offset, c) in self.source[ptr + 1..].char_indices() {
                if c.is_whitespace() {
                    continue;
                }
                if c == '>' {
                    let _ = self.closing.set(Closing {
                        content_end: None,
                        tail_position: ptr + 1 + offset + 1,
                    });
                    return Ok(());
                }
                break;
            }
            return Err(self.error(format!("Opening tag '{}' not closed", self.tag)));
        }

        if self.dialect.is_void(self.tag) {
            let _ = self.closing.set(Closing {
                content_end: None,
                tail_position: ptr + 1,
            });
            return Ok(());
        }

        let text_position = ptr + 1;
        if self.dialect.is_raw_text(self.tag) {
            return self.scan_raw_text(text_position);
        }
        let next_lt = find_next_lt(self.source, text_position);
        if next_lt == self.source.len() {
            return Err(self.error(format!("Tag '{}' not closed", self.tag)));
        }
        self.text_position = Some(text_position);
        self.text = Some(&self.source[text_position..next_lt]);
        Ok(())
    }

    fn scan_raw_text(&mut self, text_position: usize) -> Result<(), Error> {
        let closing_tag = format!("</{}", self.tag.to_ascii_lowercase());
        let content_end = self.source[text_position..]
            .to_ascii_lowercase()
            .find(&closing_tag)
            .map(|offset| text_position + offset);
        let tail_position = content_end.and_then(|end| {
            self.source[end..]
                .find('>')
                .map(|offset| end + offset + 1)
        });
        let (Some(content_end), Some(tail_position)) = (content_end, tail_position) else {
            return Err(self.error(format!("Tag '{}' not closed", self.tag)));
        };
        self.text_position = Some(text_position);
        self.text = Some(&self.source[text_position..content_end]);
        let _ = self.closing.set(Closing {
            content_end: Some(content_end),
            tail_position,
        });
        Ok(())
    }

    fn error(&self, message: impl Into<String>) -> Error {
        Error::syntax(message, line_of(self.source, self.position))
    }

    /// The source this node was scanned from.
    pub fn source(&self) -> &'s str {
        self.source
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Position of the opening `<`.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Name of the tag; [`COMMENT`] for comments.
    pub fn tag(&self) -> &'s str {
        self.tag
    }

    pub fn is_comment(&self) -> bool {
        self.tag == COMMENT
    }

    pub fn attributes(&self) -> &[Attribute<'s>] {
        &self.attributes
    }

    /// Value of the first attribute named `key`.
    pub fn attrib(&self, key: &str) -> Option<&'s str> {
        self.attributes
            .iter()
            .find(|attribute| attribute.key == key)
            .map(|attribute| attribute.value)
    }

    /// Start of the tag's body, `None` for tags without one (`<br/>`).
    pub fn text_position(&self) -> Option<usize> {
        self.text_position
    }

    /// Text between the opening tag and the first child (or the closing tag).
    ///
    /// `None` means the tag has no body at all, `Some("")` an empty body.
    pub fn text(&self) -> Option<&'s str> {
        self.text
    }

    /// Direct children of this node, scanned lazily.
    pub fn children(&self) -> Children<'_, 's> {
        Children {
            node: self,
            next: self.body_start(),
        }
    }

    /// Where the first child or the closing tag may start.
    fn body_start(&self) -> Option<usize> {
        match (self.text_position, self.text) {
            (Some(position), Some(text)) if !self.is_comment() => Some(position + text.len()),
            _ => None,
        }
    }

    /// Finds the matching closing tag, keeping the still open descendants on a stack so that
    /// nesting depth costs heap rather than call frames.
    fn closing(&self) -> Result<Closing, Error> {
        if let Some(closing) = self.closing.get() {
            return Ok(*closing);
        }
        let Some(mut ptr) = self.body_start() else {
            return Err(self.error(format!("Tag '{}' not closed", self.tag)));
        };
        let mut open: Vec<XmlNode<'s>> = Vec::new();
        loop {
            if ptr >= self.source.len() {
                let innermost = open.last().unwrap_or(self);
                return Err(innermost.error(format!("Tag '{}' not closed", innermost.tag)));
            }
            if self.source[ptr + 1..].starts_with('/') {
                let Some(node) = open.pop() else {
                    return self.close_at(ptr);
                };
                ptr = find_next_lt(self.source, node.close_at(ptr)?.tail_position);
                continue;
            }
            let node = XmlNode::with_dialect(self.source, ptr, self.dialect)?;
            match (node.closing.get(), node.body_start()) {
                (Some(closing), _) => ptr = find_next_lt(self.source, closing.tail_position),
                (None, Some(body_start)) => {
                    ptr = body_start;
                    open.push(node);
                }
                (None, None) => return Err(node.error(format!("Tag '{}' not closed", node.tag))),
            }
        }
    }

    /// Checks the closing tag starting at `start` against this node and memoises where the
    /// node ends.
    fn close_at(&self, start: usize) -> Result<Closing, Error> {
        let source = self.source;
        let name_start = start + 2;
        let name_end = source[name_start..]
            .find(|c: char| c == '>' || c.is_whitespace())
            .map_or(source.len(), |offset| name_start + offset);
        let closing_tag = &source[name_start..name_end];
        if !self.dialect.same_tag(closing_tag, self.tag) {
            return Err(self.error(format!(
                "Closing tag '{}' does not match opening tag '{}'",
                closing_tag, self.tag
            )));
        }
        for (offset, c) in source[name_end..].char_indices() {
            if c.is_whitespace() {
                continue;
            }
            if c == '>' {
                let closing = Closing {
                    content_end: Some(start),
                    tail_position: name_end + offset + 1,
                };
                let _ = self.closing.set(closing);
                return Ok(closing);
            }
            break;
        }
        Err(self.error(format!("Invalid closing of tag '{}'", self.tag)))
    }

    /// End of the tag's whole body (text and children), where the closing tag begins.
    pub fn content_end(&self) -> Result<Option<usize>, Error> {
        Ok(self.closing()?.content_end)
    }

    /// The tag's whole body, `None` for tags without one.
    pub fn content(&self) -> Result<Option<&'s str>, Error> {
        if self.is_comment() {
            return Ok(self.text);
        }
        match (self.text_position, self.content_end()?) {
            (Some(start), Some(end)) => Ok(Some(&self.source[start..end])),
            _ => Ok(None),
        }
    }

    /// Position right after the tag (after its closing tag, if any).
    pub fn tail_position(&self) -> Result<usize, Error> {
        Ok(self.closing()?.tail_position)
    }

    /// Text following the tag up to the next tag or the end of the source.
    pub fn tail(&self) -> Result<&'s str, Error> {
        let tail_position = self.tail_position()?;
        Ok(&self.source[tail_position..find_next_lt(self.source, tail_position)])
    }

    /// Start of the next tag, or the end of the source.
    pub fn end(&self) -> Result<usize, Error> {
        let tail_position = self.tail_position()?;
        Ok(find_next_lt(self.source, tail_position))
    }
}

/// Iterator over the direct children of an [`XmlNode`].
///
/// Reaching the closing tag memoises the parent's content end and tail position. Each child
/// is scanned to its own end before it is yielded.
#[derive(Debug)]
pub struct Children<'n, 's> {
    node: &'n XmlNode<'s>,
    next: Option<usize>,
}

impl<'s> Iterator for Children<'_, 's> {
    type Item = Result<XmlNode<'s>, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        let start = self.next.take()?;
        let source = self.node.source;
        if start >= source.len() {
            return Some(Err(self
                .node
                .error(format!("Tag '{}' not closed", self.node.tag))));
        }
        if source[start + 1..].starts_with('/') {
            return self.node.close_at(start).err().map(Err);
        }
        let child = match XmlNode::with_dialect(source, start, self.node.dialect) {
            Ok(child) => child,
            Err(e) => return Some(Err(e)),
        };
        match child.end() {
            Ok(end) => {
                self.next = Some(end);
                Some(Ok(child))
            }
            Err(e) => Some(Err(e)),
        }
    }
}

/// Iterator over sibling nodes at the top level of a fragment.
#[derive(Debug)]
pub struct TopLevel<'s> {
    source: &'s str,
    dialect: Dialect,
    next: Option<usize>,
}

impl<'s> Iterator for TopLevel<'s> {
    type Item = Result<XmlNode<'s>, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        let start = self.next.take()?;
        if find_next_lt(self.source, start) >= self.source.len() {
            return None;
        }
        let node = match XmlNode::with_dialect(self.source, start, self.dialect) {
            Ok(node) => node,
            Err(e) => return Some(Err(e)),
        };
        match node.end() {
            Ok(end) => {
                self.next = Some(end);
                Some(Ok(node))
            }
            Err(e) => Some(Err(e)),
        }
    }
}

/// Position of the next `<` at or after `start` that is not inside a CDATA block.
pub fn find_next_lt(source: &str, start: usize) -> usize {
    let mut ptr = start;
    while let Some(offset) = source.get(ptr..).and_then(|rest| rest.find('<')) {
        let found = ptr + offset;
        if !source[found..].starts_with(CDATA_START) {
            return found;
        }
        match source[found..].find(CDATA_END) {
            Some(end) => ptr = found + end + CDATA_END.len(),
            None => return source.len(),
        }
    }
    source.len()
}
