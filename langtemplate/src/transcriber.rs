//! Cursor-based transcription of a source document into an edited copy.
//!
//! A [`Transcriber`] walks over the (newline-normalised) source with a pointer and builds the
//! destination out of verbatim source slices and inserted literals. Parts of the destination
//! can be grouped into sections and retracted later, which is how a compile run drops a unit
//! whose translation is missing after it has already been written out.
//!
//! ```text
//! source:      <string name="foo">hello world</string>
//! ptr:                            ^
//! destination: ['<string name="foo">', 'aee8cc2abd5abd5a87cd784be_tr']
//! ```

use std::{borrow::Cow, ops::Range};

use serde::{Deserialize, Serialize};

/// Line-ending style of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NewlineType {
    /// `\n`
    #[default]
    Unix,
    /// `\r\n`
    Dos,
}

impl NewlineType {
    /// A document is treated as DOS as soon as it contains one `\r\n` sequence.
    pub fn detect(content: &str) -> Self {
        if content.contains("\r\n") {
            NewlineType::Dos
        } else {
            NewlineType::Unix
        }
    }

    /// Renders a `\n`-normalised chunk with this newline style.
    pub fn apply<'a>(&self, chunk: &'a str) -> Cow<'a, str> {
        match self {
            NewlineType::Dos if chunk.contains('\n') => Cow::Owned(chunk.replace('\n', "\r\n")),
            _ => Cow::Borrowed(chunk),
        }
    }
}

/// A document with its line endings normalised to `\n`.
///
/// Every position reported by the scanners refers to [`SourceText::as_str`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceText {
    text: String,
    newline_type: NewlineType,
}

impl SourceText {
    pub fn new(content: &str) -> Self {
        let newline_type = NewlineType::detect(content);
        let text = match newline_type {
            NewlineType::Dos => content.replace("\r\n", "\n"),
            NewlineType::Unix => content.to_string(),
        };
        SourceText { text, newline_type }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn newline_type(&self) -> NewlineType {
        self.newline_type
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Chunk {
    Source(Range<usize>),
    Literal(String),
    Tombstone,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Section {
    start: usize,
    end: Option<usize>,
    removed: bool,
}

/// Builds a destination document out of a [`SourceText`].
#[derive(Debug)]
pub struct Transcriber<'s> {
    source: &'s str,
    newline_type: NewlineType,
    destination: Vec<Chunk>,
    sections: Vec<Section>,
    open_sections: Vec<usize>,
    ptr: usize,
    newline_count: usize,
}

impl<'s> Transcriber<'s> {
    pub fn new(source: &'s SourceText) -> Self {
        Transcriber {
            source: source.as_str(),
            newline_type: source.newline_type(),
            destination: Vec::new(),
            sections: Vec::new(),
            open_sections: Vec::new(),
            ptr: 0,
            newline_count: 0,
        }
    }

    /// The normalised source this transcriber reads from.
    pub fn source(&self) -> &'s str {
        self.source
    }

    /// Current position of the cursor in the source.
    pub fn ptr(&self) -> usize {
        self.ptr
    }

    pub fn newline_type(&self) -> NewlineType {
        self.newline_type
    }

    /// Copies the next `offset` bytes of the source.
    pub fn copy(&mut self, offset: usize) {
        self.copy_until(self.ptr + offset);
    }

    /// Copies the source from the cursor up to (excluding) `end`.
    pub fn copy_until(&mut self, end: usize) {
        self.advance_to(end);
        let start = self.ptr;
        if end > start {
            self.destination.push(Chunk::Source(start..end));
        }
        self.ptr = end;
    }

    /// Appends `text` without moving the cursor.
    pub fn add(&mut self, text: impl Into<String>) {
        let text = text.into();
        if !text.is_empty() {
            self.destination.push(Chunk::Literal(text));
        }
    }

    /// Moves the cursor `offset` bytes forward without copying anything.
    pub fn skip(&mut self, offset: usize) {
        self.skip_until(self.ptr + offset);
    }

    /// Moves the cursor to `end` without copying anything.
    pub fn skip_until(&mut self, end: usize) {
        self.advance_to(end);
        self.ptr = end;
    }

    fn advance_to(&mut self, end: usize) {
        assert!(
            end >= self.ptr,
            "transcriber cannot move backwards (from {} to {})",
            self.ptr,
            end
        );
        assert!(
            end <= self.source.len(),
            "transcriber position {} is past the end of the source ({} bytes)",
            end,
            self.source.len()
        );
        self.newline_count += self.source.as_bytes()[self.ptr..end]
            .iter()
            .filter(|&&b| b == b'\n')
            .count();
    }

    pub fn mark_section_start(&mut self) {
        self.open_sections.push(self.sections.len());
        self.sections.push(Section {
            start: self.destination.len(),
            end: None,
            removed: false,
        });
    }

    /// Closes the most recently opened section that is still open.
    pub fn mark_section_end(&mut self) {
        if let Some(index) = self.open_sections.pop() {
            self.sections[index].end = Some(self.destination.len());
        }
    }

    /// Retracts the `place`-th most recent live section (0 is the last one opened).
    ///
    /// Everything written inside it, nested sections included, is dropped from the
    /// destination. A section that was never closed extends to the end of the destination.
    pub fn remove_section(&mut self, place: usize) {
        let Some(index) = self
            .sections
            .iter()
            .enumerate()
            .rev()
            .filter(|(_, section)| !section.removed)
            .nth(place)
            .map(|(index, _)| index)
        else {
            return;
        };

        let start = self.sections[index].start;
        let end = self.sections[index].end.unwrap_or(self.destination.len());
        log::trace!("removing destination chunks {}..{}", start, end);

        for chunk in &mut self.destination[start..end] {
            *chunk = Chunk::Tombstone;
        }
        for (i, section) in self.sections.iter_mut().enumerate() {
            if i == index || (i > index && section.start < end) {
                section.removed = true;
            }
        }
        let sections = &self.sections;
        self.open_sections.retain(|&i| !sections[i].removed);
    }

    /// 1-based number of the line the cursor is on.
    pub fn line_number(&self) -> usize {
        self.newline_count + 1
    }

    /// Renders the destination, using the source's newline style unless `enforce` is given.
    pub fn get_destination(&self, enforce: Option<NewlineType>) -> String {
        let newline_type = enforce.unwrap_or(self.newline_type);
        let mut out = String::new();
        for chunk in &self.destination {
            let text = match chunk {
                Chunk::Source(range) => &self.source[range.clone()],
                Chunk::Literal(text) => text.as_str(),
                Chunk::Tombstone => continue,
            };
            out.push_str(&newline_type.apply(text));
        }
        out
    }
}
