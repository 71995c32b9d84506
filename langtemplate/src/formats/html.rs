//! HTML documents.
//!
//! The content of every translatable element (`<p>` unless configured otherwise) is extracted
//! verbatim, inline markup included, and keyed by the element's path in the document, eg
//! `/html/body/p[2]`. A translatable element is never searched for further translatable
//! elements.

use std::collections::HashMap;

use crate::{
    compiler::{ParseState, StringCursor, ordered},
    error::Error,
    options::HandlerOptions,
    scanner::xml::{Dialect, XmlNode},
    strings::OpenString,
    traits::{Handler, Parsed},
    transcriber::{SourceText, Transcriber},
};

/// Handler for HTML pages and fragments.
#[derive(Debug, Clone, Default)]
pub struct HtmlHandler {
    options: HandlerOptions,
}

/// An element together with its path.
struct Located<'s> {
    node: XmlNode<'s>,
    path: String,
}

impl HtmlHandler {
    pub fn new(options: HandlerOptions) -> Self {
        HtmlHandler { options }
    }

    fn is_translatable(&self, node: &XmlNode<'_>) -> bool {
        self.options
            .translatable_tags
            .iter()
            .any(|tag| tag.eq_ignore_ascii_case(node.tag()))
    }

    /// Walks the elements depth first in document order, descending into every element that
    /// is not translatable itself.
    fn extract(
        &self,
        elements: Vec<Located<'_>>,
        transcriber: &mut Transcriber<'_>,
        state: &mut ParseState,
    ) -> Result<(), Error> {
        let mut levels = vec![elements.into_iter()];
        while let Some(level) = levels.last_mut() {
            let Some(Located { node, path }) = level.next() else {
                levels.pop();
                continue;
            };
            if !self.is_translatable(&node) {
                levels.push(locate(node.children(), &path)?.into_iter());
                continue;
            }
            let (Some(position), Some(content)) = (node.text_position(), node.content()?) else {
                continue;
            };
            if content.trim().is_empty() {
                continue;
            }
            if !state.claim_key(&path) {
                transcriber.copy_until(node.position());
                return Err(Error::DuplicateKey {
                    key: path,
                    line: transcriber.line_number(),
                });
            }
            let string = OpenString::new(path, content).with_order(state.next_order());
            transcriber.copy_until(position);
            transcriber.add(string.template_replacement());
            transcriber.skip(content.len());
            state.push(string);
        }
        Ok(())
    }

    fn insert(
        &self,
        elements: Vec<Located<'_>>,
        transcriber: &mut Transcriber<'_>,
        cursor: &mut StringCursor<'_>,
    ) -> Result<(), Error> {
        let mut levels = vec![elements.into_iter()];
        while let Some(level) = levels.last_mut() {
            let Some(Located { node, path }) = level.next() else {
                levels.pop();
                continue;
            };
            if !self.is_translatable(&node) {
                levels.push(locate(node.children(), &path)?.into_iter());
                continue;
            }
            let (Some(position), Some(content)) = (node.text_position(), node.content()?) else {
                continue;
            };
            if content.trim().is_empty() {
                continue;
            }
            match cursor.take_exact(content) {
                Some(string) => {
                    transcriber.copy_until(position);
                    transcriber.add(string.singular().unwrap_or(content));
                    transcriber.skip(content.len());
                }
                None => {
                    transcriber.copy_until(node.position());
                    transcriber.mark_section_start();
                    transcriber.copy_until(node.tail_position()?);
                    transcriber.mark_section_end();
                    transcriber.remove_section(0);
                }
            }
        }
        Ok(())
    }
}

/// Collects one level of siblings, naming each element after its tag and, when the tag is
/// shared with other siblings, its 1-based position among them.
fn locate<'s>(
    siblings: impl Iterator<Item = Result<XmlNode<'s>, Error>>,
    parent: &str,
) -> Result<Vec<Located<'s>>, Error> {
    let elements: Vec<XmlNode<'s>> = siblings
        .filter(|node| match node {
            Ok(node) => !node.is_comment() && !node.tag().starts_with(['!', '?']),
            Err(_) => true,
        })
        .collect::<Result<_, _>>()?;

    let mut totals: HashMap<String, usize> = HashMap::new();
    for node in &elements {
        *totals.entry(node.tag().to_ascii_lowercase()).or_default() += 1;
    }

    let mut seen: HashMap<String, usize> = HashMap::new();
    Ok(elements
        .into_iter()
        .map(|node| {
            let tag = node.tag().to_ascii_lowercase();
            let index = seen.entry(tag.clone()).or_default();
            *index += 1;
            let path = if totals[&tag] > 1 {
                format!("{parent}/{tag}[{index}]")
            } else {
                format!("{parent}/{tag}")
            };
            Located { node, path }
        })
        .collect())
}

impl Handler for HtmlHandler {
    fn name(&self) -> &'static str {
        "HTML"
    }

    fn extension(&self) -> &'static str {
        "html"
    }

    fn parse(&self, content: &str) -> Result<Parsed, Error> {
        let source = SourceText::new(content);
        let mut transcriber = Transcriber::new(&source);
        let mut state = ParseState::new();
        let top_level = XmlNode::top_level_with_dialect(source.as_str(), 0, Dialect::Html);
        self.extract(locate(top_level, "")?, &mut transcriber, &mut state)?;
        transcriber.copy_until(source.len());

        log::debug!("extracted {} strings from HTML", state.len());
        Ok((
            transcriber.get_destination(self.options.newline_type),
            state.into_stringset(),
        ))
    }

    /// Writes the translations in a single pass, removing every translatable element whose
    /// string is missing.
    fn compile(&self, template: &str, stringset: &[OpenString]) -> Result<String, Error> {
        let stringset = ordered(stringset);
        let source = SourceText::new(template);
        let mut transcriber = Transcriber::new(&source);
        let mut cursor = StringCursor::new(&stringset);
        let top_level = XmlNode::top_level_with_dialect(source.as_str(), 0, Dialect::Html);
        self.insert(locate(top_level, "")?, &mut transcriber, &mut cursor)?;
        transcriber.copy_until(source.len());
        Ok(transcriber.get_destination(self.options.newline_type))
    }
}
