//! Support for Android `strings.xml` resource files.
//!
//! Extracts `<string>` elements, the items of `<string-array>` elements (keyed `name[index]`)
//! and `<plurals>` elements, whose items become a single pluralized string. Elements marked
//! `translatable="false"` stay in the template untouched. A comment right before an element is
//! attached to its strings as the developer comment.

use std::collections::BTreeMap;

use quick_xml::{Reader, events::Event};

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

const RESOURCES_TAG: &str = "<resources";

/// Handler for Android `strings.xml` files.
#[derive(Debug, Clone, Default)]
pub struct AndroidStringsHandler {
    options: HandlerOptions,
}

/// Mutable state of one parse run.
struct Extraction<'t, 's> {
    transcriber: &'t mut Transcriber<'s>,
    state: ParseState,
    last_comment: String,
}

impl AndroidStringsHandler {
    pub fn new(options: HandlerOptions) -> Self {
        AndroidStringsHandler { options }
    }
}

impl Extraction<'_, '_> {
    fn push(&mut self, string: OpenString, node: &XmlNode<'_>) -> Result<(), Error> {
        if !self.state.claim(&string.key, &string.context) {
            return Err(Error::DuplicateKey {
                key: string.key,
                line: line_of(node.source(), node.position()),
            });
        }
        self.state.push(string);
        Ok(())
    }

    /// Replaces the body of `node` with the placeholder of a new string.
    fn string(&mut self, node: &XmlNode<'_>) -> Result<bool, Error> {
        let name = required_name(node)?;
        let (Some(position), Some(text)) = (node.text_position(), node.content()?) else {
            return Ok(false);
        };
        if text.trim().is_empty() {
            return Ok(false);
        }

        let string = OpenString::new(name, text)
            .with_context(node.attrib("product").unwrap_or_default())
            .with_order(self.state.next_order())
            .with_developer_comment(self.last_comment.clone());
        self.transcriber.copy_until(position);
        self.transcriber.add(string.template_replacement());
        self.transcriber.skip(text.len());
        self.push(string, node)?;
        Ok(true)
    }

    fn string_array(&mut self, node: &XmlNode<'_>) -> Result<bool, Error> {
        let name = required_name(node)?;
        let context = node.attrib("product").unwrap_or_default();
        let mut index = 0;
        for item in items(node) {
            let item = item?;
            let (Some(position), Some(text)) = (item.text_position(), item.content()?) else {
                continue;
            };
            if text.trim().is_empty() {
                continue;
            }

            let string = OpenString::new(format!("{name}[{index}]"), text)
                .with_context(context)
                .with_order(self.state.next_order())
                .with_developer_comment(self.last_comment.clone());
            index += 1;
            self.transcriber.copy_until(position);
            self.transcriber.add(string.template_replacement());
            self.transcriber.skip(text.len());
            self.push(string, &item)?;
        }
        Ok(index > 0)
    }

    /// Replaces all the items of `node` with one placeholder.
    ///
    /// Nothing is extracted when any item is empty.
    fn plurals(&mut self, node: &XmlNode<'_>) -> Result<(), Error> {
        let name = required_name(node)?;
        let mut strings = BTreeMap::new();
        let mut span: Option<(usize, usize)> = None;
        for item in items(node) {
            let item = item?;
            let line = line_of(item.source(), item.position());
            let quantity = item.attrib("quantity").ok_or_else(|| {
                Error::syntax("Plural 'item' tag does not have a 'quantity' attribute", line)
            })?;
            let rule: PluralRule = quantity.parse().map_err(|_| {
                Error::syntax(
                    format!("'quantity' attribute in 'item' tag has an invalid value '{quantity}'"),
                    line,
                )
            })?;
            let text = item.content()?.unwrap_or_default();
            if text.trim().is_empty() {
                return Ok(());
            }
            strings.insert(rule, text.to_string());
            let tail = item.tail_position()?;
            span = Some(span.map_or((item.position(), tail), |(start, _)| (start, tail)));
        }
        let Some((start, end)) = span else {
            return Ok(());
        };

        let string = OpenString::plural(name, strings)
            .with_context(node.attrib("product").unwrap_or_default())
            .with_order(self.state.next_order())
            .with_developer_comment(self.last_comment.clone());
        self.transcriber.copy_until(start);
        self.transcriber.add(string.template_replacement());
        self.transcriber.skip_until(end);
        self.push(string, node)
    }
}

fn required_name<'s>(node: &XmlNode<'s>) -> Result<&'s str, Error> {
    node.attrib("name").ok_or_else(|| {
        Error::syntax(
            format!("'{}' tag does not have a 'name' attribute", node.tag()),
            line_of(node.source(), node.position()),
        )
    })
}

fn is_translatable(node: &XmlNode<'_>) -> bool {
    node.attrib("translatable") != Some("false")
}

/// The `<item>` children of `node`, skipping comments.
fn items<'n, 's>(node: &'n XmlNode<'s>) -> impl Iterator<Item = Result<XmlNode<'s>, Error>> + 'n {
    node.children().filter_map(move |child| match child {
        Ok(child) if child.is_comment() => None,
        Ok(child) if child.tag() != "item" => Some(Err(Error::syntax(
            format!(
                "'{}' element inside '{}' tag is not 'item'",
                child.tag(),
                node.tag()
            ),
            line_of(child.source(), child.position()),
        ))),
        other => Some(other),
    })
}

fn find_resources(text: &str) -> Result<usize, Error> {
    text.find(RESOURCES_TAG)
        .ok_or_else(|| Error::syntax("Could not find a 'resources' tag", 1))
}

/// Checks that `content` is well-formed XML.
pub(crate) fn validate(content: &str) -> Result<(), Error> {
    let mut reader = Reader::from_str(content);
    loop {
        if let Event::Eof = reader.read_event()? {
            return Ok(());
        }
    }
}

/// Copies up to `end` and drops everything since the last section start.
pub(crate) fn remove_until(transcriber: &mut Transcriber<'_>, end: usize) {
    transcriber.copy_until(end);
    transcriber.mark_section_end();
    transcriber.remove_section(0);
}

/// Writes `string` over the body of `node`, returning whether the body held its placeholder.
fn compile_string(
    node: &XmlNode<'_>,
    transcriber: &mut Transcriber<'_>,
    cursor: &mut StringCursor<'_>,
) -> Result<bool, Error> {
    let (Some(position), Some(text)) = (node.text_position(), node.content()?) else {
        return Ok(true);
    };
    if text.trim().is_empty() {
        return Ok(true);
    }
    match cursor.take_exact(text) {
        Some(string) => {
            transcriber.copy_until(position);
            transcriber.add(string.singular().unwrap_or(text));
            transcriber.skip(text.len());
            Ok(true)
        }
        None => {
            remove_until(transcriber, node.tail_position()?);
            Ok(false)
        }
    }
}

fn compile_string_array(
    node: &XmlNode<'_>,
    transcriber: &mut Transcriber<'_>,
    cursor: &mut StringCursor<'_>,
) -> Result<(), Error> {
    let mut survived = false;
    let mut previous_tail = node.text_position().unwrap_or_else(|| transcriber.ptr());
    for item in items(node) {
        let item = item?;
        transcriber.copy_until(previous_tail);
        transcriber.mark_section_start();
        previous_tail = item.tail_position()?;
        if compile_string(&item, transcriber, cursor)? {
            survived = true;
        }
    }
    if !survived {
        remove_until(transcriber, node.tail_position()?);
    }
    Ok(())
}

/// A newline followed by the indentation of the line `offset` is on, when that line is blank
/// up to `offset`.
pub(crate) fn line_separator(content: &str, offset: usize) -> String {
    let line_start = content[..offset].rfind('\n').map_or(0, |i| i + 1);
    let indent = &content[line_start..offset];
    if indent.trim().is_empty() {
        format!("\n{indent}")
    } else {
        "\n".to_string()
    }
}

/// Regenerates one `<item>` per rule in place of the placeholder, indented like it.
fn compile_plurals(
    node: &XmlNode<'_>,
    transcriber: &mut Transcriber<'_>,
    cursor: &mut StringCursor<'_>,
) -> Result<(), Error> {
    let (Some(position), Some(content)) = (node.text_position(), node.content()?) else {
        return Ok(());
    };
    let Some(string) = cursor.take_plural_within(content) else {
        remove_until(transcriber, node.tail_position()?);
        return Ok(());
    };
    let placeholder = string.template_replacement();
    let Some(plurals) = string.plurals() else {
        return Ok(());
    };

    let offset = content.find(&placeholder).unwrap_or_default();
    let separator = line_separator(content, offset);
    let rendered = plurals
        .iter()
        .map(|(rule, text)| format!("<item quantity=\"{}\">{}</item>", rule.name(), text))
        .collect::<Vec<_>>()
        .join(&separator);

    transcriber.copy_until(position + offset);
    transcriber.add(rendered);
    transcriber.skip(placeholder.len());
    Ok(())
}

impl Handler for AndroidStringsHandler {
    fn name(&self) -> &'static str {
        "ANDROID"
    }

    fn extension(&self) -> &'static str {
        "xml"
    }

    fn parse(&self, content: &str) -> Result<Parsed, Error> {
        let source = SourceText::new(content);
        let text = source.as_str();
        let root = XmlNode::new(text, find_resources(text)?)?;

        let mut transcriber = Transcriber::new(&source);
        let mut extraction = Extraction {
            transcriber: &mut transcriber,
            state: ParseState::new(),
            last_comment: String::new(),
        };
        for child in root.children() {
            let child = child?;
            if child.is_comment() {
                extraction.last_comment = child.text().unwrap_or_default().trim().to_string();
                continue;
            }
            if !is_translatable(&child) {
                extraction.last_comment.clear();
                continue;
            }
            let consumed_comment = match child.tag() {
                "string" => extraction.string(&child)?,
                "string-array" => extraction.string_array(&child)?,
                "plurals" => {
                    extraction.plurals(&child)?;
                    true
                }
                _ => false,
            };
            if consumed_comment {
                extraction.last_comment.clear();
            }
        }
        let stringset = extraction.state.into_stringset();
        transcriber.copy_until(source.len());
        validate(text)?;

        log::debug!("extracted {} strings from Android resources", stringset.len());
        Ok((
            transcriber.get_destination(self.options.newline_type),
            stringset,
        ))
    }

    /// Writes the translations in a single pass, removing every element (with the whitespace
    /// before it) whose string is missing.
    fn compile(&self, template: &str, stringset: &[OpenString]) -> Result<String, Error> {
        let stringset = ordered(stringset);
        let source = SourceText::new(template);
        let text = source.as_str();
        let root = XmlNode::new(text, find_resources(text)?)?;

        let mut transcriber = Transcriber::new(&source);
        let mut cursor = StringCursor::new(&stringset);
        let mut previous_tail = root.text_position().unwrap_or(root.position());
        for child in root.children() {
            let child = child?;
            transcriber.copy_until(previous_tail);
            transcriber.mark_section_start();
            previous_tail = child.tail_position()?;
            if child.is_comment() || !is_translatable(&child) {
                continue;
            }
            match child.tag() {
                "string" => {
                    compile_string(&child, &mut transcriber, &mut cursor)?;
                }
                "string-array" => compile_string_array(&child, &mut transcriber, &mut cursor)?,
                "plurals" => compile_plurals(&child, &mut transcriber, &mut cursor)?,
                _ => {}
            }
        }
        transcriber.copy_until(source.len());
        Ok(transcriber.get_destination(self.options.newline_type))
    }
}

#[cfg(test)]
mod tests {
    use indoc::indoc;

    use super::*;

    const RESOURCES: &str = indoc! {r#"
        <?xml version="1.0" encoding="utf-8"?>
        <resources>
            <!-- Greeting on the home screen -->
            <string name="hello">Hello</string>
            <string name="app_name" translatable="false">Demo</string>
            <string name="tablet" product="tablet">Tablet</string>
            <string name="empty"></string>
            <string-array name="planets">
                <item>Mercury</item>
                <item></item>
                <item>Venus</item>
            </string-array>
            <plurals name="files">
                <item quantity="one">%d file</item>
                <item quantity="other">%d files</item>
            </plurals>
        </resources>
    "#};

    fn parse() -> Parsed {
        AndroidStringsHandler::default().parse(RESOURCES).unwrap()
    }

    #[test]
    fn test_parse() {
        let (template, stringset) = parse();
        let keys: Vec<_> = stringset.iter().map(|s| s.key.as_str()).collect();
        assert_eq!(
            keys,
            vec!["hello", "tablet", "planets[0]", "planets[1]", "files"]
        );
        assert_eq!(stringset[0].developer_comment, "Greeting on the home screen");
        assert_eq!(stringset[1].developer_comment, "");
        assert_eq!(stringset[1].context, "tablet");
        assert_eq!(stringset[3].singular(), Some("Venus"));

        let plural = &stringset[4];
        let plurals = plural.plurals().unwrap();
        assert_eq!(plurals[&PluralRule::One], "%d file");
        assert_eq!(plurals[&PluralRule::Other], "%d files");
        assert!(template.contains(&format!(
            "<plurals name=\"files\">\n        {}\n    </plurals>",
            plural.template_replacement()
        )));
        assert!(template.contains("<string name=\"app_name\" translatable=\"false\">Demo</string>"));
    }

    #[test]
    fn test_round_trip() {
        let handler = AndroidStringsHandler::default();
        let (template, stringset) = handler.parse(RESOURCES).unwrap();
        assert_eq!(handler.compile(&template, &stringset).unwrap(), RESOURCES);
    }

    #[test]
    fn test_compile_removes_missing_strings() {
        let handler = AndroidStringsHandler::default();
        let (template, stringset) = handler.parse(RESOURCES).unwrap();
        let kept: Vec<_> = stringset
            .into_iter()
            .filter(|s| s.key == "hello" || s.key == "planets[1]")
            .collect();
        let compiled = handler.compile(&template, &kept).unwrap();
        assert_eq!(
            compiled,
            indoc! {r#"
                <?xml version="1.0" encoding="utf-8"?>
                <resources>
                    <!-- Greeting on the home screen -->
                    <string name="hello">Hello</string>
                    <string name="app_name" translatable="false">Demo</string>
                    <string name="empty"></string>
                    <string-array name="planets">
                        <item></item>
                        <item>Venus</item>
                    </string-array>
                </resources>
            "#}
        );
    }

    #[test]
    fn test_compile_plural_translation() {
        let handler = AndroidStringsHandler::default();
        let (template, _) = handler.parse(RESOURCES).unwrap();
        let translation = OpenString::plural(
            "files",
            BTreeMap::from([
                (PluralRule::One, "%d fichier".to_string()),
                (PluralRule::Many, "%d de fichiers".to_string()),
                (PluralRule::Other, "%d fichiers".to_string()),
            ]),
        );
        let compiled = handler.compile(&template, &[translation]).unwrap();
        assert!(compiled.contains(indoc! {r#"
            <plurals name="files">
                    <item quantity="one">%d fichier</item>
                    <item quantity="many">%d de fichiers</item>
                    <item quantity="other">%d fichiers</item>
                </plurals>"#}));
        assert!(!compiled.contains("hello"));
    }

    #[test]
    fn test_plural_with_empty_item_is_skipped() {
        let content = r#"<resources><plurals name="p"><item quantity="one">a</item><item quantity="other"></item></plurals></resources>"#;
        let (template, stringset) = AndroidStringsHandler::default().parse(content).unwrap();
        assert!(stringset.is_empty());
        assert_eq!(template, content);
    }

    #[test]
    fn test_errors() {
        let handler = AndroidStringsHandler::default();
        let err = handler
            .parse("<resources>\n<string>x</string>\n</resources>")
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "'string' tag does not have a 'name' attribute on line 2"
        );

        let err = handler
            .parse("<resources>\n<plurals name=\"p\">\n<item quantity=\"lots\">x</item></plurals></resources>")
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "'quantity' attribute in 'item' tag has an invalid value 'lots' on line 3"
        );

        let err = handler
            .parse("<resources><string-array name=\"a\"><string>x</string></string-array></resources>")
            .unwrap_err();
        assert!(err.to_string().contains("'string' element inside 'string-array' tag is not 'item'"));

        let err = handler.parse("<nothing/>").unwrap_err();
        assert!(matches!(err, Error::StructuralSyntax { .. }));

        let err = handler
            .parse("<resources>\n  <string name=\"a\">x</string>\n  <string name=\"b\"\n</resources>")
            .unwrap_err();
        assert_eq!(err.line(), Some(3));
    }

    #[test]
    fn test_duplicate_name() {
        let err = AndroidStringsHandler::default()
            .parse("<resources>\n<string name=\"a\">x</string>\n<string name=\"a\">y</string>\n</resources>")
            .unwrap_err();
        assert_eq!(err.to_string(), "Duplicate string key ('a') in line 3");
    }

    #[test]
    fn test_string_and_plurals_share_names() {
        let err = AndroidStringsHandler::default()
            .parse(indoc! {r#"
                <resources>
                    <string name="a">x</string>
                    <plurals name="a">
                        <item quantity="one">one x</item>
                        <item quantity="other">many x</item>
                    </plurals>
                </resources>
            "#})
            .unwrap_err();
        assert_eq!(err.to_string(), "Duplicate string key ('a') in line 3");
    }

    #[test]
    fn test_malformed_markup_is_rejected() {
        let err = AndroidStringsHandler::default()
            .parse("<resources><string name=\"a\">x</string></resources>\n</extra>")
            .unwrap_err();
        assert!(matches!(err, Error::XmlParse(_)));
    }
}
