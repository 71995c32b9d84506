use std::fs;

use langtemplate::formats::{AndroidStringsHandler, JsonHandler};
use langtemplate::{Handler, OpenString};
use tempfile::TempDir;

#[test]
fn parse_file_strips_utf8_bom() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("en.json");
    let mut bytes = vec![0xEF, 0xBB, 0xBF];
    bytes.extend_from_slice(r#"{"hello": "Hello"}"#.as_bytes());
    fs::write(&path, bytes).unwrap();

    let (template, stringset) = JsonHandler::default().parse_file(&path).unwrap();
    assert!(template.starts_with('{'));
    assert_eq!(stringset.len(), 1);
    assert_eq!(stringset[0].singular(), Some("Hello"));
}

#[test]
fn parse_file_decodes_utf16le() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("strings.xml");
    let content = "<resources>\n    <string name=\"greeting\">Grüß dich</string>\n</resources>\n";
    let mut bytes = vec![0xFF, 0xFE];
    for unit in content.encode_utf16() {
        bytes.extend_from_slice(&unit.to_le_bytes());
    }
    fs::write(&path, bytes).unwrap();

    let handler = AndroidStringsHandler::default();
    let (template, stringset) = handler.parse_file(&path).unwrap();
    assert_eq!(stringset[0].key, "greeting");
    assert_eq!(stringset[0].singular(), Some("Grüß dich"));
    assert_eq!(handler.compile(&template, &stringset).unwrap(), content);
}

#[test]
fn compile_to_file_writes_translation() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("fr.json");
    let handler = JsonHandler::default();
    let (template, _) = handler.parse(r#"{"hello": "Hello", "bye": "Bye"}"#).unwrap();

    let translated = vec![OpenString::new("hello", "Bonjour").with_order(0)];
    handler.compile_to_file(&template, &translated, &path).unwrap();
    assert_eq!(fs::read_to_string(&path).unwrap(), r#"{"hello": "Bonjour"}"#);
}

#[test]
fn parse_file_reports_missing_file() {
    let dir = TempDir::new().unwrap();
    let err = JsonHandler::default()
        .parse_file(&dir.path().join("missing.json"))
        .unwrap_err();
    assert!(matches!(err, langtemplate::Error::Io(_)));
}
