use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

fn langtemplate_cmd() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("langtemplate"))
}

fn run(args: &[&str]) -> Output {
    langtemplate_cmd().args(args).output().unwrap()
}

fn path_str(path: &Path) -> &str {
    path.to_str().unwrap()
}

fn assert_success(output: &Output) {
    assert!(
        output.status.success(),
        "CLI failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
}

#[test]
fn test_parse_then_compile_round_trip() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("en.json");
    let template = temp_dir.path().join("en.template");
    let stringset = temp_dir.path().join("en.strings.json");
    let output = temp_dir.path().join("out/fr.json");

    let content = "{\n  \"title\": \"Hello\",\n  \"menu\": {\"open\": \"Open\"}\n}\n";
    fs::write(&input, content).unwrap();

    let parsed = run(&[
        "parse",
        "-i",
        path_str(&input),
        "-t",
        path_str(&template),
        "-s",
        path_str(&stringset),
    ]);
    assert_success(&parsed);
    assert!(String::from_utf8_lossy(&parsed.stdout).contains("Extracted 2 strings"));

    let template_text = fs::read_to_string(&template).unwrap();
    assert!(!template_text.contains("Hello"));
    let strings: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&stringset).unwrap()).unwrap();
    assert_eq!(strings[0]["key"], "title");
    assert_eq!(strings[1]["key"], "menu.open");

    let compiled = run(&[
        "compile",
        "-t",
        path_str(&template),
        "-s",
        path_str(&stringset),
        "-o",
        path_str(&output),
        "-f",
        "json",
    ]);
    assert_success(&compiled);
    assert_eq!(fs::read_to_string(&output).unwrap(), content);
}

#[test]
fn test_compile_translated_stringset_drops_missing_entries() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("strings.xml");
    let template = temp_dir.path().join("strings.template");
    let stringset = temp_dir.path().join("strings.json");
    let output = temp_dir.path().join("values-fr/strings.xml");

    fs::write(
        &input,
        "<resources>\n    <string name=\"hello\">Hello</string>\n    <string name=\"bye\">Bye</string>\n</resources>\n",
    )
    .unwrap();
    assert_success(&run(&[
        "parse",
        "-i",
        path_str(&input),
        "-t",
        path_str(&template),
        "-s",
        path_str(&stringset),
    ]));

    fs::write(
        &stringset,
        r#"[{"key": "hello", "string": "Bonjour", "order": 0}]"#,
    )
    .unwrap();
    assert_success(&run(&[
        "compile",
        "-t",
        path_str(&template),
        "-s",
        path_str(&stringset),
        "-o",
        path_str(&output),
    ]));

    let compiled = fs::read_to_string(&output).unwrap();
    assert!(compiled.contains("<string name=\"hello\">Bonjour</string>"));
    assert!(!compiled.contains("bye"));
}

#[test]
fn test_view_lists_plural_rules() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("strings.xml");
    fs::write(
        &input,
        r#"<resources>
    <!-- Shown in the basket -->
    <plurals name="apples">
        <item quantity="one">One apple</item>
        <item quantity="other">%d apples</item>
    </plurals>
</resources>
"#,
    )
    .unwrap();

    let output = run(&["view", "-i", path_str(&input), "--full"]);
    assert_success(&output);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Strings: 1"));
    assert!(stdout.contains("apples"));
    assert!(stdout.contains("Type: Plural"));
    assert!(stdout.contains("one: One apple"));
    assert!(stdout.contains("other: %d apples"));
    assert!(stdout.contains("Comment: Shown in the basket"));
}

#[test]
fn test_view_json_output() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("page.html");
    fs::write(&input, "<h1>Title</h1><p>Body</p>").unwrap();

    let output = run(&["view", "-i", path_str(&input), "--json", "--tag", "h1"]);
    assert_success(&output);
    let strings: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(strings.as_array().unwrap().len(), 1);
    assert_eq!(strings[0]["key"], "/h1");
    assert_eq!(strings[0]["string"], "Title");
}

#[test]
fn test_numeric_plurals_flag() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("en.json");
    let template = temp_dir.path().join("en.template");
    let stringset = temp_dir.path().join("en.strings.json");
    let output = temp_dir.path().join("copy.json");
    let content = r#"{"n": "{cnt, plural, =1 {table} other {tables}}"}"#;
    fs::write(&input, content).unwrap();

    let plain = run(&["view", "-i", path_str(&input), "--no-numeric-plurals"]);
    assert_success(&plain);
    assert!(String::from_utf8_lossy(&plain.stdout).contains("Type: Singular"));

    let help = run(&["view", "--help"]);
    assert!(String::from_utf8_lossy(&help.stdout).contains("as plain strings"));

    assert_success(&run(&[
        "parse",
        "-i",
        path_str(&input),
        "-t",
        path_str(&template),
        "-s",
        path_str(&stringset),
    ]));
    assert_success(&run(&[
        "compile",
        "-t",
        path_str(&template),
        "-s",
        path_str(&stringset),
        "-o",
        path_str(&output),
        "-f",
        "json",
    ]));
    assert_eq!(fs::read_to_string(&output).unwrap(), content);
}

#[test]
fn test_view_infers_stringsdict() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("Localizable.stringsdict");
    fs::write(
        &input,
        r#"<plist version="1.0">
<dict>
    <key>files</key>
    <dict>
        <key>NSStringLocalizedFormatKey</key>
        <string>%#@count@</string>
        <key>count</key>
        <dict>
            <key>NSStringFormatSpecTypeKey</key>
            <string>NSStringPluralRuleType</string>
            <key>one</key>
            <string>%d file</string>
            <key>other</key>
            <string>%d files</string>
        </dict>
    </dict>
</dict>
</plist>
"#,
    )
    .unwrap();

    let output = run(&["view", "-i", path_str(&input), "--json"]);
    assert_success(&output);
    let strings: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(strings[0]["key"], "files");
    assert_eq!(strings[0]["context"], "count");
    assert_eq!(strings[0]["string"]["other"], "%d files");
}

#[test]
fn test_check_plurals_reports_missing_rules() {
    let temp_dir = TempDir::new().unwrap();
    let stringset = temp_dir.path().join("strings.json");
    fs::write(
        &stringset,
        r#"[{"key": "files", "string": {"one": "{n} file", "other": "{n} files"}}]"#,
    )
    .unwrap();

    let ok = run(&["check-plurals", "-s", path_str(&stringset), "-l", "fr"]);
    assert_success(&ok);

    let missing = run(&["check-plurals", "-s", path_str(&stringset), "-l", "ru", "--json"]);
    assert!(!missing.status.success());
    let reports: serde_json::Value = serde_json::from_slice(&missing.stdout).unwrap();
    assert_eq!(reports[0]["key"], "files");
    assert_eq!(reports[0]["missing"], serde_json::json!(["few", "many"]));
}

#[test]
fn test_compile_with_lang_rejects_incomplete_plurals() {
    let temp_dir = TempDir::new().unwrap();
    let template = temp_dir.path().join("en.template");
    let stringset = temp_dir.path().join("ru.json");
    let output = temp_dir.path().join("ru.json.out");
    fs::write(&template, "{}").unwrap();
    fs::write(
        &stringset,
        r#"[{"key": "files", "string": {"one": "файл", "other": "файлов"}}]"#,
    )
    .unwrap();

    let result = run(&[
        "compile",
        "-t",
        path_str(&template),
        "-s",
        path_str(&stringset),
        "-o",
        path_str(&output),
        "-f",
        "json",
        "-l",
        "ru",
    ]);
    assert!(!result.status.success());
    assert!(String::from_utf8_lossy(&result.stderr).contains("Plural validation failed"));
    assert!(!output.exists());
}

#[test]
fn test_errors_exit_with_failure() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("broken.json");
    fs::write(&input, "{\n  \"a\": \"x\",\n  \"a\": \"y\"\n}").unwrap();
    let template = temp_dir.path().join("t");
    let stringset = temp_dir.path().join("s.json");

    let duplicate = run(&[
        "parse",
        "-i",
        path_str(&input),
        "-t",
        path_str(&template),
        "-s",
        path_str(&stringset),
    ]);
    assert!(!duplicate.status.success());
    assert!(String::from_utf8_lossy(&duplicate.stderr).contains("Duplicate string key ('a') in line 3"));
    assert!(!template.exists());

    let unknown = temp_dir.path().join("notes.txt");
    fs::write(&unknown, "hello").unwrap();
    let output = run(&["view", "-i", path_str(&unknown)]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Cannot infer the format"));

    let output = run(&["view", "-i", path_str(&unknown), "-f", "yaml"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("unknown format"));

    let missing = run(&["view", "-i", path_str(&temp_dir.path().join("nope.json"))]);
    assert!(!missing.status.success());
    assert!(String::from_utf8_lossy(&missing.stderr).contains("File does not exist"));
}
