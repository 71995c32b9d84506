use langtemplate::{OpenString, StringValue};
use unicode_width::UnicodeWidthChar;

/// Display columns a value may take before it is truncated in a terminal.
const MAX_VALUE_WIDTH: usize = 50;

/// Print a view of the strings extracted from a document.
///
/// Values are truncated only when stdout is a terminal and `full` is not set.
pub fn print_view(strings: &[OpenString], full: bool) {
    let truncate = !full && atty::is(atty::Stream::Stdout);

    println!("Strings: {}", strings.len());
    for (i, string) in strings.iter().enumerate() {
        println!("\n  String {}: {}", i + 1, string.key);
        if let Some(order) = string.order {
            println!("    Order: {}", order);
        }
        if !string.context.is_empty() {
            println!("    Context: {}", string.context);
        }
        if !string.developer_comment.is_empty() {
            println!("    Comment: {}", string.developer_comment);
        }

        match &string.string {
            StringValue::Singular(value) => {
                println!("    Type: Singular");
                println!("    Value: {}", display_value(value, truncate));
            }
            StringValue::Plural(forms) => {
                println!("    Type: Plural");
                for (rule, value) in forms {
                    println!("      {}: {}", rule, display_value(value, truncate));
                }
            }
        }
    }
}

fn display_value(value: &str, truncate: bool) -> String {
    if truncate {
        truncate_to_width(value, MAX_VALUE_WIDTH)
    } else {
        value.to_string()
    }
}

/// Cuts `value` to at most `width` display columns, marking the cut with `...`.
pub fn truncate_to_width(value: &str, width: usize) -> String {
    let mut used = 0;
    for (index, c) in value.char_indices() {
        used += c.width().unwrap_or(0);
        if used > width {
            return format!("{}...", &value[..index]);
        }
    }
    value.to_string()
}
