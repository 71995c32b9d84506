use std::path::Path;

use langtemplate::{Handler, Parsed};

use crate::formats::HandlerArgs;
use crate::stringset::write_stringset;
use crate::validation::{validate_file_path, validate_output_path};

/// Parses `input` with the handler `args` select.
pub fn parse_document(input: &str, args: &HandlerArgs) -> Result<Parsed, String> {
    validate_file_path(input)?;
    let format = args.resolve_format(input)?;
    let handler = format.handler(args.options());
    handler
        .parse_file(Path::new(input))
        .map_err(|e| format!("Error parsing {} as {}: {}", input, format, e))
}

/// Run the parse command: split a document into a template and a stringset file.
///
/// Returns the number of extracted strings.
pub fn run_parse_command(
    input: &str,
    template: &str,
    stringset: &str,
    args: &HandlerArgs,
) -> Result<usize, String> {
    let (template_text, strings) = parse_document(input, args)?;
    log::info!(
        "extracted {} strings ({} pluralized) from {}",
        strings.len(),
        strings.iter().filter(|s| s.pluralized()).count(),
        input
    );

    validate_output_path(template)?;
    std::fs::write(template, template_text)
        .map_err(|e| format!("Error writing to {}: {}", template, e))?;
    write_stringset(stringset, &strings)?;
    Ok(strings.len())
}
