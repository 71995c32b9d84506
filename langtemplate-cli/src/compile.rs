use std::path::Path;

use langtemplate::{FormatType, Handler, validate_plurals};

use crate::formats::{HandlerArgs, resolve_format};
use crate::stringset::read_stringset;
use crate::validation::{validate_file_path, validate_language_code, validate_output_path};

/// Run the compile command: write the strings of `stringset` into `template` and save the
/// result as `output`.
///
/// With `lang`, plural strings missing a rule the language requires fail the run before
/// anything is written.
pub fn run_compile_command(
    template: &str,
    stringset: &str,
    output: &str,
    lang: Option<&str>,
    args: &HandlerArgs,
) -> Result<usize, String> {
    validate_file_path(template)?;
    let format = compile_format(args, template, output)?;
    let template_text = std::fs::read_to_string(template)
        .map_err(|e| format!("Error reading {}: {}", template, e))?;
    let strings = read_stringset(stringset)?;

    if let Some(lang) = lang {
        validate_language_code(lang)?;
        validate_plurals(&strings, lang).map_err(|e| e.to_string())?;
    }

    validate_output_path(output)?;
    let handler = format.handler(args.options());
    handler
        .compile_to_file(&template_text, &strings, Path::new(output))
        .map_err(|e| format!("Error compiling {} as {}: {}", template, format, e))?;
    log::info!("compiled {} strings into {}", strings.len(), output);
    Ok(strings.len())
}

/// The explicit format, else the one the output name implies, else the template's.
fn compile_format(args: &HandlerArgs, template: &str, output: &str) -> Result<FormatType, String> {
    if args.format.is_some() {
        return args.resolve_format(output);
    }
    resolve_format(None, output).or_else(|_| resolve_format(None, template))
}
