use langtemplate::{PluralRule, PluralValidationReport, collect_plural_issues};

use crate::stringset::read_stringset;
use crate::validation::validate_language_code;

/// Run the check-plurals command over a stringset file.
///
/// Prints every plural string lacking a rule `lang` requires and fails when there is one.
pub fn run_check_plurals_command(stringset: &str, lang: &str, json_output: bool) -> Result<(), String> {
    validate_language_code(lang)?;
    let strings = read_stringset(stringset)?;
    let reports = collect_plural_issues(&strings, lang).map_err(|e| e.to_string())?;

    if json_output {
        let body = serde_json::to_string_pretty(&reports)
            .map_err(|e| format!("Error serializing to JSON: {}", e))?;
        println!("{}", body);
    } else {
        print_reports(&reports, strings.iter().filter(|s| s.pluralized()).count());
    }

    if reports.is_empty() {
        Ok(())
    } else {
        Err(format!(
            "{} plural string(s) miss rules required for '{}'",
            reports.len(),
            lang
        ))
    }
}

fn print_reports(reports: &[PluralValidationReport], checked: usize) {
    println!("Checked {} plural string(s)", checked);
    for report in reports {
        println!(
            "  {}: missing [{}] (have: [{}])",
            report.key,
            join(report.missing.iter()),
            join(report.have.iter())
        );
    }
}

fn join<'a>(rules: impl Iterator<Item = &'a PluralRule>) -> String {
    rules.map(PluralRule::name).collect::<Vec<_>>().join(", ")
}
