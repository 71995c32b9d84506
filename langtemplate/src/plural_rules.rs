use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
    str::FromStr,
};

use lazy_static::lazy_static;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use unic_langid::LanguageIdentifier;

use crate::{error::Error, strings::OpenString};

/// Grammatical plural rule, numbered independently of any locale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PluralRule {
    Zero = 0,
    One = 1,
    Two = 2,
    Few = 3,
    Many = 4,
    Other = 5,
}

impl PluralRule {
    /// All rules in ascending number order.
    pub const ALL: [PluralRule; 6] = [
        PluralRule::Zero,
        PluralRule::One,
        PluralRule::Two,
        PluralRule::Few,
        PluralRule::Many,
        PluralRule::Other,
    ];

    pub fn number(&self) -> u8 {
        *self as u8
    }

    pub fn from_number(number: u8) -> Result<Self, Error> {
        PluralRule::ALL
            .get(usize::from(number))
            .copied()
            .ok_or_else(|| Error::Rule(format!("The rule number {} is not valid", number)))
    }

    pub fn name(&self) -> &'static str {
        match self {
            PluralRule::Zero => "zero",
            PluralRule::One => "one",
            PluralRule::Two => "two",
            PluralRule::Few => "few",
            PluralRule::Many => "many",
            PluralRule::Other => "other",
        }
    }

    /// Rule names in ascending number order.
    pub fn names() -> Vec<&'static str> {
        PluralRule::ALL.iter().map(PluralRule::name).collect()
    }
}

impl fmt::Display for PluralRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PluralRule {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PluralRule::ALL
            .into_iter()
            .find(|rule| rule.name() == s)
            .ok_or_else(|| Error::Rule(format!("The rule '{}' is not valid", s)))
    }
}

impl TryFrom<u8> for PluralRule {
    type Error = Error;

    fn try_from(number: u8) -> Result<Self, Self::Error> {
        PluralRule::from_number(number)
    }
}

impl Serialize for PluralRule {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for PluralRule {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        name.parse().map_err(serde::de::Error::custom)
    }
}

lazy_static! {
    /// Base language subtag → plural rules a complete translation has to provide (CLDR cardinals).
    static ref RULE_TABLE: BTreeMap<&'static str, BTreeSet<PluralRule>> = {
        use PluralRule::*;
        let mut m: BTreeMap<&'static str, BTreeSet<PluralRule>> = BTreeMap::new();

        fn s(items: &[PluralRule]) -> BTreeSet<PluralRule> {
            items.iter().copied().collect()
        }

        for code in [
            "en","de","nl","sv","da","nb","nn","no","is","fi","et","fa","hi","bn","gu",
            "ta","te","kn","ml","mr","it","es","pt","mk","el","eu","gl","af","sw","ur",
            "fil","tl","tr","id","ms","fr","hy","kab"
        ] {
            m.insert(code, s(&[One, Other]));
        }

        for code in ["ja","zh","ko","th","vi","km","lo","my","yue"] {
            m.insert(code, s(&[Other]));
        }

        for code in ["ru","uk","be","sr","hr","bs","sh","pl"] {
            m.insert(code, s(&[One, Few, Many, Other]));
        }

        for code in ["cs","sk","lt","ro"] {
            m.insert(code, s(&[One, Few, Other]));
        }

        m.insert("sl", s(&[One, Two, Few, Other]));
        m.insert("lv", s(&[Zero, One, Other]));
        m.insert("ga", s(&[One, Two, Few, Many, Other]));
        m.insert("ar", s(&[Zero, One, Two, Few, Many, Other]));

        for code in ["he","iw"] {
            m.insert(code, s(&[One, Two, Many, Other]));
        }

        m
    };
}

/// Non-fatal report describing plural rules a string lacks for a locale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PluralValidationReport {
    pub language: String,
    pub key: String,
    pub missing: BTreeSet<PluralRule>,
    pub have: BTreeSet<PluralRule>,
}

/// Returns the plural rules a language requires.
///
/// Unknown locales fall back to {Other} to avoid false positives.
pub fn required_rules_for(lang: &LanguageIdentifier) -> BTreeSet<PluralRule> {
    RULE_TABLE
        .get(lang.language.as_str())
        .cloned()
        .unwrap_or_else(|| BTreeSet::from([PluralRule::Other]))
}

/// Like [`required_rules_for`], for language codes that may use underscores (`pt_BR`).
pub fn required_rules_for_str(lang: &str) -> Option<BTreeSet<PluralRule>> {
    let parsed: LanguageIdentifier = lang.replace('_', "-").parse().ok()?;
    Some(required_rules_for(&parsed))
}

/// Collects every plural string of `stringset` that lacks a rule `language` requires.
pub fn collect_plural_issues(
    stringset: &[OpenString],
    language: &str,
) -> Result<Vec<PluralValidationReport>, Error> {
    let required = required_rules_for_str(language)
        .ok_or_else(|| Error::validation_error(format!("Invalid language code '{}'", language)))?;

    Ok(stringset
        .iter()
        .filter_map(|string| {
            let plurals = string.plurals()?;
            let have: BTreeSet<PluralRule> = plurals.keys().copied().collect();
            let missing: BTreeSet<PluralRule> = &required - &have;
            (!missing.is_empty()).then(|| PluralValidationReport {
                language: language.to_string(),
                key: string.key.clone(),
                missing,
                have,
            })
        })
        .collect())
}

/// Fails with a validation error listing every plural string with missing rules.
pub fn validate_plurals(stringset: &[OpenString], language: &str) -> Result<(), Error> {
    let reports = collect_plural_issues(stringset, language)?;
    if reports.is_empty() {
        return Ok(());
    }
    let join = |rules: &BTreeSet<PluralRule>| {
        rules.iter().map(PluralRule::name).collect::<Vec<_>>().join(", ")
    };
    let lines: Vec<String> = reports
        .iter()
        .map(|r| {
            format!(
                "lang='{}' key='{}': missing plural rules: [{}] (have: [{}])",
                r.language,
                r.key,
                join(&r.missing),
                join(&r.have)
            )
        })
        .collect();
    Err(Error::validation_error(format!(
        "Plural validation failed:\n{}",
        lines.join("\n")
    )))
}
