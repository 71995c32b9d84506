//! The extracted-string model shared by every format.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::plural_rules::PluralRule;

/// Number of hex digits of the key digest used in placeholders.
const PLACEHOLDER_HASH_LEN: usize = 32;

/// Text of an extracted string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StringValue {
    Singular(String),
    /// One text per plural rule, kept in ascending rule order.
    Plural(BTreeMap<PluralRule, String>),
}

/// A string extracted from (or to be compiled into) a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenString {
    /// Document-derived identifier, unique within one document.
    pub key: String,
    pub string: StringValue,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub context: String,
    /// Extraction order; compile sorts by it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<usize>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub developer_comment: String,
    /// Plural rules the source selected with an exact value (`=1`) rather than a keyword.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub numeric_rules: BTreeSet<PluralRule>,
}

impl OpenString {
    pub fn new(key: impl Into<String>, string: impl Into<String>) -> Self {
        Self::with_value(key, StringValue::Singular(string.into()))
    }

    pub fn plural(key: impl Into<String>, strings: BTreeMap<PluralRule, String>) -> Self {
        Self::with_value(key, StringValue::Plural(strings))
    }

    fn with_value(key: impl Into<String>, string: StringValue) -> Self {
        OpenString {
            key: key.into(),
            string,
            context: String::new(),
            order: None,
            developer_comment: String::new(),
            numeric_rules: BTreeSet::new(),
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = context.into();
        self
    }

    pub fn with_order(mut self, order: usize) -> Self {
        self.order = Some(order);
        self
    }

    pub fn with_developer_comment(mut self, comment: impl Into<String>) -> Self {
        self.developer_comment = comment.into();
        self
    }

    pub fn with_numeric_rules(mut self, rules: BTreeSet<PluralRule>) -> Self {
        self.numeric_rules = rules;
        self
    }

    pub fn pluralized(&self) -> bool {
        matches!(self.string, StringValue::Plural(_))
    }

    pub fn singular(&self) -> Option<&str> {
        match &self.string {
            StringValue::Singular(text) => Some(text),
            StringValue::Plural(_) => None,
        }
    }

    pub fn plurals(&self) -> Option<&BTreeMap<PluralRule, String>> {
        match &self.string {
            StringValue::Plural(strings) => Some(strings),
            StringValue::Singular(_) => None,
        }
    }

    /// Placeholder standing in for this string in a template.
    ///
    /// Derived from the key and context only, so a translation of the string compiles into
    /// the template extracted from the source document. Made of `[0-9a-f_]` and the `tr`/`pl`
    /// suffix, so it never needs escaping in a host format.
    pub fn template_replacement(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.key.as_bytes());
        hasher.update(b":");
        hasher.update(self.context.as_bytes());
        let digest = format!("{:x}", hasher.finalize());
        let suffix = if self.pluralized() { "pl" } else { "tr" };
        format!("{}_{}", &digest[..PLACEHOLDER_HASH_LEN], suffix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_replacement_shape() {
        let singular = OpenString::new("a", "x").template_replacement();
        let (hash, suffix) = singular.split_at(PLACEHOLDER_HASH_LEN);
        assert!(hash.chars().all(|c| matches!(c, '0'..='9' | 'a'..='f')));
        assert_eq!(suffix, "_tr");

        let plural = OpenString::plural("a", BTreeMap::from([(PluralRule::Other, "x".into())]));
        assert!(plural.template_replacement().ends_with("_pl"));
        assert_eq!(
            plural.template_replacement()[..PLACEHOLDER_HASH_LEN],
            singular[..PLACEHOLDER_HASH_LEN]
        );
    }

    #[test]
    fn test_template_replacement_ignores_content_but_not_context() {
        let source = OpenString::new("greeting", "Hello").with_order(0);
        let translation = OpenString::new("greeting", "Bonjour");
        assert_eq!(
            source.template_replacement(),
            translation.template_replacement()
        );

        let other_context = OpenString::new("greeting", "Hello").with_context("tablet");
        assert_ne!(
            source.template_replacement(),
            other_context.template_replacement()
        );
        assert_ne!(
            source.template_replacement(),
            OpenString::new("farewell", "Hello").template_replacement()
        );
    }

    #[test]
    fn test_accessors() {
        let plural = OpenString::plural(
            "n",
            BTreeMap::from([(PluralRule::One, "a".into()), (PluralRule::Other, "b".into())]),
        )
        .with_developer_comment("count of things");
        assert!(plural.pluralized());
        assert_eq!(plural.singular(), None);
        assert_eq!(plural.plurals().unwrap().len(), 2);
        assert_eq!(plural.developer_comment, "count of things");

        let singular = OpenString::new("k", "v").with_context("ctx");
        assert_eq!(singular.singular(), Some("v"));
        assert_eq!(singular.context, "ctx");
    }

    #[test]
    fn test_serde_shape() {
        let stringset = vec![
            OpenString::new("a", "x").with_order(0),
            OpenString::plural(
                "b",
                BTreeMap::from([(PluralRule::One, "1".into()), (PluralRule::Other, "n".into())]),
            )
            .with_order(1),
        ];
        let json = serde_json::to_string(&stringset).unwrap();
        assert_eq!(
            json,
            r#"[{"key":"a","string":"x","order":0},{"key":"b","string":{"one":"1","other":"n"},"order":1}]"#
        );
        let back: Vec<OpenString> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, stringset);
    }

    #[test]
    fn test_serde_keeps_numeric_rules() {
        let plural = OpenString::plural(
            "n",
            BTreeMap::from([(PluralRule::One, "a".into()), (PluralRule::Other, "b".into())]),
        )
        .with_numeric_rules(BTreeSet::from([PluralRule::One]));
        let json = serde_json::to_string(&plural).unwrap();
        assert_eq!(
            json,
            r#"{"key":"n","string":{"one":"a","other":"b"},"numeric_rules":["one"]}"#
        );
        let back: OpenString = serde_json::from_str(&json).unwrap();
        assert_eq!(back.numeric_rules, plural.numeric_rules);
    }
}
