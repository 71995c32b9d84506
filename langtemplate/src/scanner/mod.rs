//! Structural scanners that walk a document without materializing a tree.
//!
//! Both scanners report absolute byte offsets into the text they were given, which is expected
//! to be the normalised text of a [`crate::transcriber::SourceText`].

pub mod json;
pub mod xml;

pub use json::{JsonEntry, JsonKey, JsonKind, JsonNode, JsonValue};
pub use xml::{Attribute, Dialect, XmlNode};
