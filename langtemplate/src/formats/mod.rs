//! All supported document formats.
//!
//! Each submodule provides one [`Handler`] implementation; [`FormatType`] selects among them
//! at runtime.

pub mod android_strings;
pub mod chrome;
pub mod html;
pub mod json;
pub mod stringsdict;

use std::{
    fmt::{Display, Formatter},
    path::Path,
    str::FromStr,
};

pub use android_strings::AndroidStringsHandler;
pub use chrome::ChromeHandler;
pub use html::HtmlHandler;
pub use json::JsonHandler;
pub use stringsdict::StringsdictHandler;

use crate::{Error, options::HandlerOptions, traits::Handler};

/// File name Chrome extensions use for their message catalogs.
const CHROME_CATALOG: &str = "messages.json";

/// Represents all supported formats for generic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatType {
    /// Key-value JSON, nested objects and arrays included.
    KeyValueJson,
    /// Chrome extension `messages.json`.
    Chrome,
    /// Android `strings.xml`.
    AndroidStrings,
    /// HTML pages and fragments.
    Html,
    /// Apple `.stringsdict` plural catalogs.
    Stringsdict,
}

/// Implements [`std::fmt::Display`] for [`FormatType`].
///
/// # Example
/// ```rust
/// use langtemplate::formats::FormatType;
/// assert_eq!(FormatType::KeyValueJson.to_string(), "json");
/// assert_eq!(FormatType::AndroidStrings.to_string(), "android");
/// ```
impl Display for FormatType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            FormatType::KeyValueJson => write!(f, "json"),
            FormatType::Chrome => write!(f, "chrome"),
            FormatType::AndroidStrings => write!(f, "android"),
            FormatType::Html => write!(f, "html"),
            FormatType::Stringsdict => write!(f, "stringsdict"),
        }
    }
}

/// Implements [`std::str::FromStr`] for [`FormatType`].
///
/// Accepts the following case-insensitive strings:
/// - `"json"`, `"keyvaluejson"` → `FormatType::KeyValueJson`
/// - `"chrome"`, `"chromei18n"` → `FormatType::Chrome`
/// - `"android"`, `"androidstrings"`, `"xml"` → `FormatType::AndroidStrings`
/// - `"html"`, `"htm"` → `FormatType::Html`
/// - `"stringsdict"` → `FormatType::Stringsdict`
///
/// Returns [`crate::error::Error::UnknownFormat`] for unknown strings.
///
/// # Example
/// ```rust
/// use langtemplate::formats::FormatType;
/// use std::str::FromStr;
/// assert_eq!(FormatType::from_str("Chrome").unwrap(), FormatType::Chrome);
/// assert!(FormatType::from_str("foobar").is_err());
/// ```
impl FromStr for FormatType {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        match s.as_str() {
            "json" | "keyvaluejson" => Ok(FormatType::KeyValueJson),
            "chrome" | "chromei18n" => Ok(FormatType::Chrome),
            "android" | "androidstrings" | "xml" => Ok(FormatType::AndroidStrings),
            "html" | "htm" => Ok(FormatType::Html),
            "stringsdict" => Ok(FormatType::Stringsdict),
            other => Err(Error::UnknownFormat(other.to_string())),
        }
    }
}

impl FormatType {
    /// Every supported format.
    pub const ALL: [FormatType; 5] = [
        FormatType::KeyValueJson,
        FormatType::Chrome,
        FormatType::AndroidStrings,
        FormatType::Html,
        FormatType::Stringsdict,
    ];

    /// Returns the typical file extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            FormatType::KeyValueJson | FormatType::Chrome => "json",
            FormatType::AndroidStrings => "xml",
            FormatType::Html => "html",
            FormatType::Stringsdict => "stringsdict",
        }
    }

    /// Creates the handler for this format.
    pub fn handler(&self, options: HandlerOptions) -> Box<dyn Handler> {
        match self {
            FormatType::KeyValueJson => Box::new(JsonHandler::new(options)),
            FormatType::Chrome => Box::new(ChromeHandler::new(options)),
            FormatType::AndroidStrings => Box::new(AndroidStringsHandler::new(options)),
            FormatType::Html => Box::new(HtmlHandler::new(options)),
            FormatType::Stringsdict => Box::new(StringsdictHandler::new(options)),
        }
    }
}

/// Infers the format from a file path.
///
/// `messages.json` is a Chrome catalog; any other `.json` file is key-value JSON.
///
/// # Example
/// ```rust
/// use langtemplate::formats::{FormatType, infer_format_from_extension};
/// assert_eq!(
///     infer_format_from_extension("_locales/en/messages.json"),
///     Some(FormatType::Chrome)
/// );
/// assert_eq!(infer_format_from_extension("en.json"), Some(FormatType::KeyValueJson));
/// assert_eq!(infer_format_from_extension("foo.txt"), None);
/// ```
pub fn infer_format_from_extension<P: AsRef<Path>>(path: P) -> Option<FormatType> {
    let path = path.as_ref();
    if path.file_name().and_then(|s| s.to_str()) == Some(CHROME_CATALOG) {
        return Some(FormatType::Chrome);
    }
    match path
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_ascii_lowercase())
        .as_deref()
    {
        Some("json") => Some(FormatType::KeyValueJson),
        Some("xml") => Some(FormatType::AndroidStrings),
        Some("html") | Some("htm") => Some(FormatType::Html),
        Some("stringsdict") => Some(FormatType::Stringsdict),
        _ => None,
    }
}
