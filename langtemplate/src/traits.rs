//! The parse/compile protocol every format handler implements.

use std::{
    fs::File,
    io::{BufWriter, Read, Write},
    path::Path,
};

use crate::{error::Error, strings::OpenString};

/// A template together with the strings extracted from it.
pub type Parsed = (String, Vec<OpenString>);

/// Extracts strings from documents of one format and compiles translations back into them.
///
/// # Example
///
/// ```rust
/// use langtemplate::{Handler, OpenString, formats::json::JsonHandler};
///
/// let handler = JsonHandler::default();
/// let (template, stringset) = handler.parse(r#"{"greeting": "Hello"}"#)?;
/// assert_eq!(stringset[0].key, "greeting");
///
/// let translated = vec![OpenString::new("greeting", "Bonjour").with_order(0)];
/// assert_eq!(handler.compile(&template, &translated)?, r#"{"greeting": "Bonjour"}"#);
/// # Ok::<(), langtemplate::Error>(())
/// ```
pub trait Handler: Send + Sync {
    /// Human readable format name.
    fn name(&self) -> &'static str;

    /// Usual file extension, without the dot.
    fn extension(&self) -> &'static str;

    /// Replaces every translatable value of `content` with a placeholder.
    fn parse(&self, content: &str) -> Result<Parsed, Error>;

    /// Writes `stringset` into a template produced by [`Handler::parse`].
    ///
    /// Units whose placeholder has no string in `stringset` are removed.
    fn compile(&self, template: &str, stringset: &[OpenString]) -> Result<String, Error>;

    /// Parses a file, decoding UTF-16 or UTF-8 with a byte order mark.
    fn parse_file(&self, path: &Path) -> Result<Parsed, Error> {
        let file = File::open(path)?;
        let mut decoder = encoding_rs_io::DecodeReaderBytesBuilder::new()
            .bom_override(true)
            .strip_bom(true)
            .build(file);

        let mut content = String::new();
        decoder.read_to_string(&mut content)?;
        log::debug!("parsing {} as {}", path.display(), self.name());
        self.parse(&content)
    }

    /// Compiles and writes the result to `path`.
    fn compile_to_file(
        &self,
        template: &str,
        stringset: &[OpenString],
        path: &Path,
    ) -> Result<(), Error> {
        let compiled = self.compile(template, stringset)?;
        let mut writer = BufWriter::new(File::create(path)?);
        writer.write_all(compiled.as_bytes())?;
        writer.flush()?;
        Ok(())
    }
}
