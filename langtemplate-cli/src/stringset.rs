use std::{
    fs::File,
    io::{BufReader, BufWriter, Write},
};

use langtemplate::OpenString;

use crate::validation::{validate_file_path, validate_output_path};

/// Reads a stringset previously written by [`write_stringset`].
pub fn read_stringset(path: &str) -> Result<Vec<OpenString>, String> {
    validate_file_path(path)?;
    let file = File::open(path).map_err(|e| format!("Error reading {}: {}", path, e))?;
    serde_json::from_reader(BufReader::new(file))
        .map_err(|e| format!("Invalid stringset in {}: {}", path, e))
}

/// Writes `stringset` as pretty-printed JSON.
pub fn write_stringset(path: &str, stringset: &[OpenString]) -> Result<(), String> {
    validate_output_path(path)?;
    let file = File::create(path).map_err(|e| format!("Error writing to {}: {}", path, e))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, stringset)
        .map_err(|e| format!("Error serializing to JSON: {}", e))?;
    writer
        .write_all(b"\n")
        .and_then(|_| writer.flush())
        .map_err(|e| format!("Error writing to {}: {}", path, e))
}
