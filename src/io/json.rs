//! JSON array format.

use crate::models::Quote;
use crate::{Error, Result};
use serde_json::Value;
use std::fs;
use std::io::{Read, Write};
use std::path::Path;

/// File name used when no export path is given.
pub const DEFAULT_EXPORT_FILE: &str = "quotes.json";

/// Maximum accepted import size (8MB).
pub const MAX_IMPORT_SIZE: u64 = 8 * 1024 * 1024;

/// Serializes quotes as a pretty-printed JSON array.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn to_json_pretty(quotes: &[Quote]) -> Result<String> {
    serde_json::to_string_pretty(quotes).map_err(|e| Error::OperationFailed {
        operation: "serialize_export".to_string(),
        cause: e.to_string(),
    })
}

/// Writes quotes as a pretty-printed JSON array followed by a newline.
///
/// # Errors
///
/// Returns an error if serialization or the write fails.
pub fn write_export<W: Write>(mut writer: W, quotes: &[Quote]) -> Result<()> {
    let json = to_json_pretty(quotes)?;
    writer
        .write_all(json.as_bytes())
        .and_then(|()| writer.write_all(b"\n"))
        .and_then(|()| writer.flush())
        .map_err(|e| Error::OperationFailed {
            operation: "write_export".to_string(),
            cause: e.to_string(),
        })
}

/// Writes an export file, replacing any existing file.
///
/// # Errors
///
/// Returns an error if the file cannot be created or written.
pub fn write_export_file(path: &Path, quotes: &[Quote]) -> Result<()> {
    let file = fs::File::create(path).map_err(|e| Error::OperationFailed {
        operation: "create_export_file".to_string(),
        cause: format!("{}: {e}", path.display()),
    })?;
    write_export(std::io::BufWriter::new(file), quotes)
}

/// Parses an import document into its array elements.
///
/// # Errors
///
/// Returns [`Error::Parse`] for malformed JSON and [`Error::InvalidInput`]
/// when the document is not an array.
pub fn parse_import(contents: &str) -> Result<Vec<Value>> {
    let document: Value = serde_json::from_str(contents).map_err(|e| Error::Parse {
        what: "import file".to_string(),
        cause: e.to_string(),
    })?;

    match document {
        Value::Array(items) => Ok(items),
        _ => Err(Error::InvalidInput(
            "invalid file format: expected a JSON array of quotes".to_string(),
        )),
    }
}

/// Reads and parses an import document.
///
/// # Errors
///
/// Returns an error if reading fails, the input exceeds
/// [`MAX_IMPORT_SIZE`], or parsing fails.
pub fn read_import<R: Read>(reader: R) -> Result<Vec<Value>> {
    let mut contents = String::new();
    reader
        .take(MAX_IMPORT_SIZE + 1)
        .read_to_string(&mut contents)
        .map_err(|e| Error::OperationFailed {
            operation: "read_import".to_string(),
            cause: e.to_string(),
        })?;

    if contents.len() as u64 > MAX_IMPORT_SIZE {
        return Err(Error::InvalidInput(format!(
            "Import exceeds maximum size of {MAX_IMPORT_SIZE} bytes"
        )));
    }

    parse_import(&contents)
}

/// Reads and parses an import file.
///
/// # Errors
///
/// Returns an error if the file cannot be opened, read, or parsed.
pub fn read_import_file(path: &Path) -> Result<Vec<Value>> {
    let file = fs::File::open(path).map_err(|e| Error::OperationFailed {
        operation: "open_import_file".to_string(),
        cause: format!("{}: {e}", path.display()),
    })?;
    read_import(std::io::BufReader::new(file))
}
