//! Import/export I/O.
//!
//! Exports are a pretty-printed JSON array of full quote records. Imports
//! accept any JSON array; each element is validated later by the store, so
//! this layer only rejects documents that are not JSON or not an array.

mod json;

pub use json::{
    DEFAULT_EXPORT_FILE, MAX_IMPORT_SIZE, parse_import, read_import, read_import_file,
    to_json_pretty, write_export, write_export_file,
};
