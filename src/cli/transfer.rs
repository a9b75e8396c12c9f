//! Export and import commands.

use super::CliContext;
use crate::Result;
use crate::io::DEFAULT_EXPORT_FILE;
use std::path::{Path, PathBuf};

/// Exports every quote as a JSON array.
///
/// `-` writes to stdout; no path writes [`DEFAULT_EXPORT_FILE`].
///
/// # Errors
///
/// Returns an error if the export cannot be written.
pub fn cmd_export(ctx: &CliContext, output: Option<PathBuf>) -> Result<()> {
    let book = ctx.lock()?;
    let path = output.unwrap_or_else(|| PathBuf::from(DEFAULT_EXPORT_FILE));

    if path.as_os_str() == "-" {
        println!("{}", book.export_json()?);
        return Ok(());
    }

    let count = book.export_to_file(&path)?;
    println!("Exported {count} quote(s) to {}", path.display());
    Ok(())
}

/// Imports quotes from a JSON file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not a JSON array.
pub fn cmd_import(ctx: &CliContext, file: &Path) -> Result<()> {
    let report = ctx.lock()?.import_file(file)?;

    println!("{}", report.summary());
    for error in &report.errors {
        println!("  {error}");
    }
    Ok(())
}
