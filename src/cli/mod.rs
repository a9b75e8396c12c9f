//! CLI command implementations.
//!
//! Each subcommand of the `quotesync` binary maps onto one handler here.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `show` | Show a random quote from the current filter |
//! | `last` | Show the last quote viewed in this session |
//! | `add` | Add a quote (and post it to the remote) |
//! | `list` | List quotes passing the current filter |
//! | `categories` | List categories |
//! | `filter` | Set the category filter (`all` clears it) |
//! | `export` | Export all quotes as JSON |
//! | `import` | Import quotes from a JSON file |
//! | `sync` | Run one sync cycle |
//! | `watch` | Sync periodically until Ctrl-C |
//! | `session end` | Clear session storage |
//! | `config` | Show the effective configuration |
//!
//! # Example Usage
//!
//! ```bash
//! quotesync add "Stay hungry, stay foolish." --category Motivation
//! quotesync filter Motivation
//! quotesync show
//! quotesync watch
//! ```

#![allow(clippy::print_stdout, clippy::print_stderr)]

mod quotes;
mod sync;
mod transfer;

pub use quotes::{
    cmd_add, cmd_categories, cmd_filter, cmd_last, cmd_list, cmd_session_end, cmd_show,
};
pub use sync::{cmd_sync, cmd_watch};
pub use transfer::{cmd_export, cmd_import};

use crate::config::QuoteSyncConfig;
use crate::remote::HttpRemote;
use crate::services::{QuoteBook, SharedBook, SyncAgent, lock_book};
use crate::storage::{FilesystemStore, KeyValueStore};
use crate::Result;
use std::sync::{Arc, MutexGuard};

/// Opened storage and configuration shared by the handlers.
pub struct CliContext {
    config: QuoteSyncConfig,
    book: SharedBook,
}

impl CliContext {
    /// Opens the quote book under the configured directories.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage directories cannot be created.
    pub fn open(config: QuoteSyncConfig) -> Result<Self> {
        let durable: Arc<dyn KeyValueStore> =
            Arc::new(FilesystemStore::with_create(&config.data_dir)?);
        let session: Arc<dyn KeyValueStore> =
            Arc::new(FilesystemStore::with_create(config.session_dir())?);

        tracing::debug!(
            data_dir = %config.data_dir.display(),
            session_dir = %config.session_dir().display(),
            "Opened quote book"
        );

        Ok(Self {
            book: QuoteBook::open(durable, session).into_shared(),
            config,
        })
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &QuoteSyncConfig {
        &self.config
    }

    /// Returns the shared book.
    #[must_use]
    pub const fn book(&self) -> &SharedBook {
        &self.book
    }

    fn lock(&self) -> Result<MutexGuard<'_, QuoteBook>> {
        lock_book(&self.book)
    }

    fn agent(&self) -> Result<SyncAgent<HttpRemote>> {
        let remote = HttpRemote::from_settings(&self.config.sync)?;
        Ok(SyncAgent::new(Arc::clone(&self.book), remote)?.with_settings(&self.config.sync))
    }
}

/// Prints the effective configuration as TOML.
///
/// # Errors
///
/// Returns an error if the configuration cannot be serialized.
pub fn cmd_config(config: &QuoteSyncConfig) -> Result<()> {
    print!("{}", config.to_toml()?);
    println!();
    println!("# effective session dir: {}", config.session_dir().display());
    Ok(())
}
