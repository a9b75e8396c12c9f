//! Key-value backends.
//!
//! | Backend | Lifetime | Used for |
//! |---------|----------|----------|
//! | [`FilesystemStore`] | across runs | durable and session storage |
//! | [`MemoryStore`] | current process | embedded sessions, tests |

mod filesystem;
mod memory;

pub use filesystem::FilesystemStore;
pub use memory::MemoryStore;
