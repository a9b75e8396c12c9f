//! Remote collaborator.
//!
//! The remote is a JSONPlaceholder-style list resource: `GET` returns an
//! array of posts and `POST` echoes the created post back. Nothing about
//! the payload is quote-shaped, so [`PostProjection`] maps posts onto quote
//! candidates with a fixed rule.

mod http;
mod projection;

pub use http::{DEFAULT_ENDPOINT, HttpRemote};
pub use projection::PostProjection;

use crate::Result;
use crate::models::Quote;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;

/// Identifier assigned by the remote. Numeric on the reference endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RemoteId {
    /// Numeric id.
    Number(u64),
    /// Opaque string id.
    Text(String),
}

impl fmt::Display for RemoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// A post as returned by the remote list endpoint.
///
/// Unknown fields (`userId`, ...) are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemotePost {
    /// Remote identifier.
    pub id: RemoteId,
    /// Post title; becomes the quote text.
    #[serde(default)]
    pub title: String,
    /// Post body; its first line becomes the category.
    #[serde(default)]
    pub body: String,
}

/// Source of remote posts and sink for new quotes.
pub trait RemoteSource: Send + Sync {
    /// Fetches the current post list.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Remote`] on transport, status, or decoding
    /// failures.
    fn fetch_posts(&self) -> impl Future<Output = Result<Vec<RemotePost>>> + Send;

    /// Sends a newly added quote. Returns the remote's reply.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Remote`] on transport or status failures.
    fn post_quote(&self, quote: &Quote) -> impl Future<Output = Result<serde_json::Value>> + Send;
}
