//! Remote address book access.
//!
//! The sync run only needs two operations from the remote side: list the
//! address books, then list the raw records in each. [`CardDavSource`]
//! implements them over HTTP.

mod carddav;

pub use carddav::{split_vcards, CardDavSource};

use std::fmt;
use thiserror::Error;

/// One remote address book.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerRef {
    pub name: String,
}

impl ContainerRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl fmt::Display for ContainerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Unparsed text of one remote contact record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord(String);

impl RawRecord {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Errors that can occur while fetching from the remote address book.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Source not configured. Add source.server_url to config.")]
    NotConfigured,

    #[error("No address books configured")]
    NoAddressBooks,

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Server returned status {status} for {url}")]
    Status { url: String, status: u16 },
}

/// Read access to a remote address book service.
#[allow(async_fn_in_trait)]
pub trait ContactSource {
    async fn list_containers(&self) -> Result<Vec<ContainerRef>, SourceError>;

    async fn list_records(&self, container: &ContainerRef) -> Result<Vec<RawRecord>, SourceError>;
}
