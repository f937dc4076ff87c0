//! HTTP client for CardDAV-style address book exports.
//!
//! Each configured address book is fetched with a single `GET` on its
//! collection URL, which servers answer with every vCard in the book
//! concatenated. The body is split into one [`RawRecord`] per
//! `BEGIN:VCARD` / `END:VCARD` block.

use std::time::Duration;

use reqwest::header::ACCEPT;

use super::{ContactSource, ContainerRef, RawRecord, SourceError};
use crate::config::SourceConfig;

/// Address book client backed by `reqwest`.
pub struct CardDavSource {
    client: reqwest::Client,
    server_url: String,
    username: Option<String>,
    password: Option<String>,
    address_books: Vec<String>,
}

impl CardDavSource {
    /// Creates a client from config.
    ///
    /// Returns an error if no server URL is configured.
    pub fn from_config(config: &SourceConfig) -> Result<Self, SourceError> {
        let server_url = config
            .server_url
            .clone()
            .ok_or(SourceError::NotConfigured)?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            server_url,
            username: config.username.clone(),
            password: config.password.clone(),
            address_books: config.address_books.clone(),
        })
    }

    /// Builds the collection URL for an address book.
    fn book_url(&self, book: &str) -> String {
        format!(
            "{}/{}/",
            self.server_url.trim_end_matches('/'),
            urlencoding::encode(book.trim_matches('/'))
        )
    }
}

impl ContactSource for CardDavSource {
    async fn list_containers(&self) -> Result<Vec<ContainerRef>, SourceError> {
        if self.address_books.is_empty() {
            return Err(SourceError::NoAddressBooks);
        }
        Ok(self
            .address_books
            .iter()
            .map(|book| ContainerRef::new(book.as_str()))
            .collect())
    }

    async fn list_records(&self, container: &ContainerRef) -> Result<Vec<RawRecord>, SourceError> {
        let url = self.book_url(&container.name);

        let mut request = self.client.get(&url).header(ACCEPT, "text/vcard");
        if let Some(username) = &self.username {
            request = request.basic_auth(username, self.password.as_ref());
        }

        let response = request.send().await?;

        if !response.status().is_success() {
            return Err(SourceError::Status {
                url,
                status: response.status().as_u16(),
            });
        }

        let body = response.text().await?;
        let records = split_vcards(&body);
        tracing::debug!(
            "Fetched {} record(s) from address book '{}'",
            records.len(),
            container
        );
        Ok(records)
    }
}

/// Splits a multi-vCard body into individual records.
///
/// Text outside `BEGIN:VCARD` / `END:VCARD` blocks is ignored, as is a
/// trailing block that never ends.
pub fn split_vcards(body: &str) -> Vec<RawRecord> {
    let mut records = Vec::new();
    let mut current: Option<Vec<&str>> = None;

    for line in body.lines() {
        let marker = line.trim();
        if marker.eq_ignore_ascii_case("BEGIN:VCARD") {
            current = Some(vec![line]);
        } else if marker.eq_ignore_ascii_case("END:VCARD") {
            if let Some(mut lines) = current.take() {
                lines.push(line);
                records.push(RawRecord::new(lines.join("\n")));
            }
        } else if let Some(lines) = current.as_mut() {
            lines.push(line);
        }
    }

    records
}
