use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum length of the free-text notes kept on a stored contact.
///
/// Enforced by the `CHECK` on `contacts.notes` in the initial migration;
/// the two must change together.
pub const NOTES_MAX_LEN: usize = 500;

/// A parsed, validated contact ready for reconciliation.
///
/// Both fields are guaranteed non-empty; the only way to build one is
/// through [`Contact::new`], which refuses blank input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Contact {
    full_name: String,
    identity_key: String,
}

impl Contact {
    pub fn new(full_name: impl Into<String>, identity_key: impl Into<String>) -> Option<Self> {
        let full_name = full_name.into();
        let identity_key = identity_key.into();
        if full_name.trim().is_empty() || identity_key.trim().is_empty() {
            return None;
        }
        Some(Self {
            full_name,
            identity_key,
        })
    }

    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    pub fn identity_key(&self) -> &str {
        &self.identity_key
    }
}

impl fmt::Display for Contact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <{}>", self.full_name, self.identity_key)
    }
}

/// A contact as persisted in the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredContact {
    pub identity_key: String,
    pub full_name: String,
    pub notes: Option<String>,
    pub visible: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl fmt::Display for StoredContact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:<32} {}", self.full_name, self.identity_key)?;
        if !self.visible {
            write!(f, " (hidden)")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contact_new() {
        let contact = Contact::new("Alice", "5551234").unwrap();
        assert_eq!(contact.full_name(), "Alice");
        assert_eq!(contact.identity_key(), "5551234");
    }

    #[test]
    fn test_contact_rejects_blank_fields() {
        assert!(Contact::new("", "5551234").is_none());
        assert!(Contact::new("   ", "5551234").is_none());
        assert!(Contact::new("Alice", "").is_none());
    }

    #[test]
    fn test_contact_display() {
        let contact = Contact::new("Bob", "9999999").unwrap();
        assert_eq!(format!("{}", contact), "Bob <9999999>");
    }
}
