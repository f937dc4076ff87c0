use std::collections::HashSet;

use crate::models::Contact;

/// Result of collapsing a batch to one contact per identity key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Deduped {
    /// Unique contacts, in first-seen order.
    pub unique: Vec<Contact>,
    /// How many later duplicates were dropped.
    pub dropped: usize,
}

/// Keeps the first contact seen for each identity key and drops the rest,
/// even when a later duplicate carries a different name.
pub fn dedupe(contacts: Vec<Contact>) -> Deduped {
    let mut seen = HashSet::with_capacity(contacts.len());
    let mut unique = Vec::with_capacity(contacts.len());
    let mut dropped = 0;

    for contact in contacts {
        if seen.insert(contact.identity_key().to_string()) {
            unique.push(contact);
        } else {
            dropped += 1;
        }
    }

    Deduped { unique, dropped }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contact(name: &str, key: &str) -> Contact {
        Contact::new(name, key).unwrap()
    }

    #[test]
    fn test_dedupe_empty() {
        let result = dedupe(Vec::new());
        assert!(result.unique.is_empty());
        assert_eq!(result.dropped, 0);
    }

    #[test]
    fn test_dedupe_first_seen_wins() {
        let result = dedupe(vec![
            contact("Alice", "5551234"),
            contact("Alice Prime", "5551234"),
            contact("Bob", "9999999"),
        ]);

        assert_eq!(result.unique.len(), 2);
        assert_eq!(result.dropped, 1);
        assert_eq!(result.unique[0].full_name(), "Alice");
        assert_eq!(result.unique[1].full_name(), "Bob");
    }

    #[test]
    fn test_dedupe_preserves_order_and_uniqueness() {
        let input = vec![
            contact("C", "3"),
            contact("A", "1"),
            contact("C2", "3"),
            contact("B", "2"),
            contact("A2", "1"),
            contact("A3", "1"),
        ];
        let result = dedupe(input.clone());

        let keys: Vec<&str> = result.unique.iter().map(|c| c.identity_key()).collect();
        assert_eq!(keys, vec!["3", "1", "2"]);
        assert_eq!(result.dropped, 3);

        // Each retained element is the first occurrence of its key.
        for kept in &result.unique {
            let first = input
                .iter()
                .find(|c| c.identity_key() == kept.identity_key())
                .unwrap();
            assert_eq!(kept, first);
        }
    }
}
