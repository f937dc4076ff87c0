//! Diffing unique contacts against a snapshot of stored identities.

use serde::Serialize;
use std::collections::HashMap;

use crate::models::Contact;

/// A name change for a contact that already exists in the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NameUpdate {
    pub identity_key: String,
    pub new_full_name: String,
}

/// The minimal set of writes needed to bring the store in line with the
/// source for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WritePlan {
    pub inserts: Vec<Contact>,
    pub updates: Vec<NameUpdate>,
    /// Contacts already stored with the same name. Counted, not written.
    pub unchanged: usize,
}

impl WritePlan {
    pub fn is_empty(&self) -> bool {
        self.inserts.is_empty() && self.updates.is_empty()
    }
}

/// Builds a write plan from unique contacts and the stored
/// `identity_key -> full_name` snapshot.
///
/// `existing` must be the result of a single bulk read taken before
/// planning. This function performs no I/O.
pub fn plan(unique: &[Contact], existing: &HashMap<String, String>) -> WritePlan {
    let mut write_plan = WritePlan::default();

    for contact in unique {
        match existing.get(contact.identity_key()) {
            None => write_plan.inserts.push(contact.clone()),
            Some(stored_name) if stored_name != contact.full_name() => {
                write_plan.updates.push(NameUpdate {
                    identity_key: contact.identity_key().to_string(),
                    new_full_name: contact.full_name().to_string(),
                });
            }
            Some(_) => write_plan.unchanged += 1,
        }
    }

    write_plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconcile::{dedupe, parse};

    fn contact(name: &str, key: &str) -> Contact {
        Contact::new(name, key).unwrap()
    }

    fn existing(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_plan_empty_store_inserts_everything() {
        let raw = [
            "FN:Alice\nTEL:555-1234",
            "FN:Alice Prime\nTEL:(555) 1234",
            "FN:Bob\nTEL:9999999",
        ];
        let parsed = raw.iter().filter_map(|r| parse(r)).collect();
        let deduped = dedupe(parsed);
        assert_eq!(deduped.unique.len(), 2);

        let write_plan = plan(&deduped.unique, &HashMap::new());
        assert_eq!(write_plan.inserts.len(), 2);
        assert!(write_plan.updates.is_empty());
        assert_eq!(write_plan.inserts[0], contact("Alice", "5551234"));
        assert_eq!(write_plan.inserts[1], contact("Bob", "9999999"));
    }

    #[test]
    fn test_plan_name_change_is_update() {
        let write_plan = plan(
            &[contact("Alice Smith", "5551234")],
            &existing(&[("5551234", "Alice")]),
        );
        assert!(write_plan.inserts.is_empty());
        assert_eq!(
            write_plan.updates,
            vec![NameUpdate {
                identity_key: "5551234".to_string(),
                new_full_name: "Alice Smith".to_string(),
            }]
        );
        assert_eq!(write_plan.unchanged, 0);
    }

    #[test]
    fn test_plan_same_name_is_unchanged() {
        let write_plan = plan(
            &[contact("Alice", "5551234")],
            &existing(&[("5551234", "Alice")]),
        );
        assert!(write_plan.is_empty());
        assert_eq!(write_plan.unchanged, 1);
    }

    #[test]
    fn test_plan_name_comparison_is_exact() {
        let write_plan = plan(
            &[contact("alice", "5551234")],
            &existing(&[("5551234", "Alice")]),
        );
        assert_eq!(write_plan.updates.len(), 1);
    }

    #[test]
    fn test_plan_ignores_store_only_contacts() {
        let write_plan = plan(
            &[contact("Bob", "9999999")],
            &existing(&[("5551234", "Alice")]),
        );
        assert_eq!(write_plan.inserts.len(), 1);
        assert!(write_plan.updates.is_empty());
        assert_eq!(write_plan.unchanged, 0);
    }

    #[test]
    fn test_plan_is_pure() {
        let unique = vec![
            contact("Alice Smith", "5551234"),
            contact("Bob", "9999999"),
            contact("Carol", "1112222"),
        ];
        let snapshot = existing(&[("5551234", "Alice"), ("1112222", "Carol")]);

        let first = plan(&unique, &snapshot);
        let second = plan(&unique, &snapshot);
        assert_eq!(first, second);
        assert_eq!(
            first.inserts.len() + first.updates.len() + first.unchanged,
            unique.len()
        );
    }
}
