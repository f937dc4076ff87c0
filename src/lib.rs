//! contactsync - mirror a remote address book into a local contact store.
//!
//! A run fetches raw vCards from the [`source`], reduces them to canonical
//! contacts with the [`reconcile`] engine, applies the minimal inserts and
//! updates to the [`store`], and appends an audit record per run. The
//! [`sync`] module sequences runs and schedules them in daemon mode.

pub mod config;
pub mod models;
pub mod reconcile;
pub mod source;
pub mod store;
pub mod sync;

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!version().is_empty());
    }
}
