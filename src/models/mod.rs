mod contact;
mod sync_outcome;

pub use contact::{Contact, StoredContact, NOTES_MAX_LEN};
pub use sync_outcome::SyncOutcome;
