use crate::reconcile::WritePlan;
use crate::store::{ContactStore, StoreError};

/// Counts reported after applying a write plan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionSummary {
    pub inserted: u64,
    pub updated: u64,
    /// Identity keys whose insert collided with an existing row.
    pub conflicts: Vec<String>,
}

/// Applies `plan` to `store` as one bulk insert followed by one bulk update.
///
/// Duplicate-key collisions on insert are recovered: the successful
/// inserts are still counted and the colliding keys are returned in
/// [`ExecutionSummary::conflicts`]. Any other store failure is
/// returned as an error. Unchanged contacts are not counted here.
pub async fn execute<S: ContactStore>(
    store: &S,
    plan: &WritePlan,
) -> Result<ExecutionSummary, StoreError> {
    let mut summary = ExecutionSummary::default();

    if !plan.inserts.is_empty() {
        let result = store.insert_unordered(&plan.inserts).await?;
        summary.inserted = result.inserted;
        if let Some(conflict) = result.conflict {
            summary.conflicts = conflict.keys;
        }
    }

    if !plan.updates.is_empty() {
        let result = store.update_names_unordered(&plan.updates).await?;
        summary.updated = result.modified;
    }

    Ok(summary)
}
