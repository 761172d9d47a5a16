use crate::common::Value;

/// Result descriptor of a write, most notably of an upsert.
///
/// An upsert either updates the first matching document (`updated == 1`) or
/// inserts a new one, in which case `upserted_id` holds the identifier the
/// store assigned. [`ChangeOutcome::is_update`] is what decides whether the
/// `after_update` or the `after_insert` hook fires after a save.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChangeOutcome {
    updated: usize,
    removed: usize,
    matched: usize,
    upserted_id: Option<Value>,
}

impl ChangeOutcome {
    pub fn new(updated: usize, removed: usize, matched: usize, upserted_id: Option<Value>) -> Self {
        ChangeOutcome {
            updated,
            removed,
            matched,
            upserted_id,
        }
    }

    /// Outcome of an update that touched `count` matched documents.
    pub fn updated(count: usize) -> Self {
        ChangeOutcome::new(count, 0, count, None)
    }

    /// Outcome of an insert that produced `id`.
    pub fn inserted(id: Value) -> Self {
        ChangeOutcome::new(0, 0, 0, Some(id))
    }

    /// Outcome of a removal of `count` documents.
    pub fn removed(count: usize) -> Self {
        ChangeOutcome::new(0, count, count, None)
    }

    pub fn updated_count(&self) -> usize {
        self.updated
    }

    pub fn removed_count(&self) -> usize {
        self.removed
    }

    pub fn matched_count(&self) -> usize {
        self.matched
    }

    pub fn upserted_id(&self) -> Option<&Value> {
        self.upserted_id.as_ref()
    }

    /// `true` when an existing document was updated.
    pub fn is_update(&self) -> bool {
        self.updated != 0
    }

    /// `true` when a new document was inserted.
    pub fn is_insert(&self) -> bool {
        self.upserted_id.is_some()
    }
}
