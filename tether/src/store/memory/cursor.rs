use std::collections::VecDeque;

use crate::common::Document;
use crate::errors::TetherResult;
use crate::store::StoreCursor;

/// Cursor over a snapshot of matching documents.
///
/// The snapshot is taken when the cursor is opened, so writes issued while a
/// result set is being consumed do not show up in it.
pub(crate) struct MemoryCursor {
    collection: String,
    documents: VecDeque<Document>,
    closed: bool,
}

impl MemoryCursor {
    pub(crate) fn new(collection: &str, documents: Vec<Document>) -> Self {
        MemoryCursor {
            collection: collection.to_string(),
            documents: documents.into(),
            closed: false,
        }
    }
}

impl StoreCursor for MemoryCursor {
    fn next(&mut self) -> Option<Document> {
        if self.closed {
            return None;
        }
        self.documents.pop_front()
    }

    fn close(&mut self) -> TetherResult<()> {
        if !self.closed {
            log::debug!(
                "Closing cursor on {} with {} unread documents",
                self.collection,
                self.documents.len()
            );
            self.closed = true;
            self.documents.clear();
        }
        Ok(())
    }
}
