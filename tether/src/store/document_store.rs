use std::sync::Arc;

use crate::common::{Document, Value};
use crate::errors::TetherResult;
use crate::store::{ChangeOutcome, FindOptions};
use crate::tether_config::TetherConfig;

/// Opens the root connection of a [`StorePool`](crate::scope::StorePool).
///
/// A connector is called at most once per pool, the first time a scope
/// needs the store. It is where dialing and authentication happen.
pub trait StoreConnector: Send + Sync {
    fn connect(&self, config: &TetherConfig) -> TetherResult<Arc<dyn DocumentStore>>;
}

/// A handle to a document database.
///
/// The root handle returned by a [StoreConnector] is shared by the whole
/// process; every execution scope works on its own copy obtained through
/// [`DocumentStore::session`] and closes that copy when the scope ends.
pub trait DocumentStore: Send + Sync {
    /// Returns an independent session sharing the same database.
    fn session(&self) -> TetherResult<Arc<dyn DocumentStore>>;

    fn database_name(&self) -> String;

    /// Resolves the handle of a collection, creating it lazily.
    fn collection(&self, name: &str) -> TetherResult<Arc<dyn StoreCollection>>;

    fn collection_names(&self) -> TetherResult<Vec<String>>;

    /// Closes this handle. Closing twice is a no-op.
    fn close(&self) -> TetherResult<()>;

    fn is_closed(&self) -> bool;
}

/// CRUD primitives against one collection.
///
/// `update` and `remove` act on the first document matching the filter and
/// fail with [`ErrorKind::NotFound`](crate::errors::ErrorKind::NotFound)
/// when nothing matches. `upsert` replaces the first match or inserts the
/// document when there is none.
pub trait StoreCollection: Send + Sync {
    fn name(&self) -> &str;

    /// Opens a cursor over the documents matching `filter`.
    fn find(&self, filter: &Document, options: &FindOptions) -> TetherResult<Box<dyn StoreCursor>>;

    fn count(&self, filter: &Document, options: &FindOptions) -> TetherResult<usize>;

    /// Distinct values of `field` among the documents matching `filter`.
    fn distinct(&self, field: &str, filter: &Document) -> TetherResult<Vec<Value>>;

    /// Inserts `document` and returns its `_id`, assigning a fresh
    /// [DocumentId](crate::common::DocumentId) when it has none.
    fn insert(&self, document: Document) -> TetherResult<Value>;

    fn update(&self, filter: &Document, document: Document) -> TetherResult<()>;

    fn upsert(&self, filter: &Document, document: Document) -> TetherResult<ChangeOutcome>;

    fn remove(&self, filter: &Document) -> TetherResult<()>;
}

/// A server-side cursor.
///
/// `next` yields documents until the result set is exhausted or an error
/// occurs; the error, if any, is reported by `close`. A cursor must be
/// closed exactly once.
pub trait StoreCursor: Send {
    fn next(&mut self) -> Option<Document>;

    fn close(&mut self) -> TetherResult<()>;
}
