//! Reference [DocumentStore](crate::store::DocumentStore) keeping everything
//! in process memory.

mod collection;
mod cursor;
mod matcher;
mod store;

pub use store::{MemoryConnector, MemoryStore};
