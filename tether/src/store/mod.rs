mod change_outcome;
mod document_store;
mod find_options;
pub mod memory;

pub use change_outcome::*;
pub use document_store::*;
pub use find_options::*;
pub use memory::{MemoryConnector, MemoryStore};
