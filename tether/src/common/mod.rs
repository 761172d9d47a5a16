//! Documents, values and the conversion between them and Rust types.

mod constants;
mod convertible;
mod document;
mod document_id;
mod util;
mod value;

pub use constants::*;
pub use convertible::*;
pub use document::*;
pub use document_id::*;
pub use util::*;
pub use value::*;
