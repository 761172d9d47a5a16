//! Typed repositories with lifecycle hooks.
//!
//! A [Repository] describes where documents of one Rust type live. Inside
//! an execution scope it hands out a [RepositoryOperator], which performs
//! the persistence calls and runs the type's [Hooks] around each of them.
//! Queries built with [`RepositoryOperator::search`] decode results either
//! into a single value or, in bulk, into a `Vec` whose existing elements are
//! reused before new ones are appended.
//!
//! ```rust,ignore
//! use tether::repository::Repository;
//! use tether_derive::{Convertible, Entity};
//!
//! #[derive(Default, Convertible, Entity)]
//! #[entity(collection = "users", id = "email")]
//! pub struct User {
//!     pub email: String,
//!     pub name: String,
//! }
//!
//! let users = Repository::<User>::new();
//! let operator = users.operator(&scope)?;
//! let outcome = operator.save_document(&mut user)?;
//! let everyone = operator.search(doc! {}).sort(&["name"]).get_all();
//! ```

mod entity;
#[cfg(test)]
pub(crate) mod fixtures;
mod hooks;
mod materialize;
mod operator;
mod query;
mod repository;

pub use entity::*;
pub use hooks::*;
pub use materialize::Materialize;
pub(crate) use materialize::{fetch_all, fetch_one};
pub use operator::*;
pub use query::*;
pub use repository::*;
