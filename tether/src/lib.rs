//! # Tether - Hook-driven document repositories
//!
//! Tether is a persistence layer for document databases. Given a Rust type
//! and a collection, it inserts, updates, upserts, deletes and finds
//! documents while running a fixed set of lifecycle hooks around every
//! store call, and it keeps per-request state in an explicit execution
//! scope.
//!
//! ## Key Features
//!
//! - **Hooks**: `on_*` / `after_*` callbacks for load, insert, update, delete and save
//! - **Typed repositories**: one [`Repository`](repository::Repository) per document type
//! - **Bulk decoding**: query results decoded into an existing `Vec`, reusing its elements
//! - **Multi-document calls**: persist documents of different types in one call ([`multi`])
//! - **Execution scopes**: per-request session, operator cache and cleanup actions
//! - **Pluggable stores**: any backend implementing [`DocumentStore`](store::DocumentStore); an in-memory store is included
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use tether::doc;
//! use tether::repository::Repository;
//! use tether::TetherBuilder;
//! use tether_derive::{Convertible, Entity};
//!
//! #[derive(Default, Convertible, Entity)]
//! #[entity(collection = "users", id = "email", default_hooks)]
//! pub struct User {
//!     #[converter(rename = "_id")]
//!     pub email: String,
//!     pub name: String,
//! }
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = TetherBuilder::new().database("app").build()?;
//! let scope = pool.scope();
//!
//! let users = Repository::<User>::new();
//! let operator = users.operator(&scope)?;
//!
//! let mut user = User { email: "ada@example.com".into(), name: "Ada".into() };
//! let outcome = operator.save_document(&mut user)?;
//! assert!(!outcome.is_update());
//!
//! let everyone = operator.search(doc! {}).sort(&["name"]).get_all();
//! scope.end();
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Organization
//!
//! - [`common`] - Documents, values and conversion traits
//! - [`errors`] - Error types and result definitions
//! - [`repository`] - Repositories, operators, queries and hooks
//! - [`multi`] - Multi-document entry points
//! - [`scope`] - Execution scopes and the store pool
//! - [`store`] - Store traits, find options and the in-memory store
//! - [`tether_builder`] / [`tether_config`] - Pool configuration

pub mod common;
pub mod errors;
pub mod multi;
pub mod repository;
pub mod scope;
pub mod store;
pub mod tether_builder;
pub mod tether_config;

pub use tether_builder::TetherBuilder;
pub use tether_config::TetherConfig;

#[cfg(test)]
#[ctor::ctor]
fn init() {
    colog::init();
}
