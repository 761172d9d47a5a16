use crate::common::{to_document, Convertible, Document, Value};
use crate::errors::TetherResult;
use crate::repository::Hooks;
use crate::scope::Scope;

/// A document type that can be stored through a [Repository](crate::repository::Repository).
///
/// # Purpose
/// Bundles the capabilities a persisted type needs: conversion to and from
/// documents, the lifecycle hooks, a zero value, and two optional pieces of
/// metadata.
///
/// # Characteristics
/// - `Default` provides the zero value used to allocate new elements and as
///   the hook receiver of selector-only deletes
/// - `collection_name` overrides the collection the type lives in; without
///   it the lower-cased type name is used
/// - `load_selector` lets the multi-document entry points find the stored
///   copy of a document when no explicit selector is given
/// - Usually derived with `#[derive(Entity)]` from `tether_derive`
///
/// # Usage
/// ```ignore
/// #[derive(Default, Convertible, Entity)]
/// #[entity(collection = "people", id = "email", default_hooks)]
/// pub struct Person {
///     email: String,
///     name: String,
/// }
/// ```
pub trait Entity: Convertible + Hooks + Default + Send + Sync + 'static {
    /// Name of the collection holding documents of this type.
    fn collection_name(&self) -> Option<String> {
        None
    }

    /// Selector identifying the stored copy of this document, if it can tell.
    fn load_selector(&self, _scope: &Scope) -> Option<Document> {
        None
    }
}

/// A document able to produce the selector that identifies it in its
/// collection.
///
/// Required by the key-driven operator calls: `load_document`,
/// `update_document`, `save_document` and `delete_document`.
pub trait PrimaryKey {
    fn primary_key(&self, scope: &Scope) -> TetherResult<Document>;
}

impl Entity for Document {}

/// Object-safe view of a document used by the multi-document entry points,
/// where documents of different types travel in one argument list.
///
/// Implemented for every [Entity]; there is no need to implement it by hand.
pub trait Persistable: Hooks {
    /// Collection named by the document's type, if any.
    fn target_collection(&self) -> Option<String>;

    /// Selector locating the stored copy of the document, if it can tell.
    fn selector(&self, scope: &Scope) -> Option<Document>;

    fn encode(&self) -> TetherResult<Document>;

    /// Replaces the content of `self` with a decoded store document.
    fn decode(&mut self, document: Document) -> TetherResult<()>;
}

impl<T: Entity> Persistable for T {
    fn target_collection(&self) -> Option<String> {
        Entity::collection_name(self)
    }

    fn selector(&self, scope: &Scope) -> Option<Document> {
        self.load_selector(scope)
    }

    fn encode(&self) -> TetherResult<Document> {
        to_document(self)
    }

    fn decode(&mut self, document: Document) -> TetherResult<()> {
        *self = T::from_value(&Value::Document(document))?;
        Ok(())
    }
}
