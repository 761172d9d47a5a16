//! Entry points persisting several documents, of any types, in one call.
//!
//! Each call takes an ordered list of [Operand]s. Collection and selector
//! operands do not carry a document: they set the collection, respectively
//! the selector, used by the documents that follow them. A document whose
//! type names a collection switches the current collection itself.
//!
//! ```rust,ignore
//! use tether::multi::{self, Operand};
//!
//! multi::insert(&scope, [
//!     Operand::collection("people"),
//!     Operand::document(&mut ada),
//!     Operand::document(&mut alan),
//!     Operand::document(&mut order), // `Order` names its own collection
//! ])?;
//!
//! let mut adults = Vec::new();
//! let mut first = Person::default();
//! let mut plan = multi::find(&scope, [
//!     Operand::collection("people"),
//!     Operand::selector(doc! { age: { "$gte": 18 } }),
//!     Operand::sequence(&mut adults),
//!     Operand::document(&mut first),
//! ]);
//! plan.fetch()?;
//! ```
//!
//! Reaching a document before any collection was set, or updating and
//! deleting without a selector, is a programming error and panics.

use std::collections::VecDeque;

use crate::common::{Document, DocumentId, Value, CHANGE_OUTCOME_KEY};
use crate::errors::TetherResult;
use crate::repository::{fetch_all, fetch_one, Materialize, Persistable};
use crate::scope::Scope;
use crate::store::{ChangeOutcome, FindOptions};

/// One element of a multi-document argument list.
pub enum Operand<'a> {
    /// Switches the collection used by the following documents.
    Collection(&'a str),
    /// Sets the selector used by the following documents.
    Selector(Document),
    Document(&'a mut dyn Persistable),
    /// A bulk destination; only meaningful to [find].
    Sequence(&'a mut dyn Materialize),
}

impl<'a> Operand<'a> {
    pub fn collection(name: &'a str) -> Self {
        Operand::Collection(name)
    }

    pub fn selector(selector: Document) -> Self {
        Operand::Selector(selector)
    }

    pub fn document<T: Persistable>(document: &'a mut T) -> Self {
        Operand::Document(document)
    }

    pub fn sequence<M: Materialize>(target: &'a mut M) -> Self {
        Operand::Sequence(target)
    }
}

impl<'a> From<&'a str> for Operand<'a> {
    fn from(name: &'a str) -> Self {
        Operand::Collection(name)
    }
}

/// Collection and selector carried from one operand to the next.
#[derive(Default)]
struct Carried {
    collection: Option<String>,
    selector: Option<Document>,
}

impl Carried {
    fn switch_to(&mut self, document: &dyn Persistable) {
        if let Some(name) = document.target_collection() {
            self.collection = Some(name);
        }
    }

    fn collection(&self) -> String {
        match &self.collection {
            Some(name) => name.clone(),
            None => panic!("No collection specified before the first document"),
        }
    }

    fn selector(&self) -> Document {
        match &self.selector {
            Some(selector) => selector.clone(),
            None => panic!("No selector specified and the document provides none"),
        }
    }
}

/// Inserts every document operand.
///
/// Hooks run per document in the order `on_save`, `on_insert`, insert,
/// `after_insert`, `after_save`. Selector operands are ignored.
///
/// # Panics
///
/// When a document is reached before any collection is known, or when a
/// sequence operand is given.
pub fn insert<'a>(scope: &Scope, operands: impl IntoIterator<Item = Operand<'a>>) -> TetherResult<()> {
    let mut carried = Carried::default();
    for operand in operands {
        match operand {
            Operand::Collection(name) => carried.collection = Some(name.to_string()),
            Operand::Selector(_) => log::debug!("insert ignores selector operands"),
            Operand::Document(document) => {
                carried.switch_to(document);
                let collection = scope.collection(&carried.collection())?;

                document.on_save(scope)?;
                document.on_insert(scope)?;
                let id = collection.insert(document.encode()?)?;
                let outcome = ChangeOutcome::inserted(id);
                document.after_insert(scope)?;
                document.after_save(scope, &outcome)?;
            }
            Operand::Sequence(_) => panic!("insert does not accept sequence operands"),
        }
    }
    Ok(())
}

/// Replaces the stored copy of every document operand.
///
/// The selector is the document's own load selector when it has one,
/// otherwise the last selector operand. Hooks run in the order `on_save`,
/// `on_update`, update, `after_update`, `after_save`.
///
/// # Panics
///
/// When a document is reached before any collection or selector is known,
/// or when a sequence operand is given.
pub fn update<'a>(scope: &Scope, operands: impl IntoIterator<Item = Operand<'a>>) -> TetherResult<()> {
    let mut carried = Carried::default();
    for operand in operands {
        match operand {
            Operand::Collection(name) => carried.collection = Some(name.to_string()),
            Operand::Selector(selector) => carried.selector = Some(selector),
            Operand::Document(document) => {
                carried.switch_to(document);
                if let Some(selector) = document.selector(scope) {
                    carried.selector = Some(selector);
                }
                let collection = scope.collection(&carried.collection())?;
                let selector = carried.selector();

                document.on_save(scope)?;
                document.on_update(scope, &selector)?;
                collection.update(&selector, document.encode()?)?;
                document.after_update(scope, &selector)?;
                document.after_save(scope, &ChangeOutcome::updated(1))?;
            }
            Operand::Sequence(_) => panic!("update does not accept sequence operands"),
        }
    }
    Ok(())
}

/// Upserts every document operand.
///
/// The selector is, in order of preference, the document's load selector,
/// a selector operand placed right before the document, or the document's
/// own content. After each upsert the outcome is kept in the scope (see
/// [last_change_outcome]) and exactly one of `after_update` and
/// `after_insert` runs, then `after_save`.
///
/// # Panics
///
/// When a document is reached before any collection is known, or when a
/// sequence operand is given.
pub fn save<'a>(scope: &Scope, operands: impl IntoIterator<Item = Operand<'a>>) -> TetherResult<()> {
    let mut carried = Carried::default();
    for operand in operands {
        match operand {
            Operand::Collection(name) => carried.collection = Some(name.to_string()),
            Operand::Selector(selector) => carried.selector = Some(selector),
            Operand::Document(document) => {
                carried.switch_to(document);
                if let Some(selector) = document.selector(scope) {
                    carried.selector = Some(selector);
                }
                let collection = scope.collection(&carried.collection())?;

                document.on_save(scope)?;
                let encoded = document.encode()?;
                let selector = carried.selector.take().unwrap_or_else(|| encoded.clone());
                let outcome = collection.upsert(&selector, encoded)?;
                scope.set(CHANGE_OUTCOME_KEY, outcome.clone());

                if outcome.is_update() {
                    document.after_update(scope, &selector)?;
                } else {
                    document.after_insert(scope)?;
                }
                document.after_save(scope, &outcome)?;
            }
            Operand::Sequence(_) => panic!("save does not accept sequence operands"),
        }
    }
    Ok(())
}

/// Removes documents.
///
/// A selector operand removes the first match right away, without hooks,
/// and is also remembered for the documents that follow. A document is
/// removed by its load selector, or by the last selector operand, with
/// `on_delete` and `after_delete` around the removal.
///
/// # Panics
///
/// When a document or selector is reached before any collection is known,
/// when no selector can be found for a document, or when a sequence operand
/// is given.
pub fn delete<'a>(scope: &Scope, operands: impl IntoIterator<Item = Operand<'a>>) -> TetherResult<()> {
    let mut carried = Carried::default();
    for operand in operands {
        match operand {
            Operand::Collection(name) => carried.collection = Some(name.to_string()),
            Operand::Selector(selector) => {
                let collection = scope.collection(&carried.collection())?;
                collection.remove(&selector)?;
                carried.selector = Some(selector);
            }
            Operand::Document(document) => {
                carried.switch_to(document);
                let collection = scope.collection(&carried.collection())?;
                let selector = match document.selector(scope) {
                    Some(selector) => selector,
                    None => carried.selector(),
                };

                document.on_delete(scope, &selector)?;
                collection.remove(&selector)?;
                document.after_delete(scope, &selector)?;
            }
            Operand::Sequence(_) => panic!("delete does not accept sequence operands"),
        }
    }
    Ok(())
}

/// Plans lookups for every document and sequence operand.
///
/// Nothing is read until [`FetchPlan::fetch`] runs. A document receives the
/// first match of its load selector, or of the last selector operand, or
/// of the whole collection. A sequence receives every match, decoded the
/// same way as [`Query::all`](crate::repository::Query::all).
///
/// # Panics
///
/// When a document or sequence is reached before any collection is known.
pub fn find<'a>(scope: &'a Scope, operands: impl IntoIterator<Item = Operand<'a>>) -> FetchPlan<'a> {
    let mut carried = Carried::default();
    let mut plan = FetchPlan::new();

    for operand in operands {
        match operand {
            Operand::Collection(name) => carried.collection = Some(name.to_string()),
            Operand::Selector(selector) => carried.selector = Some(selector),
            Operand::Document(document) => {
                carried.switch_to(document);
                if let Some(selector) = document.selector(scope) {
                    carried.selector = Some(selector);
                }
                let name = carried.collection();
                let selector = carried.selector.clone().unwrap_or_default();
                plan.push(Box::new(move || {
                    let collection = scope.collection(&name)?;
                    fetch_one(scope, collection.as_ref(), &selector, FindOptions::new(), document)
                }));
            }
            Operand::Sequence(target) => {
                let name = carried.collection();
                let selector = carried.selector.clone().unwrap_or_default();
                plan.push(Box::new(move || {
                    let collection = scope.collection(&name)?;
                    fetch_all(scope, collection.as_ref(), &selector, &FindOptions::new(), target)?;
                    Ok(())
                }));
            }
        }
    }
    plan
}

/// Number of documents of `collection` matching `selector`.
pub fn count(scope: &Scope, collection: &str, selector: &Document) -> TetherResult<usize> {
    scope.collection(collection)?.count(selector, &FindOptions::new())
}

type Executor<'a> = Box<dyn FnOnce() -> TetherResult<()> + 'a>;

/// Deferred lookups produced by [find].
pub struct FetchPlan<'a> {
    executors: VecDeque<Executor<'a>>,
    completed: usize,
}

impl<'a> FetchPlan<'a> {
    fn new() -> Self {
        FetchPlan {
            executors: VecDeque::new(),
            completed: 0,
        }
    }

    fn push(&mut self, executor: Executor<'a>) {
        self.executors.push_back(executor);
    }

    /// Runs the pending lookups in order and stops at the first failure.
    /// Returns the number of lookups completed so far.
    pub fn fetch(&mut self) -> TetherResult<usize> {
        while let Some(executor) = self.executors.pop_front() {
            executor()?;
            self.completed += 1;
        }
        Ok(self.completed)
    }

    /// Number of lookups that completed successfully.
    pub fn completed(&self) -> usize {
        self.completed
    }

    /// Number of lookups not yet run.
    pub fn pending(&self) -> usize {
        self.executors.len()
    }
}

/// Outcome of the last upsert made by [save] in this scope.
pub fn last_change_outcome(scope: &Scope) -> Option<ChangeOutcome> {
    scope.get(CHANGE_OUTCOME_KEY)
}

/// Identifier assigned by the last upsert of [save] that inserted.
pub fn last_upserted_id(scope: &Scope) -> Option<Value> {
    last_change_outcome(scope).and_then(|outcome| outcome.upserted_id().cloned())
}

/// Like [last_upserted_id], for identifiers generated by the store.
pub fn last_document_id(scope: &Scope) -> Option<DocumentId> {
    last_upserted_id(scope).and_then(|id| id.as_id().copied())
}
