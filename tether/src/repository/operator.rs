use std::sync::{Arc, Weak};

use crate::common::{to_document, Document};
use crate::errors::TetherResult;
use crate::repository::materialize::load_one;
use crate::repository::{Entity, PrimaryKey, Query, Repository};
use crate::scope::{Scope, ScopeInner};
use crate::store::{ChangeOutcome, FindOptions, StoreCollection};

/// A [Repository] bound to an execution scope.
///
/// The operator runs every persistence call of its element type against
/// the collection resolved from the scope's store session, dispatching the
/// [Hooks](crate::repository::Hooks) around each store call. It only keeps a
/// weak reference to the scope; once the scope has ended every call fails
/// with [`ErrorKind::ScopeEnded`](crate::errors::ErrorKind::ScopeEnded).
pub struct RepositoryOperator<T: Entity> {
    repository: Repository<T>,
    scope: Weak<ScopeInner>,
    collection: Arc<dyn StoreCollection>,
}

impl<T: Entity> RepositoryOperator<T> {
    pub(crate) fn new(repository: Repository<T>, scope: &Scope) -> TetherResult<Self> {
        let collection = scope.collection(repository.collection_name())?;
        log::debug!(
            "Created operator for {} on collection {} in scope {}",
            repository.type_name(),
            repository.collection_name(),
            scope.id()
        );
        Ok(RepositoryOperator {
            repository,
            scope: scope.downgrade(),
            collection,
        })
    }

    pub fn repository(&self) -> &Repository<T> {
        &self.repository
    }

    /// The collection handle of the scope's session.
    pub fn collection(&self) -> &Arc<dyn StoreCollection> {
        &self.collection
    }

    /// The scope this operator is bound to.
    pub fn scope(&self) -> TetherResult<Scope> {
        Scope::upgrade(&self.scope)
    }

    /// Starts a query over the documents matching `selector`. Nothing is
    /// read until the query is materialized.
    pub fn search(self: &Arc<Self>, selector: Document) -> Query<T> {
        Query::new(self.clone(), selector)
    }

    /// Number of documents matching `selector`.
    pub fn count(&self, selector: &Document) -> TetherResult<usize> {
        self.collection.count(selector, &FindOptions::new())
    }

    /// Inserts `document`.
    pub fn insert(&self, document: &mut T) -> TetherResult<()> {
        let scope = self.scope()?;
        document.on_insert(&scope)?;
        self.collection.insert(to_document(document)?)?;
        document.after_insert(&scope)
    }

    /// Replaces the first document matching `selector` with `document`.
    pub fn update(&self, selector: &Document, document: &mut T) -> TetherResult<()> {
        let scope = self.scope()?;
        document.on_update(&scope, selector)?;
        self.collection.update(selector, to_document(document)?)?;
        document.after_update(&scope, selector)
    }

    /// Removes the first document matching `selector`.
    ///
    /// There is no document instance to run the delete hooks on, so they
    /// run once on the repository's zero value.
    pub fn delete(&self, selector: &Document) -> TetherResult<()> {
        let scope = self.scope()?;
        let zero = self.repository.zero_value();
        zero.on_delete(&scope, selector)?;
        self.collection.remove(selector)?;
        zero.after_delete(&scope, selector)
    }
}

impl<T: Entity + PrimaryKey> RepositoryOperator<T> {
    /// Loads the stored copy of `document`, found by its primary key, into
    /// `document`. Fails with `NotFound` when there is none.
    ///
    /// The key is derived after `on_load`, so the hook may set it up.
    pub fn load_document(&self, document: &mut T) -> TetherResult<()> {
        let scope = self.scope()?;
        document.on_load(&scope)?;
        let selector = document.primary_key(&scope)?;
        load_one(
            &scope,
            self.collection.as_ref(),
            &selector,
            FindOptions::new(),
            document,
        )
    }

    /// Replaces the stored copy of `document`, found by its primary key.
    pub fn update_document(&self, document: &mut T) -> TetherResult<()> {
        let scope = self.scope()?;
        let selector = document.primary_key(&scope)?;
        self.update(&selector, document)
    }

    /// Upserts `document` by its primary key.
    ///
    /// The key is derived after `on_save`, so the hook may assign it.
    /// Exactly one of `after_update` and `after_insert` runs, then
    /// `after_save`.
    pub fn save_document(&self, document: &mut T) -> TetherResult<ChangeOutcome> {
        let scope = self.scope()?;
        document.on_save(&scope)?;

        let selector = document.primary_key(&scope)?;
        let outcome = self.collection.upsert(&selector, to_document(document)?)?;

        if outcome.is_update() {
            document.after_update(&scope, &selector)?;
        } else {
            document.after_insert(&scope)?;
        }
        document.after_save(&scope, &outcome)?;
        Ok(outcome)
    }

    /// Removes the stored copy of `document`, found by its primary key.
    pub fn delete_document(&self, document: &T) -> TetherResult<()> {
        let scope = self.scope()?;
        let selector = document.primary_key(&scope)?;
        document.on_delete(&scope, &selector)?;
        self.collection.remove(&selector)?;
        document.after_delete(&scope, &selector)
    }
}
