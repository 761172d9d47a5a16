use std::any::type_name;
use std::sync::Arc;

use crate::common::{collection_name_of, REPOSITORY_KEY_PREFIX};
use crate::errors::{ErrorKind, TetherError, TetherResult};
use crate::repository::{Entity, RepositoryOperator};
use crate::scope::Scope;

/// Describes where and how documents of type `T` are stored.
///
/// A repository is immutable once built and cheap to clone; it is usually
/// created once and shared. Work is done through the [RepositoryOperator]
/// it hands out per execution scope.
///
/// # Examples
///
/// ```rust,ignore
/// let users = Repository::<User>::new();
/// let archive = Repository::<User>::with_collection("users_archive");
///
/// let operator = users.operator(&scope)?;
/// operator.insert(&mut user)?;
/// ```
pub struct Repository<T: Entity> {
    inner: Arc<RepositoryInner<T>>,
}

struct RepositoryInner<T> {
    collection: String,
    type_name: &'static str,
    zero: T,
}

impl<T: Entity> Clone for Repository<T> {
    fn clone(&self) -> Self {
        Repository {
            inner: self.inner.clone(),
        }
    }
}

impl<T: Entity> Default for Repository<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Entity> Repository<T> {
    /// Creates a repository on the collection named by `T`, or on the
    /// lower-cased type name when `T` does not name one.
    pub fn new() -> Self {
        let zero = T::default();
        let collection = zero
            .collection_name()
            .unwrap_or_else(collection_name_of::<T>);
        Self::build(collection, zero)
    }

    /// Creates a repository on an explicit collection.
    pub fn with_collection(collection: &str) -> Self {
        Self::build(collection.to_string(), T::default())
    }

    fn build(collection: String, zero: T) -> Self {
        Repository {
            inner: Arc::new(RepositoryInner {
                collection,
                type_name: type_name::<T>(),
                zero,
            }),
        }
    }

    pub fn collection_name(&self) -> &str {
        &self.inner.collection
    }

    pub fn type_name(&self) -> &str {
        self.inner.type_name
    }

    /// The default instance of `T`, receiver of the hooks of selector-only
    /// deletes.
    pub fn zero_value(&self) -> &T {
        &self.inner.zero
    }

    /// Returns the operator of this repository in `scope`, creating it on
    /// first use.
    ///
    /// Operators are cached per collection name: repeated calls within one
    /// scope return the same instance. Asking for a collection that the
    /// scope already serves with another element type is an error.
    pub fn operator(&self, scope: &Scope) -> TetherResult<Arc<RepositoryOperator<T>>> {
        let key = format!("{}{}", REPOSITORY_KEY_PREFIX, self.inner.collection);
        if scope.contains(&key) && scope.get::<Arc<RepositoryOperator<T>>>(&key).is_none() {
            log::error!(
                "Collection {} is already served by another element type than {}",
                self.inner.collection,
                self.inner.type_name
            );
            return Err(TetherError::new(
                &format!(
                    "Collection {} is already served by another element type than {}",
                    self.inner.collection, self.inner.type_name
                ),
                ErrorKind::InvalidOperation,
            ));
        }

        scope.get_or_try_insert_with(&key, || {
            RepositoryOperator::new(self.clone(), scope).map(Arc::new)
        })
    }
}
