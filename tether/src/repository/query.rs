use std::sync::Arc;

use crate::common::{Convertible, Document, Value};
use crate::errors::TetherResult;
use crate::repository::materialize::{fetch_all, fetch_one};
use crate::repository::{Entity, RepositoryOperator};
use crate::store::FindOptions;

/// A pending find over a repository's collection.
///
/// Modifiers can be chained in any order; the query is sent to the store
/// only when one of the consuming calls (`one`, `all`, `get_one`,
/// `get_all`, `count`, `distinct`) runs, and every one of them consumes
/// the query.
///
/// # Examples
///
/// ```rust,ignore
/// let mut adults = Vec::new();
/// operator
///     .search(doc! { age: { "$gte": 18 } })
///     .sort(&["lastname", "-age"])
///     .skip(20)
///     .limit(10)
///     .all(&mut adults)?;
/// ```
pub struct Query<T: Entity> {
    operator: Arc<RepositoryOperator<T>>,
    selector: Document,
    options: FindOptions,
}

impl<T: Entity> Query<T> {
    pub(crate) fn new(operator: Arc<RepositoryOperator<T>>, selector: Document) -> Self {
        Query {
            operator,
            selector,
            options: FindOptions::new(),
        }
    }

    pub fn selector(&self) -> &Document {
        &self.selector
    }

    pub fn options(&self) -> &FindOptions {
        &self.options
    }

    /// Skips the first `n` results.
    pub fn skip(mut self, n: u64) -> Self {
        self.options = self.options.skip(n);
        self
    }

    /// Returns at most `n` results; zero removes the limit.
    pub fn limit(mut self, n: u64) -> Self {
        self.options = self.options.limit(n);
        self
    }

    /// Orders the results by `fields`; a leading `-` sorts descending.
    pub fn sort(mut self, fields: &[&str]) -> Self {
        self.options = self.options.sort_fields(fields);
        self
    }

    /// Restricts the fields retrieved, e.g. `doc! { name: 1 }`.
    pub fn select(mut self, projection: Document) -> Self {
        self.options = self.options.projection(projection);
        self
    }

    pub fn batch(mut self, n: u32) -> Self {
        self.options = self.options.batch_size(n);
        self
    }

    /// Asks the store to use the index made of `fields`.
    pub fn hint(mut self, fields: &[&str]) -> Self {
        self.options = self.options.hint(fields);
        self
    }

    fn find_options(&self) -> FindOptions {
        let default_batch = self
            .operator
            .scope()
            .ok()
            .and_then(|scope| scope.pool().config().default_batch_size());
        match (self.options.batch_size_hint(), default_batch) {
            (None, Some(n)) => self.options.clone().batch_size(n),
            _ => self.options.clone(),
        }
    }

    /// Decodes the first result into `target`, running `on_load` before the
    /// lookup and `after_load` after decoding. Fails with `NotFound` when
    /// nothing matches.
    pub fn one(self, target: &mut T) -> TetherResult<()> {
        let scope = self.operator.scope()?;
        let options = self.find_options();
        fetch_one(
            &scope,
            self.operator.collection().as_ref(),
            &self.selector,
            options,
            target,
        )
    }

    /// Decodes every result into `target`.
    ///
    /// Elements already in `target` are decoded over in place, in order;
    /// further results are appended and `target` is finally truncated to
    /// the number of results. Each element gets `on_load` before and
    /// `after_load` after its decode. The first error aborts the call. The
    /// store cursor is always closed, and a failure to close it is reported
    /// even when every document decoded.
    pub fn all(self, target: &mut Vec<T>) -> TetherResult<()> {
        let scope = self.operator.scope()?;
        let options = self.find_options();
        fetch_all(
            &scope,
            self.operator.collection().as_ref(),
            &self.selector,
            &options,
            target,
        )?;
        Ok(())
    }

    /// Like [`Query::one`] on a fresh value; any failure yields `None`.
    pub fn get_one(self) -> Option<T> {
        let mut target = T::default();
        match self.one(&mut target) {
            Ok(()) => Some(target),
            Err(e) => {
                if !e.is_not_found() {
                    log::warn!("get_one failed: {}", e);
                }
                None
            }
        }
    }

    /// Like [`Query::all`] on a fresh vector; any failure yields an empty
    /// vector.
    pub fn get_all(self) -> Vec<T> {
        let mut target = Vec::new();
        match self.all(&mut target) {
            Ok(()) => target,
            Err(e) => {
                log::warn!("get_all failed: {}", e);
                Vec::new()
            }
        }
    }

    /// Number of results, honoring `skip` and `limit`.
    pub fn count(self) -> TetherResult<usize> {
        self.operator
            .collection()
            .count(&self.selector, &self.options)
    }

    /// Distinct values of `field` among the matching documents.
    pub fn distinct(self, field: &str) -> TetherResult<Vec<Value>> {
        self.operator.collection().distinct(field, &self.selector)
    }

    /// Like [`Query::distinct`], converting each value to `V`.
    pub fn distinct_as<V: Convertible>(self, field: &str) -> TetherResult<Vec<V>> {
        self.distinct(field)?
            .iter()
            .map(V::from_value)
            .collect()
    }
}
