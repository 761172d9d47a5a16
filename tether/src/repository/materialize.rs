use crate::common::{Document, Value};
use crate::errors::{ErrorKind, TetherError, TetherResult};
use crate::repository::{Entity, Persistable};
use crate::scope::Scope;
use crate::store::{FindOptions, StoreCollection, StoreCursor};

/// A destination that bulk results can be decoded into.
///
/// Implemented for `Vec<T>` of any [Entity]. Existing elements are reused
/// in order: the first results are decoded over them in place, the rest are
/// appended, and the vector is finally truncated to the number of results.
pub trait Materialize {
    /// Drains `cursor` into `self`, returning how many documents were decoded.
    /// The cursor is closed before returning, also on failure.
    fn materialize(&mut self, scope: &Scope, cursor: Box<dyn StoreCursor>) -> TetherResult<usize>;
}

impl<T: Entity> Materialize for Vec<T> {
    fn materialize(&mut self, scope: &Scope, cursor: Box<dyn StoreCursor>) -> TetherResult<usize> {
        load_all(scope, cursor, self)
    }
}

/// Owns an open store cursor and closes it exactly once: explicitly through
/// [`CursorGuard::close`], or on drop when a failure or a panic unwinds past
/// it.
pub(crate) struct CursorGuard {
    cursor: Box<dyn StoreCursor>,
    closed: bool,
}

impl CursorGuard {
    pub(crate) fn new(cursor: Box<dyn StoreCursor>) -> Self {
        CursorGuard {
            cursor,
            closed: false,
        }
    }

    pub(crate) fn next(&mut self) -> Option<Document> {
        self.cursor.next()
    }

    pub(crate) fn close(mut self) -> TetherResult<()> {
        self.closed = true;
        self.cursor.close()
    }
}

impl Drop for CursorGuard {
    fn drop(&mut self) {
        if !self.closed {
            self.closed = true;
            if let Err(e) = self.cursor.close() {
                log::warn!("Failed to close cursor while unwinding: {}", e);
            }
        }
    }
}

fn decode_into<T: Entity>(scope: &Scope, target: &mut T, document: Document) -> TetherResult<()> {
    target.on_load(scope)?;
    *target = T::from_value(&Value::Document(document))?;
    target.after_load(scope)
}

/// Decodes every document of `cursor` into `target`, reusing its elements
/// before appending new ones.
pub(crate) fn load_all<T: Entity>(
    scope: &Scope,
    cursor: Box<dyn StoreCursor>,
    target: &mut Vec<T>,
) -> TetherResult<usize> {
    let mut guard = CursorGuard::new(cursor);
    let mut index = 0;

    while let Some(document) = guard.next() {
        if index < target.len() {
            decode_into(scope, &mut target[index], document)?;
        } else {
            let mut element = T::default();
            decode_into(scope, &mut element, document)?;
            target.push(element);
        }
        index += 1;
    }

    target.truncate(index);
    guard.close()?;
    Ok(index)
}

/// Takes the first document of `cursor` and closes it.
///
/// An empty cursor fails with `NotFound`; a failure to close it is then
/// only logged, so absence is still reported as absence.
fn first_document(
    cursor: Box<dyn StoreCursor>,
    collection: &str,
    selector: &Document,
) -> TetherResult<Document> {
    let mut guard = CursorGuard::new(cursor);
    match guard.next() {
        Some(document) => {
            guard.close()?;
            Ok(document)
        }
        None => {
            if let Err(e) = guard.close() {
                log::warn!("Failed to close empty cursor of {}: {}", collection, e);
            }
            log::debug!("No document in {} matches {}", collection, selector);
            Err(TetherError::new(
                &format!("No document in {} matches {}", collection, selector),
                ErrorKind::NotFound,
            ))
        }
    }
}

/// Finds the first document matching `selector` and decodes it into
/// `target`, then runs `after_load`. `on_load` is left to the caller.
pub(crate) fn load_one(
    scope: &Scope,
    collection: &dyn StoreCollection,
    selector: &Document,
    options: FindOptions,
    target: &mut dyn Persistable,
) -> TetherResult<()> {
    let cursor = collection.find(selector, &options.limit(1))?;
    let document = first_document(cursor, collection.name(), selector)?;
    target.decode(document)?;
    target.after_load(scope)
}

/// Like [load_one], running `on_load` before the lookup.
pub(crate) fn fetch_one(
    scope: &Scope,
    collection: &dyn StoreCollection,
    selector: &Document,
    options: FindOptions,
    target: &mut dyn Persistable,
) -> TetherResult<()> {
    target.on_load(scope)?;
    load_one(scope, collection, selector, options, target)
}

/// Runs `selector` with `options` and materializes the results into `target`.
pub(crate) fn fetch_all(
    scope: &Scope,
    collection: &dyn StoreCollection,
    selector: &Document,
    options: &FindOptions,
    target: &mut dyn Materialize,
) -> TetherResult<usize> {
    let cursor = collection.find(selector, options)?;
    target.materialize(scope, cursor)
}
