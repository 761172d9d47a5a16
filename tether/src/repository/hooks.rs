use crate::common::Document;
use crate::errors::TetherResult;
use crate::scope::Scope;
use crate::store::ChangeOutcome;

/// Lifecycle callbacks a document type may run around persistence calls.
///
/// # Purpose
/// Lets a document normalize itself before it is written, validate state,
/// stamp timestamps, or react once a write has committed.
///
/// # Characteristics
/// - Every method has a no-op default; a type only overrides what it needs
/// - `on_*` hooks run before the store call. An `Err` aborts the operation
///   and is returned unchanged; the store is never called
/// - `after_*` hooks run only after the store call succeeded. An `Err` is
///   returned to the caller, but the write has already been committed
/// - Delete hooks borrow the document immutably and receive the selector
///   that was (or will be) used for the removal
/// - `after_save` runs after exactly one of `after_insert` / `after_update`
///
/// # Usage
/// ```ignore
/// impl Hooks for Article {
///     fn on_save(&mut self, _scope: &Scope) -> TetherResult<()> {
///         self.slug = slugify(&self.title);
///         Ok(())
///     }
///
///     fn after_load(&mut self, _scope: &Scope) -> TetherResult<()> {
///         self.loaded = true;
///         Ok(())
///     }
/// }
/// ```
#[allow(unused_variables)]
pub trait Hooks {
    /// Runs before a document is decoded from the store into `self`.
    fn on_load(&mut self, scope: &Scope) -> TetherResult<()> {
        Ok(())
    }

    /// Runs after a document was decoded into `self`.
    fn after_load(&mut self, scope: &Scope) -> TetherResult<()> {
        Ok(())
    }

    fn on_insert(&mut self, scope: &Scope) -> TetherResult<()> {
        Ok(())
    }

    fn after_insert(&mut self, scope: &Scope) -> TetherResult<()> {
        Ok(())
    }

    fn on_update(&mut self, scope: &Scope, selector: &Document) -> TetherResult<()> {
        Ok(())
    }

    fn after_update(&mut self, scope: &Scope, selector: &Document) -> TetherResult<()> {
        Ok(())
    }

    fn on_delete(&self, scope: &Scope, selector: &Document) -> TetherResult<()> {
        Ok(())
    }

    fn after_delete(&self, scope: &Scope, selector: &Document) -> TetherResult<()> {
        Ok(())
    }

    /// Runs before an upsert.
    fn on_save(&mut self, scope: &Scope) -> TetherResult<()> {
        Ok(())
    }

    /// Runs last after an upsert, whether it inserted or updated.
    fn after_save(&mut self, scope: &Scope, outcome: &ChangeOutcome) -> TetherResult<()> {
        Ok(())
    }
}

impl Hooks for Document {}
