//! Execution scopes: per-flow caches of sessions, operators and values.

mod pool;

pub use pool::*;

use std::any::Any;
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use uuid::Uuid;

use crate::common::SESSION_KEY;
use crate::errors::{ErrorKind, TetherError, TetherResult};
use crate::store::{DocumentStore, StoreCollection};

type Cleanup = Box<dyn FnOnce() + Send>;

/// The context of one logical flow of work, typically a request.
///
/// A scope caches what the flow needs more than once: the store session,
/// repository operators and arbitrary values such as the outcome of the
/// last save. Everything registered with [`Scope::register_cleanup`] runs
/// exactly once, in reverse registration order, when the scope ends, either
/// explicitly through [`Scope::end`] or when the last clone is dropped.
///
/// A scope is meant to be driven by one flow at a time. Scopes never share
/// sessions with each other.
///
/// # Examples
///
/// ```rust,ignore
/// let scope = pool.scope();
/// let repository = Repository::<User>::new();
/// let operator = repository.operator(&scope)?;
/// operator.insert(&mut user)?;
/// scope.end();
/// ```
#[derive(Clone)]
pub struct Scope {
    inner: Arc<ScopeInner>,
}

pub(crate) struct ScopeInner {
    id: String,
    pool: StorePool,
    ended: AtomicBool,
    values: Mutex<HashMap<String, Arc<dyn Any + Send + Sync>>>,
    cleanups: Mutex<Vec<Cleanup>>,
}

impl Scope {
    pub(crate) fn new(pool: StorePool) -> Self {
        let id = Uuid::new_v4().to_string();
        log::debug!("Starting scope {}", id);
        Scope {
            inner: Arc::new(ScopeInner {
                id,
                pool,
                ended: AtomicBool::new(false),
                values: Mutex::new(HashMap::new()),
                cleanups: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn id(&self) -> &str {
        &self.inner.id
    }

    pub fn pool(&self) -> &StorePool {
        &self.inner.pool
    }

    pub fn is_ended(&self) -> bool {
        self.inner.ended.load(Ordering::Acquire)
    }

    /// Returns a clone of the value cached under `key`, or `None` when the
    /// key is absent or holds a value of another type.
    pub fn get<V: Clone + 'static>(&self, key: &str) -> Option<V> {
        let value = self.inner.values.lock().get(key).cloned()?;
        value.downcast_ref::<V>().cloned()
    }

    /// Caches `value` under `key`, replacing any previous value.
    pub fn set<V: Send + Sync + 'static>(&self, key: &str, value: V) {
        let previous = self
            .inner
            .values
            .lock()
            .insert(key.to_string(), Arc::new(value));
        drop(previous);
    }

    pub fn contains(&self, key: &str) -> bool {
        self.inner.values.lock().contains_key(key)
    }

    /// Removes the value cached under `key`; returns whether one was present.
    pub fn remove(&self, key: &str) -> bool {
        let previous = self.inner.values.lock().remove(key);
        previous.is_some()
    }

    /// Returns the value under `key`, computing and caching it first if the
    /// key is absent. The provider runs without any lock held, so it may use
    /// the scope itself.
    pub fn get_or_try_insert_with<V, F>(&self, key: &str, provider: F) -> TetherResult<V>
    where
        V: Clone + Send + Sync + 'static,
        F: FnOnce() -> TetherResult<V>,
    {
        if let Some(value) = self.get::<V>(key) {
            return Ok(value);
        }
        if self.contains(key) {
            log::error!("Scope value {} has an unexpected type", key);
            return Err(TetherError::new(
                &format!("Scope value {} has an unexpected type", key),
                ErrorKind::InvalidOperation,
            ));
        }

        let value = provider()?;
        let mut values = self.inner.values.lock();
        let existing = values.get(key).and_then(|v| v.downcast_ref::<V>().cloned());
        match existing {
            Some(existing) => Ok(existing),
            None => {
                values.insert(key.to_string(), Arc::new(value.clone()));
                Ok(value)
            }
        }
    }

    /// Registers a function to run when the scope ends. On a scope that has
    /// already ended the function runs immediately.
    pub fn register_cleanup<F: FnOnce() + Send + 'static>(&self, cleanup: F) {
        if self.is_ended() {
            log::debug!("Scope {} already ended, running cleanup now", self.inner.id);
            run_cleanup(Box::new(cleanup));
            return;
        }
        self.inner.cleanups.lock().push(Box::new(cleanup));
    }

    /// Returns this scope's store session, opening it on first use. The
    /// session is closed when the scope ends.
    pub fn store(&self) -> TetherResult<Arc<dyn DocumentStore>> {
        if self.is_ended() {
            log::error!("Scope {} has already ended", self.inner.id);
            return Err(TetherError::new(
                &format!("Scope {} has already ended", self.inner.id),
                ErrorKind::ScopeEnded,
            ));
        }

        if let Some(session) = self.get::<Arc<dyn DocumentStore>>(SESSION_KEY) {
            return Ok(session);
        }

        let session = self.inner.pool.session()?;
        log::debug!("Scope {} opened a store session", self.inner.id);
        self.set(SESSION_KEY, session.clone());

        let closing = session.clone();
        let scope_id = self.inner.id.clone();
        self.register_cleanup(move || {
            if let Err(e) = closing.close() {
                log::warn!("Failed to close session of scope {}: {}", scope_id, e);
            }
        });
        Ok(session)
    }

    /// Resolves a collection handle on this scope's session.
    pub fn collection(&self, name: &str) -> TetherResult<Arc<dyn StoreCollection>> {
        self.store()?.collection(name)
    }

    /// Ends the scope: runs the registered cleanups and drops cached values.
    /// Ending twice is a no-op.
    pub fn end(&self) {
        self.inner.finish();
    }

    pub(crate) fn downgrade(&self) -> Weak<ScopeInner> {
        Arc::downgrade(&self.inner)
    }

    pub(crate) fn upgrade(inner: &Weak<ScopeInner>) -> TetherResult<Scope> {
        match inner.upgrade() {
            Some(inner) if !inner.ended.load(Ordering::Acquire) => Ok(Scope { inner }),
            _ => {
                log::error!("The scope of this operator has already ended");
                Err(TetherError::new(
                    "The scope of this operator has already ended",
                    ErrorKind::ScopeEnded,
                ))
            }
        }
    }
}

impl ScopeInner {
    fn finish(&self) {
        if self.ended.swap(true, Ordering::AcqRel) {
            return;
        }

        let cleanups = std::mem::take(&mut *self.cleanups.lock());
        log::debug!("Ending scope {} with {} cleanups", self.id, cleanups.len());
        for cleanup in cleanups.into_iter().rev() {
            run_cleanup(cleanup);
        }

        let values = std::mem::take(&mut *self.values.lock());
        drop(values);
    }
}

impl Drop for ScopeInner {
    fn drop(&mut self) {
        self.finish();
    }
}

fn run_cleanup(cleanup: Cleanup) {
    if catch_unwind(AssertUnwindSafe(cleanup)).is_err() {
        log::warn!("A scope cleanup panicked");
    }
}
