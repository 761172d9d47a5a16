use std::sync::Arc;

use once_cell::sync::OnceCell;

use crate::errors::TetherResult;
use crate::scope::Scope;
use crate::store::{DocumentStore, StoreConnector};
use crate::tether_builder::TetherBuilder;
use crate::tether_config::TetherConfig;

/// Process-wide registry of the root store connection.
///
/// The pool connects lazily, the first time a session is requested, and
/// hands every [Scope] its own session copied from the root. Clones share
/// the same connection.
///
/// # Examples
///
/// ```rust,ignore
/// let pool = StorePool::builder().database("inventory").build()?;
/// let scope = pool.scope();
/// let items = scope.collection("items")?;
/// ```
#[derive(Clone)]
pub struct StorePool {
    inner: Arc<StorePoolInner>,
}

struct StorePoolInner {
    config: TetherConfig,
    connector: Box<dyn StoreConnector>,
    root: OnceCell<Arc<dyn DocumentStore>>,
}

impl StorePool {
    pub(crate) fn new(config: TetherConfig, connector: Box<dyn StoreConnector>) -> Self {
        StorePool {
            inner: Arc::new(StorePoolInner {
                config,
                connector,
                root: OnceCell::new(),
            }),
        }
    }

    pub fn builder() -> TetherBuilder {
        TetherBuilder::new()
    }

    pub fn config(&self) -> &TetherConfig {
        &self.inner.config
    }

    /// Returns a new session copied from the root connection, connecting
    /// first if needed. A failed connect is retried on the next call.
    pub fn session(&self) -> TetherResult<Arc<dyn DocumentStore>> {
        let root = self.inner.root.get_or_try_init(|| {
            log::debug!(
                "Connecting to database {} on {}",
                self.inner.config.database(),
                self.inner.config.server()
            );
            self.inner.connector.connect(&self.inner.config)
        })?;
        root.session()
    }

    pub fn is_connected(&self) -> bool {
        self.inner
            .root
            .get()
            .map(|root| !root.is_closed())
            .unwrap_or(false)
    }

    /// Starts a new execution scope on this pool.
    pub fn scope(&self) -> Scope {
        Scope::new(self.clone())
    }

    /// Closes the root connection; sessions copied from it stop working.
    pub fn close(&self) -> TetherResult<()> {
        match self.inner.root.get() {
            Some(root) => root.close(),
            None => Ok(()),
        }
    }
}

impl Drop for StorePoolInner {
    fn drop(&mut self) {
        if let Some(root) = self.root.get() {
            if let Err(e) = root.close() {
                log::warn!("Failed to close store connection: {}", e);
            }
        }
    }
}
