use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use dashmap::DashMap;

use crate::errors::{ErrorKind, TetherError, TetherResult};
use crate::store::memory::collection::{CollectionData, MemoryCollection};
use crate::store::{DocumentStore, StoreCollection, StoreConnector};
use crate::tether_config::TetherConfig;

/// Open/closed state of one store handle.
///
/// A session inherits the state of the handle it was copied from: closing a
/// parent makes every session derived from it unusable.
pub(crate) struct SessionState {
    closed: AtomicBool,
    parent: Option<Arc<SessionState>>,
}

impl SessionState {
    pub(crate) fn root() -> Self {
        SessionState {
            closed: AtomicBool::new(false),
            parent: None,
        }
    }

    fn child(parent: Arc<SessionState>) -> Self {
        SessionState {
            closed: AtomicBool::new(false),
            parent: Some(parent),
        }
    }

    pub(crate) fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
            || self.parent.as_ref().map(|p| p.is_closed()).unwrap_or(false)
    }

    pub(crate) fn ensure_open(&self) -> TetherResult<()> {
        if self.is_closed() {
            log::error!("Store session is already closed");
            return Err(TetherError::new(
                "Store session is already closed",
                ErrorKind::StoreAlreadyClosed,
            ));
        }
        Ok(())
    }
}

pub(crate) struct MemoryDatabase {
    name: String,
    collections: DashMap<String, Arc<CollectionData>>,
}

impl MemoryDatabase {
    fn new(name: &str) -> Self {
        MemoryDatabase {
            name: name.to_string(),
            collections: DashMap::new(),
        }
    }

    fn collection(&self, name: &str) -> Arc<CollectionData> {
        self.collections
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(CollectionData::new(name)))
            .clone()
    }
}

/// A [DocumentStore] keeping its collections in process memory.
///
/// Every handle obtained through [`DocumentStore::session`] shares the same
/// collections but has its own open/closed state.
///
/// # Examples
///
/// ```rust,ignore
/// use tether::store::MemoryStore;
///
/// let store = MemoryStore::new("inventory");
/// let items = store.collection("items")?;
/// items.insert(doc! { name: "bolt" })?;
/// ```
#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<MemoryStoreInner>,
}

struct MemoryStoreInner {
    database: Arc<MemoryDatabase>,
    state: Arc<SessionState>,
}

impl MemoryStore {
    /// Creates a store over a fresh, private database.
    pub fn new(database: &str) -> Self {
        MemoryStore::attach(Arc::new(MemoryDatabase::new(database)))
    }

    fn attach(database: Arc<MemoryDatabase>) -> Self {
        MemoryStore {
            inner: Arc::new(MemoryStoreInner {
                database,
                state: Arc::new(SessionState::root()),
            }),
        }
    }
}

impl DocumentStore for MemoryStore {
    fn session(&self) -> TetherResult<Arc<dyn DocumentStore>> {
        self.inner.state.ensure_open()?;
        log::debug!("Opening session on in-memory database {}", self.inner.database.name);
        Ok(Arc::new(MemoryStore {
            inner: Arc::new(MemoryStoreInner {
                database: self.inner.database.clone(),
                state: Arc::new(SessionState::child(self.inner.state.clone())),
            }),
        }))
    }

    fn database_name(&self) -> String {
        self.inner.database.name.clone()
    }

    fn collection(&self, name: &str) -> TetherResult<Arc<dyn StoreCollection>> {
        self.inner.state.ensure_open()?;
        if name.is_empty() {
            log::error!("Collection name cannot be empty");
            return Err(TetherError::new(
                "Collection name cannot be empty",
                ErrorKind::ValidationError,
            ));
        }
        let data = self.inner.database.collection(name);
        Ok(Arc::new(MemoryCollection::new(data, self.inner.state.clone())))
    }

    fn collection_names(&self) -> TetherResult<Vec<String>> {
        self.inner.state.ensure_open()?;
        let mut names: Vec<String> = self
            .inner
            .database
            .collections
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        names.sort();
        Ok(names)
    }

    fn close(&self) -> TetherResult<()> {
        if !self.inner.state.closed.swap(true, Ordering::AcqRel) {
            log::debug!("Closed handle on in-memory database {}", self.inner.database.name);
        }
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.inner.state.is_closed()
    }
}

/// Connects pools to in-memory databases.
///
/// Databases are shared by name among every pool using the same connector,
/// so two pools built on one connector see each other's writes. When users
/// are registered, `connect` requires matching credentials.
#[derive(Clone, Default)]
pub struct MemoryConnector {
    inner: Arc<MemoryConnectorInner>,
}

#[derive(Default)]
struct MemoryConnectorInner {
    databases: DashMap<String, Arc<MemoryDatabase>>,
    users: DashMap<String, String>,
}

impl MemoryConnector {
    pub fn new() -> Self {
        MemoryConnector::default()
    }

    /// Registers a user; once any user exists, anonymous connections are refused.
    pub fn with_user(self, user: &str, password: &str) -> Self {
        self.inner.users.insert(user.to_string(), password.to_string());
        self
    }

    fn authenticate(&self, config: &TetherConfig) -> TetherResult<()> {
        if self.inner.users.is_empty() {
            return Ok(());
        }

        let accepted = config
            .credentials()
            .and_then(|c| {
                self.inner
                    .users
                    .get(c.user())
                    .map(|password| password.value() == c.password())
            })
            .unwrap_or(false);

        if !accepted {
            log::error!("Authentication failed for database {}", config.database());
            return Err(TetherError::new(
                &format!("Authentication failed for database {}", config.database()),
                ErrorKind::SecurityError,
            ));
        }
        Ok(())
    }
}

impl StoreConnector for MemoryConnector {
    fn connect(&self, config: &TetherConfig) -> TetherResult<Arc<dyn DocumentStore>> {
        self.authenticate(config)?;
        let database = self
            .inner
            .databases
            .entry(config.database().to_string())
            .or_insert_with(|| Arc::new(MemoryDatabase::new(config.database())))
            .clone();
        log::debug!("Connected to in-memory database {} on {}", config.database(), config.server());
        Ok(Arc::new(MemoryStore::attach(database)))
    }
}
