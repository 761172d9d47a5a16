use crate::errors::{TetherError, TetherResult};
use crate::scope::StorePool;
use crate::store::{MemoryConnector, StoreConnector};
use crate::tether_config::TetherConfig;

/// Builder for a [StorePool].
///
/// `TetherBuilder` collects connection settings with a fluent API. Invalid
/// settings do not fail immediately: the first error is captured and
/// returned from [`TetherBuilder::build`]. When no connector is given the
/// pool connects to an in-memory store.
///
/// # Examples
///
/// ```rust,ignore
/// use tether::TetherBuilder;
///
/// let pool = TetherBuilder::new()
///     .server("db.internal:27017")
///     .database("inventory")
///     .credentials("app", "secret")
///     .connector(my_connector)
///     .build()?;
///
/// let scope = pool.scope();
/// ```
pub struct TetherBuilder {
    error: Option<TetherError>,
    config: TetherConfig,
    connector: Option<Box<dyn StoreConnector>>,
}

impl Default for TetherBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TetherBuilder {
    pub fn new() -> Self {
        TetherBuilder {
            error: None,
            config: TetherConfig::new(),
            connector: None,
        }
    }

    fn apply(mut self, setter: impl FnOnce(&mut TetherConfig) -> TetherResult<()>) -> Self {
        if self.error.is_none() {
            if let Err(e) = setter(&mut self.config) {
                self.error = Some(e);
            }
        }
        self
    }

    /// Sets the server address handed to the connector.
    pub fn server(self, server: &str) -> Self {
        self.apply(|config| config.set_server(server))
    }

    /// Sets the database name. Names must be non-empty and free of
    /// whitespace and `/\."$`.
    pub fn database(self, database: &str) -> Self {
        self.apply(|config| config.set_database(database))
    }

    pub fn credentials(self, user: &str, password: &str) -> Self {
        self.apply(|config| config.set_credentials(user, password))
    }

    /// Sets the cursor batch size used by queries that do not ask for one.
    pub fn default_batch_size(self, batch_size: u32) -> Self {
        self.apply(|config| config.set_default_batch_size(batch_size))
    }

    /// Sets the connector that opens the root store connection.
    pub fn connector<C: StoreConnector + 'static>(mut self, connector: C) -> Self {
        self.connector = Some(Box::new(connector));
        self
    }

    /// Returns the assembled configuration, or the first captured error.
    pub fn config(&self) -> TetherResult<TetherConfig> {
        match &self.error {
            Some(e) => Err(e.clone()),
            None => Ok(self.config.clone()),
        }
    }

    /// Builds the pool. No connection is made until a scope first needs the
    /// store.
    pub fn build(self) -> TetherResult<StorePool> {
        if let Some(e) = self.error {
            return Err(e);
        }
        let connector = self
            .connector
            .unwrap_or_else(|| Box::new(MemoryConnector::new()));
        Ok(StorePool::new(self.config, connector))
    }
}
