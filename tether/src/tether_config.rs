//! Connection settings of a store pool.

use std::fmt::{Debug, Formatter};

use crate::common::{DEFAULT_DATABASE, DEFAULT_SERVER};
use crate::errors::{ErrorKind, TetherError, TetherResult};

/// User name and password presented to the store when connecting.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    user: String,
    password: String,
}

impl Credentials {
    pub fn new(user: &str, password: &str) -> Self {
        Credentials {
            user: user.to_string(),
            password: password.to_string(),
        }
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

impl Debug for Credentials {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("password", &"***")
            .finish()
    }
}

/// Settings a [StoreConnector](crate::store::StoreConnector) connects with.
///
/// A configuration is assembled by [TetherBuilder](crate::TetherBuilder) and
/// is read-only once the pool is built.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TetherConfig {
    server: String,
    database: String,
    credentials: Option<Credentials>,
    default_batch_size: Option<u32>,
}

impl Default for TetherConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl TetherConfig {
    /// Creates a configuration for database `test` on `localhost` without
    /// authentication.
    pub fn new() -> Self {
        TetherConfig {
            server: DEFAULT_SERVER.to_string(),
            database: DEFAULT_DATABASE.to_string(),
            credentials: None,
            default_batch_size: None,
        }
    }

    pub fn server(&self) -> &str {
        &self.server
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    /// Batch size applied to queries that do not set one.
    pub fn default_batch_size(&self) -> Option<u32> {
        self.default_batch_size
    }

    pub(crate) fn set_server(&mut self, server: &str) -> TetherResult<()> {
        if server.trim().is_empty() {
            log::error!("Server address cannot be empty");
            return Err(TetherError::new(
                "Server address cannot be empty",
                ErrorKind::ValidationError,
            ));
        }
        self.server = server.trim().to_string();
        Ok(())
    }

    pub(crate) fn set_database(&mut self, database: &str) -> TetherResult<()> {
        if database.is_empty() {
            log::error!("Database name cannot be empty");
            return Err(TetherError::new(
                "Database name cannot be empty",
                ErrorKind::ValidationError,
            ));
        }

        if let Some(c) = database
            .chars()
            .find(|c| c.is_whitespace() || "/\\.\"$".contains(*c))
        {
            log::error!("Database name {} contains invalid character {:?}", database, c);
            return Err(TetherError::new(
                &format!("Database name {} contains invalid character {:?}", database, c),
                ErrorKind::ValidationError,
            ));
        }
        self.database = database.to_string();
        Ok(())
    }

    pub(crate) fn set_credentials(&mut self, user: &str, password: &str) -> TetherResult<()> {
        if user.is_empty() {
            log::error!("User name cannot be empty");
            return Err(TetherError::new(
                "User name cannot be empty",
                ErrorKind::ValidationError,
            ));
        }
        self.credentials = Some(Credentials::new(user, password));
        Ok(())
    }

    pub(crate) fn set_default_batch_size(&mut self, batch_size: u32) -> TetherResult<()> {
        if batch_size == 0 {
            log::error!("Batch size must be positive");
            return Err(TetherError::new(
                "Batch size must be positive",
                ErrorKind::ValidationError,
            ));
        }
        self.default_batch_size = Some(batch_size);
        Ok(())
    }
}
