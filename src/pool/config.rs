use std::{fmt, sync::Arc, time::Duration};

use futures_core::future::BoxFuture;

use crate::{Config, PgConnection, Result};

use super::Pool;

/// Callback run on every newly opened connection, before it is handed to a caller.
pub(crate) type InitHook = Arc<dyn Fn(&mut PgConnection) -> BoxFuture<'_, Result<()>> + Send + Sync>;

/// Pool configuration builder.
pub struct PoolConfig {
    pub(crate) conn: Config,
    pub(crate) max_conn: usize,
    pub(crate) min_conn: usize,
    pub(crate) acquire_timeout: Option<Duration>,
    pub(crate) after_connect: Option<InitHook>,
}

impl PoolConfig {
    pub fn new() -> PoolConfig {
        Self {
            conn: Config::from_env(),
            max_conn: 10,
            min_conn: 0,
            acquire_timeout: Some(Duration::from_secs(30)),
            after_connect: None,
        }
    }

    /// Get connection config.
    pub fn connection_config(&self) -> &Config {
        &self.conn
    }

    /// Set the connection config used to open new connections.
    pub fn connection(mut self, conn: Config) -> Self {
        self.conn = conn;
        self
    }

    /// Set max connection value.
    pub fn max_connection(mut self, value: usize) -> Self {
        self.max_conn = value;
        self
    }

    /// Set the number of connections the pool tries to keep open eagerly, instead of only
    /// opening connections lazily as callers acquire them. Clamped to [`max_connection`] by the
    /// worker, which only opens a connection past this count on demand.
    ///
    /// [`max_connection`]: Self::max_connection
    pub fn min_connection(mut self, value: usize) -> Self {
        self.min_conn = value;
        self
    }

    /// Cap how long [`Pool::connection`][crate::Pool::connection] waits for a connection to
    /// become available, failing with [`Error::Timeout`][crate::Error::Timeout] past that point.
    ///
    /// `None` waits forever. Defaults to 30 seconds.
    pub fn acquire_timeout(mut self, value: impl Into<Option<Duration>>) -> Self {
        self.acquire_timeout = value.into();
        self
    }

    /// Run a callback on every connection the pool opens, before it can be acquired, e.g. to
    /// set session variables or register type codecs.
    pub fn after_connect<F>(mut self, f: F) -> Self
    where
        F: for<'c> Fn(&'c mut PgConnection) -> BoxFuture<'c, Result<()>> + Send + Sync + 'static,
    {
        self.after_connect = Some(Arc::new(f));
        self
    }
}

impl fmt::Debug for PoolConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoolConfig")
            .field("conn", &self.conn)
            .field("max_conn", &self.max_conn)
            .field("min_conn", &self.min_conn)
            .field("acquire_timeout", &self.acquire_timeout)
            .field("after_connect", &self.after_connect.is_some())
            .finish()
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl PoolConfig {
    pub fn connect(mut self, url: &str) -> Result<Pool> {
        self.conn = Config::parse(url)?;
        Ok(Pool::connect_lazy_with(self))
    }

    pub fn connect_lazy(mut self, url: &str) -> Result<Pool> {
        self.conn = Config::parse(url)?;
        Ok(Pool::connect_lazy_with(self))
    }
}

impl Pool {
    pub fn connect(url: &str) -> Result<Self> {
        PoolConfig::new().connect(url)
    }
}
