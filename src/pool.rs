use crate::{Config, PgConnection, Result};

mod config;

#[cfg(feature = "tokio")]
mod worker;

pub use config::PoolConfig;

#[derive(Clone, Debug)]
enum PoolHandle {
    #[cfg(feature = "tokio")]
    Worker(worker::WorkerHandle),
}

impl PoolHandle {
    fn new_worker(_config: PoolConfig) -> PoolHandle {
        #[cfg(feature = "tokio")]
        {
            let (handle,worker) = worker::WorkerHandle::new(_config);
            tokio::spawn(worker);
            Self::Worker(handle)
        }

        #[cfg(not(feature = "tokio"))]
        {
            panic!("runtime disabled")
        }
    }

    async fn acquire(&self) -> Result<PgConnection> {
        #[cfg(feature = "tokio")]
        match self {
            PoolHandle::Worker(w) => w.acquire().await,
        }

        #[cfg(not(feature = "tokio"))]
        {
            panic!("runtime disabled")
        }
    }

    fn release(&self, _conn: PgConnection) {
        #[cfg(feature = "tokio")]
        match self {
            PoolHandle::Worker(w) => w.release(_conn),
        }
    }
}

/// A pool of [`PgConnection`]s.
///
/// Connections are created lazily and reused between acquisitions. A connection checked
/// out from the pool is returned automatically on drop.
#[derive(Debug)]
pub struct Pool {
    conn: Option<PgConnection>,
    handle: PoolHandle,
}

impl Clone for Pool {
    fn clone(&self) -> Self {
        Self {
            conn: None,
            handle: self.handle.clone(),
        }
    }
}

impl Pool {
    /// Connect lazily to the url, without establishing any connection yet.
    pub fn connect_lazy(url: &str) -> Result<Self> {
        PoolConfig::new().connect_lazy(url)
    }

    /// Build a lazily-connecting pool from a pre-built config.
    pub fn connect_lazy_with(config: PoolConfig) -> Self {
        Self {
            conn: None,
            handle: PoolHandle::new_worker(config),
        }
    }

    /// Acquire a connection, checking it out from the pool.
    ///
    /// The connection is returned to the pool automatically when the returned
    /// borrow is dropped.
    pub async fn connection(&mut self) -> Result<&mut PgConnection> {
        if self.conn.is_none() {
            self.conn = Some(self.handle.acquire().await?)
        }

        Ok(self.conn.as_mut().unwrap())
    }
}

impl Drop for Pool {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            self.handle.release(conn);
        }
    }
}

impl From<Config> for PoolConfig {
    fn from(conn: Config) -> Self {
        PoolConfig::new().connection(conn)
    }
}
