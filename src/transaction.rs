//! Postgres Transaction
use std::io;

use crate::{
    Result,
    postgres::{
        BackendProtocol, backend,
        frontend::{self, FrontendProtocol},
    },
    statement::{SavepointName, StatementName},
    transport::{PgTransport, PgTransportExt},
};

/// An RAII implementation of transaction scope.
///
/// To commit transaction, use [`Transaction::commit`].
///
/// If not commited, when this structure is dropped, transaction will be rolled back.
pub struct Transaction<IO: PgTransport> {
    io: IO,
    commited: bool,
}

/// Begin a transaction on the given connection.
///
/// Sends `BEGIN` and waits for the server to report an in-transaction status.
///
/// Fails with [`Error::Interface`][crate::Error::Interface] if the connection is already inside
/// a transaction block (e.g. a manual `BEGIN` was issued, or a scoped transaction is still open)
/// rather than silently nesting into it.
pub async fn begin<IO: PgTransport>(mut io: IO) -> Result<Transaction<IO>> {
    if io.tx_status() != b'I' {
        return crate::error::err!(
            Interface,
            "cannot begin a transaction: connection is already in a transaction block"
        );
    }

    io.send(frontend::Query { sql: "BEGIN" });
    io.flush().await?;
    io.recv::<backend::CommandComplete>().await?;
    let r = io.recv::<backend::ReadyForQuery>().await?;
    if r.tx_status != b'T' {
        return crate::error::err!(Interface, "server did not enter a transaction block on BEGIN");
    }
    Ok(Transaction::new(io))
}

impl<IO> Transaction<IO>
where
    IO: PgTransport
{
    pub(crate) fn new(io: IO) -> Self {
        Self { io, commited: false }
    }

    pub async fn commit(mut self) -> Result<()> {
        self.io.send(frontend::Query { sql: "COMMIT" });
        self.io.flush().await?;
        self.io.recv::<backend::CommandComplete>().await?;
        let r = self.io.recv::<backend::ReadyForQuery>().await?;
        assert_eq!(r.tx_status,b'I');
        self.commited = true;
        Ok(())
    }

    /// Roll back the whole transaction explicitly, instead of relying on drop.
    pub async fn rollback(mut self) -> Result<()> {
        self.io.send(frontend::Query { sql: "ROLLBACK" });
        self.io.flush().await?;
        self.io.recv::<backend::CommandComplete>().await?;
        let r = self.io.recv::<backend::ReadyForQuery>().await?;
        assert_eq!(r.tx_status,b'I');
        self.commited = true;
        Ok(())
    }

    /// Establish a named savepoint inside this transaction.
    ///
    /// The returned [`Savepoint`] rolls back to that point (rather than aborting the
    /// whole transaction) if it is dropped without being released or rolled back to.
    pub async fn savepoint(&mut self) -> Result<Savepoint<'_, IO>> {
        let name = SavepointName::next();
        self.io.send(frontend::Query { sql: &format!("SAVEPOINT {name}") });
        self.io.flush().await?;
        self.io.recv::<backend::CommandComplete>().await?;
        self.io.recv::<backend::ReadyForQuery>().await?;
        Ok(Savepoint { io: &mut self.io, name, resolved: false })
    }
}

impl<IO> Drop for Transaction<IO>
where
    IO: PgTransport
{
    fn drop(&mut self) {
        if !self.commited {
            self.io.send(frontend::Query { sql: "ROLLBACK" });
            self.io.ready_request();
        }
    }
}

impl<IO> PgTransport for Transaction<IO>
where
    IO: PgTransport
{
    fn poll_flush(&mut self, cx: &mut std::task::Context) -> std::task::Poll<io::Result<()>> {
        IO::poll_flush(&mut self.io, cx)
    }

    fn poll_recv<B: BackendProtocol>(&mut self, cx: &mut std::task::Context) -> std::task::Poll<Result<B>> {
        IO::poll_recv(&mut self.io, cx)
    }

    fn ready_request(&mut self) {
        IO::ready_request(&mut self.io)
    }

    fn send<F: FrontendProtocol>(&mut self, message: F) {
        IO::send(&mut self.io, message)
    }

    fn send_startup(&mut self, startup: frontend::Startup) {
        IO::send_startup(&mut self.io, startup)
    }

    fn get_stmt(&mut self, sql: u64) -> Option<StatementName> {
        IO::get_stmt(&mut self.io, sql)
    }

    fn add_stmt(&mut self, sql: u64, id: StatementName) {
        IO::add_stmt(&mut self.io, sql, id)
    }

    fn tx_status(&self) -> u8 {
        IO::tx_status(&self.io)
    }
}

/// A nested rollback point inside a [`Transaction`].
///
/// Dropping it without [`release`][Savepoint::release] or
/// [`rollback`][Savepoint::rollback] rolls back to the savepoint, undoing everything
/// done since it was established without aborting the outer transaction.
pub struct Savepoint<'a, IO: PgTransport> {
    io: &'a mut IO,
    name: SavepointName,
    resolved: bool,
}

impl<IO: PgTransport> Savepoint<'_, IO> {
    /// Release the savepoint, keeping its effects as part of the enclosing transaction.
    pub async fn release(mut self) -> Result<()> {
        self.io.send(frontend::Query { sql: &format!("RELEASE SAVEPOINT {}", self.name) });
        self.io.flush().await?;
        self.io.recv::<backend::CommandComplete>().await?;
        self.io.recv::<backend::ReadyForQuery>().await?;
        self.resolved = true;
        Ok(())
    }

    /// Roll back to this savepoint, undoing everything done since it was established,
    /// then release it.
    pub async fn rollback(mut self) -> Result<()> {
        self.io.send(frontend::Query { sql: &format!("ROLLBACK TO SAVEPOINT {}", self.name) });
        self.io.send(frontend::Query { sql: &format!("RELEASE SAVEPOINT {}", self.name) });
        self.io.flush().await?;
        self.io.recv::<backend::CommandComplete>().await?;
        self.io.recv::<backend::ReadyForQuery>().await?;
        self.io.recv::<backend::CommandComplete>().await?;
        self.io.recv::<backend::ReadyForQuery>().await?;
        self.resolved = true;
        Ok(())
    }
}

impl<IO: PgTransport> Drop for Savepoint<'_, IO> {
    fn drop(&mut self) {
        if !self.resolved {
            self.io.send(frontend::Query { sql: &format!("ROLLBACK TO SAVEPOINT {}", self.name) });
            self.io.send(frontend::Query { sql: &format!("RELEASE SAVEPOINT {}", self.name) });
            self.io.ready_request();
            self.io.ready_request();
        }
    }
}
