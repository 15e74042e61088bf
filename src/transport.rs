//! Core transport abstraction for sending and receiving postgres protocol messages.
use std::{
    future::poll_fn,
    io,
    task::{Context, Poll},
};

use crate::{
    Result,
    postgres::{BackendProtocol, FrontendProtocol, frontend},
    statement::StatementName,
};

/// A buffered, poll-based postgres message transport.
///
/// Implementors own a write buffer that [`send`][PgTransport::send] appends to and a read
/// buffer that [`poll_recv`][PgTransport::poll_recv] decodes from; neither touches the
/// underlying socket until [`poll_flush`][PgTransport::poll_flush] or `poll_recv` is driven.
pub trait PgTransport {
    /// Drive the write buffer onto the underlying socket.
    fn poll_flush(&mut self, cx: &mut Context) -> Poll<io::Result<()>>;

    /// Decode the next backend message of type `B` from the socket.
    ///
    /// Implementors handle `NoticeResponse`/`ErrorResponse` transparently: a notice is logged
    /// and skipped, an error response resolves to `Err` and queues a `Sync`.
    fn poll_recv<B: BackendProtocol>(&mut self, cx: &mut Context) -> Poll<Result<B>>;

    /// Mark that a `ReadyForQuery` is now owed by the server and must be drained before the
    /// next real response, without sending anything itself.
    ///
    /// Used right after queuing a message known to provoke a `Sync`-driven `ReadyForQuery`
    /// (e.g. on `ErrorResponse`, or when a pending `Query`/rollback is queued on drop).
    fn ready_request(&mut self);

    /// Buffer a frontend message. Call [`poll_flush`][PgTransport::poll_flush] to send it.
    fn send<F: FrontendProtocol>(&mut self, message: F);

    /// Buffer the [`Startup`][frontend::Startup] message.
    ///
    /// For historical reasons the startup message has no message-type byte, so it cannot
    /// implement [`FrontendProtocol`].
    fn send_startup(&mut self, startup: frontend::Startup);

    /// Look up a cached prepared statement by the hash of its SQL text.
    ///
    /// Implementors that do not cache statements can keep the default, which always misses.
    fn get_stmt(&mut self, _sqlid: u64) -> Option<StatementName> {
        None
    }

    /// Record a newly parsed prepared statement under the hash of its SQL text.
    ///
    /// Implementors that do not cache statements can keep the default no-op; the caller is
    /// expected to close an unnamed/unmanaged statement itself.
    fn add_stmt(&mut self, _sqlid: u64, _name: StatementName) {}

    /// Current backend transaction status: `b'I'` idle, `b'T'` in transaction, `b'E'` failed
    /// transaction. Updated from every `ReadyForQuery` that passes through `poll_recv`.
    fn tx_status(&self) -> u8;
}

impl<T: PgTransport + ?Sized> PgTransport for &mut T {
    fn poll_flush(&mut self, cx: &mut Context) -> Poll<io::Result<()>> {
        T::poll_flush(self, cx)
    }

    fn poll_recv<B: BackendProtocol>(&mut self, cx: &mut Context) -> Poll<Result<B>> {
        T::poll_recv(self, cx)
    }

    fn ready_request(&mut self) {
        T::ready_request(self)
    }

    fn send<F: FrontendProtocol>(&mut self, message: F) {
        T::send(self, message)
    }

    fn send_startup(&mut self, startup: frontend::Startup) {
        T::send_startup(self, startup)
    }

    fn get_stmt(&mut self, sqlid: u64) -> Option<StatementName> {
        T::get_stmt(self, sqlid)
    }

    fn add_stmt(&mut self, sqlid: u64, name: StatementName) {
        T::add_stmt(self, sqlid, name)
    }

    fn tx_status(&self) -> u8 {
        T::tx_status(self)
    }
}

/// Async convenience methods built from [`PgTransport`]'s poll-based core.
///
/// Blanket-implemented so any `PgTransport` (bare `PgConnection`, `&mut PgConnection`,
/// `Transaction<IO>`) gets `.flush().await` and `.recv::<T>().await` for free.
pub trait PgTransportExt: PgTransport {
    /// Flush the write buffer to the socket.
    fn flush(&mut self) -> impl Future<Output = Result<()>> + '_ {
        poll_fn(|cx| self.poll_flush(cx).map_err(Into::into))
    }

    /// Receive and decode the next backend message of type `B`.
    fn recv<B: BackendProtocol>(&mut self) -> impl Future<Output = Result<B>> + '_ {
        poll_fn(|cx| self.poll_recv(cx))
    }
}

impl<T: PgTransport + ?Sized> PgTransportExt for T {}
