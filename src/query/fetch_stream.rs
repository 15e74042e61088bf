use futures_core::Stream;
use std::{
    marker::PhantomData,
    mem,
    pin::Pin,
    task::{Context, Poll, ready},
};

use super::portal::Portal;
use crate::{
    Result,
    column::ColumnInfo,
    encode::Encoded,
    postgres::{backend, frontend},
    row::{FromRow, Row},
    statement::PortalName,
    transport::PgTransport,
};

pin_project_lite::pin_project! {
    /// A stream of rows from a cursor: `max_row` (when non-zero) caps how many rows the
    /// server sends per batch before replying with `PortalSuspended`, in which case the same
    /// portal is re-executed for the next batch. The portal is closed (`Close`+`Sync`) once
    /// the command completes or the stream is dropped.
    #[project = FetchStreamProject]
    pub struct FetchStream<'sql, 'val, R, IO> {
        #[pin]
        phase: Phase<'sql, 'val, IO>,
        max_row: u32,
        _p: PhantomData<R>,
    }
}

impl<'sql, 'val, R, IO> std::fmt::Debug for FetchStream<'sql, 'val, R, IO>
where
    IO: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchStream").field("phase", &self.phase).finish()
    }
}

pin_project_lite::pin_project! {
    #[derive(Debug)]
    #[project = PhaseProject]
    enum Phase<'sql, 'val, IO> {
        Portal {
            #[pin]
            portal: Portal<'sql, 'val, IO>,
        },
        RowDescription { io: Option<IO>, portal: PortalName },
        DataRow { io: Option<IO>, cols: Vec<ColumnInfo>, portal: PortalName },
        ResumeFlush { io: Option<IO>, cols: Vec<ColumnInfo>, portal: PortalName },
        CloseFlush { io: Option<IO> },
        CloseComplete { io: Option<IO> },
        CloseReady { io: Option<IO> },
        Error { error: Option<crate::Error> },
        Complete,
    }
}

impl<'sql, 'val, R, IO> FetchStream<'sql, 'val, R, IO>
where
    IO: PgTransport,
{
    /// Creating a cursor outside a transaction fails with
    /// [`Error::Programming`][crate::Error::Programming]: a cursor's portal only lives for the
    /// duration of the transaction that created it.
    pub(crate) fn new(sql: &'sql str, io: IO, params: Vec<Encoded<'val>>, max_row: u32) -> Self {
        if io.tx_status() != b'T' {
            let error = crate::Error::Programming(
                "cursor can only be created inside a transaction".into(),
            );
            return Self { phase: Phase::Error { error: Some(error) }, max_row, _p: PhantomData };
        }

        Self {
            phase: Phase::Portal {
                portal: Portal::new(sql, io, params, false)
                    .with_max_row(max_row)
                    .with_flush_only(true),
            },
            max_row,
            _p: PhantomData,
        }
    }
}

impl<R, IO> Stream for FetchStream<'_, '_, R, IO>
where
    R: FromRow,
    IO: PgTransport,
{
    type Item = Result<R>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let FetchStreamProject { mut phase, max_row, .. } = self.project();
        let max_row = *max_row;

        loop {
            match phase.as_mut().project() {
                PhaseProject::Portal { portal } => {
                    let (io, portal) = ready!(portal.poll(cx)?);
                    *phase = Phase::RowDescription { io: Some(io), portal };
                },
                PhaseProject::RowDescription { io, portal } => {
                    // `NoData` would be unexpected here: a stream expects rows.
                    let rd = ready!(io.as_mut().unwrap().poll_recv::<backend::RowDescription>(cx)?);
                    let cols = match ColumnInfo::decode_multi_vec(rd) {
                        Ok(cols) => cols,
                        Err(err) => {
                            *phase = Phase::Complete;
                            return Poll::Ready(Some(Err(err.into())));
                        }
                    };
                    let io = io.take();
                    let portal = portal.clone();
                    *phase = Phase::DataRow { io, cols, portal };
                },
                PhaseProject::DataRow { io, cols, portal } => {
                    use backend::BackendMessage::*;
                    match ready!(io.as_mut().unwrap().poll_recv(cx)?) {
                        DataRow(dr) => {
                            return Poll::Ready(Some(R::from_row(Row::new(cols, dr)).map_err(Into::into)));
                        }
                        PortalSuspended(_) => {
                            io.as_mut().unwrap().send(frontend::Execute {
                                portal_name: portal.as_str(),
                                max_row,
                            });
                            io.as_mut().unwrap().send(frontend::Flush);

                            let io = io.take();
                            let cols = mem::take(cols);
                            let portal = portal.clone();
                            *phase = Phase::ResumeFlush { io, cols, portal };
                        }
                        CommandComplete(_) | EmptyQueryResponse(_) => {
                            io.as_mut().unwrap().send(frontend::Close { variant: b'P', name: portal.as_str() });
                            io.as_mut().unwrap().send(frontend::Sync);
                            let io = io.take();
                            *phase = Phase::CloseFlush { io };
                        }
                        f => {
                            let err = f.unexpected("fetching cursor rows");
                            *phase = Phase::Complete;
                            return Poll::Ready(Some(Err(err)));
                        }
                    }
                },
                PhaseProject::ResumeFlush { io, cols, portal } => {
                    ready!(io.as_mut().unwrap().poll_flush(cx)?);
                    let io = io.take();
                    let cols = mem::take(cols);
                    let portal = portal.clone();
                    *phase = Phase::DataRow { io, cols, portal };
                },
                PhaseProject::CloseFlush { io } => {
                    ready!(io.as_mut().unwrap().poll_flush(cx)?);
                    *phase = Phase::CloseComplete { io: io.take() };
                },
                PhaseProject::CloseComplete { io } => {
                    ready!(io.as_mut().unwrap().poll_recv::<backend::CloseComplete>(cx)?);
                    *phase = Phase::CloseReady { io: io.take() };
                },
                PhaseProject::CloseReady { io } => {
                    ready!(io.as_mut().unwrap().poll_recv::<backend::ReadyForQuery>(cx)?);
                    *phase = Phase::Complete;
                },
                PhaseProject::Error { error } => {
                    let error = error.take().expect("`poll_next` after complete");
                    *phase = Phase::Complete;
                    return Poll::Ready(Some(Err(error)));
                },
                PhaseProject::Complete => return Poll::Ready(None),
            }
        }
    }
}
