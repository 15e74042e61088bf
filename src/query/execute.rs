use std::{
    pin::Pin,
    task::{Context, Poll, ready},
};

use super::{ops, portal::Portal};
use crate::{
    Result,
    column::ColumnInfo,
    encode::Encoded,
    postgres::{ProtocolError, backend},
    transport::PgTransport,
};

pin_project_lite::pin_project! {
    #[derive(Debug)]
    #[project = ExecuteProject]
    pub struct Execute<'sql, 'val, IO> {
        #[pin]
        phase: Phase<'sql, 'val, IO>,
    }
}

pin_project_lite::pin_project! {
    #[derive(Debug, Default)]
    #[project = PhaseProject]
    enum Phase<'sql, 'val, IO> {
        Portal {
            #[pin]
            portal: Portal<'sql, 'val, IO>,
        },
        Execute {
            io: Option<IO>,
            cols: Option<Vec<ColumnInfo>>,
            row_count: Option<u64>,
        },
        ReadyForQuery {
            io: IO,
            row_count: Option<u64>,
        },
        #[default]
        Invalid,
        Complete,
    }
}

impl<'sql, 'val, IO> Execute<'sql, 'val, IO> {
    pub fn new(sql: &'sql str, io: IO, params: Vec<Encoded<'val>>, persistent: bool) -> Self {
        Self {
            phase: Phase::Portal {
                portal: Portal::new(sql, io, params, persistent),
            },
        }
    }
}

impl<IO> Future for Execute<'_, '_, IO>
where
    IO: PgTransport,
{
    /// The number of rows affected/returned by the command, per `CommandComplete`'s tag. `None`
    /// if the tag carries no count (e.g. `CREATE TABLE`, `BEGIN`).
    type Output = Result<Option<u64>>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let ExecuteProject { mut phase, } = self.as_mut().project();
        loop {
            match phase.as_mut().project() {
                PhaseProject::Portal { portal } => {
                    let (io, _portal) = ready!(portal.poll(cx)?);
                    *phase = Phase::Execute { io: Some(io), cols: None, row_count: None };
                }
                PhaseProject::Execute { io, cols, row_count } => {
                    use backend::BackendMessage::*;
                    loop {
                        match ready!(io.as_mut().unwrap().poll_recv(cx)?) {
                            RowDescription(rd) => {
                                match ColumnInfo::decode_multi_vec(rd) {
                                    Ok(c) => { cols.replace(c); }
                                    Err(e) => {
                                        *phase = Phase::Complete;
                                        return Poll::Ready(Err(e.into()));
                                    }
                                }
                            }
                            BindComplete(_) => {}
                            NoData(_) => {}
                            DataRow(_) => {}
                            CommandComplete(cc) => {
                                *row_count = ops::command_complete(cc);
                            }
                            PortalSuspended(_) | EmptyQueryResponse(_) => {}
                            f if f.msgtype() == backend::ReadyForQuery::MSGTYPE => {
                                let io = io.take().unwrap();
                                let row_count = *row_count;
                                *phase = Phase::ReadyForQuery { io, row_count };
                                break;
                            }
                            f => {
                                let err = ProtocolError::unexpected_phase(f.msgtype(), "extended query");
                                *phase = Phase::Complete;
                                return Poll::Ready(Err(err.into()));
                            }
                        }
                    }
                },
                PhaseProject::ReadyForQuery { io, row_count } => {
                    let row_count = *row_count;
                    *phase = Phase::Complete;
                    let _ = io;
                    return Poll::Ready(Ok(row_count));
                },
                PhaseProject::Invalid => unreachable!(),
                PhaseProject::Complete => panic!("`poll` after complete"),
            }
        }
    }
}
