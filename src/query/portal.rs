use std::{
    hash::{DefaultHasher, Hash, Hasher},
    mem,
    pin::Pin,
    task::{Context, Poll, ready},
};

use crate::{
    Result,
    encode::Encoded,
    ext::UsizeExt,
    postgres::{PgFormat, backend, frontend},
    statement::{PortalName, StatementName},
    transport::PgTransport,
};

pin_project_lite::pin_project! {
    #[derive(Debug)]
    #[project = PortalProject]
    pub struct Portal<'sql, 'val, IO> {
        sql: &'sql str,
        io: Option<IO>,
        phase: Phase,
        params: Vec<Encoded<'val>>,
        persistent: bool,
        max_row: u32,
        flush_only: bool,
    }
}

impl<'sql, 'val, IO> Portal<'sql, 'val, IO> {
    pub fn new(sql: &'sql str, io: IO, params: Vec<Encoded<'val>>, persistent: bool) -> Self {
        let phase = match super::ops::check_sql(sql) {
            Ok(()) => Phase::Prepare,
            Err(error) => Phase::Error(Some(error)),
        };
        Self {
            sql,
            io: Some(io),
            phase,
            params,
            persistent,
            max_row: 0,
            flush_only: false,
        }
    }

    /// Limit the number of rows the server sends before suspending the portal with
    /// `PortalSuspended`, for chunked cursor fetching. `0` means unlimited.
    pub fn with_max_row(mut self, max_row: u32) -> Self {
        self.max_row = max_row;
        self
    }

    /// End the Bind/Describe/Execute batch with `Flush` instead of `Sync`, keeping the portal
    /// (and the transaction) open so the caller can resume it after `PortalSuspended`.
    ///
    /// The caller becomes responsible for eventually sending `Close`+`Sync`.
    pub fn with_flush_only(mut self, flush_only: bool) -> Self {
        self.flush_only = flush_only;
        self
    }
}

#[derive(Debug, Default)]
enum Phase {
    Prepare,
    PrepareFlush(PrepareData),
    PrepareComplete(PrepareData),
    Portal(PrepareData),
    PortalFlush(PortalName),
    Error(Option<crate::Error>),
    #[default]
    Invalid,
    Complete,
}

#[derive(Debug)]
struct PrepareData {
    sqlid: u64,
    stmt: StatementName,
}

impl<IO> Future for Portal<'_, '_, IO>
where
    IO: PgTransport,
{
    type Output = Result<(IO, PortalName)>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let PortalProject {
            sql,
            io: self_io,
            phase,
            params,
            persistent,
            max_row,
            flush_only,
        } = self.as_mut().project();

        let io = self_io.as_mut().expect("foo poll after complete");

        loop {
            match &mut *phase {
                Phase::Prepare => {
                    let sqlid = {
                        let mut buf = DefaultHasher::new();
                        sql.hash(&mut buf);
                        buf.finish()
                    };

                    if *persistent {
                        if let Some(stmt) = io.get_stmt(sqlid) {
                            *phase = Phase::Portal(PrepareData { sqlid, stmt });
                            continue;
                        }
                    }

                    let stmt = match persistent {
                        true => StatementName::next(),
                        false => StatementName::unnamed(),
                    };

                    io.send(frontend::Parse {
                        prepare_name: stmt.as_str(),
                        sql,
                        oids_len: params.len() as _,
                        oids: params.iter().map(Encoded::oid),
                    });
                    io.send(frontend::Flush);

                    *phase = Phase::PrepareFlush(PrepareData { sqlid, stmt });
                }
                Phase::PrepareFlush(_) => {
                    ready!(io.poll_flush(cx)?);
                    let Phase::PrepareFlush(data) = mem::take(phase) else {
                        unreachable!()
                    };
                    *phase = Phase::PrepareComplete(data);
                }
                Phase::PrepareComplete(_) => {
                    ready!(io.poll_recv::<backend::ParseComplete>(cx)?);
                    let Phase::PrepareComplete(data) = mem::take(phase) else {
                        unreachable!()
                    };
                    if *persistent {
                        io.add_stmt(data.sqlid, data.stmt.clone());
                    }
                    *phase = Phase::Portal(data);
                }
                Phase::Portal(data) => {
                    let portal = PortalName::unnamed();

                    io.send(frontend::Bind {
                        portal_name: portal.as_str(),
                        stmt_name: data.stmt.as_str(),
                        param_formats_len: 1,
                        param_formats: [PgFormat::Binary],
                        params_len: params.len().to_u16(),
                        params_size_hint: params
                            .iter()
                            .fold(0, |acc, n| acc + 4 + n.value().len().to_u32()),
                        params: mem::take(params).into_iter(),
                        result_formats_len: 1,
                        result_formats: [PgFormat::Binary],
                    });
                    io.send(frontend::Describe {
                        kind: b'P',
                        name: portal.as_str(),
                    });
                    io.send(frontend::Execute {
                        portal_name: portal.as_str(),
                        max_row: *max_row,
                    });
                    if *flush_only {
                        io.send(frontend::Flush);
                    } else {
                        io.send(frontend::Sync);
                    }

                    *phase = Phase::PortalFlush(portal);
                }
                Phase::PortalFlush(_) => {
                    ready!(io.poll_flush(cx)?);
                    let Phase::PortalFlush(portal) = mem::take(phase) else {
                        unreachable!()
                    };
                    *phase = Phase::Complete;
                    let io = self_io.take().expect("foo poll after complete");
                    return Poll::Ready(Ok((io, portal)));
                }
                Phase::Error(error) => {
                    let error = error.take().expect("`poll` after complete");
                    *phase = Phase::Complete;
                    return Poll::Ready(Err(error));
                }
                Phase::Invalid => unreachable!(),
                Phase::Complete => panic!("`poll` after complete"),
            }
        }
    }
}

