use futures_core::Stream;
use std::{
    pin::Pin,
    task::{Context, Poll, ready},
};

use super::Fetch;
use crate::{Error, Result, encode::Encoded, row::FromRow, transport::PgTransport};

pin_project_lite::pin_project! {
    #[derive(Debug)]
    pub struct FetchOne<'sql, 'val, R, IO> {
        #[pin]
        fetch: Fetch<'sql, 'val, R, IO>,
        row: Option<R>,
        complete: bool,
    }
}

impl<'sql, 'val, R, IO> FetchOne<'sql, 'val, R, IO> {
    pub(crate) fn new(sql: &'sql str, io: IO, params: Vec<Encoded<'val>>, persistent: bool) -> Self {
        Self {
            fetch: Fetch::new(sql, io, params, persistent),
            row: None,
            complete: false,
        }
    }
}

impl<R, IO> Future for FetchOne<'_, '_, R, IO>
where
    R: FromRow,
    IO: PgTransport,
{
    type Output = Result<R>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context) -> Poll<Self::Output> {
        let me = self.project();
        let mut fetch = me.fetch;
        let row = me.row;
        let complete = me.complete;

        if *complete {
            panic!("`poll` after complete");
        }

        loop {
            match &mut *row {
                None => {
                    let Some(r) = ready!(fetch.as_mut().poll_next(cx)?) else {
                        *complete = true;
                        return Poll::Ready(Err(Error::RowNotFound));
                    };
                    assert!(row.replace(r).is_none());
                },
                Some(_) => {
                    // drain the rest of the portal (should be `PortalSuspended`/end-of-stream only)
                    assert!(ready!(fetch.as_mut().poll_next(cx)?).is_none());
                    *complete = true;
                    return Poll::Ready(Ok(row.take().unwrap()));
                },
            }
        }
    }
}
