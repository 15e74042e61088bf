use futures_core::Stream;
use std::{
    mem,
    pin::Pin,
    task::{Context, Poll, ready},
};

use super::Fetch;
use crate::{Result, encode::Encoded, row::FromRow, transport::PgTransport};

pin_project_lite::pin_project! {
    #[derive(Debug)]
    pub struct FetchAll<'sql, 'val, R, IO> {
        #[pin]
        fetch: Fetch<'sql, 'val, R, IO>,
        output: Vec<R>,
    }
}

impl<'sql, 'val, R, IO> FetchAll<'sql, 'val, R, IO> {
    pub(crate) fn new(sql: &'sql str, io: IO, params: Vec<Encoded<'val>>, persistent: bool) -> Self {
        Self {
            fetch: Fetch::new(sql, io, params, persistent),
            output: vec![],
        }
    }
}

impl<R, IO> Future for FetchAll<'_, '_, R, IO>
where
    R: FromRow,
    IO: PgTransport,
{
    type Output = Result<Vec<R>>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context) -> Poll<Self::Output> {
        let me = self.project();
        let mut fetch = me.fetch;
        let output = me.output;

        while let Some(r) = ready!(fetch.as_mut().poll_next(cx)?) {
            output.push(r);
        }

        Poll::Ready(Ok(mem::take(output)))
    }
}
