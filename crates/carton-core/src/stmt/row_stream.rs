use super::Row;
use crate::Result;

use std::{
    pin::Pin,
    task::{Context, Poll},
};
use tokio_stream::{Stream, StreamExt};

type DynStream = Pin<Box<dyn Stream<Item = Result<Row>> + Send + 'static>>;

/// An asynchronous stream of result rows.
///
/// Produced by drivers for non-buffered results. The mapping layer always
/// buffers a stream before routing it (see `QueryResult::buffer`).
pub struct RowStream {
    stream: DynStream,
}

impl RowStream {
    pub fn from_stream<T>(stream: T) -> Self
    where
        T: Stream<Item = Result<Row>> + Send + 'static,
    {
        Self {
            stream: Box::pin(stream),
        }
    }

    pub fn from_vec(rows: Vec<Row>) -> Self {
        Self::from_stream(tokio_stream::iter(rows.into_iter().map(Ok)))
    }

    /// Returns the next row in the stream
    pub async fn next(&mut self) -> Option<Result<Row>> {
        StreamExt::next(self).await
    }

    /// Drains the stream into a buffered row list, stopping at the first
    /// error.
    pub async fn collect(mut self) -> Result<Vec<Row>> {
        let mut ret = vec![];

        while let Some(res) = self.next().await {
            ret.push(res?);
        }

        Ok(ret)
    }
}

impl Stream for RowStream {
    type Item = Result<Row>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.stream.as_mut().poll_next(cx)
    }
}

impl std::fmt::Debug for RowStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RowStream").finish_non_exhaustive()
    }
}
