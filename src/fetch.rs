//! Bounded-concurrency fetching of release history documents
//!
//! Requests are multiplexed on the calling task with `buffer_unordered`.
//! Completions are handed to the caller's handler one at a time, in
//! completion order, so the handler may own its accumulator outright.
//! The first terminal failure ends the batch; requests still in flight are
//! dropped with the stream.

use crate::config::DEFAULT_CONCURRENCY;
use crate::error::FetchError;
use crate::progress::Progress;
use crate::registry::{DetailDocument, ReleaseHistory, ReleaseHistorySource};
use futures::stream::{self, StreamExt};
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, warn};

/// Run `fetch` for every key with at most `concurrency` futures in flight and
/// feed each success to `handle` as it completes.
///
/// Returns the first error from either side; nothing after it is fetched or
/// handled.
pub async fn for_each_pooled<K, T, E, F, Fut, H>(
    keys: impl IntoIterator<Item = K>,
    concurrency: usize,
    fetch: F,
    mut handle: H,
) -> Result<(), E>
where
    F: FnMut(K) -> Fut,
    Fut: Future<Output = Result<(K, T), E>>,
    H: FnMut(K, T) -> Result<(), E>,
{
    let mut in_flight = stream::iter(keys)
        .map(fetch)
        .buffer_unordered(concurrency.max(1));
    while let Some(result) = in_flight.next().await {
        let (key, value) = result?;
        handle(key, value)?;
    }
    Ok(())
}

/// Worker pool over a release history source
pub struct FetchOrchestrator {
    source: Arc<dyn ReleaseHistorySource>,
    concurrency: usize,
}

impl FetchOrchestrator {
    pub fn new(source: Arc<dyn ReleaseHistorySource>) -> Self {
        Self {
            source,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Fetch and parse the document of every identifier
    ///
    /// `handler` receives each parsed project in completion order and
    /// `progress` ticks once per completed identifier. Error documents and
    /// unreadable documents are logged and skipped; a transport failure
    /// aborts the batch with [`FetchError::Batch`], and an error returned by
    /// `handler` aborts it with that error.
    pub async fn for_each_document<I, H, E>(
        &self,
        ids: I,
        progress: &Progress,
        mut handler: H,
    ) -> Result<(), E>
    where
        I: IntoIterator<Item = String>,
        H: FnMut(&str, ReleaseHistory) -> Result<(), E>,
        E: From<FetchError>,
    {
        let source = &self.source;
        debug!(
            source = source.source_name(),
            concurrency = self.concurrency,
            "fetching release histories"
        );
        for_each_pooled(
            ids,
            self.concurrency,
            |id| async move {
                match source.fetch_document(&id).await {
                    Ok(body) => Ok((id, body)),
                    Err(e) => Err(E::from(FetchError::batch(id, e))),
                }
            },
            |id, body| {
                progress.inc();
                match ReleaseHistory::parse(&body) {
                    Ok(DetailDocument::Found(history)) => handler(&id, history),
                    Ok(DetailDocument::Missing(message)) => {
                        debug!(project = %id, %message, "no release history");
                        Ok(())
                    }
                    Err(e) => {
                        warn!(project = %id, error = %e, "skipping unreadable release history");
                        Ok(())
                    }
                }
            },
        )
        .await
    }
}
