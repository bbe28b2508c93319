//! Cursor-based listing.
//!
//! ```text
//! GET resource?filters…            → { meta: { cursor, isTruncated }, data: [..] }
//! GET resource?cursor=…[&limit=…]  → next segment, while isTruncated
//! ```

use std::collections::VecDeque;

use futures_util::stream::{self, Stream};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::cancellation::CancellationSignal;
use crate::error::ClientResult;
use crate::rest::multiplexer::RestClient;
use crate::rest::request::RestRequest;

/// Segment metadata.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListSegmentMeta {
    #[serde(default)]
    pub cursor: Option<String>,
    #[serde(default)]
    pub is_truncated: bool,
}

/// One page of a listing.
#[derive(Debug, Clone, Deserialize)]
pub struct ListSegment<T> {
    #[serde(default)]
    pub meta: ListSegmentMeta,
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
}

impl<T> ListSegment<T> {
    /// Cursor of the next segment, if there is one.
    pub fn next_cursor(&self) -> Option<&str> {
        if self.meta.is_truncated {
            self.meta.cursor.as_deref()
        } else {
            None
        }
    }
}

struct PageState<T> {
    buffered: VecDeque<T>,
    next: Option<RestRequest>,
}

/// Request for the segment after `cursor`.
///
/// Filters were bound to the cursor by the service, only the page size is
/// carried over.
pub(crate) fn next_page(previous: &RestRequest, cursor: &str) -> RestRequest {
    let mut request = RestRequest::get(previous.resource()).query("cursor", cursor);
    if let Some((_, limit)) = previous.query_params().iter().find(|(k, _)| k == "limit") {
        request = request.query("limit", limit);
    }
    request
}

/// Lazily walk every item of a listing, fetching segments on demand.
pub fn paginate<'a, T>(
    rest: &'a RestClient,
    first: RestRequest,
    signal: Option<CancellationSignal>,
) -> impl Stream<Item = ClientResult<T>> + Send + 'a
where
    T: DeserializeOwned + Send + 'a,
{
    let state = PageState {
        buffered: VecDeque::new(),
        next: Some(first),
    };

    stream::try_unfold(state, move |mut state| {
        let signal = signal.clone();
        async move {
            loop {
                if let Some(item) = state.buffered.pop_front() {
                    return Ok(Some((item, state)));
                }
                let Some(request) = state.next.take() else {
                    return Ok(None);
                };

                let outcome = rest.invoke(&request, signal.as_ref()).await?;
                if !outcome.is_success() {
                    return Err(outcome.into_error().await);
                }
                let segment: ListSegment<T> = outcome.deserialize().await?;
                tracing::debug!(
                    resource = request.resource(),
                    items = segment.data.len(),
                    truncated = segment.meta.is_truncated,
                    "Fetched list segment"
                );

                state.next = segment
                    .next_cursor()
                    .map(|cursor| next_page(&request, cursor));
                state.buffered.extend(segment.data);
            }
        }
    })
}
