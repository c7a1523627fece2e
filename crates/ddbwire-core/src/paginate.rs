//! Cursor-driven pagination.
//!
//! [`paginate`] turns a page-fetching closure into a lazy stream of items. A
//! page is only requested once the previous one has been consumed, so dropping
//! the stream stops all further calls. An item limit caps the total yielded and
//! is passed down as the page size so no more than needed is read.

use std::collections::VecDeque;
use std::future::Future;

use ddbwire_model::AttributeMap;
use ddbwire_model::output::PageOutput;
use futures::Stream;
use tracing::debug;

use crate::error::Error;

struct State<F> {
    fetch: F,
    cursor: Option<AttributeMap>,
    buffer: VecDeque<AttributeMap>,
    remaining: Option<u64>,
    pages: u32,
    exhausted: bool,
}

/// Stream every item across pages.
///
/// `fetch` is called with the cursor to resume from (`None` for the first page
/// unless `start` is given) and the maximum number of items still wanted. A
/// page without `LastEvaluatedKey` ends the stream. A failed page is yielded as
/// a single error, after which the stream ends.
pub fn paginate<F, Fut>(
    fetch: F,
    start: Option<AttributeMap>,
    limit: Option<u64>,
) -> impl Stream<Item = Result<AttributeMap, Error>>
where
    F: FnMut(Option<AttributeMap>, Option<u32>) -> Fut,
    Fut: Future<Output = Result<PageOutput, Error>>,
{
    let state = State {
        fetch,
        cursor: start,
        buffer: VecDeque::new(),
        remaining: limit,
        pages: 0,
        exhausted: false,
    };

    futures::stream::unfold(state, |mut state| async move {
        loop {
            if state.remaining == Some(0) {
                return None;
            }
            if let Some(item) = state.buffer.pop_front() {
                if let Some(remaining) = state.remaining.as_mut() {
                    *remaining -= 1;
                }
                return Some((Ok(item), state));
            }
            if state.exhausted {
                return None;
            }

            let page_limit = state
                .remaining
                .map(|n| u32::try_from(n).unwrap_or(u32::MAX));
            let cursor = state.cursor.take();
            match (state.fetch)(cursor, page_limit).await {
                Ok(page) => {
                    state.pages += 1;
                    debug!(
                        page = state.pages,
                        items = page.items.len(),
                        more = !page.last_evaluated_key.is_empty(),
                        "fetched page"
                    );
                    if page.last_evaluated_key.is_empty() {
                        state.exhausted = true;
                    } else {
                        state.cursor = Some(page.last_evaluated_key);
                    }
                    state.buffer.extend(page.items);
                }
                Err(err) => {
                    state.exhausted = true;
                    return Some((Err(err), state));
                }
            }
        }
    })
}

/// Sum `Count` across every page.
pub async fn count_pages<F, Fut>(mut fetch: F, start: Option<AttributeMap>) -> Result<u64, Error>
where
    F: FnMut(Option<AttributeMap>) -> Fut,
    Fut: Future<Output = Result<PageOutput, Error>>,
{
    let mut cursor = start;
    let mut total = 0;
    loop {
        let page = fetch(cursor.take()).await?;
        total += page.count;
        if page.last_evaluated_key.is_empty() {
            return Ok(total);
        }
        cursor = Some(page.last_evaluated_key);
    }
}
