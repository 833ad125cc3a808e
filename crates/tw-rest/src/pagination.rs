//! Cursor pagination over list endpoints.
//!
//! A [`Cursor`] describes the next page to fetch. [`next_page`] fetches one
//! page and hands back the cursor for the following one, or `None` once
//! the API stops returning `meta.next_token`. [`Paginator`] drives that
//! loop lazily as a [`futures::Stream`] of items.

use std::fmt;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::stream::{self, BoxStream, Stream, StreamExt};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use birdwire_client::{ApiRequest, Payload, Result, TwitterHttpClient};

use crate::merge::{merge, split_envelope, Includes};

/// Query parameter an endpoint reads its page token from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenParam {
    /// Most list endpoints.
    PaginationToken,
    /// Search endpoints.
    NextToken,
}

impl TokenParam {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenParam::PaginationToken => "pagination_token",
            TokenParam::NextToken => "next_token",
        }
    }
}

/// Position in a paginated listing.
#[derive(Debug, Clone)]
pub struct Cursor {
    version: String,
    path: String,
    params: Vec<(String, String)>,
    token_param: TokenParam,
    token: Option<String>,
    auth: bool,
}

impl Cursor {
    /// A cursor at the first page of `path`.
    pub fn new(version: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            path: path.into(),
            params: Vec::new(),
            token_param: TokenParam::PaginationToken,
            token: None,
            auth: false,
        }
    }

    /// Add a query parameter sent with every page.
    pub fn param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((name.into(), value.into()));
        self
    }

    /// Use a different token parameter.
    pub fn token_param(mut self, token_param: TokenParam) -> Self {
        self.token_param = token_param;
        self
    }

    /// Resume from a token returned by an earlier page.
    pub fn starting_at(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Sign page requests with OAuth 1.0a.
    pub fn oauth1(mut self) -> Self {
        self.auth = true;
        self
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// The request for the page this cursor points at.
    pub fn request(&self) -> ApiRequest {
        let mut request = ApiRequest::get(self.version.clone(), self.path.clone())
            .with_auth(self.auth);
        for (name, value) in &self.params {
            request = request.query(name.clone(), value.clone());
        }
        request.query_opt(self.token_param.as_str(), self.token.clone())
    }

    fn advance(&self, token: String) -> Self {
        Self {
            token: Some(token),
            ..self.clone()
        }
    }
}

/// One page of results.
#[derive(Debug, Clone)]
pub struct Page<T> {
    /// Items in page order, each merged with the page's includes.
    pub items: Vec<T>,
    /// `meta.result_count` as reported by the API.
    pub result_count: Option<u64>,
    /// Token of the following page.
    pub next_token: Option<String>,
}

impl<T> Page<T> {
    fn empty() -> Self {
        Self {
            items: Vec::new(),
            result_count: Some(0),
            next_token: None,
        }
    }
}

/// Fetch the page `cursor` points at.
///
/// Returns the page and the cursor for the next one, `None` when the
/// listing is exhausted.
pub async fn next_page<T: DeserializeOwned>(
    client: &TwitterHttpClient,
    cursor: &Cursor,
) -> Result<(Page<T>, Option<Cursor>)> {
    let body = match client.execute(&cursor.request()).await? {
        Payload::EmptyCollection | Payload::Empty => return Ok((Page::empty(), None)),
        payload => payload.into_json()?,
    };

    let meta = body.get("meta").cloned().unwrap_or(Value::Null);
    let result_count = meta.get("result_count").and_then(Value::as_u64);
    let next_token = meta
        .get("next_token")
        .and_then(Value::as_str)
        .map(str::to_string);

    let (data, includes) = split_envelope(body);
    let items = decode_items(data, &includes)?;

    debug!(
        path = cursor.path(),
        items = items.len(),
        has_next = next_token.is_some(),
        "Fetched page"
    );

    let next = next_token.clone().map(|token| cursor.advance(token));
    Ok((
        Page {
            items,
            result_count,
            next_token,
        },
        next,
    ))
}

fn decode_items<T: DeserializeOwned>(data: Value, includes: &Includes) -> Result<Vec<T>> {
    let items = match data {
        Value::Array(items) => items,
        // An envelope with only `meta` carries no items.
        Value::Object(object) if !object.contains_key("id") => Vec::new(),
        Value::Null => Vec::new(),
        single => vec![single],
    };

    items
        .iter()
        .map(|item| Ok(serde_json::from_value(merge(item, includes))?))
        .collect()
}

/// A lazy, forward-only stream over every item of a listing.
///
/// Nothing is fetched until the stream is polled. A fetch error is yielded
/// once and ends the stream. Dropping the stream abandons the listing.
pub struct Paginator<T> {
    inner: BoxStream<'static, Result<T>>,
}

struct PaginatorState {
    client: TwitterHttpClient,
    cursor: Option<Cursor>,
    pages_left: Option<usize>,
}

impl<T> Paginator<T>
where
    T: DeserializeOwned + Send + 'static,
{
    /// Stream every page from `cursor` onward.
    pub fn new(client: TwitterHttpClient, cursor: Cursor) -> Self {
        Self::build(client, cursor, None)
    }

    /// Stream at most `max_pages` pages.
    pub fn with_max_pages(client: TwitterHttpClient, cursor: Cursor, max_pages: usize) -> Self {
        Self::build(client, cursor, Some(max_pages))
    }

    fn build(client: TwitterHttpClient, cursor: Cursor, pages_left: Option<usize>) -> Self {
        let state = PaginatorState {
            client,
            cursor: Some(cursor),
            pages_left,
        };

        let pages = stream::unfold(state, |mut state| async move {
            if state.pages_left == Some(0) {
                return None;
            }
            let cursor = state.cursor.take()?;
            state.pages_left = state.pages_left.map(|n| n - 1);

            match next_page::<T>(&state.client, &cursor).await {
                Ok((page, next)) => {
                    state.cursor = next;
                    Some((Ok(page.items), state))
                }
                Err(err) => Some((Err(err), state)),
            }
        });

        let items = pages.flat_map(|page| match page {
            Ok(items) => stream::iter(items.into_iter().map(Ok)).left_stream(),
            Err(err) => stream::once(async move { Err(err) }).right_stream(),
        });

        Self {
            inner: items.boxed(),
        }
    }
}

impl<T> Stream for Paginator<T> {
    type Item = Result<T>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}

impl<T> fmt::Debug for Paginator<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Paginator").finish_non_exhaustive()
    }
}
