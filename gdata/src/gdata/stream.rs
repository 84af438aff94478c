//! Lazily paginated GData feeds.
//!
//! A [`FeedStream`] starts out as nothing more than a URI. The first call that needs data
//! ([`FeedStream::len`], [`FeedStream::get`], or advancing an iterator from
//! [`FeedStream::iter`]) fetches page one. Each page is decoded by the stream's
//! [`FeedKind`], its records are appended to a cache, and its `next` link becomes the URI
//! of the following page. Pages are fetched strictly in order and never twice.
//!
//! ```text
//! Unstarted ──fetch──▶ PartiallyFetched ──fetch (no `next`)──▶ Exhausted
//!     └──────────────fetch (no `next`)───────────────────────────▲
//! ```

use crate::error::{Error, Result};
use crate::gdata::client::Client;
use crate::gdata::links::{LinkMap, rel};
use crate::gdata::types::{Document, PageDescriptor};
use jiff::Timestamp;
use serde_json::Value;
use std::collections::HashSet;
use std::fmt;
use std::iter::FusedIterator;
use std::sync::Arc;
use tracing::instrument;

/// Turns the raw entries of one feed page into domain records.
///
/// One implementation exists per kind of feed (videos, comments, subscriptions). The stream
/// takes care of fetching, the version check, the total count, and the links; the kind only
/// maps entries.
pub trait FeedKind {
    type Record;

    /// Human readable name, used in logs and `Debug` output.
    const NAME: &'static str;

    /// Decodes a single raw entry.
    fn decode_entry(client: &Client, entry: Value) -> Result<Self::Record>;

    /// Decodes every entry of a page, preserving order.
    fn decode_page(client: &Client, page: PageDescriptor) -> Result<DecodedPage<Self::Record>> {
        let records = page
            .entries
            .into_iter()
            .map(|entry| Self::decode_entry(client, entry))
            .collect::<Result<Vec<_>>>()?;
        Ok(DecodedPage {
            records,
            total_count: page.total_count,
            next: page.links.href(rel::NEXT).map(str::to_owned),
            links: page.links,
            title: page.title,
            updated: page.updated,
        })
    }
}

/// The result of decoding one page.
#[derive(Debug)]
pub struct DecodedPage<R> {
    pub records: Vec<R>,
    pub total_count: usize,
    /// Where the following page lives, if there is one.
    pub next: Option<String>,
    pub links: LinkMap,
    pub title: Option<String>,
    pub updated: Option<Timestamp>,
}

/// Where a stream is in its lifecycle. Transitions only ever move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    /// Nothing has been fetched yet.
    Unstarted,
    /// At least one page has been fetched and a `next` link remains.
    PartiallyFetched,
    /// The last page has been fetched.
    Exhausted,
}

struct StreamCursor<R> {
    /// URI of the next page to fetch. `None` once exhausted.
    uri: Option<String>,
    records: Vec<Arc<R>>,
    /// Taken from page one and never recomputed.
    total_count: Option<usize>,
    /// Estimate reported by `len` until page one is in.
    count_hint: Option<usize>,
    /// Every URI a page has been fetched from.
    visited: HashSet<String>,
    /// Feed-level links of page one.
    links: LinkMap,
    state: StreamState,
    pages: usize,
    title: Option<String>,
    updated: Option<Timestamp>,
}

/// A lazily fetched, paginated feed of `K::Record`s.
///
/// Every operation that may fetch takes `&mut self`; use one stream per thread of
/// consumption. Fetched records are shared as `Arc`s, so holding on to one does not keep the
/// stream borrowed.
pub struct FeedStream<K: FeedKind> {
    client: Client,
    cursor: StreamCursor<K::Record>,
}

impl<K: FeedKind> FeedStream<K> {
    /// Creates a stream for the feed at `uri`. Nothing is fetched until the stream is used.
    pub fn new(client: Client, uri: impl Into<String>) -> Self {
        Self {
            client,
            cursor: StreamCursor {
                uri: Some(with_json_alt(uri.into())),
                records: Vec::new(),
                total_count: None,
                count_hint: None,
                visited: HashSet::new(),
                links: LinkMap::default(),
                state: StreamState::Unstarted,
                pages: 0,
                title: None,
                updated: None,
            },
        }
    }

    /// Lets [`len`](Self::len) answer `hint` without fetching, until page one is fetched
    /// and its total takes over.
    pub(crate) fn with_count_hint(mut self, hint: usize) -> Self {
        self.cursor.count_hint = Some(hint);
        self
    }

    pub fn state(&self) -> StreamState {
        self.cursor.state
    }

    /// The URI the next page will be fetched from, or `None` once exhausted.
    pub fn uri(&self) -> Option<&str> {
        self.cursor.uri.as_deref()
    }

    /// Number of records fetched so far.
    pub fn fetched(&self) -> usize {
        self.cursor.records.len()
    }

    /// Number of pages fetched so far.
    pub fn pages_fetched(&self) -> usize {
        self.cursor.pages
    }

    /// Feed title reported by the first page, if it has been fetched.
    pub fn title(&self) -> Option<&str> {
        self.cursor.title.as_deref()
    }

    /// Feed update time reported by the first page, if it has been fetched.
    pub fn updated(&self) -> Option<Timestamp> {
        self.cursor.updated
    }

    /// Feed-level links of the first page; empty until it has been fetched.
    pub fn links(&self) -> &LinkMap {
        &self.cursor.links
    }

    /// Total number of records in the feed, as reported by the first page.
    ///
    /// Fetches the first page if that has not happened yet. The value is cached: later pages
    /// never change it, even if they report a different total.
    ///
    /// A stream created with a count hint (a video's comments) answers with the hint until
    /// the first page has been fetched for some other reason.
    pub fn len(&mut self) -> Result<usize> {
        if let (StreamState::Unstarted, Some(hint)) = (self.cursor.state, self.cursor.count_hint) {
            return Ok(hint);
        }
        self.total()
    }

    /// The total reported by page one, fetching it if needed.
    fn total(&mut self) -> Result<usize> {
        if self.cursor.state == StreamState::Unstarted {
            self.fetch_page()?;
        }
        Ok(self.cursor.total_count.unwrap_or(0))
    }

    pub fn is_empty(&mut self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// The record at `index` across all pages, fetching pages as needed.
    ///
    /// Fails with [`Error::IndexOutOfRange`] if `index` is not below [`len`](Self::len), and
    /// with [`Error::UnexpectedEndOfStream`] if the feed runs out of `next` links before
    /// reaching a record the first page said would exist.
    pub fn get(&mut self, index: usize) -> Result<Arc<K::Record>> {
        let len = self.total()?;
        if index >= len {
            return Err(Error::IndexOutOfRange { index, len });
        }
        while index >= self.cursor.records.len() {
            if self.cursor.state == StreamState::Exhausted {
                return Err(Error::UnexpectedEndOfStream {
                    expected: len,
                    available: self.cursor.records.len(),
                });
            }
            self.fetch_page()?;
        }
        Ok(Arc::clone(&self.cursor.records[index]))
    }

    /// Iterates over every record of the feed, starting at the first.
    ///
    /// Records already fetched are yielded from the cache; the iterator fetches further pages
    /// as it reaches the end of what is cached. Each call starts a new traversal from the
    /// beginning.
    pub fn iter(&mut self) -> Iter<'_, K> {
        Iter {
            stream: self,
            position: 0,
            done: false,
        }
    }

    /// Fetches and decodes the page at the cursor's URI and advances the cursor.
    ///
    /// On error the cursor is left untouched, so a later call fetches the same page again. A
    /// `next` link back to a page already fetched ends the stream.
    #[instrument(skip(self), fields(kind = K::NAME, uri = self.cursor.uri.as_deref()))]
    fn fetch_page(&mut self) -> Result<()> {
        let Some(uri) = self.cursor.uri.as_deref() else {
            return Ok(());
        };

        let body = self.client.get_feed_body(uri)?;
        let fetched_from = uri.to_owned();
        let page = PageDescriptor::from_document(Document::from_body(&body)?)?;
        let page = K::decode_page(&self.client, page)?;

        tracing::debug!(
            records = page.records.len(),
            total_results = page.total_count,
            has_next = page.next.is_some(),
            "fetched feed page"
        );

        let cursor = &mut self.cursor;
        cursor.visited.insert(fetched_from);
        match cursor.total_count {
            None => {
                cursor.total_count = Some(page.total_count);
                cursor.links = page.links;
                cursor.title = page.title;
                cursor.updated = page.updated;
            }
            Some(total) if total != page.total_count => {
                tracing::warn!(
                    first_page = total,
                    this_page = page.total_count,
                    "feed total changed during pagination; keeping first page's total"
                );
            }
            Some(_) => {}
        }
        cursor.records.extend(page.records.into_iter().map(Arc::new));
        cursor.pages += 1;
        match page.next.map(with_json_alt) {
            Some(next) if cursor.visited.contains(&next) => {
                tracing::warn!(next = %next, "feed links back to a page already fetched; ending stream");
                cursor.uri = None;
                cursor.state = StreamState::Exhausted;
            }
            Some(next) => {
                cursor.uri = Some(next);
                cursor.state = StreamState::PartiallyFetched;
            }
            None => {
                cursor.uri = None;
                cursor.state = StreamState::Exhausted;
            }
        }
        Ok(())
    }
}

impl<K: FeedKind> fmt::Debug for FeedStream<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FeedStream")
            .field("kind", &K::NAME)
            .field("uri", &self.cursor.uri)
            .field("state", &self.cursor.state)
            .field("fetched", &self.cursor.records.len())
            .field("total_count", &self.cursor.total_count)
            .finish()
    }
}

impl<'a, K: FeedKind> IntoIterator for &'a mut FeedStream<K> {
    type Item = Result<Arc<K::Record>>;
    type IntoIter = Iter<'a, K>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator returned by [`FeedStream::iter`].
///
/// Yields `Err` at most once: after a failed page fetch the iterator is finished, though the
/// stream itself can be iterated again.
pub struct Iter<'a, K: FeedKind> {
    stream: &'a mut FeedStream<K>,
    position: usize,
    done: bool,
}

impl<K: FeedKind> Iterator for Iter<'_, K> {
    type Item = Result<Arc<K::Record>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            if let Some(record) = self.stream.cursor.records.get(self.position) {
                self.position += 1;
                return Some(Ok(Arc::clone(record)));
            }
            if self.stream.cursor.state == StreamState::Exhausted {
                self.done = true;
                return None;
            }
            if let Err(e) = self.stream.fetch_page() {
                self.done = true;
                return Some(Err(e));
            }
        }
    }
}

impl<K: FeedKind> FusedIterator for Iter<'_, K> {}

/// Makes sure `uri` asks for the JSON rendition of the feed.
///
/// `next` links usually already carry `alt=json`, but not always.
pub(crate) fn with_json_alt(mut uri: String) -> String {
    let query = uri.split_once('?').map(|(_, query)| query).unwrap_or("");
    let has_alt = form_urlencoded::parse(query.as_bytes()).any(|(key, _)| key == "alt");
    if !has_alt {
        uri.push(if uri.contains('?') { '&' } else { '?' });
        uri.push_str("alt=json");
    }
    uri
}
