//! Wire-level building blocks of the GData JSON format.
//!
//! GData renders Atom as JSON by wrapping every text node in an object with a `$t` key and
//! by sending most numbers as strings. The types here decode those conventions once, so the
//! record decoders can work with plain Rust values.

use crate::error::{Error, Result};
use crate::gdata::links::{LinkMap, RawLink, parse_links};
use jiff::Timestamp;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The only payload version this client understands.
pub const API_VERSION: &str = "1.0";

/// A `{"$t": "..."}` text node.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Text {
    #[serde(rename = "$t")]
    pub(crate) value: String,
}

/// A `{"$t": "2012-01-01T00:00:00.000Z"}` timestamp node.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct TimeText {
    #[serde(rename = "$t")]
    pub(crate) value: Timestamp,
}

/// A `{"$t": "42"}` (or `{"$t": 42}`) count node.
#[derive(Debug, Clone, Copy, Deserialize)]
pub(crate) struct CountText {
    #[serde(rename = "$t")]
    pub(crate) value: Count,
}

/// A non-negative integer that the API may send either as a JSON number or as a string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "CountRepr")]
pub struct Count(pub u64);

#[derive(Deserialize)]
#[serde(untagged)]
enum CountRepr {
    Number(u64),
    Text(String),
}

impl TryFrom<CountRepr> for Count {
    type Error = std::num::ParseIntError;

    fn try_from(repr: CountRepr) -> std::result::Result<Self, Self::Error> {
        match repr {
            CountRepr::Number(n) => Ok(Count(n)),
            CountRepr::Text(s) => s.trim().parse().map(Count),
        }
    }
}

impl From<Count> for u64 {
    fn from(count: Count) -> Self {
        count.0
    }
}

/// `author` elements are lists of `{"name": {"$t": ...}, "uri": {"$t": ...}}`.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawAuthor {
    pub(crate) name: Text,
}

/// The first author's name; every entry the API returns has at least one.
pub(crate) fn first_author(authors: &[RawAuthor]) -> Result<String> {
    authors
        .first()
        .map(|a| a.name.value.clone())
        .ok_or_else(|| Error::invalid_entry("entry has no author"))
}

/// The top-level envelope of every JSON payload.
///
/// A feed request answers with `feed`, a single-resource request with `entry`. Both are kept
/// as raw JSON until [`Document::check_version`] has passed.
#[derive(Debug, Deserialize)]
pub(crate) struct Document {
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    feed: Option<Value>,
    #[serde(default)]
    entry: Option<Value>,
}

impl Document {
    pub(crate) fn from_body(body: &str) -> Result<Self> {
        Ok(serde_json::from_str(body)?)
    }

    pub(crate) fn check_version(&self) -> Result<()> {
        match self.version.as_deref() {
            Some(API_VERSION) => Ok(()),
            found => Err(Error::ApiVersionMismatch {
                expected: API_VERSION,
                found: found.map(str::to_owned),
            }),
        }
    }

    /// The `feed` object, decoded into `T` after the version check.
    pub(crate) fn into_feed<T: DeserializeOwned>(self) -> Result<T> {
        self.check_version()?;
        let feed = self
            .feed
            .ok_or_else(|| <serde_json::Error as serde::de::Error>::missing_field("feed"))?;
        Ok(serde_json::from_value(feed)?)
    }

    /// The `entry` object, decoded into `T` after the version check.
    pub(crate) fn into_entry<T: DeserializeOwned>(self) -> Result<T> {
        self.check_version()?;
        let entry = self
            .entry
            .ok_or_else(|| <serde_json::Error as serde::de::Error>::missing_field("entry"))?;
        Ok(serde_json::from_value(entry)?)
    }
}

/// One page of a paginated feed, as it appears on the wire.
#[derive(Debug, Deserialize)]
pub(crate) struct RawFeed {
    #[serde(rename = "openSearch$totalResults")]
    total_results: CountText,
    #[serde(default)]
    title: Option<Text>,
    #[serde(default)]
    updated: Option<TimeText>,
    #[serde(default)]
    link: Vec<RawLink>,
    #[serde(default)]
    entry: Vec<Value>,
}

/// A decoded feed page whose entries have not yet been turned into records.
#[derive(Debug)]
pub struct PageDescriptor {
    /// Raw entries in the order the server sent them.
    pub entries: Vec<Value>,
    /// The server's estimate of the number of entries across all pages.
    pub total_count: usize,
    pub links: LinkMap,
    pub title: Option<String>,
    pub updated: Option<Timestamp>,
}

impl PageDescriptor {
    /// Decodes one feed page: version check first, then the feed body, then its links.
    pub(crate) fn from_document(document: Document) -> Result<Self> {
        let feed: RawFeed = document.into_feed()?;
        let total_count = usize::try_from(feed.total_results.value.0)
            .map_err(|_| Error::invalid_entry("openSearch$totalResults does not fit in usize"))?;
        Ok(Self {
            entries: feed.entry,
            total_count,
            links: parse_links(feed.link)?,
            title: feed.title.map(|t| t.value),
            updated: feed.updated.map(|t| t.value),
        })
    }

    pub fn self_link(&self) -> Option<&str> {
        self.links.href(crate::gdata::links::rel::SELF)
    }

    pub fn next_link(&self) -> Option<&str> {
        self.links.href(crate::gdata::links::rel::NEXT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn count_accepts_text_and_numbers() {
        let text: CountText = serde_json::from_value(json!({"$t": "42"})).unwrap();
        assert_eq!(text.value, Count(42));
        let number: CountText = serde_json::from_value(json!({"$t": 7})).unwrap();
        assert_eq!(number.value, Count(7));
        assert!(serde_json::from_value::<CountText>(json!({"$t": "many"})).is_err());
    }

    #[test]
    fn timestamps_parse_with_fractional_seconds() {
        let t: TimeText = serde_json::from_value(json!({"$t": "2012-03-04T05:06:07.000Z"})).unwrap();
        assert_eq!(t.value.as_second(), 1330837567);
    }

    #[test]
    fn version_mismatch_is_reported_before_decoding() {
        // the feed body is garbage, so reaching it would produce a JSON error instead
        let document = Document::from_body(r#"{"version": "2.0", "feed": 17}"#).unwrap();
        let err = PageDescriptor::from_document(document).unwrap_err();
        assert!(
            matches!(
                &err,
                Error::ApiVersionMismatch { expected: "1.0", found: Some(v) } if v == "2.0"
            ),
            "unexpected error: {err:?}"
        );
    }

    #[test]
    fn missing_version_is_a_mismatch() {
        let document = Document::from_body(r#"{"feed": {}}"#).unwrap();
        assert!(matches!(
            document.check_version(),
            Err(Error::ApiVersionMismatch { found: None, .. })
        ));
    }

    #[test]
    fn page_without_entries_is_empty() {
        let document = Document::from_body(
            r#"{
                "version": "1.0",
                "feed": {
                    "openSearch$totalResults": {"$t": "0"},
                    "title": {"$t": "Uploads by nobody"},
                    "link": [{"rel": "self", "href": "http://example.test/self"}]
                }
            }"#,
        )
        .unwrap();
        let page = PageDescriptor::from_document(document).unwrap();
        assert!(page.entries.is_empty());
        assert_eq!(page.total_count, 0);
        assert_eq!(page.title.as_deref(), Some("Uploads by nobody"));
        assert_eq!(page.self_link(), Some("http://example.test/self"));
        assert_eq!(page.next_link(), None);
    }

    #[test]
    fn missing_feed_is_a_json_error() {
        let document = Document::from_body(r#"{"version": "1.0"}"#).unwrap();
        assert!(matches!(
            PageDescriptor::from_document(document),
            Err(Error::Json(_))
        ));
    }
}
