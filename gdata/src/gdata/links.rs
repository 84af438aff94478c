//! Parsing of the `link` arrays that appear in every GData feed and entry.
//!
//! Each link object carries a relation (`rel`) describing what it points at, an `href`, and
//! an arbitrary set of further attributes (`type`, `title`, ...). Relations defined by
//! YouTube come fully qualified (`http://gdata.youtube.com/schemas/2007#video.related`),
//! Atom's own relations do not (`next`, `edit`); [`parse_links`] normalizes both spellings to
//! the short form.

use crate::error::{Error, Result};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// The namespace stripped from fully qualified relation names.
pub const SCHEMA_PREFIX: &str = "http://gdata.youtube.com/schemas/2007#";

/// One link object exactly as it appears on the wire.
pub type RawLink = Map<String, Value>;

/// Well-known relation names, in their normalized form.
pub mod rel {
    pub const SELF: &str = "self";
    pub const NEXT: &str = "next";
    pub const EDIT: &str = "edit";
    pub const VIDEO_RELATED: &str = "video.related";
    pub const VIDEO_RESPONSES: &str = "video.responses";
    pub const INSIGHT_VIEWS: &str = "insight.views";
    pub const USER_UPLOADS: &str = "user.uploads";
    pub const USER_SUBSCRIPTIONS: &str = "user.subscriptions";
}

/// The target of one relation.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkDescriptor {
    pub href: String,
    /// Every attribute of the link object other than `rel` and `href`.
    pub extra: Map<String, Value>,
}

/// Relation name → link target for a single feed or entry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinkMap {
    links: HashMap<String, LinkDescriptor>,
}

impl LinkMap {
    pub fn get(&self, rel: &str) -> Option<&LinkDescriptor> {
        self.links.get(rel)
    }

    pub fn href(&self, rel: &str) -> Option<&str> {
        self.get(rel).map(|link| link.href.as_str())
    }

    pub fn contains(&self, rel: &str) -> bool {
        self.links.contains_key(rel)
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &LinkDescriptor)> {
        self.links.iter().map(|(rel, link)| (rel.as_str(), link))
    }
}

/// Strips [`SCHEMA_PREFIX`] from a relation name if it is there.
pub fn normalize_rel(rel: &str) -> &str {
    rel.strip_prefix(SCHEMA_PREFIX).unwrap_or(rel)
}

/// Builds a [`LinkMap`] from a `link` array.
///
/// When a relation appears more than once, the last occurrence wins.
pub fn parse_links(links: impl IntoIterator<Item = RawLink>) -> Result<LinkMap> {
    let mut map = LinkMap::default();
    for mut link in links {
        let rel = match link.remove("rel") {
            Some(Value::String(rel)) => rel,
            Some(other) => {
                return Err(Error::MalformedLink {
                    reason: format!("`rel` is not a string: {other}"),
                });
            }
            None => {
                return Err(Error::MalformedLink {
                    reason: format!("link has no `rel`: {}", Value::Object(link)),
                });
            }
        };
        let href = match link.remove("href") {
            Some(Value::String(href)) => href,
            _ => {
                return Err(Error::MalformedLink {
                    reason: format!("link `{rel}` has no string `href`"),
                });
            }
        };

        map.links.insert(
            normalize_rel(&rel).to_owned(),
            LinkDescriptor { href, extra: link },
        );
    }
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn raw(links: Value) -> Vec<RawLink> {
        serde_json::from_value(links).unwrap()
    }

    #[test]
    fn strips_youtube_schema_prefix() {
        let links = parse_links(raw(json!([
            {"rel": "http://gdata.youtube.com/schemas/2007#video.related", "href": "X"}
        ])))
        .unwrap();

        assert_eq!(links.len(), 1);
        assert_eq!(
            links.get("video.related"),
            Some(&LinkDescriptor {
                href: "X".into(),
                extra: Map::new()
            })
        );
    }

    #[test]
    fn short_relations_are_kept_as_is() {
        let links = parse_links(raw(json!([{"rel": "next", "href": "Y"}]))).unwrap();
        assert_eq!(links.href(rel::NEXT), Some("Y"));
        assert!(!links.contains("http://gdata.youtube.com/schemas/2007#next"));
    }

    #[test]
    fn keeps_extra_attributes() {
        let links = parse_links(raw(json!([
            {"rel": "alternate", "type": "text/html", "href": "http://www.youtube.com/watch?v=x"}
        ])))
        .unwrap();
        let alternate = links.get("alternate").unwrap();
        assert_eq!(alternate.extra.get("type"), Some(&json!("text/html")));
        assert!(!alternate.extra.contains_key("rel"));
        assert!(!alternate.extra.contains_key("href"));
    }

    #[test]
    fn last_duplicate_wins() {
        let links = parse_links(raw(json!([
            {"rel": "edit", "href": "first"},
            {"rel": "edit", "href": "second"}
        ])))
        .unwrap();
        assert_eq!(links.len(), 1);
        assert_eq!(links.href(rel::EDIT), Some("second"));
    }

    #[test]
    fn link_without_rel_is_malformed() {
        let err = parse_links(raw(json!([{"href": "Z"}]))).unwrap_err();
        assert!(matches!(err, Error::MalformedLink { .. }), "{err:?}");
    }

    #[test]
    fn link_without_href_is_malformed() {
        let err = parse_links(raw(json!([{"rel": "next"}]))).unwrap_err();
        assert!(matches!(err, Error::MalformedLink { .. }), "{err:?}");
    }

    #[test]
    fn empty_list_gives_empty_map() {
        assert!(parse_links(Vec::new()).unwrap().is_empty());
    }
}
