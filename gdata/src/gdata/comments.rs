//! Comments posted on a video.

use crate::error::Result;
use crate::gdata::client::Client;
use crate::gdata::stream::{FeedKind, FeedStream};
use crate::gdata::types::{RawAuthor, Text, TimeText, first_author};
use jiff::Timestamp;
use serde::Deserialize;
use serde_json::Value;

/// A lazily paginated feed of [`Comment`]s.
pub type CommentStream = FeedStream<Comments>;

/// The [`FeedKind`] of a video's comment feed.
#[derive(Debug)]
pub enum Comments {}

impl FeedKind for Comments {
    type Record = Comment;
    const NAME: &'static str = "CommentStream";

    fn decode_entry(_client: &Client, entry: Value) -> Result<Comment> {
        let raw: RawComment = serde_json::from_value(entry)?;
        Ok(Comment {
            author: first_author(&raw.author)?,
            id: raw.id.value,
            title: raw.title.value,
            content: raw.content.value,
            published: raw.published.value,
            updated: raw.updated.value,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub id: String,
    pub author: String,
    pub title: String,
    pub content: String,
    pub published: Timestamp,
    pub updated: Timestamp,
}

#[derive(Debug, Deserialize)]
struct RawComment {
    id: Text,
    #[serde(default)]
    author: Vec<RawAuthor>,
    title: Text,
    content: Text,
    published: TimeText,
    updated: TimeText,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::mock::{self, MockTransport};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn decodes_comment() {
        let transport = MockTransport::new();
        let client = mock::client(&transport);
        let comment = Comments::decode_entry(
            &client,
            json!({
                "id": {"$t": "http://gdata.youtube.com/feeds/api/videos/v1/comments/c1"},
                "published": {"$t": "2011-05-06T07:08:09.000Z"},
                "updated": {"$t": "2011-05-06T07:08:10.000Z"},
                "title": {"$t": "first!"},
                "content": {"$t": "first! and also a longer comment"},
                "author": [{"name": {"$t": "commenter"}}]
            }),
        )
        .unwrap();

        assert_eq!(comment.author, "commenter");
        assert_eq!(comment.title, "first!");
        assert_eq!(comment.content, "first! and also a longer comment");
        assert!(comment.published < comment.updated);
    }

    #[test]
    fn comment_without_author_is_invalid() {
        let transport = MockTransport::new();
        let client = mock::client(&transport);
        let mut entry = mock::comment_entry(3, "hello");
        entry["author"] = json!([]);
        assert!(matches!(
            Comments::decode_entry(&client, entry),
            Err(Error::InvalidEntry { .. })
        ));
    }
}
