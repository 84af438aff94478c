//! Video entries and the feeds that list them.

use crate::error::{Error, Result};
use crate::gdata::client::Client;
use crate::gdata::comments::CommentStream;
use crate::gdata::links::{LinkMap, RawLink, parse_links, rel};
use crate::gdata::stream::{FeedKind, FeedStream};
use crate::gdata::types::{Count, RawAuthor, Text, TimeText, first_author};
use jiff::Timestamp;
use serde::Deserialize;
use serde::de::IgnoredAny;
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;

/// A lazily paginated feed of [`Video`]s.
pub type VideoStream = FeedStream<Videos>;

/// Category scheme of the single "real" category of a video.
pub const CATEGORY_SCHEME: &str = "http://gdata.youtube.com/schemas/2007/categories.cat";

/// Category scheme under which a video's keywords are listed.
pub const KEYWORD_SCHEME: &str = "http://gdata.youtube.com/schemas/2007/keywords.cat";

/// Prefix of the API id of a video; the 11 character video id follows it.
const VIDEO_API_ID_PREFIX: &str = "http://gdata.youtube.com/feeds/api/videos/";
const VIDEO_ID_LEN: usize = 11;

/// The [`FeedKind`] of video feeds (uploads, search results, related videos, responses).
#[derive(Debug)]
pub enum Videos {}

impl FeedKind for Videos {
    type Record = Video;
    const NAME: &'static str = "VideoStream";

    fn decode_entry(client: &Client, entry: Value) -> Result<Video> {
        Video::from_raw(client, serde_json::from_value(entry)?)
    }
}

/// The YouTube category a video is filed under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    /// Machine name, e.g. `Music`.
    pub term: String,
    /// Display name, e.g. `Music`.
    pub label: Option<String>,
}

/// A YouTube video as described by a feed entry.
///
/// Several attributes are absent for restricted videos or when the entry comes from a feed
/// that does not carry them; those are `Option`s.
#[derive(Debug, Clone)]
pub struct Video {
    /// The 11 character video id.
    pub id: String,
    /// The entry's id in the API, usually a URL or tag URI.
    pub api_id: String,
    pub title: String,
    /// Username of the uploader.
    pub author: String,
    pub category: Option<Category>,
    pub keywords: Vec<String>,
    pub description: Option<String>,
    /// Defaults to `updated` for entries that carry no publication time (playlists).
    pub published: Timestamp,
    pub updated: Timestamp,
    pub uploaded: Option<Timestamp>,
    pub duration: Option<Duration>,
    pub aspect_ratio: Option<String>,
    pub like_count: Option<u64>,
    pub dislike_count: Option<u64>,
    pub favorite_count: Option<u64>,
    pub view_count: Option<u64>,
    pub comment_count: Option<u64>,
    /// Action (`comment`, `rate`, `embed`, ...) → permission (`allowed`, `denied`, ...).
    pub access_control: BTreeMap<String, String>,
    pub private: bool,
    pub links: LinkMap,
    /// Where to send metadata updates, when the authenticated user may edit this video.
    pub edit_url: Option<String>,
    pub insight_url: Option<String>,
    related_url: Option<String>,
    responses_url: Option<String>,
    client: Client,
}

impl Video {
    /// The comments posted on this video.
    ///
    /// When the entry carries a comment count, the stream's `len` reports it without a fetch.
    pub fn comments(&self) -> CommentStream {
        let stream = self.client.video_comments(&self.id);
        match self.comment_count.and_then(|count| usize::try_from(count).ok()) {
            Some(count) => stream.with_count_hint(count),
            None => stream,
        }
    }

    /// Videos YouTube considers related to this one, if the entry links to them.
    pub fn related_videos(&self) -> Option<VideoStream> {
        self.related_url
            .as_deref()
            .map(|url| FeedStream::new(self.client.clone(), url))
    }

    /// Videos posted as responses to this one, if the entry links to them.
    pub fn video_responses(&self) -> Option<VideoStream> {
        self.responses_url
            .as_deref()
            .map(|url| FeedStream::new(self.client.clone(), url))
    }

    /// Posts the video `video_id` as a response to this video.
    pub fn respond_to(&self, video_id: &str) -> Result<()> {
        self.client.video_response(&self.id, video_id)
    }

    pub(crate) fn from_raw(client: &Client, raw: RawVideoEntry) -> Result<Self> {
        let links = parse_links(raw.link)?;
        let media = raw.media_group;

        let id = match media.video_id {
            Some(id) => id.value,
            None => video_id_from_api_id(&raw.id.value)?,
        };

        let category = raw
            .category
            .iter()
            .find(|c| c.scheme.as_deref() == Some(CATEGORY_SCHEME))
            .map(|c| Category {
                term: c.term.clone(),
                label: c.label.clone(),
            });
        let keywords = raw
            .category
            .iter()
            .filter(|c| c.scheme.as_deref() == Some(KEYWORD_SCHEME))
            .map(|c| c.term.clone())
            .collect();

        let updated = raw.updated.value;
        Ok(Self {
            api_id: raw.id.value,
            title: raw.title.value,
            author: first_author(&raw.author)?,
            category,
            keywords,
            description: media.description.map(|d| d.value),
            published: raw.published.map_or(updated, |p| p.value),
            updated,
            uploaded: media.uploaded.map(|u| u.value),
            duration: media.duration.map(|d| Duration::from_secs(d.seconds.0)),
            aspect_ratio: media.aspect_ratio.map(|a| a.value),
            like_count: raw.rating.as_ref().map(|r| r.num_likes.0),
            dislike_count: raw.rating.as_ref().map(|r| r.num_dislikes.0),
            favorite_count: raw.statistics.as_ref().map(|s| s.favorite_count.0),
            view_count: raw.statistics.as_ref().map(|s| s.view_count.0),
            comment_count: raw
                .comments
                .and_then(|c| c.feed_link.count_hint)
                .map(u64::from),
            access_control: raw
                .access_control
                .into_iter()
                .map(|ac| (ac.action, ac.permission))
                .collect(),
            private: media.private.is_some(),
            edit_url: links.href(rel::EDIT).map(str::to_owned),
            insight_url: links.href(rel::INSIGHT_VIEWS).map(str::to_owned),
            related_url: links.href(rel::VIDEO_RELATED).map(str::to_owned),
            responses_url: links.href(rel::VIDEO_RESPONSES).map(str::to_owned),
            links,
            id,
            client: client.clone(),
        })
    }
}

fn video_id_from_api_id(api_id: &str) -> Result<String> {
    api_id
        .strip_prefix(VIDEO_API_ID_PREFIX)
        .filter(|id| id.len() == VIDEO_ID_LEN)
        .map(str::to_owned)
        .ok_or_else(|| Error::invalid_entry(format!("cannot derive a video id from `{api_id}`")))
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawVideoEntry {
    id: Text,
    title: Text,
    #[serde(default)]
    author: Vec<RawAuthor>,
    updated: TimeText,
    #[serde(default)]
    published: Option<TimeText>,
    #[serde(default)]
    category: Vec<RawCategory>,
    #[serde(default)]
    link: Vec<RawLink>,
    #[serde(rename = "media$group", default)]
    media_group: RawMediaGroup,
    #[serde(rename = "yt$rating", default)]
    rating: Option<RawRating>,
    #[serde(rename = "yt$statistics", default)]
    statistics: Option<RawVideoStatistics>,
    #[serde(rename = "gd$comments", default)]
    comments: Option<RawComments>,
    #[serde(rename = "yt$accessControl", default)]
    access_control: Vec<RawAccessControl>,
}

impl RawVideoEntry {
    pub(crate) fn api_id(&self) -> &str {
        &self.id.value
    }
}

#[derive(Debug, Deserialize)]
struct RawCategory {
    #[serde(default)]
    scheme: Option<String>,
    term: String,
    #[serde(default)]
    label: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawMediaGroup {
    #[serde(rename = "yt$videoid", default)]
    video_id: Option<Text>,
    #[serde(rename = "media$description", default)]
    description: Option<Text>,
    #[serde(rename = "yt$uploaded", default)]
    uploaded: Option<TimeText>,
    #[serde(rename = "yt$duration", default)]
    duration: Option<RawDuration>,
    #[serde(rename = "yt$aspectRatio", default)]
    aspect_ratio: Option<Text>,
    #[serde(rename = "yt$private", default)]
    private: Option<IgnoredAny>,
}

#[derive(Debug, Deserialize)]
struct RawDuration {
    seconds: Count,
}

#[derive(Debug, Deserialize)]
struct RawRating {
    #[serde(rename = "numLikes")]
    num_likes: Count,
    #[serde(rename = "numDislikes")]
    num_dislikes: Count,
}

#[derive(Debug, Deserialize)]
struct RawVideoStatistics {
    #[serde(rename = "favoriteCount")]
    favorite_count: Count,
    #[serde(rename = "viewCount")]
    view_count: Count,
}

#[derive(Debug, Deserialize)]
struct RawComments {
    #[serde(rename = "gd$feedLink")]
    feed_link: RawCommentsFeedLink,
}

#[derive(Debug, Deserialize)]
struct RawCommentsFeedLink {
    #[serde(rename = "countHint", default)]
    count_hint: Option<Count>,
}

#[derive(Debug, Deserialize)]
struct RawAccessControl {
    action: String,
    permission: String,
}
