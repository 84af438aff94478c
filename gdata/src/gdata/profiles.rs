//! User profiles (channels).

use crate::error::Result;
use crate::gdata::client::Client;
use crate::gdata::links::{LinkMap, RawLink, normalize_rel, parse_links, rel};
use crate::gdata::stream::FeedStream;
use crate::gdata::subscriptions::SubscriptionStream;
use crate::gdata::types::{Count, CountText, Document, RawAuthor, Text, TimeText, first_author};
use crate::gdata::videos::VideoStream;
use jiff::Timestamp;
use serde::Deserialize;
use std::collections::HashMap;

/// A user's public profile.
#[derive(Debug, Clone)]
pub struct Profile {
    pub username: String,
    pub api_id: String,
    pub thumbnail: Option<String>,
    pub title: String,
    pub updated: Timestamp,
    pub author: ProfileAuthor,
    pub statistics: Option<ProfileStatistics>,
    /// Feeds owned by this user (uploads, favorites, subscriptions, ...), keyed by
    /// normalized relation.
    pub feeds: HashMap<String, FeedLink>,
    pub links: LinkMap,
    pub edit_url: Option<String>,
    client: Client,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileAuthor {
    pub name: String,
    pub username: String,
    pub age: Option<u64>,
    pub location: Option<String>,
    pub gender: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileStatistics {
    pub last_web_access: Timestamp,
    pub subscriber_count: u64,
    pub total_upload_views: u64,
    pub video_watch_count: u64,
    pub view_count: u64,
}

/// A `gd:feedLink`: a feed belonging to the profile, with the server's size estimate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedLink {
    pub href: String,
    pub count_hint: Option<u64>,
}

impl Profile {
    /// Subscribes the authenticated user to this channel.
    pub fn subscribe(&self) -> Result<()> {
        self.client.subscribe(&self.author.username)
    }

    /// The channels this user is subscribed to.
    pub fn subscriptions(&self) -> SubscriptionStream {
        match self.feeds.get(rel::USER_SUBSCRIPTIONS) {
            Some(feed) => FeedStream::new(self.client.clone(), feed.href.as_str()),
            None => self.client.user_subscriptions(&self.author.username),
        }
    }

    /// This user's uploaded videos.
    pub fn uploads(&self) -> VideoStream {
        match self.feeds.get(rel::USER_UPLOADS) {
            Some(feed) => FeedStream::new(self.client.clone(), feed.href.as_str()),
            None => self.client.user_videos(&self.author.username),
        }
    }

    pub(crate) fn from_document(client: &Client, document: Document) -> Result<Self> {
        let raw: RawProfile = document.into_entry()?;
        let links = parse_links(raw.link)?;
        let feeds = raw
            .feed_links
            .into_iter()
            .map(|feed| {
                (
                    normalize_rel(&feed.rel).to_owned(),
                    FeedLink {
                        href: feed.href,
                        count_hint: feed.count_hint.map(u64::from),
                    },
                )
            })
            .collect();

        Ok(Self {
            author: ProfileAuthor {
                name: first_author(&raw.author)?,
                username: raw.username.value.clone(),
                age: raw.age.map(|a| a.value.0),
                location: raw.location.map(|l| l.value),
                gender: raw.gender.map(|g| g.value),
            },
            username: raw.username.value,
            api_id: raw.id.value,
            thumbnail: raw.thumbnail.map(|t| t.url),
            title: raw.title.value,
            updated: raw.updated.value,
            statistics: raw.statistics.map(|s| ProfileStatistics {
                last_web_access: s.last_web_access,
                subscriber_count: s.subscriber_count.0,
                total_upload_views: s.total_upload_views.0,
                video_watch_count: s.video_watch_count.0,
                view_count: s.view_count.0,
            }),
            feeds,
            edit_url: links.href(rel::EDIT).map(str::to_owned),
            links,
            client: client.clone(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct RawProfile {
    id: Text,
    title: Text,
    updated: TimeText,
    #[serde(default)]
    author: Vec<RawAuthor>,
    #[serde(rename = "yt$username")]
    username: Text,
    #[serde(rename = "yt$age", default)]
    age: Option<CountText>,
    #[serde(rename = "yt$location", default)]
    location: Option<Text>,
    #[serde(rename = "yt$gender", default)]
    gender: Option<Text>,
    #[serde(rename = "media$thumbnail", default)]
    thumbnail: Option<RawThumbnail>,
    #[serde(rename = "yt$statistics", default)]
    statistics: Option<RawProfileStatistics>,
    #[serde(rename = "gd$feedLink", default)]
    feed_links: Vec<RawFeedLink>,
    #[serde(default)]
    link: Vec<RawLink>,
}

#[derive(Debug, Deserialize)]
struct RawThumbnail {
    url: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawProfileStatistics {
    last_web_access: Timestamp,
    subscriber_count: Count,
    total_upload_views: Count,
    video_watch_count: Count,
    view_count: Count,
}

#[derive(Debug, Deserialize)]
struct RawFeedLink {
    rel: String,
    href: String,
    #[serde(rename = "countHint", default)]
    count_hint: Option<Count>,
}
