//! Playlists and their entries.

use crate::error::Result;
use crate::gdata::client::Client;
use crate::gdata::types::{CountText, Document, RawAuthor, Text, TimeText, first_author};
use crate::gdata::videos::{RawVideoEntry, Video};
use jiff::Timestamp;
use serde::Deserialize;

/// A playlist with all of its entries, ordered by position.
#[derive(Debug, Clone)]
pub struct Playlist {
    pub id: String,
    pub author: String,
    pub title: String,
    pub description: Option<String>,
    pub updated: Timestamp,
    pub entries: Vec<PlaylistEntry>,
}

/// One video's slot in a playlist.
#[derive(Debug, Clone)]
pub struct PlaylistEntry {
    /// Id of the entry within the playlist (not the video id).
    pub id: String,
    pub api_id: String,
    pub position: u64,
    pub playlist_id: String,
    pub video: Video,
}

impl Playlist {
    /// The entry holding `video_id`, if the video is on this playlist.
    pub fn entry_for_video(&self, video_id: &str) -> Option<&PlaylistEntry> {
        self.entries.iter().find(|entry| entry.video.id == video_id)
    }

    pub(crate) fn from_document(client: &Client, document: Document) -> Result<Self> {
        let raw: RawPlaylist = document.into_feed()?;
        let id = raw.playlist_id.value;

        let mut entries = raw
            .entry
            .into_iter()
            .map(|entry| PlaylistEntry::from_raw(client, &id, entry))
            .collect::<Result<Vec<_>>>()?;
        entries.sort_by_key(|entry| entry.position);

        Ok(Self {
            author: first_author(&raw.author)?,
            title: raw.media_group.title.value,
            description: raw.media_group.description.map(|d| d.value),
            updated: raw.updated.value,
            entries,
            id,
        })
    }
}

impl PlaylistEntry {
    fn from_raw(client: &Client, playlist_id: &str, raw: RawPlaylistEntry) -> Result<Self> {
        let api_id = raw.video.api_id().to_owned();
        let id = api_id.rsplit(':').next().unwrap_or(&api_id).to_owned();

        // the entry's own id is a playlist tag; give the video the tag of the video itself
        let mut video = Video::from_raw(client, raw.video)?;
        if let Some(at) = video.api_id.find("playlist") {
            video.api_id = format!("{}video:{}", &video.api_id[..at], video.id);
        }

        Ok(Self {
            id,
            api_id,
            position: raw.position.value.0,
            playlist_id: playlist_id.to_owned(),
            video,
        })
    }
}

#[derive(Debug, Deserialize)]
struct RawPlaylist {
    #[serde(rename = "yt$playlistId")]
    playlist_id: Text,
    #[serde(default)]
    author: Vec<RawAuthor>,
    #[serde(rename = "media$group")]
    media_group: RawPlaylistMedia,
    updated: TimeText,
    #[serde(default)]
    entry: Vec<RawPlaylistEntry>,
}

#[derive(Debug, Deserialize)]
struct RawPlaylistMedia {
    #[serde(rename = "media$title")]
    title: Text,
    #[serde(rename = "media$description", default)]
    description: Option<Text>,
}

#[derive(Debug, Deserialize)]
struct RawPlaylistEntry {
    #[serde(rename = "yt$position")]
    position: CountText,
    #[serde(flatten)]
    video: RawVideoEntry,
}
