//! YouTube GData API (v1/v2 JSON) client.
//!
//! # Core Concepts: Feeds and Streams
//!
//! Almost everything the API returns is an Atom feed rendered as JSON: a page of entries, the
//! total number of results (`openSearch$totalResults`), and a set of typed links. The `next`
//! link points at the following page.
//!
//! ## [`stream::FeedStream`] - Lazy Pagination
//! - **Nothing up front**: creating a stream makes no request
//! - **On demand**: `len`, `get`, and iteration fetch pages only as far as needed
//! - **Cached**: every fetched record is kept, so repeated access never refetches
//! - **Typed**: the [`stream::FeedKind`] parameter decides what entries become
//!
//! ## Records and the Link Graph
//! Records keep the links of their entry ([`links::LinkMap`]), and expose the ones that lead
//! somewhere as methods returning fresh streams. [`Video::related_videos`],
//! [`Video::video_responses`], and [`Video::comments`] all work this way, as do
//! [`Profile::uploads`] and [`Profile::subscriptions`].
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use youtube_gdata::{Client, ClientConfig};
//!
//! # fn example() -> youtube_gdata::Result<()> {
//! let client = Client::new(ClientConfig::builder().app_name("example").build()?);
//!
//! let mut uploads = client.user_videos("bob");
//! println!("bob has {} videos", uploads.len()?);
//! for video in &mut uploads {
//!     let video = video?;
//!     println!("{}: {}", video.id, video.title);
//!     if let Some(mut related) = video.related_videos() {
//!         if let Some(first) = related.iter().next() {
//!             println!("  related: {}", first?.title);
//!         }
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod comments;
pub mod links;
pub mod playlists;
pub mod profiles;
pub mod stream;
pub mod subscriptions;
pub mod types;
pub mod videos;

pub use client::{Client, ClientConfig, ClientConfigBuilder, DEFAULT_BASE_URL, DEFAULT_USER};
pub use stream::{FeedKind, FeedStream, Iter, StreamState};
pub use types::{API_VERSION, Count, PageDescriptor};

pub use links::{LinkDescriptor, LinkMap};

pub use videos::{Category, Video, VideoStream, Videos};

pub use comments::{Comment, CommentStream, Comments};

pub use subscriptions::{Subscription, SubscriptionStream, Subscriptions};

pub use profiles::{FeedLink, Profile, ProfileAuthor, ProfileStatistics};

pub use playlists::{Playlist, PlaylistEntry};
