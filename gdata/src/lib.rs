//! Blocking client for the legacy YouTube GData feed API.
//!
//! The interesting part is [`FeedStream`]: a lazily paginated, cached view over a feed that
//! follows `next` links only as far as the caller reads. See the [`gdata`] module for an
//! overview.

pub mod auth;
pub mod error;
pub mod gdata;
pub mod transport;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use auth::Credentials;
pub use error::{Error, Result};
pub use gdata::{
    Client, ClientConfig, Comment, CommentStream, FeedStream, Playlist, Profile, StreamState,
    Subscription, SubscriptionStream, Video, VideoStream,
};
pub use transport::{ReqwestTransport, Request, Response, Transport, TransportError};
