//! The channels a user is subscribed to.

use crate::error::Result;
use crate::gdata::client::Client;
use crate::gdata::stream::{FeedKind, FeedStream};
use crate::gdata::types::Text;
use serde::Deserialize;
use serde_json::Value;

/// A lazily paginated feed of [`Subscription`]s.
pub type SubscriptionStream = FeedStream<Subscriptions>;

/// The [`FeedKind`] of a user's subscription feed.
#[derive(Debug)]
pub enum Subscriptions {}

impl FeedKind for Subscriptions {
    type Record = Subscription;
    const NAME: &'static str = "SubscriptionStream";

    fn decode_entry(_client: &Client, entry: Value) -> Result<Subscription> {
        let raw: RawSubscription = serde_json::from_value(entry)?;
        Ok(Subscription {
            username: raw.username.value,
        })
    }
}

/// One channel the user follows.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Subscription {
    /// Username of the channel's owner.
    pub username: String,
}

#[derive(Debug, Deserialize)]
struct RawSubscription {
    #[serde(rename = "yt$username")]
    username: Text,
}
