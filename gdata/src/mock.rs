//! In-memory [`Transport`] and feed fixtures for testing code built on this crate.
//!
//! [`MockTransport`] answers requests from canned responses registered per URL and records
//! every request it sees, so tests can assert both on what the client decoded and on what it
//! asked for. Responses registered for the same URL are served in order; the last one keeps
//! being served once the others are used up. Unknown URLs get a `404`.
//!
//! The fixture builders produce JSON in the shape the GData API sends it.

use crate::gdata::client::{Client, ClientConfig};
use crate::transport::{Request, Response, Transport, TransportError};
use http::StatusCode;
use serde_json::{Value, json};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Base URL of the client returned by [`client`].
pub const BASE_URL: &str = "http://gdata.test/feeds/api";

#[derive(Debug, Clone)]
enum Canned {
    Respond(Response),
    Fail(String),
}

#[derive(Debug, Default)]
struct MockState {
    responses: HashMap<String, VecDeque<Canned>>,
    requests: Vec<Request>,
}

/// A [`Transport`] that serves canned responses. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn push(&self, url: &str, canned: Canned) {
        self.state()
            .responses
            .entry(url.to_owned())
            .or_default()
            .push_back(canned);
    }

    /// Queue a response with the given status and body for `url`.
    pub fn respond(&self, url: &str, status: StatusCode, body: impl Into<String>) {
        self.push(
            url,
            Canned::Respond(Response {
                status,
                body: body.into(),
            }),
        );
    }

    /// Queue a `200 OK` whose body is `body` serialized.
    pub fn respond_json(&self, url: &str, body: Value) {
        self.respond(url, StatusCode::OK, body.to_string());
    }

    /// Queue a transport-level failure for `url`.
    pub fn fail(&self, url: &str, message: impl Into<String>) {
        self.push(url, Canned::Fail(message.into()));
    }

    /// How many requests have been made, including failed ones.
    pub fn fetches(&self) -> usize {
        self.state().requests.len()
    }

    /// Every request seen so far, in order.
    pub fn requests(&self) -> Vec<Request> {
        self.state().requests.clone()
    }

    pub fn requested_urls(&self) -> Vec<String> {
        self.state()
            .requests
            .iter()
            .map(|request| request.url.clone())
            .collect()
    }
}

impl Transport for MockTransport {
    fn fetch(&self, request: Request) -> Result<Response, TransportError> {
        let mut state = self.state();
        state.requests.push(request.clone());
        tracing::trace!(url = %request.url, "mock transport request");

        let canned = match state.responses.get_mut(&request.url) {
            Some(queue) if queue.len() > 1 => queue.pop_front(),
            Some(queue) => queue.front().cloned(),
            None => None,
        };
        match canned {
            Some(Canned::Respond(response)) => Ok(response),
            Some(Canned::Fail(message)) => Err(TransportError::new(&request, message)),
            None => Ok(Response {
                status: StatusCode::NOT_FOUND,
                body: format!("no mock response for {}", request.url),
            }),
        }
    }
}

/// An anonymous client for [`BASE_URL`] that sends its requests through `transport`.
pub fn client(transport: &MockTransport) -> Client {
    let config = ClientConfig {
        app_name: "youtube-gdata-tests".to_owned(),
        dev_key: None,
        timeout: None,
        base_url: BASE_URL.to_owned(),
        credentials: None,
    };
    Client::with_transport(config, transport.clone())
}

/// A feed page in the envelope every GData JSON response carries.
fn feed(total: usize, title: &str, entries: Vec<Value>, next: Option<&str>) -> Value {
    let mut links = vec![json!({"rel": "self", "type": "application/atom+xml", "href": "http://gdata.test/self"})];
    if let Some(next) = next {
        links.push(json!({"rel": "next", "type": "application/atom+xml", "href": next}));
    }
    json!({
        "version": "1.0",
        "encoding": "UTF-8",
        "feed": {
            "openSearch$totalResults": {"$t": total.to_string()},
            "title": {"$t": title, "type": "text"},
            "updated": {"$t": "2012-06-01T12:00:00.000Z"},
            "link": links,
            "entry": entries
        }
    })
}

/// A minimal video entry with the given video id.
pub fn video_entry(id: &str) -> Value {
    json!({
        "id": {"$t": format!("http://gdata.youtube.com/feeds/api/videos/{id}")},
        "published": {"$t": "2012-05-01T08:00:00.000Z"},
        "updated": {"$t": "2012-05-02T08:00:00.000Z"},
        "title": {"$t": format!("Video {id}"), "type": "text"},
        "author": [{"name": {"$t": "bob"}}],
        "link": [{"rel": "alternate", "type": "text/html", "href": format!("http://www.youtube.com/watch?v={id}")}],
        "media$group": {"yt$videoid": {"$t": id}}
    })
}

/// A page of a user's uploads.
pub fn video_feed(total: usize, ids: &[&str], next: Option<&str>) -> Value {
    let entries = ids.iter().copied().map(video_entry).collect();
    feed(total, "Uploads by bob", entries, next)
}

/// A comment entry; `n` makes the id unique.
pub fn comment_entry(n: usize, content: &str) -> Value {
    json!({
        "id": {"$t": format!("http://gdata.youtube.com/feeds/api/videos/v1/comments/c{n}")},
        "published": {"$t": "2012-05-03T08:00:00.000Z"},
        "updated": {"$t": "2012-05-03T08:00:00.000Z"},
        "title": {"$t": content.chars().take(10).collect::<String>()},
        "content": {"$t": content},
        "author": [{"name": {"$t": format!("commenter{n}")}}]
    })
}

pub fn comment_feed(total: usize, contents: &[&str], next: Option<&str>) -> Value {
    let entries = contents
        .iter()
        .enumerate()
        .map(|(n, content)| comment_entry(n, content))
        .collect();
    feed(total, "Comments on 'Video v1'", entries, next)
}

pub fn subscription_feed(total: usize, usernames: &[&str], next: Option<&str>) -> Value {
    let entries = usernames
        .iter()
        .map(|username| {
            json!({
                "id": {"$t": format!("http://gdata.youtube.com/feeds/api/users/bob/subscriptions/{username}")},
                "title": {"$t": format!("Activity of: {username}")},
                "yt$username": {"$t": username}
            })
        })
        .collect();
    feed(total, "Subscriptions of bob", entries, next)
}

/// Sends `tracing` output of the test to the test harness, filtered by `RUST_LOG`.
#[cfg(test)]
pub(crate) fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
