//! The GData API client: configuration, request plumbing, and the endpoint catalogue.

use crate::auth::Credentials;
use crate::error::{Error, Result};
use crate::gdata::comments::CommentStream;
use crate::gdata::playlists::Playlist;
use crate::gdata::profiles::Profile;
use crate::gdata::stream::FeedStream;
use crate::gdata::subscriptions::SubscriptionStream;
use crate::gdata::types::Document;
use crate::gdata::videos::{Video, VideoStream};
use crate::transport::{ReqwestTransport, Request, Response, Transport};
use derive_builder::Builder;
use http::header::CONTENT_TYPE;
use http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use std::sync::Arc;
use std::time::Duration;
use tracing::instrument;

/// Where the API lives unless configured otherwise.
pub const DEFAULT_BASE_URL: &str = "http://gdata.youtube.com/feeds/api";

/// The username the API resolves to the authenticated user.
pub const DEFAULT_USER: &str = "default";

const X_GDATA_KEY: HeaderName = HeaderName::from_static("x-gdata-key");
const GDATA_VERSION: HeaderName = HeaderName::from_static("gdata-version");
const ATOM_XML: &str = "application/atom+xml";

/// Settings for a [`Client`].
///
/// ```rust
/// use youtube_gdata::ClientConfig;
/// use std::time::Duration;
///
/// let config = ClientConfig::builder()
///     .app_name("my-app")
///     .dev_key("AI39si...")
///     .timeout(Duration::from_secs(10))
///     .build()
///     .unwrap();
/// ```
#[derive(Debug, Clone, Builder)]
pub struct ClientConfig {
    /// Identifies the calling application to Google.
    #[builder(setter(into))]
    pub(crate) app_name: String,

    /// Developer key sent as `X-GData-Key` with every request.
    #[builder(setter(into, strip_option), default)]
    pub(crate) dev_key: Option<String>,

    /// Per-request timeout. Following many `next` links can take longer than this in total.
    #[builder(setter(into, strip_option), default)]
    pub(crate) timeout: Option<Duration>,

    #[builder(setter(into), default = "DEFAULT_BASE_URL.to_string()")]
    pub(crate) base_url: String,

    #[builder(setter(into, strip_option), default)]
    pub(crate) credentials: Option<Credentials>,
}

impl ClientConfig {
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

/// Blocking client for the YouTube GData API.
///
/// Cloning is cheap; clones share the configuration and the transport. Streams and records
/// that need to make follow-up requests hold such a clone.
///
/// The default transport uses `reqwest`'s blocking client, which must not be used from
/// within an async runtime.
#[derive(Debug, Clone)]
pub struct Client {
    config: Arc<ClientConfig>,
    transport: Arc<dyn Transport>,
}

impl Client {
    /// Creates a client that talks to the API through [`ReqwestTransport`].
    pub fn new(config: ClientConfig) -> Self {
        Self::with_transport(config, ReqwestTransport::new())
    }

    pub fn with_transport(config: ClientConfig, transport: impl Transport + 'static) -> Self {
        Self {
            config: Arc::new(config),
            transport: Arc::new(transport),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn is_authenticated(&self) -> bool {
        self.config.credentials.is_some()
    }

    /// A client that sends `credentials` with every request, sharing this client's transport.
    pub fn with_credentials(&self, credentials: Credentials) -> Self {
        let mut config = ClientConfig::clone(&self.config);
        config.credentials = Some(credentials);
        Self {
            config: Arc::new(config),
            transport: Arc::clone(&self.transport),
        }
    }

    /// A client that sends no credentials.
    ///
    /// The token itself stays valid on Google's side; there is no API to revoke it.
    pub fn without_credentials(&self) -> Self {
        let mut config = ClientConfig::clone(&self.config);
        config.credentials = None;
        Self {
            config: Arc::new(config),
            transport: Arc::clone(&self.transport),
        }
    }

    /// A user's profile. Pass [`DEFAULT_USER`] for the authenticated user's own profile.
    #[instrument(skip(self))]
    pub fn user_profile(&self, username: &str) -> Result<Profile> {
        let url = self.url(&format!("users/{}", path_segment(username)), &[("alt", "json")]);
        let document = self.get_document(&url)?;
        let profile = Profile::from_document(self, document)?;
        tracing::debug!(username = %profile.username, "fetched profile");
        Ok(profile)
    }

    /// The videos a user has uploaded.
    pub fn user_videos(&self, username: &str) -> VideoStream {
        let url = self.url(&format!("users/{}/uploads", path_segment(username)), &[("alt", "json")]);
        FeedStream::new(self.clone(), url)
    }

    /// The channels a user is subscribed to.
    pub fn user_subscriptions(&self, username: &str) -> SubscriptionStream {
        let url = self.url(
            &format!("users/{}/subscriptions", path_segment(username)),
            &[("alt", "json"), ("v", "2")],
        );
        FeedStream::new(self.clone(), url)
    }

    /// A single video.
    ///
    /// Distinguishes missing videos ([`Error::NoSuchVideo`]), private ones
    /// ([`Error::PrivateVideo`]), and quota exhaustion ([`Error::QuotaExceeded`]).
    #[instrument(skip(self))]
    pub fn video(&self, video_id: &str) -> Result<Video> {
        let url = self.url(&format!("videos/{}", path_segment(video_id)), &[("alt", "json"), ("v", "2")]);
        let document = match self.get_document(&url) {
            Ok(document) => document,
            Err(Error::Status { status, body }) if status == StatusCode::FORBIDDEN => {
                return Err(if body.contains("too_many_recent_calls") {
                    Error::QuotaExceeded
                } else {
                    Error::PrivateVideo(video_id.to_owned())
                });
            }
            Err(Error::Status { status, .. }) if status == StatusCode::NOT_FOUND => {
                return Err(Error::NoSuchVideo(video_id.to_owned()));
            }
            Err(e) => return Err(e),
        };
        Video::from_raw(self, document.into_entry()?)
    }

    /// Videos matching `query`, with any further search parameters
    /// (`orderby`, `max-results`, `author`, ...) passed through verbatim.
    pub fn video_search(&self, query: &str, params: &[(&str, &str)]) -> VideoStream {
        let mut pairs = vec![("alt", "json"), ("q", query)];
        pairs.extend_from_slice(params);
        FeedStream::new(self.clone(), self.url("videos", &pairs))
    }

    pub fn video_comments(&self, video_id: &str) -> CommentStream {
        let url = self.url(&format!("videos/{}/comments", path_segment(video_id)), &[("alt", "json")]);
        FeedStream::new(self.clone(), url)
    }

    /// Videos posted as responses to `video_id`.
    pub fn video_responses(&self, video_id: &str) -> VideoStream {
        let url = self.url(&format!("videos/{}/responses", path_segment(video_id)), &[("alt", "json")]);
        FeedStream::new(self.clone(), url)
    }

    /// A playlist and all of its entries.
    #[instrument(skip(self))]
    pub fn playlist(&self, playlist_id: &str) -> Result<Playlist> {
        let url = self.url(
            &format!("playlists/{}", path_segment(playlist_id)),
            &[("alt", "json"), ("v", "2")],
        );
        let playlist = Playlist::from_document(self, self.get_document(&url)?)?;
        tracing::debug!(entries = playlist.entries.len(), "fetched playlist");
        Ok(playlist)
    }

    /// Subscribes the authenticated user to `username`'s channel.
    #[instrument(skip(self))]
    pub fn subscribe(&self, username: &str) -> Result<()> {
        if !self.is_authenticated() {
            return Err(Error::NotAuthenticated);
        }
        let body = format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<entry xmlns="http://www.w3.org/2005/Atom"
  xmlns:yt="http://gdata.youtube.com/schemas/2007">
  <category scheme="http://gdata.youtube.com/schemas/2007/subscriptiontypes.cat"
    term="channel"/>
  <yt:username>{}</yt:username>
</entry>"#,
            quick_xml::escape::escape(username)
        );
        let url = self.url(&format!("users/{DEFAULT_USER}/subscriptions"), &[]);
        self.post_atom(&url, body)?;
        tracing::debug!("subscribed");
        Ok(())
    }

    /// Posts `response_video_id` as a video response to `original_video_id`.
    #[instrument(skip(self))]
    pub fn video_response(&self, original_video_id: &str, response_video_id: &str) -> Result<()> {
        let body = format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<entry xmlns="http://www.w3.org/2005/Atom">
  <id>{}</id>
</entry>"#,
            quick_xml::escape::escape(response_video_id)
        );
        let url = self.url(&format!("videos/{}/responses", path_segment(original_video_id)), &[]);
        self.post_atom(&url, body)?;
        tracing::debug!("posted video response");
        Ok(())
    }

    /// `base_url/path?query`.
    fn url(&self, path: &str, query: &[(&str, &str)]) -> String {
        let mut url = format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        if !query.is_empty() {
            url.push('?');
            url.push_str(
                &form_urlencoded::Serializer::new(String::new())
                    .extend_pairs(query)
                    .finish(),
            );
        }
        url
    }

    /// Headers every request carries: credentials and developer key, when configured.
    fn default_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        if let Some(credentials) = &self.config.credentials {
            let value = credentials.authorization().map_err(|_| {
                Error::Unauthorized("credentials contain characters not allowed in a header".into())
            })?;
            headers.insert(http::header::AUTHORIZATION, value);
        }
        if let Some(key) = &self.config.dev_key {
            let value = HeaderValue::from_str(&format!("key={key}")).map_err(|_| {
                Error::Unauthorized("developer key contains characters not allowed in a header".into())
            })?;
            headers.insert(X_GDATA_KEY, value);
        }
        Ok(headers)
    }

    /// Sends `request` with the default headers and timeout, and checks the status.
    #[instrument(skip(self, request), fields(method = %request.method, url = %request.url), level = tracing::Level::TRACE)]
    pub(crate) fn make_authenticated_request(&self, mut request: Request) -> Result<Response> {
        for (name, value) in &self.default_headers()? {
            request.headers.insert(name, value.clone());
        }
        if request.timeout.is_none() {
            request.timeout = self.config.timeout;
        }
        let response = self.transport.fetch(request)?;
        check_status(response)
    }

    /// The body of a GET of `uri`, which must answer 200.
    pub(crate) fn get_feed_body(&self, uri: &str) -> Result<String> {
        let response = self.make_authenticated_request(Request::get(uri))?;
        if response.status != StatusCode::OK {
            return Err(Error::Status {
                status: response.status,
                body: response.body,
            });
        }
        Ok(response.body)
    }

    fn get_document(&self, url: &str) -> Result<Document> {
        Document::from_body(&self.get_feed_body(url)?)
    }

    fn post_atom(&self, url: &str, body: String) -> Result<Response> {
        let mut request = Request::post(url, body);
        request
            .headers
            .insert(CONTENT_TYPE, HeaderValue::from_static(ATOM_XML));
        request
            .headers
            .insert(GDATA_VERSION, HeaderValue::from_static("2"));
        self.make_authenticated_request(request)
    }
}

/// Percent-encodes one path segment so it cannot introduce `/`, `?`, or `#`.
fn path_segment(segment: &str) -> String {
    form_urlencoded::byte_serialize(segment.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

/// Maps non-success statuses to errors.
fn check_status(response: Response) -> Result<Response> {
    let status = response.status;
    if status.is_success() {
        return Ok(response);
    }
    tracing::debug!(%status, "YouTube API request failed");
    if status == StatusCode::UNAUTHORIZED {
        if response.body.contains("TokenExpired") {
            return Err(Error::TokenExpired);
        }
        return Err(Error::Unauthorized(response.body));
    }
    Err(Error::Status {
        status,
        body: response.body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{self, MockTransport};
    use http::Method;
    use pretty_assertions::assert_eq;

    #[test]
    fn config_requires_app_name() {
        assert!(ClientConfig::builder().build().is_err());
        let config = ClientConfig::builder().app_name("app").build().unwrap();
        assert_eq!(config.base_url(), DEFAULT_BASE_URL);
        assert_eq!(config.timeout(), None);
    }

    #[test]
    fn stream_urls() {
        let transport = MockTransport::new();
        let client = mock::client(&transport);
        assert_eq!(
            client.user_videos("bob").uri(),
            Some("http://gdata.test/feeds/api/users/bob/uploads?alt=json")
        );
        assert_eq!(
            client.user_subscriptions(DEFAULT_USER).uri(),
            Some("http://gdata.test/feeds/api/users/default/subscriptions?alt=json&v=2")
        );
        assert_eq!(
            client.video_comments("v1").uri(),
            Some("http://gdata.test/feeds/api/videos/v1/comments?alt=json")
        );
        assert_eq!(
            client.video_responses("v1").uri(),
            Some("http://gdata.test/feeds/api/videos/v1/responses?alt=json")
        );
        assert_eq!(
            client
                .video_search("cats & dogs", &[("orderby", "viewCount")])
                .uri(),
            Some("http://gdata.test/feeds/api/videos?alt=json&q=cats+%26+dogs&orderby=viewCount")
        );
        assert_eq!(transport.fetches(), 0);
    }

    #[test]
    fn requests_carry_default_headers_and_timeout() {
        let transport = MockTransport::new();
        let url = "http://gdata.test/feeds/api/users/bob/uploads?alt=json";
        transport.respond_json(url, mock::video_feed(0, &[], None));
        let config = ClientConfig::builder()
            .app_name("test")
            .base_url(mock::BASE_URL)
            .dev_key("devkey")
            .timeout(Duration::from_secs(5))
            .credentials(Credentials::client_login("token"))
            .build()
            .unwrap();
        let client = Client::with_transport(config, transport.clone());

        client.user_videos("bob").len().unwrap();

        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        let request = &requests[0];
        assert_eq!(request.method, Method::GET);
        assert_eq!(request.headers["authorization"], "GoogleLogin auth=token");
        assert_eq!(request.headers["x-gdata-key"], "key=devkey");
        assert_eq!(request.timeout, Some(Duration::from_secs(5)));
    }

    #[test]
    fn unauthenticated_requests_have_no_authorization() {
        let transport = MockTransport::new();
        let url = "http://gdata.test/feeds/api/users/bob/uploads?alt=json";
        transport.respond_json(url, mock::video_feed(0, &[], None));
        let client = mock::client(&transport)
            .with_credentials(Credentials::auth_sub("tok"))
            .without_credentials();

        client.user_videos("bob").len().unwrap();
        assert!(!transport.requests()[0].headers.contains_key("authorization"));
    }

    #[test]
    fn video_maps_statuses() {
        let transport = MockTransport::new();
        let client = mock::client(&transport);
        let url = |id: &str| format!("http://gdata.test/feeds/api/videos/{id}?alt=json&v=2");

        transport.respond(&url("gone0000000"), StatusCode::NOT_FOUND, "Video not found");
        transport.respond(&url("secret00000"), StatusCode::FORBIDDEN, "Private video");
        transport.respond(
            &url("busy0000000"),
            StatusCode::FORBIDDEN,
            "<errors><error><code>too_many_recent_calls</code></error></errors>",
        );
        transport.respond(&url("expired0000"), StatusCode::UNAUTHORIZED, "Token invalid - TokenExpired");
        transport.respond(&url("denied00000"), StatusCode::UNAUTHORIZED, "NoLinkedYouTubeAccount");

        assert!(matches!(client.video("gone0000000"), Err(Error::NoSuchVideo(id)) if id == "gone0000000"));
        assert!(matches!(client.video("secret00000"), Err(Error::PrivateVideo(_))));
        assert!(matches!(client.video("busy0000000"), Err(Error::QuotaExceeded)));
        assert!(matches!(client.video("expired0000"), Err(Error::TokenExpired)));
        let denied = client.video("denied00000").unwrap_err();
        assert!(matches!(denied, Error::Unauthorized(_)));
        assert!(denied.is_auth_error());
    }

    #[test]
    fn video_decodes_single_entry() {
        let transport = MockTransport::new();
        let client = mock::client(&transport);
        transport.respond_json(
            "http://gdata.test/feeds/api/videos/abcdefghijk?alt=json&v=2",
            serde_json::json!({"version": "1.0", "entry": mock::video_entry("abcdefghijk")}),
        );
        let video = client.video("abcdefghijk").unwrap();
        assert_eq!(video.id, "abcdefghijk");
        assert_eq!(
            video.comments().uri(),
            Some("http://gdata.test/feeds/api/videos/abcdefghijk/comments?alt=json")
        );
    }

    #[test]
    fn subscribe_requires_credentials() {
        let transport = MockTransport::new();
        let client = mock::client(&transport);
        assert!(matches!(client.subscribe("alice"), Err(Error::NotAuthenticated)));
        assert_eq!(transport.fetches(), 0);
    }

    #[test]
    fn subscribe_posts_atom_entry() {
        let transport = MockTransport::new();
        let url = "http://gdata.test/feeds/api/users/default/subscriptions";
        transport.respond(url, StatusCode::CREATED, "<entry/>");
        let client = mock::client(&transport).with_credentials(Credentials::auth_sub("tok"));

        client.subscribe("a<b").unwrap();

        let request = &transport.requests()[0];
        assert_eq!(request.method, Method::POST);
        assert_eq!(request.headers["content-type"], ATOM_XML);
        assert_eq!(request.headers["gdata-version"], "2");
        assert_eq!(request.headers["authorization"], "AuthSub token=tok");
        let body = request.body.as_deref().unwrap();
        assert!(body.contains("<yt:username>a&lt;b</yt:username>"), "{body}");
    }

    #[test]
    fn video_response_posts_to_original() {
        let transport = MockTransport::new();
        let url = "http://gdata.test/feeds/api/videos/orig0000000/responses";
        transport.respond(url, StatusCode::CREATED, "<entry/>");
        let client = mock::client(&transport);

        client.video_response("orig0000000", "resp0000000").unwrap();

        let request = &transport.requests()[0];
        assert_eq!(request.url, url);
        assert!(request.body.as_deref().unwrap().contains("<id>resp0000000</id>"));
    }

    #[test]
    fn failed_mutation_reports_status() {
        let transport = MockTransport::new();
        let url = "http://gdata.test/feeds/api/videos/orig0000000/responses";
        transport.respond(url, StatusCode::BAD_REQUEST, "InvalidEntryException");
        let client = mock::client(&transport);

        let err = client.video_response("orig0000000", "resp0000000").unwrap_err();
        assert!(
            matches!(&err, Error::Status { status, body } if *status == StatusCode::BAD_REQUEST && body == "InvalidEntryException"),
            "{err:?}"
        );
    }

    #[test]
    fn ids_cannot_change_the_endpoint() {
        let transport = MockTransport::new();
        let client = mock::client(&transport);
        assert_eq!(
            client.user_videos("bob/favorites?x=1#y").uri(),
            Some("http://gdata.test/feeds/api/users/bob%2Ffavorites%3Fx%3D1%23y/uploads?alt=json")
        );
        assert_eq!(
            client.video_comments("a b").uri(),
            Some("http://gdata.test/feeds/api/videos/a%20b/comments?alt=json")
        );

        transport.respond(
            "http://gdata.test/feeds/api/videos/..%2Fusers%2Fbob/responses",
            StatusCode::CREATED,
            "<entry/>",
        );
        client.video_response("../users/bob", "resp0000000").unwrap();
        assert_eq!(
            transport.requested_urls(),
            ["http://gdata.test/feeds/api/videos/..%2Fusers%2Fbob/responses"]
        );
    }

    #[test]
    fn feed_get_requires_200() {
        let transport = MockTransport::new();
        let url = "http://gdata.test/feeds/api/users/bob/uploads?alt=json";
        transport.respond(url, StatusCode::NO_CONTENT, "");
        let mut videos = mock::client(&transport).user_videos("bob");

        let err = videos.len().unwrap_err();
        assert!(
            matches!(&err, Error::Status { status, .. } if *status == StatusCode::NO_CONTENT),
            "{err:?}"
        );
    }

    #[test]
    fn user_profile_and_playlist_go_through_the_document_path() {
        let transport = MockTransport::new();
        let client = mock::client(&transport);
        transport.respond_json(
            "http://gdata.test/feeds/api/users/bob?alt=json",
            serde_json::json!({"version": "0.9", "entry": {}}),
        );
        transport.respond_json(
            "http://gdata.test/feeds/api/playlists/PL1?alt=json&v=2",
            serde_json::json!({"version": "0.9", "feed": {}}),
        );
        assert!(matches!(
            client.user_profile("bob"),
            Err(Error::ApiVersionMismatch { .. })
        ));
        assert!(matches!(
            client.playlist("PL1"),
            Err(Error::ApiVersionMismatch { .. })
        ));
    }
}
