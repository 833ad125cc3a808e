//! Twitter API client.
//!
//! This client wraps `TwitterHttpClient` from `tw-client` and provides
//! typed methods for users, tweets, direct messages and filtered-stream
//! rules. Responses are merged with their `includes` before they are
//! decoded.

use std::sync::Arc;

use serde_json::Value;

use birdwire_auth::Credentials;
use birdwire_client::{
    ApiRequest, ClientConfig, Error, ErrorKind, Payload, Result, TwitterHttpClient,
};
use birdwire_media::{MediaUploader, UploadConfig};

use crate::cache::EntityCache;
use crate::entities::{DirectMessage, Tweet, User};
use crate::merge::{merge, split_envelope};
use crate::pagination::Cursor;

mod messages;
mod rules;
mod spaces;
mod tweets;
mod users;

pub(crate) const TWEET_FIELDS: &str = "attachments,author_id,conversation_id,created_at,entities,geo,id,in_reply_to_user_id,lang,possibly_sensitive,public_metrics,referenced_tweets,reply_settings,source,text";
pub(crate) const USER_FIELDS: &str = "created_at,description,entities,id,location,name,pinned_tweet_id,profile_image_url,protected,public_metrics,url,username,verified";
pub(crate) const TWEET_EXPANSIONS: &str = "attachments.poll_ids,attachments.media_keys,author_id,entities.mentions.username,geo.place_id,in_reply_to_user_id,referenced_tweets.id,referenced_tweets.id.author_id";
pub(crate) const MEDIA_FIELDS: &str = "alt_text,duration_ms,height,media_key,preview_image_url,type,url,width";
pub(crate) const PLACE_FIELDS: &str = "contained_within,country,country_code,full_name,geo,id,name,place_type";
pub(crate) const POLL_FIELDS: &str = "duration_minutes,end_datetime,id,options,voting_status";

/// Twitter API client.
///
/// Provides typed methods for:
/// - Users: lookup by id or handle, followers, following
/// - Tweets: lookup, post (with media upload), delete, timelines, search
/// - Direct messages: send (with media upload), lookup
/// - Spaces: lookup by id or title
/// - Filtered-stream rules
///
/// Every lookup fills a per-client cache that clones of the client share.
///
/// # Example
///
/// ```rust,ignore
/// use birdwire_rest::{NewTweet, TwitterClient};
///
/// let client = TwitterClient::new(Credentials::from_env()?)?;
///
/// // Lookup
/// let user = client.fetch_user_by_username("@TwitterDev").await?;
///
/// // Post
/// let created = client.post_tweet(NewTweet::text("hello")).await?;
///
/// // Timeline
/// let mut tweets = client.user_tweets("2244994945");
/// while let Some(tweet) = tweets.try_next().await? {
///     println!("{}", tweet.text);
/// }
/// ```
#[derive(Debug, Clone)]
pub struct TwitterClient {
    client: TwitterHttpClient,
    uploader: MediaUploader,
    users: Arc<EntityCache<User>>,
    tweets: Arc<EntityCache<Tweet>>,
    messages: Arc<EntityCache<DirectMessage>>,
}

impl TwitterClient {
    /// Create a client with the default HTTP configuration.
    pub fn new(credentials: Credentials) -> Result<Self> {
        Ok(Self::from_client(TwitterHttpClient::with_credentials(
            credentials,
        )?))
    }

    /// Create a client with custom HTTP configuration.
    pub fn with_config(credentials: Credentials, config: ClientConfig) -> Result<Self> {
        Ok(Self::from_client(TwitterHttpClient::new(
            credentials,
            config,
        )?))
    }

    /// Create a client from an existing `TwitterHttpClient`.
    pub fn from_client(client: TwitterHttpClient) -> Self {
        Self {
            uploader: MediaUploader::new(client.clone()),
            client,
            users: Arc::new(EntityCache::new()),
            tweets: Arc::new(EntityCache::new()),
            messages: Arc::new(EntityCache::new()),
        }
    }

    /// Use a custom media upload configuration.
    pub fn with_upload_config(mut self, config: UploadConfig) -> Self {
        self.uploader = MediaUploader::with_config(self.client.clone(), config);
        self
    }

    /// Get the underlying `TwitterHttpClient`.
    pub fn inner(&self) -> &TwitterHttpClient {
        &self.client
    }

    /// Get the media uploader.
    pub fn uploader(&self) -> &MediaUploader {
        &self.uploader
    }

    /// Execute a request and merge the response with its includes.
    ///
    /// Returns `None` when the API reports the resource as missing or the
    /// result set is empty.
    pub(crate) async fn fetch_merged(&self, request: &ApiRequest) -> Result<Option<Value>> {
        let payload = match self.client.execute(request).await {
            Ok(payload) => payload,
            Err(err) if err.is_not_found() => return Ok(None),
            Err(err) => return Err(err),
        };

        match payload {
            Payload::EmptyCollection | Payload::Empty => Ok(None),
            payload => {
                let (root, includes) = split_envelope(payload.into_json()?);
                Ok(Some(merge(&root, &includes)))
            }
        }
    }

    pub(crate) fn tweet_cursor(&self, path: String) -> Cursor {
        Cursor::new(birdwire_client::API_V2, path)
            .param("tweet.fields", TWEET_FIELDS)
            .param("user.fields", USER_FIELDS)
            .param("expansions", TWEET_EXPANSIONS)
            .param("media.fields", MEDIA_FIELDS)
            .param("place.fields", PLACE_FIELDS)
            .param("poll.fields", POLL_FIELDS)
    }
}

/// Reject ids that are not a non-empty run of digits.
pub(crate) fn validate_id(id: &str, what: &str) -> Result<()> {
    if id.is_empty() || !id.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::new(ErrorKind::InvalidArgument(format!(
            "{} must be numeric, got {:?}",
            what, id
        ))));
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use birdwire_client::{SleepFuture, Sleeper};
    use std::sync::Mutex;
    use std::time::Duration;
    use wiremock::MockServer;

    #[derive(Debug, Default, Clone)]
    pub(crate) struct RecordingSleeper {
        pub(crate) calls: Arc<Mutex<Vec<Duration>>>,
    }

    impl Sleeper for RecordingSleeper {
        fn sleep(&self, duration: Duration) -> SleepFuture {
            self.calls.lock().unwrap().push(duration);
            Box::pin(async {})
        }
    }

    pub(crate) const UPLOAD_PATH: &str = "/1.1/media/upload.json";

    pub(crate) fn test_client(server: &MockServer) -> TwitterClient {
        TwitterClient::with_config(
            Credentials::new("test-bearer", "ck", "cs", "783214-at", "ats"),
            ClientConfig::builder()
                .with_api_base_url(server.uri())
                .with_upload_url(format!("{}{}", server.uri(), UPLOAD_PATH))
                .with_sleeper(Arc::new(RecordingSleeper::default()))
                .build(),
        )
        .unwrap()
    }

    #[test]
    fn test_validate_id() {
        assert!(validate_id("2244994945", "user id").is_ok());
        assert!(validate_id("", "user id").is_err());
        assert!(validate_id("12a", "user id").is_err());
        assert!(validate_id("-1", "user id").is_err());
    }

    #[tokio::test]
    async fn test_clones_share_caches() {
        let server = MockServer::start().await;
        let client = test_client(&server);
        let clone = client.clone();

        let user: User =
            serde_json::from_value(serde_json::json!({"id": "1", "username": "one"})).unwrap();
        client.users.insert("1", user);

        assert!(clone.cached_user("1").is_some());
    }

    #[tokio::test]
    async fn test_separate_clients_do_not_share_caches() {
        let server = MockServer::start().await;
        let first = test_client(&server);
        let second = test_client(&server);

        let user: User =
            serde_json::from_value(serde_json::json!({"id": "1", "username": "one"})).unwrap();
        first.users.insert("1", user);

        assert!(second.cached_user("1").is_none());
    }
}
