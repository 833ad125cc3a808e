use tracing::{debug, instrument};

use birdwire_client::{ApiRequest, Payload, Result, API_V2};

use super::{
    validate_id, MEDIA_FIELDS, PLACE_FIELDS, POLL_FIELDS, TWEET_EXPANSIONS, TWEET_FIELDS,
    USER_FIELDS,
};
use crate::compose::NewTweet;
use crate::entities::{Tweet, TweetRef};
use crate::pagination::{Paginator, TokenParam};

impl super::TwitterClient {
    /// Look up a tweet with its author, media, poll, place, mentions and
    /// referenced tweets resolved.
    ///
    /// Returns `None` if the tweet does not exist.
    #[instrument(skip(self))]
    pub async fn fetch_tweet(&self, tweet_id: &str) -> Result<Option<Tweet>> {
        validate_id(tweet_id, "tweet id")?;

        let request = ApiRequest::get(API_V2, format!("/tweets/{}", tweet_id))
            .query("tweet.fields", TWEET_FIELDS)
            .query("user.fields", USER_FIELDS)
            .query("expansions", TWEET_EXPANSIONS)
            .query("media.fields", MEDIA_FIELDS)
            .query("place.fields", PLACE_FIELDS)
            .query("poll.fields", POLL_FIELDS);

        let Some(merged) = self.fetch_merged(&request).await? else {
            return Ok(None);
        };
        let tweet: Tweet = serde_json::from_value(merged)?;
        self.tweets.insert(tweet.id.clone(), tweet.clone());
        Ok(Some(tweet))
    }

    /// A tweet previously returned by this client.
    pub fn cached_tweet(&self, tweet_id: &str) -> Option<Tweet> {
        self.tweets.get(tweet_id)
    }

    /// Post a tweet, uploading its attached file first.
    ///
    /// Returns the created tweet's id and text when the API sends them
    /// back. A `201 Created` carries no body the client reads, so the
    /// result is `None` in that case.
    #[instrument(skip(self, tweet))]
    pub async fn post_tweet(&self, mut tweet: NewTweet) -> Result<Option<TweetRef>> {
        let uploaded = match tweet.take_file() {
            Some(file) => Some(self.uploader.upload(&file).await?.media_id),
            None => None,
        };

        let request = ApiRequest::post(API_V2, "/tweets")
            .json_value(tweet.payload(uploaded)?)
            .oauth1();

        match self.client.execute(&request).await? {
            Payload::Json(body) => {
                let data = body.get("data").cloned().unwrap_or(body);
                let created: TweetRef = serde_json::from_value(data)?;
                debug!(tweet_id = %created.id, "Tweet created");
                Ok(Some(created))
            }
            _ => Ok(None),
        }
    }

    /// Delete one of the authenticated account's tweets.
    ///
    /// Returns whether the API reports the tweet as deleted.
    #[instrument(skip(self))]
    pub async fn delete_tweet(&self, tweet_id: &str) -> Result<bool> {
        validate_id(tweet_id, "tweet id")?;

        let request = ApiRequest::delete(API_V2, format!("/tweets/{}", tweet_id)).oauth1();
        let deleted = match self.client.execute(&request).await? {
            Payload::Json(body) => body["data"]["deleted"].as_bool().unwrap_or(true),
            _ => true,
        };
        Ok(deleted)
    }

    /// Tweets authored by `user_id`, newest first.
    pub fn user_tweets(&self, user_id: &str) -> Result<Paginator<Tweet>> {
        validate_id(user_id, "user id")?;
        let cursor = self
            .tweet_cursor(format!("/users/{}/tweets", user_id))
            .param("max_results", "100");
        Ok(Paginator::new(self.client.clone(), cursor))
    }

    /// Tweets from the last seven days matching `query`.
    pub fn search_recent(&self, query: &str) -> Paginator<Tweet> {
        let cursor = self
            .tweet_cursor("/tweets/search/recent".to_string())
            .param("query", query)
            .param("max_results", "100")
            .token_param(TokenParam::NextToken);
        Paginator::new(self.client.clone(), cursor)
    }
}
