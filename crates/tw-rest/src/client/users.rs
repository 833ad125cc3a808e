use tracing::instrument;

use birdwire_client::{ApiRequest, Error, ErrorKind, Result, API_V2};

use super::{validate_id, TWEET_FIELDS, USER_FIELDS};
use crate::entities::User;
use crate::pagination::{Cursor, Paginator};

impl super::TwitterClient {
    /// Look up a user by numeric id.
    ///
    /// Returns `None` if the user does not exist.
    #[instrument(skip(self))]
    pub async fn fetch_user(&self, user_id: &str) -> Result<Option<User>> {
        validate_id(user_id, "user id")?;
        self.lookup_user(format!("/users/{}", user_id)).await
    }

    /// Look up a user by handle. A leading `@` is ignored.
    #[instrument(skip(self))]
    pub async fn fetch_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let username = username.trim().trim_start_matches('@');
        if username.is_empty() {
            return Err(Error::new(ErrorKind::InvalidArgument(
                "username must not be empty".to_string(),
            )));
        }
        self.lookup_user(format!("/users/by/username/{}", username))
            .await
    }

    /// Look up the account the access token belongs to.
    #[instrument(skip(self))]
    pub async fn me(&self) -> Result<Option<User>> {
        let user_id = self
            .client
            .credentials()
            .user_id()
            .map(str::to_string)
            .ok_or_else(|| Error::new(ErrorKind::MissingCredential("access_token".to_string())))?;
        self.fetch_user(&user_id).await
    }

    /// A user previously returned by this client.
    pub fn cached_user(&self, user_id: &str) -> Option<User> {
        self.users.get(user_id)
    }

    /// Accounts following `user_id`.
    pub fn followers(&self, user_id: &str) -> Result<Paginator<User>> {
        validate_id(user_id, "user id")?;
        Ok(self.user_listing(format!("/users/{}/followers", user_id)))
    }

    /// Accounts `user_id` follows.
    pub fn following(&self, user_id: &str) -> Result<Paginator<User>> {
        validate_id(user_id, "user id")?;
        Ok(self.user_listing(format!("/users/{}/following", user_id)))
    }

    async fn lookup_user(&self, path: String) -> Result<Option<User>> {
        let request = ApiRequest::get(API_V2, path)
            .query("user.fields", USER_FIELDS)
            .query("expansions", "pinned_tweet_id")
            .query("tweet.fields", TWEET_FIELDS);

        let Some(merged) = self.fetch_merged(&request).await? else {
            return Ok(None);
        };
        let user: User = serde_json::from_value(merged)?;
        self.users.insert(user.id.clone(), user.clone());
        Ok(Some(user))
    }

    fn user_listing(&self, path: String) -> Paginator<User> {
        let cursor = Cursor::new(API_V2, path)
            .param("user.fields", USER_FIELDS)
            .param("expansions", "pinned_tweet_id")
            .param("tweet.fields", TWEET_FIELDS)
            .param("max_results", "1000");
        Paginator::new(self.client.clone(), cursor)
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::test_client;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn user_body(id: &str, username: &str) -> serde_json::Value {
        json!({
            "data": {
                "id": id,
                "name": "Twitter Dev",
                "username": username,
                "pinned_tweet_id": "1255542774432063488",
                "public_metrics": {
                    "followers_count": 513958,
                    "following_count": 2039,
                    "tweet_count": 3635,
                    "listed_count": 1672
                }
            },
            "includes": {
                "tweets": [{
                    "id": "1255542774432063488",
                    "text": "During these unprecedented times..."
                }]
            }
        })
    }

    #[tokio::test]
    async fn test_fetch_user() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/2/users/2244994945"))
            .and(query_param("expansions", "pinned_tweet_id"))
            .and(header("Authorization", "Bearer test-bearer"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(user_body("2244994945", "TwitterDev")),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server);
        let user = client.fetch_user("2244994945").await.unwrap().unwrap();

        assert_eq!(user.username, "TwitterDev");
        assert_eq!(user.public_metrics.unwrap().followers_count, 513958);
        assert_eq!(
            user.pinned_tweet.unwrap().text,
            "During these unprecedented times..."
        );
        assert!(client.cached_user("2244994945").is_some());
    }

    #[tokio::test]
    async fn test_fetch_user_not_found_inside_200() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/2/users/123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "errors": [{
                    "value": "123",
                    "detail": "Could not find user with id: [123].",
                    "title": "Not Found Error"
                }]
            })))
            .mount(&server)
            .await;

        let client = test_client(&server);
        assert!(client.fetch_user("123").await.unwrap().is_none());
        assert!(client.cached_user("123").is_none());
    }

    #[tokio::test]
    async fn test_fetch_user_rejects_non_numeric_id() {
        let server = MockServer::start().await;
        let client = test_client(&server);

        let err = client.fetch_user("jack").await.unwrap_err();
        assert!(matches!(
            err.kind,
            birdwire_client::ErrorKind::InvalidArgument(_)
        ));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_user_by_username_strips_at() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/2/users/by/username/TwitterDev"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(user_body("2244994945", "TwitterDev")),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server);
        let user = client
            .fetch_user_by_username("@TwitterDev")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(user.id, "2244994945");
    }

    #[tokio::test]
    async fn test_me_uses_access_token_id() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/2/users/783214"))
            .respond_with(ResponseTemplate::new(200).set_body_json(user_body("783214", "Twitter")))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server);
        let me = client.me().await.unwrap().unwrap();
        assert_eq!(me.username, "Twitter");
    }

    #[tokio::test]
    async fn test_followers_paginate() {
        use futures::TryStreamExt;

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/2/users/2244994945/followers"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [
                    {"id": "1", "name": "A", "username": "a"},
                    {"id": "2", "name": "B", "username": "b"}
                ],
                "meta": {"result_count": 2}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server);
        let followers: Vec<crate::entities::User> = client
            .followers("2244994945")
            .unwrap()
            .try_collect()
            .await
            .unwrap();

        let names: Vec<&str> = followers.iter().map(|u| u.username.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }
}
