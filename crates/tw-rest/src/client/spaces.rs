use tracing::instrument;

use birdwire_client::{ApiRequest, Error, ErrorKind, Result, API_V2};

use super::USER_FIELDS;
use crate::entities::{Space, SpaceState};

const SPACE_FIELDS: &str = "created_at,creator_id,ended_at,host_ids,id,is_ticketed,lang,participant_count,scheduled_start,speaker_ids,started_at,state,title,updated_at";
const SPACE_EXPANSIONS: &str = "creator_id,host_ids";

impl super::TwitterClient {
    /// Look up a Space with its creator and hosts resolved.
    ///
    /// Returns `None` if the Space does not exist.
    #[instrument(skip(self))]
    pub async fn fetch_space(&self, space_id: &str) -> Result<Option<Space>> {
        if space_id.is_empty() || !space_id.bytes().all(|b| b.is_ascii_alphanumeric()) {
            return Err(Error::new(ErrorKind::InvalidArgument(format!(
                "space id must be alphanumeric, got {:?}",
                space_id
            ))));
        }

        let request = space_request(format!("/spaces/{}", space_id));
        match self.fetch_merged(&request).await? {
            Some(merged) => Ok(Some(serde_json::from_value(merged)?)),
            None => Ok(None),
        }
    }

    /// Spaces in `state` whose title matches `title`.
    #[instrument(skip(self))]
    pub async fn fetch_spaces_by_title(
        &self,
        title: &str,
        state: SpaceState,
    ) -> Result<Vec<Space>> {
        let request = space_request("/spaces/search")
            .query("query", title)
            .query("state", state.as_str());

        match self.fetch_merged(&request).await? {
            Some(merged) => Ok(serde_json::from_value(merged)?),
            None => Ok(Vec::new()),
        }
    }
}

fn space_request(path: impl Into<String>) -> ApiRequest {
    ApiRequest::get(API_V2, path)
        .query("space.fields", SPACE_FIELDS)
        .query("expansions", SPACE_EXPANSIONS)
        .query("user.fields", USER_FIELDS)
}

#[cfg(test)]
mod tests {
    use super::super::tests::test_client;
    use crate::entities::SpaceState;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_fetch_space() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/2/spaces/1DXxyRYNejbKM"))
            .and(query_param("expansions", "creator_id,host_ids"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {
                    "id": "1DXxyRYNejbKM",
                    "state": "live",
                    "title": "hello world",
                    "creator_id": "2244994945",
                    "host_ids": ["2244994945"],
                    "participant_count": 12
                },
                "includes": {
                    "users": [{"id": "2244994945", "name": "Twitter Dev", "username": "TwitterDev"}]
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server);
        let space = client.fetch_space("1DXxyRYNejbKM").await.unwrap().unwrap();

        assert!(space.is_live());
        assert_eq!(space.title.as_deref(), Some("hello world"));
        assert_eq!(space.creator.unwrap().username, "TwitterDev");
        assert_eq!(space.hosts.len(), 1);
        assert_eq!(space.participant_count, Some(12));
    }

    #[tokio::test]
    async fn test_fetch_missing_space() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/2/spaces/1YqKDqWqdPLsV"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "errors": [{
                    "detail": "Could not find space with id: [1YqKDqWqdPLsV].",
                    "title": "Not Found Error"
                }]
            })))
            .mount(&server)
            .await;

        let client = test_client(&server);
        assert!(client.fetch_space("1YqKDqWqdPLsV").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_invalid_space_id_is_rejected() {
        let server = MockServer::start().await;
        let client = test_client(&server);

        let err = client.fetch_space("../users/me").await.unwrap_err();
        assert!(matches!(err.kind, birdwire_client::ErrorKind::InvalidArgument(_)));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_spaces_by_title() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/2/spaces/search"))
            .and(query_param("query", "rust"))
            .and(query_param("state", "scheduled"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [
                    {"id": "1DXxyRYNejbKM", "state": "scheduled", "title": "rust weekly"},
                    {"id": "1YqKDqWqdPLsV", "state": "scheduled", "title": "rust async"}
                ],
                "meta": {"result_count": 2}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server);
        let spaces = client
            .fetch_spaces_by_title("rust", SpaceState::Scheduled)
            .await
            .unwrap();

        assert_eq!(spaces.len(), 2);
        assert_eq!(spaces[1].title.as_deref(), Some("rust async"));
        assert!(!spaces[0].is_live());
    }

    #[tokio::test]
    async fn test_no_spaces_match() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/2/spaces/search"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"meta": {"result_count": 0}})),
            )
            .mount(&server)
            .await;

        let client = test_client(&server);
        let spaces = client
            .fetch_spaces_by_title("nothing", SpaceState::Live)
            .await
            .unwrap();
        assert!(spaces.is_empty());
    }
}
