use serde_json::{json, Value};
use tracing::{debug, instrument};

use birdwire_client::{ApiRequest, Payload, Result, API_V2};

use crate::entities::{NewStreamRule, StreamRule};

const RULES_PATH: &str = "/tweets/search/stream/rules";

impl super::TwitterClient {
    /// Rules currently attached to the filtered stream.
    #[instrument(skip(self))]
    pub async fn stream_rules(&self) -> Result<Vec<StreamRule>> {
        let request = ApiRequest::get(API_V2, RULES_PATH);
        let payload = self.client.execute(&request).await?;
        rules_from(payload)
    }

    /// Add rules to the filtered stream.
    ///
    /// A rule the API cannot parse fails the call with
    /// `ErrorKind::InvalidRule`.
    #[instrument(skip(self, rules), fields(count = rules.len()))]
    pub async fn add_stream_rules(&self, rules: &[NewStreamRule]) -> Result<Vec<StreamRule>> {
        let request = ApiRequest::post(API_V2, RULES_PATH).json(&json!({ "add": rules }))?;
        let created = rules_from(self.client.execute(&request).await?)?;
        debug!(created = created.len(), "Stream rules added");
        Ok(created)
    }

    /// Remove rules from the filtered stream by id.
    #[instrument(skip(self))]
    pub async fn delete_stream_rules(&self, rule_ids: &[String]) -> Result<()> {
        let request =
            ApiRequest::post(API_V2, RULES_PATH).json(&json!({ "delete": { "ids": rule_ids } }))?;
        self.client.execute(&request).await?;
        Ok(())
    }
}

fn rules_from(payload: Payload) -> Result<Vec<StreamRule>> {
    match payload {
        Payload::Json(mut body) => match body.get_mut("data").map(Value::take) {
            Some(data) => Ok(serde_json::from_value(data)?),
            None => Ok(Vec::new()),
        },
        _ => Ok(Vec::new()),
    }
}
