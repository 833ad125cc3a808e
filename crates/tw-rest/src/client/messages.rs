use serde_json::Value;
use tracing::{debug, instrument};

use birdwire_client::{ApiRequest, Error, ErrorKind, Result, API_V1_1};

use super::validate_id;
use crate::compose::NewMessage;
use crate::entities::DirectMessage;
use crate::events::ActivityEvent;
use crate::merge::{merge, split_envelope};

impl super::TwitterClient {
    /// Send a direct message, uploading its file as DM-only media first.
    ///
    /// The recipient is looked up and attached to the returned message.
    #[instrument(skip(self, message))]
    pub async fn send_message(
        &self,
        recipient_id: &str,
        mut message: NewMessage,
    ) -> Result<DirectMessage> {
        validate_id(recipient_id, "recipient id")?;

        let uploaded = match message.take_file() {
            Some(file) => Some(self.uploader.upload(&file.dm_only(true)).await?.media_id),
            None => None,
        };
        let body = message.payload(recipient_id, uploaded)?;
        let request = ApiRequest::post(API_V1_1, "/direct_messages/events/new.json")
            .json_value(body)
            .oauth1();

        let response = self.client.execute(&request).await?.into_json()?;
        let message = self.resolve_message(response).await?;
        debug!(message_id = %message.id, "Direct message sent");
        Ok(message)
    }

    /// Look up a direct message event by id.
    #[instrument(skip(self))]
    pub async fn fetch_message(&self, event_id: &str) -> Result<DirectMessage> {
        validate_id(event_id, "event id")?;

        let request = ApiRequest::get(API_V1_1, "/direct_messages/events/show.json")
            .query("id", event_id)
            .oauth1();

        let response = self.client.execute(&request).await?.into_json()?;
        self.resolve_message(response).await
    }

    /// A direct message previously sent, fetched or received by this client.
    pub fn cached_message(&self, event_id: &str) -> Option<DirectMessage> {
        self.messages.get(event_id)
    }

    /// Decode an account-activity payload, caching any direct messages it
    /// carries.
    pub fn ingest_activity(&self, payload: Value) -> Result<ActivityEvent> {
        let event = ActivityEvent::from_payload(payload)?;
        if let ActivityEvent::DirectMessage { events, .. } = &event {
            for message in events {
                self.messages.insert(message.id.clone(), message.clone());
            }
        }
        Ok(event)
    }

    /// Attach the recipient to a message envelope, decode and cache it.
    async fn resolve_message(&self, response: Value) -> Result<DirectMessage> {
        let (event, mut includes) = split_envelope(response);

        let recipient_id = event["message_create"]["target"]["recipient_id"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| {
                Error::new(ErrorKind::MalformedResponse(
                    "direct message event has no recipient".to_string(),
                ))
            })?;

        if includes.user(&recipient_id).is_none() {
            if let Some(recipient) = self.fetch_user(&recipient_id).await? {
                includes.extend_users([serde_json::to_value(recipient)?]);
            }
        }

        let message: DirectMessage = serde_json::from_value(merge(&event, &includes))?;
        self.messages.insert(message.id.clone(), message.clone());
        Ok(message)
    }
}
