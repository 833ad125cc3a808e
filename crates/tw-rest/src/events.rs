//! Account-activity payload decoding.
//!
//! Account-activity deliveries are JSON objects with one event array whose
//! key names the kind of event. Delivery itself (webhooks, CRC checks) is
//! left to the application.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use birdwire_client::Result;

use crate::entities::DirectMessage;

const DIRECT_MESSAGE_EVENTS: &str = "direct_message_events";
const FOLLOW_EVENTS: &str = "follow_events";
const TYPING_EVENTS: &str = "direct_message_indicate_typing_events";

/// One decoded account-activity payload.
#[derive(Debug, Clone)]
pub enum ActivityEvent {
    DirectMessage {
        for_user_id: Option<String>,
        events: Vec<DirectMessage>,
    },
    Follow {
        for_user_id: Option<String>,
        events: Vec<FollowEvent>,
    },
    Typing {
        for_user_id: Option<String>,
        events: Vec<TypingEvent>,
    },
    /// A payload without a recognised event key, kept as delivered.
    Unknown(Value),
}

impl ActivityEvent {
    /// Decode a payload by its event key.
    pub fn from_payload(payload: Value) -> Result<Self> {
        let for_user_id = payload
            .get("for_user_id")
            .and_then(Value::as_str)
            .map(str::to_string);

        if let Some(events) = payload.get(DIRECT_MESSAGE_EVENTS) {
            return Ok(ActivityEvent::DirectMessage {
                for_user_id,
                events: Vec::<DirectMessage>::deserialize(events)?,
            });
        }
        if let Some(events) = payload.get(FOLLOW_EVENTS) {
            return Ok(ActivityEvent::Follow {
                for_user_id,
                events: Vec::<FollowEvent>::deserialize(events)?,
            });
        }
        if let Some(events) = payload.get(TYPING_EVENTS) {
            return Ok(ActivityEvent::Typing {
                for_user_id,
                events: Vec::<TypingEvent>::deserialize(events)?,
            });
        }

        Ok(ActivityEvent::Unknown(payload))
    }

    /// The key the payload was decoded from.
    pub fn kind(&self) -> &'static str {
        match self {
            ActivityEvent::DirectMessage { .. } => DIRECT_MESSAGE_EVENTS,
            ActivityEvent::Follow { .. } => FOLLOW_EVENTS,
            ActivityEvent::Typing { .. } => TYPING_EVENTS,
            ActivityEvent::Unknown(_) => "unknown",
        }
    }

    /// The subscribed account the payload was delivered for.
    pub fn for_user_id(&self) -> Option<&str> {
        match self {
            ActivityEvent::DirectMessage { for_user_id, .. }
            | ActivityEvent::Follow { for_user_id, .. }
            | ActivityEvent::Typing { for_user_id, .. } => for_user_id.as_deref(),
            ActivityEvent::Unknown(payload) => payload.get("for_user_id").and_then(Value::as_str),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FollowAction {
    Follow,
    Unfollow,
}

/// A v1.1 account summary as carried by follow events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountRef {
    pub id: String,
    #[serde(default)]
    pub screen_name: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// One account following or unfollowing another.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FollowEvent {
    #[serde(rename = "type")]
    pub action: FollowAction,
    #[serde(default)]
    pub created_timestamp: Option<String>,
    pub target: AccountRef,
    pub source: AccountRef,
}

/// A "user is typing" indicator in a conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypingEvent {
    #[serde(default)]
    pub created_timestamp: Option<String>,
    pub sender_id: String,
    pub target: TypingTarget,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypingTarget {
    pub recipient_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_direct_message_events() {
        let event = ActivityEvent::from_payload(json!({
            "for_user_id": "4337869213",
            "direct_message_events": [{
                "type": "message_create",
                "id": "954491830116155396",
                "created_timestamp": "1516403560557",
                "message_create": {
                    "target": {"recipient_id": "4337869213"},
                    "sender_id": "3001969357",
                    "message_data": {"text": "Hello World!"}
                }
            }]
        }))
        .unwrap();

        assert_eq!(event.kind(), "direct_message_events");
        assert_eq!(event.for_user_id(), Some("4337869213"));
        match event {
            ActivityEvent::DirectMessage { events, .. } => {
                assert_eq!(events.len(), 1);
                assert_eq!(events[0].text(), "Hello World!");
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_follow_events() {
        let event = ActivityEvent::from_payload(json!({
            "for_user_id": "2244994945",
            "follow_events": [{
                "type": "unfollow",
                "created_timestamp": "1517588749178",
                "target": {"id": "2244994945", "screen_name": "TwitterDev"},
                "source": {"id": "1", "screen_name": "someone"}
            }]
        }))
        .unwrap();

        match event {
            ActivityEvent::Follow { events, .. } => {
                assert_eq!(events[0].action, FollowAction::Unfollow);
                assert_eq!(events[0].target.screen_name.as_deref(), Some("TwitterDev"));
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_typing_events() {
        let event = ActivityEvent::from_payload(json!({
            "direct_message_indicate_typing_events": [{
                "created_timestamp": "1518127183443",
                "sender_id": "1",
                "target": {"recipient_id": "2"}
            }]
        }))
        .unwrap();

        assert!(event.for_user_id().is_none());
        match event {
            ActivityEvent::Typing { events, .. } => assert_eq!(events[0].target.recipient_id, "2"),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_unknown_payload_is_kept() {
        let payload = json!({"for_user_id": "1", "tweet_create_events": []});
        let event = ActivityEvent::from_payload(payload.clone()).unwrap();

        assert_eq!(event.kind(), "unknown");
        assert_eq!(event.for_user_id(), Some("1"));
        assert!(matches!(event, ActivityEvent::Unknown(p) if p == payload));
    }

    #[test]
    fn test_malformed_event_array_is_an_error() {
        let err = ActivityEvent::from_payload(json!({"follow_events": [{"type": "poke"}]}))
            .unwrap_err();
        assert!(matches!(err.kind, birdwire_client::ErrorKind::Json(_)));
    }
}
