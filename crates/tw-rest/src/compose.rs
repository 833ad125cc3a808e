//! Builders for content the client creates.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use birdwire_client::{Error, ErrorKind, Result};
use birdwire_media::MediaFile;

/// Who may reply to a tweet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReplySettings {
    #[serde(rename = "mentionedUsers")]
    MentionedUsers,
    #[serde(rename = "following")]
    Following,
}

impl ReplySettings {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReplySettings::MentionedUsers => "mentionedUsers",
            ReplySettings::Following => "following",
        }
    }
}

/// A poll to attach to a new tweet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollSpec {
    pub options: Vec<String>,
    pub duration_minutes: u32,
}

impl PollSpec {
    pub fn new(duration_minutes: u32) -> Self {
        Self {
            options: Vec::new(),
            duration_minutes,
        }
    }

    pub fn option(mut self, label: impl Into<String>) -> Self {
        self.options.push(label.into());
        self
    }
}

/// A tweet to post.
///
/// ```rust,ignore
/// let tweet = NewTweet::text("Ship it")
///     .reply_to("1460323737035677698")
///     .reply_settings(ReplySettings::Following);
/// ```
#[derive(Debug, Clone, Default)]
pub struct NewTweet {
    text: Option<String>,
    media_ids: Vec<String>,
    file: Option<MediaFile>,
    poll: Option<PollSpec>,
    place_id: Option<String>,
    quote_tweet_id: Option<String>,
    direct_message_deep_link: Option<String>,
    reply_settings: Option<ReplySettings>,
    in_reply_to_tweet_id: Option<String>,
    exclude_reply_user_ids: Vec<String>,
    super_followers_only: bool,
}

impl NewTweet {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }

    /// Attach media that was already uploaded.
    pub fn media_id(mut self, media_id: impl Into<String>) -> Self {
        self.media_ids.push(media_id.into());
        self
    }

    /// Upload `file` before posting and attach it.
    pub fn file(mut self, file: MediaFile) -> Self {
        self.file = Some(file);
        self
    }

    pub fn poll(mut self, poll: PollSpec) -> Self {
        self.poll = Some(poll);
        self
    }

    pub fn place(mut self, place_id: impl Into<String>) -> Self {
        self.place_id = Some(place_id.into());
        self
    }

    pub fn quote(mut self, tweet_id: impl Into<String>) -> Self {
        self.quote_tweet_id = Some(tweet_id.into());
        self
    }

    pub fn direct_message_deep_link(mut self, link: impl Into<String>) -> Self {
        self.direct_message_deep_link = Some(link.into());
        self
    }

    pub fn reply_settings(mut self, settings: ReplySettings) -> Self {
        self.reply_settings = Some(settings);
        self
    }

    pub fn reply_to(mut self, tweet_id: impl Into<String>) -> Self {
        self.in_reply_to_tweet_id = Some(tweet_id.into());
        self
    }

    /// Leave a user out of the reply's mentions.
    pub fn exclude_reply_user(mut self, user_id: impl Into<String>) -> Self {
        self.exclude_reply_user_ids.push(user_id.into());
        self
    }

    pub fn super_followers_only(mut self) -> Self {
        self.super_followers_only = true;
        self
    }

    pub(crate) fn take_file(&mut self) -> Option<MediaFile> {
        self.file.take()
    }

    /// JSON body for `POST /2/tweets`.
    pub(crate) fn payload(&self, uploaded: Option<String>) -> Result<Value> {
        let mut media_ids = self.media_ids.clone();
        media_ids.extend(uploaded);

        if self.text.is_none() && media_ids.is_empty() {
            return Err(Error::new(ErrorKind::InvalidArgument(
                "a tweet needs text or media".to_string(),
            )));
        }
        if let Some(poll) = &self.poll {
            if !media_ids.is_empty() {
                return Err(Error::new(ErrorKind::InvalidArgument(
                    "a tweet cannot carry both a poll and media".to_string(),
                )));
            }
            if poll.options.len() < 2 {
                return Err(Error::new(ErrorKind::InvalidArgument(
                    "a poll needs at least two options".to_string(),
                )));
            }
        }

        let mut body = Map::new();
        if let Some(text) = &self.text {
            body.insert("text".into(), json!(text));
        }
        if !media_ids.is_empty() {
            body.insert("media".into(), json!({ "media_ids": media_ids }));
        }
        if let Some(poll) = &self.poll {
            body.insert(
                "poll".into(),
                json!({
                    "options": poll.options,
                    "duration_minutes": poll.duration_minutes,
                }),
            );
        }
        if let Some(place_id) = &self.place_id {
            body.insert("geo".into(), json!({ "place_id": place_id }));
        }
        if let Some(quote) = &self.quote_tweet_id {
            body.insert("quote_tweet_id".into(), json!(quote));
        }
        if let Some(link) = &self.direct_message_deep_link {
            body.insert("direct_message_deep_link".into(), json!(link));
        }
        if let Some(settings) = self.reply_settings {
            body.insert("reply_settings".into(), json!(settings.as_str()));
        }
        if let Some(reply_to) = &self.in_reply_to_tweet_id {
            let mut reply = json!({ "in_reply_to_tweet_id": reply_to });
            if !self.exclude_reply_user_ids.is_empty() {
                reply["exclude_reply_user_ids"] = json!(self.exclude_reply_user_ids);
            }
            body.insert("reply".into(), reply);
        }
        if self.super_followers_only {
            body.insert("for_super_followers_only".into(), json!(true));
        }

        Ok(Value::Object(body))
    }
}

/// One choice offered by a quick reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuickReplyOption {
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<String>,
}

impl QuickReplyOption {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            description: None,
            metadata: None,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Opaque value echoed back in the recipient's answer.
    pub fn metadata(mut self, metadata: impl Into<String>) -> Self {
        self.metadata = Some(metadata.into());
        self
    }
}

/// Options the recipient can answer a direct message with.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuickReply {
    pub options: Vec<QuickReplyOption>,
}

impl QuickReply {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn option(mut self, option: QuickReplyOption) -> Self {
        self.options.push(option);
        self
    }
}

/// A link button under a direct message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallToAction {
    pub label: String,
    pub url: String,
}

impl CallToAction {
    pub fn new(label: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            url: url.into(),
        }
    }
}

/// Most buttons a direct message can carry.
const MAX_CTAS: usize = 3;

/// A direct message to send.
///
/// ```rust,ignore
/// let message = NewMessage::text("Pick one")
///     .quick_reply(QuickReply::new().option(QuickReplyOption::new("Red")))
///     .cta(CallToAction::new("Docs", "https://developer.twitter.com"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct NewMessage {
    text: String,
    file: Option<MediaFile>,
    custom_profile_id: Option<String>,
    quick_reply: Option<QuickReply>,
    ctas: Vec<CallToAction>,
}

impl NewMessage {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// Upload `file` as DM-only media and attach it.
    pub fn file(mut self, file: MediaFile) -> Self {
        self.file = Some(file);
        self
    }

    /// Send under a custom profile instead of the account's own.
    pub fn custom_profile(mut self, profile_id: impl Into<String>) -> Self {
        self.custom_profile_id = Some(profile_id.into());
        self
    }

    pub fn quick_reply(mut self, quick_reply: QuickReply) -> Self {
        self.quick_reply = Some(quick_reply);
        self
    }

    pub fn cta(mut self, cta: CallToAction) -> Self {
        self.ctas.push(cta);
        self
    }

    pub(crate) fn take_file(&mut self) -> Option<MediaFile> {
        self.file.take()
    }

    /// JSON body for `POST /1.1/direct_messages/events/new.json`.
    pub(crate) fn payload(&self, recipient_id: &str, uploaded: Option<String>) -> Result<Value> {
        if self.ctas.len() > MAX_CTAS {
            return Err(Error::new(ErrorKind::InvalidArgument(format!(
                "a direct message takes at most {MAX_CTAS} buttons"
            ))));
        }

        let mut message_data = Map::new();
        message_data.insert("text".into(), json!(self.text));
        if let Some(media_id) = uploaded {
            message_data.insert(
                "attachment".into(),
                json!({ "type": "media", "media": { "id": media_id } }),
            );
        }
        if let Some(profile_id) = &self.custom_profile_id {
            message_data.insert("custom_profile_id".into(), json!(profile_id));
        }
        if let Some(quick_reply) = &self.quick_reply {
            if quick_reply.options.is_empty() {
                return Err(Error::new(ErrorKind::InvalidArgument(
                    "a quick reply needs at least one option".to_string(),
                )));
            }
            message_data.insert(
                "quick_reply".into(),
                json!({ "type": "options", "options": quick_reply.options }),
            );
        }
        if !self.ctas.is_empty() {
            let ctas: Vec<Value> = self
                .ctas
                .iter()
                .map(|cta| json!({ "type": "web_url", "label": cta.label, "url": cta.url }))
                .collect();
            message_data.insert("ctas".into(), json!(ctas));
        }

        Ok(json!({
            "event": {
                "type": "message_create",
                "message_create": {
                    "target": { "recipient_id": recipient_id },
                    "message_data": message_data,
                }
            }
        }))
    }
}
