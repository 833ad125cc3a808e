//! Typed views over merged API payloads.
//!
//! Every type deserializes from the output of [`crate::merge`], so the
//! resolved fields (`author`, `media`, `poll` ...) are populated whenever
//! the response included them and default to empty otherwise.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// Tweets
// ─────────────────────────────────────────────────────────────────────────────

/// A tweet, with its references resolved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tweet {
    pub id: String,

    #[serde(default)]
    pub text: String,

    #[serde(default)]
    pub author_id: Option<String>,

    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub conversation_id: Option<String>,

    #[serde(default)]
    pub in_reply_to_user_id: Option<String>,

    #[serde(default)]
    pub lang: Option<String>,

    #[serde(default)]
    pub possibly_sensitive: Option<bool>,

    #[serde(default)]
    pub reply_settings: Option<String>,

    #[serde(default)]
    pub source: Option<String>,

    #[serde(default)]
    pub public_metrics: Option<TweetPublicMetrics>,

    #[serde(default)]
    pub attachments: Option<Attachments>,

    #[serde(default)]
    pub entities: Option<Entities>,

    #[serde(default)]
    pub referenced_tweets: Vec<ReferencedTweet>,

    #[serde(default)]
    pub geo: Option<Geo>,

    /// Resolved from `author_id`.
    #[serde(default)]
    pub author: Option<User>,

    /// Resolved from `attachments.media_keys`, in attachment order.
    #[serde(default)]
    pub media: Vec<Media>,

    /// Resolved from `attachments.poll_ids`.
    #[serde(default)]
    pub poll: Option<Poll>,

    /// Resolved from `entities.mentions`.
    #[serde(default)]
    pub mentions: Vec<User>,

    /// Resolved from `referenced_tweets`, each merged in turn.
    #[serde(default)]
    pub referenced: Vec<Tweet>,

    /// Resolved from `geo.place_id`.
    #[serde(default)]
    pub place: Option<Place>,
}

impl Tweet {
    /// The resolved tweet this one references with the given relation.
    pub fn reference(&self, kind: ReferenceKind) -> Option<&Tweet> {
        let id = self
            .referenced_tweets
            .iter()
            .find(|r| r.kind == kind)
            .map(|r| r.id.as_str())?;
        self.referenced.iter().find(|t| t.id == id)
    }

    /// The tweet this one quotes, if it was included.
    pub fn quoted(&self) -> Option<&Tweet> {
        self.reference(ReferenceKind::Quoted)
    }

    /// The tweet this one replies to, if it was included.
    pub fn replied_to(&self) -> Option<&Tweet> {
        self.reference(ReferenceKind::RepliedTo)
    }

    /// Returns true if this tweet is a retweet.
    pub fn is_retweet(&self) -> bool {
        self.referenced_tweets
            .iter()
            .any(|r| r.kind == ReferenceKind::Retweeted)
    }

    /// Link to the tweet on the web.
    pub fn url(&self) -> String {
        match self.author.as_ref() {
            Some(author) => format!("https://twitter.com/{}/status/{}", author.username, self.id),
            None => format!("https://twitter.com/i/web/status/{}", self.id),
        }
    }
}

/// Engagement counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TweetPublicMetrics {
    #[serde(default)]
    pub retweet_count: u64,
    #[serde(default)]
    pub reply_count: u64,
    #[serde(default)]
    pub like_count: u64,
    #[serde(default)]
    pub quote_count: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Attachments {
    #[serde(default)]
    pub media_keys: Vec<String>,
    #[serde(default)]
    pub poll_ids: Vec<String>,
}

/// How a tweet relates to one it references.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceKind {
    Retweeted,
    Quoted,
    RepliedTo,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferencedTweet {
    #[serde(rename = "type")]
    pub kind: ReferenceKind,
    pub id: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Geo {
    #[serde(default)]
    pub place_id: Option<String>,
}

/// Hashtags, mentions and links found in the text.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Entities {
    #[serde(default)]
    pub hashtags: Vec<Tag>,
    #[serde(default)]
    pub cashtags: Vec<Tag>,
    #[serde(default)]
    pub mentions: Vec<Mention>,
    #[serde(default)]
    pub urls: Vec<UrlEntity>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tag {
    pub tag: String,
    pub start: u32,
    pub end: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mention {
    pub username: String,
    pub start: u32,
    pub end: u32,
    #[serde(default)]
    pub id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UrlEntity {
    pub url: String,
    pub start: u32,
    pub end: u32,
    #[serde(default)]
    pub expanded_url: Option<String>,
    #[serde(default)]
    pub display_url: Option<String>,
    #[serde(default)]
    pub media_key: Option<String>,
}

/// The id and text the API returns for a created tweet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TweetRef {
    pub id: String,
    #[serde(default)]
    pub text: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// Users
// ─────────────────────────────────────────────────────────────────────────────

/// A user account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,

    #[serde(default)]
    pub name: String,

    /// Handle without the leading `@`.
    pub username: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub profile_image_url: Option<String>,

    #[serde(default)]
    pub location: Option<String>,

    #[serde(default)]
    pub url: Option<String>,

    #[serde(default)]
    pub verified: Option<bool>,

    #[serde(default)]
    pub protected: Option<bool>,

    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub public_metrics: Option<UserPublicMetrics>,

    #[serde(default)]
    pub pinned_tweet_id: Option<String>,

    /// Resolved from `pinned_tweet_id`.
    #[serde(default)]
    pub pinned_tweet: Option<Box<Tweet>>,
}

impl User {
    /// `@handle`.
    pub fn mention(&self) -> String {
        format!("@{}", self.username)
    }

    /// Link to the profile on the web.
    pub fn profile_url(&self) -> String {
        format!("https://twitter.com/{}", self.username)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPublicMetrics {
    #[serde(default)]
    pub followers_count: u64,
    #[serde(default)]
    pub following_count: u64,
    #[serde(default)]
    pub tweet_count: u64,
    #[serde(default)]
    pub listed_count: u64,
}

// ─────────────────────────────────────────────────────────────────────────────
// Media, polls, places
// ─────────────────────────────────────────────────────────────────────────────

/// Attached media.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Media {
    pub media_key: String,

    /// `photo`, `video` or `animated_gif`.
    #[serde(rename = "type")]
    pub media_type: String,

    #[serde(default)]
    pub url: Option<String>,

    #[serde(default)]
    pub preview_image_url: Option<String>,

    #[serde(default)]
    pub width: Option<u32>,

    #[serde(default)]
    pub height: Option<u32>,

    #[serde(default)]
    pub duration_ms: Option<u64>,

    #[serde(default)]
    pub alt_text: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Poll {
    pub id: String,

    #[serde(default)]
    pub options: Vec<PollOption>,

    #[serde(default)]
    pub duration_minutes: Option<u32>,

    #[serde(default)]
    pub end_datetime: Option<DateTime<Utc>>,

    /// `open` or `closed`.
    #[serde(default)]
    pub voting_status: Option<String>,
}

impl Poll {
    /// Returns true while votes are accepted.
    pub fn is_open(&self) -> bool {
        self.voting_status.as_deref() == Some("open")
    }

    /// Votes across all options.
    pub fn total_votes(&self) -> u64 {
        self.options.iter().map(|o| o.votes).sum()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollOption {
    pub position: u32,
    pub label: String,
    #[serde(default)]
    pub votes: u64,
}

/// A tagged location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Place {
    pub id: String,

    #[serde(default)]
    pub full_name: String,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub country: Option<String>,

    #[serde(default)]
    pub country_code: Option<String>,

    #[serde(default)]
    pub place_type: Option<String>,

    #[serde(default)]
    pub geo: Option<serde_json::Value>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Direct messages
// ─────────────────────────────────────────────────────────────────────────────

/// A direct message event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectMessage {
    pub id: String,

    /// `message_create` for messages.
    #[serde(rename = "type", default)]
    pub kind: String,

    /// Milliseconds since the epoch, as a string.
    #[serde(default)]
    pub created_timestamp: Option<String>,

    pub message_create: MessageCreate,
}

impl DirectMessage {
    pub fn text(&self) -> &str {
        &self.message_create.message_data.text
    }

    pub fn recipient_id(&self) -> &str {
        &self.message_create.target.recipient_id
    }

    /// The resolved recipient, when it has been fetched.
    pub fn recipient(&self) -> Option<&User> {
        self.message_create.target.recipient.as_ref()
    }

    /// When the message was sent.
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        let millis = self.created_timestamp.as_deref()?.parse::<i64>().ok()?;
        DateTime::from_timestamp_millis(millis)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageCreate {
    pub target: MessageTarget,

    #[serde(default)]
    pub sender_id: Option<String>,

    /// Resolved from `sender_id`.
    #[serde(default)]
    pub sender: Option<User>,

    pub message_data: MessageData,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageTarget {
    pub recipient_id: String,

    /// Resolved from `recipient_id`.
    #[serde(default)]
    pub recipient: Option<User>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageData {
    #[serde(default)]
    pub text: String,

    #[serde(default)]
    pub attachment: Option<MessageAttachment>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageAttachment {
    #[serde(rename = "type")]
    pub kind: String,
    pub media: serde_json::Value,
}

// ─────────────────────────────────────────────────────────────────────────────
// Spaces
// ─────────────────────────────────────────────────────────────────────────────

/// Lifecycle state of a Space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpaceState {
    Live,
    Scheduled,
    Ended,
    #[serde(other)]
    Unknown,
}

impl SpaceState {
    /// Value of the `state` filter on Space search.
    pub fn as_str(&self) -> &'static str {
        match self {
            SpaceState::Live => "live",
            SpaceState::Scheduled => "scheduled",
            SpaceState::Ended => "ended",
            SpaceState::Unknown => "all",
        }
    }
}

/// A live audio conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Space {
    pub id: String,

    pub state: SpaceState,

    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub creator_id: Option<String>,

    #[serde(default)]
    pub host_ids: Vec<String>,

    #[serde(default)]
    pub speaker_ids: Vec<String>,

    #[serde(default)]
    pub lang: Option<String>,

    #[serde(default)]
    pub participant_count: Option<u64>,

    #[serde(default)]
    pub is_ticketed: bool,

    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub scheduled_start: Option<DateTime<Utc>>,

    #[serde(default)]
    pub ended_at: Option<DateTime<Utc>>,

    /// Resolved from `creator_id`.
    #[serde(default)]
    pub creator: Option<User>,

    /// Resolved from `host_ids`.
    #[serde(default)]
    pub hosts: Vec<User>,
}

impl Space {
    pub fn is_live(&self) -> bool {
        self.state == SpaceState::Live
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Filtered stream rules
// ─────────────────────────────────────────────────────────────────────────────

/// A filtered-stream rule as stored by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamRule {
    pub id: String,
    pub value: String,
    #[serde(default)]
    pub tag: Option<String>,
}

/// A rule to add to the filtered stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewStreamRule {
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
}

impl NewStreamRule {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            tag: None,
        }
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }
}
