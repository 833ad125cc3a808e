//! # tw-rest
//!
//! Twitter API client with entity merging, pagination and thin endpoint
//! wrappers.
//!
//! ## Features
//!
//! - **Payload merging** - Resolve `includes` back into the objects that
//!   reference them (authors, media, polls, places, quoted tweets)
//! - **Pagination** - Lazy streams over `pagination_token`/`next_token`
//!   listings
//! - **Entity caches** - Per-client caches of users, tweets and direct
//!   messages
//! - **Account activity** - Decode account-activity payloads into
//!   [`ActivityEvent`]
//! - **Endpoints** - Users, tweets (with media upload), direct messages,
//!   Spaces, filtered-stream rules
//!
//! ## Example
//!
//! ```rust,ignore
//! use birdwire_auth::Credentials;
//! use birdwire_rest::{NewTweet, TwitterClient};
//! use futures::TryStreamExt;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), birdwire_client::Error> {
//!     let client = TwitterClient::new(Credentials::from_env()?)?;
//!
//!     // Lookup
//!     if let Some(tweet) = client.fetch_tweet("1460323737035677698").await? {
//!         println!("{} by {:?}", tweet.text, tweet.author.map(|a| a.username));
//!     }
//!
//!     // Post
//!     client.post_tweet(NewTweet::text("hello from birdwire")).await?;
//!
//!     // Search
//!     let mut results = client.search_recent("from:TwitterDev");
//!     while let Some(tweet) = results.try_next().await? {
//!         println!("{}", tweet.id);
//!     }
//!
//!     Ok(())
//! }
//! ```

mod cache;
mod client;
mod compose;
mod entities;
mod events;
mod merge;
mod pagination;

pub use cache::EntityCache;
pub use client::TwitterClient;
pub use compose::{
    CallToAction, NewMessage, NewTweet, PollSpec, QuickReply, QuickReplyOption, ReplySettings,
};
pub use entities::{
    Attachments, DirectMessage, Entities, Geo, Media, Mention, MessageAttachment, MessageCreate,
    MessageData, MessageTarget, NewStreamRule, Place, Poll, PollOption, ReferenceKind,
    ReferencedTweet, Space, SpaceState, StreamRule, Tag, Tweet, TweetPublicMetrics, TweetRef,
    UrlEntity, User, UserPublicMetrics,
};
pub use events::{AccountRef, ActivityEvent, FollowAction, FollowEvent, TypingEvent, TypingTarget};
pub use merge::{merge, split_envelope, Includes};
pub use pagination::{next_page, Cursor, Page, Paginator, TokenParam};

// Re-export the core error type for convenience
pub use birdwire_client::{Error, ErrorKind, Result};
