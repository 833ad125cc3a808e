//! Reconstruction of entity graphs from an API envelope.
//!
//! v2 responses return the requested objects under `data` and every object
//! they reference once, in flat arrays under `includes`. [`merge`] produces
//! a denormalized copy of a root object with each reference replaced by (or
//! extended with) the included object it points at.
//!
//! | Reference on the root                    | Merged field   | Looked up in |
//! |------------------------------------------|----------------|--------------|
//! | `author_id`                              | `author`       | users        |
//! | `attachments.media_keys[*]`              | `media`        | media        |
//! | `attachments.poll_ids[0]`                | `poll`         | polls        |
//! | `entities.mentions[*]`                   | `mentions`     | users        |
//! | `referenced_tweets[*].id`                | `referenced`   | tweets       |
//! | `pinned_tweet_id`                        | `pinned_tweet` | tweets       |
//! | `geo.place_id`                           | `place`        | places       |
//! | `message_create.target.recipient_id`     | `recipient`    | users        |
//! | `message_create.sender_id`               | `sender`       | users        |
//! | `creator_id`                             | `creator`      | users        |
//! | `host_ids[*]`                            | `hosts`        | users        |
//!
//! Unresolved references leave the merged field absent. Fields that are
//! already present are left alone, so merging twice is the same as merging
//! once.

use std::collections::HashMap;

use serde_json::{Map, Value};

/// Referenced tweets are merged recursively up to this depth.
const MAX_REFERENCE_DEPTH: usize = 4;

/// The `includes` section of a response, indexed for lookup.
#[derive(Debug, Clone, Default)]
pub struct Includes {
    users: HashMap<String, Value>,
    usernames: HashMap<String, String>,
    tweets: HashMap<String, Value>,
    media: HashMap<String, Value>,
    polls: HashMap<String, Value>,
    places: HashMap<String, Value>,
}

impl Includes {
    /// Index an `includes` object. Anything that is not an object yields an
    /// empty index.
    pub fn from_value(includes: &Value) -> Self {
        let mut index = Self::default();
        index.extend_users(array(includes, "users").cloned());
        index.tweets = index_by(array(includes, "tweets"), "id");
        index.media = index_by(array(includes, "media"), "media_key");
        index.polls = index_by(array(includes, "polls"), "id");
        index.places = index_by(array(includes, "places"), "id");
        index
    }

    /// Add users to the index, replacing entries with the same id.
    pub fn extend_users(&mut self, users: impl IntoIterator<Item = Value>) {
        for user in users {
            let Some(id) = string_field(&user, "id") else {
                continue;
            };
            let id = id.to_string();
            if let Some(username) = string_field(&user, "username") {
                self.usernames.insert(username.to_lowercase(), id.clone());
            }
            self.users.insert(id, user);
        }
    }

    /// Returns true when nothing was included.
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
            && self.tweets.is_empty()
            && self.media.is_empty()
            && self.polls.is_empty()
            && self.places.is_empty()
    }

    pub fn user(&self, id: &str) -> Option<&Value> {
        self.users.get(id)
    }

    /// Look up a user by handle, ignoring case.
    pub fn user_by_username(&self, username: &str) -> Option<&Value> {
        self.usernames
            .get(&username.to_lowercase())
            .and_then(|id| self.users.get(id))
    }

    pub fn tweet(&self, id: &str) -> Option<&Value> {
        self.tweets.get(id)
    }

    pub fn media(&self, media_key: &str) -> Option<&Value> {
        self.media.get(media_key)
    }

    pub fn poll(&self, id: &str) -> Option<&Value> {
        self.polls.get(id)
    }

    pub fn place(&self, id: &str) -> Option<&Value> {
        self.places.get(id)
    }
}

/// Split an API envelope into its root document and indexed includes.
///
/// v2 envelopes carry the root under `data`; v1.1 direct-message responses
/// carry it under `event`. Any other body is returned whole.
pub fn split_envelope(body: Value) -> (Value, Includes) {
    let Value::Object(mut envelope) = body else {
        return (body, Includes::default());
    };

    let includes = envelope
        .remove("includes")
        .map(|includes| Includes::from_value(&includes))
        .unwrap_or_default();

    let root = match envelope.remove("data") {
        Some(data) => data,
        None => match envelope.remove("event") {
            Some(event) => event,
            None => Value::Object(envelope),
        },
    };

    (root, includes)
}

/// Produce a denormalized copy of `root` using `includes`.
///
/// Arrays are merged element by element. Scalars come back unchanged.
pub fn merge(root: &Value, includes: &Includes) -> Value {
    merge_at_depth(root, includes, 0)
}

fn merge_at_depth(root: &Value, includes: &Includes, depth: usize) -> Value {
    match root {
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| merge_at_depth(item, includes, depth))
                .collect(),
        ),
        Value::Object(object) => {
            let mut merged = object.clone();
            merge_object(&mut merged, includes, depth);
            Value::Object(merged)
        }
        other => other.clone(),
    }
}

fn merge_object(object: &mut Map<String, Value>, includes: &Includes, depth: usize) {
    resolve(object, "author", |o| {
        let id = o.get("author_id")?.as_str()?;
        includes.user(id).cloned()
    });

    resolve(object, "media", |o| {
        let keys = o.get("attachments")?.get("media_keys")?.as_array()?;
        let media: Vec<Value> = keys
            .iter()
            .filter_map(Value::as_str)
            .filter_map(|key| includes.media(key).cloned())
            .collect();
        (!media.is_empty()).then_some(Value::Array(media))
    });

    resolve(object, "poll", |o| {
        let id = o.get("attachments")?.get("poll_ids")?.get(0)?.as_str()?;
        includes.poll(id).cloned()
    });

    resolve(object, "mentions", |o| {
        let mentions = o.get("entities")?.get("mentions")?.as_array()?;
        let users: Vec<Value> = mentions
            .iter()
            .filter_map(|mention| {
                string_field(mention, "id")
                    .and_then(|id| includes.user(id))
                    .or_else(|| {
                        string_field(mention, "username")
                            .and_then(|name| includes.user_by_username(name))
                    })
                    .cloned()
            })
            .collect();
        (!users.is_empty()).then_some(Value::Array(users))
    });

    if depth < MAX_REFERENCE_DEPTH {
        resolve(object, "referenced", |o| {
            let refs = o.get("referenced_tweets")?.as_array()?;
            let tweets: Vec<Value> = refs
                .iter()
                .filter_map(|r| string_field(r, "id"))
                .filter_map(|id| includes.tweet(id))
                .map(|tweet| merge_at_depth(tweet, includes, depth + 1))
                .collect();
            (!tweets.is_empty()).then_some(Value::Array(tweets))
        });

        resolve(object, "pinned_tweet", |o| {
            let id = o.get("pinned_tweet_id")?.as_str()?;
            includes
                .tweet(id)
                .map(|tweet| merge_at_depth(tweet, includes, depth + 1))
        });
    }

    resolve(object, "place", |o| {
        let id = o.get("geo")?.get("place_id")?.as_str()?;
        includes.place(id).cloned()
    });

    resolve(object, "creator", |o| {
        let id = o.get("creator_id")?.as_str()?;
        includes.user(id).cloned()
    });

    resolve(object, "hosts", |o| {
        let ids = o.get("host_ids")?.as_array()?;
        let users: Vec<Value> = ids
            .iter()
            .filter_map(Value::as_str)
            .filter_map(|id| includes.user(id).cloned())
            .collect();
        (!users.is_empty()).then_some(Value::Array(users))
    });

    if let Some(Value::Object(message)) = object.get_mut("message_create") {
        resolve(message, "sender", |m| {
            let id = m.get("sender_id")?.as_str()?;
            includes.user(id).cloned()
        });
        if let Some(Value::Object(target)) = message.get_mut("target") {
            resolve(target, "recipient", |t| {
                let id = t.get("recipient_id")?.as_str()?;
                includes.user(id).cloned()
            });
        }
    }
}

/// Set `field` from `lookup` unless it is already present.
fn resolve<F>(object: &mut Map<String, Value>, field: &str, lookup: F)
where
    F: FnOnce(&Map<String, Value>) -> Option<Value>,
{
    if object.contains_key(field) {
        return;
    }
    if let Some(value) = lookup(object) {
        object.insert(field.to_string(), value);
    }
}

fn array<'a>(value: &'a Value, key: &str) -> impl Iterator<Item = &'a Value> {
    value
        .get(key)
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
}

fn index_by<'a>(items: impl Iterator<Item = &'a Value>, key: &str) -> HashMap<String, Value> {
    items
        .filter_map(|item| Some((string_field(item, key)?.to_string(), item.clone())))
        .collect()
}

fn string_field<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value.get(key).and_then(Value::as_str)
}
