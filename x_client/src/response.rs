use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr, VecSkipError};

use std::collections::HashMap;

// Envelope

/// Every v2 response is `{data, includes, meta}` or `{errors}`.
#[derive(Deserialize, Debug)]
pub struct Envelope<D> {
    pub data: Option<D>,
    #[serde(default)]
    pub includes: Includes,
    #[serde(default)]
    pub meta: Meta,
    #[serde(default)]
    pub errors: Vec<Problem>,
}

impl<D> Envelope<D> {
    /// Lookup table for expanded authors, keyed by user ID.
    pub fn users_by_id(&self) -> HashMap<u64, &UserData> {
        self.includes.users.iter().map(|u| (u.id, u)).collect()
    }

    /// Detail of the first reported problem.
    pub fn problem(&self) -> Option<String> {
        self.errors
            .first()
            .map(|p| p.detail.clone().or_else(|| p.title.clone()).unwrap_or_else(|| "Unknown error".to_string()))
    }
}

#[serde_as]
#[derive(Deserialize, Debug, Default)]
pub struct Includes {
    #[serde_as(as = "VecSkipError<_>")]
    #[serde(default)]
    pub users: Vec<UserData>,
}

#[serde_as]
#[derive(Deserialize, Debug, Default)]
pub struct Meta {
    pub result_count: Option<u32>,
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub newest_id: Option<u64>,
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub oldest_id: Option<u64>,
    pub next_token: Option<String>,
    pub total_tweet_count: Option<u64>,
}

#[derive(Deserialize, Debug)]
pub struct Problem {
    pub title: Option<String>,
    pub detail: Option<String>,
}

// Tweet

#[serde_as]
#[derive(Deserialize, Debug, Clone)]
pub struct TweetData {
    #[serde_as(as = "DisplayFromStr")]
    pub id: u64,
    #[serde(default)]
    pub text: String,
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub author_id: Option<u64>,
    pub created_at: Option<DateTime<Utc>>,
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub conversation_id: Option<u64>,
    #[serde(default)]
    pub public_metrics: TweetMetrics,
    pub note_tweet: Option<NoteTweet>,
    #[serde(default)]
    pub referenced_tweets: Vec<ReferencedTweet>,
    #[serde(default)]
    pub entities: Entities,
    pub article: Option<ArticleData>,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct TweetMetrics {
    pub like_count: u64,
    pub retweet_count: u64,
    pub reply_count: u64,
    pub quote_count: u64,
    pub bookmark_count: u64,
    pub impression_count: u64,
}

#[derive(Deserialize, Debug, Clone)]
pub struct NoteTweet {
    #[serde(default)]
    pub text: String,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct ArticleData {
    pub title: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub image_url: Option<String>,
}

// Entities, shared by wire and normalized tweets

#[serde_as]
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ReferencedTweet {
    /// `replied_to`, `quoted` or `retweeted`.
    #[serde(rename = "type")]
    pub type_: String,
    #[serde_as(as = "DisplayFromStr")]
    pub id: u64,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct Entities {
    pub urls: Vec<UrlEntity>,
    pub hashtags: Vec<HashtagEntity>,
    pub mentions: Vec<MentionEntity>,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct UrlEntity {
    pub start: u32,
    pub end: u32,
    pub url: String,
    pub expanded_url: Option<String>,
    pub display_url: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct HashtagEntity {
    pub start: u32,
    pub end: u32,
    pub tag: String,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct MentionEntity {
    pub start: u32,
    pub end: u32,
    pub username: String,
}

// User

#[serde_as]
#[derive(Deserialize, Debug, Clone)]
pub struct UserData {
    #[serde_as(as = "DisplayFromStr")]
    pub id: u64,
    pub username: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub verified: bool,
    #[serde(default)]
    pub public_metrics: UserMetrics,
    pub profile_image_url: Option<String>,
    pub url: Option<String>,
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub pinned_tweet_id: Option<u64>,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct UserMetrics {
    pub followers_count: u64,
    pub following_count: u64,
    pub tweet_count: u64,
    pub listed_count: u64,
    pub like_count: u64,
    pub media_count: u64,
}

// Counts

#[derive(Deserialize, Debug, Clone)]
pub struct CountData {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub tweet_count: u64,
}
