use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};

use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use crate::error::Error;
use crate::response::{self, CountData, Envelope, TweetData, UserData};
pub use crate::response::{Entities, HashtagEntity, MentionEntity, ReferencedTweet, UrlEntity};

#[serde_as]
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
pub struct Tweet {
    #[serde_as(as = "DisplayFromStr")]
    pub id: u64,
    pub text: String,
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub author_id: Option<u64>,
    pub username: String,
    pub author_name: String,
    pub created_at: Option<DateTime<Utc>>,
    pub likes: u64,
    pub retweets: u64,
    pub replies: u64,
    pub quotes: u64,
    pub bookmarks: u64,
    pub impressions: u64,
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub conversation_id: Option<u64>,
    #[serde(default)]
    pub referenced_tweets: Vec<ReferencedTweet>,
    #[serde(default)]
    pub entities: Entities,
    pub article: Option<ArticleMetadata>,
    pub url: String,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct ArticleMetadata {
    pub title: String,
    pub description: String,
    pub url: Option<String>,
    pub image_url: Option<String>,
}

#[serde_as]
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
pub struct User {
    #[serde_as(as = "DisplayFromStr")]
    pub id: u64,
    pub username: String,
    pub name: String,
    pub description: String,
    pub created_at: Option<DateTime<Utc>>,
    pub verified: bool,
    pub followers: u64,
    pub following: u64,
    pub tweet_count: u64,
    pub listed_count: u64,
    pub like_count: u64,
    pub media_count: u64,
    pub profile_image_url: Option<String>,
    pub url: Option<String>,
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub pinned_tweet_id: Option<u64>,
}

/// One page of tweets from a listing endpoint.
#[derive(Debug, Clone, Default)]
pub struct TweetPage {
    pub tweets: Vec<Tweet>,
    pub meta: PageMeta,
}

/// One page of users from a followers/following listing.
#[derive(Debug, Clone, Default)]
pub struct UserPage {
    pub users: Vec<User>,
    pub meta: PageMeta,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageMeta {
    pub result_count: Option<u32>,
    pub newest_id: Option<u64>,
    pub oldest_id: Option<u64>,
    pub next_token: Option<String>,
}

#[serde_as]
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct SearchResult {
    pub query: String,
    pub tweets: Vec<Tweet>,
    pub total: u32,
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub newest_id: Option<u64>,
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub oldest_id: Option<u64>,
    pub next_token: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct CountBucket {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub count: u64,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct CountResult {
    pub query: String,
    pub granularity: Granularity,
    pub buckets: Vec<CountBucket>,
    pub total: u64,
}

#[serde_as]
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct Article {
    #[serde_as(as = "DisplayFromStr")]
    pub id: u64,
    pub title: String,
    pub description: String,
    pub url: String,
    pub text: String,
    pub image_url: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub author_id: Option<u64>,
    pub username: String,
    pub author_name: String,
    pub likes: u64,
    pub retweets: u64,
    pub replies: u64,
    pub quotes: u64,
    pub bookmarks: u64,
    pub impressions: u64,
    pub has_article_metadata: bool,
}

// MARK: Request options

#[derive(Deserialize, Serialize, Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SearchOrder {
    #[default]
    Recency,
    Relevancy,
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Minute,
    Hour,
    #[default]
    Day,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exclude {
    Retweets,
    Replies,
}

impl Display for SearchOrder {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            SearchOrder::Recency => write!(f, "recency"),
            SearchOrder::Relevancy => write!(f, "relevancy"),
        }
    }
}

impl FromStr for SearchOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "recency" => Ok(SearchOrder::Recency),
            "relevancy" => Ok(SearchOrder::Relevancy),
            _ => Err(format!("unknown sort order `{}` (expected recency or relevancy)", s)),
        }
    }
}

impl Display for Granularity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Granularity::Minute => write!(f, "minute"),
            Granularity::Hour => write!(f, "hour"),
            Granularity::Day => write!(f, "day"),
        }
    }
}

impl FromStr for Granularity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "minute" => Ok(Granularity::Minute),
            "hour" => Ok(Granularity::Hour),
            "day" => Ok(Granularity::Day),
            _ => Err(format!("unknown granularity `{}` (expected minute, hour or day)", s)),
        }
    }
}

impl Display for Exclude {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Exclude::Retweets => write!(f, "retweets"),
            Exclude::Replies => write!(f, "replies"),
        }
    }
}

// MARK: Helpers

fn format_date(created_at: Option<DateTime<Utc>>, format: &str) -> String {
    created_at
        .map(|dt| dt.format(format).to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

impl Tweet {
    pub fn date(&self) -> String {
        format_date(self.created_at, "%Y-%m-%d")
    }

    pub fn datetime_str(&self) -> String {
        format_date(self.created_at, "%Y-%m-%d %H:%M UTC")
    }
}

impl User {
    pub fn profile_url(&self) -> String {
        format!("https://x.com/{}", self.username)
    }
}

impl Article {
    pub fn date(&self) -> String {
        format_date(self.created_at, "%Y-%m-%d")
    }
}

// MARK: Conversions

impl Tweet {
    pub(crate) fn from_data(tweet: TweetData, users: &HashMap<u64, &UserData>) -> Self {
        let author = tweet.author_id.and_then(|id| users.get(&id).copied());
        let username = author.map(|u| u.username.clone()).unwrap_or_else(|| "unknown".to_string());
        let author_name = author.map(|u| u.name.clone()).unwrap_or_else(|| "Unknown".to_string());
        // Long posts carry their full text in `note_tweet`
        let text = match tweet.note_tweet {
            Some(note) if !note.text.is_empty() => note.text,
            _ => tweet.text,
        };
        let metrics = tweet.public_metrics;
        Tweet {
            id: tweet.id,
            text,
            author_id: tweet.author_id,
            url: format!("https://x.com/{}/status/{}", username, tweet.id),
            username,
            author_name,
            created_at: tweet.created_at,
            likes: metrics.like_count,
            retweets: metrics.retweet_count,
            replies: metrics.reply_count,
            quotes: metrics.quote_count,
            bookmarks: metrics.bookmark_count,
            impressions: metrics.impression_count,
            conversation_id: tweet.conversation_id,
            referenced_tweets: tweet.referenced_tweets,
            entities: tweet.entities,
            article: tweet.article.map(ArticleMetadata::from),
        }
    }
}

impl From<response::ArticleData> for ArticleMetadata {
    fn from(article: response::ArticleData) -> Self {
        ArticleMetadata {
            title: article.title.unwrap_or_default(),
            description: article.description.unwrap_or_default(),
            url: article.url,
            image_url: article.image_url,
        }
    }
}

impl From<UserData> for User {
    fn from(user: UserData) -> Self {
        let metrics = user.public_metrics;
        User {
            id: user.id,
            username: user.username,
            name: user.name,
            description: user.description,
            created_at: user.created_at,
            verified: user.verified,
            followers: metrics.followers_count,
            following: metrics.following_count,
            tweet_count: metrics.tweet_count,
            listed_count: metrics.listed_count,
            like_count: metrics.like_count,
            media_count: metrics.media_count,
            profile_image_url: user.profile_image_url,
            url: user.url,
            pinned_tweet_id: user.pinned_tweet_id,
        }
    }
}

impl From<&Tweet> for Article {
    fn from(tweet: &Tweet) -> Self {
        let metadata = tweet.article.clone().unwrap_or_default();
        let extracted_url = tweet
            .entities
            .urls
            .first()
            .and_then(|u| u.expanded_url.clone())
            .unwrap_or_default();
        Article {
            id: tweet.id,
            title: metadata.title,
            description: metadata.description,
            url: metadata.url.unwrap_or(extracted_url),
            text: tweet.text.clone(),
            image_url: metadata.image_url,
            created_at: tweet.created_at,
            author_id: tweet.author_id,
            username: tweet.username.clone(),
            author_name: tweet.author_name.clone(),
            likes: tweet.likes,
            retweets: tweet.retweets,
            replies: tweet.replies,
            quotes: tweet.quotes,
            bookmarks: tweet.bookmarks,
            impressions: tweet.impressions,
            has_article_metadata: tweet.article.is_some(),
        }
    }
}

impl From<response::Meta> for PageMeta {
    fn from(meta: response::Meta) -> Self {
        PageMeta {
            result_count: meta.result_count,
            newest_id: meta.newest_id,
            oldest_id: meta.oldest_id,
            next_token: meta.next_token,
        }
    }
}

impl TryFrom<Envelope<TweetData>> for Tweet {
    type Error = Error;

    fn try_from(mut value: Envelope<TweetData>) -> Result<Self, Self::Error> {
        let Some(data) = value.data.take() else {
            return Err(Error::EmptyResponse(
                value.problem().unwrap_or_else(|| "no tweet data".to_string()),
            ));
        };
        Ok(Tweet::from_data(data, &value.users_by_id()))
    }
}

impl TryFrom<Envelope<UserData>> for User {
    type Error = Error;

    fn try_from(value: Envelope<UserData>) -> Result<Self, Self::Error> {
        let problem = value.problem();
        value
            .data
            .map(User::from)
            .ok_or_else(|| Error::EmptyResponse(problem.unwrap_or_else(|| "no user data".to_string())))
    }
}

impl TryFrom<Envelope<Vec<TweetData>>> for TweetPage {
    type Error = Error;

    fn try_from(mut value: Envelope<Vec<TweetData>>) -> Result<Self, Self::Error> {
        // An empty listing has no `data` and no `errors`
        let data = match value.data.take() {
            Some(data) => data,
            None => match value.problem() {
                Some(problem) => return Err(Error::EmptyResponse(problem)),
                None => Vec::new(),
            },
        };
        let users = value.users_by_id();
        let tweets = data.into_iter().map(|t| Tweet::from_data(t, &users)).collect();
        Ok(TweetPage {
            tweets,
            meta: std::mem::take(&mut value.meta).into(),
        })
    }
}

impl TryFrom<Envelope<Vec<UserData>>> for UserPage {
    type Error = Error;

    fn try_from(value: Envelope<Vec<UserData>>) -> Result<Self, Self::Error> {
        let users = match value.data {
            Some(data) => data.into_iter().map(User::from).collect(),
            None => match value.problem() {
                Some(problem) => return Err(Error::EmptyResponse(problem)),
                None => Vec::new(),
            },
        };
        Ok(UserPage {
            users,
            meta: value.meta.into(),
        })
    }
}

/// Buckets in API order plus the reported total, or the bucket sum when absent.
pub(crate) fn count_buckets(value: Envelope<Vec<CountData>>) -> Result<(Vec<CountBucket>, u64), Error> {
    let data = match value.data {
        Some(data) => data,
        None => match value.problem() {
            Some(problem) => return Err(Error::EmptyResponse(problem)),
            None => Vec::new(),
        },
    };
    let buckets: Vec<CountBucket> = data
        .into_iter()
        .map(|b| CountBucket {
            start: b.start,
            end: b.end,
            count: b.tweet_count,
        })
        .collect();
    let total = value
        .meta
        .total_tweet_count
        .unwrap_or_else(|| buckets.iter().map(|b| b.count).sum());
    Ok((buckets, total))
}
