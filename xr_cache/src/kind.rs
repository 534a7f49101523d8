use serde::{de::DeserializeOwned, Deserialize, Serialize};

use x_client::{CountResult, Granularity, SearchOrder, Tweet, User};

/// Result of a cache read. A stale record is indistinguishable from a missing one.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup<T> {
    Found(T),
    Absent,
}

impl<T> Lookup<T> {
    pub fn found(self) -> Option<T> {
        match self {
            Lookup::Found(value) => Some(value),
            Lookup::Absent => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Lookup::Found(_))
    }
}

impl<T> From<Option<T>> for Lookup<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => Lookup::Found(value),
            None => Lookup::Absent,
        }
    }
}

/// A family of cached records sharing one table and one key scheme.
pub trait CacheKind {
    const TABLE: &'static str;
    type Key: ?Sized;
    type Value: Serialize + DeserializeOwned;

    fn cache_key(key: &Self::Key) -> String;
}

pub enum Tweets {}

impl CacheKind for Tweets {
    const TABLE: &'static str = "tweets";
    type Key = u64;
    type Value = Tweet;

    fn cache_key(key: &u64) -> String {
        key.to_string()
    }
}

pub enum Users {}

impl CacheKind for Users {
    const TABLE: &'static str = "users";
    type Key = u64;
    type Value = User;

    fn cache_key(key: &u64) -> String {
        key.to_string()
    }
}

pub enum Searches {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchKey {
    pub query: String,
    pub order: SearchOrder,
}

impl SearchKey {
    pub fn new(query: &str, order: SearchOrder) -> Self {
        Self {
            query: query.to_string(),
            order,
        }
    }
}

/// A cached search stores only the ids; the tweets live in their own table.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct SearchIndex {
    pub query: String,
    pub tweet_ids: Vec<u64>,
}

impl CacheKind for Searches {
    const TABLE: &'static str = "searches";
    type Key = SearchKey;
    type Value = SearchIndex;

    fn cache_key(key: &SearchKey) -> String {
        query_key(&format!("{}:{}", normalize_query(&key.query), key.order))
    }
}

pub enum Counts {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountsKey {
    pub query: String,
    pub granularity: Granularity,
}

impl CountsKey {
    pub fn new(query: &str, granularity: Granularity) -> Self {
        Self {
            query: query.to_string(),
            granularity,
        }
    }
}

impl CacheKind for Counts {
    const TABLE: &'static str = "counts";
    type Key = CountsKey;
    type Value = CountResult;

    fn cache_key(key: &CountsKey) -> String {
        query_key(&format!("{}:{}", normalize_query(&key.query), key.granularity))
    }
}

pub const TABLES: [&str; 4] = [Tweets::TABLE, Users::TABLE, Searches::TABLE, Counts::TABLE];

pub fn normalize_query(query: &str) -> String {
    query.trim().to_lowercase()
}

/// Hex MD5 of the normalized query. Not a security boundary.
pub fn query_key(query: &str) -> String {
    format!("{:x}", md5::compute(normalize_query(query)))
}
