mod counts;
mod error;
mod follow;
mod search;
mod thread;
mod timeline;
mod tweet;
mod user;

use std::time::Duration;

use x_client::XClient;
use xr_cache::CacheStore;

pub use counts::fetch_counts;
pub use error::*;
pub use follow::{fetch_followers, fetch_following, Follows};
pub use search::{build_query, fetch_search, SearchOptions};
pub use thread::{fetch_thread, Thread};
pub use timeline::{fetch_mentions, fetch_timeline, Timeline, TimelineOptions};
pub use tweet::{fetch_article, fetch_tweet};
pub use user::fetch_user;

/// Maximum age per record kind. Checked at read time, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ttls {
    pub tweets: Duration,
    pub users: Duration,
    pub searches: Duration,
    pub counts: Duration,
}

impl Default for Ttls {
    fn default() -> Self {
        Self {
            tweets: Duration::from_secs(7 * 86_400),
            users: Duration::from_secs(86_400),
            searches: Duration::from_secs(3_600),
            counts: Duration::from_secs(3_600),
        }
    }
}

/// Everything an orchestrator needs for one invocation.
#[derive(Debug)]
pub struct FetchContext<'a> {
    pub client: &'a XClient,
    pub cache: &'a mut CacheStore,
    pub ttl: Ttls,
}

impl<'a> FetchContext<'a> {
    pub fn new(client: &'a XClient, cache: &'a mut CacheStore, ttl: Ttls) -> Self {
        Self { client, cache, ttl }
    }
}
