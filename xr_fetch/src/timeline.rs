use serde::Serialize;

use x_client::{Exclude, Tweet, User, LIST_MAX_RESULTS, LIST_MIN_RESULTS};
use xr_cache::Tweets;

use crate::user::fetch_user;
use crate::{FetchContext, Result};

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Timeline {
    pub user: User,
    pub tweets: Vec<Tweet>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimelineOptions {
    pub max_results: u32,
    pub exclude: Vec<Exclude>,
    /// Most liked first. Applied after caching.
    pub sort_by_likes: bool,
}

impl Default for TimelineOptions {
    fn default() -> Self {
        Self {
            max_results: 20,
            exclude: Vec::new(),
            sort_by_likes: false,
        }
    }
}

pub async fn fetch_timeline(ctx: &mut FetchContext<'_>, username: &str, options: &TimelineOptions) -> Result<Timeline> {
    let user = fetch_user(ctx, username).await?;
    let page = ctx
        .client
        .user_tweets(user.id, clamp(options.max_results), &options.exclude)
        .await?;
    ctx.cache.put_all::<Tweets, _>(page.tweets.iter().map(|t| (&t.id, t)))?;
    tracing::info!("Stored {} tweets by @{} to cache", page.tweets.len(), user.username);

    let mut tweets = page.tweets;
    if options.sort_by_likes {
        tweets.sort_by(|a, b| b.likes.cmp(&a.likes));
    }
    Ok(Timeline { user, tweets })
}

pub async fn fetch_mentions(ctx: &mut FetchContext<'_>, username: &str, max_results: u32) -> Result<Timeline> {
    let user = fetch_user(ctx, username).await?;
    let page = ctx.client.user_mentions(user.id, clamp(max_results)).await?;
    ctx.cache.put_all::<Tweets, _>(page.tweets.iter().map(|t| (&t.id, t)))?;
    tracing::info!("Stored {} mentions of @{} to cache", page.tweets.len(), user.username);
    Ok(Timeline {
        user,
        tweets: page.tweets,
    })
}

fn clamp(max_results: u32) -> u32 {
    max_results.clamp(LIST_MIN_RESULTS, LIST_MAX_RESULTS)
}
