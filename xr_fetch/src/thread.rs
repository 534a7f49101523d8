use itertools::Itertools;
use serde::Serialize;

use x_client::{SearchOrder, Tweet, SEARCH_MAX_RESULTS};
use xr_cache::Tweets;

use crate::tweet::fetch_tweet;
use crate::{FetchContext, Result};

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Thread {
    pub conversation_id: u64,
    pub tweets: Vec<Tweet>,
}

/// The conversation containing `tweet_id`, oldest first.
///
/// The anchor comes from the cache when fresh. The conversation search is
/// always live; only the tweets it returns are cached.
pub async fn fetch_thread(ctx: &mut FetchContext<'_>, tweet_id: u64, author_only: bool) -> Result<Thread> {
    // 1. Anchor tweet
    let anchor = fetch_tweet(ctx, tweet_id).await?;
    let conversation_id = anchor.conversation_id.unwrap_or(tweet_id);
    let author_id = anchor.author_id;

    // 2. Everything in the conversation
    let query = format!("conversation_id:{}", conversation_id);
    let page = ctx
        .client
        .search_recent(&query, SEARCH_MAX_RESULTS, SearchOrder::Recency)
        .await?;
    ctx.cache.put_all::<Tweets, _>(page.tweets.iter().map(|t| (&t.id, t)))?;
    tracing::info!("Stored {} tweets from conversation {} to cache", page.tweets.len(), conversation_id);

    // 3. Merge, first occurrence wins, oldest first
    let mut tweets: Vec<Tweet> = std::iter::once(anchor)
        .chain(page.tweets)
        .unique_by(|t| t.id)
        .collect();
    tweets.sort_by_key(|t| t.created_at);

    if author_only {
        tweets.retain(|t| t.author_id == author_id);
    }

    Ok(Thread {
        conversation_id,
        tweets,
    })
}
