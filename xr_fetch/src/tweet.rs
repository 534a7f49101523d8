use x_client::{Article, Tweet};
use xr_cache::{Lookup, Tweets};

use crate::{FetchContext, Result};

pub async fn fetch_tweet(ctx: &mut FetchContext<'_>, tweet_id: u64) -> Result<Tweet> {
    if let Lookup::Found(tweet) = ctx.cache.get::<Tweets>(&tweet_id, ctx.ttl.tweets)? {
        tracing::info!("Tweet {} from cache", tweet_id);
        return Ok(tweet);
    }
    tracing::debug!("Tweet {} not cached or stale", tweet_id);

    let tweet = ctx.client.tweet(tweet_id).await?;
    ctx.cache.put::<Tweets>(&tweet_id, &tweet)?;
    tracing::info!("Stored tweet {} to cache", tweet_id);
    Ok(tweet)
}

/// Articles are tweets with article metadata; they share the tweet record.
pub async fn fetch_article(ctx: &mut FetchContext<'_>, tweet_id: u64) -> Result<Article> {
    let tweet = fetch_tweet(ctx, tweet_id).await?;
    if tweet.article.is_none() {
        tracing::debug!("Tweet {} carries no article metadata", tweet_id);
    }
    Ok(Article::from(&tweet))
}
