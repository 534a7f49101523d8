use serde::Serialize;

use x_client::{Exclude, SearchOrder};
use xr_cache::CacheStore;
use xr_fetch::{FetchContext, SearchOptions, TimelineOptions};
use xr_util::{parse_status_id, parse_username};

use crate::output::Output;
use crate::{CacheAction, Commands};

pub async fn execute(ctx: &mut FetchContext<'_>, command: Commands) -> anyhow::Result<Output> {
    let output = match command {
        Commands::Tweet { input } => {
            let tweet = xr_fetch::fetch_tweet(ctx, parse_status_id(&input)?).await?;
            Output::new(&tweet, format!("tweet-{}-{}.json", tweet.username, tweet.id))?
        }
        Commands::Thread { input, author_only } => {
            let thread = xr_fetch::fetch_thread(ctx, parse_status_id(&input)?, author_only).await?;
            let username = thread.tweets.first().map(|t| t.username.as_str()).unwrap_or("unknown");
            let suffix = if author_only { "-author-only" } else { "" };
            let filename = format!("thread-{}-{}{}.json", username, thread.conversation_id, suffix);
            Output::new(&thread, filename)?
        }
        Commands::Search {
            query,
            lang,
            no_rt,
            top,
            max_results,
        } => {
            let options = SearchOptions {
                max_results,
                order: if top { SearchOrder::Relevancy } else { SearchOrder::Recency },
                lang,
                no_retweets: no_rt,
            };
            let result = xr_fetch::fetch_search(ctx, &query, &options).await?;
            Output::new(&result, format!("search-{}.json", slug(&query)))?
        }
        Commands::User { username } => {
            let user = xr_fetch::fetch_user(ctx, &parse_username(&username)?).await?;
            Output::new(&user, format!("user-{}.json", user.username))?
        }
        Commands::Timeline {
            username,
            top,
            no_rt,
            no_replies,
            max_results,
        } => {
            let mut exclude = Vec::new();
            if no_rt {
                exclude.push(Exclude::Retweets);
            }
            if no_replies {
                exclude.push(Exclude::Replies);
            }
            let options = TimelineOptions {
                max_results,
                exclude,
                sort_by_likes: top,
            };
            let timeline = xr_fetch::fetch_timeline(ctx, &parse_username(&username)?, &options).await?;
            Output::new(&timeline, format!("timeline-{}.json", timeline.user.username))?
        }
        Commands::Mentions { username, max_results } => {
            let mentions = xr_fetch::fetch_mentions(ctx, &parse_username(&username)?, max_results).await?;
            Output::new(&mentions, format!("mentions-{}.json", mentions.user.username))?
        }
        Commands::Followers { username, max_results } => {
            let follows = xr_fetch::fetch_followers(ctx, &parse_username(&username)?, max_results).await?;
            Output::new(&follows, format!("followers-{}.json", follows.user.username))?
        }
        Commands::Following { username, max_results } => {
            let follows = xr_fetch::fetch_following(ctx, &parse_username(&username)?, max_results).await?;
            Output::new(&follows, format!("following-{}.json", follows.user.username))?
        }
        Commands::Counts { query, granularity } => {
            let counts = xr_fetch::fetch_counts(ctx, &query, granularity).await?;
            Output::new(&counts, format!("counts-{}.json", slug(&query)))?
        }
        Commands::Article { input } => {
            let article = xr_fetch::fetch_article(ctx, parse_status_id(&input)?).await?;
            Output::new(&article, format!("article-{}-{}.json", article.username, article.id))?
        }
        Commands::Cache { .. } => anyhow::bail!("cache maintenance does not fetch"),
    };
    Ok(output)
}

#[derive(Serialize)]
struct Cleanup {
    footprint: u64,
    max_size: u64,
    evicted: Option<xr_cache::EvictionReport>,
}

pub fn cache(cache: &mut CacheStore, action: CacheAction, max_size: u64) -> anyhow::Result<Output> {
    match action {
        CacheAction::Stats => Output::untitled(&cache.stats()?),
        CacheAction::Cleanup => {
            let evicted = cache.cleanup(max_size)?;
            let footprint = cache.footprint()?;
            Output::untitled(&Cleanup {
                footprint,
                max_size,
                evicted,
            })
        }
        CacheAction::Clear => {
            cache.clear()?;
            tracing::info!("Cache cleared");
            Output::untitled(&cache.stats()?)
        }
    }
}

/// File-name-safe prefix of a free-form query.
fn slug(query: &str) -> String {
    query
        .trim()
        .chars()
        .take(50)
        .map(|c| if c.is_alphanumeric() || c == '_' || c == '-' { c } else { '-' })
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_slug() {
        assert_eq!(slug(" rust lang:en "), "rust-lang-en");
        assert_eq!(slug("from:a/b"), "from-a-b");
        assert_eq!(slug(&"x".repeat(80)).len(), 50);
    }

    #[test]
    fn test_cache_actions() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = CacheStore::open(&dir.path().join("cache.db")).unwrap();
        store.put::<xr_cache::Tweets>(&1, &x_client::Tweet::default()).unwrap();

        let stats = cache(&mut store, CacheAction::Stats, u64::MAX).unwrap();
        assert!(stats.json.contains("\"rows\": 1"));

        let cleanup = cache(&mut store, CacheAction::Cleanup, u64::MAX).unwrap();
        assert!(cleanup.json.contains("\"evicted\": null"));
        assert!(cleanup.filename.is_none());

        cache(&mut store, CacheAction::Clear, u64::MAX).unwrap();
        assert!(!store.get::<xr_cache::Tweets>(&1, std::time::Duration::from_secs(60)).unwrap().is_found());
    }
}
