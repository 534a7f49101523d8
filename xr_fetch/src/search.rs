use x_client::{SearchOrder, SearchResult, SEARCH_MAX_RESULTS, SEARCH_MIN_RESULTS};
use xr_cache::{Lookup, SearchIndex, SearchKey, Searches, Tweets};

use crate::{FetchContext, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchOptions {
    pub max_results: u32,
    pub order: SearchOrder,
    /// Restrict to one language, e.g. `en`.
    pub lang: Option<String>,
    pub no_retweets: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            max_results: 20,
            order: SearchOrder::Recency,
            lang: None,
            no_retweets: false,
        }
    }
}

/// Append the operators implied by `options` to `query`.
pub fn build_query(query: &str, options: &SearchOptions) -> String {
    let mut query = query.trim().to_string();
    if let Some(lang) = options.lang.as_deref().filter(|l| !l.is_empty()) {
        query.push_str(&format!(" lang:{}", lang));
    }
    if options.no_retweets {
        query.push_str(" -is:retweet");
    }
    query
}

/// Search recent tweets.
///
/// A cached search stores only tweet ids. It is reused only when every one
/// of those tweets is still fresh; otherwise the whole search is fetched
/// again so that `total` never under-reports.
pub async fn fetch_search(ctx: &mut FetchContext<'_>, query: &str, options: &SearchOptions) -> Result<SearchResult> {
    let query = build_query(query, options);
    let key = SearchKey::new(&query, options.order);

    // 1. Rebuild from cache
    if let Lookup::Found(index) = ctx.cache.get::<Searches>(&key, ctx.ttl.searches)? {
        let mut tweets = Vec::with_capacity(index.tweet_ids.len());
        for id in &index.tweet_ids {
            match ctx.cache.get::<Tweets>(id, ctx.ttl.tweets)? {
                Lookup::Found(tweet) => tweets.push(tweet),
                Lookup::Absent => break,
            }
        }
        if tweets.len() == index.tweet_ids.len() {
            tracing::info!("Search {:?} from cache ({} tweets)", query, tweets.len());
            return Ok(SearchResult {
                query,
                total: tweets.len() as u32,
                tweets,
                newest_id: None,
                oldest_id: None,
                next_token: None,
            });
        }
        tracing::debug!("Search {:?} references stale tweets, fetching again", query);
    }

    // 2. Fetch one page
    let max_results = options.max_results.clamp(SEARCH_MIN_RESULTS, SEARCH_MAX_RESULTS);
    let page = ctx.client.search_recent(&query, max_results, options.order).await?;

    // 3. Store tweets, then the index pointing at them
    ctx.cache.put_all::<Tweets, _>(page.tweets.iter().map(|t| (&t.id, t)))?;
    let index = SearchIndex {
        query: query.clone(),
        tweet_ids: page.tweets.iter().map(|t| t.id).collect(),
    };
    ctx.cache.put::<Searches>(&key, &index)?;
    tracing::info!("Stored {} tweets from search {:?} to cache", page.tweets.len(), query);

    Ok(SearchResult {
        query,
        total: page.meta.result_count.unwrap_or(page.tweets.len() as u32),
        tweets: page.tweets,
        newest_id: page.meta.newest_id,
        oldest_id: page.meta.oldest_id,
        next_token: page.meta.next_token,
    })
}
