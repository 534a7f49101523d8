use x_client::{CountResult, Granularity};
use xr_cache::{Counts, CountsKey, Lookup};

use crate::{FetchContext, Result};

/// Tweet volume for `query`, bucketed by `granularity`. Buckets keep the
/// chronological order the API returns them in.
pub async fn fetch_counts(ctx: &mut FetchContext<'_>, query: &str, granularity: Granularity) -> Result<CountResult> {
    let key = CountsKey::new(query, granularity);
    if let Lookup::Found(mut counts) = ctx.cache.get::<Counts>(&key, ctx.ttl.counts)? {
        tracing::info!("Counts for {:?} ({}) from cache", query, granularity);
        counts.query = query.to_string();
        return Ok(counts);
    }
    tracing::debug!("Counts for {:?} ({}) not cached or stale", query, granularity);

    let counts = ctx.client.tweet_counts(query, granularity).await?;
    ctx.cache.put::<Counts>(&key, &counts)?;
    tracing::info!("Stored {} count buckets to cache", counts.buckets.len());
    Ok(counts)
}
