use x_client::User;
use xr_cache::Lookup;

use crate::{FetchContext, Result};

/// Resolve a user by handle. A leading `@` is ignored and matching is
/// case-insensitive.
pub async fn fetch_user(ctx: &mut FetchContext<'_>, username: &str) -> Result<User> {
    let username = username.trim().trim_start_matches('@');
    if let Lookup::Found(user) = ctx.cache.user_by_username(username, ctx.ttl.users)? {
        tracing::info!("User @{} from cache", username);
        return Ok(user);
    }
    tracing::debug!("User @{} not cached or stale", username);

    let user = ctx.client.user_by_username(username).await?;
    ctx.cache.put_user_profile(&user)?;
    tracing::info!("Stored user @{} ({}) to cache", user.username, user.id);
    Ok(user)
}
