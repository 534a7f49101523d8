use serde::Serialize;

use x_client::{User, FOLLOW_MAX_RESULTS};

use crate::user::fetch_user;
use crate::{FetchContext, Result};

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Follows {
    pub user: User,
    pub users: Vec<User>,
}

pub async fn fetch_followers(ctx: &mut FetchContext<'_>, username: &str, max_results: u32) -> Result<Follows> {
    let user = fetch_user(ctx, username).await?;
    let page = ctx.client.followers(user.id, clamp(max_results)).await?;
    ctx.cache.put_user_listing(&page.users)?;
    tracing::info!("Stored {} followers of @{} to cache", page.users.len(), user.username);
    Ok(Follows { user, users: page.users })
}

pub async fn fetch_following(ctx: &mut FetchContext<'_>, username: &str, max_results: u32) -> Result<Follows> {
    let user = fetch_user(ctx, username).await?;
    let page = ctx.client.following(user.id, clamp(max_results)).await?;
    ctx.cache.put_user_listing(&page.users)?;
    tracing::info!("Stored {} accounts followed by @{} to cache", page.users.len(), user.username);
    Ok(Follows { user, users: page.users })
}

fn clamp(max_results: u32) -> u32 {
    max_results.clamp(1, FOLLOW_MAX_RESULTS)
}
