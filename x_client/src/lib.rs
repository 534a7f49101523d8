mod consts;
mod error;
mod response;
mod result;
mod util;

use chrono::Utc;
use reqwest::{header, Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use xr_util::build_params;

pub use consts::{
    API_BASE, DEFAULT_MAX_ATTEMPTS, FOLLOW_MAX_RESULTS, LIST_MAX_RESULTS, LIST_MIN_RESULTS, SEARCH_MAX_RESULTS,
    SEARCH_MIN_RESULTS,
};
use consts::*;
use response::{CountData, Envelope, TweetData, UserData};
pub use result::*;
pub use util::{rate_limit_wait, Sleeper, TokioSleeper};

pub use crate::error::Error;
use crate::error::Result;

/// Client for the X API v2. One request is in flight at a time; a 429
/// response is retried after sleeping until the advertised reset time.
#[derive(Debug, Clone)]
pub struct XClient {
    client: reqwest::Client,
    base_url: String,
    max_attempts: u32,
    sleeper: Arc<dyn Sleeper>,
    log_dir: Option<PathBuf>,
}

impl XClient {
    pub fn new(bearer_token: &str) -> Result<XClient> {
        let mut auth = header::HeaderValue::from_str(&format!("Bearer {}", bearer_token))
            .map_err(|_| Error::InvalidToken)?;
        auth.set_sensitive(true);

        let mut headers = header::HeaderMap::new();
        headers.insert(header::AUTHORIZATION, auth);

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(XClient {
            client,
            base_url: API_BASE.to_string(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            sleeper: Arc::new(TokioSleeper),
            log_dir: None,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Total attempts per request, including the first one.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Write every successful response body into `dir`.
    pub fn with_log_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.log_dir = dir;
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }
}

// MARK: Endpoints

impl XClient {
    pub async fn tweet(&self, tweet_id: u64) -> Result<Tweet> {
        let params = build_params! {
            required "tweet.fields" => TWEET_FIELDS,
            required "expansions" => TWEET_DETAIL_EXPANSIONS,
            required "user.fields" => TWEET_USER_FIELDS,
        };
        let response: Envelope<TweetData> = self.get_as(&format!("tweets/{}", tweet_id), params).await?;
        response.try_into()
    }

    pub async fn user_by_username(&self, username: &str) -> Result<User> {
        let params = build_params! { required "user.fields" => USER_FIELDS };
        let response: Envelope<UserData> = self.get_as(&format!("users/by/username/{}", username), params).await?;
        response.try_into()
    }

    pub async fn user_tweets(&self, user_id: u64, max_results: u32, exclude: &[Exclude]) -> Result<TweetPage> {
        let params = build_params! {
            required "tweet.fields" => TWEET_FIELDS,
            required "expansions" => TWEET_EXPANSIONS,
            required "user.fields" => TWEET_USER_FIELDS,
            required max_results,
            joined exclude,
        };
        let response: Envelope<Vec<TweetData>> = self.get_as(&format!("users/{}/tweets", user_id), params).await?;
        response.try_into()
    }

    pub async fn user_mentions(&self, user_id: u64, max_results: u32) -> Result<TweetPage> {
        let params = build_params! {
            required "tweet.fields" => TWEET_FIELDS,
            required "expansions" => TWEET_EXPANSIONS,
            required "user.fields" => TWEET_USER_FIELDS,
            required max_results,
        };
        let response: Envelope<Vec<TweetData>> = self.get_as(&format!("users/{}/mentions", user_id), params).await?;
        response.try_into()
    }

    pub async fn followers(&self, user_id: u64, max_results: u32) -> Result<UserPage> {
        let params = build_params! {
            required "user.fields" => USER_FIELDS,
            required max_results,
        };
        let response: Envelope<Vec<UserData>> = self.get_as(&format!("users/{}/followers", user_id), params).await?;
        response.try_into()
    }

    pub async fn following(&self, user_id: u64, max_results: u32) -> Result<UserPage> {
        let params = build_params! {
            required "user.fields" => USER_FIELDS,
            required max_results,
        };
        let response: Envelope<Vec<UserData>> = self.get_as(&format!("users/{}/following", user_id), params).await?;
        response.try_into()
    }

    pub async fn search_recent(&self, query: &str, max_results: u32, sort_order: SearchOrder) -> Result<TweetPage> {
        let params = build_params! {
            required query,
            required "tweet.fields" => TWEET_FIELDS,
            required "expansions" => TWEET_EXPANSIONS,
            required "user.fields" => TWEET_USER_FIELDS,
            required max_results,
            required sort_order,
        };
        let response: Envelope<Vec<TweetData>> = self.get_as("tweets/search/recent", params).await?;
        response.try_into()
    }

    pub async fn tweet_counts(&self, query: &str, granularity: Granularity) -> Result<CountResult> {
        let params = build_params! {
            required query,
            required granularity,
        };
        let response: Envelope<Vec<CountData>> = self.get_as("tweets/counts/recent", params).await?;
        let (buckets, total) = result::count_buckets(response)?;
        Ok(CountResult {
            query: query.to_string(),
            granularity,
            buckets,
            total,
        })
    }
}

// MARK: Transport

impl XClient {
    /// GET `endpoint` (relative to the API base) and return the parsed body.
    ///
    /// A 429 response sleeps until `max(reset - now, 1) + 1` seconds have passed
    /// and retries while attempts remain; the last one fails with
    /// [`Error::RateLimit`]. Any other non-success status fails immediately.
    pub async fn get<I>(&self, endpoint: &str, params: I) -> Result<Value>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let base_url = format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            endpoint.trim_start_matches('/')
        );
        let url = Url::parse_with_params(&base_url, params)?;

        for attempt in 1..=self.max_attempts {
            tracing::debug!("GET {} (attempt {}/{})", endpoint, attempt, self.max_attempts);
            let response = self.client.get(url.clone()).send().await?;
            let status = response.status();

            if status.is_success() {
                let content = response.text().await?;
                self.log(endpoint, &content).await?;
                return serde_json::from_str(&content).map_err(|e| e.into());
            }

            if status == StatusCode::TOO_MANY_REQUESTS {
                let reset_at = util::rate_limit_reset(response.headers());
                if attempt < self.max_attempts {
                    let wait = rate_limit_wait(reset_at, Utc::now().timestamp());
                    tracing::warn!("Rate limited on {}. Waiting {}s...", endpoint, wait.as_secs());
                    self.sleeper.sleep(wait).await;
                    continue;
                }
                return Err(Error::RateLimit { reset_at });
            }

            let message = response.text().await?;
            return Err(Error::Api {
                status: status.as_u16(),
                message,
            });
        }

        Err(Error::RetriesExhausted(self.max_attempts))
    }

    async fn get_as<R, I>(&self, endpoint: &str, params: I) -> Result<R>
    where
        R: DeserializeOwned,
        I: IntoIterator<Item = (String, String)>,
    {
        let value = self.get(endpoint, params).await?;
        serde_path_to_error::deserialize(value).map_err(|e| e.into())
    }

    async fn log(&self, endpoint: &str, content: &str) -> Result<()> {
        use tokio::{fs::File, io::AsyncWriteExt};

        if let Some(dir) = &self.log_dir {
            let name = endpoint.trim_start_matches('/').replace('/', "_");
            let time = chrono::Local::now().format("%Y%m%d_%H%M%S");
            let filepath = dir.join(format!("x_{}_{}.json", name, time));
            let mut file = File::create(filepath).await?;
            file.write_all(content.as_bytes()).await?;
        }
        Ok(())
    }
}
