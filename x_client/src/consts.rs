pub const API_BASE: &str = "https://api.x.com/2";
pub const USER_AGENT: &str = concat!("xr/", env!("CARGO_PKG_VERSION"));

pub const REQUEST_TIMEOUT_SECS: u64 = 15;
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const RATE_LIMIT_RESET_HEADER: &str = "x-rate-limit-reset";

pub const TWEET_FIELDS: &str =
    "created_at,author_id,text,public_metrics,entities,referenced_tweets,note_tweet,conversation_id,article";
pub const TWEET_EXPANSIONS: &str = "author_id";
pub const TWEET_DETAIL_EXPANSIONS: &str = "author_id,referenced_tweets.id";
pub const TWEET_USER_FIELDS: &str = "username,name,verified";
pub const USER_FIELDS: &str = "created_at,description,public_metrics,verified,profile_image_url,url,pinned_tweet_id";

/// Page size limits stated by the API for each listing endpoint.
pub const LIST_MIN_RESULTS: u32 = 5;
pub const LIST_MAX_RESULTS: u32 = 100;
pub const FOLLOW_MAX_RESULTS: u32 = 1000;
pub const SEARCH_MIN_RESULTS: u32 = 10;
pub const SEARCH_MAX_RESULTS: u32 = 100;
