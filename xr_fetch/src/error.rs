use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Client(#[from] x_client::Error),
    #[error(transparent)]
    Cache(#[from] xr_cache::Error),
}

impl Error {
    /// The reset time when the request was given up on under rate limiting.
    pub fn rate_limit_reset(&self) -> Option<i64> {
        match self {
            Error::Client(x_client::Error::RateLimit { reset_at }) => Some(*reset_at),
            _ => None,
        }
    }
}
