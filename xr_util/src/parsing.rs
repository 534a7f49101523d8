use thiserror::Error;

use url::Url;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParsingError {
    #[error("URL parse error: {0}")]
    UrlError(#[from] url::ParseError),
    #[error("Invalid tweet ID or URL: {0}")]
    InvalidStatus(String),
    #[error("Invalid username: {0}")]
    InvalidUsername(String),
}

type Result<T> = std::result::Result<T, ParsingError>;

const STATUS_HOSTS: &[&str] = &["x.com", "twitter.com", "mobile.twitter.com", "mobile.x.com"];

/// Parse a tweet ID from either a bare numeric ID or a status URL like
/// `https://x.com/<user>/status/<id>`.
pub fn parse_status_id(input: &str) -> Result<u64> {
    let input = input.trim();
    if let Ok(id) = input.parse::<u64>() {
        return Ok(id);
    }

    // Accept URLs without a scheme, e.g. `x.com/user/status/1`
    let url = if input.contains("://") {
        Url::parse(input)?
    } else {
        Url::parse(&format!("https://{}", input))?
    };
    let host = url.host_str().unwrap_or_default();
    let host = host.strip_prefix("www.").unwrap_or(host);
    if !STATUS_HOSTS.contains(&host) {
        return Err(ParsingError::InvalidStatus(input.to_string()));
    }

    let segments = url.path_segments().map(|s| s.collect::<Vec<_>>()).unwrap_or_default();
    match segments.as_slice() {
        [_user, "status", id, ..] => id
            .parse::<u64>()
            .map_err(|_| ParsingError::InvalidStatus(input.to_string())),
        _ => Err(ParsingError::InvalidStatus(input.to_string())),
    }
}

/// Strip a leading `@` from a handle and validate the remaining characters.
pub fn parse_username(input: &str) -> Result<String> {
    let name = input.trim().trim_start_matches('@');
    let valid = !name.is_empty() && name.len() <= 15 && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if !valid {
        return Err(ParsingError::InvalidUsername(input.to_string()));
    }
    Ok(name.to_string())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse_status_id() {
        assert_eq!(parse_status_id("1893000000000000000"), Ok(1893000000000000000));
        assert_eq!(parse_status_id("https://x.com/jack/status/20"), Ok(20));
        assert_eq!(parse_status_id("https://twitter.com/jack/status/20?s=20"), Ok(20));
        assert_eq!(parse_status_id("x.com/jack/status/20/photo/1"), Ok(20));
        assert_eq!(parse_status_id("https://www.x.com/jack/status/20"), Ok(20));
    }

    #[test]
    fn test_parse_status_id_rejects_other_urls() {
        assert!(parse_status_id("https://example.com/jack/status/20").is_err());
        assert!(parse_status_id("https://x.com/jack").is_err());
        assert!(parse_status_id("https://x.com/jack/status/abc").is_err());
        assert!(parse_status_id("not an id").is_err());
    }

    #[test]
    fn test_parse_username() {
        assert_eq!(parse_username("@jack"), Ok("jack".to_string()));
        assert_eq!(parse_username("Some_User1"), Ok("Some_User1".to_string()));
        assert!(parse_username("@").is_err());
        assert!(parse_username("has space").is_err());
    }
}
