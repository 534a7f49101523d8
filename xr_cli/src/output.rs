use chrono::{DateTime, Utc};
use serde::Serialize;

use std::path::Path;

/// Rendered command output and the name it is saved under with `--save`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Output {
    pub json: String,
    pub filename: Option<String>,
}

impl Output {
    pub fn new<T: Serialize>(value: &T, filename: String) -> anyhow::Result<Self> {
        Ok(Output {
            json: serde_json::to_string_pretty(value)?,
            filename: Some(filename),
        })
    }

    pub fn untitled<T: Serialize>(value: &T) -> anyhow::Result<Self> {
        Ok(Output {
            json: serde_json::to_string_pretty(value)?,
            filename: None,
        })
    }
}

/// Print to stdout, and also write into `save_dir` when given.
pub fn emit(output: &Output, save_dir: Option<&Path>) -> anyhow::Result<()> {
    println!("{}", output.json);
    if let (Some(dir), Some(filename)) = (save_dir, &output.filename) {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(filename);
        std::fs::write(&path, &output.json)?;
        eprintln!("Saved: {}", path.display());
    }
    Ok(())
}

pub fn report_error(error: &anyhow::Error) {
    let reset_at = error
        .downcast_ref::<xr_fetch::Error>()
        .and_then(|e| e.rate_limit_reset());
    match reset_at {
        Some(reset_at) => eprintln!("Error: {}", rate_limit_message(reset_at, Utc::now())),
        None => eprintln!("Error: {:#}", error),
    }
}

fn rate_limit_message(reset_at: i64, now: DateTime<Utc>) -> String {
    let remaining = (reset_at - now.timestamp()).max(0);
    match DateTime::from_timestamp(reset_at, 0) {
        Some(reset) => format!(
            "rate limited, resets at {} ({}s from now)",
            reset.format("%Y-%m-%d %H:%M:%S UTC"),
            remaining
        ),
        None => format!("rate limited, resets in {}s", remaining),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_rate_limit_message() {
        let now = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        assert_eq!(
            rate_limit_message(1_700_000_090, now),
            "rate limited, resets at 2023-11-14 22:14:50 UTC (90s from now)"
        );
        assert_eq!(
            rate_limit_message(0, now),
            "rate limited, resets at 1970-01-01 00:00:00 UTC (0s from now)"
        );
    }

    #[test]
    fn test_emit_saves() {
        let dir = tempfile::tempdir().unwrap();
        let save_dir = dir.path().join("out");
        let output = Output::new(&serde_json::json!({ "id": "1" }), "tweet-a-1.json".to_string()).unwrap();
        emit(&output, Some(&save_dir)).unwrap();
        assert_eq!(std::fs::read_to_string(save_dir.join("tweet-a-1.json")).unwrap(), output.json);

        let untitled = Output::untitled(&1).unwrap();
        emit(&untitled, Some(&save_dir)).unwrap();
        assert_eq!(std::fs::read_dir(&save_dir).unwrap().count(), 1);
    }
}
