mod command;
mod config;
mod output;

use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use tracing_subscriber::filter::{EnvFilter, LevelFilter};

use std::process::ExitCode;

use x_client::{Granularity, XClient};
use xr_cache::CacheStore;
use xr_fetch::FetchContext;

use crate::config::{Config, ConfigError};

/// X (Twitter) research CLI.
#[derive(Parser, Debug)]
#[command(name = "xr")]
#[command(version)]
pub struct Cli {
    /// Also save output to the configured directory
    #[arg(long, global = true)]
    save: bool,

    /// Bypass the cache for this invocation
    #[arg(long, global = true)]
    no_cache: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch a single tweet by ID or URL
    Tweet { input: String },

    /// Fetch the conversation a tweet belongs to
    Thread {
        input: String,

        /// Only tweets by the thread author
        #[arg(long)]
        author_only: bool,
    },

    /// Search recent tweets
    Search {
        query: String,

        /// Filter by language (e.g. en, es)
        #[arg(long)]
        lang: Option<String>,

        /// Exclude retweets
        #[arg(long)]
        no_rt: bool,

        /// Sort by relevancy instead of recency
        #[arg(long)]
        top: bool,

        #[arg(long = "max", default_value_t = 20)]
        max_results: u32,
    },

    /// Fetch a user profile
    User { username: String },

    /// Fetch a user's recent tweets
    Timeline {
        username: String,

        /// Sort by likes
        #[arg(long)]
        top: bool,

        /// Exclude retweets
        #[arg(long)]
        no_rt: bool,

        /// Exclude replies
        #[arg(long)]
        no_replies: bool,

        #[arg(long = "max", default_value_t = 20)]
        max_results: u32,
    },

    /// Fetch tweets mentioning a user
    Mentions {
        username: String,

        #[arg(long = "max", default_value_t = 20)]
        max_results: u32,
    },

    /// List a user's followers
    Followers {
        username: String,

        #[arg(long = "max", default_value_t = 100)]
        max_results: u32,
    },

    /// List the accounts a user follows
    Following {
        username: String,

        #[arg(long = "max", default_value_t = 100)]
        max_results: u32,
    },

    /// Tweet volume for a query
    Counts {
        query: String,

        /// minute, hour or day
        #[arg(long, default_value_t = Granularity::Day)]
        granularity: Granularity,
    },

    /// Fetch a long-form article by tweet ID or URL
    Article { input: String },

    /// Inspect or maintain the local cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheAction {
    /// Rows per table and size on disk
    Stats,
    /// Evict old records if the cache is over its size limit
    Cleanup,
    /// Delete every cached record
    Clear,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    dotenv().ok();
    let cli = Cli::parse();

    // 1. Initialize logger
    let level = if cli.verbose { LevelFilter::DEBUG } else { LevelFilter::INFO };
    let mut filter = EnvFilter::builder().with_default_directive(level.into()).from_env_lossy();
    for directive in ["hyper=info", "reqwest=info"] {
        if let Ok(directive) = directive.parse() {
            filter = filter.add_directive(directive);
        }
    }
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    // 2. Run
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::report_error(&e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::from_env()?;

    if let Commands::Cache { action } = cli.command {
        let mut cache = CacheStore::open(&config.cache_path)?;
        let output = command::cache(&mut cache, action, config.cache_max_size)?;
        return output::emit(&output, None);
    }

    let token = config.bearer_token.as_deref().ok_or(ConfigError::MissingToken)?;
    let client = XClient::new(token)?
        .with_max_attempts(config.max_attempts)
        .with_log_dir(config.client_log_dir.clone());
    let mut cache = if config.cache_enabled && !cli.no_cache {
        CacheStore::open(&config.cache_path)?
    } else {
        tracing::debug!("Cache disabled");
        CacheStore::disabled()
    };

    let output = {
        let mut ctx = FetchContext::new(&client, &mut cache, config.ttl);
        command::execute(&mut ctx, cli.command).await?
    };
    output::emit(&output, cli.save.then_some(config.save_dir.as_path()))?;

    if let Some(report) = cache.cleanup(config.cache_max_size)? {
        tracing::info!(
            "Cache shrunk from {} to {} bytes",
            report.footprint_before,
            report.footprint_after
        );
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse_search() {
        let cli = Cli::try_parse_from(["xr", "--save", "search", "rust", "--lang", "en", "--no-rt", "--max", "50"]).unwrap();
        assert!(cli.save);
        match cli.command {
            Commands::Search {
                query,
                lang,
                no_rt,
                top,
                max_results,
            } => {
                assert_eq!(query, "rust");
                assert_eq!(lang.as_deref(), Some("en"));
                assert!(no_rt);
                assert!(!top);
                assert_eq!(max_results, 50);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_counts_granularity() {
        let cli = Cli::try_parse_from(["xr", "counts", "rust", "--granularity", "hour", "--no-cache"]).unwrap();
        assert!(cli.no_cache);
        assert!(matches!(
            cli.command,
            Commands::Counts {
                granularity: Granularity::Hour,
                ..
            }
        ));
        assert!(Cli::try_parse_from(["xr", "counts", "rust", "--granularity", "week"]).is_err());
    }

    #[test]
    fn test_parse_cache_action() {
        let cli = Cli::try_parse_from(["xr", "cache", "cleanup"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Cache {
                action: CacheAction::Cleanup
            }
        ));
    }
}
