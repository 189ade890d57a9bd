//! Command-line surface

use std::ffi::OsString;
use std::path::Path;
use std::time::Duration;

use clap::Parser;

use crate::config::{
    Config, MigrationSettings, SourceConfig, DEFAULT_MAX_RETRY_ATTEMPTS, DEFAULT_QUEUE_CAPACITY,
    DEFAULT_RETRY_JITTER_MS, DEFAULT_WORKERS,
};
use crate::storage::config::{DestinationConfig, DEFAULT_PREFIX, DEFAULT_REGION};

/// `--version` output: crate version plus the build information embedded by
/// the build script
const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    "\nGit Repo: ",
    env!("GRIDFS2S3_GIT_REPO"),
    "\nGit Commit Hash: ",
    env!("GRIDFS2S3_GIT_COMMIT"),
    "\nBuild Date: ",
    env!("GRIDFS2S3_BUILD_DATE"),
);

/// gridfs2s3 - copy every file of a GridFS bucket to S3
#[derive(Parser, Debug)]
#[command(name = "gridfs2s3")]
#[command(author, version, long_version = LONG_VERSION, about, long_about = None)]
pub struct Cli {
    /// Destination S3 bucket
    #[arg(long, env = "S3_BUCKET")]
    pub bucket: Option<String>,

    /// Project name, first segment of every key
    #[arg(long, env = "PROJECT")]
    pub project: Option<String>,

    /// Project environment, second segment of every key
    #[arg(long = "env", env = "ENVIRONMENT")]
    pub environment: Option<String>,

    /// Sub-prefix placed after project and environment
    #[arg(long, env = "S3_PREFIX", default_value = DEFAULT_PREFIX)]
    pub prefix: String,

    /// Destination bucket region
    #[arg(long, env = "AWS_REGION", default_value = DEFAULT_REGION)]
    pub region: String,

    /// Custom endpoint for S3-compatible stores
    #[arg(long, env = "S3_ENDPOINT")]
    pub endpoint: Option<String>,

    /// Use path-style bucket addressing
    #[arg(long, env = "S3_PATH_STYLE")]
    pub path_style: bool,

    /// Static access key; the default AWS credential chain is used otherwise
    #[arg(long, env = "S3_ACCESS_KEY", hide_env_values = true)]
    pub access_key: Option<String>,

    /// Static secret key
    #[arg(long, env = "S3_SECRET_KEY", hide_env_values = true)]
    pub secret_key: Option<String>,

    /// Number of concurrent transfer workers
    #[arg(short, long, env = "WORKERS", default_value_t = DEFAULT_WORKERS)]
    pub workers: usize,

    /// Attempts per object, including the first
    #[arg(long, env = "RETRIES", default_value_t = DEFAULT_MAX_RETRY_ATTEMPTS)]
    pub retries: u32,

    /// Upper bound of the random delay before a retry, in milliseconds
    #[arg(long, default_value_t = DEFAULT_RETRY_JITTER_MS)]
    pub retry_jitter_ms: u64,

    /// Capacity of the work queue
    #[arg(long, default_value_t = DEFAULT_QUEUE_CAPACITY)]
    pub queue_capacity: usize,

    /// Abort workers still busy this many seconds after the last object was queued
    #[arg(long)]
    pub drain_timeout_secs: Option<u64>,

    /// Skip objects whose name contains this text (repeatable)
    #[arg(long = "reject-marker", default_values = ["unison"])]
    pub reject_markers: Vec<String>,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Read `.env` into the environment, then parse the process arguments.
    /// Exits with clap's usage error on bad arguments.
    pub fn load() -> Self {
        Self::try_load_from(None, std::env::args_os()).unwrap_or_else(|e| e.exit())
    }

    /// Read `env_file` (or `.env` from the working directory and its
    /// parents) into the environment, then parse `args`. Variables already
    /// set win over the file, and a missing file is not an error.
    pub fn try_load_from<I, T>(env_file: Option<&Path>, args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        if let Some(path) = env_file {
            dotenvy::from_path(path).ok();
        } else {
            dotenvy::dotenv().ok();
        }

        Self::try_parse_from(args)
    }

    /// Combine the command line with source settings read from the
    /// environment. Nothing is validated here.
    pub fn config(&self, source: SourceConfig) -> Config {
        let destination = DestinationConfig {
            prefix: self.prefix.clone(),
            region: self.region.clone(),
            endpoint: self.endpoint.clone(),
            access_key: self.access_key.clone(),
            secret_key: self.secret_key.clone(),
            path_style: self.path_style,
            ..DestinationConfig::new(
                self.bucket.clone().unwrap_or_default(),
                self.project.clone().unwrap_or_default(),
                self.environment.clone().unwrap_or_default(),
            )
        };

        let migration = MigrationSettings {
            workers: self.workers,
            max_retry_attempts: self.retries,
            retry_jitter: Duration::from_millis(self.retry_jitter_ms),
            queue_capacity: self.queue_capacity,
            drain_timeout: self.drain_timeout_secs.map(Duration::from_secs),
            rejected_markers: self.reject_markers.clone(),
        };

        Config {
            source,
            destination,
            migration,
        }
    }
}
