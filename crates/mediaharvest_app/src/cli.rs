use std::collections::HashSet;
use std::io;
use std::path::PathBuf;

use clap::Parser;
use mediaharvest_core::{Target, TargetError};
use mediaharvest_engine::{HarvestConfig, DEFAULT_REQUESTED};
use thiserror::Error;

use crate::config::FileConfig;

const DEFAULT_OUTPUT_DIR: &str = "data";

#[derive(Debug, Parser)]
#[command(
    name = "mediaharvest",
    version,
    about = "Download media and captions from tag and user feeds"
)]
pub struct Args {
    /// Tags to harvest
    #[arg(short = 't', long = "tags", num_args = 1..)]
    pub tags: Vec<String>,

    /// User profiles to harvest
    #[arg(short = 'u', long = "users", num_args = 1..)]
    pub users: Vec<String>,

    /// New items to download per target [default: 50]
    #[arg(short = 'c', long = "count", allow_negative_numbers = true)]
    pub count: Option<i64>,

    /// Continue from each target's existing manifest
    #[arg(short = 'C', long = "continue")]
    pub resume: bool,

    /// Output directory; each target gets a subdirectory [default: data]
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Stop a target after this many page fetches
    #[arg(long)]
    pub max_pages: Option<u32>,

    /// RON settings file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Also write the log to this file
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Log at debug level
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no targets given; pass --tags and/or --users")]
    NoTargets,
    #[error("count must be greater than zero, got {0}")]
    NonPositiveCount(i64),
    #[error(transparent)]
    InvalidTarget(#[from] TargetError),
    #[error("{0} is listed more than once")]
    DuplicateTarget(Target),
    #[error("cannot read config file {path:?}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid config file {path:?}: {source}")]
    ParseFile {
        path: PathBuf,
        #[source]
        source: ron::error::SpannedError,
    },
    #[error("invalid base url {value:?}: {source}")]
    BaseUrl {
        value: String,
        #[source]
        source: url::ParseError,
    },
}

/// Validated targets and settings, ready to run.
#[derive(Debug, Clone)]
pub struct RunPlan {
    /// Tags first, then users, each in the order given.
    pub targets: Vec<Target>,
    pub config: HarvestConfig,
}

impl Args {
    /// Layers defaults, then `file`, then the flags on this struct. Fails
    /// before any network or disk activity.
    pub fn into_plan(self, file: Option<&FileConfig>) -> Result<RunPlan, ConfigError> {
        if self.tags.is_empty() && self.users.is_empty() {
            return Err(ConfigError::NoTargets);
        }

        let count = self
            .count
            .or_else(|| file.and_then(|f| f.count))
            .unwrap_or(DEFAULT_REQUESTED as i64);
        if count <= 0 {
            return Err(ConfigError::NonPositiveCount(count));
        }

        let mut targets = Vec::with_capacity(self.tags.len() + self.users.len());
        for tag in &self.tags {
            targets.push(Target::tag(tag)?);
        }
        for user in &self.users {
            targets.push(Target::user(user)?);
        }
        let mut seen = HashSet::new();
        if let Some(repeated) = targets.iter().find(|t| !seen.insert(*t)) {
            return Err(ConfigError::DuplicateTarget(repeated.clone()));
        }

        let mut config = HarvestConfig::new(DEFAULT_OUTPUT_DIR);
        if let Some(file) = file {
            file.apply_to(&mut config)?;
        }
        config.requested = count as usize;
        config.resume = self.resume;
        if let Some(output) = self.output {
            config.output_dir = output;
        }
        if self.max_pages.is_some() {
            config.max_pages = self.max_pages;
        }

        Ok(RunPlan { targets, config })
    }
}
