//! Command-line interface parsing for the HealthTrack client
//!
//! This module handles parsing of CLI arguments using clap and turns them into
//! a `ClientConfig` plus a command to run.

use clap::{ArgAction, Parser, Subcommand};
use thiserror::Error;

use crate::api::CachedGetOptions;
use crate::config::ClientConfig;

/// Error types for CLI argument validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CliError {
    /// The resource path was empty
    #[error("Invalid path: resource path must not be empty")]
    EmptyPath,

    /// `--repeat` was zero
    #[error("Invalid repeat count: {0}. Must be at least 1")]
    InvalidRepeat(u32),
}

/// HealthTrack client - fetch API resources through a TTL response cache
#[derive(Parser, Debug)]
#[command(name = "healthtrack")]
#[command(about = "HealthTrack API client with response caching")]
#[command(version)]
pub struct Cli {
    /// API base URL (overrides HEALTHTRACK_API_URL and HEALTHTRACK_HOST)
    #[arg(long, value_name = "URL", global = true)]
    pub base_url: Option<String>,

    /// Keep cached responses on disk between runs
    #[arg(long, global = true)]
    pub persist_cache: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Fetch a resource and print its JSON body
    ///
    /// Examples:
    ///   healthtrack get /reports
    ///   healthtrack get /reports --repeat 2      # second request is served from cache
    ///   healthtrack get /analysis/12 --skip-cache
    Get {
        /// Resource path relative to the API base URL
        path: String,

        /// Cache lifetime for the response in milliseconds
        #[arg(long, value_name = "MS")]
        ttl_ms: Option<u64>,

        /// Bypass the cache and refresh it from the network
        #[arg(long)]
        skip_cache: bool,

        /// Number of times to issue the request
        #[arg(long, default_value_t = 1)]
        repeat: u32,
    },

    /// Store a bearer token for later requests
    Login {
        #[arg(long)]
        token: String,
    },

    /// Forget the stored token and cached responses
    Logout,
}

impl Cli {
    /// Checks argument values clap cannot express
    pub fn validate(&self) -> Result<(), CliError> {
        if let Command::Get { path, repeat, .. } = &self.command {
            if path.trim().is_empty() {
                return Err(CliError::EmptyPath);
            }
            if *repeat == 0 {
                return Err(CliError::InvalidRepeat(*repeat));
            }
        }
        Ok(())
    }

    /// Applies CLI overrides on top of `base`
    pub fn client_config(&self, base: ClientConfig) -> ClientConfig {
        let mut config = match &self.base_url {
            Some(url) => base.with_base_url(url.as_str()),
            None => base,
        };
        // Logout must also empty the on-disk cache
        config.persist_cache = self.persist_cache || self.command == Command::Logout;
        config
    }

    /// Log filter directive implied by `-v`
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "debug",
            _ => "trace",
        }
    }
}

impl Command {
    /// Cached GET options for a `get` command
    pub fn get_options(&self) -> Option<CachedGetOptions> {
        match self {
            Command::Get {
                ttl_ms, skip_cache, ..
            } => Some(CachedGetOptions {
                ttl_ms: *ttl_ms,
                skip_cache: *skip_cache,
                skip_auth_redirect: false,
            }),
            _ => None,
        }
    }
}
