//! Configuration management for the SDK and the `builtio` CLI.

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use crate::API_URI;

/// Command-line arguments for the `builtio` CLI.
#[derive(Parser, Debug, Clone)]
#[command(name = "builtio")]
#[command(author = "built.io SDK Team")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Inspect a built.io application from the command line")]
pub struct Args {
    /// Application API key
    #[arg(long, env = "BUILT_APPLICATION_API_KEY")]
    pub api_key: Option<String>,

    /// Application master key
    #[arg(long, env = "BUILT_MASTER_KEY")]
    pub master_key: Option<String>,

    /// Authtoken of a logged-in application user
    #[arg(long, env = "BUILT_AUTHTOKEN")]
    pub authtoken: Option<String>,

    /// API host
    #[arg(long, default_value = API_URI, env = "BUILT_HOST")]
    pub host: String,

    /// API version segment (e.g. v1)
    #[arg(long, env = "BUILT_API_VERSION")]
    pub api_version: Option<String>,

    /// Request timeout in seconds
    #[arg(long, default_value = "30", env = "BUILT_TIMEOUT")]
    pub timeout: u64,

    /// Enable debug logging
    #[arg(short, long, env = "BUILT_DEBUG")]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Show the application
    App,
    /// List all classes
    Classes,
    /// Show a single class
    Class {
        /// Class uid
        uid: String,
    },
    /// Fetch a single object
    Object {
        /// Class uid
        class_uid: String,
        /// Object uid
        uid: String,
    },
    /// Query the objects of a class
    Query {
        /// Class uid
        class_uid: String,
        /// Equality filter as field=value (repeatable)
        #[arg(long = "where", value_name = "FIELD=VALUE")]
        filters: Vec<String>,
        /// Maximum number of objects
        #[arg(long)]
        limit: Option<u64>,
        /// Number of objects to skip
        #[arg(long)]
        skip: Option<u64>,
        /// Include the total count of matching objects
        #[arg(long)]
        include_count: bool,
    },
}

/// Client configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// API host
    pub host: String,
    /// API version segment, appended to the host when set
    #[serde(default)]
    pub version: Option<String>,
    /// Application API key (required)
    pub application_api_key: String,
    /// Master key
    #[serde(default)]
    pub master_key: Option<String>,
    /// Authtoken of a logged-in user
    #[serde(default)]
    pub authtoken: Option<String>,
    /// Debug mode
    #[serde(default)]
    pub debug: bool,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_timeout() -> u64 {
    30
}

impl Config {
    /// Default configuration for the given API key.
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self {
            application_api_key: api_key.into(),
            ..Self::default()
        }
    }

    /// Base URI every request path is appended to.
    pub fn base_uri(&self) -> String {
        let host = self.host.trim_end_matches('/');
        match self.version.as_deref().filter(|v| !v.is_empty()) {
            Some(version) => format!("{}/{}", host, version.trim_matches('/')),
            None => host.to_string(),
        }
    }
}

impl From<Args> for Config {
    fn from(args: Args) -> Self {
        Self {
            host: args.host,
            version: args.api_version,
            application_api_key: args.api_key.unwrap_or_default(),
            master_key: args.master_key,
            authtoken: args.authtoken,
            debug: args.debug,
            timeout_secs: args.timeout,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: API_URI.to_string(),
            version: None,
            application_api_key: String::new(),
            master_key: None,
            authtoken: None,
            debug: false,
            timeout_secs: default_timeout(),
        }
    }
}
