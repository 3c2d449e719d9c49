//! Credential resolution for the built.io API.
//!
//! Credentials are resolved in order:
//! 1. Explicit options
//! 2. Environment variables (BUILT_APPLICATION_API_KEY, BUILT_MASTER_KEY)
//! 3. Credentials file (~/.built/credentials.json)

use serde::Deserialize;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::error::{Error, Result};

/// Resolved credentials for API access.
#[derive(Debug, Clone, PartialEq)]
pub struct Credentials {
    /// Application API key
    pub api_key: String,
    /// Master key, if any
    pub master_key: Option<String>,
}

/// Credentials file structure.
#[derive(Debug, Default, Deserialize)]
struct CredentialsFile {
    application_api_key: Option<String>,
    master_key: Option<String>,
}

/// Get the path to the credentials file.
fn credentials_file_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".built").join("credentials.json"))
}

/// Read a credentials file.
async fn read_credentials_file(path: &Path) -> Option<CredentialsFile> {
    let content = fs::read_to_string(path).await.ok()?;
    serde_json::from_str(&content).ok()
}

/// Resolve credentials from options, environment, or the credentials file.
///
/// # Errors
///
/// Returns [`Error::CredentialsNotFound`] if no API key can be found.
pub async fn resolve_credentials(
    api_key: Option<&str>,
    master_key: Option<&str>,
) -> Result<Credentials> {
    let file = match credentials_file_path() {
        Some(path) => read_credentials_file(&path).await,
        None => None,
    };
    resolve_with(api_key, master_key, file.unwrap_or_default())
}

fn resolve_with(
    api_key: Option<&str>,
    master_key: Option<&str>,
    file: CredentialsFile,
) -> Result<Credentials> {
    let non_blank = |s: String| if s.trim().is_empty() { None } else { Some(s) };

    let api_key = api_key
        .map(String::from)
        .and_then(non_blank)
        .or_else(|| std::env::var("BUILT_APPLICATION_API_KEY").ok().and_then(non_blank))
        .or_else(|| file.application_api_key.and_then(non_blank))
        .ok_or_else(|| {
            Error::CredentialsNotFound(
                "application_api_key is required. Provide it via:\n\
                 1. the --api-key option\n\
                 2. BUILT_APPLICATION_API_KEY environment variable\n\
                 3. ~/.built/credentials.json"
                    .to_string(),
            )
        })?;

    let master_key = master_key
        .map(String::from)
        .and_then(non_blank)
        .or_else(|| std::env::var("BUILT_MASTER_KEY").ok().and_then(non_blank))
        .or_else(|| file.master_key.and_then(non_blank));

    Ok(Credentials {
        api_key,
        master_key,
    })
}
