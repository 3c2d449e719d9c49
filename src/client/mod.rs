//! Client for the built.io REST API.
//!
//! # Architecture
//!
//! - `transport` - The `Transport` trait and request/response types
//! - `http` - reqwest-backed transport
//! - `credentials` - API key resolution
//!
//! A [`Client`] is the session every model operation runs against: it adds
//! the identity headers, turns non-2xx responses into [`Error::Api`], and
//! remembers the logged-in user.

pub mod credentials;
pub mod http;
pub mod transport;

pub use credentials::{resolve_credentials, Credentials};
pub use http::HttpTransport;
pub use transport::{ApiRequest, ApiResponse, FormPart, RequestBody, Transport};

use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::model::User;

/// Login state of a client.
#[derive(Debug, Default)]
struct Session {
    authtoken: Option<String>,
    current_user: Option<User>,
}

/// An initialized connection to one built.io application.
pub struct Client {
    transport: Arc<dyn Transport>,
    api_key: String,
    master_key: Option<String>,
    session: RwLock<Session>,
}

impl Client {
    /// Create a client talking HTTP to the configured host.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the API key is blank.
    pub fn new(config: Config) -> Result<Self> {
        let transport = HttpTransport::new(&config)?;
        Self::with_transport(config, Arc::new(transport))
    }

    /// Create a client over a custom transport.
    pub fn with_transport(config: Config, transport: Arc<dyn Transport>) -> Result<Self> {
        if config.application_api_key.trim().is_empty() {
            return Err(Error::Config(
                "application_api_key is a required parameter".to_string(),
            ));
        }

        Ok(Self {
            transport,
            api_key: config.application_api_key,
            master_key: config.master_key.filter(|k| !k.is_empty()),
            session: RwLock::new(Session {
                authtoken: config.authtoken.filter(|t| !t.is_empty()),
                current_user: None,
            }),
        })
    }

    pub fn has_master_key(&self) -> bool {
        self.master_key.is_some()
    }

    /// Authtoken of the active session.
    pub async fn authtoken(&self) -> Option<String> {
        self.session.read().await.authtoken.clone()
    }

    /// Replace the session token. The cached current user is dropped.
    pub async fn set_authtoken(&self, authtoken: Option<String>) {
        let mut session = self.session.write().await;
        session.authtoken = authtoken;
        session.current_user = None;
    }

    /// Cached current user, without hitting the API.
    pub async fn cached_user(&self) -> Option<User> {
        self.session.read().await.current_user.clone()
    }

    pub(crate) async fn set_current_user(&self, user: Option<User>) {
        self.session.write().await.current_user = user;
    }

    /// Start a session for `user` with its authtoken.
    pub(crate) async fn start_session(&self, authtoken: String, user: User) {
        let mut session = self.session.write().await;
        session.authtoken = Some(authtoken);
        session.current_user = Some(user);
    }

    /// Drop the authtoken and current user.
    pub async fn end_session(&self) {
        let mut session = self.session.write().await;
        session.authtoken = None;
        session.current_user = None;
    }

    /// Send a request with identity headers and check its status.
    pub async fn request(&self, mut request: ApiRequest) -> Result<ApiResponse> {
        request
            .headers
            .push(("application_api_key".to_string(), self.api_key.clone()));
        if let Some(master_key) = &self.master_key {
            request
                .headers
                .push(("master_key".to_string(), master_key.clone()));
        }
        if let Some(authtoken) = self.authtoken().await {
            request.headers.push(("authtoken".to_string(), authtoken));
        }

        let method = request.method.clone();
        let path = request.path.clone();
        info!("{} {}", method, path);
        if let Some(RequestBody::Json(body)) = &request.body {
            debug!("Request body fields: {}", field_outline(body));
        }

        let response = self.transport.send(request).await?;

        match response.error_for_status() {
            Ok(response) => {
                debug!("HTTP {} for {} {}", response.status, method, path);
                Ok(response)
            }
            Err(e) => {
                warn!("{} {} failed: {}", method, path, e);
                Err(e)
            }
        }
    }

    /// Send a request and parse the JSON body.
    pub async fn request_json(&self, request: ApiRequest) -> Result<Value> {
        self.request(request).await?.json()
    }
}

/// Field names of a JSON body, nested objects included. Values are left out
/// so credentials and user data never reach the logs.
fn field_outline(body: &Value) -> String {
    match body {
        Value::Object(map) => {
            let fields: Vec<String> = map
                .iter()
                .map(|(key, value)| match value {
                    Value::Object(_) => format!("{}: {}", key, field_outline(value)),
                    _ => key.clone(),
                })
                .collect();
            format!("{{{}}}", fields.join(", "))
        }
        Value::Array(items) => format!("[{} items]", items.len()),
        _ => "<scalar>".to_string(),
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("has_master_key", &self.master_key.is_some())
            .finish_non_exhaustive()
    }
}
