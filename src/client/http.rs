//! reqwest-backed transport.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client as HttpClient;
use serde_json::{Map, Value};
use std::time::Duration;
use uuid::Uuid;

use crate::client::transport::{ApiRequest, ApiResponse, FormPart, RequestBody, Transport};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::VERSION;

/// User agent string for API requests.
fn user_agent() -> String {
    format!("builtio-rust/{}", VERSION)
}

/// Transport issuing requests over HTTP.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: HttpClient,
    base_uri: String,
}

impl HttpTransport {
    /// Create a transport for the configured host.
    pub fn new(config: &Config) -> Result<Self> {
        let client = HttpClient::builder()
            .user_agent(user_agent())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_uri: config.base_uri(),
        })
    }

    pub fn base_uri(&self) -> &str {
        &self.base_uri
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
        let url = format!("{}{}", self.base_uri, request.path);

        let mut builder = self
            .client
            .request(request.method, &url)
            .header("X-Request-Id", Uuid::new_v4().to_string());

        if let Some(query) = &request.query {
            builder = builder.query(&encode_query(query));
        }

        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        builder = match request.body {
            Some(RequestBody::Json(body)) => builder
                .header("Content-Type", "application/json")
                .body(serde_json::to_vec(&body)?),
            Some(RequestBody::Multipart(parts)) => builder.multipart(build_form(parts)),
            None => builder,
        };

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?;

        Ok(ApiResponse::new(status, body.to_vec()))
    }
}

fn build_form(parts: Vec<FormPart>) -> Form {
    parts.into_iter().fold(Form::new(), |form, part| match part {
        FormPart::Text { name, value } => form.text(name, value),
        FormPart::File {
            name,
            file_name,
            bytes,
        } => form.part(name, Part::bytes(bytes).file_name(file_name)),
    })
}

/// Flatten query parameters into key/value pairs.
///
/// Strings are sent as-is, other scalars in their JSON form, arrays as
/// repeated `key[]` pairs and objects as JSON text.
pub fn encode_query(query: &Map<String, Value>) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    for (key, value) in query {
        match value {
            Value::Null => {}
            Value::Array(items) => {
                let name = format!("{}[]", key);
                pairs.extend(items.iter().map(|item| (name.clone(), scalar(item))));
            }
            other => pairs.push((key.clone(), scalar(other))),
        }
    }
    pairs
}

fn scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
