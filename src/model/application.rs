//! The application the client is bound to.

use std::fmt;

use crate::client::{ApiRequest, Client};
use crate::error::Result;
use crate::model::record::Record;
use crate::model::{take_root, Model};

/// A built.io application.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Application {
    record: Record,
}

impl Application {
    pub const URI: &'static str = "/applications/myapp";

    /// Fetch the application the API key belongs to.
    pub async fn get(client: &Client) -> Result<Self> {
        let body = client.request_json(ApiRequest::get(Self::URI)).await?;
        let mut app = Self::default();
        app.hydrate(take_root(body, "application")?)?;
        Ok(app)
    }

    pub fn api_key(&self) -> Option<&str> {
        self.record.get_str("api_key")
    }

    pub fn name(&self) -> Option<&str> {
        self.record.get_str("name")
    }
}

impl Model for Application {
    fn record(&self) -> &Record {
        &self.record
    }

    fn record_mut(&mut self) -> &mut Record {
        &mut self.record
    }
}

impl fmt::Display for Application {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#<Application uid={}, api_key={}>",
            self.uid().unwrap_or(""),
            self.api_key().unwrap_or("")
        )
    }
}
