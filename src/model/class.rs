//! Classes: the schemas grouping objects.

use serde_json::Value;
use std::fmt;

use crate::client::{ApiRequest, Client};
use crate::error::{Error, Result};
use crate::model::record::Record;
use crate::model::{take_root, Model};
use crate::util;

/// A class of objects.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Class {
    record: Record,
}

impl Class {
    /// Path of the class collection, or of one class.
    pub fn uri(uid: Option<&str>) -> String {
        match uid {
            Some(uid) => format!("/classes/{}", uid),
            None => "/classes".to_string(),
        }
    }

    /// Fetch every class of the application.
    pub async fn get_all(client: &Client) -> Result<Vec<Self>> {
        let body = client.request_json(ApiRequest::get(Self::uri(None))).await?;
        match take_root(body, "classes")? {
            Value::Array(items) => items
                .into_iter()
                .map(|item| {
                    let mut class = Self::default();
                    class.hydrate(item)?;
                    Ok(class)
                })
                .collect(),
            other => Err(Error::UnexpectedResponse(format!(
                "expected a list of classes, got {}",
                other
            ))),
        }
    }

    /// Fetch one class by uid.
    pub async fn get(client: &Client, uid: &str) -> Result<Self> {
        util::require("class uid", uid)?;
        let body = client
            .request_json(ApiRequest::get(Self::uri(Some(uid))))
            .await?;
        let mut class = Self::default();
        class.hydrate(take_root(body, "class")?)?;
        Ok(class)
    }

    pub fn title(&self) -> Option<&str> {
        self.record.get_str("title")
    }

    /// Whether this class is provided by built.io itself.
    pub fn is_inbuilt_class(&self) -> bool {
        self.record.get_bool("inbuilt_class") == Some(true)
    }

    /// Field definitions, as returned by the API.
    pub fn schema(&self) -> Option<&Value> {
        self.record.get("schema")
    }
}

impl Model for Class {
    fn record(&self) -> &Record {
        &self.record
    }

    fn record_mut(&mut self) -> &mut Record {
        &mut self.record
    }
}

impl fmt::Display for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#<Class uid={}, title={}>",
            self.uid().unwrap_or(""),
            self.title().unwrap_or("")
        )
    }
}
