//! File uploads.

use serde_json::{json, Value};
use std::fmt;
use std::path::Path;
use tokio::fs;
use tracing::debug;

use crate::client::{ApiRequest, Client, FormPart};
use crate::error::{Error, Result};
use crate::model::record::Record;
use crate::model::{take_root, Guarded, Model, Tagged};

/// A file waiting to be sent with the next save.
#[derive(Debug, Clone, PartialEq)]
struct StagedFile {
    file_name: String,
    bytes: Vec<u8>,
}

/// An uploaded file and its metadata.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Upload {
    record: Record,
    file: Option<StagedFile>,
}

impl Upload {
    pub const URI: &'static str = "/uploads";

    /// A new upload; stage a file before saving it.
    pub fn new() -> Self {
        Self::default()
    }

    /// A handle on an existing upload.
    pub fn with_uid(uid: impl Into<String>) -> Self {
        let mut upload = Self::new();
        let uid = uid.into();
        if !uid.is_empty() {
            upload.record.set("uid", uid);
            upload.record.mark_clean();
        }
        upload
    }

    /// Read a file from disk and stage it for the next save.
    pub async fn set_file(&mut self, path: impl AsRef<Path>) -> Result<&mut Self> {
        let path = path.as_ref();
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| Error::Validation(format!("{} is not a file path", path.display())))?
            .to_string();
        let bytes = fs::read(path).await?;
        debug!("Staged {} ({} bytes)", file_name, bytes.len());
        Ok(self.set_file_bytes(file_name, bytes))
    }

    /// Stage in-memory file contents for the next save.
    pub fn set_file_bytes(&mut self, file_name: impl Into<String>, bytes: Vec<u8>) -> &mut Self {
        self.file = Some(StagedFile {
            file_name: file_name.into(),
            bytes,
        });
        self
    }

    pub fn has_staged_file(&self) -> bool {
        self.file.is_some()
    }

    /// Public URL of the uploaded file.
    pub fn url(&self) -> Option<&str> {
        self.record.get_str("url")
    }

    fn uri(&self) -> String {
        match self.uid().filter(|uid| !uid.is_empty()) {
            Some(uid) => format!("{}/{}", Self::URI, uid),
            None => Self::URI.to_string(),
        }
    }

    /// Multipart body for save: the metadata as JSON in `PARAM`, plus the
    /// staged file as `upload[upload]`.
    pub fn form_parts(&self) -> Result<Vec<FormPart>> {
        let mut fields = if self.is_new() {
            self.record.as_map().clone()
        } else {
            self.record.changed_values()
        };
        fields.remove("upload");

        let mut parts = vec![FormPart::Text {
            name: "PARAM".to_string(),
            value: serde_json::to_string(&json!({ "upload": fields }))?,
        }];
        if let Some(file) = &self.file {
            parts.push(FormPart::File {
                name: "upload[upload]".to_string(),
                file_name: file.file_name.clone(),
                bytes: file.bytes.clone(),
            });
        }
        Ok(parts)
    }

    /// Reload the upload from the API.
    pub async fn sync(&mut self, client: &Client) -> Result<()> {
        if self.is_new() {
            return Err(Error::UidNotSet);
        }
        let body = client.request_json(ApiRequest::get(self.uri())).await?;
        self.hydrate(take_root(body, "upload")?)
    }

    /// Create or update the upload.
    pub async fn save(&mut self, client: &Client) -> Result<()> {
        let request = if self.is_new() {
            if self.file.is_none() {
                return Err(Error::Validation(
                    "a file must be set before creating an upload".to_string(),
                ));
            }
            ApiRequest::post(self.uri())
        } else {
            ApiRequest::put(self.uri())
        };

        let body = client
            .request_json(request.multipart(self.form_parts()?))
            .await?;
        self.hydrate(take_root(body, "upload")?)?;
        self.file = None;
        Ok(())
    }

    /// Delete the upload, then clear it locally.
    pub async fn destroy(&mut self, client: &Client) -> Result<()> {
        if self.is_new() {
            return Err(Error::UidNotSet);
        }
        client.request(ApiRequest::delete(self.uri())).await?;
        self.record.clear_all();
        self.record.mark_clean();
        Ok(())
    }
}

impl Model for Upload {
    fn record(&self) -> &Record {
        &self.record
    }

    fn record_mut(&mut self) -> &mut Record {
        &mut self.record
    }
}

impl Tagged for Upload {}

impl Guarded for Upload {}

impl fmt::Display for Upload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#<Upload uid={}>", self.uid().unwrap_or(""))
    }
}
