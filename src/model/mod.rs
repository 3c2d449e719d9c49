//! Resource models built on change-tracked records.
//!
//! - `record` - The change-tracked key/value store
//! - `operation` - Pending server-side field operations and references
//! - `acl` - Access-control lists
//! - `location` - Longitude/latitude pairs
//! - `application`, `class`, `object`, `user`, `upload` - Resource types

pub mod acl;
pub mod application;
pub mod class;
pub mod location;
pub mod object;
pub mod operation;
pub mod record;
pub mod upload;
pub mod user;

pub use acl::{Acl, AclEntry, AclOp, Permissions};
pub use application::Application;
pub use class::Class;
pub use location::Location;
pub use object::{Object, SaveOptions};
pub use operation::{PendingOperation, PullTarget, Ref};
pub use record::{Change, Record};
pub use upload::Upload;
pub use user::User;

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::error::{Error, Result};

/// Field holding the uid of the user who owns a record.
const OWNER_FIELD: &str = "app_user_object_uid";

/// Behavior shared by every resource wrapping a [`Record`].
pub trait Model {
    fn record(&self) -> &Record;

    fn record_mut(&mut self) -> &mut Record;

    /// Current value of a field.
    fn get(&self, key: &str) -> Option<&Value> {
        self.record().get(key)
    }

    /// Write a field; the change is tracked.
    fn set(&mut self, key: impl Into<String>, value: impl Into<Value>)
    where
        Self: Sized,
    {
        self.record_mut().set(key, value);
    }

    fn uid(&self) -> Option<&str> {
        self.record().get_str("uid")
    }

    /// Whether the resource has not been persisted yet.
    fn is_new(&self) -> bool {
        self.uid().map_or(true, str::is_empty)
    }

    /// Replace the record with a server payload and mark it clean.
    fn hydrate(&mut self, payload: Value) -> Result<()> {
        match payload {
            Value::Object(data) => {
                let record = self.record_mut();
                record.replace_all(data);
                record.mark_clean();
                Ok(())
            }
            other => Err(Error::UnexpectedResponse(format!(
                "expected an object payload, got {}",
                other
            ))),
        }
    }

    fn created_at(&self) -> Result<Option<DateTime<Utc>>> {
        parse_timestamp(self.record().get("created_at"))
    }

    fn updated_at(&self) -> Result<Option<DateTime<Utc>>> {
        parse_timestamp(self.record().get("updated_at"))
    }

    fn deleted_at(&self) -> Result<Option<DateTime<Utc>>> {
        parse_timestamp(self.record().get("deleted_at"))
    }
}

/// Tag helpers over the `tags` array field.
pub trait Tagged: Model + Sized {
    fn tags(&self) -> Vec<String> {
        self.record()
            .get("tags")
            .and_then(Value::as_array)
            .map(|tags| {
                tags.iter()
                    .filter_map(Value::as_str)
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Append tags; duplicates are kept.
    fn add_tags<I, S>(&mut self, tags: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut current = self.tags();
        current.extend(tags.into_iter().map(Into::into));
        self.set("tags", current);
        self
    }

    /// Remove every tag equal to one of `tags`.
    fn remove_tags<I, S>(&mut self, tags: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let removed: Vec<String> = tags.into_iter().map(Into::into).collect();
        let remaining: Vec<String> = self
            .tags()
            .into_iter()
            .filter(|t| !removed.contains(t))
            .collect();
        self.set("tags", remaining);
        self
    }
}

/// ACL helpers over the `ACL` field.
pub trait Guarded: Model + Sized {
    fn acl(&self) -> Acl {
        let record = self.record();
        Acl::from_value(record.get("ACL"), record.get_str(OWNER_FIELD))
    }

    /// Like [`Guarded::acl`], failing on a malformed `ACL` field.
    fn try_acl(&self) -> Result<Acl> {
        let record = self.record();
        Acl::try_from_value(record.get("ACL"), record.get_str(OWNER_FIELD))
    }

    fn set_acl(&mut self, acl: &Acl) -> &mut Self {
        self.set("ACL", acl.to_value());
        self
    }
}

fn parse_timestamp(value: Option<&Value>) -> Result<Option<DateTime<Utc>>> {
    match value {
        Some(Value::String(s)) => Ok(Some(DateTime::parse_from_rfc3339(s)?.with_timezone(&Utc))),
        Some(Value::Null) | None => Ok(None),
        Some(other) => Err(Error::UnexpectedResponse(format!(
            "expected a timestamp string, got {}",
            other
        ))),
    }
}

/// Take the payload under `root` out of a response body.
pub(crate) fn take_root(mut body: Value, root: &str) -> Result<Value> {
    match body.get_mut(root).map(Value::take) {
        Some(payload) if !payload.is_null() => Ok(payload),
        _ => Err(Error::UnexpectedResponse(format!(
            "response is missing `{}`",
            root
        ))),
    }
}
