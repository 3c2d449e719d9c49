//! Objects: the unit of data in built.io.

use serde_json::{json, Map, Value};
use std::fmt;

use crate::client::{ApiRequest, Client};
use crate::error::{Error, Result};
use crate::model::class::Class;
use crate::model::location::Location;
use crate::model::operation::{PendingOperation, PullTarget, Ref};
use crate::model::record::Record;
use crate::model::{take_root, Guarded, Model, Tagged};
use crate::query::Query;
use crate::util;
use crate::LOCATION_PATH;

/// Options for [`Object::save`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SaveOptions {
    /// Update without touching `updated_at` (updates only)
    pub timeless: bool,
    /// Save as an unpublished draft
    pub draft: bool,
    /// Include the owner in the response
    pub include_owner: bool,
    /// Reference fields to include in the response
    pub include: Vec<String>,
}

/// An object of a class.
#[derive(Debug, Clone, PartialEq)]
pub struct Object {
    class_uid: String,
    record: Record,
}

impl Object {
    /// A new, unsaved object of the given class.
    pub fn new(class_uid: impl Into<String>) -> Result<Self> {
        let class_uid = class_uid.into();
        util::require("class uid", &class_uid)?;
        Ok(Self {
            class_uid,
            record: Record::new(),
        })
    }

    /// An object of one of the built-in classes, whose uids are never blank.
    pub(crate) fn of_builtin_class(class_uid: &'static str) -> Self {
        Self {
            class_uid: class_uid.to_string(),
            record: Record::new(),
        }
    }

    /// A handle on an existing object; call [`Object::sync`] to load it.
    pub fn with_uid(class_uid: impl Into<String>, uid: impl Into<String>) -> Result<Self> {
        let mut object = Self::new(class_uid)?;
        let uid = uid.into();
        if !uid.is_empty() {
            object.record.set("uid", uid);
        }
        object.record.mark_clean();
        Ok(object)
    }

    /// An object hydrated from a server payload.
    pub fn from_payload(class_uid: impl Into<String>, payload: Value) -> Result<Self> {
        let mut object = Self::new(class_uid)?;
        object.hydrate(payload)?;
        Ok(object)
    }

    pub fn class_uid(&self) -> &str {
        &self.class_uid
    }

    /// Path of the object collection of a class.
    pub fn collection_uri(class_uid: &str) -> String {
        format!("{}/objects", Class::uri(Some(class_uid)))
    }

    fn uri(&self) -> String {
        match self.uid().filter(|uid| !uid.is_empty()) {
            Some(uid) => format!("{}/{}", Self::collection_uri(&self.class_uid), uid),
            None => Self::collection_uri(&self.class_uid),
        }
    }

    /// Body sent on save: every field when new, only changed fields
    /// otherwise, wrapped under `object`.
    pub fn write_payload(&self) -> Value {
        let fields = if self.is_new() {
            self.record.as_map().clone()
        } else {
            self.record.changed_values()
        };
        json!({ "object": fields })
    }

    /// Reload the object from the API.
    pub async fn sync(&mut self, client: &Client) -> Result<()> {
        if self.is_new() {
            return Err(Error::UidNotSet);
        }
        let body = client.request_json(ApiRequest::get(self.uri())).await?;
        self.hydrate(take_root(body, "object")?)
    }

    /// Create or update the object.
    ///
    /// On success the record is replaced by the server's copy. On failure
    /// the record is left as it was.
    pub async fn save(&mut self, client: &Client, options: &SaveOptions) -> Result<()> {
        let mut payload = self.write_payload();
        if options.draft {
            if let Some(fields) = payload.get_mut("object").and_then(Value::as_object_mut) {
                fields.insert("published".to_string(), Value::Bool(false));
            }
        }

        let mut query = Map::new();
        if options.include_owner {
            query.insert("include_owner".to_string(), Value::Bool(true));
        }
        if !options.include.is_empty() {
            query.insert("include".to_string(), json!(options.include));
        }

        let request = if self.is_new() {
            ApiRequest::post(self.uri())
        } else if options.timeless {
            ApiRequest::put(self.uri()).header("timeless", "true")
        } else {
            ApiRequest::put(self.uri())
        };
        let request = request.json(payload).query(query);

        let body = client.request_json(request).await?;
        self.hydrate(take_root(body, "object")?)
    }

    /// Delete the object, then clear it locally.
    pub async fn destroy(&mut self, client: &Client) -> Result<()> {
        if self.is_new() {
            return Err(Error::UidNotSet);
        }
        client.request(ApiRequest::delete(self.uri())).await?;
        self.record.clear_all();
        self.record.mark_clean();
        Ok(())
    }

    /// Fetch the class this object belongs to.
    pub async fn get_class(&self, client: &Client) -> Result<Class> {
        Class::get(client, &self.class_uid).await
    }

    // ===== References =====

    /// Assign references. Unsaved objects are created inline by the server.
    pub fn set_reference<I>(&mut self, path: &str, refs: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = Ref>,
    {
        util::require("path", path)?;
        let values = refs
            .into_iter()
            .map(|r| r.to_reference_value())
            .collect::<Result<Vec<Value>>>()?;
        self.record.set(path, values);
        Ok(self)
    }

    /// Assign as references every object of the referred class matching
    /// `query`.
    pub fn set_reference_where(&mut self, path: &str, query: &Query) -> Result<&mut Self> {
        util::require("path", path)?;
        self.record
            .set(path, json!({ "WHERE": Value::Object(query.filter().clone()) }));
        Ok(self)
    }

    // ===== Field operations =====

    fn apply(&mut self, path: &str, op: PendingOperation) -> Result<&mut Self> {
        util::require("path", path)?;
        self.record.set(path, op.to_value());
        Ok(self)
    }

    /// Add `by` to a number field on the server.
    pub fn increment(&mut self, path: &str, by: i64) -> Result<&mut Self> {
        self.apply(path, PendingOperation::Increment(by))
    }

    pub fn increment_by_one(&mut self, path: &str) -> Result<&mut Self> {
        self.increment(path, 1)
    }

    /// Subtract `by` from a number field on the server.
    pub fn decrement(&mut self, path: &str, by: i64) -> Result<&mut Self> {
        self.apply(path, PendingOperation::Decrement(by))
    }

    pub fn decrement_by_one(&mut self, path: &str) -> Result<&mut Self> {
        self.decrement(path, 1)
    }

    pub fn multiply(&mut self, path: &str, by: i64) -> Result<&mut Self> {
        self.apply(path, PendingOperation::Multiply(by))
    }

    pub fn divide(&mut self, path: &str, by: i64) -> Result<&mut Self> {
        if by == 0 {
            return Err(Error::Validation(format!("cannot divide {} by zero", path)));
        }
        self.apply(path, PendingOperation::Divide(by))
    }

    /// Insert values into an array field, at `index` or at the end.
    pub fn push_value<I, V>(&mut self, path: &str, values: I, index: Option<usize>) -> Result<&mut Self>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let data = values.into_iter().map(Into::into).collect();
        self.apply(path, PendingOperation::Push { data, index })
    }

    /// Remove every element equal to one of `values` from an array field.
    pub fn pull_values<I, V>(&mut self, path: &str, values: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let data: Vec<Value> = values.into_iter().map(Into::into).collect();
        if data.is_empty() {
            return Err(Error::Validation(
                "pull needs at least one value".to_string(),
            ));
        }
        self.apply(path, PendingOperation::Pull(PullTarget::Data(data)))
    }

    /// Remove the element at `index` from an array field.
    pub fn pull_index(&mut self, path: &str, index: usize) -> Result<&mut Self> {
        self.apply(path, PendingOperation::Pull(PullTarget::Index(index)))
    }

    /// Replace the element at `index` of an array field.
    pub fn update_value(&mut self, path: &str, value: impl Into<Value>, index: usize) -> Result<&mut Self> {
        self.apply(
            path,
            PendingOperation::Update {
                data: value.into(),
                index,
            },
        )
    }

    /// Operation waiting on a field for the next save.
    pub fn pending_operation(&self, path: &str) -> Option<PendingOperation> {
        if !self.record.is_field_dirty(path) {
            return None;
        }
        self.record
            .get(path)
            .map(PendingOperation::from_value)
            .filter(PendingOperation::is_operator)
    }

    // ===== Location =====

    pub fn location(&self) -> Option<Location> {
        self.record.get(LOCATION_PATH).and_then(Location::from_wire)
    }

    pub fn set_location(&mut self, location: Location) -> &mut Self {
        self.record.set(LOCATION_PATH, location.to_wire());
        self
    }

    // ===== Publishing =====

    /// Version number of the object.
    pub fn version(&self) -> Option<i64> {
        self.record.get_i64("_version")
    }

    pub fn publish(&mut self) -> &mut Self {
        self.record.set("published", true);
        self
    }

    pub fn unpublish(&mut self) -> &mut Self {
        self.record.set("published", false);
        self
    }

    pub fn is_published(&self) -> bool {
        self.record.get_bool("published") == Some(true)
    }
}

impl Model for Object {
    fn record(&self) -> &Record {
        &self.record
    }

    fn record_mut(&mut self) -> &mut Record {
        &mut self.record
    }
}

impl Tagged for Object {}

impl Guarded for Object {}

impl From<&Object> for Ref {
    /// Saved objects are referenced by uid, unsaved ones inline.
    fn from(object: &Object) -> Self {
        match object.uid() {
            Some(uid) if !uid.is_empty() => Ref::Identifier(uid.to_string()),
            _ => Ref::InlineRecord(object.record.clone()),
        }
    }
}

impl fmt::Display for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#<Object uid={}, class_uid={}>",
            self.uid().unwrap_or(""),
            self.class_uid
        )
    }
}
