//! Queries over the objects of a class.
//!
//! A [`Query`] is a filter plus result options. Filters use the Mongo-style
//! operators of the built.io API and are sent under the `query` parameter.
//!
//! ```no_run
//! # async fn run(client: &builtio::client::Client) -> builtio::error::Result<()> {
//! use builtio::query::Query;
//!
//! let response = Query::for_class("people")
//!     .contained_in("name", ["James"])
//!     .greater_than("age", 30)
//!     .include_count()
//!     .exec(client)
//!     .await?;
//! println!("{} of {:?}", response.objects.len(), response.count);
//! # Ok(())
//! # }
//! ```

use serde_json::{json, Map, Value};
use tracing::debug;

use crate::client::{ApiRequest, Client};
use crate::error::{Error, Result};
use crate::model::object::Object;
use crate::model::operation::Ref;
use crate::model::user::User;
use crate::util;

/// A query builder.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    class_uid: Option<String>,
    filter: Map<String, Value>,
    options: Map<String, Value>,
}

impl Query {
    /// A query not bound to a class, for use as a sub-query or reference
    /// filter.
    pub fn new() -> Self {
        Self::default()
    }

    /// A query over the objects of `class_uid`.
    pub fn for_class(class_uid: impl Into<String>) -> Self {
        Self {
            class_uid: Some(class_uid.into()),
            ..Self::default()
        }
    }

    pub fn class_uid(&self) -> Option<&str> {
        self.class_uid.as_deref()
    }

    fn condition(mut self, field: impl Into<String>, value: Value) -> Self {
        self.filter.insert(field.into(), value);
        self
    }

    fn option(mut self, key: &str, value: Value) -> Self {
        self.options.insert(key.to_string(), value);
        self
    }

    // ===== Filters =====

    /// Field equals `value`.
    pub fn where_eq(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.condition(field, value.into())
    }

    pub fn greater_than(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.condition(field, json!({ "$gt": value.into() }))
    }

    pub fn greater_than_equal(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.condition(field, json!({ "$gte": value.into() }))
    }

    pub fn less_than(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.condition(field, json!({ "$lt": value.into() }))
    }

    pub fn less_than_equal(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.condition(field, json!({ "$lte": value.into() }))
    }

    pub fn not_equal(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.condition(field, json!({ "$ne": value.into() }))
    }

    /// Field value is one of `values`.
    pub fn contained_in<I, V>(self, field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let values: Vec<Value> = values.into_iter().map(Into::into).collect();
        self.condition(field, json!({ "$in": values }))
    }

    /// Field value is none of `values`.
    pub fn not_contained_in<I, V>(self, field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let values: Vec<Value> = values.into_iter().map(Into::into).collect();
        self.condition(field, json!({ "$nin": values }))
    }

    pub fn exists(self, field: impl Into<String>) -> Self {
        self.condition(field, json!({ "$exists": true }))
    }

    pub fn not_exists(self, field: impl Into<String>) -> Self {
        self.condition(field, json!({ "$exists": false }))
    }

    /// Reference field points at an object matching `query`.
    pub fn in_query(self, field: impl Into<String>, query: &Query) -> Self {
        let sub = Value::Object(query.filter.clone());
        self.condition(field, json!({ "$in_query": sub }))
    }

    /// Reference field points at no object matching `query`.
    pub fn not_in_query(self, field: impl Into<String>, query: &Query) -> Self {
        let sub = Value::Object(query.filter.clone());
        self.condition(field, json!({ "$nin_query": sub }))
    }

    /// Field equals `key` of some object of `class_uid` matching `query`.
    pub fn select_query(
        self,
        field: impl Into<String>,
        class_uid: &str,
        key: &str,
        query: &Query,
    ) -> Self {
        let select = select_clause(class_uid, key, query);
        self.condition(field, json!({ "$select": select }))
    }

    /// Field equals `key` of no object of `class_uid` matching `query`.
    pub fn dont_select_query(
        self,
        field: impl Into<String>,
        class_uid: &str,
        key: &str,
        query: &Query,
    ) -> Self {
        let select = select_clause(class_uid, key, query);
        self.condition(field, json!({ "$dont_select": select }))
    }

    /// Objects within `radius` meters of a point or of another object.
    pub fn near(self, center: Ref, radius: u64) -> Result<Self> {
        let coords = center.to_geo_value()?;
        Ok(self.condition("$near", json!({ "coords": coords, "radius": radius })))
    }

    /// Objects inside the polygon described by `points`.
    pub fn within(self, points: Vec<Ref>) -> Result<Self> {
        let points = points
            .iter()
            .map(Ref::to_geo_value)
            .collect::<Result<Vec<Value>>>()?;
        Ok(self.condition("$within", Value::Array(points)))
    }

    // ===== Options =====

    pub fn ascending(self, field: impl Into<String>) -> Self {
        self.option("asc", Value::String(field.into()))
    }

    pub fn descending(self, field: impl Into<String>) -> Self {
        self.option("desc", Value::String(field.into()))
    }

    pub fn limit(self, number: u64) -> Self {
        self.option("limit", json!(number))
    }

    pub fn skip(self, number: u64) -> Self {
        self.option("skip", json!(number))
    }

    /// Return only the number of matching objects.
    pub fn count(self) -> Self {
        self.option("count", Value::Bool(true))
    }

    /// Return the number of matching objects along with the results.
    pub fn include_count(self) -> Self {
        self.option("include_count", Value::Bool(true))
    }

    /// Resolve a reference field in the results. May be called repeatedly.
    pub fn include(mut self, field: impl Into<String>) -> Self {
        let field = Value::String(field.into());
        match self.options.get_mut("include") {
            Some(Value::Array(fields)) => fields.push(field),
            _ => {
                self.options
                    .insert("include".to_string(), Value::Array(vec![field]));
            }
        }
        self
    }

    pub fn include_owner(self) -> Self {
        self.option("include_owner", Value::Bool(true))
    }

    /// Include unpublished objects.
    pub fn include_drafts(self) -> Self {
        self.option("include_unpublished", Value::Bool(true))
    }

    pub fn include_schema(self) -> Self {
        self.option("include_schema", Value::Bool(true))
    }

    // ===== Output =====

    /// The filter conditions alone.
    pub fn filter(&self) -> &Map<String, Value> {
        &self.filter
    }

    /// Every parameter, with the filter under `query`.
    pub fn params(&self) -> Value {
        Value::Object(self.param_map())
    }

    fn param_map(&self) -> Map<String, Value> {
        let mut params = Map::new();
        params.insert("query".to_string(), Value::Object(self.filter.clone()));
        for (key, value) in &self.options {
            params.insert(key.clone(), value.clone());
        }
        params
    }

    /// Run the query.
    pub async fn exec(&self, client: &Client) -> Result<QueryResponse> {
        let class_uid = match self.class_uid.as_deref() {
            Some(uid) if !uid.trim().is_empty() => uid,
            _ => {
                return Err(Error::Validation(
                    "a query needs a class uid to be executed".to_string(),
                ))
            }
        };

        debug!("Querying {} with {}", class_uid, self.params());
        let request = ApiRequest::get(Object::collection_uri(class_uid)).query(self.param_map());
        let body = client.request_json(request).await?;
        QueryResponse::from_body(class_uid, body)
    }
}

fn select_clause(class_uid: &str, key: &str, query: &Query) -> Value {
    json!({
        "key": key,
        "class_uid": class_uid,
        "query": Value::Object(query.filter.clone()),
    })
}

/// Result of [`Query::exec`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResponse {
    pub objects: Vec<Object>,
    /// Set in count mode, or when the count was requested
    pub count: Option<u64>,
    /// Set when the schema was requested
    pub schema: Option<Value>,
}

impl QueryResponse {
    pub fn from_body(class_uid: &str, body: Value) -> Result<Self> {
        let mut body = match body {
            Value::Object(map) => map,
            other => {
                return Err(Error::UnexpectedResponse(format!(
                    "expected a query result object, got {}",
                    other
                )))
            }
        };

        let mut response = Self::default();
        match body.remove("objects") {
            Some(Value::Array(items)) => {
                response.objects = items
                    .into_iter()
                    .map(|item| Object::from_payload(class_uid, item))
                    .collect::<Result<_>>()?;
            }
            // In count mode `objects` holds the count itself.
            Some(Value::Number(n)) => response.count = n.as_u64(),
            _ => {}
        }

        if let Some(count) = body.get("count").filter(|v| !util::is_blank(v)) {
            response.count = count.as_u64();
        }
        response.schema = body.remove("schema").filter(|v| !util::is_blank(v));

        Ok(response)
    }

    /// The results as application users. Fails unless the query was on the
    /// user class.
    pub fn into_users(self) -> Result<Vec<User>> {
        self.objects.into_iter().map(User::try_from_object).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::location::Location;
    use crate::model::Model;

    #[test]
    fn test_filters() {
        let query = Query::for_class("people")
            .where_eq("name", "James")
            .greater_than("age", 30)
            .less_than_equal("height", 190)
            .not_equal("city", "Pune")
            .contained_in("tags", ["a", "b"])
            .not_exists("deleted");

        assert_eq!(
            query.params(),
            json!({
                "query": {
                    "name": "James",
                    "age": {"$gt": 30},
                    "height": {"$lte": 190},
                    "city": {"$ne": "Pune"},
                    "tags": {"$in": ["a", "b"]},
                    "deleted": {"$exists": false}
                }
            })
        );
    }

    #[test]
    fn test_later_condition_on_field_wins() {
        let query = Query::new().greater_than("age", 30).less_than("age", 40);
        assert_eq!(query.filter().get("age"), Some(&json!({"$lt": 40})));
    }

    #[test]
    fn test_options() {
        let query = Query::for_class("people")
            .ascending("name")
            .limit(10)
            .skip(20)
            .include_count()
            .include("friends")
            .include("owner")
            .include_owner()
            .include_drafts()
            .include_schema();

        assert_eq!(
            query.params(),
            json!({
                "query": {},
                "asc": "name",
                "limit": 10,
                "skip": 20,
                "include_count": true,
                "include": ["friends", "owner"],
                "include_owner": true,
                "include_unpublished": true,
                "include_schema": true
            })
        );
    }

    #[test]
    fn test_sub_queries() {
        let sub = Query::new().where_eq("city", "Pune");
        let query = Query::for_class("people")
            .in_query("friends", &sub)
            .not_in_query("enemies", &sub)
            .select_query("hometown", "city", "name", &sub)
            .dont_select_query("workplace", "city", "name", &sub);

        let filter = query.filter();
        assert_eq!(filter["friends"], json!({"$in_query": {"city": "Pune"}}));
        assert_eq!(filter["enemies"], json!({"$nin_query": {"city": "Pune"}}));
        assert_eq!(
            filter["hometown"],
            json!({"$select": {"key": "name", "class_uid": "city", "query": {"city": "Pune"}}})
        );
        assert_eq!(
            filter["workplace"]["$dont_select"]["class_uid"],
            json!("city")
        );
    }

    #[test]
    fn test_near_and_within() {
        let pune = Location::new(73.85, 18.52).unwrap();
        let query = Query::for_class("places")
            .near(Ref::from(pune), 1000)
            .unwrap();
        assert_eq!(
            query.filter()["$near"],
            json!({"coords": [73.85, 18.52], "radius": 1000})
        );

        let query = Query::for_class("places")
            .within(vec![Ref::from(pune), Ref::from("blt_office")])
            .unwrap();
        assert_eq!(
            query.filter()["$within"],
            json!([[73.85, 18.52], {"object": "blt_office"}])
        );
    }

    #[test]
    fn test_near_unsaved_object_rejected() {
        let unsaved = Object::new("places").unwrap();
        let result = Query::for_class("places").near(Ref::from(&unsaved), 10);
        assert!(result.is_err());
    }

    #[test]
    fn test_response_with_objects() {
        let response = QueryResponse::from_body(
            "people",
            json!({
                "objects": [{"uid": "blt1", "name": "James"}, {"uid": "blt2"}],
                "count": 2,
                "schema": []
            }),
        )
        .unwrap();

        assert_eq!(response.objects.len(), 2);
        assert_eq!(response.objects[0].uid(), Some("blt1"));
        assert_eq!(response.objects[0].class_uid(), "people");
        assert!(!response.objects[0].record().is_dirty());
        assert_eq!(response.count, Some(2));
        assert!(response.schema.is_none());
    }

    #[test]
    fn test_response_in_count_mode() {
        let response = QueryResponse::from_body("people", json!({"objects": 42})).unwrap();
        assert!(response.objects.is_empty());
        assert_eq!(response.count, Some(42));
    }

    #[test]
    fn test_response_not_an_object() {
        let err = QueryResponse::from_body("people", json!([1, 2])).unwrap_err();
        assert!(matches!(err, Error::UnexpectedResponse(_)));
    }

    #[test]
    fn test_into_users() {
        let users = QueryResponse::from_body(
            crate::USER_CLASS_UID,
            json!({"objects": [{"uid": "blt1", "email": "j@example.com"}]}),
        )
        .unwrap()
        .into_users()
        .unwrap();
        assert_eq!(users[0].email(), Some("j@example.com"));

        let people = QueryResponse::from_body("people", json!({"objects": [{"uid": "b"}]})).unwrap();
        assert!(people.into_users().is_err());
    }
}
