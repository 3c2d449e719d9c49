//! Object persistence against a mock built.io API.

mod common;

use builtio::error::Error;
use builtio::model::{Guarded, Model, Object, PendingOperation, SaveOptions, Tagged};
use chrono::{TimeZone, Utc};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{client_for, API_KEY};

fn james() -> Object {
    Object::from_payload(
        "person",
        json!({"uid": "blt1", "name": "James", "age": 30, "score": 10, "tags": ["a"]}),
    )
    .unwrap()
}

// ── sync ────────────────────────────────────────────────────────

#[tokio::test]
async fn sync_hydrates_object() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/classes/person/objects/blt1"))
        .and(header("application_api_key", API_KEY))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "object": {
                "uid": "blt1",
                "name": "James",
                "created_at": "2024-01-02T03:04:05.000Z",
                "published": true
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let mut object = Object::with_uid("person", "blt1").unwrap();
    object.sync(&client).await.unwrap();

    assert_eq!(object.get("name"), Some(&json!("James")));
    assert!(object.is_published());
    assert!(!object.record().is_dirty());
    assert_eq!(
        object.created_at().unwrap(),
        Some(Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap())
    );
}

#[tokio::test]
async fn sync_without_uid_sends_nothing() {
    let server = MockServer::start().await;
    let client = client_for(&server);

    let mut object = Object::new("person").unwrap();
    let err = object.sync(&client).await.unwrap_err();

    assert!(matches!(err, Error::UidNotSet));
    assert!(server.received_requests().await.unwrap().is_empty());
}

// ── save ────────────────────────────────────────────────────────

#[tokio::test]
async fn save_new_object_posts_all_fields() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/classes/person/objects"))
        .and(body_json(json!({"object": {"name": "James", "age": 30}})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "object": {"uid": "blt_new", "name": "James", "age": 30}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let mut object = Object::new("person").unwrap();
    object.set("name", "James");
    object.set("age", 30);
    object.save(&client, &SaveOptions::default()).await.unwrap();

    assert_eq!(object.uid(), Some("blt_new"));
    assert!(!object.is_new());
    assert!(!object.record().is_dirty());
}

#[tokio::test]
async fn save_existing_object_puts_changed_fields_only() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/classes/person/objects/blt1"))
        .and(body_json(json!({"object": {"age": 31, "tags": null}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "object": {"uid": "blt1", "name": "James", "age": 31, "score": 10}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let mut object = james();
    object.set("age", 31);
    object.record_mut().delete("tags");
    object.save(&client, &SaveOptions::default()).await.unwrap();

    assert_eq!(object.get("age"), Some(&json!(31)));
    assert!(object.get("tags").is_none());
    assert!(!object.record().is_dirty());
}

#[tokio::test]
async fn save_with_options() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/classes/person/objects/blt1"))
        .and(header("timeless", "true"))
        .and(query_param("include_owner", "true"))
        .and(query_param("include[]", "friends"))
        .and(body_json(json!({"object": {"published": false}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "object": {"uid": "blt1", "published": false}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let mut object = Object::from_payload("person", json!({"uid": "blt1", "published": true}))
        .unwrap();
    let options = SaveOptions {
        timeless: true,
        draft: true,
        include_owner: true,
        include: vec!["friends".to_string()],
    };
    object.save(&client, &options).await.unwrap();

    assert!(!object.is_published());
}

#[tokio::test]
async fn save_sends_pending_operations() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/classes/person/objects/blt1"))
        .and(body_json(json!({
            "object": {
                "score": {"ADD": 5},
                "tags": {"PUSH": {"data": ["b"]}}
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "object": {"uid": "blt1", "score": 15, "tags": ["a", "b"]}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let mut object = james();
    object
        .increment("score", 5)
        .unwrap()
        .push_value("tags", ["b"], None)
        .unwrap();
    assert_eq!(
        object.pending_operation("score"),
        Some(PendingOperation::Increment(5))
    );

    object.save(&client, &SaveOptions::default()).await.unwrap();

    assert_eq!(object.get("score"), Some(&json!(15)));
    assert_eq!(object.tags(), vec!["a", "b"]);
    assert!(object.pending_operation("score").is_none());
}

#[tokio::test]
async fn failed_save_keeps_local_state() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/classes/person/objects/blt1"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "error_code": "422",
            "error_message": "bad field",
            "errors": {"age": ["is not a number"]}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let mut object = james();
    object.set("age", "thirty");
    let before = object.clone();

    let err = object
        .save(&client, &SaveOptions::default())
        .await
        .unwrap_err();

    assert_eq!(err.error_code(), Some("422"));
    assert_eq!(err.error_message(), Some("bad field"));
    assert_eq!(err.status(), Some(422));
    assert_eq!(object, before);
    assert!(object.record().is_field_dirty("age"));
}

#[tokio::test]
async fn failed_draft_save_keeps_local_state() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/classes/person/objects/blt1"))
        .and(body_json(json!({"object": {"published": false}})))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "error_code": "422",
            "error_message": "bad field"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let mut object = Object::from_payload("person", json!({"uid": "blt1", "published": true}))
        .unwrap();
    let before = object.clone();
    let options = SaveOptions {
        draft: true,
        ..SaveOptions::default()
    };

    let err = object.save(&client, &options).await.unwrap_err();

    assert_eq!(err.error_code(), Some("422"));
    assert_eq!(object, before);
    assert!(object.is_published());
    assert!(object.record().changed_fields().is_empty());
}

#[tokio::test]
async fn tags_and_acl_are_saved_as_fields() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/classes/person/objects/blt1"))
        .and(body_json(json!({
            "object": {
                "tags": ["a", "vip"],
                "ACL": {
                    "disable": false,
                    "others": {"read": true},
                    "users": [],
                    "roles": []
                }
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "object": {
                "uid": "blt1",
                "tags": ["a", "vip"],
                "ACL": {"others": {"read": true}}
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let mut object = james();
    object.add_tags(["vip"]);
    let mut acl = object.acl();
    acl.others_read(true);
    object.set_acl(&acl);

    object.save(&client, &SaveOptions::default()).await.unwrap();

    assert!(object.acl().can_user_read("blt_anyone"));
}

// ── destroy ─────────────────────────────────────────────────────

#[tokio::test]
async fn destroy_clears_object() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/classes/person/objects/blt1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "notice": "Woops! Object deleted successfully"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let mut object = james();
    object.destroy(&client).await.unwrap();

    assert!(object.record().is_empty());
    assert!(object.is_new());
    assert!(!object.record().is_dirty());
}

#[tokio::test]
async fn destroy_failure_is_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/classes/person/objects/blt1"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error_code": 141,
            "error_message": "Object not found"
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let mut object = james();
    let err = object.destroy(&client).await.unwrap_err();

    assert_eq!(err.error_code(), Some("141"));
    assert_eq!(object.uid(), Some("blt1"));
}
