use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use base64::{Engine as _, prelude::*};
use http_body_util::BodyExt;
use sea_orm::Database;
use serde_json::{Value, json};
use tower::ServiceExt;

use engine::{Engine, UserNew};
use migration::MigratorTrait;
use server::{ServerState, router};

const ROOT: (&str, &str) = ("root", "root-password");
const ALICE: (&str, &str) = ("alice", "alice-password");
const BOB: (&str, &str) = ("bob", "bob-password");

async fn app() -> Router {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder().database(db).build().await.unwrap();
    for ((username, password), is_superuser) in [(ROOT, true), (ALICE, false), (BOB, false)] {
        engine
            .create_user(UserNew {
                username: username.to_string(),
                password: password.to_string(),
                is_superuser,
            })
            .await
            .unwrap();
    }
    router(ServerState {
        engine: Arc::new(engine),
    })
}

async fn call(
    app: &Router,
    method: Method,
    uri: &str,
    credentials: Option<(&str, &str)>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some((username, password)) = credentials {
        let token = BASE64_STANDARD.encode(format!("{username}:{password}"));
        builder = builder.header(header::AUTHORIZATION, format!("Basic {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

fn new_project(name: &str, target: i64) -> Value {
    json!({
        "name": name,
        "description": format!("{name} needs funding"),
        "target_amount": target,
    })
}

#[tokio::test]
async fn anyone_can_list_projects() {
    let app = app().await;
    let (status, _) = call(
        &app,
        Method::POST,
        "/projects",
        Some(ROOT),
        Some(new_project("Shelter", 1000)),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = call(&app, Method::GET, "/projects", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["name"], "Shelter");
    assert_eq!(body[0]["invested_amount"], 0);

    let id = body[0]["id"].as_i64().unwrap();
    let (status, body) = call(&app, Method::GET, &format!("/projects/{id}"), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["target_amount"], 1000);
}

#[tokio::test]
async fn project_writes_need_a_superuser() {
    let app = app().await;

    let (status, _) = call(
        &app,
        Method::POST,
        "/projects",
        None,
        Some(new_project("Shelter", 1000)),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = call(
        &app,
        Method::POST,
        "/projects",
        Some(ALICE),
        Some(new_project("Shelter", 1000)),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = call(&app, Method::GET, "/report", Some(ALICE), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = call(&app, Method::GET, "/donations", Some(BOB), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn wrong_credentials_are_rejected() {
    let app = app().await;

    let (status, _) = call(
        &app,
        Method::GET,
        "/projects",
        Some(("alice", "not-her-password")),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn donation_is_allocated_and_owned_by_caller() {
    let app = app().await;
    let (_, project) = call(
        &app,
        Method::POST,
        "/projects",
        Some(ROOT),
        Some(new_project("Library", 300)),
    )
    .await;
    let project_id = project["id"].as_i64().unwrap();

    let (status, created) = call(
        &app,
        Method::POST,
        "/donations",
        Some(ALICE),
        Some(json!({ "pledged_amount": 500, "comment": "books" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["pledged_amount"], 500);
    assert!(created.get("invested_amount").is_none());

    let (status, mine) = call(&app, Method::GET, "/donations/my", Some(ALICE), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(mine.as_array().unwrap().len(), 1);
    assert_eq!(mine[0]["invested_amount"], 300);
    assert_eq!(mine[0]["fully_allocated"], false);

    let (_, mine) = call(&app, Method::GET, "/donations/my", Some(BOB), None).await;
    assert!(mine.as_array().unwrap().is_empty());

    let (_, project) = call(
        &app,
        Method::GET,
        &format!("/projects/{project_id}"),
        None,
        None,
    )
    .await;
    assert_eq!(project["fully_funded"], true);
    assert!(project["closed_at"].is_string());
}

#[tokio::test]
async fn anonymous_cannot_donate() {
    let app = app().await;

    let (status, _) = call(
        &app,
        Method::POST,
        "/donations",
        None,
        Some(json!({ "pledged_amount": 500 })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn donation_ledger_is_private_to_owner() {
    let app = app().await;
    call(
        &app,
        Method::POST,
        "/projects",
        Some(ROOT),
        Some(new_project("Orchard", 100)),
    )
    .await;
    let (_, created) = call(
        &app,
        Method::POST,
        "/donations",
        Some(ALICE),
        Some(json!({ "pledged_amount": 100 })),
    )
    .await;
    let uri = format!("/donations/{}/allocations", created["id"]);

    let (status, rows) = call(&app, Method::GET, &uri, Some(ALICE), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(rows.as_array().unwrap().len(), 1);
    assert_eq!(rows[0]["amount"], 100);

    let (status, _) = call(&app, Method::GET, &uri, Some(BOB), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, rows) = call(&app, Method::GET, &uri, Some(ROOT), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(rows.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn engine_errors_map_to_statuses() {
    let app = app().await;

    let (status, _) = call(&app, Method::GET, "/projects/99", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = call(
        &app,
        Method::POST,
        "/projects",
        Some(ROOT),
        Some(new_project("Shelter", 0)),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    call(
        &app,
        Method::POST,
        "/projects",
        Some(ROOT),
        Some(new_project("Shelter", 100)),
    )
    .await;
    let (status, body) = call(
        &app,
        Method::POST,
        "/projects",
        Some(ROOT),
        Some(new_project("shelter", 100)),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn edit_and_delete_follow_project_state() {
    let app = app().await;
    let (_, project) = call(
        &app,
        Method::POST,
        "/projects",
        Some(ROOT),
        Some(new_project("School", 500)),
    )
    .await;
    let uri = format!("/projects/{}", project["id"]);
    call(
        &app,
        Method::POST,
        "/donations",
        Some(ALICE),
        Some(json!({ "pledged_amount": 200 })),
    )
    .await;

    let (status, _) = call(
        &app,
        Method::PATCH,
        &uri,
        Some(ROOT),
        Some(json!({ "target_amount": 100 })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = call(&app, Method::DELETE, &uri, Some(ROOT), None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, body) = call(
        &app,
        Method::PATCH,
        &uri,
        Some(ROOT),
        Some(json!({ "target_amount": 200 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["fully_funded"], true);

    let (status, rows) = call(&app, Method::GET, "/report", Some(ROOT), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(rows.as_array().unwrap().len(), 1);
    assert_eq!(rows[0]["days_to_close"], 0);
}

#[tokio::test]
async fn unknown_fields_are_rejected() {
    let app = app().await;

    let (status, body) = call(
        &app,
        Method::POST,
        "/donations",
        Some(ALICE),
        Some(json!({ "pledged_amount": 10, "invested_amount": 10 })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].as_str().unwrap().contains("invested_amount"));

    let (_, mine) = call(&app, Method::GET, "/donations/my", Some(ALICE), None).await;
    assert!(mine.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn body_without_json_content_type_gets_json_error() {
    let app = app().await;
    let token = BASE64_STANDARD.encode(format!("{}:{}", ROOT.0, ROOT.1));
    let request = Request::builder()
        .method(Method::POST)
        .uri("/projects")
        .header(header::AUTHORIZATION, format!("Basic {token}"))
        .body(Body::from(new_project("Shelter", 100).to_string()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert!(body["error"].is_string());
}
