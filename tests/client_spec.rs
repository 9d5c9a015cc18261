use std::sync::Arc;

use chrono::NaiveDate;
use questmate::api::{create_router, AppState, SecurityConfig};
use questmate::catalog::Catalog;
use questmate::client::{ClientError, QuestClient};
use questmate::db::{Database, StoreError};
use questmate::executor::ExecutionError;
use questmate::models::*;

fn echo(source: &str) -> Result<String, ExecutionError> {
    Ok(source.to_string())
}

/// Serve the API on an ephemeral port and return its base URL.
async fn spawn_server(security: SecurityConfig) -> (String, Database) {
    let db = Database::open_memory().expect("Failed to create database");
    db.migrate().expect("Failed to migrate");
    let catalog = Arc::new(Catalog::builtin().expect("Failed to load catalog"));

    let mut user = UserProgress::new("ada", "MIT", NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
    user.current_skill = Some("Python".into());
    user.levels.insert("Python".into(), 1);
    db.create_user(&user).expect("Failed to create user");

    let state = AppState::new(db.clone(), catalog, Arc::new(echo));
    let app = create_router(state, security);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}/api/v1", addr), db)
}

#[tokio::test]
async fn submit_returns_passing_result() {
    let (url, db) = spawn_server(SecurityConfig::disabled()).await;
    let client = QuestClient::new(url, None);

    let result = client.submit("ada", "Hello, World!\n").await.unwrap();

    assert!(result.success);
    assert_eq!(result.new_level, Some(2));
    assert_eq!(db.get_user("ada").unwrap().unwrap().level_in("Python"), 2);
}

#[tokio::test]
async fn submit_parses_failing_result() {
    let (url, _db) = spawn_server(SecurityConfig::disabled()).await;
    let client = QuestClient::new(url, None);

    let result = client.submit("ada", "Goodbye\n").await.unwrap();

    assert!(!result.success);
    assert_eq!(result.captured_output, "Goodbye\n");
}

#[tokio::test]
async fn submit_without_skill_is_bad_request() {
    let (url, db) = spawn_server(SecurityConfig::disabled()).await;
    db.mutate_user("ada", |u| {
        u.current_skill = None;
        Ok::<_, StoreError>(())
    })
    .unwrap();
    let client = QuestClient::new(url, None);

    let err = client.submit("ada", "x").await.unwrap_err();

    assert!(matches!(err, ClientError::BadRequest(msg) if msg == "Please select a skill first"));
}

#[tokio::test]
async fn dashboard_and_skills_round_trip() {
    let (url, _db) = spawn_server(SecurityConfig::disabled()).await;
    let client = QuestClient::new(url, None);

    client.health().await.unwrap();

    let dashboard = client.dashboard("ada").await.unwrap();
    assert_eq!(dashboard.user.username, "ada");
    assert!(matches!(dashboard.current_task, CurrentTask::Active { level: 1, .. }));

    let skills = client.skills().await.unwrap();
    assert_eq!(skills.len(), 3);

    let err = client.dashboard("ghost").await.unwrap_err();
    assert!(matches!(err, ClientError::NotFound(_)));
}

#[tokio::test]
async fn api_key_is_sent_as_bearer_token() {
    let (url, _db) = spawn_server(SecurityConfig::with_api_key("secret")).await;

    let anonymous = QuestClient::new(url.clone(), None);
    assert!(matches!(
        anonymous.dashboard("ada").await.unwrap_err(),
        ClientError::Unauthorized
    ));

    let authorised = QuestClient::new(url, Some("secret".to_string()));
    authorised.dashboard("ada").await.unwrap();
}
