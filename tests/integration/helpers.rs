//! Shared test helpers for integration tests.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use http::{Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use studyhub_api::state::AppState;
use studyhub_core::config::AppConfig;
use studyhub_database::MemoryStore;
use studyhub_entity::achievement::{Achievement, RequirementType};
use studyhub_realtime::RealtimeEngine;
use studyhub_service::{AchievementService, ManualSessionService, ProgressionService};

/// Test application context backed by the in-memory store.
pub struct TestApp {
    /// The Axum router for making test requests
    pub router: Router,
    /// Direct handle to the backing store
    pub store: Arc<MemoryStore>,
    /// The realtime engine hosting the relay
    pub engine: Arc<RealtimeEngine>,
}

impl TestApp {
    /// Create a new test application.
    pub fn new() -> Self {
        let config = AppConfig {
            server: Default::default(),
            database: studyhub_core::config::database::DatabaseConfig {
                url: "postgres://unused".to_string(),
                max_connections: 1,
                min_connections: 1,
                connect_timeout_seconds: 1,
            },
            realtime: Default::default(),
            client: Default::default(),
            logging: Default::default(),
        };

        let store = Arc::new(MemoryStore::new());
        let engine = Arc::new(RealtimeEngine::new(config.realtime.clone()));

        let progression = ProgressionService::new(store.clone());
        let achievements = AchievementService::new(
            store.clone(),
            store.clone(),
            store.clone(),
            progression.clone(),
        );
        let manual_sessions =
            ManualSessionService::new(store.clone(), progression, achievements.clone());

        let state = AppState {
            config: Arc::new(config),
            profiles: store.clone(),
            sessions: store.clone(),
            groups: store.clone(),
            manual_sessions,
            achievements,
            engine: engine.clone(),
        };

        Self {
            router: studyhub_api::router::build_router(state),
            store,
            engine,
        }
    }

    /// Serve the app on an ephemeral port; returns its address.
    pub async fn serve(&self) -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().unwrap();
        let router = self.router.clone();
        tokio::spawn(async move {
            axum::serve(listener, router).await.ok();
        });
        addr
    }

    /// Create a test profile via the API and return the user id.
    pub async fn create_test_user(&self, username: &str) -> Uuid {
        let id = Uuid::new_v4();
        let response = self
            .request(
                "POST",
                "/api/profiles",
                Some(serde_json::json!({
                    "id": id,
                    "username": username,
                    "display_name": username,
                })),
                None,
            )
            .await;
        assert_eq!(
            response.status,
            StatusCode::CREATED,
            "Profile creation failed: {:?}",
            response.body
        );
        id
    }

    /// Seed one achievement into the catalog.
    pub fn seed_achievement(
        &self,
        name: &str,
        requirement_type: RequirementType,
        requirement_value: i32,
        experience_reward: i32,
    ) -> Uuid {
        let id = Uuid::new_v4();
        self.store.insert_achievement(Achievement {
            id,
            name: name.to_string(),
            description: format!("{name} description"),
            icon: "star".to_string(),
            requirement_type,
            requirement_value,
            experience_reward,
        });
        id
    }

    /// Make an HTTP request to the test app.
    pub async fn request(
        &self,
        method: &str,
        path: &str,
        body: Option<Value>,
        user_id: Option<Uuid>,
    ) -> TestResponse {
        let body_str = body
            .map(|b| serde_json::to_string(&b).expect("Failed to serialize body"))
            .unwrap_or_default();

        let mut req = Request::builder()
            .method(method)
            .uri(path)
            .header("Content-Type", "application/json");

        if let Some(user_id) = user_id {
            req = req.header("x-user-id", user_id.to_string());
        }

        let req = req
            .body(Body::from(body_str))
            .expect("Failed to build request");

        let response = self
            .router
            .clone()
            .oneshot(req)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("Failed to read body");

        let body: Value = serde_json::from_slice(&body_bytes).unwrap_or(Value::Null);

        TestResponse { status, body }
    }
}

/// Response from a test request.
#[derive(Debug)]
pub struct TestResponse {
    /// HTTP status code
    pub status: StatusCode,
    /// Parsed JSON body
    pub body: Value,
}
