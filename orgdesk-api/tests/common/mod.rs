/// Common test utilities for API tests
///
/// Builds the full router over a [`MemoryStore`], mints identity tokens the
/// way the identity provider would, and drives requests through
/// `tower::ServiceExt::oneshot`.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use orgdesk_api::app::{build_router, AppState};
use orgdesk_api::config::Config;
use orgdesk_shared::auth::jwt::{create_token, Claims};
use orgdesk_shared::store::MemoryStore;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

pub const TEST_SECRET: &str = "test-identity-secret-at-least-32-characters";

/// A signed-in identity
#[derive(Debug, Clone)]
pub struct TestUser {
    pub id: Uuid,
    pub email: String,
    pub token: String,
}

/// Test context containing the router and the store behind it
pub struct TestContext {
    pub store: Arc<MemoryStore>,
    pub app: Router,
}

impl TestContext {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());

        let vars: HashMap<&str, &str> = HashMap::from([
            ("DATABASE_URL", "postgres://unused/orgdesk_test"),
            ("IDENTITY_JWT_SECRET", TEST_SECRET),
        ]);
        let config = Config::from_lookup(|key| vars.get(key).map(|v| v.to_string()))
            .expect("test config");

        let app = build_router(AppState::new(store.clone(), config));

        Self { store, app }
    }

    /// Mints a token for a fresh user
    pub fn user(&self, email: &str) -> TestUser {
        let id = Uuid::new_v4();
        let token = create_token(&Claims::new(id, email), TEST_SECRET).expect("token");

        TestUser {
            id,
            email: email.to_string(),
            token,
        }
    }

    /// Sends a request and returns status and parsed JSON body
    ///
    /// An empty body is returned as `Value::Null`.
    pub async fn send(
        &self,
        method: &str,
        uri: &str,
        user: Option<&TestUser>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(user) = user {
            builder = builder.header("authorization", format!("Bearer {}", user.token));
        }

        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("request");

        let response = self.app.clone().oneshot(request).await.expect("response");
        let status = response.status();

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                panic!("non-JSON body for {} {}: {}", method, uri, String::from_utf8_lossy(&bytes))
            })
        };

        (status, value)
    }

    /// Creates an organization for `user` and returns its id
    pub async fn onboard(&self, user: &TestUser, name: &str) -> String {
        let (status, body) = self
            .send("POST", "/v1/organizations", Some(user), Some(serde_json::json!({ "name": name })))
            .await;
        assert_eq!(status, StatusCode::CREATED, "onboarding failed: {}", body);

        body["id"].as_str().expect("org id").to_string()
    }

    /// Creates a project in `user`'s organization and returns its id
    pub async fn project(&self, user: &TestUser, name: &str) -> String {
        let (status, body) = self
            .send("POST", "/v1/projects", Some(user), Some(serde_json::json!({ "name": name })))
            .await;
        assert_eq!(status, StatusCode::CREATED, "project create failed: {}", body);

        body["id"].as_str().expect("project id").to_string()
    }
}
