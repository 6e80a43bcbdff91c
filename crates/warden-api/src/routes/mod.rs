//! API routes

mod auth;
mod health;
pub mod metrics;
mod probes;

use axum::{Router, extract::DefaultBodyLimit};
use std::sync::Arc;

use crate::state::{AppState, MetricsHandle};

pub use auth::{LoginRequest, LoginResponse, RequireAdmin, RequireAuth, RequireRole, RequireUser};

/// Login bodies are tiny
const MAX_BODY_BYTES: usize = 16 * 1024;

/// Create the main router
///
/// Probe endpoints are served under `/test` and at the root.
pub fn create_router(state: AppState, metrics_handle: Option<Arc<MetricsHandle>>) -> Router {
    let mut router = Router::new()
        .merge(health::routes())
        .merge(auth::routes())
        .nest("/test", probes::routes())
        .merge(probes::routes())
        .with_state(state)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES));

    if let Some(handle) = metrics_handle {
        router = router.merge(metrics::routes(handle));
    }

    router
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header};
    use chrono::Utc;
    use serde_json::{Value, json};
    use tower::ServiceExt;
    use warden_auth::{
        CredentialVerifier, JwtManager, PrincipalProvider, Role, SigningConfig, StaticDirectory,
        StoreDirectory, hash_password,
    };
    use warden_db::{Credential, CredentialStore, Database, NewCredential};

    fn credential(id: &str, username: &str, password: &str) -> Credential {
        Credential {
            id: id.to_string(),
            username: username.to_string(),
            password_hash: hash_password(password).unwrap(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn jwt() -> Arc<JwtManager> {
        Arc::new(JwtManager::new(
            &SigningConfig::new("router-test-secret", "warden", "warden-clients").unwrap(),
        ))
    }

    fn app() -> Router {
        let admins = StaticDirectory::new(Role::Administrator)
            .with(credential("a-1", "root", "toor"))
            .with(credential("a-2", "sam", "admin-pw"));
        let users = StaticDirectory::new(Role::StandardUser)
            .with(credential("u-1", "alice", "secret"))
            .with(credential("u-2", "sam", "user-pw"));
        let providers: Vec<Arc<dyn PrincipalProvider>> = vec![Arc::new(admins), Arc::new(users)];

        let state = AppState::new(Arc::new(CredentialVerifier::new(providers)), jwt());
        create_router(state, None)
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    fn login_request(body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/auth/login")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str, token: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        builder.body(Body::empty()).unwrap()
    }

    async fn login(app: &Router, username: &str, password: &str) -> String {
        let (status, body) = send(
            app,
            login_request(json!({ "username": username, "password": password })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        body["token"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_standard_user_scenario() {
        let app = app();
        let token = login(&app, "alice", "secret").await;
        assert!(!token.is_empty());

        let (status, body) = send(&app, get("/protected", Some(&token))).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["message"].as_str().unwrap().contains("alice"));

        let (status, body) = send(&app, get("/admin", Some(&token))).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body, json!({ "message": "Forbidden" }));

        let (status, body) = send(&app, get("/test/user", Some(&token))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body["message"],
            "Hello User alice, you have access to this endpoint."
        );

        let request = Request::builder()
            .uri("/protected")
            .header(header::AUTHORIZATION, format!("bearer {}", token))
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(&app, request).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_admin_scenario() {
        let app = app();
        let token = login(&app, "root", "toor").await;

        let (status, body) = send(&app, get("/test/admin", Some(&token))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body["message"],
            "Hello Admin root, you have access to this endpoint."
        );

        let (status, _) = send(&app, get("/test/protected", Some(&token))).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = send(&app, get("/user", Some(&token))).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let app = app();
        let unknown = send(
            &app,
            login_request(json!({ "username": "ghost", "password": "whatever" })),
        )
        .await;
        let wrong = send(
            &app,
            login_request(json!({ "username": "alice", "password": "wrong" })),
        )
        .await;

        assert_eq!(unknown.0, StatusCode::UNAUTHORIZED);
        assert_eq!(unknown.1, json!({ "message": "Invalid username or password" }));
        assert_eq!(unknown, wrong);
    }

    #[tokio::test]
    async fn test_shared_username_resolves_to_admin() {
        let app = app();
        let token = login(&app, "sam", "admin-pw").await;
        let (status, _) = send(&app, get("/admin", Some(&token))).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = send(
            &app,
            login_request(json!({ "username": "sam", "password": "user-pw" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_login_accepts_legacy_field_names() {
        let app = app();
        let (status, body) = send(
            &app,
            login_request(json!({ "UserName": "alice", "Password": "secret" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["token"].is_string());
    }

    #[tokio::test]
    async fn test_oversized_input_rejected_by_byte_length() {
        let app = app();
        let (status, body) = send(
            &app,
            login_request(json!({ "username": "alice", "password": "x".repeat(300) })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["message"],
            "Password exceeds maximum length of 256 bytes"
        );

        // 40 three-byte characters are 120 bytes
        let (status, body) = send(
            &app,
            login_request(json!({ "username": "\u{20ac}".repeat(40), "password": "pw" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["message"],
            "Username exceeds maximum length of 64 bytes"
        );
    }

    #[tokio::test]
    async fn test_malformed_login_body_rejected() {
        let app = app();
        let request = Request::builder()
            .method("POST")
            .uri("/auth/login")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{\"username\": \"alice\""))
            .unwrap();

        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"].is_string());
    }

    #[tokio::test]
    async fn test_protected_requires_valid_token() {
        let app = app();

        let (status, body) = send(&app, get("/protected", None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, json!({ "message": "Unauthorized" }));

        let (status, _) = send(&app, get("/admin", Some("not-a-token"))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        // Signed with another key
        let foreign = JwtManager::new(
            &SigningConfig::new("other-secret", "warden", "warden-clients").unwrap(),
        )
        .issue("u-1", "alice", Role::StandardUser)
        .unwrap();
        let (status, body) = send(&app, get("/protected", Some(&foreign.token))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, json!({ "message": "Unauthorized" }));
    }

    #[tokio::test]
    async fn test_health() {
        let app = app();
        let (status, body) = send(&app, get("/healthz", None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn test_login_against_sqlite_stores() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite:{}?mode=rwc", dir.path().join("warden.db").display());
        let db = Database::new(&url).await.unwrap();
        db.insert_credential(
            CredentialStore::Users,
            NewCredential {
                username: "alice".to_string(),
                password_hash: hash_password("secret").unwrap(),
            },
        )
        .await
        .unwrap();

        let providers: Vec<Arc<dyn PrincipalProvider>> = vec![
            Arc::new(StoreDirectory::admins(db.clone())),
            Arc::new(StoreDirectory::users(db)),
        ];
        let state = AppState::new(Arc::new(CredentialVerifier::new(providers)), jwt());
        let app = create_router(state, None);

        let token = login(&app, "alice", "secret").await;
        let (status, _) = send(&app, get("/test/admin", Some(&token))).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = send(
            &app,
            login_request(json!({ "username": "ghost", "password": "whatever" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
