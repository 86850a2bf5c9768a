//! Axum router configuration with middleware.
//!
//! All routes are under `/api/v1/`, plus an unauthenticated `/health`.
//! Middleware: CORS (any origin), request tracing.

use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::http::handlers;
use crate::state::AppState;

/// Build the complete API router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        // Accounts
        .route("/auth/signup", post(handlers::auth::signup))
        .route("/auth/login", post(handlers::auth::login))
        .route("/auth/login/google", post(handlers::auth::login_google))
        .route("/auth/forgot-password", post(handlers::auth::forgot_password))
        .route("/auth/reset-password", post(handlers::auth::reset_password))
        .route("/auth/me", get(handlers::auth::me))
        // Chat
        .route("/chat", post(handlers::chat::send_message))
        // Conversations
        .route(
            "/conversations",
            get(handlers::conversation::list_conversations),
        )
        .route(
            "/conversations/{id}",
            get(handlers::conversation::get_conversation)
                .delete(handlers::conversation::delete_conversation),
        )
        .route(
            "/conversations/{id}/cancel",
            post(handlers::conversation::cancel_run),
        );

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/health", get(health_check))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET /health - Liveness plus a database round-trip (no auth required).
async fn health_check(
    State(state): State<AppState>,
) -> (StatusCode, axum::Json<serde_json::Value>) {
    let (status, database) = match state.db_pool.health_check().await {
        Ok(()) => (StatusCode::OK, "ok"),
        Err(e) => {
            tracing::warn!(error = %e, "Health check database query failed");
            (StatusCode::SERVICE_UNAVAILABLE, "unavailable")
        }
    };

    (
        status,
        axum::Json(serde_json::json!({
            "status": if status.is_success() { "ok" } else { "degraded" },
            "version": env!("CARGO_PKG_VERSION"),
            "database": database,
            "runs_in_flight": state.chat_service.runs().len(),
        })),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::{Request, header};
    use http_body_util::BodyExt;
    use memberchat_infra::config::Secrets;
    use memberchat_types::config::AppConfig;
    use secrecy::SecretString;
    use serde_json::{Value, json};
    use tempfile::TempDir;
    use tower::ServiceExt;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const JWT_SECRET: &str = "test-secret-that-is-at-least-32-bytes-long";

    struct TestApp {
        router: Router,
        _dir: TempDir,
    }

    impl TestApp {
        async fn new(assistant_base_url: Option<String>) -> Self {
            let dir = TempDir::new().unwrap();
            let mut config = AppConfig::default();
            config.database.url = Some(format!(
                "sqlite://{}?mode=rwc",
                dir.path().join("test.db").display()
            ));
            config.assistant.poll.initial_interval_ms = 10;
            config.assistant.poll.max_interval_ms = 20;
            config.assistant.poll.timeout_secs = 5;

            let openai_api_key = assistant_base_url.map(|url| {
                config.assistant.base_url = url;
                config.assistant.assistant_id = Some("asst_test".to_string());
                SecretString::from("sk-test".to_string())
            });

            let secrets = Secrets {
                jwt_secret: Some(SecretString::from(JWT_SECRET.to_string())),
                openai_api_key,
                smtp_password: None,
            };
            let state = AppState::build(dir.path().to_path_buf(), config, secrets)
                .await
                .unwrap();

            Self {
                router: build_router(state),
                _dir: dir,
            }
        }

        async fn request(
            &self,
            method: &str,
            uri: &str,
            token: Option<&str>,
            body: Option<Value>,
        ) -> (StatusCode, Value) {
            let mut builder = Request::builder().method(method).uri(uri);
            if let Some(token) = token {
                builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
            }
            let request = match body {
                Some(body) => builder
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
                None => builder.body(Body::empty()).unwrap(),
            };

            let response = self.router.clone().oneshot(request).await.unwrap();
            let status = response.status();
            let bytes = response.into_body().collect().await.unwrap().to_bytes();
            let value = if bytes.is_empty() {
                Value::Null
            } else {
                serde_json::from_slice(&bytes).unwrap()
            };
            (status, value)
        }

        async fn signup_and_login(&self, email: &str, is_subscriber: bool) -> String {
            let (status, _) = self
                .request(
                    "POST",
                    "/api/v1/auth/signup",
                    None,
                    Some(json!({
                        "email": email,
                        "password": "secret123",
                        "name": "Member",
                        "is_subscriber": is_subscriber
                    })),
                )
                .await;
            assert_eq!(status, StatusCode::CREATED);

            let (status, body) = self
                .request(
                    "POST",
                    "/api/v1/auth/login",
                    None,
                    Some(json!({"email": email, "password": "secret123"})),
                )
                .await;
            assert_eq!(status, StatusCode::OK);
            body["data"]["access_token"].as_str().unwrap().to_string()
        }
    }

    async fn mount_assistant(server: &MockServer, reply: &str) {
        mount_assistant_with_run_delay(server, reply, Duration::ZERO).await;
    }

    /// Like `mount_assistant`, but each run status poll answers after `delay`.
    async fn mount_assistant_with_run_delay(server: &MockServer, reply: &str, delay: Duration) {
        Mock::given(method("POST"))
            .and(path("/v1/threads"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "thread_1"})))
            .mount(server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/threads/thread_1/messages"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "msg_u"})))
            .mount(server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/threads/thread_1/runs"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "run_1", "thread_id": "thread_1", "status": "queued"
            })))
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/threads/thread_1/runs/run_1"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({
                        "id": "run_1", "thread_id": "thread_1", "status": "completed"
                    }))
                    .set_delay(delay),
            )
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/threads/thread_1/messages"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{
                    "id": "msg_a", "role": "assistant", "run_id": "run_1", "created_at": 2,
                    "content": [{"type": "text", "text": {"value": reply, "annotations": []}}]
                }]
            })))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_health() {
        let app = TestApp::new(None).await;
        let (status, body) = app.request("GET", "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["database"], "ok");
        assert_eq!(body["runs_in_flight"], 0);
    }

    #[tokio::test]
    async fn test_signup_login_me() {
        let app = TestApp::new(None).await;
        let token = app.signup_and_login("Ana@Example.com", true).await;

        let (status, body) = app.request("GET", "/api/v1/auth/me", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["email"], "ana@example.com");
        assert_eq!(body["data"]["is_subscriber"], true);
        assert!(body["data"].get("password_hash").is_none());
        assert_eq!(body["_links"]["self"], "/api/v1/auth/me");
    }

    #[tokio::test]
    async fn test_duplicate_signup_conflicts() {
        let app = TestApp::new(None).await;
        app.signup_and_login("ana@example.com", true).await;

        let (status, body) = app
            .request(
                "POST",
                "/api/v1/auth/signup",
                None,
                Some(json!({"email": "ANA@example.com", "password": "another1"})),
            )
            .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["errors"][0]["code"], "EMAIL_TAKEN");
        assert!(body["data"].is_null());
    }

    #[tokio::test]
    async fn test_wrong_password_and_missing_token() {
        let app = TestApp::new(None).await;
        app.signup_and_login("ana@example.com", true).await;

        let (status, body) = app
            .request(
                "POST",
                "/api/v1/auth/login",
                None,
                Some(json!({"email": "ana@example.com", "password": "wrong-password"})),
            )
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["errors"][0]["code"], "INVALID_CREDENTIALS");

        let (status, body) = app.request("GET", "/api/v1/auth/me", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["errors"][0]["code"], "UNAUTHORIZED");

        let (status, body) = app
            .request("GET", "/api/v1/auth/me", Some("not-a-jwt"), None)
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["errors"][0]["code"], "INVALID_TOKEN");
    }

    #[tokio::test]
    async fn test_forgot_password_is_neutral() {
        let app = TestApp::new(None).await;
        app.signup_and_login("ana@example.com", true).await;

        let (known_status, known) = app
            .request(
                "POST",
                "/api/v1/auth/forgot-password",
                None,
                Some(json!({"email": "ana@example.com"})),
            )
            .await;
        let (unknown_status, unknown) = app
            .request(
                "POST",
                "/api/v1/auth/forgot-password",
                None,
                Some(json!({"email": "nobody@example.com"})),
            )
            .await;

        assert_eq!(known_status, StatusCode::OK);
        assert_eq!(unknown_status, StatusCode::OK);
        assert_eq!(known["data"]["message"], unknown["data"]["message"]);
    }

    #[tokio::test]
    async fn test_reset_password_requires_fields() {
        let app = TestApp::new(None).await;
        let (status, body) = app
            .request(
                "POST",
                "/api/v1/auth/reset-password",
                None,
                Some(json!({"token": "t", "email": "ana@example.com"})),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["errors"][0]["code"], "VALIDATION_ERROR");

        let (status, body) = app
            .request(
                "POST",
                "/api/v1/auth/reset-password",
                None,
                Some(json!({"token": "garbage", "email": "ana@example.com", "newPassword": "secret456"})),
            )
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["errors"][0]["code"], "INVALID_TOKEN");
    }

    #[tokio::test]
    async fn test_chat_round_trip() {
        let server = MockServer::start().await;
        mount_assistant(&server, "Hi Ana!").await;
        let app = TestApp::new(Some(server.uri())).await;
        let token = app.signup_and_login("ana@example.com", true).await;

        let (status, body) = app
            .request(
                "POST",
                "/api/v1/chat",
                Some(&token),
                Some(json!({"messages": [{"text": "Hello there"}]})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["response"], "Hi Ana!");
        let conversation_id = body["data"]["conversation_id"].as_str().unwrap().to_string();

        let uri = format!("/api/v1/conversations/{conversation_id}");
        let (status, body) = app.request("GET", &uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["title"], "Hello there");
        let messages = body["data"]["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0]["sender"], "user");
        assert_eq!(messages[1]["sender"], "assistant");
        assert_eq!(messages[1]["text"], "Hi Ana!");

        let (status, body) = app
            .request("GET", "/api/v1/conversations", Some(&token), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_reply_stored_after_client_disconnects() {
        let server = MockServer::start().await;
        mount_assistant_with_run_delay(&server, "Worth the wait.", Duration::from_secs(1)).await;
        let app = TestApp::new(Some(server.uri())).await;
        let token = app.signup_and_login("ana@example.com", true).await;

        let abandoned = tokio::time::timeout(
            Duration::from_millis(200),
            app.request(
                "POST",
                "/api/v1/chat",
                Some(&token),
                Some(json!({"messages": [{"text": "Still there?"}]})),
            ),
        )
        .await;
        assert!(abandoned.is_err());

        let mut messages = Vec::new();
        for _ in 0..100 {
            tokio::time::sleep(Duration::from_millis(50)).await;
            let (_, list) = app
                .request("GET", "/api/v1/conversations", Some(&token), None)
                .await;
            let Some(id) = list["data"][0]["id"].as_str() else {
                continue;
            };
            let uri = format!("/api/v1/conversations/{id}");
            let (_, detail) = app.request("GET", &uri, Some(&token), None).await;
            messages = detail["data"]["messages"].as_array().cloned().unwrap_or_default();
            if messages.len() == 2 {
                break;
            }
        }
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1]["sender"], "assistant");
        assert_eq!(messages[1]["text"], "Worth the wait.");

        let mut in_flight = Value::Null;
        for _ in 0..20 {
            let (_, health) = app.request("GET", "/health", None, None).await;
            in_flight = health["runs_in_flight"].clone();
            if in_flight == 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(in_flight, 0);
    }

    #[tokio::test]
    async fn test_conversation_is_private_and_deletable() {
        let server = MockServer::start().await;
        mount_assistant(&server, "Sure.").await;
        let app = TestApp::new(Some(server.uri())).await;
        let owner = app.signup_and_login("ana@example.com", true).await;
        let other = app.signup_and_login("bia@example.com", true).await;

        let (_, body) = app
            .request(
                "POST",
                "/api/v1/chat",
                Some(&owner),
                Some(json!({"messages": [{"text": "Question"}]})),
            )
            .await;
        let uri = format!(
            "/api/v1/conversations/{}",
            body["data"]["conversation_id"].as_str().unwrap()
        );

        let (status, body) = app.request("GET", &uri, Some(&other), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["errors"][0]["code"], "CONVERSATION_NOT_FOUND");

        let (status, _) = app.request("DELETE", &uri, Some(&other), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = app.request("DELETE", &uri, Some(&owner), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["deleted"], true);

        let (status, _) = app.request("GET", &uri, Some(&owner), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_chat_requires_subscriber() {
        let app = TestApp::new(None).await;
        let token = app.signup_and_login("guest@example.com", false).await;

        let (status, body) = app
            .request(
                "POST",
                "/api/v1/chat",
                Some(&token),
                Some(json!({"messages": [{"text": "Hello"}]})),
            )
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["errors"][0]["code"], "NOT_SUBSCRIBER");
    }

    #[tokio::test]
    async fn test_chat_validation_and_unconfigured_assistant() {
        let app = TestApp::new(None).await;
        let token = app.signup_and_login("ana@example.com", true).await;

        let (status, body) = app
            .request(
                "POST",
                "/api/v1/chat",
                Some(&token),
                Some(json!({"messages": [{"text": "   "}]})),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["errors"][0]["code"], "VALIDATION_ERROR");

        let (status, body) = app
            .request(
                "POST",
                "/api/v1/chat",
                Some(&token),
                Some(json!({"messages": [{"text": "Hello"}]})),
            )
            .await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["errors"][0]["code"], "ASSISTANT_NOT_CONFIGURED");
    }

    #[tokio::test]
    async fn test_cancel_and_bad_ids() {
        let app = TestApp::new(None).await;
        let token = app.signup_and_login("ana@example.com", true).await;

        let (status, body) = app
            .request("GET", "/api/v1/conversations/not-a-uuid", Some(&token), None)
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["errors"][0]["code"], "VALIDATION_ERROR");

        let uri = format!("/api/v1/conversations/{}/cancel", uuid::Uuid::now_v7());
        let (status, body) = app.request("POST", &uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["errors"][0]["code"], "CONVERSATION_NOT_FOUND");

        let (status, _) = app
            .request("GET", "/api/v1/conversations?limit=500", Some(&token), None)
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
