//! # Módulo Web — O Painel do Especialista Marinho
//!
//! Este módulo organiza toda a camada web da aplicação, construída
//! com **Axum** + **HTMX** + **Maud** + **SSE**.
//!
//! ## Arquitetura Web
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │ Browser (HTMX + SSE)                                    │
//! ├─────────────────────────────────────────────────────────┤
//! │ Axum Router (este módulo)                               │
//! │  ├── GET  /                → index (deck de observação) │
//! │  ├── POST /forward         → HTMX fragment              │
//! │  ├── POST /backward        → HTMX fragment              │
//! │  ├── GET  /history         → HTMX fragment              │
//! │  ├── POST /session/reset   → HTMX fragment              │
//! │  ├── GET  /events          → SSE stream (trace ao vivo) │
//! │  ├── GET  /api/knowledge   → JSON                       │
//! │  ├── POST /api/forward     → JSON                       │
//! │  └── POST /api/backward    → JSON                       │
//! ├─────────────────────────────────────────────────────────┤
//! │ Static Assets (tower_http::ServeDir → /assets/)         │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Submódulos
//!
//! | Módulo | Responsabilidade |
//! |--------|------------------|
//! | [`state`] | Estado compartilhado (`AppState`, `SessionRegistry`) |
//! | [`events`] | Enum de eventos SSE + sink de broadcast |
//! | [`handlers`] | Handlers Axum para cada rota |
//! | [`templates`] | Templates Maud (HTML server-side) |

pub mod events;
pub mod handlers;
pub mod state;
pub mod templates;

use axum::routing::{get, post};
use axum::Router;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use state::AppState;

/// Cria o router Axum com todas as rotas da aplicação.
///
/// ## Rotas Registradas
///
/// - **Página HTML**: `/`
/// - **HTMX fragments**: `/forward`, `/backward`, `/history`, `/session/reset`
/// - **SSE stream**: `/events`
/// - **API JSON**: `/api/knowledge`, `/api/forward`, `/api/backward`
/// - **Estáticos**: `/assets/*` → diretório `assets/`
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // ── Página HTML ───────────────────────────────────────
        .route("/", get(handlers::index))
        // ── HTMX fragments ───────────────────────────────────
        .route("/forward", post(handlers::forward))
        .route("/backward", post(handlers::backward))
        .route("/history", get(handlers::history))
        .route("/session/reset", post(handlers::reset_session))
        .route("/events", get(handlers::sse_events))
        // ── API JSON ──────────────────────────────────────────
        .route("/api/knowledge", get(handlers::api_knowledge))
        .route("/api/forward", post(handlers::api_forward))
        .route("/api/backward", post(handlers::api_backward))
        // ── Arquivos estáticos ────────────────────────────────
        .nest_service("/assets", ServeDir::new("assets"))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use uuid::Uuid;

    use super::*;
    use crate::config::AppConfig;
    use crate::core::KnowledgeBase;

    fn app() -> (Router, AppState) {
        let state = AppState::new(Arc::new(KnowledgeBase::marine()), &AppConfig::default());
        (create_router(state.clone()), state)
    }

    async fn body_string(response: axum::response::Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn json_post(uri: &str, body: Value) -> Request<Body> {
        Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn index_renders_the_observation_deck() {
        let (app, _) = app();
        let response = app
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let html = body_string(response).await;
        assert!(html.contains("Marine Observation Deck"));
        assert!(html.contains("Species: Lionfish"));
    }

    #[tokio::test]
    async fn api_forward_classifies_a_flounder() {
        let (app, _) = app();
        let response = app
            .oneshot(json_post(
                "/api/forward",
                json!({ "observations": ["Body Shape: Flattened", "Habitat: Sandy Bottom"] }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(body["run"]["verdict"], "Species: Flounder");
        assert_eq!(body["run"]["success"], true);
    }

    #[tokio::test]
    async fn api_backward_rejects_unknown_goal() {
        let (app, _) = app();
        let response = app
            .oneshot(json_post(
                "/api/backward",
                json!({ "goal": "Species: Kraken", "observations": [] }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body: Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert!(body["error"].as_str().unwrap().contains("Kraken"));
    }

    #[tokio::test]
    async fn form_backward_proves_lionfish_and_records_history() {
        let (app, state) = app();
        let session = Uuid::new_v4();
        let form = format!(
            "session={session}&goal=Species%3A+Lionfish\
             &obs%3AColor%3A+Red%2FWhite=on\
             &obs%3AFins%3A+Spiky=on\
             &obs%3AHabitat%3A+Coral+Reef=on"
        );
        let response = app
            .clone()
            .oneshot(
                Request::post("/backward")
                    .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(Body::from(form))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let html = body_string(response).await;
        assert!(html.contains("Species: Lionfish"));
        assert!(html.contains("is PROVEN."));
        assert_eq!(state.sessions.len(), 1);

        let response = app
            .oneshot(
                Request::get(format!("/history?session={session}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let html = body_string(response).await;
        assert!(html.contains("Backward Chaining"));
    }

    #[tokio::test]
    async fn events_require_a_session() {
        let (app, _) = app();
        let response = app
            .clone()
            .oneshot(Request::get("/events").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app
            .oneshot(
                Request::get(format!("/events?session={}", Uuid::new_v4()))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/event-stream"
        );
    }

    #[tokio::test]
    async fn api_knowledge_lists_numbered_rules() {
        let (app, _) = app();
        let response = app
            .oneshot(Request::get("/api/knowledge").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let body: Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(body["facts"].as_array().unwrap().len(), 14);
        assert_eq!(body["rules"].as_array().unwrap().len(), 5);
        assert_eq!(body["rules"][0]["number"], 1);
        assert!(body["goals"]
            .as_array()
            .unwrap()
            .contains(&json!("Condition: Bleaching")));
    }
}
