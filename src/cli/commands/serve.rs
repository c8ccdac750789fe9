//! HTTP API server for integration with other systems.
//!
//! Provides REST endpoints for RAG queries, session management and course
//! listings.

use crate::agent::SourceRecord;
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::RagSystem;
use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

/// Shared application state.
struct AppState {
    system: RagSystem,
}

/// Run the HTTP API server.
pub async fn run_serve(host: &str, port: u16, settings: Settings) -> anyhow::Result<()> {
    let system = RagSystem::new(settings)?;
    let demo_mode = system.settings().demo.enabled;

    let state = Arc::new(AppState { system });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/health", get(health))
        .route("/api/query", post(query))
        .route("/api/courses", get(courses))
        .route("/api/sessions/clear", post(clear_session))
        .layer(cors)
        .with_state(state);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("Pensum API Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    if demo_mode {
        Output::warning("Demo mode enabled; answers come from raw search results.");
    }
    println!();
    println!("Endpoints:");
    Output::kv("Health", "GET  /health");
    Output::kv("Query (RAG)", "POST /api/query");
    Output::kv("List Courses", "GET  /api/courses");
    Output::kv("Clear Session", "POST /api/sessions/clear");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app).await?;

    Ok(())
}

// === Request/Response Types ===

#[derive(Deserialize)]
struct QueryRequest {
    query: String,
    #[serde(default)]
    session_id: Option<String>,
}

#[derive(Serialize)]
struct QueryResponse {
    answer: String,
    sources: Vec<SourceRecord>,
    session_id: String,
}

#[derive(Deserialize)]
struct ClearSessionRequest {
    session_id: String,
}

#[derive(Serialize)]
struct ClearSessionResponse {
    cleared: bool,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

// === Handlers ===

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "demo_mode": state.system.settings().demo.enabled,
    }))
}

async fn query(
    State(state): State<Arc<AppState>>,
    Json(req): Json<QueryRequest>,
) -> impl IntoResponse {
    // A request without a session gets a fresh one; the id is echoed back
    // so the client can keep the conversation going.
    let session_id = req
        .session_id
        .unwrap_or_else(|| state.system.create_session());

    match state.system.query(&req.query, Some(&session_id)).await {
        Ok((answer, sources)) => Json(QueryResponse {
            answer,
            sources,
            session_id,
        })
        .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )
            .into_response(),
    }
}

async fn courses(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.system.get_course_analytics().await {
        Ok(analytics) => Json(analytics).into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )
            .into_response(),
    }
}

async fn clear_session(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ClearSessionRequest>,
) -> impl IntoResponse {
    state.system.clear_session(&req.session_id);
    Json(ClearSessionResponse { cleared: true })
}
