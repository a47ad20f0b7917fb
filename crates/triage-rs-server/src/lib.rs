//! HTTP host exposing the triage skills and reasoners.
//!
//! Routes:
//! - `GET /health`
//! - `GET /api/v1/skills`
//! - `POST /api/v1/execute/{target}` with `{"input": {...}}`, where target is
//!   `<node_id>.<skill name>`.

mod error;

pub use error::ApiError;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use log::info;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::net::SocketAddr;
use triage_rs_core::{SkillRegistry, TriageAgent, resolve_target};
use triage_rs_protocol::SkillSpec;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub agent: TriageAgent,
    pub registry: SkillRegistry,
}

impl AppState {
    pub fn new(agent: TriageAgent, registry: SkillRegistry) -> Self {
        Self { agent, registry }
    }
}

/// Body of an execute request.
#[derive(Debug, Deserialize)]
pub struct ExecuteRequest {
    #[serde(default)]
    pub input: Value,
}

#[derive(Debug, Serialize)]
pub struct ExecuteResponse {
    pub result: Value,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct HealthResponse {
    pub ok: bool,
    pub node_id: String,
    pub version: String,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/v1/skills", get(list_skills))
        .route("/api/v1/execute/{target}", post(execute))
        .with_state(state)
}

/// Bind `addr` and serve until the process stops.
pub async fn serve(addr: SocketAddr, state: AppState) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(
        "triage server listening (addr={}, node_id={})",
        listener.local_addr()?,
        state.agent.node_id()
    );
    axum::serve(listener, router(state)).await
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        ok: true,
        node_id: state.agent.node_id().to_string(),
        version: state.agent.version().to_string(),
    })
}

async fn list_skills(State(state): State<AppState>) -> Json<Vec<SkillSpec>> {
    Json(state.registry.specs())
}

async fn execute(
    State(state): State<AppState>,
    Path(target): Path<String>,
    body: Result<Json<ExecuteRequest>, JsonRejection>,
) -> Result<Json<ExecuteResponse>, ApiError> {
    let skill = resolve_target(state.agent.node_id(), &target)
        .ok_or_else(|| ApiError::UnknownTarget(target.clone()))?;
    if state.registry.get(skill).is_none() {
        return Err(ApiError::UnknownTarget(target));
    }
    let Json(request) = body.map_err(|err| ApiError::BadRequest(err.body_text()))?;
    let input = match request.input {
        Value::Null => json!({}),
        input => input,
    };
    let result = state.registry.execute(&state.agent, skill, input).await?;
    Ok(Json(ExecuteResponse { result }))
}
