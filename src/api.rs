//! HTTP API for the payroll engine.
//!
//! This module exposes a small REST API around the edit-session
//! engine using the [`axum`](https://crates.io/crates/axum) framework.
//! Clients list the available records, prepare draft totals for a
//! period, open an edit session, apply per-keystroke field edits, and
//! trigger the confirmed save.  Sessions live in shared state keyed by
//! a numeric id; the record source and sink behind them are the same
//! trait objects the engine uses everywhere else.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use anyhow::Result;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::RwLock;
use tracing::info;

use crate::engine::prepare_drafts;
use crate::error::{LoadError, SessionError, SourceError};
use crate::fields::FieldId;
use crate::models::SessionContext;
use crate::record::{Confirmed, DirRecordStore, MemorySink, RecordSink, RecordSource};
use crate::session::{EditSession, SaveOutcome};

/// Application state shared across requests.
pub struct AppState {
    pub source: Arc<dyn RecordSource>,
    pub sink: Arc<dyn RecordSink>,
    pub context: SessionContext,
    pub sessions: RwLock<HashMap<u64, EditSession>>,
    next_session_id: AtomicU64,
}

impl AppState {
    fn allocate_session_id(&self) -> u64 {
        self.next_session_id.fetch_add(1, Ordering::Relaxed) + 1
    }
}

/// Builds the API router over a directory-backed record store and an
/// in-memory sink.  Returns the router and a handle to the state.
pub async fn build_router(
    record_dir: PathBuf,
    context: SessionContext,
) -> Result<(Router, Arc<AppState>)> {
    let store = DirRecordStore::open(&record_dir)?;
    Ok(router_with_state(
        Arc::new(store),
        Arc::new(MemorySink::new()),
        context,
    ))
}

/// Builds the router over caller-supplied source and sink
/// implementations.
pub fn router_with_state(
    source: Arc<dyn RecordSource>,
    sink: Arc<dyn RecordSink>,
    context: SessionContext,
) -> (Router, Arc<AppState>) {
    let state = Arc::new(AppState {
        source,
        sink,
        context,
        sessions: RwLock::new(HashMap::new()),
        next_session_id: AtomicU64::new(0),
    });
    let router = Router::new()
        .route("/api/records", get(list_records_handler))
        .route("/api/drafts", get(drafts_handler))
        .route("/api/sessions", post(open_session_handler))
        .route("/api/sessions/:id", get(view_session_handler))
        .route("/api/sessions/:id/edits", post(edit_handler))
        .route("/api/sessions/:id/save", post(save_handler))
        .with_state(state.clone());
    (router, state)
}

fn load_error_response(err: LoadError) -> Response {
    let status = match &err {
        LoadError::MissingField(_) => StatusCode::UNPROCESSABLE_ENTITY,
        LoadError::Source(SourceError::NotFound(_)) => StatusCode::NOT_FOUND,
        LoadError::Source(SourceError::Unavailable(_)) => StatusCode::BAD_GATEWAY,
    };
    (status, Json(json!({ "error": err.to_string() }))).into_response()
}

fn session_error_response(err: SessionError) -> Response {
    let status = match &err {
        SessionError::NotEditable { .. } => StatusCode::CONFLICT,
        SessionError::SaveInFlight => StatusCode::CONFLICT,
        SessionError::AlreadySaved => StatusCode::CONFLICT,
        SessionError::Submission(_) => StatusCode::BAD_GATEWAY,
    };
    (status, Json(json!({ "error": err.to_string() }))).into_response()
}

fn unknown_session_response(id: u64) -> Response {
    let body = Json(json!({ "error": format!("no session with id {}", id) }));
    (StatusCode::NOT_FOUND, body).into_response()
}

/// Handler for GET /api/records
async fn list_records_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.source.list_keys() {
        Ok(keys) => (StatusCode::OK, Json(json!({ "records": keys }))).into_response(),
        Err(err) => load_error_response(err.into()),
    }
}

/// Query parameters for GET /api/drafts
#[derive(Debug, Deserialize)]
pub struct DraftsQuery {
    pub month: u32,
    pub year: i32,
}

/// Handler for GET /api/drafts
///
/// Prepares draft figures and totals for every attendance summary in
/// the requested period.
async fn drafts_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DraftsQuery>,
) -> impl IntoResponse {
    match state.source.summaries_for(query.month, query.year) {
        Ok(summaries) => {
            let drafts = prepare_drafts(summaries);
            (StatusCode::OK, Json(json!({ "drafts": drafts }))).into_response()
        }
        Err(err) => load_error_response(err.into()),
    }
}

/// Request body for POST /api/sessions
#[derive(Debug, Deserialize)]
pub struct OpenSessionRequest {
    /// Key of the source record to open, as returned by `/api/records`.
    pub record: String,
}

/// Handler for POST /api/sessions
async fn open_session_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<OpenSessionRequest>,
) -> impl IntoResponse {
    let record = match state.source.fetch(&req.record) {
        Ok(record) => record,
        Err(err) => return load_error_response(err.into()),
    };
    match EditSession::open(record, state.context.clone()) {
        Ok(session) => {
            let id = state.allocate_session_id();
            let view = session.view();
            state.sessions.write().await.insert(id, session);
            info!(session = id, record = %req.record, "opened session over http");
            let body = Json(json!({ "session_id": id, "session": view }));
            (StatusCode::CREATED, body).into_response()
        }
        Err(err) => load_error_response(err),
    }
}

/// Handler for GET /api/sessions/:id
async fn view_session_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> impl IntoResponse {
    let sessions = state.sessions.read().await;
    match sessions.get(&id) {
        Some(session) => (StatusCode::OK, Json(session.view())).into_response(),
        None => unknown_session_response(id),
    }
}

/// Request body for POST /api/sessions/:id/edits
#[derive(Debug, Deserialize)]
pub struct EditRequest {
    pub field: FieldId,
    /// The field's display text as currently typed, in full.
    pub text: String,
}

/// Handler for POST /api/sessions/:id/edits
async fn edit_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
    Json(req): Json<EditRequest>,
) -> impl IntoResponse {
    let mut sessions = state.sessions.write().await;
    match sessions.get_mut(&id) {
        Some(session) => match session.edit(req.field, &req.text) {
            Ok(outcome) => (StatusCode::OK, Json(outcome)).into_response(),
            Err(err) => session_error_response(err),
        },
        None => unknown_session_response(id),
    }
}

/// Request body for POST /api/sessions/:id/save
#[derive(Debug, Deserialize)]
pub struct SaveRequest {
    /// The operator's answer to the confirmation prompt.  `false` is a
    /// full no-op.
    pub confirmed: bool,
}

/// Handler for POST /api/sessions/:id/save
async fn save_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
    Json(req): Json<SaveRequest>,
) -> impl IntoResponse {
    let mut sessions = state.sessions.write().await;
    match sessions.get_mut(&id) {
        Some(session) => {
            match session.save(state.sink.as_ref(), &Confirmed(req.confirmed)) {
                Ok(SaveOutcome::Saved { payroll_id }) => {
                    let body = Json(json!({
                        "outcome": "saved",
                        "payroll_id": payroll_id,
                        "session": session.view(),
                    }));
                    (StatusCode::OK, body).into_response()
                }
                Ok(SaveOutcome::Declined) => {
                    let body = Json(json!({ "outcome": "declined" }));
                    (StatusCode::OK, body).into_response()
                }
                Err(err) => session_error_response(err),
            }
        }
        None => unknown_session_response(id),
    }
}

/// Launches the API server.  Builds the router from the given record
/// directory, binds the address, and blocks until the server
/// terminates.
pub async fn serve(addr: &str, record_dir: PathBuf, context: SessionContext) -> Result<()> {
    let (router, _state) = build_router(record_dir, context).await?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "payroll api listening");
    axum::serve(listener, router).await?;
    Ok(())
}
