//! HTTP API server for integration with other systems.
//!
//! Provides transcript extraction, one-shot question answering, and
//! long-lived sessions that keep an indexed transcript between questions.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::{ChunkingSettings, Settings};
use crate::error::{ErrorCategory, VidqaError};
use crate::pipeline::{prepare_question, Pipeline};
use crate::session::{AskOutcome, ChatTurn, LoadOutcome, Session};
use crate::transcript::{fetch_transcript, TranscriptSource, YtDlpSource};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};
use uuid::Uuid;

type SharedSession = Arc<RwLock<Session>>;

/// How often idle sessions are swept.
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

struct SessionEntry {
    session: SharedSession,
    last_used: Instant,
}

/// Shared application state.
pub(crate) struct AppState {
    pipeline: Pipeline,
    source: Arc<dyn TranscriptSource>,
    settings: Settings,
    sessions: RwLock<HashMap<Uuid, SessionEntry>>,
}

impl AppState {
    pub(crate) fn new(pipeline: Pipeline, source: Arc<dyn TranscriptSource>, settings: Settings) -> Self {
        Self {
            pipeline,
            source,
            settings,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Look up a session and mark it as used.
    async fn session(&self, id: Uuid) -> Result<SharedSession, ApiError> {
        let mut sessions = self.sessions.write().await;
        let entry = sessions.get_mut(&id).ok_or_else(|| ApiError::not_found(id))?;
        entry.last_used = Instant::now();
        Ok(Arc::clone(&entry.session))
    }

    /// Drop sessions idle for longer than the configured limit as of `now`.
    async fn evict_idle(&self, now: Instant) -> usize {
        let Some(limit) = self.settings.server.session_idle_limit() else {
            return 0;
        };

        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, entry| now.saturating_duration_since(entry.last_used) <= limit);
        let evicted = before - sessions.len();
        if evicted > 0 {
            info!("Evicted {} idle sessions", evicted);
        }
        evicted
    }
}

/// Run the HTTP API server.
pub async fn run_serve(host: Option<String>, port: Option<u16>, settings: Settings) -> anyhow::Result<()> {
    preflight::check(Operation::Answer, &settings)?;
    if let Err(e) = preflight::check(Operation::FetchTranscript, &settings) {
        Output::warning(&format!("{} (/extract-id will fail)", e));
    }

    let pipeline = Pipeline::new(&settings)?;
    let source = Arc::new(YtDlpSource::new(&settings.transcript)?);

    let host = host.unwrap_or_else(|| settings.server.host.clone());
    let port = port.unwrap_or(settings.server.port);

    let state = Arc::new(AppState::new(pipeline, source, settings));
    let app = router(state.clone());

    let sweeper = tokio::spawn(async move {
        let mut interval = tokio::time::interval(SWEEP_INTERVAL);
        loop {
            interval.tick().await;
            state.evict_idle(Instant::now()).await;
        }
    });

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("vidqa API Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Health", "GET    /health");
    Output::kv("Transcript", "POST   /extract-id");
    Output::kv("One-shot QA", "POST   /rag-qa");
    Output::kv("New session", "POST   /sessions");
    Output::kv("Session", "GET    /sessions/{id}");
    Output::kv("Load", "PUT    /sessions/{id}/transcript");
    Output::kv("Ask", "POST   /sessions/{id}/ask");
    Output::kv("End session", "DELETE /sessions/{id}");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Shutting down");
            }
        })
        .await?;

    sweeper.abort();
    Ok(())
}

pub(crate) fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/extract-id", post(extract_id))
        .route("/rag-qa", post(rag_qa))
        .route("/sessions", post(create_session))
        .route("/sessions/{id}", get(get_session).delete(delete_session))
        .route("/sessions/{id}/transcript", put(load_transcript))
        .route("/sessions/{id}/ask", post(ask))
        .layer(cors)
        .with_state(state)
}

// === Request/Response Types ===

#[derive(Deserialize)]
struct ExtractRequest {
    /// YouTube URL or video ID
    url: String,
    #[serde(default = "default_language")]
    language_code: String,
}

fn default_language() -> String {
    "en".to_string()
}

#[derive(Debug, Serialize)]
struct ExtractResponse {
    transcript: Option<String>,
    message: String,
}

#[derive(Deserialize)]
struct RagRequest {
    transcript: String,
    question: String,
}

#[derive(Debug, Serialize)]
struct SessionCreated {
    session_id: Uuid,
}

#[derive(Debug, Serialize)]
struct SessionInfo {
    session_id: Uuid,
    state: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    segments: usize,
    created_at: DateTime<Utc>,
    history: Vec<ChatTurn>,
}

#[derive(Deserialize)]
struct LoadRequest {
    text: String,
    #[serde(default)]
    chunk_size: Option<usize>,
    #[serde(default)]
    chunk_overlap: Option<usize>,
}

#[derive(Deserialize)]
struct AskRequest {
    question: String,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

/// Error returned by session routes.
#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn not_found(id: Uuid) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: format!("Session not found: {}", id),
        }
    }

    fn too_many_sessions(limit: usize) -> Self {
        Self {
            status: StatusCode::SERVICE_UNAVAILABLE,
            message: format!("Too many open sessions (limit {})", limit),
        }
    }
}

impl From<VidqaError> for ApiError {
    fn from(error: VidqaError) -> Self {
        let status = match error.category() {
            ErrorCategory::Input => StatusCode::BAD_REQUEST,
            ErrorCategory::TranscriptUnavailable => StatusCode::NOT_FOUND,
            ErrorCategory::Usage => StatusCode::CONFLICT,
            ErrorCategory::Service => StatusCode::BAD_GATEWAY,
            ErrorCategory::Config | ErrorCategory::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: error.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorResponse { error: self.message })).into_response()
    }
}

// === Handlers ===

async fn root() -> impl IntoResponse {
    Json(serde_json::json!({ "msg": "Welcome to the vidqa API" }))
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn extract_id(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ExtractRequest>,
) -> Json<ExtractResponse> {
    let fetch = fetch_transcript(state.source.as_ref(), &req.url, &req.language_code).await;
    Json(ExtractResponse {
        message: fetch.status.message(),
        transcript: fetch.text,
    })
}

/// Answer one question about a transcript without keeping a session.
async fn rag_qa(State(state): State<Arc<AppState>>, Json(req): Json<RagRequest>) -> Json<AskOutcome> {
    let config = match state.settings.chunking_config() {
        Ok(config) => config,
        Err(e) => return Json(AskOutcome::rejected(e.to_string())),
    };

    let mut session = Session::new();
    let loaded = state
        .pipeline
        .load_transcript(&mut session, &req.transcript, config)
        .await;
    if let Some(error) = loaded.error {
        return Json(AskOutcome::rejected(error));
    }

    Json(state.pipeline.ask(&mut session, &req.question).await)
}

async fn create_session(
    State(state): State<Arc<AppState>>,
) -> Result<(StatusCode, Json<SessionCreated>), ApiError> {
    state.evict_idle(Instant::now()).await;

    let limit = state.settings.server.max_sessions;
    let mut sessions = state.sessions.write().await;
    if sessions.len() >= limit {
        warn!("Refusing new session, {} already open", sessions.len());
        return Err(ApiError::too_many_sessions(limit));
    }

    let session = Session::new();
    let session_id = session.id();
    sessions.insert(
        session_id,
        SessionEntry {
            session: Arc::new(RwLock::new(session)),
            last_used: Instant::now(),
        },
    );

    info!("Created session {}", session_id);
    Ok((StatusCode::CREATED, Json(SessionCreated { session_id })))
}

async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionInfo>, ApiError> {
    let shared = state.session(id).await?;
    let session = shared.read().await;

    let error = match session.state() {
        crate::session::SessionState::Error(reason) => Some(reason.clone()),
        _ => None,
    };

    Ok(Json(SessionInfo {
        session_id: id,
        state: session.state().name(),
        error,
        segments: session.segment_count(),
        created_at: session.created_at(),
        history: session.history().to_vec(),
    }))
}

async fn delete_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    match state.sessions.write().await.remove(&id) {
        Some(_) => {
            info!("Deleted session {}", id);
            Ok(StatusCode::NO_CONTENT)
        }
        None => Err(ApiError::not_found(id)),
    }
}

/// Load a transcript into a session.
///
/// The index is built without holding the session lock; questions asked
/// meanwhile see the session as building.
async fn load_transcript(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<LoadRequest>,
) -> Result<Json<LoadOutcome>, ApiError> {
    let shared = state.session(id).await?;

    let options = ChunkingSettings {
        chunk_size: req.chunk_size.unwrap_or(state.settings.chunking.chunk_size),
        chunk_overlap: req.chunk_overlap.unwrap_or(state.settings.chunking.chunk_overlap),
    };

    let generation = shared.write().await.begin_build();
    let result = match options.validate() {
        Ok(config) => state.pipeline.build_index(&req.text, config).await,
        Err(e) => Err(e),
    };
    if let Err(e) = &result {
        warn!("Session {} failed to load transcript: {}", id, e);
    }

    let outcome = shared.write().await.finish_build(generation, result);
    Ok(Json(outcome))
}

/// Ask a question in a session.
///
/// The session lock is only held to fetch the index and to record the turn,
/// not while the answer is generated.
async fn ask(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<AskRequest>,
) -> Result<Json<AskOutcome>, ApiError> {
    let shared = state.session(id).await?;

    let (index, generation) = {
        let session = shared.read().await;
        match session.index() {
            Ok(index) => (index, session.generation()),
            Err(e) => return Ok(Json(AskOutcome::rejected(e.to_string()))),
        }
    };

    let question = match prepare_question(&req.question) {
        Ok(question) => question,
        Err(e) => return Ok(Json(AskOutcome::rejected(e.to_string()))),
    };

    let answer = state.pipeline.answer(&index, question).await;

    let mut session = shared.write().await;
    // a reload meanwhile cleared the history this turn belongs to
    if session.generation() == generation {
        session.record(question, &answer);
    }

    Ok(Json(AskOutcome::answered(answer.text)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rag::AnswerGenerator;
    use crate::testing::{track, ExtractiveModel, FakeSource, KeywordEmbedder};

    const CAT_AND_DOG: &str = "The cat sat on the mat. The dog ran in the park.";

    fn state() -> Arc<AppState> {
        state_with(Settings::default())
    }

    fn state_with(settings: Settings) -> Arc<AppState> {
        let pipeline = Pipeline::with_components(
            Arc::new(KeywordEmbedder::new()),
            AnswerGenerator::new(Arc::new(ExtractiveModel)),
            &settings,
        );
        let source = Arc::new(FakeSource::new(vec![(
            track("en", "English", false),
            vec!["The cat sat", "on the mat."],
        )]));
        Arc::new(AppState::new(pipeline, source, settings))
    }

    async fn new_session(state: &Arc<AppState>) -> Uuid {
        let (status, Json(created)) = create_session(State(state.clone())).await.unwrap();
        assert_eq!(status, StatusCode::CREATED);
        created.session_id
    }

    #[test]
    fn test_router_builds() {
        let _ = router(state());
    }

    #[tokio::test]
    async fn test_extract_id() {
        let Json(response) = extract_id(
            State(state()),
            Json(ExtractRequest {
                url: "https://youtu.be/dQw4w9WgXcQ".to_string(),
                language_code: default_language(),
            }),
        )
        .await;

        assert_eq!(response.transcript.as_deref(), Some("The cat sat on the mat."));
        assert_eq!(response.message, "Transcript successfully extracted in en!");

        let Json(response) = extract_id(
            State(state()),
            Json(ExtractRequest {
                url: "not a url".to_string(),
                language_code: default_language(),
            }),
        )
        .await;
        assert!(response.transcript.is_none());
        assert_eq!(response.message, "Invalid URL format or missing video ID.");
    }

    #[tokio::test]
    async fn test_rag_qa() {
        let Json(outcome) = rag_qa(
            State(state()),
            Json(RagRequest {
                transcript: CAT_AND_DOG.to_string(),
                question: "What did the cat do?".to_string(),
            }),
        )
        .await;
        assert!(outcome.error.is_none());
        assert!(outcome.answer.unwrap().contains("sat on the mat"));

        let Json(outcome) = rag_qa(
            State(state()),
            Json(RagRequest {
                transcript: String::new(),
                question: "What did the cat do?".to_string(),
            }),
        )
        .await;
        assert!(outcome.answer.is_none());
        assert_eq!(outcome.error.as_deref(), Some("no content to process after splitting"));
    }

    #[tokio::test]
    async fn test_session_lifecycle() {
        let state = state();
        let id = new_session(&state).await;

        let Json(info) = get_session(State(state.clone()), Path(id)).await.unwrap();
        assert_eq!(info.state, "empty");

        let Json(asked) = ask(
            State(state.clone()),
            Path(id),
            Json(AskRequest {
                question: "What did the cat do?".to_string(),
            }),
        )
        .await
        .unwrap();
        assert!(asked.answer.is_none());
        assert!(asked.error.is_some());

        let Json(loaded) = load_transcript(
            State(state.clone()),
            Path(id),
            Json(LoadRequest {
                text: CAT_AND_DOG.to_string(),
                chunk_size: None,
                chunk_overlap: None,
            }),
        )
        .await
        .unwrap();
        assert_eq!(loaded, LoadOutcome::ready(1));

        let Json(asked) = ask(
            State(state.clone()),
            Path(id),
            Json(AskRequest {
                question: "What did the cat do?".to_string(),
            }),
        )
        .await
        .unwrap();
        assert!(asked.answer.unwrap().contains("sat on the mat"));

        let Json(info) = get_session(State(state.clone()), Path(id)).await.unwrap();
        assert_eq!(info.state, "ready");
        assert_eq!(info.segments, 1);
        assert_eq!(info.history.len(), 1);

        let status = delete_session(State(state.clone()), Path(id)).await.unwrap();
        assert_eq!(status, StatusCode::NO_CONTENT);

        let err = get_session(State(state), Path(id)).await.unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_invalid_chunk_options_fail_load() {
        let state = state();
        let id = new_session(&state).await;

        let Json(loaded) = load_transcript(
            State(state.clone()),
            Path(id),
            Json(LoadRequest {
                text: CAT_AND_DOG.to_string(),
                chunk_size: Some(100),
                chunk_overlap: Some(100),
            }),
        )
        .await
        .unwrap();
        assert!(!loaded.ready);
        assert!(loaded.error.unwrap().contains("Configuration error"));

        let Json(info) = get_session(State(state), Path(id)).await.unwrap();
        assert_eq!(info.state, "error");
        assert!(info.error.is_some());
    }

    #[tokio::test]
    async fn test_idle_sessions_are_evicted() {
        let state = state();
        let idle = new_session(&state).await;

        let later = Instant::now() + Duration::from_secs(3601);
        assert_eq!(state.evict_idle(later).await, 1);

        let err = get_session(State(state.clone()), Path(idle)).await.unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_used_sessions_survive_sweep() {
        let state = state();
        let id = new_session(&state).await;
        get_session(State(state.clone()), Path(id)).await.unwrap();

        assert_eq!(state.evict_idle(Instant::now()).await, 0);

        let mut settings = Settings::default();
        settings.server.session_idle_seconds = 0;
        let keep_forever = state_with(settings);
        new_session(&keep_forever).await;
        let much_later = Instant::now() + Duration::from_secs(1_000_000);
        assert_eq!(keep_forever.evict_idle(much_later).await, 0);
    }

    #[tokio::test]
    async fn test_session_cap() {
        let mut settings = Settings::default();
        settings.server.max_sessions = 2;
        let state = state_with(settings);

        let first = new_session(&state).await;
        new_session(&state).await;

        let err = create_session(State(state.clone())).await.unwrap_err();
        assert_eq!(err.status, StatusCode::SERVICE_UNAVAILABLE);

        delete_session(State(state.clone()), Path(first)).await.unwrap();
        new_session(&state).await;
    }

    #[tokio::test]
    async fn test_unknown_session() {
        let err = ask(
            State(state()),
            Path(Uuid::new_v4()),
            Json(AskRequest {
                question: "hello?".to_string(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_error_status_mapping() {
        assert_eq!(ApiError::from(VidqaError::NoContent).status, StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::from(VidqaError::SessionNotReady("x".into())).status,
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::from(VidqaError::Llm("down".into())).status,
            StatusCode::BAD_GATEWAY
        );
    }
}
