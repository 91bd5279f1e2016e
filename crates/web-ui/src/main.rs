use anyhow::Result;

mod render;
use axum::{
    extract::{Form, State},
    http::StatusCode,
    response::Html,
    routing::get,
    Json, Router,
};
use colorbook_common::{
    Error as CommonError, ErrorResponse, HealthResponse, HealthStatus, IdeaMap, MetricsSnapshot,
    ObservableMetrics,
};
use colorbook_config::{ConfigLoader, PromptRegistry};
use colorbook_runtime::{CredentialGate, ModelSettings, OpenAiConnector};
use colorbook_session::{Event, Notice, Outcome, Session};
use colorbook_store::{IdeaStore, JsonIdeaStore};
use render::{PageRenderer, PageView};
use serde::Deserialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::SystemTime;
use tokio::sync::Mutex;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Clone)]
struct AppState {
    session: Arc<Mutex<Session>>,
    store: Arc<dyn IdeaStore>,
    metrics: Arc<ObservableMetrics>,
    renderer: Arc<PageRenderer>,
    /// Mirrors the session so health checks never wait on a running action
    authenticated: Arc<AtomicBool>,
    /// Notices raised outside a request, shown on the next page
    pending: Arc<Mutex<Vec<Notice>>>,
    start_time: SystemTime,
}

impl AppState {
    fn new(session: Session, store: Arc<dyn IdeaStore>, metrics: Arc<ObservableMetrics>, renderer: PageRenderer) -> Self {
        Self {
            authenticated: Arc::new(AtomicBool::new(session.is_authenticated())),
            session: Arc::new(Mutex::new(session)),
            store,
            metrics,
            renderer: Arc::new(renderer),
            pending: Arc::new(Mutex::new(Vec::new())),
            start_time: SystemTime::now(),
        }
    }

    fn with_pending(self, notices: Vec<Notice>) -> Self {
        Self {
            pending: Arc::new(Mutex::new(notices)),
            ..self
        }
    }
}

#[derive(Deserialize)]
struct LoginForm {
    #[serde(default)]
    api_key: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum FormAction {
    Ideas,
    Recall,
    Coloring,
}

#[derive(Deserialize)]
struct ActionForm {
    action: FormAction,
    #[serde(default)]
    topic: String,
    #[serde(default)]
    idea: Option<usize>,
}

type PageResult = Result<Html<String>, (StatusCode, String)>;

/// Render the page for the current state; the session lock is held by the caller
async fn render_page(state: &AppState, session: &Session, outcome: Outcome) -> PageResult {
    let mut notices = std::mem::take(&mut *state.pending.lock().await);
    notices.extend(outcome.notices);
    let outcome = Outcome { notices, ..outcome };

    let view = PageView::new(session.state(), &outcome);
    state.renderer.render(&view).map(Html).map_err(|e| {
        error!("Page rendering failed: {}", e);
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })
}

async fn index(State(state): State<AppState>) -> PageResult {
    let session = state.session.lock().await;
    render_page(&state, &session, Outcome::default()).await
}

async fn login(State(state): State<AppState>, Form(form): Form<LoginForm>) -> PageResult {
    let mut session = state.session.lock().await;
    let outcome = session.dispatch(Event::SubmitCredential(form.api_key)).await;
    state.authenticated.store(session.is_authenticated(), Ordering::Release);
    render_page(&state, &session, outcome).await
}

async fn action(State(state): State<AppState>, Form(form): Form<ActionForm>) -> PageResult {
    let mut session = state.session.lock().await;
    let mut outcome = Outcome::default();

    // the select box carries the current choice along with every action
    if let (Some(index), true) = (form.idea, session.is_authenticated()) {
        let selected = session.dispatch(Event::SelectIdea(index)).await;
        outcome.notices.extend(selected.notices);
    }

    let event = match form.action {
        FormAction::Ideas => Event::ShowIdeas { topic: form.topic },
        FormAction::Recall => Event::RecallIdeas { topic: form.topic },
        FormAction::Coloring => Event::GenerateColoring,
    };
    debug!(action = ?form.action, "Dispatching form action");

    let result = session.dispatch(event).await;
    outcome.notices.extend(result.notices);
    outcome.images.extend(result.images);

    render_page(&state, &session, outcome).await
}

async fn saved_ideas(
    State(state): State<AppState>,
) -> Result<Json<IdeaMap>, (StatusCode, Json<ErrorResponse>)> {
    let fail = |e: CommonError| {
        let status = StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(ErrorResponse::from(&e)))
    };

    if !state.authenticated.load(Ordering::Acquire) {
        return Err(fail(CommonError::NotAuthenticated));
    }

    match state.store.load_all().await {
        Ok(ideas) => Ok(Json(ideas)),
        Err(e) => {
            state.metrics.record_error(&e).await;
            Err(fail(e))
        }
    }
}

async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let authenticated = state.authenticated.load(Ordering::Acquire);
    let status = if authenticated {
        HealthStatus::Healthy
    } else {
        HealthStatus::Degraded
    };

    let uptime = state.start_time.elapsed()
        .unwrap_or_default()
        .as_secs();

    Json(HealthResponse {
        status,
        authenticated,
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: uptime,
    })
}

async fn get_metrics(State(state): State<AppState>) -> Json<MetricsSnapshot> {
    Json(state.metrics.snapshot().await)
}

/// Check a key taken from the environment before the first page is served.
///
/// Returns the notices a rejected key produced so the login form can show them.
async fn startup_login(session: &mut Session, raw: Option<String>) -> Vec<Notice> {
    let Some(raw) = raw.filter(|raw| !raw.trim().is_empty()) else {
        info!("No credential in environment, waiting for interactive login");
        return Vec::new();
    };

    info!("Validating credential from environment");
    let outcome = session.dispatch(Event::SubmitCredential(raw)).await;
    if session.is_authenticated() {
        Vec::new()
    } else {
        warn!("Credential from environment was rejected, waiting for interactive login");
        outcome.notices
    }
}

fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(index).post(action))
        .route("/login", axum::routing::post(login))
        .route("/api/ideas", get(saved_ideas))
        .route("/healthz", get(health_check))
        .route("/metrics", get(get_metrics))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[tokio::main]
async fn main() -> Result<()> {
    // .env is optional; read it before the filter so RUST_LOG can live there too
    let dotenv = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "info".into()))
        .init();

    info!("Starting Colorbook");
    match dotenv {
        Ok(path) => info!("Loaded environment from {}", path.display()),
        Err(e) => debug!("No .env file loaded: {}", e),
    }

    // Load configuration
    let config = ConfigLoader::load(None)?;

    let registry = PromptRegistry::load(config.generation.prompts_path.as_deref())?;
    let prompts = registry.get(&config.generation.locale)?.clone();
    info!(locale = %prompts.locale, "Using prompt set {}", prompts.name);

    let metrics = Arc::new(ObservableMetrics::new());
    let json_store = JsonIdeaStore::new(config.store.path.clone());
    info!(path = %json_store.path().display(), "Using idea store");
    let store: Arc<dyn IdeaStore> = Arc::new(json_store);
    let gate = CredentialGate::new(Arc::new(OpenAiConnector::new(config.openai.clone())));

    let mut session = Session::new(
        gate,
        store.clone(),
        prompts,
        ModelSettings::from(&config.openai),
        metrics.clone(),
    )
    .with_images_per_idea(config.generation.images_per_idea);

    // A key from the environment skips the login form when it is accepted
    debug!(variable = %config.openai.api_key_env, "Reading credential from environment");
    let pending = startup_login(&mut session, std::env::var(&config.openai.api_key_env).ok()).await;

    let state = AppState::new(session, store, metrics, PageRenderer::new()?).with_pending(pending);
    let app = app(state);

    // Start server
    let listener = tokio::net::TcpListener::bind((config.server.host.as_str(), config.server.port)).await?;
    info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}
