/// Application state and router builder
///
/// # Example
///
/// ```no_run
/// use orgdesk_api::{app::{build_router, AppState}, config::Config};
/// use orgdesk_shared::db::pool::{create_pool, DatabaseConfig};
/// use orgdesk_shared::store::PgStore;
/// use std::sync::Arc;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = create_pool(DatabaseConfig {
///     url: config.database.url.clone(),
///     ..Default::default()
/// })
/// .await?;
///
/// let state = AppState::new(Arc::new(PgStore::new(pool)), config);
/// let app = build_router(state);
///
/// let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
/// axum::serve(listener, app).await?;
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, middleware::identity::identity_layer, routes};
use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, patch, post},
    Router,
};
use orgdesk_shared::store::TenancyStore;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned for each request handler via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    /// Tenancy datastore
    pub store: Arc<dyn TenancyStore>,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(store: Arc<dyn TenancyStore>, config: Config) -> Self {
        Self {
            store,
            config: Arc::new(config),
        }
    }

    /// Secret used to verify identity tokens
    pub fn jwt_secret(&self) -> &str {
        &self.config.identity.jwt_secret
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── GET /health                                   # public
/// └── /v1/                                          # bearer token required
///     ├── GET    /org                               # has_organization / current org
///     ├── GET    /org/members
///     ├── POST   /organizations
///     ├── GET    /projects
///     ├── POST   /projects
///     ├── GET    /projects/:project_id
///     ├── POST   /projects/:project_id/tasks
///     ├── PATCH  /projects/:project_id/tasks/:task_id
///     ├── DELETE /projects/:project_id/tasks/:task_id
///     ├── GET    /invites
///     ├── POST   /invites
///     ├── POST   /invites/accept
///     └── GET    /activity
/// ```
///
/// # Middleware Stack
///
/// 1. Tracing (tower-http TraceLayer)
/// 2. CORS (tower-http CorsLayer)
/// 3. Identity and membership resolution (`/v1` only)
pub fn build_router(state: AppState) -> Router {
    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    let v1_routes = Router::new()
        .route("/org", get(routes::organizations::current_org))
        .route("/org/members", get(routes::organizations::list_members))
        .route("/organizations", post(routes::organizations::create_organization))
        .route(
            "/projects",
            get(routes::projects::list_projects).post(routes::projects::create_project),
        )
        .route("/projects/:project_id", get(routes::projects::get_project))
        .route("/projects/:project_id/tasks", post(routes::tasks::create_task))
        .route(
            "/projects/:project_id/tasks/:task_id",
            patch(routes::tasks::toggle_task).delete(routes::tasks::delete_task),
        )
        .route(
            "/invites",
            get(routes::invites::list_pending_invites).post(routes::invites::create_invite),
        )
        .route("/invites/accept", post(routes::invites::accept_invite))
        .route("/activity", get(routes::activity::list_activity))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            identity_layer,
        ));

    let cors = if state.config.allows_any_origin() {
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .merge(health_routes)
        .nest("/v1", v1_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .with_state(state)
}
