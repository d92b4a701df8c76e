use std::sync::Arc;

use anyhow::Context;
use axum::{
    extract::DefaultBodyLimit,
    handler::HandlerWithoutStateExt,
    http::{header, HeaderName, Method},
    routing::{delete, get},
    Extension, Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::auth::{GoogleProvider, IdentityProvider, SessionStore};
use crate::config::AppConfig;
use crate::database::{self, DocumentStore};
use crate::handlers;
use crate::resources::{ResourceModel, Resources};

/// Everything a handler may need, shared across requests
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn DocumentStore>,
    pub resources: Resources,
    pub sessions: Arc<SessionStore>,
    pub provider: Arc<dyn IdentityProvider>,
}

impl AppState {
    pub fn new(config: AppConfig, store: Arc<dyn DocumentStore>, provider: Arc<dyn IdentityProvider>) -> Self {
        let resources = Resources::new(store.clone(), config.security.require_session);
        let sessions = Arc::new(SessionStore::new(config.security.session_ttl_hours));
        Self {
            config: Arc::new(config),
            store,
            resources,
            sessions,
            provider,
        }
    }

    /// Wire the configured store and the Google provider
    pub fn from_config(config: AppConfig) -> anyhow::Result<Self> {
        let store = database::open_store(&config.database).context("failed to set up document store")?;
        let provider = GoogleProvider::new(config.oauth.clone()).context("invalid OAuth configuration")?;
        Ok(Self::new(config, store, Arc::new(provider)))
    }
}

pub fn router(state: AppState) -> Router {
    let server = &state.config.server;
    let json_assets = ServeDir::new(&server.json_dir);
    let pages = ServeDir::new(&server.pages_dir).not_found_service(handlers::not_found.into_service());
    let body_limit = server.max_request_size_bytes;

    let mut app = Router::new()
        .route("/health", get(handlers::health))
        .merge(auth_routes());

    for model in state.resources.iter() {
        app = app.merge(resource_routes(model.clone()));
    }

    app.nest_service("/app/json", json_assets)
        .fallback_service(pages)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn auth_routes() -> Router<AppState> {
    use handlers::auth;

    Router::new()
        .route("/auth/google", get(auth::google_login))
        .route("/auth/google/callback", get(auth::google_callback))
        .route("/auth/logout", get(auth::logout))
}

/// List, create and detail routes for one collection, plus delete/count
/// where the collection offers them. Every path also answers with a
/// trailing slash.
fn resource_routes(model: ResourceModel) -> Router<AppState> {
    use handlers::resources;

    let spec = model.spec();
    let base = format!("/app/{}", spec.path);

    let mut routes = vec![
        (base.clone(), get(resources::list).post(resources::create)),
        (format!("{}/:id", base), get(resources::detail)),
    ];
    if spec.countable {
        routes.push((format!("{}/count", base), get(resources::count)));
    }
    if spec.deletable {
        routes.push((format!("{}/delete/:id", base), delete(resources::delete)));
    }

    let mut router = Router::new();
    for (path, method_router) in routes {
        router = router
            .route(&format!("{}/", path), method_router.clone())
            .route(&path, method_router);
    }

    router.layer(Extension(model))
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_headers([
            header::ORIGIN,
            HeaderName::from_static("x-requested-with"),
            header::CONTENT_TYPE,
            header::ACCEPT,
        ])
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
}
