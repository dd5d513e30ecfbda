use std::sync::Arc;

use axum::{
    extract::State,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    routing::get,
    Json, Router,
};
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{AllowOrigin, CorsLayer},
};

use crate::{
    api,
    auth::{AuthError, Claims, Keys},
    config, pages,
    scheduler::MailScheduler,
};

pub type SharedAppState = Arc<AppState>;

pub struct AppState {
    pub keys: Keys,

    pub scheduler: Arc<MailScheduler>,
}

pub fn routes() -> Router<SharedAppState> {
    Router::new()
        .route("/api/session", get(get_session))
        .route("/api/admin/scheduler", get(get_scheduler_status))
        .route("/weekly-checkin/loading", get(pages::loading::weekly_checkin))
}

/// Wraps `routes` with the 404 fallback, the panic-to-error-page layer and
/// CORS.
pub fn app(
    routes: Router<SharedAppState>,
    state: SharedAppState,
    cors: CorsLayer,
) -> Router {
    routes
        .fallback(pages::not_found)
        .layer(CatchPanicLayer::custom(pages::error::from_panic))
        .layer(cors)
        .with_state(state)
}

pub fn cors(
    config: &config::Cors,
) -> Result<CorsLayer, axum::http::header::InvalidHeaderValue> {
    let origins = if config.allowed_origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(
            config
                .allowed_origins
                .iter()
                .map(|o| o.parse::<HeaderValue>())
                .collect::<Result<Vec<_>, _>>()?,
        )
    };
    Ok(CorsLayer::new()
        .allow_methods([Method::GET])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
        .allow_origin(origins))
}

async fn get_session(claims: Claims) -> Result<Json<api::Session>, AuthError> {
    claims.into_session().map(Json)
}

async fn get_scheduler_status(
    State(state): State<SharedAppState>,
    claims: Claims,
) -> Result<Json<api::scheduler::Status>, AuthError> {
    claims.require(api::Role::Admin)?;
    Ok(Json(state.scheduler.status()))
}
