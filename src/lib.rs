//! Student and course management backend: JSON API, admin listing, and the
//! SQL stores behind them.

pub mod config;
pub mod error;
pub mod handlers;
pub mod markup;
pub mod model;
pub mod response;
pub mod routes;
pub mod service;
pub mod state;
pub mod store;

pub use config::AppConfig;
pub use error::{AppError, ConfigError};
pub use model::{Course, CoursePatch, ListFilter, NewCourse, NewStudent, Student, StudentPatch};
pub use routes::{admin_routes, api_routes, common_routes, common_routes_with_ready};
pub use state::AppState;
pub use store::{connect, PgStore, SqliteStore, Store};

use axum::Router;
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};

/// The whole service: API, admin listing, and health routes.
pub fn app(state: AppState, config: &AppConfig) -> Router {
    Router::new()
        .merge(common_routes_with_ready(state.clone()))
        .merge(api_routes(state.clone()))
        .merge(admin_routes(state))
        .layer(RequestBodyLimitLayer::new(config.body_limit_bytes))
        .layer(TraceLayer::new_for_http())
}
