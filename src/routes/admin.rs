//! HTML admin listing under `/admin`.

use crate::handlers::admin::{courses, index, students};
use crate::state::AppState;
use axum::{routing::get, Router};

pub fn admin_routes(state: AppState) -> Router {
    Router::new()
        .route("/admin", get(index))
        .route("/admin/", get(index))
        .route("/admin/courses", get(courses))
        .route("/admin/courses/", get(courses))
        .route("/admin/students", get(students))
        .route("/admin/students/", get(students))
        .with_state(state)
}
