//! JSON API routes under `/api/v1`.

use crate::handlers::{course, student};
use crate::state::AppState;
use axum::{
    routing::{get, MethodRouter},
    Router,
};

pub fn api_routes(state: AppState) -> Router {
    let router = Router::new();
    let router = resource(
        router,
        "/api/v1/courses",
        get(course::list).post(course::create),
        get(course::read)
            .put(course::replace)
            .patch(course::update)
            .delete(course::delete),
    );
    let router = resource(
        router,
        "/api/v1/students",
        get(student::list).post(student::create),
        get(student::read)
            .put(student::replace)
            .patch(student::update)
            .delete(student::delete),
    );
    router.with_state(state)
}

/// Mounts a collection and its members, with and without the trailing slash.
fn resource(
    router: Router<AppState>,
    prefix: &str,
    collection: MethodRouter<AppState>,
    member: MethodRouter<AppState>,
) -> Router<AppState> {
    router
        .route(prefix, collection.clone())
        .route(&format!("{}/", prefix), collection)
        .route(&format!("{}/:id", prefix), member.clone())
        .route(&format!("{}/:id/", prefix), member)
}
