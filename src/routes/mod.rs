use crate::models::AppState;
use axum::Router;

pub mod aggregate_routes;

pub fn router(state: AppState) -> Router {
    Router::new()
        .nest("/aggregate", aggregate_routes::router())
        .with_state(state)
}
