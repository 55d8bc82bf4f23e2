//! API routes.

use axum::middleware;
use axum::routing::{get, post, put};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::limit::RequestBodyLimitLayer;

use crate::handlers::applications::{applied_jobs, apply_for_job};
use crate::handlers::jobs::{
    delete_job, job_applicants, list_jobs, my_jobs, post_job, update_job,
};
use crate::handlers::users::{login, register};
use crate::handlers::{health, ready};
use crate::metrics::metrics_middleware;
use crate::middleware::{cors_layer, request_id, request_logging, security_headers};
use crate::state::AppState;

/// Create the API router.
pub fn create_router(state: AppState, metrics_handle: Option<PrometheusHandle>) -> Router {
    let user_routes = Router::new()
        .route("/register", post(register))
        .route("/login", post(login));

    let job_routes = Router::new()
        // Public browsing; posting requires an employer identity
        .route("/", get(list_jobs).post(post_job))
        // Static segments before the :id catch-alls
        .route("/my-jobs", get(my_jobs))
        .route("/applied", get(applied_jobs))
        .route("/:id", put(update_job).delete(delete_job))
        .route("/:id/applicants", get(job_applicants))
        .route("/:id/apply", post(apply_for_job));

    let api_routes = Router::new()
        .nest("/users", user_routes)
        .nest("/jobs", job_routes);

    let health_routes = Router::new()
        .route("/health", get(health))
        .route("/healthz", get(health))
        .route("/ready", get(ready));

    // Metrics endpoint (if enabled)
    let metrics_routes = if let Some(handle) = metrics_handle {
        Router::new().route("/metrics", get(move || async move { handle.render() }))
    } else {
        Router::new()
    };

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .merge(metrics_routes)
        // Request body size limit; all bodies in scope are small JSON
        .layer(RequestBodyLimitLayer::new(state.config.max_body_size))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(security_headers))
        .layer(middleware::from_fn(request_id))
        .layer(middleware::from_fn(request_logging))
        .layer(cors_layer(&state.config.cors_origins))
        .with_state(state)
}
