//! HTTP adapter for reservation projection synchronization.
//!
//! Accepts post-commit lifecycle events from the primary store, serves the
//! read side of the four projections, reports background job status, and
//! exposes health and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use metrics_exporter_prometheus::PrometheusHandle;
use projection_store::ProjectionStore;
use projections::{
    AvailabilityFlags, CityReservationIndex, HostReservationIndex, OccupancyLedger,
};
use sync_engine::{SyncConfig, SyncOrchestrator};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use routes::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: ProjectionStore + Clone + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check::<S>))
        .route("/events", post(routes::events::publish::<S>))
        .route("/occupancy/{city_id}", get(routes::occupancy::report::<S>))
        .route("/occupancy/{city_id}/{date}", get(routes::occupancy::get::<S>))
        .route("/availability/{date}", get(routes::availability::list::<S>))
        .route(
            "/hosts/{host_id}/reservations/{date}",
            get(routes::hosts::reservations::<S>),
        )
        .route(
            "/cities/{city_id}/reservations/{date}",
            get(routes::cities::reservations::<S>),
        )
        .route("/jobs/{job_id}", get(routes::jobs::status::<S>))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates the application state over a shared store handle.
///
/// Starts the orchestrator's background workers, so this must run inside a
/// tokio runtime.
pub fn create_default_state<S: ProjectionStore + Clone + 'static>(
    store: S,
    sync_config: SyncConfig,
) -> Arc<AppState<S>> {
    Arc::new(AppState {
        orchestrator: SyncOrchestrator::new(store.clone(), sync_config),
        ledger: OccupancyLedger::new(store.clone()),
        flags: AvailabilityFlags::new(store.clone()),
        host_index: HostReservationIndex::new(store.clone()),
        city_index: CityReservationIndex::new(store),
    })
}
