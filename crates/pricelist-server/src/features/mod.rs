//! Feature slices of the HTTP API
//!
//! - **uploads**: CSV intake and batch status polling
//! - **products**: read-only catalog listing
//!
//! Each slice has `commands/` (writes), `queries/` (reads) and `routes.rs`.
//! Commands and queries are `mediator` requests with a `validate()` step and a
//! free `handle` function.

pub mod products;
pub mod shared;
pub mod uploads;

use axum::{extract::DefaultBodyLimit, Router};

pub use uploads::IntakeState;

/// Room for multipart boundaries and part headers on top of the file itself
pub const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Shared state for all feature routes
#[derive(Clone)]
pub struct FeatureState {
    /// Read side of the catalog
    pub db: sqlx::PgPool,
    pub intake: IntakeState,
}

/// Mounts every feature under its path prefix:
/// - `/upload` - CSV intake and status
/// - `/products` - catalog listing
pub fn router(state: FeatureState) -> Router<()> {
    let body_limit = state.intake.max_file_size.saturating_add(MULTIPART_OVERHEAD);

    Router::new()
        .nest(
            "/upload",
            uploads::uploads_routes()
                .layer(DefaultBodyLimit::max(body_limit))
                .with_state(state.intake.clone()),
        )
        .nest("/products", products::products_routes().with_state(state.db.clone()))
}
