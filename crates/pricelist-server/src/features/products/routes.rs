//! Product catalog routes
//!
//! - `GET /api/v1/products` - Filtered, sorted, paginated product listing

use crate::api::response::{ApiResponse, ErrorResponse};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use sqlx::PgPool;

use super::queries::{ListProductsError, ListProductsQuery};

pub fn products_routes() -> Router<PgPool> {
    Router::new().route("/", get(list_products))
}

/// List products
///
/// # Endpoint
///
/// `GET /api/v1/products?name=wid&min_price=1&sort_by=price&sort_order=desc&page=1&limit=10`
///
/// # Response
///
/// - `200 OK` - Products with pagination metadata
/// - `400 Bad Request` - Invalid filter, sort or paging parameters
/// - `500 Internal Server Error` - Database error
#[tracing::instrument(
    skip(pool, query),
    fields(page = ?query.page, limit = ?query.limit, sort_by = ?query.sort_by)
)]
async fn list_products(
    State(pool): State<PgPool>,
    Query(query): Query<ListProductsQuery>,
) -> Result<Response, ProductApiError> {
    let response = super::queries::list::handle(pool, query).await?;

    tracing::debug!(
        count = response.items.len(),
        total = response.pagination.total,
        "Products listed via API"
    );

    let meta = json!({
        "pagination": response.pagination
    });

    Ok(
        (StatusCode::OK, Json(ApiResponse::success_with_meta(response.items, meta)))
            .into_response(),
    )
}

#[derive(Debug)]
struct ProductApiError(ListProductsError);

impl From<ListProductsError> for ProductApiError {
    fn from(err: ListProductsError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ProductApiError {
    fn into_response(self) -> Response {
        match self.0 {
            ListProductsError::Database(ref e) => {
                tracing::error!("Database error during product listing: {}", e);
                ErrorResponse::new("INTERNAL_ERROR", "A database error occurred")
                    .into_response_with(StatusCode::INTERNAL_SERVER_ERROR)
            },
            ref validation => ErrorResponse::new("VALIDATION_ERROR", validation.to_string())
                .into_response_with(StatusCode::BAD_REQUEST),
        }
    }
}
