pub mod queries;
pub mod routes;

pub use queries::{ListProductsError, ListProductsQuery, ListProductsResponse, ProductListItem};
pub use routes::products_routes;
