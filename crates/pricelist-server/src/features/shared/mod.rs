//! Types shared by feature slices

pub mod pagination;

pub use pagination::{Paginated, PaginationMetadata};
