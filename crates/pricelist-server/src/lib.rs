//! Pricelist Server Library
//!
//! Asynchronous ingestion of CSV price lists with exchange-rate enrichment.
//!
//! # Overview
//!
//! - **Intake** (`features::uploads`): accepts a CSV upload, records a
//!   `pending` batch and enqueues one processing job. Never parses.
//! - **Ingestion** (`ingest`): apalis workers drive each batch through
//!   parse, rate snapshot and chunked product persistence to `finished` or
//!   `failed`.
//! - **Catalog** (`features::products`): read-only filtered listing of the
//!   committed products with their batch's rate snapshot.
//!
//! Batch state is polled through `GET /api/v1/upload/status/:batch_id`;
//! there is no push notification.
//!
//! ## Framework Stack
//!
//! - **Axum** and **Tower** for HTTP
//! - **SQLx** on PostgreSQL for batches, products and rates
//! - **apalis** with PostgreSQL storage for the job queue

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod features;
pub mod ingest;
pub mod middleware;
pub mod models;
pub mod storage;

pub use error::AppError;
