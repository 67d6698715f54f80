//! ytscout - YouTube channel discovery, enrichment, and ranking pipeline.
//!
//! A multi-stage idempotent pipeline over a shared SQLite store:
//!
//! ```text
//! raw discovery -> normalization/validation -> channel enrichment
//!               -> channel analysis -> channel scoring
//! ```
//!
//! Each stage reads the unprocessed rows the previous stage left behind.
//! Concurrent workers coordinate exclusively through the store's atomic
//! claim inserts; there is no central scheduler. On top sits a
//! deterministic analytics engine: human-text metric parsing, temporal-gap
//! content-cycle segmentation, and a weighted normalized scoring function.

pub mod analysis;
pub mod cli;
pub mod models;
pub mod parsing;
pub mod pipeline;
pub mod repository;
pub mod schema;
pub mod services;
pub mod work_queue;
