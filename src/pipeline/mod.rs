//! Pipeline stage drivers.
//!
//! Stage sequencing is fixed and linear: ingest -> normalize -> enrich ->
//! analyze -> score. Every stage is independently retriable; drivers report
//! aggregate counts and catch per-unit failures at the worker-loop
//! boundary so a single bad row never halts a batch.

pub mod analyze;
pub mod enrich;
pub mod ingest;
pub mod normalize;
pub mod score;

pub use analyze::{run_analysis, AnalyzeOptions};
pub use enrich::{run_enrichment, EnrichOptions};
pub use ingest::{run_ingest, IngestReport};
pub use normalize::{normalize_raw_video, run_normalization, NormalizeStats};
pub use score::{run_scoring, ScoreStats};
