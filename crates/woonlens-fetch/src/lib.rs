//! Shared HTTP plumbing for every downstream source.
//!
//! One [`Fetcher`] wraps the process-wide `reqwest::Client` and gives the
//! adapters a uniform, deadline-aware request surface: typed JSON GET, JSON
//! POST, and form POST, plus [`with_retry`] for the sources that tolerate
//! transient upstream errors. All failures are expressed as [`SourceError`],
//! which the aggregation engine records per source without failing the
//! request.

mod error;
mod fetcher;
mod retry;

pub use error::SourceError;
pub use fetcher::Fetcher;
pub use retry::with_retry;
