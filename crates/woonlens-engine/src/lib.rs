//! The address-to-composite-record pipeline.
//!
//! [`Engine::aggregate`] is the single operation the HTTP façade calls:
//! consult the cache, resolve the address (the only hard failure), resolve
//! the region codes, fan out to every remaining source concurrently under one
//! deadline, assemble the composite with per-source soft failures, score it,
//! cache it, return it.

mod aggregate;
mod cache;
mod scoring;

pub use aggregate::{AggregateError, Engine};
pub use cache::ResultCache;
pub use scoring::compute_scores;
