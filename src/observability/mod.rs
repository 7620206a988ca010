//! # Observability
//!
//! Prometheus metrics and tracing setup.
//!
//! ## Sub-modules
//!
//! - `metrics` - Release action metrics and their registry
//! - `logging` - Tracing subscriber initialization

pub mod metrics;
pub mod logging;
