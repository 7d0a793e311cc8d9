//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events, redacted parameters)
//!     → metrics.rs (counters, histograms)
//!     → audit.rs (one record per redirect request)
//!
//! Consumers:
//!     → Log aggregation (stdout, pretty or JSON)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - Request ID flows through the access log span
//! - Metrics are cheap (atomic increments); recording without an installed
//!   exporter is a no-op

pub mod audit;
pub mod logging;
pub mod metrics;
