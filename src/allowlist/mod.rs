//! Allowlist subsystem.
//!
//! # Data Flow
//! ```text
//! PUT /api body (ClientPatternSpec[])
//!     → schema.rs (lengths, required fields, wildcard placement)
//!     → compiler.rs (URL parsing, host-key index, relativization)
//!     → CompiledAllowlist (persisted in AllowlistDocument)
//!
//! Redirect request:
//!     state URL → matcher.rs (host bucket lookup, first-match scan)
//!     → MatchResult
//!
//! GET /api:
//!     CompiledAllowlist → expand.rs → ClientPatternSpec[] (absolute URLs)
//! ```

pub mod compiler;
pub mod hosts;
pub mod expand;
pub mod matcher;
pub mod schema;
pub mod types;

pub use compiler::{compile, PatternError};
pub use expand::expand;
pub use matcher::{match_state, MatchError};
pub use schema::{validate_specs, SchemaError};
pub use types::{AllowlistDocument, ClientPatternSpec, CompiledAllowlist, CompiledClientEntry, MatchResult};
