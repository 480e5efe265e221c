//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (method, path, query, headers)
//!     → router.rs (mode selection, preflight, whitelist)
//!     → classifier.rs (tag the GitHub target)
//!     → dispatch: relay / CDN redirect / raw rewrite
//!
//! Pattern Compilation (at startup):
//!     ordered (regex, kind) table
//!     → compiled once
//!     → shared immutably
//! ```
//!
//! # Design Decisions
//! - Deterministic: same input always yields the same kind
//! - First match wins (ordered by priority)

pub mod classifier;
pub mod router;

pub use classifier::{Classifier, TargetDescriptor, TargetKind};
pub use router::ProxyService;
