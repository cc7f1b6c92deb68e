//! # RAAS Testkit
//!
//! Test utilities for the raw active alarms store.
//!
//! This crate provides:
//! - Test fixtures: stores on every backend with automatic cleanup
//! - Reusable scenarios checked against every backend
//! - Traversal helpers that apply packs the way a client does
//! - Property-based test generators using proptest
//!
//! ## Usage
//!
//! ```rust,ignore
//! use raas_testkit::prelude::*;
//!
//! #[test]
//! fn test_on_every_backend() {
//!     with_each_backend(|store| {
//!         StoreScenarios::new(&**store).t5_when_put_three_alarms_then_keep_their_order();
//!     });
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod scenarios;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::scenarios::*;
}

pub use fixtures::*;
pub use generators::*;
pub use scenarios::*;
