//! # StreamHub Testkit
//!
//! Test utilities for StreamHub.
//!
//! This crate provides:
//! - Fixtures: JSON state records and scripted protocol responses
//! - Property-based test generators using proptest
//!
//! ## Usage
//!
//! ```rust,ignore
//! use streamhub_testkit::prelude::*;
//!
//! let response = stream_data([("9", content_state("9", "hello"))], "E5");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
}

pub use fixtures::*;
pub use generators::*;
