//! # Replifile Testkit
//!
//! Test utilities for Replifile.
//!
//! This crate provides:
//! - Fixtures that build replica sets in temporary directories
//! - Out-of-band damage helpers that corrupt, extend or truncate a member
//!   file behind the replica set's back
//! - Property-based test generators using proptest
//!
//! ## Usage
//!
//! ```rust,ignore
//! use replifile_testkit::prelude::*;
//!
//! #[test]
//! fn detects_corruption() {
//!     let mut fixture = TestReplicaSet::with_replicas(3);
//!     fixture.write(b"payload").unwrap();
//!     corrupt_byte(&fixture.replicas[1], 2);
//!     // ... read and expect failure
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod damage;
pub mod fixtures;
pub mod generators;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::damage::*;
    pub use crate::fixtures::*;
    pub use crate::generators::*;
}

pub use damage::*;
pub use fixtures::*;
pub use generators::*;
