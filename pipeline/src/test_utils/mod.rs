//! Test utilities
//!
//! Fixtures and manual mock implementations of the domain ports,
//! compiled for tests only.

pub mod fixtures;
pub mod mocks;

pub use fixtures::*;
pub use mocks::*;
