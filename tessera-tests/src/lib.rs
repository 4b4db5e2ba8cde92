//! Tessera Tests - property, randomized and concurrency tests for routing.
//!
//! This crate holds the cross-component tests for Tessera. Unit tests stay
//! inline in each crate; everything that needs random topologies, many
//! threads or an async runtime lives here.
//!
//! ## Test Organization
//!
//! **Scenario Tests** (`*_tests.rs`):
//! - `coverage_tests`: replica coverage and degraded-service behavior
//! - `randomized_tests`: seeded random topologies checked against properties
//! - `concurrency_tests`: shared cursors and availability flags under threads
//! - `table_tests`: snapshot swaps while readers route
//!
//! **Support Modules**:
//! - `properties`: property checkers (`check_coverage`, `check_fair_share`)
//! - `scenarios`: seeds and topology generators
//!
//! Endpoint shorthand and the warning recorder come from
//! `tessera_routing::testing` (the `test-util` feature).
//!
//! ## Naming Conventions
//!
//! - Scenario tests: `test_<component>_<scenario>`
//! - Unit tests: Inline in each crate under `#[cfg(test)]`

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::cast_possible_truncation)]

pub mod properties;
pub mod scenarios;

#[cfg(test)]
mod concurrency_tests;
