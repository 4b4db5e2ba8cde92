//! Tessera Core - Strongly-typed identifiers and limits for Tessera routing.
//!
//! This crate provides the vocabulary shared by the routing layer and its
//! callers. It does NOT track cluster membership or node health; those come
//! from the integrating application.
//!
//! # Design Principles (TigerStyle)
//!
//! - **Strongly-typed IDs**: Prevent mixing up `NodeId` with `PartitionId`
//! - **Explicit limits**: Every resource has a bounded maximum
//! - **No unsafe code**: Safety > Performance

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod limits;
mod types;

pub use limits::{CANDIDATES_PER_PARTITION_MAX, PARTITIONS_MAX};
pub use types::{Capabilities, NodeId, PartitionId};
