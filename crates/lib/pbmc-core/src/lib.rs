//! Core query services for pbmc-mcp.
//!
//! This crate builds upstream request sequences for the PBMCpedia atlas API,
//! issues them one at a time through an injected [`upstream::Fetch`]
//! capability, and folds the responses into grouped, resolution-partitioned
//! results. The first failing request aborts the whole operation.

pub mod aggregate;
pub mod control;
pub mod error;
pub mod query;
pub mod upstream;

pub use control::PbmcControlPlane;
pub use error::{QueryError, QueryResult};
