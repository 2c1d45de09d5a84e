//! Vocabularies and filter types for pbmc-mcp.
//!
//! This crate defines the closed value sets accepted by the PBMCpedia atlas,
//! the validated filter records built from tool input, and the schema
//! constants shared by the query builder and the response aggregator.

pub mod filters;
pub mod schema;
pub mod vocab;

pub use filters::*;
pub use vocab::*;
