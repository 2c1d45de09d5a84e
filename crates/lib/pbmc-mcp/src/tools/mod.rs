//! MCP tool modules.
//!
//! Tools are grouped by upstream shape: per-cell-type fan-out, gene-indexed
//! lookups, single-request metadata tables, and static help.

pub mod atlas;
pub mod genes;
pub mod metadata;
mod context;
