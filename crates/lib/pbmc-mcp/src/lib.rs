//! MCP server implementation for pbmc-mcp.
//!
//! This crate wires the atlas control plane into rmcp tool handlers and
//! exposes the tools over stdio or streamable HTTP.

mod helpers;
mod tools;
pub mod server;

use pbmc_core::PbmcControlPlane;
use pbmc_core::upstream::Fetch;
use rmcp::{
    ErrorData,
    ServerHandler,
    handler::server::tool::ToolRouter,
    tool,
    tool_handler,
    tool_router,
};
use rmcp::model::{CallToolResult, Content, ServerCapabilities, ServerInfo};

pub use tools::atlas::{DegsParams, FilterParams, PathwaysParams};
pub use tools::genes::{ExpressionParams, MarkerParams};
pub use tools::metadata::{AntibodyChainsParams, MetadataParams};

const SERVER_INSTRUCTIONS: &str = r"This MCP server offers tools to interact with the PBMCpedia webserver, an atlas of Peripheral Blood Mononuclear Cell experiments/studies.

Tools:
- `getPathways`: enriched pathways between diseased and healthy donors, per cell type.
- `getDEGs`: differentially expressed genes between diseased and healthy donors, per cell type.
- `getExpressionPerGene`: mean expression of a gene list across fine and/or broad cell types.
- `getDEperCellType`: differential expression of a gene list within one cell type.
- `getMetaData`: sample metadata filtered by sex and/or disease, as a 30-row sample or a summary.
- `getAntibodyChains`: receptor chains matched to one clonotype.

Notes:
- `getPathways` and `getDEGs` take `celltype_fine` and `celltype_broad` lists. An empty list queries
  that resolution without a cell type restriction and groups results by the reported cell type.
- With explicit cell types, `limit` applies per cell type.
- Fine results are always returned before broad results.
- Any upstream failure fails the whole call; partial results are never returned.
- `help` lists the tools. `health` returns `ok`.";

/// MCP server wrapper around the atlas control plane and tool routers.
pub struct PbmcMcp<F: Fetch> {
    tool_router: ToolRouter<Self>,
    control: PbmcControlPlane<F>,
}

impl<F: Fetch> Clone for PbmcMcp<F> {
    fn clone(&self) -> Self {
        Self {
            tool_router: self.tool_router.clone(),
            control: self.control.clone(),
        }
    }
}

impl<F: Fetch> PbmcMcp<F> {
    /// Creates a new server over a control plane.
    #[must_use]
    pub fn new(control: PbmcControlPlane<F>) -> Self {
        let tool_router = Self::tool_router_core()
            + Self::tool_router_atlas()
            + Self::tool_router_genes()
            + Self::tool_router_metadata()
            + Self::tool_router_context();
        Self {
            tool_router,
            control,
        }
    }

    pub(crate) const fn control(&self) -> &PbmcControlPlane<F> {
        &self.control
    }
}

#[tool_router(router = tool_router_core, vis = "pub")]
impl<F: Fetch> PbmcMcp<F> {
    #[tool(description = "Health check. Returns 'ok'.")]
    async fn health(&self) -> Result<CallToolResult, ErrorData> {
        Ok(CallToolResult::success(vec![Content::text("ok")]))
    }
}

#[tool_handler]
impl<F: Fetch> ServerHandler for PbmcMcp<F> {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(SERVER_INSTRUCTIONS.to_string()),
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .build(),
            ..Default::default()
        }
    }
}
