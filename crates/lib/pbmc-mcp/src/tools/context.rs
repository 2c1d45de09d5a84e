use pbmc_core::upstream::Fetch;
use rmcp::{
    ErrorData,
    model::{CallToolResult, Content},
    schemars,
    tool,
    tool_router,
};
use serde::{Deserialize, Serialize};

use crate::PbmcMcp;

/// Payload listing the atlas MCP commands.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct HelpCommands {
    pub commands: Vec<String>,
}

impl Default for HelpCommands {
    fn default() -> Self {
        Self {
            commands: vec![
                "help - List the MCP commands offered by this server.".to_string(),
                "health - Health check. Returns 'ok'.".to_string(),
                "getPathways - Enriched pathways per fine and broad cell type for a disease."
                    .to_string(),
                "getDEGs - Differentially expressed genes per fine and broad cell type for a disease."
                    .to_string(),
                "getExpressionPerGene - Mean expression of a gene list per cell type.".to_string(),
                "getDEperCellType - Differential expression of a gene list within one cell type."
                    .to_string(),
                "getMetaData - Sample metadata by sex and disease, as a sample or a summary."
                    .to_string(),
                "getAntibodyChains - Receptor chains matched to a clonotype.".to_string(),
            ],
        }
    }
}

#[tool_router(router = tool_router_context, vis = "pub")]
impl<F: Fetch> PbmcMcp<F> {
    #[tool(description = "List the MCP commands offered by this server.")]
    async fn help(&self) -> Result<CallToolResult, ErrorData> {
        Ok(CallToolResult::success(vec![Content::json(HelpCommands::default())?]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn help_lists_every_atlas_tool() {
        let commands = HelpCommands::default().commands;
        for tool in [
            "getPathways",
            "getDEGs",
            "getExpressionPerGene",
            "getDEperCellType",
            "getMetaData",
            "getAntibodyChains",
        ] {
            assert!(
                commands.iter().any(|command| command.starts_with(tool)),
                "missing {tool}"
            );
        }
    }
}
