use pbmc_core::control::{GeneExpressionQuery, MarkerQuery};
use pbmc_core::upstream::Fetch;
use pbmc_model::{CellType, FilterError, Pagination};
use rmcp::{
    ErrorData,
    handler::server::wrapper::Parameters,
    model::CallToolResult,
    schemars,
    tool,
    tool_router,
};
use serde::{Deserialize, Serialize};

use crate::PbmcMcp;
use crate::helpers::{self, ResultEnvelope};
use crate::tools::atlas::{default_limit, default_offset};

/// Parameters for `getExpressionPerGene`.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct ExpressionParams {
    /// Fetch at most this many results.
    #[serde(default = "default_limit")]
    pub limit: i64,
    /// How many elements to skip at the beginning of the result list.
    #[serde(default = "default_offset")]
    pub offset: i64,
    /// Names of the genes for which to query gene expression (at most 1024).
    pub genes: Vec<String>,
    /// Whether to return gene expression split by fine-grained cell type.
    pub fine: bool,
    /// Whether to return gene expression split by broad cell type.
    pub broad: bool,
}

impl ExpressionParams {
    fn into_query(self) -> Result<GeneExpressionQuery, FilterError> {
        let pagination = Pagination::new(self.limit, self.offset)?;
        Ok(GeneExpressionQuery::new(self.genes)?
            .with_pagination(pagination)
            .with_resolutions(self.fine, self.broad))
    }
}

/// Parameters for `getDEperCellType`.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct MarkerParams {
    /// Names of the genes for which to query differential expression.
    pub genes: Vec<String>,
    /// Cell type (fine or broad) to fetch differential expression for.
    pub celltype: CellType,
}

#[tool_router(router = tool_router_genes, vis = "pub")]
impl<F: Fetch> PbmcMcp<F> {
    #[tool(
        name = "getExpressionPerGene",
        description = "Queries the PBMCpedia webserver for the mean expression of the given genes in each cell type, split into fine and/or broad cell types."
    )]
    async fn get_expression_per_gene(
        &self,
        Parameters(params): Parameters<ExpressionParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let query = params
            .into_query()
            .map_err(|err| helpers::invalid_params(&err))?;
        let outcome = self.control().gene_expression(&query).await;
        helpers::envelope(outcome.map(ResultEnvelope::new))
    }

    #[tool(
        name = "getDEperCellType",
        description = "Queries the PBMCpedia webserver for the differential expression of the given genes with respect to the provided cell type. Results are grouped by gene."
    )]
    async fn get_de_per_cell_type(
        &self,
        Parameters(params): Parameters<MarkerParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let query = MarkerQuery::new(params.celltype, params.genes);
        let outcome = self.control().marker_changes(&query).await;
        helpers::envelope(outcome.map(ResultEnvelope::new))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pbmc_model::{CellTypeBroad, CellTypeFine};
    use serde_json::json;

    #[test]
    fn expression_params_validate_window_and_gene_count() {
        let params: ExpressionParams = serde_json::from_value(json!({
            "genes": ["IL6", "TNF", "IL6"],
            "fine": true,
            "broad": false,
        }))
        .expect("params");
        let query = params.into_query().expect("valid");
        assert_eq!(query.genes.len(), 2);
        assert!(query.fine && !query.broad);

        let params: ExpressionParams = serde_json::from_value(json!({
            "genes": vec!["IL6"; 1025],
            "fine": true,
            "broad": true,
        }))
        .expect("params");
        assert_eq!(
            params.into_query(),
            Err(FilterError::TooManyGenes {
                count: 1025,
                max: 1024,
            })
        );
    }

    #[test]
    fn marker_cell_type_accepts_either_vocabulary() {
        let fine: MarkerParams =
            serde_json::from_value(json!({ "genes": ["IL6"], "celltype": "Treg" })).expect("fine");
        assert_eq!(fine.celltype, CellType::Fine(CellTypeFine::Treg));

        let broad: MarkerParams =
            serde_json::from_value(json!({ "genes": [], "celltype": "Monocyte" })).expect("broad");
        assert_eq!(broad.celltype, CellType::Broad(CellTypeBroad::Monocyte));
    }
}
