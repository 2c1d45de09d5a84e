use pbmc_core::control::CellTypeQuery;
use pbmc_core::upstream::Fetch;
use pbmc_model::schema::{DEFAULT_LIMIT, DEFAULT_OFFSET};
use pbmc_model::{
    AgeGroup,
    CellTypeBroad,
    CellTypeFine,
    DegOrdering,
    Disease,
    FilterError,
    FilterSet,
    Pagination,
    PathwayOrdering,
    Sex,
    SortKey,
};
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
use crate::helpers;

pub(crate) fn default_limit() -> i64 {
    i64::from(DEFAULT_LIMIT)
}

pub(crate) fn default_offset() -> i64 {
    i64::from(DEFAULT_OFFSET)
}

/// Filters shared by the per-cell-type tools.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct FilterParams {
    /// Filter results by age group.
    #[serde(rename = "ageGroup", default)]
    pub age_group: AgeGroup,
    /// Filter results by sex.
    #[serde(default)]
    pub sex: Sex,
    /// Condition for which to query. The following conditions are not
    /// self-explanatory: `ad` is Alzheimer's disease, `pd` is Parkinson's,
    /// `hnscc` is Head and Neck Squamous Carcinoma, `rrms` is relapsing
    /// remitting Multiple Sclerosis, `mis-c` is multisystem inflammatory
    /// syndrome in children and `tb` is Tuberculosis.
    pub disease: Disease,
    /// Fetch at most this many results (after applying other query filters
    /// except for `offset`). If cell types are explicitly specified, fetch at
    /// most this many results per cell type.
    #[serde(default = "default_limit")]
    pub limit: i64,
    /// How many elements to skip at the beginning of the result list (after
    /// applying other query filters and before applying the limit).
    #[serde(default = "default_offset")]
    pub offset: i64,
    /// Fine-grained cell types to query. The empty default does not restrict
    /// by cell type.
    #[serde(default)]
    pub celltype_fine: Vec<CellTypeFine>,
    /// Broad cell types to query. The empty default does not restrict by cell
    /// type.
    #[serde(default)]
    pub celltype_broad: Vec<CellTypeBroad>,
}

impl FilterParams {
    /// Validates pagination and builds the fan-out input.
    ///
    /// # Errors
    /// Returns `FilterError` when `limit` or `offset` is out of range.
    pub fn into_query(self, ordering: impl Into<SortKey>) -> Result<CellTypeQuery, FilterError> {
        let pagination = Pagination::new(self.limit, self.offset)?;
        let filters = FilterSet::new(self.disease)
            .with_age_group(self.age_group)
            .with_sex(self.sex)
            .with_pagination(pagination)
            .with_ordering(ordering);
        Ok(CellTypeQuery::new(filters)
            .with_fine(self.celltype_fine)
            .with_broad(self.celltype_broad))
    }
}

/// Parameters for `getPathways`.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct PathwaysParams {
    #[serde(flatten)]
    pub filters: FilterParams,
    /// By what metric to order the results. `-` indicates descending order.
    #[serde(default)]
    pub ordering: PathwayOrdering,
}

/// Parameters for `getDEGs`.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct DegsParams {
    #[serde(flatten)]
    pub filters: FilterParams,
    /// By what metric to order the results. `-` indicates descending order.
    #[serde(default)]
    pub ordering: DegOrdering,
}

#[tool_router(router = tool_router_atlas, vis = "pub")]
impl<F: Fetch> PbmcMcp<F> {
    #[tool(
        name = "getPathways",
        description = "Queries the PBMCpedia webserver for pathways using the provided parameters. Returns the pathways per cell type, split into fine and broad cell types. Pathway activity was measured between 'afflicted with disease/condition' and 'not afflicted with disease/condition'."
    )]
    async fn get_pathways(
        &self,
        Parameters(params): Parameters<PathwaysParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let query = params
            .filters
            .into_query(params.ordering)
            .map_err(|err| helpers::invalid_params(&err))?;
        helpers::envelope(self.control().pathways(query).await)
    }

    #[tool(
        name = "getDEGs",
        description = "Queries the PBMCpedia webserver (atlas for peripheral blood mononuclear cell experiments) for DEGs using the provided parameters. Returns the DEGs per cell type, split into fine and broad cell types. DEGs were measured between 'afflicted with disease/condition' and 'not afflicted with disease/condition'."
    )]
    async fn get_degs(
        &self,
        Parameters(params): Parameters<DegsParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let query = params
            .filters
            .into_query(params.ordering)
            .map_err(|err| helpers::invalid_params(&err))?;
        helpers::envelope(self.control().degs(query).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pbmc_model::KeySelection;
    use serde_json::json;

    #[test]
    fn omitted_fields_take_documented_defaults() {
        let params: PathwaysParams =
            serde_json::from_value(json!({ "disease": "covid-19" })).expect("params");

        assert_eq!(params.filters.age_group, AgeGroup::All);
        assert_eq!(params.filters.sex, Sex::All);
        assert_eq!(params.filters.limit, 100);
        assert_eq!(params.filters.offset, 0);
        assert_eq!(params.ordering, PathwayOrdering::PValue);

        let query = params.filters.into_query(params.ordering).expect("valid");
        assert_eq!(query.fine.clone().into_selection(), KeySelection::Unfiltered);
        assert!(query.broad.is_empty());
    }

    #[test]
    fn camel_case_age_group_and_cell_type_labels_are_accepted() {
        let params: DegsParams = serde_json::from_value(json!({
            "ageGroup": "elderly",
            "disease": "tb",
            "celltype_fine": ["Treg", "Treg", "MAIT"],
            "celltype_broad": ["NK cell"],
            "ordering": "-log2_fold_change",
        }))
        .expect("params");

        let query = params.filters.into_query(params.ordering).expect("valid");
        assert_eq!(query.filters.age_group, AgeGroup::Elderly);
        assert_eq!(query.filters.ordering.to_string(), "-log2_fold_change");
        assert_eq!(query.fine.len(), 2);
        assert_eq!(query.broad.len(), 1);
    }

    #[test]
    fn invalid_pagination_is_rejected_before_querying() {
        let params: PathwaysParams =
            serde_json::from_value(json!({ "disease": "pd", "limit": 0 })).expect("params");

        assert_eq!(
            params.filters.into_query(params.ordering).expect_err("limit 0"),
            FilterError::InvalidLimit(0)
        );
    }

    #[test]
    fn unknown_cell_types_fail_deserialization() {
        let parsed = serde_json::from_value::<PathwaysParams>(json!({
            "disease": "pd",
            "celltype_fine": ["T cell"],
        }));
        assert!(parsed.is_err());
    }
}
