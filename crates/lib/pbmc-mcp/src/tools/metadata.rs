use pbmc_core::aggregate::Record;
use pbmc_core::control::{MetadataFilter, MetadataSummary};
use pbmc_core::upstream::Fetch;
use pbmc_model::{MetadataDisease, MetadataSex};
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

const fn default_summarize() -> bool {
    true
}

/// Parameters for `getMetaData`.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct MetadataParams {
    /// Passing `none` (the default) disables this filter.
    #[serde(default)]
    pub sex: MetadataSex,
    /// Passing `none` (the default) disables this filter.
    #[serde(default)]
    pub disease: MetadataDisease,
    /// Whether to return a summary of the metadata instead of the first 30
    /// results.
    #[serde(default = "default_summarize")]
    pub summarize: bool,
}

/// Parameters for `getAntibodyChains`.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct AntibodyChainsParams {
    /// ID of the clone.
    pub clone: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
enum MetadataResult {
    Sample(Vec<Record>),
    Summary(MetadataSummary),
}

#[tool_router(router = tool_router_metadata, vis = "pub")]
impl<F: Fetch> PbmcMcp<F> {
    #[tool(
        name = "getMetaData",
        description = "Queries the PBMCpedia webserver (atlas for peripheral blood mononuclear cell experiments) for the samples fitting the provided filters and either returns a summary or full information on the first 30 results."
    )]
    async fn get_metadata(
        &self,
        Parameters(params): Parameters<MetadataParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let filter = MetadataFilter::new(params.sex, params.disease);
        let outcome = if params.summarize {
            self.control()
                .metadata_summary(filter)
                .await
                .map(MetadataResult::Summary)
        } else {
            self.control()
                .metadata_sample(filter)
                .await
                .map(MetadataResult::Sample)
        };
        helpers::envelope(outcome.map(ResultEnvelope::new))
    }

    #[tool(
        name = "getAntibodyChains",
        description = "Queries the PBMCpedia webserver (atlas for peripheral blood mononuclear cell experiments) for the antibody chains matched to the given clonotype."
    )]
    async fn get_antibody_chains(
        &self,
        Parameters(params): Parameters<AntibodyChainsParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let outcome = self.control().antibody_chains(params.clone).await;
        helpers::envelope(outcome.map(ResultEnvelope::new))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn metadata_defaults_disable_filters_and_summarize() {
        let params: MetadataParams = serde_json::from_value(json!({})).expect("params");
        assert_eq!(params.sex, MetadataSex::None);
        assert_eq!(params.disease, MetadataDisease::None);
        assert!(params.summarize);
    }

    #[test]
    fn negative_clone_ids_are_rejected() {
        assert!(serde_json::from_value::<AntibodyChainsParams>(json!({ "clone": -1 })).is_err());
        let params: AntibodyChainsParams =
            serde_json::from_value(json!({ "clone": 7 })).expect("params");
        assert_eq!(params.clone, 7);
    }

    #[test]
    fn metadata_result_serializes_without_a_tag() {
        let value = serde_json::to_value(ResultEnvelope::new(MetadataResult::Sample(Vec::new())))
            .expect("serialize");
        assert_eq!(value, json!({ "result": [] }));
    }
}
