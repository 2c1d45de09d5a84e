use pbmc_model::schema::{DEG_FIELDS, PATHWAY_FIELDS};
use pbmc_model::{CellTypeBroad, CellTypeFine, EntityKeySet, FilterSet, Resolution};

use crate::aggregate::{AggregationResult, Discriminant, ProjectionSpec, ResultName};
use crate::error::QueryResult;
use crate::query::Endpoint;
use crate::upstream::Fetch;

use super::PbmcControlPlane;

/// Input for the per-cell-type tools: one filter set and a key set per
/// resolution. Empty key sets query the resolution without restriction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellTypeQuery {
    pub filters: FilterSet,
    pub fine: EntityKeySet<CellTypeFine>,
    pub broad: EntityKeySet<CellTypeBroad>,
}

impl CellTypeQuery {
    #[must_use]
    pub const fn new(filters: FilterSet) -> Self {
        Self {
            filters,
            fine: EntityKeySet::new(),
            broad: EntityKeySet::new(),
        }
    }

    #[must_use]
    pub fn with_fine(mut self, keys: impl IntoIterator<Item = CellTypeFine>) -> Self {
        self.fine = keys.into_iter().collect();
        self
    }

    #[must_use]
    pub fn with_broad(mut self, keys: impl IntoIterator<Item = CellTypeBroad>) -> Self {
        self.broad = keys.into_iter().collect();
        self
    }
}

impl<F: Fetch> PbmcControlPlane<F> {
    /// Enriched pathways per cell type, fine then broad.
    ///
    /// # Errors
    /// Returns the first `QueryError` raised; nothing gathered before it is kept.
    #[tracing::instrument(skip_all, fields(fine = query.fine.len(), broad = query.broad.len()))]
    pub async fn pathways(&self, query: CellTypeQuery) -> QueryResult<AggregationResult> {
        let projection = ProjectionSpec::new(PATHWAY_FIELDS);
        self.fan_out_by_cell_type(Endpoint::Pathways, ResultName::Pathways, &projection, query)
            .await
    }

    /// Differentially expressed genes per cell type, fine then broad.
    ///
    /// # Errors
    /// Returns the first `QueryError` raised; nothing gathered before it is kept.
    #[tracing::instrument(skip_all, fields(fine = query.fine.len(), broad = query.broad.len()))]
    pub async fn degs(&self, query: CellTypeQuery) -> QueryResult<AggregationResult> {
        let projection = ProjectionSpec::new(DEG_FIELDS);
        self.fan_out_by_cell_type(Endpoint::Degs, ResultName::Degs, &projection, query)
            .await
    }

    async fn fan_out_by_cell_type(
        &self,
        endpoint: Endpoint,
        result_name: ResultName,
        projection: &ProjectionSpec,
        query: CellTypeQuery,
    ) -> QueryResult<AggregationResult> {
        let CellTypeQuery {
            filters,
            fine,
            broad,
        } = query;
        let builder = self.query_builder();
        let plan = [
            (
                Resolution::Fine,
                builder.per_cell_type(endpoint, Resolution::Fine, &filters, &fine.into_selection()),
            ),
            (
                Resolution::Broad,
                builder.per_cell_type(endpoint, Resolution::Broad, &filters, &broad.into_selection()),
            ),
        ];

        let mut result = AggregationResult::new(Discriminant::CellType, result_name);
        for (resolution, requests) in &plan {
            for request in requests {
                let records = self.fetch_records(request).await?;
                result
                    .branch_mut(*resolution)
                    .fold(&request.key, &records, projection);
            }
        }
        Ok(result)
    }
}
