use pbmc_model::schema::{EXPRESSION_FIELDS, FIELD_CELL_TYPE, MARKER_FIELDS, MAX_GENES};
use pbmc_model::{CellType, EntityKeySet, FilterError, Pagination, Resolution};

use crate::aggregate::{AggregationResult, Discriminant, GroupedResult, ProjectionSpec, ResultName};
use crate::error::QueryResult;
use crate::query::Endpoint;
use crate::upstream::Fetch;

use super::PbmcControlPlane;

/// Mean expression lookup for a gene list, sent as one URL per resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneExpressionQuery {
    pub pagination: Pagination,
    pub genes: EntityKeySet<String>,
    pub fine: bool,
    pub broad: bool,
}

impl GeneExpressionQuery {
    /// Accepts at most `MAX_GENES` names, counted before deduplication.
    ///
    /// # Errors
    /// Returns `FilterError::TooManyGenes` when the list is over the cap.
    pub fn new(genes: Vec<String>) -> Result<Self, FilterError> {
        if genes.len() > MAX_GENES {
            return Err(FilterError::TooManyGenes {
                count: genes.len(),
                max: MAX_GENES,
            });
        }
        Ok(Self {
            pagination: Pagination::default(),
            genes: genes.into_iter().collect(),
            fine: true,
            broad: true,
        })
    }

    #[must_use]
    pub const fn with_pagination(mut self, pagination: Pagination) -> Self {
        self.pagination = pagination;
        self
    }

    #[must_use]
    pub const fn with_resolutions(mut self, fine: bool, broad: bool) -> Self {
        self.fine = fine;
        self.broad = broad;
        self
    }

    fn resolutions(&self) -> Vec<Resolution> {
        Resolution::ORDERED
            .into_iter()
            .filter(|resolution| match resolution {
                Resolution::Fine => self.fine,
                Resolution::Broad => self.broad,
            })
            .collect()
    }
}

/// Marker statistics for a list of genes within one cell type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerQuery {
    pub cell_type: CellType,
    pub genes: EntityKeySet<String>,
}

impl MarkerQuery {
    pub fn new(cell_type: CellType, genes: impl IntoIterator<Item = String>) -> Self {
        Self {
            cell_type,
            genes: genes.into_iter().collect(),
        }
    }
}

impl<F: Fetch> PbmcControlPlane<F> {
    /// Per-gene expression across cell types for each requested resolution.
    ///
    /// Every URL is admitted before the first request goes out.
    ///
    /// # Errors
    /// Returns `QueryError::RequestTooLarge` without contacting the upstream,
    /// or the first failure of a sent request.
    #[tracing::instrument(skip_all, fields(genes = query.genes.len()))]
    pub async fn gene_expression(
        &self,
        query: &GeneExpressionQuery,
    ) -> QueryResult<AggregationResult> {
        let requests = self.query_builder().gene_list(
            Endpoint::GeneExpression,
            query.pagination,
            &query.genes,
            &query.resolutions(),
        )?;
        let projection = ProjectionSpec::new(EXPRESSION_FIELDS);

        let mut result = AggregationResult::new(Discriminant::Gene, ResultName::Expression);
        for request in &requests {
            let records = self.fetch_records(request).await?;
            if let Some(resolution) = request.resolution {
                result
                    .branch_mut(resolution)
                    .fold(&request.key, &records, &projection);
            }
        }
        Ok(result)
    }

    /// Fold change and adjusted p-value per gene for one cell type, grouped
    /// by gene in request order.
    ///
    /// # Errors
    /// Returns the first `QueryError` raised; nothing gathered before it is kept.
    #[tracing::instrument(skip_all, fields(cell_type = %query.cell_type, genes = query.genes.len()))]
    pub async fn marker_changes(&self, query: &MarkerQuery) -> QueryResult<GroupedResult> {
        let requests = self.query_builder().per_gene(
            Endpoint::MarkerTable,
            query.cell_type.as_str(),
            &query.genes,
        );
        let projection = ProjectionSpec::new(MARKER_FIELDS)
            .with_source(FIELD_CELL_TYPE, "celltype")
            .with_source("p_value", "adj_p_val");

        let mut result = GroupedResult::new(Discriminant::Gene, ResultName::Changes);
        for request in &requests {
            let records = self.fetch_records(request).await?;
            result.fold(&request.key, &records, &projection);
        }
        Ok(result)
    }
}
