use std::sync::Arc;

use serde_json::Value;
use tracing::warn;

use crate::aggregate::extract_records;
use crate::error::QueryResult;
use crate::query::{QueryBuilder, RequestDescriptor, UpstreamUrls};
use crate::upstream::Fetch;

pub mod atlas;
pub mod genes;
pub mod metadata;

pub use atlas::CellTypeQuery;
pub use genes::{GeneExpressionQuery, MarkerQuery};
pub use metadata::{AgeSummary, DiseaseCount, MetadataFilter, MetadataSummary, SexSummary, summarize};

/// Entry point for every tool operation: builds requests, issues them in
/// order through the injected fetcher, and folds the responses.
pub struct PbmcControlPlane<F: Fetch> {
    fetcher: Arc<F>,
    urls: UpstreamUrls,
}

impl<F: Fetch> Clone for PbmcControlPlane<F> {
    fn clone(&self) -> Self {
        Self {
            fetcher: Arc::clone(&self.fetcher),
            urls: self.urls.clone(),
        }
    }
}

impl<F: Fetch> PbmcControlPlane<F> {
    #[must_use]
    pub fn new(fetcher: F, urls: UpstreamUrls) -> Self {
        Self::from_arc(Arc::new(fetcher), urls)
    }

    #[must_use]
    pub const fn from_arc(fetcher: Arc<F>, urls: UpstreamUrls) -> Self {
        Self { fetcher, urls }
    }

    #[must_use]
    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    #[must_use]
    pub const fn urls(&self) -> &UpstreamUrls {
        &self.urls
    }

    #[must_use]
    pub const fn query_builder(&self) -> QueryBuilder<'_> {
        QueryBuilder::new(&self.urls)
    }

    /// Issues one request and returns the records under the endpoint's
    /// envelope key.
    async fn fetch_records(&self, request: &RequestDescriptor) -> QueryResult<Vec<Value>> {
        let body = self.fetcher.get_json(&request.url).await?;
        extract_records(body, request.endpoint.envelope_key()).inspect_err(|err| {
            warn!(url = %request.url, error = %err, "unexpected response envelope");
        })
    }
}
