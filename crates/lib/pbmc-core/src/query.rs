//! Request construction for the atlas API.
//!
//! The builder turns validated filters and entity key selections into an
//! ordered list of request descriptors. Nothing here performs I/O; callers
//! issue the descriptors in order through an injected fetcher.

use pbmc_model::schema::{
    DEFAULT_API_DOCS_URL,
    DEFAULT_API_URL,
    ENDPOINT_CHAINS_BY_CLONE,
    ENDPOINT_DEGS,
    ENDPOINT_GENE_EXPRESSION,
    ENDPOINT_MARKER_TABLE,
    ENDPOINT_METADATA,
    ENDPOINT_PATHWAYS,
    ENVELOPE_DATA,
    ENVELOPE_RESULTS,
    ENVELOPE_ROWS,
    MAX_URL_LENGTH,
    PARAM_AGE,
    PARAM_CELL_TYPE,
    PARAM_DISEASE,
    PARAM_GENES,
    PARAM_LIMIT,
    PARAM_OFFSET,
    PARAM_ORDERING,
    PARAM_RESOLUTION,
    PARAM_SEX,
};
use pbmc_model::{EntityKeySet, FilterSet, KeySelection, Pagination, Resolution};

use crate::error::{QueryError, QueryResult};

/// Which of the two upstream API roots an endpoint lives under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiBase {
    Api,
    Docs,
}

/// Upstream endpoints queried by the tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Pathways,
    Degs,
    GeneExpression,
    MarkerTable,
    Metadata,
    ChainsByClone,
}

impl Endpoint {
    #[must_use]
    pub const fn base(self) -> ApiBase {
        match self {
            Self::Pathways | Self::Degs | Self::GeneExpression => ApiBase::Api,
            Self::MarkerTable | Self::Metadata | Self::ChainsByClone => ApiBase::Docs,
        }
    }

    #[must_use]
    pub const fn segment(self) -> &'static str {
        match self {
            Self::Pathways => ENDPOINT_PATHWAYS,
            Self::Degs => ENDPOINT_DEGS,
            Self::GeneExpression => ENDPOINT_GENE_EXPRESSION,
            Self::MarkerTable => ENDPOINT_MARKER_TABLE,
            Self::Metadata => ENDPOINT_METADATA,
            Self::ChainsByClone => ENDPOINT_CHAINS_BY_CLONE,
        }
    }

    /// Key of the record array inside the response body.
    #[must_use]
    pub const fn envelope_key(self) -> &'static str {
        match self {
            Self::MarkerTable => ENVELOPE_DATA,
            Self::ChainsByClone => ENVELOPE_ROWS,
            Self::Pathways | Self::Degs | Self::GeneExpression | Self::Metadata => {
                ENVELOPE_RESULTS
            }
        }
    }
}

/// Base URLs of the atlas API, each ending in `/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamUrls {
    api_url: String,
    docs_url: String,
}

impl UpstreamUrls {
    pub fn new(api_url: impl Into<String>, docs_url: impl Into<String>) -> Self {
        Self {
            api_url: with_trailing_slash(api_url.into()),
            docs_url: with_trailing_slash(docs_url.into()),
        }
    }

    #[must_use]
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    #[must_use]
    pub fn docs_url(&self) -> &str {
        &self.docs_url
    }

    #[must_use]
    pub fn endpoint_url(&self, endpoint: Endpoint) -> String {
        let base = match endpoint.base() {
            ApiBase::Api => &self.api_url,
            ApiBase::Docs => &self.docs_url,
        };
        format!("{base}{}", endpoint.segment())
    }
}

impl Default for UpstreamUrls {
    fn default() -> Self {
        Self::new(DEFAULT_API_URL, DEFAULT_API_DOCS_URL)
    }
}

fn with_trailing_slash(mut url: String) -> String {
    if !url.ends_with('/') {
        url.push('/');
    }
    url
}

/// Query string assembled in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryString {
    rendered: String,
}

impl QueryString {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            rendered: String::new(),
        }
    }

    /// Appends a value drawn from a closed vocabulary or a number.
    #[must_use]
    pub fn with_verbatim(mut self, key: &str, value: impl AsRef<str>) -> Self {
        self.push(key, value.as_ref());
        self
    }

    /// Appends a caller-supplied value, percent-encoded.
    #[must_use]
    pub fn with_encoded(mut self, key: &str, value: &str) -> Self {
        self.push(key, &urlencoding::encode(value));
        self
    }

    #[must_use]
    pub fn with_query(mut self, other: &Self) -> Self {
        if !other.rendered.is_empty() {
            if !self.rendered.is_empty() {
                self.rendered.push('&');
            }
            self.rendered.push_str(&other.rendered);
        }
        self
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.rendered
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rendered.is_empty()
    }

    fn push(&mut self, key: &str, value: &str) {
        if !self.rendered.is_empty() {
            self.rendered.push('&');
        }
        self.rendered.push_str(key);
        self.rendered.push('=');
        self.rendered.push_str(value);
    }
}

/// Entity restriction a request was issued for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestKey {
    Entity(String),
    Unfiltered,
}

/// One upstream request, ready to issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestDescriptor {
    pub endpoint: Endpoint,
    pub resolution: Option<Resolution>,
    pub key: RequestKey,
    pub url: String,
}

/// Builds request descriptors against a fixed pair of base URLs.
#[derive(Debug, Clone, Copy)]
pub struct QueryBuilder<'a> {
    urls: &'a UpstreamUrls,
}

impl<'a> QueryBuilder<'a> {
    #[must_use]
    pub const fn new(urls: &'a UpstreamUrls) -> Self {
        Self { urls }
    }

    /// Query template shared by every request of a per-cell-type fan-out.
    #[must_use]
    pub fn filter_query(filters: &FilterSet, resolution: Resolution) -> QueryString {
        QueryString::new()
            .with_verbatim(PARAM_AGE, filters.age_group)
            .with_verbatim(PARAM_SEX, filters.sex)
            .with_verbatim(PARAM_LIMIT, filters.pagination.limit().to_string())
            .with_verbatim(PARAM_OFFSET, filters.pagination.offset().to_string())
            .with_verbatim(PARAM_DISEASE, filters.disease)
            .with_verbatim(PARAM_RESOLUTION, resolution.as_str())
            .with_verbatim(PARAM_ORDERING, filters.ordering.to_string())
    }

    /// One request per key with a `cell_type` parameter, or a single
    /// unrestricted request when the selection is unfiltered.
    #[must_use]
    pub fn per_cell_type<T: AsRef<str>>(
        &self,
        endpoint: Endpoint,
        resolution: Resolution,
        filters: &FilterSet,
        selection: &KeySelection<T>,
    ) -> Vec<RequestDescriptor> {
        let template = Self::filter_query(filters, resolution);
        match selection {
            KeySelection::Unfiltered => vec![RequestDescriptor {
                endpoint,
                resolution: Some(resolution),
                key: RequestKey::Unfiltered,
                url: self.url(endpoint, &template),
            }],
            KeySelection::Keyed(keys) => keys
                .iter()
                .map(|key| {
                    let cell_type = key.as_ref();
                    let query = QueryString::new()
                        .with_verbatim(PARAM_CELL_TYPE, cell_type)
                        .with_query(&template);
                    RequestDescriptor {
                        endpoint,
                        resolution: Some(resolution),
                        key: RequestKey::Entity(cell_type.to_string()),
                        url: self.url(endpoint, &query),
                    }
                })
                .collect(),
        }
    }

    /// One request per gene for a single cell type.
    #[must_use]
    pub fn per_gene(
        &self,
        endpoint: Endpoint,
        cell_type: &str,
        genes: &EntityKeySet<String>,
    ) -> Vec<RequestDescriptor> {
        genes
            .iter()
            .map(|gene| {
                let query = QueryString::new()
                    .with_verbatim(PARAM_CELL_TYPE, cell_type)
                    .with_encoded(PARAM_GENES, gene);
                RequestDescriptor {
                    endpoint,
                    resolution: None,
                    key: RequestKey::Entity(gene.clone()),
                    url: self.url(endpoint, &query),
                }
            })
            .collect()
    }

    /// One request per resolution with every gene repeated as a `genes`
    /// parameter.
    ///
    /// All URLs are built and admitted before any is returned, so a
    /// rejection means no request has been sent.
    ///
    /// # Errors
    /// Returns `QueryError::RequestTooLarge` when a built URL reaches
    /// the length limit.
    pub fn gene_list(
        &self,
        endpoint: Endpoint,
        pagination: Pagination,
        genes: &EntityKeySet<String>,
        resolutions: &[Resolution],
    ) -> QueryResult<Vec<RequestDescriptor>> {
        let mut shared = QueryString::new()
            .with_verbatim(PARAM_LIMIT, pagination.limit().to_string())
            .with_verbatim(PARAM_OFFSET, pagination.offset().to_string());
        for gene in genes {
            shared = shared.with_encoded(PARAM_GENES, gene);
        }

        resolutions
            .iter()
            .map(|resolution| {
                let query = shared
                    .clone()
                    .with_verbatim(PARAM_RESOLUTION, resolution.as_str());
                let url = admit(self.url(endpoint, &query))?;
                Ok(RequestDescriptor {
                    endpoint,
                    resolution: Some(*resolution),
                    key: RequestKey::Unfiltered,
                    url,
                })
            })
            .collect()
    }

    /// A single request with a caller-built query.
    #[must_use]
    pub fn single(&self, endpoint: Endpoint, query: &QueryString) -> RequestDescriptor {
        RequestDescriptor {
            endpoint,
            resolution: None,
            key: RequestKey::Unfiltered,
            url: self.url(endpoint, query),
        }
    }

    fn url(&self, endpoint: Endpoint, query: &QueryString) -> String {
        let base = self.urls.endpoint_url(endpoint);
        if query.is_empty() {
            base
        } else {
            format!("{base}?{}", query.as_str())
        }
    }
}

/// Admission control on the final URL length.
///
/// # Errors
/// Returns `QueryError::RequestTooLarge` when `url` is at or above the limit.
pub fn admit(url: String) -> QueryResult<String> {
    let length = url.len();
    if length >= MAX_URL_LENGTH {
        return Err(QueryError::RequestTooLarge {
            length,
            limit: MAX_URL_LENGTH,
        });
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pbmc_model::{CellTypeFine, Disease, PathwayOrdering};

    fn urls() -> UpstreamUrls {
        UpstreamUrls::new("http://h", "http://h/docs")
    }

    fn filters() -> FilterSet {
        FilterSet::new(Disease::Covid19).with_ordering(PathwayOrdering::ScoreDesc)
    }

    fn genes(names: &[&str]) -> EntityKeySet<String> {
        names.iter().map(|name| (*name).to_string()).collect()
    }

    #[test]
    fn keyed_mode_issues_one_request_per_distinct_key() {
        let urls = urls();
        let keys: EntityKeySet<CellTypeFine> = [
            CellTypeFine::NaiveCd4TCell,
            CellTypeFine::NaiveCd4TCell,
            CellTypeFine::Treg,
        ]
        .into_iter()
        .collect();

        let requests = QueryBuilder::new(&urls).per_cell_type(
            Endpoint::Pathways,
            Resolution::Fine,
            &filters(),
            &keys.into_selection(),
        );

        assert_eq!(requests.len(), 2);
        assert_eq!(
            requests[0].url,
            "http://h/pathways?cell_type=Naive CD4 T cell&age=all&sex=all&limit=100&offset=0\
             &disease=covid-19&resolution=fine&ordering=-score"
        );
        assert_eq!(requests[1].key, RequestKey::Entity("Treg".to_string()));
    }

    #[test]
    fn unfiltered_mode_issues_one_request_without_cell_type() {
        let urls = urls();
        let selection: KeySelection<CellTypeFine> = KeySelection::Unfiltered;
        let requests = QueryBuilder::new(&urls).per_cell_type(
            Endpoint::Degs,
            Resolution::Broad,
            &filters(),
            &selection,
        );

        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].key, RequestKey::Unfiltered);
        assert!(!requests[0].url.contains("cell_type"));
        assert!(requests[0].url.starts_with("http://h/degs?age=all"));
    }

    #[test]
    fn gene_names_are_percent_encoded() {
        let urls = urls();
        let requests = QueryBuilder::new(&urls).per_gene(
            Endpoint::MarkerTable,
            "Treg",
            &genes(&["HLA-DR B1", "IL6&x"]),
        );

        assert_eq!(
            requests[0].url,
            "http://h/docs/marker-table-ds?cell_type=Treg&genes=HLA-DR%20B1"
        );
        assert!(requests[1].url.ends_with("genes=IL6%26x"));
    }

    #[test]
    fn gene_list_repeats_the_genes_parameter() {
        let urls = urls();
        let requests = QueryBuilder::new(&urls)
            .gene_list(
                Endpoint::GeneExpression,
                Pagination::default(),
                &genes(&["IL6", "TNF", "IL6"]),
                &Resolution::ORDERED,
            )
            .expect("short url");

        assert_eq!(requests.len(), 2);
        assert_eq!(
            requests[0].url,
            "http://h/gene_expr_celltype?limit=100&offset=0&genes=IL6&genes=TNF&resolution=fine"
        );
        assert!(requests[1].url.ends_with("&resolution=broad"));
    }

    #[test]
    fn gene_list_rejects_urls_at_the_length_limit() {
        let urls = urls();
        let builder = QueryBuilder::new(&urls);
        // "http://h/gene_expr_celltype?limit=100&offset=0&genes=" + gene + "&resolution=fine"
        let overhead = 69;

        let short_gene = "A".repeat(MAX_URL_LENGTH - overhead - 1);
        let fits = genes(&[short_gene.as_str()]);
        let request = builder
            .gene_list(Endpoint::GeneExpression, Pagination::default(), &fits, &[Resolution::Fine])
            .expect("one below the limit");
        assert_eq!(request[0].url.len(), MAX_URL_LENGTH - 1);

        let long_gene = "A".repeat(MAX_URL_LENGTH - overhead);
        let too_long = genes(&[long_gene.as_str()]);
        let err = builder
            .gene_list(Endpoint::GeneExpression, Pagination::default(), &too_long, &[Resolution::Fine])
            .expect_err("at the limit");
        assert_eq!(
            err,
            QueryError::RequestTooLarge {
                length: MAX_URL_LENGTH,
                limit: MAX_URL_LENGTH,
            }
        );
    }

    #[test]
    fn envelope_keys_follow_the_endpoint() {
        assert_eq!(Endpoint::Pathways.envelope_key(), "results");
        assert_eq!(Endpoint::MarkerTable.envelope_key(), "data");
        assert_eq!(Endpoint::ChainsByClone.envelope_key(), "rows");
        assert_eq!(
            urls().endpoint_url(Endpoint::Metadata),
            "http://h/docs/v1/metadata"
        );
    }
}
