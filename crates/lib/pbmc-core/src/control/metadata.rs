use pbmc_model::schema::{
    CHAIN_FIELDS,
    METADATA_SAMPLE_FIELDS,
    METADATA_SAMPLE_ROWS,
    METADATA_SUMMARY_ROWS,
    PARAM_CLONE_ID,
    PARAM_DISEASE,
    PARAM_LIMIT,
    PARAM_SEX,
};
use pbmc_model::{MetadataDisease, MetadataSex};
use serde::Serialize;
use serde_json::Value;

use crate::aggregate::{ProjectionSpec, Record};
use crate::error::QueryResult;
use crate::query::{Endpoint, QueryString};
use crate::upstream::Fetch;

use super::PbmcControlPlane;

const UNKNOWN: &str = "unknown";

/// Sample metadata filter; `none` on either side sends no parameter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetadataFilter {
    pub sex: MetadataSex,
    pub disease: MetadataDisease,
}

impl MetadataFilter {
    #[must_use]
    pub const fn new(sex: MetadataSex, disease: MetadataDisease) -> Self {
        Self { sex, disease }
    }

    fn query(self, rows: u32) -> QueryString {
        let mut query = QueryString::new();
        if let Some(sex) = self.sex.filter_value() {
            query = query.with_verbatim(PARAM_SEX, sex);
        }
        // Long-form disease labels contain characters that need escaping.
        if let Some(disease) = self.disease.filter_value() {
            query = query.with_encoded(PARAM_DISEASE, disease);
        }
        query.with_verbatim(PARAM_LIMIT, rows.to_string())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SexSummary {
    pub male: u64,
    pub female: u64,
    pub unknown: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiseaseCount {
    pub disease: String,
    pub count: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AgeSummary {
    pub elderly: u64,
    pub young: u64,
    pub adult: u64,
    pub unknown: u64,
}

/// Counts over every sample matching a metadata filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MetadataSummary {
    pub sex_summary: SexSummary,
    pub disease_summary: Vec<DiseaseCount>,
    pub age_summary: AgeSummary,
}

/// Reduces raw metadata records to per-sex, per-disease, and per-age counts.
///
/// The age bucket is the token before the first space of `age_display`.
#[must_use]
pub fn summarize(records: &[Value]) -> MetadataSummary {
    let mut summary = MetadataSummary::default();
    for record in records {
        match text_field(record, "sex") {
            Some("male") => summary.sex_summary.male += 1,
            Some("female") => summary.sex_summary.female += 1,
            _ => summary.sex_summary.unknown += 1,
        }

        let age = text_field(record, "age_display").and_then(|display| display.split(' ').next());
        match age {
            Some("elderly") => summary.age_summary.elderly += 1,
            Some("young") => summary.age_summary.young += 1,
            Some("adult") => summary.age_summary.adult += 1,
            _ => summary.age_summary.unknown += 1,
        }

        let disease = text_field(record, "disease").unwrap_or(UNKNOWN);
        match summary
            .disease_summary
            .iter_mut()
            .find(|entry| entry.disease == disease)
        {
            Some(entry) => entry.count += 1,
            None => summary.disease_summary.push(DiseaseCount {
                disease: disease.to_string(),
                count: 1,
            }),
        }
    }
    summary
}

fn text_field<'a>(record: &'a Value, name: &str) -> Option<&'a str> {
    record.get(name).and_then(Value::as_str)
}

impl<F: Fetch> PbmcControlPlane<F> {
    /// First rows of the sample metadata table.
    ///
    /// # Errors
    /// Returns `QueryError` if the request fails.
    #[tracing::instrument(skip(self))]
    pub async fn metadata_sample(&self, filter: MetadataFilter) -> QueryResult<Vec<Record>> {
        let request = self
            .query_builder()
            .single(Endpoint::Metadata, &filter.query(METADATA_SAMPLE_ROWS));
        let records = self.fetch_records(&request).await?;
        let projection = ProjectionSpec::new(METADATA_SAMPLE_FIELDS)
            .with_source("study_id", "study")
            .with_source("age", "age_display");
        Ok(projection.project_all(&records))
    }

    /// Summary counts over the matching samples.
    ///
    /// # Errors
    /// Returns `QueryError` if the request fails.
    #[tracing::instrument(skip(self))]
    pub async fn metadata_summary(&self, filter: MetadataFilter) -> QueryResult<MetadataSummary> {
        let request = self
            .query_builder()
            .single(Endpoint::Metadata, &filter.query(METADATA_SUMMARY_ROWS));
        let records = self.fetch_records(&request).await?;
        Ok(summarize(&records))
    }

    /// Receptor chains matched to one clonotype.
    ///
    /// # Errors
    /// Returns `QueryError` if the request fails.
    #[tracing::instrument(skip(self))]
    pub async fn antibody_chains(&self, clone_id: u64) -> QueryResult<Vec<Record>> {
        let query = QueryString::new().with_verbatim(PARAM_CLONE_ID, clone_id.to_string());
        let request = self.query_builder().single(Endpoint::ChainsByClone, &query);
        let records = self.fetch_records(&request).await?;
        Ok(ProjectionSpec::new(CHAIN_FIELDS).project_all(&records))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn none_omits_the_parameter() {
        assert_eq!(MetadataFilter::default().query(30).as_str(), "limit=30");

        let filter = MetadataFilter::new(MetadataSex::Female, MetadataDisease::Parkinsons);
        assert_eq!(
            filter.query(10_000).as_str(),
            "sex=female&disease=Parkinson%27s%20Disease%20%28PD%29&limit=10000"
        );
    }

    #[test]
    fn summary_counts_sex_age_and_disease() {
        let records = [
            json!({ "sex": "female", "age_display": "elderly (65+)", "disease": "COVID-19" }),
            json!({ "sex": "male", "age_display": "young (18-35)", "disease": "Healthy Control" }),
            json!({ "sex": "female", "age_display": "adult", "disease": "COVID-19" }),
            json!({ "sex": "other", "age_display": "infant (0-2)" }),
        ];

        let summary = summarize(&records);

        assert_eq!(
            summary.sex_summary,
            SexSummary {
                male: 1,
                female: 2,
                unknown: 1,
            }
        );
        assert_eq!(
            summary.age_summary,
            AgeSummary {
                elderly: 1,
                young: 1,
                adult: 1,
                unknown: 1,
            }
        );
        let diseases: Vec<_> = summary
            .disease_summary
            .iter()
            .map(|entry| (entry.disease.as_str(), entry.count))
            .collect();
        assert_eq!(
            diseases,
            vec![("COVID-19", 2), ("Healthy Control", 1), (UNKNOWN, 1)]
        );
    }

    #[test]
    fn summary_serializes_with_named_buckets() {
        let value = serde_json::to_value(summarize(&[])).expect("serialize");
        assert_eq!(
            value,
            json!({
                "sex_summary": { "male": 0, "female": 0, "unknown": 0 },
                "disease_summary": [],
                "age_summary": { "elderly": 0, "young": 0, "adult": 0, "unknown": 0 },
            })
        );
    }
}
