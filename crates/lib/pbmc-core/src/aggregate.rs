//! Folding of upstream payloads into grouped, resolution-partitioned results.

use std::collections::HashMap;

use pbmc_model::Resolution;
use pbmc_model::schema::{FIELD_CELL_TYPE, FIELD_GENE, FIELD_PATHWAY_DESCRIPTION, SOURCE_PATHWAY_DESCRIPTION};
use serde::Serialize;
use serde::ser::{SerializeMap, SerializeSeq, Serializer};
use serde_json::{Map, Value};

use crate::error::{QueryError, QueryResult};
use crate::query::RequestKey;

/// A projected output record.
pub type Record = Map<String, Value>;

/// Group key used for records that carry no discriminant value.
pub const UNKNOWN_GROUP: &str = "unknown";

#[derive(Debug, Clone, PartialEq, Eq)]
struct ProjectedField {
    name: &'static str,
    source: &'static str,
}

/// Ordered field selection applied to every upstream record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectionSpec {
    fields: Vec<ProjectedField>,
}

impl ProjectionSpec {
    /// Selects `names`, reading `pathway_description` from the upstream
    /// `pathway_decription` column.
    #[must_use]
    pub fn new(names: &[&'static str]) -> Self {
        let fields = names
            .iter()
            .map(|&name| ProjectedField {
                name,
                source: default_source(name),
            })
            .collect();
        Self { fields }
    }

    /// Reads output field `name` from upstream field `source`.
    #[must_use]
    pub fn with_source(mut self, name: &'static str, source: &'static str) -> Self {
        if let Some(field) = self.fields.iter_mut().find(|field| field.name == name) {
            field.source = source;
        } else {
            self.fields.push(ProjectedField { name, source });
        }
        self
    }

    pub fn field_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|field| field.name)
    }

    /// Projects one record. Every declared field is present in the output;
    /// fields missing upstream are `null`.
    #[must_use]
    pub fn project(&self, record: &Value) -> Record {
        self.fields
            .iter()
            .map(|field| {
                let value = record.get(field.source).cloned().unwrap_or(Value::Null);
                (field.name.to_string(), value)
            })
            .collect()
    }

    #[must_use]
    pub fn project_all(&self, records: &[Value]) -> Vec<Record> {
        records.iter().map(|record| self.project(record)).collect()
    }
}

fn default_source(name: &'static str) -> &'static str {
    if name == FIELD_PATHWAY_DESCRIPTION {
        SOURCE_PATHWAY_DESCRIPTION
    } else {
        name
    }
}

/// Record attribute used to group flat upstream records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Discriminant {
    CellType,
    Gene,
}

impl Discriminant {
    #[must_use]
    pub const fn field(self) -> &'static str {
        match self {
            Self::CellType => FIELD_CELL_TYPE,
            Self::Gene => FIELD_GENE,
        }
    }

    /// Reads the discriminant from a raw upstream record.
    #[must_use]
    pub fn value_of(self, record: &Value) -> String {
        match record.get(self.field()) {
            Some(Value::String(value)) => value.clone(),
            Some(Value::Null) | None => UNKNOWN_GROUP.to_string(),
            Some(other) => other.to_string(),
        }
    }
}

/// Name of the per-group record list in the serialized output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultName {
    Pathways,
    Degs,
    Expression,
    Changes,
}

impl ResultName {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pathways => "pathways",
            Self::Degs => "degs",
            Self::Expression => "expression",
            Self::Changes => "changes",
        }
    }
}

/// Records collected under one discriminant value.
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    pub key: String,
    pub records: Vec<Record>,
}

/// Groups in first-seen order, keyed by discriminant value.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupedResult {
    discriminant: Discriminant,
    result_name: ResultName,
    groups: Vec<Group>,
    index: HashMap<String, usize>,
}

impl GroupedResult {
    #[must_use]
    pub fn new(discriminant: Discriminant, result_name: ResultName) -> Self {
        Self {
            discriminant,
            result_name,
            groups: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Folds one response into the groups.
    ///
    /// Keyed requests place every record under the requested key, creating
    /// the group even when the response is empty. Unfiltered requests group
    /// each record by its own discriminant value.
    pub fn fold(&mut self, key: &RequestKey, records: &[Value], projection: &ProjectionSpec) {
        match key {
            RequestKey::Entity(entity) => {
                let projected = projection.project_all(records);
                self.group_mut(entity).extend(projected);
            }
            RequestKey::Unfiltered => {
                for record in records {
                    let group_key = self.discriminant.value_of(record);
                    let projected = projection.project(record);
                    self.group_mut(&group_key).push(projected);
                }
            }
        }
    }

    #[must_use]
    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&[Record]> {
        self.index
            .get(key)
            .map(|position| self.groups[*position].records.as_slice())
    }

    #[must_use]
    pub fn keys(&self) -> Vec<&str> {
        self.groups.iter().map(|group| group.key.as_str()).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    fn group_mut(&mut self, key: &str) -> &mut Vec<Record> {
        let position = match self.index.get(key) {
            Some(position) => *position,
            None => {
                self.groups.push(Group {
                    key: key.to_string(),
                    records: Vec::new(),
                });
                let position = self.groups.len() - 1;
                self.index.insert(key.to_string(), position);
                position
            }
        };
        &mut self.groups[position].records
    }
}

impl Serialize for GroupedResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.groups.len()))?;
        for group in &self.groups {
            seq.serialize_element(&GroupEntry {
                discriminant: self.discriminant.field(),
                result_name: self.result_name.as_str(),
                group,
            })?;
        }
        seq.end()
    }
}

struct GroupEntry<'a> {
    discriminant: &'static str,
    result_name: &'static str,
    group: &'a Group,
}

impl Serialize for GroupEntry<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry(self.discriminant, &self.group.key)?;
        map.serialize_entry(self.result_name, &self.group.records)?;
        map.end()
    }
}

/// Two-resolution output of a fan-out tool.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregationResult {
    pub fine: GroupedResult,
    pub broad: GroupedResult,
}

impl AggregationResult {
    #[must_use]
    pub fn new(discriminant: Discriminant, result_name: ResultName) -> Self {
        Self {
            fine: GroupedResult::new(discriminant, result_name),
            broad: GroupedResult::new(discriminant, result_name),
        }
    }

    #[must_use]
    pub const fn branch(&self, resolution: Resolution) -> &GroupedResult {
        match resolution {
            Resolution::Fine => &self.fine,
            Resolution::Broad => &self.broad,
        }
    }

    pub const fn branch_mut(&mut self, resolution: Resolution) -> &mut GroupedResult {
        match resolution {
            Resolution::Fine => &mut self.fine,
            Resolution::Broad => &mut self.broad,
        }
    }
}

/// Takes the record array out of a response body.
///
/// # Errors
/// Returns `QueryError::Transport` when the body is not an object holding an
/// array under `envelope_key`.
pub fn extract_records(body: Value, envelope_key: &str) -> QueryResult<Vec<Value>> {
    let Value::Object(mut body) = body else {
        return Err(QueryError::Transport(
            "response format error: body is not a JSON object".to_string(),
        ));
    };
    match body.remove(envelope_key) {
        Some(Value::Array(records)) => Ok(records),
        _ => Err(QueryError::Transport(format!(
            "response format error: missing `{envelope_key}` array"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pbmc_model::schema::{DEG_FIELDS, PATHWAY_FIELDS};
    use serde_json::json;

    fn pathway(cell_type: &str, id: &str) -> Value {
        json!({
            "pathway_decription": format!("description of {id}"),
            "pathway_description": "ignored",
            "pathway_id": id,
            "score": 1.5,
            "p_value": 0.01,
            "cell_type": cell_type,
            "extra": true,
        })
    }

    #[test]
    fn projection_reads_the_misspelled_description_column() {
        let projection = ProjectionSpec::new(PATHWAY_FIELDS);
        let record = projection.project(&pathway("Treg", "GO:1"));

        assert_eq!(record["pathway_description"], json!("description of GO:1"));
        assert_eq!(record.len(), PATHWAY_FIELDS.len());
        assert!(projection.field_names().all(|name| record.contains_key(name)));
        assert!(!record.contains_key("extra"));
    }

    #[test]
    fn projection_is_total_over_declared_fields() {
        let projection = ProjectionSpec::new(DEG_FIELDS);
        let record = projection.project(&json!({ "gene": "IL6" }));

        assert_eq!(record.len(), DEG_FIELDS.len());
        assert_eq!(record["gene"], json!("IL6"));
        assert_eq!(record["p_value"], Value::Null);
    }

    #[test]
    fn renamed_sources_replace_the_default() {
        let projection = ProjectionSpec::new(&["cell_type", "p_value"])
            .with_source("cell_type", "celltype")
            .with_source("p_value", "adj_p_val");
        let record = projection.project(&json!({ "celltype": "Treg", "adj_p_val": 0.2, "p_value": 9 }));

        assert_eq!(record["cell_type"], json!("Treg"));
        assert_eq!(record["p_value"], json!(0.2));
    }

    #[test]
    fn keyed_fold_ignores_server_cell_type() {
        let projection = ProjectionSpec::new(PATHWAY_FIELDS);
        let mut grouped = GroupedResult::new(Discriminant::CellType, ResultName::Pathways);
        grouped.fold(
            &RequestKey::Entity("Treg".to_string()),
            &[pathway("Treg", "GO:1"), pathway("MAIT", "GO:2")],
            &projection,
        );
        grouped.fold(&RequestKey::Entity("gdT".to_string()), &[], &projection);

        assert_eq!(grouped.keys(), vec!["Treg", "gdT"]);
        assert_eq!(grouped.get("Treg").map(<[Record]>::len), Some(2));
        assert_eq!(grouped.get("gdT").map(<[Record]>::len), Some(0));
    }

    #[test]
    fn unfiltered_fold_groups_by_first_seen_discriminant() {
        let projection = ProjectionSpec::new(PATHWAY_FIELDS);
        let mut grouped = GroupedResult::new(Discriminant::CellType, ResultName::Pathways);
        grouped.fold(
            &RequestKey::Unfiltered,
            &[
                pathway("MAIT", "GO:1"),
                pathway("Treg", "GO:2"),
                pathway("MAIT", "GO:3"),
                json!({ "pathway_id": "GO:4" }),
            ],
            &projection,
        );

        assert_eq!(grouped.keys(), vec!["MAIT", "Treg", UNKNOWN_GROUP]);
        let mait = grouped.get("MAIT").expect("MAIT group");
        assert_eq!(mait[1]["pathway_id"], json!("GO:3"));
    }

    #[test]
    fn gene_groups_merge_across_requests() {
        let projection = ProjectionSpec::new(&["cell_type"]);
        let mut grouped = GroupedResult::new(Discriminant::Gene, ResultName::Changes);
        grouped.fold(&RequestKey::Entity("IL6".to_string()), &[json!({ "cell_type": "Treg" })], &projection);
        grouped.fold(&RequestKey::Entity("TNF".to_string()), &[json!({ "cell_type": "MAIT" })], &projection);
        grouped.fold(&RequestKey::Entity("IL6".to_string()), &[json!({ "cell_type": "gdT" })], &projection);

        assert_eq!(grouped.keys(), vec!["IL6", "TNF"]);
        assert_eq!(grouped.get("IL6").map(<[Record]>::len), Some(2));
    }

    #[test]
    fn groups_serialize_under_the_result_name() {
        let projection = ProjectionSpec::new(&["gene"]);
        let mut result = AggregationResult::new(Discriminant::CellType, ResultName::Degs);
        result.branch_mut(Resolution::Broad).fold(
            &RequestKey::Entity("T cell".to_string()),
            &[json!({ "gene": "CD3E" })],
            &projection,
        );

        let value = serde_json::to_value(&result).expect("serialize");
        assert_eq!(
            value,
            json!({
                "fine": [],
                "broad": [{ "cell_type": "T cell", "degs": [{ "gene": "CD3E" }] }],
            })
        );
    }

    #[test]
    fn extract_records_requires_the_envelope_array() {
        let records = extract_records(json!({ "data": [1, 2] }), "data").expect("array");
        assert_eq!(records.len(), 2);

        assert!(matches!(
            extract_records(json!({ "results": {} }), "results"),
            Err(QueryError::Transport(_))
        ));
        assert!(matches!(
            extract_records(json!([1, 2]), "results"),
            Err(QueryError::Transport(_))
        ));
    }
}
