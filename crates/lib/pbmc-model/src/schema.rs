pub const DEFAULT_API_URL: &str = "https://web.ccb.uni-saarland.de/pbmcpedia/api/v1/";
pub const DEFAULT_API_DOCS_URL: &str = "https://web.ccb.uni-saarland.de/pbmcpedia/api-docs/";

pub const ENDPOINT_PATHWAYS: &str = "pathways";
pub const ENDPOINT_DEGS: &str = "degs";
pub const ENDPOINT_GENE_EXPRESSION: &str = "gene_expr_celltype";
pub const ENDPOINT_MARKER_TABLE: &str = "marker-table-ds";
pub const ENDPOINT_METADATA: &str = "v1/metadata";
pub const ENDPOINT_CHAINS_BY_CLONE: &str = "chains-by-clone";

pub const ENVELOPE_RESULTS: &str = "results";
pub const ENVELOPE_DATA: &str = "data";
pub const ENVELOPE_ROWS: &str = "rows";

pub const PARAM_CELL_TYPE: &str = "cell_type";
pub const PARAM_AGE: &str = "age";
pub const PARAM_SEX: &str = "sex";
pub const PARAM_DISEASE: &str = "disease";
pub const PARAM_LIMIT: &str = "limit";
pub const PARAM_OFFSET: &str = "offset";
pub const PARAM_RESOLUTION: &str = "resolution";
pub const PARAM_ORDERING: &str = "ordering";
pub const PARAM_GENES: &str = "genes";
pub const PARAM_CLONE_ID: &str = "clone_id";

pub const FIELD_CELL_TYPE: &str = "cell_type";
pub const FIELD_GENE: &str = "gene";
pub const FIELD_PATHWAY_DESCRIPTION: &str = "pathway_description";
/// Upstream spells the pathway description column without the second `s`.
pub const SOURCE_PATHWAY_DESCRIPTION: &str = "pathway_decription";

pub const PATHWAY_FIELDS: &[&str] = &[
    FIELD_PATHWAY_DESCRIPTION,
    "pathway_id",
    "score",
    "p_value",
    FIELD_CELL_TYPE,
];
pub const DEG_FIELDS: &[&str] = &[FIELD_GENE, "log2_fold_change", "p_value", FIELD_CELL_TYPE];
pub const EXPRESSION_FIELDS: &[&str] = &["celltype", "mean_expression"];
pub const MARKER_FIELDS: &[&str] = &[FIELD_CELL_TYPE, "log2_fold_change", "p_value"];
pub const METADATA_SAMPLE_FIELDS: &[&str] = &["sample_id", "study_id", "age", "sex", "disease"];
pub const CHAIN_FIELDS: &[&str] = &[
    "cell_id",
    "locus",
    "v_call",
    "d_call",
    "j_call",
    "c_call",
    "junction_aa",
    "cdr3",
    "cdr3_aa",
    "productive",
];

pub const DEFAULT_LIMIT: u32 = 100;
pub const DEFAULT_OFFSET: u32 = 0;
pub const MAX_GENES: usize = 1024;
/// Built URLs at or above this length are refused before they are sent.
pub const MAX_URL_LENGTH: usize = 4078;
pub const METADATA_SAMPLE_ROWS: u32 = 30;
pub const METADATA_SUMMARY_ROWS: u32 = 10_000;
