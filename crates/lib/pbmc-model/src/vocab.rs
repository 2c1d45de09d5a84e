//! Closed vocabularies accepted by the atlas API.
//!
//! Every enumerated query value is drawn from one of these sets, which is why
//! they can be written into request URLs verbatim.

use std::fmt;
use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A value that does not belong to the named vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {vocabulary} value: {value}")]
pub struct UnknownTerm {
    pub vocabulary: &'static str,
    pub value: String,
}

macro_rules! vocabulary {
    (
        $(#[$meta:meta])*
        $name:ident ($label:literal) {
            $($(#[$vmeta:meta])* $variant:ident => $value:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
        pub enum $name {
            $(
                $(#[$vmeta])*
                #[serde(rename = $value)]
                $variant,
            )+
        }

        impl $name {
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// Returns the wire value used by the atlas API.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $value,)+
                }
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                self.as_str()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = UnknownTerm;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                Self::ALL
                    .iter()
                    .copied()
                    .find(|term| term.as_str() == value)
                    .ok_or_else(|| UnknownTerm {
                        vocabulary: $label,
                        value: value.to_string(),
                    })
            }
        }
    };
}

vocabulary! {
    /// Donor age group filter.
    #[derive(Default)]
    AgeGroup("age group") {
        #[default]
        All => "all",
        Adult => "adult",
        Elderly => "elderly",
        Unknown => "unknown",
        Young => "young",
    }
}

vocabulary! {
    /// Donor sex filter.
    #[derive(Default)]
    Sex("sex") {
        #[default]
        All => "all",
        Female => "female",
        Male => "male",
        Unknown => "unknown",
    }
}

vocabulary! {
    /// Condition codes used by the differential endpoints.
    ///
    /// `ad` is Alzheimer's disease, `pd` Parkinson's, `hnscc` head and neck
    /// squamous cell carcinoma, `rrms` relapsing remitting multiple sclerosis,
    /// `mis-c` multisystem inflammatory syndrome in children and `tb`
    /// tuberculosis.
    Disease("disease") {
        Inflammation => "Inflammation",
        RespiratorySystemDisorder => "Respiratory system disorder",
        Alzheimers => "ad",
        Covid19 => "covid-19",
        Hnscc => "hnscc",
        Influenza => "influenza",
        MisC => "mis-c",
        Parkinsons => "pd",
        Rrms => "rrms",
        SarsCov2Vaccine => "sars-cov-2 vaccine",
        Tuberculosis => "tb",
    }
}

vocabulary! {
    /// Broad cell type classification.
    CellTypeBroad("broad cell type") {
        TCell => "T cell",
        NkCell => "NK cell",
        BCell => "B cell",
        Ilc => "ILC",
        ProgenitorCell => "Progenitor cell",
        Erythrocyte => "Erythrocyte",
        Monocyte => "Monocyte",
        Dc => "DC",
    }
}

vocabulary! {
    /// Fine-grained cell type classification.
    CellTypeFine("fine cell type") {
        PlasmaCell => "Plasma cell",
        IntermediateMonocyte => "Intermediate monocyte",
        NaiveCd4TCell => "Naive CD4 T cell",
        Cd14Monocyte => "CD14 monocyte",
        Asdc => "ASDC",
        Ilc => "ILC",
        Cd8aa => "CD8aa",
        CDc2 => "cDC2",
        NaiveCd8TCell => "Naive CD8 T cell",
        PDc => "pDC",
        MemoryCd8TCell => "Memory CD8 T cell",
        NaiveBCell => "Naive B cell",
        EffectorBCell => "Effector B cell",
        CDc1 => "cDC1",
        Gdt => "gdT",
        Erythrocyte => "Erythrocyte",
        Cd56dimNkCell => "CD56dim NK cell",
        Cd16Monocyte => "CD16 monocyte",
        MemoryBCell => "Memory B cell",
        ProgenitorCell => "Progenitor cell",
        Treg => "Treg",
        MemoryCd4TCell => "Memory CD4 T cell",
        DnTCell => "DN T cell",
        Mait => "MAIT",
        ProliferatingTCell => "Proliferating T cell",
    }
}

/// A cell type from either classification.
///
/// Labels present in both vocabularies (`ILC`, `Erythrocyte`,
/// `Progenitor cell`) deserialize as fine-grained; the wire value is the same.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum CellType {
    Fine(CellTypeFine),
    Broad(CellTypeBroad),
}

impl CellType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Fine(cell_type) => cell_type.as_str(),
            Self::Broad(cell_type) => cell_type.as_str(),
        }
    }
}

impl fmt::Display for CellType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

vocabulary! {
    /// Sex values accepted by the metadata endpoint; `none` disables the filter.
    #[derive(Default)]
    MetadataSex("metadata sex") {
        Male => "male",
        Female => "female",
        Unknown => "unknown",
        #[default]
        None => "none",
    }
}

impl MetadataSex {
    /// Returns the query value, or `None` when the filter is disabled.
    #[must_use]
    pub const fn filter_value(self) -> Option<&'static str> {
        match self {
            Self::None => None,
            other => Some(other.as_str()),
        }
    }
}

vocabulary! {
    /// Long-form disease labels used by the sample metadata table; `none`
    /// disables the filter.
    #[derive(Default)]
    MetadataDisease("metadata disease") {
        MisC => "Multisystem inflammatory syndrome in children (MIS-C)",
        Inflammation => "Inflammation",
        Covid19 => "COVID-19",
        Parkinsons => "Parkinson's Disease (PD)",
        HealthyControl => "Healthy Control",
        Unknown => "Unknown",
        Tuberculosis => "Tuberculosis (TB)",
        EndStageRenalDisease => "End-Stage Renal Disease (ESRD)",
        Rrms => "Relapsing Remitting Multiple Sclerosis (RRMS)",
        Hnscc => "Head and neck squamous cell carcinoma (HNSCC)",
        Alzheimers => "Alzheimer's disease (AD)",
        RespiratorySystemDisorder => "Respiratory system disorder",
        Influenza => "Influenza",
        SarsCov2Vaccine => "SARS-CoV-2 vaccine",
        SepsisSurvived => "Sepsis (survived)",
        SepsisNonSurvived => "Sepsis (non-survived)",
        PrematureOvarianInsufficiency => "Premature Ovarian Insufficiency (POI)",
        #[default]
        None => "none",
    }
}

impl MetadataDisease {
    /// Returns the query value, or `None` when the filter is disabled.
    #[must_use]
    pub const fn filter_value(self) -> Option<&'static str> {
        match self {
            Self::None => None,
            other => Some(other.as_str()),
        }
    }
}

vocabulary! {
    /// Orderings offered for pathway results. A leading `-` sorts descending.
    #[derive(Default)]
    PathwayOrdering("pathway ordering") {
        #[default]
        PValue => "p_value",
        PValueDesc => "-p_value",
        Score => "score",
        ScoreDesc => "-score",
    }
}

vocabulary! {
    /// Orderings offered for DEG results. A leading `-` sorts descending.
    #[derive(Default)]
    DegOrdering("DEG ordering") {
        #[default]
        PValue => "p_value",
        PValueDesc => "-p_value",
        Log2FoldChange => "log2_fold_change",
        Log2FoldChangeDesc => "-log2_fold_change",
        Gene => "gene",
        GeneDesc => "-gene",
    }
}
