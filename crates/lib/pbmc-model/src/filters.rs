use std::collections::HashSet;
use std::fmt;
use std::hash::Hash;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::schema::{DEFAULT_LIMIT, DEFAULT_OFFSET};
use crate::vocab::{AgeGroup, DegOrdering, Disease, PathwayOrdering, Sex};

/// Rejection raised while validating filter input, before any request exists.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterError {
    #[error("limit must be greater than 0 (got {0})")]
    InvalidLimit(i64),
    #[error("offset must be 0 or greater (got {0})")]
    InvalidOffset(i64),
    #[error("too many genes requested ({count}, max {max})")]
    TooManyGenes { count: usize, max: usize },
}

/// Validated page window sent as `limit`/`offset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    limit: u32,
    offset: u32,
}

impl Pagination {
    /// Validates `limit > 0` and `offset >= 0` independently.
    ///
    /// # Errors
    /// Returns `FilterError` for the first value out of range; nothing is clamped.
    pub fn new(limit: i64, offset: i64) -> Result<Self, FilterError> {
        let limit = u32::try_from(limit)
            .ok()
            .filter(|value| *value > 0)
            .ok_or(FilterError::InvalidLimit(limit))?;
        let offset = u32::try_from(offset).map_err(|_| FilterError::InvalidOffset(offset))?;
        Ok(Self { limit, offset })
    }

    #[must_use]
    pub const fn limit(self) -> u32 {
        self.limit
    }

    #[must_use]
    pub const fn offset(self) -> u32 {
        self.offset
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            offset: DEFAULT_OFFSET,
        }
    }
}

/// Result column the upstream sorts by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    PValue,
    Score,
    Log2FoldChange,
    Gene,
}

impl SortField {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PValue => "p_value",
            Self::Score => "score",
            Self::Log2FoldChange => "log2_fold_change",
            Self::Gene => "gene",
        }
    }
}

/// Ordering key; rendered with a leading `-` when descending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey {
    pub field: SortField,
    pub descending: bool,
}

impl SortKey {
    #[must_use]
    pub const fn ascending(field: SortField) -> Self {
        Self {
            field,
            descending: false,
        }
    }

    #[must_use]
    pub const fn descending(field: SortField) -> Self {
        Self {
            field,
            descending: true,
        }
    }
}

impl Default for SortKey {
    fn default() -> Self {
        Self::ascending(SortField::PValue)
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.descending {
            f.write_str("-")?;
        }
        f.write_str(self.field.as_str())
    }
}

impl From<PathwayOrdering> for SortKey {
    fn from(ordering: PathwayOrdering) -> Self {
        match ordering {
            PathwayOrdering::PValue => Self::ascending(SortField::PValue),
            PathwayOrdering::PValueDesc => Self::descending(SortField::PValue),
            PathwayOrdering::Score => Self::ascending(SortField::Score),
            PathwayOrdering::ScoreDesc => Self::descending(SortField::Score),
        }
    }
}

impl From<DegOrdering> for SortKey {
    fn from(ordering: DegOrdering) -> Self {
        match ordering {
            DegOrdering::PValue => Self::ascending(SortField::PValue),
            DegOrdering::PValueDesc => Self::descending(SortField::PValue),
            DegOrdering::Log2FoldChange => Self::ascending(SortField::Log2FoldChange),
            DegOrdering::Log2FoldChangeDesc => Self::descending(SortField::Log2FoldChange),
            DegOrdering::Gene => Self::ascending(SortField::Gene),
            DegOrdering::GeneDesc => Self::descending(SortField::Gene),
        }
    }
}

/// Immutable set of recognized query dimensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterSet {
    pub age_group: AgeGroup,
    pub sex: Sex,
    pub disease: Disease,
    pub pagination: Pagination,
    pub ordering: SortKey,
}

impl FilterSet {
    #[must_use]
    pub fn new(disease: Disease) -> Self {
        Self {
            age_group: AgeGroup::default(),
            sex: Sex::default(),
            disease,
            pagination: Pagination::default(),
            ordering: SortKey::default(),
        }
    }

    #[must_use]
    pub const fn with_age_group(mut self, age_group: AgeGroup) -> Self {
        self.age_group = age_group;
        self
    }

    #[must_use]
    pub const fn with_sex(mut self, sex: Sex) -> Self {
        self.sex = sex;
        self
    }

    #[must_use]
    pub const fn with_pagination(mut self, pagination: Pagination) -> Self {
        self.pagination = pagination;
        self
    }

    #[must_use]
    pub fn with_ordering(mut self, ordering: impl Into<SortKey>) -> Self {
        self.ordering = ordering.into();
        self
    }
}

/// Cell type classification granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resolution {
    Fine,
    Broad,
}

impl Resolution {
    /// Resolutions in the order a two-resolution tool processes them.
    pub const ORDERED: [Self; 2] = [Self::Fine, Self::Broad];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Fine => "fine",
            Self::Broad => "broad",
        }
    }
}

/// Deduplicated entity keys, iterated in first-seen order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityKeySet<T> {
    keys: Vec<T>,
}

impl<T> EntityKeySet<T> {
    #[must_use]
    pub const fn new() -> Self {
        Self { keys: Vec::new() }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.keys.iter()
    }

    /// Converts the set into a request selection; an empty set means no
    /// entity restriction.
    #[must_use]
    pub fn into_selection(self) -> KeySelection<T> {
        if self.keys.is_empty() {
            KeySelection::Unfiltered
        } else {
            KeySelection::Keyed(self)
        }
    }
}

impl<T> Default for EntityKeySet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Eq + Hash + Clone> FromIterator<T> for EntityKeySet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut seen = HashSet::new();
        let mut keys = Vec::new();
        for key in iter {
            if seen.insert(key.clone()) {
                keys.push(key);
            }
        }
        Self { keys }
    }
}

impl<'a, T> IntoIterator for &'a EntityKeySet<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.keys.iter()
    }
}

/// Which entities a request sequence is restricted to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeySelection<T> {
    Keyed(EntityKeySet<T>),
    Unfiltered,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vocab::CellTypeFine;

    #[test]
    fn pagination_rejects_out_of_range_values() {
        assert_eq!(Pagination::new(0, 0), Err(FilterError::InvalidLimit(0)));
        assert_eq!(Pagination::new(-5, 0), Err(FilterError::InvalidLimit(-5)));
        assert_eq!(Pagination::new(10, -1), Err(FilterError::InvalidOffset(-1)));

        let page = Pagination::new(25, 50).expect("valid window");
        assert_eq!((page.limit(), page.offset()), (25, 50));
    }

    #[test]
    fn sort_key_encodes_direction_with_leading_dash() {
        assert_eq!(SortKey::from(PathwayOrdering::ScoreDesc).to_string(), "-score");
        assert_eq!(SortKey::from(DegOrdering::Log2FoldChange).to_string(), "log2_fold_change");
        assert_eq!(SortKey::default().to_string(), "p_value");
    }

    #[test]
    fn key_set_deduplicates_in_first_seen_order() {
        let keys: EntityKeySet<CellTypeFine> = [
            CellTypeFine::NaiveCd4TCell,
            CellTypeFine::NaiveCd4TCell,
            CellTypeFine::Treg,
        ]
        .into_iter()
        .collect();

        assert_eq!(keys.len(), 2);
        let ordered: Vec<_> = keys.iter().map(|key| key.as_str()).collect();
        assert_eq!(ordered, vec!["Naive CD4 T cell", "Treg"]);
    }

    #[test]
    fn empty_key_set_selects_unfiltered() {
        let keys: EntityKeySet<CellTypeFine> = EntityKeySet::new();
        assert_eq!(keys.into_selection(), KeySelection::Unfiltered);
    }
}
