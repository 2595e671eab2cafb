/// Rating rows and the unified rating map.
///
/// Rating files share one column layout:
///
/// ```text
/// entity | element | element name | scale | (category) | value | ...
/// ```
///
/// A [`RatingLayout`] says whether the category column is present and which
/// scale ids it applies to. Rows are parsed into `(RatingKey, f64)`; rows that
/// cannot be used are reported as a [`RowSkip`] reason, never as an error.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::distribution::category_scale_id;
use crate::error::ModelError;

/// Column holding the raw scale id.
pub const SCALE_COLUMN: usize = 3;
/// Column holding the category, when the layout has one.
pub const CATEGORY_COLUMN: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RatingKey {
    pub entity_id: String,
    pub element_id: String,
    pub scale_id: String,
}

impl RatingKey {
    pub fn new(
        entity_id: impl Into<String>,
        element_id: impl Into<String>,
        scale_id: impl Into<String>,
    ) -> Self {
        Self {
            entity_id: entity_id.into(),
            element_id: element_id.into(),
            scale_id: scale_id.into(),
        }
    }
}

impl fmt::Display for RatingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.entity_id, self.element_id, self.scale_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingLayout {
    pub file_name: String,
    #[serde(default)]
    pub has_category_column: bool,
    #[serde(default)]
    pub category_scales: Vec<String>,
    pub value_column: usize,
}

impl RatingLayout {
    /// Layout without a category column; value in column 4.
    pub fn standard(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            has_category_column: false,
            category_scales: Vec::new(),
            value_column: 4,
        }
    }

    /// Layout with a category column; value in column 5.
    pub fn categorized(file_name: impl Into<String>, category_scales: &[&str]) -> Self {
        Self {
            file_name: file_name.into(),
            has_category_column: true,
            category_scales: category_scales.iter().map(|s| s.to_string()).collect(),
            value_column: 5,
        }
    }

    /// `"{scale}-{category}"` for category scales, else the raw id.
    pub fn effective_scale_id(&self, raw_scale_id: &str, category: &str) -> String {
        if self.has_category_column && self.category_scales.iter().any(|s| s == raw_scale_id) {
            category_scale_id(raw_scale_id, category)
        } else {
            raw_scale_id.to_string()
        }
    }

    /// Parse one row. Cells are trimmed here.
    pub fn parse_row<S: AsRef<str>>(&self, row: &[S]) -> Result<(RatingKey, f64), RowSkip> {
        if row.len() < self.value_column + 1 {
            return Err(RowSkip::TooShort);
        }
        let cell = |i: usize| row[i].as_ref().trim();

        let entity_id = cell(0);
        let element_id = cell(1);
        let raw_scale_id = cell(SCALE_COLUMN);
        if entity_id.is_empty() || element_id.is_empty() || raw_scale_id.is_empty() {
            return Err(RowSkip::MissingField);
        }

        let category = if self.has_category_column {
            cell(CATEGORY_COLUMN)
        } else {
            ""
        };
        let scale_id = self.effective_scale_id(raw_scale_id, category);

        let raw = cell(self.value_column);
        if raw.is_empty() || raw.eq_ignore_ascii_case("n/a") {
            return Err(RowSkip::NotAvailable);
        }
        let value: f64 = raw.parse().map_err(|_| RowSkip::NotNumeric)?;

        Ok((RatingKey::new(entity_id, element_id, scale_id), value))
    }
}

/// Why a rating row was not used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RowSkip {
    /// Fewer cells than the value column requires.
    TooShort,
    /// Empty entity, element or scale id.
    MissingField,
    /// Empty or `n/a` value.
    NotAvailable,
    /// Value is not a number.
    NotNumeric,
}

impl RowSkip {
    /// Malformed rows as opposed to rows that simply carry no rating.
    pub fn is_malformed(self) -> bool {
        matches!(self, RowSkip::TooShort | RowSkip::MissingField)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RowSkip::TooShort => "too_short",
            RowSkip::MissingField => "missing_field",
            RowSkip::NotAvailable => "not_available",
            RowSkip::NotNumeric => "not_numeric",
        }
    }
}

// ---------------------------------------------------------------------------
// Rating map
// ---------------------------------------------------------------------------

/// What to do when a key is supplied twice.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollisionPolicy {
    #[default]
    Reject,
    LastWriteWins,
}

/// Result of an insert under [`CollisionPolicy::LastWriteWins`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Inserted {
    New,
    Overwrote(f64),
}

/// entity → element → effective scale → value.
///
/// Nested so that slot lookups borrow their keys.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RatingMap {
    policy: CollisionPolicy,
    values: BTreeMap<String, BTreeMap<String, BTreeMap<String, f64>>>,
    len: usize,
}

impl RatingMap {
    pub fn new(policy: CollisionPolicy) -> Self {
        Self {
            policy,
            values: BTreeMap::new(),
            len: 0,
        }
    }

    pub fn policy(&self) -> CollisionPolicy {
        self.policy
    }

    pub fn insert(&mut self, key: RatingKey, value: f64) -> Result<Inserted, ModelError> {
        let policy = self.policy;
        if let Some(existing) = self.slot_mut(&key.entity_id, &key.element_id, &key.scale_id) {
            return match policy {
                CollisionPolicy::Reject => Err(ModelError::DuplicateRating {
                    entity_id: key.entity_id,
                    element_id: key.element_id,
                    scale_id: key.scale_id,
                }),
                CollisionPolicy::LastWriteWins => {
                    let previous = *existing;
                    *existing = value;
                    Ok(Inserted::Overwrote(previous))
                }
            };
        }
        self.values
            .entry(key.entity_id)
            .or_default()
            .entry(key.element_id)
            .or_default()
            .insert(key.scale_id, value);
        self.len += 1;
        Ok(Inserted::New)
    }

    /// Merge another map in, key order. Returns the keys that were overwritten.
    pub fn merge(&mut self, other: RatingMap) -> Result<Vec<(RatingKey, f64, f64)>, ModelError> {
        let mut overwritten = Vec::new();
        for (entity_id, elements) in other.values {
            for (element_id, scales) in elements {
                for (scale_id, value) in scales {
                    let key = RatingKey::new(entity_id.as_str(), element_id.as_str(), scale_id);
                    if let Inserted::Overwrote(previous) = self.insert(key.clone(), value)? {
                        overwritten.push((key, previous, value));
                    }
                }
            }
        }
        Ok(overwritten)
    }

    pub fn get(&self, entity_id: &str, element_id: &str, scale_id: &str) -> Option<f64> {
        self.values
            .get(entity_id)?
            .get(element_id)?
            .get(scale_id)
            .copied()
    }

    fn slot_mut(&mut self, entity_id: &str, element_id: &str, scale_id: &str) -> Option<&mut f64> {
        self.values
            .get_mut(entity_id)?
            .get_mut(element_id)?
            .get_mut(scale_id)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// `(entity, element, scale, value)` in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str, &str, f64)> {
        self.values.iter().flat_map(|(entity, elements)| {
            elements.iter().flat_map(move |(element, scales)| {
                scales
                    .iter()
                    .map(move |(scale, v)| (entity.as_str(), element.as_str(), scale.as_str(), *v))
            })
        })
    }

    /// Distinct entity ids present in the map, with their rating counts.
    pub fn entities(&self) -> impl Iterator<Item = (&str, usize)> {
        self.values
            .iter()
            .map(|(id, elements)| (id.as_str(), elements.values().map(BTreeMap::len).sum()))
    }

    /// Distinct entity ids present in the map.
    pub fn entity_ids(&self) -> Vec<&str> {
        self.values.keys().map(String::as_str).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_standard_row() {
        let layout = RatingLayout::standard("Abilities.txt");
        let (key, value) = layout
            .parse_row(&row(&["11-1011.00", "1.A.1.a.1", "Oral Comprehension", "IM", "4.62", "8"]))
            .unwrap();
        assert_eq!(key, RatingKey::new("11-1011.00", "1.A.1.a.1", "IM"));
        assert!((value - 4.62).abs() < 1e-9);
    }

    #[test]
    fn test_category_row() {
        let layout = RatingLayout::categorized(
            "Education, Training, and Experience.txt",
            &["RL", "RW", "PT", "OJ"],
        );
        let (key, value) = layout
            .parse_row(&row(&["11-1011.00", "2.D.1", "Required Level of Education", "RL", "6", "32.29"]))
            .unwrap();
        assert_eq!(key.scale_id, "RL-6");
        assert!((value - 32.29).abs() < 1e-9);

        let (key, _) = layout
            .parse_row(&row(&["11-1011.00", "2.D.4.a", "Certification", "IM", "n/a", "3.1"]))
            .unwrap();
        assert_eq!(key.scale_id, "IM");
    }

    #[test]
    fn test_skip_reasons() {
        let layout = RatingLayout::standard("Skills.txt");
        assert_eq!(layout.parse_row(&row(&["a", "b", "c", "IM"])), Err(RowSkip::TooShort));
        assert_eq!(layout.parse_row(&row(&["", "b", "c", "IM", "1"])), Err(RowSkip::MissingField));
        assert_eq!(layout.parse_row(&row(&["a", "b", "c", "", "1"])), Err(RowSkip::MissingField));
        assert_eq!(layout.parse_row(&row(&["a", "b", "c", "IM", "N/A"])), Err(RowSkip::NotAvailable));
        assert_eq!(layout.parse_row(&row(&["a", "b", "c", "IM", " "])), Err(RowSkip::NotAvailable));
        assert_eq!(layout.parse_row(&row(&["a", "b", "c", "IM", "high"])), Err(RowSkip::NotNumeric));
        assert!(RowSkip::TooShort.is_malformed());
        assert!(!RowSkip::NotNumeric.is_malformed());
    }

    #[test]
    fn test_duplicate_rejected_by_default() {
        let mut map = RatingMap::default();
        assert_eq!(map.policy(), CollisionPolicy::Reject);
        map.insert(RatingKey::new("o", "e", "IM"), 3.0).unwrap();
        let err = map.insert(RatingKey::new("o", "e", "IM"), 4.0).unwrap_err();
        assert!(matches!(err, ModelError::DuplicateRating { .. }));
        assert_eq!(map.get("o", "e", "IM"), Some(3.0));
    }

    #[test]
    fn test_last_write_wins_reports_overwrites() {
        let mut base = RatingMap::new(CollisionPolicy::LastWriteWins);
        base.insert(RatingKey::new("o", "e", "IM"), 3.0).unwrap();
        let mut other = RatingMap::new(CollisionPolicy::LastWriteWins);
        other.insert(RatingKey::new("o", "e", "IM"), 4.0).unwrap();
        other.insert(RatingKey::new("o", "e", "LV"), 2.0).unwrap();

        let overwritten = base.merge(other).unwrap();
        assert_eq!(overwritten, vec![(RatingKey::new("o", "e", "IM"), 3.0, 4.0)]);
        assert_eq!(base.get("o", "e", "IM"), Some(4.0));
        assert_eq!(base.len(), 2);
        assert_eq!(base.entity_ids(), vec!["o"]);
    }

    #[test]
    fn test_lookup_is_exact_per_level() {
        let mut map = RatingMap::default();
        map.insert(RatingKey::new("a", "1.A.1", "IM"), 3.0).unwrap();
        map.insert(RatingKey::new("a", "1.A.1", "LV"), 4.0).unwrap();
        map.insert(RatingKey::new("b", "1.A.2", "IM"), 2.0).unwrap();

        assert_eq!(map.len(), 3);
        assert_eq!(map.get("a", "1.A.1", "LV"), Some(4.0));
        assert_eq!(map.get("a", "1.A.2", "IM"), None);
        assert_eq!(map.get("b", "1.A.1", "IM"), None);
        assert_eq!(map.get("c", "1.A.1", "IM"), None);

        let rows: Vec<_> = map.iter().collect();
        assert_eq!(
            rows,
            vec![("a", "1.A.1", "IM", 3.0), ("a", "1.A.1", "LV", 4.0), ("b", "1.A.2", "IM", 2.0)]
        );
        let counts: Vec<_> = map.entities().collect();
        assert_eq!(counts, vec![("a", 2), ("b", 1)]);
    }
}
