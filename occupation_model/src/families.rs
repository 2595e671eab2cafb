/// Taxonomy families and scale attachment.
///
/// A family (Abilities, Work Styles, Education & Training…) owns a set of
/// scale ids and maps leaf elements to them. Attaching a family walks its
/// mapping and adds one `ElementScale` per bound scale to each known element.
/// Families may be attached in any order; two families binding the same
/// scale id on one element is an error.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::ModelError;
use crate::element::Element;
use crate::scale::{ElementScale, OrdinalSemantics, ScaleDefinition, ScaleShape};

// ---------------------------------------------------------------------------
// Mapping and anchors
// ---------------------------------------------------------------------------

/// element id → scale ids, in first-seen order without repeats.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ElementScaleMapping {
    entries: BTreeMap<String, Vec<String>>,
}

impl ElementScaleMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a mapping row. Empty ids are ignored.
    pub fn insert(&mut self, element_id: &str, scale_id: &str) {
        if element_id.is_empty() || scale_id.is_empty() {
            return;
        }
        let ids = self.entries.entry(element_id.to_string()).or_default();
        if !ids.iter().any(|s| s == scale_id) {
            ids.push(scale_id.to_string());
        }
    }

    pub fn scale_ids(&self, element_id: &str) -> &[String] {
        self.entries
            .get(element_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(e, s)| (e.as_str(), s.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> FromIterator<(&'a str, &'a str)> for ElementScaleMapping {
    fn from_iter<T: IntoIterator<Item = (&'a str, &'a str)>>(iter: T) -> Self {
        let mut mapping = Self::new();
        for (element_id, scale_id) in iter {
            mapping.insert(element_id, scale_id);
        }
        mapping
    }
}

/// One row of the anchor table, already typed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnchorRow {
    pub element_id: String,
    pub scale_id: String,
    pub anchor_value: i64,
    pub description: String,
}

/// Group anchor rows for `scale_id` by element, keeping only elements under
/// one of `prefixes`.
pub fn collect_anchors<'a, I>(
    rows: I,
    scale_id: &str,
    prefixes: &[&str],
) -> BTreeMap<String, OrdinalSemantics>
where
    I: IntoIterator<Item = &'a AnchorRow>,
{
    let mut grouped: BTreeMap<String, BTreeMap<i64, String>> = BTreeMap::new();
    for row in rows {
        if row.scale_id != scale_id {
            continue;
        }
        if !prefixes.iter().any(|p| row.element_id.starts_with(p)) {
            continue;
        }
        grouped
            .entry(row.element_id.clone())
            .or_default()
            .insert(row.anchor_value, row.description.clone());
    }
    grouped
        .into_iter()
        .map(|(id, cats)| (id, OrdinalSemantics::new(cats)))
        .collect()
}

// ---------------------------------------------------------------------------
// Bindings
// ---------------------------------------------------------------------------

/// How a mapped scale id turns into element scales.
#[derive(Debug, Clone)]
pub enum ScaleBinding {
    /// One shape shared by every mapped element.
    Universal(ScaleShape),
    /// Element-specific ordinal anchors. Elements without anchors get nothing.
    Anchored(BTreeMap<String, ScaleShape>),
    /// A category-distribution prefix expanding into many interval scales.
    Distribution(Vec<ScaleShape>),
}

impl ScaleBinding {
    /// Build per-element anchored shapes over one shared definition.
    pub fn anchored(
        definition: Arc<ScaleDefinition>,
        anchors: BTreeMap<String, OrdinalSemantics>,
    ) -> Result<Self, ModelError> {
        let mut shapes = BTreeMap::new();
        for (element_id, semantics) in anchors {
            shapes.insert(element_id, ScaleShape::ordinal(definition.clone(), semantics)?);
        }
        Ok(ScaleBinding::Anchored(shapes))
    }

    fn shapes_for(&self, element_id: &str) -> Vec<&ScaleShape> {
        match self {
            ScaleBinding::Universal(shape) => vec![shape],
            ScaleBinding::Anchored(by_element) => by_element.get(element_id).into_iter().collect(),
            ScaleBinding::Distribution(shapes) => shapes.iter().collect(),
        }
    }
}

/// A family ready to attach: its mapping plus a binding per owned scale id.
#[derive(Debug, Clone)]
pub struct ScaleFamily {
    pub name: String,
    pub prefixes: Vec<String>,
    pub mapping: ElementScaleMapping,
    pub bindings: BTreeMap<String, ScaleBinding>,
}

impl ScaleFamily {
    pub fn new(name: impl Into<String>, prefixes: &[&str], mapping: ElementScaleMapping) -> Self {
        Self {
            name: name.into(),
            prefixes: prefixes.iter().map(|p| p.to_string()).collect(),
            mapping,
            bindings: BTreeMap::new(),
        }
    }

    pub fn bind(mut self, scale_id: impl Into<String>, binding: ScaleBinding) -> Self {
        self.bindings.insert(scale_id.into(), binding);
        self
    }

    pub fn owns(&self, scale_id: &str) -> bool {
        self.bindings.contains_key(scale_id)
    }
}

/// Outcome of attaching one family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FamilyReport {
    pub family: String,
    /// Elements that received at least one scale from this family.
    pub elements_with_scales: usize,
    pub scales_attached: usize,
    /// Mapped element ids missing from the leaf set.
    pub unknown_elements: usize,
}

// ---------------------------------------------------------------------------
// Attachment
// ---------------------------------------------------------------------------

/// Attach every family to `elements`, in the given order.
pub fn attach_families(
    elements: &mut BTreeMap<String, Element>,
    families: &[ScaleFamily],
) -> Result<Vec<FamilyReport>, ModelError> {
    let mut owners: BTreeMap<(String, String), String> = BTreeMap::new();
    let mut reports = Vec::with_capacity(families.len());

    for family in families {
        let mut report = FamilyReport {
            family: family.name.clone(),
            elements_with_scales: 0,
            scales_attached: 0,
            unknown_elements: 0,
        };

        for (element_id, scale_ids) in family.mapping.iter() {
            let Some(element) = elements.get_mut(element_id) else {
                report.unknown_elements += 1;
                continue;
            };

            let mut attached_here = 0;
            for scale_id in scale_ids {
                let Some(binding) = family.bindings.get(scale_id) else {
                    continue;
                };
                for shape in binding.shapes_for(element_id) {
                    let key = (element_id.to_string(), shape.scale_id().to_string());
                    if let Some(owner) = owners.get(&key) {
                        if owner != &family.name {
                            return Err(ModelError::ConflictingScale {
                                element_id: key.0,
                                scale_id: key.1,
                                owner: owner.clone(),
                            });
                        }
                    }
                    owners.insert(key, family.name.clone());
                    element.upsert_scale(ElementScale::new(shape.clone()));
                    attached_here += 1;
                }
            }

            if attached_here > 0 {
                report.elements_with_scales += 1;
                report.scales_attached += attached_here;
            }
        }

        reports.push(report);
    }

    Ok(reports)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scale::{IntervalSemantics, ScaleType};

    fn importance() -> ScaleShape {
        let def = ScaleDefinition::new("IM", "Importance", 1.0, 5.0, ScaleType::Ordinal).unwrap();
        let cats = (1..=5).map(|k| (k, format!("{k}"))).collect();
        ScaleShape::ordinal(Arc::new(def), OrdinalSemantics::new(cats)).unwrap()
    }

    fn level_def() -> Arc<ScaleDefinition> {
        Arc::new(ScaleDefinition::new("LV", "Level", 0.0, 7.0, ScaleType::Ordinal).unwrap())
    }

    fn leaves(ids: &[&str]) -> BTreeMap<String, Element> {
        ids.iter()
            .map(|id| (id.to_string(), Element::new(*id, format!("element {id}"))))
            .collect()
    }

    fn anchor(element_id: &str, scale_id: &str, value: i64) -> AnchorRow {
        AnchorRow {
            element_id: element_id.into(),
            scale_id: scale_id.into(),
            anchor_value: value,
            description: format!("anchor {value}"),
        }
    }

    #[test]
    fn test_mapping_deduplicates() {
        let mapping: ElementScaleMapping =
            [("1.A.1", "IM"), ("1.A.1", "LV"), ("1.A.1", "IM"), ("", "IM"), ("1.A.2", "")]
                .into_iter()
                .collect();
        assert_eq!(mapping.len(), 1);
        assert_eq!(mapping.scale_ids("1.A.1"), ["IM", "LV"]);
        assert!(mapping.scale_ids("1.A.2").is_empty());
    }

    #[test]
    fn test_collect_anchors_filters_scale_and_prefix() {
        let rows = vec![
            anchor("1.A.1", "LV", 1),
            anchor("1.A.1", "LV", 6),
            anchor("1.A.1", "IM", 2),
            anchor("2.A.1", "LV", 3),
        ];
        let anchors = collect_anchors(&rows, "LV", &["1.A"]);
        assert_eq!(anchors.len(), 1);
        let cats = &anchors["1.A.1"].categories;
        assert_eq!(cats.keys().copied().collect::<Vec<_>>(), vec![1, 6]);
    }

    #[test]
    fn test_attach_skips_unknown_elements_and_unowned_scales() {
        let mut elements = leaves(&["1.A.1", "1.A.2"]);
        let mapping: ElementScaleMapping = [
            ("1.A.1", "IM"),
            ("1.A.1", "LV"),
            ("1.A.2", "IM"),
            ("1.A.2", "LV"),
            ("1.A.2", "ZZ"),
            ("1.A.9", "IM"),
        ]
        .into_iter()
        .collect();
        let anchors = collect_anchors(&[anchor("1.A.1", "LV", 1)], "LV", &["1.A"]);
        let family = ScaleFamily::new("abilities", &["1.A"], mapping)
            .bind("IM", ScaleBinding::Universal(importance()))
            .bind("LV", ScaleBinding::anchored(level_def(), anchors).unwrap());

        let reports = attach_families(&mut elements, &[family]).unwrap();
        assert_eq!(reports[0].elements_with_scales, 2);
        assert_eq!(reports[0].scales_attached, 3);
        assert_eq!(reports[0].unknown_elements, 1);

        let e1: Vec<&str> = elements["1.A.1"].scale_ids().collect();
        let e2: Vec<&str> = elements["1.A.2"].scale_ids().collect();
        assert_eq!(e1, vec!["IM", "LV"]);
        assert_eq!(e2, vec!["IM"], "no anchors means no LV scale");
    }

    #[test]
    fn test_shared_shape_across_elements() {
        let mut elements = leaves(&["1.A.1", "1.A.2"]);
        let mapping: ElementScaleMapping =
            [("1.A.1", "IM"), ("1.A.2", "IM")].into_iter().collect();
        let family = ScaleFamily::new("abilities", &["1.A"], mapping)
            .bind("IM", ScaleBinding::Universal(importance()));
        attach_families(&mut elements, &[family]).unwrap();
        let a = elements["1.A.1"].get_scale("IM").unwrap().shape();
        let b = elements["1.A.2"].get_scale("IM").unwrap().shape();
        assert!(a.shares_metadata_with(b));
    }

    #[test]
    fn test_conflicting_families_rejected() {
        let mut elements = leaves(&["2.D.4.a"]);
        let first = ScaleFamily::new("first", &["2.D"], [("2.D.4.a", "IM")].into_iter().collect())
            .bind("IM", ScaleBinding::Universal(importance()));
        let second = ScaleFamily::new("second", &["2.D"], [("2.D.4.a", "IM")].into_iter().collect())
            .bind("IM", ScaleBinding::Universal(importance()));
        let err = attach_families(&mut elements, &[first, second]).unwrap_err();
        assert_eq!(
            err,
            ModelError::ConflictingScale {
                element_id: "2.D.4.a".into(),
                scale_id: "IM".into(),
                owner: "first".into(),
            }
        );
    }

    #[test]
    fn test_attach_order_independent() {
        let impact = {
            let def = ScaleDefinition::new("WI", "Impact", -3.0, 3.0, ScaleType::Interval).unwrap();
            ScaleShape::interval(Arc::new(def), IntervalSemantics::new("impact")).unwrap()
        };
        let abilities = ScaleFamily::new("abilities", &["1.A"], [("1.A.1", "IM")].into_iter().collect())
            .bind("IM", ScaleBinding::Universal(importance()));
        let styles = ScaleFamily::new("styles", &["1.D"], [("1.D.1.a", "WI")].into_iter().collect())
            .bind("WI", ScaleBinding::Universal(impact));

        let mut forward = leaves(&["1.A.1", "1.D.1.a"]);
        attach_families(&mut forward, &[abilities.clone(), styles.clone()]).unwrap();
        let mut backward = leaves(&["1.A.1", "1.D.1.a"]);
        attach_families(&mut backward, &[styles, abilities]).unwrap();
        assert_eq!(forward, backward);
    }
}
