//! Drift detection: schema reproducibility and schema comparison.
//!
//! Two schemas built from different reference data releases are compared
//! slot by slot; a snapshot can only be restored into a schema with no drift.

use std::collections::BTreeSet;

use serde::Serialize;

use occupation_model::OccupationSchema;

use crate::catalog::ReferenceCatalog;
use crate::error::{Result, RuntimeError};

/// Build the schema twice from the same catalog and require identical
/// fingerprints. Returns the fingerprint.
pub fn verify_reproducible(catalog: &ReferenceCatalog) -> Result<String> {
    let (first, _) = catalog.build_schema()?;
    let (second, _) = catalog.build_schema()?;
    let (a, b) = (first.fingerprint(), second.fingerprint());
    if a != b {
        return Err(RuntimeError::integrity(format!(
            "two schema builds produced different fingerprints: {a} vs {b}"
        )));
    }
    Ok(a)
}

/// Structured schema comparison.
pub fn compare_schemas(a: &OccupationSchema, b: &OccupationSchema) -> SchemaDrift {
    let ids_a: BTreeSet<&str> = a.templates().map(|t| t.element_id()).collect();
    let ids_b: BTreeSet<&str> = b.templates().map(|t| t.element_id()).collect();

    let added_elements = ids_b.difference(&ids_a).map(|s| s.to_string()).collect();
    let removed_elements = ids_a.difference(&ids_b).map(|s| s.to_string()).collect();

    // Slot changes in elements present in both schemas
    let mut added_scales = Vec::new();
    let mut removed_scales = Vec::new();
    let mut changed_scales = Vec::new();
    for id in ids_a.intersection(&ids_b) {
        let (Ok(ta), Ok(tb)) = (a.get(id), b.get(id)) else {
            continue;
        };
        for (scale_id, shape) in tb.scales() {
            match ta.scales().get(scale_id) {
                None => added_scales.push(slot(id, scale_id)),
                Some(old) if old != shape => changed_scales.push(slot(id, scale_id)),
                Some(_) => {}
            }
        }
        for scale_id in ta.scales().keys() {
            if !tb.scales().contains_key(scale_id) {
                removed_scales.push(slot(id, scale_id));
            }
        }
    }

    SchemaDrift {
        fingerprint_a: a.fingerprint(),
        fingerprint_b: b.fingerprint(),
        element_count_a: a.len(),
        element_count_b: b.len(),
        slot_count_a: a.slot_count(),
        slot_count_b: b.slot_count(),
        added_elements,
        removed_elements,
        added_scales,
        removed_scales,
        changed_scales,
    }
}

fn slot(element_id: &str, scale_id: &str) -> String {
    format!("{element_id}/{scale_id}")
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaDrift {
    pub fingerprint_a: String,
    pub fingerprint_b: String,
    pub element_count_a: usize,
    pub element_count_b: usize,
    pub slot_count_a: usize,
    pub slot_count_b: usize,
    pub added_elements: Vec<String>,
    pub removed_elements: Vec<String>,
    /// `element/scale` slots.
    pub added_scales: Vec<String>,
    pub removed_scales: Vec<String>,
    /// Same slot id, different definition or semantics.
    pub changed_scales: Vec<String>,
}

impl SchemaDrift {
    pub fn is_empty(&self) -> bool {
        self.fingerprint_a == self.fingerprint_b
            && self.added_elements.is_empty()
            && self.removed_elements.is_empty()
            && self.added_scales.is_empty()
            && self.removed_scales.is_empty()
            && self.changed_scales.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use occupation_model::element::Element;
    use occupation_model::scale::{
        ElementScale, IntervalSemantics, ScaleDefinition, ScaleShape, ScaleType,
    };
    use std::sync::Arc;

    fn impact(meaning: &str) -> ElementScale {
        let def = ScaleDefinition::new("WI", "Impact", -3.0, 3.0, ScaleType::Interval).unwrap();
        ElementScale::new(ScaleShape::interval(Arc::new(def), IntervalSemantics::new(meaning)).unwrap())
    }

    fn element(id: &str, meaning: &str) -> Element {
        let mut e = Element::new(id, id);
        e.upsert_scale(impact(meaning));
        e
    }

    #[test]
    fn test_identical_schemas_have_no_drift() {
        let a = OccupationSchema::from_elements(&[element("1.D.1.a", "impact")]);
        let b = OccupationSchema::from_elements(&[element("1.D.1.a", "impact")]);
        let drift = compare_schemas(&a, &b);
        assert!(drift.is_empty());
        assert_eq!(drift.slot_count_a, 1);
    }

    #[test]
    fn test_drift_lists_changes() {
        let a = OccupationSchema::from_elements(&[
            element("1.D.1.a", "impact"),
            element("1.D.1.b", "impact"),
        ]);
        let b = OccupationSchema::from_elements(&[
            element("1.D.1.a", "impact on performance"),
            element("1.D.1.c", "impact"),
        ]);
        let drift = compare_schemas(&a, &b);
        assert!(!drift.is_empty());
        assert_eq!(drift.added_elements, ["1.D.1.c"]);
        assert_eq!(drift.removed_elements, ["1.D.1.b"]);
        assert_eq!(drift.changed_scales, ["1.D.1.a/WI"]);
        assert!(drift.added_scales.is_empty());
        assert_ne!(drift.fingerprint_a, drift.fingerprint_b);
    }
}
