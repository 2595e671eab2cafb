//! Elements, their value-free templates, and the template registry.

use std::collections::BTreeMap;

use crate::error::ModelError;
use crate::hierarchy::organizations;
use crate::scale::{ElementScale, ScaleShape};

/// A measurable leaf item (an ability, a skill, a work style…) with the scales
/// attached to it.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    element_id: String,
    element_name: String,
    organizations: Vec<String>,
    scales: BTreeMap<String, ElementScale>,
}

impl Element {
    pub fn new(element_id: impl Into<String>, element_name: impl Into<String>) -> Self {
        let element_id = element_id.into();
        let organizations = organizations(&element_id);
        Self {
            element_id,
            element_name: element_name.into(),
            organizations,
            scales: BTreeMap::new(),
        }
    }

    pub fn element_id(&self) -> &str {
        &self.element_id
    }

    pub fn element_name(&self) -> &str {
        &self.element_name
    }

    /// Ancestor organization ids, root first. Fixed at construction.
    pub fn organizations(&self) -> &[String] {
        &self.organizations
    }

    pub fn scales(&self) -> &BTreeMap<String, ElementScale> {
        &self.scales
    }

    pub fn scales_mut(&mut self) -> impl Iterator<Item = (&String, &mut ElementScale)> {
        self.scales.iter_mut()
    }

    pub fn scale_ids(&self) -> impl Iterator<Item = &str> {
        self.scales.keys().map(String::as_str)
    }

    pub fn has_scales(&self) -> bool {
        !self.scales.is_empty()
    }

    /// Insert or replace the scale keyed by the shape's scale id.
    pub fn upsert_scale(&mut self, scale: ElementScale) {
        self.scales.insert(scale.scale_id().to_string(), scale);
    }

    pub fn get_scale(&self, scale_id: &str) -> Option<&ElementScale> {
        self.scales.get(scale_id)
    }

    pub fn get_scale_mut(&mut self, scale_id: &str) -> Option<&mut ElementScale> {
        self.scales.get_mut(scale_id)
    }

    /// Numeric value of a scale; `None` when absent or unset.
    pub fn scale_value(&self, scale_id: &str) -> Option<f64> {
        self.scales.get(scale_id).and_then(ElementScale::value)
    }

    pub fn populated_scale_count(&self) -> usize {
        self.scales.values().filter(|s| s.value().is_some()).count()
    }

    /// Validate every attached scale.
    pub fn validate(&self) -> Result<(), ModelError> {
        self.scales.values().try_for_each(ElementScale::validate)
    }
}

// ---------------------------------------------------------------------------
// Templates
// ---------------------------------------------------------------------------

/// Frozen shape of an [`Element`]: identity plus scale shapes, no values.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementTemplate {
    element_id: String,
    element_name: String,
    scales: BTreeMap<String, ScaleShape>,
}

impl ElementTemplate {
    /// Snapshot an element's shape. Any values it holds are dropped.
    pub fn from_element(element: &Element) -> Self {
        Self {
            element_id: element.element_id.clone(),
            element_name: element.element_name.clone(),
            scales: element
                .scales
                .iter()
                .map(|(id, s)| (id.clone(), s.shape().clone()))
                .collect(),
        }
    }

    pub fn element_id(&self) -> &str {
        &self.element_id
    }

    pub fn element_name(&self) -> &str {
        &self.element_name
    }

    pub fn scales(&self) -> &BTreeMap<String, ScaleShape> {
        &self.scales
    }

    pub fn scale_count(&self) -> usize {
        self.scales.len()
    }

    /// A fresh element with every scale value null.
    pub fn instantiate(&self) -> Element {
        let mut element = Element::new(self.element_id.clone(), self.element_name.clone());
        for shape in self.scales.values() {
            element.upsert_scale(ElementScale::new(shape.clone()));
        }
        element
    }
}

/// element id → template.
#[derive(Debug, Clone, Default)]
pub struct ElementTemplateRegistry {
    templates: BTreeMap<String, ElementTemplate>,
}

impl ElementTemplateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, template: ElementTemplate) -> Result<(), ModelError> {
        if self.templates.contains_key(template.element_id()) {
            return Err(ModelError::DuplicateTemplate(template.element_id().to_string()));
        }
        self.templates
            .insert(template.element_id().to_string(), template);
        Ok(())
    }

    pub fn get(&self, element_id: &str) -> Result<&ElementTemplate, ModelError> {
        self.templates
            .get(element_id)
            .ok_or_else(|| ModelError::not_found("template", element_id))
    }

    pub fn create_element(&self, element_id: &str) -> Result<Element, ModelError> {
        self.get(element_id).map(ElementTemplate::instantiate)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ElementTemplate> {
        self.templates.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scale::{IntervalSemantics, ScaleDefinition, ScaleType};
    use std::sync::Arc;

    fn occupational_interest() -> ElementScale {
        let def = ScaleDefinition::new("OI", "Occupational Interests", 1.0, 7.0, ScaleType::Interval)
            .unwrap();
        let shape =
            ScaleShape::interval(Arc::new(def), IntervalSemantics::new("interest")).unwrap();
        ElementScale::new(shape)
    }

    #[test]
    fn test_element_derives_organizations() {
        let e = Element::new("1.B.1.a", "Realistic");
        assert_eq!(e.organizations(), ["1", "1.B", "1.B.1"]);
        assert!(!e.has_scales());
    }

    #[test]
    fn test_template_drops_values() {
        let mut e = Element::new("1.B.1.a", "Realistic");
        let mut oi = occupational_interest();
        oi.set_rating(5.5).unwrap();
        e.upsert_scale(oi);
        assert_eq!(e.scale_value("OI"), Some(5.5));

        let template = ElementTemplate::from_element(&e);
        let fresh = template.instantiate();
        assert_eq!(fresh.scale_value("OI"), None);
        assert_eq!(fresh.element_name(), "Realistic");
        assert_eq!(fresh.organizations(), e.organizations());
    }

    #[test]
    fn test_registry_duplicate_and_missing() {
        let mut e = Element::new("1.B.1.a", "Realistic");
        e.upsert_scale(occupational_interest());
        let mut reg = ElementTemplateRegistry::new();
        reg.register(ElementTemplate::from_element(&e)).unwrap();

        let err = reg.register(ElementTemplate::from_element(&e)).unwrap_err();
        assert_eq!(err, ModelError::DuplicateTemplate("1.B.1.a".into()));

        assert!(reg.create_element("1.B.1.a").is_ok());
        assert!(matches!(
            reg.create_element("9.Z"),
            Err(ModelError::NotFound { kind: "template", .. })
        ));
        assert_eq!(reg.len(), 1);
    }
}
