/// Canonical occupation schema and per-occupation instances.
///
/// The schema is built once from the attached leaf elements and never
/// mutated. Every occupation is a fresh instantiation of it: scale shapes are
/// shared, values are owned per occupation.

use std::collections::BTreeMap;

use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use crate::element::{Element, ElementTemplate, ElementTemplateRegistry};
use crate::error::ModelError;
use crate::scale::ScaleSemantics;
use crate::SCHEMA_VERSION;

#[derive(Debug, Clone, Default)]
pub struct OccupationSchema {
    elements: BTreeMap<String, ElementTemplate>,
}

impl OccupationSchema {
    /// Freeze every element with at least one scale.
    pub fn from_elements<'a, I>(elements: I) -> Self
    where
        I: IntoIterator<Item = &'a Element>,
    {
        let elements = elements
            .into_iter()
            .filter(|e| e.has_scales())
            .map(|e| (e.element_id().to_string(), ElementTemplate::from_element(e)))
            .collect();
        Self { elements }
    }

    pub fn get(&self, element_id: &str) -> Result<&ElementTemplate, ModelError> {
        self.elements
            .get(element_id)
            .ok_or_else(|| ModelError::not_found("element", element_id))
    }

    pub fn templates(&self) -> impl Iterator<Item = &ElementTemplate> {
        self.elements.values()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Number of (element, scale) slots one occupation carries.
    pub fn slot_count(&self) -> usize {
        self.elements.values().map(ElementTemplate::scale_count).sum()
    }

    /// A fresh element set with every value null.
    pub fn instantiate_elements(&self) -> BTreeMap<String, Element> {
        self.elements
            .iter()
            .map(|(id, t)| (id.clone(), t.instantiate()))
            .collect()
    }

    /// Copy the templates into a registry.
    pub fn to_registry(&self) -> Result<ElementTemplateRegistry, ModelError> {
        let mut registry = ElementTemplateRegistry::new();
        for template in self.elements.values() {
            registry.register(template.clone())?;
        }
        Ok(registry)
    }

    /// SHA-256 over the canonical JSON shape. Lowercase hex.
    pub fn fingerprint(&self) -> String {
        let bytes = canonical_bytes(&self.canonical_value());
        hex(&Sha256::digest(&bytes))
    }

    /// Canonical JSON: schema version first, then elements in id order,
    /// scales in id order, categories in key order.
    fn canonical_value(&self) -> Value {
        let mut elements = Vec::with_capacity(self.elements.len());
        for template in self.elements.values() {
            let mut scales = Vec::with_capacity(template.scale_count());
            for shape in template.scales().values() {
                let def = shape.definition();
                let mut m = Map::new();
                m.insert("scale_id".into(), Value::String(def.scale_id.clone()));
                m.insert("scale_name".into(), Value::String(def.scale_name.clone()));
                m.insert("min_value".into(), Value::from(def.min_value));
                m.insert("max_value".into(), Value::from(def.max_value));
                m.insert(
                    "scale_type".into(),
                    Value::String(def.scale_type.as_str().to_string()),
                );
                match shape.semantics() {
                    ScaleSemantics::Ordinal(sem) => {
                        let cats = sem
                            .categories
                            .iter()
                            .map(|(k, label)| {
                                Value::Array(vec![Value::from(*k), Value::String(label.clone())])
                            })
                            .collect();
                        m.insert("categories".into(), Value::Array(cats));
                    }
                    ScaleSemantics::Interval(sem) => {
                        m.insert("meaning".into(), Value::String(sem.meaning.clone()));
                    }
                }
                scales.push(Value::Object(m));
            }

            let mut e = Map::new();
            e.insert(
                "element_id".into(),
                Value::String(template.element_id().to_string()),
            );
            e.insert(
                "element_name".into(),
                Value::String(template.element_name().to_string()),
            );
            e.insert("scales".into(), Value::Array(scales));
            elements.push(Value::Object(e));
        }

        let mut root = Map::new();
        root.insert("schema_version".into(), Value::from(SCHEMA_VERSION));
        root.insert("elements".into(), Value::Array(elements));
        Value::Object(root)
    }
}

fn canonical_bytes(value: &Value) -> Vec<u8> {
    // Serializing a Value built from strings and finite numbers cannot fail.
    serde_json::to_vec(value).unwrap_or_default()
}

/// Lowercase hex encoding.
pub fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

// ---------------------------------------------------------------------------
// Occupation
// ---------------------------------------------------------------------------

/// A concrete occupation profile: the schema's elements with its own values.
#[derive(Debug, Clone, PartialEq)]
pub struct Occupation {
    pub occupation_id: String,
    pub occupation_name: String,
    pub elements: BTreeMap<String, Element>,
}

impl Occupation {
    pub fn from_schema(
        occupation_id: impl Into<String>,
        occupation_name: impl Into<String>,
        schema: &OccupationSchema,
    ) -> Self {
        Self {
            occupation_id: occupation_id.into(),
            occupation_name: occupation_name.into(),
            elements: schema.instantiate_elements(),
        }
    }

    pub fn get_element(&self, element_id: &str) -> Option<&Element> {
        self.elements.get(element_id)
    }

    pub fn get_element_mut(&mut self, element_id: &str) -> Option<&mut Element> {
        self.elements.get_mut(element_id)
    }

    /// Set (or clear, with `None`) one scale value. The value is validated
    /// against the scale's semantics before it is stored.
    pub fn upsert_scale_value(
        &mut self,
        element_id: &str,
        scale_id: &str,
        value: Option<f64>,
    ) -> Result<(), ModelError> {
        let element = self
            .elements
            .get_mut(element_id)
            .ok_or_else(|| ModelError::not_found("element", element_id))?;
        let scale = element
            .get_scale_mut(scale_id)
            .ok_or_else(|| ModelError::not_found("scale", format!("{element_id}/{scale_id}")))?;
        match value {
            Some(v) => scale.set_value(v),
            None => {
                scale.clear();
                Ok(())
            }
        }
    }

    pub fn populated_scales(&self) -> usize {
        self.elements.values().map(Element::populated_scale_count).sum()
    }

    pub fn total_scales(&self) -> usize {
        self.elements.values().map(|e| e.scales().len()).sum()
    }
}
