//! Scale definitions, element-scoped semantics and scale values.
//!
//! A [`ScaleDefinition`] is global metadata shared by every element that
//! uses the scale. Its meaning for one element lives in [`ScaleSemantics`],
//! a sum type: ordinal scales carry category labels, interval scales carry a
//! free-text meaning. [`ScaleShape`] pairs the two and can only be built when
//! they agree, so an ordinal definition never ends up with interval meaning.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// Scale ids whose values are percentages across response categories.
pub const DISTRIBUTION_SCALE_IDS: [&str; 8] = ["CTP", "CXP", "FT", "OJ", "PT", "RL", "RW", "RT"];

// ── Definitions ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScaleType {
    Ordinal,
    Interval,
}

impl ScaleType {
    pub fn as_str(self) -> &'static str {
        match self {
            ScaleType::Ordinal => "ordinal",
            ScaleType::Interval => "interval",
        }
    }
}

/// Classify a scale from the reference table.
///
/// Distribution scales (allowlisted id, range topping out at 100) are a fixed
/// set of labelled categories and count as ordinal; everything else is an
/// interval scale.
pub fn classify_scale(scale_id: &str, max_value: f64) -> ScaleType {
    if max_value == 100.0 && DISTRIBUTION_SCALE_IDS.contains(&scale_id) {
        ScaleType::Ordinal
    } else {
        ScaleType::Interval
    }
}

/// Global, immutable scale metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScaleDefinition {
    pub scale_id: String,
    pub scale_name: String,
    pub min_value: f64,
    pub max_value: f64,
    pub scale_type: ScaleType,
}

impl ScaleDefinition {
    /// Build a definition, rejecting `min_value > max_value`.
    pub fn new(
        scale_id: impl Into<String>,
        scale_name: impl Into<String>,
        min_value: f64,
        max_value: f64,
        scale_type: ScaleType,
    ) -> Result<Self, ModelError> {
        let scale_id = scale_id.into();
        if min_value > max_value || min_value.is_nan() || max_value.is_nan() {
            return Err(ModelError::InvalidScaleRange {
                scale_id,
                min: min_value,
                max: max_value,
            });
        }
        Ok(Self {
            scale_id,
            scale_name: scale_name.into(),
            min_value,
            max_value,
            scale_type,
        })
    }

    /// Inclusive range check.
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min_value && value <= self.max_value
    }
}

// ── Semantics ───────────────────────────────────────────────────────

/// Element-scoped meaning of each ordinal category, e.g. `{1: "Low", 2: "High"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrdinalSemantics {
    pub categories: BTreeMap<i64, String>,
}

impl OrdinalSemantics {
    pub fn new(categories: BTreeMap<i64, String>) -> Self {
        Self { categories }
    }

    pub fn label(&self, category: i64) -> Option<&str> {
        self.categories.get(&category).map(String::as_str)
    }
}

/// Element-scoped meaning of a continuous value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntervalSemantics {
    pub meaning: String,
}

impl IntervalSemantics {
    pub fn new(meaning: impl Into<String>) -> Self {
        Self {
            meaning: meaning.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ScaleSemantics {
    Ordinal(OrdinalSemantics),
    Interval(IntervalSemantics),
}

impl ScaleSemantics {
    pub fn scale_type(&self) -> ScaleType {
        match self {
            ScaleSemantics::Ordinal(_) => ScaleType::Ordinal,
            ScaleSemantics::Interval(_) => ScaleType::Interval,
        }
    }

    pub fn as_ordinal(&self) -> Option<&OrdinalSemantics> {
        match self {
            ScaleSemantics::Ordinal(s) => Some(s),
            ScaleSemantics::Interval(_) => None,
        }
    }

    pub fn as_interval(&self) -> Option<&IntervalSemantics> {
        match self {
            ScaleSemantics::Interval(s) => Some(s),
            ScaleSemantics::Ordinal(_) => None,
        }
    }
}

// ── Shape ───────────────────────────────────────────────────────────

/// Definition plus semantics: the value-less shape of one (element, scale).
///
/// Both halves are reference-counted, so cloning a shape into every entity
/// instance copies two pointers rather than the category tables.
#[derive(Debug, Clone, PartialEq)]
pub struct ScaleShape {
    definition: Arc<ScaleDefinition>,
    semantics: Arc<ScaleSemantics>,
}

impl ScaleShape {
    pub fn new(
        definition: Arc<ScaleDefinition>,
        semantics: Arc<ScaleSemantics>,
    ) -> Result<Self, ModelError> {
        let expected = definition.scale_type;
        let actual = semantics.scale_type();
        if expected != actual {
            return Err(ModelError::semantics(
                &definition.scale_id,
                format!(
                    "{} scale cannot carry {} semantics",
                    expected.as_str(),
                    actual.as_str()
                ),
            ));
        }
        Ok(Self {
            definition,
            semantics,
        })
    }

    pub fn ordinal(
        definition: Arc<ScaleDefinition>,
        semantics: OrdinalSemantics,
    ) -> Result<Self, ModelError> {
        Self::new(definition, Arc::new(ScaleSemantics::Ordinal(semantics)))
    }

    pub fn interval(
        definition: Arc<ScaleDefinition>,
        semantics: IntervalSemantics,
    ) -> Result<Self, ModelError> {
        Self::new(definition, Arc::new(ScaleSemantics::Interval(semantics)))
    }

    pub fn scale_id(&self) -> &str {
        &self.definition.scale_id
    }

    pub fn definition(&self) -> &ScaleDefinition {
        &self.definition
    }

    pub fn semantics(&self) -> &ScaleSemantics {
        &self.semantics
    }

    pub fn scale_type(&self) -> ScaleType {
        self.definition.scale_type
    }

    /// True when both shapes point at the same definition and semantics.
    pub fn shares_metadata_with(&self, other: &ScaleShape) -> bool {
        Arc::ptr_eq(&self.definition, &other.definition)
            && Arc::ptr_eq(&self.semantics, &other.semantics)
    }
}

// ── Values ──────────────────────────────────────────────────────────

/// A value held by an [`ElementScale`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScaleValue {
    /// One exact ordinal category.
    Category(i64),
    /// An aggregated measurement, e.g. the mean rating across respondents.
    Rating(f64),
}

impl ScaleValue {
    pub fn as_f64(self) -> f64 {
        match self {
            ScaleValue::Category(c) => c as f64,
            ScaleValue::Rating(v) => v,
        }
    }
}

/// One (element × scale) measurement slot.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementScale {
    shape: ScaleShape,
    value: Option<ScaleValue>,
    distribution: Option<BTreeMap<i64, f64>>,
}

impl ElementScale {
    /// A null-valued slot with the given shape.
    pub fn new(shape: ScaleShape) -> Self {
        Self {
            shape,
            value: None,
            distribution: None,
        }
    }

    pub fn shape(&self) -> &ScaleShape {
        &self.shape
    }

    pub fn scale_id(&self) -> &str {
        self.shape.scale_id()
    }

    pub fn scale_name(&self) -> &str {
        &self.shape.definition().scale_name
    }

    pub fn definition(&self) -> &ScaleDefinition {
        self.shape.definition()
    }

    pub fn semantics(&self) -> &ScaleSemantics {
        self.shape.semantics()
    }

    pub fn scale_type(&self) -> ScaleType {
        self.shape.scale_type()
    }

    /// Numeric value, `None` when unset.
    pub fn value(&self) -> Option<f64> {
        self.value.map(ScaleValue::as_f64)
    }

    pub fn scale_value(&self) -> Option<ScaleValue> {
        self.value
    }

    pub fn distribution(&self) -> Option<&BTreeMap<i64, f64>> {
        self.distribution.as_ref()
    }

    /// Assign a value from outside the model.
    ///
    /// Ordinal scales accept only an integer that is one of the element's
    /// category keys; interval scales accept any finite number.
    pub fn set_value(&mut self, value: f64) -> Result<(), ModelError> {
        let candidate = match self.shape.semantics() {
            ScaleSemantics::Ordinal(_) => {
                if value.fract() != 0.0 || !value.is_finite() {
                    return Err(ModelError::semantics(
                        self.scale_id(),
                        format!("ordinal value {value} is not an integer category"),
                    ));
                }
                ScaleValue::Category(value as i64)
            }
            ScaleSemantics::Interval(_) => ScaleValue::Rating(value),
        };
        self.assign(candidate)
    }

    /// Assign an aggregated rating (mean across respondents).
    ///
    /// On ordinal scales the mean falls between categories, so only the
    /// shape is checked; range checks belong to the ingestion layer.
    pub fn set_rating(&mut self, value: f64) -> Result<(), ModelError> {
        self.assign(ScaleValue::Rating(value))
    }

    /// Store a per-category distribution alongside the value.
    pub fn set_distribution(&mut self, distribution: BTreeMap<i64, f64>) -> Result<(), ModelError> {
        if let ScaleSemantics::Ordinal(sem) = self.shape.semantics() {
            if let Some(bad) = distribution.keys().find(|k| !sem.categories.contains_key(k)) {
                return Err(ModelError::semantics(
                    self.scale_id(),
                    format!("distribution category {bad} is not defined"),
                ));
            }
        }
        self.distribution = Some(distribution);
        Ok(())
    }

    pub fn clear(&mut self) {
        self.value = None;
        self.distribution = None;
    }

    fn assign(&mut self, candidate: ScaleValue) -> Result<(), ModelError> {
        check_value(&self.shape, candidate)?;
        self.value = Some(candidate);
        Ok(())
    }

    /// Check the slot against its definition and semantics.
    pub fn validate(&self) -> Result<(), ModelError> {
        let def_type = self.shape.definition().scale_type;
        let sem_type = self.shape.semantics().scale_type();
        if def_type != sem_type {
            return Err(ModelError::semantics(
                self.scale_id(),
                format!(
                    "{} scale cannot carry {} semantics",
                    def_type.as_str(),
                    sem_type.as_str()
                ),
            ));
        }
        match self.value {
            Some(v) => check_value(&self.shape, v),
            None => Ok(()),
        }
    }
}

fn check_value(shape: &ScaleShape, value: ScaleValue) -> Result<(), ModelError> {
    match (shape.semantics(), value) {
        (ScaleSemantics::Ordinal(sem), ScaleValue::Category(c)) => {
            if sem.categories.contains_key(&c) {
                Ok(())
            } else {
                Err(ModelError::semantics(
                    shape.scale_id(),
                    format!("ordinal value {c} not found in categories"),
                ))
            }
        }
        (ScaleSemantics::Interval(_), ScaleValue::Category(c)) => Err(ModelError::semantics(
            shape.scale_id(),
            format!("interval scale cannot hold category {c}"),
        )),
        (_, ScaleValue::Rating(v)) if !v.is_finite() => Err(ModelError::semantics(
            shape.scale_id(),
            format!("rating {v} is not a finite number"),
        )),
        (_, ScaleValue::Rating(_)) => Ok(()),
    }
}
