//! Per-scale JSON schema files.
//!
//! Three shapes are accepted:
//!
//! ```json
//! {"scale_id": "IM", "scale_name": "Importance", "min_value": 1, "max_value": 5,
//!  "categories": {"1": "Not Important", "5": "Extremely Important"}}
//! {"scale_id": "WI", "scale_name": "Work Styles Impact", "min_value": -3, "max_value": 3,
//!  "meaning": "..."}
//! {"scale_id_prefix": "RL", "scale_name": "Required Level of Education",
//!  "min_value": 0, "max_value": 100, "meaning_template": "... {category} ...",
//!  "categories": {"1": "Less than a High School Diploma", ...}}
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;

use occupation_model::distribution::CategoryScaleSet;
use occupation_model::scale::{
    IntervalSemantics, OrdinalSemantics, ScaleDefinition, ScaleShape, ScaleType,
};

use crate::error::{Result, RuntimeError};

#[derive(Debug, Clone, Deserialize)]
struct OrdinalScaleFile {
    scale_id: String,
    scale_name: String,
    min_value: f64,
    max_value: f64,
    categories: BTreeMap<i64, String>,
}

#[derive(Debug, Clone, Deserialize)]
struct IntervalScaleFile {
    scale_id: String,
    scale_name: String,
    min_value: f64,
    max_value: f64,
    meaning: String,
}

enum ScaleSchemaFile {
    Distribution(CategoryScaleSet),
    Ordinal(OrdinalScaleFile),
    Interval(IntervalScaleFile),
}

impl ScaleSchemaFile {
    /// Pick the layout by its distinguishing key. Integer category keys are
    /// decoded through `Value`, which accepts them as strings.
    fn from_value(value: Value) -> serde_json::Result<Self> {
        let has = |key: &str| value.get(key).is_some();
        if has("scale_id_prefix") {
            serde_json::from_value(value).map(ScaleSchemaFile::Distribution)
        } else if has("categories") {
            serde_json::from_value(value).map(ScaleSchemaFile::Ordinal)
        } else {
            serde_json::from_value(value).map(ScaleSchemaFile::Interval)
        }
    }
}

/// A parsed schema file.
#[derive(Debug, Clone)]
pub enum ScaleSchema {
    Shape(ScaleShape),
    Distribution(CategoryScaleSet),
}

impl ScaleSchema {
    pub fn read(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(RuntimeError::MissingFile(path.to_path_buf()));
        }
        let text = fs::read_to_string(path).map_err(|e| RuntimeError::io(path, e))?;
        let file = serde_json::from_str::<Value>(&text)
            .and_then(ScaleSchemaFile::from_value)
            .map_err(|e| RuntimeError::json(path, e))?;
        Ok(match file {
            ScaleSchemaFile::Distribution(set) => ScaleSchema::Distribution(set),
            ScaleSchemaFile::Ordinal(f) => {
                let def = ScaleDefinition::new(
                    f.scale_id,
                    f.scale_name,
                    f.min_value,
                    f.max_value,
                    ScaleType::Ordinal,
                )?;
                ScaleSchema::Shape(ScaleShape::ordinal(
                    Arc::new(def),
                    OrdinalSemantics::new(f.categories),
                )?)
            }
            ScaleSchemaFile::Interval(f) => {
                let def = ScaleDefinition::new(
                    f.scale_id,
                    f.scale_name,
                    f.min_value,
                    f.max_value,
                    ScaleType::Interval,
                )?;
                ScaleSchema::Shape(ScaleShape::interval(
                    Arc::new(def),
                    IntervalSemantics::new(f.meaning),
                )?)
            }
        })
    }
}

/// Read a single-scale schema (ordinal or interval).
pub fn read_shape(path: &Path) -> Result<ScaleShape> {
    match ScaleSchema::read(path)? {
        ScaleSchema::Shape(shape) => Ok(shape),
        ScaleSchema::Distribution(_) => Err(RuntimeError::UnexpectedSchema {
            path: path.to_path_buf(),
            expected: "single scale",
        }),
    }
}

/// Read a category-distribution schema.
pub fn read_distribution(path: &Path) -> Result<CategoryScaleSet> {
    match ScaleSchema::read(path)? {
        ScaleSchema::Distribution(set) => Ok(set),
        ScaleSchema::Shape(_) => Err(RuntimeError::UnexpectedSchema {
            path: path.to_path_buf(),
            expected: "category distribution",
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use occupation_model::scale::ScaleSemantics;

    fn write(dir: &Path, name: &str, body: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn test_ordinal_schema() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            "occupation_scale_im_schema.json",
            r#"{"scale_id": "IM", "scale_name": "Importance", "min_value": 1, "max_value": 5,
                "categories": {"1": "Not Important", "3": "Important", "5": "Extremely Important"}}"#,
        );
        let shape = read_shape(&path).unwrap();
        assert_eq!(shape.scale_type(), ScaleType::Ordinal);
        match shape.semantics() {
            ScaleSemantics::Ordinal(sem) => assert_eq!(sem.label(3), Some("Important")),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_interval_schema() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            "occupation_scale_wi_schema.json",
            r#"{"scale_id": "WI", "scale_name": "Work Styles Impact", "min_value": -3.0,
                "max_value": 3.0, "meaning": "Impact on job performance"}"#,
        );
        let shape = read_shape(&path).unwrap();
        assert_eq!(shape.scale_type(), ScaleType::Interval);
        assert_eq!(shape.definition().min_value, -3.0);
    }

    #[test]
    fn test_distribution_schema() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            "occupation_scale_pt_schema.json",
            r#"{"scale_id_prefix": "PT", "scale_name": "On-Site or In-Plant Training",
                "min_value": 0, "max_value": 100,
                "meaning_template": "Percent reporting {category}",
                "categories": {"1": "None", "2": "Up to 1 month"}}"#,
        );
        let set = read_distribution(&path).unwrap();
        assert_eq!(set.categories.len(), 2);
        assert!(matches!(
            read_shape(&path),
            Err(RuntimeError::UnexpectedSchema { .. })
        ));
    }

    #[test]
    fn test_inverted_range_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            "bad.json",
            r#"{"scale_id": "OI", "scale_name": "Interest", "min_value": 7, "max_value": 1,
                "meaning": "x"}"#,
        );
        assert!(matches!(read_shape(&path), Err(RuntimeError::Model(_))));
    }
}
