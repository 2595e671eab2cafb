/// Category-distribution scale families.
///
/// A family such as `RL` (Required Level of Education) is measured as the
/// percentage of respondents choosing each category. It expands into one
/// INTERVAL scale per category, `RL-1` .. `RL-12`, each with its own meaning.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::scale::{IntervalSemantics, ScaleDefinition, ScaleShape, ScaleType};

/// Maximum number of label characters kept in an expanded scale name.
pub const LABEL_NAME_LIMIT: usize = 50;

/// Placeholder substituted with the category label in `meaning_template`.
pub const CATEGORY_PLACEHOLDER: &str = "{category}";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryScaleSet {
    #[serde(rename = "scale_id_prefix")]
    pub prefix: String,
    pub scale_name: String,
    pub min_value: f64,
    pub max_value: f64,
    pub meaning_template: String,
    pub categories: BTreeMap<i64, String>,
}

/// `"{prefix}-{category}"`.
pub fn category_scale_id(prefix: &str, category: impl std::fmt::Display) -> String {
    format!("{prefix}-{category}")
}

/// Split `"RL-3"` into `("RL", "3")`. Ids without a dash yield `None`.
pub fn split_category_scale_id(scale_id: &str) -> Option<(&str, &str)> {
    scale_id.split_once('-')
}

impl CategoryScaleSet {
    /// One INTERVAL shape per category, in category order.
    pub fn expand(&self) -> Result<Vec<ScaleShape>, ModelError> {
        let mut shapes = Vec::with_capacity(self.categories.len());
        for (category, label) in &self.categories {
            let short: String = label.chars().take(LABEL_NAME_LIMIT).collect();
            let definition = ScaleDefinition::new(
                category_scale_id(&self.prefix, category),
                format!("{}: {}", self.scale_name, short),
                self.min_value,
                self.max_value,
                ScaleType::Interval,
            )?;
            let meaning = self.meaning_template.replace(CATEGORY_PLACEHOLDER, label);
            shapes.push(ScaleShape::interval(
                Arc::new(definition),
                IntervalSemantics::new(meaning),
            )?);
        }
        Ok(shapes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scale::ScaleSemantics;

    fn education_levels() -> CategoryScaleSet {
        let categories = (1..=12)
            .map(|k| (k, format!("Education category {k}")))
            .collect();
        CategoryScaleSet {
            prefix: "RL".into(),
            scale_name: "Required Level of Education".into(),
            min_value: 0.0,
            max_value: 100.0,
            meaning_template: "Percent of respondents indicating {category}".into(),
            categories,
        }
    }

    #[test]
    fn test_expand_twelve_categories() {
        let shapes = education_levels().expand().unwrap();
        assert_eq!(shapes.len(), 12);
        let ids: Vec<&str> = shapes.iter().map(|s| s.scale_id()).collect();
        let expected: Vec<String> = (1..=12).map(|k| format!("RL-{k}")).collect();
        assert_eq!(ids, expected.iter().map(String::as_str).collect::<Vec<_>>());
        for shape in &shapes {
            assert_eq!(shape.scale_type(), ScaleType::Interval);
            assert_eq!(shape.definition().min_value, 0.0);
            assert_eq!(shape.definition().max_value, 100.0);
        }
        match shapes[2].semantics() {
            ScaleSemantics::Interval(sem) => {
                assert_eq!(sem.meaning, "Percent of respondents indicating Education category 3")
            }
            other => panic!("unexpected semantics {other:?}"),
        }
    }

    #[test]
    fn test_long_label_truncated_in_name_only() {
        let mut set = education_levels();
        let long = "x".repeat(80);
        set.categories = [(1, long.clone())].into_iter().collect();
        let shapes = set.expand().unwrap();
        let name = &shapes[0].definition().scale_name;
        assert_eq!(name, &format!("Required Level of Education: {}", "x".repeat(50)));
        let meaning = &shapes[0].semantics().as_interval().unwrap().meaning;
        assert!(meaning.ends_with(&long));
    }

    #[test]
    fn test_split_category_scale_id() {
        assert_eq!(split_category_scale_id("RW-4"), Some(("RW", "4")));
        assert_eq!(split_category_scale_id("IM"), None);
    }
}
