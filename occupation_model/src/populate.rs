/// Population: write the unified rating map into occupation instances.
///
/// Every (occupation, element, scale) slot of the schema is visited exactly
/// once. A rating inside the scale's range is stored; anything else leaves the
/// slot null. The counters always satisfy `populated + missing == total_possible`.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::ratings::{RatingKey, RatingMap};
use crate::schema::Occupation;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PopulationStats {
    pub total_entities: usize,
    pub total_possible: usize,
    pub populated: usize,
    /// Slots left null, including the out-of-range ones.
    pub missing: usize,
    pub out_of_range: usize,
    /// Ratings whose entity id is not a known occupation.
    pub unmatched: usize,
}

impl PopulationStats {
    /// Populated share of all slots, in percent. Zero when there are no slots.
    pub fn coverage_pct(&self) -> f64 {
        if self.total_possible == 0 {
            return 0.0;
        }
        self.populated as f64 * 100.0 / self.total_possible as f64
    }

    pub fn is_consistent(&self) -> bool {
        self.populated + self.missing == self.total_possible && self.out_of_range <= self.missing
    }
}

/// A rating that matched a slot but fell outside the scale range.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeRejection {
    pub key: RatingKey,
    pub value: f64,
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PopulationOutcome {
    pub stats: PopulationStats,
    pub rejected: Vec<RangeRejection>,
    /// Entity ids present in the ratings but not among the occupations.
    pub unmatched_entities: BTreeSet<String>,
}

/// Apply `ratings` to `occupations` in place.
pub fn populate(
    occupations: &mut BTreeMap<String, Occupation>,
    ratings: &RatingMap,
) -> Result<PopulationOutcome, ModelError> {
    let mut outcome = PopulationOutcome::default();
    let stats = &mut outcome.stats;
    stats.total_entities = occupations.len();

    for (occupation_id, occupation) in occupations.iter_mut() {
        for (element_id, element) in occupation.elements.iter_mut() {
            for (scale_id, scale) in element.scales_mut() {
                stats.total_possible += 1;
                let Some(value) = ratings.get(occupation_id, element_id, scale_id) else {
                    stats.missing += 1;
                    continue;
                };
                let def = scale.definition();
                if !def.contains(value) {
                    outcome.rejected.push(RangeRejection {
                        key: RatingKey::new(occupation_id.as_str(), element_id.as_str(), scale_id.as_str()),
                        value,
                        min: def.min_value,
                        max: def.max_value,
                    });
                    stats.out_of_range += 1;
                    stats.missing += 1;
                    continue;
                }
                scale.set_rating(value)?;
                stats.populated += 1;
            }
        }
    }

    for (entity_id, count) in ratings.entities() {
        if !occupations.contains_key(entity_id) {
            stats.unmatched += count;
            outcome.unmatched_entities.insert(entity_id.to_string());
        }
    }

    Ok(outcome)
}
