/// Experience score and the attribute update that consumes it.

use crate::distribution::split_category_scale_id;
use crate::element::Element;

/// Category-distribution prefixes considered by the score.
pub const SCORED_DISTRIBUTION_PREFIXES: [&str; 4] = ["RL", "RW", "PT", "OJ"];

/// Upper bound of capability and preference.
pub const ATTRIBUTE_MAX: u32 = 100;

/// Preference gained per year of experience.
pub const PREFERENCE_PER_YEAR: f64 = 2.0;

/// How much capability one year of work on this element is worth, in `[0, 1]`.
///
/// First match wins:
/// 1. LV and IM set: `LV * IM / 35` (max level 7 times max importance 5)
/// 2. OI set: `OI / 7`
/// 3. EX set: `EX / 7`
/// 4. WI set: `(WI + 3) / 6`
/// 5. any RL/RW/PT/OJ category scale set: highest percentage / 100
/// 6. otherwise `0.5`
///
/// Rule 5 applies as soon as any such scale holds a value, so a distribution
/// whose percentages are all `0.0` scores `0.0` rather than falling back to
/// `0.5`.
pub fn experience_score(element: &Element) -> f64 {
    let raw = raw_score(element);
    raw.clamp(0.0, 1.0)
}

fn raw_score(element: &Element) -> f64 {
    if let (Some(lv), Some(im)) = (element.scale_value("LV"), element.scale_value("IM")) {
        return lv * im / 35.0;
    }
    if let Some(oi) = element.scale_value("OI") {
        return oi / 7.0;
    }
    if let Some(ex) = element.scale_value("EX") {
        return ex / 7.0;
    }
    if let Some(wi) = element.scale_value("WI") {
        return (wi + 3.0) / 6.0;
    }

    let highest = element
        .scales()
        .iter()
        .filter(|(id, _)| {
            split_category_scale_id(id)
                .map(|(prefix, _)| SCORED_DISTRIBUTION_PREFIXES.contains(&prefix))
                .unwrap_or(false)
        })
        .filter_map(|(_, s)| s.value())
        .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |a| a.max(v))));

    match highest {
        Some(pct) => pct / 100.0,
        None => 0.5,
    }
}

/// Years of experience for a job. Unknown duration counts as one year.
///
/// Takes a duration only. Callers holding start and end dates convert them to
/// whole months first; no date arithmetic happens here.
pub fn job_years(duration_months: Option<u32>) -> f64 {
    match duration_months {
        Some(months) => f64::from(months) / 12.0,
        None => 1.0,
    }
}

/// A user's standing on one attribute.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AttributeProgress {
    pub capability: Option<u32>,
    pub preference: Option<u32>,
}

impl AttributeProgress {
    /// Credit `years` of experience at `score`. Both fields saturate at 100.
    pub fn apply_experience(&mut self, years: f64, score: f64) {
        let gained = (years * score).trunc().max(0.0) as u32;
        let liked = (years * PREFERENCE_PER_YEAR).trunc().max(0.0) as u32;
        self.capability = Some(
            self.capability
                .unwrap_or(0)
                .saturating_add(gained)
                .min(ATTRIBUTE_MAX),
        );
        self.preference = Some(
            self.preference
                .unwrap_or(0)
                .saturating_add(liked)
                .min(ATTRIBUTE_MAX),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scale::{
        ElementScale, IntervalSemantics, OrdinalSemantics, ScaleDefinition, ScaleShape, ScaleType,
    };
    use std::sync::Arc;

    fn interval(id: &str, min: f64, max: f64) -> ElementScale {
        let def = ScaleDefinition::new(id, id, min, max, ScaleType::Interval).unwrap();
        ElementScale::new(ScaleShape::interval(Arc::new(def), IntervalSemantics::new(id)).unwrap())
    }

    fn ordinal(id: &str, min: i64, max: i64) -> ElementScale {
        let def = ScaleDefinition::new(id, id, min as f64, max as f64, ScaleType::Ordinal).unwrap();
        let cats = (min..=max).map(|k| (k, format!("{k}"))).collect();
        ElementScale::new(ScaleShape::ordinal(Arc::new(def), OrdinalSemantics::new(cats)).unwrap())
    }

    fn with(element_id: &str, scales: Vec<(ElementScale, Option<f64>)>) -> Element {
        let mut e = Element::new(element_id, element_id);
        for (mut s, v) in scales {
            if let Some(v) = v {
                s.set_rating(v).unwrap();
            }
            e.upsert_scale(s);
        }
        e
    }

    #[test]
    fn test_level_times_importance() {
        let e = with(
            "1.A.1.a.1",
            vec![(ordinal("LV", 0, 7), Some(4.88)), (ordinal("IM", 1, 5), Some(4.62))],
        );
        assert!((experience_score(&e) - 0.644).abs() < 1e-3);
    }

    #[test]
    fn test_importance_without_level_falls_through() {
        let e = with("2.D.4.a", vec![(ordinal("IM", 1, 5), Some(3.0))]);
        assert_eq!(experience_score(&e), 0.5);
    }

    #[test]
    fn test_interest_value_and_style() {
        let oi = with("1.B.1.a", vec![(interval("OI", 1.0, 7.0), Some(3.5))]);
        assert!((experience_score(&oi) - 0.5).abs() < 1e-9);
        let ex = with("1.B.2.a", vec![(interval("EX", 1.0, 7.0), Some(7.0))]);
        assert!((experience_score(&ex) - 1.0).abs() < 1e-9);
        let wi = with("1.D.1.a", vec![(interval("WI", -3.0, 3.0), Some(-3.0))]);
        assert_eq!(experience_score(&wi), 0.0);
    }

    #[test]
    fn test_distribution_max() {
        let e = with(
            "2.D.1",
            vec![
                (interval("RL-1", 0.0, 100.0), Some(12.5)),
                (interval("RL-2", 0.0, 100.0), Some(45.91)),
                (interval("RL-3", 0.0, 100.0), None),
            ],
        );
        assert!((experience_score(&e) - 0.4591).abs() < 1e-9);
    }

    #[test]
    fn test_all_zero_distribution_scores_zero() {
        let e = with(
            "3.A.1",
            vec![
                (interval("RW-1", 0.0, 100.0), Some(0.0)),
                (interval("RW-2", 0.0, 100.0), Some(0.0)),
            ],
        );
        assert_eq!(experience_score(&e), 0.0);
    }

    #[test]
    fn test_unset_element_defaults() {
        let e = with("2.D.1", vec![(interval("RL-1", 0.0, 100.0), None)]);
        assert_eq!(experience_score(&e), 0.5);
        assert_eq!(experience_score(&Element::new("1.A", "Abilities")), 0.5);
    }

    #[test]
    fn test_score_does_not_mutate() {
        let e = with("1.B.1.a", vec![(interval("OI", 1.0, 7.0), Some(3.5))]);
        let before = e.clone();
        let _ = experience_score(&e);
        assert_eq!(e, before);
    }

    #[test]
    fn test_job_years() {
        assert_eq!(job_years(Some(18)), 1.5);
        assert_eq!(job_years(None), 1.0);
    }

    #[test]
    fn test_apply_experience_truncates_and_caps() {
        let mut p = AttributeProgress::default();
        p.apply_experience(10.0, 0.644);
        assert_eq!(p.capability, Some(6));
        assert_eq!(p.preference, Some(20));

        let mut p = AttributeProgress {
            capability: Some(98),
            preference: Some(99),
        };
        p.apply_experience(40.0, 1.0);
        assert_eq!(p.capability, Some(100));
        assert_eq!(p.preference, Some(100));
    }
}
