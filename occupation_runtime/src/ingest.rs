//! Rating file ingestion.
//!
//! Each rating file is parsed into its own [`RatingMap`] together with a
//! [`ParseReport`]; the per-file maps are then merged under the run's
//! collision policy.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Serialize;
use tracing::{debug, info, warn};

use occupation_model::ratings::{CollisionPolicy, RatingLayout, RatingMap, RowSkip};

use crate::error::Result;
use crate::tabular::read_delimited;

/// Category-distribution scales in the education and training file.
pub const CATEGORY_RATING_SCALES: [&str; 4] = ["RL", "RW", "PT", "OJ"];

/// The built-in rating file catalog.
pub fn default_rating_layouts() -> Vec<RatingLayout> {
    let mut layouts: Vec<RatingLayout> = [
        "Abilities.txt",
        "Skills.txt",
        "Knowledge.txt",
        "Work Styles.txt",
        "Interests.txt",
        "Work Values.txt",
    ]
    .into_iter()
    .map(RatingLayout::standard)
    .collect();
    layouts.push(RatingLayout::categorized(
        "Education, Training, and Experience.txt",
        &CATEGORY_RATING_SCALES,
    ));
    layouts
}

/// Row accounting for one rating file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParseReport {
    pub file_name: String,
    pub rows_read: usize,
    pub accepted: usize,
    pub skipped: BTreeMap<RowSkip, usize>,
}

impl ParseReport {
    pub fn skipped_total(&self) -> usize {
        self.skipped.values().sum()
    }

    pub fn malformed(&self) -> usize {
        self.skipped
            .iter()
            .filter(|(reason, _)| reason.is_malformed())
            .map(|(_, n)| n)
            .sum()
    }
}

/// Parse one rating file from `rating_dir`.
pub fn parse_rating_file(
    layout: &RatingLayout,
    rating_dir: &Path,
    policy: CollisionPolicy,
) -> Result<(RatingMap, ParseReport)> {
    let path = rating_dir.join(&layout.file_name);
    let rows = read_delimited(&path, b'\t')?;

    let mut map = RatingMap::new(policy);
    let mut report = ParseReport {
        file_name: layout.file_name.clone(),
        ..ParseReport::default()
    };

    for row in rows {
        report.rows_read += 1;
        match layout.parse_row(&row.cells) {
            Ok((key, value)) => {
                map.insert(key, value)?;
                report.accepted += 1;
            }
            Err(reason) => {
                if reason.is_malformed() {
                    debug!(file = %layout.file_name, line = row.line, reason = reason.as_str(), "skipping malformed rating row");
                }
                *report.skipped.entry(reason).or_default() += 1;
            }
        }
    }

    info!(
        file = %report.file_name,
        rows = report.rows_read,
        accepted = report.accepted,
        skipped = report.skipped_total(),
        malformed = report.malformed(),
        "rating file parsed"
    );
    Ok((map, report))
}

/// Parse every layout and merge the results in order.
pub fn ingest_ratings(
    layouts: &[RatingLayout],
    rating_dir: &Path,
    policy: CollisionPolicy,
) -> Result<(RatingMap, Vec<ParseReport>)> {
    let mut merged = RatingMap::new(policy);
    let mut reports = Vec::with_capacity(layouts.len());
    for layout in layouts {
        let (map, report) = parse_rating_file(layout, rating_dir, policy)?;
        for (key, previous, value) in merged.merge(map)? {
            warn!(key = %key, previous, value, file = %layout.file_name, "rating overwritten");
        }
        reports.push(report);
    }
    info!(ratings = merged.len(), files = reports.len(), "ratings merged");
    Ok((merged, reports))
}

#[cfg(test)]
mod tests {
    use super::*;
    use occupation_model::ModelError;
    use std::fs;

    use crate::error::RuntimeError;

    const HEADER: &str = "O*NET-SOC Code\tElement ID\tElement Name\tScale ID\tData Value\tN\n";

    #[test]
    fn test_default_catalog() {
        let layouts = default_rating_layouts();
        assert_eq!(layouts.len(), 7);
        assert!(layouts[..6].iter().all(|l| !l.has_category_column && l.value_column == 4));
        let edu = &layouts[6];
        assert!(edu.has_category_column);
        assert_eq!(edu.value_column, 5);
        assert_eq!(edu.category_scales, CATEGORY_RATING_SCALES);
    }

    #[test]
    fn test_parse_report_counts() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("Abilities.txt"),
            format!(
                "{HEADER}\
                 11-1011.00\t1.A.1.a.1\tOral Comprehension\tIM\t4.62\t8\n\
                 11-1011.00\t1.A.1.a.1\tOral Comprehension\tLV\t4.88\t8\n\
                 11-1011.00\t1.A.1.a.2\tWritten Comprehension\tIM\tn/a\t8\n\
                 11-1011.00\t1.A.1.a.2\n\
                 \t1.A.1.a.2\tWritten Comprehension\tIM\t3.0\n"
            ),
        )
        .unwrap();

        let (map, report) = parse_rating_file(
            &RatingLayout::standard("Abilities.txt"),
            dir.path(),
            CollisionPolicy::Reject,
        )
        .unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(report.rows_read, 5);
        assert_eq!(report.accepted, 2);
        assert_eq!(report.skipped[&RowSkip::NotAvailable], 1);
        assert_eq!(report.malformed(), 2);
    }

    #[test]
    fn test_cross_file_duplicate() {
        let dir = tempfile::tempdir().unwrap();
        let row = "11-1011.00\t1.A.1.a.1\tOral Comprehension\tIM\t4.62\n";
        fs::write(dir.path().join("a.txt"), format!("{HEADER}{row}")).unwrap();
        fs::write(
            dir.path().join("b.txt"),
            format!("{HEADER}11-1011.00\t1.A.1.a.1\tOral Comprehension\tIM\t3.10\n"),
        )
        .unwrap();
        let layouts = [RatingLayout::standard("a.txt"), RatingLayout::standard("b.txt")];

        let err = ingest_ratings(&layouts, dir.path(), CollisionPolicy::Reject).unwrap_err();
        assert!(matches!(err, RuntimeError::Model(ModelError::DuplicateRating { .. })));

        let (map, _) = ingest_ratings(&layouts, dir.path(), CollisionPolicy::LastWriteWins).unwrap();
        assert_eq!(map.get("11-1011.00", "1.A.1.a.1", "IM"), Some(3.10));
    }

    #[test]
    fn test_missing_rating_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = parse_rating_file(
            &RatingLayout::standard("Skills.txt"),
            dir.path(),
            CollisionPolicy::Reject,
        )
        .unwrap_err();
        assert!(err.to_string().contains("Skills.txt"));
    }
}
