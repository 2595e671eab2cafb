//! Population run: reference data in, populated snapshot out.
//!
//! Stage order:
//!   1. Load the reference catalog and build the schema
//!   2. Instantiate one occupation per occupation list row
//!   3. Parse and merge every rating file
//!   4. Populate, then write the snapshot
//!
//! Each stage fails the whole run on error; nothing is written until the
//! population step has succeeded.

use std::collections::BTreeMap;
use std::path::PathBuf;

use tracing::{info, warn};

use occupation_model::families::FamilyReport;
use occupation_model::populate::{populate, PopulationStats};
use occupation_model::{Occupation, OccupationSchema};

use crate::catalog::ReferenceCatalog;
use crate::config::RunConfig;
use crate::error::Result;
use crate::ingest::{ingest_ratings, ParseReport};
use crate::reference::read_occupation_list;
use crate::snapshot::{save_snapshot, SnapshotSummary};

/// Everything a finished run produced.
#[derive(Debug)]
pub struct RunOutput {
    pub schema: OccupationSchema,
    pub occupations: BTreeMap<String, Occupation>,
    pub families: Vec<FamilyReport>,
    pub parse_reports: Vec<ParseReport>,
    pub stats: PopulationStats,
    pub snapshot: SnapshotSummary,
    pub output_dir: PathBuf,
}

/// One fresh occupation per listed id. A repeated id keeps the later row.
pub fn instantiate_occupations(
    config: &RunConfig,
    schema: &OccupationSchema,
) -> Result<BTreeMap<String, Occupation>> {
    let listing = read_occupation_list(&config.data_path(&config.files.occupations))?;
    let mut occupations = BTreeMap::new();
    for row in listing {
        let occupation = Occupation::from_schema(row.occupation_id.as_str(), row.name.as_str(), schema);
        if occupations.insert(row.occupation_id.clone(), occupation).is_some() {
            warn!(occupation_id = %row.occupation_id, "occupation listed twice, keeping the later row");
        }
    }
    info!(
        occupations = occupations.len(),
        slots_each = schema.slot_count(),
        "occupations instantiated"
    );
    Ok(occupations)
}

/// Execute a full population run.
pub fn run(config: &RunConfig) -> Result<RunOutput> {
    info!(
        data_dir = %config.data_dir.display(),
        policy = ?config.collision_policy,
        "population run starting"
    );

    let catalog = ReferenceCatalog::load(config)?;
    let (schema, families) = catalog.build_schema()?;
    let mut occupations = instantiate_occupations(config, &schema)?;

    let (ratings, parse_reports) = ingest_ratings(
        &config.rating_layouts(),
        &config.rating_dir(),
        config.collision_policy,
    )?;

    let outcome = populate(&mut occupations, &ratings)?;
    for r in &outcome.rejected {
        warn!(key = %r.key, value = r.value, min = r.min, max = r.max, "rating out of scale range");
    }
    if !outcome.unmatched_entities.is_empty() {
        warn!(
            entities = outcome.unmatched_entities.len(),
            ratings = outcome.stats.unmatched,
            "ratings for occupations not in the occupation list"
        );
    }
    let stats = outcome.stats;
    info!(
        entities = stats.total_entities,
        total_possible = stats.total_possible,
        populated = stats.populated,
        missing = stats.missing,
        out_of_range = stats.out_of_range,
        coverage_pct = stats.coverage_pct(),
        "population complete"
    );

    let output_dir = config.output_dir();
    let snapshot = save_snapshot(&output_dir, &schema, &occupations, &stats)?;

    Ok(RunOutput {
        schema,
        occupations,
        families,
        parse_reports,
        stats,
        snapshot,
        output_dir,
    })
}
