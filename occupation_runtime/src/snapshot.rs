//! Snapshot layer: persisted population results.
//!
//! A snapshot directory holds `occupations.bin` (protobuf frames, see
//! [`crate::snapshot_store`]) and `summary.json`. The summary binds the
//! payload to the schema that produced it through the schema fingerprint and
//! the SHA-256 of the payload bytes.
//!
//! No timestamps in snapshot content (determinism).

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::info;

use occupation_model::populate::PopulationStats;
use occupation_model::schema::hex;
use occupation_model::{Occupation, OccupationSchema, SCHEMA_VERSION};

use crate::error::{Result, RuntimeError};
use crate::proto_bridge::{occupation_to_proto, proto_to_occupation};
use crate::snapshot_store::{decode_frames, read_payload, write_frames};

pub const PAYLOAD_FILE: &str = "occupations.bin";
pub const SUMMARY_FILE: &str = "summary.json";

/// `summary.json` on-disk format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotSummary {
    pub schema_version: u32,
    pub schema_fingerprint: String,
    /// SHA-256 of `occupations.bin`.
    pub payload_sha256: String,
    pub stats: PopulationStats,
    pub occupations: BTreeMap<String, OccupationSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OccupationSummary {
    pub name: String,
    pub element_count: usize,
    pub populated_scales: usize,
    pub total_scales: usize,
}

impl OccupationSummary {
    pub fn of(occupation: &Occupation) -> Self {
        Self {
            name: occupation.occupation_name.clone(),
            element_count: occupation.elements.len(),
            populated_scales: occupation.populated_scales(),
            total_scales: occupation.total_scales(),
        }
    }
}

/// Write a snapshot of `occupations` into `dir`.
pub fn save_snapshot(
    dir: &Path,
    schema: &OccupationSchema,
    occupations: &BTreeMap<String, Occupation>,
    stats: &PopulationStats,
) -> Result<SnapshotSummary> {
    fs::create_dir_all(dir).map_err(|e| RuntimeError::io(dir, e))?;

    let frames: Vec<_> = occupations.values().map(occupation_to_proto).collect();
    let payload = write_frames(&dir.join(PAYLOAD_FILE), &frames)?;

    let summary = SnapshotSummary {
        schema_version: SCHEMA_VERSION,
        schema_fingerprint: schema.fingerprint(),
        payload_sha256: sha256_hex(&payload),
        stats: stats.clone(),
        occupations: occupations
            .iter()
            .map(|(id, occ)| (id.clone(), OccupationSummary::of(occ)))
            .collect(),
    };

    let path = dir.join(SUMMARY_FILE);
    let content = serde_json::to_vec_pretty(&summary).map_err(|e| RuntimeError::json(&path, e))?;
    let mut file = File::create(&path).map_err(|e| RuntimeError::io(&path, e))?;
    file.write_all(&content).map_err(|e| RuntimeError::io(&path, e))?;
    file.sync_all().map_err(|e| RuntimeError::io(&path, e))?;

    info!(
        dir = %dir.display(),
        occupations = summary.occupations.len(),
        payload_bytes = payload.len(),
        "snapshot written"
    );
    Ok(summary)
}

/// Read `summary.json` without touching the payload.
pub fn read_summary(dir: &Path) -> Result<SnapshotSummary> {
    let path = dir.join(SUMMARY_FILE);
    if !path.exists() {
        return Err(RuntimeError::MissingFile(path));
    }
    let content = fs::read(&path).map_err(|e| RuntimeError::io(&path, e))?;
    serde_json::from_slice(&content).map_err(|e| RuntimeError::json(&path, e))
}

/// Check the payload against the summary's hash. Returns the payload bytes.
pub fn verify_payload(dir: &Path, summary: &SnapshotSummary) -> Result<Vec<u8>> {
    let payload = read_payload(&dir.join(PAYLOAD_FILE))?;
    let computed = sha256_hex(&payload);
    if computed != summary.payload_sha256 {
        return Err(RuntimeError::integrity(format!(
            "payload hash mismatch: summary has {}, file hashes to {computed}",
            summary.payload_sha256
        )));
    }
    Ok(payload)
}

/// Load a snapshot and restore its occupations into fresh instances of
/// `schema`. Fails unless the schema version, schema fingerprint, payload
/// hash and occupation list all agree with the summary.
pub fn load_snapshot(
    dir: &Path,
    schema: &OccupationSchema,
) -> Result<(SnapshotSummary, BTreeMap<String, Occupation>)> {
    let summary = read_summary(dir)?;
    if summary.schema_version != SCHEMA_VERSION {
        return Err(RuntimeError::integrity(format!(
            "snapshot schema version {} is not {SCHEMA_VERSION}",
            summary.schema_version
        )));
    }
    let fingerprint = schema.fingerprint();
    if summary.schema_fingerprint != fingerprint {
        return Err(RuntimeError::integrity(format!(
            "snapshot was written for schema {}, current schema is {fingerprint}",
            summary.schema_fingerprint
        )));
    }

    let payload = verify_payload(dir, &summary)?;
    let mut occupations = BTreeMap::new();
    for frame in decode_frames(&payload)? {
        let occupation = proto_to_occupation(&frame, schema)?;
        occupations.insert(occupation.occupation_id.clone(), occupation);
    }

    let restored: Vec<&String> = occupations.keys().collect();
    let listed: Vec<&String> = summary.occupations.keys().collect();
    if restored != listed {
        return Err(RuntimeError::integrity(format!(
            "payload holds {} occupations, summary lists {}",
            restored.len(),
            listed.len()
        )));
    }

    info!(dir = %dir.display(), occupations = occupations.len(), "snapshot loaded");
    Ok((summary, occupations))
}

fn sha256_hex(bytes: &[u8]) -> String {
    hex(&Sha256::digest(bytes))
}
