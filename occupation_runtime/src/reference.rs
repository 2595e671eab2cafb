//! Readers for the flat reference tables: content-model hierarchy, scale
//! reference, anchors and the occupation list.

use std::collections::BTreeMap;
use std::path::Path;

use tracing::debug;

use occupation_model::families::AnchorRow;
use occupation_model::organization::HierarchyEntry;
use occupation_model::scale::{classify_scale, ScaleDefinition};

use crate::error::Result;
use crate::tabular::{read_delimited, read_table};

/// Minimum assumed when the table's min cell is empty or not a number.
pub const DEFAULT_SCALE_MIN: f64 = 0.0;
/// Maximum assumed when the table's max cell is empty or not a number.
pub const DEFAULT_SCALE_MAX: f64 = 100.0;

/// `[id, name, description]`, tab-separated. Rows without id or name are dropped.
pub fn read_hierarchy(path: &Path) -> Result<Vec<HierarchyEntry>> {
    let rows = read_delimited(path, b'\t')?;
    let mut entries = Vec::with_capacity(rows.len());
    for row in rows {
        let (id, name) = (row.cell(0), row.cell(1));
        if id.is_empty() || name.is_empty() {
            debug!(line = row.line, path = %path.display(), "skipping hierarchy row without id or name");
            continue;
        }
        let description = (row.len() > 2).then(|| row.cell(2).to_string());
        entries.push(HierarchyEntry::new(id, name, description));
    }
    Ok(entries)
}

/// `[scale_id, scale_name, min, max]`, delimiter by extension. Rows whose
/// range is inverted are dropped.
pub fn read_scale_reference(path: &Path) -> Result<BTreeMap<String, ScaleDefinition>> {
    let mut defs = BTreeMap::new();
    for row in read_table(path)? {
        if row.len() < 4 {
            debug!(line = row.line, path = %path.display(), "skipping short scale row");
            continue;
        }
        let scale_id = row.cell(0);
        if scale_id.is_empty() {
            continue;
        }
        let min = parse_or(row.cell(2), DEFAULT_SCALE_MIN);
        let max = parse_or(row.cell(3), DEFAULT_SCALE_MAX);
        match ScaleDefinition::new(scale_id, row.cell(1), min, max, classify_scale(scale_id, max)) {
            Ok(def) => {
                defs.insert(scale_id.to_string(), def);
            }
            Err(e) => {
                debug!(line = row.line, path = %path.display(), error = %e, "skipping invalid scale row");
            }
        }
    }
    Ok(defs)
}

fn parse_or(cell: &str, default: f64) -> f64 {
    cell.parse().unwrap_or(default)
}

/// `[element_id, element_name, scale_id, anchor_value, anchor_description]`.
/// Rows whose anchor value is not an integer are dropped.
pub fn read_anchors(path: &Path) -> Result<Vec<AnchorRow>> {
    let mut anchors = Vec::new();
    for row in read_delimited(path, b'\t')? {
        if row.len() < 5 {
            continue;
        }
        let Ok(anchor_value) = row.cell(3).parse::<i64>() else {
            debug!(line = row.line, value = row.cell(3), "skipping non-integer anchor");
            continue;
        };
        anchors.push(AnchorRow {
            element_id: row.cell(0).to_string(),
            scale_id: row.cell(2).to_string(),
            anchor_value,
            description: row.cell(4).to_string(),
        });
    }
    Ok(anchors)
}

/// One row of the occupation list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OccupationListing {
    pub occupation_id: String,
    pub name: String,
    pub description: String,
}

/// `[entity_id, name, description]`. Rows without id or name are dropped.
pub fn read_occupation_list(path: &Path) -> Result<Vec<OccupationListing>> {
    let mut list = Vec::new();
    for row in read_delimited(path, b'\t')? {
        let (id, name) = (row.cell(0), row.cell(1));
        if id.is_empty() || name.is_empty() {
            continue;
        }
        list.push(OccupationListing {
            occupation_id: id.to_string(),
            name: name.to_string(),
            description: row.cell(2).to_string(),
        });
    }
    Ok(list)
}
