//! Element-to-scale mapping files.

use std::path::Path;

use tracing::debug;

use occupation_model::families::ElementScaleMapping;

use crate::error::Result;
use crate::tabular::read_table;

/// `[element_id, element_name, scale_id, scale_name]`. Rows with fewer than
/// three cells or an empty element or scale id are skipped.
pub fn read_mapping(path: &Path) -> Result<ElementScaleMapping> {
    let mut mapping = ElementScaleMapping::new();
    let mut skipped = 0usize;
    for row in read_table(path)? {
        if row.len() < 3 || row.cell(0).is_empty() || row.cell(2).is_empty() {
            skipped += 1;
            continue;
        }
        mapping.insert(row.cell(0), row.cell(2));
    }
    debug!(
        path = %path.display(),
        elements = mapping.len(),
        skipped,
        "read element scale mapping"
    );
    Ok(mapping)
}
