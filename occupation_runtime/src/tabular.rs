//! Tab- and comma-separated reference tables.
//!
//! All tables have a header row, which is skipped. Rows may have any number
//! of cells; cells are trimmed and a leading byte-order mark is dropped.

use std::path::Path;

use csv::{ReaderBuilder, StringRecord};

use crate::error::{Result, RuntimeError};

/// One data row with its 1-based line number in the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub line: u64,
    pub cells: Vec<String>,
}

impl Row {
    /// Trimmed cell, or `""` when the row is too short.
    pub fn cell(&self, index: usize) -> &str {
        self.cells.get(index).map(String::as_str).unwrap_or("")
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Comma for `.csv` files, tab for everything else.
pub fn delimiter_for(path: &Path) -> u8 {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("csv") => b',',
        _ => b'\t',
    }
}

/// Read a table whose delimiter follows its extension.
pub fn read_table(path: &Path) -> Result<Vec<Row>> {
    read_delimited(path, delimiter_for(path))
}

/// Read every data row of `path`. A missing file is [`RuntimeError::MissingFile`].
pub fn read_delimited(path: &Path, delimiter: u8) -> Result<Vec<Row>> {
    if !path.exists() {
        return Err(RuntimeError::MissingFile(path.to_path_buf()));
    }
    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .quoting(delimiter == b',')
        .from_path(path)
        .map_err(|e| RuntimeError::csv(path, e))?;

    let mut rows = Vec::new();
    let mut record = StringRecord::new();
    loop {
        match reader.read_record(&mut record) {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) => return Err(RuntimeError::csv(path, e)),
        }
        let line = record.position().map(|p| p.line()).unwrap_or(0);
        let cells = record.iter().map(clean_cell).collect();
        rows.push(Row { line, cells });
    }
    Ok(rows)
}

fn clean_cell(raw: &str) -> String {
    raw.trim_start_matches('\u{feff}').trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_delimiter_by_extension() {
        assert_eq!(delimiter_for(Path::new("scales.csv")), b',');
        assert_eq!(delimiter_for(Path::new("scales.CSV")), b',');
        assert_eq!(delimiter_for(Path::new("Scales Reference.txt")), b'\t');
        assert_eq!(delimiter_for(Path::new("noext")), b'\t');
    }

    #[test]
    fn test_read_flexible_rows_with_bom() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mapping.csv");
        fs::write(
            &path,
            "\u{feff}Element ID,Element Name,Scale ID\n 1.A.1.a.1 ,Oral,IM\n1.A.1.a.1\n\"1.B.1,x\",Quoted,OI\n",
        )
        .unwrap();

        let rows = read_table(&path).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].cells, vec!["1.A.1.a.1", "Oral", "IM"]);
        assert_eq!(rows[1].len(), 1);
        assert_eq!(rows[1].cell(2), "");
        assert_eq!(rows[2].cell(0), "1.B.1,x");
        assert_eq!(rows[0].line, 2);
    }

    #[test]
    fn test_missing_file() {
        let err = read_table(Path::new("/nonexistent/Occupation Data.txt")).unwrap_err();
        assert!(matches!(err, RuntimeError::MissingFile(_)));
    }
}
