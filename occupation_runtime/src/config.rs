//! Run configuration.
//!
//! ```toml
//! data_dir = "data"
//! output_dir = "out"
//! collision_policy = "last_write_wins"
//!
//! [files]
//! occupations = "Occupation Data.txt"
//! mapping_2abc = "job_element_scale_mapping_2ABC.csv"
//! ```
//!
//! Every field is optional. Relative paths resolve against the working
//! directory.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use occupation_model::ratings::{CollisionPolicy, RatingLayout};

use crate::error::{Result, RuntimeError};

/// Scale reference table names, in lookup order.
pub const SCALE_REFERENCE_CANDIDATES: [&str; 2] = ["job_scale_def.csv", "job_scale_reference.txt"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    pub data_dir: PathBuf,
    /// Defaults to `<data_dir>/occupation_rating`.
    pub rating_dir: Option<PathBuf>,
    /// Defaults to `<data_dir>/initialized`.
    pub output_dir: Option<PathBuf>,
    pub collision_policy: CollisionPolicy,
    pub files: ReferenceFiles,
    /// Replaces the built-in rating file catalog when set.
    pub rating_files: Option<Vec<RatingLayout>>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            rating_dir: None,
            output_dir: None,
            collision_policy: CollisionPolicy::Reject,
            files: ReferenceFiles::default(),
            rating_files: None,
        }
    }
}

impl RunConfig {
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Self::default()
        }
    }

    pub fn from_toml_str(text: &str, origin: &Path) -> Result<Self> {
        toml::from_str(text).map_err(|source| RuntimeError::Config {
            path: origin.to_path_buf(),
            source,
        })
    }

    pub fn from_toml_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(RuntimeError::MissingFile(path.to_path_buf()));
        }
        let text = fs::read_to_string(path).map_err(|e| RuntimeError::io(path, e))?;
        Self::from_toml_str(&text, path)
    }

    pub fn rating_dir(&self) -> PathBuf {
        self.rating_dir
            .clone()
            .unwrap_or_else(|| self.data_dir.join("occupation_rating"))
    }

    pub fn output_dir(&self) -> PathBuf {
        self.output_dir
            .clone()
            .unwrap_or_else(|| self.data_dir.join("initialized"))
    }

    /// `name` under the data directory.
    pub fn data_path(&self, name: &str) -> PathBuf {
        self.data_dir.join(name)
    }

    /// The scale reference table, if one exists. Its absence is not an error:
    /// the level scale then falls back to its built-in definition.
    pub fn scale_reference_path(&self) -> Option<PathBuf> {
        match &self.files.scale_reference {
            Some(name) => Some(self.data_path(name)).filter(|p| p.exists()),
            None => SCALE_REFERENCE_CANDIDATES
                .iter()
                .map(|name| self.data_path(name))
                .find(|p| p.exists()),
        }
    }

    pub fn rating_layouts(&self) -> Vec<RatingLayout> {
        self.rating_files
            .clone()
            .unwrap_or_else(crate::ingest::default_rating_layouts)
    }
}

/// File names of every reference input, relative to `data_dir`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReferenceFiles {
    pub hierarchy: String,
    /// Unset means the first of [`SCALE_REFERENCE_CANDIDATES`] that exists.
    pub scale_reference: Option<String>,
    pub anchors: String,
    pub occupations: String,
    pub mapping_1a: String,
    pub mapping_1b: String,
    pub mapping_1d: String,
    pub mapping_2abc: String,
    pub mapping_2d3a: String,
    pub im_schema: String,
    pub oi_schema: String,
    pub ex_schema: String,
    pub wi_schema: String,
    pub dr_schema: String,
    pub rl_schema: String,
    pub rw_schema: String,
    pub pt_schema: String,
    pub oj_schema: String,
}

impl Default for ReferenceFiles {
    fn default() -> Self {
        Self {
            hierarchy: "Content Model Reference.txt".into(),
            scale_reference: None,
            anchors: "Level Scale Anchors.txt".into(),
            occupations: "Occupation Data.txt".into(),
            mapping_1a: "occupation_element_scale_mapping_1A.csv".into(),
            mapping_1b: "occupation_element_scale_mapping_1B.csv".into(),
            mapping_1d: "occupation_element_scale_mapping_1D.csv".into(),
            mapping_2abc: "job_element_scale_mapping_2ABC.csv".into(),
            mapping_2d3a: "occupation_element_scale_mapping_2D3A.csv".into(),
            im_schema: "occupation_scale_im_schema.json".into(),
            oi_schema: "occupation_scale_oi_schema.json".into(),
            ex_schema: "occupation_scale_ex_schema.json".into(),
            wi_schema: "occupation_scale_wi_schema.json".into(),
            dr_schema: "occupation_scale_dr_schema.json".into(),
            rl_schema: "occupation_scale_rl_schema.json".into(),
            rw_schema: "occupation_scale_rw_schema.json".into(),
            pt_schema: "occupation_scale_pt_schema.json".into(),
            oj_schema: "occupation_scale_oj_schema.json".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = RunConfig::with_data_dir("/srv/onet");
        assert_eq!(cfg.rating_dir(), PathBuf::from("/srv/onet/occupation_rating"));
        assert_eq!(cfg.output_dir(), PathBuf::from("/srv/onet/initialized"));
        assert_eq!(cfg.collision_policy, CollisionPolicy::Reject);
        assert_eq!(cfg.rating_layouts().len(), 7);
    }

    #[test]
    fn test_toml_overrides() {
        let text = r#"
            data_dir = "/srv/onet"
            output_dir = "/tmp/out"
            collision_policy = "last_write_wins"

            [files]
            occupations = "occupations.tsv"

            [[rating_files]]
            file_name = "Abilities.txt"
            value_column = 4
        "#;
        let cfg = RunConfig::from_toml_str(text, Path::new("run.toml")).unwrap();
        assert_eq!(cfg.output_dir(), PathBuf::from("/tmp/out"));
        assert_eq!(cfg.collision_policy, CollisionPolicy::LastWriteWins);
        assert_eq!(cfg.files.occupations, "occupations.tsv");
        assert_eq!(cfg.files.hierarchy, "Content Model Reference.txt");
        let layouts = cfg.rating_layouts();
        assert_eq!(layouts.len(), 1);
        assert!(!layouts[0].has_category_column);
    }

    #[test]
    fn test_unknown_key_rejected() {
        let err = RunConfig::from_toml_str("data_dri = \"x\"", Path::new("run.toml")).unwrap_err();
        assert!(matches!(err, RuntimeError::Config { .. }));
    }

    #[test]
    fn test_scale_reference_lookup() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = RunConfig::with_data_dir(dir.path());
        assert_eq!(cfg.scale_reference_path(), None);
        std::fs::write(dir.path().join("job_scale_reference.txt"), "h\n").unwrap();
        assert_eq!(
            cfg.scale_reference_path(),
            Some(dir.path().join("job_scale_reference.txt"))
        );
    }
}
