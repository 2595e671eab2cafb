//! Reference catalog: every lookup table a run needs, built once.
//!
//! The catalog is an explicit, immutable context object. It is loaded from
//! the data directory and handed to whatever needs the hierarchy, the scale
//! definitions or the family bindings; nothing is cached globally.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::info;

use occupation_model::element::Element;
use occupation_model::families::{
    attach_families, collect_anchors, AnchorRow, FamilyReport, ScaleBinding, ScaleFamily,
};
use occupation_model::organization::{leaf_entries, HierarchyEntry, OrganizationRegistry};
use occupation_model::scale::{ScaleDefinition, ScaleType};
use occupation_model::OccupationSchema;

use crate::config::RunConfig;
use crate::error::Result;
use crate::mapping::read_mapping;
use crate::reference::{read_anchors, read_hierarchy, read_scale_reference};
use crate::scale_schema::{read_distribution, read_shape};

pub const FAMILY_ABILITIES: &str = "abilities";
pub const FAMILY_INTERESTS: &str = "interests_work_values";
pub const FAMILY_WORK_STYLES: &str = "work_styles";
pub const FAMILY_SKILLS: &str = "skills_knowledge";
pub const FAMILY_EDUCATION: &str = "education_training";

pub const LEVEL_SCALE_ID: &str = "LV";

/// Id prefixes covered by each family, in catalog order.
pub const FAMILY_PREFIXES: [(&str, &[&str]); 5] = [
    (FAMILY_ABILITIES, &["1.A"]),
    (FAMILY_INTERESTS, &["1.B"]),
    (FAMILY_WORK_STYLES, &["1.D"]),
    (FAMILY_SKILLS, &["2.A", "2.B", "2.C"]),
    (FAMILY_EDUCATION, &["2.D", "3.A"]),
];

/// Level scale used when the scale reference has no `LV` row.
pub fn default_level_definition() -> Result<ScaleDefinition> {
    Ok(ScaleDefinition::new(
        LEVEL_SCALE_ID,
        "Level",
        0.0,
        7.0,
        ScaleType::Ordinal,
    )?)
}

/// The level scale carries anchor categories, so it is ordinal whatever the
/// reference table's classification says.
pub fn level_definition(
    scale_definitions: &BTreeMap<String, ScaleDefinition>,
) -> Result<ScaleDefinition> {
    match scale_definitions.get(LEVEL_SCALE_ID) {
        Some(def) => Ok(ScaleDefinition::new(
            def.scale_id.clone(),
            def.scale_name.clone(),
            def.min_value,
            def.max_value,
            ScaleType::Ordinal,
        )?),
        None => default_level_definition(),
    }
}

#[derive(Debug, Clone)]
pub struct ReferenceCatalog {
    hierarchy: Vec<HierarchyEntry>,
    organizations: OrganizationRegistry,
    scale_definitions: BTreeMap<String, ScaleDefinition>,
    families: Vec<ScaleFamily>,
}

impl ReferenceCatalog {
    /// Assemble a catalog from already-loaded parts.
    pub fn new(
        hierarchy: Vec<HierarchyEntry>,
        scale_definitions: BTreeMap<String, ScaleDefinition>,
        families: Vec<ScaleFamily>,
    ) -> Self {
        let organizations = OrganizationRegistry::from_entries(&hierarchy);
        Self {
            hierarchy,
            organizations,
            scale_definitions,
            families,
        }
    }

    /// Load every reference file named by `config`.
    pub fn load(config: &RunConfig) -> Result<Self> {
        let files = &config.files;

        let hierarchy = read_hierarchy(&config.data_path(&files.hierarchy))?;
        let scale_definitions = match config.scale_reference_path() {
            Some(path) => read_scale_reference(&path)?,
            None => {
                info!("no scale reference table found, using built-in level scale");
                BTreeMap::new()
            }
        };
        let anchors = read_anchors(&config.data_path(&files.anchors))?;
        let level = Arc::new(level_definition(&scale_definitions)?);

        let shape = |name: &str| read_shape(&config.data_path(name));
        let distribution = |name: &str| -> Result<ScaleBinding> {
            let set = read_distribution(&config.data_path(name))?;
            Ok(ScaleBinding::Distribution(set.expand()?))
        };
        let importance = shape(&files.im_schema)?;

        let families = vec![
            ScaleFamily::new(
                FAMILY_ABILITIES,
                prefixes(FAMILY_ABILITIES),
                read_mapping(&config.data_path(&files.mapping_1a))?,
            )
            .bind("IM", ScaleBinding::Universal(importance.clone()))
            .bind(LEVEL_SCALE_ID, anchored(&level, &anchors, FAMILY_ABILITIES)?),
            ScaleFamily::new(
                FAMILY_INTERESTS,
                prefixes(FAMILY_INTERESTS),
                read_mapping(&config.data_path(&files.mapping_1b))?,
            )
            .bind("OI", ScaleBinding::Universal(shape(&files.oi_schema)?))
            .bind("EX", ScaleBinding::Universal(shape(&files.ex_schema)?)),
            ScaleFamily::new(
                FAMILY_WORK_STYLES,
                prefixes(FAMILY_WORK_STYLES),
                read_mapping(&config.data_path(&files.mapping_1d))?,
            )
            .bind("WI", ScaleBinding::Universal(shape(&files.wi_schema)?))
            .bind("DR", ScaleBinding::Universal(shape(&files.dr_schema)?)),
            ScaleFamily::new(
                FAMILY_SKILLS,
                prefixes(FAMILY_SKILLS),
                read_mapping(&config.data_path(&files.mapping_2abc))?,
            )
            .bind("IM", ScaleBinding::Universal(importance.clone()))
            .bind(LEVEL_SCALE_ID, anchored(&level, &anchors, FAMILY_SKILLS)?),
            ScaleFamily::new(
                FAMILY_EDUCATION,
                prefixes(FAMILY_EDUCATION),
                read_mapping(&config.data_path(&files.mapping_2d3a))?,
            )
            .bind("RL", distribution(&files.rl_schema)?)
            .bind("RW", distribution(&files.rw_schema)?)
            .bind("PT", distribution(&files.pt_schema)?)
            .bind("OJ", distribution(&files.oj_schema)?)
            .bind("IM", ScaleBinding::Universal(importance)),
        ];

        let catalog = Self::new(hierarchy, scale_definitions, families);
        info!(
            hierarchy_rows = catalog.hierarchy.len(),
            organizations = catalog.organizations.len(),
            scale_definitions = catalog.scale_definitions.len(),
            families = catalog.families.len(),
            "reference catalog loaded"
        );
        Ok(catalog)
    }

    pub fn organizations(&self) -> &OrganizationRegistry {
        &self.organizations
    }

    pub fn scale_definitions(&self) -> &BTreeMap<String, ScaleDefinition> {
        &self.scale_definitions
    }

    pub fn families(&self) -> &[ScaleFamily] {
        &self.families
    }

    /// Fresh, scale-less leaf elements keyed by id.
    pub fn leaf_elements(&self) -> BTreeMap<String, Element> {
        leaf_entries(&self.hierarchy)
            .into_iter()
            .map(|(id, name)| (id.clone(), Element::new(id, name)))
            .collect()
    }

    /// Attach every family to the leaf set and freeze the result.
    pub fn build_schema(&self) -> Result<(OccupationSchema, Vec<FamilyReport>)> {
        let mut elements = self.leaf_elements();
        let leaves = elements.len();
        let reports = attach_families(&mut elements, &self.families)?;
        let schema = OccupationSchema::from_elements(elements.values());
        for r in &reports {
            info!(
                family = %r.family,
                elements = r.elements_with_scales,
                scales = r.scales_attached,
                unknown_elements = r.unknown_elements,
                "family attached"
            );
        }
        info!(
            leaves,
            elements = schema.len(),
            slots = schema.slot_count(),
            "schema built"
        );
        Ok((schema, reports))
    }
}

fn prefixes(family: &str) -> &'static [&'static str] {
    FAMILY_PREFIXES
        .iter()
        .find(|(name, _)| *name == family)
        .map(|(_, p)| *p)
        .unwrap_or(&[])
}

fn anchored(level: &Arc<ScaleDefinition>, anchors: &[AnchorRow], family: &str) -> Result<ScaleBinding> {
    let by_element = collect_anchors(anchors, LEVEL_SCALE_ID, prefixes(family));
    Ok(ScaleBinding::anchored(level.clone(), by_element)?)
}
