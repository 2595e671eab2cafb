/// Organization registry: the category nodes of the content-model hierarchy.
///
/// A node is any id present in the hierarchy table that either has children
/// (is a proper prefix of another id) or looks like a category heading (its
/// name equals its description, or the description starts with the name).
/// The heading test is loose; some leaves pass it and are kept as nodes.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::ModelError;
use crate::hierarchy::{leaf_ids, organizations, parent_id};

/// One row of the hierarchy reference table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HierarchyEntry {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
}

impl HierarchyEntry {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        description: Option<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: description.filter(|d| !d.is_empty()),
        }
    }

    fn looks_like_heading(&self) -> bool {
        match &self.description {
            Some(desc) => desc == &self.name || desc.starts_with(&self.name),
            None => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrganizationNode {
    pub id: String,
    pub name: String,
    /// Absent when the table's description repeats the name.
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct OrganizationRegistry {
    nodes: BTreeMap<String, OrganizationNode>,
}

impl OrganizationRegistry {
    /// Build from hierarchy rows. Rows with an empty id or name are ignored;
    /// a repeated id keeps its last row.
    pub fn from_entries(entries: &[HierarchyEntry]) -> Self {
        let mut lookup: BTreeMap<&str, &HierarchyEntry> = BTreeMap::new();
        for entry in entries {
            if entry.id.is_empty() || entry.name.is_empty() {
                continue;
            }
            lookup.insert(entry.id.as_str(), entry);
        }

        let mut candidates: BTreeSet<String> = BTreeSet::new();
        for (id, entry) in &lookup {
            candidates.extend(organizations(id));
            if entry.looks_like_heading() {
                candidates.insert((*id).to_string());
            }
        }

        let nodes = candidates
            .into_iter()
            .filter_map(|id| {
                let entry = lookup.get(id.as_str())?;
                let description = entry
                    .description
                    .clone()
                    .filter(|d| d != &entry.name);
                Some((
                    id.clone(),
                    OrganizationNode {
                        id,
                        name: entry.name.clone(),
                        description,
                    },
                ))
            })
            .collect();

        Self { nodes }
    }

    pub fn get(&self, id: &str) -> Result<&OrganizationNode, ModelError> {
        self.nodes
            .get(id)
            .ok_or_else(|| ModelError::not_found("organization", id))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    /// Direct child nodes, in id order.
    pub fn children(&self, id: &str) -> Vec<&OrganizationNode> {
        self.nodes
            .values()
            .filter(|n| parent_id(&n.id).as_deref() == Some(id))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nodes in id order.
    pub fn iter(&self) -> impl Iterator<Item = &OrganizationNode> {
        self.nodes.values()
    }
}

/// Ids of the measurable leaves in a hierarchy table, with their names.
///
/// Same row filter as [`OrganizationRegistry::from_entries`].
pub fn leaf_entries(entries: &[HierarchyEntry]) -> BTreeMap<String, String> {
    let mut names: BTreeMap<&str, &str> = BTreeMap::new();
    for entry in entries {
        if entry.id.is_empty() || entry.name.is_empty() {
            continue;
        }
        names.insert(entry.id.as_str(), entry.name.as_str());
    }
    leaf_ids(names.keys().copied())
        .into_iter()
        .filter_map(|id| {
            let name = names.get(id.as_str())?.to_string();
            Some((id, name))
        })
        .collect()
}
