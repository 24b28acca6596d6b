use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::scene::scene_model::BehaviorType;

/// The single category every project-authored script falls under.
pub const USER_SCRIPTS: &str = "User Created Scripts";

/// Per-category on/off switch consulted before showing a candidate.
pub trait CategoryFilter {
    fn get(&self, category: &str) -> bool;

    fn set(&mut self, category: &str, enabled: bool);

    fn all_categories(&self) -> BTreeSet<String>;

    /// Make the categories of these types known. Existing switches keep
    /// their value.
    fn register_types(&mut self, types: &[BehaviorType]);
}

/// Categories offered for a set of declared types: every built-in type that
/// can hold a reference, plus the user-script bucket.
pub fn categories_for(types: &[BehaviorType]) -> BTreeSet<String> {
    let mut out: BTreeSet<String> = types
        .iter()
        .filter(|t| !t.user_authored && t.has_object_references)
        .map(|t| t.name.clone())
        .collect();
    out.insert(USER_SCRIPTS.to_string());
    out
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read category settings '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write category settings '{path}': {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid category settings '{path}': {source}")]
    Yaml {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
}

// ============================================================================
// Persisted settings
// ============================================================================

/// Category switches persisted as a YAML map.
///
/// Defaults to only user-authored scripts switched on. A category that was
/// never set reads as off. Only categories of registered types are offered;
/// switches for anything else are kept but not listed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySettings {
    #[serde(default = "default_enabled")]
    pub enabled: BTreeMap<String, bool>,

    #[serde(skip)]
    registered: BTreeSet<String>,
}

fn default_enabled() -> BTreeMap<String, bool> {
    BTreeMap::from([(USER_SCRIPTS.to_string(), true)])
}

impl Default for CategorySettings {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            registered: BTreeSet::new(),
        }
    }
}

impl CategorySettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from YAML; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let display = path.display().to_string();
        match std::fs::read_to_string(path) {
            Ok(content) => serde_yaml::from_str(&content).map_err(|source| SettingsError::Yaml {
                path: display,
                source,
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(source) => Err(SettingsError::Read {
                path: display,
                source,
            }),
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        let display = path.display().to_string();
        let yaml = serde_yaml::to_string(self).map_err(|source| SettingsError::Yaml {
            path: display.clone(),
            source,
        })?;
        std::fs::write(path, yaml).map_err(|source| SettingsError::Write {
            path: display,
            source,
        })
    }

    pub fn set_all(&mut self, enabled: bool) {
        for value in self.enabled.values_mut() {
            *value = enabled;
        }
    }

    /// Everything off except user-authored scripts.
    pub fn restore_defaults(&mut self) {
        self.set_all(false);
        self.enabled.insert(USER_SCRIPTS.to_string(), true);
    }
}

impl CategoryFilter for CategorySettings {
    fn get(&self, category: &str) -> bool {
        self.enabled.get(category).copied().unwrap_or(false)
    }

    fn set(&mut self, category: &str, enabled: bool) {
        self.enabled.insert(category.to_string(), enabled);
    }

    fn all_categories(&self) -> BTreeSet<String> {
        let mut out = self.registered.clone();
        out.insert(USER_SCRIPTS.to_string());
        out
    }

    fn register_types(&mut self, types: &[BehaviorType]) {
        for category in categories_for(types) {
            self.enabled.entry(category.clone()).or_insert(false);
            self.registered.insert(category);
        }
    }
}

// ============================================================================
// Menu grouping for display
// ============================================================================

/// A folder of the category menu (`Rendering`, `UI/Legacy`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryGroup {
    pub name: String,
    pub groups: Vec<CategoryGroup>,
    pub entries: Vec<CategoryEntry>,
}

/// A single toggle: the menu label shown and the category it switches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryEntry {
    pub label: String,
    pub category: String,
}

pub const UNGROUPED: &str = "Other";

/// Group built-in reference-holding types by menu path, two folder levels
/// deep at most. Types without a menu path land under [`UNGROUPED`].
pub fn category_tree(types: &[BehaviorType]) -> Vec<CategoryGroup> {
    // top -> (mid -> entries, direct entries)
    let mut tree: BTreeMap<String, (BTreeMap<String, Vec<CategoryEntry>>, Vec<CategoryEntry>)> =
        BTreeMap::new();

    for t in types
        .iter()
        .filter(|t| !t.user_authored && t.has_object_references)
    {
        let path = t.menu_path.as_deref().map(str::trim).unwrap_or("");
        let labels: Vec<&str> = path.split('/').filter(|l| !l.is_empty()).collect();

        let (top, mid, label) = match labels.as_slice() {
            [] => (UNGROUPED, None, t.name.as_str()),
            [only] => (UNGROUPED, None, *only),
            [top, label] => (*top, None, *label),
            [top, mid, .., label] => (*top, Some(*mid), *label),
        };

        let entry = CategoryEntry {
            label: label.to_string(),
            category: t.name.clone(),
        };
        let slot = tree.entry(top.to_string()).or_default();
        match mid {
            Some(mid) => slot.0.entry(mid.to_string()).or_default().push(entry),
            None => slot.1.push(entry),
        }
    }

    tree.into_iter()
        .map(|(name, (mids, mut entries))| {
            entries.sort_by(|a, b| a.label.cmp(&b.label));
            let groups = mids
                .into_iter()
                .map(|(name, mut entries)| {
                    entries.sort_by(|a, b| a.label.cmp(&b.label));
                    CategoryGroup {
                        name,
                        groups: Vec::new(),
                        entries,
                    }
                })
                .collect();
            CategoryGroup {
                name,
                groups,
                entries,
            }
        })
        .collect()
}
