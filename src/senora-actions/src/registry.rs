//! The action registry.

use std::collections::BTreeMap;
use std::path::Path;

use tracing::{info, warn};

use crate::loader::scan_directory;
use crate::template::FormTemplate;

/// Immutable map of action name to form template.
///
/// Built once at start-up and only read afterwards, so it can be shared
/// across request handlers without locking.
///
/// Duplicate names: the first template registered under a name wins and later
/// ones are dropped with a warning. Directories are loaded in the order given
/// and their entries in name order, so which one wins is deterministic.
#[derive(Debug, Clone, Default)]
pub struct ActionRegistry {
    actions: BTreeMap<String, FormTemplate>,
}

impl ActionRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every action found in `dirs`.
    pub fn load<P: AsRef<Path>>(dirs: &[P]) -> Self {
        let mut registry = Self::new();
        for dir in dirs {
            let dir = dir.as_ref();
            for template in scan_directory(dir) {
                registry.insert(template);
            }
        }

        info!(
            "Loaded {} action(s): {}",
            registry.len(),
            registry.names().join(", ")
        );
        registry
    }

    /// Build a registry from templates already in memory.
    pub fn from_templates(templates: impl IntoIterator<Item = FormTemplate>) -> Self {
        let mut registry = Self::new();
        for template in templates {
            registry.insert(template);
        }
        registry
    }

    fn insert(&mut self, template: FormTemplate) -> bool {
        if self.actions.contains_key(template.name()) {
            warn!(
                action = %template.name(),
                "Duplicate action ignored, keeping the first definition"
            );
            return false;
        }
        self.actions.insert(template.name().to_string(), template);
        true
    }

    /// Look up an action. Absence is a normal outcome.
    pub fn get(&self, name: &str) -> Option<&FormTemplate> {
        self.actions.get(name)
    }

    /// Whether an action is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.actions.contains_key(name)
    }

    /// Action names, sorted.
    pub fn names(&self) -> Vec<&str> {
        self.actions.keys().map(String::as_str).collect()
    }

    /// Templates in name order.
    pub fn iter(&self) -> impl Iterator<Item = &FormTemplate> {
        self.actions.values()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}
