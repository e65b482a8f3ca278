//! Content factory for loading session content from a data directory.

use std::path::{Path, PathBuf};

use skirmish_core::{ItemTraits, RulesConfig};

use crate::loaders::{ConfigLoader, ItemLoader, LoadResult};

/// Content factory that loads all session content from a data directory.
///
/// # Directory Structure
///
/// ```text
/// data_dir/
/// ├── rules.toml
/// └── items.ron
/// ```
pub struct ContentFactory {
    data_dir: PathBuf,
}

impl ContentFactory {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Load rules from `rules.toml`, falling back to defaults when absent.
    pub fn load_rules(&self) -> LoadResult<RulesConfig> {
        let path = self.data_dir.join("rules.toml");
        if !path.exists() {
            return Ok(RulesConfig::default());
        }
        ConfigLoader::load(&path)
    }

    /// Load the item catalog from `items.ron`.
    pub fn load_items(&self) -> LoadResult<Vec<ItemTraits>> {
        let path = self.data_dir.join("items.ron");
        ItemLoader::load(&path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_data_loads() {
        let factory = ContentFactory::new(concat!(env!("CARGO_MANIFEST_DIR"), "/data"));
        let rules = factory.load_rules().unwrap();
        let items = factory.load_items().unwrap();

        assert_eq!(rules, RulesConfig::default());
        assert!(items.iter().any(|item| item.name == "Spirit Guardians"));
    }

    #[test]
    fn missing_rules_fall_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let factory = ContentFactory::new(dir.path());
        assert_eq!(factory.load_rules().unwrap(), RulesConfig::default());
        assert!(factory.load_items().is_err());
    }
}
