//! Utility functions for xtask commands

use anyhow::{Result, anyhow};
use std::path::{Path, PathBuf};

use skirmish_content::ContentFactory;
use skirmish_core::ItemTraits;

/// Bundled content shipped with `skirmish-content`.
pub fn bundled_data_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../game/content/data")
}

/// Content factory over `dir`, or the bundled data when none is given.
pub fn content(dir: Option<PathBuf>) -> Result<ContentFactory> {
    let dir = dir.unwrap_or_else(bundled_data_dir);
    if !dir.exists() {
        return Err(anyhow!("Data directory does not exist: {}", dir.display()));
    }
    tracing::debug!(target: "xtask", dir = %dir.display(), "using content directory");
    Ok(ContentFactory::new(dir))
}

/// Finds an item by numeric id or by case-insensitive name.
pub fn find_item<'a>(items: &'a [ItemTraits], key: &str) -> Result<&'a ItemTraits> {
    let found = match key.parse::<u64>() {
        Ok(id) => items.iter().find(|item| item.id.0 == id),
        Err(_) => items
            .iter()
            .find(|item| item.name.eq_ignore_ascii_case(key)),
    };

    found.ok_or_else(|| {
        let known: Vec<_> = items
            .iter()
            .map(|item| format!("{} ({})", item.name, item.id.0))
            .collect();
        anyhow!("No item matches `{}`\n\nKnown items: {}", key, known.join(", "))
    })
}
