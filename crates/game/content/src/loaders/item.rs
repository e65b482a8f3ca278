//! Item catalog loader.

use std::path::Path;

use serde::{Deserialize, Serialize};
use skirmish_core::{ConditionScope, ItemTraits, TriggerMatrix, validate_conditions};

use crate::loaders::{LoadResult, read_file};

/// Item catalog structure for RON files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemCatalog {
    pub items: Vec<ItemTraits>,
}

impl ItemCatalog {
    /// Checks every item and effect condition list against `matrix`.
    pub fn validate(&self, matrix: &TriggerMatrix) -> LoadResult<()> {
        for item in &self.items {
            validate_conditions(&item.conditions, matrix, ConditionScope::Item).map_err(|e| {
                anyhow::anyhow!("item `{}` ({}): {}", item.name, item.id, e)
            })?;

            for effect in &item.effects {
                validate_conditions(&effect.conditions, matrix, ConditionScope::Effect).map_err(
                    |e| {
                        anyhow::anyhow!(
                            "effect `{}` of item `{}` ({}): {}",
                            effect.label,
                            item.name,
                            item.id,
                            e
                        )
                    },
                )?;
            }
        }
        Ok(())
    }
}

/// Loader for item catalogs from RON files.
pub struct ItemLoader;

impl ItemLoader {
    /// Load and validate an item catalog against the standard trigger matrix.
    pub fn load(path: &Path) -> LoadResult<Vec<ItemTraits>> {
        Self::load_with(path, &TriggerMatrix::STANDARD)
    }

    pub fn load_with(path: &Path, matrix: &TriggerMatrix) -> LoadResult<Vec<ItemTraits>> {
        let content = read_file(path)?;
        let catalog: ItemCatalog = ron::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse item catalog RON: {}", e))?;

        catalog.validate(matrix)?;
        Ok(catalog.items)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use skirmish_core::{ApplicationType, ItemId, TargetShape};

    use super::*;

    const CATALOG: &str = r#"(
        items: [
            (
                id: 1,
                name: "Flaming Sphere",
                action_type: Some(save),
                target: (value: Some(5), shape: sphere),
                concentration: true,
                save: Some((ability: "dex", dc: 13)),
                damage: [
                    (formula: "2d6", kind: fire, application: overtime, halved_on_save: true),
                ],
                effects: [
                    (
                        label: "Scorched",
                        application: overtime,
                        saveable: true,
                        conditions: [
                            (condition: "end-of-turn-target", update: "end-on-save", text: ""),
                        ],
                    ),
                ],
                conditions: [
                    (condition: "start-of-turn-caster", update: "apply-overtime", text: "burns"),
                ],
            ),
        ],
    )"#;

    fn write(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn loads_catalog() {
        let file = write(CATALOG);
        let items = ItemLoader::load(file.path()).unwrap();

        assert_eq!(items.len(), 1);
        let sphere = &items[0];
        assert_eq!(sphere.id, ItemId(1));
        assert_eq!(sphere.target.shape, TargetShape::Sphere);
        assert_eq!(sphere.damage_parts(ApplicationType::Overtime).count(), 1);
        assert_eq!(sphere.conditions[0].text, "burns");
    }

    #[test]
    fn effect_only_events_are_rejected_on_items() {
        let file = write(&CATALOG.replace("start-of-turn-caster", "start-of-turn-target"));
        let err = ItemLoader::load(file.path()).unwrap_err();
        assert!(err.to_string().contains("Flaming Sphere"));
    }

    #[test]
    fn unknown_action_is_rejected() {
        let file = write(&CATALOG.replace("end-on-save", "explode"));
        let err = ItemLoader::load(file.path()).unwrap_err();
        assert!(err.to_string().contains("explode"));
    }
}
