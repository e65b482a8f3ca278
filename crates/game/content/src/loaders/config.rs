//! Rules configuration loader.

use std::path::Path;

use skirmish_core::RulesConfig;

use crate::loaders::{LoadResult, read_file};

/// Loader for rules configuration from TOML files.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load rules from a TOML file. Missing keys keep their defaults.
    pub fn load(path: &Path) -> LoadResult<RulesConfig> {
        let content = read_file(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> LoadResult<RulesConfig> {
        let config: RulesConfig = toml::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse rules TOML: {}", e))?;

        if config.max_flatten_depth > RulesConfig::FLATTEN_DEPTH_LIMIT {
            anyhow::bail!(
                "max_flatten_depth {} exceeds the limit of {}",
                config.max_flatten_depth,
                RulesConfig::FLATTEN_DEPTH_LIMIT
            );
        }
        if !(config.grid_size.is_finite() && config.grid_size > 0.0) {
            anyhow::bail!("grid_size must be a positive number, got {}", config.grid_size);
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use skirmish_core::DistanceMetric;

    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "distance_metric = \"euclidean\"").unwrap();

        let config = ConfigLoader::load(file.path()).unwrap();
        assert_eq!(config.distance_metric, DistanceMetric::Euclidean);
        assert_eq!(config.max_flatten_depth, RulesConfig::DEFAULT_FLATTEN_DEPTH);
        assert!(config.allow_item_macros);
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        assert!(ConfigLoader::parse("max_flatten_depth = 1000").is_err());
        assert!(ConfigLoader::parse("grid_size = 0.0").is_err());
    }

    #[test]
    fn missing_file_reports_the_path() {
        let err = ConfigLoader::load(Path::new("/nonexistent/rules.toml")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/rules.toml"));
    }
}
