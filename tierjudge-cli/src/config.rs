/// Config file loading and creation for tierjudge CLI.
///
/// Config lives at ~/.config/tierjudge/config.toml.
/// All fields are optional. CLI args override config values.
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::bail;

#[derive(Deserialize, Default, Debug)]
pub struct TierjudgeConfig {
    pub tier_order: Option<Vec<String>>,
    pub min_comparisons: Option<u32>,
    pub target_per_item: Option<u32>,
    pub seed: Option<u64>,
}

pub const DEFAULT_TIER_ORDER: [&str; 5] = ["S", "A", "B", "C", "D"];
pub const DEFAULT_TARGET_PER_ITEM: u32 = 3;

const DEFAULT_CONFIG_TEMPLATE: &str = "\
# tierjudge configuration
# All values here can be overridden by CLI flags.

# Tier names, best first. \"unranked\" is reserved and ignored here.
# tier_order = [\"S\", \"A\", \"B\", \"C\", \"D\"]

# Comparisons an item needs before it is placed in a tier
# min_comparisons = 2

# Comparisons per item the warm-start queue aims for
# target_per_item = 3

# Seed for pair selection (omit for a fresh seed every run)
# seed = 42
";

/// Returns the default config path: ~/.config/tierjudge/config.toml
pub fn config_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| bail("HOME environment variable not set"));
    PathBuf::from(home).join(".config").join("tierjudge").join("config.toml")
}

/// Load config from a file path. Returns default (all None) if file doesn't exist.
pub fn load_config(path: &Path) -> TierjudgeConfig {
    match std::fs::read_to_string(path) {
        Ok(content) => parse_config(&content)
            .unwrap_or_else(|e| bail(format!("Failed to parse config at {}: {e}", path.display()))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => TierjudgeConfig::default(),
        Err(e) => bail(format!("Failed to read config at {}: {e}", path.display())),
    }
}

fn parse_config(content: &str) -> Result<TierjudgeConfig, toml::de::Error> {
    toml::from_str(content)
}

/// Create the default config file. Errors if it already exists.
pub fn create_default_config() -> PathBuf {
    let path = config_path();

    if path.exists() {
        bail(format!("Config file already exists at {}", path.display()));
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .unwrap_or_else(|e| bail(format!("Failed to create directory {}: {e}", parent.display())));
    }

    std::fs::write(&path, DEFAULT_CONFIG_TEMPLATE)
        .unwrap_or_else(|e| bail(format!("Failed to write config to {}: {e}", path.display())));

    path
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_template_parses_to_empty_config() {
        let cfg = parse_config(DEFAULT_CONFIG_TEMPLATE).unwrap();
        assert!(cfg.tier_order.is_none());
        assert!(cfg.min_comparisons.is_none());
        assert!(cfg.seed.is_none());
    }

    #[test]
    fn test_parse_partial_config() {
        let cfg = parse_config("tier_order = [\"Gold\", \"Silver\"]\nseed = 9\n").unwrap();
        assert_eq!(cfg.tier_order, Some(vec!["Gold".to_string(), "Silver".to_string()]));
        assert_eq!(cfg.seed, Some(9));
        assert_eq!(cfg.target_per_item, None);
    }

    #[test]
    fn test_unknown_type_is_an_error() {
        assert!(parse_config("min_comparisons = \"two\"").is_err());
    }
}
