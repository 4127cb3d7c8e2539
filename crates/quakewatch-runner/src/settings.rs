//! Config file discovery.

use std::path::PathBuf;

use quakewatch_core::config::{ConfigError, QuakewatchConfig};

/// Environment variable naming the config file.
pub const CONFIG_PATH_VAR: &str = "QUAKEWATCH_CONFIG";

/// Config file used when [`CONFIG_PATH_VAR`] is unset.
pub const DEFAULT_CONFIG_PATH: &str = "quakewatch.yaml";

/// Resolve the config file path through `lookup`.
pub fn config_path<F>(lookup: &F) -> PathBuf
where
    F: Fn(&str) -> Option<String>,
{
    lookup(CONFIG_PATH_VAR).map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from)
}

/// Load configuration, falling back to defaults when the file is absent.
///
/// Overrides are resolved through `lookup` in both cases.
///
/// # Errors
///
/// Returns [`ConfigError`] if the file exists but cannot be read or
/// parsed, or if the result fails validation.
pub fn load_config<F>(lookup: F) -> Result<QuakewatchConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let path = config_path(&lookup);
    let yaml = if path.exists() {
        std::fs::read_to_string(&path)?
    } else {
        String::new()
    };
    QuakewatchConfig::parse_with(&yaml, lookup)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env(pairs: &[(&str, String)]) -> impl Fn(&str) -> Option<String> + use<> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), v.clone()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn missing_file_yields_defaults() {
        let lookup = env(&[(CONFIG_PATH_VAR, "/nonexistent/quakewatch.yaml".to_owned())]);
        let config = load_config(lookup).unwrap();
        assert_eq!(config, QuakewatchConfig::default());
    }

    #[test]
    fn file_values_and_overrides_apply() {
        let path = std::env::temp_dir()
            .join(format!("quakewatch-settings-{}.yaml", std::process::id()));
        std::fs::write(
            &path,
            "planner:\n  proximity_threshold_km: 50\nrefresh:\n  interval_ms: 1000\n",
        )
        .unwrap();

        let lookup = env(&[
            (CONFIG_PATH_VAR, path.to_string_lossy().into_owned()),
            ("QUAKEWATCH_REFRESH_INTERVAL_MS", "30000".to_owned()),
        ]);
        let config = load_config(lookup).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert!((config.planner.proximity_threshold_km - 50.0).abs() < f64::EPSILON);
        assert_eq!(config.refresh.interval_ms, 30_000);
    }

    #[test]
    fn default_path_when_unset() {
        let lookup = env(&[]);
        assert_eq!(config_path(&lookup), PathBuf::from(DEFAULT_CONFIG_PATH));
    }
}
