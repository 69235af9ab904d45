use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::store::file::{JsonDispositionStore, TomlRuleStore};
use crate::store::memory::{MemoryDispositionStore, MemoryRuleStore};
use crate::store::{DispositionStore, RuleStore};

/// Root configuration structure, deserialized from `.inventory-checkr/config.toml`.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Where exclusion and mapping rules come from.
    #[serde(default)]
    pub rules: RulesConfig,
    /// Where disposition records are kept.
    #[serde(default)]
    pub dispositions: DispositionsConfig,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoggingConfig {
    /// `tracing` filter directive, e.g. `"info"` or `"inventory_checkr=debug"`.
    pub level: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RulesConfig {
    /// TOML rules file. Built-in rules are used when unset.
    pub path: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DispositionsConfig {
    /// JSON disposition file. Records live only for the process when unset.
    pub path: Option<PathBuf>,
}

impl Config {
    fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let mut config: Config = toml::from_str(&content)
            .with_context(|| format!("invalid config {}", path.display()))?;

        if let Some(base) = path.parent() {
            config.resolve_relative(base);
        }
        Ok(config)
    }

    /// Make store paths relative to the directory holding the config file.
    fn resolve_relative(&mut self, base: &Path) {
        for path in [&mut self.rules.path, &mut self.dispositions.path]
            .into_iter()
            .flatten()
        {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
    }

    /// Rule store for this configuration; `override_path` wins over the config file.
    pub fn rule_store(&self, override_path: Option<&Path>) -> Arc<dyn RuleStore> {
        match override_path.or(self.rules.path.as_deref()) {
            Some(path) => Arc::new(TomlRuleStore::new(path)),
            None => Arc::new(MemoryRuleStore::builtin()),
        }
    }

    /// Disposition store for this configuration; `override_path` wins over the config file.
    pub fn disposition_store(&self, override_path: Option<&Path>) -> Arc<dyn DispositionStore> {
        match override_path.or(self.dispositions.path.as_deref()) {
            Some(path) => Arc::new(JsonDispositionStore::new(path)),
            None => Arc::new(MemoryDispositionStore::new()),
        }
    }
}

/// Load the configuration, searching in order:
///
/// 1. `config_override` — path passed via `--config`
/// 2. `<project_path>/.inventory-checkr/config.toml`
/// 3. `~/.config/inventory-checkr/config.toml`
/// 4. Built-in [`Config::default`]
pub fn load_config(project_path: &Path, config_override: Option<&Path>) -> Result<Config> {
    if let Some(path) = config_override {
        return Config::from_file(path);
    }

    let project_config = project_path.join(".inventory-checkr").join("config.toml");
    if project_config.exists() {
        return Config::from_file(&project_config);
    }

    if let Some(home) = dirs::home_dir() {
        let home_config = home
            .join(".config")
            .join("inventory-checkr")
            .join("config.toml");
        if home_config.exists() {
            return Config::from_file(&home_config);
        }
    }

    Ok(Config::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_config_paths_resolved() {
        let dir = tempfile::tempdir().unwrap();
        let cfg_dir = dir.path().join(".inventory-checkr");
        std::fs::create_dir_all(&cfg_dir).unwrap();
        std::fs::write(
            cfg_dir.join("config.toml"),
            r#"
[logging]
level = "debug"

[rules]
path = "rules.toml"

[dispositions]
path = "/var/lib/inventory/dispositions.json"
"#,
        )
        .unwrap();

        let config = load_config(dir.path(), None).unwrap();
        assert_eq!(config.logging.level.as_deref(), Some("debug"));
        assert_eq!(config.rules.path, Some(cfg_dir.join("rules.toml")));
        assert_eq!(
            config.dispositions.path,
            Some(PathBuf::from("/var/lib/inventory/dispositions.json"))
        );
    }

    #[test]
    fn test_override_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(load_config(dir.path(), Some(&missing)).is_err());
    }

    #[test]
    fn test_empty_config_uses_builtin_rules() {
        let config: Config = toml::from_str("").unwrap();
        let rules = config.rule_store(None);
        let (exclusions, mappings) = rules.load_rules().unwrap();
        assert!(!exclusions.is_empty());
        assert!(!mappings.is_empty());
    }
}
