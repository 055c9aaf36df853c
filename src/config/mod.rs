use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::translator::rules::{CommandMapping, RuleTable};

/// Contents of `~/.cmdx/config.yaml`. Every section is optional.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Config {
    #[serde(default)]
    pub translation: TranslationConfig,
    #[serde(default)]
    pub shell: ShellConfig,
    /// Extra generic rules, registered after the built-in table.
    #[serde(default)]
    pub rules: Vec<RuleConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TranslationConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct ShellConfig {
    /// Target shell name, same vocabulary as `CMDX_SHELL`.
    #[serde(default)]
    pub target: Option<String>,
}

/// One overlay record as written in the config file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RuleConfig {
    pub unix: String,
    pub target: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub flags: BTreeMap<String, String>,
    #[serde(default)]
    pub requires_args: bool,
}

fn default_true() -> bool {
    true
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl From<RuleConfig> for CommandMapping {
    fn from(rule: RuleConfig) -> Self {
        Self {
            unix_name: rule.unix,
            target_verb: rule.target,
            description: rule.description,
            flag_table: rule.flags,
            requires_arguments: rule.requires_args,
        }
    }
}

impl Config {
    /// Load configuration from default location
    pub fn load_default() -> Result<Self> {
        let config_path = Self::default_config_path()?;

        if config_path.exists() {
            Self::load_from_file(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let config: Config = serde_yaml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        Ok(config)
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let contents = serde_yaml::to_string(self).context("Failed to serialize config")?;

        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        fs::write(path.as_ref(), contents).context("Failed to write config file")?;

        Ok(())
    }

    /// Get default configuration path
    pub fn default_config_path() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Failed to get home directory")?;

        Ok(home.join(".cmdx").join("config.yaml"))
    }

    /// Built-in rules plus this file's overlay, in file order.
    #[must_use]
    pub fn rule_table(&self) -> RuleTable {
        RuleTable::with_overlay(self.rules.iter().cloned().map(CommandMapping::from))
    }
}
