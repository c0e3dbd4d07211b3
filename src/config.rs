//! Rules file loading.
//!
//! `cgstatd` reads its rule declarations from a TOML file:
//!
//! ```toml
//! ## Optional prefix shared by all rules.
//! prefix = "/sys/fs/cgroup"
//!
//! [[rules]]
//! paths = ["memory", "memory/*"]
//! fields = ["memory.max_usage_in_bytes", "memory.limit_in_bytes"]
//!
//! [[rules]]
//! ## A rule-level prefix overrides the global one.
//! prefix = "/sys/fs/cgroup/cpu"
//! paths = ["/", "*", "child2/*"]
//! fields = ["cpuacct.usage", "cpu.cfs_period_us", "cpu.cfs_quota_us"]
//! ```
//!
//! Semantic validation (every rule must keep at least one non-blank path
//! and field) happens in the collector, not here.

use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Error type for rules file loading.
#[derive(Debug)]
pub enum ConfigError {
    /// Rules file could not be read.
    Read(io::Error),
    /// Rules file is not valid TOML.
    Parse(toml::de::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Read(err) => write!(f, "cannot read rules file: {}", err),
            ConfigError::Parse(err) => write!(f, "cannot parse rules file: {}", err),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Read(err) => Some(err),
            ConfigError::Parse(err) => Some(err),
        }
    }
}

/// One declared rule: directory patterns paired with control file names.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Default)]
pub struct RuleConfig {
    /// Path prefix for this rule. Falls back to the global prefix when blank.
    #[serde(default)]
    pub prefix: String,
    /// Directory patterns, `*` matching a single path segment.
    #[serde(default)]
    pub paths: Vec<String>,
    /// Control file names read from every matched directory.
    #[serde(default)]
    pub fields: Vec<String>,
}

/// Top-level rules file.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Default)]
pub struct Config {
    /// Optional prefix shared by all rules.
    #[serde(default)]
    pub prefix: String,
    /// Declared rules, applied in order.
    #[serde(default)]
    pub rules: Vec<RuleConfig>,
}

impl Config {
    /// Loads a rules file from disk.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(ConfigError::Read)?;
        Self::parse(&raw)
    }

    /// Parses rules from TOML text.
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        toml::from_str(raw).map_err(ConfigError::Parse)
    }
}
