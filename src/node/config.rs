use anyhow::Result;
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::chain::types::BlockNumber;
use crate::suite::SuiteConfig;

/// `[devnode]` overrides for the in-process node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DevNodeSection {
    pub block_time_ms: Option<u64>,
    pub price_period: Option<BlockNumber>,
}

/// Run configuration file: scenario constants plus dev node knobs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub suite: SuiteConfig,
    pub devnode: DevNodeSection,
}

impl FileConfig {
    /// Load run config from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = fs::read_to_string(path)?;
        let cfg: FileConfig = toml::from_str(&data)?;
        Ok(cfg)
    }
}
