//! CLI command handlers.

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use confidant_session::{MemoryConfig, load_settings};

pub mod check_config;
pub mod simulate;

/// Shared context for all commands.
#[derive(Debug, Clone)]
pub struct Context {
    /// Config file given with `--config`, if any.
    pub config_path: Option<PathBuf>,
    /// Output as JSON for scripting.
    pub json_output: bool,
    /// Verbose output enabled.
    pub verbose: bool,
}

impl Context {
    /// Resolve the memory limits: the `--config` file if given, defaults otherwise.
    pub fn memory_config(&self) -> Result<MemoryConfig> {
        match &self.config_path {
            Some(path) => load_settings(path)
                .with_context(|| format!("loading session settings from {}", path.display())),
            None => Ok(MemoryConfig::default()),
        }
    }
}
