// Evaluation configuration for quorum-eval
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_CONFIG_PATH: &str = "config/eval.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EvalConfig {
    /// Interpreter used by the sandbox runner.
    pub python_bin: String,
    /// Hard wall-clock timeout per code unit.
    pub timeout_ms: u64,
    /// Fixed ceiling on concurrent in-flight executions.
    pub max_concurrency: usize,
    /// Seed for the tie-break draw; fixed seed, reproducible run.
    pub seed: u64,
    /// Where code units are staged. Defaults to the system temp dir.
    pub scratch_dir: Option<PathBuf>,
}

impl Default for EvalConfig {
    fn default() -> Self {
        EvalConfig {
            python_bin: "python3".to_string(),
            timeout_ms: 5000,
            max_concurrency: crate::executor::DEFAULT_MAX_CONCURRENCY,
            seed: 42,
            scratch_dir: None,
        }
    }
}

impl EvalConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("failed to parse config file {}", path.display()))
    }

    /// Load an explicit config file, or `config/eval.json` when it exists,
    /// or built-in defaults. Every field has a safe default, so a missing
    /// default file is not an error.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_PATH);
                if default_path.exists() {
                    Self::load(default_path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}
