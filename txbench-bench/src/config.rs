//! Benchmark configuration

use crate::error::{BenchError, BenchResult};
use crate::fixtures::{fixture_key, fixture_value};
use std::path::PathBuf;
use std::str::FromStr;

pub const ENV_BASE_DIR: &str = "TXBENCH_BASE_DIR";
pub const ENV_FIXTURE_SIZE: &str = "TXBENCH_FIXTURE_SIZE";
pub const ENV_PROBE_INDEX: &str = "TXBENCH_PROBE_INDEX";
pub const ENV_KEEP_DIRS: &str = "TXBENCH_KEEP_DIRS";
pub const ENV_SAMPLE_SIZE: &str = "TXBENCH_SAMPLE_SIZE";
pub const ENV_DURABLE: &str = "TXBENCH_DURABLE";

/// Criterion refuses sample sizes below this.
const MIN_SAMPLE_SIZE: usize = 10;

/// Configuration for benchmark runs
#[derive(Debug, Clone)]
pub struct BenchmarkConfig {
    /// Directory under which every run creates its own temporary directory
    pub base_path: PathBuf,
    /// Rows (or key/value pairs) loaded before the populated read-only runs
    pub fixture_size: usize,
    /// Index of the fixture entry looked up by the populated read-only runs
    pub probe_index: usize,
    /// Leave temporary directories on disk after the run
    pub keep_dirs: bool,
    /// Criterion sample size
    pub sample_size: usize,
    /// Fsync on every commit (`false` relaxes both engines)
    pub durable: bool,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            base_path: std::env::temp_dir().join("txbench"),
            fixture_size: 1_000,
            probe_index: 500,
            keep_dirs: false,
            sample_size: 100,
            durable: true,
        }
    }
}

impl BenchmarkConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Quick config with a small fixture for fast testing
    pub fn quick() -> Self {
        Self {
            fixture_size: 20,
            probe_index: 10,
            sample_size: MIN_SAMPLE_SIZE,
            durable: false,
            ..Default::default()
        }
    }

    /// Defaults overridden by `TXBENCH_*` environment variables.
    pub fn from_env() -> BenchResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each `TXBENCH_*` name.
    pub fn from_lookup<F>(lookup: F) -> BenchResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(value) = lookup(ENV_BASE_DIR) {
            if value.trim().is_empty() {
                return Err(BenchError::config(ENV_BASE_DIR, &value, "must not be empty"));
            }
            config.base_path = PathBuf::from(value);
        }
        if let Some(value) = lookup(ENV_FIXTURE_SIZE) {
            config.fixture_size = parse_number(ENV_FIXTURE_SIZE, &value)?;
            // probe the middle of the fixture unless told otherwise
            config.probe_index = config.fixture_size / 2;
        }
        if let Some(value) = lookup(ENV_PROBE_INDEX) {
            config.probe_index = parse_number(ENV_PROBE_INDEX, &value)?;
        }
        if let Some(value) = lookup(ENV_KEEP_DIRS) {
            config.keep_dirs = parse_flag(ENV_KEEP_DIRS, &value)?;
        }
        if let Some(value) = lookup(ENV_SAMPLE_SIZE) {
            config.sample_size = parse_number(ENV_SAMPLE_SIZE, &value)?;
        }
        if let Some(value) = lookup(ENV_DURABLE) {
            config.durable = parse_flag(ENV_DURABLE, &value)?;
        }
        config.validate()?;
        Ok(config)
    }

    /// Checks the fields against each other.
    pub fn validate(&self) -> BenchResult<()> {
        if self.fixture_size == 0 {
            return Err(BenchError::config(
                ENV_FIXTURE_SIZE,
                &self.fixture_size.to_string(),
                "must be greater than zero",
            ));
        }
        if self.probe_index >= self.fixture_size {
            return Err(BenchError::config(
                ENV_PROBE_INDEX,
                &self.probe_index.to_string(),
                &format!("must be below the fixture size {}", self.fixture_size),
            ));
        }
        if self.sample_size < MIN_SAMPLE_SIZE {
            return Err(BenchError::config(
                ENV_SAMPLE_SIZE,
                &self.sample_size.to_string(),
                &format!("must be at least {}", MIN_SAMPLE_SIZE),
            ));
        }
        Ok(())
    }

    pub fn probe_key(&self) -> String {
        fixture_key(self.probe_index as u64)
    }

    pub fn probe_value(&self) -> String {
        fixture_value(self.probe_index as u64)
    }
}

fn parse_number<T: FromStr>(name: &str, value: &str) -> BenchResult<T> {
    value
        .trim()
        .parse()
        .map_err(|_| BenchError::config(name, value, "not a non-negative integer"))
}

fn parse_flag(name: &str, value: &str) -> BenchResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(BenchError::config(name, value, "expected true or false")),
    }
}
