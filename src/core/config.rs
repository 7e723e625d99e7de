//! Configuration management with layered hierarchy

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the per-directory configuration file
pub const LOCAL_CONFIG_FILE: &str = "cyclic.yaml";

/// Cyclic configuration with layered hierarchy
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// HDF5 data file used when `--file` is not given
    pub data_file: Option<PathBuf>,

    /// Default output format
    pub default_format: Option<String>,

    /// Negate torque and rotation when reading (for data with reversed sign convention)
    pub reverse_torsion: Option<bool>,

    /// Number of peaks/valleys per cycle
    pub num_per_cycle: Option<usize>,

    /// Effective plastic strain offset defining yield
    pub yield_offset: Option<f64>,

    /// Von Mises stress change window used to fit elastic parameters
    pub delta_vm: Option<[f64; 2]>,

    /// Minimum increase of the step counter counted as a step change
    pub stp_tolerance: Option<f64>,

    /// Files that contributed to this configuration, lowest priority first
    #[serde(skip)]
    pub sources: Vec<PathBuf>,
}

impl Config {
    /// Load configuration from all sources, merging in priority order
    pub fn load() -> Self {
        let cwd = std::env::current_dir().ok();
        Self::load_from(cwd.as_deref())
    }

    /// Load configuration, searching for a local config file upwards from `start`
    pub fn load_from(start: Option<&Path>) -> Self {
        let mut config = Config::default();

        // 1. Built-in defaults (already in Default impl)

        // 2. Global user config (~/.config/cyclic/config.yaml)
        if let Some(global_path) = Self::global_config_path() {
            config.merge_file(&global_path);
        }

        // 3. Local config (nearest cyclic.yaml)
        if let Some(local_path) = start.and_then(Self::discover_local) {
            config.merge_file(&local_path);
        }

        // 4. Environment variables
        if let Ok(file) = std::env::var("CYCLIC_DATA_FILE") {
            config.data_file = Some(PathBuf::from(file));
        }
        if let Ok(reverse) = std::env::var("CYCLIC_REVERSE_TORSION") {
            config.reverse_torsion = Some(matches!(
                reverse.to_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            ));
        }

        config
    }

    /// Get the path to the global config file
    pub fn global_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "cyclic")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// Find the nearest local config file by walking up from the given directory
    pub fn discover_local(start: &Path) -> Option<PathBuf> {
        let mut current = start.to_path_buf();
        loop {
            let candidate = current.join(LOCAL_CONFIG_FILE);
            if candidate.is_file() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    fn merge_file(&mut self, path: &Path) {
        if !path.exists() {
            return;
        }
        match std::fs::read_to_string(path) {
            Ok(contents) => match serde_yml::from_str::<Config>(&contents) {
                Ok(other) => {
                    self.merge(other);
                    self.sources.push(path.to_path_buf());
                }
                Err(e) => tracing::warn!("Ignoring invalid config file {}: {}", path.display(), e),
            },
            Err(e) => tracing::warn!("Could not read config file {}: {}", path.display(), e),
        }
    }

    /// Merge another config into this one (other takes precedence)
    fn merge(&mut self, other: Config) {
        if other.data_file.is_some() {
            self.data_file = other.data_file;
        }
        if other.default_format.is_some() {
            self.default_format = other.default_format;
        }
        if other.reverse_torsion.is_some() {
            self.reverse_torsion = other.reverse_torsion;
        }
        if other.num_per_cycle.is_some() {
            self.num_per_cycle = other.num_per_cycle;
        }
        if other.yield_offset.is_some() {
            self.yield_offset = other.yield_offset;
        }
        if other.delta_vm.is_some() {
            self.delta_vm = other.delta_vm;
        }
        if other.stp_tolerance.is_some() {
            self.stp_tolerance = other.stp_tolerance;
        }
    }

    pub fn reverse_torsion(&self) -> bool {
        self.reverse_torsion.unwrap_or(false)
    }

    pub fn num_per_cycle(&self) -> usize {
        self.num_per_cycle.unwrap_or(2)
    }

    pub fn yield_offset(&self) -> f64 {
        self.yield_offset.unwrap_or(0.001)
    }

    pub fn delta_vm(&self) -> (f64, f64) {
        self.delta_vm.map(|[lo, hi]| (lo, hi)).unwrap_or((-1.0, 200.0))
    }

    pub fn stp_tolerance(&self) -> f64 {
        self.stp_tolerance.unwrap_or(1.0e-6)
    }

    /// Default content for a new local config file
    pub fn template() -> &'static str {
        r#"# Cyclic Data Configuration
# Values here override ~/.config/cyclic/config.yaml and are overridden by
# the environment (CYCLIC_DATA_FILE, CYCLIC_REVERSE_TORSION) and CLI flags.

# HDF5 file used when --file is not given
# data_file: test_data.hdf5

# Default output format (auto, tsv, csv, json, yaml, md)
# default_format: auto

# Negate torque and rotation when reading
# reverse_torsion: false

# Analysis defaults
# num_per_cycle: 2
# yield_offset: 0.001
# delta_vm: [-1.0, 200.0]
# stp_tolerance: 1.0e-6
"#
    }
}
