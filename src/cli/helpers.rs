//! Shared helper functions for CLI commands
//!
//! This module contains utility functions that are used across multiple
//! command modules to avoid code duplication.

use std::path::PathBuf;

use miette::{IntoDiagnostic, Result};

use crate::analysis::cycle::{pv_indices_change_strain, pv_indices_with_tolerance};
use crate::analysis::PvIndices;
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::{Config, TestData};
use crate::io::{AttrValue, Attributes, Bar, Hdf5Reader, ReadOptions};

/// Loaded configuration together with the effective output format
pub struct Context {
    pub config: Config,
    pub format: OutputFormat,
}

impl Context {
    pub fn load(global: &GlobalOpts) -> Self {
        let config = Config::load();
        let format = global.format.resolve(config.default_format.as_deref());
        Self { config, format }
    }

    /// The HDF5 file from `--file`, falling back to the configured `data_file`
    pub fn data_file(&self, global: &GlobalOpts) -> Result<PathBuf> {
        global
            .file
            .clone()
            .or_else(|| self.config.data_file.clone())
            .ok_or_else(|| {
                miette::miette!(
                    help = "Pass --file, set CYCLIC_DATA_FILE or add data_file to cyclic.yaml",
                    "No HDF5 data file given"
                )
            })
    }

    /// Open the data file with the configured read options
    pub fn open(&self, global: &GlobalOpts, reverse_torsion: bool) -> Result<Hdf5Reader> {
        let path = self.data_file(global)?;
        let reader = Hdf5Reader::open(&path)?.with_options(ReadOptions {
            reverse_torsion: reverse_torsion || self.config.reverse_torsion(),
        });
        Ok(reader)
    }

    /// Read a single test bar
    pub fn read_bar(&self, global: &GlobalOpts, bar: &str, reverse_torsion: bool) -> Result<Bar> {
        let reader = self.open(global, reverse_torsion)?;
        let bar = reader.read_bar(bar)?;
        reader.close()?;
        Ok(bar)
    }
}

/// Parse `key=value` pairs; values are typed like attributes (int, float, text)
pub fn parse_key_values(pairs: &[String]) -> Result<Attributes> {
    let mut attributes = Attributes::new();
    for pair in pairs {
        let (key, value) = pair.split_once('=').ok_or_else(|| {
            miette::miette!(
                help = "Use e.g. --where load_type=axial",
                "Expected key=value, got '{}'",
                pair
            )
        })?;
        let value: AttrValue = value.parse().into_diagnostic()?;
        attributes.insert(key.trim().to_string(), value);
    }
    Ok(attributes)
}

/// How peaks and valleys are located
#[derive(clap::Args, Debug, Clone)]
pub struct PvOpts {
    /// Number of peaks/valleys per cycle (default: num_per_cycle from the configuration)
    #[arg(long, short = 'n')]
    pub num_per_cycle: Option<usize>,

    /// Number of leading step changes to ignore
    #[arg(long, default_value_t = 0)]
    pub skip: usize,

    /// Only accept a step change after this effective strain change since the previous point
    #[arg(long, conflicts_with = "skip")]
    pub min_strain_change: Option<f64>,
}

impl PvOpts {
    pub fn num_per_cycle(&self, config: &Config) -> usize {
        self.num_per_cycle.unwrap_or_else(|| config.num_per_cycle())
    }

    pub fn indices(&self, data: &TestData, config: &Config) -> Result<PvIndices> {
        let n = self.num_per_cycle(config);
        if n == 0 {
            return Err(miette::miette!("num_per_cycle must be at least 1"));
        }
        let pv = match self.min_strain_change {
            Some(min_change) => {
                pv_indices_change_strain(data, min_change, n, config.stp_tolerance())
            }
            None => pv_indices_with_tolerance(data, n, self.skip, config.stp_tolerance()),
        };
        tracing::debug!(
            "Found {} characteristic points of {} types",
            pv.iter().map(Vec::len).sum::<usize>(),
            n
        );
        Ok(pv)
    }
}

/// Truncate a string to max_len, adding "..." if truncated
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
