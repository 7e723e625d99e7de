//! Storage of biaxial test data in HDF5 files
//!
//! Every test bar is one group at the file root. The group attributes describe the bar
//! (at least the geometry in [`REQUIRED_ATTRIBUTES`]) and the group holds one 1-D dataset per
//! measured channel, see [`REQUIRED_DATASETS`] and [`OPTIONAL_DATASETS`].

pub mod attributes;
pub mod manifest;
pub mod reader;
pub mod text;
pub mod writer;

use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

use crate::core::DataError;

pub use attributes::{AttrValue, Attributes, FormatSpec, FormatSpecError};
pub use manifest::{BarEntry, ImportManifest, ImportedBar};
pub use reader::{Bar, Hdf5Reader, ReadOptions};
pub use text::load_text_matrix;
pub use writer::{ColumnLayout, ColumnType, Hdf5Writer};

/// Group attributes every test bar must have (all in mm)
pub const REQUIRED_ATTRIBUTES: [&str; 3] = ["inner_diameter", "outer_diameter", "gauge_length"];

/// Datasets every test bar has. Missing columns are stored as zeros.
pub const REQUIRED_DATASETS: [&str; 7] = ["time", "forc", "astr", "acnt", "torq", "tstr", "tcnt"];

/// Recommended datasets that are only written when available
pub const OPTIONAL_DATASETS: [&str; 2] = ["disp", "rota"];

/// Name of the string attribute describing each dataset
pub const DESCRIPTION_ATTRIBUTE: &str = "description";

/// Default description of a standard dataset
pub fn default_description(name: &str) -> Option<&'static str> {
    Some(match name {
        "time" => "Experiment time [s]",
        "forc" => "Axial force [N]",
        "astr" => "Axial strain [-]",
        "acnt" => "Axial cycle count",
        "torq" => "Torque [Nmm]",
        "tstr" => "Torsional rotation over the gauge length [rad]",
        "tcnt" => "Torsional cycle count",
        "disp" => "Axial displacement for entire test bar [mm]",
        "rota" => "Rotation of entire test bar [rad]",
        _ => return None,
    })
}

#[derive(Debug, Error, Diagnostic)]
pub enum StoreError {
    #[error("HDF5 error: {0}")]
    #[diagnostic(code(cyclic::store::hdf5))]
    Hdf5(#[from] hdf5::Error),

    #[error("Failed to access {path}")]
    #[diagnostic(code(cyclic::store::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Test bar '{name}' not found in {file}")]
    #[diagnostic(
        code(cyclic::store::bar_not_found),
        help("Use `cyclic list` to see the available test bars")
    )]
    BarNotFound { name: String, file: PathBuf },

    #[error("Test bar '{0}' already exists")]
    #[diagnostic(code(cyclic::store::bar_exists))]
    BarExists(String),

    #[error("Test bar '{bar}' has no attribute '{key}'")]
    #[diagnostic(code(cyclic::store::missing_attribute))]
    MissingAttribute { bar: String, key: String },

    #[error("Missing required attributes: {}", .0.join(", "))]
    #[diagnostic(
        code(cyclic::store::missing_required_attributes),
        help("Every test bar needs inner_diameter, outer_diameter and gauge_length [mm]")
    )]
    MissingRequiredAttributes(Vec<String>),

    #[error("Attribute '{name}' has unsupported type {dtype}")]
    #[diagnostic(code(cyclic::store::unsupported_attribute))]
    UnsupportedAttribute { name: String, dtype: String },

    #[error("Invalid geometry for test bar '{bar}': {reason}")]
    #[diagnostic(code(cyclic::store::invalid_geometry))]
    InvalidGeometry { bar: String, reason: String },

    #[error("Test bar '{bar}' has no dataset '{name}'")]
    #[diagnostic(code(cyclic::store::missing_dataset))]
    MissingDataset { bar: String, name: String },

    #[error("Column {index} for '{name}' is outside the data matrix with {ncols} columns")]
    #[diagnostic(code(cyclic::store::column_out_of_range))]
    ColumnOutOfRange {
        name: String,
        index: usize,
        ncols: usize,
    },

    #[error("Unknown column type '{0}'")]
    #[diagnostic(
        code(cyclic::store::unknown_dtype),
        help("Supported types: f64, f32, i32, i64, u32, u64")
    )]
    UnknownDtype(String),

    #[error("Invalid string value: {0}")]
    #[diagnostic(code(cyclic::store::invalid_string))]
    InvalidString(String),

    #[error("{path}:{line}: {message}")]
    #[diagnostic(code(cyclic::store::parse))]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("CSV error in {path}")]
    #[diagnostic(code(cyclic::store::csv))]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Invalid import manifest {path}")]
    #[diagnostic(code(cyclic::store::manifest))]
    Manifest {
        path: PathBuf,
        #[source]
        source: serde_yml::Error,
    },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Data(#[from] DataError),
}
