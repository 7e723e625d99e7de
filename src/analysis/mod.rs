//! Analysis of cyclic test data
//!
//! - [`von_mises`]: equivalent stresses and strains in the axial-shear plane
//! - [`cycle`]: peak/valley detection and per-segment values
//! - [`yield_point`]: elastic parameters and offset yield points per segment
//! - [`filter`]: smoothing within each segment between peaks and valleys
//! - [`global_filter`]: cycle-aware spline fit and cycle time optimization

pub mod cycle;
pub mod filter;
pub mod global_filter;
pub mod linalg;
pub mod von_mises;
pub mod yield_point;

use miette::Diagnostic;
use thiserror::Error;

use crate::core::DataError;

#[derive(Debug, Error, Diagnostic)]
pub enum AnalysisError {
    #[error("At least {needed} data points are required, got {got}")]
    #[diagnostic(
        code(cyclic::analysis::too_few_points),
        help("Check the segment boundaries and the von Mises stress window used for the fit")
    )]
    TooFewPoints { needed: usize, got: usize },

    #[error("System matrix has {rows} rows but {values} values were given")]
    #[diagnostic(code(cyclic::analysis::dimension_mismatch))]
    DimensionMismatch { rows: usize, values: usize },

    #[error("Invalid analysis options: {0}")]
    #[diagnostic(code(cyclic::analysis::invalid_options))]
    InvalidOptions(String),

    #[error("Least squares solver failed: {0}")]
    #[diagnostic(code(cyclic::analysis::solver))]
    Solver(String),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Data(#[from] DataError),
}

pub use cycle::{PvIndices, Segment};
pub use yield_point::{Compliance, YieldOptions, YieldRecord};
