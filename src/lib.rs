//! Cyclic Data - analysis of cyclic biaxial (axial-torsion) test data
//!
//! Test data of thin-walled test bars is stored in HDF5 files ([`io`]) and converted to
//! stresses and strains ([`core::TestData`]). The [`analysis`] modules locate peaks and
//! valleys, compute von Mises measures, fit elastic parameters and yield points and
//! smooth the data. [`report`] writes an HTML overview of the test bars.

pub mod analysis;
pub mod cli;
pub mod core;
pub mod io;
pub mod report;
