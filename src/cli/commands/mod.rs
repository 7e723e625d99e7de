//! CLI command implementations

pub mod completions;
pub mod config;
pub mod cycles;
pub mod import;
pub mod list;
pub mod show;
pub mod smooth;
pub mod table;
pub mod vm;
pub mod yield_point;
