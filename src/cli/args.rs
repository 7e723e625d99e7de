//! CLI argument definitions using clap derive

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::cli::commands::{
    completions::CompletionsArgs, config::ConfigCommands, cycles::CyclesArgs,
    import::ImportArgs, list::ListArgs, show::ShowArgs, smooth::SmoothArgs, table::TableArgs,
    vm::VmArgs, yield_point::YieldArgs,
};

#[derive(Parser)]
#[command(name = "cyclic")]
#[command(author, version, about = "Cyclic biaxial test data analysis")]
#[command(long_about = "Store axial-torsion test data of thin-walled test bars in HDF5 files and analyze it: \
von Mises measures, peaks and valleys, elastic moduli, yield points and smoothing.")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalOpts,
}

#[derive(clap::Args, Clone, Debug)]
pub struct GlobalOpts {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "auto")]
    pub format: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Enable verbose output
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// HDF5 data file (default: data_file from the configuration)
    #[arg(long, global = true, env = "CYCLIC_DATA_FILE")]
    pub file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create an HDF5 data file from raw text files
    Import(ImportArgs),

    /// List test bars and their attributes
    List(ListArgs),

    /// Show attributes and channels of a test bar
    Show(ShowArgs),

    /// Write an HTML table with test bar attributes
    Table(TableArgs),

    /// Peak and valley indices with mid and difference values per segment
    Cycles(CyclesArgs),

    /// Von Mises stress, strain and stress angle
    Vm(VmArgs),

    /// Elastic moduli and offset yield points per segment
    #[command(name = "yield")]
    Yield(YieldArgs),

    /// Smooth the test data of a test bar
    Smooth(SmoothArgs),

    /// Configuration management
    #[command(subcommand)]
    Config(ConfigCommands),

    /// Print a shell completion script for cyclic
    Completions(CompletionsArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Aligned table for the terminal
    #[default]
    Auto,
    /// Tab-separated values (for piping)
    Tsv,
    /// CSV format (for spreadsheets)
    Csv,
    /// JSON format (for programming)
    Json,
    /// YAML format
    Yaml,
    /// Markdown tables
    Md,
}

impl OutputFormat {
    /// Resolve `auto` against the configured default format
    pub fn resolve(self, default_format: Option<&str>) -> OutputFormat {
        if self != OutputFormat::Auto {
            return self;
        }
        default_format
            .and_then(|s| OutputFormat::from_str(s, true).ok())
            .unwrap_or(OutputFormat::Auto)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_resolve_format() {
        assert_eq!(OutputFormat::Auto.resolve(Some("csv")), OutputFormat::Csv);
        assert_eq!(OutputFormat::Json.resolve(Some("csv")), OutputFormat::Json);
        assert_eq!(OutputFormat::Auto.resolve(Some("bogus")), OutputFormat::Auto);
        assert_eq!(OutputFormat::Auto.resolve(None), OutputFormat::Auto);
    }
}
