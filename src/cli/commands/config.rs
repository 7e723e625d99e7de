//! `cyclic config` command - Configuration management
//!
//! Shows the effective configuration and where it comes from, and creates a
//! local `cyclic.yaml`.

use clap::Subcommand;
use console::style;
use miette::{IntoDiagnostic, Result};
use std::fs;
use std::path::PathBuf;

use crate::cli::output::print_structured;
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::config::LOCAL_CONFIG_FILE;
use crate::core::Config;

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show current configuration values
    Show(ShowArgs),

    /// Show paths to configuration files
    Path,

    /// Write a commented cyclic.yaml to the current directory
    Init(InitArgs),

    /// List all available configuration keys
    Keys,
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Show only this key's value
    pub key: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct InitArgs {
    /// Overwrite an existing file
    #[arg(long)]
    pub force: bool,
}

/// Valid configuration keys
const VALID_KEYS: &[(&str, &str)] = &[
    ("data_file", "HDF5 file used when --file is not given"),
    ("default_format", "Default output format (auto, tsv, csv, json, yaml, md)"),
    ("reverse_torsion", "Negate torque and rotation when reading"),
    ("num_per_cycle", "Number of peaks/valleys per cycle"),
    ("yield_offset", "Effective plastic strain offset defining yield"),
    ("delta_vm", "Von Mises stress change window for the elastic fit"),
    ("stp_tolerance", "Minimum step counter increase counted as a step change"),
];

/// Run a config subcommand
pub fn run(cmd: ConfigCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        ConfigCommands::Show(args) => run_show(args, global),
        ConfigCommands::Path => run_path(),
        ConfigCommands::Init(args) => run_init(args, global),
        ConfigCommands::Keys => run_keys(),
    }
}

fn get_config_value(config: &Config, key: &str) -> Option<String> {
    match key {
        "data_file" => config.data_file.as_ref().map(|p| p.display().to_string()),
        "default_format" => config.default_format.clone(),
        "reverse_torsion" => Some(config.reverse_torsion().to_string()),
        "num_per_cycle" => Some(config.num_per_cycle().to_string()),
        "yield_offset" => Some(config.yield_offset().to_string()),
        "delta_vm" => {
            let (lo, hi) = config.delta_vm();
            Some(format!("{}, {}", lo, hi))
        }
        "stp_tolerance" => Some(config.stp_tolerance().to_string()),
        _ => None,
    }
}

fn run_show(args: ShowArgs, global: &GlobalOpts) -> Result<()> {
    let config = Config::load();

    if let Some(key) = &args.key {
        if !VALID_KEYS.iter().any(|(k, _)| k == key) {
            return Err(miette::miette!(
                help = "Run `cyclic config keys` to list the available keys",
                "Unknown configuration key '{}'",
                key
            ));
        }
        return match get_config_value(&config, key) {
            Some(v) => {
                println!("{}", v);
                Ok(())
            }
            None => Err(miette::miette!("Key '{}' is not set", key)),
        };
    }

    if matches!(global.format, OutputFormat::Json | OutputFormat::Yaml) {
        return print_structured(&config, global.format);
    }

    println!("{}", style("Effective configuration:").bold());
    println!();
    for (key, _) in VALID_KEYS {
        match get_config_value(&config, key) {
            Some(value) => println!("  {:<16} {}", style(key).cyan(), value),
            None => println!("  {:<16} {}", style(key).cyan(), style("(not set)").dim()),
        }
    }
    if !global.quiet {
        println!();
        if config.sources.is_empty() {
            println!("{}", style("Using built-in defaults").dim());
        } else {
            for source in &config.sources {
                println!("{} {}", style("Loaded from").dim(), source.display());
            }
        }
    }
    Ok(())
}

fn run_path() -> Result<()> {
    let global_path = Config::global_config_path();
    let local_path = std::env::current_dir()
        .ok()
        .and_then(|cwd| Config::discover_local(&cwd));

    println!("{}", style("Configuration file paths:").bold());
    println!();
    match global_path {
        Some(path) => {
            println!("  {} {}", style("Global:").cyan(), path.display());
            if path.exists() {
                println!("         {}", style("(exists)").green());
            } else {
                println!("         {}", style("(not created)").dim());
            }
        }
        None => println!(
            "  {} {}",
            style("Global:").cyan(),
            style("(no home directory)").dim()
        ),
    }

    println!();
    match local_path {
        Some(path) => println!("  {} {}", style("Local:").cyan(), path.display()),
        None => println!(
            "  {} {}",
            style("Local:").cyan(),
            style(format!("(no {} found)", LOCAL_CONFIG_FILE)).dim()
        ),
    }
    Ok(())
}

fn run_init(args: InitArgs, global: &GlobalOpts) -> Result<()> {
    let path = PathBuf::from(LOCAL_CONFIG_FILE);
    if path.exists() && !args.force {
        return Err(miette::miette!(
            help = "Use --force to overwrite",
            "{} already exists",
            path.display()
        ));
    }
    fs::write(&path, Config::template()).into_diagnostic()?;
    if !global.quiet {
        println!(
            "{} Created {}",
            style("✓").green(),
            style(path.display()).yellow()
        );
    }
    Ok(())
}

fn run_keys() -> Result<()> {
    println!("{}", style("Available configuration keys:").bold());
    println!();
    for (key, description) in VALID_KEYS {
        println!("  {:<16} {}", style(key).cyan(), description);
    }
    Ok(())
}
