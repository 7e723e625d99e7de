//! `cyclic import` command - Create an HDF5 data file from raw text exports

use console::{style, Term};
use dialoguer::{theme::ColorfulTheme, Confirm};
use miette::{IntoDiagnostic, Result};
use std::fs;
use std::path::PathBuf;

use crate::cli::helpers::Context;
use crate::cli::GlobalOpts;
use crate::io::{load_text_matrix, ImportManifest, REQUIRED_ATTRIBUTES};

#[derive(clap::Args, Debug)]
pub struct ImportArgs {
    /// Import manifest (YAML) describing columns, files and attributes
    pub manifest: Option<PathBuf>,

    /// Output HDF5 file (default: --file or data_file from the configuration)
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,

    /// Overwrite an existing output file without asking
    #[arg(long)]
    pub force: bool,

    /// Check the manifest and text files without writing
    #[arg(long)]
    pub dry_run: bool,

    /// Print a manifest template
    #[arg(long, conflicts_with = "manifest")]
    pub template: bool,
}

pub fn run(args: ImportArgs, global: &GlobalOpts) -> Result<()> {
    if args.template {
        print!("{}", ImportManifest::template());
        return Ok(());
    }

    let manifest_path = args.manifest.clone().ok_or_else(|| {
        miette::miette!(
            help = "Run `cyclic import --template > import.yaml` for a starting point",
            "Import manifest required. Usage: cyclic import import.yaml"
        )
    })?;
    if !manifest_path.exists() {
        return Err(miette::miette!("File not found: {}", manifest_path.display()));
    }

    let manifest = ImportManifest::load(&manifest_path)?;
    let ctx = Context::load(global);
    let output = match &args.output {
        Some(path) => path.clone(),
        None => ctx.data_file(global)?,
    };

    if !global.quiet {
        println!(
            "{} Importing {} test bar(s) from {} into {}{}",
            style("→").blue(),
            style(manifest.bars.len()).cyan(),
            style(manifest_path.display()).yellow(),
            style(output.display()).yellow(),
            if args.dry_run {
                style(" (dry run)").dim().to_string()
            } else {
                String::new()
            }
        );
    }

    if args.dry_run {
        return check_manifest(&manifest, global.quiet);
    }

    if output.exists() && !args.force {
        if !Term::stdout().is_term() {
            return Err(miette::miette!(
                help = "Use --force to overwrite",
                "{} already exists",
                output.display()
            ));
        }
        let overwrite = Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(format!("Overwrite {}?", output.display()))
            .default(false)
            .interact()
            .into_diagnostic()?;
        if !overwrite {
            println!("Aborted.");
            return Ok(());
        }
    }

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).into_diagnostic()?;
    }

    let imported = manifest.import(&output)?;
    if !global.quiet {
        for bar in &imported {
            println!(
                "  {} {} ({} rows)",
                style("✓").green(),
                style(&bar.name).cyan(),
                bar.rows
            );
        }
        println!();
        println!(
            "{} Wrote {} test bar(s) to {}",
            style("✓").green(),
            style(imported.len()).cyan(),
            style(output.display()).yellow()
        );
    }
    Ok(())
}

/// Load every text file and check the attributes without writing anything
fn check_manifest(manifest: &ImportManifest, quiet: bool) -> Result<()> {
    let layout = manifest.layout();
    let mut errors = 0;

    for entry in &manifest.bars {
        let path = manifest.resolve(entry);
        let mut problems = Vec::new();

        let missing: Vec<&str> = REQUIRED_ATTRIBUTES
            .iter()
            .copied()
            .filter(|key| !entry.attributes.contains_key(*key))
            .collect();
        if !missing.is_empty() {
            problems.push(format!("missing attributes: {}", missing.join(", ")));
        }

        let rows = match load_text_matrix(&path, manifest.delimiter) {
            Ok(data) => {
                for (name, index) in layout.datasets() {
                    if let Some(index) = index.filter(|i| *i >= data.ncols()) {
                        problems.push(format!(
                            "column {} for {} is outside the {} columns",
                            index,
                            name,
                            data.ncols()
                        ));
                    }
                }
                data.nrows()
            }
            Err(e) => {
                problems.push(e.to_string());
                0
            }
        };

        if problems.is_empty() {
            if !quiet {
                println!(
                    "  {} {} ({} rows)",
                    style("✓").green(),
                    style(&entry.name).cyan(),
                    rows
                );
            }
        } else {
            errors += 1;
            for problem in problems {
                eprintln!("  {} {}: {}", style("✗").red(), style(&entry.name).cyan(), problem);
            }
        }
    }

    if errors > 0 {
        return Err(miette::miette!("{} test bar(s) can not be imported", errors));
    }
    if !quiet {
        println!();
        println!("{}", style("Dry run complete. No files were created.").yellow());
    }
    Ok(())
}
