//! Shell completion scripts for `cyclic`
//!
//! The scripts complete subcommands, options and the fixed value sets such as channel
//! names (`--channels sig,eps`), output formats and filter kinds. Test bar names are
//! read from the data file at run time and are not completed.
//!
//! ```bash
//! # Bash, in ~/.bashrc
//! source <(cyclic completions bash)
//!
//! # Fish
//! cyclic completions fish -o ~/.config/fish/completions/cyclic.fish
//! ```

use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;

use clap::CommandFactory;
use clap_complete::{generate, Shell};
use miette::{IntoDiagnostic, Result, WrapErr};

use crate::cli::Cli;

#[derive(clap::Args, Debug)]
#[command(after_help = "Example: source <(cyclic completions bash)")]
pub struct CompletionsArgs {
    /// Shell to generate the completion script for
    #[arg(value_enum)]
    pub shell: Shell,

    /// Write the script to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

pub fn run(args: CompletionsArgs) -> Result<()> {
    match &args.output {
        Some(path) => {
            let mut file = File::create(path)
                .into_diagnostic()
                .wrap_err_with(|| format!("Failed to create {}", path.display()))?;
            write_script(args.shell, &mut file);
            tracing::info!("Wrote {} completions to {}", args.shell, path.display());
        }
        None => write_script(args.shell, &mut io::stdout()),
    }
    Ok(())
}

fn write_script(shell: Shell, out: &mut dyn Write) {
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "cyclic", out);
}
