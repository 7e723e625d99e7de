//! `cyclic table` command - HTML overview of the test bar attributes

use console::style;
use miette::Result;
use std::path::PathBuf;

use crate::cli::helpers::Context;
use crate::cli::GlobalOpts;
use crate::io::FormatSpec;
use crate::report::write_html_table;

#[derive(clap::Args, Debug)]
pub struct TableArgs {
    /// Attributes to include, one column each
    #[arg(long, short = 'a', value_delimiter = ',', required = true)]
    pub attrs: Vec<String>,

    /// Format per attribute, e.g. `s,5.1f,10.4e` (default: plain conversion)
    #[arg(long, value_delimiter = ',')]
    pub formats: Vec<FormatSpec>,

    /// Directory to (re)create with test_data.html, style.css and table.js
    #[arg(long, short = 'o', default_value = "test_data_html_table")]
    pub output_dir: PathBuf,
}

pub fn run(args: TableArgs, global: &GlobalOpts) -> Result<()> {
    let ctx = Context::load(global);
    let reader = ctx.open(global, false)?;
    let formats = (!args.formats.is_empty()).then_some(args.formats.as_slice());

    let path = write_html_table(&reader, &args.attrs, formats, &args.output_dir)?;
    reader.close()?;

    if !global.quiet {
        println!(
            "{} Wrote {}",
            style("✓").green(),
            style(path.display()).yellow()
        );
    }
    Ok(())
}
