//! `cyclic show` command - Attributes and channel summary of one test bar

use console::style;
use miette::Result;
use serde::Serialize;

use crate::cli::helpers::Context;
use crate::cli::output::{print_structured, Cell, Table};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::Channel;
use crate::io::Attributes;

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Test bar name
    pub bar: String,

    /// Negate torque and rotation
    #[arg(long)]
    pub reverse_torsion: bool,
}

#[derive(Debug, Serialize)]
struct Summary {
    name: String,
    len: usize,
    min: Option<f64>,
    max: Option<f64>,
}

impl Summary {
    fn new(name: &str, values: &[f64]) -> Self {
        let finite = values.iter().copied().filter(|v| v.is_finite());
        let (min, max) = finite.fold((None, None), |(lo, hi): (Option<f64>, Option<f64>), v| {
            (
                Some(lo.map_or(v, |lo| lo.min(v))),
                Some(hi.map_or(v, |hi| hi.max(v))),
            )
        });
        Self {
            name: name.to_string(),
            len: values.len(),
            min,
            max,
        }
    }
}

#[derive(Debug, Serialize)]
struct ShowOutput {
    name: String,
    attributes: Attributes,
    datasets: Vec<Summary>,
    channels: Vec<Summary>,
}

pub fn run(args: ShowArgs, global: &GlobalOpts) -> Result<()> {
    let ctx = Context::load(global);
    let reader = ctx.open(global, args.reverse_torsion)?;
    let bar = reader.read_bar(&args.bar)?;

    let mut datasets = Vec::new();
    for name in reader.dataset_names(&args.bar)? {
        datasets.push(Summary::new(&name, &reader.raw_channel(&args.bar, &name)?));
    }
    reader.close()?;

    let channels: Vec<Summary> = Channel::ALL
        .iter()
        .map(|c| Summary::new(c.as_str(), bar.data.channel(*c)))
        .collect();

    let output = ShowOutput {
        name: bar.name,
        attributes: bar.attributes,
        datasets,
        channels,
    };

    match ctx.format {
        OutputFormat::Json | OutputFormat::Yaml => print_structured(&output, ctx.format),
        OutputFormat::Auto => {
            println!("{}", style(&output.name).bold().cyan());
            println!();
            println!("{}", style("Attributes").bold());
            let width = output.attributes.keys().map(String::len).max().unwrap_or(0);
            for (key, value) in &output.attributes {
                println!("  {:<width$}  {}", key, value, width = width);
            }
            println!();
            println!("{}", style("Stored datasets").bold());
            summary_table(&output.datasets).print(ctx.format, true)?;
            println!();
            println!("{}", style("Converted channels").bold());
            summary_table(&output.channels).print(ctx.format, true)
        }
        _ => {
            let mut all = output.datasets;
            all.extend(output.channels);
            summary_table(&all).print(ctx.format, true)
        }
    }
}

fn summary_table(summaries: &[Summary]) -> Table {
    let mut table = Table::new(["name", "len", "min", "max"]);
    for s in summaries {
        table.push(vec![
            Cell::Text(s.name.clone()),
            Cell::from(s.len),
            Cell::from(s.min),
            Cell::from(s.max),
        ]);
    }
    table
}
