//! `cyclic list` command - Test bars and their attributes

use miette::Result;
use std::collections::BTreeSet;

use crate::cli::helpers::{parse_key_values, truncate_str, Context};
use crate::cli::output::{Cell, Table};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::io::AttrValue;

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Only test bars whose attribute equals the value (key=value, repeatable)
    #[arg(long = "where", short = 'w', value_name = "KEY=VALUE")]
    pub filters: Vec<String>,

    /// Attributes to show (default: all attributes found)
    #[arg(long, short = 'c', value_delimiter = ',')]
    pub columns: Vec<String>,

    /// Only print the names of the matching test bars
    #[arg(long)]
    pub names: bool,
}

pub fn run(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let ctx = Context::load(global);
    let reader = ctx.open(global, false)?;
    let query = parse_key_values(&args.filters)?;
    let names = reader.names_by_attributes(&query)?;

    if args.names {
        for name in &names {
            println!("{}", name);
        }
        return Ok(());
    }

    let attributes = names
        .iter()
        .map(|name| reader.attributes(name))
        .collect::<Result<Vec<_>, _>>()?;

    let columns: Vec<String> = if args.columns.is_empty() {
        let all: BTreeSet<&String> = attributes.iter().flat_map(|a| a.keys()).collect();
        all.into_iter().cloned().collect()
    } else {
        args.columns.clone()
    };

    let mut headers = vec!["bar".to_string()];
    headers.extend(columns.iter().cloned());
    let mut table = Table::new(headers).with_summary("test bar");
    for (name, attrs) in names.iter().zip(&attributes) {
        let mut row = vec![Cell::Name(name.clone())];
        for column in &columns {
            row.push(match attrs.get(column) {
                Some(AttrValue::Int(i)) => Cell::Int(*i),
                Some(AttrValue::Float(x)) => Cell::Float(*x),
                Some(AttrValue::Text(s)) if ctx.format == OutputFormat::Auto => {
                    Cell::Text(truncate_str(s, 40))
                }
                Some(AttrValue::Text(s)) => Cell::Text(s.clone()),
                None => Cell::Empty,
            });
        }
        table.push(row);
    }

    reader.close()?;
    table.print(ctx.format, global.quiet)
}
