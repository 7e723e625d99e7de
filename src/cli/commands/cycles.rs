//! `cyclic cycles` command - Peaks, valleys and per-segment values

use miette::Result;

use crate::analysis::cycle::{diff_values, mid_values, segments};
use crate::cli::helpers::{Context, PvOpts};
use crate::cli::output::{Cell, Table};
use crate::cli::GlobalOpts;
use crate::core::Channel;

#[derive(clap::Args, Debug)]
pub struct CyclesArgs {
    /// Test bar name
    pub bar: String,

    #[command(flatten)]
    pub pv: PvOpts,

    /// Channels to evaluate per segment (default: sig, eps, tau, gam)
    #[arg(long, short = 'c', value_enum, value_delimiter = ',')]
    pub channels: Vec<Channel>,

    /// Only list the peak and valley indices
    #[arg(long)]
    pub indices: bool,

    /// Negate torque and rotation
    #[arg(long)]
    pub reverse_torsion: bool,
}

pub fn run(args: CyclesArgs, global: &GlobalOpts) -> Result<()> {
    let ctx = Context::load(global);
    let bar = ctx.read_bar(global, &args.bar, args.reverse_torsion)?;
    let data = &bar.data;
    let pv = args.pv.indices(data, &ctx.config)?;

    if args.indices {
        let mut table = Table::new(["type", "cycle", "index", "time", "stp"]);
        for (k, indices) in pv.iter().enumerate() {
            for (j, &i) in indices.iter().enumerate() {
                table.push(vec![
                    Cell::from(k),
                    Cell::from(j),
                    Cell::from(i),
                    Cell::Float(data.time()[i]),
                    Cell::Float(data.stp()[i]),
                ]);
            }
        }
        return table.print(ctx.format, global.quiet);
    }

    let channels: Vec<Channel> = if args.channels.is_empty() {
        Channel::RESPONSE.to_vec()
    } else {
        args.channels.clone()
    };
    let mids = mid_values(data, &channels, &pv);
    let diffs = diff_values(data, &channels, &pv);

    let mut headers: Vec<String> = ["type", "cycle", "start", "end"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    for c in &channels {
        headers.push(format!("mid_{}", c));
        headers.push(format!("diff_{}", c));
    }

    let mut table = Table::new(headers).with_summary("segment");
    for (k, segs) in segments(&pv).iter().enumerate() {
        for (j, seg) in segs.iter().enumerate() {
            let mut row = vec![
                Cell::from(k),
                Cell::from(j),
                Cell::from(seg.start),
                Cell::from(seg.end),
            ];
            for c in &channels {
                let mid = mids.get(c).and_then(|m| m.get(k)).and_then(|m| m.get(j));
                let diff = diffs.get(c).and_then(|d| d.get(k)).and_then(|d| d.get(j));
                row.push(Cell::from(mid.copied()));
                row.push(Cell::from(diff.copied()));
            }
            table.push(row);
        }
    }
    table.print(ctx.format, global.quiet)
}
