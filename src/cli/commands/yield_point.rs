//! `cyclic yield` command - Elastic moduli and offset yield points per segment

use miette::Result;

use crate::analysis::von_mises::vm;
use crate::analysis::yield_point::{get_yield, YieldOptions};
use crate::cli::helpers::{Context, PvOpts};
use crate::cli::output::{Cell, Table};
use crate::cli::GlobalOpts;
use crate::core::DataPoint;

#[derive(clap::Args, Debug)]
pub struct YieldArgs {
    /// Test bar name
    pub bar: String,

    #[command(flatten)]
    pub pv: PvOpts,

    /// Effective plastic strain offset defining yield (default: yield_offset from the configuration)
    #[arg(long)]
    pub offset: Option<f64>,

    /// Von Mises stress changes bounding the elastic fit, e.g. `-1,200`
    #[arg(long, value_delimiter = ',', allow_negative_numbers = true)]
    pub delta_vm: Vec<f64>,

    /// Ignore the axial component
    #[arg(long, conflicts_with = "no_shear")]
    pub no_axial: bool,

    /// Ignore the shear component
    #[arg(long)]
    pub no_shear: bool,

    /// Negate torque and rotation
    #[arg(long)]
    pub reverse_torsion: bool,
}

pub fn run(args: YieldArgs, global: &GlobalOpts) -> Result<()> {
    let ctx = Context::load(global);
    let bar = ctx.read_bar(global, &args.bar, args.reverse_torsion)?;
    let pv = args.pv.indices(&bar.data, &ctx.config)?;

    let delta_vm = match args.delta_vm.as_slice() {
        [] => ctx.config.delta_vm(),
        [lo, hi] => (*lo, *hi),
        other => {
            return Err(miette::miette!(
                "--delta-vm takes two values, got {}",
                other.len()
            ))
        }
    };
    let options = YieldOptions {
        offset: args.offset.unwrap_or_else(|| ctx.config.yield_offset()),
        delta_vm,
        axial: !args.no_axial,
        shear: !args.no_shear,
    };
    tracing::debug!("Yield options: {:?}", options);

    let records = get_yield(&bar.data, &pv, &options)?;

    let mut table = Table::new([
        "type", "cycle", "start", "end", "emod", "gmod", "time", "sig", "tau", "eps", "gam", "vm",
    ])
    .with_summary("segment");
    for (k, per_type) in records.iter().enumerate() {
        for (j, record) in per_type.iter().enumerate() {
            let mut row = vec![
                Cell::from(k),
                Cell::from(j),
                Cell::from(record.start),
                Cell::from(record.end),
                Cell::from(record.emod),
                Cell::from(record.gmod),
            ];
            let point = record.point.as_ref();
            let value = |f: fn(&DataPoint) -> f64| Cell::from(point.map(f));
            row.push(value(|p| p.time));
            row.push(value(|p| p.sig));
            row.push(value(|p| p.tau));
            row.push(value(|p| p.eps));
            row.push(value(|p| p.gam));
            row.push(value(|p| vm(p.sig, p.tau)));
            table.push(row);
        }
    }
    table.print(ctx.format, global.quiet)
}
