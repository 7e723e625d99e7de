//! `cyclic vm` command - Von Mises measures over time

use miette::Result;

use crate::analysis::von_mises::{evm_series, vm_angle, vm_series};
use crate::cli::helpers::Context;
use crate::cli::output::{Cell, Table};
use crate::cli::GlobalOpts;

#[derive(clap::Args, Debug)]
pub struct VmArgs {
    /// Test bar name
    pub bar: String,

    /// Only every n-th sample
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    pub every: u32,

    /// Negate torque and rotation
    #[arg(long)]
    pub reverse_torsion: bool,
}

pub fn run(args: VmArgs, global: &GlobalOpts) -> Result<()> {
    let ctx = Context::load(global);
    let bar = ctx.read_bar(global, &args.bar, args.reverse_torsion)?;
    let data = &bar.data;

    let vm = vm_series(data.sig(), data.tau());
    let evm = evm_series(data.eps(), data.gam());
    let angle = vm_angle(data.sig(), data.tau());

    let mut table = Table::new(["time", "vm", "evm", "angle"]);
    for i in (0..data.len()).step_by(args.every as usize) {
        table.push(vec![
            Cell::Float(data.time()[i]),
            Cell::Float(vm[i]),
            Cell::Float(evm[i]),
            Cell::Float(angle[i]),
        ]);
    }
    table.print(ctx.format, global.quiet)
}
