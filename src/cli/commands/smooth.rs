//! `cyclic smooth` command - Segment-local or cycle-aware smoothing

use clap::ValueEnum;
use console::style;
use miette::Result;

use crate::analysis::filter::{smoothen_all, KnotSpec, LocalFilter};
use crate::analysis::global_filter::{
    optimize_cycle_times, smooth_data, Knots, OptimizeOptions, SplineSettings,
};
use crate::analysis::linalg::norm;
use crate::cli::helpers::{Context, PvOpts};
use crate::cli::output::{Cell, Table};
use crate::cli::GlobalOpts;
use crate::core::{Channel, TestData};

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Method {
    /// Polynomial fit within each segment
    #[default]
    Polynomial,
    /// Piecewise linear spline within each segment
    Linear,
    /// Cubic spline within each segment
    Cubic,
    /// Piecewise polynomial over the whole test, with knots placed relative to each cycle
    Cycle,
}

#[derive(clap::Args, Debug)]
pub struct SmoothArgs {
    /// Test bar name
    pub bar: String,

    #[command(flatten)]
    pub pv: PvOpts,

    /// Smoothing method
    #[arg(long, short = 'm', value_enum, default_value_t = Method::Polynomial)]
    pub method: Method,

    /// Polynomial degree (polynomial method)
    #[arg(long, default_value_t = 3)]
    pub deg: usize,

    /// Knots per segment (linear/cubic) or per cycle (cycle). Segment methods default to a
    /// quarter of the segment length
    #[arg(long)]
    pub knots: Option<usize>,

    /// Polynomial order between knots (cycle method)
    #[arg(long, default_value_t = 3)]
    pub knot_order: u32,

    /// Continuity order at cycle boundaries (cycle method)
    #[arg(long, default_value_t = 0)]
    pub cycle_order: u32,

    /// Cycle duration; cycles otherwise start at the first peak/valley type
    #[arg(long)]
    pub period: Option<f64>,

    /// Optimize the cycle start times before smoothing (cycle method)
    #[arg(long)]
    pub optimize: bool,

    /// Channels fitted when optimizing the cycle times (default: sig, tau)
    #[arg(long, value_enum, value_delimiter = ',')]
    pub optimize_channels: Vec<Channel>,

    /// Maximum change of each cycle time when optimizing
    #[arg(long, default_value_t = 0.1)]
    pub dt_max: f64,

    /// Maximum number of optimization iterations
    #[arg(long, default_value_t = 100)]
    pub max_iter: usize,

    /// Also let the optimizer move the first and last cycle time
    #[arg(long)]
    pub free_ends: bool,

    /// Only every n-th sample in the output
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    pub every: u32,

    /// Print the residual per channel instead of the smoothed data
    #[arg(long)]
    pub residual: bool,

    /// Negate torque and rotation
    #[arg(long)]
    pub reverse_torsion: bool,
}

pub fn run(args: SmoothArgs, global: &GlobalOpts) -> Result<()> {
    let ctx = Context::load(global);
    let bar = ctx.read_bar(global, &args.bar, args.reverse_torsion)?;
    let data = &bar.data;

    let smooth = match args.method {
        Method::Cycle => smooth_cycles(&args, &ctx, data, global.quiet)?,
        method => {
            let knots = args.knots.map(KnotSpec::Count).unwrap_or_default();
            let filter = match method {
                Method::Linear => LocalFilter::LinearSegments { knots },
                Method::Cubic => LocalFilter::CubicSpline { knots },
                _ => LocalFilter::Polynomial { deg: args.deg },
            };
            let pv = args.pv.indices(data, &ctx.config)?;
            if pv.iter().all(Vec::is_empty) {
                tracing::warn!("No peaks or valleys found in {}, data is unchanged", bar.name);
            }
            smoothen_all(data, &pv, &filter)?
        }
    };

    if args.residual {
        let mut table = Table::new(["channel", "rms", "max"]);
        for channel in Channel::RESPONSE {
            let diff: Vec<f64> = smooth
                .channel(channel)
                .iter()
                .zip(data.channel(channel))
                .map(|(s, o)| s - o)
                .collect();
            let rms = if diff.is_empty() {
                0.0
            } else {
                norm(diff.iter().copied()) / (diff.len() as f64).sqrt()
            };
            let max = diff.iter().fold(0.0_f64, |m, d| m.max(d.abs()));
            table.push(vec![
                Cell::Text(channel.to_string()),
                Cell::Float(rms),
                Cell::Float(max),
            ]);
        }
        return table.print(ctx.format, global.quiet);
    }

    let mut table = Table::new(Channel::ALL.iter().map(|c| c.to_string()));
    for i in (0..smooth.len()).step_by(args.every as usize) {
        table.push(
            Channel::ALL
                .iter()
                .map(|c| Cell::Float(smooth.channel(*c)[i]))
                .collect(),
        );
    }
    table.print(ctx.format, global.quiet)
}

/// Start times of the cycles, from a fixed period or from the first pv type
fn cycle_times(args: &SmoothArgs, ctx: &Context, data: &TestData) -> Result<Vec<f64>> {
    let time = data.time();
    let (Some(&t0), Some(&t_end)) = (time.first(), time.last()) else {
        return Err(miette::miette!("Test bar has no data"));
    };

    if let Some(period) = args.period {
        if period <= 0.0 {
            return Err(miette::miette!("--period must be positive"));
        }
        let count = ((t_end - t0) / period).ceil() as usize;
        return Ok((0..=count.max(1)).map(|i| t0 + i as f64 * period).collect());
    }

    let pv = args.pv.indices(data, &ctx.config)?;
    let times: Vec<f64> = pv
        .first()
        .map(|first| first.iter().map(|&i| time[i]).collect())
        .unwrap_or_default();
    if times.len() < 2 {
        return Err(miette::miette!(
            help = "Use --period to give the cycle duration",
            "Found {} cycle start(s), at least two are required",
            times.len()
        ));
    }
    Ok(times)
}

fn smooth_cycles(args: &SmoothArgs, ctx: &Context, data: &TestData, quiet: bool) -> Result<TestData> {
    let settings = SplineSettings {
        knots: Knots::Count(args.knots.unwrap_or(10)),
        knot_order: args.knot_order,
        cycle_order: args.cycle_order,
    };
    let mut times = cycle_times(args, ctx, data)?;

    if args.optimize {
        let channels: Vec<Channel> = if args.optimize_channels.is_empty() {
            vec![Channel::Sig, Channel::Tau]
        } else {
            args.optimize_channels.clone()
        };
        let options = OptimizeOptions {
            dt_max: args.dt_max,
            max_iter: args.max_iter,
            fix_ends: !args.free_ends,
            ..Default::default()
        };
        let optimized = optimize_cycle_times(data, &times, &channels, &options)?;
        if !quiet {
            let shift = optimized
                .iter()
                .zip(&times)
                .fold(0.0_f64, |m, (a, b)| m.max((a - b).abs()));
            eprintln!(
                "{} Optimized {} cycle times (largest shift {:.4})",
                style("→").blue(),
                optimized.len(),
                shift
            );
        }
        times = optimized;
    }

    Ok(smooth_data(data, &times, None, &settings, None)?)
}
