//! Cycle-aware smoothing with piecewise polynomials
//!
//! The smoothed response is
//!
//! ```text
//! f(t) = Σ_{j<Nco} k_j ((t - t_0)/(t_end - t_0))^j
//!      + Σ_cycles [ Σ_{j=Nco}^{Nko} p_ij <t - t_i>^j + Σ_k q_ik <t - t_ik>^Nko ]
//! ```
//!
//! where `Nco` is the cycle order, `Nko` the knot order, `t_i` the cycle start times and
//! `t_ik` the knots within each cycle. The derivatives of order below `Nco` are continuous
//! at the cycle times, those below `Nko` at the knots.
//!
//! The cycle times themselves can be tuned with [`optimize_cycle_times`] to minimize the
//! fit residual.

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use super::linalg::{linspace, lstsq, lstsq_columns, macaulay, norm};
use super::AnalysisError;
use crate::core::{Channel, TestData};

/// Knot placement within each cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Knots {
    /// Number of uniformly distributed interior knots
    Count(usize),
    /// Relative positions within the cycle, between 0 and 1
    Positions(Vec<f64>),
}

impl Knots {
    /// Relative knot positions within a cycle
    pub fn relative_positions(&self) -> Vec<f64> {
        match self {
            Knots::Count(n) => {
                let all = linspace(0.0, 1.0, n + 2);
                all[1..all.len() - 1].to_vec()
            }
            Knots::Positions(positions) => positions.clone(),
        }
    }
}

/// Shape of the piecewise polynomial
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplineSettings {
    pub knots: Knots,
    pub knot_order: u32,
    pub cycle_order: u32,
}

impl Default for SplineSettings {
    fn default() -> Self {
        Self {
            knots: Knots::Count(10),
            knot_order: 3,
            cycle_order: 0,
        }
    }
}

/// Settings for [`optimize_cycle_times`]
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizeOptions {
    /// Maximum change of each cycle time
    pub dt_max: f64,
    pub max_iter: usize,
    pub spline: SplineSettings,
    /// Only use the first `max_len` samples
    pub max_len: Option<usize>,
    /// Keep the first and last cycle time
    pub fix_ends: bool,
}

impl Default for OptimizeOptions {
    fn default() -> Self {
        Self {
            dt_max: 0.1,
            max_iter: 100,
            spline: SplineSettings {
                knots: Knots::Count(0),
                knot_order: 1,
                cycle_order: 1,
            },
            max_len: None,
            fix_ends: true,
        }
    }
}

/// Matrix `A` such that the smoothed response is `A c` for the fitted coefficients `c`
pub fn fit_matrix(
    time: &[f64],
    cycle_times: &[f64],
    settings: &SplineSettings,
) -> Result<DMatrix<f64>, AnalysisError> {
    let SplineSettings {
        knots,
        knot_order,
        cycle_order,
    } = settings;
    let (knot_order, cycle_order) = (*knot_order, *cycle_order);
    if knot_order < cycle_order {
        return Err(AnalysisError::InvalidOptions(format!(
            "knot order ({knot_order}) must not be lower than the cycle order ({cycle_order})"
        )));
    }
    if cycle_times.len() < 2 {
        return Err(AnalysisError::InvalidOptions(
            "at least two cycle times are required".to_string(),
        ));
    }
    let (Some(&t_first), Some(&t_last)) = (time.first(), time.last()) else {
        return Err(AnalysisError::TooFewPoints { needed: 1, got: 0 });
    };

    let t_knots = knots.relative_positions();
    let num_cycles = cycle_times.len() - 1;
    let per_cycle = (1 + knot_order - cycle_order) as usize + t_knots.len();
    let num_params = cycle_order as usize + num_cycles * per_cycle;
    let mut a = DMatrix::zeros(time.len(), num_params);

    let span = if t_last != t_first { t_last - t_first } else { 1.0 };
    let mut col = 0;
    for j in 0..cycle_order {
        for (r, t) in time.iter().enumerate() {
            a[(r, col)] = if j == 0 {
                1.0
            } else {
                ((t - t_first) / span).powi(j as i32)
            };
        }
        col += 1;
    }

    for w in cycle_times.windows(2) {
        let (t1, t2) = (w[0], w[1]);
        for j in cycle_order..=knot_order {
            for (r, &t) in time.iter().enumerate() {
                // Step function for j == 0, zero before the cycle starts
                a[(r, col)] = if j == 0 {
                    if t > t1 {
                        1.0
                    } else {
                        0.0
                    }
                } else {
                    macaulay(t - t1).powi(j as i32)
                };
            }
            col += 1;
        }

        for t_knot in &t_knots {
            let t_k = t1 + (t2 - t1) * t_knot;
            for (r, &t) in time.iter().enumerate() {
                a[(r, col)] = if knot_order == 0 {
                    if t > t_k {
                        1.0
                    } else {
                        0.0
                    }
                } else {
                    macaulay(t - t_k).powi(knot_order as i32)
                };
            }
            col += 1;
        }
    }

    Ok(a)
}

/// Least squares fit of each channel to the piecewise polynomial
///
/// Channels default to the response channels; time and step are left unchanged. With
/// `max_len`, only the first `max_len` samples are fitted and returned.
pub fn smooth_data(
    data: &TestData,
    cycle_times: &[f64],
    channels: Option<&[Channel]>,
    settings: &SplineSettings,
    max_len: Option<usize>,
) -> Result<TestData, AnalysisError> {
    let mut smooth = match max_len {
        Some(len) => data.truncated(len),
        None => data.clone(),
    };
    let channels = channels.unwrap_or(&Channel::RESPONSE);
    if channels.is_empty() {
        return Ok(smooth);
    }

    let a = fit_matrix(smooth.time(), cycle_times, settings)?;
    let n = smooth.len();
    let b = DMatrix::from_fn(n, channels.len(), |r, c| smooth.channel(channels[c])[r]);
    let fitted = &a * lstsq_columns(&a, &b)?;

    for (c, &channel) in channels.iter().enumerate() {
        smooth.set(channel, fitted.column(c).iter().copied().collect())?;
    }
    Ok(smooth)
}

/// Locality weight, 1 at `t = 0` and 5 % at `|t| = t5`
pub fn scale_fn(t: f64, t5: f64) -> f64 {
    (-3.0 * (t / t5).powi(2)).exp()
}

/// Fit residual as a function of the cycle times
///
/// Besides the total (range-scaled) residual norm, a squared residual norm per cycle time
/// is reported where the residual is weighted by [`scale_fn`] around that time. This local
/// error mostly depends on its own cycle time and is close to quadratic in it, which the
/// optimizer relies on.
pub struct CycleTimeObjective<'a> {
    pub data: &'a TestData,
    pub channels: &'a [Channel],
    pub settings: &'a SplineSettings,
    pub t5: f64,
    pub max_len: Option<usize>,
}

impl CycleTimeObjective<'_> {
    pub fn evaluate(&self, cycle_times: &[f64]) -> Result<(f64, Vec<f64>), AnalysisError> {
        let smooth = smooth_data(
            self.data,
            cycle_times,
            Some(self.channels),
            self.settings,
            self.max_len,
        )?;
        let n = smooth.len();
        let time = smooth.time();
        let mut err = 0.0;
        let mut local = vec![0.0; cycle_times.len()];

        for &channel in self.channels {
            let original = &self.data.channel(channel)[..n];
            let (lo, hi) = original
                .iter()
                .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
            let sfac = if hi > lo { 1.0 / (hi - lo) } else { 1.0 };
            let residual: Vec<f64> = smooth
                .channel(channel)
                .iter()
                .zip(original)
                .map(|(s, o)| s - o)
                .collect();

            err += norm(residual.iter().copied()) * sfac;
            for (e, &tc) in local.iter_mut().zip(cycle_times) {
                let weighted = residual
                    .iter()
                    .zip(time)
                    .map(|(r, &t)| r * scale_fn(t - tc, self.t5));
                *e += norm(weighted).powi(2) * sfac;
            }
        }
        Ok((err, local))
    }
}

/// Adjust the cycle times to minimize the fit residual of `channels`
///
/// This works best for the controlled channel(s) and the default linear interpolation
/// within each cycle, i.e. when the control is linear within each cycle. With
/// `fix_ends`, only the interior cycle times are changed. The first cycle time barely
/// affects the fit when it lies before the first sample, and the last one only through
/// the knots of the last cycle, so they would otherwise drift.
pub fn optimize_cycle_times(
    data: &TestData,
    cycle_times: &[f64],
    channels: &[Channel],
    options: &OptimizeOptions,
) -> Result<Vec<f64>, AnalysisError> {
    if channels.is_empty() {
        return Err(AnalysisError::InvalidOptions(
            "at least one channel is required to optimize cycle times".to_string(),
        ));
    }
    let objective = CycleTimeObjective {
        data,
        channels,
        settings: &options.spline,
        t5: 3.0 * options.dt_max,
        max_len: options.max_len,
    };
    let (dt_init, dt_tol) = (options.dt_max / 10.0, options.dt_max / 1000.0);

    if !options.fix_ends {
        return minimize(
            |t| objective.evaluate(t),
            cycle_times,
            dt_init,
            options.dt_max,
            dt_tol,
            options.max_iter,
        );
    }

    let n = cycle_times.len();
    if n < 3 {
        return Ok(cycle_times.to_vec());
    }
    let (first, last) = (cycle_times[0], cycle_times[n - 1]);
    let with_ends = |inner: &[f64]| {
        let mut t = Vec::with_capacity(n);
        t.push(first);
        t.extend_from_slice(inner);
        t.push(last);
        t
    };
    let inner = minimize(
        |inner| {
            let (err, local) = objective.evaluate(&with_ends(inner))?;
            Ok((err, local[1..n - 1].to_vec()))
        },
        &cycle_times[1..n - 1],
        dt_init,
        options.dt_max,
        dt_tol,
        options.max_iter,
    )?;
    Ok(with_ends(&inner))
}

/// Minimize `objective` by changing each entry of `t0` with a per-entry line search
///
/// `objective(t)` returns the total error and one error per entry of `t`, where each
/// entry's error is assumed to depend mostly on that entry alone. The search is restarted
/// from the best times found as long as the total error decreases, with an initial step
/// of half the distance moved in the previous search. `max_iter` bounds the number of
/// evaluations over all searches. Returns the best times found.
pub fn minimize<F>(
    mut objective: F,
    t0: &[f64],
    dt_init: f64,
    dt_max: f64,
    dt_change_tol: f64,
    max_iter: usize,
) -> Result<Vec<f64>, AnalysisError>
where
    F: FnMut(&[f64]) -> Result<(f64, Vec<f64>), AnalysisError>,
{
    let (err, local) = objective(t0)?;
    let mut start = SearchPoint {
        err,
        local,
        t: t0.to_vec(),
    };
    let mut dt_init = dt_init;
    let mut budget = max_iter;

    while budget > 0 {
        let (best, iterations) =
            line_search(&mut objective, &start, dt_init, dt_max, dt_change_tol, budget)?;
        budget -= iterations;

        let moved = start
            .t
            .iter()
            .zip(&best.t)
            .map(|(a, b)| (a - b).abs())
            .fold(0.0, f64::max);
        if best.err >= start.err {
            return Ok(start.t);
        }
        if moved < dt_change_tol {
            return Ok(best.t);
        }
        tracing::debug!(error = best.err, moved, "restarting cycle time search");
        start = best;
        dt_init = (0.5 * moved).max(dt_change_tol);
    }

    tracing::warn!(
        "Cycle time optimization did not converge in {} iterations, using best error {:.3e}",
        max_iter,
        start.err
    );
    Ok(start.t)
}

/// Times with their total and per-entry errors
#[derive(Debug, Clone)]
struct SearchPoint {
    err: f64,
    local: Vec<f64>,
    t: Vec<f64>,
}

/// One line search from `start`, returning the best point and the number of evaluations
///
/// It stops when no entry changes by more than `dt_change_tol` or after `max_iter`
/// evaluations.
fn line_search<F>(
    objective: &mut F,
    start: &SearchPoint,
    dt_init: f64,
    dt_max: f64,
    dt_change_tol: f64,
    max_iter: usize,
) -> Result<(SearchPoint, usize), AnalysisError>
where
    F: FnMut(&[f64]) -> Result<(f64, Vec<f64>), AnalysisError>,
{
    let n = start.t.len();
    let mut dt = DMatrix::zeros(4, n);
    let mut fe = DMatrix::zeros(4, n);
    set_row(&mut fe, 0, &start.local);
    let mut best = start.clone();
    let mut err = start.err;
    let mut dt_change = dt_init;

    for n_iter in 0..max_iter {
        update_step(&mut dt, &mut fe, dt_change, dt_max, n_iter)?;
        let err_old = err;
        let t: Vec<f64> = start
            .t
            .iter()
            .enumerate()
            .map(|(i, t)| t + dt[(0, i)])
            .collect();
        let (e, local) = objective(&t)?;
        err = e;
        set_row(&mut fe, 0, &local);
        tracing::debug!(iteration = n_iter, error = err, "cycle time optimization");

        if err < best.err {
            best = SearchPoint { err, local, t };
        }
        if err > err_old && n_iter > 0 {
            dt_change /= 2.0;
        }
        if (0..n).all(|i| (dt[(0, i)] - dt[(1, i)]).abs() < dt_change_tol) {
            return Ok((best, n_iter + 1));
        }
    }
    Ok((best, max_iter))
}

/// Next time changes (row 0 of `dt`) from the history of changes and local errors
///
/// Rows are shifted down first, so rows 1 to 3 hold the three latest evaluations.
/// - iteration 0: all times change by `dt_change`
/// - iteration 1: step along the negative error gradient, `dt_change` when descending and
///   `2 dt_change` back otherwise
/// - later: minimum of a quadratic through the last three evaluations. If the quadratic is
///   concave or its minimum is further than `dt_max` away, step `dt_change` along the
///   negative gradient from the latest evaluation instead.
pub fn update_step(
    dt: &mut DMatrix<f64>,
    fe: &mut DMatrix<f64>,
    dt_change: f64,
    dt_max: f64,
    n_iter: usize,
) -> Result<(), AnalysisError> {
    for i in (1..dt.nrows()).rev() {
        for c in 0..dt.ncols() {
            dt[(i, c)] = dt[(i - 1, c)];
            fe[(i, c)] = fe[(i - 1, c)];
        }
    }

    let gradient = |dt: &DMatrix<f64>, fe: &DMatrix<f64>, c: usize| {
        (fe[(1, c)] - fe[(2, c)]) / (dt[(1, c)] - dt[(2, c)])
    };

    match n_iter {
        0 => {
            for c in 0..dt.ncols() {
                dt[(0, c)] += dt_change;
            }
        }
        1 => {
            for c in 0..dt.ncols() {
                dt[(0, c)] += if gradient(dt, fe, c) < 0.0 {
                    dt_change
                } else {
                    -2.0 * dt_change
                };
            }
        }
        _ => {
            for c in 0..dt.ncols() {
                let a = DMatrix::from_fn(3, 3, |r, j| dt[(r + 1, c)].powi(j as i32));
                let b = DVector::from_fn(3, |r, _| fe[(r + 1, c)]);
                let k = lstsq(&a, &b)?.solution;
                let dt_new = -k[1] / (2.0 * k[2]);

                dt[(0, c)] = if k[2] < 0.0 || !dt_new.is_finite() || dt_new.abs() > dt_max {
                    if gradient(dt, fe, c) < 0.0 {
                        dt[(1, c)] + dt_change
                    } else {
                        dt[(1, c)] - dt_change
                    }
                } else {
                    dt_new
                };
            }
        }
    }
    Ok(())
}

fn set_row(m: &mut DMatrix<f64>, row: usize, values: &[f64]) {
    for (c, v) in values.iter().enumerate() {
        m[(row, c)] = *v;
    }
}
