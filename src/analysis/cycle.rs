//! Cycle analysis: peaks, valleys and the segments between them
//!
//! Peak and valley ("pv") indices are stored as one index list per characteristic
//! point type. For proportional loading there are two types (peaks and valleys); for
//! e.g. a square loading path there are four. Points do not have to be actual peaks:
//! any characteristic points of the experiment (such as a valley followed by the
//! yield point) can be used.

use std::collections::BTreeMap;

use crate::core::{Channel, TestData};

/// Indices of characteristic points, one list per point type
pub type PvIndices = Vec<Vec<usize>>;

/// Default tolerance for detecting an increase of the step counter
pub const DEFAULT_STP_TOLERANCE: f64 = 1.0e-6;

/// A segment of the test data between two consecutive characteristic points
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    pub start: usize,
    pub end: usize,
}

impl Segment {
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Indices where the step counter increases by more than `tol`, always starting with 0
pub fn stp_change_indices(stp: &[f64], tol: f64) -> Vec<usize> {
    if stp.is_empty() {
        return Vec::new();
    }
    let mut indices = vec![0];
    indices.extend(
        stp.windows(2)
            .enumerate()
            .filter(|(_, w)| w[1] - w[0] > tol)
            .map(|(i, _)| i + 1),
    );
    indices
}

/// Peak and valley indices from the step changes
///
/// The first `num_skip` step changes are ignored; the remaining ones are distributed
/// round-robin over `num_per_cycle` point types.
pub fn pv_indices(data: &TestData, num_per_cycle: usize, num_skip: usize) -> PvIndices {
    pv_indices_with_tolerance(data, num_per_cycle, num_skip, DEFAULT_STP_TOLERANCE)
}

/// Same as [`pv_indices`] with a custom step change tolerance
pub fn pv_indices_with_tolerance(
    data: &TestData,
    num_per_cycle: usize,
    num_skip: usize,
    tol: f64,
) -> PvIndices {
    let changes = stp_change_indices(data.stp(), tol);
    let changes = changes.get(num_skip..).unwrap_or(&[]);
    (0..num_per_cycle)
        .map(|k| changes.iter().skip(k).step_by(num_per_cycle).copied().collect())
        .collect()
}

/// Peak and valley indices requiring a minimum change between accepted points
///
/// Step changes are visited in order. A change index is accepted as the next point
/// only when `change_fn(data, last_accepted, candidate)` exceeds `min_change`.
/// The first step change (index 0) is always accepted as the first point type. Step
/// changes are detected with tolerance `tol` as in [`pv_indices_with_tolerance`].
pub fn pv_indices_change<F>(
    data: &TestData,
    min_change: f64,
    change_fn: F,
    num_per_cycle: usize,
    tol: f64,
) -> PvIndices
where
    F: Fn(&TestData, usize, usize) -> f64,
{
    let mut pv: PvIndices = vec![Vec::new(); num_per_cycle];
    if num_per_cycle == 0 {
        return pv;
    }

    let changes = stp_change_indices(data.stp(), tol);
    let Some(&first) = changes.first() else {
        return pv;
    };

    pv[0].push(first);
    let mut last = first;
    let mut next_type = 1 % num_per_cycle;
    for &candidate in &changes[1..] {
        if change_fn(data, last, candidate) > min_change {
            pv[next_type].push(candidate);
            last = candidate;
            next_type = (next_type + 1) % num_per_cycle;
        }
    }
    pv
}

/// Peak and valley indices requiring a minimum change in von Mises strain space
pub fn pv_indices_change_strain(
    data: &TestData,
    min_change: f64,
    num_per_cycle: usize,
    tol: f64,
) -> PvIndices {
    pv_indices_change(data, min_change, strain_change, num_per_cycle, tol)
}

/// Effective von Mises strain change from sample `i1` to sample `i2`
pub fn strain_change(data: &TestData, i1: usize, i2: usize) -> f64 {
    let deps = data.eps()[i2] - data.eps()[i1];
    let dgam = data.gam()[i2] - data.gam()[i1];
    super::von_mises::evm(deps, dgam)
}

/// Start and end of each segment, grouped by point type
///
/// Segment type `k` runs from `pv[k][j]` to `pv[k + 1][j]`, and the last type runs
/// from `pv[n - 1][j]` to `pv[0][j + 1]`. Starts without a matching end are dropped.
pub fn segments(pv: &[Vec<usize>]) -> Vec<Vec<Segment>> {
    let n = pv.len();
    (0..n)
        .map(|k| {
            let starts = &pv[k];
            let ends: &[usize] = if k + 1 < n {
                &pv[k + 1]
            } else {
                pv[0].get(1..).unwrap_or(&[])
            };
            starts
                .iter()
                .zip(ends)
                .map(|(&start, &end)| Segment { start, end })
                .collect()
        })
        .collect()
}

/// Values per segment for each channel, computed by `op(value_at_start, value_at_end)`
///
/// The result maps each channel to one list per segment type.
pub fn segment_values<F>(
    data: &TestData,
    channels: &[Channel],
    pv: &[Vec<usize>],
    op: F,
) -> BTreeMap<Channel, Vec<Vec<f64>>>
where
    F: Fn(f64, f64) -> f64,
{
    let segs = segments(pv);
    channels
        .iter()
        .map(|&channel| {
            let values = data.channel(channel);
            let per_type = segs
                .iter()
                .map(|segs| {
                    segs.iter()
                        .map(|s| op(values[s.start], values[s.end]))
                        .collect()
                })
                .collect();
            (channel, per_type)
        })
        .collect()
}

/// Mean of the start and end value of every segment
pub fn mid_values(data: &TestData, channels: &[Channel], pv: &[Vec<usize>]) -> BTreeMap<Channel, Vec<Vec<f64>>> {
    segment_values(data, channels, pv, |a, b| (a + b) / 2.0)
}

/// Change from start to end of every segment
pub fn diff_values(data: &TestData, channels: &[Channel], pv: &[Vec<usize>]) -> BTreeMap<Channel, Vec<Vec<f64>>> {
    segment_values(data, channels, pv, |a, b| b - a)
}
