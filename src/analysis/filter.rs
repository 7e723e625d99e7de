//! Smoothing of test data within the segments between peaks and valleys
//!
//! Each segment is filtered on its own, so that the sharp turning points at the peaks and
//! valleys are kept while noise in between is removed.

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use super::linalg::{linspace, lstsq, polyfit, polyval};
use super::AnalysisError;
use crate::core::{Channel, TestData};

/// A smoothing function for one segment: `values` sampled at `time` in, smoothed values out
pub trait SegmentFilter {
    fn smooth(&self, time: &[f64], values: &[f64]) -> Result<Vec<f64>, AnalysisError>;
}

impl<F> SegmentFilter for F
where
    F: Fn(&[f64], &[f64]) -> Result<Vec<f64>, AnalysisError>,
{
    fn smooth(&self, time: &[f64], values: &[f64]) -> Result<Vec<f64>, AnalysisError> {
        self(time, values)
    }
}

/// How knots are placed over a segment
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KnotSpec {
    /// `floor(len * fraction)` knots
    Fraction(f64),
    /// A fixed number of knots
    Count(usize),
}

impl Default for KnotSpec {
    fn default() -> Self {
        KnotSpec::Fraction(0.25)
    }
}

/// The built-in segment filters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LocalFilter {
    Polynomial { deg: usize },
    LinearSegments { knots: KnotSpec },
    CubicSpline { knots: KnotSpec },
    Spline { degree: u32, knots: KnotSpec },
}

impl Default for LocalFilter {
    fn default() -> Self {
        LocalFilter::Polynomial { deg: 3 }
    }
}

impl LocalFilter {
    /// Fit to `(time, values)` and evaluate at `t_pred`
    pub fn predict(&self, time: &[f64], values: &[f64], t_pred: &[f64]) -> Result<Vec<f64>, AnalysisError> {
        match *self {
            LocalFilter::Polynomial { deg } => {
                let fit_deg = deg.min(time.len().saturating_sub(1));
                if fit_deg < deg {
                    tracing::warn!(
                        "Fitting degree {} instead of {} to a segment with {} sample(s)",
                        fit_deg,
                        deg,
                        time.len()
                    );
                }
                let p = polyfit(time, values, fit_deg)?;
                Ok(t_pred.iter().map(|&t| polyval(&p, t)).collect())
            }
            LocalFilter::LinearSegments { knots: spec } => spline_predict(1, spec, time, values, t_pred),
            LocalFilter::CubicSpline { knots: spec } => spline_predict(3, spec, time, values, t_pred),
            LocalFilter::Spline { degree, knots: spec } => {
                spline_predict(degree, spec, time, values, t_pred)
            }
        }
    }
}

impl SegmentFilter for LocalFilter {
    fn smooth(&self, time: &[f64], values: &[f64]) -> Result<Vec<f64>, AnalysisError> {
        self.predict(time, values, time)
    }
}

fn spline_predict(
    degree: u32,
    spec: KnotSpec,
    time: &[f64],
    values: &[f64],
    t_pred: &[f64],
) -> Result<Vec<f64>, AnalysisError> {
    let spline = Spline::new(degree, knots(time, spec)).fit(time, values)?;
    Ok(spline.eval(t_pred))
}

/// Evenly spaced knots from the first to the last time
pub fn knots(time: &[f64], spec: KnotSpec) -> Vec<f64> {
    let (Some(&first), Some(&last)) = (time.first(), time.last()) else {
        return Vec::new();
    };
    let count = match spec {
        KnotSpec::Fraction(fraction) => (time.len() as f64 * fraction).floor() as usize,
        KnotSpec::Count(count) => count,
    };
    linspace(first, last, count)
}

/// Spline of arbitrary degree in truncated power form
///
/// ```text
/// f(x) = Σ_{i=0}^{deg} a_i xⁱ + Σ_k b_k <x - x_k>^deg,   <x> = max(x, 0)
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Spline {
    degree: u32,
    knots: Vec<f64>,
}

/// A [`Spline`] with coefficients fitted to data
#[derive(Debug, Clone, PartialEq)]
pub struct FittedSpline {
    spline: Spline,
    coefficients: DVector<f64>,
}

impl Spline {
    pub fn new(degree: u32, knots: Vec<f64>) -> Self {
        Self { degree, knots }
    }

    pub fn num_coefficients(&self) -> usize {
        self.degree as usize + 1 + self.knots.len()
    }

    /// Least squares fit of `y = f(x)`
    pub fn fit(self, x: &[f64], y: &[f64]) -> Result<FittedSpline, AnalysisError> {
        let a = self.fit_matrix(x);
        let b = DVector::from_column_slice(y);
        let coefficients = lstsq(&a, &b)?.solution;
        Ok(FittedSpline {
            spline: self,
            coefficients,
        })
    }

    fn fit_matrix(&self, x: &[f64]) -> DMatrix<f64> {
        let deg = self.degree as usize;
        DMatrix::from_fn(x.len(), self.num_coefficients(), |r, c| {
            if c <= deg {
                x[r].powi(c as i32)
            } else {
                let knot = self.knots[c - deg - 1];
                if x[r] > knot {
                    (x[r] - knot).powi(self.degree as i32)
                } else {
                    0.0
                }
            }
        })
    }
}

impl FittedSpline {
    pub fn eval(&self, x: &[f64]) -> Vec<f64> {
        (self.spline.fit_matrix(x) * &self.coefficients)
            .iter()
            .copied()
            .collect()
    }

    pub fn coefficients(&self) -> &[f64] {
        self.coefficients.as_slice()
    }
}

/// Smooth the selected channels segment by segment
///
/// The data is split at the (sorted) pv indices. The first segment starts at index 0 and the
/// last one includes the final pv index. Channels without a filter are copied unchanged.
pub fn smoothen(
    data: &TestData,
    pv: &[Vec<usize>],
    filters: &[(Channel, &dyn SegmentFilter)],
) -> Result<TestData, AnalysisError> {
    let mut smooth = data.clone();
    let bounds = split_points(pv, data.len());
    let time = data.time();

    for w in bounds.windows(2) {
        let (i0, i1) = (w[0], w[1]);
        if i0 >= i1 {
            continue;
        }
        for (channel, filter) in filters {
            let values = filter.smooth(&time[i0..i1], &data.channel(*channel)[i0..i1])?;
            if values.len() != i1 - i0 {
                return Err(AnalysisError::DimensionMismatch {
                    rows: i1 - i0,
                    values: values.len(),
                });
            }
            smooth.channel_mut(*channel)[i0..i1].copy_from_slice(&values);
        }
    }
    Ok(smooth)
}

/// Smooth every response channel (all except time and step) with the same filter
pub fn smoothen_all(
    data: &TestData,
    pv: &[Vec<usize>],
    filter: &dyn SegmentFilter,
) -> Result<TestData, AnalysisError> {
    let filters: Vec<(Channel, &dyn SegmentFilter)> =
        Channel::RESPONSE.iter().map(|&c| (c, filter)).collect();
    smoothen(data, pv, &filters)
}

fn split_points(pv: &[Vec<usize>], len: usize) -> Vec<usize> {
    let mut inds: Vec<usize> = pv.iter().flatten().copied().collect();
    if inds.is_empty() {
        return Vec::new();
    }
    inds.sort_unstable();
    inds.insert(0, 0);
    if let Some(last) = inds.last_mut() {
        *last = (*last + 1).min(len);
    }
    inds.iter().map(|&i| i.min(len)).collect()
}
