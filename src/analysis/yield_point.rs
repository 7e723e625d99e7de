//! Elastic parameters and offset yield points of the loading segments
//!
//! The elastic response is described by the compliance relation
//!
//! ```text
//! [eps - e0, gam - g0]ᵀ = C [sig, tau]ᵀ,   C = | Cs   Cst |
//!                                             | Cst  Ct  |
//! ```
//!
//! where the coupling `Cst` is only identified for anisotropic fits. Yielding is detected
//! when the effective von Mises plastic strain change in a segment exceeds an offset.

use std::ops::Range;

use nalgebra::{DMatrix, DVector};
use serde::Serialize;

use super::cycle::segments;
use super::linalg::{lstsq, mean, polyfit};
use super::von_mises::{evm, vm};
use super::AnalysisError;
use crate::core::{DataError, DataPoint, TestData};

/// Identified elastic compliance including strain offsets
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Compliance {
    pub eps0: f64,
    pub gam0: f64,
    /// Axial compliance, `1/E`
    pub c_axial: f64,
    /// Shear compliance, `1/G`
    pub c_shear: f64,
    /// Axial-shear coupling, only for anisotropic fits
    pub c_coupling: Option<f64>,
}

impl Compliance {
    pub fn isotropic(eps0: f64, gam0: f64, c_axial: f64, c_shear: f64) -> Self {
        Self {
            eps0,
            gam0,
            c_axial,
            c_shear,
            c_coupling: None,
        }
    }

    pub fn is_anisotropic(&self) -> bool {
        self.c_coupling.is_some()
    }
}

/// Settings for [`get_yield`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct YieldOptions {
    /// Effective von Mises plastic strain change defining yield
    pub offset: f64,
    /// Von Mises stress changes between which the compliance is fitted. The lower value also
    /// sets the zero point of the plastic strain.
    pub delta_vm: (f64, f64),
    pub axial: bool,
    pub shear: bool,
}

impl Default for YieldOptions {
    fn default() -> Self {
        Self {
            offset: 0.001,
            delta_vm: (-1.0, 200.0),
            axial: true,
            shear: true,
        }
    }
}

/// Yield information of a single segment
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct YieldRecord {
    pub start: usize,
    pub end: usize,
    /// Young's modulus, when the axial compliance was fitted
    pub emod: Option<f64>,
    /// Shear modulus, when the shear compliance was fitted
    pub gmod: Option<f64>,
    /// Interpolated state at yielding, `None` if the offset was never reached
    pub point: Option<DataPoint>,
}

/// Fit the compliance to the samples in `range`
///
/// With both `axial` and `shear`, the least squares system alternates axial and shear rows:
///
/// ```text
/// | 1  0  sig  0    tau |   | e0  |   | eps |
/// | 0  1  0    tau  sig | * | g0  | = | gam |
/// |        ...          |   | Cs  |   | ... |
///                           | Ct  |
///                           | Cst |
/// ```
///
/// where the last column only exists for anisotropic fits. With only one component,
/// a straight line is fitted and the other compliance is zero.
pub fn compliance(
    data: &TestData,
    range: Range<usize>,
    anisotropic: bool,
    axial: bool,
    shear: bool,
) -> Result<Compliance, AnalysisError> {
    if anisotropic && !(axial && shear) {
        return Err(AnalysisError::InvalidOptions(
            "anisotropic compliance requires both axial and shear components".to_string(),
        ));
    }
    if !(axial || shear) {
        return Err(AnalysisError::InvalidOptions(
            "at least one of axial and shear must be enabled".to_string(),
        ));
    }
    check_range(data, &range)?;
    if range.len() < 2 {
        return Err(AnalysisError::TooFewPoints {
            needed: 2,
            got: range.len(),
        });
    }

    let sig = &data.sig()[range.clone()];
    let tau = &data.tau()[range.clone()];
    let eps = &data.eps()[range.clone()];
    let gam = &data.gam()[range];

    if axial && shear {
        let num_param = if anisotropic { 5 } else { 4 };
        let num_pts = 2 * sig.len();
        let mut a = DMatrix::zeros(num_pts, num_param);
        let mut b = DVector::zeros(num_pts);
        for (i, (&s, &t)) in sig.iter().zip(tau).enumerate() {
            let (ra, rs) = (2 * i, 2 * i + 1);
            a[(ra, 0)] = 1.0;
            a[(ra, 2)] = s;
            a[(rs, 1)] = 1.0;
            a[(rs, 3)] = t;
            if anisotropic {
                a[(ra, 4)] = t;
                a[(rs, 4)] = s;
            }
            b[ra] = eps[i];
            b[rs] = gam[i];
        }

        let fit = lstsq(&a, &b)?;
        if anisotropic && fit.rank == 4 {
            tracing::warn!(
                "Insufficient rank for anisotropic elastic parameter identification. \
                 This can occur if the axial and shear stresses and strains are all \
                 proportional and the response is isotropic"
            );
        } else if fit.rank < 4 {
            tracing::warn!(
                "Insufficient rank for elastic parameter identification. \
                 This can occur if e.g. both the shear stress and strain are zero"
            );
        }

        let c = fit.solution;
        Ok(Compliance {
            eps0: c[0],
            gam0: c[1],
            c_axial: c[2],
            c_shear: c[3],
            c_coupling: anisotropic.then(|| c[4]),
        })
    } else if axial {
        let p = polyfit(sig, eps, 1)?;
        Ok(Compliance::isotropic(p[0], mean(gam), p[1], 0.0))
    } else {
        let p = polyfit(tau, gam, 1)?;
        Ok(Compliance::isotropic(mean(eps), p[0], 0.0, p[1]))
    }
}

/// Elastic axial and shear strains in `range` for the given compliance
///
/// The strain offsets `e0` and `g0` are not included.
pub fn elastic_strain(
    data: &TestData,
    range: Range<usize>,
    compliance: &Compliance,
) -> Result<(Vec<f64>, Vec<f64>), AnalysisError> {
    check_range(data, &range)?;
    let sig = &data.sig()[range.clone()];
    let tau = &data.tau()[range];
    let cst = compliance.c_coupling.unwrap_or(0.0);

    let eps_el = sig
        .iter()
        .zip(tau)
        .map(|(s, t)| compliance.c_axial * s + cst * t)
        .collect();
    let gam_el = sig
        .iter()
        .zip(tau)
        .map(|(s, t)| compliance.c_shear * t + cst * s)
        .collect();
    Ok((eps_el, gam_el))
}

/// Yield point of the samples in `range`
///
/// The plastic strain is measured from the first sample where the von Mises stress change
/// (relative to the start of the range) exceeds `dvm_ep0`; the default of -1 uses the first
/// sample. The yield point interpolates all channels linearly to where the effective plastic
/// strain change equals `offset`.
pub fn yield_point(
    data: &TestData,
    range: Range<usize>,
    compliance: &Compliance,
    offset: f64,
    dvm_ep0: f64,
) -> Result<Option<DataPoint>, AnalysisError> {
    check_range(data, &range)?;
    if range.is_empty() {
        return Ok(None);
    }
    let start = range.start;
    let delta_svm = vm_change(data, range.clone());
    let i_zero_ep = first_above(&delta_svm, dvm_ep0).unwrap_or(0);

    let (eps_el, gam_el) = elastic_strain(data, range.clone(), compliance)?;
    let eps_pl: Vec<f64> = data.eps()[range.clone()]
        .iter()
        .zip(&eps_el)
        .map(|(e, el)| e - el)
        .collect();
    let gam_pl: Vec<f64> = data.gam()[range]
        .iter()
        .zip(&gam_el)
        .map(|(g, el)| g - el)
        .collect();

    let d_ep_vm: Vec<f64> = eps_pl
        .iter()
        .zip(&gam_pl)
        .map(|(e, g)| evm(e - eps_pl[i_zero_ep], g - gam_pl[i_zero_ep]))
        .collect();

    let Some(i_above) = first_above(&d_ep_vm[i_zero_ep..], offset).map(|i| i + i_zero_ep) else {
        return Ok(None);
    };
    if i_above == 0 {
        return Ok(Some(data.point(start)?));
    }

    let s = (offset - d_ep_vm[i_above - 1]) / (d_ep_vm[i_above] - d_ep_vm[i_above - 1]);
    let i1 = start + i_above;
    let p0 = data.point(i1 - 1)?;
    let p1 = data.point(i1)?;
    Ok(Some(DataPoint::lerp(&p0, &p1, s)))
}

/// Elastic parameters and yield point of every segment between the pv indices
///
/// The result has one list per segment type (e.g. valley-to-peak and peak-to-valley).
/// Within each segment the compliance is fitted between the first samples where the von
/// Mises stress change exceeds `delta_vm.0` and `delta_vm.1`. If the upper value is never
/// exceeded, the fit extends to the end of the segment.
pub fn get_yield(
    data: &TestData,
    pv: &[Vec<usize>],
    options: &YieldOptions,
) -> Result<Vec<Vec<YieldRecord>>, AnalysisError> {
    let (dvm_min, dvm_max) = options.delta_vm;
    let mut info = Vec::with_capacity(pv.len());
    for segs in segments(pv) {
        let mut records = Vec::with_capacity(segs.len());
        for seg in segs {
            let range = seg.start..seg.end;
            check_range(data, &range)?;
            let delta_vm = vm_change(data, range.clone());
            let i1_el = seg.start + first_above(&delta_vm, dvm_min).unwrap_or(0);
            let i2_el = first_above(&delta_vm, dvm_max)
                .map(|i| seg.start + i)
                .unwrap_or(seg.end);

            let c = match compliance(data, i1_el..i2_el, false, options.axial, options.shear) {
                Ok(c) => c,
                Err(AnalysisError::TooFewPoints { got, .. }) => {
                    tracing::warn!(
                        "Skipping segment {}..{}: {} sample(s) in the elastic range",
                        seg.start,
                        seg.end,
                        got
                    );
                    records.push(YieldRecord {
                        start: seg.start,
                        end: seg.end,
                        emod: None,
                        gmod: None,
                        point: None,
                    });
                    continue;
                }
                Err(e) => return Err(e),
            };
            let point = yield_point(data, range, &c, options.offset, dvm_min)?;
            if point.is_none() {
                tracing::warn!(
                    "No yielding found in segment {}..{} with offset {}",
                    seg.start,
                    seg.end,
                    options.offset
                );
            }

            records.push(YieldRecord {
                start: seg.start,
                end: seg.end,
                emod: options.axial.then(|| 1.0 / c.c_axial),
                gmod: options.shear.then(|| 1.0 / c.c_shear),
                point,
            });
        }
        info.push(records);
    }
    Ok(info)
}

/// Von Mises stress change relative to the first sample of the range
fn vm_change(data: &TestData, range: Range<usize>) -> Vec<f64> {
    if range.is_empty() {
        return Vec::new();
    }
    let sig0 = data.sig()[range.start];
    let tau0 = data.tau()[range.start];
    data.sig()[range.clone()]
        .iter()
        .zip(&data.tau()[range])
        .map(|(s, t)| vm(s - sig0, t - tau0))
        .collect()
}

fn first_above(values: &[f64], limit: f64) -> Option<usize> {
    values.iter().position(|&v| v > limit)
}

fn check_range(data: &TestData, range: &Range<usize>) -> Result<(), DataError> {
    if range.end > data.len() || range.start > range.end {
        return Err(DataError::IndexOutOfRange {
            index: range.end,
            len: data.len(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::linalg::linspace;
    use crate::core::Channel;
    use approx::assert_relative_eq;
    use rand::Rng;

    /// Linear strain paths; `gam` is randomly perturbed to avoid full proportionality
    fn test_strain(num_points: usize, eps_max: f64, gam_max: f64, gam_rel_pert: f64) -> TestData {
        let mut rng = rand::rng();
        let time = linspace(0.0, 1.0, num_points);
        let eps = time.iter().map(|t| eps_max * t).collect();
        let gam = time
            .iter()
            .map(|t| gam_max * t * (1.0 + gam_rel_pert * (2.0 * rng.random::<f64>() - 1.0)))
            .collect();
        TestData::zeros(num_points)
            .with(Channel::Time, time)
            .unwrap()
            .with(Channel::Eps, eps)
            .unwrap()
            .with(Channel::Gam, gam)
            .unwrap()
    }

    /// Replace the stresses outside `range` with random values
    fn alter_stress(data: &mut TestData, range: Range<usize>) {
        let mut rng = rand::rng();
        for channel in [Channel::Sig, Channel::Tau] {
            let values = data.channel_mut(channel);
            let max = values.iter().copied().fold(f64::MIN, f64::max);
            for (i, v) in values.iter_mut().enumerate() {
                if !range.contains(&i) {
                    *v = max * rng.random::<f64>();
                }
            }
        }
    }

    fn set_isotropic_stress(data: &mut TestData, emod: f64, gmod: f64, eps0: f64, gam0: f64) {
        let sig = data.eps().iter().map(|e| emod * (e - eps0)).collect();
        let tau = data.gam().iter().map(|g| gmod * (g - gam0)).collect();
        data.set(Channel::Sig, sig).unwrap();
        data.set(Channel::Tau, tau).unwrap();
    }

    /// Sets anisotropic stresses and returns the compliance matrix entries (Cs, Ct, Cst)
    fn set_anisotropic_stress(data: &mut TestData, emod: f64, gmod: f64, eg: f64) -> (f64, f64, f64) {
        let sig = data
            .eps()
            .iter()
            .zip(data.gam())
            .map(|(e, g)| emod * e + eg * g)
            .collect();
        let tau = data
            .eps()
            .iter()
            .zip(data.gam())
            .map(|(e, g)| eg * e + gmod * g)
            .collect();
        data.set(Channel::Sig, sig).unwrap();
        data.set(Channel::Tau, tau).unwrap();
        let det = emod * gmod - eg * eg;
        (gmod / det, emod / det, -eg / det)
    }

    #[test]
    fn test_compliance() {
        let num_points = 200;
        let range = num_points / 10..num_points / 2;
        let mut data = test_strain(num_points, 0.005, 0.002, 0.1);
        let (emod, gmod) = (210.0e3, 80.0e3);
        let (eps0, gam0) = (0.001, 0.0004);
        set_isotropic_stress(&mut data, emod, gmod, eps0, gam0);
        // Fitting samples outside the range would now give a large error
        alter_stress(&mut data, range.clone());

        let c = compliance(&data, range.clone(), false, true, true).unwrap();
        assert!(!c.is_anisotropic());
        assert_relative_eq!(c.eps0, eps0, max_relative = 1e-6);
        assert_relative_eq!(c.gam0, gam0, max_relative = 1e-6);
        assert_relative_eq!(c.c_axial, 1.0 / emod, max_relative = 1e-6);
        assert_relative_eq!(c.c_shear, 1.0 / gmod, max_relative = 1e-6);

        // Isotropic data, anisotropic analysis
        let c = compliance(&data, range.clone(), true, true, true).unwrap();
        assert_relative_eq!(c.eps0, eps0, max_relative = 1e-6);
        assert_relative_eq!(c.gam0, gam0, max_relative = 1e-6);
        assert_relative_eq!(c.c_axial, 1.0 / emod, max_relative = 1e-6);
        assert_relative_eq!(c.c_shear, 1.0 / gmod, max_relative = 1e-6);
        assert_relative_eq!(c.c_coupling.unwrap(), 0.0, epsilon = 1e-12);

        // Anisotropic data and analysis
        let (cs, ct, cst) = set_anisotropic_stress(&mut data, emod, gmod, gmod / 10.0);
        let c = compliance(&data, range, true, true, true).unwrap();
        assert_relative_eq!(c.eps0, 0.0, epsilon = 1e-10);
        assert_relative_eq!(c.gam0, 0.0, epsilon = 1e-10);
        assert_relative_eq!(c.c_axial, cs, max_relative = 1e-6);
        assert_relative_eq!(c.c_shear, ct, max_relative = 1e-6);
        assert_relative_eq!(c.c_coupling.unwrap(), cst, max_relative = 1e-6);
    }

    #[test]
    fn test_compliance_single_component() {
        let mut data = test_strain(50, 0.005, 0.002, 0.0);
        set_isotropic_stress(&mut data, 200.0e3, 75.0e3, 0.001, 0.0);

        let c = compliance(&data, 0..50, false, true, false).unwrap();
        assert_relative_eq!(c.eps0, 0.001, max_relative = 1e-6);
        assert_relative_eq!(c.c_axial, 1.0 / 200.0e3, max_relative = 1e-6);
        assert_eq!(c.c_shear, 0.0);

        let c = compliance(&data, 0..50, false, false, true).unwrap();
        assert_relative_eq!(c.c_shear, 1.0 / 75.0e3, max_relative = 1e-6);
        assert_eq!(c.c_axial, 0.0);
    }

    #[test]
    fn test_compliance_invalid_options() {
        let data = test_strain(10, 0.005, 0.002, 0.0);
        assert!(matches!(
            compliance(&data, 0..10, true, true, false),
            Err(AnalysisError::InvalidOptions(_))
        ));
        assert!(matches!(
            compliance(&data, 0..10, false, false, false),
            Err(AnalysisError::InvalidOptions(_))
        ));
        assert!(matches!(
            compliance(&data, 3..4, false, true, true),
            Err(AnalysisError::TooFewPoints { needed: 2, got: 1 })
        ));
        assert!(compliance(&data, 0..11, false, true, true).is_err());
    }

    #[test]
    fn test_elastic_strain() {
        let num_points = 200;
        let range = num_points / 10..num_points / 2;
        let mut data = test_strain(num_points, 0.005, 0.002, 0.0);
        let (emod, gmod, eg) = (210.0e3, 80.0e3, 10.0e3);
        let (eps0, gam0) = (0.001, 0.0004);

        set_isotropic_stress(&mut data, emod, gmod, eps0, gam0);
        alter_stress(&mut data, range.clone());
        let c = Compliance::isotropic(eps0, gam0, 1.0 / emod, 1.0 / gmod);
        let (eps_el, gam_el) = elastic_strain(&data, range.clone(), &c).unwrap();
        for (k, i) in range.clone().enumerate() {
            assert_relative_eq!(eps_el[k], data.eps()[i] - eps0, epsilon = 1e-12);
            assert_relative_eq!(gam_el[k], data.gam()[i] - gam0, epsilon = 1e-12);
        }

        let (cs, ct, cst) = set_anisotropic_stress(&mut data, emod, gmod, eg);
        let c = Compliance {
            eps0: 0.0,
            gam0: 0.0,
            c_axial: cs,
            c_shear: ct,
            c_coupling: Some(cst),
        };
        let (eps_el, gam_el) = elastic_strain(&data, range.clone(), &c).unwrap();
        for (k, i) in range.enumerate() {
            assert_relative_eq!(eps_el[k], data.eps()[i], epsilon = 1e-12);
            assert_relative_eq!(gam_el[k], data.gam()[i], epsilon = 1e-12);
        }
    }

    /// Linear interpolation of `y(x)` at `x0` for increasing `x`
    fn interp(x0: f64, x: &[f64], y: &[f64]) -> f64 {
        let i = x.iter().position(|&v| v >= x0).unwrap();
        if i == 0 {
            return y[0];
        }
        y[i - 1] + (y[i] - y[i - 1]) * (x0 - x[i - 1]) / (x[i] - x[i - 1])
    }

    #[test]
    fn test_yield_point() {
        let num_points = 200;
        let evm_lim = 0.0001;
        let mut data = test_strain(num_points, 0.005, 0.002, 0.0);
        let (emod, gmod) = (70.0e3, 70.0e3 / 3.0);

        let time = data.time().to_vec();
        let ind_y = time.iter().position(|&t| t > 0.5).unwrap();
        let t_y = time[ind_y];
        let t_end = time[num_points - 1];
        let plastic = |pl_max: f64| -> Vec<f64> {
            time.iter()
                .enumerate()
                .map(|(i, t)| {
                    if i < ind_y {
                        0.0
                    } else {
                        pl_max * ((t - t_y) / (t_end - t_y)).powi(2)
                    }
                })
                .collect()
        };
        let eps_pl = plastic(0.001);
        let gam_pl = plastic(0.0004);
        let evm_pl: Vec<f64> = eps_pl.iter().zip(&gam_pl).map(|(e, g)| evm(*e, *g)).collect();

        let sig = data
            .eps()
            .iter()
            .zip(&eps_pl)
            .map(|(e, p)| emod * (e - p))
            .collect();
        let tau = data
            .gam()
            .iter()
            .zip(&gam_pl)
            .map(|(g, p)| gmod * (g - p))
            .collect();
        data.set(Channel::Sig, sig).unwrap();
        data.set(Channel::Tau, tau).unwrap();

        let c = Compliance::isotropic(0.0, 0.0, 1.0 / emod, 1.0 / gmod);
        let point = yield_point(&data, 0..num_points, &c, evm_lim, -1.0)
            .unwrap()
            .unwrap();

        for channel in Channel::ALL {
            let expected = interp(evm_lim, &evm_pl[ind_y..], &data.channel(channel)[ind_y..]);
            assert_relative_eq!(point.get(channel), expected, max_relative = 1e-6, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_yield_point_not_reached() {
        let mut data = test_strain(20, 0.001, 0.0, 0.0);
        set_isotropic_stress(&mut data, 200.0e3, 80.0e3, 0.0, 0.0);
        let c = Compliance::isotropic(0.0, 0.0, 1.0 / 200.0e3, 1.0 / 80.0e3);
        assert_eq!(yield_point(&data, 0..20, &c, 0.001, -1.0).unwrap(), None);
    }

    /// Elastic-ideally plastic response; returns stress and updated plastic strain
    fn ideal_plasticity(emod: f64, sy0: f64, eps: f64, eps_p_old: f64) -> (f64, f64) {
        let sig_tr = emod * (eps - eps_p_old);
        if sig_tr.abs() > sy0 {
            let sig = sig_tr.signum() * sy0;
            (sig, eps - sig / emod)
        } else {
            (sig_tr, eps_p_old)
        }
    }

    /// Strain alternating linearly between `amp` and `-amp`, starting from zero
    fn sawtooth(time: &[f64], cycle_time: &[f64], amp: f64) -> Vec<f64> {
        let mut data = vec![0.0; time.len()];
        let mut seg_sign = 1.0;
        for w in cycle_time.windows(2) {
            let (t0, t1) = (w[0], w[1]);
            let i0 = time.iter().position(|&t| t > t0).unwrap_or(0);
            let i1 = time.iter().position(|&t| t > t1).unwrap_or(time.len());
            for i in i0..i1 {
                let rel = (time[i] - t0) / (t1 - t0);
                data[i] = if i0 > 1 {
                    -seg_sign * amp + 2.0 * seg_sign * amp * rel
                } else {
                    seg_sign * amp * rel
                };
            }
            seg_sign = -seg_sign;
        }
        data
    }

    #[test]
    fn test_get_yield() {
        let points_per_cycle = 100;
        let num_cycles = 10;
        let num_points = num_cycles * points_per_cycle + 1;
        let time = linspace(0.0, 10.0, num_points);
        let cycle_inds: Vec<usize> = (0..num_points).step_by(points_per_cycle).collect();
        let cycle_time: Vec<f64> = cycle_inds.iter().map(|&i| time[i]).collect();
        let eps = sawtooth(&time, &cycle_time, 0.4 / 100.0);
        let pv: Vec<Vec<usize>> = (0..2)
            .map(|j| cycle_inds.iter().skip(j).step_by(2).copied().collect())
            .collect();

        let (emod, sy0) = (210.0e3, 200.0);
        let mut eps_pl = 0.0;
        let sig: Vec<f64> = eps
            .iter()
            .map(|&e| {
                let (s, p) = ideal_plasticity(emod, sy0, e, eps_pl);
                eps_pl = p;
                s
            })
            .collect();

        let mut rng = rand::rng();
        let gam = (0..num_points)
            .map(|_| 1.0e-5 * (2.0 * rng.random::<f64>() - 1.0))
            .collect();
        let tau = (0..num_points)
            .map(|_| 2.0 * rng.random::<f64>() - 1.0)
            .collect();
        let data = TestData::new(time.clone(), vec![0.0; num_points], sig, eps, tau, gam).unwrap();

        let options = YieldOptions {
            offset: 0.01 / 100.0,
            delta_vm: (-1.0, sy0),
            ..Default::default()
        };
        let info = get_yield(&data, &pv, &options).unwrap();

        assert_eq!(info.len(), 2);
        assert_eq!(info[0].len(), 5);
        assert_eq!(info[1].len(), 5);
        for record in info.iter().flatten() {
            assert_relative_eq!(record.emod.unwrap(), emod, max_relative = 1e-6);
            assert!(record.gmod.is_some());
            let point = record.point.unwrap();
            assert_relative_eq!(point.sig.abs(), sy0, max_relative = 1e-6);
        }
    }

    #[test]
    fn test_get_yield_short_segment() {
        let emod = 200.0e3;
        let time = linspace(0.0, 1.0, 10);
        let eps: Vec<f64> = time.iter().map(|t| 1.0e-3 * t).collect();
        let sig = eps.iter().map(|e| emod * e).collect();
        let data = TestData::zeros(10)
            .with(Channel::Time, time)
            .unwrap()
            .with(Channel::Eps, eps)
            .unwrap()
            .with(Channel::Sig, sig)
            .unwrap();

        // The first segment 0..1 holds a single sample
        let pv = vec![vec![0, 5], vec![1, 9]];
        let options = YieldOptions {
            delta_vm: (-1.0, 1.0e3),
            shear: false,
            ..Default::default()
        };
        let info = get_yield(&data, &pv, &options).unwrap();

        assert_eq!(info[0].len(), 2);
        assert_eq!(info[1].len(), 1);
        let short = info[0][0];
        assert_eq!((short.start, short.end), (0, 1));
        assert!(short.emod.is_none() && short.gmod.is_none() && short.point.is_none());
        for record in [info[0][1], info[1][0]] {
            assert_relative_eq!(record.emod.unwrap(), emod, max_relative = 1e-6);
            assert!(record.gmod.is_none());
            assert!(record.point.is_none());
        }
    }
}
