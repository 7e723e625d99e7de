//! Von Mises equivalent stresses and strains for combined axial-torsion loading
//!
//! With only the axial (`sig`, `eps`) and shear (`tau`, `gam`) components present,
//! the von Mises stress is `sqrt(sig² + 3 tau²)` and the corresponding effective
//! strain is `sqrt(eps² + gam²/3)`, where `gam` is the engineering shear strain.

use super::linalg::mean;

const SQRT_3: f64 = 1.732_050_807_568_877_2;

/// Von Mises stress from axial stress `sig` and shear stress `tau`
pub fn vm(sig: f64, tau: f64) -> f64 {
    (sig * sig + 3.0 * tau * tau).sqrt()
}

/// Effective von Mises strain from axial strain `eps` and engineering shear strain `gam`
pub fn evm(eps: f64, gam: f64) -> f64 {
    (eps * eps + gam * gam / 3.0).sqrt()
}

/// Von Mises stress for each pair of samples
pub fn vm_series(sig: &[f64], tau: &[f64]) -> Vec<f64> {
    sig.iter().zip(tau).map(|(&s, &t)| vm(s, t)).collect()
}

/// Effective von Mises strain for each pair of samples
pub fn evm_series(eps: &[f64], gam: &[f64]) -> Vec<f64> {
    eps.iter().zip(gam).map(|(&e, &g)| evm(e, g)).collect()
}

/// Angle of each point in the `sig`-`sqrt(3) tau` plane, measured from the `sig` axis
///
/// In this plane equal von Mises stresses form a circle. To avoid jumps at ±π the
/// angles are returned in the interval `[mid - π, mid + π]`, where `mid` is the angle
/// of the mean point. This works as long as the points stay within a sector narrower
/// than 2π, i.e. they do not rotate continuously.
pub fn vm_angle(sig: &[f64], tau: &[f64]) -> Vec<f64> {
    let y: Vec<f64> = tau.iter().map(|t| SQRT_3 * t).collect();
    let x = &sig[..sig.len().min(y.len())];
    let mid_angle = mean(&y[..x.len()]).atan2(mean(x));
    let (sin_m, cos_m) = mid_angle.sin_cos();

    x.iter()
        .zip(&y)
        .map(|(&xi, &yi)| {
            let xp = xi * cos_m + yi * sin_m;
            let yp = -xi * sin_m + yi * cos_m;
            yp.atan2(xp) + mid_angle
        })
        .collect()
}

/// Polar coordinates in the `sig`-`sqrt(3) tau` plane: von Mises radius and angle
pub fn stress_polar(sig: &[f64], tau: &[f64]) -> (Vec<f64>, Vec<f64>) {
    (vm_series(sig, tau), vm_angle(sig, tau))
}
