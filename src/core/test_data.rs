//! Time series of a single test bar, expressed in stresses and strains

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Channels available in converted test data
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    /// Experiment time [s]
    Time,
    /// Step counter, sum of axial and torsional cycle counts
    Stp,
    /// Axial stress, σ_zz [MPa]
    Sig,
    /// Axial strain, ε_zz [-]
    Eps,
    /// Shear stress, σ_θz [MPa]
    Tau,
    /// Engineering shear strain, 2ε_θz [-]
    Gam,
}

impl Channel {
    pub const ALL: [Channel; 6] = [
        Channel::Time,
        Channel::Stp,
        Channel::Sig,
        Channel::Eps,
        Channel::Tau,
        Channel::Gam,
    ];

    /// Channels carrying measured mechanical response (everything except time and stp)
    pub const RESPONSE: [Channel; 4] = [Channel::Sig, Channel::Eps, Channel::Tau, Channel::Gam];

    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Time => "time",
            Channel::Stp => "stp",
            Channel::Sig => "sig",
            Channel::Eps => "eps",
            Channel::Tau => "tau",
            Channel::Gam => "gam",
        }
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Channel {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Channel::ALL
            .into_iter()
            .find(|c| c.as_str() == s.to_lowercase())
            .ok_or_else(|| DataError::UnknownChannel(s.to_string()))
    }
}

#[derive(Debug, Error, Diagnostic)]
pub enum DataError {
    #[error("Channel '{channel}' has {actual} values, expected {expected}")]
    #[diagnostic(
        code(cyclic::data::length_mismatch),
        help("All channels of a test bar must have the same number of samples")
    )]
    LengthMismatch {
        channel: Channel,
        expected: usize,
        actual: usize,
    },

    #[error("Unknown channel: '{0}'")]
    #[diagnostic(
        code(cyclic::data::unknown_channel),
        help("Valid channels are: time, stp, sig, eps, tau, gam")
    )]
    UnknownChannel(String),

    #[error("Index {index} is out of range for test data with {len} samples")]
    #[diagnostic(code(cyclic::data::index_out_of_range))]
    IndexOutOfRange { index: usize, len: usize },
}

/// Converted test data of one test bar
///
/// All channels always have the same length.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestData {
    time: Vec<f64>,
    stp: Vec<f64>,
    sig: Vec<f64>,
    eps: Vec<f64>,
    tau: Vec<f64>,
    gam: Vec<f64>,
}

impl TestData {
    /// Assemble test data from its channels, checking that the lengths agree
    pub fn new(
        time: Vec<f64>,
        stp: Vec<f64>,
        sig: Vec<f64>,
        eps: Vec<f64>,
        tau: Vec<f64>,
        gam: Vec<f64>,
    ) -> Result<Self, DataError> {
        let data = Self {
            time,
            stp,
            sig,
            eps,
            tau,
            gam,
        };
        let expected = data.time.len();
        for channel in Channel::ALL {
            let actual = data.channel(channel).len();
            if actual != expected {
                return Err(DataError::LengthMismatch {
                    channel,
                    expected,
                    actual,
                });
            }
        }
        Ok(data)
    }

    /// Test data with `len` samples where every channel is zero
    pub fn zeros(len: usize) -> Self {
        Self {
            time: vec![0.0; len],
            stp: vec![0.0; len],
            sig: vec![0.0; len],
            eps: vec![0.0; len],
            tau: vec![0.0; len],
            gam: vec![0.0; len],
        }
    }

    /// Replace a channel, builder style
    pub fn with(mut self, channel: Channel, values: Vec<f64>) -> Result<Self, DataError> {
        self.set(channel, values)?;
        Ok(self)
    }

    /// Replace a channel
    pub fn set(&mut self, channel: Channel, values: Vec<f64>) -> Result<(), DataError> {
        if values.len() != self.len() {
            return Err(DataError::LengthMismatch {
                channel,
                expected: self.len(),
                actual: values.len(),
            });
        }
        *self.slot(channel) = values;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    pub fn channel(&self, channel: Channel) -> &[f64] {
        match channel {
            Channel::Time => &self.time,
            Channel::Stp => &self.stp,
            Channel::Sig => &self.sig,
            Channel::Eps => &self.eps,
            Channel::Tau => &self.tau,
            Channel::Gam => &self.gam,
        }
    }

    /// Mutable access to a channel. The length can not be changed through the slice.
    pub fn channel_mut(&mut self, channel: Channel) -> &mut [f64] {
        self.slot(channel)
    }

    fn slot(&mut self, channel: Channel) -> &mut Vec<f64> {
        match channel {
            Channel::Time => &mut self.time,
            Channel::Stp => &mut self.stp,
            Channel::Sig => &mut self.sig,
            Channel::Eps => &mut self.eps,
            Channel::Tau => &mut self.tau,
            Channel::Gam => &mut self.gam,
        }
    }

    pub fn time(&self) -> &[f64] {
        &self.time
    }

    pub fn stp(&self) -> &[f64] {
        &self.stp
    }

    pub fn sig(&self) -> &[f64] {
        &self.sig
    }

    pub fn eps(&self) -> &[f64] {
        &self.eps
    }

    pub fn tau(&self) -> &[f64] {
        &self.tau
    }

    pub fn gam(&self) -> &[f64] {
        &self.gam
    }

    /// Copy of the first `len` samples (all samples if `len` exceeds the length)
    pub fn truncated(&self, len: usize) -> Self {
        let n = len.min(self.len());
        Self {
            time: self.time[..n].to_vec(),
            stp: self.stp[..n].to_vec(),
            sig: self.sig[..n].to_vec(),
            eps: self.eps[..n].to_vec(),
            tau: self.tau[..n].to_vec(),
            gam: self.gam[..n].to_vec(),
        }
    }

    /// All channels at a single sample
    pub fn point(&self, index: usize) -> Result<DataPoint, DataError> {
        if index >= self.len() {
            return Err(DataError::IndexOutOfRange {
                index,
                len: self.len(),
            });
        }
        Ok(DataPoint {
            time: self.time[index],
            stp: self.stp[index],
            sig: self.sig[index],
            eps: self.eps[index],
            tau: self.tau[index],
            gam: self.gam[index],
        })
    }
}

/// Values of all channels at one instant (possibly interpolated between samples)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    pub time: f64,
    pub stp: f64,
    pub sig: f64,
    pub eps: f64,
    pub tau: f64,
    pub gam: f64,
}

impl DataPoint {
    pub fn get(&self, channel: Channel) -> f64 {
        match channel {
            Channel::Time => self.time,
            Channel::Stp => self.stp,
            Channel::Sig => self.sig,
            Channel::Eps => self.eps,
            Channel::Tau => self.tau,
            Channel::Gam => self.gam,
        }
    }

    /// Linear interpolation `a + (b - a) * s` for every channel
    pub fn lerp(a: &DataPoint, b: &DataPoint, s: f64) -> DataPoint {
        let mix = |x0: f64, x1: f64| x0 + (x1 - x0) * s;
        DataPoint {
            time: mix(a.time, b.time),
            stp: mix(a.stp, b.stp),
            sig: mix(a.sig, b.sig),
            eps: mix(a.eps, b.eps),
            tau: mix(a.tau, b.tau),
            gam: mix(a.gam, b.gam),
        }
    }
}
