//! Reading test bars from an HDF5 data file

use std::path::{Path, PathBuf};

use hdf5::types::{FixedAscii, FixedUnicode, TypeDescriptor, VarLenAscii, VarLenUnicode};
use hdf5::{Attribute, File, Group};
use serde::Serialize;

use super::{AttrValue, Attributes, StoreError};
use crate::core::TestData;

/// Options applied when converting raw channels
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadOptions {
    /// Negate torque and rotation, for data recorded with the opposite sign convention
    pub reverse_torsion: bool,
}

/// A test bar: name, attributes and converted test data
#[derive(Debug, Clone, Serialize)]
pub struct Bar {
    pub name: String,
    pub attributes: Attributes,
    pub data: TestData,
}

/// Cross section and gauge length of a thin-walled test bar
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Geometry {
    pub inner_radius: f64,
    pub outer_radius: f64,
    pub gauge_length: f64,
}

impl Geometry {
    /// Geometry from the `inner_diameter`, `outer_diameter` and `gauge_length` attributes
    pub fn from_attributes(bar: &str, attributes: &Attributes) -> Result<Self, StoreError> {
        let number = |key: &str| -> Result<f64, StoreError> {
            let value = attributes
                .get(key)
                .ok_or_else(|| StoreError::MissingAttribute {
                    bar: bar.to_string(),
                    key: key.to_string(),
                })?;
            value.as_f64().ok_or_else(|| StoreError::InvalidGeometry {
                bar: bar.to_string(),
                reason: format!("{key} is not numeric ({value})"),
            })
        };

        let geometry = Geometry {
            inner_radius: number("inner_diameter")? / 2.0,
            outer_radius: number("outer_diameter")? / 2.0,
            gauge_length: number("gauge_length")?,
        };
        if geometry.outer_radius <= geometry.inner_radius || geometry.inner_radius < 0.0 {
            return Err(StoreError::InvalidGeometry {
                bar: bar.to_string(),
                reason: "outer_diameter must exceed inner_diameter".to_string(),
            });
        }
        if geometry.gauge_length <= 0.0 {
            return Err(StoreError::InvalidGeometry {
                bar: bar.to_string(),
                reason: "gauge_length must be positive".to_string(),
            });
        }
        Ok(geometry)
    }

    /// Cross section area, `π (r_o² - r_i²)`
    pub fn area(&self) -> f64 {
        std::f64::consts::PI * (self.outer_radius.powi(2) - self.inner_radius.powi(2))
    }

    pub fn mean_radius(&self) -> f64 {
        (self.inner_radius + self.outer_radius) / 2.0
    }
}

/// Raw channels as stored in a test bar group
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawChannels {
    pub time: Vec<f64>,
    pub forc: Vec<f64>,
    pub astr: Vec<f64>,
    pub acnt: Vec<f64>,
    pub torq: Vec<f64>,
    pub tstr: Vec<f64>,
    pub tcnt: Vec<f64>,
}

impl RawChannels {
    /// Mean stresses and strains over the thin-walled cross section
    ///
    /// `sig = F/A`, `tau = T/(A r_m)`, `eps = astr`, `gam = tstr r_m / L_g` and the step
    /// counter is the sum of the axial and torsional cycle counts.
    pub fn convert(self, geometry: &Geometry, options: &ReadOptions) -> Result<TestData, StoreError> {
        let area = geometry.area();
        let rm = geometry.mean_radius();
        let sign = if options.reverse_torsion { -1.0 } else { 1.0 };

        let sig = self.forc.iter().map(|f| f / area).collect();
        let tau = self.torq.iter().map(|t| sign * t / (area * rm)).collect();
        let gam = self
            .tstr
            .iter()
            .map(|phi| sign * phi * rm / geometry.gauge_length)
            .collect();
        let stp = self.acnt.iter().zip(&self.tcnt).map(|(a, t)| a + t).collect();

        Ok(TestData::new(self.time, stp, sig, self.astr, tau, gam)?)
    }
}

/// Read access to an HDF5 test data file
pub struct Hdf5Reader {
    file: File,
    path: PathBuf,
    options: ReadOptions,
}

impl Hdf5Reader {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let file = File::open(path)?;
        tracing::debug!("Opened {}", path.display());
        Ok(Self {
            file,
            path: path.to_path_buf(),
            options: ReadOptions::default(),
        })
    }

    pub fn with_options(mut self, options: ReadOptions) -> Self {
        self.options = options;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn options(&self) -> ReadOptions {
        self.options
    }

    /// Names of all test bars, sorted
    pub fn bar_names(&self) -> Result<Vec<String>, StoreError> {
        let mut names: Vec<String> = self
            .file
            .groups()?
            .iter()
            .map(|g| g.name().trim_start_matches('/').to_string())
            .collect();
        names.sort();
        Ok(names)
    }

    pub fn contains(&self, bar: &str) -> bool {
        self.file.link_exists(bar) && self.file.group(bar).is_ok()
    }

    fn group(&self, bar: &str) -> Result<Group, StoreError> {
        if !self.contains(bar) {
            return Err(StoreError::BarNotFound {
                name: bar.to_string(),
                file: self.path.clone(),
            });
        }
        Ok(self.file.group(bar)?)
    }

    /// All attributes of a test bar
    pub fn attributes(&self, bar: &str) -> Result<Attributes, StoreError> {
        let group = self.group(bar)?;
        let mut attributes = Attributes::new();
        for name in group.attr_names()? {
            let attr = group.attr(&name)?;
            attributes.insert(name.clone(), read_attr(&attr, &name)?);
        }
        Ok(attributes)
    }

    /// Names of the datasets of a test bar, sorted
    pub fn dataset_names(&self, bar: &str) -> Result<Vec<String>, StoreError> {
        let group = self.group(bar)?;
        let mut names: Vec<String> = group
            .datasets()?
            .iter()
            .filter_map(|ds| ds.name().rsplit('/').next().map(str::to_string))
            .collect();
        names.sort();
        Ok(names)
    }

    /// A stored dataset as floating point values, without conversion
    pub fn raw_channel(&self, bar: &str, dataset: &str) -> Result<Vec<f64>, StoreError> {
        let group = self.group(bar)?;
        if !group.link_exists(dataset) {
            return Err(StoreError::MissingDataset {
                bar: bar.to_string(),
                name: dataset.to_string(),
            });
        }
        Ok(group.dataset(dataset)?.read_raw::<f64>()?)
    }

    /// Read and convert a test bar
    pub fn read_bar(&self, bar: &str) -> Result<Bar, StoreError> {
        let attributes = self.attributes(bar)?;
        let geometry = Geometry::from_attributes(bar, &attributes)?;
        let raw = RawChannels {
            time: self.raw_channel(bar, "time")?,
            forc: self.raw_channel(bar, "forc")?,
            astr: self.raw_channel(bar, "astr")?,
            acnt: self.raw_channel(bar, "acnt")?,
            torq: self.raw_channel(bar, "torq")?,
            tstr: self.raw_channel(bar, "tstr")?,
            tcnt: self.raw_channel(bar, "tcnt")?,
        };
        tracing::debug!("Read test bar {} ({} samples)", bar, raw.time.len());

        Ok(Bar {
            name: bar.to_string(),
            data: raw.convert(&geometry, &self.options)?,
            attributes,
        })
    }

    /// Names of the test bars whose attributes equal every value in `query`
    ///
    /// Fails if a queried attribute is missing on any test bar.
    pub fn names_by_attributes(&self, query: &Attributes) -> Result<Vec<String>, StoreError> {
        let mut names = Vec::new();
        for name in self.bar_names()? {
            let attributes = self.attributes(&name)?;
            let mut matched = true;
            for (key, wanted) in query {
                let value = attributes
                    .get(key)
                    .ok_or_else(|| StoreError::MissingAttribute {
                        bar: name.clone(),
                        key: key.clone(),
                    })?;
                matched &= value.matches(wanted);
            }
            if matched {
                names.push(name);
            }
        }
        Ok(names)
    }

    /// Read every test bar whose attributes equal every value in `query`
    pub fn bars_by_attributes(&self, query: &Attributes) -> Result<Vec<Bar>, StoreError> {
        self.names_by_attributes(query)?
            .iter()
            .map(|name| self.read_bar(name))
            .collect()
    }

    pub fn close(self) -> Result<(), StoreError> {
        self.file.close()?;
        Ok(())
    }
}

fn read_attr(attr: &Attribute, name: &str) -> Result<AttrValue, StoreError> {
    let descriptor = attr.dtype()?.to_descriptor()?;
    if !attr.is_scalar() {
        return Err(StoreError::UnsupportedAttribute {
            name: name.to_string(),
            dtype: format!("array of {:?}", descriptor),
        });
    }

    let value = match descriptor {
        TypeDescriptor::Integer(_) | TypeDescriptor::Unsigned(_) => {
            AttrValue::Int(attr.read_scalar::<i64>()?)
        }
        TypeDescriptor::Float(_) => AttrValue::Float(attr.read_scalar::<f64>()?),
        TypeDescriptor::VarLenUnicode => {
            AttrValue::Text(attr.read_scalar::<VarLenUnicode>()?.as_str().to_string())
        }
        TypeDescriptor::VarLenAscii => {
            AttrValue::Text(attr.read_scalar::<VarLenAscii>()?.as_str().to_string())
        }
        TypeDescriptor::FixedAscii(_) => {
            AttrValue::Text(attr.read_scalar::<FixedAscii<1024>>()?.as_str().to_string())
        }
        TypeDescriptor::FixedUnicode(_) => {
            AttrValue::Text(attr.read_scalar::<FixedUnicode<1024>>()?.as_str().to_string())
        }
        other => {
            return Err(StoreError::UnsupportedAttribute {
                name: name.to_string(),
                dtype: format!("{:?}", other),
            })
        }
    };
    Ok(value)
}
