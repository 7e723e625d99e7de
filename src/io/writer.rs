//! Writing test bars to an HDF5 data file

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use hdf5::types::VarLenUnicode;
use hdf5::{Dataset, File, Group, H5Type, Location};
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

use super::{
    default_description, AttrValue, Attributes, StoreError, DESCRIPTION_ATTRIBUTE,
    REQUIRED_ATTRIBUTES, REQUIRED_DATASETS,
};

/// Storage type of a dataset
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    #[default]
    F64,
    F32,
    I32,
    I64,
    U32,
    U64,
}

impl FromStr for ColumnType {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "f64" | "float64" | "double" => Ok(ColumnType::F64),
            "f32" | "float32" | "float" => Ok(ColumnType::F32),
            "i32" | "int32" => Ok(ColumnType::I32),
            "i64" | "int64" | "int" => Ok(ColumnType::I64),
            "u32" | "uint32" => Ok(ColumnType::U32),
            "u64" | "uint64" => Ok(ColumnType::U64),
            _ => Err(StoreError::UnknownDtype(s.to_string())),
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ColumnType::F64 => "f64",
            ColumnType::F32 => "f32",
            ColumnType::I32 => "i32",
            ColumnType::I64 => "i64",
            ColumnType::U32 => "u32",
            ColumnType::U64 => "u64",
        };
        f.write_str(s)
    }
}

/// Which column of the imported matrix goes into which dataset
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnLayout {
    pub columns: BTreeMap<String, usize>,
    pub dtypes: BTreeMap<String, ColumnType>,
    pub descriptions: BTreeMap<String, String>,
}

impl ColumnLayout {
    pub fn from_columns<'a>(columns: impl IntoIterator<Item = (&'a str, usize)>) -> Self {
        Self {
            columns: columns
                .into_iter()
                .map(|(name, index)| (name.to_string(), index))
                .collect(),
            ..Default::default()
        }
    }

    pub fn with_dtype(mut self, name: &str, dtype: ColumnType) -> Self {
        self.dtypes.insert(name.to_string(), dtype);
        self
    }

    pub fn with_description(mut self, name: &str, description: &str) -> Self {
        self.descriptions
            .insert(name.to_string(), description.to_string());
        self
    }

    /// Every dataset to write with its source column, required datasets first
    ///
    /// Required datasets without a column map to `None` and are stored as zeros.
    pub fn datasets(&self) -> Vec<(String, Option<usize>)> {
        let mut datasets: Vec<(String, Option<usize>)> = REQUIRED_DATASETS
            .iter()
            .map(|name| (name.to_string(), self.columns.get(*name).copied()))
            .collect();
        for (name, index) in &self.columns {
            if !REQUIRED_DATASETS.contains(&name.as_str()) {
                datasets.push((name.clone(), Some(*index)));
            }
        }
        datasets
    }

    pub fn dtype(&self, name: &str) -> ColumnType {
        self.dtypes.get(name).copied().unwrap_or_default()
    }

    pub fn description(&self, name: &str) -> Option<&str> {
        self.descriptions
            .get(name)
            .map(String::as_str)
            .or_else(|| default_description(name))
    }
}

/// Creates an HDF5 data file and adds test bars to it
pub struct Hdf5Writer {
    file: File,
    path: PathBuf,
    layout: ColumnLayout,
}

impl Hdf5Writer {
    /// Create a new file, replacing any existing file at `path`
    pub fn create(path: impl AsRef<Path>, layout: ColumnLayout) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let file = File::create(path)?;
        tracing::debug!("Created {}", path.display());
        Ok(Self {
            file,
            path: path.to_path_buf(),
            layout,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn layout(&self) -> &ColumnLayout {
        &self.layout
    }

    /// Add a test bar with the columns of `data` and the given group attributes
    pub fn add_bar(
        &mut self,
        data: &DMatrix<f64>,
        name: &str,
        attributes: &Attributes,
    ) -> Result<(), StoreError> {
        let missing: Vec<String> = REQUIRED_ATTRIBUTES
            .iter()
            .filter(|key| !attributes.contains_key(**key))
            .map(|key| key.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(StoreError::MissingRequiredAttributes(missing));
        }
        if self.file.link_exists(name) {
            return Err(StoreError::BarExists(name.to_string()));
        }

        let datasets = self.layout.datasets();
        for (dataset, index) in &datasets {
            if let Some(index) = index {
                if *index >= data.ncols() {
                    return Err(StoreError::ColumnOutOfRange {
                        name: dataset.clone(),
                        index: *index,
                        ncols: data.ncols(),
                    });
                }
            }
        }

        let group = self.file.create_group(name)?;
        for (key, value) in attributes {
            write_attr(&group, key, value)?;
        }

        for (dataset, index) in &datasets {
            let values: Vec<f64> = match index {
                Some(index) => data.column(*index).iter().copied().collect(),
                None => {
                    tracing::debug!("No column for {} in {}, storing zeros", dataset, name);
                    vec![0.0; data.nrows()]
                }
            };
            self.write_dataset(&group, dataset, &values)?;
        }

        tracing::info!("Added test bar {} ({} rows)", name, data.nrows());
        Ok(())
    }

    fn write_dataset(&self, group: &Group, name: &str, values: &[f64]) -> Result<(), StoreError> {
        // Conversions truncate like a numeric cast
        let dataset = match self.layout.dtype(name) {
            ColumnType::F64 => create_dataset(group, name, values)?,
            ColumnType::F32 => create_dataset(group, name, &cast(values, |v| v as f32))?,
            ColumnType::I32 => create_dataset(group, name, &cast(values, |v| v as i32))?,
            ColumnType::I64 => create_dataset(group, name, &cast(values, |v| v as i64))?,
            ColumnType::U32 => create_dataset(group, name, &cast(values, |v| v as u32))?,
            ColumnType::U64 => create_dataset(group, name, &cast(values, |v| v as u64))?,
        };
        let description = self.layout.description(name).unwrap_or(name);
        write_attr(
            &dataset,
            DESCRIPTION_ATTRIBUTE,
            &AttrValue::Text(description.to_string()),
        )?;
        Ok(())
    }

    pub fn close(self) -> Result<(), StoreError> {
        self.file.flush()?;
        self.file.close()?;
        Ok(())
    }
}

fn cast<T>(values: &[f64], f: impl Fn(f64) -> T) -> Vec<T> {
    values.iter().map(|v| f(*v)).collect()
}

fn create_dataset<T: H5Type>(group: &Group, name: &str, values: &[T]) -> Result<Dataset, StoreError> {
    let dataset = group.new_dataset::<T>().shape(values.len()).create(name)?;
    dataset.write_raw(values)?;
    Ok(dataset)
}

fn write_attr(location: &Location, name: &str, value: &AttrValue) -> Result<(), StoreError> {
    match value {
        AttrValue::Int(i) => location
            .new_attr::<i64>()
            .shape(())
            .create(name)?
            .write_scalar(i)?,
        AttrValue::Float(x) => location
            .new_attr::<f64>()
            .shape(())
            .create(name)?
            .write_scalar(x)?,
        AttrValue::Text(s) => {
            let text: VarLenUnicode = s
                .parse()
                .map_err(|e: hdf5::types::StringError| StoreError::InvalidString(e.to_string()))?;
            location
                .new_attr::<VarLenUnicode>()
                .shape(())
                .create(name)?
                .write_scalar(&text)?
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::Hdf5Reader;
    use tempfile::TempDir;

    fn geometry() -> Attributes {
        let mut attrs = Attributes::new();
        attrs.insert("inner_diameter".into(), AttrValue::Float(12.0));
        attrs.insert("outer_diameter".into(), AttrValue::Float(14.0));
        attrs.insert("gauge_length".into(), AttrValue::Float(12.0));
        attrs
    }

    #[test]
    fn test_column_type_parse() {
        assert_eq!("f32".parse::<ColumnType>().unwrap(), ColumnType::F32);
        assert_eq!("int32".parse::<ColumnType>().unwrap(), ColumnType::I32);
        assert_eq!("U64".parse::<ColumnType>().unwrap(), ColumnType::U64);
        assert!(matches!(
            "complex".parse::<ColumnType>(),
            Err(StoreError::UnknownDtype(_))
        ));
        assert_eq!(ColumnType::I64.to_string(), "i64");
    }

    #[test]
    fn test_layout_datasets() {
        let layout = ColumnLayout::from_columns([("time", 0), ("forc", 1), ("disp", 2)]);
        let datasets = layout.datasets();
        assert_eq!(datasets.len(), 8);
        assert_eq!(datasets[0], ("time".to_string(), Some(0)));
        assert_eq!(datasets[2], ("astr".to_string(), None));
        assert_eq!(datasets[7], ("disp".to_string(), Some(2)));
        assert_eq!(layout.description("forc"), Some("Axial force [N]"));
        assert_eq!(layout.description("temp"), None);
    }

    #[test]
    fn test_add_bar_errors() {
        let dir = TempDir::new().unwrap();
        let layout = ColumnLayout::from_columns([("time", 0), ("forc", 3)]);
        let mut writer = Hdf5Writer::create(dir.path().join("f.hdf5"), layout).unwrap();
        let data = DMatrix::zeros(5, 2);

        let mut attrs = geometry();
        attrs.remove("gauge_length");
        match writer.add_bar(&data, "T01", &attrs) {
            Err(StoreError::MissingRequiredAttributes(keys)) => {
                assert_eq!(keys, vec!["gauge_length".to_string()])
            }
            other => panic!("unexpected result {:?}", other),
        }

        assert!(matches!(
            writer.add_bar(&data, "T01", &geometry()),
            Err(StoreError::ColumnOutOfRange { index: 3, .. })
        ));

        let data = DMatrix::zeros(5, 4);
        writer.add_bar(&data, "T01", &geometry()).unwrap();
        assert!(matches!(
            writer.add_bar(&data, "T01", &geometry()),
            Err(StoreError::BarExists(_))
        ));
        writer.close().unwrap();
    }

    #[test]
    fn test_dtypes_and_descriptions() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("f.hdf5");
        let layout = ColumnLayout::from_columns([("time", 0), ("acnt", 1), ("temp", 2)])
            .with_dtype("acnt", ColumnType::I32)
            .with_description("temp", "Temperature [C]");
        let mut writer = Hdf5Writer::create(&path, layout).unwrap();
        let data = DMatrix::from_row_slice(2, 3, &[0.0, 1.7, 20.0, 1.0, 2.2, 21.0]);
        let mut attrs = geometry();
        attrs.insert("material".into(), AttrValue::from("R260"));
        writer.add_bar(&data, "T01", &attrs).unwrap();
        writer.close().unwrap();

        let file = File::open(&path).unwrap();
        let group = file.group("T01").unwrap();
        let acnt = group.dataset("acnt").unwrap();
        assert_eq!(acnt.read_raw::<i32>().unwrap(), vec![1, 2]);
        let temp = group.dataset("temp").unwrap();
        let description: VarLenUnicode = temp
            .attr(DESCRIPTION_ATTRIBUTE)
            .unwrap()
            .read_scalar()
            .unwrap();
        assert_eq!(description.as_str(), "Temperature [C]");

        let reader = Hdf5Reader::open(&path).unwrap();
        let attrs = reader.attributes("T01").unwrap();
        assert_eq!(attrs["material"], AttrValue::from("R260"));
        assert_eq!(attrs["gauge_length"], AttrValue::Float(12.0));
        assert_eq!(reader.raw_channel("T01", "acnt").unwrap(), vec![1.0, 2.0]);
    }
}
