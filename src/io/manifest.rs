//! Import manifests describing how text exports become an HDF5 data file
//!
//! ```yaml
//! columns: { time: 0, forc: 1, astr: 2, torq: 3, tstr: 4, acnt: 5, tcnt: 6 }
//! dtypes: { acnt: i32, tcnt: i32 }
//! bars:
//!   - name: T01
//!     file: raw/T01.txt
//!     attributes: { inner_diameter: 12.0, outer_diameter: 14.0, gauge_length: 12.0 }
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::{load_text_matrix, Attributes, ColumnLayout, ColumnType, Hdf5Writer, StoreError};
use crate::report::EmbeddedTemplates;

/// One test bar to import
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarEntry {
    pub name: String,

    /// Text file with the measured columns, relative to the manifest
    pub file: PathBuf,

    #[serde(default)]
    pub attributes: Attributes,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportManifest {
    /// Dataset name to column index
    pub columns: BTreeMap<String, usize>,

    #[serde(default)]
    pub dtypes: BTreeMap<String, ColumnType>,

    #[serde(default)]
    pub descriptions: BTreeMap<String, String>,

    /// Column delimiter, whitespace when not given
    #[serde(default)]
    pub delimiter: Option<char>,

    pub bars: Vec<BarEntry>,

    #[serde(skip)]
    base_dir: PathBuf,
}

/// Name and number of rows of an imported test bar
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportedBar {
    pub name: String,
    pub rows: usize,
}

impl ImportManifest {
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        let content = std::fs::read_to_string(path).map_err(|source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut manifest: ImportManifest =
            serde_yml::from_str(&content).map_err(|source| StoreError::Manifest {
                path: path.to_path_buf(),
                source,
            })?;
        manifest.base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        Ok(manifest)
    }

    pub fn layout(&self) -> ColumnLayout {
        ColumnLayout {
            columns: self.columns.clone(),
            dtypes: self.dtypes.clone(),
            descriptions: self.descriptions.clone(),
        }
    }

    /// Path of a bar's text file, relative paths resolved against the manifest directory
    pub fn resolve(&self, entry: &BarEntry) -> PathBuf {
        if entry.file.is_absolute() {
            entry.file.clone()
        } else {
            self.base_dir.join(&entry.file)
        }
    }

    /// Write all bars into a new HDF5 file at `output`
    ///
    /// The bars are written to a hidden file next to `output`, which replaces `output`
    /// only once every bar was imported. An existing `output` is left untouched on failure.
    pub fn import(&self, output: &Path) -> Result<Vec<ImportedBar>, StoreError> {
        let partial = partial_path(output);
        let imported = match self.write_bars(&partial) {
            Ok(imported) => imported,
            Err(err) => {
                if let Err(e) = fs::remove_file(&partial) {
                    tracing::debug!("Could not remove {}: {}", partial.display(), e);
                }
                return Err(err);
            }
        };
        fs::rename(&partial, output).map_err(|source| StoreError::Io {
            path: output.to_path_buf(),
            source,
        })?;
        Ok(imported)
    }

    fn write_bars(&self, path: &Path) -> Result<Vec<ImportedBar>, StoreError> {
        let mut writer = Hdf5Writer::create(path, self.layout())?;
        let mut imported = Vec::with_capacity(self.bars.len());
        for entry in &self.bars {
            let data = load_text_matrix(&self.resolve(entry), self.delimiter)?;
            writer.add_bar(&data, &entry.name, &entry.attributes)?;
            imported.push(ImportedBar {
                name: entry.name.clone(),
                rows: data.nrows(),
            });
        }
        writer.close()?;
        Ok(imported)
    }

    /// Starting point for a new manifest
    pub fn template() -> String {
        EmbeddedTemplates::get("import.yaml")
            .map(|file| String::from_utf8_lossy(&file.data).into_owned())
            .unwrap_or_default()
    }
}

fn partial_path(output: &Path) -> PathBuf {
    let name = output
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    output.with_file_name(format!(".{name}.partial"))
}
