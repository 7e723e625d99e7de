//! Sortable HTML table of test bar attributes

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use serde::Serialize;
use tera::{Context, Tera};

use super::{EmbeddedTemplates, ReportError};
use crate::io::{FormatSpec, Hdf5Reader};

const TABLE_TEMPLATE: &str = "test_data.html.tera";
const ASSETS: [&str; 2] = ["style.css", "table.js"];

/// Name of the written HTML file
pub const TABLE_FILE: &str = "test_data.html";

/// Header and formatted rows, one row per test bar with the bar name first
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttributeTable {
    pub head: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Collect the given attributes of every test bar
///
/// A missing attribute gives an empty cell.
pub fn build_table(
    reader: &Hdf5Reader,
    attrs: &[String],
    formats: Option<&[FormatSpec]>,
) -> Result<AttributeTable, ReportError> {
    if let Some(formats) = formats {
        if formats.len() != attrs.len() {
            return Err(ReportError::FormatCount {
                attrs: attrs.len(),
                formats: formats.len(),
            });
        }
    }

    let mut head = vec!["test bar".to_string()];
    head.extend(attrs.iter().cloned());

    let mut rows = Vec::new();
    for bar in reader.bar_names()? {
        let values = reader.attributes(&bar)?;
        let mut row = vec![bar.clone()];
        for (i, key) in attrs.iter().enumerate() {
            let cell = match (values.get(key), formats) {
                (Some(value), Some(formats)) => value.format(&formats[i])?,
                (Some(value), None) => value.to_string(),
                (None, _) => {
                    tracing::warn!("Test bar {} has no attribute {}", bar, key);
                    String::new()
                }
            };
            row.push(cell);
        }
        rows.push(row);
    }

    Ok(AttributeTable { head, rows })
}

fn embedded(name: &str) -> Result<Vec<u8>, ReportError> {
    EmbeddedTemplates::get(name)
        .map(|file| file.data.into_owned())
        .ok_or_else(|| ReportError::MissingTemplate(name.to_string()))
}

fn render(table: &AttributeTable, source: &Path) -> Result<String, ReportError> {
    let template = String::from_utf8_lossy(&embedded(TABLE_TEMPLATE)?).into_owned();
    let mut tera = Tera::default();
    // Registered with an .html name so values are escaped
    tera.add_raw_template(TABLE_FILE, &template)?;

    let mut context = Context::new();
    context.insert("title", "Test data");
    context.insert(
        "source",
        &source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
    );
    context.insert("generated", &Local::now().format("%Y-%m-%d %H:%M").to_string());
    context.insert("head", &table.head);
    context.insert("rows", &table.rows);

    Ok(tera.render(TABLE_FILE, &context)?)
}

fn write_file(path: PathBuf, content: &[u8]) -> Result<(), ReportError> {
    fs::write(&path, content).map_err(|source| ReportError::Io { path, source })
}

/// Write `test_data.html`, `style.css` and `table.js` into a recreated `output_dir`
///
/// Returns the path of the HTML file.
pub fn write_html_table(
    reader: &Hdf5Reader,
    attrs: &[String],
    formats: Option<&[FormatSpec]>,
    output_dir: &Path,
) -> Result<PathBuf, ReportError> {
    let table = build_table(reader, attrs, formats)?;
    let html = render(&table, reader.path())?;

    let io_err = |source| ReportError::Io {
        path: output_dir.to_path_buf(),
        source,
    };
    if output_dir.exists() {
        tracing::debug!("Removing existing {}", output_dir.display());
        fs::remove_dir_all(output_dir).map_err(io_err)?;
    }
    fs::create_dir_all(output_dir).map_err(io_err)?;

    let html_path = output_dir.join(TABLE_FILE);
    write_file(html_path.clone(), html.as_bytes())?;
    for asset in ASSETS {
        write_file(output_dir.join(asset), &embedded(asset)?)?;
    }

    tracing::info!(
        "Wrote table with {} test bars to {}",
        table.rows.len(),
        html_path.display()
    );
    Ok(html_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::{AttrValue, Attributes, ColumnLayout, Hdf5Writer};
    use nalgebra::DMatrix;
    use tempfile::TempDir;

    fn data_file(dir: &TempDir) -> PathBuf {
        let path = dir.path().join("data.hdf5");
        let mut writer =
            Hdf5Writer::create(&path, ColumnLayout::from_columns([("time", 0)])).unwrap();
        for (name, angle) in [("T02", 45.0), ("T01", 0.0)] {
            let mut attrs = Attributes::new();
            attrs.insert("inner_diameter".into(), AttrValue::Float(12.0));
            attrs.insert("outer_diameter".into(), AttrValue::Float(14.0));
            attrs.insert("gauge_length".into(), AttrValue::Float(12.0));
            attrs.insert("load_angle".into(), AttrValue::Float(angle));
            attrs.insert("test_type".into(), AttrValue::from("<ratcheting>"));
            writer.add_bar(&DMatrix::zeros(3, 1), name, &attrs).unwrap();
        }
        writer.close().unwrap();
        path
    }

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_build_table() {
        let dir = TempDir::new().unwrap();
        let reader = Hdf5Reader::open(data_file(&dir)).unwrap();
        let attrs = strings(&["load_angle", "pdef_level"]);

        let table = build_table(&reader, &attrs, None).unwrap();
        assert_eq!(table.head, strings(&["test bar", "load_angle", "pdef_level"]));
        assert_eq!(table.rows[0], strings(&["T01", "0.0", ""]));
        assert_eq!(table.rows[1], strings(&["T02", "45.0", ""]));

        let formats: Vec<FormatSpec> = vec!["5.1f".parse().unwrap(), "d".parse().unwrap()];
        let table = build_table(&reader, &attrs, Some(&formats)).unwrap();
        assert_eq!(table.rows[1][1], " 45.0");

        let result = build_table(&reader, &attrs, Some(&formats[..1]));
        assert!(matches!(
            result,
            Err(ReportError::FormatCount { attrs: 2, formats: 1 })
        ));
    }

    #[test]
    fn test_write_html_table() {
        let dir = TempDir::new().unwrap();
        let reader = Hdf5Reader::open(data_file(&dir)).unwrap();
        let output = dir.path().join("html");
        fs::create_dir_all(&output).unwrap();
        fs::write(output.join("stale.txt"), "old").unwrap();

        let attrs = strings(&["test_type", "load_angle"]);
        let path = write_html_table(&reader, &attrs, None, &output).unwrap();
        assert_eq!(path, output.join(TABLE_FILE));
        assert!(!output.join("stale.txt").exists());
        assert!(output.join("style.css").exists());
        assert!(output.join("table.js").exists());

        let html = fs::read_to_string(path).unwrap();
        assert_eq!(html.matches("<th>test bar</th>").count(), 2);
        assert!(html.contains("<td>T01</td>"));
        assert!(html.contains("&lt;ratcheting&gt;"));
        assert!(html.find("<td>T01</td>") < html.find("<td>T02</td>"));
    }
}
