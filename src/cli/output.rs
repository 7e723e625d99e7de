//! Tabular and structured output in the selected format
//!
//! Commands build a [`Table`] of typed cells and hand it to [`Table::print`]. Structured
//! results that do not fit a table are printed with [`print_structured`].

use console::style;
use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use tabled::{builder::Builder, settings::Style};

use crate::cli::OutputFormat;

/// A typed cell value
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    /// Test bar name (cyan in the terminal)
    Name(String),
    Text(String),
    Int(i64),
    /// Shown with six significant digits in the terminal
    Float(f64),
    Empty,
}

impl Cell {
    /// Full precision text, used for piped formats
    pub fn raw(&self) -> String {
        match self {
            Cell::Name(s) | Cell::Text(s) => s.clone(),
            Cell::Int(i) => i.to_string(),
            Cell::Float(x) => x.to_string(),
            Cell::Empty => String::new(),
        }
    }

    /// Compact text for the terminal
    pub fn display(&self) -> String {
        match self {
            Cell::Float(x) => format_float(*x),
            Cell::Empty => "-".to_string(),
            other => other.raw(),
        }
    }

    fn json(&self) -> serde_json::Value {
        match self {
            Cell::Name(s) | Cell::Text(s) => serde_json::Value::from(s.as_str()),
            Cell::Int(i) => serde_json::Value::from(*i),
            Cell::Float(x) => serde_json::Number::from_f64(*x)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Cell::Empty => serde_json::Value::Null,
        }
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Float(value)
    }
}

impl From<usize> for Cell {
    fn from(value: usize) -> Self {
        Cell::Int(value as i64)
    }
}

impl From<Option<f64>> for Cell {
    fn from(value: Option<f64>) -> Self {
        value.map(Cell::Float).unwrap_or(Cell::Empty)
    }
}

/// Six significant digits, switching to exponent notation for very large or small values
pub fn format_float(x: f64) -> String {
    if x == 0.0 || !x.is_finite() {
        return x.to_string();
    }
    let magnitude = x.abs().log10().floor() as i32;
    if !(-4..6).contains(&magnitude) {
        return format!("{:.5e}", x);
    }
    let decimals = (5 - magnitude).max(0) as usize;
    let s = format!("{:.*}", decimals, x);
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        s
    }
}

/// Rows of cells under a header
#[derive(Debug, Clone, Default)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<Cell>>,
    /// Noun for the summary line, e.g. "test bar"
    noun: Option<&'static str>,
}

impl Table {
    pub fn new<S: Into<String>>(headers: impl IntoIterator<Item = S>) -> Self {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    pub fn with_summary(mut self, noun: &'static str) -> Self {
        self.noun = Some(noun);
        self
    }

    pub fn push(&mut self, row: Vec<Cell>) {
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn print(&self, format: OutputFormat, quiet: bool) -> Result<()> {
        match format {
            OutputFormat::Auto => self.print_aligned(quiet),
            OutputFormat::Tsv => {
                println!("{}", self.headers.join("\t"));
                for row in &self.rows {
                    let cells: Vec<String> = row.iter().map(Cell::raw).collect();
                    println!("{}", cells.join("\t"));
                }
            }
            OutputFormat::Csv => {
                let mut writer = csv::Writer::from_writer(std::io::stdout());
                writer.write_record(&self.headers).into_diagnostic()?;
                for row in &self.rows {
                    writer
                        .write_record(row.iter().map(Cell::raw))
                        .into_diagnostic()?;
                }
                writer.flush().into_diagnostic()?;
            }
            OutputFormat::Md => println!("{}", self.markdown()),
            OutputFormat::Json | OutputFormat::Yaml => {
                print_structured(&self.records(), format)?;
            }
        }
        Ok(())
    }

    /// One object per row, keyed by header
    pub fn records(&self) -> Vec<serde_json::Map<String, serde_json::Value>> {
        self.rows
            .iter()
            .map(|row| {
                self.headers
                    .iter()
                    .cloned()
                    .zip(row.iter().map(Cell::json))
                    .collect()
            })
            .collect()
    }

    pub fn markdown(&self) -> String {
        let mut builder = Builder::default();
        builder.push_record(self.headers.iter().map(|h| h.replace('|', "\\|")));
        for row in &self.rows {
            builder.push_record(row.iter().map(|c| c.display().replace('|', "\\|")));
        }
        builder.build().with(Style::markdown()).to_string()
    }

    fn print_aligned(&self, quiet: bool) {
        let widths: Vec<usize> = self
            .headers
            .iter()
            .enumerate()
            .map(|(i, h)| {
                self.rows
                    .iter()
                    .filter_map(|r| r.get(i))
                    .map(|c| c.display().chars().count())
                    .max()
                    .unwrap_or(0)
                    .max(h.chars().count())
            })
            .collect();

        let header: Vec<String> = self
            .headers
            .iter()
            .zip(&widths)
            .map(|(h, w)| format!("{}", style(format!("{:<w$}", h, w = w)).bold()))
            .collect();
        println!("{}", header.join("  "));
        let total: usize = widths.iter().sum::<usize>() + 2 * widths.len().saturating_sub(1);
        println!("{}", "-".repeat(total));

        for row in &self.rows {
            let cells: Vec<String> = row
                .iter()
                .zip(&widths)
                .map(|(cell, w)| match cell {
                    Cell::Name(s) => format!("{}", style(format!("{:<w$}", s, w = w)).cyan()),
                    Cell::Text(s) => format!("{:<w$}", s, w = w),
                    Cell::Empty => format!("{}", style(format!("{:<w$}", "-", w = w)).dim()),
                    numeric => format!("{:>w$}", numeric.display(), w = w),
                })
                .collect();
            println!("{}", cells.join("  ").trim_end());
        }

        if let (Some(noun), false) = (self.noun, quiet) {
            println!();
            println!("{} {}(s) found.", style(self.rows.len()).cyan(), noun);
        }
    }
}

/// Print a serializable value as JSON or YAML (YAML for all other formats)
pub fn print_structured<T: Serialize + ?Sized>(value: &T, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(value).into_diagnostic()?);
        }
        _ => {
            print!("{}", serde_yml::to_string(&value).into_diagnostic()?);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_float() {
        assert_eq!(format_float(0.0), "0");
        assert_eq!(format_float(210000.0), "210000");
        assert_eq!(format_float(2.1e6), "2.10000e6");
        assert_eq!(format_float(12345.6789), "12345.7");
        assert_eq!(format_float(0.5), "0.5");
        assert_eq!(format_float(-1.25e-3), "-0.00125");
        assert_eq!(format_float(3.0e-6), "3.00000e-6");
    }

    #[test]
    fn test_cells() {
        assert_eq!(Cell::from(Some(1.5)).raw(), "1.5");
        assert_eq!(Cell::from(None::<f64>), Cell::Empty);
        assert_eq!(Cell::Empty.display(), "-");
        assert_eq!(Cell::from(3usize), Cell::Int(3));
    }

    #[test]
    fn test_records_and_markdown() {
        let mut table = Table::new(["bar", "emod"]);
        table.push(vec![Cell::Name("T01".into()), Cell::Float(210000.0)]);
        table.push(vec![Cell::Name("T|2".into()), Cell::Empty]);

        let records = table.records();
        assert_eq!(records[0]["bar"], serde_json::json!("T01"));
        assert_eq!(records[0]["emod"], serde_json::json!(210000.0));
        assert!(records[1]["emod"].is_null());

        let md = table.markdown();
        assert!(md.contains("| bar"));
        assert!(md.contains("T\\|2"));
        assert_eq!(table.len(), 2);
    }
}
