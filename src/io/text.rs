//! Loading of column-oriented text files as exported by test machines

use std::path::Path;

use nalgebra::DMatrix;

use super::StoreError;

/// Load a numeric text file into a matrix with one row per line
///
/// Blank lines and lines starting with `#` are skipped. Without a delimiter columns are
/// separated by whitespace, otherwise the file is read as delimited text.
pub fn load_text_matrix(path: &Path, delimiter: Option<char>) -> Result<DMatrix<f64>, StoreError> {
    let rows = match delimiter {
        None | Some(' ') => read_whitespace(path)?,
        Some(d) => read_delimited(path, d)?,
    };

    let ncols = rows.first().map(|(_, r)| r.len()).unwrap_or(0);
    let mut values = Vec::with_capacity(rows.len() * ncols);
    for (line, row) in &rows {
        if row.len() != ncols {
            return Err(StoreError::Parse {
                path: path.to_path_buf(),
                line: *line,
                message: format!("expected {} columns, found {}", ncols, row.len()),
            });
        }
        values.extend_from_slice(row);
    }

    tracing::debug!(
        "Loaded {} rows and {} columns from {}",
        rows.len(),
        ncols,
        path.display()
    );
    Ok(DMatrix::from_row_slice(rows.len(), ncols, &values))
}

fn parse_value(path: &Path, line: usize, field: &str) -> Result<f64, StoreError> {
    field.trim().parse::<f64>().map_err(|_| StoreError::Parse {
        path: path.to_path_buf(),
        line,
        message: format!("'{}' is not a number", field.trim()),
    })
}

fn read_whitespace(path: &Path) -> Result<Vec<(usize, Vec<f64>)>, StoreError> {
    let content = std::fs::read_to_string(path).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let mut rows = Vec::new();
    for (i, line) in content.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let row = trimmed
            .split_whitespace()
            .map(|field| parse_value(path, i + 1, field))
            .collect::<Result<Vec<_>, _>>()?;
        rows.push((i + 1, row));
    }
    Ok(rows)
}

fn read_delimited(path: &Path, delimiter: char) -> Result<Vec<(usize, Vec<f64>)>, StoreError> {
    let delimiter = u8::try_from(delimiter).map_err(|_| StoreError::Parse {
        path: path.to_path_buf(),
        line: 0,
        message: format!("delimiter '{delimiter}' is not a single byte character"),
    })?;

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .delimiter(delimiter)
        .comment(Some(b'#'))
        .trim(csv::Trim::All)
        .flexible(true)
        .from_path(path)
        .map_err(|source| StoreError::Csv {
            path: path.to_path_buf(),
            source,
        })?;

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|source| StoreError::Csv {
            path: path.to_path_buf(),
            source,
        })?;
        let line = record.position().map(|p| p.line() as usize).unwrap_or(0);
        if record.iter().all(|field| field.is_empty()) {
            continue;
        }
        let row = record
            .iter()
            .map(|field| parse_value(path, line, field))
            .collect::<Result<Vec<_>, _>>()?;
        rows.push((line, row));
    }
    Ok(rows)
}
