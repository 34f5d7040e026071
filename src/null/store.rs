//! Flat-list persistence of null values.
//!
//! One value per line, no header. When a line has several comma-separated
//! fields only the first is read, so tables exported with extra columns
//! still load. Values are written with `f64`'s shortest round-trip
//! formatting, so a write followed by a read is exact.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use crate::error::{Error, Result};

/// Read null values from `path`.
///
/// # Errors
///
/// [`Error::Io`] if the file cannot be opened or read, [`Error::Parse`]
/// naming the first line whose leading field is not a number.
pub fn read_values(path: impl AsRef<Path>) -> Result<Vec<f64>> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_values(BufReader::new(file), path)
}

/// Parse null values from any buffered reader; `origin` labels errors.
pub fn parse_values<R: BufRead>(reader: R, origin: &Path) -> Result<Vec<f64>> {
    let mut values = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line.map_err(|source| Error::Io {
            path: origin.to_path_buf(),
            source,
        })?;
        let field = line.split(',').next().unwrap_or("").trim();
        if field.is_empty() {
            continue;
        }
        let value = field.parse::<f64>().map_err(|e| Error::Parse {
            path: origin.to_path_buf(),
            line: index + 1,
            reason: format!("'{field}': {e}"),
        })?;
        values.push(value);
    }
    Ok(values)
}

/// Write `values` to `path`, one per line, replacing any existing file.
///
/// # Errors
///
/// [`Error::Io`] if the file cannot be created or written.
pub fn write_values(path: impl AsRef<Path>, values: &[f64]) -> Result<()> {
    let path = path.as_ref();
    let io_err = |source| Error::Io {
        path: path.to_path_buf(),
        source,
    };
    let mut writer = BufWriter::new(File::create(path).map_err(io_err)?);
    for value in values {
        writeln!(writer, "{value}").map_err(io_err)?;
    }
    writer.flush().map_err(io_err)
}
