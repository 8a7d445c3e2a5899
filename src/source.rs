use std::{
    fs::File,
    io::{BufReader, Read},
    path::{Path, PathBuf},
};

use miette::Diagnostic;
use thiserror::Error;
use tracing::{debug, info};

use crate::record::RawRow;

pub const REQUIRED_COLUMNS: [&str; 3] = ["date", "min_temperature", "max_temperature"];

#[derive(Debug, Error, Diagnostic)]
pub enum LoadError {
    #[error("Could not read temperature data: {0}")]
    #[diagnostic(code(heatmap::load::io))]
    Io(#[from] std::io::Error),
    #[error("Malformed CSV: {0}")]
    #[diagnostic(code(heatmap::load::csv))]
    Csv(#[from] csv::Error),
    #[error("Missing column `{0}`")]
    #[diagnostic(
        code(heatmap::load::missing_column),
        help("the header must name the date, min_temperature and max_temperature columns")
    )]
    MissingColumn(&'static str),
}

/// Anything that can hand over the raw temperature rows. Loading either
/// returns every row or fails as a whole.
pub trait DataSource {
    fn load(&self) -> Result<Vec<RawRow>, LoadError>;
}

/// A daily temperature CSV on disk.
#[derive(Debug, Clone)]
pub struct CsvFile {
    path: PathBuf,
}

impl CsvFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DataSource for CsvFile {
    fn load(&self) -> Result<Vec<RawRow>, LoadError> {
        info!(path = %self.path.display(), "loading temperature data");
        let file = File::open(&self.path)?;
        read_rows(BufReader::new(file))
    }
}

/// A CSV document already held in memory, for instance a downloaded body.
#[derive(Debug, Clone)]
pub struct CsvBuffer {
    bytes: Vec<u8>,
}

impl CsvBuffer {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }
}

impl DataSource for CsvBuffer {
    fn load(&self) -> Result<Vec<RawRow>, LoadError> {
        read_rows(self.bytes.as_slice())
    }
}

/// Rows built by hand, mostly for tests and synthetic data.
impl DataSource for Vec<RawRow> {
    fn load(&self) -> Result<Vec<RawRow>, LoadError> {
        Ok(self.clone())
    }
}

/// Reads every row of a temperature CSV. Columns are matched by header
/// name and any extra column is ignored. Fields are kept as strings, their
/// validation happens during aggregation.
pub fn read_rows<R: Read>(reader: R) -> Result<Vec<RawRow>, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .from_reader(reader);

    let headers = reader.headers()?;
    for column in REQUIRED_COLUMNS {
        if !headers.iter().any(|header| header == column) {
            return Err(LoadError::MissingColumn(column));
        }
    }

    let mut rows = Vec::new();
    for result in reader.deserialize() {
        let row: RawRow = result?;
        rows.push(row);
    }
    debug!(rows = rows.len(), "read temperature rows");

    Ok(rows)
}
