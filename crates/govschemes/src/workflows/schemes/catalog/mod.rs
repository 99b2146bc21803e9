mod parser;

pub(crate) use parser::{SchemeRow, CATALOG_HEADERS};

use std::io::Read;
use std::path::Path;

use super::domain::{RecordDefect, SchemeRecord};

/// A catalog row that failed validation, identified by its 1-based data row.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("catalog row {row}{} rejected: {defect}", name_suffix(.name))]
pub struct MalformedRecordError {
    pub row: usize,
    pub name: Option<String>,
    pub defect: RecordDefect,
}

fn name_suffix(name: &Option<String>) -> String {
    name.as_deref()
        .map(|name| format!(" ('{name}')"))
        .unwrap_or_default()
}

/// Result of reading a catalog: accepted records plus rejected rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CatalogLoad {
    pub records: Vec<SchemeRecord>,
    pub rejected: Vec<MalformedRecordError>,
}

impl CatalogLoad {
    pub fn rejected_count(&self) -> usize {
        self.rejected.len()
    }
}

#[derive(Debug)]
pub enum CatalogError {
    Io(std::io::Error),
    Csv(csv::Error),
}

impl std::fmt::Display for CatalogError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CatalogError::Io(err) => write!(f, "failed to read scheme catalog: {}", err),
            CatalogError::Csv(err) => write!(f, "invalid scheme catalog CSV: {}", err),
        }
    }
}

impl std::error::Error for CatalogError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CatalogError::Io(err) => Some(err),
            CatalogError::Csv(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for CatalogError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for CatalogError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

/// Reads scheme catalogs laid out with the
/// `NAME,STATE,GENDER,START AGE,END AGE,INCOME,STUDENT,MARRIED` header.
pub struct CatalogImporter;

impl CatalogImporter {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<CatalogLoad, CatalogError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<CatalogLoad, CatalogError> {
        Ok(parser::parse_catalog(reader)?)
    }
}
