//! Galaxy catalog records.
//!
//! The catalog is pulled from the simulation database by an external tool and
//! handed to this crate as plain rows. Each row describes one subhalo at one
//! snapshot, together with the ID of its descendant at the next snapshot.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use log::debug;
use nalgebra::Vector3;
use thiserror::Error;

/// Number of columns in a catalog text row.
pub const CATALOG_COLUMNS: usize = 8;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("I/O error reading catalog: {0}")]
    Io(#[from] std::io::Error),

    #[error("Catalog line {line}: {reason}")]
    Format { line: usize, reason: String },
}

/// One galaxy at one snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct GalaxyRecord {
    pub id: i64,
    pub snapshot: i64,
    /// Dark matter mass in solar masses
    pub mass_dm: f64,
    pub position: Vector3<f64>,
    /// ID of this galaxy's descendant in the following snapshot
    pub descendant_id: i64,
    pub redshift: f64,
}

impl GalaxyRecord {
    pub fn new(
        id: i64,
        snapshot: i64,
        mass_dm: f64,
        position: Vector3<f64>,
        descendant_id: i64,
        redshift: f64,
    ) -> Self {
        Self {
            id,
            snapshot,
            mass_dm,
            position,
            descendant_id,
            redshift,
        }
    }
}

/// Read-only table of galaxy records.
#[derive(Debug, Clone, Default)]
pub struct GalaxyCatalog {
    records: Vec<GalaxyRecord>,
}

impl GalaxyCatalog {
    pub fn new(records: Vec<GalaxyRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[GalaxyRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records matching a predicate, in catalog order.
    pub fn filter<F>(&self, predicate: F) -> impl Iterator<Item = &GalaxyRecord>
    where
        F: Fn(&GalaxyRecord) -> bool,
    {
        self.records.iter().filter(move |r| predicate(r))
    }

    /// All records at one snapshot.
    pub fn by_snapshot(&self, snapshot: i64) -> impl Iterator<Item = &GalaxyRecord> {
        self.filter(move |r| r.snapshot == snapshot)
    }

    /// Load a catalog from a text table.
    ///
    /// Rows hold `ID SnapNum MassType_DM x y z DesID Redshift` separated by
    /// whitespace or commas. Blank lines and lines starting with `#` are
    /// skipped. Any malformed row fails the whole load.
    pub fn load_from_file(path: &Path) -> Result<Self, CatalogError> {
        let reader = BufReader::new(File::open(path)?);
        let catalog = Self::read_from(reader)?;
        debug!(
            "Loaded {} galaxy records from {}",
            catalog.len(),
            path.display()
        );
        Ok(catalog)
    }

    /// Parse a catalog from any buffered reader. See [`Self::load_from_file`].
    pub fn read_from<R: BufRead>(reader: R) -> Result<Self, CatalogError> {
        let mut records = Vec::new();
        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            records.push(parse_row(trimmed, idx + 1)?);
        }
        Ok(Self { records })
    }
}

fn parse_row(row: &str, line: usize) -> Result<GalaxyRecord, CatalogError> {
    let fields: Vec<&str> = row
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|f| !f.is_empty())
        .collect();

    if fields.len() != CATALOG_COLUMNS {
        return Err(CatalogError::Format {
            line,
            reason: format!(
                "expected {CATALOG_COLUMNS} columns, found {}",
                fields.len()
            ),
        });
    }

    let float = |col: usize| -> Result<f64, CatalogError> {
        fields[col].parse::<f64>().map_err(|_| CatalogError::Format {
            line,
            reason: format!("column {} is not a number: '{}'", col + 1, fields[col]),
        })
    };
    let int = |col: usize| -> Result<i64, CatalogError> {
        fields[col].parse::<i64>().map_err(|_| CatalogError::Format {
            line,
            reason: format!("column {} is not an integer: '{}'", col + 1, fields[col]),
        })
    };

    Ok(GalaxyRecord {
        id: int(0)?,
        snapshot: int(1)?,
        mass_dm: float(2)?,
        position: Vector3::new(float(3)?, float(4)?, float(5)?),
        descendant_id: int(6)?,
        redshift: float(7)?,
    })
}
