//! File imports: JSON record bundles and daily activity tracker CSV exports.

mod parser;

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::io::Read;
use std::path::Path;
use tracing::warn;

use super::domain::{ActivityActual, RecordError, UserId};
use super::source::RecordSnapshot;
use parser::RowError;

#[derive(Debug)]
pub enum ImportError {
    Io(std::io::Error),
    Json(serde_json::Error),
    Csv(csv::Error),
    Date { row: usize, value: String },
    Record(RecordError),
}

impl std::fmt::Display for ImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImportError::Io(err) => write!(f, "failed to read import file: {}", err),
            ImportError::Json(err) => write!(f, "invalid record bundle JSON: {}", err),
            ImportError::Csv(err) => write!(f, "invalid activity tracker CSV: {}", err),
            ImportError::Date { row, value } => {
                write!(
                    f,
                    "activity tracker row {row}: '{value}' is not a YYYY-MM-DD or MM/DD/YYYY date"
                )
            }
            ImportError::Record(err) => write!(f, "imported records are inconsistent: {}", err),
        }
    }
}

impl std::error::Error for ImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ImportError::Io(err) => Some(err),
            ImportError::Json(err) => Some(err),
            ImportError::Csv(err) => Some(err),
            ImportError::Date { .. } => None,
            ImportError::Record(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<serde_json::Error> for ImportError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err)
    }
}

impl From<RecordError> for ImportError {
    fn from(err: RecordError) -> Self {
        Self::Record(err)
    }
}

impl From<RowError> for ImportError {
    fn from(err: RowError) -> Self {
        match err {
            RowError::Csv(err) => Self::Csv(err),
            RowError::Date { row, value } => Self::Date { row, value },
        }
    }
}

/// One agent's records as exported from the CRM.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordBundle {
    pub user_id: UserId,
    #[serde(flatten)]
    pub records: RecordSnapshot,
}

impl RecordBundle {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Vec<Self>, ImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    /// Accepts either a single bundle object or an array of bundles.
    pub fn from_reader<R: Read>(reader: R) -> Result<Vec<Self>, ImportError> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum OneOrMany {
            Many(Vec<RecordBundle>),
            One(RecordBundle),
        }

        let bundles = match serde_json::from_reader(reader)? {
            OneOrMany::Many(bundles) => bundles,
            OneOrMany::One(bundle) => vec![bundle],
        };

        for bundle in &bundles {
            bundle.records.validate()?;
        }
        Ok(bundles)
    }
}

pub struct ActivityTrackerImporter;

impl ActivityTrackerImporter {
    pub fn from_path<P: AsRef<Path>>(
        path: P,
        user: &UserId,
    ) -> Result<Vec<ActivityActual>, ImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file, user)
    }

    /// Parses a daily tracker export. Only the first row for each date is kept.
    pub fn from_reader<R: Read>(
        reader: R,
        user: &UserId,
    ) -> Result<Vec<ActivityActual>, ImportError> {
        let mut seen = HashSet::new();
        let mut actuals = Vec::new();

        for row in parser::parse_rows(reader)? {
            if !seen.insert(row.date) {
                warn!(%user, date = %row.date, "skipping duplicate activity tracker row");
                continue;
            }

            actuals.push(ActivityActual {
                id: actuals.len() as u64 + 1,
                user_id: user.clone(),
                date: row.date,
                calls: row.calls,
                appointments: row.appointments,
                cmas_completed: row.cmas_completed,
                hours_worked: row.hours_worked,
                offers_written: row.offers_written,
                showings: row.showings,
            });
        }

        Ok(actuals)
    }
}
