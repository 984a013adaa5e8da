//! Strongly typed agent records and the storage seam that supplies them.

pub mod domain;
pub mod import;
pub mod source;

pub use domain::{
    Activity, ActivityActual, ActivityKind, Commission, Expense, Property, PropertyStatus,
    RecordError, TimeEntry, UserId,
};
pub use import::{ActivityTrackerImporter, ImportError, RecordBundle};
pub use source::{fetch_snapshot, FetchWindow, RecordSnapshot, RecordSource, SourceError};
