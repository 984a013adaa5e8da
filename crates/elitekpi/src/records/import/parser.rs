use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};
use std::io::Read;

#[derive(Debug)]
pub(crate) struct TrackerRow {
    pub(crate) date: NaiveDate,
    pub(crate) calls: u32,
    pub(crate) appointments: u32,
    pub(crate) cmas_completed: u32,
    pub(crate) hours_worked: f64,
    pub(crate) offers_written: u32,
    pub(crate) showings: u32,
}

/// Row-level failure, surfaced to callers as an `ImportError`.
#[derive(Debug)]
pub(crate) enum RowError {
    Csv(csv::Error),
    Date { row: usize, value: String },
}

impl From<csv::Error> for RowError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

pub(crate) fn parse_rows<R: Read>(reader: R) -> Result<Vec<TrackerRow>, RowError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut rows = Vec::new();

    for (index, record) in csv_reader.deserialize::<RawTrackerRow>().enumerate() {
        let raw = record?;
        let date = parse_date(&raw.date).ok_or_else(|| RowError::Date {
            row: index + 1,
            value: raw.date.clone(),
        })?;

        rows.push(TrackerRow {
            date,
            calls: raw.calls,
            appointments: raw.appointments,
            cmas_completed: raw.cmas_completed,
            hours_worked: raw.hours_worked,
            offers_written: raw.offers_written,
            showings: raw.showings,
        });
    }

    Ok(rows)
}

#[derive(Debug, Deserialize)]
struct RawTrackerRow {
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Calls", default, deserialize_with = "blank_as_zero")]
    calls: u32,
    #[serde(rename = "Appointments", default, deserialize_with = "blank_as_zero")]
    appointments: u32,
    #[serde(rename = "CMAs Completed", default, deserialize_with = "blank_as_zero")]
    cmas_completed: u32,
    #[serde(rename = "Hours Worked", default, deserialize_with = "blank_hours_as_zero")]
    hours_worked: f64,
    #[serde(rename = "Offers Written", default, deserialize_with = "blank_as_zero")]
    offers_written: u32,
    #[serde(rename = "Showings", default, deserialize_with = "blank_as_zero")]
    showings: u32,
}

fn blank_as_zero<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(0),
        Some(value) => value.parse().map_err(serde::de::Error::custom),
    }
}

fn blank_hours_as_zero<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(0.0),
        Some(value) => value.parse().map_err(serde::de::Error::custom),
    }
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim().trim_start_matches('\u{feff}');
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(trimmed, "%m/%d/%Y"))
        .ok()
}

#[cfg(test)]
pub(crate) fn parse_date_for_tests(value: &str) -> Option<NaiveDate> {
    parse_date(value)
}
