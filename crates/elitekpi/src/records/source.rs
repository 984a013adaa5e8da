use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::domain::{
    Activity, ActivityActual, Commission, Expense, Property, RecordError, TimeEntry, UserId,
};

/// Storage seam supplying an agent's business records.
#[async_trait]
pub trait RecordSource: Send + Sync {
    async fn properties(&self, user: &UserId) -> Result<Vec<Property>, SourceError>;
    async fn commissions(&self, user: &UserId) -> Result<Vec<Commission>, SourceError>;
    async fn expenses(&self, user: &UserId) -> Result<Vec<Expense>, SourceError>;
    async fn time_entries(&self, user: &UserId) -> Result<Vec<TimeEntry>, SourceError>;
    async fn activities(&self, user: &UserId) -> Result<Vec<Activity>, SourceError>;
    /// Daily actuals dated within `[start, end]`.
    async fn activity_actuals(
        &self,
        user: &UserId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<ActivityActual>, SourceError>;
}

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("record store unavailable: {0}")]
    Unavailable(String),
    #[error("record store returned invalid data: {0}")]
    Invalid(#[from] RecordError),
}

/// Inclusive date range the activity actuals are drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub days_back: u32,
}

impl FetchWindow {
    pub fn ending(today: NaiveDate, days_back: u32) -> Self {
        let start = today
            .checked_sub_signed(Duration::days(i64::from(days_back)))
            .unwrap_or(NaiveDate::MIN);
        Self {
            start,
            end: today,
            days_back,
        }
    }
}

/// Everything the efficiency engine reads for one user, fetched in one pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordSnapshot {
    pub properties: Vec<Property>,
    pub commissions: Vec<Commission>,
    pub expenses: Vec<Expense>,
    pub time_entries: Vec<TimeEntry>,
    pub activities: Vec<Activity>,
    pub activity_actuals: Vec<ActivityActual>,
}

impl RecordSnapshot {
    /// True when nothing scoreable has been recorded yet. Activities are not
    /// considered.
    pub fn is_new_user(&self) -> bool {
        self.properties.is_empty()
            && self.activity_actuals.is_empty()
            && self.time_entries.is_empty()
            && self.commissions.is_empty()
            && self.expenses.is_empty()
    }

    pub fn validate(&self) -> Result<(), RecordError> {
        self.properties.iter().try_for_each(Property::validate)?;
        self.commissions.iter().try_for_each(Commission::validate)
    }

    /// Keeps only the actuals dated inside `window`.
    pub fn restrict_actuals(&mut self, window: &FetchWindow) {
        self.activity_actuals
            .retain(|actual| actual.date >= window.start && actual.date <= window.end);
    }
}

/// Issues the six record queries concurrently and validates the result.
///
/// The first failing query aborts the whole fetch.
pub async fn fetch_snapshot<S>(
    source: &S,
    user: &UserId,
    window: FetchWindow,
) -> Result<RecordSnapshot, SourceError>
where
    S: RecordSource + ?Sized,
{
    let (properties, commissions, expenses, time_entries, activities, activity_actuals) = tokio::try_join!(
        source.properties(user),
        source.commissions(user),
        source.expenses(user),
        source.time_entries(user),
        source.activities(user),
        source.activity_actuals(user, window.start, window.end),
    )?;

    let snapshot = RecordSnapshot {
        properties,
        commissions,
        expenses,
        time_entries,
        activities,
        activity_actuals,
    };
    snapshot.validate()?;

    debug!(
        %user,
        properties = snapshot.properties.len(),
        commissions = snapshot.commissions.len(),
        expenses = snapshot.expenses.len(),
        time_entries = snapshot.time_entries.len(),
        activities = snapshot.activities.len(),
        activity_actuals = snapshot.activity_actuals.len(),
        "fetched efficiency records"
    );

    Ok(snapshot)
}
