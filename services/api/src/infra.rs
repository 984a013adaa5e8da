use async_trait::async_trait;
use chrono::NaiveDate;
use elitekpi::efficiency::{
    EfficiencyScoreSnapshot, NewEfficiencyScore, RecorderError, ScoreRecorder,
};
use elitekpi::records::{
    Activity, ActivityActual, Commission, Expense, Property, RecordBundle, RecordSnapshot,
    RecordSource, SourceError, TimeEntry, UserId,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, RwLock};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Record store backed by preloaded bundles, keyed by user.
#[derive(Default, Clone)]
pub(crate) struct InMemoryRecordStore {
    records: Arc<RwLock<HashMap<UserId, RecordSnapshot>>>,
}

impl InMemoryRecordStore {
    pub(crate) fn load(&self, bundles: Vec<RecordBundle>) -> Result<usize, SourceError> {
        let mut guard = self
            .records
            .write()
            .map_err(|_| SourceError::Unavailable("record store lock poisoned".to_string()))?;
        for bundle in &bundles {
            bundle.records.validate()?;
        }
        let count = bundles.len();
        for bundle in bundles {
            guard.insert(bundle.user_id, bundle.records);
        }
        Ok(count)
    }

    fn read<T>(
        &self,
        user: &UserId,
        select: impl FnOnce(&RecordSnapshot) -> Vec<T>,
    ) -> Result<Vec<T>, SourceError> {
        let guard = self
            .records
            .read()
            .map_err(|_| SourceError::Unavailable("record store lock poisoned".to_string()))?;
        Ok(guard.get(user).map(select).unwrap_or_default())
    }
}

#[async_trait]
impl RecordSource for InMemoryRecordStore {
    async fn properties(&self, user: &UserId) -> Result<Vec<Property>, SourceError> {
        self.read(user, |records| records.properties.clone())
    }

    async fn commissions(&self, user: &UserId) -> Result<Vec<Commission>, SourceError> {
        self.read(user, |records| records.commissions.clone())
    }

    async fn expenses(&self, user: &UserId) -> Result<Vec<Expense>, SourceError> {
        self.read(user, |records| records.expenses.clone())
    }

    async fn time_entries(&self, user: &UserId) -> Result<Vec<TimeEntry>, SourceError> {
        self.read(user, |records| records.time_entries.clone())
    }

    async fn activities(&self, user: &UserId) -> Result<Vec<Activity>, SourceError> {
        self.read(user, |records| records.activities.clone())
    }

    async fn activity_actuals(
        &self,
        user: &UserId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<ActivityActual>, SourceError> {
        self.read(user, |records| {
            records
                .activity_actuals
                .iter()
                .filter(|actual| actual.date >= start && actual.date <= end)
                .cloned()
                .collect()
        })
    }
}

#[derive(Default)]
struct HistoryRows {
    next_id: u64,
    rows: BTreeMap<(UserId, NaiveDate), EfficiencyScoreSnapshot>,
}

/// Score history held in process memory, one row per user and day.
#[derive(Default, Clone)]
pub(crate) struct InMemoryScoreHistory {
    inner: Arc<Mutex<HistoryRows>>,
}

#[async_trait]
impl ScoreRecorder for InMemoryScoreHistory {
    async fn record(
        &self,
        score: NewEfficiencyScore,
    ) -> Result<EfficiencyScoreSnapshot, RecorderError> {
        let mut guard = self
            .inner
            .lock()
            .map_err(|_| RecorderError::Unavailable("score history lock poisoned".to_string()))?;
        let HistoryRows { next_id, rows } = &mut *guard;

        let snapshot = match rows.entry((score.user_id.clone(), score.date)) {
            Entry::Occupied(mut existing) => {
                let row = existing.get_mut();
                row.overall_score = score.overall_score;
                row.score_breakdown = score.score_breakdown;
                row.clone()
            }
            Entry::Vacant(slot) => {
                *next_id += 1;
                slot.insert(EfficiencyScoreSnapshot {
                    id: *next_id,
                    user_id: score.user_id,
                    date: score.date,
                    overall_score: score.overall_score,
                    score_breakdown: score.score_breakdown,
                })
                .clone()
            }
        };
        Ok(snapshot)
    }

    async fn history(
        &self,
        user: &UserId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<EfficiencyScoreSnapshot>, RecorderError> {
        if start > end {
            return Ok(Vec::new());
        }
        let guard = self
            .inner
            .lock()
            .map_err(|_| RecorderError::Unavailable("score history lock poisoned".to_string()))?;
        Ok(guard
            .rows
            .range((user.clone(), start)..=(user.clone(), end))
            .map(|(_, row)| row.clone())
            .collect())
    }
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}
