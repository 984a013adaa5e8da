use chrono::{Duration, NaiveDate};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::efficiency::{
    EfficiencyEngine, EfficiencyReport, EfficiencyScoreSnapshot, NewEfficiencyScore,
    RecorderError, ScoreRecorder,
};
use crate::records::{fetch_snapshot, FetchWindow, RecordSource, SourceError, UserId};

/// Service composing the record source, efficiency engine, and score history.
pub struct DashboardService<S, R> {
    source: Arc<S>,
    recorder: Arc<R>,
    engine: Arc<EfficiencyEngine>,
    default_days_back: u32,
}

impl<S, R> DashboardService<S, R>
where
    S: RecordSource + 'static,
    R: ScoreRecorder + 'static,
{
    pub fn new(
        source: Arc<S>,
        recorder: Arc<R>,
        engine: EfficiencyEngine,
        default_days_back: u32,
    ) -> Self {
        Self {
            source,
            recorder,
            engine: Arc::new(engine),
            default_days_back,
        }
    }

    pub fn default_days_back(&self) -> u32 {
        self.default_days_back
    }

    /// Computes the efficiency score for `user` as of `today`, the server's date.
    ///
    /// Positive scores are written to the user's history for `today`; a failed
    /// write is logged and does not affect the returned report.
    pub async fn efficiency_metrics(
        &self,
        user: &UserId,
        today: NaiveDate,
        days_back: Option<u32>,
    ) -> Result<EfficiencyReport, DashboardError> {
        let (report, days_back) = self.compute(user, today, days_back).await?;

        if report.overall_score > 0 {
            self.record_best_effort(user, today, &report).await;
        }

        info!(
            %user,
            overall = report.overall_score,
            rating = report.rating.label(),
            days_back,
            "computed efficiency score"
        );
        Ok(report)
    }

    /// Scores `user` as of an arbitrary date without writing history.
    pub async fn preview_metrics(
        &self,
        user: &UserId,
        as_of: NaiveDate,
        days_back: Option<u32>,
    ) -> Result<EfficiencyReport, DashboardError> {
        let (report, days_back) = self.compute(user, as_of, days_back).await?;
        debug!(
            %user,
            %as_of,
            overall = report.overall_score,
            days_back,
            "previewed efficiency score"
        );
        Ok(report)
    }

    async fn compute(
        &self,
        user: &UserId,
        as_of: NaiveDate,
        days_back: Option<u32>,
    ) -> Result<(EfficiencyReport, u32), DashboardError> {
        let days_back = days_back.unwrap_or(self.default_days_back);
        if days_back == 0 {
            return Err(DashboardError::InvalidWindow(days_back));
        }

        let window = FetchWindow::ending(as_of, days_back);
        let snapshot = fetch_snapshot(self.source.as_ref(), user, window).await?;
        Ok((self.engine.score(&snapshot, days_back), days_back))
    }

    /// Recorded scores for the `days` days ending at `today`, oldest first.
    pub async fn score_history(
        &self,
        user: &UserId,
        today: NaiveDate,
        days: u32,
    ) -> Result<Vec<EfficiencyScoreSnapshot>, DashboardError> {
        if days == 0 {
            return Err(DashboardError::InvalidWindow(days));
        }

        let start = today
            .checked_sub_signed(Duration::days(i64::from(days)))
            .unwrap_or(NaiveDate::MIN);
        let mut history = self.recorder.history(user, start, today).await?;
        history.sort_by_key(|snapshot| (snapshot.date, snapshot.id));
        Ok(history)
    }

    async fn record_best_effort(&self, user: &UserId, today: NaiveDate, report: &EfficiencyReport) {
        let entry = NewEfficiencyScore {
            user_id: user.clone(),
            date: today,
            overall_score: report.overall_score,
            score_breakdown: report.breakdown,
        };

        if let Err(err) = self.recorder.record(entry).await {
            warn!(%user, %today, error = %err, "failed to record efficiency score");
        }
    }
}

/// Error raised by the dashboard service.
#[derive(Debug, thiserror::Error)]
pub enum DashboardError {
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error(transparent)]
    History(#[from] RecorderError),
    #[error("lookback window must be at least one day (got {0})")]
    InvalidWindow(u32),
}
