use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::ScoreBreakdown;
use crate::records::UserId;

/// Score to persist for a user's daily trend history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEfficiencyScore {
    pub user_id: UserId,
    pub date: NaiveDate,
    pub overall_score: u8,
    pub score_breakdown: ScoreBreakdown,
}

/// Stored history row. A user has at most one row per date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EfficiencyScoreSnapshot {
    pub id: u64,
    pub user_id: UserId,
    pub date: NaiveDate,
    pub overall_score: u8,
    pub score_breakdown: ScoreBreakdown,
}

/// Storage seam for efficiency score history.
#[async_trait]
pub trait ScoreRecorder: Send + Sync {
    /// Stores the user's score for `score.date`. A second write for the same
    /// user and date replaces the scores and keeps the existing row id.
    async fn record(&self, score: NewEfficiencyScore)
        -> Result<EfficiencyScoreSnapshot, RecorderError>;

    /// Snapshots dated within `[start, end]`, oldest first.
    async fn history(
        &self,
        user: &UserId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<EfficiencyScoreSnapshot>, RecorderError>;
}

#[derive(Debug, thiserror::Error)]
pub enum RecorderError {
    #[error("score history unavailable: {0}")]
    Unavailable(String),
    #[error("score history rejected write: {0}")]
    Rejected(String),
}
