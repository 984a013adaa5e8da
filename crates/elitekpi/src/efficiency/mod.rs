//! Efficiency score: five weighted sub-metrics blended into one 0-100 score.

mod aggregate;
pub mod config;
pub mod history;
mod metrics;

pub use config::{MetricWeights, ScoringConfig, ScoringConfigError};
pub use history::{EfficiencyScoreSnapshot, NewEfficiencyScore, RecorderError, ScoreRecorder};

use crate::records::RecordSnapshot;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EfficiencyMetric {
    Conversion,
    Activity,
    Time,
    Velocity,
    Roi,
}

impl EfficiencyMetric {
    pub const fn ordered() -> [Self; 5] {
        [
            Self::Conversion,
            Self::Activity,
            Self::Time,
            Self::Velocity,
            Self::Roi,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Conversion => "Conversion Efficiency",
            Self::Activity => "Activity Consistency",
            Self::Time => "Time Management",
            Self::Velocity => "Deal Velocity",
            Self::Roi => "ROI Performance",
        }
    }
}

/// The five sub-scores, serialized with the dashboard's camelCase keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    pub conversion_efficiency: u8,
    pub activity_consistency: u8,
    pub time_management: u8,
    pub deal_velocity: u8,
    pub roi_performance: u8,
}

impl ScoreBreakdown {
    pub fn get(&self, metric: EfficiencyMetric) -> u8 {
        match metric {
            EfficiencyMetric::Conversion => self.conversion_efficiency,
            EfficiencyMetric::Activity => self.activity_consistency,
            EfficiencyMetric::Time => self.time_management,
            EfficiencyMetric::Velocity => self.deal_velocity,
            EfficiencyMetric::Roi => self.roi_performance,
        }
    }

    /// Lowest sub-score; ties resolve to the metric listed first.
    pub fn weakest(&self) -> EfficiencyMetric {
        EfficiencyMetric::ordered()
            .into_iter()
            .min_by_key(|metric| self.get(*metric))
            .unwrap_or(EfficiencyMetric::Conversion)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EfficiencyRating {
    NotStarted,
    NeedsAttention,
    Developing,
    Strong,
    Excellent,
}

impl EfficiencyRating {
    pub fn from_score(score: u8) -> Self {
        match score {
            0 => Self::NotStarted,
            1..=49 => Self::NeedsAttention,
            50..=69 => Self::Developing,
            70..=84 => Self::Strong,
            _ => Self::Excellent,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::NotStarted => "Not Started",
            Self::NeedsAttention => "Needs Attention",
            Self::Developing => "Developing",
            Self::Strong => "Strong",
            Self::Excellent => "Excellent",
        }
    }
}

/// Result of one scoring pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EfficiencyReport {
    pub overall_score: u8,
    pub breakdown: ScoreBreakdown,
    pub rating: EfficiencyRating,
}

impl EfficiencyReport {
    fn empty() -> Self {
        Self {
            overall_score: 0,
            breakdown: ScoreBreakdown::default(),
            rating: EfficiencyRating::NotStarted,
        }
    }
}

/// Stateless scorer applying a [`ScoringConfig`] to a record snapshot.
#[derive(Debug, Clone, Default)]
pub struct EfficiencyEngine {
    config: ScoringConfig,
}

impl EfficiencyEngine {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Scores `records`, whose activity actuals span the last `days_back` days.
    pub fn score(&self, records: &RecordSnapshot, days_back: u32) -> EfficiencyReport {
        if records.is_new_user() {
            return EfficiencyReport::empty();
        }

        let config = &self.config;
        let breakdown = ScoreBreakdown {
            conversion_efficiency: metrics::conversion_efficiency(
                &records.properties,
                &config.conversion,
            ),
            activity_consistency: metrics::activity_consistency(
                &records.activity_actuals,
                days_back,
                &config.activity,
            ),
            time_management: metrics::time_management(
                &records.time_entries,
                records.properties.len(),
                &config.time,
            ),
            deal_velocity: metrics::deal_velocity(&records.properties, &config.velocity),
            roi_performance: metrics::roi_performance(
                &records.commissions,
                &records.expenses,
                &config.roi,
            ),
        };

        let overall_score = aggregate::weighted_overall(&breakdown, &config.weights);

        EfficiencyReport {
            overall_score,
            breakdown,
            rating: EfficiencyRating::from_score(overall_score),
        }
    }
}
