use serde::{Deserialize, Serialize};
use std::path::Path;

use super::EfficiencyMetric;

/// Tunable weights and thresholds for the efficiency score.
///
/// Defaults reproduce the product-tuned values agents have been scored against;
/// a JSON file may override any subset of them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ScoringConfig {
    pub weights: MetricWeights,
    pub conversion: ConversionRules,
    pub activity: ActivityRules,
    pub time: TimeRules,
    pub velocity: VelocityRules,
    pub roi: RoiRules,
}

impl ScoringConfig {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ScoringConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, ScoringConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ScoringConfigError> {
        self.weights.validate()?;

        let mut scores = vec![
            self.conversion.in_progress_floor,
            self.activity.tracked_floor,
            self.time.ideal.score,
            self.time.acceptable.score,
            self.time.logged_score,
            self.time.untracked_score,
            self.velocity.slow_score,
            self.velocity.pending_score,
            self.roi.no_expense_score,
            self.roi.unclassified_score,
        ];
        scores.extend(self.velocity.tiers.iter().map(|tier| tier.score));
        scores.extend(self.roi.tiers.iter().map(|tier| tier.score));
        if let Some(score) = scores.into_iter().find(|score| *score > 100) {
            return Err(ScoringConfigError::ScoreOutOfRange(score));
        }

        if self.activity.max_window_days == 0 {
            return Err(ScoringConfigError::EmptyActivityWindow);
        }

        let velocity_sorted = self
            .velocity
            .tiers
            .windows(2)
            .all(|pair| pair[0].max_days < pair[1].max_days);
        if !velocity_sorted {
            return Err(ScoringConfigError::UnorderedTiers("velocity"));
        }

        let roi_sorted = self
            .roi
            .tiers
            .windows(2)
            .all(|pair| pair[0].min_ratio > pair[1].min_ratio);
        if !roi_sorted {
            return Err(ScoringConfigError::UnorderedTiers("roi"));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricWeights {
    pub conversion: f64,
    pub activity: f64,
    pub time: f64,
    pub velocity: f64,
    pub roi: f64,
}

impl MetricWeights {
    const TOLERANCE: f64 = 1e-6;

    pub fn get(&self, metric: EfficiencyMetric) -> f64 {
        match metric {
            EfficiencyMetric::Conversion => self.conversion,
            EfficiencyMetric::Activity => self.activity,
            EfficiencyMetric::Time => self.time,
            EfficiencyMetric::Velocity => self.velocity,
            EfficiencyMetric::Roi => self.roi,
        }
    }

    pub fn total(&self) -> f64 {
        EfficiencyMetric::ordered()
            .into_iter()
            .map(|metric| self.get(metric))
            .sum()
    }

    fn validate(&self) -> Result<(), ScoringConfigError> {
        for metric in EfficiencyMetric::ordered() {
            let weight = self.get(metric);
            if !weight.is_finite() || weight < 0.0 {
                return Err(ScoringConfigError::NegativeWeight(metric.label()));
            }
        }

        let total = self.total();
        if (total - 1.0).abs() > Self::TOLERANCE {
            return Err(ScoringConfigError::WeightsDoNotSumToOne(total));
        }
        Ok(())
    }
}

impl Default for MetricWeights {
    fn default() -> Self {
        Self {
            conversion: 0.25,
            activity: 0.20,
            time: 0.20,
            velocity: 0.20,
            roi: 0.15,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversionRules {
    /// Score for agents with listings but no closings yet.
    pub in_progress_floor: u8,
}

impl Default for ConversionRules {
    fn default() -> Self {
        Self {
            in_progress_floor: 65,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActivityRules {
    pub max_window_days: u32,
    /// Minimum score once any day in the window has tracked activity.
    pub tracked_floor: u8,
}

impl Default for ActivityRules {
    fn default() -> Self {
        Self {
            max_window_days: 30,
            tracked_floor: 60,
        }
    }
}

/// Inclusive band of average hours logged per property.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HoursBand {
    pub min_hours: f64,
    pub max_hours: f64,
    pub score: u8,
}

impl HoursBand {
    pub fn contains(&self, hours: f64) -> bool {
        hours >= self.min_hours && hours <= self.max_hours
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeRules {
    pub ideal: HoursBand,
    pub acceptable: HoursBand,
    pub logged_score: u8,
    pub untracked_score: u8,
}

impl Default for TimeRules {
    fn default() -> Self {
        Self {
            ideal: HoursBand {
                min_hours: 8.0,
                max_hours: 20.0,
                score: 90,
            },
            acceptable: HoursBand {
                min_hours: 5.0,
                max_hours: 30.0,
                score: 78,
            },
            logged_score: 65,
            untracked_score: 60,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VelocityTier {
    pub max_days: f64,
    pub score: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VelocityRules {
    /// Ascending by `max_days`; the first tier that fits wins.
    pub tiers: Vec<VelocityTier>,
    pub slow_score: u8,
    pub pending_score: u8,
}

impl Default for VelocityRules {
    fn default() -> Self {
        Self {
            tiers: vec![
                VelocityTier {
                    max_days: 30.0,
                    score: 95,
                },
                VelocityTier {
                    max_days: 45.0,
                    score: 85,
                },
                VelocityTier {
                    max_days: 60.0,
                    score: 75,
                },
                VelocityTier {
                    max_days: 90.0,
                    score: 65,
                },
            ],
            slow_score: 50,
            pending_score: 65,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoiTier {
    pub min_ratio: f64,
    pub score: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoiRules {
    /// Descending by `min_ratio`; the first tier reached wins.
    pub tiers: Vec<RoiTier>,
    pub no_expense_score: u8,
    pub unclassified_score: u8,
}

impl Default for RoiRules {
    fn default() -> Self {
        Self {
            tiers: vec![
                RoiTier {
                    min_ratio: 5.0,
                    score: 95,
                },
                RoiTier {
                    min_ratio: 3.0,
                    score: 88,
                },
                RoiTier {
                    min_ratio: 2.0,
                    score: 78,
                },
                RoiTier {
                    min_ratio: 1.5,
                    score: 68,
                },
                RoiTier {
                    min_ratio: 1.0,
                    score: 58,
                },
            ],
            no_expense_score: 92,
            unclassified_score: 85,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ScoringConfigError {
    #[error("failed to read scoring config: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid scoring config JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("metric weights must sum to 1.0 (got {0:.4})")]
    WeightsDoNotSumToOne(f64),
    #[error("{0} weight must be a non-negative number")]
    NegativeWeight(&'static str),
    #[error("score {0} exceeds 100")]
    ScoreOutOfRange(u8),
    #[error("activity window must span at least one day")]
    EmptyActivityWindow,
    #[error("{0} tiers are not strictly ordered")]
    UnorderedTiers(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = ScoringConfig::default();
        config.validate().expect("defaults validate");
        assert!((config.weights.total() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn partial_json_keeps_remaining_defaults() {
        let config = ScoringConfig::from_json(r#"{ "roi": { "no_expense_score": 90 } }"#)
            .expect("partial override parses");
        assert_eq!(config.roi.no_expense_score, 90);
        assert_eq!(config.roi.unclassified_score, 85);
        assert_eq!(config.roi.tiers.len(), 5);
        assert_eq!(config.weights, MetricWeights::default());
    }

    #[test]
    fn rejects_weights_that_do_not_sum_to_one() {
        let err = ScoringConfig::from_json(r#"{ "weights": { "conversion": 0.5 } }"#)
            .expect_err("weights sum to 1.25");
        assert!(matches!(err, ScoringConfigError::WeightsDoNotSumToOne(total) if (total - 1.25).abs() < 1e-9));
    }

    #[test]
    fn rejects_unordered_velocity_tiers() {
        let mut config = ScoringConfig::default();
        config.velocity.tiers.swap(0, 1);
        assert!(matches!(
            config.validate(),
            Err(ScoringConfigError::UnorderedTiers("velocity"))
        ));
    }

    #[test]
    fn rejects_scores_above_one_hundred() {
        let mut config = ScoringConfig::default();
        config.conversion.in_progress_floor = 120;
        assert!(matches!(
            config.validate(),
            Err(ScoringConfigError::ScoreOutOfRange(120))
        ));
    }
}
