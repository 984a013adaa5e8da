//! The five sub-metric calculators. Each is a pure function over already-fetched
//! records returning a whole-number score in `0..=100`. Degenerate denominators map
//! to explicit fallback scores rather than zero, so agents with partial history are
//! not scored as failing.

use std::collections::BTreeSet;

use super::config::{ActivityRules, ConversionRules, RoiRules, TimeRules, VelocityRules};
use crate::records::{ActivityActual, Commission, Expense, Property, TimeEntry};

fn to_score(value: f64) -> u8 {
    if value.is_nan() {
        return 0;
    }
    value.round().clamp(0.0, 100.0) as u8
}

pub(crate) fn conversion_efficiency(properties: &[Property], rules: &ConversionRules) -> u8 {
    let total = properties.len();
    if total == 0 {
        return 0;
    }

    let closed = properties
        .iter()
        .filter(|property| property.status.is_closed())
        .count();
    if closed == 0 {
        return rules.in_progress_floor;
    }

    to_score((closed as f64 / total as f64 * 100.0).min(100.0))
}

pub(crate) fn activity_consistency(
    actuals: &[ActivityActual],
    days_back: u32,
    rules: &ActivityRules,
) -> u8 {
    let active_days = actuals
        .iter()
        .map(|actual| actual.date)
        .collect::<BTreeSet<_>>()
        .len();
    if active_days == 0 {
        return 0;
    }

    let window = days_back.min(rules.max_window_days).max(1);
    let ratio = (active_days as f64 / f64::from(window) * 100.0).min(100.0);
    to_score(ratio).max(rules.tracked_floor)
}

pub(crate) fn time_management(
    time_entries: &[TimeEntry],
    property_count: usize,
    rules: &TimeRules,
) -> u8 {
    let total_hours: f64 = time_entries
        .iter()
        .map(|entry| entry.hours)
        .filter(|hours| hours.is_finite())
        .sum();

    if property_count == 0 {
        return if total_hours > 0.0 {
            rules.logged_score
        } else {
            0
        };
    }

    let average = total_hours / property_count as f64;
    if rules.ideal.contains(average) {
        rules.ideal.score
    } else if rules.acceptable.contains(average) {
        rules.acceptable.score
    } else if average > 0.0 {
        rules.logged_score
    } else {
        rules.untracked_score
    }
}

pub(crate) fn deal_velocity(properties: &[Property], rules: &VelocityRules) -> u8 {
    if properties.is_empty() {
        return 0;
    }

    let durations: Vec<i64> = properties
        .iter()
        .filter_map(Property::days_to_close)
        .collect();
    if durations.is_empty() {
        return rules.pending_score;
    }

    let average_days =
        durations.iter().map(|days| (*days).max(0) as f64).sum::<f64>() / durations.len() as f64;

    rules
        .tiers
        .iter()
        .find(|tier| average_days <= tier.max_days)
        .map(|tier| tier.score)
        .unwrap_or(rules.slow_score)
}

pub(crate) fn roi_performance(
    commissions: &[Commission],
    expenses: &[Expense],
    rules: &RoiRules,
) -> u8 {
    let revenue: f64 = commissions.iter().map(|commission| commission.amount).sum();
    let spent: f64 = expenses.iter().map(|expense| expense.amount).sum();

    if revenue <= 0.0 || revenue.is_nan() {
        return 0;
    }
    if spent <= 0.0 {
        return rules.no_expense_score;
    }

    let ratio = revenue / spent;
    rules
        .tiers
        .iter()
        .find(|tier| ratio >= tier.min_ratio)
        .map(|tier| tier.score)
        .unwrap_or(rules.unclassified_score)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::efficiency::config::ScoringConfig;
    use crate::records::{PropertyStatus, UserId};
    use chrono::{Duration, NaiveDate};

    fn day(offset: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 1).expect("valid date") + Duration::days(offset)
    }

    fn listed(id: u64) -> Property {
        Property {
            id,
            status: PropertyStatus::Listed,
            listing_date: Some(day(0)),
            sold_date: None,
            listing_price: Some(350_000.0),
            sold_price: None,
            accepted_price: None,
        }
    }

    fn closed_after(id: u64, days: i64) -> Property {
        Property {
            id,
            status: PropertyStatus::Closed,
            listing_date: Some(day(0)),
            sold_date: Some(day(days)),
            listing_price: Some(350_000.0),
            sold_price: Some(345_000.0),
            accepted_price: Some(345_000.0),
        }
    }

    fn actual(offset: i64) -> ActivityActual {
        ActivityActual {
            id: offset as u64,
            user_id: UserId::from("agent"),
            date: day(offset),
            calls: 12,
            appointments: 1,
            cmas_completed: 0,
            hours_worked: 6.5,
            offers_written: 0,
            showings: 2,
        }
    }

    fn hours(total: f64) -> Vec<TimeEntry> {
        vec![TimeEntry {
            id: 1,
            property_id: None,
            hours: total,
            date: day(0),
        }]
    }

    fn commission(amount: f64) -> Commission {
        Commission {
            id: 1,
            property_id: None,
            amount,
            date_earned: day(3),
        }
    }

    fn expense(amount: f64) -> Expense {
        Expense {
            id: 1,
            property_id: None,
            category: "marketing".to_string(),
            amount,
            date: day(2),
        }
    }

    #[test]
    fn conversion_uses_closed_share_and_in_progress_floor() {
        let rules = ScoringConfig::default().conversion;
        assert_eq!(conversion_efficiency(&[], &rules), 0);
        assert_eq!(conversion_efficiency(&[listed(1), listed(2)], &rules), 65);

        let mixed = [closed_after(1, 20), listed(2), listed(3), listed(4)];
        assert_eq!(conversion_efficiency(&mixed, &rules), 25);

        let thirds = [closed_after(1, 20), listed(2), listed(3)];
        assert_eq!(conversion_efficiency(&thirds, &rules), 33);

        let all_closed = [closed_after(1, 20), closed_after(2, 40)];
        assert_eq!(conversion_efficiency(&all_closed, &rules), 100);
    }

    #[test]
    fn activity_floors_any_tracked_day_at_sixty() {
        let rules = ScoringConfig::default().activity;
        assert_eq!(activity_consistency(&[], 7, &rules), 0);
        assert_eq!(activity_consistency(&[actual(0)], 7, &rules), 60);
        assert_eq!(activity_consistency(&[actual(0)], 30, &rules), 60);

        let five: Vec<_> = (0..5).map(actual).collect();
        assert_eq!(activity_consistency(&five, 7, &rules), 71);

        let week: Vec<_> = (0..7).map(actual).collect();
        assert_eq!(activity_consistency(&week, 7, &rules), 100);
    }

    #[test]
    fn activity_window_is_capped_and_days_are_distinct() {
        let rules = ScoringConfig::default().activity;
        let month: Vec<_> = (0..24).map(actual).collect();
        assert_eq!(activity_consistency(&month, 90, &rules), 80);

        let duplicated = vec![actual(0), actual(0), actual(1)];
        assert_eq!(activity_consistency(&duplicated, 2, &rules), 100);
        assert_eq!(activity_consistency(&duplicated, 0, &rules), 100);
    }

    #[test]
    fn time_management_buckets_average_hours_per_property() {
        let rules = ScoringConfig::default().time;
        let four = 4;
        assert_eq!(time_management(&hours(40.0), four, &rules), 90);
        assert_eq!(time_management(&hours(32.0), four, &rules), 90);
        assert_eq!(time_management(&hours(80.0), four, &rules), 90);
        assert_eq!(time_management(&hours(24.0), four, &rules), 78);
        assert_eq!(time_management(&hours(100.0), four, &rules), 78);
        assert_eq!(time_management(&hours(4.0), four, &rules), 65);
        assert_eq!(time_management(&hours(200.0), four, &rules), 65);
        assert_eq!(time_management(&[], four, &rules), 60);
        assert_eq!(time_management(&[], 0, &rules), 0);
        assert_eq!(time_management(&hours(3.0), 0, &rules), 65);
    }

    #[test]
    fn velocity_buckets_average_days_on_market() {
        let rules = ScoringConfig::default().velocity;
        assert_eq!(deal_velocity(&[], &rules), 0);
        assert_eq!(deal_velocity(&[listed(1)], &rules), 65);
        assert_eq!(deal_velocity(&[closed_after(1, 20)], &rules), 95);
        assert_eq!(deal_velocity(&[closed_after(1, 30)], &rules), 95);
        assert_eq!(deal_velocity(&[closed_after(1, 45)], &rules), 85);
        assert_eq!(deal_velocity(&[closed_after(1, 50)], &rules), 75);
        assert_eq!(deal_velocity(&[closed_after(1, 90)], &rules), 65);
        assert_eq!(deal_velocity(&[closed_after(1, 120)], &rules), 50);

        let averaged = [closed_after(1, 20), closed_after(2, 60), listed(3)];
        assert_eq!(deal_velocity(&averaged, &rules), 85);
    }

    #[test]
    fn velocity_ignores_closings_without_listing_date() {
        let rules = ScoringConfig::default().velocity;
        let mut undated = closed_after(1, 10);
        undated.listing_date = None;
        assert_eq!(deal_velocity(&[undated.clone()], &rules), 65);
        assert_eq!(deal_velocity(&[undated, closed_after(2, 40)], &rules), 85);
    }

    #[test]
    fn roi_tiers_follow_revenue_to_expense_ratio() {
        let rules = ScoringConfig::default().roi;
        let cases = [
            (10_000.0, 2_000.0, 95),
            (9_000.0, 3_000.0, 88),
            (4_000.0, 2_000.0, 78),
            (3_000.0, 2_000.0, 68),
            (2_000.0, 2_000.0, 58),
            (1_000.0, 2_000.0, 85),
        ];
        for (revenue, spent, expected) in cases {
            assert_eq!(
                roi_performance(&[commission(revenue)], &[expense(spent)], &rules),
                expected,
                "revenue {revenue} / expenses {spent}"
            );
        }
    }

    #[test]
    fn roi_handles_missing_revenue_or_expenses() {
        let rules = ScoringConfig::default().roi;
        assert_eq!(roi_performance(&[commission(5_000.0)], &[], &rules), 92);
        assert_eq!(roi_performance(&[], &[expense(500.0)], &rules), 0);
        assert_eq!(roi_performance(&[], &[], &rules), 0);
        assert_eq!(roi_performance(&[commission(0.0)], &[expense(10.0)], &rules), 0);
    }
}
