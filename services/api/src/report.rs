use crate::infra::{parse_date, InMemoryRecordStore, InMemoryScoreHistory};
use chrono::{Local, NaiveDate};
use clap::Args;
use elitekpi::config::{ConfigError, ScoringSettings};
use elitekpi::dashboard::{DashboardError, DashboardService};
use elitekpi::efficiency::{EfficiencyEngine, EfficiencyMetric, EfficiencyReport, ScoringConfig};
use elitekpi::error::AppError;
use elitekpi::records::{ActivityTrackerImporter, RecordBundle, UserId};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct ScoreArgs {
    /// JSON record bundle (one object or an array of per-user objects)
    #[arg(long)]
    pub(crate) records: PathBuf,
    /// Which user to score when the bundle holds more than one
    #[arg(long)]
    pub(crate) user: Option<String>,
    /// Daily activity tracker CSV replacing the bundle's activity actuals
    #[arg(long)]
    pub(crate) actuals_csv: Option<PathBuf>,
    /// Score as of this date (YYYY-MM-DD); defaults to today
    #[arg(long, value_parser = parse_date)]
    pub(crate) today: Option<NaiveDate>,
    /// Activity lookback in days
    #[arg(long)]
    pub(crate) days_back: Option<u32>,
    /// Scoring rules JSON; defaults to the built-in weights and thresholds
    #[arg(long)]
    pub(crate) scoring: Option<PathBuf>,
}

pub(crate) async fn run_score_report(args: ScoreArgs) -> Result<(), AppError> {
    let today = args.today.unwrap_or_else(|| Local::now().date_naive());
    let days_back = args
        .days_back
        .unwrap_or(ScoringSettings::DEFAULT_LOOKBACK_DAYS);

    let bundles = RecordBundle::from_path(&args.records)?;
    let mut bundle = select_bundle(bundles, args.user.as_deref())?;

    if let Some(csv) = &args.actuals_csv {
        bundle.records.activity_actuals = ActivityTrackerImporter::from_path(csv, &bundle.user_id)?;
    }

    let rules = match &args.scoring {
        Some(path) => ScoringConfig::from_path(path).map_err(|source| ConfigError::Scoring {
            path: path.clone(),
            source,
        })?,
        None => ScoringConfig::default(),
    };

    let user = bundle.user_id.clone();
    let records = InMemoryRecordStore::default();
    records
        .load(vec![bundle])
        .map_err(DashboardError::from)?;

    let dashboard = DashboardService::new(
        Arc::new(records),
        Arc::new(InMemoryScoreHistory::default()),
        EfficiencyEngine::new(rules),
        days_back,
    );
    let report = dashboard.preview_metrics(&user, today, None).await?;

    print!("{}", render_report(&user, today, days_back, &report));
    Ok(())
}

fn select_bundle(bundles: Vec<RecordBundle>, user: Option<&str>) -> Result<RecordBundle, AppError> {
    let invalid = |message: String| {
        AppError::Io(std::io::Error::new(std::io::ErrorKind::InvalidInput, message))
    };

    match user {
        Some(wanted) => {
            let wanted = UserId::from(wanted);
            bundles
                .into_iter()
                .find(|bundle| bundle.user_id == wanted)
                .ok_or_else(|| invalid(format!("no records for user {wanted}")))
        }
        None => {
            let count = bundles.len();
            let mut bundles = bundles.into_iter();
            match (bundles.next(), count) {
                (Some(bundle), 1) => Ok(bundle),
                (None, _) => Err(invalid("record bundle is empty".to_string())),
                _ => Err(invalid(format!(
                    "record bundle holds {count} users; pick one with --user"
                ))),
            }
        }
    }
}

fn render_report(
    user: &UserId,
    today: NaiveDate,
    days_back: u32,
    report: &EfficiencyReport,
) -> String {
    let mut lines = vec![
        format!("Efficiency score for {user} on {today} (activity lookback {days_back} days)"),
        format!(
            "Overall: {} ({})",
            report.overall_score,
            report.rating.label()
        ),
    ];
    lines.extend(EfficiencyMetric::ordered().into_iter().map(|metric| {
        format!(
            "  {:<22} {:>3}",
            metric.label(),
            report.breakdown.get(metric)
        )
    }));
    if report.overall_score > 0 {
        lines.push(format!(
            "Focus area: {}",
            report.breakdown.weakest().label()
        ));
    }

    let mut out = lines.join("\n");
    out.push('\n');
    out
}
