use std::path::Path;

use anyhow::{Context, Result};

use crate::cli::ReportKind;
use crate::util::ensure_parent_directory;

use super::lexicon::percent_points;
use super::records::{MetricValue, RecordStore};
use super::taxonomy::{MetricCategory, categories};
use super::units::Unit;

/// Rows of a units × years table, in (year, unit) order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct OutputGrid {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Units that head the rows of a kind's output.
fn units_for(kind: ReportKind) -> &'static [Unit] {
    match kind {
        ReportKind::TopEmployers => &[Unit::UniversityWide],
        ReportKind::Outcomes | ReportKind::EmploymentSearch | ReportKind::InternshipWage => &Unit::ALL,
    }
}

fn header_for(kind: ReportKind) -> Vec<String> {
    let mut header = vec!["Unit".to_string(), "Year".to_string()];
    match kind {
        ReportKind::Outcomes => {
            for category in categories(kind) {
                match category {
                    MetricCategory::Total | MetricCategory::NotSeeking => {
                        header.push(format!("{} N", category.label()));
                    }
                    _ => {
                        header.push(format!("{} N", category.label()));
                        header.push(format!("{} %", category.label()));
                    }
                }
            }
            header.push("Placement Rate %".to_string());
        }
        ReportKind::EmploymentSearch => {
            header.extend(
                categories(kind)
                    .iter()
                    .map(|category| format!("{} %", category.label())),
            );
        }
        ReportKind::InternshipWage => {
            let label = MetricCategory::InternshipWage.label();
            header.push(format!("{label} N"));
            header.push(format!("{label} Average"));
            header.push(format!("{label} Median"));
        }
        ReportKind::TopEmployers => header.push(MetricCategory::TopEmployer.label().to_string()),
    }
    header
}

impl OutputGrid {
    pub(super) fn assemble(kind: ReportKind, store: &RecordStore) -> Self {
        let units = units_for(kind);
        let years = store.years();
        let mut rows = Vec::with_capacity(units.len() * years.len());

        for year in &years {
            for unit in units {
                let mut row = vec![unit.name().to_string(), year.to_string()];
                let value = |category: MetricCategory| {
                    store
                        .get(*unit, *year, category)
                        .map(|record| &record.value)
                };

                match kind {
                    ReportKind::Outcomes => {
                        for category in categories(kind) {
                            let (count, percent) = outcome_cells(value(*category));
                            row.push(count);
                            if !matches!(
                                category,
                                MetricCategory::Total | MetricCategory::NotSeeking
                            ) {
                                row.push(percent);
                            }
                        }
                        row.push(placement_rate(
                            value(MetricCategory::Unplaced),
                            value(MetricCategory::Unresolved),
                        ));
                    }
                    ReportKind::EmploymentSearch => {
                        for category in categories(kind) {
                            row.push(match value(*category) {
                                Some(MetricValue::Percent(percent)) => percent.clone(),
                                _ => String::new(),
                            });
                        }
                    }
                    ReportKind::InternshipWage => match value(MetricCategory::InternshipWage) {
                        Some(MetricValue::Wage(stats)) => {
                            row.push(stats.n.to_string());
                            row.push(stats.average.map(format_wage).unwrap_or_default());
                            row.push(stats.median.map(format_wage).unwrap_or_default());
                        }
                        _ => row.extend([String::new(), String::new(), String::new()]),
                    },
                    ReportKind::TopEmployers => row.push(match value(MetricCategory::TopEmployer) {
                        Some(MetricValue::Text(name)) => name.clone(),
                        _ => String::new(),
                    }),
                }

                rows.push(row);
            }
        }

        Self {
            header: header_for(kind),
            rows,
        }
    }

    pub(super) fn write_csv(&self, path: &Path) -> Result<()> {
        ensure_parent_directory(path)?;
        let mut writer = csv::Writer::from_path(path)
            .with_context(|| format!("failed to create csv file: {}", path.display()))?;
        writer
            .write_record(&self.header)
            .with_context(|| format!("failed to write csv header: {}", path.display()))?;
        for row in &self.rows {
            writer
                .write_record(row)
                .with_context(|| format!("failed to write csv row: {}", path.display()))?;
        }
        writer
            .flush()
            .with_context(|| format!("failed to flush csv file: {}", path.display()))?;
        Ok(())
    }
}

fn outcome_cells(value: Option<&MetricValue>) -> (String, String) {
    match value {
        Some(MetricValue::Outcome { count, percent }) => (
            count.map(|count| count.to_string()).unwrap_or_default(),
            percent.clone(),
        ),
        _ => (String::new(), String::new()),
    }
}

fn outcome_points(value: Option<&MetricValue>) -> Option<f64> {
    match value {
        Some(MetricValue::Outcome { percent, .. }) => percent_points(percent),
        _ => None,
    }
}

fn placement_rate(unplaced: Option<&MetricValue>, unresolved: Option<&MetricValue>) -> String {
    match (outcome_points(unplaced), outcome_points(unresolved)) {
        (Some(unplaced), Some(unresolved)) => format!("{:.1}%", 100.0 - unplaced - unresolved),
        _ => String::new(),
    }
}

/// Two decimals at most, trailing zeros trimmed down to one decimal.
fn format_wage(value: f64) -> String {
    let fixed = format!("{value:.2}");
    let trimmed = fixed.trim_end_matches('0');
    if trimmed.ends_with('.') {
        format!("{trimmed}0")
    } else {
        trimmed.to_string()
    }
}
