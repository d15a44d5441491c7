use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use super::lexicon::percent_rank;
use super::taxonomy::MetricCategory;
use super::units::Unit;

/// Confidence attached to an extracted value; compared before any number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(super) enum Quality {
    Low,
    High,
}

impl Quality {
    pub(super) fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::High => "high",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(super) struct WageStats {
    pub n: u64,
    pub average: Option<f64>,
    pub median: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub(super) enum MetricValue {
    Percent(String),
    /// Percent may be empty for TOTAL and Not Seeking.
    Outcome { count: Option<u64>, percent: String },
    Wage(WageStats),
    Text(String),
}

impl MetricValue {
    /// Numeric ordering key used when two candidates compete for a cell.
    fn rank(&self) -> Option<f64> {
        match self {
            Self::Percent(percent) => Some(percent_rank(percent)),
            Self::Outcome { count, percent } => {
                if percent.trim().is_empty() {
                    count.map(|count| count as f64)
                } else {
                    Some(percent_rank(percent))
                }
            }
            Self::Wage(_) | Self::Text(_) => None,
        }
    }

    fn count_rank(&self) -> Option<f64> {
        match self {
            Self::Outcome {
                count: Some(count), ..
            } => Some(*count as f64),
            _ => None,
        }
    }

    pub(super) fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Percent(percent) => serde_json::json!({ "percent": percent }),
            Self::Outcome { count, percent } => {
                serde_json::json!({ "count": count, "percent": percent })
            }
            Self::Wage(stats) => serde_json::json!({
                "n": stats.n,
                "average": stats.average,
                "median": stats.median,
            }),
            Self::Text(text) => serde_json::json!({ "text": text }),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(super) struct Provenance {
    pub document: String,
    /// One-based.
    pub page: usize,
    pub quality: Quality,
}

/// A label/value pair as read from a page, before taxonomy mapping.
#[derive(Debug, Clone, PartialEq)]
pub(super) struct RawField {
    pub label: String,
    pub value: MetricValue,
    pub provenance: Provenance,
}

#[derive(Debug, Clone, PartialEq)]
pub(super) struct CanonicalRecord {
    pub unit: Unit,
    pub year: i32,
    pub category: MetricCategory,
    pub raw_label: String,
    pub value: MetricValue,
    pub provenance: Provenance,
}

impl CanonicalRecord {
    fn rank(&self) -> Option<f64> {
        if self.category.ranks_by_count() {
            self.value.count_rank()
        } else {
            self.value.rank()
        }
    }

    /// Ordering of a challenger against the incumbent: quality, then numeric
    /// rank, then the earlier page. `Greater` means the challenger wins.
    fn contest(&self, incumbent: &CanonicalRecord) -> Ordering {
        let by_quality = self.provenance.quality.cmp(&incumbent.provenance.quality);
        if by_quality != Ordering::Equal {
            return by_quality;
        }

        if let (Some(challenger), Some(held)) = (self.rank(), incumbent.rank()) {
            match challenger.partial_cmp(&held) {
                Some(Ordering::Equal) | None => {}
                Some(ordering) => return ordering,
            }
        }

        if self.provenance.document == incumbent.provenance.document {
            return incumbent.provenance.page.cmp(&self.provenance.page);
        }
        Ordering::Equal
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Promotion {
    Inserted,
    Replaced,
    Kept,
}

/// Accumulates at most one record per (unit, year, category) across a run.
#[derive(Debug, Default)]
pub(super) struct RecordStore {
    records: BTreeMap<(Unit, i32, MetricCategory), CanonicalRecord>,
    years: BTreeSet<i32>,
}

impl RecordStore {
    /// Years come from every document with a resolvable year, even those
    /// that yielded no records.
    pub(super) fn observe_year(&mut self, year: i32) {
        self.years.insert(year);
    }

    pub(super) fn years(&self) -> Vec<i32> {
        self.years.iter().copied().collect()
    }

    pub(super) fn promote(&mut self, record: CanonicalRecord) -> Promotion {
        self.years.insert(record.year);
        let key = (record.unit, record.year, record.category);
        match self.records.get(&key) {
            None => {
                self.records.insert(key, record);
                Promotion::Inserted
            }
            Some(incumbent) if record.contest(incumbent) == Ordering::Greater => {
                self.records.insert(key, record);
                Promotion::Replaced
            }
            Some(_) => Promotion::Kept,
        }
    }

    pub(super) fn get(
        &self,
        unit: Unit,
        year: i32,
        category: MetricCategory,
    ) -> Option<&CanonicalRecord> {
        self.records.get(&(unit, year, category))
    }

    pub(super) fn records(&self) -> impl Iterator<Item = &CanonicalRecord> {
        self.records.values()
    }

    pub(super) fn len(&self) -> usize {
        self.records.len()
    }
}
