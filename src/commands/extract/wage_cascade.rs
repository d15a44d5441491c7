//! Hourly internship wage statistics narrated in prose. Each report year words
//! the sentence differently, so an ordered list of patterns is tried and the
//! first one whose numbers pass the plausibility bounds wins.

use anyhow::{Context, Result};
use regex::{Captures, Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::ExtractError;
use super::lexicon::collapse_whitespace;
use super::records::{Quality, WageStats};

/// Exclusive bounds for a plausible hourly wage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub(super) struct WageBounds {
    pub min: f64,
    pub max: f64,
}

impl Default for WageBounds {
    fn default() -> Self {
        Self {
            min: 0.0,
            max: 100.0,
        }
    }
}

impl WageBounds {
    fn check(&self, value: f64) -> Result<f64, ExtractError> {
        if value > self.min && value < self.max {
            Ok(value)
        } else {
            Err(ExtractError::AmbiguousValue {
                value: value.to_string(),
                reason: format!("hourly wage outside ({}, {})", self.min, self.max),
            })
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(super) struct WageMatch {
    pub stats: WageStats,
    pub quality: Quality,
    pub pattern: &'static str,
}

#[derive(Debug, Clone, Copy)]
enum Shape {
    /// Named groups `n`, `avg`, `med`.
    CountAverageMedian,
    /// Named group `w`; one experience, so average and median coincide.
    SingleWage,
    /// Named group `t`; statistics unknown.
    CountOnly,
}

struct WagePattern {
    name: &'static str,
    regex: Regex,
    shape: Shape,
    quality: Quality,
}

pub(super) struct WageCascade {
    bounds: WageBounds,
    chart_artifacts: Vec<Regex>,
    statistics: Vec<WagePattern>,
    totals: Vec<WagePattern>,
}

fn build(pattern: &str, name: &str) -> Result<Regex> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .size_limit(1 << 24)
        .build()
        .with_context(|| format!("failed to compile wage pattern {name}"))
}

impl WageCascade {
    pub(super) fn new(bounds: WageBounds, sentence_gap_chars: usize) -> Result<Self> {
        // Free text between anchors, bounded and never past a sentence end.
        let gap = format!("[^.?!]{{0,{sentence_gap_chars}}}?");
        let lead = format!(
            r"\b(?:of|for)\s+(?:the\s+)?(?P<n>[\d,]+)\s+(?:internship\s+)?experiences\b{gap}\b(?:that\s+)?(?:paid|include(?:d)?|with)\b{gap}\bhourly\b{gap}\b(?:wage|rate)\b"
        );
        let average = r"(?:average|mean)\b[^.?!]*?\$?\s*(?P<avg>\d+(?:\.\d+)?)";
        let median = r"\bmedian\b[^.?!]*?\$?\s*(?P<med>\d+(?:\.\d+)?)";

        let statistics = vec![
            WagePattern {
                name: "average_then_median",
                regex: build(&format!("{lead}{gap}{average}{gap}{median}"), "average_then_median")?,
                shape: Shape::CountAverageMedian,
                quality: Quality::High,
            },
            WagePattern {
                name: "median_then_average",
                regex: build(&format!("{lead}{gap}{median}{gap}{average}"), "median_then_average")?,
                shape: Shape::CountAverageMedian,
                quality: Quality::High,
            },
            WagePattern {
                name: "single_experience",
                regex: build(
                    r"\b(?:one|1)\s+experience\b.*?\bpaid\b.*?\bhourly\b.*?\b(?:wage|rate)\b.*?\$?\s*(?P<w>\d+(?:\.\d+)?)\b.*?\bper\s+hour\b",
                    "single_experience",
                )?,
                shape: Shape::SingleWage,
                quality: Quality::High,
            },
        ];

        let totals = vec![
            WagePattern {
                name: "total_reported",
                regex: build(
                    r"\b(?:a\s+)?total\s+of\s+(?P<t>[\d,]+)\s+internship\s+experiences?\s+(?:were|was)\s+reported\b",
                    "total_reported",
                )?,
                shape: Shape::CountOnly,
                quality: Quality::Low,
            },
            WagePattern {
                name: "experience_count",
                regex: build(
                    r"\b(?:of|for)\s+(?:the\s+)?(?P<t>[\d,]+)\s+internship\s+experiences\b",
                    "experience_count",
                )?,
                shape: Shape::CountOnly,
                quality: Quality::Low,
            },
        ];

        let chart_artifacts = [
            r"internships?\s*-\s*compensation",
            r"\b(?:yes|no|other|paid|unpaid)\b\s*\d+(?:\.\d+)?\s*%?",
            r"\d+(?:\.\d+)?\s*%",
            r"\b(?:yes|no|other)\b",
        ]
        .iter()
        .map(|pattern| build(pattern, "chart_artifact"))
        .collect::<Result<Vec<Regex>>>()?;

        Ok(Self {
            bounds,
            chart_artifacts,
            statistics,
            totals,
        })
    }

    /// Pie-chart legends ("Paid 62%", "Yes", "No") sit in the same text
    /// layer and would otherwise be read as wages.
    fn strip_chart_artifacts(&self, page_text: &str) -> String {
        let mut cleaned = collapse_whitespace(&page_text.replace('\u{00a0}', " "));
        for artifact in &self.chart_artifacts {
            cleaned = artifact.replace_all(&cleaned, " ").into_owned();
        }
        collapse_whitespace(&cleaned)
    }

    /// First accepted match, or `None` when the page narrates no wages.
    pub(super) fn extract(&self, page_text: &str) -> Option<WageMatch> {
        let cleaned = self.strip_chart_artifacts(page_text);
        let lower = cleaned.to_lowercase();

        let narrates_statistics = lower.contains("hourly")
            && (lower.contains("wage") || lower.contains("rate"))
            && lower.contains("median")
            && (lower.contains("average") || lower.contains("mean"));
        if narrates_statistics
            && let Some(found) = self.first_accepted(&self.statistics, &cleaned)
        {
            return Some(found);
        }

        if lower.contains("internship") {
            return self.first_accepted(&self.totals, &cleaned);
        }

        None
    }

    fn first_accepted(&self, patterns: &[WagePattern], text: &str) -> Option<WageMatch> {
        for pattern in patterns {
            let Some(captures) = pattern.regex.captures(text) else {
                continue;
            };
            match self.accept(pattern, &captures) {
                Ok(Some(stats)) => {
                    return Some(WageMatch {
                        stats,
                        quality: pattern.quality,
                        pattern: pattern.name,
                    });
                }
                Ok(None) => {}
                Err(rejected) => {
                    debug!(pattern = pattern.name, reason = %rejected, "wage pattern rejected");
                }
            }
        }
        None
    }

    fn accept(
        &self,
        pattern: &WagePattern,
        captures: &Captures<'_>,
    ) -> Result<Option<WageStats>, ExtractError> {
        match pattern.shape {
            Shape::CountAverageMedian => {
                let (Some(n), Some(average), Some(median)) = (
                    group_int(captures, "n"),
                    group_float(captures, "avg"),
                    group_float(captures, "med"),
                ) else {
                    return Ok(None);
                };
                Ok(Some(WageStats {
                    n,
                    average: Some(self.bounds.check(average)?),
                    median: Some(self.bounds.check(median)?),
                }))
            }
            Shape::SingleWage => {
                let Some(wage) = group_float(captures, "w") else {
                    return Ok(None);
                };
                let wage = self.bounds.check(wage)?;
                Ok(Some(WageStats {
                    n: 1,
                    average: Some(wage),
                    median: Some(wage),
                }))
            }
            Shape::CountOnly => Ok(group_int(captures, "t")
                .filter(|total| *total > 0)
                .map(|total| WageStats {
                    n: total,
                    average: None,
                    median: None,
                })),
        }
    }
}

fn group_int(captures: &Captures<'_>, name: &str) -> Option<u64> {
    let digits = captures.name(name)?.as_str().replace(',', "");
    digits.trim().parse().ok()
}

fn group_float(captures: &Captures<'_>, name: &str) -> Option<f64> {
    let digits = captures
        .name(name)?
        .as_str()
        .replace(['$', ','], "");
    digits.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL_SENTENCE: &str = "Of the 120 internship experiences that included an hourly wage, \
         the average was $18.50 and the median was $17.00.";

    fn cascade() -> WageCascade {
        WageCascade::new(WageBounds::default(), 260).expect("cascade compiles")
    }

    #[test]
    fn full_sentence_yields_high_quality_statistics() {
        let found = cascade().extract(FULL_SENTENCE).expect("match");
        assert_eq!(found.stats.n, 120);
        assert_eq!(found.stats.average, Some(18.5));
        assert_eq!(found.stats.median, Some(17.0));
        assert_eq!(found.quality, Quality::High);
        assert_eq!(found.pattern, "average_then_median");
    }

    #[test]
    fn median_before_average_is_accepted() {
        let text = "For the 45 experiences with an hourly rate, the median was $15 \
                    while the mean was $16.25.";
        let found = cascade().extract(text).expect("match");
        assert_eq!(found.stats.n, 45);
        assert_eq!(found.stats.median, Some(15.0));
        assert_eq!(found.stats.average, Some(16.25));
        assert_eq!(found.pattern, "median_then_average");
    }

    #[test]
    fn out_of_bounds_average_falls_through_to_count_only() {
        let text = FULL_SENTENCE.replace("$18.50", "$250");
        let found = cascade().extract(&text).expect("fallback match");
        assert_eq!(found.stats.n, 120);
        assert_eq!(found.stats.average, None);
        assert_eq!(found.stats.median, None);
        assert_eq!(found.quality, Quality::Low);
    }

    #[test]
    fn total_reported_sentence_is_preferred_fallback() {
        let text = "A total of 310 internship experiences were reported. \
                    Internships - Compensation Paid 62% Unpaid 38%";
        let found = cascade().extract(text).expect("fallback match");
        assert_eq!(found.stats.n, 310);
        assert_eq!(found.pattern, "total_reported");
        assert_eq!(found.quality, Quality::Low);
    }

    #[test]
    fn single_experience_sets_average_and_median() {
        let text = "Only one experience was paid an hourly wage of $14.00 per hour, \
                    so no median or average is shown.";
        let found = cascade().extract(text).expect("match");
        assert_eq!(found.stats.n, 1);
        assert_eq!(found.stats.average, Some(14.0));
        assert_eq!(found.stats.median, Some(14.0));
    }

    #[test]
    fn configured_bounds_apply() {
        let strict = WageCascade::new(WageBounds { min: 0.0, max: 18.0 }, 260).expect("cascade");
        let found = strict.extract(FULL_SENTENCE).expect("fallback");
        assert_eq!(found.quality, Quality::Low);
    }

    #[test]
    fn chart_legends_are_removed_before_matching() {
        let cleaned = cascade().strip_chart_artifacts("Yes 55%\nNo 45%  Paid 12 Other");
        assert_eq!(cleaned, "");
    }

    #[test]
    fn unrelated_prose_is_not_a_match() {
        assert!(cascade().extract("Graduates reported strong outcomes.").is_none());
    }
}
