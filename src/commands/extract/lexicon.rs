//! Cell and line predicates shared by the free-text parser and the table
//! scorer: what counts as a percent, a count, or a label.

use std::ops::Range;

use anyhow::{Context, Result};
use regex::Regex;

/// Rank given to `<1%` when comparing candidate percentages. Sits below an
/// explicit `0%` so any printed figure outranks the marker.
const LESS_THAN_ONE_RANK: f64 = -0.5;
/// Rank given to a missing or unparseable percentage.
const MISSING_RANK: f64 = -1.0;

pub(super) struct ValuePatterns {
    percent: Regex,
    bare_number: Regex,
    percent_anywhere: Regex,
    alpha_word: Regex,
}

/// One percent value found inside a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct InlinePercent {
    pub span: Range<usize>,
    pub value: String,
}

impl ValuePatterns {
    pub(super) fn new() -> Result<Self> {
        Ok(Self {
            percent: Regex::new(r"^<?\d+(?:\.\d+)?%$").context("failed to compile percent regex")?,
            bare_number: Regex::new(r"^<?\d+(?:\.\d+)?$")
                .context("failed to compile bare number regex")?,
            percent_anywhere: Regex::new(r"(<?\d+(?:\.\d+)?)\s*%")
                .context("failed to compile inline percent regex")?,
            alpha_word: Regex::new(r"[a-z]+").context("failed to compile word regex")?,
        })
    }

    pub(super) fn is_percent(&self, input: &str) -> bool {
        self.percent.is_match(&strip_spaces(&clean_cell(input)))
    }

    pub(super) fn is_bare_number(&self, input: &str) -> bool {
        self.bare_number.is_match(&strip_spaces(&clean_cell(input)))
    }

    pub(super) fn inline_percents(&self, line: &str) -> Vec<InlinePercent> {
        self.percent_anywhere
            .captures_iter(line)
            .filter_map(|captures| {
                let whole = captures.get(0)?;
                let number = captures.get(1)?;
                Some(InlinePercent {
                    span: whole.range(),
                    value: format!("{}%", strip_spaces(number.as_str())),
                })
            })
            .collect()
    }

    fn lowercase_words<'t>(&self, lower: &'t str) -> Vec<&'t str> {
        self.alpha_word.find_iter(lower).map(|m| m.as_str()).collect()
    }
}

/// Cells and lines come from the extractor with embedded newlines.
pub(super) fn clean_cell(input: &str) -> String {
    input.replace('\n', " ").trim().to_string()
}

pub(super) fn collapse_whitespace(input: &str) -> String {
    input.split_whitespace().collect::<Vec<&str>>().join(" ")
}

pub(super) fn strip_spaces(input: &str) -> String {
    input.chars().filter(|character| !character.is_whitespace()).collect()
}

pub(super) fn is_count(input: &str) -> bool {
    let digits = clean_cell(input).replace(',', "");
    !digits.is_empty() && digits.chars().all(|character| character.is_ascii_digit())
}

pub(super) fn parse_count(input: &str) -> Option<u64> {
    if !is_count(input) {
        return None;
    }
    clean_cell(input).replace(',', "").parse().ok()
}

/// Ordering key for competing percentages: `<1%` sits below every explicit
/// value and a missing value below that.
pub(super) fn percent_rank(input: &str) -> f64 {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return MISSING_RANK;
    }
    if trimmed.starts_with('<') && trimmed.ends_with('%') {
        return LESS_THAN_ONE_RANK;
    }
    trimmed
        .trim_end_matches('%')
        .trim()
        .parse::<f64>()
        .unwrap_or(MISSING_RANK)
}

/// Arithmetic value of a percentage; `<1%` is taken as its upper bound.
pub(super) fn percent_points(input: &str) -> Option<f64> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }
    if trimmed.starts_with('<') && trimmed.ends_with('%') {
        return Some(1.0);
    }
    trimmed.strip_suffix('%')?.trim().parse::<f64>().ok()
}

/// Label acceptance for one section or table family. Rejection rules run in
/// order and the first that fires names the reason.
#[derive(Debug, Clone, Default)]
pub(super) struct LabelFilter {
    pub header_words: &'static [&'static str],
    pub rejected_phrases: &'static [&'static str],
}

type LabelRule = fn(&LabelFilter, &ValuePatterns, &str) -> bool;

const LABEL_REJECTIONS: [(&str, LabelRule); 6] = [
    ("empty", rejects_empty),
    ("percent", rejects_percent),
    ("integer", rejects_integer),
    ("no_alphabetic_run", rejects_without_words),
    ("header_words_only", rejects_header_words),
    ("rejected_phrase", rejects_phrase),
];

impl LabelFilter {
    fn rejection(&self, values: &ValuePatterns, input: &str) -> Option<&'static str> {
        let cleaned = clean_cell(input);
        LABEL_REJECTIONS
            .iter()
            .find(|(_, rule)| rule(self, values, &cleaned))
            .map(|(name, _)| *name)
    }

    pub(super) fn is_valid(&self, values: &ValuePatterns, input: &str) -> bool {
        self.rejection(values, input).is_none()
    }
}

fn rejects_empty(_: &LabelFilter, _: &ValuePatterns, cleaned: &str) -> bool {
    cleaned.is_empty()
}

fn rejects_percent(_: &LabelFilter, values: &ValuePatterns, cleaned: &str) -> bool {
    values.is_percent(cleaned)
}

fn rejects_integer(_: &LabelFilter, _: &ValuePatterns, cleaned: &str) -> bool {
    is_count(cleaned)
}

fn rejects_without_words(_: &LabelFilter, values: &ValuePatterns, cleaned: &str) -> bool {
    values.lowercase_words(&cleaned.to_lowercase()).is_empty()
}

fn rejects_header_words(filter: &LabelFilter, values: &ValuePatterns, cleaned: &str) -> bool {
    let lower = cleaned.to_lowercase();
    values
        .lowercase_words(&lower)
        .iter()
        .all(|word| filter.header_words.contains(word))
}

fn rejects_phrase(filter: &LabelFilter, _: &ValuePatterns, cleaned: &str) -> bool {
    let lower = cleaned.to_lowercase();
    filter
        .rejected_phrases
        .iter()
        .any(|phrase| lower.contains(phrase))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patterns() -> ValuePatterns {
        ValuePatterns::new().expect("value patterns compile")
    }

    #[test]
    fn percent_detection_tolerates_spaces_and_less_than_marker() {
        let values = patterns();
        assert!(values.is_percent("42%"));
        assert!(values.is_percent(" 42 % "));
        assert!(values.is_percent("<1%"));
        assert!(values.is_percent("12.5%"));
        assert!(!values.is_percent("42"));
        assert!(!values.is_percent("Employed 42%"));
    }

    #[test]
    fn count_detection_strips_thousands_separators() {
        assert!(is_count("1,234"));
        assert!(is_count(" 87\n"));
        assert!(!is_count("12.5"));
        assert!(!is_count(""));
        assert_eq!(parse_count("5,678"), Some(5678));
    }

    #[test]
    fn less_than_one_ranks_between_missing_and_explicit_values() {
        assert_eq!(percent_rank("<1%"), LESS_THAN_ONE_RANK);
        assert_eq!(percent_rank(""), MISSING_RANK);
        assert_eq!(percent_rank("garbage"), MISSING_RANK);
        assert!(percent_rank("") < percent_rank("<1%"));
        assert!(percent_rank("<1%") < percent_rank("1%"));
        assert!(percent_rank("<1%") < percent_rank("0%"));
        assert_eq!(percent_rank("45%"), 45.0);
    }

    #[test]
    fn percent_points_uses_upper_bound_for_less_than_one() {
        assert_eq!(percent_points("<1%"), Some(1.0));
        assert_eq!(percent_points("12.5%"), Some(12.5));
        assert_eq!(percent_points(""), None);
        assert_eq!(percent_points("12"), None);
    }

    #[test]
    fn inline_percents_report_spans_and_normalized_values() {
        let values = patterns();
        let found = values.inline_percents("Career fair 42 % Handshake <1%");
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].value, "42%");
        assert_eq!(&"Career fair 42 % Handshake <1%"[..found[0].span.start], "Career fair ");
        assert_eq!(found[1].value, "<1%");
    }

    #[test]
    fn label_filter_names_the_first_failing_rule() {
        let values = patterns();
        let filter = LabelFilter {
            header_words: &["method", "used"],
            rejected_phrases: &["graduate outcomes"],
        };

        assert_eq!(filter.rejection(&values, ""), Some("empty"));
        assert_eq!(filter.rejection(&values, "35%"), Some("percent"));
        assert_eq!(filter.rejection(&values, "1,200"), Some("integer"));
        assert_eq!(filter.rejection(&values, "--"), Some("no_alphabetic_run"));
        assert_eq!(filter.rejection(&values, "Method Used"), Some("header_words_only"));
        assert_eq!(
            filter.rejection(&values, "2019 Graduate Outcomes"),
            Some("rejected_phrase")
        );
        assert!(filter.is_valid(&values, "Attended a career fair"));
        assert!(filter.is_valid(&values, "Method of contact"));
    }
}
