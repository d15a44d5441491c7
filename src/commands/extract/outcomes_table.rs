use anyhow::{Context, Result};
use regex::{Regex, RegexBuilder};

use super::document::Grid;
use super::lexicon::{LabelFilter, ValuePatterns, collapse_whitespace};
use super::table_scorer::read_row;

/// One outcome line read from the selected table or the page text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct OutcomeRow {
    pub outcome: String,
    pub count: String,
    pub percent: String,
}

pub(super) struct OutcomesTableReader {
    title_phrases: Vec<Regex>,
    cohort_suffix: Regex,
    total_line: Regex,
    not_seeking_line: Regex,
}

impl OutcomesTableReader {
    pub(super) fn new() -> Result<Self> {
        let title_phrases = [
            "reported outcomes of graduates",
            "reported outcomes of",
            "graduate outcomes",
        ]
        .iter()
        .map(|phrase| {
            RegexBuilder::new(&regex::escape(phrase))
                .case_insensitive(true)
                .build()
                .with_context(|| format!("failed to compile title phrase regex: {phrase}"))
        })
        .collect::<Result<Vec<Regex>>>()?;

        Ok(Self {
            title_phrases,
            cohort_suffix: Regex::new(r"(?i)\b20\d{2}\s+graduates\b")
                .context("failed to compile cohort suffix regex")?,
            total_line: Regex::new(r"(?i)\bTOTAL\b\s+([\d,]+)(?:\s+(\d+(?:\.\d+)?%))?")
                .context("failed to compile total line regex")?,
            not_seeking_line: Regex::new(r"(?i)\bNot\s+Seeking\b\s+([\d,]+)\b")
                .context("failed to compile not seeking regex")?,
        })
    }

    /// Table headings bleed into the first label cell in some years.
    fn strip_title_noise(&self, label: &str) -> String {
        let mut cleaned = label.to_string();
        for phrase in &self.title_phrases {
            if phrase.is_match(&cleaned) {
                cleaned = phrase.replace_all(&cleaned, "").trim().to_string();
            }
        }
        let cleaned = self.cohort_suffix.replace_all(&cleaned, "");
        collapse_whitespace(&cleaned)
    }

    pub(super) fn read(
        &self,
        values: &ValuePatterns,
        labels: &LabelFilter,
        grid: &Grid,
    ) -> Vec<OutcomeRow> {
        let mut rows = Vec::<OutcomeRow>::new();
        let mut pending_label = String::new();

        for row in grid {
            if row.is_empty() {
                continue;
            }

            let cells = read_row(values, labels, row);
            let mut label = self.strip_title_noise(&cells.label);
            let count = cells.count;
            let percent = cells.percent;

            // A label with no figures continues the row above it.
            if !label.is_empty() && count.is_empty() && percent.is_empty() {
                match rows.last_mut() {
                    Some(previous) => {
                        previous.outcome = format!("{} {}", previous.outcome, label)
                            .trim()
                            .to_string();
                    }
                    None => pending_label = join_fragments(&pending_label, &label),
                }
                continue;
            }

            if !pending_label.is_empty() {
                label = join_fragments(&pending_label, &label);
                pending_label.clear();
            }

            if label.is_empty() || label.eq_ignore_ascii_case("outcome") {
                continue;
            }

            let lower = label.trim().to_lowercase();
            let count_only = lower == "total" || lower.starts_with("not seeking");

            if !count.is_empty() && (!percent.is_empty() || count_only) {
                rows.push(OutcomeRow {
                    outcome: label,
                    count,
                    percent,
                });
            } else if count.is_empty() {
                pending_label = join_fragments(&pending_label, &label);
            }
        }

        rows
    }

    /// TOTAL and Not Seeking often sit outside the table grid.
    fn totals_from_text(&self, page_text: &str) -> Vec<OutcomeRow> {
        let mut found = Vec::new();

        if let Some(captures) = self.total_line.captures(page_text)
            && let Some(count) = captures.get(1)
        {
            found.push(OutcomeRow {
                outcome: "TOTAL".to_string(),
                count: count.as_str().to_string(),
                percent: captures
                    .get(2)
                    .map(|m| m.as_str().to_string())
                    .unwrap_or_default(),
            });
        }

        if let Some(captures) = self.not_seeking_line.captures(page_text)
            && let Some(count) = captures.get(1)
        {
            found.push(OutcomeRow {
                outcome: "Not Seeking".to_string(),
                count: count.as_str().to_string(),
                percent: String::new(),
            });
        }

        found
    }

    /// Table rows plus any TOTAL / Not Seeking line the table did not carry.
    pub(super) fn read_page(
        &self,
        values: &ValuePatterns,
        labels: &LabelFilter,
        grid: &Grid,
        page_text: &str,
    ) -> Vec<OutcomeRow> {
        let mut rows = self.read(values, labels, grid);
        let existing = rows
            .iter()
            .map(|row| row.outcome.to_lowercase())
            .collect::<Vec<String>>();
        for extra in self.totals_from_text(page_text) {
            if !existing.contains(&extra.outcome.to_lowercase()) {
                rows.push(extra);
            }
        }
        rows
    }
}

fn join_fragments(head: &str, tail: &str) -> String {
    format!("{head} {tail}").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::extract::table_scorer::outcomes_label_filter;

    fn grid(rows: &[&[&str]]) -> Grid {
        rows.iter()
            .map(|row| row.iter().map(|cell| cell.to_string()).collect())
            .collect()
    }

    #[test]
    fn wrapped_label_fragments_join_the_previous_row() {
        let values = ValuePatterns::new().expect("patterns");
        let reader = OutcomesTableReader::new().expect("reader");
        let table = grid(&[
            &["Outcome", "#", "%"],
            &["Volunteering or", "", ""],
            &["Service Program", "14", "1%"],
            &["Employed FT", "500", "50%"],
            &["(full-time)", "", ""],
            &["Total", "1,000", ""],
        ]);

        let rows = reader.read(&values, &outcomes_label_filter(), &table);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].outcome, "Volunteering or Service Program");
        assert_eq!(rows[1].outcome, "Employed FT (full-time)");
        assert_eq!(rows[2].outcome, "Total");
        assert_eq!(rows[2].count, "1,000");
        assert!(rows[2].percent.is_empty());
    }

    #[test]
    fn heading_phrases_are_stripped_from_labels() {
        let values = ValuePatterns::new().expect("patterns");
        let reader = OutcomesTableReader::new().expect("reader");
        let table = grid(&[&["Reported Outcomes of 2019 Graduates Employed PT", "40", "4%"]]);

        let rows = reader.read(&values, &outcomes_label_filter(), &table);
        assert!(rows.is_empty());

        assert_eq!(
            reader.strip_title_noise("Reported Outcomes of 2019 Graduates Employed PT"),
            "Employed PT"
        );
    }

    #[test]
    fn totals_from_text_fill_missing_rows_only() {
        let values = ValuePatterns::new().expect("patterns");
        let reader = OutcomesTableReader::new().expect("reader");
        let table = grid(&[
            &["Employed FT", "500", "50%"],
            &["Total", "1,000", ""],
        ]);
        let text = "TOTAL 1,000 100%\nNot Seeking 42\n";

        let rows = reader.read_page(&values, &outcomes_label_filter(), &table, text);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[2].outcome, "Not Seeking");
        assert_eq!(rows[2].count, "42");
    }
}
