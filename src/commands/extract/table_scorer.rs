use super::document::Grid;
use super::lexicon::{LabelFilter, ValuePatterns, clean_cell, is_count, strip_spaces};

/// Cells picked out of one table row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(super) struct RowCells {
    pub label: String,
    pub count: String,
    pub percent: String,
}

impl RowCells {
    fn is_complete(&self) -> bool {
        !self.label.is_empty() && !self.count.is_empty() && !self.percent.is_empty()
    }
}

pub(super) fn outcomes_label_filter() -> LabelFilter {
    LabelFilter {
        header_words: &["outcome"],
        rejected_phrases: &["reported outcomes", "graduate outcomes"],
    }
}

pub(super) fn read_row(values: &ValuePatterns, labels: &LabelFilter, row: &[String]) -> RowCells {
    RowCells {
        label: find_label(values, labels, row),
        count: find_count(row),
        percent: find_percent(values, row),
    }
}

/// Longest cell that passes the label filter.
fn find_label(values: &ValuePatterns, labels: &LabelFilter, row: &[String]) -> String {
    let mut best = String::new();
    for cell in row {
        let cleaned = clean_cell(cell);
        if cleaned.len() > best.len() && labels.is_valid(values, &cleaned) {
            best = cleaned;
        }
    }
    best
}

fn find_count(row: &[String]) -> String {
    row.iter()
        .find(|cell| is_count(cell))
        .map(|cell| clean_cell(cell))
        .unwrap_or_default()
}

/// Some layouts put the `%` sign in a cell of its own.
fn find_percent(values: &ValuePatterns, row: &[String]) -> String {
    for (index, cell) in row.iter().enumerate() {
        let compact = strip_spaces(&clean_cell(cell));
        if values.is_percent(&compact) {
            return compact;
        }
        if values.is_bare_number(&compact)
            && let Some(next) = row.get(index + 1)
            && clean_cell(next) == "%"
        {
            return format!("{compact}%");
        }
    }
    String::new()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct TableScore {
    pub score: usize,
    pub identity_confirmed: bool,
}

pub(super) struct TableScorer {
    labels: LabelFilter,
    identity_keywords: &'static [&'static str],
    scan_rows: usize,
    min_score: usize,
}

impl TableScorer {
    pub(super) fn outcomes(scan_rows: usize, min_score: usize) -> Self {
        Self {
            labels: outcomes_label_filter(),
            identity_keywords: &["employed", "unplaced", "unresolved"],
            scan_rows,
            min_score,
        }
    }

    pub(super) fn labels(&self) -> &LabelFilter {
        &self.labels
    }

    fn score(&self, values: &ValuePatterns, grid: &Grid) -> TableScore {
        let mut score = 0usize;
        let mut identity_confirmed = false;

        for row in grid.iter().take(self.scan_rows) {
            if row.is_empty() {
                continue;
            }
            let cells = read_row(values, &self.labels, row);
            let lower = cells.label.to_lowercase();
            if self
                .identity_keywords
                .iter()
                .any(|keyword| lower.contains(keyword))
            {
                identity_confirmed = true;
            }
            if cells.is_complete() {
                score += 1;
            }
        }

        TableScore {
            score,
            identity_confirmed,
        }
    }

    fn qualifies(&self, score: &TableScore) -> bool {
        score.score >= self.min_score && score.identity_confirmed
    }

    /// Highest-scoring qualifying grid; the earliest wins a tie.
    pub(super) fn select<'g>(&self, values: &ValuePatterns, tables: &'g [Grid]) -> Option<&'g Grid> {
        let mut best: Option<(usize, &'g Grid)> = None;
        for grid in tables {
            let score = self.score(values, grid);
            if !self.qualifies(&score) {
                continue;
            }
            if best.is_none_or(|(best_score, _)| score.score > best_score) {
                best = Some((score.score, grid));
            }
        }
        best.map(|(_, grid)| grid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(rows: &[&[&str]]) -> Grid {
        rows.iter()
            .map(|row| row.iter().map(|cell| cell.to_string()).collect())
            .collect()
    }

    fn outcomes_grid() -> Grid {
        grid(&[
            &["Outcome", "#", "%"],
            &["Employed FT", "1,204", "61%"],
            &["Employed PT", "88", "4%"],
            &["Continuing Education", "301", "15%"],
            &["Unplaced", "120", "6%"],
        ])
    }

    #[test]
    fn read_row_joins_split_percent_sign() {
        let values = ValuePatterns::new().expect("patterns");
        let row = vec!["Military".to_string(), "12".to_string(), "<1".to_string(), "%".to_string()];
        let cells = read_row(&values, &outcomes_label_filter(), &row);
        assert_eq!(cells.label, "Military");
        assert_eq!(cells.count, "12");
        assert_eq!(cells.percent, "<1%");
    }

    #[test]
    fn header_row_yields_no_label() {
        let values = ValuePatterns::new().expect("patterns");
        let row = vec!["Outcome".to_string(), "#".to_string(), "%".to_string()];
        let cells = read_row(&values, &outcomes_label_filter(), &row);
        assert!(cells.label.is_empty());
    }

    #[test]
    fn demographic_table_fails_the_keyword_gate() {
        let values = ValuePatterns::new().expect("patterns");
        let scorer = TableScorer::outcomes(15, 3);
        let demographics = grid(&[
            &["Female", "1,500", "52%"],
            &["Male", "1,350", "47%"],
            &["Not reported", "20", "1%"],
        ]);

        let score = scorer.score(&values, &demographics);
        assert_eq!(score.score, 3);
        assert!(!score.identity_confirmed);
        assert!(scorer.select(&values, &[demographics]).is_none());
    }

    #[test]
    fn select_prefers_highest_score_and_keeps_first_on_tie() {
        let values = ValuePatterns::new().expect("patterns");
        let scorer = TableScorer::outcomes(15, 3);
        let summary = grid(&[
            &["Knowledge rate", "2,000", "70%"],
            &["Employed", "900", "45%"],
        ]);
        let first = outcomes_grid();
        let mut second = outcomes_grid();
        second[0][0] = "Second".to_string();

        let tables = vec![summary, first, second];
        let selected = scorer.select(&values, &tables).expect("a table qualifies");
        assert_eq!(selected[0][0], "Outcome");
        assert_eq!(scorer.score(&values, selected).score, 4);
    }

    #[test]
    fn scan_is_limited_to_configured_rows() {
        let values = ValuePatterns::new().expect("patterns");
        let scorer = TableScorer::outcomes(3, 3);
        let score = scorer.score(&values, &outcomes_grid());
        assert_eq!(score.score, 2);
        assert!(!scorer.qualifies(&score));
    }
}
