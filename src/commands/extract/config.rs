use std::path::Path;

use anyhow::{Result, ensure};
use serde::{Deserialize, Serialize};

use crate::util::read_json;

use super::wage_cascade::WageBounds;

/// Tunable scan windows and thresholds. Every field may be omitted from the
/// JSON file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(super) struct ExtractConfig {
    pub top_scan_lines: usize,
    pub footer_scan_lines: usize,
    pub table_scan_rows: usize,
    pub table_min_score: usize,
    pub wage_bounds: WageBounds,
    pub sentence_gap_chars: usize,
    pub top_employer_max_pages: usize,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            top_scan_lines: 60,
            footer_scan_lines: 12,
            table_scan_rows: 15,
            table_min_score: 3,
            wage_bounds: WageBounds::default(),
            sentence_gap_chars: 260,
            top_employer_max_pages: 25,
        }
    }
}

impl ExtractConfig {
    pub(super) fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => read_json::<ExtractConfig>(path)?,
            None => ExtractConfig::default(),
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        ensure!(
            self.wage_bounds.min < self.wage_bounds.max,
            "wage_bounds.min ({}) must be below wage_bounds.max ({})",
            self.wage_bounds.min,
            self.wage_bounds.max
        );
        ensure!(self.top_scan_lines > 0, "top_scan_lines must be positive");
        ensure!(self.table_scan_rows > 0, "table_scan_rows must be positive");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn partial_file_keeps_remaining_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("extract.json");
        fs::write(&path, r#"{"wage_bounds": {"min": 5.0, "max": 80.0}, "top_scan_lines": 40}"#)
            .expect("write config");

        let config = ExtractConfig::load(Some(&path)).expect("config loads");
        assert_eq!(config.top_scan_lines, 40);
        assert_eq!(config.wage_bounds.max, 80.0);
        assert_eq!(config.sentence_gap_chars, 260);
        assert_eq!(config.top_employer_max_pages, 25);
    }

    #[test]
    fn inverted_wage_bounds_are_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("extract.json");
        fs::write(&path, r#"{"wage_bounds": {"min": 50.0, "max": 10.0}}"#).expect("write config");
        assert!(ExtractConfig::load(Some(&path)).is_err());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("extract.json");
        fs::write(&path, r#"{"top_scan_line": 10}"#).expect("write config");
        assert!(ExtractConfig::load(Some(&path)).is_err());
    }
}
