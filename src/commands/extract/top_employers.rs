use anyhow::{Context, Result};
use regex::Regex;

use super::lexicon::collapse_whitespace;

/// Cross-page state while walking the "Top Employers" block.
#[derive(Debug, Default)]
pub(super) struct EmployerScanState {
    collecting: bool,
    buffer: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum ScanStep {
    Continue,
    Found(String),
    /// The next section began before any employer line.
    Stopped,
}

pub(super) struct TopEmployerScanner {
    heading: Regex,
    stop: Regex,
    count_line: Regex,
    count_only: Regex,
    letters: Regex,
}

impl TopEmployerScanner {
    pub(super) fn new() -> Result<Self> {
        Ok(Self {
            heading: Regex::new(r"(?i)\bTOP\s+EMPLOYERS\b")
                .context("failed to compile top employers heading regex")?,
            stop: Regex::new(
                r"(?i)(GEOGRAPHIC\s+DISTRIBUTION|TOP\s+10|CONTINUING\s+EDUCATION|OUT\s+OF\s+CLASSROOM|STARTING\s+A\s+BUSINESS|SERVICE/VOLUNTEER|INTERNSHIP\s+PARTICIPATION)",
            )
            .context("failed to compile top employers stop regex")?,
            count_line: Regex::new(r"^(?P<name>.+?)\s+(?P<count>\d[\d,]*)\s*$")
                .context("failed to compile employer count line regex")?,
            count_only: Regex::new(r"^\d[\d,]*\s*$")
                .context("failed to compile count-only regex")?,
            letters: Regex::new(r"[A-Za-z]").context("failed to compile letters regex")?,
        })
    }

    pub(super) fn scan_page(&self, state: &mut EmployerScanState, page_text: &str) -> ScanStep {
        for raw in page_text.lines() {
            let line = collapse_whitespace(&raw.replace('\u{00a0}', " "));
            if line.is_empty() {
                continue;
            }
            match self.scan_line(state, &line) {
                ScanStep::Continue => {}
                done => return done,
            }
        }
        ScanStep::Continue
    }

    fn scan_line(&self, state: &mut EmployerScanState, line: &str) -> ScanStep {
        let upper = line.to_uppercase();

        if !state.collecting {
            // Internship and sample employer lists share the heading wording.
            if self.heading.is_match(line) && !upper.contains("INTERNSHIP") && !upper.contains("SAMPLE")
            {
                state.collecting = true;
                state.buffer.clear();
            }
            return ScanStep::Continue;
        }

        if self.stop.is_match(line) {
            return ScanStep::Stopped;
        }

        if self.heading.is_match(line) || upper.starts_with("REPORTED") {
            return ScanStep::Continue;
        }

        if let Some(captures) = self.count_line.captures(line)
            && let Some(name) = captures.name("name")
        {
            let name = collapse_whitespace(name.as_str());
            if state.buffer.is_empty() {
                return ScanStep::Found(name);
            }
            return ScanStep::Found(collapse_whitespace(&format!("{} {}", state.buffer, name)));
        }

        if !state.buffer.is_empty() && self.count_only.is_match(line) {
            return ScanStep::Found(state.buffer.clone());
        }

        if self.letters.is_match(line) {
            if state.buffer.is_empty() {
                state.buffer = line.to_string();
            } else {
                state.buffer = collapse_whitespace(&format!("{} {}", state.buffer, line));
            }
        }

        ScanStep::Continue
    }
}
