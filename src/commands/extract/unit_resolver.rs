use anyhow::{Context, Result};
use regex::Regex;

use super::units::{Unit, UnitCatalog};

/// Which fallback steps a report kind enables beyond the top-of-page scan.
#[derive(Debug, Clone, Copy, Default)]
pub(super) struct ResolverPolicy {
    pub footer: bool,
    pub anywhere: bool,
    pub lookahead: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum UnitSource {
    TopOfPage,
    Footer,
    Anywhere,
    Lookahead,
    Carried,
    Implicit,
}

impl UnitSource {
    pub(super) fn as_str(self) -> &'static str {
        match self {
            Self::TopOfPage => "top_of_page",
            Self::Footer => "footer",
            Self::Anywhere => "anywhere",
            Self::Lookahead => "lookahead",
            Self::Carried => "carried",
            Self::Implicit => "implicit",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct Resolution {
    pub unit: Unit,
    pub source: UnitSource,
}

pub(super) struct UnitResolver<'a> {
    catalog: &'a UnitCatalog,
    policy: ResolverPolicy,
    top_scan_lines: usize,
    footer_scan_lines: usize,
    footer_code: Regex,
    footer_page_number: Regex,
    overall: Regex,
}

impl<'a> UnitResolver<'a> {
    pub(super) fn new(
        catalog: &'a UnitCatalog,
        policy: ResolverPolicy,
        top_scan_lines: usize,
        footer_scan_lines: usize,
    ) -> Result<Self> {
        Ok(Self {
            catalog,
            policy,
            top_scan_lines,
            footer_scan_lines,
            footer_code: Regex::new(r"\b([A-Z]{3,8})\s+\d{1,3}\s*$")
                .context("failed to compile footer code regex")?,
            footer_page_number: Regex::new(r"^(?P<txt>.+?)\s+(?P<num>\d{1,3})\s*$")
                .context("failed to compile footer page number regex")?,
            overall: Regex::new(r"(?i)\boverall\b").context("failed to compile overall regex")?,
        })
    }

    /// Full resolution for one page. `lookahead_text` is the next page of the
    /// same document and is only consulted when the caller knows this page
    /// carries data.
    pub(super) fn resolve(
        &self,
        page_text: &str,
        prior: Option<Unit>,
        lookahead_text: Option<&str>,
    ) -> Option<Resolution> {
        if let Some(resolution) = self.declared_unit(page_text) {
            return Some(resolution);
        }

        if self.policy.lookahead
            && let Some(next_page) = lookahead_text
            && let Some(unit) = self.page_starts_with_unit(next_page)
        {
            return Some(Resolution {
                unit,
                source: UnitSource::Lookahead,
            });
        }

        prior.map(|unit| Resolution {
            unit,
            source: UnitSource::Carried,
        })
    }

    /// Unit the page itself declares, without carried state or lookahead.
    pub(super) fn declared_unit(&self, page_text: &str) -> Option<Resolution> {
        let lines = nonempty_lines(page_text);

        if let Some(unit) = self.scan_top(&lines) {
            return Some(Resolution {
                unit,
                source: UnitSource::TopOfPage,
            });
        }
        if self.policy.footer
            && let Some(unit) = self.scan_footer(&lines)
        {
            return Some(Resolution {
                unit,
                source: UnitSource::Footer,
            });
        }
        if self.policy.anywhere
            && let Some(unit) = self.catalog.longest_name_in(page_text)
        {
            return Some(Resolution {
                unit,
                source: UnitSource::Anywhere,
            });
        }

        None
    }

    fn scan_top(&self, lines: &[&str]) -> Option<Unit> {
        let window = &lines[..lines.len().min(self.top_scan_lines)];

        for index in 0..window.len() {
            let first = window[index];
            if let Some(unit) = self.test_candidate(first) {
                return Some(unit);
            }

            let head = first.trim_end_matches(',');
            if let Some(second) = window.get(index + 1) {
                if let Some(unit) = self.test_candidate(&format!("{head} {second}")) {
                    return Some(unit);
                }
                if let Some(third) = window.get(index + 2)
                    && let Some(unit) = self.test_candidate(&format!("{head} {second} {third}"))
                {
                    return Some(unit);
                }
            }
        }

        None
    }

    fn scan_footer(&self, lines: &[&str]) -> Option<Unit> {
        let start = lines.len().saturating_sub(self.footer_scan_lines);

        for line in lines[start..].iter().rev() {
            if let Some(captures) = self.footer_code.captures(line)
                && let Some(code) = captures.get(1)
                && let Some(unit) = self.catalog.abbreviation(code.as_str())
            {
                return Some(unit);
            }

            if let Some(captures) = self.footer_page_number.captures(line)
                && let Some(text) = captures.name("txt")
                && let Some(unit) = self.catalog.canonicalize(text.as_str()).known()
            {
                return Some(unit);
            }

            if self.overall.is_match(line) {
                return Some(Unit::UniversityWide);
            }
        }

        None
    }

    /// Stricter than the top-of-page scan: only the first one to three lines
    /// may name the unit, so index pages listing every unit never match.
    pub(super) fn page_starts_with_unit(&self, page_text: &str) -> Option<Unit> {
        let lines = nonempty_lines(page_text);
        (1..=3)
            .filter(|span| lines.len() >= *span)
            .find_map(|span| self.catalog.canonicalize(&lines[..span].join(" ")).known())
    }

    fn test_candidate(&self, candidate: &str) -> Option<Unit> {
        self.catalog
            .canonicalize(&candidate.replace(" ,", ","))
            .known()
    }
}

fn nonempty_lines(text: &str) -> Vec<&str> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect()
}
