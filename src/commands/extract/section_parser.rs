use std::collections::HashSet;

use anyhow::{Context, Result};
use regex::{Regex, RegexBuilder};

use super::lexicon::{LabelFilter, ValuePatterns, clean_cell, collapse_whitespace, strip_spaces};

/// A prose section: where it starts, what ends it, and which lines inside it
/// are noise.
pub(super) struct SectionSpec {
    pub name: &'static str,
    headings: &'static [&'static str],
    stop_markers: &'static [&'static str],
    boilerplate: &'static [&'static [&'static str]],
    suppressed_by: Option<&'static str>,
    pub labels: LabelFilter,
    heading_regex: Regex,
}

impl SectionSpec {
    pub(super) fn new(
        name: &'static str,
        headings: &'static [&'static str],
        stop_markers: &'static [&'static str],
        boilerplate: &'static [&'static [&'static str]],
        suppressed_by: Option<&'static str>,
        labels: LabelFilter,
    ) -> Result<Self> {
        let alternation = headings
            .iter()
            .map(|heading| {
                heading
                    .split_whitespace()
                    .map(regex::escape)
                    .collect::<Vec<String>>()
                    .join(r"\s+")
            })
            .collect::<Vec<String>>()
            .join("|");
        let heading_regex = RegexBuilder::new(&alternation)
            .case_insensitive(true)
            .build()
            .with_context(|| format!("failed to compile heading regex for section {name}"))?;

        Ok(Self {
            name,
            headings,
            stop_markers,
            boilerplate,
            suppressed_by,
            labels,
            heading_regex,
        })
    }

    /// Employment-search block: methods graduates used to find their job.
    pub(super) fn employment_search() -> Result<Self> {
        Self::new(
            "employment_search",
            &[
                "employment search",
                "method used to find employment",
                "methods of employment",
            ],
            &[
                "reported outcomes",
                "graduate outcomes",
                "placement rate",
                "employed ft",
                "employed pt",
                "continuing education",
                "volunteering",
                "service program",
                "serving in the military",
                "starting a business",
                "unplaced",
                "unresolved",
                "salary",
            ],
            &[&["based on", "responses"]],
            Some("too few responses"),
            LabelFilter {
                header_words: &["method", "methods", "used", "find", "employment", "search"],
                rejected_phrases: &[],
            },
        )
    }

    pub(super) fn mentioned_in(&self, page_text: &str) -> bool {
        self.heading_regex.is_match(page_text)
    }

    /// A suppression notice after the heading means the report printed no
    /// figures for this unit.
    fn is_suppressed(&self, page_text: &str) -> bool {
        let Some(marker) = self.suppressed_by else {
            return false;
        };
        let lower = page_text.to_lowercase();
        let Some(heading_at) = self
            .headings
            .iter()
            .filter_map(|heading| lower.find(heading))
            .min()
        else {
            return false;
        };
        lower
            .find(marker)
            .is_some_and(|marker_at| marker_at > heading_at)
    }

    fn is_heading(&self, line: &str) -> bool {
        self.heading_regex.is_match(line)
    }

    fn is_stop(&self, lower: &str) -> bool {
        self.stop_markers.iter().any(|marker| lower.contains(marker))
    }

    fn is_boilerplate(&self, line: &str, lower: &str) -> bool {
        self.is_heading(line)
            || self
                .boilerplate
                .iter()
                .any(|phrases| phrases.iter().all(|phrase| lower.contains(phrase)))
    }
}

/// A (label, value) pair read out of prose before taxonomy mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct LabeledValue {
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum LineKind {
    Stop,
    Boilerplate,
    ValueOnly(String),
    Inline,
    Label,
    Noise,
}

struct LineContext<'a> {
    spec: &'a SectionSpec,
    values: &'a ValuePatterns,
    line: &'a str,
    lower: String,
}

type LineRule = fn(&LineContext<'_>) -> Option<LineKind>;

const LINE_RULES: [(&str, LineRule); 5] = [
    ("stop_marker", classify_stop),
    ("boilerplate", classify_boilerplate),
    ("value_only", classify_value_only),
    ("inline_values", classify_inline),
    ("label_only", classify_label),
];

fn classify_stop(context: &LineContext<'_>) -> Option<LineKind> {
    context
        .spec
        .is_stop(&context.lower)
        .then_some(LineKind::Stop)
}

fn classify_boilerplate(context: &LineContext<'_>) -> Option<LineKind> {
    context
        .spec
        .is_boilerplate(context.line, &context.lower)
        .then_some(LineKind::Boilerplate)
}

fn classify_value_only(context: &LineContext<'_>) -> Option<LineKind> {
    context
        .values
        .is_percent(context.line)
        .then(|| LineKind::ValueOnly(strip_spaces(&clean_cell(context.line))))
}

fn classify_inline(context: &LineContext<'_>) -> Option<LineKind> {
    (!context.values.inline_percents(context.line).is_empty()).then_some(LineKind::Inline)
}

fn classify_label(context: &LineContext<'_>) -> Option<LineKind> {
    context
        .spec
        .labels
        .is_valid(context.values, context.line)
        .then_some(LineKind::Label)
}

fn classify_line(spec: &SectionSpec, values: &ValuePatterns, line: &str) -> LineKind {
    let context = LineContext {
        spec,
        values,
        line,
        lower: line.to_lowercase(),
    };
    LINE_RULES
        .iter()
        .find_map(|(_, rule)| rule(&context))
        .unwrap_or(LineKind::Noise)
}

/// The two slots carried between lines: a label still waiting for its value,
/// or a value that arrived before its label.
#[derive(Debug, Default)]
struct PendingPair {
    label: Option<String>,
    value: Option<String>,
}

impl PendingPair {
    fn clear(&mut self) {
        self.label = None;
        self.value = None;
    }
}

/// Reads one page of prose into (label, value) pairs for `spec`.
pub(super) fn parse_section_page(
    spec: &SectionSpec,
    values: &ValuePatterns,
    page_text: &str,
) -> Vec<LabeledValue> {
    if spec.is_suppressed(page_text) {
        return Vec::new();
    }
    let lines = page_text.lines().collect::<Vec<&str>>();
    parse_section(spec, values, &lines)
}

pub(super) fn parse_section(
    spec: &SectionSpec,
    values: &ValuePatterns,
    lines: &[&str],
) -> Vec<LabeledValue> {
    let lines = lines
        .iter()
        .map(|line| collapse_whitespace(line))
        .filter(|line| !line.is_empty())
        .collect::<Vec<String>>();

    let Some(start) = lines.iter().position(|line| spec.is_heading(line)) else {
        return Vec::new();
    };

    let mut pending = PendingPair::default();
    let mut found = Vec::<LabeledValue>::new();

    for line in &lines[start + 1..] {
        match classify_line(spec, values, line) {
            LineKind::Stop => break,
            LineKind::Boilerplate | LineKind::Noise => {}
            LineKind::ValueOnly(value) => {
                let label_ready = pending
                    .label
                    .as_deref()
                    .is_some_and(|label| spec.labels.is_valid(values, label));
                if label_ready {
                    if let Some(label) = pending.label.take() {
                        found.push(LabeledValue { label, value });
                    }
                    pending.clear();
                } else {
                    pending.value = Some(value);
                }
            }
            LineKind::Inline => {
                let mut previous_end = 0usize;
                for inline in values.inline_percents(line) {
                    let mut label = line[previous_end..inline.span.start]
                        .trim_matches([' ', '-', ':', '\t'])
                        .to_string();
                    previous_end = inline.span.end;

                    if label.is_empty()
                        && let Some(carried) = &pending.label
                    {
                        label = carried.clone();
                    }
                    if spec.labels.is_valid(values, &label) && values.is_percent(&inline.value) {
                        found.push(LabeledValue {
                            label,
                            value: inline.value,
                        });
                    }
                }
                pending.clear();
            }
            LineKind::Label => {
                if let Some(value) = pending.value.take() {
                    found.push(LabeledValue {
                        label: line.clone(),
                        value,
                    });
                    pending.clear();
                } else if let Some(label) = pending.label.as_mut() {
                    label.push(' ');
                    label.push_str(line);
                } else {
                    pending.label = Some(line.clone());
                }
            }
        }
    }

    dedupe_labeled_values(found)
}

fn dedupe_labeled_values(found: Vec<LabeledValue>) -> Vec<LabeledValue> {
    let mut seen = HashSet::<(String, String)>::new();
    found
        .into_iter()
        .filter(|pair| seen.insert((pair.label.to_lowercase(), pair.value.clone())))
        .collect()
}
