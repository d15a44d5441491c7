use std::collections::HashMap;

use anyhow::{Context, Result};
use regex::Regex;

/// Canonical organizational units, in output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(super) enum Unit {
    UniversityWide,
    AgricultureAndNaturalResources,
    ArtsAndHumanities,
    BehavioralAndSocialSciences,
    ComputerMathematicalAndNaturalSciences,
    Education,
    Information,
    Engineering,
    Journalism,
    ArchitecturePlanningAndPreservation,
    PublicHealth,
    PublicPolicy,
    Business,
    CollegeParkScholars,
    HonorsCollege,
    LettersAndSciences,
    UndergraduateStudies,
}

impl Unit {
    pub(super) const ALL: [Unit; 17] = [
        Self::UniversityWide,
        Self::AgricultureAndNaturalResources,
        Self::ArtsAndHumanities,
        Self::BehavioralAndSocialSciences,
        Self::ComputerMathematicalAndNaturalSciences,
        Self::Education,
        Self::Information,
        Self::Engineering,
        Self::Journalism,
        Self::ArchitecturePlanningAndPreservation,
        Self::PublicHealth,
        Self::PublicPolicy,
        Self::Business,
        Self::CollegeParkScholars,
        Self::HonorsCollege,
        Self::LettersAndSciences,
        Self::UndergraduateStudies,
    ];

    pub(super) fn name(self) -> &'static str {
        match self {
            Self::UniversityWide => "University-wide",
            Self::AgricultureAndNaturalResources => "College of Agriculture and Natural Resources",
            Self::ArtsAndHumanities => "College of Arts and Humanities",
            Self::BehavioralAndSocialSciences => "College of Behavioral and Social Sciences",
            Self::ComputerMathematicalAndNaturalSciences => {
                "College of Computer, Mathematical, and Natural Sciences"
            }
            Self::Education => "College of Education",
            Self::Information => "College of Information",
            Self::Engineering => "The A. James Clark School of Engineering",
            Self::Journalism => "Philip Merrill College of Journalism",
            Self::ArchitecturePlanningAndPreservation => {
                "School of Architecture, Planning, and Preservation"
            }
            Self::PublicHealth => "School of Public Health",
            Self::PublicPolicy => "School of Public Policy",
            Self::Business => "The Robert H. Smith School of Business",
            Self::CollegeParkScholars => "College Park Scholars",
            Self::HonorsCollege => "Honors College",
            Self::LettersAndSciences => "Letters and Sciences",
            Self::UndergraduateStudies => "Undergraduate Studies",
        }
    }
}

/// Result of canonicalizing a raw unit string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum UnitMatch {
    Known(Unit),
    Unresolved(String),
}

impl UnitMatch {
    pub(super) fn known(&self) -> Option<Unit> {
        match self {
            Self::Known(unit) => Some(*unit),
            Self::Unresolved(_) => None,
        }
    }
}

const UNIT_ALIASES: [(&str, Unit); 6] = [
    ("Phillip Merrill College of Journalism", Unit::Journalism),
    ("Robert H. Smith School of Business", Unit::Business),
    ("Robert H Smith School of Business", Unit::Business),
    ("Office of Undergraduate Studies", Unit::UndergraduateStudies),
    ("Division of Undergraduate Studies", Unit::UndergraduateStudies),
    ("College of Information Studies", Unit::Information),
];

const FOOTER_ABBREVIATIONS: [(&str, Unit); 20] = [
    ("AGNR", Unit::AgricultureAndNaturalResources),
    ("ARHU", Unit::ArtsAndHumanities),
    ("BSOS", Unit::BehavioralAndSocialSciences),
    ("CMNS", Unit::ComputerMathematicalAndNaturalSciences),
    ("EDUC", Unit::Education),
    ("INFO", Unit::Information),
    ("ENGR", Unit::Engineering),
    ("JOUR", Unit::Journalism),
    ("ARCH", Unit::ArchitecturePlanningAndPreservation),
    ("SPHL", Unit::PublicHealth),
    ("PLCY", Unit::PublicPolicy),
    ("PPOL", Unit::PublicPolicy),
    ("BMGT", Unit::Business),
    ("LTSC", Unit::LettersAndSciences),
    ("LESC", Unit::LettersAndSciences),
    ("HNRS", Unit::HonorsCollege),
    ("CPS", Unit::CollegeParkScholars),
    ("UGST", Unit::UndergraduateStudies),
    ("UGS", Unit::UndergraduateStudies),
    ("OVERALL", Unit::UniversityWide),
];

/// Immutable unit lookup tables, built once per run.
pub(super) struct UnitCatalog {
    aliases: HashMap<String, Unit>,
    abbreviations: HashMap<&'static str, Unit>,
    university_wide: Regex,
}

impl UnitCatalog {
    pub(super) fn new() -> Result<Self> {
        let mut aliases = Unit::ALL
            .into_iter()
            .map(|unit| (unit_key(unit.name()), unit))
            .collect::<HashMap<String, Unit>>();
        for (alias, unit) in UNIT_ALIASES {
            aliases.insert(unit_key(alias), unit);
        }

        Ok(Self {
            aliases,
            abbreviations: FOOTER_ABBREVIATIONS.into_iter().collect(),
            university_wide: Regex::new(r"university\s*[- ]\s*wide|universitywide")
                .context("failed to compile university-wide regex")?,
        })
    }

    pub(super) fn canonicalize(&self, raw: &str) -> UnitMatch {
        let normalized = normalize_unit_text(raw);
        let lower = normalized.to_lowercase();

        if self.names_whole_institution(&lower) {
            return UnitMatch::Known(Unit::UniversityWide);
        }

        match self.aliases.get(&unit_key(&normalized)) {
            Some(unit) => UnitMatch::Known(*unit),
            None => UnitMatch::Unresolved(raw.to_string()),
        }
    }

    pub(super) fn abbreviation(&self, code: &str) -> Option<Unit> {
        self.abbreviations.get(code).copied()
    }

    /// Longest canonical name occurring anywhere in `text`.
    pub(super) fn longest_name_in(&self, text: &str) -> Option<Unit> {
        let lower = text.to_lowercase();
        let mut best: Option<Unit> = None;
        for unit in Unit::ALL {
            if !lower.contains(&unit.name().to_lowercase()) {
                continue;
            }
            if best.is_none_or(|current| unit.name().len() > current.name().len()) {
                best = Some(unit);
            }
        }
        best
    }

    fn names_whole_institution(&self, lower: &str) -> bool {
        if self.university_wide.is_match(lower) {
            return true;
        }
        if lower == "university of maryland" {
            return true;
        }
        lower.contains("university of maryland")
            && ["university-wide", "university wide", "overall", "graduate survey report"]
                .iter()
                .any(|marker| lower.contains(marker))
    }
}

fn normalize_unit_text(input: &str) -> String {
    input
        .replace(['\u{2013}', '\u{2014}'], "-")
        .split_whitespace()
        .collect::<Vec<&str>>()
        .join(" ")
}

/// Matching key: lower-case, `&` spelled out, punctuation collapsed, `and` dropped.
fn unit_key(input: &str) -> String {
    let spelled = input.to_lowercase().replace('&', " and ");
    let flattened = spelled
        .chars()
        .map(|character| {
            if character.is_ascii_alphanumeric() {
                character
            } else {
                ' '
            }
        })
        .collect::<String>();

    flattened
        .split_whitespace()
        .filter(|token| *token != "and")
        .collect::<Vec<&str>>()
        .join(" ")
}
