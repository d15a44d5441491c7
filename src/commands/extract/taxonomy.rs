use crate::cli::ReportKind;

use super::lexicon::collapse_whitespace;

/// Canonical metric buckets across all report kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(super) enum MetricCategory {
    EmployedFullTime,
    EmployedPartTime,
    ContinuingEducation,
    Volunteering,
    Military,
    StartingBusiness,
    Unplaced,
    Unresolved,
    Total,
    NotSeeking,
    OnCampusInterviews,
    InternshipCoop,
    CareerFairsOnCampus,
    CareerFairsOffCampus,
    UmdOnlineJobSite,
    NonUmdOnlineJobSite,
    ContactsFaculty,
    ContactsFamilyFriends,
    CurrentlyEmployedWithOrg,
    Newspaper,
    Other,
    InternshipWage,
    TopEmployer,
}

impl MetricCategory {
    pub(super) fn label(self) -> &'static str {
        match self {
            Self::EmployedFullTime => "Employed FT",
            Self::EmployedPartTime => "Employed PT",
            Self::ContinuingEducation => "Continuing Edu",
            Self::Volunteering => "Volunteering",
            Self::Military => "Military",
            Self::StartingBusiness => "Business",
            Self::Unplaced => "Unplaced",
            Self::Unresolved => "Unresolved",
            Self::Total => "Total",
            Self::NotSeeking => "Not Seeking",
            Self::OnCampusInterviews => "On-campus Interviews",
            Self::InternshipCoop => "Previous Internship/Co-op",
            Self::CareerFairsOnCampus => "Career Fairs On Campus",
            Self::CareerFairsOffCampus => "Career Fairs Off Campus",
            Self::UmdOnlineJobSite => "UMD Online Job Site",
            Self::NonUmdOnlineJobSite => "Non-UMD Online Job Site",
            Self::ContactsFaculty => "Contacts Faculty",
            Self::ContactsFamilyFriends => "Contacts Family/Friends",
            Self::CurrentlyEmployedWithOrg => "Currently Employed with Org",
            Self::Newspaper => "Newspaper",
            Self::Other => "Other",
            Self::InternshipWage => "Internship Wage",
            Self::TopEmployer => "Employer Names",
        }
    }

    /// Headcount rows whose percent, when printed at all, is not comparable.
    pub(super) fn ranks_by_count(self) -> bool {
        matches!(self, Self::Total | Self::NotSeeking)
    }
}

/// Categories a report kind emits, in column order.
pub(super) fn categories(kind: ReportKind) -> &'static [MetricCategory] {
    use MetricCategory::*;
    match kind {
        ReportKind::Outcomes => &[
            EmployedFullTime,
            EmployedPartTime,
            ContinuingEducation,
            Volunteering,
            Military,
            StartingBusiness,
            Unplaced,
            Unresolved,
            Total,
            NotSeeking,
        ],
        ReportKind::EmploymentSearch => &[
            OnCampusInterviews,
            InternshipCoop,
            CareerFairsOnCampus,
            CareerFairsOffCampus,
            UmdOnlineJobSite,
            NonUmdOnlineJobSite,
            ContactsFaculty,
            ContactsFamilyFriends,
            CurrentlyEmployedWithOrg,
            Newspaper,
            Other,
        ],
        ReportKind::InternshipWage => &[InternshipWage],
        ReportKind::TopEmployers => &[TopEmployer],
    }
}

type TaxonomyTest = fn(&str) -> bool;

struct TaxonomyRule {
    name: &'static str,
    category: MetricCategory,
    test: TaxonomyTest,
}

const fn rule(name: &'static str, category: MetricCategory, test: TaxonomyTest) -> TaxonomyRule {
    TaxonomyRule {
        name,
        category,
        test,
    }
}

fn has_any(label: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| label.contains(needle))
}

fn has_word(label: &str, word: &str) -> bool {
    label
        .split(|character: char| !character.is_ascii_alphanumeric())
        .any(|token| token == word)
}

const OUTCOME_RULES: [TaxonomyRule; 10] = [
    rule("employed_ft", MetricCategory::EmployedFullTime, |s| {
        s.contains("employed") && s.contains("ft")
    }),
    rule("employed_pt", MetricCategory::EmployedPartTime, |s| {
        s.contains("employed") && s.contains("pt")
    }),
    rule("continuing_education", MetricCategory::ContinuingEducation, |s| {
        s.contains("continuing") && s.contains("education")
    }),
    rule("volunteering", MetricCategory::Volunteering, |s| {
        has_any(s, &["volunteer", "service program"])
    }),
    rule("military", MetricCategory::Military, |s| s.contains("military")),
    rule("business", MetricCategory::StartingBusiness, |s| s.contains("business")),
    rule("unplaced", MetricCategory::Unplaced, |s| s.contains("unplaced")),
    rule("unresolved", MetricCategory::Unresolved, |s| s.contains("unresolved")),
    rule("total", MetricCategory::Total, |s| has_word(s, "total")),
    rule("not_seeking", MetricCategory::NotSeeking, |s| s.contains("not seeking")),
];

const NON_UMD: [&str; 2] = ["non-umd", "non umd"];

fn mentions_career_fair(s: &str) -> bool {
    s.contains("career fair")
}

fn off_campus_marker(s: &str) -> bool {
    has_any(s, &NON_UMD) || has_any(s, &["off campus", "off-campus"])
}

const METHOD_RULES: [TaxonomyRule; 11] = [
    rule("internship_coop", MetricCategory::InternshipCoop, |s| {
        has_any(s, &["intern", "co-op", "coop"])
    }),
    rule("career_fair_off_campus", MetricCategory::CareerFairsOffCampus, |s| {
        mentions_career_fair(s) && off_campus_marker(s)
    }),
    rule("career_fair_on_campus", MetricCategory::CareerFairsOnCampus, mentions_career_fair),
    rule("non_umd_online", MetricCategory::NonUmdOnlineJobSite, |s| {
        has_any(s, &NON_UMD)
            && has_any(
                s,
                &[
                    "online",
                    "job site",
                    "jobsite",
                    "company website",
                    "company site",
                    "social media",
                ],
            )
    }),
    rule("umd_online", MetricCategory::UmdOnlineJobSite, |s| {
        has_any(s, &["umd online job site", "handshake", "hiresmith", "careers4terps"])
            && !has_any(s, &NON_UMD)
    }),
    rule("on_campus_interviews", MetricCategory::OnCampusInterviews, |s| {
        s.contains("interview") && has_any(s, &["on campus", "on-campus", "campus/virtual", "virtual"])
    }),
    rule("contacts_family_friends", MetricCategory::ContactsFamilyFriends, |s| {
        has_any(s, &["family", "friends"]) && s.contains("contact")
    }),
    rule("contacts_faculty", MetricCategory::ContactsFaculty, |s| {
        has_any(s, &["faculty", "staff"]) && s.contains("contact")
    }),
    rule("currently_employed", MetricCategory::CurrentlyEmployedWithOrg, |s| {
        s.contains("currently employed")
    }),
    rule("newspaper", MetricCategory::Newspaper, |s| s.contains("newspaper")),
    rule("other", MetricCategory::Other, |s| s.trim() == "other"),
];

fn rules_for(kind: ReportKind) -> &'static [TaxonomyRule] {
    match kind {
        ReportKind::Outcomes => &OUTCOME_RULES,
        ReportKind::EmploymentSearch => &METHOD_RULES,
        ReportKind::InternshipWage | ReportKind::TopEmployers => &[],
    }
}

/// Maps a raw label onto the kind's taxonomy; the first matching rule wins.
/// Returns the rule name alongside the category for provenance logging.
pub(super) fn classify(kind: ReportKind, raw_label: &str) -> Option<(MetricCategory, &'static str)> {
    match kind {
        ReportKind::InternshipWage => return Some((MetricCategory::InternshipWage, "wage_statement")),
        ReportKind::TopEmployers => return Some((MetricCategory::TopEmployer, "top_employer")),
        ReportKind::Outcomes | ReportKind::EmploymentSearch => {}
    }

    let label = collapse_whitespace(&raw_label.to_lowercase());
    rules_for(kind)
        .iter()
        .find(|rule| (rule.test)(&label))
        .map(|rule| (rule.category, rule.name))
}
