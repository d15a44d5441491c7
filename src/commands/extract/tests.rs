use crate::cli::ReportKind;

use super::config::ExtractConfig;
use super::document::memory::{InMemoryDocument, MemoryPage};
use super::document::ReportDocument;
use super::lexicon::ValuePatterns;
use super::pipeline::{ExtractionEngine, KindSession};
use super::records::{MetricValue, Quality};
use super::section_parser::{SectionSpec, parse_section, parse_section_page};
use super::taxonomy::MetricCategory;
use super::unit_resolver::{ResolverPolicy, UnitResolver, UnitSource};
use super::units::{Unit, UnitCatalog, UnitMatch};

const OUTCOMES_TABLE: &[&[&str]] = &[
    &["Outcome", "#", "%"],
    &["Employed FT", "1,204", "61%"],
    &["Employed PT", "88", "4%"],
    &["Continuing Education", "301", "15%"],
    &["Unplaced", "120", "6%"],
    &["Unresolved", "9", "<1%"],
];

fn engine() -> ExtractionEngine {
    ExtractionEngine::new(ExtractConfig::default()).expect("engine builds")
}

fn run_documents<'e>(
    engine: &'e ExtractionEngine,
    kind: ReportKind,
    documents: &[InMemoryDocument],
) -> KindSession<'e> {
    let mut session = engine.session(kind).expect("session");
    for document in documents {
        if let Some(year) = session.begin_document(document.name()) {
            session.process_document(document, year);
        }
    }
    session
}

fn outcome_percent(session: &KindSession<'_>, unit: Unit, category: MetricCategory) -> Option<String> {
    match session.store.get(unit, 2019, category).map(|record| &record.value) {
        Some(MetricValue::Outcome { percent, .. }) => Some(percent.clone()),
        _ => None,
    }
}

#[test]
fn untitled_table_page_inherits_unit_from_previous_page() {
    let engine = engine();
    let document = InMemoryDocument::new(
        "2019 Graduation Survey Report.pdf",
        vec![
            MemoryPage::text("College of Education\nGraduates of 2019 reported the following."),
            MemoryPage::with_table("REPORTED OUTCOMES\nSee table below.", OUTCOMES_TABLE),
        ],
    );

    let session = run_documents(&engine, ReportKind::Outcomes, &[document]);

    assert_eq!(
        outcome_percent(&session, Unit::Education, MetricCategory::EmployedFullTime).as_deref(),
        Some("61%")
    );
    let held = session
        .store
        .get(Unit::Education, 2019, MetricCategory::Unresolved)
        .expect("unresolved row");
    assert_eq!(held.provenance.page, 2);
    assert_eq!(held.provenance.quality, Quality::High);
    assert_eq!(session.counts.unit_sources.get("carried"), Some(&1));
    assert_eq!(session.store.len(), 5);
}

#[test]
fn data_before_any_unit_is_withheld() {
    let engine = engine();
    let document = InMemoryDocument::new(
        "2019 Graduation Survey Report.pdf",
        vec![
            MemoryPage::with_table("Summary", OUTCOMES_TABLE),
            MemoryPage::text("College of Information"),
            MemoryPage::with_table("Outcomes", OUTCOMES_TABLE),
        ],
    );

    let session = run_documents(&engine, ReportKind::Outcomes, &[document]);

    assert_eq!(session.counts.unresolved_unit_page_count, 1);
    assert!(session
        .store
        .records()
        .all(|record| record.unit == Unit::Information));
    assert!(
        outcome_percent(&session, Unit::UniversityWide, MetricCategory::EmployedFullTime).is_none()
    );
}

#[test]
fn failing_page_and_yearless_document_do_not_stop_the_batch() {
    let engine = engine();
    let documents = vec![
        InMemoryDocument::new(
            "survey notes.pdf",
            vec![MemoryPage::with_table("College of Education", OUTCOMES_TABLE)],
        ),
        InMemoryDocument::new(
            "2019 Graduation Survey Report.pdf",
            vec![
                MemoryPage::text("Honors College"),
                MemoryPage::unreadable(),
                MemoryPage::with_table("Outcomes", OUTCOMES_TABLE),
            ],
        ),
    ];

    let session = run_documents(&engine, ReportKind::Outcomes, &documents);

    assert_eq!(session.counts.document_count, 2);
    assert_eq!(session.counts.skipped_document_count, 1);
    assert_eq!(session.counts.processed_document_count, 1);
    assert_eq!(session.counts.failed_page_count, 1);
    assert_eq!(session.warnings.len(), 2);
    assert_eq!(
        outcome_percent(&session, Unit::HonorsCollege, MetricCategory::Unplaced).as_deref(),
        Some("6%")
    );
    assert_eq!(session.store.years(), vec![2019]);
}

#[test]
fn employment_search_uses_unit_from_pages_outside_the_section() {
    let engine = engine();
    let document = InMemoryDocument::new(
        "2018 Graduation Survey Report.pdf",
        vec![
            MemoryPage::text("College of Information\nOverview of the graduating class."),
            MemoryPage::text(
                "Employment Search\nBased on 210 responses\nOn-campus interview\n12%\n\
                 Handshake 30%\nContacts from family or friends: 9%\nAstrology 2%\n\
                 Placement rate 91%",
            ),
        ],
    );

    let session = run_documents(&engine, ReportKind::EmploymentSearch, &[document]);
    let percent = |category| match session
        .store
        .get(Unit::Information, 2018, category)
        .map(|record| &record.value)
    {
        Some(MetricValue::Percent(percent)) => Some(percent.clone()),
        _ => None,
    };

    assert_eq!(percent(MetricCategory::OnCampusInterviews).as_deref(), Some("12%"));
    assert_eq!(percent(MetricCategory::UmdOnlineJobSite).as_deref(), Some("30%"));
    assert_eq!(percent(MetricCategory::ContactsFamilyFriends).as_deref(), Some("9%"));
    assert_eq!(session.counts.raw_field_count, 4);
    assert_eq!(session.counts.unrecognized_label_count, 1);
}

#[test]
fn suppressed_employment_search_yields_nothing() {
    let engine = engine();
    let document = InMemoryDocument::new(
        "2018 Graduation Survey Report.pdf",
        vec![
            MemoryPage::text("School of Public Policy"),
            MemoryPage::text("Employment Search\nToo few responses to report.\nHandshake 30%"),
        ],
    );

    let session = run_documents(&engine, ReportKind::EmploymentSearch, &[document]);
    assert_eq!(session.store.len(), 0);
}

#[test]
fn wage_page_without_title_looks_ahead_one_page() {
    let engine = engine();
    let document = InMemoryDocument::new(
        "2021 Graduation Survey Report.pdf",
        vec![
            MemoryPage::text("Internship participation summary"),
            MemoryPage::text(
                "Of the 120 internship experiences that included an hourly wage, \
                 the average was $18.50 and the median was $17.00.",
            ),
            MemoryPage::text("School of Public Health\nGraduates in 2021 ..."),
        ],
    );

    let session = run_documents(&engine, ReportKind::InternshipWage, &[document]);

    let record = session
        .store
        .get(Unit::PublicHealth, 2021, MetricCategory::InternshipWage)
        .expect("wage attributed via lookahead");
    match &record.value {
        MetricValue::Wage(stats) => {
            assert_eq!(stats.n, 120);
            assert_eq!(stats.average, Some(18.5));
            assert_eq!(stats.median, Some(17.0));
        }
        other => panic!("unexpected value {other:?}"),
    }
    assert_eq!(session.counts.unit_sources.get("lookahead"), Some(&1));
}

#[test]
fn top_employer_is_always_university_wide() {
    let engine = engine();
    let document = InMemoryDocument::new(
        "2017 Graduation Survey Report.pdf",
        vec![
            MemoryPage::text("College of Education\nTOP EMPLOYERS\nReported by 3 or more graduates"),
            MemoryPage::text("Booz Allen Hamilton 44\nDeloitte 40"),
        ],
    );

    let session = run_documents(&engine, ReportKind::TopEmployers, &[document]);

    let record = session
        .store
        .get(Unit::UniversityWide, 2017, MetricCategory::TopEmployer)
        .expect("employer");
    assert_eq!(record.value, MetricValue::Text("Booz Allen Hamilton".to_string()));
    assert_eq!(session.counts.unit_sources.get("implicit"), Some(&1));
}

#[test]
fn unit_aliases_canonicalize_to_one_unit() {
    let catalog = UnitCatalog::new().expect("catalog");

    for variant in [
        "The Robert H. Smith School of Business",
        "Robert H Smith School of Business",
        "the robert h. smith   school of business",
    ] {
        assert_eq!(catalog.canonicalize(variant), UnitMatch::Known(Unit::Business));
    }
    assert_eq!(
        catalog.canonicalize("College of Computer, Mathematical & Natural Sciences"),
        UnitMatch::Known(Unit::ComputerMathematicalAndNaturalSciences)
    );
    assert_eq!(
        catalog.canonicalize("Phillip Merrill College of Journalism"),
        UnitMatch::Known(Unit::Journalism)
    );
    assert_eq!(
        catalog.canonicalize("University of Maryland Graduate Survey Report"),
        UnitMatch::Known(Unit::UniversityWide)
    );
    assert_eq!(
        catalog.canonicalize("University\u{2013}wide"),
        UnitMatch::Known(Unit::UniversityWide)
    );
    assert_eq!(
        catalog.canonicalize("Department  of Physics"),
        UnitMatch::Unresolved("Department  of Physics".to_string())
    );
}

#[test]
fn every_canonical_name_round_trips() {
    let catalog = UnitCatalog::new().expect("catalog");
    for unit in Unit::ALL {
        assert_eq!(catalog.canonicalize(unit.name()), UnitMatch::Known(unit));
    }
}

#[test]
fn top_scan_joins_wrapped_unit_titles() {
    let catalog = UnitCatalog::new().expect("catalog");
    let resolver =
        UnitResolver::new(&catalog, ResolverPolicy::default(), 60, 12).expect("resolver");

    let page = "Graduation Survey\nSchool of Architecture,\nPlanning , and Preservation\nBody";
    let resolution = resolver.declared_unit(page).expect("resolved");
    assert_eq!(resolution.unit, Unit::ArchitecturePlanningAndPreservation);
    assert_eq!(resolution.source, UnitSource::TopOfPage);
}

#[test]
fn footer_and_anywhere_steps_follow_policy() {
    let catalog = UnitCatalog::new().expect("catalog");
    let wage_policy = ResolverPolicy {
        footer: true,
        anywhere: true,
        lookahead: true,
    };
    let resolver = UnitResolver::new(&catalog, wage_policy, 60, 12).expect("resolver");
    let top_only =
        UnitResolver::new(&catalog, ResolverPolicy::default(), 60, 12).expect("resolver");

    let footer_page = "Internship wages were reported.\nBMGT 14";
    let footer = resolver.declared_unit(footer_page).expect("footer");
    assert_eq!(footer.unit, Unit::Business);
    assert_eq!(footer.source, UnitSource::Footer);
    assert!(top_only.declared_unit(footer_page).is_none());

    let named_footer = "Internship wages were reported.\nSchool of Public Health 14";
    let named = resolver.declared_unit(named_footer).expect("named footer");
    assert_eq!(named.unit, Unit::PublicHealth);
    assert_eq!(named.source, UnitSource::Footer);
    assert!(top_only.declared_unit(named_footer).is_none());

    let overall = resolver
        .declared_unit("Internship wages were reported.\nOverall Results 3")
        .expect("overall footer");
    assert_eq!(overall.unit, Unit::UniversityWide);
    assert_eq!(overall.source, UnitSource::Footer);

    assert!(
        resolver
            .declared_unit("Internship wages were reported.\nbmgt 14")
            .is_none()
    );

    let prose = "Many graduates of the Honors College and the School of Public Health \
                 responded to the survey questions this year.";
    let anywhere = resolver.declared_unit(prose).expect("anywhere");
    assert_eq!(anywhere.unit, Unit::PublicHealth);
    assert_eq!(anywhere.source, UnitSource::Anywhere);
}

#[test]
fn page_start_test_ignores_units_deeper_in_the_page() {
    let catalog = UnitCatalog::new().expect("catalog");
    let resolver =
        UnitResolver::new(&catalog, ResolverPolicy::default(), 60, 12).expect("resolver");

    assert_eq!(
        resolver.page_starts_with_unit("Honors College\nSummary"),
        Some(Unit::HonorsCollege)
    );
    assert_eq!(
        resolver.page_starts_with_unit("Contents\nIntro\nMethod\nHonors College"),
        None
    );
}

#[test]
fn free_text_parser_pairs_labels_and_values() {
    let spec = SectionSpec::employment_search().expect("spec");
    let values = ValuePatterns::new().expect("patterns");
    let lines = [
        "Intro text",
        "Methods of Employment Search",
        "Handshake",
        "30%",
        "Newspaper",
        "2%",
        "Handshake",
        "30%",
        "Salary information",
        "Other",
        "5%",
    ];

    let fields = parse_section(&spec, &values, &lines);
    let pairs = fields
        .iter()
        .map(|field| (field.label.as_str(), field.value.as_str()))
        .collect::<Vec<_>>();
    assert_eq!(pairs, vec![("Handshake", "30%"), ("Newspaper", "2%")]);

    assert_eq!(parse_section(&spec, &values, &lines), fields);
}

#[test]
fn free_text_parser_ignores_whitespace_layout() {
    let spec = SectionSpec::employment_search().expect("spec");
    let values = ValuePatterns::new().expect("patterns");

    let tidy = parse_section_page(&spec, &values, "Employment Search\nCareer fair\n14%\nOther\n3%");
    let ragged = parse_section_page(
        &spec,
        &values,
        "  Employment   Search \n\n Career    fair\n 14 % \n\n\tOther\n3  %  ",
    );
    assert_eq!(tidy, ragged);
    assert_eq!(tidy.len(), 2);
}

#[test]
fn value_before_label_and_wrapped_labels_pair_up() {
    let spec = SectionSpec::employment_search().expect("spec");
    let values = ValuePatterns::new().expect("patterns");
    let lines = [
        "Employment Search",
        "22%",
        "Previous internship",
        "Currently employed with",
        "the organization",
        "8%",
    ];

    let fields = parse_section(&spec, &values, &lines);
    assert_eq!(fields.len(), 2);
    assert_eq!(fields[0].label, "Previous internship");
    assert_eq!(fields[0].value, "22%");
    assert_eq!(fields[1].label, "Currently employed with the organization");
    assert_eq!(fields[1].value, "8%");
}

#[test]
fn missing_heading_yields_no_fields() {
    let spec = SectionSpec::employment_search().expect("spec");
    let values = ValuePatterns::new().expect("patterns");
    assert!(parse_section(&spec, &values, &["Handshake", "30%"]).is_empty());
}
