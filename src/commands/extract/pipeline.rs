use anyhow::Result;
use tracing::{debug, warn};

use crate::cli::ReportKind;
use crate::model::ExtractCounts;

use super::config::ExtractConfig;
use super::document::ReportDocument;
use super::error::ExtractError;
use super::lexicon::{ValuePatterns, parse_count};
use super::outcomes_table::OutcomesTableReader;
use super::records::{CanonicalRecord, MetricValue, Provenance, Quality, RawField, RecordStore};
use super::section_parser::{LabeledValue, SectionSpec, parse_section_page};
use super::table_scorer::TableScorer;
use super::taxonomy::classify;
use super::top_employers::{EmployerScanState, ScanStep, TopEmployerScanner};
use super::unit_resolver::{Resolution, ResolverPolicy, UnitResolver, UnitSource};
use super::units::{Unit, UnitCatalog};
use super::wage_cascade::WageCascade;
use super::year::YearPatterns;

/// Lookup tables and compiled patterns shared by every report kind.
pub(super) struct ExtractionEngine {
    config: ExtractConfig,
    catalog: UnitCatalog,
    values: ValuePatterns,
    years: YearPatterns,
    employment_search: SectionSpec,
    outcomes_scorer: TableScorer,
    outcomes_reader: OutcomesTableReader,
    wages: WageCascade,
    employers: TopEmployerScanner,
}

impl ExtractionEngine {
    pub(super) fn new(config: ExtractConfig) -> Result<Self> {
        Ok(Self {
            catalog: UnitCatalog::new()?,
            values: ValuePatterns::new()?,
            years: YearPatterns::new()?,
            employment_search: SectionSpec::employment_search()?,
            outcomes_scorer: TableScorer::outcomes(config.table_scan_rows, config.table_min_score),
            outcomes_reader: OutcomesTableReader::new()?,
            wages: WageCascade::new(config.wage_bounds, config.sentence_gap_chars)?,
            employers: TopEmployerScanner::new()?,
            config,
        })
    }

    pub(super) fn session(&self, kind: ReportKind) -> Result<KindSession<'_>> {
        Ok(KindSession {
            engine: self,
            kind,
            resolver: UnitResolver::new(
                &self.catalog,
                resolver_policy(kind),
                self.config.top_scan_lines,
                self.config.footer_scan_lines,
            )?,
            store: RecordStore::default(),
            counts: ExtractCounts::default(),
            warnings: Vec::new(),
        })
    }
}

fn resolver_policy(kind: ReportKind) -> ResolverPolicy {
    match kind {
        ReportKind::InternshipWage => ResolverPolicy {
            footer: true,
            anywhere: true,
            lookahead: true,
        },
        ReportKind::Outcomes | ReportKind::EmploymentSearch | ReportKind::TopEmployers => {
            ResolverPolicy::default()
        }
    }
}

/// Unit carried from page to page within one document.
#[derive(Debug, Default)]
struct UnitState {
    current: Option<Unit>,
}

impl UnitState {
    fn adopt(&mut self, resolution: Option<Resolution>) -> Option<Resolution> {
        if let Some(resolution) = resolution {
            self.current = Some(resolution.unit);
        }
        resolution
    }
}

/// Page position within the document being processed.
struct PageCursor<'d> {
    document: &'d dyn ReportDocument,
    index: usize,
}

impl PageCursor<'_> {
    fn page_number(&self) -> usize {
        self.index + 1
    }

    fn provenance(&self, quality: Quality) -> Provenance {
        Provenance {
            document: self.document.name().to_string(),
            page: self.page_number(),
            quality,
        }
    }

    fn next_page_text(&self) -> Option<String> {
        if self.index + 1 >= self.document.page_count() {
            return None;
        }
        self.document.page_text(self.index + 1).ok()
    }
}

/// Accumulated records and statistics for one report kind across a run.
pub(super) struct KindSession<'e> {
    engine: &'e ExtractionEngine,
    kind: ReportKind,
    resolver: UnitResolver<'e>,
    pub store: RecordStore,
    pub counts: ExtractCounts,
    pub warnings: Vec<String>,
}

impl KindSession<'_> {
    pub(super) fn kind(&self) -> ReportKind {
        self.kind
    }

    /// Registers a document and derives its year; `None` means it is skipped.
    pub(super) fn begin_document(&mut self, name: &str) -> Option<i32> {
        self.counts.document_count += 1;
        match self.engine.years.report_year(name) {
            Ok(year) => {
                self.store.observe_year(year);
                Some(year)
            }
            Err(err) => {
                self.skip_document(name, &err);
                None
            }
        }
    }

    pub(super) fn document_failed(&mut self, name: &str, reason: &anyhow::Error) {
        let err = ExtractError::ExtractionFailure {
            document: name.to_string(),
            reason: format!("{reason:#}"),
        };
        self.skip_document(name, &err);
    }

    fn skip_document(&mut self, name: &str, err: &ExtractError) {
        warn!(report = self.kind.as_str(), document = name, kind = err.kind(), error = %err, "skipping document");
        self.counts.skipped_document_count += 1;
        self.warnings.push(err.to_string());
    }

    fn page_failed(&mut self, cursor: &PageCursor<'_>, reason: &anyhow::Error) {
        let err = ExtractError::ExtractionFailure {
            document: cursor.document.name().to_string(),
            reason: format!("page {}: {reason:#}", cursor.page_number()),
        };
        warn!(
            report = self.kind.as_str(),
            document = cursor.document.name(),
            page = cursor.page_number(),
            error = %err,
            "page extraction failed"
        );
        self.counts.failed_page_count += 1;
        self.warnings.push(err.to_string());
    }

    pub(super) fn process_document(&mut self, document: &dyn ReportDocument, year: i32) {
        self.counts.processed_document_count += 1;
        match self.kind {
            ReportKind::Outcomes => self.scan_outcomes(document, year),
            ReportKind::EmploymentSearch => self.scan_employment_search(document, year),
            ReportKind::InternshipWage => self.scan_internship_wages(document, year),
            ReportKind::TopEmployers => self.scan_top_employers(document, year),
        }
        self.counts.canonical_record_count = self.store.len();
    }

    fn read_page(&mut self, cursor: &PageCursor<'_>) -> Option<String> {
        self.counts.page_count += 1;
        match cursor.document.page_text(cursor.index) {
            Ok(text) => Some(text),
            Err(err) => {
                self.page_failed(cursor, &err);
                None
            }
        }
    }

    fn scan_outcomes(&mut self, document: &dyn ReportDocument, year: i32) {
        let engine = self.engine;
        let mut state = UnitState::default();

        for index in 0..document.page_count() {
            let cursor = PageCursor { document, index };
            let Some(text) = self.read_page(&cursor) else {
                continue;
            };
            let resolution = state.adopt(self.resolver.resolve(&text, state.current, None));

            let tables = match document.page_tables(index) {
                Ok(tables) => tables,
                Err(err) => {
                    self.page_failed(&cursor, &err);
                    continue;
                }
            };
            let Some(grid) = engine.outcomes_scorer.select(&engine.values, &tables) else {
                continue;
            };
            let Some(resolution) = self.attribute(&cursor, resolution) else {
                continue;
            };

            let rows = engine.outcomes_reader.read_page(
                &engine.values,
                engine.outcomes_scorer.labels(),
                grid,
                &text,
            );
            for row in rows {
                let field = RawField {
                    label: row.outcome,
                    value: MetricValue::Outcome {
                        count: parse_count(&row.count),
                        percent: row.percent,
                    },
                    provenance: cursor.provenance(Quality::High),
                };
                self.promote(resolution.unit, year, field);
            }
        }
    }

    fn section_fields(
        &self,
        spec: &SectionSpec,
        cursor: &PageCursor<'_>,
        text: &str,
    ) -> Result<Vec<LabeledValue>, ExtractError> {
        if !spec.mentioned_in(text) {
            return Err(ExtractError::NoSectionFound {
                section: spec.name,
                page: cursor.page_number(),
            });
        }
        Ok(parse_section_page(spec, &self.engine.values, text))
    }

    fn scan_employment_search(&mut self, document: &dyn ReportDocument, year: i32) {
        let engine = self.engine;
        let spec = &engine.employment_search;
        let mut state = UnitState::default();

        for index in 0..document.page_count() {
            let cursor = PageCursor { document, index };
            let Some(text) = self.read_page(&cursor) else {
                continue;
            };

            // Section pages repeat other units' names in their prose, so only
            // pages outside the section move the current unit.
            let fields = match self.section_fields(spec, &cursor, &text) {
                Ok(fields) => fields,
                Err(ExtractError::NoSectionFound { .. }) => {
                    state.adopt(self.resolver.declared_unit(&text));
                    continue;
                }
                Err(err) => {
                    debug!(error = %err, "section skipped");
                    continue;
                }
            };
            if fields.is_empty() {
                continue;
            }

            let carried = state.current.map(|unit| Resolution {
                unit,
                source: UnitSource::Carried,
            });
            let Some(resolution) = self.attribute(&cursor, carried) else {
                continue;
            };

            for pair in fields {
                let field = RawField {
                    label: pair.label,
                    value: MetricValue::Percent(pair.value),
                    provenance: cursor.provenance(Quality::High),
                };
                self.promote(resolution.unit, year, field);
            }
        }
    }

    fn scan_internship_wages(&mut self, document: &dyn ReportDocument, year: i32) {
        let engine = self.engine;
        let mut state = UnitState::default();

        for index in 0..document.page_count() {
            let cursor = PageCursor { document, index };
            let Some(text) = self.read_page(&cursor) else {
                continue;
            };

            let found = engine.wages.extract(&text);
            let lookahead = if found.is_some() {
                cursor.next_page_text()
            } else {
                None
            };
            let resolution = state.adopt(self.resolver.resolve(
                &text,
                state.current,
                lookahead.as_deref(),
            ));

            let Some(found) = found else {
                continue;
            };
            let Some(resolution) = self.attribute(&cursor, resolution) else {
                continue;
            };

            debug!(
                document = document.name(),
                page = cursor.page_number(),
                pattern = found.pattern,
                "internship wage matched"
            );
            let field = RawField {
                label: "Internship Wage".to_string(),
                value: MetricValue::Wage(found.stats),
                provenance: cursor.provenance(found.quality),
            };
            self.promote(resolution.unit, year, field);
        }
    }

    fn scan_top_employers(&mut self, document: &dyn ReportDocument, year: i32) {
        let engine = self.engine;
        let mut state = EmployerScanState::default();
        let last_page = document.page_count().min(engine.config.top_employer_max_pages);

        for index in 0..last_page {
            let cursor = PageCursor { document, index };
            let Some(text) = self.read_page(&cursor) else {
                continue;
            };

            match engine.employers.scan_page(&mut state, &text) {
                ScanStep::Continue => {}
                ScanStep::Stopped => break,
                ScanStep::Found(name) => {
                    let implicit = Resolution {
                        unit: Unit::UniversityWide,
                        source: UnitSource::Implicit,
                    };
                    self.count_source(implicit.source);
                    let field = RawField {
                        label: "Top Employer".to_string(),
                        value: MetricValue::Text(name),
                        provenance: cursor.provenance(Quality::High),
                    };
                    self.promote(implicit.unit, year, field);
                    break;
                }
            }
        }
    }

    /// Unit for a page that carries data, or `None` when its data is withheld.
    fn attribute(
        &mut self,
        cursor: &PageCursor<'_>,
        resolution: Option<Resolution>,
    ) -> Option<Resolution> {
        match resolution {
            Some(resolution) => {
                debug!(
                    document = cursor.document.name(),
                    page = cursor.page_number(),
                    unit = resolution.unit.name(),
                    source = resolution.source.as_str(),
                    "unit resolved"
                );
                self.count_source(resolution.source);
                Some(resolution)
            }
            None => {
                let err = ExtractError::UnresolvedUnit {
                    document: cursor.document.name().to_string(),
                    page: cursor.page_number(),
                };
                warn!(report = self.kind.as_str(), error = %err, "page data withheld");
                self.counts.unresolved_unit_page_count += 1;
                self.warnings.push(err.to_string());
                None
            }
        }
    }

    fn count_source(&mut self, source: UnitSource) {
        *self
            .counts
            .unit_sources
            .entry(source.as_str().to_string())
            .or_insert(0) += 1;
    }

    fn promote(&mut self, unit: Unit, year: i32, field: RawField) {
        self.counts.raw_field_count += 1;

        let Some((category, rule)) = classify(self.kind, &field.label) else {
            let err = ExtractError::AmbiguousValue {
                value: field.label.clone(),
                reason: "label matches no taxonomy rule".to_string(),
            };
            debug!(report = self.kind.as_str(), error = %err, "raw field dropped");
            self.counts.unrecognized_label_count += 1;
            return;
        };

        let promotion = self.store.promote(CanonicalRecord {
            unit,
            year,
            category,
            raw_label: field.label,
            value: field.value,
            provenance: field.provenance,
        });
        debug!(
            unit = unit.name(),
            year,
            category = category.label(),
            rule,
            promotion = ?promotion,
            "raw field promoted"
        );
    }
}
