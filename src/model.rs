use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportEntry {
    pub filename: String,
    pub year: Option<i32>,
    pub sha256: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportInventoryManifest {
    pub manifest_version: u32,
    pub generated_at: String,
    pub source_directory: String,
    pub pdf_count: usize,
    pub unresolved_year_count: usize,
    pub reports: Vec<ReportEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ToolVersions {
    pub engine: String,
    pub pdftotext: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExtractPaths {
    pub reports_dir: String,
    pub output_dir: String,
    pub manifest_dir: String,
    pub db_path: String,
    pub config_path: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ExtractCounts {
    pub document_count: usize,
    pub processed_document_count: usize,
    pub skipped_document_count: usize,
    pub page_count: usize,
    pub failed_page_count: usize,
    pub raw_field_count: usize,
    pub unrecognized_label_count: usize,
    pub unresolved_unit_page_count: usize,
    pub canonical_record_count: usize,
    pub grid_row_count: usize,
    pub unit_sources: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportOutput {
    pub report: String,
    pub output_path: String,
    pub years: Vec<i32>,
    pub counts: ExtractCounts,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExtractRunManifest {
    pub manifest_version: u32,
    pub run_id: String,
    pub db_schema_version: String,
    pub status: String,
    pub started_at: String,
    pub updated_at: String,
    pub command: String,
    pub tool_versions: ToolVersions,
    pub paths: ExtractPaths,
    pub outputs: Vec<ReportOutput>,
    pub warnings: Vec<String>,
}
