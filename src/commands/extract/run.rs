use std::collections::BTreeSet;
use std::process::Command;

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::info;

use crate::cli::{ExtractArgs, ReportKind};
use crate::commands::inventory::{discover_pdfs, file_name_of};
use crate::model::{ExtractPaths, ExtractRunManifest, ReportOutput, ToolVersions};
use crate::util::{ensure_directory, now_utc_string, utc_compact_string, write_json_pretty};

use super::config::ExtractConfig;
use super::document::PdftotextDocument;
use super::grid::OutputGrid;
use super::pipeline::ExtractionEngine;
use super::store::{DB_SCHEMA_VERSION, default_db_path, open_record_store, replace_report_records};

pub fn run(args: ExtractArgs) -> Result<()> {
    let started_ts = Utc::now();
    let started_at = now_utc_string();
    let run_id = format!("run-{}", utc_compact_string(started_ts));

    let manifest_dir = args.cache_root.join("manifests");
    ensure_directory(&manifest_dir)?;
    ensure_directory(&args.output_dir)?;
    let run_manifest_path = manifest_dir.join(format!(
        "extract_run_{}.json",
        utc_compact_string(started_ts)
    ));
    let db_path = args
        .db_path
        .clone()
        .unwrap_or_else(|| default_db_path(&args.cache_root));

    let kinds = selected_kinds(&args.reports);
    info!(
        reports_dir = %args.reports_dir.display(),
        run_id = %run_id,
        reports = %kinds.iter().map(|kind| kind.as_str()).collect::<Vec<&str>>().join(","),
        "starting extract"
    );

    let config = ExtractConfig::load(args.config.as_deref())
        .context("failed to load extract configuration")?;
    let engine = ExtractionEngine::new(config)?;
    let mut sessions = kinds
        .iter()
        .map(|kind| engine.session(*kind))
        .collect::<Result<Vec<_>>>()?;
    let with_tables = kinds.iter().any(|kind| kind.uses_tables());

    let pdf_paths = discover_pdfs(&args.reports_dir)?;
    for path in &pdf_paths {
        let name = file_name_of(path);

        let mut pending = Vec::new();
        for (slot, session) in sessions.iter_mut().enumerate() {
            if let Some(year) = session.begin_document(&name) {
                pending.push((slot, year));
            }
        }
        if pending.is_empty() {
            continue;
        }

        let document = match PdftotextDocument::open(path, args.max_pages_per_doc, with_tables) {
            Ok(document) => document,
            Err(err) => {
                for (slot, _) in &pending {
                    sessions[*slot].document_failed(&name, &err);
                }
                continue;
            }
        };

        for (slot, year) in pending {
            sessions[slot].process_document(&document, year);
        }
        info!(document = %name, "document processed");
    }

    let mut connection = open_record_store(&db_path)?;
    let mut outputs = Vec::with_capacity(sessions.len());
    let mut warnings = BTreeSet::new();

    for mut session in sessions {
        let kind = session.kind();
        let grid = OutputGrid::assemble(kind, &session.store);
        let output_path = args.output_dir.join(kind.output_file_name());
        grid.write_csv(&output_path)?;

        let stored = replace_report_records(&mut connection, kind, &run_id, &session.store)?;
        session.counts.grid_row_count = grid.rows.len();

        info!(
            report = kind.as_str(),
            path = %output_path.display(),
            rows = grid.rows.len(),
            records = stored,
            skipped_documents = session.counts.skipped_document_count,
            failed_pages = session.counts.failed_page_count,
            "wrote report"
        );

        warnings.extend(session.warnings);
        outputs.push(ReportOutput {
            report: kind.as_str().to_string(),
            output_path: output_path.display().to_string(),
            years: session.store.years(),
            counts: session.counts,
        });
    }

    let manifest = ExtractRunManifest {
        manifest_version: 1,
        run_id,
        db_schema_version: DB_SCHEMA_VERSION.to_string(),
        status: "completed".to_string(),
        started_at,
        updated_at: now_utc_string(),
        command: render_extract_command(&args, &kinds),
        tool_versions: collect_tool_versions(),
        paths: ExtractPaths {
            reports_dir: args.reports_dir.display().to_string(),
            output_dir: args.output_dir.display().to_string(),
            manifest_dir: manifest_dir.display().to_string(),
            db_path: db_path.display().to_string(),
            config_path: args.config.as_ref().map(|path| path.display().to_string()),
        },
        outputs,
        warnings: warnings.into_iter().collect(),
    };

    write_json_pretty(&run_manifest_path, &manifest)?;
    info!(path = %run_manifest_path.display(), "wrote extract run manifest");
    info!(documents = pdf_paths.len(), "extract completed");

    Ok(())
}

/// Requested kinds in canonical order; all of them when none were named.
fn selected_kinds(requested: &[ReportKind]) -> Vec<ReportKind> {
    if requested.is_empty() {
        return ReportKind::ALL.to_vec();
    }
    requested
        .iter()
        .copied()
        .collect::<BTreeSet<ReportKind>>()
        .into_iter()
        .collect()
}

fn render_extract_command(args: &ExtractArgs, kinds: &[ReportKind]) -> String {
    let mut command = vec![
        "survey-extract".to_string(),
        "extract".to_string(),
        "--reports-dir".to_string(),
        args.reports_dir.display().to_string(),
        "--output-dir".to_string(),
        args.output_dir.display().to_string(),
    ];
    for kind in kinds {
        command.push("--report".to_string());
        command.push(kind.as_str().to_string());
    }
    if let Some(config) = &args.config {
        command.push("--config".to_string());
        command.push(config.display().to_string());
    }
    if let Some(max_pages) = args.max_pages_per_doc {
        command.push("--max-pages-per-doc".to_string());
        command.push(max_pages.to_string());
    }
    command.join(" ")
}

fn collect_tool_versions() -> ToolVersions {
    ToolVersions {
        engine: format!("survey-extract {}", env!("CARGO_PKG_VERSION")),
        pdftotext: command_version_optional("pdftotext", &["-v"])
            .unwrap_or_else(|| "unavailable".to_string()),
    }
}

fn command_version_optional(program: &str, args: &[&str]) -> Option<String> {
    let output = Command::new(program).args(args).output().ok()?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    let source = if stdout.trim().is_empty() {
        stderr.trim()
    } else {
        stdout.trim()
    };

    source
        .lines()
        .next()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| line.to_string())
}
