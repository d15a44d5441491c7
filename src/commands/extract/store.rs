use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rusqlite::{Connection, params};

use crate::cli::ReportKind;
use crate::util::{ensure_parent_directory, now_utc_string};

use super::records::RecordStore;

pub(super) const DB_SCHEMA_VERSION: &str = "1";

pub(crate) fn default_db_path(cache_root: &Path) -> PathBuf {
    cache_root.join("survey_records.sqlite")
}

pub(super) fn open_record_store(db_path: &Path) -> Result<Connection> {
    ensure_parent_directory(db_path)?;
    let connection = Connection::open(db_path)
        .with_context(|| format!("failed to open {}", db_path.display()))?;
    configure_connection(&connection)?;
    ensure_schema(&connection)?;
    Ok(connection)
}

fn configure_connection(connection: &Connection) -> Result<()> {
    connection
        .pragma_update(None, "journal_mode", "WAL")
        .context("failed to set journal_mode=WAL")?;
    connection
        .pragma_update(None, "synchronous", "NORMAL")
        .context("failed to set synchronous=NORMAL")?;
    Ok(())
}

fn ensure_schema(connection: &Connection) -> Result<()> {
    connection
        .execute_batch(
            "
            CREATE TABLE IF NOT EXISTS metadata (
              key TEXT PRIMARY KEY,
              value TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS records (
              report TEXT NOT NULL,
              unit TEXT NOT NULL,
              year INTEGER NOT NULL,
              category TEXT NOT NULL,
              raw_label TEXT NOT NULL,
              value_json TEXT NOT NULL,
              document TEXT NOT NULL,
              page INTEGER NOT NULL,
              quality TEXT NOT NULL,
              run_id TEXT NOT NULL,
              PRIMARY KEY (report, unit, year, category)
            );

            CREATE INDEX IF NOT EXISTS idx_records_report_year ON records(report, year);
            ",
        )
        .context("failed to initialize record store schema")?;

    connection.execute(
        "INSERT INTO metadata(key, value) VALUES('db_schema_version', ?1)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        [DB_SCHEMA_VERSION],
    )?;
    connection.execute(
        "INSERT INTO metadata(key, value) VALUES('db_updated_at', ?1)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        [now_utc_string()],
    )?;

    Ok(())
}

/// Replaces every stored record of `report` with the contents of `store`.
pub(super) fn replace_report_records(
    connection: &mut Connection,
    report: ReportKind,
    run_id: &str,
    store: &RecordStore,
) -> Result<usize> {
    let tx = connection.transaction()?;
    tx.execute("DELETE FROM records WHERE report = ?1", [report.as_str()])
        .with_context(|| format!("failed to clear records for {}", report.as_str()))?;

    let mut inserted = 0usize;
    {
        let mut statement = tx.prepare(
            "
            INSERT INTO records(
              report, unit, year, category, raw_label, value_json,
              document, page, quality, run_id
            )
            VALUES(?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            ",
        )?;

        for record in store.records() {
            statement.execute(params![
                report.as_str(),
                record.unit.name(),
                record.year,
                record.category.label(),
                &record.raw_label,
                record.value.to_json().to_string(),
                &record.provenance.document,
                record.provenance.page as i64,
                record.provenance.quality.as_str(),
                run_id
            ])?;
            inserted += 1;
        }
    }

    tx.commit()
        .with_context(|| format!("failed to commit records for {}", report.as_str()))?;
    Ok(inserted)
}

/// Stored record count per report kind, in report order.
pub(crate) fn record_counts(connection: &Connection) -> Result<Vec<(ReportKind, i64)>> {
    ReportKind::ALL
        .iter()
        .map(|report| {
            let count = connection
                .query_row(
                    "SELECT COUNT(*) FROM records WHERE report = ?1",
                    [report.as_str()],
                    |row| row.get(0),
                )
                .with_context(|| format!("failed to count records for {}", report.as_str()))?;
            Ok((*report, count))
        })
        .collect()
}
