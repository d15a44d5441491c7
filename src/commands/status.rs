use anyhow::{Context, Result};
use rusqlite::{Connection, OpenFlags};
use tracing::{info, warn};

use crate::cli::StatusArgs;
use crate::commands::extract::{default_db_path, record_counts};
use crate::commands::inventory::default_manifest_path;
use crate::model::ReportInventoryManifest;
use crate::util::read_json;

pub fn run(args: StatusArgs) -> Result<()> {
    let inventory_path = default_manifest_path(&args.cache_root);
    let db_path = args
        .db_path
        .clone()
        .unwrap_or_else(|| default_db_path(&args.cache_root));

    info!(cache_root = %args.cache_root.display(), "status requested");

    if inventory_path.exists() {
        let inventory: ReportInventoryManifest = read_json(&inventory_path)?;
        let years = inventory
            .reports
            .iter()
            .filter_map(|entry| entry.year)
            .collect::<Vec<i32>>();

        info!(
            generated_at = %inventory.generated_at,
            source = %inventory.source_directory,
            pdf_count = inventory.pdf_count,
            unresolved_year_count = inventory.unresolved_year_count,
            first_year = years.iter().min().copied().unwrap_or_default(),
            last_year = years.iter().max().copied().unwrap_or_default(),
            "loaded inventory manifest"
        );
    } else {
        warn!(path = %inventory_path.display(), "inventory manifest missing");
    }

    if db_path.exists() {
        let conn = Connection::open_with_flags(&db_path, OpenFlags::SQLITE_OPEN_READ_ONLY)
            .with_context(|| format!("failed to open {}", db_path.display()))?;
        let schema_version = conn
            .query_row(
                "SELECT value FROM metadata WHERE key = 'db_schema_version'",
                [],
                |row| row.get::<_, String>(0),
            )
            .unwrap_or_default();

        match record_counts(&conn) {
            Ok(counts) => {
                for (report, records) in counts {
                    info!(
                        path = %db_path.display(),
                        schema_version = %schema_version,
                        report = report.as_str(),
                        records,
                        "record store status"
                    );
                }
            }
            Err(err) => warn!(path = %db_path.display(), error = %err, "record store unreadable"),
        }
    } else {
        warn!(path = %db_path.display(), "database file missing");
    }

    Ok(())
}
