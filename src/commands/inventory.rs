use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use tracing::{info, warn};

use crate::cli::InventoryArgs;
use crate::commands::extract::YearPatterns;
use crate::model::{ReportEntry, ReportInventoryManifest};
use crate::util::{now_utc_string, sha256_file, write_json_pretty};

pub fn run(args: InventoryArgs) -> Result<()> {
    let manifest = build_manifest(&args.reports_dir)?;

    if args.dry_run {
        info!(
            pdf_count = manifest.pdf_count,
            unresolved_year_count = manifest.unresolved_year_count,
            source = %manifest.source_directory,
            "inventory dry-run complete"
        );
        return Ok(());
    }

    let manifest_path = args
        .manifest_path
        .unwrap_or_else(|| default_manifest_path(&args.cache_root));

    write_json_pretty(&manifest_path, &manifest)?;
    info!(path = %manifest_path.display(), "wrote inventory manifest");
    info!(
        pdf_count = manifest.pdf_count,
        unresolved_year_count = manifest.unresolved_year_count,
        "inventory completed"
    );

    Ok(())
}

pub fn default_manifest_path(cache_root: &Path) -> PathBuf {
    cache_root.join("manifests").join("report_inventory.json")
}

pub fn build_manifest(reports_dir: &Path) -> Result<ReportInventoryManifest> {
    let years = YearPatterns::new()?;
    let pdf_paths = discover_pdfs(reports_dir)?;

    let mut reports = Vec::with_capacity(pdf_paths.len());
    for path in pdf_paths {
        let filename = file_name_of(&path);
        let year = match years.report_year(&filename) {
            Ok(year) => Some(year),
            Err(err) => {
                warn!(filename = %filename, error = %err, "report year unresolved");
                None
            }
        };
        let sha256 = match sha256_file(&path) {
            Ok(sha256) => sha256,
            Err(err) => {
                warn!(filename = %filename, error = %format!("{err:#}"), "skipping unreadable PDF");
                continue;
            }
        };

        reports.push(ReportEntry {
            filename,
            year,
            sha256,
        });
    }

    reports.sort_by(|a, b| a.year.cmp(&b.year).then(a.filename.cmp(&b.filename)));
    let unresolved_year_count = reports.iter().filter(|entry| entry.year.is_none()).count();

    Ok(ReportInventoryManifest {
        manifest_version: 1,
        generated_at: now_utc_string(),
        source_directory: reports_dir.display().to_string(),
        pdf_count: reports.len(),
        unresolved_year_count,
        reports,
    })
}

/// Display name of a report file; non-UTF-8 bytes are replaced, never rejected.
pub fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// `*.pdf` files directly inside `reports_dir`, sorted by path. Entries that
/// cannot be read are logged and skipped.
pub fn discover_pdfs(reports_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut pdfs = Vec::new();

    let entries = fs::read_dir(reports_dir)
        .with_context(|| format!("failed to read {}", reports_dir.display()))?;

    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!(dir = %reports_dir.display(), error = %err, "skipping unreadable entry");
                continue;
            }
        };
        let path = entry.path();

        match entry.file_type() {
            Ok(file_type) if file_type.is_file() => {}
            Ok(_) => continue,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "skipping entry with unknown file type");
                continue;
            }
        }

        let is_pdf = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));

        if is_pdf {
            pdfs.push(path);
        }
    }

    if pdfs.is_empty() {
        bail!("no PDFs found in {}", reports_dir.display());
    }

    pdfs.sort();
    Ok(pdfs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manifest_lists_pdfs_with_years_and_hashes() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("2019 Graduation Survey.pdf"), b"a").expect("write");
        fs::write(dir.path().join("Survey 2016-2017.PDF"), b"b").expect("write");
        fs::write(dir.path().join("cover letter.pdf"), b"c").expect("write");
        fs::write(dir.path().join("notes.txt"), b"d").expect("write");

        let manifest = build_manifest(dir.path()).expect("manifest");
        assert_eq!(manifest.pdf_count, 3);
        assert_eq!(manifest.unresolved_year_count, 1);
        assert_eq!(manifest.reports[0].year, None);
        assert_eq!(manifest.reports[1].year, Some(2017));
        assert_eq!(manifest.reports[2].year, Some(2019));
        assert_eq!(manifest.reports[2].sha256.len(), 64);
    }

    #[cfg(unix)]
    #[test]
    fn non_utf8_filename_is_listed_with_a_lossy_name() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("2019 report.pdf"), b"a").expect("write");
        fs::write(dir.path().join(OsStr::from_bytes(b"2020 \xff report.pdf")), b"b")
            .expect("write");

        let manifest = build_manifest(dir.path()).expect("manifest");
        assert_eq!(manifest.pdf_count, 2);
        assert_eq!(manifest.reports[1].year, Some(2020));
        assert!(manifest.reports[1].filename.contains('\u{FFFD}'));
    }

    #[test]
    fn empty_directory_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(discover_pdfs(dir.path()).is_err());
    }
}
