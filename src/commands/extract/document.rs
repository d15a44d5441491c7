use std::path::Path;
use std::process::Command;

use anyhow::{Context, Result, bail};
use regex::Regex;

/// One table as rows of cell strings.
pub(super) type Grid = Vec<Vec<String>>;

/// Page-addressable view of one report. Pages are zero-based here; callers
/// report them one-based.
pub(super) trait ReportDocument {
    fn name(&self) -> &str;
    fn page_count(&self) -> usize;
    fn page_text(&self, index: usize) -> Result<String>;
    fn page_tables(&self, index: usize) -> Result<Vec<Grid>>;
}

/// Text and layout-derived tables produced by the `pdftotext` binary.
pub(super) struct PdftotextDocument {
    name: String,
    pages: Vec<String>,
    layout_pages: Option<Vec<String>>,
    cell_split: Regex,
}

impl PdftotextDocument {
    pub(super) fn open(path: &Path, max_pages: Option<usize>, with_tables: bool) -> Result<Self> {
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());

        let pages = extract_pages_with_pdftotext(path, max_pages, false)?;
        let layout_pages = if with_tables {
            Some(extract_pages_with_pdftotext(path, max_pages, true)?)
        } else {
            None
        };

        Ok(Self {
            name,
            pages,
            layout_pages,
            cell_split: Regex::new(r"\t+|\s{2,}")
                .context("failed to compile table cell split regex")?,
        })
    }
}

impl ReportDocument for PdftotextDocument {
    fn name(&self) -> &str {
        &self.name
    }

    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_text(&self, index: usize) -> Result<String> {
        self.pages
            .get(index)
            .cloned()
            .with_context(|| format!("page {} out of range for {}", index + 1, self.name))
    }

    fn page_tables(&self, index: usize) -> Result<Vec<Grid>> {
        let Some(layout_pages) = &self.layout_pages else {
            return Ok(Vec::new());
        };
        let Some(layout) = layout_pages.get(index) else {
            return Ok(Vec::new());
        };
        Ok(grids_from_layout(&self.cell_split, layout))
    }
}

fn extract_pages_with_pdftotext(
    pdf_path: &Path,
    max_pages: Option<usize>,
    layout: bool,
) -> Result<Vec<String>> {
    let mut command = Command::new("pdftotext");
    command.arg("-enc").arg("UTF-8").arg("-f").arg("1");
    if layout {
        command.arg("-layout");
    }
    if let Some(max_pages) = max_pages {
        command.arg("-l").arg(max_pages.to_string());
    }
    command.arg(pdf_path).arg("-");

    let output = command
        .output()
        .with_context(|| format!("failed to execute pdftotext for {}", pdf_path.display()))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!(
            "pdftotext returned non-zero exit status for {}: {}",
            pdf_path.display(),
            stderr.trim()
        );
    }

    let raw = String::from_utf8_lossy(&output.stdout);
    let mut pages: Vec<String> = raw
        .split('\u{000C}')
        .map(|chunk| chunk.replace('\u{0000}', ""))
        .collect();

    while let Some(last_page) = pages.last() {
        if last_page.trim().is_empty() {
            pages.pop();
            continue;
        }
        break;
    }

    Ok(pages)
}

/// Blank-line separated blocks of a `-layout` page, split into cells on runs
/// of two or more spaces. A block is a table once two of its rows have at
/// least two cells.
fn grids_from_layout(cell_split: &Regex, layout_text: &str) -> Vec<Grid> {
    let mut grids = Vec::new();
    let mut block = Grid::new();

    for line in layout_text.lines().chain(std::iter::once("")) {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            let block_rows = std::mem::take(&mut block);
            let multi_cell_rows = block_rows.iter().filter(|row| row.len() >= 2).count();
            if multi_cell_rows >= 2 {
                grids.push(block_rows);
            }
            continue;
        }

        let cells = cell_split
            .split(trimmed)
            .map(str::trim)
            .filter(|cell| !cell.is_empty())
            .map(str::to_string)
            .collect::<Vec<String>>();
        block.push(cells);
    }

    grids
}
