use thiserror::Error;

/// Per-page and per-document failures. None of these abort a batch; they are
/// logged, counted in the run manifest, and the offending data is withheld.
#[derive(Debug, Error)]
pub(crate) enum ExtractError {
    #[error("no organizational unit resolved for '{document}' page {page}")]
    UnresolvedUnit { document: String, page: usize },
    #[error("cannot derive a report year from '{0}'")]
    UnresolvedYear(String),
    #[error("section '{section}' not found on page {page}")]
    NoSectionFound { section: &'static str, page: usize },
    #[error("extraction failed for '{document}': {reason}")]
    ExtractionFailure { document: String, reason: String },
    #[error("value '{value}' rejected: {reason}")]
    AmbiguousValue { value: String, reason: String },
}

impl ExtractError {
    pub(super) fn kind(&self) -> &'static str {
        match self {
            Self::UnresolvedUnit { .. } => "unresolved_unit",
            Self::UnresolvedYear(_) => "unresolved_year",
            Self::NoSectionFound { .. } => "no_section_found",
            Self::ExtractionFailure { .. } => "extraction_failure",
            Self::AmbiguousValue { .. } => "ambiguous_value",
        }
    }
}
