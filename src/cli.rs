use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(
    name = "survey-extract",
    version,
    about = "Graduation survey report metric extraction"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Inventory(InventoryArgs),
    Extract(ExtractArgs),
    Status(StatusArgs),
}

#[derive(Args, Debug, Clone)]
pub struct InventoryArgs {
    #[arg(long, default_value = "GraduationSurveyReports")]
    pub reports_dir: PathBuf,

    #[arg(long, default_value = ".cache/survey-extract")]
    pub cache_root: PathBuf,

    #[arg(long)]
    pub manifest_path: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    pub dry_run: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ExtractArgs {
    #[arg(long, default_value = "GraduationSurveyReports")]
    pub reports_dir: PathBuf,

    #[arg(long, default_value = ".cache/survey-extract")]
    pub cache_root: PathBuf,

    #[arg(long, default_value = ".")]
    pub output_dir: PathBuf,

    #[arg(long = "report", value_enum)]
    pub reports: Vec<ReportKind>,

    #[arg(long)]
    pub config: Option<PathBuf>,

    #[arg(long)]
    pub db_path: Option<PathBuf>,

    #[arg(long)]
    pub max_pages_per_doc: Option<usize>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, ValueEnum)]
pub enum ReportKind {
    Outcomes,
    EmploymentSearch,
    InternshipWage,
    TopEmployers,
}

impl ReportKind {
    pub const ALL: [ReportKind; 4] = [
        Self::Outcomes,
        Self::EmploymentSearch,
        Self::InternshipWage,
        Self::TopEmployers,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Outcomes => "outcomes",
            Self::EmploymentSearch => "employment-search",
            Self::InternshipWage => "internship-wage",
            Self::TopEmployers => "top-employers",
        }
    }

    pub fn output_file_name(self) -> &'static str {
        match self {
            Self::Outcomes => "graduate_outcomes.csv",
            Self::EmploymentSearch => "employment_search.csv",
            Self::InternshipWage => "internship_wage.csv",
            Self::TopEmployers => "top_employers.csv",
        }
    }

    /// Whether this kind needs the table layer from the extractor.
    pub fn uses_tables(self) -> bool {
        matches!(self, Self::Outcomes)
    }
}

#[derive(Args, Debug, Clone)]
pub struct StatusArgs {
    #[arg(long, default_value = ".cache/survey-extract")]
    pub cache_root: PathBuf,

    #[arg(long)]
    pub db_path: Option<PathBuf>,
}
