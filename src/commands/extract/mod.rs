mod config;
mod document;
mod error;
mod grid;
mod lexicon;
mod outcomes_table;
mod pipeline;
mod records;
mod run;
mod section_parser;
mod store;
mod table_scorer;
mod taxonomy;
#[cfg(test)]
mod tests;
mod top_employers;
mod unit_resolver;
mod units;
mod wage_cascade;
mod year;

pub use run::run;
pub(crate) use store::{default_db_path, record_counts};
pub(crate) use year::YearPatterns;
