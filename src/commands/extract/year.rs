use anyhow::{Context, Result};
use regex::Regex;

use super::error::ExtractError;

pub(crate) struct YearPatterns {
    leading: Regex,
    range: Regex,
    any: Regex,
}

impl YearPatterns {
    pub(crate) fn new() -> Result<Self> {
        Ok(Self {
            leading: Regex::new(r"^(20\d{2})").context("failed to compile leading year regex")?,
            range: Regex::new(r"(20\d{2})\s*[-–]\s*(20\d{2})")
                .context("failed to compile year range regex")?,
            any: Regex::new(r"20\d{2}").context("failed to compile year regex")?,
        })
    }

    /// Report year from a file name: a leading year, else the later year of
    /// a range, else the largest year mentioned anywhere.
    pub(crate) fn report_year(&self, file_name: &str) -> Result<i32, ExtractError> {
        let unresolved = || ExtractError::UnresolvedYear(file_name.to_string());

        if let Some(captures) = self.leading.captures(file_name)
            && let Some(year) = captures.get(1)
        {
            return year.as_str().parse().map_err(|_| unresolved());
        }

        if let Some(captures) = self.range.captures(file_name)
            && let (Some(start), Some(end)) = (captures.get(1), captures.get(2))
        {
            let start = start.as_str().parse::<i32>().map_err(|_| unresolved())?;
            let end = end.as_str().parse::<i32>().map_err(|_| unresolved())?;
            return Ok(start.max(end));
        }

        self.any
            .find_iter(file_name)
            .filter_map(|found| found.as_str().parse::<i32>().ok())
            .max()
            .ok_or_else(unresolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn year(file_name: &str) -> Option<i32> {
        YearPatterns::new()
            .expect("patterns")
            .report_year(file_name)
            .ok()
    }

    #[test]
    fn leading_year_wins() {
        assert_eq!(year("2019 Graduation Survey 2020.pdf"), Some(2019));
    }

    #[test]
    fn academic_range_takes_the_later_year() {
        assert_eq!(year("Survey 2016-2017 Report.pdf"), Some(2017));
        assert_eq!(year("Survey 2016 – 2017.pdf"), Some(2017));
    }

    #[test]
    fn falls_back_to_largest_year_mentioned() {
        assert_eq!(year("grads_2014_rev2015.pdf"), Some(2015));
    }

    #[test]
    fn missing_year_is_an_unresolved_year_error() {
        let err = YearPatterns::new()
            .expect("patterns")
            .report_year("graduation_survey.pdf")
            .expect_err("no year");
        assert_eq!(err.kind(), "unresolved_year");
    }
}
