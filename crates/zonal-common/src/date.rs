//! Acquisition date helpers.

use chrono::NaiveDate;

use crate::error::{CommonError, CommonResult};

/// Calendar date of an image from its day, month and year fields.
pub fn acquisition_date(day: u32, month: u32, year: i32) -> CommonResult<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day).ok_or(CommonError::InvalidDate { year, month, day })
}

/// Parse an ISO `YYYY-MM-DD` date as used in column names and catalogs.
pub fn parse_catalog_date(s: &str) -> CommonResult<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|_| CommonError::InvalidDateString(s.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acquisition_date() {
        let date = acquisition_date(7, 3, 2019).unwrap();
        assert_eq!(date.to_string(), "2019-03-07");

        assert!(matches!(
            acquisition_date(30, 2, 2019),
            Err(CommonError::InvalidDate { .. })
        ));
    }

    #[test]
    fn test_parse_catalog_date() {
        assert_eq!(
            parse_catalog_date("2019-10-31").unwrap(),
            NaiveDate::from_ymd_opt(2019, 10, 31).unwrap()
        );
        assert!(parse_catalog_date("31/10/2019").is_err());
    }
}
