// src/edgar/models.rs
use crate::utils::error::EdgarError;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

/// One row of a browse-edgar search-results page, pointing at the filing's
/// "Filing Detail" page. Search results arrive in time-descending order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilingSummary {
    pub filing_type: String,
    pub description: String,
    pub filing_date: String,
    pub filing_number: String,
    pub detail_url: String,
}

// Filing dates show up in several shapes across older pages.
const DATE_FORMATS: &[&str] = &["%Y/%m/%d", "%Y-%m-%d", "%d.%m.%Y"];
const DATETIME_FORMATS: &[&str] = &["%Y/%m/%d %H:%M:%S", "%Y-%m-%d %H:%M:%S", "%d.%m.%y %H:%M:%S"];

/// Parses a filing date, trying each known format in turn.
pub fn parse_filing_date(text: &str) -> Result<NaiveDateTime, EdgarError> {
    let text = text.trim();
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, fmt) {
            return Ok(date.and_time(NaiveTime::MIN));
        }
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(text, fmt) {
            return Ok(datetime);
        }
    }
    Err(EdgarError::Parse(format!(
        "no valid date format found for '{text}'"
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_the_supported_date_shapes() {
        for text in ["2006/05/10", "2006-05-10", "10.05.2006"] {
            let parsed = parse_filing_date(text).unwrap();
            assert_eq!(parsed.date().to_string(), "2006-05-10");
        }
        assert!(parse_filing_date("2006/05/10 13:45:00").is_ok());
        assert!(parse_filing_date("May 10, 2006").is_err());
    }

    #[test]
    fn date_only_values_parse_to_midnight() {
        let parsed = parse_filing_date(" 2006/05/10 ").unwrap();
        assert_eq!(parsed.time().to_string(), "00:00:00");
    }
}
