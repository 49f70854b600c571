//! Transaction filters
//!
//! Parses `account`, `transaction_category`, `start` and `end` query
//! parameters. All parsing happens before any query runs.

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Utc};
use serde::Deserialize;

use crate::domain::AccountId;

use super::predicate::TimestampRange;

/// Accepted calendar date layouts, tried in order
const DATE_INPUT_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y"];

/// Years a filter date may fall in
const YEAR_RANGE: std::ops::RangeInclusive<i32> = 1..=9999;

/// Raw query string of `GET /transactions/`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransactionQueryParams {
    #[serde(default)]
    pub account: Option<String>,
    #[serde(default)]
    pub transaction_category: Option<String>,
    #[serde(default)]
    pub start: Option<String>,
    #[serde(default)]
    pub end: Option<String>,
    #[serde(default)]
    pub ordering: Option<String>,
    #[serde(default)]
    pub cursor: Option<String>,
}

/// Filter parsing errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FilterError {
    #[error("{field}: Enter a valid date (got '{value}').")]
    InvalidDate { field: &'static str, value: String },

    #[error("account: Enter a whole number (got '{0}').")]
    InvalidAccount(String),

    #[error("account: Select a valid choice. {0} is not one of the available choices.")]
    UnknownAccount(AccountId),
}

/// Validated transaction filter. Every present field narrows with AND.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionFilter {
    pub account_id: Option<AccountId>,
    pub category: Option<String>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl TransactionFilter {
    /// Parse raw parameters; blank values count as absent.
    pub fn parse(params: &TransactionQueryParams) -> Result<Self, FilterError> {
        let account_id = match present(&params.account) {
            Some(raw) => Some(
                raw.parse::<AccountId>()
                    .map_err(|_| FilterError::InvalidAccount(raw.to_string()))?,
            ),
            None => None,
        };

        let start = present(&params.start)
            .map(|raw| parse_date("start", raw))
            .transpose()?;
        let end = present(&params.end)
            .map(|raw| parse_date("end", raw))
            .transpose()?;

        Ok(Self {
            account_id,
            category: present(&params.transaction_category).map(str::to_string),
            start,
            end,
        })
    }

    /// Timestamp bounds: `start` from midnight, `end` through the whole day
    pub fn timestamp_range(&self) -> TimestampRange {
        TimestampRange {
            from: self.start.map(start_of_day),
            until: self.end.and_then(|date| date.succ_opt()).map(start_of_day),
        }
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Calendar dates outside years 1..=9999 are rejected; the day after `end`
/// and every bound handed to the store stay representable.
fn parse_date(field: &'static str, raw: &str) -> Result<NaiveDate, FilterError> {
    DATE_INPUT_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(raw, format).ok())
        .filter(|date| YEAR_RANGE.contains(&date.year()))
        .ok_or_else(|| FilterError::InvalidDate {
            field,
            value: raw.to_string(),
        })
}

fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}
