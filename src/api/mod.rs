pub mod pagination;

pub use pagination::{ListResponse, PageMeta, PageQuery, Pagination};

use serde::{Deserialize, Deserializer};

use crate::error::ApiError;

/// Sort direction for list endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_sql(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// Validate an HH:MM wall-clock time without pulling in a regex engine
pub fn is_hhmm(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.len() == 5
        && bytes[2] == b':'
        && bytes.iter().enumerate().all(|(i, b)| i == 2 || b.is_ascii_digit())
}

/// Schedule and reminder dose times must all be HH:MM strings
pub fn validate_times(times: &[String]) -> Result<(), ApiError> {
    if let Some(bad) = times.iter().find(|t| !is_hhmm(t)) {
        return Err(ApiError::bad_request(format!("Invalid schedule time: {}", bad)));
    }
    Ok(())
}

/// Days are 0 = Sunday .. 6 = Saturday; None means every day
pub fn validate_days_of_week(days: &Option<Vec<i32>>) -> Result<(), ApiError> {
    if let Some(days) = days {
        if days.iter().any(|d| !(0..=6).contains(d)) {
            return Err(ApiError::bad_request("daysOfWeek entries must be 0-6"));
        }
    }
    Ok(())
}

/// Deserialize a field where absence and explicit null mean different
/// things: absent stays `None`, `null` becomes `Some(None)`.
/// Use with `#[serde(default, deserialize_with = "double_option")]`.
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Patch {
        #[serde(default, deserialize_with = "double_option")]
        end_date: Option<Option<i64>>,
    }

    #[test]
    fn absent_field_stays_none() {
        let p: Patch = serde_json::from_str("{}").unwrap();
        assert_eq!(p.end_date, None);
    }

    #[test]
    fn explicit_null_clears() {
        let p: Patch = serde_json::from_str(r#"{"end_date":null}"#).unwrap();
        assert_eq!(p.end_date, Some(None));
    }

    #[test]
    fn value_sets() {
        let p: Patch = serde_json::from_str(r#"{"end_date":42}"#).unwrap();
        assert_eq!(p.end_date, Some(Some(42)));
    }

    #[test]
    fn hhmm_validation() {
        assert!(is_hhmm("08:30"));
        assert!(is_hhmm("23:59"));
        assert!(!is_hhmm("8:30"));
        assert!(!is_hhmm("0830"));
        assert!(!is_hhmm("ab:cd"));
    }

    #[test]
    fn days_of_week_bounds() {
        assert!(validate_days_of_week(&Some(vec![0, 6])).is_ok());
        assert!(validate_days_of_week(&Some(vec![7])).is_err());
        assert!(validate_days_of_week(&Some(vec![-1])).is_err());
        assert!(validate_days_of_week(&None).is_ok());
    }
}
