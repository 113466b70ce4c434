//! Literal values in filter expressions.

use crate::key::Key;
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use std::fmt;

/// A value compared against a field in a filter.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Int(i64),
    Float(f64),
    Bool(bool),
    Date(NaiveDate),
    Str(String),
}

impl FilterValue {
    /// Render the value in the service's filter grammar.
    ///
    /// Strings are wrapped in double quotes as-is; embedded quotes are not
    /// escaped.
    pub fn to_literal(&self) -> String {
        match self {
            FilterValue::Int(n) => n.to_string(),
            FilterValue::Float(n) => n.to_string(),
            FilterValue::Bool(true) => "'true'".to_string(),
            FilterValue::Bool(false) => "'false'".to_string(),
            FilterValue::Date(d) => format!("date({}, {}, {})", d.year(), d.month(), d.day()),
            FilterValue::Str(s) => format!("\"{s}\""),
        }
    }
}

impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_literal())
    }
}

impl From<i64> for FilterValue {
    fn from(n: i64) -> Self {
        FilterValue::Int(n)
    }
}

impl From<i32> for FilterValue {
    fn from(n: i32) -> Self {
        FilterValue::Int(n.into())
    }
}

impl From<u32> for FilterValue {
    fn from(n: u32) -> Self {
        FilterValue::Int(n.into())
    }
}

impl From<f64> for FilterValue {
    fn from(n: f64) -> Self {
        FilterValue::Float(n)
    }
}

impl From<bool> for FilterValue {
    fn from(b: bool) -> Self {
        FilterValue::Bool(b)
    }
}

impl From<NaiveDate> for FilterValue {
    fn from(d: NaiveDate) -> Self {
        FilterValue::Date(d)
    }
}

impl From<NaiveDateTime> for FilterValue {
    fn from(dt: NaiveDateTime) -> Self {
        FilterValue::Date(dt.date())
    }
}

impl From<&str> for FilterValue {
    fn from(s: &str) -> Self {
        FilterValue::Str(s.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(s: String) -> Self {
        FilterValue::Str(s)
    }
}

impl From<&String> for FilterValue {
    fn from(s: &String) -> Self {
        FilterValue::Str(s.clone())
    }
}

impl From<Key> for FilterValue {
    fn from(key: Key) -> Self {
        match key {
            Key::Int(n) => FilterValue::Int(n),
            Key::Str(s) => FilterValue::Str(s),
        }
    }
}

impl From<&Key> for FilterValue {
    fn from(key: &Key) -> Self {
        key.clone().into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literals() {
        assert_eq!(FilterValue::from(99).to_literal(), "99");
        assert_eq!(FilterValue::from(2.5).to_literal(), "2.5");
        assert_eq!(FilterValue::from(true).to_literal(), "'true'");
        assert_eq!(FilterValue::from(false).to_literal(), "'false'");
        assert_eq!(FilterValue::from("99999").to_literal(), "\"99999\"");
    }

    #[test]
    fn test_date_literal() {
        let date = NaiveDate::from_ymd_opt(2016, 2, 1).unwrap();
        assert_eq!(FilterValue::from(date).to_literal(), "date(2016, 2, 1)");

        let dt = date.and_hms_opt(13, 45, 0).unwrap();
        assert_eq!(FilterValue::from(dt).to_literal(), "date(2016, 2, 1)");
    }

    #[test]
    fn test_quotes_are_not_escaped() {
        assert_eq!(FilterValue::from("6\" pipe").to_literal(), "\"6\" pipe\"");
    }
}
