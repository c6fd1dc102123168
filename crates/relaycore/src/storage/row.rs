//! Column-name keyed result rows returned by the storage collaborator

use chrono::NaiveDateTime;
use rusqlite::types::Value;
use std::collections::HashMap;

/// SQLite's `CURRENT_TIMESTAMP` text format
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One result row, keyed by column name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    values: HashMap<String, Value>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, mostly for assembling rows in tests.
    pub fn with(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.insert(column, value.into());
        self
    }

    pub fn insert(&mut self, column: &str, value: Value) {
        self.values.insert(column.to_string(), value);
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.values.get(column)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Column as text. Numbers are rendered; NULL and blobs are `None`.
    pub fn text(&self, column: &str) -> Option<String> {
        match self.values.get(column)? {
            Value::Text(s) => Some(s.clone()),
            Value::Integer(i) => Some(i.to_string()),
            Value::Real(f) => Some(f.to_string()),
            Value::Null | Value::Blob(_) => None,
        }
    }

    /// Column as integer. Numeric text is parsed; anything else is `None`.
    pub fn int(&self, column: &str) -> Option<i64> {
        match self.values.get(column)? {
            Value::Integer(i) => Some(*i),
            Value::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Column as boolean: non-zero integers, or text "true"/"1".
    pub fn bool(&self, column: &str) -> Option<bool> {
        match self.values.get(column)? {
            Value::Integer(i) => Some(*i != 0),
            Value::Text(s) => Some(s.eq_ignore_ascii_case("true") || s == "1"),
            _ => None,
        }
    }

    pub fn timestamp(&self, column: &str) -> Option<NaiveDateTime> {
        let raw = self.text(column)?;
        NaiveDateTime::parse_from_str(&raw, TIMESTAMP_FORMAT).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_accessors() {
        let row = Row::new()
            .with("n", 42i64)
            .with("s", "17".to_string())
            .with("flag", 1i64)
            .with("word", "TRUE".to_string())
            .with("ts", "2024-03-01 12:30:00".to_string())
            .with("nothing", Value::Null);

        assert_eq!(row.int("n"), Some(42));
        assert_eq!(row.int("s"), Some(17));
        assert_eq!(row.text("n").as_deref(), Some("42"));
        assert_eq!(row.bool("flag"), Some(true));
        assert_eq!(row.bool("word"), Some(true));
        assert_eq!(row.text("nothing"), None);
        assert_eq!(row.int("missing"), None);
        assert!(row.timestamp("ts").is_some());
        assert_eq!(row.len(), 6);
    }
}
