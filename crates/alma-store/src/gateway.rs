// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde_json::Value;

/// One row as the backend sees it: a JSON object keyed by column name.
/// `id` is present on everything the gateway hands back.
pub type Row = serde_json::Map<String, Value>;

/// Entity tables the portal is allowed to touch.
pub const TABLES: &[&str] = &[
    "students",
    "fees",
    "books",
    "book_issuances",
    "courses",
    "timetable",
    "credit_awards",
    "companies",
    "placement_drives",
    "announcements",
    "rooms",
    "room_allocations",
];

/// Server-side equality constraints for `list`, e.g. a student scoping
/// fee rows to their own `student_id`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ListFilter {
    equals: Vec<(String, Value)>,
}

impl ListFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.equals.push((field.to_owned(), value.into()));
        self
    }

    pub fn equals(&self) -> &[(String, Value)] {
        &self.equals
    }

    pub fn is_empty(&self) -> bool {
        self.equals.is_empty()
    }
}

/// A remote call failed. Every variant is recoverable: the screen reports
/// it and keeps its current collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// Transport-level failure; the backend was never reached.
    Connection(String),
    /// Authenticated but not allowed.
    Denied(String),
    /// The row (or table) does not exist on the backend.
    NotFound { table: String, id: i64 },
    /// The backend refused the mutation (constraint, bad payload).
    Rejected(String),
    /// The backend answered with something this client cannot decode.
    Decode(String),
}

impl std::fmt::Display for GatewayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Connection(message) => write!(f, "cannot reach the backend: {message}"),
            Self::Denied(message) => write!(f, "not permitted: {message}"),
            Self::NotFound { table, id } => write!(f, "no row {id} in {table}"),
            Self::Rejected(message) => write!(f, "backend rejected the request: {message}"),
            Self::Decode(message) => write!(f, "unreadable backend response: {message}"),
        }
    }
}

impl std::error::Error for GatewayError {}

/// The four-operation boundary every screen talks through. Implementations
/// must be safe to share across the UI thread and its gateway workers.
pub trait Gateway: Send + Sync {
    fn list(&self, table: &str, filter: &ListFilter) -> Result<Vec<Row>, GatewayError>;
    fn insert(&self, table: &str, row: Row) -> Result<Row, GatewayError>;
    fn update(&self, table: &str, id: i64, patch: Row) -> Result<Row, GatewayError>;
    fn delete(&self, table: &str, id: i64) -> Result<(), GatewayError>;
}

pub fn is_known_table(table: &str) -> bool {
    TABLES.contains(&table)
}

#[cfg(test)]
mod tests {
    use super::{GatewayError, ListFilter, is_known_table};

    #[test]
    fn list_filter_accumulates_constraints() {
        let filter = ListFilter::new().eq("student_id", 7).eq("category", "tuition");
        assert_eq!(filter.equals().len(), 2);
        assert!(!filter.is_empty());
        assert!(ListFilter::new().is_empty());
    }

    #[test]
    fn known_tables_cover_the_portal() {
        assert!(is_known_table("fees"));
        assert!(is_known_table("book_issuances"));
        assert!(!is_known_table("grades"));
    }

    #[test]
    fn errors_render_with_context() {
        let error = GatewayError::NotFound {
            table: "fees".to_owned(),
            id: 9,
        };
        assert_eq!(error.to_string(), "no row 9 in fees");
    }
}
