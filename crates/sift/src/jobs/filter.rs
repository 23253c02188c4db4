//! Filter: store-agnostic query expressions over [`EventRecord`]s.
//!
//! Store implementations translate a [`Filter`] into their own query
//! language; [`Filter::matches`] is the reference semantics.

use chrono::{DateTime, Utc};

use super::model::{EventRecord, Severity};
use crate::pattern::{Pattern, PatternError};

/// Queryable text fields of an event record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Worker,
    Severity,
    Class,
    Message,
    File,
    JobType,
}

impl Field {
    /// Store field name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Worker => "worker",
            Field::Severity => "sev",
            Field::Class => "class",
            Field::Message => "message",
            Field::File => "file",
            Field::JobType => "job_type",
        }
    }

    pub fn value<'r>(&self, record: &'r EventRecord) -> Option<&'r str> {
        match self {
            Field::Worker => Some(&record.worker),
            Field::Severity => Some(record.severity.as_str()),
            Field::Class => Some(&record.class),
            Field::Message => Some(&record.message),
            Field::File => Some(&record.file),
            Field::JobType => record.job_type.as_deref(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum Filter {
    /// Matches every record
    All,
    And(Vec<Filter>),
    Or(Vec<Filter>),
    Eq(Field, String),
    NotIn(Field, Vec<String>),
    Regex(Field, Pattern),
    /// Inclusive on both ends
    TimeRange {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
}

impl Filter {
    pub fn eq(field: Field, value: impl Into<String>) -> Self {
        Filter::Eq(field, value.into())
    }

    pub fn regex(field: Field, pattern: &str) -> Result<Self, PatternError> {
        Ok(Filter::Regex(field, Pattern::new(pattern)?))
    }

    pub fn severity_in(severities: &[Severity]) -> Self {
        Filter::Or(
            severities
                .iter()
                .map(|sev| Filter::eq(Field::Severity, sev.as_str()))
                .collect(),
        )
    }

    pub fn matches(&self, record: &EventRecord) -> bool {
        match self {
            Filter::All => true,
            Filter::And(filters) => filters.iter().all(|f| f.matches(record)),
            Filter::Or(filters) => filters.iter().any(|f| f.matches(record)),
            Filter::Eq(field, value) => field.value(record) == Some(value.as_str()),
            Filter::NotIn(field, values) => match field.value(record) {
                Some(v) => !values.iter().any(|excluded| excluded == v),
                None => true,
            },
            Filter::Regex(field, pattern) => field.value(record).is_some_and(|v| pattern.is_match(v)),
            Filter::TimeRange { start, end } => *start <= record.timestamp && record.timestamp <= *end,
        }
    }
}
