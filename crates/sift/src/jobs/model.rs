use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Debug,
    Info,
    Warn,
    Error,
    Fatal,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Debug => "DEBUG",
            Severity::Info => "INFO",
            Severity::Warn => "WARN",
            Severity::Error => "ERROR",
            Severity::Fatal => "FATAL",
        }
    }
}

/// One parsed log line as persisted in the event store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    #[serde(rename = "ts")]
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "sev")]
    pub severity: Severity,
    /// Source component (Java class name for server processes)
    pub class: String,
    pub message: String,
    /// Producing host
    pub worker: String,
    /// Source file name; the process id is embedded in it
    pub file: String,
    /// Dedicated job type field. Only newer servers write it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_type: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobPhase {
    Start,
    End,
}

/// Server release family whose message format a matcher understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaEra {
    /// 9.0 – 10.4: job type embedded in the message text
    Legacy,
    /// 10.5+: job type in its own field
    Current,
}

/// Correlation key of a job: events pair only within one key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JobKey {
    pub worker: String,
    pub process_id: u32,
    pub job_type: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobOutcome {
    Succeeded,
    Failed,
    /// Ended with a status other than success, or no status could be read
    Unknown,
    /// No end event observed
    Running,
}

/// A reconstructed job execution. Either side may be missing: a start without
/// an end is a job still running at the end of the capture, an end without a
/// start is a job that began before the capture window.
#[derive(Debug, Clone, PartialEq)]
pub struct JobLifecycle {
    pub key: JobKey,
    pub start: Option<EventRecord>,
    pub end: Option<EventRecord>,
}

impl JobLifecycle {
    pub fn is_complete(&self) -> bool {
        self.start.is_some() && self.end.is_some()
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.start.as_ref().map(|e| e.timestamp)
    }

    pub fn ended_at(&self) -> Option<DateTime<Utc>> {
        self.end.as_ref().map(|e| e.timestamp)
    }

    pub fn duration(&self) -> Option<Duration> {
        Some(self.ended_at()? - self.started_at()?)
    }

    /// Earliest timestamp known for this lifecycle.
    pub fn first_seen(&self) -> Option<DateTime<Utc>> {
        self.started_at().or_else(|| self.ended_at())
    }

    pub fn outcome(&self) -> JobOutcome {
        let Some(end) = &self.end else {
            return JobOutcome::Running;
        };
        if end.message.starts_with("Error executing backgroundjob") {
            JobOutcome::Failed
        } else if end.message.starts_with("Job finished: SUCCESS") {
            JobOutcome::Succeeded
        } else {
            JobOutcome::Unknown
        }
    }
}
