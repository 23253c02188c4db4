//! Matchers: recognise job start/end events across server releases.
//!
//! Each matcher targets one schema era and one phase. A record is a job
//! event when any matcher accepts it; adding support for a new release means
//! appending a matcher to [`EventMatcher::standard`].

use super::filter::{Field, Filter};
use super::model::{EventRecord, JobPhase, SchemaEra};
use crate::pattern::PatternError;

/// Placeholder replaced by the escaped job type in message templates.
const JOB_TYPE_SLOT: &str = "{job_type}";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventMatcher {
    pub era: SchemaEra,
    pub phase: JobPhase,
    /// Require the dedicated job type field to equal the job type.
    pub job_type_field: bool,
    /// Message regex; may contain `{job_type}`.
    pub message: &'static str,
}

impl EventMatcher {
    pub const fn new(era: SchemaEra, phase: JobPhase, job_type_field: bool, message: &'static str) -> Self {
        Self {
            era,
            phase,
            job_type_field,
            message,
        }
    }

    /// Matchers for every supported server release.
    pub fn standard() -> Vec<EventMatcher> {
        use JobPhase::{End, Start};
        use SchemaEra::{Current, Legacy};

        vec![
            EventMatcher::new(Current, Start, true, r"^Running job of type"),
            EventMatcher::new(Legacy, Start, false, r"^Running job of type :{job_type};"),
            EventMatcher::new(Legacy, End, false, r"^Job finished: [A-Z]+; name: [A-Za-z\s]+; type :{job_type};"),
            EventMatcher::new(Current, End, true, r"^Error executing backgroundjob:"),
            EventMatcher::new(Legacy, End, false, r"^Error executing backgroundjob: :{job_type}"),
        ]
    }

    pub fn message_pattern(&self, job_type: &str) -> String {
        self.message.replace(JOB_TYPE_SLOT, &regex_syntax::escape(job_type))
    }

    pub fn to_filter(&self, job_type: &str) -> Result<Filter, PatternError> {
        let message = Filter::regex(Field::Message, &self.message_pattern(job_type))?;
        if self.job_type_field {
            Ok(Filter::And(vec![Filter::eq(Field::JobType, job_type), message]))
        } else {
            Ok(message)
        }
    }
}

/// Compiled matchers for one job type.
#[derive(Debug, Clone)]
pub struct JobEventMatchers {
    compiled: Vec<(EventMatcher, Filter)>,
}

impl JobEventMatchers {
    pub fn compile(matchers: &[EventMatcher], job_type: &str) -> Result<Self, PatternError> {
        let compiled = matchers
            .iter()
            .map(|m| Ok((m.clone(), m.to_filter(job_type)?)))
            .collect::<Result<Vec<_>, PatternError>>()?;
        Ok(Self { compiled })
    }

    /// Union of every matcher, as a store filter.
    pub fn any(&self) -> Filter {
        Filter::Or(self.compiled.iter().map(|(_, f)| f.clone()).collect())
    }

    pub fn phase_filter(&self, phase: JobPhase) -> Filter {
        Filter::Or(
            self.compiled
                .iter()
                .filter(|(m, _)| m.phase == phase)
                .map(|(_, f)| f.clone())
                .collect(),
        )
    }

    /// First matcher accepting `record`.
    pub fn classify(&self, record: &EventRecord) -> Option<&EventMatcher> {
        self.compiled
            .iter()
            .find(|(_, filter)| filter.matches(record))
            .map(|(m, _)| m)
    }

    pub fn phase_of(&self, record: &EventRecord) -> Option<JobPhase> {
        self.classify(record).map(|m| m.phase)
    }
}
