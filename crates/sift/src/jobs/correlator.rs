//! Correlator: read-only job queries over a stored event collection.
//!
//! Every query is a [`Filter`] handed to an [`EventStore`]; the correlator
//! never writes. Queries race the caller's [`CancellationToken`] so a long
//! time-range scan can be abandoned from outside.

use std::collections::BTreeSet;
use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::filter::{Field, Filter};
use super::matcher::{EventMatcher, JobEventMatchers};
use super::model::{EventRecord, JobKey, JobLifecycle};
use super::pairing::{pair_job_events, TaggedEvent};
use super::store::{EventStore, SortOrder, StoreError};
use crate::conf::JobsConfig;
use crate::pattern::{Pattern, PatternError};

/// Backgrounder log file names: `backgrounder-<pid>.` or `backgrounder_node<n>-<pid>.`
const BACKGROUNDER_FILE: &str = r"^backgrounder(_node\d+)?-(\d+)\.";
const PROCESS_ID_GROUP: usize = 2;

/// Filter matching the log files written by one backgrounder process.
pub fn process_filter(process_id: u32) -> Result<Filter, PatternError> {
    Filter::regex(Field::File, &format!(r"^backgrounder(_node\d+)?-{}\.", process_id))
}

pub struct JobCorrelator<S: EventStore + ?Sized> {
    store: Arc<S>,
    config: JobsConfig,
    matchers: Vec<EventMatcher>,
    backgrounder_file: Pattern,
}

impl<S: EventStore + ?Sized> JobCorrelator<S> {
    pub fn new(store: Arc<S>, config: JobsConfig) -> Result<Self, PatternError> {
        Self::with_matchers(store, config, EventMatcher::standard())
    }

    pub fn with_matchers(
        store: Arc<S>,
        config: JobsConfig,
        matchers: Vec<EventMatcher>,
    ) -> Result<Self, PatternError> {
        Ok(Self {
            store,
            config,
            matchers,
            backgrounder_file: Pattern::new(BACKGROUNDER_FILE)?,
        })
    }

    pub fn config(&self) -> &JobsConfig {
        &self.config
    }

    /// Start and end events of `job_type` jobs run by one process, oldest first.
    pub async fn events_for_process(
        &self,
        worker: &str,
        process_id: u32,
        job_type: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<EventRecord>, StoreError> {
        let matchers = JobEventMatchers::compile(&self.matchers, job_type)?;
        let filter = Filter::And(vec![
            Filter::eq(Field::Worker, worker),
            process_filter(process_id)?,
            Filter::eq(Field::Class, self.config.runner_class.as_str()),
            Filter::severity_in(&self.config.severities),
            matchers.any(),
        ]);

        let events = cancellable(cancel, self.store.find(&filter, SortOrder::TimestampAscending, cancel)).await?;
        debug!(worker, process_id, job_type, count = events.len(), "Fetched job events");
        Ok(events)
    }

    /// Everything one process logged within `[start, end]`, minus ignored classes.
    pub async fn events_in_range(
        &self,
        worker: &str,
        process_id: u32,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        cancel: &CancellationToken,
    ) -> Result<Vec<EventRecord>, StoreError> {
        let filter = Filter::And(vec![
            Filter::eq(Field::Worker, worker),
            process_filter(process_id)?,
            Filter::TimeRange { start, end },
            Filter::NotIn(Field::Class, self.config.ignored_classes.clone()),
        ]);

        let events = cancellable(cancel, self.store.find(&filter, SortOrder::TimestampAscending, cancel)).await?;
        debug!(worker, process_id, %start, %end, count = events.len(), "Fetched events in range");
        Ok(events)
    }

    pub async fn distinct_worker_ids(&self, cancel: &CancellationToken) -> Result<Vec<String>, StoreError> {
        cancellable(cancel, self.store.distinct(Field::Worker, &Filter::All, cancel)).await
    }

    pub async fn distinct_job_types(&self, cancel: &CancellationToken) -> Result<Vec<String>, StoreError> {
        cancellable(cancel, self.store.distinct(Field::JobType, &Filter::All, cancel)).await
    }

    /// Backgrounder process ids seen for `worker`, ascending.
    ///
    /// Derived from source file names; files without an embedded id are skipped.
    pub async fn distinct_process_ids_for_worker(
        &self,
        worker: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<u32>, StoreError> {
        let filter = Filter::eq(Field::Worker, worker);
        let files = cancellable(cancel, self.store.distinct(Field::File, &filter, cancel)).await?;

        let ids: BTreeSet<u32> = files
            .iter()
            .filter_map(|file| self.process_id_from_file(file))
            .collect();
        Ok(ids.into_iter().collect())
    }

    pub fn process_id_from_file(&self, file: &str) -> Option<u32> {
        self.backgrounder_file
            .capture(file, PROCESS_ID_GROUP)
            .and_then(|id| id.parse().ok())
    }

    /// Paired start/end lifecycles of `job_type` jobs for one process.
    pub async fn lifecycles_for_process(
        &self,
        worker: &str,
        process_id: u32,
        job_type: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<JobLifecycle>, StoreError> {
        let matchers = JobEventMatchers::compile(&self.matchers, job_type)?;
        let events = self.events_for_process(worker, process_id, job_type, cancel).await?;

        let key = JobKey {
            worker: worker.to_string(),
            process_id,
            job_type: job_type.to_string(),
        };
        let tagged = events
            .into_iter()
            .filter_map(|record| {
                matchers.phase_of(&record).map(|phase| TaggedEvent {
                    key: key.clone(),
                    phase,
                    record,
                })
            })
            .collect();

        Ok(pair_job_events(tagged))
    }

    /// Events logged by the lifecycle's process while the job ran.
    ///
    /// A missing start or end leaves that side of the window open.
    pub async fn events_during(
        &self,
        lifecycle: &JobLifecycle,
        cancel: &CancellationToken,
    ) -> Result<Vec<EventRecord>, StoreError> {
        let start = lifecycle.started_at().unwrap_or(DateTime::<Utc>::MIN_UTC);
        let end = lifecycle.ended_at().unwrap_or(DateTime::<Utc>::MAX_UTC);
        self.events_in_range(&lifecycle.key.worker, lifecycle.key.process_id, start, end, cancel)
            .await
    }
}

async fn cancellable<T, F>(cancel: &CancellationToken, query: F) -> Result<T, StoreError>
where
    F: Future<Output = Result<T, StoreError>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(StoreError::Cancelled),
        result = query => result,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::memory::MemoryEventStore;
    use crate::jobs::model::{JobOutcome, Severity};
    use crate::conf::model::DEFAULT_RUNNER_CLASS;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_500_000_000 + secs, 0).unwrap()
    }

    fn record(secs: i64, class: &str, message: &str, file: &str) -> EventRecord {
        EventRecord {
            timestamp: at(secs),
            severity: Severity::Info,
            class: class.to_string(),
            message: message.to_string(),
            worker: "worker0".to_string(),
            file: file.to_string(),
            job_type: None,
        }
    }

    fn runner(secs: i64, message: &str) -> EventRecord {
        record(secs, DEFAULT_RUNNER_CLASS, message, "backgrounder-1.log")
    }

    async fn correlator(records: Vec<EventRecord>) -> JobCorrelator<MemoryEventStore> {
        let store = Arc::new(MemoryEventStore::new());
        store.insert_many(records).await;
        JobCorrelator::new(store, JobsConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn test_events_for_process_legacy_pair() {
        let c = correlator(vec![
            runner(1, "Running job of type :extract; id 7"),
            runner(2, "Some unrelated progress line"),
            runner(3, "Job finished: SUCCESS; name: x; type :extract;"),
            runner(4, "Running job of type :subscription;"),
        ])
        .await;
        let cancel = CancellationToken::new();

        let events = c.events_for_process("worker0", 1, "extract", &cancel).await.unwrap();
        let messages: Vec<_> = events.iter().map(|e| e.message.as_str()).collect();
        assert_eq!(
            messages,
            vec!["Running job of type :extract; id 7", "Job finished: SUCCESS; name: x; type :extract;"]
        );
    }

    #[tokio::test]
    async fn test_events_for_process_filters_scope() {
        let mut warn = runner(1, "Running job of type :extract;");
        warn.severity = Severity::Warn;
        let mut other_worker = runner(2, "Running job of type :extract;");
        other_worker.worker = "worker1".to_string();
        let other_process = record(3, DEFAULT_RUNNER_CLASS, "Running job of type :extract;", "backgrounder-12.log");
        let other_class = record(4, "com.example.Other", "Running job of type :extract;", "backgrounder-1.log");
        let node_file = record(5, DEFAULT_RUNNER_CLASS, "Running job of type :extract;", "backgrounder_node2-1.log.2018");

        let c = correlator(vec![warn, other_worker, other_process, other_class, node_file]).await;
        let events = c
            .events_for_process("worker0", 1, "extract", &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].timestamp, at(5));
    }

    #[tokio::test]
    async fn test_events_for_process_current_schema() {
        let mut start = runner(1, "Running job of type RefreshExtracts");
        start.job_type = Some("extract".to_string());
        let mut end = runner(2, "Error executing backgroundjob: timed out");
        end.severity = Severity::Error;
        end.job_type = Some("extract".to_string());
        let mut other = runner(3, "Running job of type Subscriptions");
        other.job_type = Some("subscription".to_string());

        let c = correlator(vec![end, start, other]).await;
        let events = c
            .events_for_process("worker0", 1, "extract", &CancellationToken::new())
            .await
            .unwrap();

        let stamps: Vec<_> = events.iter().map(|e| e.timestamp).collect();
        assert_eq!(stamps, vec![at(1), at(2)]);
    }

    #[tokio::test]
    async fn test_zero_width_range_and_ignore_list() {
        let ignored = JobsConfig::default().ignored_classes[0].clone();
        let c = correlator(vec![
            record(0, "a", "before", "backgrounder-1.log"),
            record(5, "a", "exact", "backgrounder-1.log"),
            record(5, &ignored, "noise", "backgrounder-1.log"),
            record(5, "a", "other process", "backgrounder-2.log"),
            record(6, "a", "after", "backgrounder-1.log"),
        ])
        .await;

        let events = c
            .events_in_range("worker0", 1, at(5), at(5), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].message, "exact");
    }

    #[tokio::test]
    async fn test_distinct_helpers() {
        let mut typed = runner(1, "x");
        typed.job_type = Some("extract".to_string());
        let mut elsewhere = record(2, "a", "y", "backgrounder-9.log");
        elsewhere.worker = "worker1".to_string();

        let c = correlator(vec![
            typed,
            elsewhere,
            record(3, "a", "z", "backgrounder_node1-3.log"),
            record(4, "a", "z", "backgrounder-1.log.1"),
            record(5, "a", "z", "vizqlserver_1-0.txt"),
            record(6, "a", "z", "backgrounder-abc.log"),
        ])
        .await;
        let cancel = CancellationToken::new();

        assert_eq!(c.distinct_worker_ids(&cancel).await.unwrap(), vec!["worker0", "worker1"]);
        assert_eq!(c.distinct_job_types(&cancel).await.unwrap(), vec!["extract"]);
        assert_eq!(c.distinct_process_ids_for_worker("worker0", &cancel).await.unwrap(), vec![1, 3]);
        assert!(c.distinct_process_ids_for_worker("nobody", &cancel).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_process_id_from_file() {
        let c = correlator(vec![]).await;
        assert_eq!(c.process_id_from_file("backgrounder-0.log"), Some(0));
        assert_eq!(c.process_id_from_file("backgrounder_node3-12.log.2018-01-01"), Some(12));
        assert_eq!(c.process_id_from_file("backgrounder.log"), None);
        assert_eq!(c.process_id_from_file("xbackgrounder-1.log"), None);
    }

    #[tokio::test]
    async fn test_lifecycles_and_events_during() {
        let c = correlator(vec![
            runner(10, "Running job of type :extract;"),
            runner(12, "Running job of type :extract;"),
            record(13, "com.example.Worker", "working", "backgrounder-1.log"),
            runner(15, "Job finished: SUCCESS; name: Refresh Extracts; type :extract;"),
            record(20, "com.example.Worker", "later", "backgrounder-1.log"),
        ])
        .await;
        let cancel = CancellationToken::new();

        let lifecycles = c.lifecycles_for_process("worker0", 1, "extract", &cancel).await.unwrap();
        assert_eq!(lifecycles.len(), 2);
        assert_eq!(lifecycles[0].started_at(), Some(at(10)));
        assert_eq!(lifecycles[0].ended_at(), Some(at(15)));
        assert_eq!(lifecycles[0].outcome(), JobOutcome::Succeeded);
        assert_eq!(lifecycles[1].started_at(), Some(at(12)));
        assert_eq!(lifecycles[1].outcome(), JobOutcome::Running);

        let during = c.events_during(&lifecycles[0], &cancel).await.unwrap();
        assert_eq!(during.len(), 4);

        // Open-ended: runs to the end of the capture
        let open = c.events_during(&lifecycles[1], &cancel).await.unwrap();
        assert_eq!(open.last().map(|e| e.message.as_str()), Some("later"));
    }

    #[tokio::test]
    async fn test_cancelled_query() {
        let c = correlator(vec![runner(1, "Running job of type :extract;")]).await;
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = c.events_for_process("worker0", 1, "extract", &cancel).await.unwrap_err();
        assert!(matches!(err, StoreError::Cancelled));
    }

    #[tokio::test]
    async fn test_store_unavailable() {
        let store = Arc::new(MemoryEventStore::new());
        store.set_offline(Some("connection refused".to_string())).await;
        let c = JobCorrelator::new(store, JobsConfig::default()).unwrap();

        let err = c.distinct_worker_ids(&CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(_)));
    }
}
