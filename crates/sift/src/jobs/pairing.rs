//! Pairing: turn time-ordered start/end events into job lifecycles.
//!
//! Within one [`JobKey`], starts queue up in arrival order and every end
//! consumes the earliest start still waiting. Starts left in the queue are
//! jobs that never finished inside the capture; ends that find the queue
//! empty are jobs that started before it. Both are reported, not dropped.

use std::collections::{HashMap, VecDeque};

use super::model::{EventRecord, JobKey, JobLifecycle, JobPhase};

/// A job event with its correlation key and phase already resolved.
#[derive(Debug, Clone)]
pub struct TaggedEvent {
    pub key: JobKey,
    pub phase: JobPhase,
    pub record: EventRecord,
}

/// Pair events into lifecycles, ordered by each lifecycle's first timestamp.
///
/// Input order does not matter; events are re-sorted by timestamp, ties kept
/// in input order.
pub fn pair_job_events(mut events: Vec<TaggedEvent>) -> Vec<JobLifecycle> {
    events.sort_by_key(|e| e.record.timestamp);

    let mut pending: HashMap<JobKey, VecDeque<EventRecord>> = HashMap::new();
    let mut lifecycles = Vec::new();

    for event in events {
        match event.phase {
            JobPhase::Start => {
                pending.entry(event.key).or_default().push_back(event.record);
            }
            JobPhase::End => {
                let start = pending.get_mut(&event.key).and_then(VecDeque::pop_front);
                lifecycles.push(JobLifecycle {
                    key: event.key,
                    start,
                    end: Some(event.record),
                });
            }
        }
    }

    for (key, starts) in pending {
        for start in starts {
            lifecycles.push(JobLifecycle {
                key: key.clone(),
                start: Some(start),
                end: None,
            });
        }
    }

    lifecycles.sort_by(|a, b| a.first_seen().cmp(&b.first_seen()).then_with(|| a.key.cmp(&b.key)));
    lifecycles
}
