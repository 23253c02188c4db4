//! Jobs module: backgrounder job reconstruction from stored events.
//!
//! - `model.rs`: event records, job keys and lifecycles
//! - `filter.rs`: store-agnostic query expressions
//! - `store.rs`: the [`EventStore`] read trait
//! - `memory.rs`: in-process store
//! - `matcher.rs`: start/end recognisers per schema era
//! - `pairing.rs`: start/end pairing into lifecycles
//! - `correlator.rs`: the query surface

pub mod correlator;
pub mod filter;
pub mod matcher;
pub mod memory;
pub mod model;
pub mod pairing;
pub mod store;

pub use correlator::JobCorrelator;
pub use filter::{Field, Filter};
pub use matcher::{EventMatcher, JobEventMatchers};
pub use memory::MemoryEventStore;
pub use model::{EventRecord, JobKey, JobLifecycle, JobOutcome, JobPhase, SchemaEra, Severity};
pub use pairing::{pair_job_events, TaggedEvent};
pub use store::{EventStore, SortOrder, StoreError};
