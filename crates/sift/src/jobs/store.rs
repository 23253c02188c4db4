//! Store trait: abstract read interface over the persisted event collection.
//!
//! The correlator reaches the store only through [`EventStore`].
//! `memory.rs` provides an in-process implementation.

use std::future::Future;
use std::pin::Pin;

use thiserror::Error;
use tokio_util::sync::CancellationToken;

use super::filter::{Field, Filter};
use super::model::EventRecord;
use crate::pattern::PatternError;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Event store unavailable: {0}")]
    Unavailable(String),
    #[error("Query cancelled")]
    Cancelled,
    #[error("Invalid query: {0}")]
    InvalidQuery(#[from] PatternError),
}

pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + Send + 'a>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Whatever order the store returns
    Natural,
    TimestampAscending,
}

/// Read-only queries over stored events.
///
/// Object-safe thanks to boxed futures. Implementations must honour the
/// cancellation token for long scans.
pub trait EventStore: Send + Sync {
    fn find<'a>(
        &'a self,
        filter: &'a Filter,
        order: SortOrder,
        cancel: &'a CancellationToken,
    ) -> StoreFuture<'a, Vec<EventRecord>>;

    /// Distinct non-null values of `field` among records matching `filter`.
    fn distinct<'a>(
        &'a self,
        field: Field,
        filter: &'a Filter,
        cancel: &'a CancellationToken,
    ) -> StoreFuture<'a, Vec<String>>;
}
