//! Collection stores: durable, per-entity persistence with
//! publish-on-write change notifications.

use serde_json::Value;
use std::sync::Arc;

use crate::model::Record;

mod file;
pub use file::FileStore;

mod memory;
pub use memory::MemoryStore;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("encoding failed with: {0}")]
    Encode(String),

    #[error("decoding failed with: {0}")]
    Decode(String),

    #[error("{0}")]
    Backend(String),

    #[error("no record with id {0}")]
    NotFound(u64),
}

/// Emitted on the broadcast channel after every successful mutation,
/// carrying the full collection as it now stands. Subscribers (the
/// realtime channel) fan this out; the store remains the source of
/// truth.
#[derive(Clone, Debug)]
pub struct StoreEvent {
    pub collection: Arc<str>,
    pub records: Arc<Vec<Value>>,
}

/// The contract for one named collection of [`Record`]s.
///
/// Implementations assign ids on save: `max(existing ids) + 1`, or `1`
/// for an empty collection. Within one collection ids are unique and
/// strictly increasing by insertion order.
pub trait Collection: Clone + Send + Sync + 'static {
    type Record: Record;

    /// Returns every record in the collection, in insertion order.
    /// An absent or empty backing store is an empty collection, not an
    /// error.
    fn get_all(&self) -> impl Future<Output = Result<Vec<Self::Record>, Error>> + Send;

    /// Returns the record whose id matches, if any.
    fn get_by_id(
        &self,
        id: u64,
    ) -> impl Future<Output = Result<Option<Self::Record>, Error>> + Send;

    /// Assigns the next id, appends the record and persists. Returns
    /// the record with its assigned id.
    fn save(
        &self,
        record: Self::Record,
    ) -> impl Future<Output = Result<Self::Record, Error>> + Send;

    /// Replaces the record stored under `id` (the record's id field is
    /// forced to `id`) and persists. Fails with [`Error::NotFound`]
    /// when no record matches.
    fn update(
        &self,
        record: Self::Record,
        id: u64,
    ) -> impl Future<Output = Result<Self::Record, Error>> + Send;

    /// Removes the record stored under `id` and persists. A no-op when
    /// no record matches.
    fn delete_by_id(&self, id: u64) -> impl Future<Output = Result<(), Error>> + Send;

    /// Truncates the collection to empty and persists.
    fn delete_all(&self) -> impl Future<Output = Result<(), Error>> + Send;
}

pub(crate) fn next_id<R: Record>(records: &[R]) -> u64 {
    records.iter().filter_map(Record::id).max().unwrap_or(0) + 1
}

pub(crate) fn to_values<R: Record>(records: &[R]) -> Result<Vec<Value>, Error> {
    records
        .iter()
        .map(|r| serde_json::to_value(r).map_err(|err| Error::Encode(err.to_string())))
        .collect()
}
