use std::io::ErrorKind;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::{Mutex, broadcast};

use crate::model::Record;
use crate::store::{Collection, Error, StoreEvent, next_id, to_values};

/// A file-backed collection store.
///
/// One named collection of records persisted as a JSON array at
/// `<dir>/<name>.json`. Mutations hold a per-collection lock across
/// their whole read-modify-write cycle, so two concurrent writers
/// cannot lose each other's updates, and persistence writes to a
/// temporary file then renames it over the target so a crash mid-write
/// never leaves a half-written collection behind.
///
/// When built with [`FileStore::with_events`], every successful
/// mutation publishes a [`StoreEvent`] carrying the full collection.
#[derive(Debug)]
pub struct FileStore<T> {
    path: Arc<PathBuf>,
    name: Arc<str>,
    write_lock: Arc<Mutex<()>>,
    events: Option<broadcast::Sender<StoreEvent>>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for FileStore<T> {
    fn clone(&self) -> Self {
        Self {
            path: Arc::clone(&self.path),
            name: Arc::clone(&self.name),
            write_lock: Arc::clone(&self.write_lock),
            events: self.events.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T: Record> FileStore<T> {
    /// Creates a store for the collection `name` under `dir`. The
    /// backing file is created lazily on the first mutation.
    pub fn new(dir: impl AsRef<Path>, name: &str) -> Self {
        Self {
            path: Arc::new(dir.as_ref().join(format!("{name}.json"))),
            name: Arc::from(name),
            write_lock: Arc::new(Mutex::new(())),
            events: None,
            _marker: PhantomData,
        }
    }

    /// Publishes a [`StoreEvent`] on `sender` after every successful
    /// mutation.
    pub fn with_events(mut self, sender: broadcast::Sender<StoreEvent>) -> Self {
        self.events = Some(sender);
        self
    }

    /// The collection name this store persists.
    pub fn name(&self) -> &str {
        &self.name
    }

    async fn read_records(&self) -> Result<Vec<T>, Error> {
        let bytes = match tokio::fs::read(self.path.as_ref()).await {
            Ok(bytes) => bytes,
            // An absent file is an empty collection.
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(Error::Backend(err.to_string())),
        };

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }

        serde_json::from_slice(&bytes).map_err(|err| Error::Decode(err.to_string()))
    }

    async fn persist(&self, records: &[T]) -> Result<(), Error> {
        let bytes =
            serde_json::to_vec_pretty(records).map_err(|err| Error::Encode(err.to_string()))?;

        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &bytes)
            .await
            .map_err(|err| Error::Backend(err.to_string()))?;
        tokio::fs::rename(&tmp, self.path.as_ref())
            .await
            .map_err(|err| Error::Backend(err.to_string()))?;

        self.publish(records);
        Ok(())
    }

    fn publish(&self, records: &[T]) {
        let Some(sender) = &self.events else {
            return;
        };

        match to_values(records) {
            Ok(values) => {
                // A send error only means nobody is subscribed.
                let _ = sender.send(StoreEvent {
                    collection: Arc::clone(&self.name),
                    records: Arc::new(values),
                });
            }
            Err(err) => {
                tracing::debug!(err = %err, collection = %self.name, "skipping change event");
            }
        }
    }
}

impl<T: Record> Collection for FileStore<T> {
    type Record = T;

    #[tracing::instrument(name = "reading collection from file", skip(self), fields(collection = %self.name))]
    async fn get_all(&self) -> Result<Vec<T>, Error> {
        self.read_records().await
    }

    #[tracing::instrument(name = "reading record from file", skip(self), fields(collection = %self.name))]
    async fn get_by_id(&self, id: u64) -> Result<Option<T>, Error> {
        let records = self.read_records().await?;
        Ok(records.into_iter().find(|r| r.id() == Some(id)))
    }

    #[tracing::instrument(name = "saving record to file", skip(self, record), fields(collection = %self.name))]
    async fn save(&self, mut record: T) -> Result<T, Error> {
        let _guard = self.write_lock.lock().await;

        let mut records = self.read_records().await?;
        record.set_id(next_id(&records));
        records.push(record.clone());
        self.persist(&records).await?;

        Ok(record)
    }

    #[tracing::instrument(name = "updating record in file", skip(self, record), fields(collection = %self.name))]
    async fn update(&self, mut record: T, id: u64) -> Result<T, Error> {
        let _guard = self.write_lock.lock().await;

        let mut records = self.read_records().await?;
        let slot = records
            .iter_mut()
            .find(|r| r.id() == Some(id))
            .ok_or(Error::NotFound(id))?;

        record.set_id(id);
        *slot = record.clone();
        self.persist(&records).await?;

        Ok(record)
    }

    #[tracing::instrument(name = "deleting record from file", skip(self), fields(collection = %self.name))]
    async fn delete_by_id(&self, id: u64) -> Result<(), Error> {
        let _guard = self.write_lock.lock().await;

        let mut records = self.read_records().await?;
        let before = records.len();
        records.retain(|r| r.id() != Some(id));

        if records.len() != before {
            self.persist(&records).await?;
        }

        Ok(())
    }

    #[tracing::instrument(name = "clearing collection file", skip(self), fields(collection = %self.name))]
    async fn delete_all(&self) -> Result<(), Error> {
        let _guard = self.write_lock.lock().await;
        self.persist(&[]).await
    }
}
