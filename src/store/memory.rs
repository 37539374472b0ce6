use std::marker::PhantomData;
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::broadcast;

use crate::model::Record;
use crate::store::{Collection, Error, StoreEvent, next_id, to_values};

/// An in-memory collection store.
///
/// Same contract as [`FileStore`](crate::store::FileStore) but nothing
/// survives the process. Useful for tests and local development.
#[derive(Debug)]
pub struct MemoryStore<T> {
    records: Arc<RwLock<Vec<T>>>,
    name: Arc<str>,
    events: Option<broadcast::Sender<StoreEvent>>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for MemoryStore<T> {
    fn clone(&self) -> Self {
        Self {
            records: Arc::clone(&self.records),
            name: Arc::clone(&self.name),
            events: self.events.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T: Record> MemoryStore<T> {
    pub fn new(name: &str) -> Self {
        Self {
            records: Arc::new(RwLock::new(Vec::new())),
            name: Arc::from(name),
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

    fn publish(&self, records: &[T]) {
        let Some(sender) = &self.events else {
            return;
        };

        match to_values(records) {
            Ok(values) => {
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

impl<T: Record> Collection for MemoryStore<T> {
    type Record = T;

    async fn get_all(&self) -> Result<Vec<T>, Error> {
        Ok(self.records.read().clone())
    }

    async fn get_by_id(&self, id: u64) -> Result<Option<T>, Error> {
        Ok(self
            .records
            .read()
            .iter()
            .find(|r| r.id() == Some(id))
            .cloned())
    }

    async fn save(&self, mut record: T) -> Result<T, Error> {
        let snapshot = {
            let mut records = self.records.write();
            record.set_id(next_id(&records));
            records.push(record.clone());
            records.clone()
        };
        self.publish(&snapshot);

        Ok(record)
    }

    async fn update(&self, mut record: T, id: u64) -> Result<T, Error> {
        let snapshot = {
            let mut records = self.records.write();
            let slot = records
                .iter_mut()
                .find(|r| r.id() == Some(id))
                .ok_or(Error::NotFound(id))?;

            record.set_id(id);
            *slot = record.clone();
            records.clone()
        };
        self.publish(&snapshot);

        Ok(record)
    }

    async fn delete_by_id(&self, id: u64) -> Result<(), Error> {
        let snapshot = {
            let mut records = self.records.write();
            let before = records.len();
            records.retain(|r| r.id() != Some(id));
            if records.len() == before {
                return Ok(());
            }
            records.clone()
        };
        self.publish(&snapshot);

        Ok(())
    }

    async fn delete_all(&self) -> Result<(), Error> {
        self.records.write().clear();
        self.publish(&[]);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Cart;

    #[tokio::test]
    async fn ids_increase_from_one() {
        let store: MemoryStore<Cart> = MemoryStore::new("carrito");

        let first = store.save(Cart::empty()).await.unwrap();
        let second = store.save(Cart::empty()).await.unwrap();
        assert_eq!(first.id, Some(1));
        assert_eq!(second.id, Some(2));
    }

    #[tokio::test]
    async fn update_of_missing_id_fails() {
        let store: MemoryStore<Cart> = MemoryStore::new("carrito");
        let result = store.update(Cart::empty(), 9).await;
        assert!(matches!(result, Err(Error::NotFound(9))));
    }

    #[tokio::test]
    async fn delete_of_missing_id_is_a_noop() {
        let store: MemoryStore<Cart> = MemoryStore::new("carrito");
        store.save(Cart::empty()).await.unwrap();

        store.delete_by_id(42).await.unwrap();
        assert_eq!(store.get_all().await.unwrap().len(), 1);
    }
}
