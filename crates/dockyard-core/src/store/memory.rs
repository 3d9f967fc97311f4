//! In-memory store driver
//!
//! Keeps records in a shared map, useful for unit tests without a real
//! database. Tracks operation counts for assertions.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use uuid::Uuid;

use super::ApplicationStore;
use crate::application::{ApplicationSpec, NewApplication};
use crate::error::{CoreError, Result};

/// In-memory store driver for testing
#[derive(Clone, Default)]
pub struct MemoryStore {
    records: Arc<RwLock<HashMap<Uuid, ApplicationSpec>>>,
    counts: Arc<RwLock<StoreCounts>>,
}

/// Counts of operations performed, for testing assertions
#[derive(Debug, Default, Clone)]
pub struct StoreCounts {
    pub gets: usize,
    pub lists: usize,
    pub creates: usize,
    pub updates: usize,
    pub deletes: usize,
}

impl MemoryStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with pre-populated records
    pub fn with_records(records: Vec<ApplicationSpec>) -> Self {
        let store = Self::new();
        {
            let mut map = store.records.write().unwrap();
            for record in records {
                map.insert(record.id, record);
            }
        }
        store
    }

    /// Get operation counts for assertions
    pub fn counts(&self) -> StoreCounts {
        self.counts.read().unwrap().clone()
    }

    /// Number of stored records
    pub fn record_count(&self) -> usize {
        self.records.read().unwrap().len()
    }
}

#[async_trait]
impl ApplicationStore for MemoryStore {
    async fn create(&self, request: NewApplication) -> Result<ApplicationSpec> {
        self.counts.write().unwrap().creates += 1;

        let mut map = self.records.write().unwrap();
        if map.values().any(|a| a.name == request.name) {
            return Err(CoreError::NameTaken { name: request.name });
        }
        let app = ApplicationSpec::from_request(request);
        map.insert(app.id, app.clone());
        Ok(app)
    }

    async fn update(&self, id: Uuid, request: NewApplication) -> Result<ApplicationSpec> {
        self.counts.write().unwrap().updates += 1;

        let mut map = self.records.write().unwrap();
        if map
            .values()
            .any(|a| a.name == request.name && a.id != id)
        {
            return Err(CoreError::NameTaken { name: request.name });
        }
        let app = map
            .get_mut(&id)
            .ok_or(CoreError::ApplicationNotFound { id })?;
        app.apply_update(request);
        Ok(app.clone())
    }

    async fn get(&self, id: Uuid) -> Result<ApplicationSpec> {
        self.counts.write().unwrap().gets += 1;

        self.records
            .read()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or(CoreError::ApplicationNotFound { id })
    }

    async fn list(&self) -> Result<Vec<ApplicationSpec>> {
        self.counts.write().unwrap().lists += 1;

        let mut records: Vec<ApplicationSpec> =
            self.records.read().unwrap().values().cloned().collect();
        records.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(records)
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        self.counts.write().unwrap().deletes += 1;

        self.records
            .write()
            .unwrap()
            .remove(&id)
            .map(|_| ())
            .ok_or(CoreError::ApplicationNotFound { id })
    }

    async fn exists_by_name(&self, name: &str) -> Result<bool> {
        Ok(self.records.read().unwrap().values().any(|a| a.name == name))
    }
}
