//! File-based store driver
//!
//! Stores one JSON document per application record under a base directory.
//! Stands in for the relational store when running the CLI against a real
//! cluster without a database.

use async_trait::async_trait;
use std::path::PathBuf;
use uuid::Uuid;

use super::ApplicationStore;
use crate::application::{ApplicationSpec, NewApplication};
use crate::error::{CoreError, Result};

/// File-based store driver
pub struct FileStore {
    /// Base directory holding one `<id>.json` per record
    base_dir: PathBuf,
}

impl FileStore {
    /// Create a new file store, creating the base directory if needed
    pub fn new(base_dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&base_dir)?;
        Ok(Self { base_dir })
    }

    fn record_path(&self, id: Uuid) -> PathBuf {
        self.base_dir.join(format!("{id}.json"))
    }

    fn write_record(&self, app: &ApplicationSpec) -> Result<()> {
        let json = serde_json::to_vec_pretty(app)?;
        std::fs::write(self.record_path(app.id), json)?;
        Ok(())
    }

    fn read_record(&self, id: Uuid) -> Result<ApplicationSpec> {
        let path = self.record_path(id);
        if !path.exists() {
            return Err(CoreError::ApplicationNotFound { id });
        }
        let data = std::fs::read(path)?;
        Ok(serde_json::from_slice(&data)?)
    }

    fn read_all(&self) -> Result<Vec<ApplicationSpec>> {
        let mut records = Vec::new();
        for entry in std::fs::read_dir(&self.base_dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let data = std::fs::read(&path)?;
            match serde_json::from_slice::<ApplicationSpec>(&data) {
                Ok(app) => records.push(app),
                Err(e) => {
                    tracing::warn!("skipping unreadable record {}: {}", path.display(), e);
                }
            }
        }
        records.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(records)
    }
}

#[async_trait]
impl ApplicationStore for FileStore {
    async fn create(&self, request: NewApplication) -> Result<ApplicationSpec> {
        if self.exists_by_name(&request.name).await? {
            return Err(CoreError::NameTaken { name: request.name });
        }
        let app = ApplicationSpec::from_request(request);
        self.write_record(&app)?;
        Ok(app)
    }

    async fn update(&self, id: Uuid, request: NewApplication) -> Result<ApplicationSpec> {
        let taken = self
            .read_all()?
            .iter()
            .any(|a| a.name == request.name && a.id != id);
        if taken {
            return Err(CoreError::NameTaken { name: request.name });
        }
        let mut app = self.read_record(id)?;
        app.apply_update(request);
        self.write_record(&app)?;
        Ok(app)
    }

    async fn get(&self, id: Uuid) -> Result<ApplicationSpec> {
        self.read_record(id)
    }

    async fn list(&self) -> Result<Vec<ApplicationSpec>> {
        self.read_all()
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let path = self.record_path(id);
        if !path.exists() {
            return Err(CoreError::ApplicationNotFound { id });
        }
        std::fs::remove_file(path)?;
        Ok(())
    }

    async fn exists_by_name(&self, name: &str) -> Result<bool> {
        Ok(self.read_all()?.iter().any(|a| a.name == name))
    }
}
