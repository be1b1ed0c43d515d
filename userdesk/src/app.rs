//! Application state and initialization
//!
//! Builds the record and blob stores selected by `Settings` and wires them
//! into a `ViewController`.

use crate::config::{BackendKind, Settings};
use crate::database::{create_pool, Repository};
use crate::error::Result;
use crate::hosted::{HostedClient, RestBlobStore, RestRecordStore};
use crate::services::{RecordsService, ViewController};
use crate::storage::{
    BlobStore, DirBlobStore, InMemoryBlobStore, InMemoryRecordStore, RecordStore,
};
use std::sync::Arc;
use std::time::Duration;

/// Central application state holding the controller
#[derive(Clone)]
pub struct AppState {
    pub settings: Settings,
    pub controller: ViewController,
}

impl AppState {
    /// Validate settings and construct the configured backend
    pub async fn build(settings: Settings) -> Result<Self> {
        settings.validate()?;

        tracing::info!("Initializing {:?} backend", settings.backend);

        let backend = settings.backend;
        let (records, blobs): (Arc<dyn RecordStore>, Arc<dyn BlobStore>) = match backend {
            BackendKind::Hosted => {
                let client = HostedClient::new(
                    &settings.hosted.url,
                    &settings.hosted.api_key,
                    Duration::from_secs(settings.hosted.timeout_secs),
                )?;
                (
                    Arc::new(RestRecordStore::new(client.clone(), settings.table.clone())),
                    Arc::new(RestBlobStore::new(client)),
                )
            }
            BackendKind::Local => {
                let data_dir = &settings.local.data_dir;
                tracing::info!("Data directory: {:?}", data_dir);

                std::fs::create_dir_all(data_dir)?;

                let pool = create_pool(&data_dir.join("userdesk.db")).await?;
                let blob_store = DirBlobStore::new(data_dir.join("blobs"));
                blob_store.initialize().await?;

                (Arc::new(Repository::new(pool)), Arc::new(blob_store))
            }
            BackendKind::Memory => (
                Arc::new(InMemoryRecordStore::new()),
                Arc::new(InMemoryBlobStore::new()),
            ),
        };

        let service = RecordsService::new(records, blobs, settings.bucket.clone());
        let controller = ViewController::new(service);

        tracing::info!("Application initialized successfully");

        Ok(Self {
            settings,
            controller,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LocalSettings;
    use crate::error::AppError;
    use crate::services::ListState;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_build_local_backend() {
        let temp = TempDir::new().unwrap();
        let settings = Settings {
            backend: BackendKind::Local,
            local: LocalSettings {
                data_dir: temp.path().join("data"),
            },
            ..Settings::default()
        };

        let state = AppState::build(settings).await.unwrap();
        state.controller.load().await;

        assert_eq!(state.controller.snapshot().list, ListState::Loaded);
        assert!(temp.path().join("data").join("userdesk.db").exists());
        assert!(temp.path().join("data").join("blobs").exists());
    }

    #[tokio::test]
    async fn test_build_rejects_incomplete_hosted_settings() {
        let settings = Settings {
            backend: BackendKind::Hosted,
            ..Settings::default()
        };

        assert!(matches!(
            AppState::build(settings).await,
            Err(AppError::Config(_))
        ));
    }
}
