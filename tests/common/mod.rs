#![allow(dead_code)]

use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use chrono::Utc;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use video_ingest::config::IngestConfig;
use video_ingest::entities::videos;
use video_ingest::infrastructure::database;
use video_ingest::services::access_url::AccessUrlIssuer;
use video_ingest::services::ingest::{IngestError, IngestService, StoredObjectReference};
use video_ingest::services::media_tool::{MediaTool, ProbeOutput, ProbeStream};
use video_ingest::services::storage::{PresignedAccessUrl, StorageService};
use video_ingest::services::video_repository::{SeaOrmVideoRepository, VideoRepository};
use video_ingest::{AppState, create_app};

pub const BUCKET: &str = "test-videos";

pub async fn setup_test_db() -> DatabaseConnection {
    // One connection so every query sees the same in-memory database
    let mut opt = ConnectOptions::new("sqlite::memory:");
    opt.max_connections(1).min_connections(1).sqlx_logging(false);
    let db = Database::connect(opt).await.unwrap();
    database::run_migrations(&db).await.unwrap();
    db
}

/// Media tool with canned probe results that copies instead of remuxing
pub struct FakeMediaTool {
    dimensions: Option<(f64, f64)>,
    fail_probe: bool,
    fail_remux: bool,
    calls: AtomicUsize,
    seen: Mutex<Vec<PathBuf>>,
}

impl FakeMediaTool {
    pub fn with_dimensions(width: f64, height: f64) -> Self {
        Self {
            dimensions: Some((width, height)),
            fail_probe: false,
            fail_remux: false,
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn without_streams() -> Self {
        Self {
            dimensions: None,
            ..Self::with_dimensions(0.0, 0.0)
        }
    }

    pub fn failing_probe(mut self) -> Self {
        self.fail_probe = true;
        self
    }

    /// Remux writes a partial output file and then fails
    pub fn failing_remux(mut self) -> Self {
        self.fail_remux = true;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Every path handed to the tool, inputs and outputs
    pub fn seen_paths(&self) -> Vec<PathBuf> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl MediaTool for FakeMediaTool {
    async fn probe(&self, path: &Path) -> Result<ProbeOutput, IngestError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(path.to_path_buf());

        assert!(path.exists(), "probe called on a missing file");
        if self.fail_probe {
            return Err(IngestError::Probe("moov atom not found".to_string()));
        }

        Ok(ProbeOutput {
            streams: self
                .dimensions
                .map(|(width, height)| ProbeStream {
                    codec_type: Some("video".to_string()),
                    width,
                    height,
                })
                .into_iter()
                .collect(),
        })
    }

    async fn remux_fast_start(&self, input: &Path, output: &Path) -> Result<(), IngestError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        {
            let mut seen = self.seen.lock().unwrap();
            seen.push(input.to_path_buf());
            seen.push(output.to_path_buf());
        }

        if self.fail_remux {
            tokio::fs::write(output, b"partial").await.unwrap();
            return Err(IngestError::Remux("ffmpeg exited with 1".to_string()));
        }

        tokio::fs::copy(input, output)
            .await
            .map_err(|e| IngestError::Remux(e.to_string()))?;
        Ok(())
    }
}

/// In-memory object store whose signatures change on every call
pub struct MockStorageService {
    objects: Mutex<HashMap<(String, String), (String, Vec<u8>)>>,
    signatures: AtomicUsize,
    fail_put: bool,
    fail_presign: bool,
}

impl MockStorageService {
    pub fn new() -> Self {
        Self {
            objects: Mutex::new(HashMap::new()),
            signatures: AtomicUsize::new(0),
            fail_put: false,
            fail_presign: false,
        }
    }

    pub fn failing_put() -> Self {
        Self {
            fail_put: true,
            ..Self::new()
        }
    }

    pub fn failing_presign() -> Self {
        Self {
            fail_presign: true,
            ..Self::new()
        }
    }

    pub fn object(&self, bucket: &str, key: &str) -> Option<(String, Vec<u8>)> {
        self.objects
            .lock()
            .unwrap()
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
    }

    pub fn object_count(&self) -> usize {
        self.objects.lock().unwrap().len()
    }
}

#[async_trait]
impl StorageService for MockStorageService {
    fn bucket(&self) -> &str {
        BUCKET
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        content_type: &str,
        body: ByteStream,
    ) -> anyhow::Result<()> {
        if self.fail_put {
            return Err(anyhow::anyhow!("connection reset by peer"));
        }

        let data = body.collect().await?.into_bytes().to_vec();
        self.objects.lock().unwrap().insert(
            (bucket.to_string(), key.to_string()),
            (content_type.to_string(), data),
        );
        Ok(())
    }

    async fn presign_get(
        &self,
        bucket: &str,
        key: &str,
        expires_in: Duration,
    ) -> anyhow::Result<PresignedAccessUrl> {
        if self.fail_presign {
            return Err(anyhow::anyhow!("no credentials"));
        }

        let signature = self.signatures.fetch_add(1, Ordering::SeqCst);
        Ok(PresignedAccessUrl {
            url: format!(
                "https://mock-s3.local/{}/{}?X-Amz-Expires={}&X-Amz-Signature={:08x}",
                bucket,
                key,
                expires_in.as_secs(),
                signature
            ),
            expires_at: Utc::now() + chrono::Duration::from_std(expires_in)?,
        })
    }

    async fn file_exists(&self, bucket: &str, key: &str) -> anyhow::Result<bool> {
        Ok(self.object(bucket, key).is_some())
    }
}

/// Repository that loses the final write
pub struct FailingRecordRepository {
    pub inner: SeaOrmVideoRepository,
}

#[async_trait]
impl VideoRepository for FailingRecordRepository {
    async fn create_video(
        &self,
        title: String,
        description: Option<String>,
    ) -> anyhow::Result<videos::Model> {
        self.inner.create_video(title, description).await
    }

    async fn get_video(&self, id: &str) -> anyhow::Result<Option<videos::Model>> {
        self.inner.get_video(id).await
    }

    async fn list_videos(&self) -> anyhow::Result<Vec<videos::Model>> {
        self.inner.list_videos().await
    }

    async fn set_video_reference(
        &self,
        _id: &str,
        _reference: &StoredObjectReference,
    ) -> anyhow::Result<videos::Model> {
        Err(anyhow::anyhow!("database is locked"))
    }
}

/// Everything an ingestion test needs, wired like `main` wires it
pub struct Harness {
    pub db: DatabaseConnection,
    pub media: Arc<FakeMediaTool>,
    pub storage: Arc<MockStorageService>,
    pub videos: Arc<dyn VideoRepository>,
    pub urls: Arc<AccessUrlIssuer>,
    pub ingest: Arc<IngestService>,
    pub config: IngestConfig,
    pub temp_dir: TempDir,
}

impl Harness {
    pub async fn new(media: FakeMediaTool, storage: MockStorageService) -> Self {
        Self::build(media, storage, false, |_| {}).await
    }

    pub async fn with_config(
        media: FakeMediaTool,
        storage: MockStorageService,
        adjust: impl FnOnce(&mut IngestConfig),
    ) -> Self {
        Self::build(media, storage, false, adjust).await
    }

    pub async fn with_failing_records(media: FakeMediaTool, storage: MockStorageService) -> Self {
        Self::build(media, storage, true, |_| {}).await
    }

    async fn build(
        media: FakeMediaTool,
        storage: MockStorageService,
        failing_records: bool,
        adjust: impl FnOnce(&mut IngestConfig),
    ) -> Self {
        let db = setup_test_db().await;
        let temp_dir = tempfile::tempdir().unwrap();

        let mut config = IngestConfig::development();
        config.temp_dir = temp_dir.path().to_path_buf();
        adjust(&mut config);

        let media = Arc::new(media);
        let storage = Arc::new(storage);
        let videos: Arc<dyn VideoRepository> = if failing_records {
            Arc::new(FailingRecordRepository {
                inner: SeaOrmVideoRepository::new(db.clone()),
            })
        } else {
            Arc::new(SeaOrmVideoRepository::new(db.clone()))
        };
        let urls = Arc::new(AccessUrlIssuer::new(
            storage.clone(),
            config.presign_expiry(),
        ));
        let ingest = Arc::new(IngestService::new(
            media.clone(),
            storage.clone(),
            videos.clone(),
            urls.clone(),
            config.clone(),
        ));

        Self {
            db,
            media,
            storage,
            videos,
            urls,
            ingest,
            config,
            temp_dir,
        }
    }

    pub fn app(&self) -> axum::Router {
        create_app(AppState {
            db: self.db.clone(),
            storage: self.storage.clone(),
            videos: self.videos.clone(),
            ingest: self.ingest.clone(),
            urls: self.urls.clone(),
            config: self.config.clone(),
        })
    }

    pub async fn new_video(&self) -> videos::Model {
        self.videos
            .create_video("Holiday clip".to_string(), None)
            .await
            .unwrap()
    }

    /// Files left in the staging directory
    pub fn temp_entries(&self) -> Vec<PathBuf> {
        std::fs::read_dir(self.temp_dir.path())
            .unwrap()
            .map(|e| e.unwrap().path())
            .collect()
    }
}

pub fn is_object_key(key: &str, category: &str) -> bool {
    let Some(rest) = key.strip_prefix(&format!("{}/", category)) else {
        return false;
    };
    let Some(hex) = rest.strip_suffix(".mp4") else {
        return false;
    };
    hex.len() == 64 && hex.chars().all(|c| matches!(c, '0'..='9' | 'a'..='f'))
}
