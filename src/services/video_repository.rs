use crate::entities::{prelude::*, videos};
use crate::services::ingest::StoredObjectReference;
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::Utc;
use sea_orm::ActiveValue::Set;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, QueryOrder};
use uuid::Uuid;

/// Video records. Ingestion only touches the stored reference.
#[async_trait]
pub trait VideoRepository: Send + Sync {
    async fn create_video(&self, title: String, description: Option<String>)
    -> Result<videos::Model>;

    async fn get_video(&self, id: &str) -> Result<Option<videos::Model>>;

    async fn list_videos(&self) -> Result<Vec<videos::Model>>;

    /// Point the record at a newly stored object, clearing any legacy reference
    async fn set_video_reference(
        &self,
        id: &str,
        reference: &StoredObjectReference,
    ) -> Result<videos::Model>;
}

pub struct SeaOrmVideoRepository {
    db: DatabaseConnection,
}

impl SeaOrmVideoRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl VideoRepository for SeaOrmVideoRepository {
    async fn create_video(
        &self,
        title: String,
        description: Option<String>,
    ) -> Result<videos::Model> {
        let now = Utc::now();
        let video = videos::ActiveModel {
            id: Set(Uuid::new_v4().to_string()),
            title: Set(title),
            description: Set(description),
            video_bucket: Set(None),
            video_key: Set(None),
            legacy_video_url: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };

        Ok(video.insert(&self.db).await?)
    }

    async fn get_video(&self, id: &str) -> Result<Option<videos::Model>> {
        Ok(Videos::find_by_id(id).one(&self.db).await?)
    }

    async fn list_videos(&self) -> Result<Vec<videos::Model>> {
        Ok(Videos::find()
            .order_by_desc(videos::Column::CreatedAt)
            .all(&self.db)
            .await?)
    }

    async fn set_video_reference(
        &self,
        id: &str,
        reference: &StoredObjectReference,
    ) -> Result<videos::Model> {
        let video = Videos::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| anyhow!("Video not found: {}", id))?;

        let mut active: videos::ActiveModel = video.into();
        active.video_bucket = Set(Some(reference.bucket.clone()));
        active.video_key = Set(Some(reference.key.clone()));
        active.legacy_video_url = Set(None);
        active.updated_at = Set(Utc::now());

        Ok(active.update(&self.db).await?)
    }
}
