use crate::services::ingest::{IngestError, StoredObjectReference};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "videos")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub video_bucket: Option<String>,
    pub video_key: Option<String>,
    /// Rows migrated from the single-column `"<bucket>,<key>"` format
    pub legacy_video_url: Option<String>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Where this video's object lives, if one was ever uploaded.
    pub fn stored_reference(&self) -> Result<Option<StoredObjectReference>, IngestError> {
        match (&self.video_bucket, &self.video_key) {
            (Some(bucket), Some(key)) => Ok(Some(StoredObjectReference::new(bucket, key))),
            _ => self
                .legacy_video_url
                .as_deref()
                .map(StoredObjectReference::parse_composite)
                .transpose(),
        }
    }
}
