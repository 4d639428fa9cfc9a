use crate::AppState;
use crate::api::error::AppError;
use crate::entities::videos;
use crate::services::ingest::UploadedAsset;
use axum::{
    Json,
    extract::{Multipart, Path, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use serde::{Deserialize, Serialize};
use tokio_util::io::StreamReader;
use utoipa::ToSchema;
use validator::Validate;

/// Multipart field carrying the video bytes
pub const VIDEO_FIELD: &str = "video";

#[derive(Deserialize, ToSchema, Validate)]
pub struct CreateVideoRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be between 1 and 200 characters"))]
    pub title: String,
    #[validate(length(max = 5000))]
    pub description: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct VideoResponse {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    /// Freshly signed on every read; null until a video is uploaded
    pub video_url: Option<String>,
    pub video_url_expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl VideoResponse {
    async fn signed(state: &AppState, video: videos::Model) -> Result<Self, AppError> {
        let access = state.urls.sign_video(&video).await?;
        let (video_url, video_url_expires_at) = match access {
            Some(url) => (Some(url.url), Some(url.expires_at)),
            None => (None, None),
        };

        Ok(Self {
            id: video.id,
            title: video.title,
            description: video.description,
            video_url,
            video_url_expires_at,
            created_at: video.created_at,
            updated_at: video.updated_at,
        })
    }
}

#[utoipa::path(
    post,
    path = "/videos",
    request_body = CreateVideoRequest,
    responses(
        (status = 201, description = "Video record created", body = VideoResponse),
        (status = 400, description = "Invalid request")
    ),
    tag = "videos"
)]
pub async fn create_video(
    State(state): State<AppState>,
    Json(req): Json<CreateVideoRequest>,
) -> Result<(StatusCode, Json<VideoResponse>), AppError> {
    req.validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let video = state.videos.create_video(req.title, req.description).await?;
    tracing::info!("🎞️  Created video record {}", video.id);

    Ok((StatusCode::CREATED, Json(VideoResponse::signed(&state, video).await?)))
}

#[utoipa::path(
    get,
    path = "/videos",
    responses(
        (status = 200, description = "All video records", body = [VideoResponse])
    ),
    tag = "videos"
)]
pub async fn list_videos(
    State(state): State<AppState>,
) -> Result<Json<Vec<VideoResponse>>, AppError> {
    let records = state.videos.list_videos().await?;

    let mut response = Vec::with_capacity(records.len());
    for video in records {
        response.push(VideoResponse::signed(&state, video).await?);
    }
    Ok(Json(response))
}

#[utoipa::path(
    get,
    path = "/videos/{id}",
    params(("id" = String, Path, description = "Video id")),
    responses(
        (status = 200, description = "Video record with a fresh access URL", body = VideoResponse),
        (status = 404, description = "Video not found")
    ),
    tag = "videos"
)]
pub async fn get_video(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<VideoResponse>, AppError> {
    let video = state
        .videos
        .get_video(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Video {} not found", id)))?;

    Ok(Json(VideoResponse::signed(&state, video).await?))
}

#[utoipa::path(
    post,
    path = "/videos/{id}/upload",
    params(("id" = String, Path, description = "Video id")),
    request_body(content = Multipart, description = "MP4 file in the `video` field"),
    responses(
        (status = 200, description = "Video ingested", body = VideoResponse),
        (status = 404, description = "Video not found"),
        (status = 413, description = "Upload too large"),
        (status = 415, description = "Not an MP4 upload")
    ),
    tag = "videos"
)]
pub async fn upload_video(
    State(state): State<AppState>,
    Path(id): Path<String>,
    mut multipart: Multipart,
) -> Result<Json<VideoResponse>, AppError> {
    let result: Result<Json<VideoResponse>, AppError> = async {
        let mut outcome = None;

        while let Some(field) = multipart.next_field().await.map_err(|e| {
            let err_msg = e.to_string();
            if err_msg.contains("length limit exceeded") {
                AppError::PayloadTooLarge(
                    "Request body exceeds the maximum allowed limit".to_string(),
                )
            } else {
                AppError::BadRequest(err_msg)
            }
        })? {
            if field.name() != Some(VIDEO_FIELD) {
                continue;
            }

            let content_type = field.content_type().map(|s| s.to_string());
            let reader = StreamReader::new(field.map_err(std::io::Error::other));

            outcome = Some(
                state
                    .ingest
                    .ingest_video(&id, UploadedAsset::new(content_type, reader))
                    .await?,
            );
            break;
        }

        let outcome = outcome
            .ok_or_else(|| AppError::BadRequest("No video file provided".to_string()))?;

        // The stored reference stays unsigned; only this response carries a URL
        let video = outcome.video;
        Ok(Json(VideoResponse {
            id: video.id,
            title: video.title,
            description: video.description,
            video_url: Some(outcome.access_url.url),
            video_url_expires_at: Some(outcome.access_url.expires_at),
            created_at: video.created_at,
            updated_at: video.updated_at,
        }))
    }
    .await;

    if let Err(e) = &result {
        // Drain what the client is still sending so it sees our response instead of a reset
        tracing::warn!("Upload failed early: {}. Consuming remaining stream...", e);
        while let Ok(Some(mut field)) = multipart.next_field().await {
            while let Ok(Some(_)) = field.chunk().await {}
        }
    }

    result
}
