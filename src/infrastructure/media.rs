use crate::config::IngestConfig;
use crate::services::media_tool::FfmpegMediaTool;
use std::sync::Arc;
use tracing::info;

pub async fn setup_media_tool(config: &IngestConfig) -> Arc<FfmpegMediaTool> {
    let tool = FfmpegMediaTool::from_config(config);

    if tool.health_check().await {
        info!(
            "🎬 Media tools ready: {} / {}",
            config.ffprobe_path.display(),
            config.ffmpeg_path.display()
        );
    } else {
        tracing::warn!(
            "⚠️  ffprobe/ffmpeg not runnable ({} / {}). Video uploads will fail until they are installed.",
            config.ffprobe_path.display(),
            config.ffmpeg_path.display()
        );
    }

    Arc::new(tool)
}
