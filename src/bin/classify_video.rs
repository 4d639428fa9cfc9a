use clap::Parser;
use dotenvy::dotenv;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use video_ingest::config::IngestConfig;
use video_ingest::services::ingest::classifier::classify_file;
use video_ingest::services::ingest::key::new_object_key;
use video_ingest::services::media_tool::{FfmpegMediaTool, MediaTool};

/// Classify local video files the same way uploads are classified
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Video files to inspect
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Also write a fast-start copy of the (single) input here
    #[arg(long)]
    remux_to: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "classify_video=info,video_ingest=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = IngestConfig::from_env();
    let tool = FfmpegMediaTool::from_config(&config);

    if !tool.health_check().await {
        error!(
            "❌ Cannot run {} / {}. Set FFPROBE_PATH and FFMPEG_PATH.",
            config.ffprobe_path.display(),
            config.ffmpeg_path.display()
        );
        std::process::exit(1);
    }

    if args.remux_to.is_some() && args.files.len() != 1 {
        error!("❌ --remux-to takes exactly one input file");
        std::process::exit(1);
    }

    let mut failures = 0;
    for file in &args.files {
        match classify_file(&tool, file).await {
            Ok(category) => {
                let sample_key = new_object_key(category)?;
                println!(
                    "{}\t{}\t{}",
                    file.display(),
                    category.aspect_label(),
                    sample_key
                );
            }
            Err(e) => {
                error!("❌ {}: {}", file.display(), e);
                failures += 1;
            }
        }
    }

    if let (Some(output), Some(input)) = (&args.remux_to, args.files.first()) {
        tool.remux_fast_start(input, output).await?;
        info!("✅ Wrote fast-start copy to {}", output.display());
    }

    if failures > 0 {
        error!("{} of {} files could not be classified", failures, args.files.len());
        std::process::exit(1);
    }

    Ok(())
}
