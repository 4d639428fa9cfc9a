use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Configuration for the video ingestion pipeline
#[derive(Debug, Clone)]
pub struct IngestConfig {
    /// Maximum accepted upload size in bytes (default: 1 GiB)
    pub max_upload_size: usize,

    /// The only media type accepted for upload (default: "video/mp4")
    pub allowed_media_type: String,

    /// Directory for per-request staging files (default: OS temp dir)
    pub temp_dir: PathBuf,

    /// ffprobe binary (default: "ffprobe" from PATH)
    pub ffprobe_path: PathBuf,

    /// ffmpeg binary (default: "ffmpeg" from PATH)
    pub ffmpeg_path: PathBuf,

    /// Upper bound on a single probe/remux invocation in seconds (default: 300)
    pub process_timeout_secs: u64,

    /// Lifetime of issued access URLs in seconds (default: 300)
    pub presign_expiry_secs: u64,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            max_upload_size: 1024 * 1024 * 1024, // 1 GiB
            allowed_media_type: "video/mp4".to_string(),
            temp_dir: env::temp_dir(),
            ffprobe_path: PathBuf::from("ffprobe"),
            ffmpeg_path: PathBuf::from("ffmpeg"),
            process_timeout_secs: 300,
            presign_expiry_secs: 5 * 60,
        }
    }
}

impl IngestConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            max_upload_size: env::var("MAX_UPLOAD_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.max_upload_size),

            allowed_media_type: env::var("ALLOWED_MEDIA_TYPE")
                .unwrap_or(default.allowed_media_type),

            temp_dir: env::var("INGEST_TEMP_DIR")
                .map(PathBuf::from)
                .unwrap_or(default.temp_dir),

            ffprobe_path: env::var("FFPROBE_PATH")
                .map(PathBuf::from)
                .unwrap_or(default.ffprobe_path),

            ffmpeg_path: env::var("FFMPEG_PATH")
                .map(PathBuf::from)
                .unwrap_or(default.ffmpeg_path),

            process_timeout_secs: env::var("MEDIA_PROCESS_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.process_timeout_secs),

            presign_expiry_secs: env::var("PRESIGN_EXPIRY_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.presign_expiry_secs),
        }
    }

    /// Create config for development (short process timeout)
    pub fn development() -> Self {
        Self {
            process_timeout_secs: 60,
            ..Self::default()
        }
    }

    pub fn process_timeout(&self) -> Duration {
        Duration::from_secs(self.process_timeout_secs)
    }

    pub fn presign_expiry(&self) -> Duration {
        Duration::from_secs(self.presign_expiry_secs)
    }
}

/// Object store identity and signing credentials
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Custom endpoint for S3-compatible stores such as MinIO
    pub endpoint: Option<String>,

    /// Region used for request signing (default: "us-east-1")
    pub region: String,

    /// Bucket that receives new uploads
    pub bucket: String,

    /// Static access key; the default credential chain is used when absent
    pub access_key: Option<String>,

    /// Static secret key; the default credential chain is used when absent
    pub secret_key: Option<String>,

    /// Path-style addressing (required by MinIO)
    pub force_path_style: bool,
}

impl StorageConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        let bucket = env::var("S3_BUCKET")
            .map_err(|_| anyhow::anyhow!("S3_BUCKET must be set"))?;
        let endpoint = env::var("S3_ENDPOINT").ok().filter(|v| !v.is_empty());

        Ok(Self {
            // A custom endpoint almost always means MinIO, which wants path-style URLs
            force_path_style: env::var("S3_FORCE_PATH_STYLE")
                .map(|v| v.to_lowercase() == "true" || v == "1")
                .unwrap_or(endpoint.is_some()),
            endpoint,
            region: env::var("S3_REGION").unwrap_or_else(|_| "us-east-1".to_string()),
            bucket,
            access_key: env::var("S3_ACCESS_KEY").ok(),
            secret_key: env::var("S3_SECRET_KEY").ok(),
        })
    }

    /// Local MinIO defaults
    pub fn development() -> Self {
        Self {
            endpoint: Some("http://127.0.0.1:9000".to_string()),
            region: "us-east-1".to_string(),
            bucket: "videos".to_string(),
            access_key: Some("minioadmin".to_string()),
            secret_key: Some("minioadmin".to_string()),
            force_path_style: true,
        }
    }
}
