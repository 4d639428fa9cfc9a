use crate::config::IngestConfig;
use crate::services::ingest::IngestError;
use async_trait::async_trait;
use serde::Deserialize;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use std::time::Duration;
use tokio::process::Command;

/// Stream metadata as reported by `ffprobe -show_streams`.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ProbeOutput {
    #[serde(default)]
    pub streams: Vec<ProbeStream>,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct ProbeStream {
    pub codec_type: Option<String>,
    #[serde(default)]
    pub width: f64,
    #[serde(default)]
    pub height: f64,
}

impl ProbeOutput {
    /// Dimensions of the first stream, if there is one.
    pub fn primary_dimensions(&self) -> Option<(f64, f64)> {
        self.streams.first().map(|s| (s.width, s.height))
    }
}

/// Trait for the external media tooling used during ingestion
#[async_trait]
pub trait MediaTool: Send + Sync {
    /// Read stream metadata from a media file
    async fn probe(&self, path: &Path) -> Result<ProbeOutput, IngestError>;

    /// Rewrite `input` into `output` with the index ahead of the media data,
    /// copying streams without re-encoding
    async fn remux_fast_start(&self, input: &Path, output: &Path) -> Result<(), IngestError>;
}

/// `MediaTool` backed by the ffprobe and ffmpeg binaries
pub struct FfmpegMediaTool {
    ffprobe: PathBuf,
    ffmpeg: PathBuf,
    timeout: Duration,
}

impl FfmpegMediaTool {
    pub fn new(ffprobe: PathBuf, ffmpeg: PathBuf, timeout: Duration) -> Self {
        Self {
            ffprobe,
            ffmpeg,
            timeout,
        }
    }

    pub fn from_config(config: &IngestConfig) -> Self {
        Self::new(
            config.ffprobe_path.clone(),
            config.ffmpeg_path.clone(),
            config.process_timeout(),
        )
    }

    /// Check that both binaries can be spawned
    pub async fn health_check(&self) -> bool {
        for program in [&self.ffprobe, &self.ffmpeg] {
            let args = vec![OsString::from("-version")];
            match self.run(program, args).await {
                Ok(output) if output.status.success() => {}
                _ => return false,
            }
        }
        true
    }

    /// Spawn `program` and wait for it, killing it if the timeout elapses or
    /// the calling future is dropped.
    async fn run(&self, program: &Path, args: Vec<OsString>) -> Result<Output, String> {
        let name = program
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| program.to_string_lossy().to_string());

        let child = Command::new(program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| format!("failed to spawn {}: {}", name, e))?;

        match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => Ok(output),
            Ok(Err(e)) => Err(format!("{} failed: {}", name, e)),
            Err(_) => Err(format!("{} timed out after {:?}", name, self.timeout)),
        }
    }
}

#[async_trait]
impl MediaTool for FfmpegMediaTool {
    async fn probe(&self, path: &Path) -> Result<ProbeOutput, IngestError> {
        let output = self
            .run(&self.ffprobe, probe_args(path))
            .await
            .map_err(IngestError::Probe)?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            tracing::error!("ffprobe failed on {}: {}", path.display(), stderr.trim());
            return Err(IngestError::Probe(format!(
                "ffprobe exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        parse_probe_output(&output.stdout)
    }

    async fn remux_fast_start(&self, input: &Path, output: &Path) -> Result<(), IngestError> {
        let result = self
            .run(&self.ffmpeg, remux_args(input, output))
            .await
            .map_err(IngestError::Remux)?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            tracing::error!("ffmpeg remux failed on {}: {}", input.display(), stderr.trim());
            return Err(IngestError::Remux(format!(
                "ffmpeg exited with {}: {}",
                result.status,
                stderr.trim()
            )));
        }

        Ok(())
    }
}

/// `ffprobe -v error -print_format json -show_streams <path>`
fn probe_args(path: &Path) -> Vec<OsString> {
    let mut args: Vec<OsString> = ["-v", "error", "-print_format", "json", "-show_streams"]
        .into_iter()
        .map(OsString::from)
        .collect();
    args.push(path.as_os_str().to_owned());
    args
}

/// Stream copy only: moving the index must never re-encode.
fn remux_args(input: &Path, output: &Path) -> Vec<OsString> {
    vec![
        OsString::from("-y"),
        OsString::from("-i"),
        input.as_os_str().to_owned(),
        OsString::from("-c"),
        OsString::from("copy"),
        OsString::from("-movflags"),
        OsString::from("faststart"),
        OsString::from("-f"),
        OsString::from("mp4"),
        output.as_os_str().to_owned(),
    ]
}

pub fn parse_probe_output(stdout: &[u8]) -> Result<ProbeOutput, IngestError> {
    serde_json::from_slice(stdout)
        .map_err(|e| IngestError::Probe(format!("invalid ffprobe output: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ffprobe_streams() {
        let json = br#"{
            "streams": [
                {"index": 0, "codec_type": "video", "codec_name": "h264", "width": 1920, "height": 1080},
                {"index": 1, "codec_type": "audio", "codec_name": "aac", "channels": 2}
            ]
        }"#;
        let output = parse_probe_output(json).unwrap();
        assert_eq!(output.streams.len(), 2);
        assert_eq!(output.primary_dimensions(), Some((1920.0, 1080.0)));
        assert_eq!(output.streams[1].width, 0.0);
        assert_eq!(output.streams[0].codec_type.as_deref(), Some("video"));
    }

    #[test]
    fn test_parse_ffprobe_without_streams() {
        let output = parse_probe_output(b"{}").unwrap();
        assert!(output.primary_dimensions().is_none());
    }

    #[test]
    fn test_parse_ffprobe_garbage_is_probe_error() {
        let err = parse_probe_output(b"not json").unwrap_err();
        assert!(matches!(err, IngestError::Probe(_)));

        let err = parse_probe_output(br#"{"streams": "nope"}"#).unwrap_err();
        assert!(matches!(err, IngestError::Probe(_)));
    }

    fn strings(args: Vec<OsString>) -> Vec<String> {
        args.into_iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_probe_args() {
        assert_eq!(
            strings(probe_args(Path::new("/tmp/ingest-a.mp4"))),
            ["-v", "error", "-print_format", "json", "-show_streams", "/tmp/ingest-a.mp4"]
        );
    }

    #[test]
    fn test_remux_args_copy_streams() {
        assert_eq!(
            strings(remux_args(
                Path::new("/tmp/ingest-a.mp4"),
                Path::new("/tmp/ingest-a.mp4.processing")
            )),
            [
                "-y",
                "-i",
                "/tmp/ingest-a.mp4",
                "-c",
                "copy",
                "-movflags",
                "faststart",
                "-f",
                "mp4",
                "/tmp/ingest-a.mp4.processing"
            ]
        );
    }

    /// Needs ffmpeg and ffprobe on PATH; returns early otherwise.
    #[tokio::test]
    async fn test_remux_of_fast_start_file_is_stable() {
        let tool = FfmpegMediaTool::new(
            PathBuf::from("ffprobe"),
            PathBuf::from("ffmpeg"),
            Duration::from_secs(60),
        );
        if !tool.health_check().await {
            eprintln!("ffmpeg/ffprobe not installed, skipping");
            return;
        }

        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("source.mp4");
        let status = Command::new("ffmpeg")
            .args(["-v", "error", "-y", "-f", "lavfi", "-i"])
            .arg("testsrc=size=320x180:rate=10:duration=1")
            .args(["-c:v", "mpeg4", "-movflags", "faststart", "-f", "mp4"])
            .arg(&source)
            .status()
            .await
            .unwrap();
        if !status.success() {
            eprintln!("ffmpeg cannot synthesize a test clip, skipping");
            return;
        }

        let once = dir.path().join("once.mp4");
        let twice = dir.path().join("twice.mp4");
        tool.remux_fast_start(&source, &once).await.unwrap();
        tool.remux_fast_start(&once, &twice).await.unwrap();

        for path in [&source, &once, &twice] {
            let probe = tool.probe(path).await.unwrap();
            assert_eq!(probe.primary_dimensions(), Some((320.0, 180.0)));
        }
        assert_eq!(
            std::fs::metadata(&once).unwrap().len(),
            std::fs::metadata(&twice).unwrap().len()
        );
    }

    #[tokio::test]
    async fn test_missing_binary_is_probe_error() {
        let tool = FfmpegMediaTool::new(
            PathBuf::from("/nonexistent/ffprobe"),
            PathBuf::from("/nonexistent/ffmpeg"),
            Duration::from_secs(5),
        );
        let err = tool.probe(Path::new("/tmp/whatever.mp4")).await.unwrap_err();
        assert!(matches!(err, IngestError::Probe(_)));

        let err = tool
            .remux_fast_start(Path::new("/tmp/in.mp4"), Path::new("/tmp/out.mp4"))
            .await
            .unwrap_err();
        assert!(matches!(err, IngestError::Remux(_)));
        assert!(!tool.health_check().await);
    }
}
