use super::IngestError;
use crate::services::media_tool::MediaTool;
use std::path::{Path, PathBuf};
use tempfile::TempPath;

pub const PROCESSING_SUFFIX: &str = ".processing";

/// `<input>.processing`
pub fn processing_path(input: &Path) -> PathBuf {
    let mut path = input.as_os_str().to_owned();
    path.push(PROCESSING_SUFFIX);
    PathBuf::from(path)
}

/// Remux `input` for fast start into `<input>.processing`.
///
/// The output path is owned by the returned guard from before the tool runs,
/// so a failed attempt leaves nothing behind. No retry: the transform is
/// deterministic and would fail the same way again.
pub async fn remux_for_fast_start(
    tool: &dyn MediaTool,
    input: &Path,
) -> Result<TempPath, IngestError> {
    let output = TempPath::from_path(processing_path(input));

    tool.remux_fast_start(input, &output).await?;

    tracing::debug!("Remuxed {} -> {}", input.display(), output.display());
    Ok(output)
}
