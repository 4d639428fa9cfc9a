use super::IngestError;
use crate::services::media_tool::MediaTool;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use utoipa::ToSchema;

/// Absorbs rounding in common resolutions (1920x1080, 1280x720, 854x480, ...).
pub const RATIO_TOLERANCE: f64 = 1e-2;

const LANDSCAPE_RATIO: f64 = 16.0 / 9.0;
const PORTRAIT_RATIO: f64 = 9.0 / 16.0;

/// Coarse orientation of a video frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum OrientationCategory {
    /// 16:9
    Landscape,
    /// 9:16
    Portrait,
    Other,
}

impl OrientationCategory {
    /// Prefix used in object keys
    pub fn as_str(&self) -> &'static str {
        match self {
            OrientationCategory::Landscape => "landscape",
            OrientationCategory::Portrait => "portrait",
            OrientationCategory::Other => "other",
        }
    }

    /// Aspect ratio label as reported to users
    pub fn aspect_label(&self) -> &'static str {
        match self {
            OrientationCategory::Landscape => "16:9",
            OrientationCategory::Portrait => "9:16",
            OrientationCategory::Other => "other",
        }
    }
}

impl fmt::Display for OrientationCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn within_tolerance(a: f64, b: f64) -> bool {
    (a - b).abs() < RATIO_TOLERANCE
}

pub fn classify_ratio(ratio: f64) -> OrientationCategory {
    if within_tolerance(ratio, LANDSCAPE_RATIO) {
        OrientationCategory::Landscape
    } else if within_tolerance(ratio, PORTRAIT_RATIO) {
        OrientationCategory::Portrait
    } else {
        OrientationCategory::Other
    }
}

/// Zero dimensions mean "unknown" and classify as `Other`.
pub fn classify_dimensions(width: f64, height: f64) -> OrientationCategory {
    if width == 0.0 || height == 0.0 {
        return OrientationCategory::Other;
    }
    classify_ratio(width / height)
}

/// Probe `path` and classify its first stream.
///
/// A file without streams is `Other`; only a failed or unparsable probe is an error.
pub async fn classify_file(
    tool: &dyn MediaTool,
    path: &Path,
) -> Result<OrientationCategory, IngestError> {
    let probe = tool.probe(path).await?;

    let category = match probe.primary_dimensions() {
        Some((width, height)) => classify_dimensions(width, height),
        None => {
            tracing::debug!("No streams reported for {}", path.display());
            OrientationCategory::Other
        }
    };

    tracing::debug!("Classified {} as {}", path.display(), category.aspect_label());
    Ok(category)
}
