use std::fmt;
use thiserror::Error;

/// Position of one ingestion in its pipeline.
///
/// `Received → Staged → Classified → Remuxed → KeyAssigned → Uploaded → Finalized`.
/// A failure is reported against the state the pipeline was trying to reach.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestStage {
    Received,
    Staged,
    Classified,
    Remuxed,
    KeyAssigned,
    Uploaded,
    Finalized,
}

impl fmt::Display for IngestStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IngestStage::Received => "received",
            IngestStage::Staged => "staged",
            IngestStage::Classified => "classified",
            IngestStage::Remuxed => "remuxed",
            IngestStage::KeyAssigned => "key_assigned",
            IngestStage::Uploaded => "uploaded",
            IngestStage::Finalized => "finalized",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Payload Too Large: upload exceeds {limit} bytes")]
    PayloadTooLarge { limit: usize },

    #[error("Unsupported Media Type: {0}")]
    UnsupportedMediaType(String),

    #[error("Video Not Found: {0}")]
    VideoNotFound(String),

    #[error("Staging error: {0}")]
    Staging(#[from] std::io::Error),

    #[error("Probe error: {0}")]
    Probe(String),

    #[error("Remux error: {0}")]
    Remux(String),

    #[error("Entropy error: {0}")]
    Entropy(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Record error: {0}")]
    Record(String),

    #[error("Malformed reference: {0}")]
    MalformedReference(String),

    #[error("Signing error: {0}")]
    Signing(String),
}

impl IngestError {
    /// The state the failed transition was heading to.
    pub fn stage(&self) -> IngestStage {
        match self {
            IngestError::VideoNotFound(_) => IngestStage::Received,
            IngestError::PayloadTooLarge { .. }
            | IngestError::UnsupportedMediaType(_)
            | IngestError::Staging(_) => IngestStage::Staged,
            IngestError::Probe(_) => IngestStage::Classified,
            IngestError::Remux(_) => IngestStage::Remuxed,
            IngestError::Entropy(_) => IngestStage::KeyAssigned,
            IngestError::Storage(_) => IngestStage::Uploaded,
            IngestError::Record(_)
            | IngestError::MalformedReference(_)
            | IngestError::Signing(_) => IngestStage::Finalized,
        }
    }

    /// True when the caller sent something we refuse, false for infrastructure failures.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            IngestError::PayloadTooLarge { .. }
                | IngestError::UnsupportedMediaType(_)
                | IngestError::VideoNotFound(_)
        )
    }
}
