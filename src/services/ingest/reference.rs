use super::IngestError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Location of an ingested object: bucket plus key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredObjectReference {
    pub bucket: String,
    pub key: String,
}

impl StoredObjectReference {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    /// Legacy single-column encoding `"<bucket>,<key>"`.
    ///
    /// There is no escaping, so neither part may contain a comma.
    pub fn to_composite(&self) -> String {
        format!("{},{}", self.bucket, self.key)
    }

    /// Parse the legacy `"<bucket>,<key>"` encoding.
    pub fn parse_composite(value: &str) -> Result<Self, IngestError> {
        let parts: Vec<&str> = value.split(',').collect();
        match parts.as_slice() {
            [bucket, key] if !bucket.is_empty() && !key.is_empty() => {
                Ok(Self::new(*bucket, *key))
            }
            _ => Err(IngestError::MalformedReference(format!(
                "expected \"<bucket>,<key>\", got {:?}",
                value
            ))),
        }
    }
}

impl fmt::Display for StoredObjectReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.bucket, self.key)
    }
}

impl FromStr for StoredObjectReference {
    type Err = IngestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_composite(s)
    }
}
