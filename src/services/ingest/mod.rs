pub mod classifier;
pub mod error;
pub mod key;
pub mod pipeline;
pub mod reference;
pub mod remux;
pub mod staging;

pub use classifier::OrientationCategory;
pub use error::{IngestError, IngestStage};
pub use pipeline::{IngestOutcome, IngestService};
pub use reference::StoredObjectReference;
pub use staging::UploadedAsset;
