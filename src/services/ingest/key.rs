use super::{IngestError, OrientationCategory};
use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};

/// 256 bits of entropy per key
pub const KEY_ENTROPY_BYTES: usize = 32;

pub const OBJECT_EXTENSION: &str = "mp4";

/// Build `<category>/<64 hex chars>.mp4` from `rng`.
pub fn generate_object_key<R>(
    category: OrientationCategory,
    rng: &mut R,
) -> Result<String, IngestError>
where
    R: RngCore + CryptoRng + ?Sized,
{
    let mut entropy = [0u8; KEY_ENTROPY_BYTES];
    rng.try_fill_bytes(&mut entropy)
        .map_err(|e| IngestError::Entropy(e.to_string()))?;

    Ok(format!(
        "{}/{}.{}",
        category.as_str(),
        hex::encode(entropy),
        OBJECT_EXTENSION
    ))
}

/// Object key drawn from the operating system's CSPRNG
pub fn new_object_key(category: OrientationCategory) -> Result<String, IngestError> {
    generate_object_key(category, &mut OsRng)
}
