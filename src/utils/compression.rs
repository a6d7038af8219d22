use crate::utils::error::{ImporterError, Result};
use flate2::read::MultiGzDecoder;
use std::io::Read;

pub const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

pub fn is_gzip(data: &[u8]) -> bool {
    data.starts_with(&GZIP_MAGIC)
}

/// Fully decodes a gzip body, every member of a concatenated stream included.
/// Used by stores that serve decompressed reads.
pub fn gunzip(name: &str, data: &[u8]) -> Result<Vec<u8>> {
    let mut decoder = MultiGzDecoder::new(data);
    let mut out = Vec::new();
    decoder
        .read_to_end(&mut out)
        .map_err(|e| ImporterError::DecompressionFailure {
            name: name.to_string(),
            message: e.to_string(),
        })?;
    Ok(out)
}
