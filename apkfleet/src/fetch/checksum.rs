//! Streaming SHA-256 digests for downloaded artifacts.

use std::path::Path;

use sha2::{Digest, Sha256};
use tokio::io::AsyncReadExt;

use super::FetchError;

/// Buffer size for reading files during digest calculation (64KB).
const BUFFER_SIZE: usize = 64 * 1024;

/// Calculates the SHA-256 digest of a file.
///
/// The file is streamed through the hasher in fixed-size chunks; it is never
/// loaded into memory at once.
///
/// # Returns
///
/// The lowercase hexadecimal SHA-256 digest of the file contents.
///
/// # Errors
///
/// Returns an error if the file cannot be read.
pub async fn calculate_file_digest(path: &Path) -> Result<String, FetchError> {
    let mut file = tokio::fs::File::open(path)
        .await
        .map_err(|e| FetchError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; BUFFER_SIZE];

    loop {
        let bytes_read = file.read(&mut buffer).await.map_err(|e| FetchError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        if bytes_read == 0 {
            break;
        }

        hasher.update(&buffer[..bytes_read]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}

/// Checks whether a file matches an expected hex digest.
///
/// The comparison is case-insensitive; catalogs are inconsistent about hex
/// casing. Deterministic and side-effect free: a mismatching file is left in
/// place for the caller to decide.
pub async fn digest_matches(path: &Path, expected: &str) -> Result<bool, FetchError> {
    let actual = calculate_file_digest(path).await?;
    Ok(actual.eq_ignore_ascii_case(expected))
}
