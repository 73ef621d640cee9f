//! Resolved artifact metadata.

use std::path::{Path, PathBuf};

/// Metadata for the single artifact selected for one package.
///
/// Descriptors are created once during catalog resolution and read-only
/// afterward. The local storage path is derived from the artifact filename,
/// so no two packages ever share a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactDescriptor {
    /// Stable package identifier (e.g. `org.fdroid.fdroid`).
    pub package_id: String,

    /// Human-readable version string. Display only; never used for selection
    /// or URL construction.
    pub version: String,

    /// Monotonically increasing release number, used to pick the latest
    /// artifact.
    pub version_code: i64,

    /// Artifact filename. Doubles as the relative path appended to mirror
    /// base URLs and as the cache key on disk.
    pub artifact_name: String,

    /// Expected SHA-256 digest of the artifact, hex-encoded. Compared
    /// case-insensitively.
    pub expected_digest: String,

    local_path: PathBuf,
}

impl ArtifactDescriptor {
    /// Creates a descriptor, deriving the local storage path from the
    /// artifact filename.
    pub fn new(
        package_id: impl Into<String>,
        version: impl Into<String>,
        version_code: i64,
        artifact_name: impl Into<String>,
        expected_digest: impl Into<String>,
        storage_dir: &Path,
    ) -> Self {
        let artifact_name = artifact_name.into();
        let local_path = storage_dir.join(&artifact_name);
        Self {
            package_id: package_id.into(),
            version: version.into(),
            version_code,
            artifact_name,
            expected_digest: expected_digest.into(),
            local_path,
        }
    }

    /// Path where the artifact is stored locally.
    pub fn local_path(&self) -> &Path {
        &self.local_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_path_derived_from_artifact_name() {
        let descriptor = ArtifactDescriptor::new(
            "com.example.app",
            "1.2",
            12,
            "com.example.app_12.apk",
            "abc123",
            Path::new("/var/cache/apks"),
        );

        assert_eq!(
            descriptor.local_path(),
            Path::new("/var/cache/apks/com.example.app_12.apk")
        );
    }

    #[test]
    fn test_version_and_artifact_name_are_distinct() {
        let descriptor = ArtifactDescriptor::new(
            "com.example.app",
            "1.2",
            12,
            "com.example.app_12.apk",
            "abc123",
            Path::new("/tmp"),
        );

        assert_eq!(descriptor.version, "1.2");
        assert_eq!(descriptor.artifact_name, "com.example.app_12.apk");
        assert_ne!(descriptor.version, descriptor.artifact_name);
    }
}
