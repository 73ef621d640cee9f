//! Catalog source locations.
//!
//! The index can come from a remote repository URL (downloaded into the
//! artifact directory before parsing) or from a file already on disk.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::fetch::transport::ArtifactTransport;

use super::CatalogError;

/// Filename the downloaded index is stored under.
const INDEX_FILENAME: &str = "index.xml";

/// Where the catalog index document comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogSource {
    /// Remote index URL, downloaded before parsing.
    Remote(String),
    /// Index file already on disk.
    Local(PathBuf),
}

impl CatalogSource {
    /// Classifies a source string: anything with an HTTP scheme is remote,
    /// everything else is a local path.
    pub fn parse(source: &str) -> Self {
        if source.starts_with("http://") || source.starts_with("https://") {
            Self::Remote(source.to_string())
        } else {
            Self::Local(PathBuf::from(source))
        }
    }

    /// Loads the raw index document.
    ///
    /// Remote sources are downloaded into `storage_dir` first, so a copy of
    /// the index used for the run stays next to the artifacts it describes.
    ///
    /// # Errors
    ///
    /// Any failure here is fatal to the run: a download error or non-success
    /// status yields [`CatalogError::Fetch`], an unreadable local file
    /// [`CatalogError::Io`].
    pub async fn load(
        &self,
        transport: &dyn ArtifactTransport,
        storage_dir: &Path,
    ) -> Result<String, CatalogError> {
        let path = match self {
            Self::Remote(url) => {
                let dest = storage_dir.join(INDEX_FILENAME);
                info!(url = %url, dest = %dest.display(), "downloading catalog index");
                transport
                    .download(url, &dest, None)
                    .await
                    .map_err(|e| CatalogError::Fetch {
                        url: url.clone(),
                        reason: e.to_string(),
                    })?;
                dest
            }
            Self::Local(path) => path.clone(),
        };

        tokio::fs::read_to_string(&path)
            .await
            .map_err(|source| CatalogError::Io { path, source })
    }
}
