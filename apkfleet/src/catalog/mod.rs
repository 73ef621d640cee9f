//! Repository catalog parsing and artifact resolution.
//!
//! The catalog is an F-Droid-style `index.xml` document: a sequence of
//! `<application>` entries, each owning zero or more `<package>` artifact
//! entries. Resolution selects, per requested package identifier, the single
//! artifact with the greatest valid version code.
//!
//! # Example
//!
//! ```ignore
//! use apkfleet::catalog;
//!
//! let requested = ["com.termux".to_string()].into_iter().collect();
//! let selected = catalog::resolve(&requested, &raw_index, storage_dir)?;
//! for descriptor in selected.values() {
//!     println!("{} v{} ({})", descriptor.package_id, descriptor.version, descriptor.artifact_name);
//! }
//! ```

mod descriptor;
mod parser;
mod source;

use std::path::PathBuf;

use thiserror::Error;

pub use descriptor::ArtifactDescriptor;
pub use parser::resolve;
pub use source::CatalogSource;

/// Errors that can occur while obtaining or parsing the catalog.
///
/// All of these abort the whole run: without a catalog no package can be
/// resolved.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The index document is not well-formed.
    #[error("malformed catalog index: {0}")]
    Parse(String),

    /// Failed to download the index from its remote source.
    #[error("failed to fetch catalog index from {url}: {reason}")]
    Fetch { url: String, reason: String },

    /// Failed to read a local index file.
    #[error("failed to read catalog index {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}
