//! Prioritized mirror lists and ordered mirror probing.
//!
//! Repositories are served from many mirrors of varying reliability. Before
//! transferring an artifact, the resolver probes each base URL in priority
//! order with a lightweight existence check and uses the first that answers.
//! Probing before the full transfer avoids wasting bandwidth and makes fetch
//! failures attributable to "no mirror" vs "transfer error".

use std::sync::Arc;

use tracing::debug;

use crate::fetch::transport::ArtifactTransport;

/// Ordered list of mirror base URLs. Priority is list order; duplicates are
/// kept as given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorList {
    bases: Vec<String>,
}

impl MirrorList {
    /// Creates a mirror list from base URLs, highest priority first.
    pub fn new(bases: Vec<String>) -> Self {
        Self { bases }
    }

    /// Number of mirrors in the list.
    pub fn len(&self) -> usize {
        self.bases.len()
    }

    /// True when no mirrors are configured.
    pub fn is_empty(&self) -> bool {
        self.bases.is_empty()
    }

    /// Iterates base URLs in priority order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.bases.iter().map(String::as_str)
    }

    /// Full artifact URL for a relative path on the given base.
    fn join(base: &str, relative_path: &str) -> String {
        format!("{}/{}", base.trim_end_matches('/'), relative_path)
    }
}

impl<S: Into<String>> FromIterator<S> for MirrorList {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        Self::new(iter.into_iter().map(Into::into).collect())
    }
}

/// Resolves an artifact's relative path to the first mirror that serves it.
pub struct MirrorResolver {
    transport: Arc<dyn ArtifactTransport>,
}

impl MirrorResolver {
    /// Creates a resolver probing through the given transport.
    pub fn new(transport: Arc<dyn ArtifactTransport>) -> Self {
        Self { transport }
    }

    /// Probes mirrors strictly in priority order and returns the first full
    /// URL that answers the existence check successfully.
    ///
    /// A mirror that errors, times out, or answers with a non-success status
    /// is skipped silently. `None` after exhausting the list is not fatal to
    /// the run, only to the calling package's fetch.
    pub async fn resolve(&self, relative_path: &str, mirrors: &MirrorList) -> Option<String> {
        for base in mirrors.iter() {
            let url = MirrorList::join(base, relative_path);
            match self.transport.probe(&url).await {
                Ok(true) => {
                    debug!(url = %url, "mirror answered probe");
                    return Some(url);
                }
                Ok(false) => {
                    debug!(url = %url, "mirror does not serve artifact, trying next");
                }
                Err(e) => {
                    debug!(url = %url, error = %e, "mirror probe failed, trying next");
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    use crate::fetch::transport::{ProgressCallback, TransportError};
    use crate::BoxFuture;
    use std::path::Path;

    /// Probe-only transport: URLs in `serves` answer true, URLs in `errors`
    /// fail outright, everything else answers false.
    struct ProbeTransport {
        serves: HashSet<String>,
        errors: HashSet<String>,
    }

    impl ProbeTransport {
        fn new(serves: &[&str], errors: &[&str]) -> Self {
            Self {
                serves: serves.iter().map(|s| s.to_string()).collect(),
                errors: errors.iter().map(|s| s.to_string()).collect(),
            }
        }
    }

    impl ArtifactTransport for ProbeTransport {
        fn probe<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<bool, TransportError>> {
            Box::pin(async move {
                if self.errors.contains(url) {
                    return Err(TransportError::Request {
                        url: url.to_string(),
                        reason: "connection refused".to_string(),
                    });
                }
                Ok(self.serves.contains(url))
            })
        }

        fn download<'a>(
            &'a self,
            _url: &'a str,
            _dest: &'a Path,
            _progress: Option<ProgressCallback>,
        ) -> BoxFuture<'a, Result<u64, TransportError>> {
            Box::pin(async move { unreachable!("probe-only transport") })
        }
    }

    fn mirrors(bases: &[&str]) -> MirrorList {
        bases.iter().copied().collect()
    }

    #[tokio::test]
    async fn test_first_serving_mirror_wins() {
        let transport = Arc::new(ProbeTransport::new(
            &["https://b.example/repo/a.apk", "https://c.example/repo/a.apk"],
            &[],
        ));
        let resolver = MirrorResolver::new(transport);
        let list = mirrors(&[
            "https://a.example/repo",
            "https://b.example/repo",
            "https://c.example/repo",
        ]);

        let url = resolver.resolve("a.apk", &list).await;
        assert_eq!(url.as_deref(), Some("https://b.example/repo/a.apk"));
    }

    #[tokio::test]
    async fn test_erroring_mirror_is_skipped() {
        let transport = Arc::new(ProbeTransport::new(
            &["https://b.example/repo/a.apk"],
            &["https://a.example/repo/a.apk"],
        ));
        let resolver = MirrorResolver::new(transport);
        let list = mirrors(&["https://a.example/repo", "https://b.example/repo"]);

        let url = resolver.resolve("a.apk", &list).await;
        assert_eq!(url.as_deref(), Some("https://b.example/repo/a.apk"));
    }

    #[tokio::test]
    async fn test_exhausted_list_returns_none() {
        let transport = Arc::new(ProbeTransport::new(&[], &[]));
        let resolver = MirrorResolver::new(transport);
        let list = mirrors(&["https://a.example/repo", "https://b.example/repo"]);

        assert!(resolver.resolve("a.apk", &list).await.is_none());
    }

    #[tokio::test]
    async fn test_empty_list_returns_none() {
        let transport = Arc::new(ProbeTransport::new(&[], &[]));
        let resolver = MirrorResolver::new(transport);

        assert!(resolver.resolve("a.apk", &mirrors(&[])).await.is_none());
    }

    #[test]
    fn test_join_handles_trailing_slash() {
        assert_eq!(
            MirrorList::join("https://a.example/repo/", "a.apk"),
            "https://a.example/repo/a.apk"
        );
        assert_eq!(
            MirrorList::join("https://a.example/repo", "a.apk"),
            "https://a.example/repo/a.apk"
        );
    }
}
