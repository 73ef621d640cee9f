//! Typed extraction pass over the catalog index document.
//!
//! The walk is a single streaming pass: `<application>` entries outside the
//! requested set are skipped wholesale before any per-artifact work, and each
//! `<package>` artifact entry is either kept (all required fields present,
//! version code parses) or discarded with a warning. Discarding one entry
//! never removes the package from consideration; a later entry may still
//! supply a valid artifact.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use tracing::{debug, warn};

use super::descriptor::ArtifactDescriptor;
use super::CatalogError;

/// Leaf element currently being captured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    AppId,
    Version,
    VersionCode,
    ArtifactName,
    Digest,
}

/// Fields gathered while walking one `<package>` artifact entry.
#[derive(Debug, Default)]
struct PendingArtifact {
    version: Option<String>,
    version_code: Option<String>,
    artifact_name: Option<String>,
    digest: Option<String>,
}

/// Resolves the requested package identifiers against a raw catalog index.
///
/// Returns one [`ArtifactDescriptor`] per requested identifier that has at
/// least one valid artifact entry: the entry with the strictly greatest
/// version code, ties keeping the first encountered in document order.
/// Requested identifiers without a surviving entry are simply absent from the
/// map.
///
/// # Errors
///
/// A document that is not well-formed yields [`CatalogError::Parse`]; no
/// partial catalog is usable in that case.
pub fn resolve(
    requested: &HashSet<String>,
    raw_index: &str,
    storage_dir: &Path,
) -> Result<HashMap<String, ArtifactDescriptor>, CatalogError> {
    let mut reader = Reader::from_str(raw_index);
    let mut selected: HashMap<String, ArtifactDescriptor> = HashMap::new();

    let mut in_application = false;
    let mut app_id: Option<String> = None;
    let mut artifact: Option<PendingArtifact> = None;
    let mut field: Option<Field> = None;

    loop {
        match reader.read_event().map_err(parse_error)? {
            Event::Start(e) => match e.name().as_ref() {
                b"application" => {
                    in_application = true;
                    app_id = attribute_id(&e)?;
                }
                b"package" if in_application => {
                    match app_id.as_deref() {
                        // Applications outside the requested set are skipped
                        // before any per-artifact work.
                        Some(id) if !requested.contains(id) => {
                            let end = e.to_end().into_owned();
                            reader.read_to_end(end.name()).map_err(parse_error)?;
                        }
                        _ => artifact = Some(PendingArtifact::default()),
                    }
                }
                b"id" if in_application && artifact.is_none() => field = Some(Field::AppId),
                b"version" if artifact.is_some() => field = Some(Field::Version),
                b"versioncode" if artifact.is_some() => field = Some(Field::VersionCode),
                b"apkname" if artifact.is_some() => field = Some(Field::ArtifactName),
                b"hash" if artifact.is_some() => field = Some(Field::Digest),
                _ => {}
            },
            Event::Text(t) => {
                if let Some(f) = field {
                    let text = t.unescape().map_err(parse_error)?;
                    let text = text.trim();
                    if text.is_empty() {
                        continue;
                    }
                    match (f, artifact.as_mut()) {
                        (Field::AppId, None) => app_id = Some(text.to_string()),
                        (Field::Version, Some(a)) => a.version = Some(text.to_string()),
                        (Field::VersionCode, Some(a)) => a.version_code = Some(text.to_string()),
                        (Field::ArtifactName, Some(a)) => a.artifact_name = Some(text.to_string()),
                        (Field::Digest, Some(a)) => a.digest = Some(text.to_string()),
                        _ => {}
                    }
                }
            }
            Event::End(e) => match e.name().as_ref() {
                b"application" => {
                    in_application = false;
                    app_id = None;
                    field = None;
                }
                b"package" => {
                    if let Some(pending) = artifact.take() {
                        if let Some(id) = app_id.as_deref() {
                            if requested.contains(id) {
                                consider(&mut selected, id, pending, storage_dir);
                            }
                        }
                    }
                    field = None;
                }
                _ => field = None,
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(selected)
}

/// Keeps `pending` only if it beats the current best entry for `app_id`.
///
/// An entry missing a required field or carrying an unparsable version code
/// is discarded; selection requires a strictly greater version code, so equal
/// codes keep the first entry encountered.
fn consider(
    selected: &mut HashMap<String, ArtifactDescriptor>,
    app_id: &str,
    pending: PendingArtifact,
    storage_dir: &Path,
) {
    let PendingArtifact {
        version,
        version_code,
        artifact_name,
        digest,
    } = pending;

    let (Some(version), Some(code_text), Some(artifact_name), Some(digest)) =
        (version, version_code, artifact_name, digest)
    else {
        warn!(
            package = app_id,
            "artifact entry missing required fields, discarded"
        );
        return;
    };

    let version_code = match code_text.parse::<i64>() {
        Ok(code) => code,
        Err(_) => {
            warn!(
                package = app_id,
                versioncode = %code_text,
                "unparsable version code, artifact entry discarded"
            );
            return;
        }
    };

    match selected.get(app_id) {
        Some(current) if version_code <= current.version_code => {
            debug!(
                package = app_id,
                version_code,
                current = current.version_code,
                "artifact entry not newer, kept current"
            );
        }
        _ => {
            selected.insert(
                app_id.to_string(),
                ArtifactDescriptor::new(
                    app_id,
                    version,
                    version_code,
                    artifact_name,
                    digest,
                    storage_dir,
                ),
            );
        }
    }
}

/// Reads the optional `id` attribute of an `<application>` start tag.
///
/// The id is normally carried by a child `<id>` element as well; the
/// attribute lets the walk skip non-requested applications earlier.
fn attribute_id(e: &BytesStart<'_>) -> Result<Option<String>, CatalogError> {
    let attr = e
        .try_get_attribute("id")
        .map_err(|err| CatalogError::Parse(err.to_string()))?;
    match attr {
        Some(attr) => {
            let value = attr.unescape_value().map_err(parse_error)?;
            Ok(Some(value.into_owned()))
        }
        None => Ok(None),
    }
}

fn parse_error(err: quick_xml::Error) -> CatalogError {
    CatalogError::Parse(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn requested(ids: &[&str]) -> HashSet<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    fn storage() -> PathBuf {
        PathBuf::from("/tmp/apks")
    }

    const TWO_VERSIONS: &str = r#"
        <fdroid>
            <repo name="test repo"><description>artifacts</description></repo>
            <application id="pkg.a">
                <id>pkg.a</id>
                <package>
                    <version>1.3</version>
                    <versioncode>3</versioncode>
                    <apkname>pkg.a_3.apk</apkname>
                    <hash type="sha256">d3d3d3</hash>
                </package>
                <package>
                    <version>1.5</version>
                    <versioncode>5</versioncode>
                    <apkname>pkg.a_5.apk</apkname>
                    <hash type="sha256">D5D5D5</hash>
                </package>
            </application>
        </fdroid>
    "#;

    #[test]
    fn test_picks_greatest_version_code() {
        let selected = resolve(&requested(&["pkg.a", "pkg.b"]), TWO_VERSIONS, &storage()).unwrap();

        let descriptor = selected.get("pkg.a").expect("pkg.a resolved");
        assert_eq!(descriptor.version_code, 5);
        assert_eq!(descriptor.version, "1.5");
        assert_eq!(descriptor.artifact_name, "pkg.a_5.apk");
        assert_eq!(descriptor.expected_digest, "D5D5D5");
    }

    #[test]
    fn test_absent_package_is_missing_from_result() {
        let selected = resolve(&requested(&["pkg.a", "pkg.b"]), TWO_VERSIONS, &storage()).unwrap();

        assert!(!selected.contains_key("pkg.b"));
        assert_eq!(selected.len(), 1);
    }

    #[test]
    fn test_equal_version_codes_keep_first_entry() {
        let raw = r#"
            <fdroid>
                <application id="pkg.a">
                    <id>pkg.a</id>
                    <package>
                        <version>2.0-first</version>
                        <versioncode>7</versioncode>
                        <apkname>first.apk</apkname>
                        <hash type="sha256">aaaa</hash>
                    </package>
                    <package>
                        <version>2.0-second</version>
                        <versioncode>7</versioncode>
                        <apkname>second.apk</apkname>
                        <hash type="sha256">bbbb</hash>
                    </package>
                </application>
            </fdroid>
        "#;

        let selected = resolve(&requested(&["pkg.a"]), raw, &storage()).unwrap();
        assert_eq!(selected["pkg.a"].artifact_name, "first.apk");
    }

    #[test]
    fn test_unparsable_version_code_discards_entry_only() {
        let raw = r#"
            <fdroid>
                <application id="pkg.a">
                    <id>pkg.a</id>
                    <package>
                        <version>9.9</version>
                        <versioncode>not-a-number</versioncode>
                        <apkname>bogus.apk</apkname>
                        <hash type="sha256">cccc</hash>
                    </package>
                    <package>
                        <version>1.0</version>
                        <versioncode>1</versioncode>
                        <apkname>good.apk</apkname>
                        <hash type="sha256">dddd</hash>
                    </package>
                </application>
            </fdroid>
        "#;

        let selected = resolve(&requested(&["pkg.a"]), raw, &storage()).unwrap();
        assert_eq!(selected["pkg.a"].version_code, 1);
        assert_eq!(selected["pkg.a"].artifact_name, "good.apk");
    }

    #[test]
    fn test_entry_missing_digest_is_discarded() {
        let raw = r#"
            <fdroid>
                <application id="pkg.a">
                    <id>pkg.a</id>
                    <package>
                        <version>1.0</version>
                        <versioncode>1</versioncode>
                        <apkname>nohash.apk</apkname>
                    </package>
                </application>
            </fdroid>
        "#;

        let selected = resolve(&requested(&["pkg.a"]), raw, &storage()).unwrap();
        assert!(selected.is_empty());
    }

    #[test]
    fn test_non_requested_applications_are_skipped() {
        let raw = r#"
            <fdroid>
                <application id="pkg.other">
                    <id>pkg.other</id>
                    <package>
                        <version>1.0</version>
                        <versioncode>1</versioncode>
                        <apkname>other.apk</apkname>
                        <hash type="sha256">eeee</hash>
                    </package>
                </application>
            </fdroid>
        "#;

        let selected = resolve(&requested(&["pkg.a"]), raw, &storage()).unwrap();
        assert!(selected.is_empty());
    }

    #[test]
    fn test_malformed_index_is_fatal() {
        let raw = "<fdroid><application id=\"pkg.a\"></package></fdroid>";

        let result = resolve(&requested(&["pkg.a"]), raw, &storage());
        assert!(matches!(result, Err(CatalogError::Parse(_))));
    }

    #[test]
    fn test_id_from_child_element_when_attribute_absent() {
        let raw = r#"
            <fdroid>
                <application>
                    <id>pkg.a</id>
                    <package>
                        <version>1.0</version>
                        <versioncode>4</versioncode>
                        <apkname>a.apk</apkname>
                        <hash type="sha256">ffff</hash>
                    </package>
                </application>
            </fdroid>
        "#;

        let selected = resolve(&requested(&["pkg.a"]), raw, &storage()).unwrap();
        assert_eq!(selected["pkg.a"].version_code, 4);
    }

    #[test]
    fn test_local_path_under_storage_dir() {
        let selected = resolve(&requested(&["pkg.a"]), TWO_VERSIONS, &storage()).unwrap();
        assert_eq!(
            selected["pkg.a"].local_path(),
            Path::new("/tmp/apks/pkg.a_5.apk")
        );
    }
}
