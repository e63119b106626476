//! Image URI helpers.
//!
//! Captures are referenced by plain paths, `file://` URIs, or platform asset
//! identifiers such as `ph://…`. Only the first two resolve to bytes on this
//! machine.

use std::path::PathBuf;

const FILE_SCHEME: &str = "file://";

/// File name used when a URI has no usable last segment.
pub const FALLBACK_FILE_NAME: &str = "image.jpg";

/// Resolve a URI to a local filesystem path.
///
/// Returns `None` for URIs with any scheme other than `file://`.
pub fn local_path(uri: &str) -> Option<PathBuf> {
    let uri = uri.trim();
    if uri.is_empty() {
        return None;
    }
    if let Some(rest) = uri.strip_prefix(FILE_SCHEME) {
        return Some(PathBuf::from(percent_decode(rest)));
    }
    if has_scheme(uri) {
        return None;
    }
    Some(PathBuf::from(uri))
}

/// Last path segment of a URI, ignoring any query or fragment.
pub fn file_name_from_uri(uri: &str) -> String {
    let without_query = uri.split(['?', '#']).next().unwrap_or_default();
    without_query
        .rsplit('/')
        .next()
        .filter(|segment| !segment.is_empty())
        .map_or_else(|| FALLBACK_FILE_NAME.to_string(), percent_decode)
}

/// Canonical form used when comparing URIs that name the same file.
///
/// Strips the `file://` scheme, decodes percent escapes, collapses repeated
/// slashes and drops a trailing slash. Other schemes are kept verbatim apart
/// from whitespace trimming.
pub fn normalize_uri(uri: &str) -> String {
    let uri = uri.trim();
    let Some(path) = uri.strip_prefix(FILE_SCHEME).or_else(|| {
        if has_scheme(uri) {
            None
        } else {
            Some(uri)
        }
    }) else {
        return uri.to_string();
    };

    let decoded = percent_decode(path);
    let mut normalized = String::with_capacity(decoded.len());
    let mut previous_slash = false;
    for ch in decoded.chars() {
        if ch == '/' {
            if previous_slash {
                continue;
            }
            previous_slash = true;
        } else {
            previous_slash = false;
        }
        normalized.push(ch);
    }
    if normalized.len() > 1 && normalized.ends_with('/') {
        normalized.pop();
    }
    normalized
}

fn has_scheme(uri: &str) -> bool {
    match uri.find("://") {
        Some(idx) => uri[..idx]
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '+' || c == '-' || c == '.'),
        None => false,
    }
}

fn percent_decode(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            let hex = std::str::from_utf8(&bytes[i + 1..i + 3]).ok();
            if let Some(value) = hex.and_then(|h| u8::from_str_radix(h, 16).ok()) {
                out.push(value);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_path() {
        assert_eq!(local_path("/tmp/a.jpg"), Some(PathBuf::from("/tmp/a.jpg")));
        assert_eq!(
            local_path("file:///var/mobile/My%20Photo.jpg"),
            Some(PathBuf::from("/var/mobile/My Photo.jpg"))
        );
        assert_eq!(local_path("ph://ABC-123/L0/001"), None);
        assert_eq!(local_path("  "), None);
    }

    #[test]
    fn test_file_name_from_uri() {
        assert_eq!(file_name_from_uri("file:///data/cache/123.jpg"), "123.jpg");
        assert_eq!(file_name_from_uri("/data/label.png?v=2"), "label.png");
        assert_eq!(file_name_from_uri("ph://ABC-123/L0/001"), "001");
        assert_eq!(file_name_from_uri("/data/dir/"), FALLBACK_FILE_NAME);
    }

    #[test]
    fn test_normalize_uri_matches_equivalent_forms() {
        let a = normalize_uri("file:///storage//DCIM/My%20Label.jpg");
        let b = normalize_uri(" /storage/DCIM/My Label.jpg ");
        assert_eq!(a, b);
        assert_eq!(a, "/storage/DCIM/My Label.jpg");
    }

    #[test]
    fn test_normalize_keeps_asset_ids() {
        assert_eq!(normalize_uri("ph://ABC-123/L0/001"), "ph://ABC-123/L0/001");
    }

    #[test]
    fn test_percent_decode_leaves_bad_escapes() {
        assert_eq!(percent_decode("100%"), "100%");
        assert_eq!(percent_decode("a%zzb"), "a%zzb");
        assert_eq!(percent_decode("%41"), "A");
    }
}
