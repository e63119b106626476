//! Resolving a capture reference back to a stored asset.

use crate::store::AssetRecord;
use nutrivision_image::uri::normalize_uri;

/// How a reference matched an asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetMatch {
    /// The reference is the asset id
    ById,
    /// The reference names the stored copy or the original capture
    ByUri,
}

/// Find the record `reference` names.
///
/// Ids are tried first. URIs are compared after normalization, against both
/// the stored copy and the URI the capture had when it was saved.
pub fn find_asset<'a>(
    records: &'a [AssetRecord],
    reference: &str,
) -> Option<(&'a AssetRecord, AssetMatch)> {
    let reference = reference.trim();
    if reference.is_empty() {
        return None;
    }

    if let Some(record) = records.iter().find(|r| r.id.as_str() == reference) {
        return Some((record, AssetMatch::ById));
    }

    let wanted = normalize_uri(reference);
    records
        .iter()
        .find(|r| normalize_uri(&r.uri) == wanted || normalize_uri(&r.source_uri) == wanted)
        .map(|record| (record, AssetMatch::ByUri))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::AssetId;
    use chrono::Utc;
    use nutrivision_image::CaptureMode;

    fn record(id: &str, uri: &str, source: &str) -> AssetRecord {
        AssetRecord {
            id: AssetId::new(id),
            uri: uri.to_string(),
            source_uri: source.to_string(),
            mode: CaptureMode::Label,
            created_at: Utc::now(),
            size_bytes: 0,
            sha256: String::new(),
        }
    }

    #[test]
    fn test_id_match_wins() {
        let records = vec![
            record("/odd/id", "/g/a.jpg", "/c/a.jpg"),
            record("2", "/odd/id", "/c/b.jpg"),
        ];
        let (found, how) = find_asset(&records, "/odd/id").unwrap();
        assert_eq!(found.id.as_str(), "/odd/id");
        assert_eq!(how, AssetMatch::ById);
    }

    #[test]
    fn test_matches_source_uri_in_any_form() {
        let records = vec![record("1", "/g/NutriVision/1.jpg", "/cache/My Label.jpg")];
        let (found, how) = find_asset(&records, "file:///cache//My%20Label.jpg").unwrap();
        assert_eq!(found.id.as_str(), "1");
        assert_eq!(how, AssetMatch::ByUri);
    }

    #[test]
    fn test_matches_stored_copy() {
        let records = vec![record("1", "/g/NutriVision/1.jpg", "/cache/x.jpg")];
        assert!(find_asset(&records, "file:///g/NutriVision/1.jpg").is_some());
    }

    #[test]
    fn test_no_match() {
        let records = vec![record("1", "/g/1.jpg", "/c/1.jpg")];
        assert!(find_asset(&records, "/c/2.jpg").is_none());
        assert!(find_asset(&records, "  ").is_none());
    }
}
