//! Glue between the in-memory recent captures strip and the gallery.

use crate::store::Gallery;
use nutrivision_image::{CapturedImage, RecentCaptures};
use tracing::{debug, warn};

/// Remove the capture at `index` from `recent` and delete its gallery copy.
///
/// The local removal always happens. Gallery failures, or no matching asset,
/// are logged and otherwise ignored.
pub fn discard_capture<G: Gallery + ?Sized>(
    recent: &mut RecentCaptures,
    index: usize,
    gallery: &G,
) -> Option<CapturedImage> {
    let removed = recent.remove(index)?;

    match gallery.find(&removed.uri) {
        Ok(Some(id)) => match gallery.delete(&id) {
            Ok(true) => debug!(uri = %removed.uri, asset_id = %id, "Discarded capture from gallery"),
            Ok(false) => warn!(uri = %removed.uri, asset_id = %id, "Gallery asset vanished before delete"),
            Err(e) => warn!(uri = %removed.uri, error = %e, "Gallery delete failed"),
        },
        Ok(None) => warn!(uri = %removed.uri, "Discarded capture has no gallery asset"),
        Err(e) => warn!(uri = %removed.uri, error = %e, "Gallery lookup failed"),
    }

    Some(removed)
}

/// Rebuild the recent captures strip from the newest items of `album`.
///
/// A gallery error yields an empty strip.
pub fn load_recent<G: Gallery + ?Sized>(gallery: &G, album: &str, limit: usize) -> RecentCaptures {
    let mut recent = RecentCaptures::new(limit);
    match gallery.list(album, limit) {
        // `push` puts each item at the front, so feed oldest first.
        Ok(items) => recent.extend(items.into_iter().rev()),
        Err(e) => warn!(album = %album, error = %e, "Could not load recent captures"),
    }
    recent
}
