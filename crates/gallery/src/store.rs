//! Album storage on disk.
//!
//! Layout: `<root>/<album>/album.json` indexes the album, and every saved
//! capture is copied next to it as `<asset id>.<ext>`.

use crate::error::{GalleryError, Result};
use crate::matching::{find_asset, AssetMatch};
use chrono::{DateTime, Utc};
use nutrivision_core::config::GalleryConfig;
use nutrivision_image::{CaptureMode, CapturedImage};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, warn};
use uuid::Uuid;

/// Index file name inside each album directory.
pub const INDEX_FILE: &str = "album.json";

/// Identifier of a saved capture.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetId(String);

impl AssetId {
    /// Wrap an existing identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Fresh id for a capture saved at `created_at` with content `hash`.
    /// The random suffix keeps repeated saves of the same bytes apart.
    fn generate(created_at: DateTime<Utc>, hash: &str) -> Self {
        let nonce = Uuid::new_v4().simple().to_string();
        Self(format!(
            "{}-{}-{}",
            created_at.timestamp_millis(),
            &hash[..12],
            &nonce[..8]
        ))
    }

    /// The identifier string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One saved capture in an album index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetRecord {
    /// Asset identifier
    pub id: AssetId,
    /// Path of the stored copy
    pub uri: String,
    /// URI the capture had when it was saved
    pub source_uri: String,
    /// Capture mode
    pub mode: CaptureMode,
    /// When the capture was saved
    pub created_at: DateTime<Utc>,
    /// Size of the stored copy
    pub size_bytes: u64,
    /// SHA-256 of the stored bytes
    pub sha256: String,
}

impl AssetRecord {
    /// The stored copy as a capture reference.
    pub fn to_captured(&self) -> CapturedImage {
        CapturedImage::new(self.uri.clone(), self.mode)
    }
}

/// Persistent photo storage.
pub trait Gallery {
    /// Save a capture into the gallery's album, creating the album if needed.
    fn save(&self, image: &CapturedImage) -> Result<AssetId>;

    /// Most recent captures of `album`, newest first, at most `limit`.
    ///
    /// A missing album is not an error and lists as empty.
    fn list(&self, album: &str, limit: usize) -> Result<Vec<CapturedImage>>;

    /// Delete an asset by id. Returns whether anything was deleted.
    fn delete(&self, id: &AssetId) -> Result<bool>;

    /// Resolve an asset id or a capture URI to the asset it names.
    fn find(&self, reference: &str) -> Result<Option<AssetId>>;
}

/// Directory-backed gallery writing into one album.
#[derive(Debug)]
pub struct FileGallery {
    root: PathBuf,
    album: String,
    // Serializes index read-modify-write cycles within this process.
    lock: Mutex<()>,
}

impl FileGallery {
    /// Gallery rooted at `root`, saving into `album`.
    pub fn new(root: impl Into<PathBuf>, album: impl Into<String>) -> Result<Self> {
        let album = album.into();
        validate_album(&album)?;
        Ok(Self {
            root: root.into(),
            album,
            lock: Mutex::new(()),
        })
    }

    /// Gallery described by the `[gallery]` configuration section.
    pub fn from_config(config: &GalleryConfig) -> Result<Self> {
        Self::new(&config.root_dir, &config.album)
    }

    /// Album new captures are saved into.
    pub fn album(&self) -> &str {
        &self.album
    }

    /// Gallery root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Index records of `album`, newest first. Missing albums are empty.
    pub fn records(&self, album: &str) -> Result<Vec<AssetRecord>> {
        validate_album(album)?;
        let _guard = self.lock.lock().map_err(|_| GalleryError::LockPoisoned)?;
        let mut records = self.read_index(album)?.unwrap_or_default();
        sort_newest_first(&mut records);
        Ok(records)
    }

    /// Most recent records of `album`, at most `limit`.
    ///
    /// A missing album lists as empty with a warning.
    pub fn list_records(&self, album: &str, limit: usize) -> Result<Vec<AssetRecord>> {
        validate_album(album)?;
        if !self.index_path(album).exists() {
            warn!(album = %album, "Album not found, listing as empty");
            return Ok(Vec::new());
        }
        let mut records = self.records(album)?;
        records.truncate(limit);
        Ok(records)
    }

    /// Find the record a reference names in the gallery's album.
    pub fn locate(&self, reference: &str) -> Result<Option<(AssetRecord, AssetMatch)>> {
        let records = self.records(&self.album)?;
        Ok(find_asset(&records, reference).map(|(record, how)| (record.clone(), how)))
    }

    fn album_dir(&self, album: &str) -> PathBuf {
        self.root.join(album)
    }

    fn index_path(&self, album: &str) -> PathBuf {
        self.album_dir(album).join(INDEX_FILE)
    }

    fn read_index(&self, album: &str) -> Result<Option<Vec<AssetRecord>>> {
        let path = self.index_path(album);
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path)?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    fn write_index(&self, album: &str, records: &[AssetRecord]) -> Result<()> {
        let path = self.index_path(album);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(records)?)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }
}

impl Gallery for FileGallery {
    fn save(&self, image: &CapturedImage) -> Result<AssetId> {
        let source = image
            .local_path()
            .ok_or_else(|| GalleryError::UnreadableSource(image.uri.clone()))?;
        let data = fs::read(&source).map_err(|e| {
            warn!(uri = %image.uri, error = %e, "Capture bytes not readable");
            GalleryError::UnreadableSource(image.uri.clone())
        })?;

        let _guard = self.lock.lock().map_err(|_| GalleryError::LockPoisoned)?;

        let album_dir = self.album_dir(&self.album);
        let mut records = match self.read_index(&self.album)? {
            Some(records) => records,
            None => {
                debug!(album = %self.album, "Creating album");
                fs::create_dir_all(&album_dir)?;
                Vec::new()
            }
        };

        let sha256 = hex::encode(Sha256::digest(&data));
        let created_at = Utc::now();
        let mut id = AssetId::generate(created_at, &sha256);
        while records.iter().any(|r| r.id == id) {
            id = AssetId::generate(created_at, &sha256);
        }
        let extension = Path::new(&image.upload_file_name())
            .extension()
            .map_or_else(|| "jpg".to_string(), |e| e.to_string_lossy().to_ascii_lowercase());
        let stored = album_dir.join(format!("{id}.{extension}"));
        fs::write(&stored, &data)?;

        records.push(AssetRecord {
            id: id.clone(),
            uri: stored.to_string_lossy().into_owned(),
            source_uri: image.uri.clone(),
            mode: image.mode,
            created_at,
            size_bytes: data.len() as u64,
            sha256,
        });
        self.write_index(&self.album, &records)?;

        debug!(album = %self.album, asset_id = %id, "Capture saved");
        Ok(id)
    }

    fn list(&self, album: &str, limit: usize) -> Result<Vec<CapturedImage>> {
        Ok(self
            .list_records(album, limit)?
            .iter()
            .map(AssetRecord::to_captured)
            .collect())
    }

    fn delete(&self, id: &AssetId) -> Result<bool> {
        let _guard = self.lock.lock().map_err(|_| GalleryError::LockPoisoned)?;

        let Some(mut records) = self.read_index(&self.album)? else {
            warn!(album = %self.album, asset_id = %id, "Album not found, nothing to delete");
            return Ok(false);
        };

        let Some(position) = records.iter().position(|r| &r.id == id) else {
            warn!(album = %self.album, asset_id = %id, "Asset not found");
            return Ok(false);
        };

        let record = records.remove(position);
        if let Err(e) = fs::remove_file(&record.uri) {
            // The index is authoritative; a missing file is already deleted.
            warn!(path = %record.uri, error = %e, "Stored copy could not be removed");
        }
        self.write_index(&self.album, &records)?;

        debug!(album = %self.album, asset_id = %id, "Asset deleted");
        Ok(true)
    }

    fn find(&self, reference: &str) -> Result<Option<AssetId>> {
        Ok(self.locate(reference)?.map(|(record, _)| record.id))
    }
}

fn validate_album(album: &str) -> Result<()> {
    let trimmed = album.trim();
    if trimmed.is_empty()
        || trimmed == "."
        || trimmed == ".."
        || trimmed.contains(['/', '\\'])
    {
        return Err(GalleryError::InvalidAlbum(album.to_string()));
    }
    Ok(())
}

fn sort_newest_first(records: &mut [AssetRecord]) {
    records.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.0.cmp(&a.id.0)));
}
