//! Record types persisted by the store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A crawled directory root or subdirectory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Folder {
    /// Assigned by the store on insert.
    pub id: i64,
    /// Absolute path, unique across all folders.
    pub path: String,
    /// Completion time of the last full traversal.
    pub time_scanned: DateTime<Utc>,
}

impl Folder {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            id: 0,
            path: path.into(),
            time_scanned: DateTime::<Utc>::UNIX_EPOCH,
        }
    }
}

/// Coarse file classification, stored as a small integer.
///
/// The integer mapping is part of the persisted layout: Text = 1,
/// Pdf = 2, Image = 3, Document = 4, Other = 5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Text,
    Pdf,
    Image,
    Document,
    #[default]
    Other,
}

impl ContentType {
    pub fn as_i64(&self) -> i64 {
        match self {
            ContentType::Text => 1,
            ContentType::Pdf => 2,
            ContentType::Image => 3,
            ContentType::Document => 4,
            ContentType::Other => 5,
        }
    }

    pub fn from_i64(value: i64) -> Option<Self> {
        match value {
            1 => Some(ContentType::Text),
            2 => Some(ContentType::Pdf),
            3 => Some(ContentType::Image),
            4 => Some(ContentType::Document),
            5 => Some(ContentType::Other),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Text => "text",
            ContentType::Pdf => "pdf",
            ContentType::Image => "image",
            ContentType::Document => "document",
            ContentType::Other => "other",
        }
    }
}

/// An indexed file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Assigned by the store on insert.
    pub id: i64,
    /// The enclosing folder's id.
    pub folder_id: i64,
    /// Absolute path, unique across all files.
    pub path: String,
    /// When this record was last refreshed from disk.
    pub time_scanned: DateTime<Utc>,
    /// Filesystem modification time observed at the last refresh.
    pub mtime: DateTime<Utc>,
    pub content_type: ContentType,
    /// Derived from the filename when not supplied by an extractor.
    pub mime_type: String,
    /// Format-specific metadata, persisted as JSON text.
    pub meta: serde_json::Map<String, serde_json::Value>,
    /// Extracted textual content, possibly empty.
    pub content: String,
}

impl FileRecord {
    /// Build a fresh record for a newly observed path. The MIME type is
    /// guessed from the filename and the content type defaults to
    /// [`ContentType::Other`] until the inspector classifies it.
    pub fn new(folder_id: i64, path: impl Into<String>, mtime: DateTime<Utc>) -> Self {
        let path = path.into();
        let mime_type = mime_guess::from_path(&path)
            .first_or_octet_stream()
            .essence_str()
            .to_string();
        Self {
            id: 0,
            folder_id,
            path,
            time_scanned: Utc::now(),
            mtime,
            content_type: ContentType::Other,
            mime_type,
            meta: serde_json::Map::new(),
            content: String::new(),
        }
    }

    /// True when the on-disk file changed after this record was last
    /// refreshed, so extraction must re-run.
    pub fn needs_update(&self, disk_mtime: DateTime<Utc>) -> bool {
        disk_mtime > self.time_scanned
    }

    /// Lower-cased filename suffix, used for extractor dispatch.
    pub fn suffix(&self) -> String {
        suffix(Path::new(&self.path))
    }
}

/// Lower-cased text after the last `.` of the file name, or `""` when
/// the name contains no dot. A leading-dot name like `.emacs` yields
/// `emacs`.
pub fn suffix(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy())
        .unwrap_or_default();
    match name.rfind('.') {
        Some(idx) => name[idx + 1..].to_ascii_lowercase(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_suffix() {
        assert_eq!(suffix(Path::new("/a/b/report.PDF")), "pdf");
        assert_eq!(suffix(Path::new("/a/b/noext")), "");
        assert_eq!(suffix(Path::new("/home/u/.emacs")), "emacs");
        assert_eq!(suffix(Path::new("archive.tar.gz")), "gz");
        assert_eq!(suffix(Path::new("/a/b.c/noext")), "");
    }

    #[test]
    fn test_needs_update() {
        let scanned = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let mut file = FileRecord::new(1, "/data/a.txt", scanned);
        file.time_scanned = scanned;

        assert!(!file.needs_update(scanned - chrono::Duration::seconds(1)));
        assert!(!file.needs_update(scanned));
        assert!(file.needs_update(scanned + chrono::Duration::seconds(1)));
    }

    #[test]
    fn test_content_type_integer_mapping() {
        let all = [
            (ContentType::Text, 1),
            (ContentType::Pdf, 2),
            (ContentType::Image, 3),
            (ContentType::Document, 4),
            (ContentType::Other, 5),
        ];
        for (ct, n) in all {
            assert_eq!(ct.as_i64(), n);
            assert_eq!(ContentType::from_i64(n), Some(ct));
        }
        assert_eq!(ContentType::from_i64(0), None);
        assert_eq!(ContentType::from_i64(42), None);
    }

    #[test]
    fn test_new_record_defaults() {
        let file = FileRecord::new(7, "/data/song.mp3", Utc::now());
        assert_eq!(file.folder_id, 7);
        assert_eq!(file.content_type, ContentType::Other);
        assert_eq!(file.mime_type, "audio/mpeg");
        assert!(file.meta.is_empty());
        assert!(file.content.is_empty());

        let unknown = FileRecord::new(7, "/data/blob.xyzzy", Utc::now());
        assert_eq!(unknown.mime_type, "application/octet-stream");
    }
}
