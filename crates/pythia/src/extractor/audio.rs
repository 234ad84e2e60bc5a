//! Audio tag extraction.
//!
//! Meta keys follow the indexer's convention: `artist`, `album`,
//! `title`, `ord1` (disc number), `ord2` (track number). Ordinals
//! written as "N/total" are normalized to the numerator. When the tag
//! carries no album, the parent directory name stands in, which is
//! usually right for ripped collections.

use super::Extractor;
use lofty::{Accessor, ItemKey, Tag, TaggedFileExt};
use pythia_db::FileRecord;
use serde_json::Value;
use std::path::Path;
use tracing::debug;

pub struct AudioExtractor;

impl Extractor for AudioExtractor {
    fn process(&self, file: &mut FileRecord) -> bool {
        let tagged = match lofty::read_from_path(&file.path) {
            Ok(tagged) => tagged,
            Err(e) => {
                debug!(path = %file.path, error = %e, "Failed to read audio file");
                return false;
            }
        };

        let mut meta = serde_json::Map::new();

        let tag = tagged.primary_tag().or_else(|| tagged.first_tag());
        if let Some(tag) = tag {
            if let Some(artist) = tag.artist() {
                meta.insert("artist".to_string(), Value::String(artist.into_owned()));
            }
            if let Some(album) = tag.album() {
                meta.insert("album".to_string(), Value::String(album.into_owned()));
            }
            if let Some(title) = tag.title() {
                meta.insert("title".to_string(), Value::String(title.into_owned()));
            }
            if let Some(disc) = ordinal(tag, tag.disk(), &ItemKey::DiscNumber) {
                meta.insert("ord1".to_string(), Value::from(disc));
            }
            if let Some(track) = ordinal(tag, tag.track(), &ItemKey::TrackNumber) {
                meta.insert("ord2".to_string(), Value::from(track));
            }
        }

        if !meta.contains_key("album") {
            if let Some(album) = parent_dir_name(&file.path) {
                meta.insert("album".to_string(), Value::String(album));
            }
        }

        // Audio carries no extractable text.
        file.meta = meta;
        true
    }
}

/// Prefer the numeric accessor; fall back to parsing the raw tag
/// value, taking the numerator of "N/total" forms.
fn ordinal(tag: &Tag, numeric: Option<u32>, key: &ItemKey) -> Option<u64> {
    if let Some(value) = numeric {
        return Some(u64::from(value));
    }
    tag.get_string(key).and_then(ordinal_numerator)
}

fn ordinal_numerator(raw: &str) -> Option<u64> {
    raw.trim()
        .split('/')
        .next()
        .and_then(|numerator| numerator.trim().parse().ok())
}

fn parent_dir_name(path: &str) -> Option<String> {
    Path::new(path)
        .parent()
        .and_then(|parent| parent.file_name())
        .map(|name| name.to_string_lossy().into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_ordinal_numerator() {
        assert_eq!(ordinal_numerator("3"), Some(3));
        assert_eq!(ordinal_numerator("3/12"), Some(3));
        assert_eq!(ordinal_numerator(" 07 / 12 "), Some(7));
        assert_eq!(ordinal_numerator(""), None);
        assert_eq!(ordinal_numerator("x/2"), None);
    }

    #[test]
    fn test_parent_dir_name() {
        assert_eq!(
            parent_dir_name("/music/The Wall/01.mp3"),
            Some("The Wall".to_string())
        );
        assert_eq!(parent_dir_name("01.mp3"), None);
    }

    #[test]
    fn test_garbage_input_fails_without_mutation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("noise.mp3");
        std::fs::write(&path, b"definitely not audio").unwrap();

        let mut file = FileRecord::new(1, path.to_string_lossy().into_owned(), Utc::now());
        assert!(!AudioExtractor.process(&mut file));
        assert!(file.meta.is_empty());
    }
}
