//! Extractor selection and invocation.
//!
//! Dispatch is purely on the lower-cased filename suffix. An unmapped
//! suffix means "no extractor available", which is not an error; the
//! record keeps its empty content and default metadata.

use crate::extractor::{AudioExtractor, Extractor, PdfExtractor};
use pythia_db::{ContentType, FileRecord};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Suffixes routed to the audio tag extractor.
pub const AUDIO_SUFFIXES: &[&str] = &["mp3", "ogg", "oga", "opus", "m4b", "aac", "flac"];

/// Classify a lower-cased suffix into a coarse content type.
pub fn classify_suffix(suffix: &str) -> ContentType {
    match suffix {
        "txt" | "md" | "rst" | "log" => ContentType::Text,
        "pdf" => ContentType::Pdf,
        "jpg" | "jpeg" | "png" | "gif" | "webp" => ContentType::Image,
        "odt" | "doc" | "docx" => ContentType::Document,
        _ => ContentType::Other,
    }
}

/// Suffix-keyed extractor registry.
pub struct Inspector {
    registry: HashMap<&'static str, Arc<dyn Extractor>>,
}

impl Inspector {
    pub fn new() -> Self {
        let mut registry: HashMap<&'static str, Arc<dyn Extractor>> = HashMap::new();
        registry.insert("pdf", Arc::new(PdfExtractor));

        let audio: Arc<dyn Extractor> = Arc::new(AudioExtractor);
        for suffix in AUDIO_SUFFIXES {
            registry.insert(suffix, Arc::clone(&audio));
        }

        Self { registry }
    }

    /// The capability registered for a suffix, if any.
    pub fn extractor_for(&self, suffix: &str) -> Option<&Arc<dyn Extractor>> {
        self.registry.get(suffix)
    }

    /// Classify the record and run its extractor, if one is registered.
    ///
    /// Extraction runs on a blocking thread. Returns false only when a
    /// registered extractor failed; the record then keeps its previous
    /// content and meta.
    pub async fn inspect(&self, file: &mut FileRecord) -> bool {
        let suffix = file.suffix();
        file.content_type = classify_suffix(&suffix);

        let Some(extractor) = self.registry.get(suffix.as_str()) else {
            return true;
        };
        let extractor = Arc::clone(extractor);

        let mut work = file.clone();
        let outcome = tokio::task::spawn_blocking(move || {
            let ok = extractor.process(&mut work);
            (ok, work)
        })
        .await;

        match outcome {
            Ok((true, work)) => {
                *file = work;
                true
            }
            Ok((false, _)) => {
                debug!(path = %file.path, suffix = %suffix, "Extraction failed");
                false
            }
            Err(e) => {
                warn!(path = %file.path, error = %e, "Extraction task panicked");
                false
            }
        }
    }
}

impl Default for Inspector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_classify_suffix() {
        assert_eq!(classify_suffix("txt"), ContentType::Text);
        assert_eq!(classify_suffix("pdf"), ContentType::Pdf);
        assert_eq!(classify_suffix("png"), ContentType::Image);
        assert_eq!(classify_suffix("odt"), ContentType::Document);
        assert_eq!(classify_suffix("mp3"), ContentType::Other);
        assert_eq!(classify_suffix(""), ContentType::Other);
    }

    #[test]
    fn test_suffix_routing() {
        let inspector = Inspector::new();
        assert!(inspector.extractor_for("pdf").is_some());
        for suffix in AUDIO_SUFFIXES {
            assert!(inspector.extractor_for(suffix).is_some());
        }
        assert!(inspector.extractor_for("txt").is_none());
        assert!(inspector.extractor_for("").is_none());
    }

    #[tokio::test]
    async fn test_inspect_without_extractor_classifies_only() {
        let inspector = Inspector::new();
        let mut file = FileRecord::new(1, "/data/notes.TXT", Utc::now());

        assert!(inspector.inspect(&mut file).await);
        assert_eq!(file.content_type, ContentType::Text);
        assert!(file.content.is_empty());
        assert!(file.meta.is_empty());
    }

    #[tokio::test]
    async fn test_inspect_failure_keeps_record() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.pdf");
        std::fs::write(&path, b"not a pdf").unwrap();

        let inspector = Inspector::new();
        let mut file = FileRecord::new(1, path.to_string_lossy().into_owned(), Utc::now());

        assert!(!inspector.inspect(&mut file).await);
        assert_eq!(file.content_type, ContentType::Pdf);
        assert!(file.content.is_empty());
        assert!(file.meta.is_empty());
    }
}
