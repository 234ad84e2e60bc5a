//! Content and metadata extraction capabilities.
//!
//! Extractors are selected by the inspector from the file's suffix and
//! run on blocking threads; adding a format means one new type
//! implementing [`Extractor`] and one registry entry.

mod audio;
mod pdf;

pub use audio::AudioExtractor;
pub use pdf::PdfExtractor;

use pythia_db::FileRecord;

/// A single extraction capability.
pub trait Extractor: Send + Sync {
    /// Attempt to populate the record's `content` and `meta` fields
    /// from the file's on-disk bytes.
    ///
    /// Returns false for ordinary "could not read/parse" conditions
    /// instead of panicking; on failure the record is left unmodified,
    /// partial results are never written back.
    fn process(&self, file: &mut FileRecord) -> bool;
}
