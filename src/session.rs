//! Persisted result of one completed analysis
//!
//! A [`SessionRecord`] is written once when an analysis finishes and is never
//! modified afterwards; fields are read through accessors only.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::Algorithm;
use crate::export::ExportDocument;
use crate::image_loader::SourceImage;
use crate::matcher::Match;

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// 64-bit FNV-1a over the image dimensions, channel count and samples
pub fn fingerprint(image: &SourceImage) -> u64 {
    let mut hash = FNV_OFFSET_BASIS;
    let header = [
        &image.width().to_le_bytes()[..],
        &image.height().to_le_bytes()[..],
        &[image.channels()][..],
    ];
    for byte in header.into_iter().flatten().chain(image.as_bytes()) {
        hash ^= *byte as u64;
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

/// Identity and shape of the analyzed image
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageInfo {
    /// Hex-encoded [`fingerprint`]
    pub fingerprint: String,
    pub file_name: Option<String>,
    pub width: u32,
    pub height: u32,
}

impl ImageInfo {
    pub fn from_image(image: &SourceImage, file_name: Option<&str>) -> Self {
        Self {
            fingerprint: format!("{:016x}", fingerprint(image)),
            file_name: file_name.map(str::to_string),
            width: image.width(),
            height: image.height(),
        }
    }

    /// "WIDTHxHEIGHT"
    pub fn size_label(&self) -> String {
        format!("{}x{}", self.width, self.height)
    }
}

/// One completed analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    id: String,
    session_id: String,
    image: ImageInfo,
    palette_size: usize,
    algorithm: Algorithm,
    created_at: DateTime<Utc>,
    processing_ms: u64,
    matches: Vec<Match>,
    exports: Vec<ExportDocument>,
}

impl SessionRecord {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        session_id: impl Into<String>,
        image: ImageInfo,
        palette_size: usize,
        algorithm: Algorithm,
        created_at: DateTime<Utc>,
        processing_ms: u64,
        matches: Vec<Match>,
        exports: Vec<ExportDocument>,
    ) -> Self {
        let session_id = session_id.into();
        let id = format!(
            "{}-{}-{}",
            session_id,
            created_at.timestamp_millis(),
            &image.fingerprint[..8.min(image.fingerprint.len())]
        );
        Self {
            id,
            session_id,
            image,
            palette_size,
            algorithm,
            created_at,
            processing_ms,
            matches,
            exports,
        }
    }

    /// Unique record id: session, creation time and image fingerprint prefix
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn image(&self) -> &ImageInfo {
        &self.image
    }

    /// Requested k
    pub fn palette_size(&self) -> usize {
        self.palette_size
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn processing_ms(&self) -> u64 {
        self.processing_ms
    }

    pub fn matches(&self) -> &[Match] {
        &self.matches
    }

    pub fn exports(&self) -> &[ExportDocument] {
        &self.exports
    }

    /// Number of palette colors actually extracted
    pub fn colors_extracted(&self) -> usize {
        self.matches.len()
    }
}
