//! Audio metadata extraction service
//!
//! Extract tag metadata from a byte source using lofty.
//!
//! Extracts:
//! - Title, artist, album, genre, year
//! - Tag format family and container type
//!
//! The tag parser sits behind [`TagParser`] so the pipeline only depends on the outcome
//! (parsed, no metadata, malformed), never on a particular parsing library.

use lofty::error::ErrorKind;
use lofty::file::{FileType, TaggedFileExt};
use lofty::prelude::*;
use lofty::probe::Probe;
use lofty::tag::TagType;
use std::io::{Read, Seek};
use std::sync::Arc;
use thiserror::Error;

/// Metadata extraction errors
#[derive(Debug, Error)]
pub enum MetadataError {
    /// Stream is not a recognized media container, or carries no tags at all
    #[error("No metadata found")]
    NoMetadata,

    /// Container recognized but its tag or header data could not be parsed
    #[error("Malformed metadata: {0}")]
    Malformed(String),

    /// I/O error (file open/read)
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Byte source a tag parser may read and seek
pub trait ReadSeek: Read + Seek {}

impl<T: Read + Seek + ?Sized> ReadSeek for T {}

/// Extracted tag metadata
///
/// Strings are empty when the source lacks them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MediaMetadata {
    pub title: String,
    pub artist: String,
    pub album: String,
    pub genre: String,
    pub year: Option<u32>,
    /// Tag format family (ID3v2, VORBIS, MP4, ...)
    pub format: String,
    /// Container type (MP3, FLAC, WAV, ...)
    pub file_type: String,
}

impl MediaMetadata {
    /// True when at least one descriptive tag field is present
    pub fn has_tags(&self) -> bool {
        !(self.title.is_empty()
            && self.artist.is_empty()
            && self.album.is_empty()
            && self.genre.is_empty()
            && self.year.is_none())
    }
}

/// Tag parsing capability
///
/// `Ok` for a recognized stream (possibly with no tag fields filled),
/// [`MetadataError::NoMetadata`] for an unrecognized one, [`MetadataError::Malformed`] when
/// parsing fails part-way.
pub trait TagParser: Send + Sync {
    fn parse(&self, source: &mut dyn ReadSeek) -> Result<MediaMetadata, MetadataError>;
}

/// lofty-backed [`TagParser`]
#[derive(Debug, Clone, Copy, Default)]
pub struct LoftyTagParser;

impl TagParser for LoftyTagParser {
    fn parse(&self, source: &mut dyn ReadSeek) -> Result<MediaMetadata, MetadataError> {
        // Detect the format from content; the pipeline hands over an open stream with no extension
        let detected = Probe::new(source).guess_file_type()?;
        if detected.file_type().is_none() {
            return Err(MetadataError::NoMetadata);
        }

        let tagged_file = detected.read().map_err(|e| match e.kind() {
            ErrorKind::UnknownFormat => MetadataError::NoMetadata,
            _ => MetadataError::Malformed(e.to_string()),
        })?;

        let mut metadata = MediaMetadata {
            file_type: container_name(tagged_file.file_type()),
            ..Default::default()
        };

        // Try to get primary tag
        if let Some(tag) = tagged_file.primary_tag().or_else(|| tagged_file.first_tag()) {
            metadata.title = tag.title().map(|s| s.to_string()).unwrap_or_default();
            metadata.artist = tag.artist().map(|s| s.to_string()).unwrap_or_default();
            metadata.album = tag.album().map(|s| s.to_string()).unwrap_or_default();
            metadata.genre = tag.genre().map(|s| s.to_string()).unwrap_or_default();
            metadata.year = tag.year();
            metadata.format = tag_format_name(tag.tag_type());
        }

        Ok(metadata)
    }
}

fn container_name(file_type: FileType) -> String {
    match file_type {
        FileType::Mpeg => "MP3",
        FileType::Flac => "FLAC",
        FileType::Mp4 => "MP4",
        FileType::Aac => "AAC",
        FileType::Opus => "OPUS",
        FileType::Vorbis => "OGG",
        FileType::Speex => "SPEEX",
        FileType::Wav => "WAV",
        FileType::Aiff => "AIFF",
        FileType::Ape => "APE",
        FileType::Mpc => "MPC",
        FileType::WavPack => "WAVPACK",
        _ => "",
    }
    .to_string()
}

fn tag_format_name(tag_type: TagType) -> String {
    match tag_type {
        TagType::Id3v1 => "ID3v1",
        TagType::Id3v2 => "ID3v2",
        TagType::Mp4Ilst => "MP4",
        TagType::VorbisComments => "VORBIS",
        TagType::Ape => "APE",
        TagType::RiffInfo => "RIFF_INFO",
        TagType::AiffText => "AIFF_TEXT",
        _ => "",
    }
    .to_string()
}

/// Metadata extractor service
///
/// Wraps a [`TagParser`] and normalizes its output: trimmed strings, whitespace-only values
/// treated as absent, year 0 treated as absent.
#[derive(Clone)]
pub struct MetadataExtractor {
    parser: Arc<dyn TagParser>,
}

impl MetadataExtractor {
    /// Create new metadata extractor backed by lofty
    pub fn new() -> Self {
        Self::with_parser(Arc::new(LoftyTagParser))
    }

    pub fn with_parser(parser: Arc<dyn TagParser>) -> Self {
        Self { parser }
    }

    /// Extract metadata from an open byte source
    pub fn extract(&self, source: &mut dyn ReadSeek) -> Result<MediaMetadata, MetadataError> {
        self.parser.parse(source).map(normalize)
    }
}

impl Default for MetadataExtractor {
    fn default() -> Self {
        Self::new()
    }
}

fn normalize(raw: MediaMetadata) -> MediaMetadata {
    fn clean(value: String) -> String {
        let trimmed = value.trim();
        if trimmed.len() == value.len() {
            value
        } else {
            trimmed.to_string()
        }
    }

    MediaMetadata {
        title: clean(raw.title),
        artist: clean(raw.artist),
        album: clean(raw.album),
        genre: clean(raw.genre),
        year: raw.year.filter(|&y| y > 0),
        format: clean(raw.format),
        file_type: clean(raw.file_type),
    }
}
