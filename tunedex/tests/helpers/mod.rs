//! Shared fixtures for tunedex integration tests
//!
//! Tagged fixture files are plain text so tests can state their metadata inline:
//!
//! ```text
//! TAGS
//! title=Song A
//! artist=X
//! ```
//!
//! Files starting with `BROKEN` parse as malformed; anything else carries no metadata.

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::Value;
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower::util::ServiceExt; // for `oneshot`
use tunedex::services::{
    ContentIdentifier, IngestWorkerPool, MediaMetadata, MetadataError, MetadataExtractor,
    PathNormalizer, ReadSeek, ScanReport, TagParser,
};
use tunedex::{build_router, AppState, Catalog};

pub const STATIC_PREFIX: &str = "/static/";

/// Parser for the inline `TAGS` fixture format
pub struct FixtureTagParser;

impl TagParser for FixtureTagParser {
    fn parse(&self, source: &mut dyn ReadSeek) -> Result<MediaMetadata, MetadataError> {
        let mut bytes = Vec::new();
        source.read_to_end(&mut bytes)?;

        if bytes.starts_with(b"BROKEN") {
            return Err(MetadataError::Malformed("corrupt fixture header".to_string()));
        }

        let text = std::str::from_utf8(&bytes).map_err(|_| MetadataError::NoMetadata)?;
        let body = text.strip_prefix("TAGS\n").ok_or(MetadataError::NoMetadata)?;

        let mut metadata = MediaMetadata {
            format: "FIXTURE".to_string(),
            file_type: "TXT".to_string(),
            ..Default::default()
        };
        for line in body.lines() {
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            match key {
                "title" => metadata.title = value.to_string(),
                "artist" => metadata.artist = value.to_string(),
                "album" => metadata.album = value.to_string(),
                "genre" => metadata.genre = value.to_string(),
                "year" => metadata.year = value.parse().ok(),
                _ => {}
            }
        }
        Ok(metadata)
    }
}

/// Parser that reports the same metadata for every file
pub struct FixedTagParser(pub MediaMetadata);

impl TagParser for FixedTagParser {
    fn parse(&self, _source: &mut dyn ReadSeek) -> Result<MediaMetadata, MetadataError> {
        Ok(self.0.clone())
    }
}

/// Fixture file body with the given tags
pub fn tagged(title: &str, artist: &str, genre: &str) -> String {
    format!("TAGS\ntitle={}\nartist={}\ngenre={}\n", title, artist, genre)
}

/// Write `contents` to `root/relative`, creating parent directories
pub fn write_file(root: &Path, relative: &str, contents: impl AsRef<[u8]>) -> PathBuf {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, contents).unwrap();
    path
}

/// Hex SHA-256 identity of a file on disk
pub fn identity_of(path: &Path) -> String {
    let file = fs::File::open(path).unwrap();
    let (identity, _) = ContentIdentifier::new().identify_reader(file).unwrap();
    identity.into_string()
}

/// Pool over `root` that parses the inline fixture format
pub fn fixture_pool(root: &Path, catalog: &Catalog) -> IngestWorkerPool {
    pool_with_parser(root, catalog, Arc::new(FixtureTagParser))
}

pub fn pool_with_parser(
    root: &Path,
    catalog: &Catalog,
    parser: Arc<dyn TagParser>,
) -> IngestWorkerPool {
    IngestWorkerPool::new(catalog.clone(), PathNormalizer::new(root, STATIC_PREFIX))
        .with_extractor(MetadataExtractor::with_parser(parser))
        .with_concurrency(4)
}

/// Scan `root` with the fixture parser to completion
pub async fn scan_fixtures(root: &Path, catalog: &Catalog) -> ScanReport {
    fixture_pool(root, catalog)
        .scan(CancellationToken::new())
        .await
        .unwrap()
}

/// Router serving `catalog` and the files under `music_dir`
pub fn app(catalog: &Catalog, music_dir: &Path) -> Router {
    build_router(AppState::new(catalog.clone()), music_dir, STATIC_PREFIX)
}

/// GET `uri`, returning status and raw body
pub async fn get_bytes(app: &Router, uri: &str) -> (StatusCode, Vec<u8>) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Should read body");
    (status, bytes.to_vec())
}

/// GET `uri`, returning status and JSON body
pub async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
    let (status, bytes) = get_bytes(app, uri).await;
    let json = serde_json::from_slice(&bytes).expect("Should parse JSON");
    (status, json)
}

/// Mono 16-bit WAV with a RIFF `LIST/INFO` chunk carrying title, artist and genre
pub fn wav_with_info(title: &str, artist: &str, genre: &str) -> Vec<u8> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 8000,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
        for i in 0..400i16 {
            writer.write_sample(i.wrapping_mul(91)).unwrap();
        }
        writer.finalize().unwrap();
    }
    let mut bytes = cursor.into_inner();

    let mut info = b"INFO".to_vec();
    for (id, value) in [(b"INAM", title), (b"IART", artist), (b"IGNR", genre)] {
        let mut data = value.as_bytes().to_vec();
        data.push(0);
        info.extend_from_slice(id);
        info.extend_from_slice(&(data.len() as u32).to_le_bytes());
        info.extend_from_slice(&data);
        if data.len() % 2 == 1 {
            info.push(0);
        }
    }

    bytes.extend_from_slice(b"LIST");
    bytes.extend_from_slice(&(info.len() as u32).to_le_bytes());
    bytes.extend_from_slice(&info);

    let riff_size = (bytes.len() - 8) as u32;
    bytes[4..8].copy_from_slice(&riff_size.to_le_bytes());
    bytes
}
