//! Ingest pipeline and query services

pub mod attribute_resolver;
pub mod content_identifier;
pub mod file_scanner;
pub mod ingest_pool;
pub mod metadata_extractor;
pub mod path_normalizer;

pub use attribute_resolver::{AttributeResolver, ResolveError};
pub use content_identifier::{ContentIdentifier, ContentIdentity};
pub use file_scanner::{FileScanner, ScanError, ScanStats};
pub use ingest_pool::{default_concurrency, IngestWorkerPool, ScanReport};
pub use metadata_extractor::{
    LoftyTagParser, MediaMetadata, MetadataError, MetadataExtractor, ReadSeek, TagParser,
};
pub use path_normalizer::{PathError, PathNormalizer};
