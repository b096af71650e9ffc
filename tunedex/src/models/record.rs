//! Catalog record and its queryable fields

use serde::{Deserialize, Serialize};

/// One catalog entry per distinct file content
///
/// `identity` is the primary key. Descriptive strings are empty, never missing, when the source
/// file carries no usable tags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// SHA-256 of the file bytes (64 lowercase hex characters)
    pub identity: String,
    pub title: String,
    pub creator: String,
    pub collection: String,
    pub genre: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_year: Option<u32>,
    /// Tag format family (ID3v2, VORBIS, ...)
    pub encoding_format: String,
    /// Detected container (MP3, FLAC, WAV, ...)
    pub container_type: String,
    /// Percent-escaped path under the static prefix
    pub public_path: String,
    pub size_bytes: u64,
}

impl Record {
    /// True when no descriptive tag field was filled in
    pub fn is_untagged(&self) -> bool {
        self.title.is_empty()
            && self.creator.is_empty()
            && self.collection.is_empty()
            && self.genre.is_empty()
            && self.release_year.is_none()
    }
}

/// Declared fields of [`Record`], one per `songs` column
///
/// This enum is the only way a column name reaches SQL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CatalogField {
    Identity,
    Title,
    Creator,
    Collection,
    Genre,
    ReleaseYear,
    EncodingFormat,
    ContainerType,
    PublicPath,
    SizeBytes,
}

impl CatalogField {
    pub const ALL: [CatalogField; 10] = [
        CatalogField::Identity,
        CatalogField::Title,
        CatalogField::Creator,
        CatalogField::Collection,
        CatalogField::Genre,
        CatalogField::ReleaseYear,
        CatalogField::EncodingFormat,
        CatalogField::ContainerType,
        CatalogField::PublicPath,
        CatalogField::SizeBytes,
    ];

    /// Canonical field name, identical to the column name
    pub fn column(self) -> &'static str {
        match self {
            CatalogField::Identity => "Identity",
            CatalogField::Title => "Title",
            CatalogField::Creator => "Creator",
            CatalogField::Collection => "Collection",
            CatalogField::Genre => "Genre",
            CatalogField::ReleaseYear => "ReleaseYear",
            CatalogField::EncodingFormat => "EncodingFormat",
            CatalogField::ContainerType => "ContainerType",
            CatalogField::PublicPath => "PublicPath",
            CatalogField::SizeBytes => "SizeBytes",
        }
    }

    /// Integer columns compare numerically
    pub fn is_integer(self) -> bool {
        matches!(self, CatalogField::ReleaseYear | CatalogField::SizeBytes)
    }
}

impl std::fmt::Display for CatalogField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.column())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Record {
        Record {
            identity: "ab".repeat(32),
            title: "Song A".to_string(),
            creator: "X".to_string(),
            collection: String::new(),
            genre: String::new(),
            release_year: None,
            encoding_format: "ID3v2".to_string(),
            container_type: "MP3".to_string(),
            public_path: "/static/a.mp3".to_string(),
            size_bytes: 42,
        }
    }

    #[test]
    fn test_json_shape_omits_missing_year() {
        let json = serde_json::to_value(sample()).unwrap();

        assert_eq!(json["title"], "Song A");
        assert_eq!(json["collection"], "");
        assert_eq!(json["size_bytes"], 42);
        assert!(json.get("release_year").is_none());
    }

    #[test]
    fn test_untagged_detection() {
        let mut record = sample();
        assert!(!record.is_untagged());

        record.title.clear();
        record.creator.clear();
        assert!(record.is_untagged());

        record.release_year = Some(1999);
        assert!(!record.is_untagged());
    }

    #[test]
    fn test_columns_are_unique() {
        let mut columns: Vec<&str> = CatalogField::ALL.iter().map(|f| f.column()).collect();
        columns.sort_unstable();
        columns.dedup();
        assert_eq!(columns.len(), CatalogField::ALL.len());
    }
}
