//! Attribute name resolution for catalog queries
//!
//! Maps a free-form attribute name from a request (`artist`, `GENRE`, `Year`) onto a
//! [`CatalogField`]. Only spellings listed in [`ATTRIBUTE_TABLE`] resolve; the request text
//! itself never becomes a column name.

use crate::models::CatalogField;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("Attribute hasn't been found: {0:?}")]
    Unresolvable(String),
}

/// Accepted spellings, matched exactly
///
/// Canonical column names, the short legacy names older clients still send, and the
/// upper-case form of every single-word name (reached through the upper-case candidate).
pub const ATTRIBUTE_TABLE: &[(&str, CatalogField)] = &[
    ("Identity", CatalogField::Identity),
    ("IDENTITY", CatalogField::Identity),
    ("ID", CatalogField::Identity),
    ("Title", CatalogField::Title),
    ("TITLE", CatalogField::Title),
    ("Name", CatalogField::Title),
    ("NAME", CatalogField::Title),
    ("Creator", CatalogField::Creator),
    ("CREATOR", CatalogField::Creator),
    ("Artist", CatalogField::Creator),
    ("ARTIST", CatalogField::Creator),
    ("Collection", CatalogField::Collection),
    ("COLLECTION", CatalogField::Collection),
    ("Album", CatalogField::Collection),
    ("ALBUM", CatalogField::Collection),
    ("Genre", CatalogField::Genre),
    ("GENRE", CatalogField::Genre),
    ("ReleaseYear", CatalogField::ReleaseYear),
    ("Year", CatalogField::ReleaseYear),
    ("YEAR", CatalogField::ReleaseYear),
    ("EncodingFormat", CatalogField::EncodingFormat),
    ("Format", CatalogField::EncodingFormat),
    ("FORMAT", CatalogField::EncodingFormat),
    ("ContainerType", CatalogField::ContainerType),
    ("FileType", CatalogField::ContainerType),
    ("PublicPath", CatalogField::PublicPath),
    ("Path", CatalogField::PublicPath),
    ("PATH", CatalogField::PublicPath),
    ("SizeBytes", CatalogField::SizeBytes),
    ("Size", CatalogField::SizeBytes),
    ("SIZE", CatalogField::SizeBytes),
];

/// Resolves request attribute names against [`ATTRIBUTE_TABLE`]
#[derive(Debug, Clone, Copy, Default)]
pub struct AttributeResolver;

impl AttributeResolver {
    pub fn new() -> Self {
        Self
    }

    /// Try the literal name, then upper case, then title case; first hit wins
    pub fn resolve(&self, attribute: &str) -> Result<CatalogField, ResolveError> {
        tracing::debug!("Looking for a real name of attribute: {:?}", attribute);

        let candidates = [
            attribute.to_string(),
            attribute.to_uppercase(),
            title_case(attribute),
        ];

        let field = candidates
            .iter()
            .find_map(|candidate| lookup(candidate))
            .ok_or_else(|| ResolveError::Unresolvable(attribute.to_string()))?;

        tracing::debug!("Real attribute: {:?}", field.column());
        Ok(field)
    }
}

fn lookup(name: &str) -> Option<CatalogField> {
    ATTRIBUTE_TABLE
        .iter()
        .find(|(spelling, _)| *spelling == name)
        .map(|(_, field)| *field)
}

/// First character upper-cased, the rest left as-is (`fileType` → `FileType`)
fn title_case(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
