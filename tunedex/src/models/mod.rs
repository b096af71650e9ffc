//! Data models for tunedex

pub mod record;

pub use record::{CatalogField, Record};
