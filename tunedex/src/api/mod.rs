//! HTTP API handlers

pub mod health;
pub mod songs;

pub use health::{health_check, health_routes};
pub use songs::{list_songs, song_routes, songs_by_attribute, songs_by_identity};
