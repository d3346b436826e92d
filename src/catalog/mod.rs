//! Scene catalog module
//!
//! Derives a scene -> category mapping from the host's ordered scene list.
//! Header scenes (names starting with the configured decorator) open a
//! section; every following scene belongs to that section until the next
//! header.

mod builder;
mod keys;

pub use builder::{CatalogRules, CategoryId, SceneCatalog, SceneResolution};
pub use keys::{normalize, trim_header, CategoryKey, SceneKey};
