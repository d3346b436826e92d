//! Scene catalog construction and lookup

use std::collections::HashMap;

use serde::Serialize;
use tracing::{debug, warn};

use super::keys::{CategoryKey, SceneKey};
use crate::config::Settings;

/// The parts of the configuration that shape a catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogRules {
    /// Prefix marking a header scene
    pub decorator: String,
    /// Characters stripped from both ends of a header name
    pub trim_chars: String,
    /// Category key whose scenes enable push-to-talk
    pub target: String,
}

impl CatalogRules {
    /// Check whether a scene name is a header marker.
    ///
    /// An empty decorator makes every scene a header.
    pub fn is_header(&self, name: &str) -> bool {
        name.starts_with(&self.decorator)
    }
}

impl From<&Settings> for CatalogRules {
    fn from(settings: &Settings) -> Self {
        Self {
            decorator: settings.header_decorator.clone(),
            trim_chars: settings.header_trim_chars.clone(),
            target: settings.target_category.clone(),
        }
    }
}

/// Interned category identifier, valid for the catalog that issued it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct CategoryId(usize);

/// Section the scan is currently inside
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    /// No header seen yet
    Unassigned,
    Category(CategoryId),
}

/// How a scene name resolves against the catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SceneResolution {
    /// The scene is itself a header marker
    Header(CategoryKey),
    /// The scene sits under a header
    Assigned { scene: SceneKey, category: CategoryId },
    /// The scene was listed before any header
    Unassigned(SceneKey),
    /// The scene was not in the list the catalog was built from
    Unknown(SceneKey),
}

/// Mapping of scene keys to category keys
#[derive(Debug, Clone)]
pub struct SceneCatalog {
    rules: CatalogRules,
    categories: Vec<CategoryKey>,
    scenes: HashMap<SceneKey, CategoryId>,
    unassigned: Vec<SceneKey>,
    target: Option<CategoryId>,
    source_had_data: bool,
}

impl SceneCatalog {
    /// A catalog with no scenes, as before the first successful poll
    pub fn empty(rules: CatalogRules) -> Self {
        Self {
            rules,
            categories: Vec::new(),
            scenes: HashMap::new(),
            unassigned: Vec::new(),
            target: None,
            source_had_data: false,
        }
    }

    /// Build a catalog with a single left-to-right scan of `names`.
    ///
    /// Later scenes overwrite earlier ones with the same key. Scenes that
    /// precede every header are left out of the mapping.
    pub fn build<S: AsRef<str>>(names: &[S], rules: &CatalogRules) -> Self {
        let mut catalog = Self::empty(rules.clone());
        catalog.source_had_data = !names.is_empty();

        let mut section = Section::Unassigned;

        for name in names {
            let name = name.as_ref();

            if rules.is_header(name) {
                let key = CategoryKey::from_header(name, &rules.trim_chars);
                section = Section::Category(catalog.intern(key));
                continue;
            }

            let scene = SceneKey::from_name(name);
            match section {
                Section::Category(id) => {
                    if let Some(previous) = catalog.scenes.insert(scene.clone(), id) {
                        debug!(
                            scene = %scene,
                            previous = ?catalog.category(previous).map(CategoryKey::as_str),
                            current = ?catalog.category(id).map(CategoryKey::as_str),
                            "duplicate scene key, keeping the later one"
                        );
                    }
                }
                Section::Unassigned => {
                    warn!(scene = %name, "unassigned scene: no header precedes it");
                    catalog.unassigned.push(scene);
                }
            }
        }

        catalog.target = catalog
            .categories
            .iter()
            .position(|category| category.as_str() == rules.target)
            .map(CategoryId);

        catalog
    }

    fn intern(&mut self, key: CategoryKey) -> CategoryId {
        match self.categories.iter().position(|existing| *existing == key) {
            Some(index) => CategoryId(index),
            None => {
                self.categories.push(key);
                CategoryId(self.categories.len() - 1)
            }
        }
    }

    /// Whether the scene list this catalog was built from had any entries
    pub fn source_had_data(&self) -> bool {
        self.source_had_data
    }

    pub fn rules(&self) -> &CatalogRules {
        &self.rules
    }

    /// Number of mapped scenes
    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }

    /// Look up the category key of a scene
    pub fn lookup(&self, scene: &SceneKey) -> Option<&CategoryKey> {
        self.scenes.get(scene).and_then(|id| self.category(*id))
    }

    /// Key of an interned category; `None` for an id issued by another catalog
    pub fn category(&self, id: CategoryId) -> Option<&CategoryKey> {
        self.categories.get(id.0)
    }

    /// Distinct categories in header order
    pub fn categories(&self) -> &[CategoryKey] {
        &self.categories
    }

    /// Scenes dropped because no header preceded them
    pub fn unassigned(&self) -> &[SceneKey] {
        &self.unassigned
    }

    /// The push-to-talk category, if any header produced it
    pub fn target(&self) -> Option<CategoryId> {
        self.target
    }

    pub fn is_target(&self, id: CategoryId) -> bool {
        self.target == Some(id)
    }

    /// Resolve a raw scene name
    pub fn resolve(&self, name: &str) -> SceneResolution {
        if self.rules.is_header(name) {
            return SceneResolution::Header(CategoryKey::from_header(name, &self.rules.trim_chars));
        }

        let scene = SceneKey::from_name(name);
        if let Some(&category) = self.scenes.get(&scene) {
            SceneResolution::Assigned { scene, category }
        } else if self.unassigned.contains(&scene) {
            SceneResolution::Unassigned(scene)
        } else {
            SceneResolution::Unknown(scene)
        }
    }
}
