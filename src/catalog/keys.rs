//! Normalized lookup keys for scenes and categories

use serde::{Deserialize, Serialize};

/// Normalize a display name for lookup: lowercase, spaces become hyphens.
pub fn normalize(name: &str) -> String {
    name.to_lowercase().replace(' ', "-")
}

/// Strip any of `trim_chars` from both ends of a header name.
///
/// This is a character-set trim, not a prefix/suffix removal: with the
/// trim set `"- "`, a header `"-- Pre-show -"` loses every leading and
/// trailing hyphen and space. A title that itself ends in one of the trim
/// characters is over-stripped.
pub fn trim_header<'a>(name: &'a str, trim_chars: &str) -> &'a str {
    name.trim_matches(|c: char| trim_chars.contains(c))
}

/// Normalized scene display name
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SceneKey(String);

impl SceneKey {
    pub fn from_name(name: &str) -> Self {
        Self(normalize(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SceneKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Normalized header display name, identifying a category of scenes
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryKey(String);

impl CategoryKey {
    /// Derive the category key from a header scene name
    pub fn from_header(name: &str, trim_chars: &str) -> Self {
        Self(normalize(trim_header(name, trim_chars)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CategoryKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("Main Camera"), "main-camera");
        assert_eq!(normalize("BRB  Screen"), "brb--screen");
    }

    #[test]
    fn test_header_key() {
        let key = CategoryKey::from_header("-- Title Scenes --", "- ");
        assert_eq!(key.as_str(), "title-scenes");
    }

    #[test]
    fn test_trim_is_character_set() {
        // Every edge character in the set goes, not just a literal "-- "
        assert_eq!(trim_header("- -- Gameplay -- -", "- "), "Gameplay");
        assert_eq!(trim_header("--------Gameplay", "- "), "Gameplay");
        // Over-strip of a title ending in a trim character
        assert_eq!(trim_header("-- Pre- --", "- "), "Pre");
    }

    #[test]
    fn test_trim_with_empty_set() {
        assert_eq!(trim_header("-- Title --", ""), "-- Title --");
    }

    #[test]
    fn test_keys_are_case_insensitive() {
        assert_eq!(SceneKey::from_name("Intro"), SceneKey::from_name("INTRO"));
        assert_eq!(
            CategoryKey::from_header("== Title Scenes ==", "= "),
            CategoryKey::from_header("-- title scenes --", "- "),
        );
    }
}
