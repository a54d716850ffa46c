//! Ball catalog: which Pokémon belong to which ball category.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while loading or validating a catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Category {category} contains an empty name")]
    EmptyName { category: BallCategory },

    #[error("{name} is listed in both {first} and {second}")]
    DuplicateName {
        name: String,
        first: BallCategory,
        second: BallCategory,
    },

    #[error("Unknown ball category: {0}")]
    UnknownCategory(String),

    #[error("No Pokémon configured in any category")]
    NoEntries,

    #[error("Failed to read catalog file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse catalog file: {0}")]
    ParseError(#[from] serde_json::Error),
}

/// Ball categories understood by `list`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BallCategory {
    Regular,
    Repeat,
    Ultra,
    Great,
    Nest,
    Safari,
}

impl BallCategory {
    /// Every category, in menu order.
    #[must_use]
    pub const fn all() -> [Self; 6] {
        [
            Self::Regular,
            Self::Repeat,
            Self::Ultra,
            Self::Great,
            Self::Nest,
            Self::Safari,
        ]
    }

    /// Lower-case key used in commands and the catalog file.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Regular => "regular",
            Self::Repeat => "repeat",
            Self::Ultra => "ultra",
            Self::Great => "great",
            Self::Nest => "nest",
            Self::Safari => "safari",
        }
    }

    /// Capitalized name used in headings.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Regular => "Regular",
            Self::Repeat => "Repeat",
            Self::Ultra => "Ultra",
            Self::Great => "Great",
            Self::Nest => "Nest",
            Self::Safari => "Safari",
        }
    }
}

impl fmt::Display for BallCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for BallCategory {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_lowercase();
        Self::all()
            .into_iter()
            .find(|c| c.key() == key)
            .ok_or(CatalogError::UnknownCategory(key))
    }
}

/// Pokémon names per ball category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BallCatalog {
    categories: BTreeMap<BallCategory, BTreeSet<String>>,
}

impl BallCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a catalog from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let content = std::fs::read_to_string(path)?;
        let catalog: Self = serde_json::from_str(&content)?;
        Ok(catalog)
    }

    /// Saves the catalog to a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), CatalogError> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Adds a name to a category.
    pub fn insert(&mut self, category: BallCategory, name: impl Into<String>) {
        self.categories.entry(category).or_default().insert(name.into());
    }

    /// Names of a category in alphabetical order; empty if absent.
    #[must_use]
    pub fn get(&self, category: BallCategory) -> Vec<&str> {
        self.categories
            .get(&category)
            .map(|names| names.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Number of names across all categories.
    #[must_use]
    pub fn len(&self) -> usize {
        self.categories.values().map(BTreeSet::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Validates the whole catalog.
    ///
    /// # Errors
    ///
    /// Returns the first validation error encountered.
    pub fn validate(&self) -> Result<(), CatalogError> {
        if self.is_empty() {
            return Err(CatalogError::NoEntries);
        }
        self.validate_all()
            .into_iter()
            .find_map(|(_, result)| result.err())
            .map_or(Ok(()), Err)
    }

    /// Returns the validation result of every category, in menu order.
    ///
    /// A name listed in several categories is reported in the later one.
    #[must_use]
    pub fn validate_all(&self) -> Vec<(BallCategory, Result<(), CatalogError>)> {
        let mut seen: HashMap<String, BallCategory> = HashMap::new();
        let mut results = Vec::new();

        for category in BallCategory::all() {
            let mut result = Ok(());

            for name in self.get(category) {
                if name.trim().is_empty() {
                    result = Err(CatalogError::EmptyName { category });
                    break;
                }
                if let Some(&first) = seen.get(&name.to_lowercase()) {
                    result = Err(CatalogError::DuplicateName {
                        name: name.to_owned(),
                        first,
                        second: category,
                    });
                    break;
                }
                seen.insert(name.to_lowercase(), category);
            }

            results.push((category, result));
        }

        results
    }

    /// Creates an example catalog for users to start from.
    #[must_use]
    pub fn example() -> Self {
        let mut catalog = Self::new();
        let entries: [(BallCategory, &[&str]); 6] = [
            (BallCategory::Regular, &["Caterpie", "Pidgey", "Rattata", "Weedle"]),
            (BallCategory::Repeat, &["Eevee", "Pikachu"]),
            (BallCategory::Ultra, &["Dragonite", "Gengar", "Snorlax"]),
            (BallCategory::Great, &["Growlithe", "Haunter", "Kadabra"]),
            (BallCategory::Nest, &["Bulbasaur", "Charmander", "Squirtle"]),
            (BallCategory::Safari, &["Chansey", "Kangaskhan", "Tauros"]),
        ];
        for (category, names) in entries {
            for name in names {
                catalog.insert(category, *name);
            }
        }
        catalog
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_from_str() {
        assert_eq!("ultra".parse::<BallCategory>().unwrap(), BallCategory::Ultra);
        assert_eq!("Safari".parse::<BallCategory>().unwrap(), BallCategory::Safari);
        assert!(matches!(
            "master".parse::<BallCategory>(),
            Err(CatalogError::UnknownCategory(key)) if key == "master"
        ));
    }

    #[test]
    fn test_parse_json() {
        let catalog: BallCatalog =
            serde_json::from_str(r#"{"ultra": ["Snorlax", "Gengar"], "nest": []}"#).unwrap();
        assert_eq!(catalog.get(BallCategory::Ultra), vec!["Gengar", "Snorlax"]);
        assert!(catalog.get(BallCategory::Nest).is_empty());
        assert!(catalog.get(BallCategory::Great).is_empty());
        assert_eq!(catalog.len(), 2);
    }

    #[test]
    fn test_unknown_category_in_file_is_rejected() {
        let parsed = serde_json::from_str::<BallCatalog>(r#"{"master": ["Mewtwo"]}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_example_is_valid() {
        let catalog = BallCatalog::example();
        assert!(catalog.validate().is_ok());
        assert!(BallCategory::all()
            .into_iter()
            .all(|c| !catalog.get(c).is_empty()));
    }

    #[test]
    fn test_validation_empty_catalog() {
        assert!(matches!(BallCatalog::new().validate(), Err(CatalogError::NoEntries)));
    }

    #[test]
    fn test_validation_duplicate_across_categories() {
        let mut catalog = BallCatalog::new();
        catalog.insert(BallCategory::Regular, "Pidgey");
        catalog.insert(BallCategory::Great, "pidgey");

        let results = catalog.validate_all();
        assert!(results[0].1.is_ok());
        assert!(matches!(
            &results[3],
            (BallCategory::Great, Err(CatalogError::DuplicateName { first: BallCategory::Regular, .. }))
        ));
        assert!(catalog.validate().is_err());
    }

    #[test]
    fn test_validation_empty_name() {
        let mut catalog = BallCatalog::new();
        catalog.insert(BallCategory::Nest, "  ");
        assert!(matches!(
            catalog.validate(),
            Err(CatalogError::EmptyName { category: BallCategory::Nest })
        ));
    }
}
