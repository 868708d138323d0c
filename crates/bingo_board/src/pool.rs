//! Prompt pools and the grouped prompt catalog.

use crate::BoardError;
use crate::defaults::BUILTIN_PROMPTS;
use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, info, instrument, warn};

/// Smallest group of prompts offered as a selectable pool.
pub const MIN_POOL_SIZE: usize = 25;

/// Ordered list of distinct, non-blank prompts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct PromptPool(Vec<String>);

impl PromptPool {
    /// Builds a pool, trimming prompts and dropping blanks and repeats.
    pub fn new<S: Into<String>>(prompts: impl IntoIterator<Item = S>) -> Self {
        let mut seen = HashSet::new();
        let prompts = prompts
            .into_iter()
            .map(|p| p.into().trim().to_string())
            .filter(|p| !p.is_empty() && seen.insert(p.clone()))
            .collect();
        Self(prompts)
    }

    /// The built-in party prompts.
    pub fn builtin() -> Self {
        Self::new(BUILTIN_PROMPTS.iter().copied())
    }

    /// Number of prompts.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the pool is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Prompts in pool order.
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    /// Whether the pool contains the prompt.
    pub fn contains(&self, prompt: &str) -> bool {
        self.0.iter().any(|p| p == prompt)
    }
}

impl From<Vec<String>> for PromptPool {
    fn from(prompts: Vec<String>) -> Self {
        Self::new(prompts)
    }
}

impl From<PromptPool> for Vec<String> {
    fn from(pool: PromptPool) -> Self {
        pool.0
    }
}

/// One entry of a prompt catalog file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct PromptEntry {
    /// Stable identifier.
    id: String,
    /// Prompt text.
    task: String,
    /// Optional category bucket.
    #[serde(default)]
    category: Option<String>,
    /// Optional game bucket.
    #[serde(default)]
    game: Option<String>,
}

/// A selectable catalog group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Getters)]
pub struct PoolGroup {
    /// Raw bucket key.
    value: String,
    /// Display label.
    label: String,
    /// Prompts in the group.
    count: usize,
}

/// Groups large enough to deal from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Getters)]
pub struct CatalogGroups {
    /// Category groups sorted by label.
    categories: Vec<PoolGroup>,
    /// Game groups sorted by label.
    games: Vec<PoolGroup>,
}

/// Prompt entries grouped by category and by game.
#[derive(Debug, Clone, Default)]
pub struct PromptCatalog {
    entries: Vec<PromptEntry>,
    by_category: BTreeMap<String, Vec<usize>>,
    by_game: BTreeMap<String, Vec<usize>>,
}

impl PromptCatalog {
    /// Parses a JSON array of [`PromptEntry`].
    ///
    /// Entries with a blank id or blank text are skipped, as are repeated ids.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::Catalog`] if the JSON is malformed.
    #[instrument(skip(json), fields(bytes = json.len()))]
    pub fn from_json(json: &str) -> Result<Self, BoardError> {
        let raw: Vec<PromptEntry> = serde_json::from_str(json).map_err(|e| BoardError::Catalog {
            message: e.to_string(),
        })?;
        let catalog = Self::from_entries(raw);
        info!(entries = catalog.entries.len(), "Prompt catalog loaded");
        Ok(catalog)
    }

    /// Builds a catalog from entries already in memory.
    pub fn from_entries(raw: impl IntoIterator<Item = PromptEntry>) -> Self {
        let mut catalog = Self::default();
        let mut ids = HashSet::new();
        for mut entry in raw {
            entry.id = entry.id.trim().to_string();
            entry.task = entry.task.trim().to_string();
            if entry.id.is_empty() || entry.task.is_empty() || !ids.insert(entry.id.clone()) {
                warn!(id = %entry.id, "Skipping invalid catalog entry");
                continue;
            }
            let index = catalog.entries.len();
            if let Some(category) = bucket_key(entry.category.as_deref()) {
                catalog.by_category.entry(category).or_default().push(index);
            }
            if let Some(game) = bucket_key(entry.game.as_deref()) {
                catalog.by_game.entry(game).or_default().push(index);
            }
            catalog.entries.push(entry);
        }
        catalog
    }

    /// Number of valid entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the catalog has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Groups holding at least [`MIN_POOL_SIZE`] prompts.
    pub fn groups(&self) -> CatalogGroups {
        CatalogGroups {
            categories: selectable(&self.by_category),
            games: selectable(&self.by_game),
        }
    }

    /// Pool of every entry in a category. Unknown categories give an empty pool.
    pub fn category_pool(&self, category: &str) -> PromptPool {
        self.bucket_pool(self.by_category.get(category.trim()))
    }

    /// Pool of every entry tagged with a game.
    pub fn game_pool(&self, game: &str) -> PromptPool {
        self.bucket_pool(self.by_game.get(game.trim()))
    }

    /// Pool of every entry.
    pub fn all_pool(&self) -> PromptPool {
        PromptPool::new(self.entries.iter().map(|e| e.task.clone()))
    }

    fn bucket_pool(&self, bucket: Option<&Vec<usize>>) -> PromptPool {
        let Some(indices) = bucket else {
            debug!("Unknown catalog bucket");
            return PromptPool::default();
        };
        PromptPool::new(indices.iter().filter_map(|&i| self.entries.get(i)).map(|e| e.task.clone()))
    }
}

fn bucket_key(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn selectable(buckets: &BTreeMap<String, Vec<usize>>) -> Vec<PoolGroup> {
    let mut groups: Vec<_> = buckets
        .iter()
        .filter(|(_, indices)| indices.len() >= MIN_POOL_SIZE)
        .map(|(value, indices)| PoolGroup {
            value: value.clone(),
            label: titleize(value),
            count: indices.len(),
        })
        .collect();
    groups.sort_by(|a, b| a.label.cmp(&b.label));
    groups
}

/// `party_games` and `party-games` both become `Party Games`.
fn titleize(value: &str) -> String {
    value
        .split(['_', '-', ' '])
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_dedups_and_trims() {
        let pool = PromptPool::new(["a", " a ", "", "b", "   "]);
        assert_eq!(pool.as_slice(), ["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_builtin_fills_largest_board() {
        assert!(PromptPool::builtin().len() >= crate::MAX_BOARD_SIZE * crate::MAX_BOARD_SIZE);
    }

    #[test]
    fn test_titleize() {
        assert_eq!(titleize("party_games"), "Party Games");
        assert_eq!(titleize("road-trip"), "Road Trip");
        assert_eq!(titleize("x"), "X");
    }

    #[test]
    fn test_catalog_groups_filter_small_buckets() {
        let entries: Vec<PromptEntry> = (0..30)
            .map(|i| PromptEntry {
                id: format!("t{i}"),
                task: format!("Task {i}"),
                category: Some(if i < 26 { "big_group" } else { "small" }.to_string()),
                game: None,
            })
            .collect();
        let catalog = PromptCatalog::from_entries(entries);
        let groups = catalog.groups();
        assert_eq!(groups.categories().len(), 1);
        assert_eq!(groups.categories()[0].label(), "Big Group");
        assert_eq!(*groups.categories()[0].count(), 26);
        assert_eq!(catalog.category_pool("small").len(), 4);
        assert!(catalog.game_pool("none").is_empty());
    }

    #[test]
    fn test_catalog_from_json_skips_invalid() {
        let json = r#"[
            {"id": "1", "task": "Wave"},
            {"id": "1", "task": "Duplicate id"},
            {"id": "2", "task": "  "},
            {"id": "3", "task": "Clap", "category": "moves"}
        ]"#;
        let catalog = PromptCatalog::from_json(json).unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.all_pool().as_slice(), ["Wave".to_string(), "Clap".to_string()]);
    }

    #[test]
    fn test_catalog_from_json_malformed() {
        assert!(matches!(
            PromptCatalog::from_json("{not json"),
            Err(BoardError::Catalog { .. })
        ));
    }
}
