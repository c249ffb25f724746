//! The card catalog: a static, read-only list of rateable cards.
//!
//! Loaded once at startup from a JSON array (the same shape the frontend
//! bundles) and shared as `Arc<Catalog>` for the lifetime of the process.

use std::collections::HashMap;
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rarity {
    Common,
    Rare,
    Epic,
    Legendary,
    Champion,
    Creator,
}

/// One catalog entry. `id` is the stable slug every other subsystem keys on.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub id: String,
    pub name: String,
    pub image_url: String,
    pub rarity: Rarity,
    pub elixir: u8,
    pub description: String,
    /// Constrained to land within the first N slots of every shuffle.
    #[serde(default)]
    pub pinned_early: bool,
}

#[derive(thiserror::Error, Debug)]
pub enum CatalogError {
    #[error("duplicate card id: {0}")]
    DuplicateId(String),
}

/// Immutable, deduplicated card collection with O(1) lookup by id.
#[derive(Debug, Clone)]
pub struct Catalog {
    cards: Vec<Card>,
    index: HashMap<String, usize>,
}

impl Catalog {
    pub fn from_cards(cards: Vec<Card>) -> Result<Self, CatalogError> {
        let mut index = HashMap::with_capacity(cards.len());
        for (i, card) in cards.iter().enumerate() {
            if index.insert(card.id.clone(), i).is_some() {
                return Err(CatalogError::DuplicateId(card.id.clone()));
            }
        }
        Ok(Self { cards, index })
    }

    /// Load a catalog from a JSON array file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("read {}", path.display()))?;
        let cards: Vec<Card> =
            serde_json::from_str(&raw).with_context(|| format!("parse {}", path.display()))?;
        let catalog = Self::from_cards(cards)?;
        Ok(catalog)
    }

    pub fn get(&self, id: &str) -> Option<&Card> {
        self.index.get(id).map(|&i| &self.cards[i])
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}
