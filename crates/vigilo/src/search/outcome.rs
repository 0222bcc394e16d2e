use crate::item::Item;

/// An item found by a radius search, with its distance from the search origin.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct NearbyItem {
    pub item: Item,
    /// Great-circle distance in kilometres, unrounded
    pub distance_km: f64,
}

/// Results of a [`SearchRequest`](super::SearchRequest).
///
/// The variant mirrors the request: only radius searches carry distances.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    /// Nearest first
    Nearby(Vec<NearbyItem>),
    /// Highest reward first
    Filtered(Vec<Item>),
}

impl SearchOutcome {
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Nearby(items) => items.len(),
            Self::Filtered(items) => items.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The matched items, dropping distances.
    pub fn items(&self) -> Vec<&Item> {
        match self {
            Self::Nearby(items) => items.iter().map(|nearby| &nearby.item).collect(),
            Self::Filtered(items) => items.iter().collect(),
        }
    }

    /// Distances in result order, or `None` for a filter-only search.
    #[must_use]
    pub fn distances(&self) -> Option<Vec<f64>> {
        match self {
            Self::Nearby(items) => Some(items.iter().map(|nearby| nearby.distance_km).collect()),
            Self::Filtered(_) => None,
        }
    }

    pub fn ids(&self) -> Vec<u64> {
        self.items().into_iter().map(|item| item.id).collect()
    }
}
