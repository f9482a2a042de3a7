use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub type UserId = u32;
pub type ItemId = u32;

/// Term → TF-IDF weight for one item title
pub type TermWeights = BTreeMap<String, f64>;

/// Item metadata keyed by item id
pub type ItemTable = BTreeMap<ItemId, Item>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    pub user_id: UserId,
    pub item_id: ItemId,
    pub value: f64,
    pub timestamp: i64,
}

impl Rating {
    pub fn new(user_id: UserId, item_id: ItemId, value: f64) -> Self {
        Self {
            user_id,
            item_id,
            value,
            timestamp: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub item_id: ItemId,
    pub title: String,
    pub release_date: String,
    pub genres: Vec<String>,
}

impl Item {
    pub fn new(item_id: ItemId, title: impl Into<String>) -> Self {
        Self {
            item_id,
            title: title.into(),
            release_date: String::new(),
            genres: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub user_id: UserId,
    pub age: u32,
    pub gender: String,
    pub occupation: String,
    pub zip_code: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Genre {
    pub genre_id: u32,
    pub name: String,
}

/// Ratings grouped by user and by item.
///
/// Each group keeps ingestion order. Duplicate `(user, item)` pairs are kept
/// as-is; lookups that need a single value per pair take the last one.
#[derive(Debug, Clone, Default)]
pub struct RatingIndex {
    by_user: BTreeMap<UserId, Vec<Rating>>,
    by_item: BTreeMap<ItemId, Vec<Rating>>,
}

impl RatingIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_ratings(ratings: impl IntoIterator<Item = Rating>) -> Self {
        let mut index = Self::new();
        for rating in ratings {
            index.insert(rating);
        }
        index
    }

    pub fn insert(&mut self, rating: Rating) {
        self.by_item
            .entry(rating.item_id)
            .or_default()
            .push(rating.clone());
        self.by_user.entry(rating.user_id).or_default().push(rating);
    }

    pub fn user_ratings(&self, user_id: UserId) -> Option<&[Rating]> {
        self.by_user.get(&user_id).map(Vec::as_slice)
    }

    pub fn item_ratings(&self, item_id: ItemId) -> Option<&[Rating]> {
        self.by_item.get(&item_id).map(Vec::as_slice)
    }

    /// Item → rating map for one user (last rating wins on duplicates)
    pub fn user_item_ratings(&self, user_id: UserId) -> Option<BTreeMap<ItemId, f64>> {
        self.by_user.get(&user_id).map(|ratings| {
            ratings
                .iter()
                .map(|rating| (rating.item_id, rating.value))
                .collect()
        })
    }

    pub fn users(&self) -> impl Iterator<Item = (UserId, &[Rating])> {
        self.by_user.iter().map(|(id, ratings)| (*id, ratings.as_slice()))
    }

    pub fn items(&self) -> impl Iterator<Item = (ItemId, &[Rating])> {
        self.by_item.iter().map(|(id, ratings)| (*id, ratings.as_slice()))
    }

    pub fn user_count(&self) -> usize {
        self.by_user.len()
    }

    pub fn item_count(&self) -> usize {
        self.by_item.len()
    }

    pub fn rating_count(&self) -> usize {
        self.by_user.values().map(Vec::len).sum()
    }
}

/// Everything one recommendation call reads. Never mutated by the engine.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub index: RatingIndex,
    pub items: ItemTable,
    pub users: BTreeMap<UserId, User>,
    pub genres: Vec<Genre>,
}

impl Dataset {
    pub fn new(index: RatingIndex, items: ItemTable) -> Self {
        Self {
            index,
            items,
            users: BTreeMap::new(),
            genres: Vec::new(),
        }
    }

    pub fn title(&self, item_id: ItemId) -> Option<&str> {
        self.items.get(&item_id).map(|item| item.title.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoredItem {
    pub item_id: ItemId,
    pub score: f64,
}

impl ScoredItem {
    pub fn new(item_id: ItemId, score: f64) -> Self {
        Self { item_id, score }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_groups_by_user_and_item() {
        let index = RatingIndex::from_ratings(vec![
            Rating::new(1, 10, 5.0),
            Rating::new(1, 11, 3.0),
            Rating::new(2, 10, 4.0),
        ]);

        assert_eq!(index.user_count(), 2);
        assert_eq!(index.item_count(), 2);
        assert_eq!(index.rating_count(), 3);
        assert_eq!(index.user_ratings(1).map(|r| r.len()), Some(2));
        assert_eq!(index.item_ratings(10).map(|r| r.len()), Some(2));
        assert!(index.user_ratings(3).is_none());
    }

    #[test]
    fn test_user_item_ratings_keeps_last_duplicate() {
        let index = RatingIndex::from_ratings(vec![
            Rating::new(1, 10, 2.0),
            Rating::new(1, 10, 4.0),
        ]);

        // Both rows stay in the index
        assert_eq!(index.user_ratings(1).map(|r| r.len()), Some(2));

        let map = index.user_item_ratings(1).unwrap();
        assert_eq!(map.len(), 1);
        assert_eq!(map[&10], 4.0);
    }
}
