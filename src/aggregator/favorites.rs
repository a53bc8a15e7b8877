//! APOD favorites kept for the session.

use std::collections::BTreeSet;

#[derive(Debug, Clone, Default)]
pub struct FavoritesStore {
    dates: BTreeSet<String>,
}

impl FavoritesStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip `date`; returns true when it is now a favorite
    pub fn toggle(&mut self, date: &str) -> bool {
        if self.dates.remove(date) {
            false
        } else {
            self.dates.insert(date.to_string());
            true
        }
    }

    pub fn contains(&self, date: &str) -> bool {
        self.dates.contains(date)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.dates.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_adds_then_removes() {
        let mut favorites = FavoritesStore::new();
        assert!(favorites.toggle("2024-01-01"));
        assert!(favorites.contains("2024-01-01"));
        assert!(!favorites.toggle("2024-01-01"));
        assert!(favorites.is_empty());
    }

    #[test]
    fn test_iter_is_date_ordered() {
        let mut favorites = FavoritesStore::new();
        favorites.toggle("2024-03-01");
        favorites.toggle("2023-12-25");
        assert_eq!(
            favorites.iter().collect::<Vec<_>>(),
            vec!["2023-12-25", "2024-03-01"]
        );
    }
}
