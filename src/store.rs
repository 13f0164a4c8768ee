use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub id: u64,
    pub name: String,
    pub location: String,
}

/// Storage for the people listed on the CRUD page
pub trait RecordStore: Send + Sync + Debug {
    fn get(&self, id: u64) -> Option<Person>;

    /// Up to `limit` records with an id greater than `offset`, in id order.
    ///
    /// `offset` is a cursor (the last id the caller has seen), not a row count,
    /// so deleting rows between pages never skips or repeats a record.
    fn get_all(&self, offset: u64, limit: usize) -> Vec<Person>;

    fn insert(&self, name: &str, location: &str) -> Person;

    /// Replace the fields of an existing record, returning the new value
    fn update(&self, id: u64, name: &str, location: &str) -> Option<Person>;

    /// Remove a record, returning what was removed
    fn delete(&self, id: u64) -> Option<Person>;
}

pub type SharedStore = Arc<dyn RecordStore>;

#[derive(Debug, Default)]
struct Rows {
    // Append-only with monotonic ids, so always sorted by id
    people: Vec<Person>,
    sequence: u64,
}

#[derive(Debug, Default)]
pub struct InMemoryStore {
    rows: Mutex<Rows>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> SharedStore {
        Arc::new(Self::new())
    }

    pub fn len(&self) -> usize {
        self.rows.lock().people.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl RecordStore for InMemoryStore {
    fn get(&self, id: u64) -> Option<Person> {
        self.rows.lock().people.iter().find(|p| p.id == id).cloned()
    }

    fn get_all(&self, offset: u64, limit: usize) -> Vec<Person> {
        self.rows
            .lock()
            .people
            .iter()
            .filter(|p| p.id > offset)
            .take(limit)
            .cloned()
            .collect()
    }

    fn insert(&self, name: &str, location: &str) -> Person {
        let mut rows = self.rows.lock();
        rows.sequence += 1;
        let person = Person {
            id: rows.sequence,
            name: name.to_string(),
            location: location.to_string(),
        };
        rows.people.push(person.clone());

        debug!(target: "service", "Inserted person {}", person.id);
        person
    }

    fn update(&self, id: u64, name: &str, location: &str) -> Option<Person> {
        let mut rows = self.rows.lock();
        let person = rows.people.iter_mut().find(|p| p.id == id)?;
        person.name = name.to_string();
        person.location = location.to_string();
        Some(person.clone())
    }

    fn delete(&self, id: u64) -> Option<Person> {
        let mut rows = self.rows.lock();
        let index = rows.people.iter().position(|p| p.id == id)?;

        debug!(target: "service", "Deleted person {}", id);
        Some(rows.people.remove(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded(n: usize) -> InMemoryStore {
        let store = InMemoryStore::new();
        for i in 0..n {
            store.insert(&format!("name{}", i), &format!("location{}", i));
        }
        store
    }

    #[test]
    fn test_insert_assigns_monotonic_ids() {
        let store = InMemoryStore::new();
        assert!(store.is_empty());

        let a = store.insert("Ada", "London");
        let b = store.insert("Grace", "Arlington");
        assert_eq!(a.id, 1);
        assert_eq!(b.id, 2);

        store.delete(b.id);
        let c = store.insert("Edsger", "Austin");
        assert_eq!(c.id, 3);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_get_all_is_cursor_paginated() {
        let store = seeded(5);

        let first: Vec<u64> = store.get_all(0, 2).iter().map(|p| p.id).collect();
        assert_eq!(first, vec![1, 2]);

        store.delete(3);
        let second: Vec<u64> = store.get_all(2, 2).iter().map(|p| p.id).collect();
        assert_eq!(second, vec![4, 5]);

        assert!(store.get_all(5, 10).is_empty());
        assert!(store.get_all(0, 0).is_empty());
    }

    #[test]
    fn test_update_and_delete_missing_rows() {
        let store = seeded(1);

        let updated = store.update(1, "Barbara", "Boston").unwrap();
        assert_eq!(updated.name, "Barbara");
        assert_eq!(store.get(1), Some(updated));

        assert_eq!(store.update(42, "x", "y"), None);
        assert_eq!(store.delete(42), None);
        assert_eq!(store.get(42), None);

        assert_eq!(store.delete(1).map(|p| p.location), Some("Boston".to_string()));
        assert!(store.is_empty());
    }
}
