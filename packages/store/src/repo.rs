//! # Repositories — typed CRUD over a key-value store
//!
//! This module is the core of Recipe Keeper's storage layer. All reads and
//! writes go through the [`KeyValueStore`] trait, so the same logic works
//! against an in-memory store (tests, several in-process contexts), the
//! filesystem (desktop) or `localStorage` (web).
//!
//! ## [`Collection`]
//!
//! The generic workhorse. A collection of one [`Record`] type lives in a single
//! storage slot as a JSON array. Every mutation follows the same pattern: read
//! the whole collection, compute the new one, write it back in full, then
//! publish a [`ChangeEvent`](crate::notify::ChangeEvent). There are no deltas
//! and no locks; across contexts the last writer wins.
//!
//! | Method | Description |
//! |--------|-------------|
//! | [`list`](Collection::list) | Full collection as stored (newest first). |
//! | [`get`](Collection::get) | Point lookup by id. |
//! | [`insert`](Collection::insert) | Prepends a record. |
//! | [`modify`](Collection::modify) | Applies a closure to one record; `false` if the id is absent. |
//! | [`remove`](Collection::remove) | Hard delete; `false` if the id is absent. |
//! | [`dirty_count`](Collection::dirty_count) | Records with `synced == false`. |
//! | [`mark_synced_if_unchanged`](Collection::mark_synced_if_unchanged) | Used by the sync manager after a remote exchange. |
//! | [`watch`](Collection::watch) | A [`LiveView`] following this collection. |
//!
//! Absent ids are not errors: `modify` and `remove` return `Ok(false)`, write
//! nothing and publish nothing.
//!
//! ## Typed repositories
//!
//! | Repository | Adds |
//! |------------|------|
//! | [`RecipeRepository`] | seeding of the sample recipes, `add`/`update` from [`RecipeInput`], free-text [`search`](RecipeRepository::search) |
//! | [`MadeEntryRepository`] | `add`/`update` from [`MadeEntryInput`], [`entries_for_recipe`](MadeEntryRepository::entries_for_recipe), [`average_grade`](MadeEntryRepository::average_grade) |
//!
//! New ids are UUID v4 strings; timestamps come from [`Utc::now`].

use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use crate::error::StoreError;
use crate::kv::{load_collection, save_collection, KeyValueStore};
use crate::models::{MadeEntry, MadeEntryInput, Recipe, RecipeInput, Record};
use crate::notify::{ChangeNotifier, ChangeOrigin};
use crate::seed::sample_recipes;
use crate::view::LiveView;

/// One collection of `T` records in one storage slot.
pub struct Collection<T: Record> {
    store: Arc<dyn KeyValueStore>,
    notifier: ChangeNotifier,
    _record: PhantomData<fn() -> T>,
}

impl<T: Record> Clone for Collection<T> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            notifier: self.notifier.clone(),
            _record: PhantomData,
        }
    }
}

impl<T: Record> Collection<T> {
    pub fn new(store: Arc<dyn KeyValueStore>, notifier: ChangeNotifier) -> Self {
        Self {
            store,
            notifier,
            _record: PhantomData,
        }
    }

    /// The storage slot of this collection.
    pub fn key(&self) -> &'static str {
        T::COLLECTION.storage_key()
    }

    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }

    /// Full collection, newest first.
    pub fn list(&self) -> Vec<T> {
        load_collection(self.store.as_ref(), self.key())
    }

    pub fn get(&self, id: &str) -> Option<T> {
        self.list().into_iter().find(|r| r.id() == id)
    }

    /// Write the whole collection and publish the change.
    pub fn commit(&self, items: &[T], origin: ChangeOrigin) -> Result<(), StoreError> {
        save_collection(self.store.as_ref(), self.key(), items)?;
        self.notifier.notify(T::COLLECTION, origin);
        Ok(())
    }

    /// Prepend a record.
    pub fn insert(&self, record: T) -> Result<(), StoreError> {
        let mut items = self.list();
        items.insert(0, record);
        self.commit(&items, ChangeOrigin::Local)
    }

    /// Apply `change` to the record with `id`. `Ok(false)` when there is none.
    pub fn modify(&self, id: &str, change: impl FnOnce(&mut T)) -> Result<bool, StoreError> {
        let mut items = self.list();
        let Some(record) = items.iter_mut().find(|r| r.id() == id) else {
            tracing::debug!(key = self.key(), id, "update skipped, no such record");
            return Ok(false);
        };
        change(record);
        self.commit(&items, ChangeOrigin::Local)?;
        Ok(true)
    }

    /// Hard-delete the record with `id`. `Ok(false)` when there is none.
    pub fn remove(&self, id: &str) -> Result<bool, StoreError> {
        let mut items = self.list();
        let before = items.len();
        items.retain(|r| r.id() != id);
        if items.len() == before {
            return Ok(false);
        }
        self.commit(&items, ChangeOrigin::Local)?;
        Ok(true)
    }

    /// Number of records with local changes not yet reconciled.
    pub fn dirty_count(&self) -> usize {
        self.list().iter().filter(|r| !r.is_synced()).count()
    }

    /// Mark synced every dirty record still identical to its copy in `exchanged`.
    ///
    /// Records edited or created after `exchanged` was read stay dirty. Writes
    /// and publishes only when at least one record flipped; returns how many did.
    pub fn mark_synced_if_unchanged(&self, exchanged: &[T]) -> Result<usize, StoreError> {
        let mut items = self.list();
        let mut flipped = 0;
        for record in items.iter_mut().filter(|r| !r.is_synced()) {
            let unchanged = exchanged
                .iter()
                .any(|sent| sent.id() == record.id() && sent == record);
            if unchanged {
                record.set_synced(true);
                flipped += 1;
            }
        }
        if flipped > 0 {
            self.commit(&items, ChangeOrigin::Sync)?;
        }
        Ok(flipped)
    }

    /// A live snapshot of this collection. See [`LiveView`].
    pub fn watch(&self, poll_interval: Option<Duration>) -> LiveView<T> {
        LiveView::spawn(self.store.clone(), &self.notifier, poll_interval)
    }
}

fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Recipes, seeded with the sample recipes on first access.
#[derive(Clone)]
pub struct RecipeRepository {
    recipes: Collection<Recipe>,
}

impl RecipeRepository {
    pub fn new<S: KeyValueStore + 'static>(store: S, notifier: ChangeNotifier) -> Self {
        Self::from_shared(Arc::new(store), notifier)
    }

    pub fn from_shared(store: Arc<dyn KeyValueStore>, notifier: ChangeNotifier) -> Self {
        let repo = Self {
            recipes: Collection::new(store, notifier),
        };
        repo.ensure_seeded();
        repo
    }

    /// Write the sample recipes when the slot has never been written.
    ///
    /// An existing slot is left alone, even an empty or unreadable one.
    fn ensure_seeded(&self) {
        let store = self.recipes.store();
        if store.contains(self.recipes.key()) {
            return;
        }
        let samples = sample_recipes();
        match self.recipes.commit(&samples, ChangeOrigin::Local) {
            Ok(()) => tracing::info!(recipes = samples.len(), "seeded sample recipes"),
            Err(err) => tracing::warn!(error = %err, "could not seed sample recipes"),
        }
    }

    pub fn collection(&self) -> &Collection<Recipe> {
        &self.recipes
    }

    pub fn list(&self) -> Vec<Recipe> {
        self.recipes.list()
    }

    /// Recipes whose title, description, category or any ingredient contains `query`.
    pub fn search(&self, query: &str) -> Vec<Recipe> {
        self.list().into_iter().filter(|r| r.matches(query)).collect()
    }

    pub fn get(&self, id: &str) -> Option<Recipe> {
        self.recipes.get(id)
    }

    pub fn add(&self, input: RecipeInput) -> Result<Recipe, StoreError> {
        let recipe = Recipe::from_input(new_id(), input, Utc::now());
        self.recipes.insert(recipe.clone())?;
        tracing::debug!(id = %recipe.id, title = %recipe.title, "recipe added");
        Ok(recipe)
    }

    /// Replace the editable fields of recipe `id`. `Ok(false)` when it does not exist.
    pub fn update(&self, id: &str, input: RecipeInput) -> Result<bool, StoreError> {
        let now = Utc::now();
        self.recipes.modify(id, |recipe| recipe.apply(input, now))
    }

    /// `Ok(false)` when recipe `id` does not exist.
    pub fn delete(&self, id: &str) -> Result<bool, StoreError> {
        self.recipes.remove(id)
    }

    pub fn watch(&self, poll_interval: Option<Duration>) -> LiveView<Recipe> {
        self.recipes.watch(poll_interval)
    }
}

/// "Made it" entries.
#[derive(Clone)]
pub struct MadeEntryRepository {
    entries: Collection<MadeEntry>,
}

impl MadeEntryRepository {
    pub fn new<S: KeyValueStore + 'static>(store: S, notifier: ChangeNotifier) -> Self {
        Self::from_shared(Arc::new(store), notifier)
    }

    pub fn from_shared(store: Arc<dyn KeyValueStore>, notifier: ChangeNotifier) -> Self {
        Self {
            entries: Collection::new(store, notifier),
        }
    }

    pub fn collection(&self) -> &Collection<MadeEntry> {
        &self.entries
    }

    pub fn list(&self) -> Vec<MadeEntry> {
        self.entries.list()
    }

    pub fn get(&self, id: &str) -> Option<MadeEntry> {
        self.entries.get(id)
    }

    pub fn add(&self, input: MadeEntryInput) -> Result<MadeEntry, StoreError> {
        let entry = MadeEntry::from_input(new_id(), input, Utc::now());
        self.entries.insert(entry.clone())?;
        tracing::debug!(id = %entry.id, recipe = %entry.recipe_id, "made entry added");
        Ok(entry)
    }

    /// Replace the editable fields of entry `id`. `Ok(false)` when it does not exist.
    pub fn update(&self, id: &str, input: MadeEntryInput) -> Result<bool, StoreError> {
        self.entries.modify(id, |entry| entry.apply(input))
    }

    /// `Ok(false)` when entry `id` does not exist.
    pub fn delete(&self, id: &str) -> Result<bool, StoreError> {
        self.entries.remove(id)
    }

    /// Entries logged against `recipe_id`, newest first.
    pub fn entries_for_recipe(&self, recipe_id: &str) -> Vec<MadeEntry> {
        self.list()
            .into_iter()
            .filter(|e| e.recipe_id == recipe_id)
            .collect()
    }

    /// Mean grade of the entries for `recipe_id`; `None` when there are none.
    pub fn average_grade(&self, recipe_id: &str) -> Option<f64> {
        let entries = self.entries_for_recipe(recipe_id);
        if entries.is_empty() {
            return None;
        }
        let sum: u32 = entries.iter().map(|e| u32::from(e.grade)).sum();
        Some(f64::from(sum) / entries.len() as f64)
    }

    pub fn watch(&self, poll_interval: Option<Duration>) -> LiveView<MadeEntry> {
        self.entries.watch(poll_interval)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::tests::{entry_input, sample_input};
    use crate::models::{CollectionKey, MADE_ENTRIES_KEY, RECIPES_KEY};
    use crate::notify::ChangeEvent;
    use crate::MemoryStore;

    fn recipes() -> (RecipeRepository, MemoryStore, ChangeNotifier) {
        let store = MemoryStore::new();
        let notifier = ChangeNotifier::new();
        let repo = RecipeRepository::new(store.clone(), notifier.clone());
        (repo, store, notifier)
    }

    #[test]
    fn test_first_access_seeds_samples() {
        let (repo, _, _) = recipes();
        let list = repo.list();
        assert_eq!(list.len(), 3);
        assert!(list.iter().all(|r| r.synced));
        assert!(list.iter().any(|r| r.title == "Classic Margherita Pizza"));
        assert!(list.iter().any(|r| r.title == "Creamy Chicken Alfredo"));
        assert!(list.iter().any(|r| r.title == "Fresh Garden Salad"));
    }

    #[test]
    fn test_existing_slot_is_not_reseeded() {
        let store = MemoryStore::new();
        store.write(RECIPES_KEY, "[]").unwrap();
        let repo = RecipeRepository::new(store.clone(), ChangeNotifier::new());
        assert!(repo.list().is_empty());

        // Corrupt slot reads as empty and stays as it is
        store.write(RECIPES_KEY, "not json").unwrap();
        let repo = RecipeRepository::new(store.clone(), ChangeNotifier::new());
        assert!(repo.list().is_empty());
        assert_eq!(store.read(RECIPES_KEY).as_deref(), Some("not json"));
    }

    #[test]
    fn test_add_then_get() {
        let (repo, _, _) = recipes();
        let input = sample_input("Shakshuka");
        let created = repo.add(input.clone()).unwrap();

        let loaded = repo.get(&created.id).unwrap();
        assert_eq!(loaded, created);
        assert_eq!(loaded.title, input.title);
        assert_eq!(loaded.ingredients, input.ingredients);
        assert_eq!(loaded.instructions, input.instructions);
        assert_eq!(loaded.created_at, loaded.updated_at);
        assert!(!loaded.synced);

        // Newest first
        assert_eq!(repo.list()[0].id, created.id);
    }

    #[test]
    fn test_ids_are_unique() {
        let (repo, _, _) = recipes();
        let a = repo.add(sample_input("A")).unwrap();
        let b = repo.add(sample_input("A")).unwrap();
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_update_preserves_identity() {
        let (repo, _, _) = recipes();
        let mut pizza = repo.get("1").unwrap();
        assert!(pizza.synced);

        let mut patch = sample_input("Pizza Bianca");
        patch.servings = 6;
        assert!(repo.update("1", patch.clone()).unwrap());

        let updated = repo.get("1").unwrap();
        assert_eq!(updated.id, "1");
        assert_eq!(updated.created_at, pizza.created_at);
        assert!(updated.updated_at > pizza.updated_at);
        assert!(!updated.synced);
        assert_eq!(updated.title, "Pizza Bianca");
        assert_eq!(updated.servings, 6);

        // Every editable field replaced
        pizza.apply(patch, updated.updated_at);
        assert_eq!(updated, pizza);
    }

    // Missing ids are reported as `false` instead of failing silently.
    #[test]
    fn test_update_missing_id_reports_false() {
        let (repo, store, notifier) = recipes();
        let before = store.read(RECIPES_KEY);
        let mut events = notifier.subscribe();

        assert!(!repo.update("nope", sample_input("Ghost")).unwrap());
        assert_eq!(store.read(RECIPES_KEY), before);
        assert!(events.try_recv().is_err());
    }

    #[test]
    fn test_delete_is_idempotent() {
        let (repo, _, _) = recipes();
        assert!(repo.delete("2").unwrap());
        assert!(repo.get("2").is_none());
        assert!(!repo.delete("2").unwrap());
        assert!(!repo.delete("never-existed").unwrap());
        assert_eq!(repo.list().len(), 2);
    }

    #[test]
    fn test_mutations_notify_once() {
        let (repo, _, notifier) = recipes();
        let mut events = notifier.subscribe();

        let created = repo.add(sample_input("Tacos")).unwrap();
        repo.update(&created.id, sample_input("Fish Tacos")).unwrap();
        repo.delete(&created.id).unwrap();

        let local = ChangeEvent {
            collection: CollectionKey::Recipes,
            origin: ChangeOrigin::Local,
        };
        for _ in 0..3 {
            assert_eq!(events.try_recv().unwrap(), local);
        }
        assert!(events.try_recv().is_err());
    }

    #[test]
    fn test_search_matches_fields() {
        let (repo, _, _) = recipes();
        let titles = |q: &str| -> Vec<String> {
            repo.search(q).into_iter().map(|r| r.title).collect()
        };

        assert_eq!(titles("margherita"), vec!["Classic Margherita Pizza"]);
        assert_eq!(titles("ITALIAN").len(), 2);
        assert_eq!(titles("vinaigrette"), vec!["Fresh Garden Salad"]);
        // Ingredient match
        assert_eq!(titles("fettuccine"), vec!["Creamy Chicken Alfredo"]);
        assert_eq!(titles("olive oil").len(), 2);
        assert_eq!(titles("").len(), 3);
        assert!(titles("sushi").is_empty());
    }

    #[test]
    fn test_last_write_wins() {
        let shared = MemoryStore::new();
        let tab_a = RecipeRepository::new(shared.clone(), ChangeNotifier::new());
        let tab_b = RecipeRepository::new(shared, ChangeNotifier::new());

        let mut first = sample_input("First caller");
        first.cook_time = 11;
        let mut second = sample_input("Second caller");
        second.servings = 9;

        tab_a.update("3", first).unwrap();
        tab_b.update("3", second.clone()).unwrap();

        // The first caller's change is gone entirely
        let winner = tab_a.get("3").unwrap();
        assert_eq!(winner.title, "Second caller");
        assert_eq!(winner.servings, 9);
        assert_eq!(winner.cook_time, second.cook_time);
    }

    #[test]
    fn test_mark_synced_skips_records_changed_since() {
        let (repo, _, notifier) = recipes();
        let a = repo.add(sample_input("A")).unwrap();
        let b = repo.add(sample_input("B")).unwrap();
        let exchanged = repo.list();

        // Edited while the exchange was in flight
        repo.update(&b.id, sample_input("B2")).unwrap();
        let late = repo.add(sample_input("C")).unwrap();

        let mut events = notifier.subscribe();
        let flipped = repo.collection().mark_synced_if_unchanged(&exchanged).unwrap();
        assert_eq!(flipped, 1);
        assert!(repo.get(&a.id).unwrap().synced);
        assert!(!repo.get(&b.id).unwrap().synced);
        assert!(!repo.get(&late.id).unwrap().synced);
        assert_eq!(events.try_recv().unwrap().origin, ChangeOrigin::Sync);
    }

    #[test]
    fn test_mark_synced_twice_is_noop() {
        let (repo, store, notifier) = recipes();
        repo.add(sample_input("A")).unwrap();
        let exchanged = repo.list();

        let mut events = notifier.subscribe();
        assert_eq!(repo.collection().mark_synced_if_unchanged(&exchanged).unwrap(), 1);
        let after_first = store.read(RECIPES_KEY);

        assert_eq!(repo.collection().mark_synced_if_unchanged(&repo.list()).unwrap(), 0);
        assert_eq!(store.read(RECIPES_KEY), after_first);
        assert!(events.try_recv().is_ok());
        assert!(events.try_recv().is_err());
        assert_eq!(repo.collection().dirty_count(), 0);
    }

    #[test]
    fn test_entries_for_recipe() {
        let store = MemoryStore::new();
        let entries = MadeEntryRepository::new(store.clone(), ChangeNotifier::new());
        assert!(!store.contains(MADE_ENTRIES_KEY));

        let first = entries.add(entry_input("1", 5)).unwrap();
        entries.add(entry_input("2", 1)).unwrap();
        let second = entries.add(entry_input("1", 3)).unwrap();
        // Dangling recipe ids are kept
        entries.add(entry_input("missing", 2)).unwrap();

        let for_pizza = entries.entries_for_recipe("1");
        let ids: Vec<&str> = for_pizza.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec![second.id.as_str(), first.id.as_str()]);
        assert!(for_pizza.iter().all(|e| !e.synced));
        assert_eq!(entries.entries_for_recipe("missing").len(), 1);
        assert!(entries.entries_for_recipe("3").is_empty());
    }

    #[test]
    fn test_average_grade() {
        let entries = MadeEntryRepository::new(MemoryStore::new(), ChangeNotifier::new());
        assert_eq!(entries.average_grade("1"), None);

        for grade in [5, 3, 4] {
            entries.add(entry_input("1", grade)).unwrap();
        }
        entries.add(entry_input("2", 1)).unwrap();
        assert_eq!(entries.average_grade("1"), Some(4.0));
        assert_eq!(entries.average_grade("2"), Some(1.0));
    }

    #[test]
    fn test_made_entry_update_and_delete() {
        let entries = MadeEntryRepository::new(MemoryStore::new(), ChangeNotifier::new());
        let entry = entries.add(entry_input("1", 2)).unwrap();

        let patch = MadeEntryInput {
            comment: Some("better with garlic".into()),
            ..entry_input("1", 4)
        };
        assert!(entries.update(&entry.id, patch).unwrap());
        let updated = entries.get(&entry.id).unwrap();
        assert_eq!(updated.grade, 4);
        assert_eq!(updated.created_at, entry.created_at);
        assert_eq!(updated.comment.as_deref(), Some("better with garlic"));

        assert!(!entries.update("nope", entry_input("1", 1)).unwrap());
        assert!(entries.delete(&entry.id).unwrap());
        assert!(entries.get(&entry.id).is_none());
        assert!(!entries.delete(&entry.id).unwrap());
    }
}
