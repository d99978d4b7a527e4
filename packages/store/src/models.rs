//! # Domain models for recipes and "made it" entries
//!
//! Defines the records persisted by the repositories in [`crate::repo`] and the
//! input shapes the UI layer hands to them. Every type is
//! `Serialize + Deserialize` with camelCase field names, so the stored JSON
//! reads `createdAt`, `cookTime`, `recipeId` and so on. Timestamps serialize as
//! RFC 3339 strings.
//!
//! ## Types
//!
//! | Struct | Represents |
//! |--------|-----------|
//! | [`Recipe`] | A recipe with ordered ingredients and instructions, `createdAt`/`updatedAt` timestamps and the `synced` dirty flag. |
//! | [`RecipeInput`] | Everything the user edits on a recipe: a [`Recipe`] minus `id`, timestamps and `synced`. |
//! | [`MadeEntry`] | One "made it" log line against a recipe: a 1–5 grade plus optional cost, time, parts and comment. |
//! | [`MadeEntryInput`] | A [`MadeEntry`] minus `id`, `createdAt` and `synced`. |
//!
//! ## The [`Record`] trait
//!
//! Both entity types implement [`Record`], which is what the generic
//! [`crate::repo::Collection`] needs: the id, the dirty flag, and the
//! [`CollectionKey`] naming the storage slot.
//!
//! Inputs carry a `validate` method for the UI boundary. Repositories never
//! call it; they accept whatever they are given.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Storage key of the recipes collection.
pub const RECIPES_KEY: &str = "recipe-keeper-recipes";
/// Storage key of the made-entries collection.
pub const MADE_ENTRIES_KEY: &str = "recipe-keeper-made-entries";

/// Names one synchronized collection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CollectionKey {
    Recipes,
    MadeEntries,
}

impl CollectionKey {
    /// The storage slot holding this collection.
    pub fn storage_key(&self) -> &'static str {
        match self {
            CollectionKey::Recipes => RECIPES_KEY,
            CollectionKey::MadeEntries => MADE_ENTRIES_KEY,
        }
    }
}

impl std::fmt::Display for CollectionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CollectionKey::Recipes => f.write_str("recipes"),
            CollectionKey::MadeEntries => f.write_str("made entries"),
        }
    }
}

/// A persisted entity with an id and a dirty flag.
pub trait Record:
    Clone + PartialEq + std::fmt::Debug + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// The collection this record type lives in.
    const COLLECTION: CollectionKey;

    fn id(&self) -> &str;

    fn is_synced(&self) -> bool;

    fn set_synced(&mut self, synced: bool);
}

/// A recipe as stored.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    pub id: String,
    pub title: String,
    pub description: String,
    /// Image URL or data reference
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub category: String,
    /// Minutes
    pub cook_time: u32,
    pub servings: u32,
    pub ingredients: Vec<String>,
    pub instructions: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub synced: bool,
}

/// The editable part of a [`Recipe`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeInput {
    pub title: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub category: String,
    pub cook_time: u32,
    pub servings: u32,
    pub ingredients: Vec<String>,
    pub instructions: Vec<String>,
}

impl Recipe {
    /// Build a fresh, dirty recipe from user input.
    pub fn from_input(id: String, input: RecipeInput, now: DateTime<Utc>) -> Self {
        Self {
            id,
            title: input.title,
            description: input.description,
            image: input.image,
            category: input.category,
            cook_time: input.cook_time,
            servings: input.servings,
            ingredients: input.ingredients,
            instructions: input.instructions,
            created_at: now,
            updated_at: now,
            synced: false,
        }
    }

    /// Replace every editable field, keeping `id` and `created_at`.
    pub fn apply(&mut self, input: RecipeInput, now: DateTime<Utc>) {
        self.title = input.title;
        self.description = input.description;
        self.image = input.image;
        self.category = input.category;
        self.cook_time = input.cook_time;
        self.servings = input.servings;
        self.ingredients = input.ingredients;
        self.instructions = input.instructions;
        self.updated_at = now;
        self.synced = false;
    }

    /// Case-insensitive substring match over title, description, category and ingredients.
    ///
    /// A blank query matches everything; otherwise surrounding spaces are
    /// part of the needle.
    pub fn matches(&self, query: &str) -> bool {
        if query.trim().is_empty() {
            return true;
        }
        let needle = query.to_lowercase();
        self.title.to_lowercase().contains(&needle)
            || self.description.to_lowercase().contains(&needle)
            || self.category.to_lowercase().contains(&needle)
            || self
                .ingredients
                .iter()
                .any(|i| i.to_lowercase().contains(&needle))
    }
}

impl Record for Recipe {
    const COLLECTION: CollectionKey = CollectionKey::Recipes;

    fn id(&self) -> &str {
        &self.id
    }

    fn is_synced(&self) -> bool {
        self.synced
    }

    fn set_synced(&mut self, synced: bool) {
        self.synced = synced;
    }
}

impl RecipeInput {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::Missing("title"));
        }
        if self.category.trim().is_empty() {
            return Err(ValidationError::Missing("category"));
        }
        if self.cook_time == 0 {
            return Err(ValidationError::NotPositive("cook time"));
        }
        if self.servings == 0 {
            return Err(ValidationError::NotPositive("servings"));
        }
        Ok(())
    }
}

/// One "made it" log entry as stored.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MadeEntry {
    pub id: String,
    /// Not checked against the recipes collection; dangling ids are kept.
    pub recipe_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_cost: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_cook_time: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_of_parts: Option<u32>,
    /// 1-5 rating
    pub grade: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
    pub synced: bool,
}

/// The editable part of a [`MadeEntry`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MadeEntryInput {
    pub recipe_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_cost: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_cook_time: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_of_parts: Option<u32>,
    pub grade: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl MadeEntry {
    /// Build a fresh, dirty entry from user input.
    pub fn from_input(id: String, input: MadeEntryInput, now: DateTime<Utc>) -> Self {
        Self {
            id,
            recipe_id: input.recipe_id,
            total_cost: input.total_cost,
            actual_cook_time: input.actual_cook_time,
            number_of_parts: input.number_of_parts,
            grade: input.grade,
            comment: input.comment,
            created_at: now,
            synced: false,
        }
    }

    /// Replace every editable field, keeping `id` and `created_at`.
    pub fn apply(&mut self, input: MadeEntryInput) {
        self.recipe_id = input.recipe_id;
        self.total_cost = input.total_cost;
        self.actual_cook_time = input.actual_cook_time;
        self.number_of_parts = input.number_of_parts;
        self.grade = input.grade;
        self.comment = input.comment;
        self.synced = false;
    }
}

impl Record for MadeEntry {
    const COLLECTION: CollectionKey = CollectionKey::MadeEntries;

    fn id(&self) -> &str {
        &self.id
    }

    fn is_synced(&self) -> bool {
        self.synced
    }

    fn set_synced(&mut self, synced: bool) {
        self.synced = synced;
    }
}

impl MadeEntryInput {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.recipe_id.trim().is_empty() {
            return Err(ValidationError::Missing("recipe"));
        }
        if !(1..=5).contains(&self.grade) {
            return Err(ValidationError::OutOfRange {
                field: "grade",
                min: 1,
                max: 5,
            });
        }
        if matches!(self.total_cost, Some(cost) if cost < 0.0 || cost.is_nan()) {
            return Err(ValidationError::Negative("total cost"));
        }
        if self.actual_cook_time == Some(0) {
            return Err(ValidationError::NotPositive("actual cook time"));
        }
        if self.number_of_parts == Some(0) {
            return Err(ValidationError::NotPositive("number of parts"));
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn sample_input(title: &str) -> RecipeInput {
        RecipeInput {
            title: title.to_string(),
            description: format!("{title} for two"),
            image: None,
            category: "Weeknight".to_string(),
            cook_time: 20,
            servings: 2,
            ingredients: vec!["2 eggs".to_string(), "1 onion".to_string()],
            instructions: vec!["Chop".to_string(), "Cook".to_string()],
        }
    }

    pub(crate) fn entry_input(recipe_id: &str, grade: u8) -> MadeEntryInput {
        MadeEntryInput {
            recipe_id: recipe_id.to_string(),
            grade,
            ..Default::default()
        }
    }

    #[test]
    fn test_recipe_json_uses_camel_case() {
        let now = Utc::now();
        let recipe = Recipe::from_input("r1".into(), sample_input("Soup"), now);
        let json = serde_json::to_value(&recipe).unwrap();
        assert!(json.get("cookTime").is_some());
        assert!(json.get("createdAt").is_some());
        assert!(json.get("updatedAt").is_some());
        // Absent optional fields are omitted
        assert!(json.get("image").is_none());
        assert_eq!(json["synced"], false);
    }

    #[test]
    fn test_mixed_collection_roundtrip() {
        let now = Utc::now();
        let recipes = vec![
            Recipe::from_input("a".into(), sample_input("Soup"), now),
            Recipe {
                image: Some("https://img/x.png".into()),
                synced: true,
                ..Recipe::from_input("b".into(), sample_input("Stew"), now)
            },
        ];
        let entries = vec![
            MadeEntry::from_input("e1".into(), entry_input("a", 4), now),
            MadeEntry::from_input(
                "e2".into(),
                MadeEntryInput {
                    recipe_id: "b".into(),
                    total_cost: Some(12.5),
                    actual_cook_time: Some(35),
                    number_of_parts: Some(3),
                    grade: 5,
                    comment: Some("crispy".into()),
                },
                now,
            ),
        ];

        let raw = serde_json::to_string(&recipes).unwrap();
        let back: Vec<Recipe> = serde_json::from_str(&raw).unwrap();
        assert_eq!(back, recipes);
        assert_eq!(back[0].created_at.timestamp(), now.timestamp());

        let raw = serde_json::to_string(&entries).unwrap();
        let back: Vec<MadeEntry> = serde_json::from_str(&raw).unwrap();
        assert_eq!(back, entries);
    }

    #[test]
    fn test_timestamps_serialize_as_iso8601() {
        let at = DateTime::parse_from_rfc3339("2024-01-15T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let entry = MadeEntry::from_input("e".into(), entry_input("r", 3), at);
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["createdAt"], "2024-01-15T00:00:00Z");
    }

    #[test]
    fn test_matches_any_field() {
        let recipe = Recipe::from_input("r".into(), sample_input("Shakshuka"), Utc::now());
        assert!(recipe.matches("shak"));
        assert!(recipe.matches("FOR TWO"));
        assert!(recipe.matches("weeknight"));
        assert!(recipe.matches("onion"));
        assert!(recipe.matches(""));
        assert!(recipe.matches("   "));
        assert!(!recipe.matches("pizza"));

        // Only blankness is trimmed; spaces count when matching
        assert!(recipe.matches(" onion"));
        assert!(!recipe.matches("two "));
    }

    #[test]
    fn test_validate_inputs() {
        assert!(sample_input("Soup").validate().is_ok());
        assert_eq!(
            sample_input(" ").validate(),
            Err(ValidationError::Missing("title"))
        );
        let mut input = sample_input("Soup");
        input.servings = 0;
        assert_eq!(input.validate(), Err(ValidationError::NotPositive("servings")));

        assert!(entry_input("r", 5).validate().is_ok());
        assert!(matches!(
            entry_input("r", 6).validate(),
            Err(ValidationError::OutOfRange { field: "grade", .. })
        ));
        assert!(entry_input("r", 0).validate().is_err());
        let entry = MadeEntryInput {
            total_cost: Some(-1.0),
            ..entry_input("r", 3)
        };
        assert_eq!(entry.validate(), Err(ValidationError::Negative("total cost")));
    }
}
