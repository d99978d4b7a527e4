//! Sample recipes written on first launch.

use chrono::{DateTime, NaiveDate, Utc};

use crate::models::Recipe;

fn day(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(y, m, d)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .unwrap_or_default()
}

fn lines(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// The three recipes a fresh store starts with, all already synced.
pub fn sample_recipes() -> Vec<Recipe> {
    vec![
        Recipe {
            id: "1".to_string(),
            title: "Classic Margherita Pizza".to_string(),
            description:
                "Simple and delicious pizza with fresh mozzarella, tomatoes, and basil".to_string(),
            image: None,
            category: "Italian".to_string(),
            cook_time: 25,
            servings: 4,
            ingredients: lines(&[
                "1 pizza dough",
                "200g fresh mozzarella",
                "400g crushed tomatoes",
                "Fresh basil leaves",
                "2 tbsp olive oil",
                "Salt and pepper to taste",
            ]),
            instructions: lines(&[
                "Preheat oven to 475°F (245°C)",
                "Roll out pizza dough on a floured surface",
                "Spread crushed tomatoes evenly over dough",
                "Add torn mozzarella pieces",
                "Drizzle with olive oil and season with salt",
                "Bake for 12-15 minutes until crust is golden",
                "Top with fresh basil leaves before serving",
            ]),
            created_at: day(2024, 1, 15),
            updated_at: day(2024, 1, 15),
            synced: true,
        },
        Recipe {
            id: "2".to_string(),
            title: "Creamy Chicken Alfredo".to_string(),
            description: "Rich and creamy pasta dish with tender chicken".to_string(),
            image: None,
            category: "Italian".to_string(),
            cook_time: 30,
            servings: 4,
            ingredients: lines(&[
                "400g fettuccine pasta",
                "500g chicken breast, sliced",
                "2 cups heavy cream",
                "1 cup parmesan cheese, grated",
                "4 cloves garlic, minced",
                "3 tbsp butter",
                "Salt, pepper, and parsley",
            ]),
            instructions: lines(&[
                "Cook pasta according to package directions",
                "Season chicken with salt and pepper",
                "In a large pan, melt butter and cook chicken until golden",
                "Add garlic and cook for 1 minute",
                "Pour in heavy cream and bring to simmer",
                "Add parmesan cheese and stir until melted",
                "Toss cooked pasta in the sauce",
                "Garnish with parsley and serve hot",
            ]),
            created_at: day(2024, 1, 16),
            updated_at: day(2024, 1, 16),
            synced: true,
        },
        Recipe {
            id: "3".to_string(),
            title: "Fresh Garden Salad".to_string(),
            description: "Crisp and refreshing salad with homemade vinaigrette".to_string(),
            image: None,
            category: "Salads".to_string(),
            cook_time: 10,
            servings: 2,
            ingredients: lines(&[
                "4 cups mixed greens",
                "1 cucumber, sliced",
                "2 tomatoes, chopped",
                "1/2 red onion, thinly sliced",
                "1/4 cup olive oil",
                "2 tbsp balsamic vinegar",
                "Salt and pepper",
            ]),
            instructions: lines(&[
                "Wash and dry all vegetables",
                "Combine greens, cucumber, tomatoes, and onion in a large bowl",
                "In a small bowl, whisk together olive oil and balsamic vinegar",
                "Season dressing with salt and pepper",
                "Drizzle dressing over salad just before serving",
                "Toss gently and serve immediately",
            ]),
            created_at: day(2024, 1, 17),
            updated_at: day(2024, 1, 17),
            synced: true,
        },
    ]
}
