use serde::Serialize;

pub mod actor;
pub mod query;
pub mod rating;
pub mod recipe;

pub use actor::{Actor, RecipeAction, Role};
pub use query::{ListParams, PageRef, Pagination, RecipePage, RecipeQuery, SortField, SortKey};
pub use rating::{average_rating, Rating, RatingInput};
pub use recipe::{
    DietaryRestriction, Difficulty, DurationUnit, Ingredient, InstructionStep, MeasureUnit,
    NutritionInfo, Recipe, RecipeContent, RecipeImage, RecipeSource, TimeSpan,
};

/// Result of toggling a favorite
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteStatus {
    pub is_favorited: bool,
    pub favorite_count: u32,
}

#[cfg(test)]
pub(crate) mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use super::*;

    pub(crate) fn sample_content() -> RecipeContent {
        RecipeContent {
            title: "Shakshuka".to_string(),
            description: "Eggs poached in spiced tomato sauce".to_string(),
            ingredients: vec![Ingredient {
                name: "salt".to_string(),
                quantity: 1.0,
                unit: MeasureUnit::ToTaste,
                notes: None,
                group: "main".to_string(),
            }],
            instructions: vec![InstructionStep {
                step: "Simmer the tomatoes, then crack in the eggs".to_string(),
                order: 1,
                timer: None,
                tips: Vec::new(),
            }],
            prep_time: TimeSpan::default(),
            cook_time: TimeSpan::default(),
            servings: 4,
            difficulty: Difficulty::Easy,
            cuisine: "Middle Eastern".to_string(),
            dietary_restrictions: vec![DietaryRestriction::Vegetarian],
            nutrition: None,
            images: Vec::new(),
            video_url: None,
            tags: vec!["breakfast".to_string()],
            is_public: true,
            source: RecipeSource::Original,
            source_url: None,
            source_notes: None,
            equipment: Vec::new(),
            tips: Vec::new(),
            variations: Vec::new(),
            related_recipes: Vec::new(),
            last_cooked: None,
        }
    }

    pub(crate) fn sample_recipe(owner: Uuid) -> Recipe {
        Recipe::new(owner, sample_content(), Utc::now())
    }
}
