use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

use super::rating::{average_rating, Rating};

const TITLE_MAX: usize = 100;
const DESCRIPTION_MAX: usize = 1000;
const NOTES_MAX: usize = 200;
const STEP_MAX: usize = 500;
const TIP_MAX: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MeasureUnit {
    #[serde(rename = "g")]
    Gram,
    #[serde(rename = "kg")]
    Kilogram,
    #[serde(rename = "mg")]
    Milligram,
    #[serde(rename = "l")]
    Litre,
    #[serde(rename = "ml")]
    Millilitre,
    #[serde(rename = "tsp")]
    Teaspoon,
    #[serde(rename = "tbsp")]
    Tablespoon,
    #[serde(rename = "cup")]
    Cup,
    #[serde(rename = "pint")]
    Pint,
    #[serde(rename = "quart")]
    Quart,
    #[serde(rename = "gallon")]
    Gallon,
    #[serde(rename = "oz")]
    Ounce,
    #[serde(rename = "lb")]
    Pound,
    #[serde(rename = "pinch")]
    Pinch,
    #[serde(rename = "dash")]
    Dash,
    #[serde(rename = "drop")]
    Drop,
    #[serde(rename = "piece")]
    Piece,
    #[serde(rename = "sprig")]
    Sprig,
    #[serde(rename = "bunch")]
    Bunch,
    #[serde(rename = "clove")]
    Clove,
    #[serde(rename = "head")]
    Head,
    #[serde(rename = "slice")]
    Slice,
    #[serde(rename = "can")]
    Can,
    #[serde(rename = "package")]
    Package,
    #[serde(rename = "to taste")]
    ToTaste,
}

fn default_group() -> String {
    "main".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Ingredient {
    #[serde(default)]
    pub name: String,
    pub quantity: f64,
    pub unit: MeasureUnit,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default = "default_group")]
    pub group: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerUnit {
    Seconds,
    Minutes,
    Hours,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StepTimer {
    pub duration: f64,
    pub unit: TimerUnit,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InstructionStep {
    #[serde(default)]
    pub step: String,
    pub order: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timer: Option<StepTimer>,
    #[serde(default)]
    pub tips: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DurationUnit {
    #[default]
    Minutes,
    Hours,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct TimeSpan {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(default)]
    pub unit: DurationUnit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
    Expert,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DietaryRestriction {
    Vegetarian,
    Vegan,
    GlutenFree,
    DairyFree,
    NutFree,
    SoyFree,
    EggFree,
    Halal,
    Kosher,
    Keto,
    Paleo,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct NutritionInfo {
    pub calories: Option<f64>,
    pub protein: Option<f64>,
    pub carbs: Option<f64>,
    pub fat: Option<f64>,
    pub fiber: Option<f64>,
    pub sugar: Option<f64>,
    pub sodium: Option<f64>,
    pub cholesterol: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RecipeImage {
    pub url: String,
    #[serde(default)]
    pub is_primary: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RecipeSource {
    #[default]
    Original,
    Imported,
    Shared,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VariationIngredient {
    pub name: String,
    #[serde(default)]
    pub quantity: Option<f64>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Variation {
    pub description: String,
    #[serde(default)]
    pub ingredients: Vec<VariationIngredient>,
}

fn default_servings() -> u32 {
    4
}

/// The author-editable part of a recipe. This is also the body accepted by create.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RecipeContent {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub ingredients: Vec<Ingredient>,
    #[serde(default)]
    pub instructions: Vec<InstructionStep>,
    #[serde(default)]
    pub prep_time: TimeSpan,
    #[serde(default)]
    pub cook_time: TimeSpan,
    #[serde(default = "default_servings")]
    pub servings: u32,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default)]
    pub cuisine: String,
    #[serde(default)]
    pub dietary_restrictions: Vec<DietaryRestriction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nutrition: Option<NutritionInfo>,
    #[serde(default)]
    pub images: Vec<RecipeImage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default)]
    pub source: RecipeSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_notes: Option<String>,
    #[serde(default)]
    pub equipment: Vec<String>,
    #[serde(default)]
    pub tips: Vec<String>,
    #[serde(default)]
    pub variations: Vec<Variation>,
    #[serde(default)]
    pub related_recipes: Vec<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_cooked: Option<DateTime<Utc>>,
}

impl RecipeContent {
    /// Trims the fields the store keeps trimmed
    pub fn normalize(&mut self) {
        self.title = self.title.trim().to_string();
        for ingredient in &mut self.ingredients {
            ingredient.name = ingredient.name.trim().to_string();
        }
    }

    /// Checks every field rule, reporting all violations at once
    pub fn validate(&self) -> AppResult<()> {
        let mut problems = Vec::new();

        if self.title.is_empty() {
            problems.push("Please add a recipe title".to_string());
        } else if self.title.chars().count() > TITLE_MAX {
            problems.push(format!("Title cannot be more than {} characters", TITLE_MAX));
        }

        if self.description.trim().is_empty() {
            problems.push("Please add a description".to_string());
        } else if self.description.chars().count() > DESCRIPTION_MAX {
            problems.push(format!(
                "Description cannot be more than {} characters",
                DESCRIPTION_MAX
            ));
        }

        if self.cuisine.trim().is_empty() {
            problems.push("Please add a cuisine type".to_string());
        }

        for ingredient in &self.ingredients {
            if ingredient.name.is_empty() {
                problems.push("Please add an ingredient name".to_string());
            }
            if ingredient.notes.as_ref().is_some_and(|n| n.chars().count() > NOTES_MAX) {
                problems.push(format!("Notes cannot be more than {} characters", NOTES_MAX));
            }
        }

        for step in &self.instructions {
            if step.step.trim().is_empty() {
                problems.push("Please add a step description".to_string());
            } else if step.step.chars().count() > STEP_MAX {
                problems.push(format!("Step cannot be more than {} characters", STEP_MAX));
            }
        }

        if self.tips.iter().any(|t| t.chars().count() > TIP_MAX) {
            problems.push(format!("Tip cannot be more than {} characters", TIP_MAX));
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(problems.join(", ")))
        }
    }
}

/// A recipe document with its embedded ratings and favorites
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    pub id: Uuid,
    /// Owning user
    pub user: Uuid,
    #[serde(flatten)]
    pub content: RecipeContent,
    #[serde(default)]
    pub ratings: Vec<Rating>,
    #[serde(default)]
    pub average_rating: f64,
    #[serde(default)]
    pub favorited_by: Vec<Uuid>,
    #[serde(default)]
    pub favorite_count: u32,
    #[serde(default)]
    pub views: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Recipe {
    pub fn new(owner: Uuid, content: RecipeContent, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user: owner,
            content,
            ratings: Vec::new(),
            average_rating: 0.0,
            favorited_by: Vec::new(),
            favorite_count: 0,
            views: 0,
            photo: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn rating_by(&self, user: Uuid) -> Option<&Rating> {
        self.ratings.iter().find(|r| r.user == user)
    }

    /// Inserts or overwrites `user`'s rating. A missing or empty comment keeps the
    /// existing one. Returns true when a new rating entry was created.
    pub fn upsert_rating(
        &mut self,
        user: Uuid,
        value: u8,
        comment: Option<&str>,
        now: DateTime<Utc>,
    ) -> bool {
        let comment = comment.filter(|c| !c.is_empty());

        if let Some(existing) = self.ratings.iter_mut().find(|r| r.user == user) {
            existing.rating = value;
            if let Some(comment) = comment {
                existing.comment = comment.to_string();
            }
            return false;
        }

        self.ratings.push(Rating {
            user,
            rating: value,
            comment: comment.unwrap_or_default().to_string(),
            created_at: now,
        });
        true
    }

    pub fn refresh_average_rating(&mut self) {
        self.average_rating = average_rating(&self.ratings);
    }

    pub fn is_favorited_by(&self, user: Uuid) -> bool {
        self.favorited_by.contains(&user)
    }

    /// Flips `user`'s membership in `favorited_by` and returns the new membership.
    pub fn toggle_favorite(&mut self, user: Uuid) -> bool {
        let favorited = match self.favorited_by.iter().position(|u| *u == user) {
            Some(index) => {
                self.favorited_by.remove(index);
                false
            }
            None => {
                self.favorited_by.push(user);
                true
            }
        };
        self.favorite_count = self.favorited_by.len() as u32;
        favorited
    }

    pub fn record_view(&mut self) {
        self.views = self.views.saturating_add(1);
    }

    /// Merges the top-level fields of `patch` into the editable content and validates
    /// the result. Fields outside the editable content are ignored.
    pub fn apply_patch(&mut self, patch: &Map<String, Value>, now: DateTime<Utc>) -> AppResult<()> {
        let mut merged = match serde_json::to_value(&self.content) {
            Ok(Value::Object(map)) => map,
            Ok(_) => return Err(AppError::Internal("Recipe content is not an object".into())),
            Err(e) => return Err(AppError::Internal(format!("Serialization error: {}", e))),
        };

        for (key, value) in patch {
            merged.insert(key.clone(), value.clone());
        }

        let mut content: RecipeContent = serde_json::from_value(Value::Object(merged))
            .map_err(|e| AppError::Validation(format!("Invalid recipe update: {}", e)))?;
        content.normalize();
        content.validate()?;

        self.content = content;
        self.updated_at = now;
        Ok(())
    }
}
