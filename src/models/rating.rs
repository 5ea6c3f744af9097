use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

pub const MIN_RATING: u8 = 1;
pub const MAX_RATING: u8 = 5;

/// A single user's rating of a recipe. Unique per user within a recipe.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Rating {
    pub user: Uuid,
    pub rating: u8,
    #[serde(default)]
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

/// Body of `POST /recipes/:id/rating`
#[derive(Debug, Clone, Deserialize)]
pub struct RatingInput {
    pub rating: u8,
    #[serde(default)]
    pub comment: Option<String>,
}

impl RatingInput {
    pub fn validate(&self) -> AppResult<()> {
        if !(MIN_RATING..=MAX_RATING).contains(&self.rating) {
            return Err(AppError::Validation(format!(
                "Rating must be between {} and {}",
                MIN_RATING, MAX_RATING
            )));
        }
        Ok(())
    }

    /// The comment, if one with content was supplied
    pub fn non_empty_comment(&self) -> Option<&str> {
        self.comment.as_deref().filter(|c| !c.is_empty())
    }
}

/// Mean of the rating values rounded up to the nearest half point, or 0 with no ratings.
///
/// Computed as `ceil(2 * sum / count) / 2` in integers so that exact means such as
/// 3.5 or 4.0 never drift upwards through float error.
pub fn average_rating<'a, I>(ratings: I) -> f64
where
    I: IntoIterator<Item = &'a Rating>,
{
    let (sum, count) = ratings
        .into_iter()
        .fold((0u64, 0u64), |(sum, count), r| (sum + u64::from(r.rating), count + 1));

    if count == 0 {
        return 0.0;
    }

    let half_points = (2 * sum).div_ceil(count);
    half_points as f64 / 2.0
}
