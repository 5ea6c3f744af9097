pub mod engagement;
pub mod recipes;
pub mod uploads;

pub use recipes::{RecipeService, TOP_RATED_LIMIT, TOP_RATED_MIN_RATING};
pub use uploads::{PhotoStorage, UploadedFile};
