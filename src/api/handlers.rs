use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        Multipart, Path, State,
    },
    http::StatusCode,
    Extension,
};
use serde_json::{json, Map, Value};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    middleware::RequestId,
    models::{Actor, FavoriteStatus, ListParams, RatingInput, Recipe, RecipeContent, RecipeQuery},
    services::{PhotoStorage, UploadedFile},
};

use super::{
    extract::{ApiJson, ApiQuery, RecipeId},
    response::ApiResponse,
    AppState,
};

/// Multipart field carrying the photo
const PHOTO_FIELD: &str = "file";

/// Health check endpoint
pub async fn health_check() -> StatusCode {
    StatusCode::OK
}

/// `GET /recipes` with filtering, sorting and pagination
pub async fn get_recipes(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<ListParams>,
) -> AppResult<ApiResponse<Vec<Recipe>>> {
    let query = RecipeQuery::try_from(params)?;
    let page = state.recipes.list(&query).await?;
    let pagination = query.pagination(page.total);
    Ok(ApiResponse::page(page.recipes, pagination))
}

/// `GET /recipes/:id`; counts as a view
pub async fn get_recipe(
    State(state): State<AppState>,
    RecipeId(id): RecipeId,
) -> AppResult<ApiResponse<Recipe>> {
    let recipe = state.recipes.record_view(id).await?;
    Ok(ApiResponse::ok(recipe))
}

pub async fn create_recipe(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    actor: Actor,
    ApiJson(content): ApiJson<RecipeContent>,
) -> AppResult<(StatusCode, ApiResponse<Recipe>)> {
    tracing::info!(
        request_id = %request_id,
        user_id = %actor.user_id,
        title = %content.title,
        "Creating recipe"
    );

    let recipe = state.recipes.create(&actor, content).await?;
    Ok((StatusCode::CREATED, ApiResponse::ok(recipe)))
}

pub async fn update_recipe(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    actor: Actor,
    RecipeId(id): RecipeId,
    ApiJson(patch): ApiJson<Map<String, Value>>,
) -> AppResult<ApiResponse<Recipe>> {
    tracing::info!(
        request_id = %request_id,
        recipe_id = %id,
        fields = patch.len(),
        "Updating recipe"
    );

    let recipe = state.recipes.update(&actor, id, &patch).await?;
    Ok(ApiResponse::ok(recipe))
}

pub async fn delete_recipe(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    actor: Actor,
    RecipeId(id): RecipeId,
) -> AppResult<ApiResponse<Value>> {
    tracing::info!(request_id = %request_id, recipe_id = %id, "Deleting recipe");

    state.recipes.delete(&actor, id).await?;
    Ok(ApiResponse::ok(json!({})))
}

/// `PUT /recipes/:id/photo` with the image in the `file` multipart field
pub async fn upload_recipe_photo(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    actor: Actor,
    RecipeId(id): RecipeId,
    multipart: Result<Multipart, MultipartRejection>,
) -> AppResult<ApiResponse<String>> {
    let recipe = state.recipes.authorize_photo(&actor, id).await?;

    // A body that is not multipart at all simply carries no file
    let file = match multipart {
        Ok(multipart) => read_photo_field(multipart, state.recipes.photos()).await?,
        Err(_) => None,
    };

    tracing::info!(
        request_id = %request_id,
        recipe_id = %id,
        has_file = file.is_some(),
        "Uploading recipe photo"
    );

    let name = state.recipes.attach_photo(recipe, file.as_ref()).await?;
    Ok(ApiResponse::ok(name))
}

fn multipart_error(err: MultipartError, photos: &PhotoStorage) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        photos.too_large()
    } else {
        AppError::Upload(err.body_text())
    }
}

async fn read_photo_field(
    mut multipart: Multipart,
    photos: &PhotoStorage,
) -> AppResult<Option<UploadedFile>> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, photos))?
    {
        if field.name() != Some(PHOTO_FIELD) {
            continue;
        }

        let file_name = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().unwrap_or_default().to_string();
        let bytes = field.bytes().await.map_err(|e| multipart_error(e, photos))?;

        return Ok(Some(UploadedFile {
            file_name,
            content_type,
            bytes,
        }));
    }

    Ok(None)
}

pub async fn rate_recipe(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    actor: Actor,
    RecipeId(id): RecipeId,
    ApiJson(input): ApiJson<RatingInput>,
) -> AppResult<ApiResponse<Recipe>> {
    tracing::info!(
        request_id = %request_id,
        recipe_id = %id,
        rating = input.rating,
        "Rating recipe"
    );

    let recipe = state.recipes.rate(&actor, id, &input).await?;
    Ok(ApiResponse::ok(recipe))
}

pub async fn toggle_favorite(
    State(state): State<AppState>,
    actor: Actor,
    RecipeId(id): RecipeId,
) -> AppResult<ApiResponse<FavoriteStatus>> {
    let status = state.recipes.toggle_favorite(&actor, id).await?;
    Ok(ApiResponse::ok(status))
}

pub async fn get_top_rated(State(state): State<AppState>) -> AppResult<ApiResponse<Vec<Recipe>>> {
    let recipes = state.recipes.top_rated().await?;
    Ok(ApiResponse::list(recipes))
}

pub async fn get_recipes_by_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> AppResult<ApiResponse<Vec<Recipe>>> {
    let user_id = Uuid::parse_str(&user_id)
        .map_err(|_| AppError::Validation(format!("Invalid user id {}", user_id)))?;
    let recipes = state.recipes.by_owner(user_id).await?;
    Ok(ApiResponse::list(recipes))
}

pub async fn get_user_favorites(
    State(state): State<AppState>,
    actor: Actor,
) -> AppResult<ApiResponse<Vec<Recipe>>> {
    let recipes = state.recipes.favorites(&actor).await?;
    Ok(ApiResponse::list(recipes))
}
