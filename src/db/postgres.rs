use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, types::Json, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    db::RecipeStore,
    error::{AppError, AppResult},
    models::{Recipe, RecipePage, RecipeQuery, SortField},
};

/// Creates a PostgreSQL connection pool
///
/// Establishes a pool of database connections for efficient reuse.
/// The pool automatically manages connection lifecycle and limits.
pub async fn create_pool(database_url: &str) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await?;

    Ok(pool)
}

/// Recipe store backed by a JSONB document column
///
/// The whole recipe, embedded ratings and favorites included, lives in `doc`.
/// `owner_id` and the timestamps are duplicated into columns for indexing.
#[derive(Clone)]
pub struct PgRecipeStore {
    pool: PgPool,
}

impl PgRecipeStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Applies pending schema migrations
    pub async fn migrate(&self) -> AppResult<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        tracing::info!("Database migrations applied");
        Ok(())
    }

    async fn fetch_docs(&self, mut builder: QueryBuilder<'_, Postgres>) -> AppResult<Vec<Recipe>> {
        let rows: Vec<(Json<Recipe>,)> = builder.build_query_as().fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(|(Json(recipe),)| recipe).collect())
    }
}

fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, query: &RecipeQuery) {
    if let Some(cuisine) = &query.cuisine {
        builder
            .push(" AND LOWER(doc->>'cuisine') = LOWER(")
            .push_bind(cuisine.clone())
            .push(")");
    }
    if let Some(difficulty) = query.difficulty {
        let value = serde_json::to_value(difficulty)
            .ok()
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default();
        builder.push(" AND doc->>'difficulty' = ").push_bind(value);
    }
    if let Some(tag) = &query.tag {
        builder
            .push(" AND doc->'tags' @> jsonb_build_array(")
            .push_bind(tag.clone())
            .push("::text)");
    }
    if let Some(user) = query.user {
        builder.push(" AND owner_id = ").push_bind(user);
    }
}

fn sort_expression(field: SortField) -> &'static str {
    match field {
        SortField::CreatedAt => "created_at",
        SortField::UpdatedAt => "updated_at",
        SortField::Title => "doc->>'title'",
        SortField::AverageRating => "(doc->>'averageRating')::float8",
        SortField::Views => "(doc->>'views')::bigint",
        SortField::FavoriteCount => "(doc->>'favoriteCount')::bigint",
    }
}

#[async_trait]
impl RecipeStore for PgRecipeStore {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Recipe>> {
        let row: Option<(Json<Recipe>,)> = sqlx::query_as("SELECT doc FROM recipes WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|(Json(recipe),)| recipe))
    }

    async fn insert(&self, recipe: &Recipe) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO recipes (id, owner_id, doc, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(recipe.id)
        .bind(recipe.user)
        .bind(Json(recipe))
        .bind(recipe.created_at)
        .bind(recipe.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn save(&self, recipe: &Recipe) -> AppResult<()> {
        let result = sqlx::query("UPDATE recipes SET doc = $2, updated_at = $3 WHERE id = $1")
            .bind(recipe.id)
            .bind(Json(recipe))
            .bind(recipe.updated_at)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::recipe_not_found(recipe.id));
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM recipes WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn refresh_average_rating(&self, id: Uuid) -> AppResult<Option<f64>> {
        // ceil(2 * sum / count) / 2 in numeric, 0 when the ratings array is empty
        let row: Option<(f64,)> = sqlx::query_as(
            r#"
            WITH agg AS (
                SELECT COALESCE(
                    CEIL(SUM((r.value->>'rating')::numeric) * 2 / NULLIF(COUNT(r.value), 0)) / 2,
                    0
                )::float8 AS average
                FROM recipes src
                CROSS JOIN LATERAL jsonb_array_elements(src.doc->'ratings') AS r(value)
                WHERE src.id = $1
            )
            UPDATE recipes
            SET doc = jsonb_set(doc, '{averageRating}', to_jsonb(agg.average))
            FROM agg
            WHERE recipes.id = $1
            RETURNING agg.average
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|(average,)| average))
    }

    async fn list(&self, query: &RecipeQuery) -> AppResult<RecipePage> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM recipes WHERE TRUE");
        push_filters(&mut count, query);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut select = QueryBuilder::<Postgres>::new("SELECT doc FROM recipes WHERE TRUE");
        push_filters(&mut select, query);
        select.push(" ORDER BY ");
        for (i, key) in query.sort.iter().enumerate() {
            if i > 0 {
                select.push(", ");
            }
            select.push(sort_expression(key.field));
            select.push(if key.descending { " DESC" } else { " ASC" });
        }
        select
            .push(" LIMIT ")
            .push_bind(i64::from(query.limit))
            .push(" OFFSET ")
            .push_bind(query.offset() as i64);

        let recipes = self.fetch_docs(select).await?;
        Ok(RecipePage {
            recipes,
            total: total.max(0) as u64,
        })
    }

    async fn top_rated(&self, min_rating: f64, limit: usize) -> AppResult<Vec<Recipe>> {
        let mut select = QueryBuilder::<Postgres>::new(
            "SELECT doc FROM recipes WHERE (doc->>'averageRating')::float8 >= ",
        );
        select
            .push_bind(min_rating)
            .push(" ORDER BY (doc->>'averageRating')::float8 DESC LIMIT ")
            .push_bind(limit as i64);
        self.fetch_docs(select).await
    }

    async fn find_by_owner(&self, user: Uuid) -> AppResult<Vec<Recipe>> {
        let mut select =
            QueryBuilder::<Postgres>::new("SELECT doc FROM recipes WHERE owner_id = ");
        select.push_bind(user).push(" ORDER BY created_at DESC");
        self.fetch_docs(select).await
    }

    async fn find_favorited_by(&self, user: Uuid) -> AppResult<Vec<Recipe>> {
        let mut select = QueryBuilder::<Postgres>::new(
            "SELECT doc FROM recipes WHERE doc->'favoritedBy' @> jsonb_build_array(",
        );
        select
            .push_bind(user.to_string())
            .push("::text) ORDER BY created_at DESC");
        self.fetch_docs(select).await
    }

    fn name(&self) -> &'static str {
        "postgres"
    }
}
