use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

use super::{Difficulty, Recipe};

pub const DEFAULT_PAGE_SIZE: u32 = 25;
pub const MAX_PAGE_SIZE: u32 = 100;

/// Raw query string of `GET /recipes`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub sort: Option<String>,
    pub cuisine: Option<String>,
    pub difficulty: Option<Difficulty>,
    pub tag: Option<String>,
    pub user: Option<Uuid>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    CreatedAt,
    UpdatedAt,
    Title,
    AverageRating,
    Views,
    FavoriteCount,
}

impl SortField {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "createdAt" => Some(SortField::CreatedAt),
            "updatedAt" => Some(SortField::UpdatedAt),
            "title" => Some(SortField::Title),
            "averageRating" => Some(SortField::AverageRating),
            "views" => Some(SortField::Views),
            "favoriteCount" => Some(SortField::FavoriteCount),
            _ => None,
        }
    }

    fn compare(&self, a: &Recipe, b: &Recipe) -> Ordering {
        match self {
            SortField::CreatedAt => a.created_at.cmp(&b.created_at),
            SortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
            SortField::Title => a.content.title.cmp(&b.content.title),
            SortField::AverageRating => a.average_rating.total_cmp(&b.average_rating),
            SortField::Views => a.views.cmp(&b.views),
            SortField::FavoriteCount => a.favorite_count.cmp(&b.favorite_count),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey {
    pub field: SortField,
    pub descending: bool,
}

/// Validated listing request: filters, ordering and the page window
#[derive(Debug, Clone, PartialEq)]
pub struct RecipeQuery {
    pub cuisine: Option<String>,
    pub difficulty: Option<Difficulty>,
    pub tag: Option<String>,
    pub user: Option<Uuid>,
    pub sort: Vec<SortKey>,
    pub page: u32,
    pub limit: u32,
}

impl Default for RecipeQuery {
    fn default() -> Self {
        Self {
            cuisine: None,
            difficulty: None,
            tag: None,
            user: None,
            sort: vec![SortKey {
                field: SortField::CreatedAt,
                descending: true,
            }],
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

impl TryFrom<ListParams> for RecipeQuery {
    type Error = AppError;

    fn try_from(params: ListParams) -> AppResult<Self> {
        let defaults = RecipeQuery::default();

        let sort = match params.sort.as_deref() {
            Some(spec) => parse_sort(spec)?,
            None => Vec::new(),
        };
        let sort = if sort.is_empty() { defaults.sort } else { sort };

        let page = params.page.unwrap_or(1).max(1);
        let limit = params.limit.unwrap_or(DEFAULT_PAGE_SIZE);
        if limit == 0 || limit > MAX_PAGE_SIZE {
            return Err(AppError::Validation(format!(
                "limit must be between 1 and {}",
                MAX_PAGE_SIZE
            )));
        }

        Ok(Self {
            cuisine: params.cuisine.filter(|c| !c.is_empty()),
            difficulty: params.difficulty,
            tag: params.tag.filter(|t| !t.is_empty()),
            user: params.user,
            sort,
            page,
            limit,
        })
    }
}

fn parse_sort(spec: &str) -> AppResult<Vec<SortKey>> {
    spec.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|part| {
            let (descending, name) = match part.strip_prefix('-') {
                Some(name) => (true, name),
                None => (false, part),
            };
            SortField::parse(name)
                .map(|field| SortKey { field, descending })
                .ok_or_else(|| AppError::Validation(format!("Cannot sort by {}", name)))
        })
        .collect()
}

impl RecipeQuery {
    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.limit)
    }

    pub fn matches(&self, recipe: &Recipe) -> bool {
        if let Some(cuisine) = &self.cuisine {
            if !recipe.content.cuisine.eq_ignore_ascii_case(cuisine) {
                return false;
            }
        }
        if let Some(difficulty) = self.difficulty {
            if recipe.content.difficulty != difficulty {
                return false;
            }
        }
        if let Some(tag) = &self.tag {
            if !recipe.content.tags.iter().any(|t| t == tag) {
                return false;
            }
        }
        if let Some(user) = self.user {
            if recipe.user != user {
                return false;
            }
        }
        true
    }

    pub fn compare(&self, a: &Recipe, b: &Recipe) -> Ordering {
        for key in &self.sort {
            let ord = key.field.compare(a, b);
            let ord = if key.descending { ord.reverse() } else { ord };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    }

    pub fn pagination(&self, total: u64) -> Pagination {
        let end = self.offset() + u64::from(self.limit);
        Pagination {
            next: (end < total).then(|| PageRef {
                page: self.page + 1,
                limit: self.limit,
            }),
            prev: (self.page > 1).then(|| PageRef {
                page: self.page - 1,
                limit: self.limit,
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageRef {
    pub page: u32,
    pub limit: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
pub struct Pagination {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<PageRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev: Option<PageRef>,
}

/// One page of a listing and the total number of matches
#[derive(Debug, Clone)]
pub struct RecipePage {
    pub recipes: Vec<Recipe>,
    pub total: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(params: ListParams) -> AppResult<RecipeQuery> {
        RecipeQuery::try_from(params)
    }

    #[test]
    fn test_defaults() {
        let q = query(ListParams::default()).unwrap();
        assert_eq!(q, RecipeQuery::default());
        assert_eq!(q.offset(), 0);
    }

    #[test]
    fn test_sort_spec_parsing() {
        let q = query(ListParams {
            sort: Some("-averageRating, title".into()),
            ..Default::default()
        })
        .unwrap();

        assert_eq!(
            q.sort,
            vec![
                SortKey { field: SortField::AverageRating, descending: true },
                SortKey { field: SortField::Title, descending: false },
            ]
        );
    }

    #[test]
    fn test_separator_only_sort_falls_back_to_default() {
        for spec in ["", ",", " , ", ",,"] {
            let q = query(ListParams {
                sort: Some(spec.into()),
                ..Default::default()
            })
            .unwrap();
            assert_eq!(q.sort, RecipeQuery::default().sort, "sort={spec:?}");
        }
    }

    #[test]
    fn test_unknown_sort_field_is_rejected() {
        let result = query(ListParams {
            sort: Some("password".into()),
            ..Default::default()
        });
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn test_limit_bounds() {
        for limit in [0, MAX_PAGE_SIZE + 1] {
            let result = query(ListParams { limit: Some(limit), ..Default::default() });
            assert!(result.is_err());
        }
    }

    #[test]
    fn test_page_zero_is_first_page() {
        let q = query(ListParams { page: Some(0), ..Default::default() }).unwrap();
        assert_eq!(q.page, 1);
    }

    #[test]
    fn test_pagination_links() {
        let q = query(ListParams {
            page: Some(2),
            limit: Some(10),
            ..Default::default()
        })
        .unwrap();

        let middle = q.pagination(35);
        assert_eq!(middle.next, Some(PageRef { page: 3, limit: 10 }));
        assert_eq!(middle.prev, Some(PageRef { page: 1, limit: 10 }));

        let last = q.pagination(20);
        assert_eq!(last.next, None);
        assert_eq!(last.prev, Some(PageRef { page: 1, limit: 10 }));
    }
}
