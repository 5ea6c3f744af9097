use serde::{Deserialize, Serialize};
use std::{fmt::Display, str::FromStr};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

use super::Recipe;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Chef,
    Admin,
}

impl FromStr for Role {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "user" => Ok(Role::User),
            "chef" => Ok(Role::Chef),
            "admin" => Ok(Role::Admin),
            other => Err(AppError::Forbidden(format!(
                "User role {} is not authorized to access this route",
                other
            ))),
        }
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Chef => write!(f, "chef"),
            Role::Admin => write!(f, "admin"),
        }
    }
}

/// Mutations guarded by recipe ownership
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecipeAction {
    Update,
    Delete,
}

impl Display for RecipeAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecipeAction::Update => write!(f, "update"),
            RecipeAction::Delete => write!(f, "delete"),
        }
    }
}

/// The authenticated caller, as vouched for by the identity provider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub user_id: Uuid,
    pub role: Role,
}

impl Actor {
    pub fn new(user_id: Uuid, role: Role) -> Self {
        Self { user_id, role }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Owners and admins may mutate a recipe; everyone else is turned away.
    pub fn ensure_can_modify(&self, recipe: &Recipe, action: RecipeAction) -> AppResult<()> {
        if recipe.user == self.user_id || self.is_admin() {
            return Ok(());
        }

        tracing::warn!(
            user_id = %self.user_id,
            recipe_id = %recipe.id,
            action = %action,
            "Rejected recipe mutation by non-owner"
        );

        Err(AppError::Unauthorized(format!(
            "User {} is not authorized to {} this recipe",
            self.user_id, action
        )))
    }
}
