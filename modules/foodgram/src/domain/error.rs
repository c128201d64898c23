use thiserror::Error;

use crate::contract::model::{IngredientId, Membership, RecipeId, UserId};

/// Domain-specific errors using thiserror
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Recipe not found: {id}")]
    RecipeNotFound { id: RecipeId },

    #[error("User not found: {id}")]
    UserNotFound { id: UserId },

    #[error("Ingredient not found: {id}")]
    IngredientNotFound { id: IngredientId },

    #[error("Recipe {recipe_id} is already in {}", kind.as_str())]
    AlreadyMember { kind: Membership, recipe_id: RecipeId },

    #[error("Recipe {recipe_id} is not in {}", kind.as_str())]
    NotMember { kind: Membership, recipe_id: RecipeId },

    #[error("Cannot subscribe to yourself")]
    SelfSubscription,

    #[error("Already subscribed to user {user_id}")]
    AlreadySubscribed { user_id: UserId },

    #[error("Not subscribed to user {user_id}")]
    NotSubscribed { user_id: UserId },

    #[error("Authentication credentials were not provided or are invalid")]
    Unauthenticated,

    #[error("Only the author or an administrator may modify recipe {recipe_id}")]
    NotRecipeAuthor { recipe_id: RecipeId },

    #[error("Validation failed: {field}: {message}")]
    Validation { field: String, message: String },

    #[error("Database error: {message}")]
    Database { message: String },
}

impl DomainError {
    pub fn recipe_not_found(id: RecipeId) -> Self {
        Self::RecipeNotFound { id }
    }

    pub fn user_not_found(id: UserId) -> Self {
        Self::UserNotFound { id }
    }

    pub fn ingredient_not_found(id: IngredientId) -> Self {
        Self::IngredientNotFound { id }
    }

    pub fn already_member(kind: Membership, recipe_id: RecipeId) -> Self {
        Self::AlreadyMember { kind, recipe_id }
    }

    pub fn not_member(kind: Membership, recipe_id: RecipeId) -> Self {
        Self::NotMember { kind, recipe_id }
    }

    pub fn not_recipe_author(recipe_id: RecipeId) -> Self {
        Self::NotRecipeAuthor { recipe_id }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
        }
    }

    /// Adapter failures are opaque to the domain; keep the full context chain.
    pub(crate) fn from_repo(e: anyhow::Error) -> Self {
        Self::database(format!("{e:#}"))
    }
}
