use thiserror::Error;

/// Errors that are safe to expose to other modules
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FoodgramError {
    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("Conflict: {message}")]
    Conflict { message: String },

    #[error("Validation error: {field}: {message}")]
    Validation { field: String, message: String },

    #[error("Authentication required")]
    Unauthenticated,

    #[error("Forbidden: {message}")]
    Forbidden { message: String },

    #[error("Internal error")]
    Internal,
}

impl From<crate::domain::error::DomainError> for FoodgramError {
    fn from(domain_error: crate::domain::error::DomainError) -> Self {
        use crate::domain::error::DomainError::*;
        let message = domain_error.to_string();
        match domain_error {
            RecipeNotFound { .. } | UserNotFound { .. } | IngredientNotFound { .. } => {
                Self::NotFound { message }
            }
            AlreadyMember { .. }
            | NotMember { .. }
            | SelfSubscription
            | AlreadySubscribed { .. }
            | NotSubscribed { .. } => Self::Conflict { message },
            Unauthenticated => Self::Unauthenticated,
            NotRecipeAuthor { .. } => Self::Forbidden { message },
            Validation { field, message } => Self::Validation { field, message },
            Database { .. } => Self::Internal,
        }
    }
}
