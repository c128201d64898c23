use axum::http::StatusCode;

use crate::api::rest::problem::{Problem, ProblemResponse, ValidationError};
use crate::domain::error::DomainError;

pub const CODE_NOT_FOUND: &str = "FOODGRAM_NOT_FOUND";
pub const CODE_CONFLICT: &str = "FOODGRAM_CONFLICT";
pub const CODE_UNAUTHENTICATED: &str = "FOODGRAM_UNAUTHENTICATED";
pub const CODE_FORBIDDEN: &str = "FOODGRAM_FORBIDDEN";
pub const CODE_VALIDATION: &str = "FOODGRAM_VALIDATION";
pub const CODE_INTERNAL_DB: &str = "INTERNAL_DB";

/// Helper to create a ProblemResponse with less boilerplate
pub fn from_parts(
    status: StatusCode,
    code: &str,
    title: &str,
    detail: impl Into<String>,
    instance: &str,
) -> ProblemResponse {
    let problem = Problem::new(status, title, detail)
        .with_type(format!("https://errors.foodgram.local/{code}"))
        .with_code(code)
        .with_instance(instance);
    ProblemResponse(problem)
}

/// 400 with a single field error; `field` is a slash-separated path.
pub fn validation_problem(field: &str, message: &str, instance: &str) -> ProblemResponse {
    let detail = if field.is_empty() {
        message.to_owned()
    } else {
        format!("{field}: {message}")
    };
    let mut resp = from_parts(
        StatusCode::BAD_REQUEST,
        CODE_VALIDATION,
        "Validation error",
        detail,
        instance,
    );
    resp.0 = resp.0.with_errors(vec![ValidationError {
        detail: message.to_owned(),
        pointer: format!("/{}", field.trim_start_matches('/')),
    }]);
    resp
}

pub fn unauthenticated(instance: &str) -> ProblemResponse {
    from_parts(
        StatusCode::UNAUTHORIZED,
        CODE_UNAUTHENTICATED,
        "Unauthenticated",
        "Authentication credentials were not provided or are invalid",
        instance,
    )
}

/// Map domain error to RFC9457 ProblemResponse
pub fn map_domain_error(e: &DomainError, instance: &str) -> ProblemResponse {
    match e {
        DomainError::RecipeNotFound { .. }
        | DomainError::UserNotFound { .. }
        | DomainError::IngredientNotFound { .. } => from_parts(
            StatusCode::NOT_FOUND,
            CODE_NOT_FOUND,
            "Not found",
            e.to_string(),
            instance,
        ),
        DomainError::AlreadyMember { .. }
        | DomainError::NotMember { .. }
        | DomainError::SelfSubscription
        | DomainError::AlreadySubscribed { .. }
        | DomainError::NotSubscribed { .. } => from_parts(
            StatusCode::BAD_REQUEST,
            CODE_CONFLICT,
            "Conflict",
            e.to_string(),
            instance,
        ),
        DomainError::Unauthenticated => unauthenticated(instance),
        DomainError::NotRecipeAuthor { .. } => from_parts(
            StatusCode::FORBIDDEN,
            CODE_FORBIDDEN,
            "Forbidden",
            e.to_string(),
            instance,
        ),
        DomainError::Validation { field, message } => {
            validation_problem(field, message, instance)
        }
        DomainError::Database { .. } => {
            // Log the internal error details but don't expose them to the client
            tracing::error!(error = ?e, "Database error occurred");
            from_parts(
                StatusCode::INTERNAL_SERVER_ERROR,
                CODE_INTERNAL_DB,
                "Internal error",
                "An internal database error occurred",
                instance,
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::model::Membership;

    #[test]
    fn toggle_conflicts_are_bad_requests() {
        let p = map_domain_error(
            &DomainError::already_member(Membership::ShoppingCart, 4),
            "/api/recipes/4/shopping_cart/",
        );
        assert_eq!(p.0.status, 400);
        assert_eq!(p.0.code, CODE_CONFLICT);
        assert_eq!(p.0.instance, "/api/recipes/4/shopping_cart/");
    }

    #[test]
    fn validation_carries_json_pointer() {
        let p = map_domain_error(
            &DomainError::validation("ingredients/2/amount", "Value must be between 1 and 32000."),
            "/api/recipes/",
        );
        assert_eq!(p.0.status, 400);
        let errors = p.0.errors.expect("errors present");
        assert_eq!(errors[0].pointer, "/ingredients/2/amount");
    }

    #[test]
    fn database_details_stay_internal() {
        let p = map_domain_error(&DomainError::database("disk I/O error"), "/api/users/");
        assert_eq!(p.0.status, 500);
        assert_eq!(p.0.code, CODE_INTERNAL_DB);
        assert!(!p.0.detail.contains("disk"));
    }

    #[test]
    fn forbidden_and_not_found() {
        assert_eq!(
            map_domain_error(&DomainError::not_recipe_author(1), "/").0.status,
            403
        );
        assert_eq!(map_domain_error(&DomainError::user_not_found(1), "/").0.status, 404);
        assert_eq!(map_domain_error(&DomainError::Unauthenticated, "/").0.status, 401);
    }
}
