use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::api::rest::{dto, handlers, problem};

#[derive(OpenApi)]
#[openapi(
    info(title = "Foodgram API", description = "Recipes, subscriptions and shopping lists"),
    paths(
        handlers::list_users,
        handlers::create_user,
        handlers::get_user,
        handlers::me,
        handlers::set_avatar,
        handlers::clear_avatar,
        handlers::list_subscriptions,
        handlers::subscribe,
        handlers::unsubscribe,
        handlers::list_ingredients,
        handlers::get_ingredient,
        handlers::list_recipes,
        handlers::create_recipe,
        handlers::get_recipe,
        handlers::update_recipe,
        handlers::delete_recipe,
        handlers::get_link,
        handlers::follow_short_link,
        handlers::add_favorite,
        handlers::remove_favorite,
        handlers::add_to_cart,
        handlers::remove_from_cart,
        handlers::download_shopping_cart,
    ),
    components(schemas(
        problem::Problem,
        problem::ValidationError,
        dto::UserDto,
        dto::AvatarDto,
        dto::RecipeDto,
        dto::IngredientDto,
    )),
    modifiers(&TokenAuth),
    tags(
        (name = "users", description = "Accounts and subscriptions"),
        (name = "ingredients", description = "Ingredient catalog"),
        (name = "recipes", description = "Recipes, favorites and shopping cart"),
    )
)]
pub struct ApiDoc;

/// `Authorization: Token <key>` header scheme.
struct TokenAuth;

impl Modify for TokenAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "token",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new("Authorization"))),
            );
        }
    }
}

/// Generated OpenAPI document for the module's REST surface.
pub fn openapi() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_route() {
        let doc = openapi();
        for path in [
            "/api/users/",
            "/api/users/me/",
            "/api/users/me/avatar/",
            "/api/users/subscriptions/",
            "/api/users/{id}/subscribe/",
            "/api/ingredients/",
            "/api/recipes/",
            "/api/recipes/{id}/",
            "/api/recipes/{id}/get-link/",
            "/api/recipes/{id}/favorite/",
            "/api/recipes/{id}/shopping_cart/",
            "/api/recipes/download_shopping_cart/",
            "/s/{id}",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
        let schemes = doc.components.expect("components").security_schemes;
        assert!(schemes.contains_key("token"));
    }
}
