use std::sync::Arc;

use axum::{
    routing::{get, post, put},
    Extension, Router,
};

use crate::api::rest::handlers;
use crate::domain::service::Service;

/// Mount the REST API on `router`, sharing `service` through request extensions.
pub fn register_routes(router: Router, service: Arc<Service>) -> Router {
    let api = Router::new()
        // users
        .route(
            "/api/users/",
            get(handlers::list_users).post(handlers::create_user),
        )
        .route("/api/users/me/", get(handlers::me))
        .route(
            "/api/users/me/avatar/",
            put(handlers::set_avatar).delete(handlers::clear_avatar),
        )
        .route(
            "/api/users/subscriptions/",
            get(handlers::list_subscriptions),
        )
        .route("/api/users/{id}/", get(handlers::get_user))
        .route(
            "/api/users/{id}/subscribe/",
            post(handlers::subscribe).delete(handlers::unsubscribe),
        )
        // ingredients
        .route("/api/ingredients/", get(handlers::list_ingredients))
        .route("/api/ingredients/{id}/", get(handlers::get_ingredient))
        // recipes
        .route(
            "/api/recipes/",
            get(handlers::list_recipes).post(handlers::create_recipe),
        )
        .route(
            "/api/recipes/download_shopping_cart/",
            get(handlers::download_shopping_cart),
        )
        .route(
            "/api/recipes/{id}/",
            get(handlers::get_recipe)
                .patch(handlers::update_recipe)
                .delete(handlers::delete_recipe),
        )
        .route("/api/recipes/{id}/get-link/", get(handlers::get_link))
        .route(
            "/api/recipes/{id}/favorite/",
            post(handlers::add_favorite).delete(handlers::remove_favorite),
        )
        .route(
            "/api/recipes/{id}/shopping_cart/",
            post(handlers::add_to_cart).delete(handlers::remove_from_cart),
        )
        .route("/s/{id}", get(handlers::follow_short_link))
        .layer(Extension(service));

    router.merge(api)
}
