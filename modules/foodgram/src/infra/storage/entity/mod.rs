pub mod auth_token;
pub mod favorite;
pub mod ingredient;
pub mod profile;
pub mod recipe;
pub mod recipe_ingredient;
pub mod shopping_cart_item;
pub mod subscription;
pub mod user;
