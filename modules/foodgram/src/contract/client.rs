use async_trait::async_trait;

use crate::contract::{
    error::FoodgramError,
    model::{
        Identity, Ingredient, NewRecipe, RecipeDetails, RecipeId, RecipeSummary, ShoppingListLine,
        UserCard, UserId,
    },
};

/// Public API trait for the foodgram module that other modules can use
#[async_trait]
pub trait FoodgramApi: Send + Sync {
    /// Resolve an auth token key
    async fn authenticate(&self, token: &str) -> Result<Identity, FoodgramError>;

    /// Get a user as seen by `viewer`
    async fn get_user(
        &self,
        viewer: Option<Identity>,
        id: UserId,
    ) -> Result<UserCard, FoodgramError>;

    /// Search the ingredient catalog by name prefix
    async fn search_ingredients(&self, prefix: &str) -> Result<Vec<Ingredient>, FoodgramError>;

    /// Get a recipe with viewer-specific flags
    async fn get_recipe(
        &self,
        viewer: Option<Identity>,
        id: RecipeId,
    ) -> Result<RecipeDetails, FoodgramError>;

    /// Publish a recipe on behalf of `author`
    async fn create_recipe(
        &self,
        author: Identity,
        recipe: NewRecipe,
    ) -> Result<RecipeDetails, FoodgramError>;

    /// Put a recipe into the caller's shopping cart
    async fn add_to_cart(
        &self,
        user: Identity,
        recipe: RecipeId,
    ) -> Result<RecipeSummary, FoodgramError>;

    /// Consolidated shopping list for the caller's cart
    async fn shopping_list(&self, user: Identity) -> Result<Vec<ShoppingListLine>, FoodgramError>;
}
