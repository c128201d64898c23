use async_trait::async_trait;
use std::sync::Arc;

use crate::contract::{
    client::FoodgramApi,
    error::FoodgramError,
    model::{
        Identity, Ingredient, Membership, NewRecipe, RecipeDetails, RecipeId, RecipeSummary,
        ShoppingListLine, UserCard, UserId,
    },
};
use crate::domain::service::Service;

/// Local implementation of the FoodgramApi trait that delegates to the domain service
pub struct FoodgramLocalClient {
    service: Arc<Service>,
}

impl FoodgramLocalClient {
    pub fn new(service: Arc<Service>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl FoodgramApi for FoodgramLocalClient {
    async fn authenticate(&self, token: &str) -> Result<Identity, FoodgramError> {
        self.service.authenticate(token).await.map_err(Into::into)
    }

    async fn get_user(
        &self,
        viewer: Option<Identity>,
        id: UserId,
    ) -> Result<UserCard, FoodgramError> {
        self.service.get_user(viewer, id).await.map_err(Into::into)
    }

    async fn search_ingredients(&self, prefix: &str) -> Result<Vec<Ingredient>, FoodgramError> {
        self.service
            .list_ingredients(Some(prefix))
            .await
            .map_err(Into::into)
    }

    async fn get_recipe(
        &self,
        viewer: Option<Identity>,
        id: RecipeId,
    ) -> Result<RecipeDetails, FoodgramError> {
        self.service.get_recipe(viewer, id).await.map_err(Into::into)
    }

    async fn create_recipe(
        &self,
        author: Identity,
        recipe: NewRecipe,
    ) -> Result<RecipeDetails, FoodgramError> {
        self.service
            .create_recipe(author, recipe)
            .await
            .map_err(Into::into)
    }

    async fn add_to_cart(
        &self,
        user: Identity,
        recipe: RecipeId,
    ) -> Result<RecipeSummary, FoodgramError> {
        self.service
            .add_membership(user, Membership::ShoppingCart, recipe)
            .await
            .map_err(Into::into)
    }

    async fn shopping_list(&self, user: Identity) -> Result<Vec<ShoppingListLine>, FoodgramError> {
        self.service.shopping_list(user).await.map_err(Into::into)
    }
}
