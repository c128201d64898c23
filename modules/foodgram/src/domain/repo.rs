use std::collections::{HashMap, HashSet};

use async_trait::async_trait;

use crate::contract::model::{
    Identity, Ingredient, IngredientAmount, IngredientId, Membership, NewUser, PageRequest,
    Recipe, RecipeFilter, RecipeId, RecipeIngredientLine, RecipeSummary, User, UserId,
};

/// Result of an insert guarded by a unique index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// The unique index already holds this pair.
    AlreadyExists,
    /// A referenced row vanished between lookup and insert.
    MissingReference,
}

/// Result of inserting a user with its profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateUserOutcome {
    Created(User),
    UsernameTaken,
    EmailTaken,
}

/// Recipe fields to persist together with the ingredient rows.
#[derive(Debug, Clone)]
pub struct RecipeDraft {
    pub author_id: UserId,
    pub name: String,
    pub image: String,
    pub cooking_time: i32,
    pub text: String,
    pub date_posted: chrono::DateTime<chrono::Utc>,
}

/// Port for the domain layer: persistence operations the domain needs.
/// Object-safe and async-friendly via `async_trait`.
#[async_trait]
pub trait FoodgramRepository: Send + Sync {
    // --- identity ---

    /// Resolve an auth token key to its owner.
    async fn resolve_token(&self, key: &str) -> anyhow::Result<Option<Identity>>;

    // --- users ---

    async fn find_user(&self, id: UserId) -> anyhow::Result<Option<User>>;
    async fn users_by_ids(&self, ids: &[UserId]) -> anyhow::Result<Vec<User>>;
    /// Page of users ordered by id, plus the total count.
    async fn list_users(&self, page: PageRequest) -> anyhow::Result<(Vec<User>, u64)>;
    async fn username_exists(&self, username: &str) -> anyhow::Result<bool>;
    async fn email_exists(&self, email: &str) -> anyhow::Result<bool>;
    /// Insert the user and an empty profile in one transaction.
    async fn create_user_with_profile(&self, u: NewUser) -> anyhow::Result<CreateUserOutcome>;
    /// Avatar reference per user; users without one are absent from the map.
    async fn avatars_for(&self, ids: &[UserId]) -> anyhow::Result<HashMap<UserId, String>>;
    /// Replace or clear the user's avatar reference.
    async fn set_avatar(&self, user: UserId, avatar: Option<String>) -> anyhow::Result<()>;

    // --- subscriptions ---

    /// Which of `targets` the `user` follows.
    async fn subscribed_among(
        &self,
        user: UserId,
        targets: &[UserId],
    ) -> anyhow::Result<HashSet<UserId>>;
    async fn insert_subscription(&self, user: UserId, target: UserId)
        -> anyhow::Result<InsertOutcome>;
    /// Returns true if a row was deleted.
    async fn delete_subscription(&self, user: UserId, target: UserId) -> anyhow::Result<bool>;
    /// Page of followed users ordered by id, plus the total count.
    async fn list_subscriptions(
        &self,
        user: UserId,
        page: PageRequest,
    ) -> anyhow::Result<(Vec<User>, u64)>;

    // --- ingredients ---

    async fn list_ingredients(&self, name_prefix: Option<&str>) -> anyhow::Result<Vec<Ingredient>>;
    async fn find_ingredient(&self, id: IngredientId) -> anyhow::Result<Option<Ingredient>>;
    /// Which of `ids` exist in the catalog.
    async fn existing_ingredient_ids(
        &self,
        ids: &[IngredientId],
    ) -> anyhow::Result<HashSet<IngredientId>>;

    // --- recipes ---

    async fn find_recipe(&self, id: RecipeId) -> anyhow::Result<Option<Recipe>>;
    /// Page of recipes newest first, plus the total count.
    ///
    /// Viewer-state filters require `viewer`; callers short-circuit anonymous ones.
    async fn list_recipes(
        &self,
        filter: &RecipeFilter,
        viewer: Option<UserId>,
        page: PageRequest,
    ) -> anyhow::Result<(Vec<Recipe>, u64)>;
    /// Newest recipes of one author, optionally capped.
    async fn recent_recipes(
        &self,
        author: UserId,
        limit: Option<u64>,
    ) -> anyhow::Result<Vec<RecipeSummary>>;
    async fn count_recipes(&self, author: UserId) -> anyhow::Result<u64>;
    /// Ingredient lines per recipe, each list ordered by ingredient name.
    async fn ingredient_lines_for(
        &self,
        recipes: &[RecipeId],
    ) -> anyhow::Result<HashMap<RecipeId, Vec<RecipeIngredientLine>>>;
    /// Insert the recipe and its ingredient rows in one transaction.
    async fn insert_recipe(
        &self,
        draft: RecipeDraft,
        ingredients: &[IngredientAmount],
    ) -> anyhow::Result<Recipe>;
    /// Persist recipe fields and, when given, reconcile its ingredient rows,
    /// all in one transaction.
    async fn update_recipe(
        &self,
        recipe: &Recipe,
        ingredients: Option<&[IngredientAmount]>,
    ) -> anyhow::Result<()>;
    /// Returns true if a row was deleted.
    async fn delete_recipe(&self, id: RecipeId) -> anyhow::Result<bool>;

    // --- favorites / shopping cart ---

    async fn insert_membership(
        &self,
        kind: Membership,
        user: UserId,
        recipe: RecipeId,
    ) -> anyhow::Result<InsertOutcome>;
    /// Returns true if a row was deleted.
    async fn delete_membership(
        &self,
        kind: Membership,
        user: UserId,
        recipe: RecipeId,
    ) -> anyhow::Result<bool>;
    /// Which of `recipes` the user holds in `kind`.
    async fn memberships_among(
        &self,
        kind: Membership,
        user: UserId,
        recipes: &[RecipeId],
    ) -> anyhow::Result<HashSet<RecipeId>>;
    /// Every ingredient row of every recipe in the user's cart.
    async fn cart_ingredient_rows(&self, user: UserId)
        -> anyhow::Result<Vec<RecipeIngredientLine>>;
}
