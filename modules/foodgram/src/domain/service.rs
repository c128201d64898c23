use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, instrument, warn};

use crate::contract::model::{
    AuthorWithRecipes, Identity, Ingredient, IngredientAmount, IngredientId, Membership, NewRecipe,
    NewUser, Page, PageRequest, Recipe, RecipeDetails, RecipeFilter, RecipeId, RecipePatch,
    RecipeSummary, ShoppingListLine, User, UserCard, UserId,
};
use crate::domain::error::DomainError;
use crate::domain::repo::{CreateUserOutcome, FoodgramRepository, InsertOutcome, RecipeDraft};
use crate::domain::{shopping_list, validation};

/// Largest value accepted by the SQL bind layer for LIMIT/OFFSET.
const SQL_INT_MAX: u64 = i64::MAX as u64;

/// Domain service with the business rules of the recipe platform.
/// Depends only on the repository port, not on infra types.
#[derive(Clone)]
pub struct Service {
    repo: Arc<dyn FoodgramRepository>,
    config: ServiceConfig,
}

/// Configuration for the domain service
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub default_page_size: u64,
    pub max_page_size: u64,
    /// Scheme and host used in short links; `None` lets the caller decide.
    pub short_link_origin: Option<String>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            default_page_size: 6,
            max_page_size: 100,
            short_link_origin: None,
        }
    }
}

impl Service {
    /// Create a service with dependencies.
    pub fn new(repo: Arc<dyn FoodgramRepository>, config: ServiceConfig) -> Self {
        Self { repo, config }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Build a page request from raw query values.
    ///
    /// Missing values fall back to defaults; an oversized limit is clamped.
    /// A page whose offset does not fit a signed 64-bit SQL value is rejected.
    pub fn page_request(
        &self,
        page: Option<u64>,
        limit: Option<u64>,
    ) -> Result<PageRequest, DomainError> {
        let page = page.unwrap_or(1);
        if page == 0 {
            return Err(DomainError::validation("page", "Page numbers start at 1."));
        }
        let limit = limit.unwrap_or(self.config.default_page_size);
        if limit == 0 {
            return Err(DomainError::validation("limit", "Limit must be positive."));
        }
        let limit = limit.min(self.config.max_page_size);
        let offset_fits = (page - 1)
            .checked_mul(limit)
            .is_some_and(|offset| offset <= SQL_INT_MAX);
        if !offset_fits {
            return Err(DomainError::validation("page", "Invalid page."));
        }
        Ok(PageRequest { page, limit })
    }

    // --- identity ---

    #[instrument(name = "foodgram.service.authenticate", skip_all)]
    pub async fn authenticate(&self, token: &str) -> Result<Identity, DomainError> {
        let identity = self
            .repo
            .resolve_token(token)
            .await
            .map_err(DomainError::from_repo)?
            .ok_or(DomainError::Unauthenticated)?;
        debug!(user_id = identity.user_id, "token resolved");
        Ok(identity)
    }

    // --- users ---

    #[instrument(
        name = "foodgram.service.create_user",
        skip(self, new_user),
        fields(username = %new_user.username)
    )]
    pub async fn create_user(&self, new_user: NewUser) -> Result<User, DomainError> {
        info!("Creating new user");
        validation::validate_new_user(&new_user)?;

        if self
            .repo
            .username_exists(&new_user.username)
            .await
            .map_err(DomainError::from_repo)?
        {
            return Err(username_taken());
        }
        if self
            .repo
            .email_exists(&new_user.email)
            .await
            .map_err(DomainError::from_repo)?
        {
            return Err(email_taken());
        }

        match self
            .repo
            .create_user_with_profile(new_user)
            .await
            .map_err(DomainError::from_repo)?
        {
            CreateUserOutcome::Created(user) => {
                info!(user_id = user.id, "Successfully created user");
                Ok(user)
            }
            CreateUserOutcome::UsernameTaken => Err(username_taken()),
            CreateUserOutcome::EmailTaken => Err(email_taken()),
        }
    }

    #[instrument(name = "foodgram.service.get_user", skip(self, viewer), fields(user_id = id))]
    pub async fn get_user(
        &self,
        viewer: Option<Identity>,
        id: UserId,
    ) -> Result<UserCard, DomainError> {
        let user = self.load_user(id).await?;
        let mut cards = self.user_cards(viewer, vec![user]).await?;
        cards.pop().ok_or_else(|| DomainError::user_not_found(id))
    }

    #[instrument(name = "foodgram.service.me", skip_all, fields(user_id = identity.user_id))]
    pub async fn me(&self, identity: Identity) -> Result<UserCard, DomainError> {
        self.get_user(Some(identity), identity.user_id).await
    }

    #[instrument(name = "foodgram.service.list_users", skip(self, viewer))]
    pub async fn list_users(
        &self,
        viewer: Option<Identity>,
        page: PageRequest,
    ) -> Result<Page<UserCard>, DomainError> {
        let (users, count) = self
            .repo
            .list_users(page)
            .await
            .map_err(DomainError::from_repo)?;
        let items = self.user_cards(viewer, users).await?;
        Ok(Page {
            items,
            count,
            request: page,
        })
    }

    #[instrument(
        name = "foodgram.service.set_avatar",
        skip_all,
        fields(user_id = identity.user_id)
    )]
    pub async fn set_avatar(
        &self,
        identity: Identity,
        avatar: String,
    ) -> Result<String, DomainError> {
        validation::validate_avatar(&avatar)?;
        self.repo
            .set_avatar(identity.user_id, Some(avatar.clone()))
            .await
            .map_err(DomainError::from_repo)?;
        info!("Avatar updated");
        Ok(avatar)
    }

    #[instrument(
        name = "foodgram.service.clear_avatar",
        skip_all,
        fields(user_id = identity.user_id)
    )]
    pub async fn clear_avatar(&self, identity: Identity) -> Result<(), DomainError> {
        self.repo
            .set_avatar(identity.user_id, None)
            .await
            .map_err(DomainError::from_repo)?;
        info!("Avatar cleared");
        Ok(())
    }

    // --- subscriptions ---

    #[instrument(
        name = "foodgram.service.subscribe",
        skip(self, identity),
        fields(user_id = identity.user_id, target_id = target)
    )]
    pub async fn subscribe(
        &self,
        identity: Identity,
        target: UserId,
        recipes_limit: Option<u64>,
    ) -> Result<AuthorWithRecipes, DomainError> {
        let author = self.load_user(target).await?;
        if identity.user_id == target {
            return Err(DomainError::SelfSubscription);
        }
        let recipes_limit = recipes_limit.map(clamp_recipes_limit);

        match self
            .repo
            .insert_subscription(identity.user_id, target)
            .await
            .map_err(DomainError::from_repo)?
        {
            InsertOutcome::Inserted => {}
            InsertOutcome::AlreadyExists => {
                return Err(DomainError::AlreadySubscribed { user_id: target })
            }
            InsertOutcome::MissingReference => return Err(DomainError::user_not_found(target)),
        }
        info!("Subscribed");

        let mut authors = self
            .authors_with_recipes(Some(identity), vec![author], recipes_limit)
            .await?;
        authors.pop().ok_or_else(|| DomainError::user_not_found(target))
    }

    #[instrument(
        name = "foodgram.service.unsubscribe",
        skip(self, identity),
        fields(user_id = identity.user_id, target_id = target)
    )]
    pub async fn unsubscribe(&self, identity: Identity, target: UserId) -> Result<(), DomainError> {
        self.load_user(target).await?;
        if identity.user_id == target {
            return Err(DomainError::SelfSubscription);
        }

        let deleted = self
            .repo
            .delete_subscription(identity.user_id, target)
            .await
            .map_err(DomainError::from_repo)?;
        if !deleted {
            return Err(DomainError::NotSubscribed { user_id: target });
        }
        info!("Unsubscribed");
        Ok(())
    }

    #[instrument(
        name = "foodgram.service.list_subscriptions",
        skip(self, identity),
        fields(user_id = identity.user_id)
    )]
    pub async fn list_subscriptions(
        &self,
        identity: Identity,
        page: PageRequest,
        recipes_limit: Option<u64>,
    ) -> Result<Page<AuthorWithRecipes>, DomainError> {
        let recipes_limit = recipes_limit.map(clamp_recipes_limit);
        let (users, count) = self
            .repo
            .list_subscriptions(identity.user_id, page)
            .await
            .map_err(DomainError::from_repo)?;
        let items = self
            .authors_with_recipes(Some(identity), users, recipes_limit)
            .await?;
        Ok(Page {
            items,
            count,
            request: page,
        })
    }

    // --- ingredients ---

    #[instrument(name = "foodgram.service.list_ingredients", skip(self))]
    pub async fn list_ingredients(
        &self,
        name_prefix: Option<&str>,
    ) -> Result<Vec<Ingredient>, DomainError> {
        let prefix = name_prefix.map(str::trim).filter(|p| !p.is_empty());
        self.repo
            .list_ingredients(prefix)
            .await
            .map_err(DomainError::from_repo)
    }

    #[instrument(name = "foodgram.service.get_ingredient", skip(self))]
    pub async fn get_ingredient(&self, id: IngredientId) -> Result<Ingredient, DomainError> {
        self.repo
            .find_ingredient(id)
            .await
            .map_err(DomainError::from_repo)?
            .ok_or_else(|| DomainError::ingredient_not_found(id))
    }

    // --- recipes ---

    #[instrument(name = "foodgram.service.list_recipes", skip(self, viewer))]
    pub async fn list_recipes(
        &self,
        viewer: Option<Identity>,
        filter: RecipeFilter,
        page: PageRequest,
    ) -> Result<Page<RecipeDetails>, DomainError> {
        let viewer_id = viewer.map(|v| v.user_id);
        if viewer_id.is_none() && (filter.favorited_only || filter.in_cart_only) {
            debug!("viewer-state filter requested anonymously, returning empty page");
            return Ok(Page {
                items: Vec::new(),
                count: 0,
                request: page,
            });
        }

        let (recipes, count) = self
            .repo
            .list_recipes(&filter, viewer_id, page)
            .await
            .map_err(DomainError::from_repo)?;
        let items = self.recipe_details(viewer, recipes).await?;
        Ok(Page {
            items,
            count,
            request: page,
        })
    }

    #[instrument(name = "foodgram.service.get_recipe", skip(self, viewer), fields(recipe_id = id))]
    pub async fn get_recipe(
        &self,
        viewer: Option<Identity>,
        id: RecipeId,
    ) -> Result<RecipeDetails, DomainError> {
        let recipe = self.load_recipe(id).await?;
        self.single_details(viewer, recipe).await
    }

    #[instrument(
        name = "foodgram.service.create_recipe",
        skip(self, identity, new_recipe),
        fields(author_id = identity.user_id, name = %new_recipe.name)
    )]
    pub async fn create_recipe(
        &self,
        identity: Identity,
        new_recipe: NewRecipe,
    ) -> Result<RecipeDetails, DomainError> {
        info!("Creating recipe");
        validation::validate_new_recipe(&new_recipe)?;
        self.ensure_ingredients_exist(&new_recipe.ingredients).await?;

        let draft = RecipeDraft {
            author_id: identity.user_id,
            name: new_recipe.name,
            image: new_recipe.image,
            cooking_time: new_recipe.cooking_time,
            text: new_recipe.text,
            date_posted: Utc::now(),
        };
        let recipe = self
            .repo
            .insert_recipe(draft, &new_recipe.ingredients)
            .await
            .map_err(DomainError::from_repo)?;

        info!(recipe_id = recipe.id, "Successfully created recipe");
        self.single_details(Some(identity), recipe).await
    }

    #[instrument(
        name = "foodgram.service.update_recipe",
        skip(self, identity, patch),
        fields(user_id = identity.user_id, recipe_id = id)
    )]
    pub async fn update_recipe(
        &self,
        identity: Identity,
        id: RecipeId,
        patch: RecipePatch,
    ) -> Result<RecipeDetails, DomainError> {
        info!("Updating recipe");
        let mut recipe = self.load_recipe(id).await?;
        ensure_can_modify(identity, &recipe)?;

        validation::validate_recipe_patch(&patch)?;
        if let Some(items) = &patch.ingredients {
            self.ensure_ingredients_exist(items).await?;
        }

        if let Some(name) = patch.name {
            recipe.name = name;
        }
        if let Some(image) = patch.image {
            recipe.image = image;
        }
        if let Some(cooking_time) = patch.cooking_time {
            recipe.cooking_time = cooking_time;
        }
        if let Some(text) = patch.text {
            recipe.text = text;
        }

        self.repo
            .update_recipe(&recipe, patch.ingredients.as_deref())
            .await
            .map_err(DomainError::from_repo)?;

        info!("Successfully updated recipe");
        self.single_details(Some(identity), recipe).await
    }

    #[instrument(
        name = "foodgram.service.delete_recipe",
        skip(self, identity),
        fields(user_id = identity.user_id, recipe_id = id)
    )]
    pub async fn delete_recipe(&self, identity: Identity, id: RecipeId) -> Result<(), DomainError> {
        info!("Deleting recipe");
        let recipe = self.load_recipe(id).await?;
        ensure_can_modify(identity, &recipe)?;

        let deleted = self
            .repo
            .delete_recipe(id)
            .await
            .map_err(DomainError::from_repo)?;
        if !deleted {
            return Err(DomainError::recipe_not_found(id));
        }
        info!("Successfully deleted recipe");
        Ok(())
    }

    /// Absolute short link for a recipe. `fallback_origin` is used when no
    /// origin is configured.
    #[instrument(name = "foodgram.service.short_link", skip(self, fallback_origin))]
    pub async fn short_link(
        &self,
        id: RecipeId,
        fallback_origin: &str,
    ) -> Result<String, DomainError> {
        self.load_recipe(id).await?;
        let origin = self
            .config
            .short_link_origin
            .as_deref()
            .unwrap_or(fallback_origin)
            .trim_end_matches('/');
        Ok(format!("{origin}/s/{id}"))
    }

    /// Check that a short link points at an existing recipe.
    #[instrument(name = "foodgram.service.resolve_short_link", skip(self))]
    pub async fn resolve_short_link(&self, id: RecipeId) -> Result<RecipeId, DomainError> {
        self.load_recipe(id).await.map(|r| r.id)
    }

    // --- favorites / shopping cart ---

    #[instrument(
        name = "foodgram.service.add_membership",
        skip(self, identity),
        fields(user_id = identity.user_id, recipe_id = recipe_id, kind = kind.as_str())
    )]
    pub async fn add_membership(
        &self,
        identity: Identity,
        kind: Membership,
        recipe_id: RecipeId,
    ) -> Result<RecipeSummary, DomainError> {
        let recipe = self.load_recipe(recipe_id).await?;

        match self
            .repo
            .insert_membership(kind, identity.user_id, recipe_id)
            .await
            .map_err(DomainError::from_repo)?
        {
            InsertOutcome::Inserted => {
                info!("Added");
                Ok(RecipeSummary::from(&recipe))
            }
            InsertOutcome::AlreadyExists => Err(DomainError::already_member(kind, recipe_id)),
            InsertOutcome::MissingReference => Err(DomainError::recipe_not_found(recipe_id)),
        }
    }

    #[instrument(
        name = "foodgram.service.remove_membership",
        skip(self, identity),
        fields(user_id = identity.user_id, recipe_id = recipe_id, kind = kind.as_str())
    )]
    pub async fn remove_membership(
        &self,
        identity: Identity,
        kind: Membership,
        recipe_id: RecipeId,
    ) -> Result<(), DomainError> {
        self.load_recipe(recipe_id).await?;

        let deleted = self
            .repo
            .delete_membership(kind, identity.user_id, recipe_id)
            .await
            .map_err(DomainError::from_repo)?;
        if !deleted {
            return Err(DomainError::not_member(kind, recipe_id));
        }
        info!("Removed");
        Ok(())
    }

    #[instrument(
        name = "foodgram.service.shopping_list",
        skip_all,
        fields(user_id = identity.user_id)
    )]
    pub async fn shopping_list(
        &self,
        identity: Identity,
    ) -> Result<Vec<ShoppingListLine>, DomainError> {
        let rows = self
            .repo
            .cart_ingredient_rows(identity.user_id)
            .await
            .map_err(DomainError::from_repo)?;
        let lines = shopping_list::aggregate(rows);
        debug!(lines = lines.len(), "shopping list aggregated");
        Ok(lines)
    }

    // --- helpers ---

    async fn load_user(&self, id: UserId) -> Result<User, DomainError> {
        self.repo
            .find_user(id)
            .await
            .map_err(DomainError::from_repo)?
            .ok_or_else(|| DomainError::user_not_found(id))
    }

    async fn load_recipe(&self, id: RecipeId) -> Result<Recipe, DomainError> {
        self.repo
            .find_recipe(id)
            .await
            .map_err(DomainError::from_repo)?
            .ok_or_else(|| DomainError::recipe_not_found(id))
    }

    async fn ensure_ingredients_exist(&self, items: &[IngredientAmount]) -> Result<(), DomainError> {
        let ids: Vec<IngredientId> = items.iter().map(|i| i.ingredient_id).collect();
        let known = self
            .repo
            .existing_ingredient_ids(&ids)
            .await
            .map_err(DomainError::from_repo)?;
        if let Some((pos, item)) = items
            .iter()
            .enumerate()
            .find(|(_, item)| !known.contains(&item.ingredient_id))
        {
            warn!(ingredient_id = item.ingredient_id, "unknown ingredient submitted");
            return Err(DomainError::validation(
                format!("ingredients/{pos}/id"),
                format!("Ingredient {} does not exist.", item.ingredient_id),
            ));
        }
        Ok(())
    }

    async fn user_cards(
        &self,
        viewer: Option<Identity>,
        users: Vec<User>,
    ) -> Result<Vec<UserCard>, DomainError> {
        let ids: Vec<UserId> = users.iter().map(|u| u.id).collect();
        let mut avatars = self
            .repo
            .avatars_for(&ids)
            .await
            .map_err(DomainError::from_repo)?;
        let followed = match viewer {
            Some(v) => self
                .repo
                .subscribed_among(v.user_id, &ids)
                .await
                .map_err(DomainError::from_repo)?,
            None => HashSet::new(),
        };

        Ok(users
            .into_iter()
            .map(|user| UserCard {
                is_subscribed: followed.contains(&user.id),
                avatar: avatars.remove(&user.id),
                user,
            })
            .collect())
    }

    async fn authors_with_recipes(
        &self,
        viewer: Option<Identity>,
        users: Vec<User>,
        recipes_limit: Option<u64>,
    ) -> Result<Vec<AuthorWithRecipes>, DomainError> {
        let cards = self.user_cards(viewer, users).await?;
        let mut out = Vec::with_capacity(cards.len());
        for card in cards {
            let recipes = self
                .repo
                .recent_recipes(card.user.id, recipes_limit)
                .await
                .map_err(DomainError::from_repo)?;
            let recipes_count = self
                .repo
                .count_recipes(card.user.id)
                .await
                .map_err(DomainError::from_repo)?;
            out.push(AuthorWithRecipes {
                card,
                recipes,
                recipes_count,
            });
        }
        Ok(out)
    }

    async fn single_details(
        &self,
        viewer: Option<Identity>,
        recipe: Recipe,
    ) -> Result<RecipeDetails, DomainError> {
        let id = recipe.id;
        self.recipe_details(viewer, vec![recipe])
            .await?
            .pop()
            .ok_or_else(|| DomainError::recipe_not_found(id))
    }

    async fn recipe_details(
        &self,
        viewer: Option<Identity>,
        recipes: Vec<Recipe>,
    ) -> Result<Vec<RecipeDetails>, DomainError> {
        if recipes.is_empty() {
            return Ok(Vec::new());
        }
        let recipe_ids: Vec<RecipeId> = recipes.iter().map(|r| r.id).collect();

        let mut author_ids: Vec<UserId> = recipes.iter().map(|r| r.author_id).collect();
        author_ids.sort_unstable();
        author_ids.dedup();
        let authors = self
            .repo
            .users_by_ids(&author_ids)
            .await
            .map_err(DomainError::from_repo)?;
        let authors = self.user_cards(viewer, authors).await?;

        let mut lines = self
            .repo
            .ingredient_lines_for(&recipe_ids)
            .await
            .map_err(DomainError::from_repo)?;

        let (favorited, in_cart) = match viewer {
            Some(v) => (
                self.repo
                    .memberships_among(Membership::Favorites, v.user_id, &recipe_ids)
                    .await
                    .map_err(DomainError::from_repo)?,
                self.repo
                    .memberships_among(Membership::ShoppingCart, v.user_id, &recipe_ids)
                    .await
                    .map_err(DomainError::from_repo)?,
            ),
            None => (HashSet::new(), HashSet::new()),
        };

        let mut out = Vec::with_capacity(recipes.len());
        for recipe in recipes {
            let author = authors
                .iter()
                .find(|c| c.user.id == recipe.author_id)
                .cloned()
                .ok_or_else(|| DomainError::user_not_found(recipe.author_id))?;
            out.push(RecipeDetails {
                author,
                ingredients: lines.remove(&recipe.id).unwrap_or_default(),
                is_favorited: favorited.contains(&recipe.id),
                is_in_shopping_cart: in_cart.contains(&recipe.id),
                recipe,
            });
        }
        Ok(out)
    }
}

fn ensure_can_modify(identity: Identity, recipe: &Recipe) -> Result<(), DomainError> {
    if identity.is_admin || identity.user_id == recipe.author_id {
        Ok(())
    } else {
        Err(DomainError::not_recipe_author(recipe.id))
    }
}

fn clamp_recipes_limit(limit: u64) -> u64 {
    limit.min(SQL_INT_MAX)
}

fn username_taken() -> DomainError {
    DomainError::validation("username", "A user with that username already exists.")
}

fn email_taken() -> DomainError {
    DomainError::validation("email", "A user with that email already exists.")
}
