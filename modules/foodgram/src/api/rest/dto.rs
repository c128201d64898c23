use axum::http::Uri;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::contract::model::{
    AuthorWithRecipes, Ingredient, IngredientAmount, NewRecipe, NewUser, Page, RecipeDetails,
    RecipeFilter, RecipePatch, RecipeSummary, User, UserCard,
};

/// Public user representation.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserDto {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub is_subscribed: bool,
    /// Avatar reference, `""` when unset.
    pub avatar: String,
}

/// Returned after registration.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreatedUserDto {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateUserReq {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

/// Body and response of `PUT /api/users/me/avatar/`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AvatarDto {
    pub avatar: String,
}

/// Followed author with their newest recipes.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserWithRecipesDto {
    #[serde(flatten)]
    pub user: UserDto,
    pub recipes: Vec<RecipeMinifiedDto>,
    pub recipes_count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct IngredientDto {
    pub id: i32,
    pub name: String,
    pub measurement_unit: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RecipeIngredientDto {
    pub id: i32,
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RecipeDto {
    pub id: i32,
    pub author: UserDto,
    pub ingredients: Vec<RecipeIngredientDto>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
    pub name: String,
    pub image: String,
    pub text: String,
    pub cooking_time: i32,
}

/// `{id, name, image, cooking_time}` projection.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RecipeMinifiedDto {
    pub id: i32,
    pub name: String,
    pub image: String,
    pub cooking_time: i32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema)]
pub struct IngredientAmountReq {
    /// Catalog ingredient id.
    pub id: i32,
    pub amount: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateRecipeReq {
    pub ingredients: Vec<IngredientAmountReq>,
    pub image: String,
    pub name: String,
    pub text: String,
    pub cooking_time: i32,
}

/// Partial update; absent fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateRecipeReq {
    pub ingredients: Option<Vec<IngredientAmountReq>>,
    pub image: Option<String>,
    pub name: Option<String>,
    pub text: Option<String>,
    pub cooking_time: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ShortLinkDto {
    #[serde(rename = "short-link")]
    pub short_link: String,
}

/// Page-number pagination envelope.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Paginated<T> {
    pub count: u64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    /// 1-based page number.
    pub page: Option<u64>,
    /// Page size.
    pub limit: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SubscriptionsQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    /// Cap on recipes embedded per author.
    pub recipes_limit: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RecipesLimitQuery {
    pub recipes_limit: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct IngredientSearchQuery {
    /// Case-insensitive name prefix.
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RecipeListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    /// Author id.
    pub author: Option<i32>,
    /// `1` to show only the caller's favorites.
    pub is_favorited: Option<String>,
    /// `1` to show only recipes in the caller's cart.
    pub is_in_shopping_cart: Option<String>,
}

fn flag(v: &Option<String>) -> bool {
    matches!(v.as_deref(), Some("1") | Some("true") | Some("True"))
}

impl RecipeListQuery {
    pub fn filter(&self) -> RecipeFilter {
        RecipeFilter {
            author: self.author,
            favorited_only: flag(&self.is_favorited),
            in_cart_only: flag(&self.is_in_shopping_cart),
        }
    }
}

// Conversion implementations between REST DTOs and contract models

impl From<UserCard> for UserDto {
    fn from(card: UserCard) -> Self {
        Self {
            id: card.user.id,
            username: card.user.username,
            email: card.user.email,
            first_name: card.user.first_name,
            last_name: card.user.last_name,
            is_subscribed: card.is_subscribed,
            avatar: card.avatar.unwrap_or_default(),
        }
    }
}

impl From<User> for CreatedUserDto {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            username: u.username,
            email: u.email,
            first_name: u.first_name,
            last_name: u.last_name,
        }
    }
}

impl From<CreateUserReq> for NewUser {
    fn from(req: CreateUserReq) -> Self {
        Self {
            username: req.username,
            email: req.email,
            first_name: req.first_name,
            last_name: req.last_name,
        }
    }
}

impl From<AuthorWithRecipes> for UserWithRecipesDto {
    fn from(a: AuthorWithRecipes) -> Self {
        Self {
            user: a.card.into(),
            recipes: a.recipes.into_iter().map(Into::into).collect(),
            recipes_count: a.recipes_count,
        }
    }
}

impl From<Ingredient> for IngredientDto {
    fn from(i: Ingredient) -> Self {
        Self {
            id: i.id,
            name: i.name,
            measurement_unit: i.measurement_unit,
        }
    }
}

impl From<RecipeSummary> for RecipeMinifiedDto {
    fn from(r: RecipeSummary) -> Self {
        Self {
            id: r.id,
            name: r.name,
            image: r.image,
            cooking_time: r.cooking_time,
        }
    }
}

impl From<RecipeDetails> for RecipeDto {
    fn from(d: RecipeDetails) -> Self {
        Self {
            id: d.recipe.id,
            author: d.author.into(),
            ingredients: d
                .ingredients
                .into_iter()
                .map(|l| RecipeIngredientDto {
                    id: l.ingredient.id,
                    name: l.ingredient.name,
                    measurement_unit: l.ingredient.measurement_unit,
                    amount: l.amount,
                })
                .collect(),
            is_favorited: d.is_favorited,
            is_in_shopping_cart: d.is_in_shopping_cart,
            name: d.recipe.name,
            image: d.recipe.image,
            text: d.recipe.text,
            cooking_time: d.recipe.cooking_time,
        }
    }
}

impl From<IngredientAmountReq> for IngredientAmount {
    fn from(r: IngredientAmountReq) -> Self {
        Self {
            ingredient_id: r.id,
            amount: r.amount,
        }
    }
}

impl From<CreateRecipeReq> for NewRecipe {
    fn from(req: CreateRecipeReq) -> Self {
        Self {
            name: req.name,
            image: req.image,
            cooking_time: req.cooking_time,
            text: req.text,
            ingredients: req.ingredients.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<UpdateRecipeReq> for RecipePatch {
    fn from(req: UpdateRecipeReq) -> Self {
        Self {
            name: req.name,
            image: req.image,
            cooking_time: req.cooking_time,
            text: req.text,
            ingredients: req
                .ingredients
                .map(|items| items.into_iter().map(Into::into).collect()),
        }
    }
}

/// Absolute URL of the same endpoint with `page` replaced; page 1 drops the parameter.
fn page_url(origin: &str, uri: &Uri, page: u64) -> String {
    let mut pairs: Vec<String> = uri
        .query()
        .unwrap_or("")
        .split('&')
        .filter(|p| !p.is_empty() && !p.starts_with("page="))
        .map(str::to_owned)
        .collect();
    if page > 1 {
        pairs.push(format!("page={page}"));
    }
    let path = uri.path();
    if pairs.is_empty() {
        format!("{origin}{path}")
    } else {
        format!("{origin}{path}?{}", pairs.join("&"))
    }
}

impl<T> Paginated<T> {
    /// Wrap a domain page, building `next`/`previous` links against `origin`.
    pub fn from_page<U>(page: Page<U>, origin: &str, uri: &Uri) -> Self
    where
        U: Into<T>,
    {
        let current = page.request.page;
        let next = page
            .has_next()
            .then(|| page_url(origin, uri, current + 1));
        let previous = page
            .has_previous()
            .then(|| page_url(origin, uri, current - 1));
        Self {
            count: page.count,
            next,
            previous,
            results: page.items.into_iter().map(Into::into).collect(),
        }
    }
}
