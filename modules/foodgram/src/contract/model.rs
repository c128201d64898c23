use chrono::{DateTime, Utc};

pub type UserId = i32;
pub type RecipeId = i32;
pub type IngredientId = i32;

/// Account record as stored by this service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub is_superuser: bool,
}

/// Data for creating a new user.
#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

/// The authenticated caller of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    pub user_id: UserId,
    pub is_admin: bool,
}

/// A user as seen by a (possibly anonymous) viewer.
#[derive(Debug, Clone, PartialEq)]
pub struct UserCard {
    pub user: User,
    pub is_subscribed: bool,
    pub avatar: Option<String>,
}

/// A followed author with a slice of their newest recipes.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthorWithRecipes {
    pub card: UserCard,
    pub recipes: Vec<RecipeSummary>,
    pub recipes_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ingredient {
    pub id: IngredientId,
    pub name: String,
    pub measurement_unit: String,
}

/// One submitted `(ingredient, amount)` pair of a recipe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngredientAmount {
    pub ingredient_id: IngredientId,
    pub amount: i32,
}

/// A catalog ingredient together with the amount a recipe uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipeIngredientLine {
    pub ingredient: Ingredient,
    pub amount: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipe {
    pub id: RecipeId,
    pub author_id: UserId,
    pub name: String,
    pub image: String,
    pub cooking_time: i32,
    pub text: String,
    pub date_posted: DateTime<Utc>,
}

/// Minimized recipe projection used by toggles and author listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipeSummary {
    pub id: RecipeId,
    pub name: String,
    pub image: String,
    pub cooking_time: i32,
}

impl From<&Recipe> for RecipeSummary {
    fn from(r: &Recipe) -> Self {
        Self {
            id: r.id,
            name: r.name.clone(),
            image: r.image.clone(),
            cooking_time: r.cooking_time,
        }
    }
}

/// Full recipe representation for a viewer.
#[derive(Debug, Clone, PartialEq)]
pub struct RecipeDetails {
    pub recipe: Recipe,
    pub author: UserCard,
    pub ingredients: Vec<RecipeIngredientLine>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
}

#[derive(Debug, Clone, Default)]
pub struct NewRecipe {
    pub name: String,
    pub image: String,
    pub cooking_time: i32,
    pub text: String,
    pub ingredients: Vec<IngredientAmount>,
}

/// Partial recipe update; `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct RecipePatch {
    pub name: Option<String>,
    pub image: Option<String>,
    pub cooking_time: Option<i32>,
    pub text: Option<String>,
    pub ingredients: Option<Vec<IngredientAmount>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecipeFilter {
    pub author: Option<UserId>,
    pub favorited_only: bool,
    pub in_cart_only: bool,
}

/// User-to-recipe relations with the same add/remove semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Membership {
    Favorites,
    ShoppingCart,
}

impl Membership {
    pub fn as_str(self) -> &'static str {
        match self {
            Membership::Favorites => "favorites",
            Membership::ShoppingCart => "shopping cart",
        }
    }
}

/// One consolidated shopping list entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShoppingListLine {
    pub name: String,
    pub measurement_unit: String,
    pub total_amount: i64,
}

/// 1-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub limit: u64,
}

impl PageRequest {
    pub fn offset(&self) -> u64 {
        (self.page.saturating_sub(1)).saturating_mul(self.limit)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub count: u64,
    pub request: PageRequest,
}

impl<T> Page<T> {
    pub fn has_next(&self) -> bool {
        self.request.offset() + (self.items.len() as u64) < self.count
    }

    pub fn has_previous(&self) -> bool {
        self.request.page > 1
    }

    /// Map items while preserving paging info.
    pub fn map_items<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            count: self.count,
            request: self.request,
        }
    }
}
