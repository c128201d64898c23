use crate::contract::model::{Ingredient, Recipe, RecipeIngredientLine, RecipeSummary, User};
use crate::domain::reconcile::CurrentRow;
use crate::infra::storage::entity::{ingredient, recipe, recipe_ingredient, user};

impl From<user::Model> for User {
    fn from(m: user::Model) -> Self {
        Self {
            id: m.id,
            username: m.username,
            email: m.email,
            first_name: m.first_name,
            last_name: m.last_name,
            is_superuser: m.is_superuser,
        }
    }
}

impl From<ingredient::Model> for Ingredient {
    fn from(m: ingredient::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            measurement_unit: m.measurement_unit,
        }
    }
}

impl From<recipe::Model> for Recipe {
    fn from(m: recipe::Model) -> Self {
        Self {
            id: m.id,
            author_id: m.author_id,
            name: m.name,
            image: m.image,
            cooking_time: m.cooking_time,
            text: m.text,
            date_posted: m.date_posted,
        }
    }
}

impl From<recipe::Model> for RecipeSummary {
    fn from(m: recipe::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            image: m.image,
            cooking_time: m.cooking_time,
        }
    }
}

impl From<&recipe_ingredient::Model> for CurrentRow {
    fn from(m: &recipe_ingredient::Model) -> Self {
        Self {
            id: m.id,
            ingredient_id: m.ingredient_id,
            amount: m.amount,
        }
    }
}

/// Pair a recipe-ingredient row with its catalog entry.
pub fn ingredient_line(
    row: &recipe_ingredient::Model,
    ingredient: ingredient::Model,
) -> RecipeIngredientLine {
    RecipeIngredientLine {
        ingredient: ingredient.into(),
        amount: row.amount,
    }
}
