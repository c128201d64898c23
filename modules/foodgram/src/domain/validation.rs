use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::contract::model::{IngredientAmount, NewRecipe, NewUser, RecipePatch};
use crate::domain::error::DomainError;

pub const MIN_AMOUNT: i32 = 1;
pub const MAX_AMOUNT: i32 = 32_000;
pub const MIN_COOKING_TIME: i32 = 1;
pub const MAX_COOKING_TIME: i32 = 32_000;

pub const USERNAME_MAX_LEN: usize = 150;
pub const EMAIL_MAX_LEN: usize = 254;
pub const PERSON_NAME_MAX_LEN: usize = 150;
pub const RECIPE_NAME_MAX_LEN: usize = 256;

static USERNAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\w.@+-]+$").expect("static regex"));
static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("static regex"));

fn required_text(field: &str, value: &str, max_len: usize) -> Result<(), DomainError> {
    if value.trim().is_empty() {
        return Err(DomainError::validation(field, "This field may not be blank."));
    }
    if value.chars().count() > max_len {
        return Err(DomainError::validation(
            field,
            format!("Ensure this field has no more than {max_len} characters."),
        ));
    }
    Ok(())
}

fn in_range(field: &str, value: i32, min: i32, max: i32) -> Result<(), DomainError> {
    if !(min..=max).contains(&value) {
        return Err(DomainError::validation(
            field,
            format!("Value must be between {min} and {max}."),
        ));
    }
    Ok(())
}

pub fn validate_new_user(u: &NewUser) -> Result<(), DomainError> {
    required_text("username", &u.username, USERNAME_MAX_LEN)?;
    if !USERNAME_RE.is_match(&u.username) {
        return Err(DomainError::validation(
            "username",
            "Enter a valid username. It may contain only letters, digits and @/./+/-/_ characters.",
        ));
    }
    required_text("email", &u.email, EMAIL_MAX_LEN)?;
    if !EMAIL_RE.is_match(&u.email) {
        return Err(DomainError::validation("email", "Enter a valid email address."));
    }
    required_text("first_name", &u.first_name, PERSON_NAME_MAX_LEN)?;
    required_text("last_name", &u.last_name, PERSON_NAME_MAX_LEN)?;
    Ok(())
}

/// Checks the submitted ingredient list shape: non-empty, unique ids, amounts in range.
///
/// Catalog existence is checked separately against storage.
pub fn validate_ingredients(items: &[IngredientAmount]) -> Result<(), DomainError> {
    if items.is_empty() {
        return Err(DomainError::validation(
            "ingredients",
            "At least one ingredient is required.",
        ));
    }
    let mut seen = HashSet::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        if !seen.insert(item.ingredient_id) {
            return Err(DomainError::validation(
                format!("ingredients/{i}/id"),
                format!("Ingredient {} is listed more than once.", item.ingredient_id),
            ));
        }
        in_range(
            &format!("ingredients/{i}/amount"),
            item.amount,
            MIN_AMOUNT,
            MAX_AMOUNT,
        )?;
    }
    Ok(())
}

pub fn validate_new_recipe(r: &NewRecipe) -> Result<(), DomainError> {
    required_text("name", &r.name, RECIPE_NAME_MAX_LEN)?;
    if r.image.trim().is_empty() {
        return Err(DomainError::validation("image", "This field may not be blank."));
    }
    if r.text.trim().is_empty() {
        return Err(DomainError::validation("text", "This field may not be blank."));
    }
    in_range(
        "cooking_time",
        r.cooking_time,
        MIN_COOKING_TIME,
        MAX_COOKING_TIME,
    )?;
    validate_ingredients(&r.ingredients)
}

pub fn validate_recipe_patch(p: &RecipePatch) -> Result<(), DomainError> {
    if let Some(name) = &p.name {
        required_text("name", name, RECIPE_NAME_MAX_LEN)?;
    }
    if let Some(image) = &p.image {
        if image.trim().is_empty() {
            return Err(DomainError::validation("image", "This field may not be blank."));
        }
    }
    if let Some(text) = &p.text {
        if text.trim().is_empty() {
            return Err(DomainError::validation("text", "This field may not be blank."));
        }
    }
    if let Some(t) = p.cooking_time {
        in_range("cooking_time", t, MIN_COOKING_TIME, MAX_COOKING_TIME)?;
    }
    if let Some(items) = &p.ingredients {
        validate_ingredients(items)?;
    }
    Ok(())
}

/// Avatars are opaque references, like recipe images.
pub fn validate_avatar(avatar: &str) -> Result<(), DomainError> {
    if avatar.trim().is_empty() {
        return Err(DomainError::validation("avatar", "This field may not be blank."));
    }
    Ok(())
}
