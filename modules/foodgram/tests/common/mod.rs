#![allow(dead_code)]

use std::sync::Arc;

use chrono::{Duration, Utc};
use sea_orm::{ActiveModelTrait, ConnectOptions, Database, DatabaseConnection, Set};
use sea_orm_migration::MigratorTrait;

use foodgram::domain::service::{Service, ServiceConfig};
use foodgram::infra::storage::entity::{
    auth_token, favorite, ingredient, profile, recipe, recipe_ingredient, shopping_cart_item,
    subscription, user,
};
use foodgram::infra::storage::migrations::Migrator;
use foodgram::infra::storage::sea_orm_repo::SeaOrmFoodgramRepository;
use foodgram::model::Identity;

/// Fresh in-memory SQLite database with the schema applied.
pub async fn create_test_db() -> DatabaseConnection {
    let mut opts = ConnectOptions::new("sqlite::memory:");
    opts.max_connections(1).sqlx_logging(false);
    let db = Database::connect(opts)
        .await
        .expect("Failed to connect to test database");
    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");
    db
}

pub fn service_for(db: &DatabaseConnection) -> Service {
    let repo = SeaOrmFoodgramRepository::new(db.clone());
    Service::new(Arc::new(repo), ServiceConfig::default())
}

/// Token key issued to every seeded user.
pub fn token_for(username: &str) -> String {
    format!("token-{username}")
}

pub struct Seeded {
    pub id: i32,
    pub identity: Identity,
    pub token: String,
}

pub async fn seed_user(db: &DatabaseConnection, username: &str, is_admin: bool) -> Seeded {
    let u = user::ActiveModel {
        username: Set(username.to_owned()),
        email: Set(format!("{username}@example.com")),
        first_name: Set(format!("{username}-first")),
        last_name: Set(format!("{username}-last")),
        is_superuser: Set(is_admin),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("insert user");

    profile::ActiveModel {
        user_id: Set(u.id),
        avatar: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("insert profile");

    let token = token_for(username);
    auth_token::ActiveModel {
        key: Set(token.clone()),
        user_id: Set(u.id),
        created_at: Set(Utc::now()),
    }
    .insert(db)
    .await
    .expect("insert token");

    Seeded {
        id: u.id,
        identity: Identity {
            user_id: u.id,
            is_admin,
        },
        token,
    }
}

pub async fn seed_ingredient(db: &DatabaseConnection, name: &str, unit: &str) -> i32 {
    ingredient::ActiveModel {
        name: Set(name.to_owned()),
        measurement_unit: Set(unit.to_owned()),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("insert ingredient")
    .id
}

/// Insert a recipe directly; `age_minutes` pushes `date_posted` into the past.
pub async fn seed_recipe(
    db: &DatabaseConnection,
    author_id: i32,
    name: &str,
    lines: &[(i32, i32)],
    age_minutes: i64,
) -> i32 {
    let r = recipe::ActiveModel {
        author_id: Set(author_id),
        name: Set(name.to_owned()),
        image: Set("data:image/png;base64,AAAA".to_owned()),
        cooking_time: Set(10),
        text: Set(format!("How to cook {name}")),
        date_posted: Set(Utc::now() - Duration::minutes(age_minutes)),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("insert recipe");

    for (ingredient_id, amount) in lines {
        recipe_ingredient::ActiveModel {
            recipe_id: Set(r.id),
            ingredient_id: Set(*ingredient_id),
            amount: Set(*amount),
            ..Default::default()
        }
        .insert(db)
        .await
        .expect("insert recipe ingredient");
    }
    r.id
}

pub async fn seed_favorite(db: &DatabaseConnection, user_id: i32, recipe_id: i32) {
    favorite::ActiveModel {
        user_id: Set(user_id),
        recipe_id: Set(recipe_id),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("insert favorite");
}

pub async fn seed_cart_item(db: &DatabaseConnection, user_id: i32, recipe_id: i32) {
    shopping_cart_item::ActiveModel {
        user_id: Set(user_id),
        recipe_id: Set(recipe_id),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("insert cart item");
}

pub async fn seed_subscription(db: &DatabaseConnection, user_id: i32, author_id: i32) {
    subscription::ActiveModel {
        user_id: Set(user_id),
        subscribed_to_id: Set(author_id),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("insert subscription");
}
