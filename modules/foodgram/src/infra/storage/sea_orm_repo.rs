//! SeaORM-backed repository implementation for the domain port.
//!
//! Generic over the connection so it can run on a `DatabaseConnection` or
//! any other `ConnectionTrait + TransactionTrait` implementor. Multi-step
//! writes (user + profile, recipe + rows, reconciliation) open their own
//! transaction and touch only that connection.

use std::collections::{HashMap, HashSet};

use anyhow::Context;
use sea_orm::sea_query::{Expr, Func, LikeExpr, Query, SelectStatement};
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, ConnectionTrait, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, SqlErr, TransactionTrait,
};
use tracing::debug;

use crate::contract::model::{
    Identity, Ingredient, IngredientAmount, IngredientId, Membership, NewUser, PageRequest,
    Recipe, RecipeFilter, RecipeId, RecipeIngredientLine, RecipeSummary, User, UserId,
};
use crate::domain::reconcile::{plan_reconciliation, CurrentRow};
use crate::domain::repo::{CreateUserOutcome, FoodgramRepository, InsertOutcome, RecipeDraft};
use crate::infra::storage::entity::{
    auth_token, favorite, ingredient, profile, recipe, recipe_ingredient, shopping_cart_item,
    subscription, user,
};
use crate::infra::storage::mapper::ingredient_line;

/// SeaORM repository impl.
/// Holds a connection object; its lifetime/ownership is up to the caller.
pub struct SeaOrmFoodgramRepository<C>
where
    C: ConnectionTrait + TransactionTrait + Send + Sync,
{
    conn: C,
}

impl<C> SeaOrmFoodgramRepository<C>
where
    C: ConnectionTrait + TransactionTrait + Send + Sync,
{
    pub fn new(conn: C) -> Self {
        Self { conn }
    }
}

fn insert_outcome(res: Result<(), DbErr>, what: &'static str) -> anyhow::Result<InsertOutcome> {
    match res {
        Ok(()) => Ok(InsertOutcome::Inserted),
        Err(e) => match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => Ok(InsertOutcome::AlreadyExists),
            Some(SqlErr::ForeignKeyConstraintViolation(_)) => Ok(InsertOutcome::MissingReference),
            _ => Err(e).context(what),
        },
    }
}

/// `SELECT recipe_id FROM <favorites|shopping_cart_items> WHERE user_id = ?`
fn member_recipe_ids(kind: Membership, user_id: UserId) -> SelectStatement {
    match kind {
        Membership::Favorites => Query::select()
            .column(favorite::Column::RecipeId)
            .from(favorite::Entity)
            .and_where(favorite::Column::UserId.eq(user_id))
            .to_owned(),
        Membership::ShoppingCart => Query::select()
            .column(shopping_cart_item::Column::RecipeId)
            .from(shopping_cart_item::Entity)
            .and_where(shopping_cart_item::Column::UserId.eq(user_id))
            .to_owned(),
    }
}

/// Escape LIKE metacharacters so a user prefix matches literally.
fn like_prefix(prefix: &str) -> LikeExpr {
    let mut pattern = String::with_capacity(prefix.len() + 1);
    for ch in prefix.to_lowercase().chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    LikeExpr::new(pattern).escape('\\')
}

#[async_trait::async_trait]
impl<C> FoodgramRepository for SeaOrmFoodgramRepository<C>
where
    C: ConnectionTrait + TransactionTrait + Send + Sync + 'static,
{
    async fn resolve_token(&self, key: &str) -> anyhow::Result<Option<Identity>> {
        let found = auth_token::Entity::find_by_id(key.to_owned())
            .find_also_related(user::Entity)
            .one(&self.conn)
            .await
            .context("resolve_token failed")?;
        Ok(found
            .and_then(|(_, u)| u)
            .map(|u| Identity {
                user_id: u.id,
                is_admin: u.is_superuser,
            }))
    }

    async fn find_user(&self, id: UserId) -> anyhow::Result<Option<User>> {
        let found = user::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("find_user failed")?;
        Ok(found.map(Into::into))
    }

    async fn users_by_ids(&self, ids: &[UserId]) -> anyhow::Result<Vec<User>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = user::Entity::find()
            .filter(user::Column::Id.is_in(ids.iter().copied()))
            .order_by_asc(user::Column::Id)
            .all(&self.conn)
            .await
            .context("users_by_ids failed")?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn list_users(&self, page: PageRequest) -> anyhow::Result<(Vec<User>, u64)> {
        let count = user::Entity::find()
            .count(&self.conn)
            .await
            .context("count users failed")?;
        let rows = user::Entity::find()
            .order_by_asc(user::Column::Id)
            .limit(page.limit)
            .offset(page.offset())
            .all(&self.conn)
            .await
            .context("list_users failed")?;
        Ok((rows.into_iter().map(Into::into).collect(), count))
    }

    async fn username_exists(&self, username: &str) -> anyhow::Result<bool> {
        let count = user::Entity::find()
            .filter(user::Column::Username.eq(username))
            .count(&self.conn)
            .await
            .context("username_exists failed")?;
        Ok(count > 0)
    }

    async fn email_exists(&self, email: &str) -> anyhow::Result<bool> {
        let count = user::Entity::find()
            .filter(user::Column::Email.eq(email))
            .count(&self.conn)
            .await
            .context("email_exists failed")?;
        Ok(count > 0)
    }

    async fn create_user_with_profile(&self, u: NewUser) -> anyhow::Result<CreateUserOutcome> {
        let txn = self.conn.begin().await.context("begin failed")?;

        let inserted = user::ActiveModel {
            id: NotSet,
            username: Set(u.username),
            email: Set(u.email),
            first_name: Set(u.first_name),
            last_name: Set(u.last_name),
            is_superuser: Set(false),
        }
        .insert(&txn)
        .await;

        // Dropping `txn` without commit rolls it back.
        let created = match inserted {
            Ok(m) => m,
            Err(e) => {
                return match e.sql_err() {
                    Some(SqlErr::UniqueConstraintViolation(msg)) if msg.contains("username") => {
                        Ok(CreateUserOutcome::UsernameTaken)
                    }
                    Some(SqlErr::UniqueConstraintViolation(_)) => Ok(CreateUserOutcome::EmailTaken),
                    _ => Err(e).context("insert user failed"),
                }
            }
        };

        profile::ActiveModel {
            id: NotSet,
            user_id: Set(created.id),
            avatar: Set(None),
        }
        .insert(&txn)
        .await
        .context("insert profile failed")?;

        txn.commit().await.context("commit failed")?;
        Ok(CreateUserOutcome::Created(created.into()))
    }

    async fn avatars_for(&self, ids: &[UserId]) -> anyhow::Result<HashMap<UserId, String>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let rows = profile::Entity::find()
            .filter(profile::Column::UserId.is_in(ids.iter().copied()))
            .filter(profile::Column::Avatar.is_not_null())
            .all(&self.conn)
            .await
            .context("avatars_for failed")?;
        Ok(rows
            .into_iter()
            .filter_map(|p| p.avatar.map(|a| (p.user_id, a)))
            .collect())
    }

    async fn set_avatar(&self, user: UserId, avatar: Option<String>) -> anyhow::Result<()> {
        let existing = profile::Entity::find()
            .filter(profile::Column::UserId.eq(user))
            .one(&self.conn)
            .await
            .context("find profile failed")?;
        let m = profile::ActiveModel {
            id: existing.map_or(NotSet, |p| Set(p.id)),
            user_id: Set(user),
            avatar: Set(avatar),
        };
        if m.id.is_set() {
            let _ = m.update(&self.conn).await.context("update profile failed")?;
        } else {
            debug!(user_id = user, "profile missing, creating it");
            let _ = m.insert(&self.conn).await.context("insert profile failed")?;
        }
        Ok(())
    }

    async fn subscribed_among(
        &self,
        user_id: UserId,
        targets: &[UserId],
    ) -> anyhow::Result<HashSet<UserId>> {
        if targets.is_empty() {
            return Ok(HashSet::new());
        }
        let ids: Vec<i32> = subscription::Entity::find()
            .select_only()
            .column(subscription::Column::SubscribedToId)
            .filter(subscription::Column::UserId.eq(user_id))
            .filter(subscription::Column::SubscribedToId.is_in(targets.iter().copied()))
            .into_tuple()
            .all(&self.conn)
            .await
            .context("subscribed_among failed")?;
        Ok(ids.into_iter().collect())
    }

    async fn insert_subscription(
        &self,
        user_id: UserId,
        target: UserId,
    ) -> anyhow::Result<InsertOutcome> {
        let res = subscription::ActiveModel {
            id: NotSet,
            user_id: Set(user_id),
            subscribed_to_id: Set(target),
        }
        .insert(&self.conn)
        .await
        .map(|_| ());
        insert_outcome(res, "insert subscription failed")
    }

    async fn delete_subscription(&self, user_id: UserId, target: UserId) -> anyhow::Result<bool> {
        let res = subscription::Entity::delete_many()
            .filter(subscription::Column::UserId.eq(user_id))
            .filter(subscription::Column::SubscribedToId.eq(target))
            .exec(&self.conn)
            .await
            .context("delete subscription failed")?;
        Ok(res.rows_affected > 0)
    }

    async fn list_subscriptions(
        &self,
        user_id: UserId,
        page: PageRequest,
    ) -> anyhow::Result<(Vec<User>, u64)> {
        let followed = Query::select()
            .column(subscription::Column::SubscribedToId)
            .from(subscription::Entity)
            .and_where(subscription::Column::UserId.eq(user_id))
            .to_owned();
        let query = user::Entity::find().filter(user::Column::Id.in_subquery(followed));

        let count = query
            .clone()
            .count(&self.conn)
            .await
            .context("count subscriptions failed")?;
        let rows = query
            .order_by_asc(user::Column::Id)
            .limit(page.limit)
            .offset(page.offset())
            .all(&self.conn)
            .await
            .context("list_subscriptions failed")?;
        Ok((rows.into_iter().map(Into::into).collect(), count))
    }

    async fn list_ingredients(&self, name_prefix: Option<&str>) -> anyhow::Result<Vec<Ingredient>> {
        let mut query = ingredient::Entity::find();
        if let Some(prefix) = name_prefix {
            query = query.filter(
                Expr::expr(Func::lower(Expr::col(ingredient::Column::Name)))
                    .like(like_prefix(prefix)),
            );
        }
        let rows = query
            .order_by_asc(ingredient::Column::Name)
            .order_by_asc(ingredient::Column::Id)
            .all(&self.conn)
            .await
            .context("list_ingredients failed")?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn find_ingredient(&self, id: IngredientId) -> anyhow::Result<Option<Ingredient>> {
        let found = ingredient::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("find_ingredient failed")?;
        Ok(found.map(Into::into))
    }

    async fn existing_ingredient_ids(
        &self,
        ids: &[IngredientId],
    ) -> anyhow::Result<HashSet<IngredientId>> {
        if ids.is_empty() {
            return Ok(HashSet::new());
        }
        let found: Vec<i32> = ingredient::Entity::find()
            .select_only()
            .column(ingredient::Column::Id)
            .filter(ingredient::Column::Id.is_in(ids.iter().copied()))
            .into_tuple()
            .all(&self.conn)
            .await
            .context("existing_ingredient_ids failed")?;
        Ok(found.into_iter().collect())
    }

    async fn find_recipe(&self, id: RecipeId) -> anyhow::Result<Option<Recipe>> {
        let found = recipe::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("find_recipe failed")?;
        Ok(found.map(Into::into))
    }

    async fn list_recipes(
        &self,
        filter: &RecipeFilter,
        viewer: Option<UserId>,
        page: PageRequest,
    ) -> anyhow::Result<(Vec<Recipe>, u64)> {
        let mut query = recipe::Entity::find();
        if let Some(author) = filter.author {
            query = query.filter(recipe::Column::AuthorId.eq(author));
        }
        for (wanted, kind) in [
            (filter.favorited_only, Membership::Favorites),
            (filter.in_cart_only, Membership::ShoppingCart),
        ] {
            if !wanted {
                continue;
            }
            let Some(viewer) = viewer else {
                return Ok((Vec::new(), 0));
            };
            query = query.filter(recipe::Column::Id.in_subquery(member_recipe_ids(kind, viewer)));
        }

        let count = query
            .clone()
            .count(&self.conn)
            .await
            .context("count recipes failed")?;
        let rows = query
            .order_by_desc(recipe::Column::DatePosted)
            .order_by_desc(recipe::Column::Id)
            .limit(page.limit)
            .offset(page.offset())
            .all(&self.conn)
            .await
            .context("list_recipes failed")?;
        Ok((rows.into_iter().map(Into::into).collect(), count))
    }

    async fn recent_recipes(
        &self,
        author: UserId,
        limit: Option<u64>,
    ) -> anyhow::Result<Vec<RecipeSummary>> {
        let mut query = recipe::Entity::find()
            .filter(recipe::Column::AuthorId.eq(author))
            .order_by_desc(recipe::Column::DatePosted)
            .order_by_desc(recipe::Column::Id);
        if let Some(limit) = limit {
            query = query.limit(limit);
        }
        let rows = query
            .all(&self.conn)
            .await
            .context("recent_recipes failed")?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn count_recipes(&self, author: UserId) -> anyhow::Result<u64> {
        recipe::Entity::find()
            .filter(recipe::Column::AuthorId.eq(author))
            .count(&self.conn)
            .await
            .context("count_recipes failed")
    }

    async fn ingredient_lines_for(
        &self,
        recipes: &[RecipeId],
    ) -> anyhow::Result<HashMap<RecipeId, Vec<RecipeIngredientLine>>> {
        if recipes.is_empty() {
            return Ok(HashMap::new());
        }
        let rows = recipe_ingredient::Entity::find()
            .filter(recipe_ingredient::Column::RecipeId.is_in(recipes.iter().copied()))
            .find_also_related(ingredient::Entity)
            .order_by_asc(ingredient::Column::Name)
            .order_by_asc(recipe_ingredient::Column::Id)
            .all(&self.conn)
            .await
            .context("ingredient_lines_for failed")?;

        let mut out: HashMap<RecipeId, Vec<RecipeIngredientLine>> = HashMap::new();
        for (row, ing) in rows {
            if let Some(ing) = ing {
                out.entry(row.recipe_id)
                    .or_default()
                    .push(ingredient_line(&row, ing));
            }
        }
        Ok(out)
    }

    async fn insert_recipe(
        &self,
        draft: RecipeDraft,
        ingredients: &[IngredientAmount],
    ) -> anyhow::Result<Recipe> {
        let txn = self.conn.begin().await.context("begin failed")?;

        let created = recipe::ActiveModel {
            id: NotSet,
            author_id: Set(draft.author_id),
            name: Set(draft.name),
            image: Set(draft.image),
            cooking_time: Set(draft.cooking_time),
            text: Set(draft.text),
            date_posted: Set(draft.date_posted),
        }
        .insert(&txn)
        .await
        .context("insert recipe failed")?;

        if !ingredients.is_empty() {
            let rows = ingredients.iter().map(|i| recipe_ingredient::ActiveModel {
                id: NotSet,
                recipe_id: Set(created.id),
                ingredient_id: Set(i.ingredient_id),
                amount: Set(i.amount),
            });
            recipe_ingredient::Entity::insert_many(rows)
                .exec(&txn)
                .await
                .context("insert recipe ingredients failed")?;
        }

        txn.commit().await.context("commit failed")?;
        Ok(created.into())
    }

    async fn update_recipe(
        &self,
        r: &Recipe,
        ingredients: Option<&[IngredientAmount]>,
    ) -> anyhow::Result<()> {
        let txn = self.conn.begin().await.context("begin failed")?;

        recipe::ActiveModel {
            id: Set(r.id),
            author_id: Set(r.author_id),
            name: Set(r.name.clone()),
            image: Set(r.image.clone()),
            cooking_time: Set(r.cooking_time),
            text: Set(r.text.clone()),
            date_posted: Set(r.date_posted),
        }
        .update(&txn)
        .await
        .context("update recipe failed")?;

        if let Some(desired) = ingredients {
            let current: Vec<CurrentRow> = recipe_ingredient::Entity::find()
                .filter(recipe_ingredient::Column::RecipeId.eq(r.id))
                .all(&txn)
                .await
                .context("load recipe ingredients failed")?
                .iter()
                .map(CurrentRow::from)
                .collect();

            let plan = plan_reconciliation(&current, desired);
            debug!(
                recipe_id = r.id,
                inserts = plan.inserts.len(),
                updates = plan.updates.len(),
                deletes = plan.deletes.len(),
                "reconciling recipe ingredients"
            );

            if !plan.deletes.is_empty() {
                recipe_ingredient::Entity::delete_many()
                    .filter(recipe_ingredient::Column::Id.is_in(plan.deletes.iter().copied()))
                    .exec(&txn)
                    .await
                    .context("delete recipe ingredients failed")?;
            }
            for u in &plan.updates {
                recipe_ingredient::ActiveModel {
                    id: Set(u.row_id),
                    amount: Set(u.amount),
                    ..Default::default()
                }
                .update(&txn)
                .await
                .context("update recipe ingredient failed")?;
            }
            if !plan.inserts.is_empty() {
                let rows = plan.inserts.iter().map(|i| recipe_ingredient::ActiveModel {
                    id: NotSet,
                    recipe_id: Set(r.id),
                    ingredient_id: Set(i.ingredient_id),
                    amount: Set(i.amount),
                });
                recipe_ingredient::Entity::insert_many(rows)
                    .exec(&txn)
                    .await
                    .context("insert recipe ingredients failed")?;
            }
        }

        txn.commit().await.context("commit failed")?;
        Ok(())
    }

    async fn delete_recipe(&self, id: RecipeId) -> anyhow::Result<bool> {
        let res = recipe::Entity::delete_by_id(id)
            .exec(&self.conn)
            .await
            .context("delete_recipe failed")?;
        Ok(res.rows_affected > 0)
    }

    async fn insert_membership(
        &self,
        kind: Membership,
        user_id: UserId,
        recipe_id: RecipeId,
    ) -> anyhow::Result<InsertOutcome> {
        let res = match kind {
            Membership::Favorites => favorite::ActiveModel {
                id: NotSet,
                user_id: Set(user_id),
                recipe_id: Set(recipe_id),
            }
            .insert(&self.conn)
            .await
            .map(|_| ()),
            Membership::ShoppingCart => shopping_cart_item::ActiveModel {
                id: NotSet,
                user_id: Set(user_id),
                recipe_id: Set(recipe_id),
            }
            .insert(&self.conn)
            .await
            .map(|_| ()),
        };
        insert_outcome(res, "insert membership failed")
    }

    async fn delete_membership(
        &self,
        kind: Membership,
        user_id: UserId,
        recipe_id: RecipeId,
    ) -> anyhow::Result<bool> {
        let res = match kind {
            Membership::Favorites => {
                favorite::Entity::delete_many()
                    .filter(favorite::Column::UserId.eq(user_id))
                    .filter(favorite::Column::RecipeId.eq(recipe_id))
                    .exec(&self.conn)
                    .await
            }
            Membership::ShoppingCart => {
                shopping_cart_item::Entity::delete_many()
                    .filter(shopping_cart_item::Column::UserId.eq(user_id))
                    .filter(shopping_cart_item::Column::RecipeId.eq(recipe_id))
                    .exec(&self.conn)
                    .await
            }
        }
        .context("delete membership failed")?;
        Ok(res.rows_affected > 0)
    }

    async fn memberships_among(
        &self,
        kind: Membership,
        user_id: UserId,
        recipes: &[RecipeId],
    ) -> anyhow::Result<HashSet<RecipeId>> {
        if recipes.is_empty() {
            return Ok(HashSet::new());
        }
        let ids: Vec<i32> = recipe::Entity::find()
            .select_only()
            .column(recipe::Column::Id)
            .filter(recipe::Column::Id.is_in(recipes.iter().copied()))
            .filter(recipe::Column::Id.in_subquery(member_recipe_ids(kind, user_id)))
            .into_tuple()
            .all(&self.conn)
            .await
            .context("memberships_among failed")?;
        Ok(ids.into_iter().collect())
    }

    async fn cart_ingredient_rows(
        &self,
        user_id: UserId,
    ) -> anyhow::Result<Vec<RecipeIngredientLine>> {
        let rows = recipe_ingredient::Entity::find()
            .filter(
                recipe_ingredient::Column::RecipeId
                    .in_subquery(member_recipe_ids(Membership::ShoppingCart, user_id)),
            )
            .find_also_related(ingredient::Entity)
            .all(&self.conn)
            .await
            .context("cart_ingredient_rows failed")?;
        debug!(rows = rows.len(), "loaded cart ingredient rows");

        Ok(rows
            .into_iter()
            .filter_map(|(row, ing)| ing.map(|ing| ingredient_line(&row, ing)))
            .collect())
    }
}
