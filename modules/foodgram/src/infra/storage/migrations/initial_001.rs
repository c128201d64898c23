use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    Username,
    Email,
    FirstName,
    LastName,
    IsSuperuser,
}

#[derive(DeriveIden)]
enum Profiles {
    Table,
    Id,
    UserId,
    Avatar,
}

#[derive(DeriveIden)]
enum AuthTokens {
    Table,
    Key,
    UserId,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Ingredients {
    Table,
    Id,
    Name,
    MeasurementUnit,
}

#[derive(DeriveIden)]
enum Recipes {
    Table,
    Id,
    AuthorId,
    Name,
    Image,
    CookingTime,
    Text,
    DatePosted,
}

#[derive(DeriveIden)]
enum RecipeIngredients {
    Table,
    Id,
    RecipeId,
    IngredientId,
    Amount,
}

#[derive(DeriveIden, Clone, Copy)]
enum Favorites {
    Table,
    Id,
    UserId,
    RecipeId,
}

#[derive(DeriveIden, Clone, Copy)]
enum ShoppingCartItems {
    Table,
    Id,
    UserId,
    RecipeId,
}

#[derive(DeriveIden)]
enum Subscriptions {
    Table,
    Id,
    UserId,
    SubscribedToId,
}

fn pk(col: impl IntoIden + 'static) -> ColumnDef {
    ColumnDef::new(col)
        .integer()
        .not_null()
        .auto_increment()
        .primary_key()
        .to_owned()
}

fn fk_int(col: impl IntoIden + 'static) -> ColumnDef {
    ColumnDef::new(col).integer().not_null().to_owned()
}

fn cascade(
    name: &str,
    from: (impl IntoIden + 'static, impl IntoIden + 'static),
    to: (impl IntoIden + 'static, impl IntoIden + 'static),
) -> ForeignKeyCreateStatement {
    ForeignKey::create()
        .name(name)
        .from(from.0, from.1)
        .to(to.0, to.1)
        .on_delete(ForeignKeyAction::Cascade)
        .to_owned()
}

/// Membership tables (favorites, cart) share one shape.
fn membership_table(
    table: impl IntoIden + Clone + 'static,
    id: impl IntoIden + 'static,
    user_id: impl IntoIden + Clone + 'static,
    recipe_id: impl IntoIden + Clone + 'static,
    prefix: &str,
) -> TableCreateStatement {
    Table::create()
        .table(table.clone())
        .if_not_exists()
        .col(pk(id))
        .col(fk_int(user_id.clone()))
        .col(fk_int(recipe_id.clone()))
        .foreign_key(&mut cascade(
            &format!("fk_{prefix}_user"),
            (table.clone(), user_id),
            (Users::Table, Users::Id),
        ))
        .foreign_key(&mut cascade(
            &format!("fk_{prefix}_recipe"),
            (table, recipe_id),
            (Recipes::Table, Recipes::Id),
        ))
        .to_owned()
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(pk(Users::Id))
                    .col(
                        ColumnDef::new(Users::Username)
                            .string_len(150)
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(Users::Email)
                            .string_len(254)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Users::FirstName).string_len(150).not_null())
                    .col(ColumnDef::new(Users::LastName).string_len(150).not_null())
                    .col(
                        ColumnDef::new(Users::IsSuperuser)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Profiles::Table)
                    .if_not_exists()
                    .col(pk(Profiles::Id))
                    .col(fk_int(Profiles::UserId).unique_key().to_owned())
                    .col(ColumnDef::new(Profiles::Avatar).text().null())
                    .foreign_key(&mut cascade(
                        "fk_profiles_user",
                        (Profiles::Table, Profiles::UserId),
                        (Users::Table, Users::Id),
                    ))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(AuthTokens::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AuthTokens::Key)
                            .string_len(64)
                            .not_null()
                            .primary_key(),
                    )
                    .col(fk_int(AuthTokens::UserId))
                    .col(
                        ColumnDef::new(AuthTokens::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(&mut cascade(
                        "fk_auth_tokens_user",
                        (AuthTokens::Table, AuthTokens::UserId),
                        (Users::Table, Users::Id),
                    ))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Ingredients::Table)
                    .if_not_exists()
                    .col(pk(Ingredients::Id))
                    .col(ColumnDef::new(Ingredients::Name).string_len(128).not_null())
                    .col(
                        ColumnDef::new(Ingredients::MeasurementUnit)
                            .string_len(64)
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_ingredients_name")
                    .table(Ingredients::Table)
                    .col(Ingredients::Name)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Recipes::Table)
                    .if_not_exists()
                    .col(pk(Recipes::Id))
                    .col(fk_int(Recipes::AuthorId))
                    .col(ColumnDef::new(Recipes::Name).string_len(256).not_null())
                    .col(ColumnDef::new(Recipes::Image).text().not_null())
                    .col(ColumnDef::new(Recipes::CookingTime).integer().not_null())
                    .col(ColumnDef::new(Recipes::Text).text().not_null())
                    .col(
                        ColumnDef::new(Recipes::DatePosted)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(&mut cascade(
                        "fk_recipes_author",
                        (Recipes::Table, Recipes::AuthorId),
                        (Users::Table, Users::Id),
                    ))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_recipes_date_posted")
                    .table(Recipes::Table)
                    .col(Recipes::DatePosted)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(RecipeIngredients::Table)
                    .if_not_exists()
                    .col(pk(RecipeIngredients::Id))
                    .col(fk_int(RecipeIngredients::RecipeId))
                    .col(fk_int(RecipeIngredients::IngredientId))
                    .col(ColumnDef::new(RecipeIngredients::Amount).integer().not_null())
                    .foreign_key(&mut cascade(
                        "fk_recipe_ingredients_recipe",
                        (RecipeIngredients::Table, RecipeIngredients::RecipeId),
                        (Recipes::Table, Recipes::Id),
                    ))
                    .foreign_key(&mut cascade(
                        "fk_recipe_ingredients_ingredient",
                        (RecipeIngredients::Table, RecipeIngredients::IngredientId),
                        (Ingredients::Table, Ingredients::Id),
                    ))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("ux_recipe_ingredients_pair")
                    .table(RecipeIngredients::Table)
                    .col(RecipeIngredients::RecipeId)
                    .col(RecipeIngredients::IngredientId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(membership_table(
                Favorites::Table,
                Favorites::Id,
                Favorites::UserId,
                Favorites::RecipeId,
                "favorites",
            ))
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("ux_favorites_pair")
                    .table(Favorites::Table)
                    .col(Favorites::UserId)
                    .col(Favorites::RecipeId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(membership_table(
                ShoppingCartItems::Table,
                ShoppingCartItems::Id,
                ShoppingCartItems::UserId,
                ShoppingCartItems::RecipeId,
                "shopping_cart_items",
            ))
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("ux_shopping_cart_items_pair")
                    .table(ShoppingCartItems::Table)
                    .col(ShoppingCartItems::UserId)
                    .col(ShoppingCartItems::RecipeId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Subscriptions::Table)
                    .if_not_exists()
                    .col(pk(Subscriptions::Id))
                    .col(fk_int(Subscriptions::UserId))
                    .col(fk_int(Subscriptions::SubscribedToId))
                    .foreign_key(&mut cascade(
                        "fk_subscriptions_user",
                        (Subscriptions::Table, Subscriptions::UserId),
                        (Users::Table, Users::Id),
                    ))
                    .foreign_key(&mut cascade(
                        "fk_subscriptions_author",
                        (Subscriptions::Table, Subscriptions::SubscribedToId),
                        (Users::Table, Users::Id),
                    ))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("ux_subscriptions_pair")
                    .table(Subscriptions::Table)
                    .col(Subscriptions::UserId)
                    .col(Subscriptions::SubscribedToId)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for table in [
            Subscriptions::Table.into_iden(),
            ShoppingCartItems::Table.into_iden(),
            Favorites::Table.into_iden(),
            RecipeIngredients::Table.into_iden(),
            Recipes::Table.into_iden(),
            Ingredients::Table.into_iden(),
            AuthTokens::Table.into_iden(),
            Profiles::Table.into_iden(),
            Users::Table.into_iden(),
        ] {
            manager
                .drop_table(Table::drop().table(table).if_exists().to_owned())
                .await?;
        }
        Ok(())
    }
}
