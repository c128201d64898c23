use std::sync::Arc;

use axum::{
    http::{header, HeaderMap, StatusCode, Uri},
    response::{IntoResponse, Json, Redirect},
    Extension,
};
use tracing::{debug, info};

use crate::api::rest::auth::{CurrentUser, MaybeUser};
use crate::api::rest::dto::{
    AvatarDto, CreateRecipeReq, CreateUserReq, CreatedUserDto, IngredientDto, IngredientSearchQuery,
    PageQuery, Paginated, RecipeDto, RecipeListQuery, RecipeMinifiedDto, RecipesLimitQuery,
    ShortLinkDto, SubscriptionsQuery, UpdateRecipeReq, UserDto, UserWithRecipesDto,
};
use crate::api::rest::error::map_domain_error;
use crate::api::rest::extract::{JsonBody, PathParam, QueryParams};
use crate::api::rest::problem::{Problem, ProblemResponse};
use crate::contract::model::Membership;
use crate::domain::error::DomainError;
use crate::domain::service::Service;
use crate::domain::shopping_list;

type Svc = Extension<Arc<Service>>;

pub const SHOPPING_LIST_FILENAME: &str = "Shopping list.txt";

fn fail(e: DomainError, uri: &Uri) -> ProblemResponse {
    debug!(error = %e, path = uri.path(), "request failed");
    map_domain_error(&e, uri.path())
}

/// `http://<host>` of the incoming request.
fn request_origin(headers: &HeaderMap) -> String {
    let host = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("localhost");
    format!("http://{host}")
}

// --- users ---

#[utoipa::path(
    get,
    path = "/api/users/",
    params(PageQuery),
    responses((status = 200, description = "Users ordered by id", body = Paginated<UserDto>)),
    tag = "users"
)]
pub async fn list_users(
    Extension(svc): Svc,
    MaybeUser(viewer): MaybeUser,
    QueryParams(q): QueryParams<PageQuery>,
    headers: HeaderMap,
    uri: Uri,
) -> Result<Json<Paginated<UserDto>>, ProblemResponse> {
    let page = svc.page_request(q.page, q.limit).map_err(|e| fail(e, &uri))?;
    let users = svc
        .list_users(viewer, page)
        .await
        .map_err(|e| fail(e, &uri))?;
    Ok(Json(Paginated::from_page(
        users,
        &request_origin(&headers),
        &uri,
    )))
}

#[utoipa::path(
    post,
    path = "/api/users/",
    request_body = CreateUserReq,
    responses(
        (status = 201, body = CreatedUserDto),
        (status = 400, body = Problem)
    ),
    tag = "users"
)]
pub async fn create_user(
    Extension(svc): Svc,
    uri: Uri,
    JsonBody(req): JsonBody<CreateUserReq>,
) -> Result<(StatusCode, Json<CreatedUserDto>), ProblemResponse> {
    info!(username = %req.username, "Creating user");
    let user = svc
        .create_user(req.into())
        .await
        .map_err(|e| fail(e, &uri))?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

#[utoipa::path(
    get,
    path = "/api/users/{id}/",
    params(("id" = i32, Path, description = "User id")),
    responses(
        (status = 200, body = UserDto),
        (status = 404, body = Problem)
    ),
    tag = "users"
)]
pub async fn get_user(
    Extension(svc): Svc,
    MaybeUser(viewer): MaybeUser,
    PathParam(id): PathParam<i32>,
    uri: Uri,
) -> Result<Json<UserDto>, ProblemResponse> {
    let card = svc.get_user(viewer, id).await.map_err(|e| fail(e, &uri))?;
    Ok(Json(card.into()))
}

#[utoipa::path(
    get,
    path = "/api/users/me/",
    responses(
        (status = 200, body = UserDto),
        (status = 401, body = Problem)
    ),
    security(("token" = [])),
    tag = "users"
)]
pub async fn me(
    Extension(svc): Svc,
    CurrentUser(identity): CurrentUser,
    uri: Uri,
) -> Result<Json<UserDto>, ProblemResponse> {
    let card = svc.me(identity).await.map_err(|e| fail(e, &uri))?;
    Ok(Json(card.into()))
}

#[utoipa::path(
    put,
    path = "/api/users/me/avatar/",
    request_body = AvatarDto,
    responses(
        (status = 200, body = AvatarDto),
        (status = 400, body = Problem),
        (status = 401, body = Problem)
    ),
    security(("token" = [])),
    tag = "users"
)]
pub async fn set_avatar(
    Extension(svc): Svc,
    CurrentUser(identity): CurrentUser,
    uri: Uri,
    JsonBody(req): JsonBody<AvatarDto>,
) -> Result<Json<AvatarDto>, ProblemResponse> {
    let avatar = svc
        .set_avatar(identity, req.avatar)
        .await
        .map_err(|e| fail(e, &uri))?;
    Ok(Json(AvatarDto { avatar }))
}

#[utoipa::path(
    delete,
    path = "/api/users/me/avatar/",
    responses(
        (status = 204, description = "Avatar cleared"),
        (status = 401, body = Problem)
    ),
    security(("token" = [])),
    tag = "users"
)]
pub async fn clear_avatar(
    Extension(svc): Svc,
    CurrentUser(identity): CurrentUser,
    uri: Uri,
) -> Result<StatusCode, ProblemResponse> {
    svc.clear_avatar(identity).await.map_err(|e| fail(e, &uri))?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/users/subscriptions/",
    params(SubscriptionsQuery),
    responses(
        (status = 200, body = Paginated<UserWithRecipesDto>),
        (status = 401, body = Problem)
    ),
    security(("token" = [])),
    tag = "users"
)]
pub async fn list_subscriptions(
    Extension(svc): Svc,
    CurrentUser(identity): CurrentUser,
    QueryParams(q): QueryParams<SubscriptionsQuery>,
    headers: HeaderMap,
    uri: Uri,
) -> Result<Json<Paginated<UserWithRecipesDto>>, ProblemResponse> {
    let page = svc.page_request(q.page, q.limit).map_err(|e| fail(e, &uri))?;
    let authors = svc
        .list_subscriptions(identity, page, q.recipes_limit)
        .await
        .map_err(|e| fail(e, &uri))?;
    Ok(Json(Paginated::from_page(
        authors,
        &request_origin(&headers),
        &uri,
    )))
}

#[utoipa::path(
    post,
    path = "/api/users/{id}/subscribe/",
    params(("id" = i32, Path, description = "Author id"), RecipesLimitQuery),
    responses(
        (status = 201, body = UserWithRecipesDto),
        (status = 400, body = Problem),
        (status = 401, body = Problem),
        (status = 404, body = Problem)
    ),
    security(("token" = [])),
    tag = "users"
)]
pub async fn subscribe(
    Extension(svc): Svc,
    CurrentUser(identity): CurrentUser,
    PathParam(id): PathParam<i32>,
    QueryParams(q): QueryParams<RecipesLimitQuery>,
    uri: Uri,
) -> Result<(StatusCode, Json<UserWithRecipesDto>), ProblemResponse> {
    let author = svc
        .subscribe(identity, id, q.recipes_limit)
        .await
        .map_err(|e| fail(e, &uri))?;
    Ok((StatusCode::CREATED, Json(author.into())))
}

#[utoipa::path(
    delete,
    path = "/api/users/{id}/subscribe/",
    params(("id" = i32, Path, description = "Author id")),
    responses(
        (status = 204, description = "Unsubscribed"),
        (status = 400, body = Problem),
        (status = 401, body = Problem),
        (status = 404, body = Problem)
    ),
    security(("token" = [])),
    tag = "users"
)]
pub async fn unsubscribe(
    Extension(svc): Svc,
    CurrentUser(identity): CurrentUser,
    PathParam(id): PathParam<i32>,
    uri: Uri,
) -> Result<StatusCode, ProblemResponse> {
    svc.unsubscribe(identity, id)
        .await
        .map_err(|e| fail(e, &uri))?;
    Ok(StatusCode::NO_CONTENT)
}

// --- ingredients ---

#[utoipa::path(
    get,
    path = "/api/ingredients/",
    params(IngredientSearchQuery),
    responses((status = 200, body = Vec<IngredientDto>)),
    tag = "ingredients"
)]
pub async fn list_ingredients(
    Extension(svc): Svc,
    QueryParams(q): QueryParams<IngredientSearchQuery>,
    uri: Uri,
) -> Result<Json<Vec<IngredientDto>>, ProblemResponse> {
    let items = svc
        .list_ingredients(q.name.as_deref())
        .await
        .map_err(|e| fail(e, &uri))?;
    Ok(Json(items.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    get,
    path = "/api/ingredients/{id}/",
    params(("id" = i32, Path, description = "Ingredient id")),
    responses(
        (status = 200, body = IngredientDto),
        (status = 404, body = Problem)
    ),
    tag = "ingredients"
)]
pub async fn get_ingredient(
    Extension(svc): Svc,
    PathParam(id): PathParam<i32>,
    uri: Uri,
) -> Result<Json<IngredientDto>, ProblemResponse> {
    let item = svc.get_ingredient(id).await.map_err(|e| fail(e, &uri))?;
    Ok(Json(item.into()))
}

// --- recipes ---

#[utoipa::path(
    get,
    path = "/api/recipes/",
    params(RecipeListQuery),
    responses((status = 200, description = "Newest first", body = Paginated<RecipeDto>)),
    tag = "recipes"
)]
pub async fn list_recipes(
    Extension(svc): Svc,
    MaybeUser(viewer): MaybeUser,
    QueryParams(q): QueryParams<RecipeListQuery>,
    headers: HeaderMap,
    uri: Uri,
) -> Result<Json<Paginated<RecipeDto>>, ProblemResponse> {
    let page = svc.page_request(q.page, q.limit).map_err(|e| fail(e, &uri))?;
    let recipes = svc
        .list_recipes(viewer, q.filter(), page)
        .await
        .map_err(|e| fail(e, &uri))?;
    Ok(Json(Paginated::from_page(
        recipes,
        &request_origin(&headers),
        &uri,
    )))
}

#[utoipa::path(
    post,
    path = "/api/recipes/",
    request_body = CreateRecipeReq,
    responses(
        (status = 201, body = RecipeDto),
        (status = 400, body = Problem),
        (status = 401, body = Problem)
    ),
    security(("token" = [])),
    tag = "recipes"
)]
pub async fn create_recipe(
    Extension(svc): Svc,
    CurrentUser(identity): CurrentUser,
    uri: Uri,
    JsonBody(req): JsonBody<CreateRecipeReq>,
) -> Result<(StatusCode, Json<RecipeDto>), ProblemResponse> {
    info!(name = %req.name, "Creating recipe");
    let details = svc
        .create_recipe(identity, req.into())
        .await
        .map_err(|e| fail(e, &uri))?;
    Ok((StatusCode::CREATED, Json(details.into())))
}

#[utoipa::path(
    get,
    path = "/api/recipes/{id}/",
    params(("id" = i32, Path, description = "Recipe id")),
    responses(
        (status = 200, body = RecipeDto),
        (status = 404, body = Problem)
    ),
    tag = "recipes"
)]
pub async fn get_recipe(
    Extension(svc): Svc,
    MaybeUser(viewer): MaybeUser,
    PathParam(id): PathParam<i32>,
    uri: Uri,
) -> Result<Json<RecipeDto>, ProblemResponse> {
    let details = svc.get_recipe(viewer, id).await.map_err(|e| fail(e, &uri))?;
    Ok(Json(details.into()))
}

#[utoipa::path(
    patch,
    path = "/api/recipes/{id}/",
    params(("id" = i32, Path, description = "Recipe id")),
    request_body = UpdateRecipeReq,
    responses(
        (status = 200, body = RecipeDto),
        (status = 400, body = Problem),
        (status = 401, body = Problem),
        (status = 403, body = Problem),
        (status = 404, body = Problem)
    ),
    security(("token" = [])),
    tag = "recipes"
)]
pub async fn update_recipe(
    Extension(svc): Svc,
    CurrentUser(identity): CurrentUser,
    PathParam(id): PathParam<i32>,
    uri: Uri,
    JsonBody(req): JsonBody<UpdateRecipeReq>,
) -> Result<Json<RecipeDto>, ProblemResponse> {
    info!(recipe_id = id, "Updating recipe");
    let details = svc
        .update_recipe(identity, id, req.into())
        .await
        .map_err(|e| fail(e, &uri))?;
    Ok(Json(details.into()))
}

#[utoipa::path(
    delete,
    path = "/api/recipes/{id}/",
    params(("id" = i32, Path, description = "Recipe id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 401, body = Problem),
        (status = 403, body = Problem),
        (status = 404, body = Problem)
    ),
    security(("token" = [])),
    tag = "recipes"
)]
pub async fn delete_recipe(
    Extension(svc): Svc,
    CurrentUser(identity): CurrentUser,
    PathParam(id): PathParam<i32>,
    uri: Uri,
) -> Result<StatusCode, ProblemResponse> {
    info!(recipe_id = id, "Deleting recipe");
    svc.delete_recipe(identity, id)
        .await
        .map_err(|e| fail(e, &uri))?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/recipes/{id}/get-link/",
    params(("id" = i32, Path, description = "Recipe id")),
    responses(
        (status = 200, body = ShortLinkDto),
        (status = 404, body = Problem)
    ),
    tag = "recipes"
)]
pub async fn get_link(
    Extension(svc): Svc,
    PathParam(id): PathParam<i32>,
    headers: HeaderMap,
    uri: Uri,
) -> Result<Json<ShortLinkDto>, ProblemResponse> {
    let short_link = svc
        .short_link(id, &request_origin(&headers))
        .await
        .map_err(|e| fail(e, &uri))?;
    Ok(Json(ShortLinkDto { short_link }))
}

#[utoipa::path(
    get,
    path = "/s/{id}",
    params(("id" = i32, Path, description = "Recipe id")),
    responses(
        (status = 307, description = "Redirect to the recipe"),
        (status = 404, body = Problem)
    ),
    tag = "recipes"
)]
pub async fn follow_short_link(
    Extension(svc): Svc,
    PathParam(id): PathParam<i32>,
    uri: Uri,
) -> Result<Redirect, ProblemResponse> {
    let id = svc.resolve_short_link(id).await.map_err(|e| fail(e, &uri))?;
    Ok(Redirect::temporary(&format!("/api/recipes/{id}/")))
}

async fn add_membership(
    svc: &Service,
    identity: crate::contract::model::Identity,
    kind: Membership,
    id: i32,
    uri: &Uri,
) -> Result<(StatusCode, Json<RecipeMinifiedDto>), ProblemResponse> {
    let summary = svc
        .add_membership(identity, kind, id)
        .await
        .map_err(|e| fail(e, uri))?;
    Ok((StatusCode::CREATED, Json(summary.into())))
}

async fn remove_membership(
    svc: &Service,
    identity: crate::contract::model::Identity,
    kind: Membership,
    id: i32,
    uri: &Uri,
) -> Result<StatusCode, ProblemResponse> {
    svc.remove_membership(identity, kind, id)
        .await
        .map_err(|e| fail(e, uri))?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/recipes/{id}/favorite/",
    params(("id" = i32, Path, description = "Recipe id")),
    responses(
        (status = 201, body = RecipeMinifiedDto),
        (status = 400, body = Problem),
        (status = 401, body = Problem),
        (status = 404, body = Problem)
    ),
    security(("token" = [])),
    tag = "recipes"
)]
pub async fn add_favorite(
    Extension(svc): Svc,
    CurrentUser(identity): CurrentUser,
    PathParam(id): PathParam<i32>,
    uri: Uri,
) -> Result<(StatusCode, Json<RecipeMinifiedDto>), ProblemResponse> {
    add_membership(&svc, identity, Membership::Favorites, id, &uri).await
}

#[utoipa::path(
    delete,
    path = "/api/recipes/{id}/favorite/",
    params(("id" = i32, Path, description = "Recipe id")),
    responses(
        (status = 204, description = "Removed from favorites"),
        (status = 400, body = Problem),
        (status = 401, body = Problem),
        (status = 404, body = Problem)
    ),
    security(("token" = [])),
    tag = "recipes"
)]
pub async fn remove_favorite(
    Extension(svc): Svc,
    CurrentUser(identity): CurrentUser,
    PathParam(id): PathParam<i32>,
    uri: Uri,
) -> Result<StatusCode, ProblemResponse> {
    remove_membership(&svc, identity, Membership::Favorites, id, &uri).await
}

#[utoipa::path(
    post,
    path = "/api/recipes/{id}/shopping_cart/",
    params(("id" = i32, Path, description = "Recipe id")),
    responses(
        (status = 201, body = RecipeMinifiedDto),
        (status = 400, body = Problem),
        (status = 401, body = Problem),
        (status = 404, body = Problem)
    ),
    security(("token" = [])),
    tag = "recipes"
)]
pub async fn add_to_cart(
    Extension(svc): Svc,
    CurrentUser(identity): CurrentUser,
    PathParam(id): PathParam<i32>,
    uri: Uri,
) -> Result<(StatusCode, Json<RecipeMinifiedDto>), ProblemResponse> {
    add_membership(&svc, identity, Membership::ShoppingCart, id, &uri).await
}

#[utoipa::path(
    delete,
    path = "/api/recipes/{id}/shopping_cart/",
    params(("id" = i32, Path, description = "Recipe id")),
    responses(
        (status = 204, description = "Removed from the shopping cart"),
        (status = 400, body = Problem),
        (status = 401, body = Problem),
        (status = 404, body = Problem)
    ),
    security(("token" = [])),
    tag = "recipes"
)]
pub async fn remove_from_cart(
    Extension(svc): Svc,
    CurrentUser(identity): CurrentUser,
    PathParam(id): PathParam<i32>,
    uri: Uri,
) -> Result<StatusCode, ProblemResponse> {
    remove_membership(&svc, identity, Membership::ShoppingCart, id, &uri).await
}

#[utoipa::path(
    get,
    path = "/api/recipes/download_shopping_cart/",
    responses(
        (status = 200, description = "Plain-text shopping list", content_type = "text/plain", body = String),
        (status = 401, body = Problem)
    ),
    security(("token" = [])),
    tag = "recipes"
)]
pub async fn download_shopping_cart(
    Extension(svc): Svc,
    CurrentUser(identity): CurrentUser,
    uri: Uri,
) -> Result<impl IntoResponse, ProblemResponse> {
    let lines = svc.shopping_list(identity).await.map_err(|e| fail(e, &uri))?;
    let body = shopping_list::render(&lines);
    Ok((
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_owned()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{SHOPPING_LIST_FILENAME}\""),
            ),
        ],
        body,
    ))
}
