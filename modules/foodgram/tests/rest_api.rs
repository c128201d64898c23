mod common;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use sea_orm::DatabaseConnection;
use serde_json::{json, Value};
use tower::ServiceExt;

use foodgram::{Foodgram, FoodgramConfig};

use common::*;

fn app(db: &DatabaseConnection) -> Router {
    Foodgram::init(db.clone(), FoodgramConfig::default()).register_rest(Router::new())
}

fn request(method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut b = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::HOST, "testserver");
    if let Some(t) = token {
        b = b.header(header::AUTHORIZATION, format!("Token {t}"));
    }
    match body {
        Some(v) => b
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(v.to_string()))
            .unwrap(),
        None => b.body(Body::empty()).unwrap(),
    }
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, header::HeaderMap, Vec<u8>) {
    let res = app.clone().oneshot(req).await.unwrap();
    let status = res.status();
    let headers = res.headers().clone();
    let body = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec();
    (status, headers, body)
}

fn json_of(body: &[u8]) -> Value {
    serde_json::from_slice(body).expect("json body")
}

#[tokio::test]
async fn anonymous_write_is_unauthorized_problem() {
    let db = create_test_db().await;
    let app = app(&db);

    let (status, headers, body) = send(
        &app,
        request(Method::POST, "/api/recipes/", None, Some(json!({}))),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(
        headers.get(header::CONTENT_TYPE).unwrap(),
        "application/problem+json"
    );
    let problem = json_of(&body);
    assert_eq!(problem["code"], "FOODGRAM_UNAUTHENTICATED");
    assert_eq!(problem["instance"], "/api/recipes/");

    let (status, _, _) = send(
        &app,
        request(Method::GET, "/api/users/me/", Some("not-a-token"), None),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn me_reports_empty_avatar() {
    let db = create_test_db().await;
    let app = app(&db);
    let user = seed_user(&db, "cook", false).await;

    let (status, _, body) = send(
        &app,
        request(Method::GET, "/api/users/me/", Some(&user.token), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let me = json_of(&body);
    assert_eq!(me["id"], user.id);
    assert_eq!(me["username"], "cook");
    assert_eq!(me["is_subscribed"], false);
    assert_eq!(me["avatar"], "");
}

#[tokio::test]
async fn create_user_and_reject_duplicate() {
    let db = create_test_db().await;
    let app = app(&db);
    let payload = json!({
        "email": "vpupkin@yandex.ru",
        "username": "vasya.pupkin",
        "first_name": "Vasya",
        "last_name": "Ivanov"
    });

    let (status, _, body) = send(
        &app,
        request(Method::POST, "/api/users/", None, Some(payload.clone())),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json_of(&body)["username"], "vasya.pupkin");

    let (status, _, body) = send(
        &app,
        request(Method::POST, "/api/users/", None, Some(payload)),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let problem = json_of(&body);
    assert_eq!(problem["code"], "FOODGRAM_VALIDATION");
    assert_eq!(problem["errors"][0]["pointer"], "/username");
}

#[tokio::test]
async fn favorite_twice_is_conflict() {
    let db = create_test_db().await;
    let app = app(&db);
    let user = seed_user(&db, "eater", false).await;
    let author = seed_user(&db, "author", false).await;
    let id = seed_recipe(&db, author.id, "Borscht", &[], 0).await;
    let uri = format!("/api/recipes/{id}/favorite/");

    let (status, _, body) = send(&app, request(Method::POST, &uri, Some(&user.token), None)).await;
    assert_eq!(status, StatusCode::CREATED);
    let summary = json_of(&body);
    assert_eq!(summary["id"], id);
    assert_eq!(summary["name"], "Borscht");
    assert!(summary.get("author").is_none());

    let (status, _, body) = send(&app, request(Method::POST, &uri, Some(&user.token), None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json_of(&body)["code"], "FOODGRAM_CONFLICT");

    let (status, _, _) = send(&app, request(Method::DELETE, &uri, Some(&user.token), None)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _, _) = send(&app, request(Method::DELETE, &uri, Some(&user.token), None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _, body) = send(
        &app,
        request(Method::POST, "/api/recipes/9999/favorite/", Some(&user.token), None),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json_of(&body)["code"], "FOODGRAM_NOT_FOUND");
}

#[tokio::test]
async fn create_recipe_validates_amounts() {
    let db = create_test_db().await;
    let app = app(&db);
    let user = seed_user(&db, "cook", false).await;
    let flour = seed_ingredient(&db, "flour", "g").await;

    let bad = json!({
        "ingredients": [{"id": flour, "amount": 0}],
        "image": "data:image/png;base64,AAAA",
        "name": "Flatbread",
        "text": "Knead.",
        "cooking_time": 20
    });
    let (status, headers, body) = send(
        &app,
        request(Method::POST, "/api/recipes/", Some(&user.token), Some(bad)),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        headers.get(header::CONTENT_TYPE).unwrap(),
        "application/problem+json"
    );
    let problem = json_of(&body);
    assert_eq!(problem["code"], "FOODGRAM_VALIDATION");
    assert_eq!(problem["errors"][0]["pointer"], "/ingredients/0/amount");

    let good = json!({
        "ingredients": [{"id": flour, "amount": 250}],
        "image": "data:image/png;base64,AAAA",
        "name": "Flatbread",
        "text": "Knead.",
        "cooking_time": 20
    });
    let (status, _, body) = send(
        &app,
        request(Method::POST, "/api/recipes/", Some(&user.token), Some(good)),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let recipe = json_of(&body);
    assert_eq!(recipe["author"]["username"], "cook");
    assert_eq!(recipe["ingredients"][0]["name"], "flour");
    assert_eq!(recipe["ingredients"][0]["amount"], 250);
    assert_eq!(recipe["is_favorited"], false);
}

#[tokio::test]
async fn malformed_json_is_bad_request() {
    let db = create_test_db().await;
    let app = app(&db);
    let user = seed_user(&db, "cook", false).await;

    let req = Request::builder()
        .method(Method::POST)
        .uri("/api/recipes/")
        .header(header::AUTHORIZATION, format!("Token {}", user.token))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, _, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json_of(&body)["code"], "FOODGRAM_VALIDATION");
}

#[tokio::test]
async fn patch_checks_existence_then_ownership() {
    let db = create_test_db().await;
    let app = app(&db);
    let author = seed_user(&db, "author", false).await;
    let other = seed_user(&db, "other", false).await;
    let id = seed_recipe(&db, author.id, "Mine", &[], 0).await;
    let patch = json!({"name": "Not yours"});

    let (status, _, body) = send(
        &app,
        request(
            Method::PATCH,
            &format!("/api/recipes/{id}/"),
            Some(&other.token),
            Some(patch.clone()),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json_of(&body)["code"], "FOODGRAM_FORBIDDEN");

    let (status, _, _) = send(
        &app,
        request(
            Method::PATCH,
            "/api/recipes/9999/",
            Some(&other.token),
            Some(patch.clone()),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _, body) = send(
        &app,
        request(
            Method::PATCH,
            &format!("/api/recipes/{id}/"),
            Some(&author.token),
            Some(patch),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_of(&body)["name"], "Not yours");
}

#[tokio::test]
async fn download_shopping_cart_as_attachment() {
    let db = create_test_db().await;
    let app = app(&db);
    let user = seed_user(&db, "shopper", false).await;
    let salt = seed_ingredient(&db, "salt", "g").await;
    let sugar = seed_ingredient(&db, "sugar", "g").await;
    let r1 = seed_recipe(&db, user.id, "One", &[(salt, 5), (sugar, 2)], 1).await;
    let r2 = seed_recipe(&db, user.id, "Two", &[(salt, 3)], 0).await;
    seed_cart_item(&db, user.id, r1).await;
    seed_cart_item(&db, user.id, r2).await;

    let (status, headers, body) = send(
        &app,
        request(
            Method::GET,
            "/api/recipes/download_shopping_cart/",
            Some(&user.token),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(headers
        .get(header::CONTENT_TYPE)
        .unwrap()
        .to_str()
        .unwrap()
        .starts_with("text/plain"));
    assert_eq!(
        headers.get(header::CONTENT_DISPOSITION).unwrap(),
        "attachment; filename=\"Shopping list.txt\""
    );
    assert_eq!(
        String::from_utf8(body).unwrap(),
        "salt (g) - 8\nsugar (g) - 2"
    );
}

#[tokio::test]
async fn short_link_round_trip() {
    let db = create_test_db().await;
    let app = app(&db);
    let author = seed_user(&db, "author", false).await;
    let id = seed_recipe(&db, author.id, "Linked", &[], 0).await;

    let (status, _, body) = send(
        &app,
        request(Method::GET, &format!("/api/recipes/{id}/get-link/"), None, None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        json_of(&body)["short-link"],
        format!("http://testserver/s/{id}")
    );

    let (status, headers, _) =
        send(&app, request(Method::GET, &format!("/s/{id}"), None, None)).await;
    assert_eq!(status, StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(
        headers.get(header::LOCATION).unwrap(),
        format!("/api/recipes/{id}/").as_str()
    );

    let (status, _, _) = send(&app, request(Method::GET, "/s/9999", None, None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn recipe_list_is_paginated() {
    let db = create_test_db().await;
    let app = app(&db);
    let author = seed_user(&db, "author", false).await;
    for i in 0..3 {
        seed_recipe(&db, author.id, &format!("R{i}"), &[], 10 - i).await;
    }

    let (status, _, body) = send(
        &app,
        request(Method::GET, "/api/recipes/?limit=2", None, None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let page = json_of(&body);
    assert_eq!(page["count"], 3);
    assert_eq!(page["results"].as_array().unwrap().len(), 2);
    assert_eq!(page["results"][0]["name"], "R2");
    assert_eq!(page["next"], "http://testserver/api/recipes/?limit=2&page=2");
    assert_eq!(page["previous"], Value::Null);

    let (_, _, body) = send(
        &app,
        request(Method::GET, "/api/recipes/?limit=2&page=2", None, None),
    )
    .await;
    let page = json_of(&body);
    assert_eq!(page["results"].as_array().unwrap().len(), 1);
    assert_eq!(page["next"], Value::Null);
    assert_eq!(page["previous"], "http://testserver/api/recipes/?limit=2");

    let (status, _, _) = send(
        &app,
        request(Method::GET, "/api/recipes/?page=0", None, None),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn subscribe_over_http() {
    let db = create_test_db().await;
    let app = app(&db);
    let fan = seed_user(&db, "fan", false).await;
    let star = seed_user(&db, "star", false).await;
    seed_recipe(&db, star.id, "Hit", &[], 0).await;
    seed_recipe(&db, star.id, "Classic", &[], 60).await;

    let uri = format!("/api/users/{}/subscribe/?recipes_limit=1", star.id);
    let (status, _, body) = send(&app, request(Method::POST, &uri, Some(&fan.token), None)).await;
    assert_eq!(status, StatusCode::CREATED);
    let author = json_of(&body);
    assert_eq!(author["username"], "star");
    assert_eq!(author["is_subscribed"], true);
    assert_eq!(author["recipes_count"], 2);
    assert_eq!(author["recipes"].as_array().unwrap().len(), 1);

    let (status, _, body) = send(
        &app,
        request(
            Method::POST,
            &format!("/api/users/{}/subscribe/", fan.id),
            Some(&fan.token),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json_of(&body)["code"], "FOODGRAM_CONFLICT");

    let (status, _, body) = send(
        &app,
        request(Method::GET, "/api/users/subscriptions/", Some(&fan.token), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_of(&body)["count"], 1);

    let (status, _, _) = send(
        &app,
        request(
            Method::DELETE,
            &format!("/api/users/{}/subscribe/", star.id),
            Some(&fan.token),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn ingredients_search_by_name() {
    let db = create_test_db().await;
    let app = app(&db);
    seed_ingredient(&db, "apple", "pcs").await;
    seed_ingredient(&db, "apricot", "pcs").await;
    seed_ingredient(&db, "banana", "pcs").await;

    let (status, _, body) = send(
        &app,
        request(Method::GET, "/api/ingredients/?name=ap", None, None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let list = json_of(&body);
    assert_eq!(list.as_array().unwrap().len(), 2);
    assert_eq!(list[0]["name"], "apple");
    assert_eq!(list[0]["measurement_unit"], "pcs");

    let (status, _, _) = send(
        &app,
        request(Method::GET, "/api/ingredients/4040/", None, None),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn ingress_adds_request_id_to_module_routes() {
    let db = create_test_db().await;
    let module = Foodgram::init(db.clone(), FoodgramConfig::default());
    let router = api_ingress::ApiIngress::default()
        .build_router(module.register_rest(Router::new()), Some(module.openapi()));

    let res = router
        .oneshot(
            Request::builder()
                .uri("/api/ingredients/")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn oversized_page_is_a_validation_problem() {
    let db = create_test_db().await;
    let app = app(&db);
    let author = seed_user(&db, "author", false).await;
    seed_recipe(&db, author.id, "Only", &[], 0).await;

    let (status, headers, body) = send(
        &app,
        request(Method::GET, "/api/recipes/?page=9223372036854775807", None, None),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        headers.get(header::CONTENT_TYPE).unwrap(),
        "application/problem+json"
    );
    let problem = json_of(&body);
    assert_eq!(problem["code"], "FOODGRAM_VALIDATION");
    assert_eq!(problem["errors"][0]["pointer"], "/page");

    // The server keeps answering afterwards.
    let (status, _, body) = send(&app, request(Method::GET, "/api/recipes/", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_of(&body)["count"], 1);
}

#[tokio::test]
async fn huge_recipes_limit_returns_every_recipe() {
    let db = create_test_db().await;
    let app = app(&db);
    let fan = seed_user(&db, "fan", false).await;
    let star = seed_user(&db, "star", false).await;
    seed_recipe(&db, star.id, "Hit", &[], 0).await;
    seed_recipe(&db, star.id, "Classic", &[], 60).await;

    let uri = format!(
        "/api/users/{}/subscribe/?recipes_limit=18446744073709551615",
        star.id
    );
    let (status, _, body) = send(&app, request(Method::POST, &uri, Some(&fan.token), None)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json_of(&body)["recipes"].as_array().unwrap().len(), 2);

    let (status, _, body) = send(
        &app,
        request(
            Method::GET,
            "/api/users/subscriptions/?recipes_limit=18446744073709551615",
            Some(&fan.token),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_of(&body)["results"][0]["recipes"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn malformed_path_and_query_are_problems() {
    let db = create_test_db().await;
    let app = app(&db);
    let fan = seed_user(&db, "fan", false).await;
    let star = seed_user(&db, "star", false).await;

    let (status, headers, body) =
        send(&app, request(Method::GET, "/api/recipes/abc/", None, None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(
        headers.get(header::CONTENT_TYPE).unwrap(),
        "application/problem+json"
    );
    let problem = json_of(&body);
    assert_eq!(problem["code"], "FOODGRAM_NOT_FOUND");
    assert_eq!(problem["instance"], "/api/recipes/abc/");

    let (status, headers, body) =
        send(&app, request(Method::GET, "/api/recipes/?page=abc", None, None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        headers.get(header::CONTENT_TYPE).unwrap(),
        "application/problem+json"
    );
    assert_eq!(json_of(&body)["code"], "FOODGRAM_VALIDATION");

    let uri = format!("/api/users/{}/subscribe/?recipes_limit=-1", star.id);
    let (status, _, body) = send(&app, request(Method::POST, &uri, Some(&fan.token), None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json_of(&body)["code"], "FOODGRAM_VALIDATION");
}

#[tokio::test]
async fn unknown_ingredient_points_at_its_position() {
    let db = create_test_db().await;
    let app = app(&db);
    let user = seed_user(&db, "cook", false).await;
    let flour = seed_ingredient(&db, "flour", "g").await;

    let payload = json!({
        "ingredients": [{"id": flour, "amount": 10}, {"id": 9999, "amount": 1}],
        "image": "data:image/png;base64,AAAA",
        "name": "Mystery",
        "text": "Guess.",
        "cooking_time": 5
    });
    let (status, _, body) = send(
        &app,
        request(Method::POST, "/api/recipes/", Some(&user.token), Some(payload)),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json_of(&body)["errors"][0]["pointer"], "/ingredients/1/id");
}

#[tokio::test]
async fn avatar_put_and_delete() {
    let db = create_test_db().await;
    let app = app(&db);
    let cook = seed_user(&db, "cook", false).await;
    let guest = seed_user(&db, "guest", false).await;
    let avatar = "data:image/png;base64,iVBORw0KGgo=";

    let (status, _, _) = send(
        &app,
        request(
            Method::PUT,
            "/api/users/me/avatar/",
            None,
            Some(json!({ "avatar": avatar })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _, body) = send(
        &app,
        request(
            Method::PUT,
            "/api/users/me/avatar/",
            Some(&cook.token),
            Some(json!({ "avatar": avatar })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_of(&body)["avatar"], avatar);

    let (_, _, body) = send(
        &app,
        request(
            Method::GET,
            &format!("/api/users/{}/", cook.id),
            Some(&guest.token),
            None,
        ),
    )
    .await;
    assert_eq!(json_of(&body)["avatar"], avatar);

    let (status, _, body) = send(
        &app,
        request(
            Method::PUT,
            "/api/users/me/avatar/",
            Some(&cook.token),
            Some(json!({ "avatar": "" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json_of(&body)["errors"][0]["pointer"], "/avatar");

    let (status, _, _) = send(
        &app,
        request(Method::DELETE, "/api/users/me/avatar/", Some(&cook.token), None),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, _, body) = send(
        &app,
        request(Method::GET, "/api/users/me/", Some(&cook.token), None),
    )
    .await;
    assert_eq!(json_of(&body)["avatar"], "");
}
