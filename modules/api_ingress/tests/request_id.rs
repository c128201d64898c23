use axum::{
    body::Body,
    extract::Extension,
    http::{Request, Response, StatusCode},
    response::Json,
    routing::get,
    Router,
};
use serde_json::{json, Value};
use tower::util::ServiceExt; // for `oneshot`

use api_ingress::request_id::XRequestId;
use api_ingress::ApiIngress;

fn host_app() -> Router {
    let module = Router::new().route("/api/whoami", get(echo_request_id));
    ApiIngress::default().build_router(module, None)
}

async fn echo_request_id(Extension(XRequestId(id)): Extension<XRequestId>) -> Json<Value> {
    Json(json!({ "request_id": id }))
}

async fn send(app: Router, uri: &str, request_id: Option<&str>) -> Response<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(id) = request_id {
        builder = builder.header("x-request-id", id);
    }
    app.oneshot(builder.body(Body::empty()).unwrap())
        .await
        .unwrap()
}

fn header_id(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
}

async fn body_json(response: Response<Body>) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn generated_id_reaches_handler_and_response() {
    let response = send(host_app(), "/api/whoami", None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let id = header_id(&response).expect("x-request-id should be generated");
    assert!(!id.is_empty());
    assert_eq!(body_json(response).await["request_id"], id.as_str());
}

#[tokio::test]
async fn generated_ids_differ_between_requests() {
    let first = header_id(&send(host_app(), "/health", None).await).unwrap();
    let second = header_id(&send(host_app(), "/health", None).await).unwrap();
    assert_ne!(first, second);
}

#[tokio::test]
async fn incoming_id_is_preserved() {
    let response = send(host_app(), "/api/whoami", Some("host-42")).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(header_id(&response).as_deref(), Some("host-42"));
    assert_eq!(body_json(response).await["request_id"], "host-42");
}

#[tokio::test]
async fn unknown_route_reports_request_id() {
    let response = send(host_app(), "/api/missing/", Some("lost-7")).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(header_id(&response).as_deref(), Some("lost-7"));

    let json = body_json(response).await;
    assert_eq!(json["code"], "not_found");
    assert_eq!(json["message"], "no route for /api/missing/");
    assert_eq!(json["request_id"], "lost-7");
}

#[tokio::test]
async fn unknown_route_without_id_gets_a_generated_one() {
    let response = send(host_app(), "/nope", None).await;
    let id = header_id(&response).expect("x-request-id should be generated");

    assert_eq!(body_json(response).await["request_id"], id.as_str());
}
