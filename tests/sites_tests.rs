use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use sitesmith::config::Config;
use tower::ServiceExt;

/// Default API key seeded by migration (must match m20260301_initial.rs)
const DEFAULT_API_KEY: &str = "sitesmith_default_api_key_please_regenerate";

async fn spawn_app() -> Router {
    let mut config = Config::default();
    config.general.database_path = "sqlite::memory:".to_string();
    config.general.max_db_connections = 1;
    config.general.min_db_connections = 1;

    let state = sitesmith::api::create_app_state_from_config(config, None)
        .await
        .expect("Failed to create app state");
    sitesmith::api::router(state).await
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

async fn body_text(response: axum::response::Response) -> String {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(body.to_vec()).unwrap()
}

async fn create_site(app: &Router, slug: &str, title: &str) -> serde_json::Value {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/sites")
                .header("X-Api-Key", DEFAULT_API_KEY)
                .header("Content-Type", "application/json")
                .body(Body::from(format!(
                    r#"{{"slug":"{slug}","title":"{title}","html":"<h1>{title}</h1>"}}"#
                )))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await
}

async fn set_status(app: &Router, slug: &str, status: &str) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri(format!("/api/sites/{slug}/status"))
                .header("X-Api-Key", DEFAULT_API_KEY)
                .header("Content-Type", "application/json")
                .body(Body::from(format!(r#"{{"status":"{status}"}}"#)))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_site_lifecycle() {
    let app = spawn_app().await;

    let json = create_site(&app, "my-blog", "My Blog").await;
    assert_eq!(json["data"]["slug"], "my-blog");
    assert_eq!(json["data"]["status"], "draft");
    assert_eq!(json["data"]["views"], 0);

    // Draft sites are not publicly served.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/s/my-blog")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    set_status(&app, "my-blog", "public").await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/s/my-blog")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("<h1>My Blog</h1>"));

    // The view was counted.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/sites/my-blog")
                .header("X-Api-Key", DEFAULT_API_KEY)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let json = body_json(response).await;
    assert_eq!(json["data"]["views"], 1);
}

#[tokio::test]
async fn test_private_site_is_hidden_from_public() {
    let app = spawn_app().await;

    create_site(&app, "secret", "Secret").await;
    set_status(&app, "secret", "private").await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/s/secret")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // But the owner still sees it through the API.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/sites/secret")
                .header("X-Api-Key", DEFAULT_API_KEY)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_slug_validation_and_conflicts() {
    let app = spawn_app().await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/sites")
                .header("X-Api-Key", DEFAULT_API_KEY)
                .header("Content-Type", "application/json")
                .body(Body::from(r#"{"slug":"Not A Slug!","title":"Bad"}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    create_site(&app, "taken", "First").await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/sites")
                .header("X-Api-Key", DEFAULT_API_KEY)
                .header("Content-Type", "application/json")
                .body(Body::from(r#"{"slug":"taken","title":"Second"}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_site_limit_is_enforced() {
    let app = spawn_app().await;

    // Default plan allows three sites.
    create_site(&app, "one", "One").await;
    create_site(&app, "two", "Two").await;
    create_site(&app, "three", "Three").await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/sites")
                .header("X-Api-Key", DEFAULT_API_KEY)
                .header("Content-Type", "application/json")
                .body(Body::from(r#"{"slug":"four","title":"Four"}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_ads_txt_lists_monetized_publishers() {
    let app = spawn_app().await;

    // Empty platform serves an empty body, not a 404.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/ads.txt")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    create_site(&app, "shop-a", "Shop A").await;
    create_site(&app, "shop-b", "Shop B").await;
    create_site(&app, "hobby", "Hobby").await;

    for slug in ["shop-a", "shop-b"] {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("PUT")
                    .uri(format!("/api/sites/{slug}/monetization"))
                    .header("X-Api-Key", DEFAULT_API_KEY)
                    .header("Content-Type", "application/json")
                    .body(Body::from(
                        r#"{"enabled":true,"publisher_id":"pub-1234567890"}"#,
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/ads.txt")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response
            .headers()
            .get(header::CACHE_CONTROL)
            .unwrap()
            .to_str()
            .unwrap()
            .contains("max-age=3600")
    );

    let body = body_text(response).await;
    // Two sites sharing a publisher id collapse to one seller line.
    assert_eq!(
        body.matches("google.com, pub-1234567890, DIRECT, f08c47fec0942fa0")
            .count(),
        1
    );
}

#[tokio::test]
async fn test_monetization_requires_publisher_id() {
    let app = spawn_app().await;

    create_site(&app, "shop", "Shop").await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri("/api/sites/shop/monetization")
                .header("X-Api-Key", DEFAULT_API_KEY)
                .header("Content-Type", "application/json")
                .body(Body::from(r#"{"enabled":true}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_post_lifecycle_and_feed() {
    let app = spawn_app().await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/posts")
                .header("X-Api-Key", DEFAULT_API_KEY)
                .header("Content-Type", "application/json")
                .body(Body::from(
                    r#"{"slug":"hello","title":"Hello","html":"<p>First post</p>","category":"news"}"#,
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["data"]["status"], "draft");

    // Draft posts do not appear in the public feed.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/feed")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let json = body_json(response).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 0);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri("/api/posts/hello")
                .header("X-Api-Key", DEFAULT_API_KEY)
                .header("Content-Type", "application/json")
                .body(Body::from(r#"{"status":"active"}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/feed?category=news")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let json = body_json(response).await;
    let feed = json["data"].as_array().unwrap();
    assert_eq!(feed.len(), 1);
    assert_eq!(feed[0]["slug"], "hello");

    // Category filter excludes non-matching posts.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/feed?category=travel")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let json = body_json(response).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 0);
}
