//! End-to-end request flows against the axum router.

use axum::body::{to_bytes, Body};
use axum::http::{Request, Response, StatusCode};
use axum::Router;
use ldp_rs::{ldp_service, MemoryStore, ResourceManager, ServerConfig};
use oxrdf::NamedNode;
use std::sync::Arc;
use tower::ServiceExt;

const BASE: &str = "http://example.org";

async fn app_with(config: ServerConfig) -> Router {
    let engine = ResourceManager::new(Arc::new(MemoryStore::new()))
        .with_slug_allocator(config.slug_allocator())
        .with_negotiator(config.negotiator());
    let engine = Arc::new(engine);
    engine
        .bootstrap_container(&NamedNode::new_unchecked(format!("{}/c", BASE)))
        .await
        .unwrap();
    ldp_service(engine, config)
}

async fn app() -> Router {
    app_with(ServerConfig {
        base_url: Some(BASE.into()),
        ..Default::default()
    })
    .await
}

async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone().oneshot(request).await.unwrap()
}

async fn body_text(response: Response<Body>) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn header(response: &Response<Body>, name: &str) -> String {
    response.headers()[name].to_str().unwrap().to_string()
}

fn path_of(location: &str) -> String {
    location.trim_start_matches(BASE).to_string()
}

fn post_turtle(path: &str) -> axum::http::request::Builder {
    Request::post(path).header("content-type", "text/turtle")
}

const TITLE: &str = "<> <http://purl.org/dc/terms/title> \"Hello\" .";

#[tokio::test]
async fn test_create_read_delete_cycle() {
    let app = app().await;

    let created = send(&app, post_turtle("/c").body(Body::from(TITLE)).unwrap()).await;
    assert_eq!(created.status(), StatusCode::CREATED);
    let location = header(&created, "location");
    assert!(location.starts_with("http://example.org/c/"));
    assert!(body_text(created).await.is_empty());

    let path = path_of(&location);
    let read = send(
        &app,
        Request::get(&path)
            .header("accept", "text/turtle")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(read.status(), StatusCode::OK);
    assert!(header(&read, "content-type").starts_with("text/turtle"));
    assert!(header(&read, "link").contains("http://www.w3.org/ns/ldp#Resource"));
    let body = body_text(read).await;
    assert!(body.contains("Hello"));
    assert!(body.contains("RDFSource"));

    let deleted = send(&app, Request::delete(&path).body(Body::empty()).unwrap()).await;
    assert_eq!(deleted.status(), StatusCode::NO_CONTENT);

    let gone = send(&app, Request::get(&path).body(Body::empty()).unwrap()).await;
    assert_eq!(gone.status(), StatusCode::NOT_FOUND);

    let again = send(&app, Request::delete(&path).body(Body::empty()).unwrap()).await;
    assert_eq!(again.status(), StatusCode::NOT_FOUND);

    let fresh = send(&app, post_turtle("/c").body(Body::from(TITLE)).unwrap()).await;
    assert_eq!(fresh.status(), StatusCode::CREATED);
    assert_ne!(header(&fresh, "location"), location);
}

#[tokio::test]
async fn test_replace_requires_current_etag() {
    let app = app().await;
    let put = |if_match: Option<&str>, title: &str| {
        let mut builder = Request::put("/c/doc").header("content-type", "text/turtle");
        if let Some(tag) = if_match {
            builder = builder.header("if-match", tag);
        }
        builder
            .body(Body::from(format!(
                "<> <http://purl.org/dc/terms/title> \"{}\" .",
                title
            )))
            .unwrap()
    };

    let created = send(&app, put(None, "first")).await;
    assert_eq!(created.status(), StatusCode::CREATED);
    let tag = header(&created, "etag");

    let missing = send(&app, put(None, "second")).await;
    assert_eq!(missing.status(), StatusCode::PRECONDITION_REQUIRED);

    let stale = send(&app, put(Some("W/\"stale\""), "second")).await;
    assert_eq!(stale.status(), StatusCode::PRECONDITION_FAILED);
    assert!(header(&stale, "link").contains("constrainedBy"));

    let replaced = send(&app, put(Some(&tag), "second")).await;
    assert_eq!(replaced.status(), StatusCode::OK);
    let new_tag = header(&replaced, "etag");
    assert_ne!(new_tag, tag);
    assert!(body_text(replaced).await.contains("second"));

    let reused = send(&app, put(Some(&tag), "third")).await;
    assert_eq!(reused.status(), StatusCode::PRECONDITION_FAILED);
}

#[tokio::test]
async fn test_slug_collision_over_http() {
    let app = app().await;
    let post = || {
        post_turtle("/c")
            .header("slug", "report")
            .body(Body::from(TITLE))
            .unwrap()
    };

    let first = send(&app, post()).await;
    let second = send(&app, post()).await;
    assert_eq!(first.status(), StatusCode::CREATED);
    assert_eq!(second.status(), StatusCode::CREATED);
    assert_eq!(header(&first, "location"), "http://example.org/c/report");
    assert_ne!(header(&second, "location"), header(&first, "location"));
}

#[tokio::test]
async fn test_post_container_interaction_model() {
    let app = app().await;
    let created = send(
        &app,
        post_turtle("/c")
            .header("slug", "nested")
            .header(
                "link",
                "<http://www.w3.org/ns/ldp#BasicContainer>; rel=\"type\"",
            )
            .body(Body::from(TITLE))
            .unwrap(),
    )
    .await;
    assert_eq!(created.status(), StatusCode::CREATED);
    assert!(header(&created, "link").contains("BasicContainer"));

    let child = send(
        &app,
        post_turtle("/c/nested").body(Body::from(TITLE)).unwrap(),
    )
    .await;
    assert_eq!(child.status(), StatusCode::CREATED);
    assert!(header(&child, "location").starts_with("http://example.org/c/nested/"));
}

#[tokio::test]
async fn test_post_to_plain_resource_is_405() {
    let app = app().await;
    let created = send(&app, post_turtle("/c").body(Body::from(TITLE)).unwrap()).await;
    let path = path_of(&header(&created, "location"));

    let rejected = send(&app, post_turtle(&path).body(Body::from(TITLE)).unwrap()).await;
    assert_eq!(rejected.status(), StatusCode::METHOD_NOT_ALLOWED);
    let allow = header(&rejected, "allow");
    assert!(allow.contains("GET"));
    assert!(!allow.contains("POST"));
}

#[tokio::test]
async fn test_container_replace_must_keep_containment() {
    let app = app().await;
    let created = send(&app, post_turtle("/c").body(Body::from(TITLE)).unwrap()).await;
    let child = header(&created, "location");

    let container = send(&app, Request::get("/c").body(Body::empty()).unwrap()).await;
    let tag = header(&container, "etag");

    let without_child = send(
        &app,
        Request::put("/c")
            .header("content-type", "text/turtle")
            .header("if-match", &tag)
            .body(Body::from(TITLE))
            .unwrap(),
    )
    .await;
    assert_eq!(without_child.status(), StatusCode::CONFLICT);

    let keeps_child = format!(
        "{}\n<> <http://www.w3.org/ns/ldp#contains> <{}> .",
        TITLE, child
    );
    let replaced = send(
        &app,
        Request::put("/c")
            .header("content-type", "text/turtle")
            .header("if-match", &tag)
            .body(Body::from(keeps_child))
            .unwrap(),
    )
    .await;
    assert_eq!(replaced.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_conditional_get() {
    let app = app().await;
    let first = send(&app, Request::get("/c").body(Body::empty()).unwrap()).await;
    let tag = header(&first, "etag");

    let cached = send(
        &app,
        Request::get("/c")
            .header("if-none-match", &tag)
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(cached.status(), StatusCode::NOT_MODIFIED);
    assert_eq!(header(&cached, "etag"), tag);
    assert!(body_text(cached).await.is_empty());
}

#[tokio::test]
async fn test_head_omits_body() {
    let app = app().await;
    let response = send(&app, Request::head("/c").body(Body::empty()).unwrap()).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("etag"));
    assert!(header(&response, "allow").contains("POST"));
    assert!(body_text(response).await.is_empty());
}

#[tokio::test]
async fn test_negotiates_json_ld() {
    let app = app().await;
    let response = send(
        &app,
        Request::get("/c")
            .header("accept", "application/ld+json, text/turtle;q=0.5")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(header(&response, "content-type"), "application/ld+json");
    let body: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert!(body.is_object() || body.is_array());
    assert!(body.to_string().contains("http://example.org/c"));
}

#[tokio::test]
async fn test_accepts_json_ld_input() {
    let app = app().await;
    let body = r#"{"@id": "", "http://purl.org/dc/terms/title": [{"@value": "from json"}]}"#;
    let created = send(
        &app,
        Request::post("/c")
            .header("content-type", "application/ld+json")
            .body(Body::from(body))
            .unwrap(),
    )
    .await;
    assert_eq!(created.status(), StatusCode::CREATED);

    let path = path_of(&header(&created, "location"));
    let read = send(
        &app,
        Request::get(&path)
            .header("accept", "application/n-triples")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert!(body_text(read).await.contains("\"from json\""));
}

#[tokio::test]
async fn test_accepts_compacted_json_ld_input() {
    let app = app().await;
    let body = r#"{
        "@context": {"dct": "http://purl.org/dc/terms/"},
        "@id": "",
        "dct:title": "with context"
    }"#;
    let created = send(
        &app,
        Request::post("/c")
            .header("content-type", "application/ld+json")
            .header("slug", "compacted")
            .body(Body::from(body))
            .unwrap(),
    )
    .await;
    assert_eq!(created.status(), StatusCode::CREATED);

    let read = send(
        &app,
        Request::get("/c/compacted")
            .header("accept", "application/n-triples")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    let text = body_text(read).await;
    assert!(text.contains("<http://purl.org/dc/terms/title> \"with context\""));
}

#[tokio::test]
async fn test_unmatched_accept_falls_back_or_406() {
    let lenient = app().await;
    let response = send(
        &lenient,
        Request::get("/c")
            .header("accept", "image/png")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(header(&response, "content-type").starts_with("text/turtle"));

    let strict = app_with(ServerConfig {
        base_url: Some(BASE.into()),
        fallback_to_default_format: false,
        ..Default::default()
    })
    .await;
    let response = send(
        &strict,
        Request::get("/c")
            .header("accept", "image/png")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_ACCEPTABLE);
}

#[tokio::test]
async fn test_unsupported_input_is_415() {
    let app = app().await;
    let response = send(
        &app,
        Request::post("/c")
            .header("content-type", "text/plain")
            .body(Body::from("hello"))
            .unwrap(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert!(header(&response, "accept-post").contains("text/turtle"));
}

#[tokio::test]
async fn test_target_state_decides_before_content_type() {
    let app = app().await;
    let created = send(&app, post_turtle("/c").body(Body::from(TITLE)).unwrap()).await;
    let path = path_of(&header(&created, "location"));

    let plain = send(
        &app,
        Request::post(&path)
            .header("content-type", "application/xml")
            .body(Body::from("<doc/>"))
            .unwrap(),
    )
    .await;
    assert_eq!(plain.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert!(!header(&plain, "allow").contains("POST"));

    let nowhere = send(
        &app,
        Request::post("/nowhere").body(Body::from("hello")).unwrap(),
    )
    .await;
    assert_eq!(nowhere.status(), StatusCode::NOT_FOUND);

    let deleted = send(&app, Request::delete(&path).body(Body::empty()).unwrap()).await;
    assert_eq!(deleted.status(), StatusCode::NO_CONTENT);
    let reused = send(
        &app,
        Request::put(&path)
            .header("content-type", "text/plain")
            .body(Body::from("hello"))
            .unwrap(),
    )
    .await;
    assert_eq!(reused.status(), StatusCode::CONFLICT);

    let fresh = send(
        &app,
        Request::put("/c/fresh")
            .header("content-type", "text/plain")
            .body(Body::from("hello"))
            .unwrap(),
    )
    .await;
    assert_eq!(fresh.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
}

#[tokio::test]
async fn test_malformed_body_is_400() {
    let app = app().await;
    let response = send(
        &app,
        post_turtle("/c").body(Body::from("<> <broken")).unwrap(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_options_reports_capabilities() {
    let app = app().await;
    let container = send(&app, Request::options("/c").body(Body::empty()).unwrap()).await;
    assert_eq!(container.status(), StatusCode::NO_CONTENT);
    assert!(header(&container, "allow").contains("POST"));
    assert!(header(&container, "accept-post").contains("application/ld+json"));

    let created = send(&app, post_turtle("/c").body(Body::from(TITLE)).unwrap()).await;
    let path = path_of(&header(&created, "location"));
    send(&app, Request::delete(&path).body(Body::empty()).unwrap()).await;

    let tombstone = send(&app, Request::options(&path).body(Body::empty()).unwrap()).await;
    assert_eq!(header(&tombstone, "allow"), "OPTIONS");
}

#[tokio::test]
async fn test_patch_container_is_noop() {
    let app = app().await;
    let before = send(&app, Request::get("/c").body(Body::empty()).unwrap()).await;
    let tag = header(&before, "etag");

    let patched = send(&app, Request::patch("/c").body(Body::empty()).unwrap()).await;
    assert_eq!(patched.status(), StatusCode::NO_CONTENT);
    assert_eq!(header(&patched, "etag"), tag);
}

#[tokio::test]
async fn test_concurrent_posts_get_distinct_locations() {
    let app = app().await;
    let mut tasks = Vec::new();
    for _ in 0..6 {
        let app = app.clone();
        tasks.push(tokio::spawn(async move {
            let response = app
                .oneshot(
                    post_turtle("/c")
                        .header("slug", "same")
                        .body(Body::from(TITLE))
                        .unwrap(),
                )
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::CREATED);
            response.headers()["location"].to_str().unwrap().to_string()
        }));
    }
    let mut locations = Vec::new();
    for task in tasks {
        locations.push(task.await.unwrap());
    }
    locations.sort();
    locations.dedup();
    assert_eq!(locations.len(), 6);
}
