#![cfg(feature = "web")]

use assert_fs::prelude::*;
use assert_fs::TempDir;
use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use image::{Rgba, RgbaImage};
use serde_json::{json, Value};
use tower::ServiceExt;

use logosim::{create_router, AppState, Config};

const PREFIX_A: &str = "pngs_ALL_inkscape_512/pngs_A_inkscape_512/";

struct Fixture {
    _dir: TempDir,
    app: Router,
}

fn fixture() -> Fixture {
    let dir = TempDir::new().unwrap();
    dir.child("block4_similarities_pngs_A_inkscape_512.json")
        .write_str(r#"{"scores": {"a.png|b.png": 0.9, "b.png|c.png": 0.4}}"#)
        .unwrap();
    dir.child("ssim_data/ssim_scores_A.json")
        .write_str(r#"{"scores": {"a.png|c.png": 0.3}, "metadata": {"win_size": 7}}"#)
        .unwrap();
    dir.child("ssim_data/ssim_scores_B.json")
        .write_str("{ this is not json")
        .unwrap();

    let logo_dir = dir.child("pngs_ALL_inkscape_512/pngs_A_inkscape_512");
    logo_dir.create_dir_all().unwrap();
    RgbaImage::from_pixel(32, 32, Rgba([0, 128, 0, 255]))
        .save(logo_dir.child("a.png").path())
        .unwrap();

    let config = Config {
        data_dir: dir.path().to_path_buf(),
        image_root: dir.path().to_path_buf(),
        static_dir: dir.path().join("static"),
        ..Config::default()
    };
    let app = create_router(AppState::with_config(config));
    Fixture { _dir: dir, app }
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Vec<u8>) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, body.to_vec())
}

async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
    let (status, body) = get(app, uri).await;
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn test_list_logos_block4_default() {
    let f = fixture();
    let (status, body) = get_json(&f.app, "/api/logos").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!([
            format!("{}a.png", PREFIX_A),
            format!("{}b.png", PREFIX_A),
            format!("{}c.png", PREFIX_A)
        ])
    );
}

#[tokio::test]
async fn test_list_logos_ssim() {
    let f = fixture();
    let (status, body) = get_json(&f.app, "/api/logos?set=A&method=ssim").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_list_logos_missing_set_is_not_found() {
    let f = fixture();
    let (status, body) = get_json(&f.app, "/api/logos?set=Z").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], 404);
}

#[tokio::test]
async fn test_invalid_set_label_is_bad_request() {
    let f = fixture();
    let (status, _) = get_json(&f.app, "/api/logos?set=..%2Fetc").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_corrupt_table_is_reported() {
    let f = fixture();
    let (status, body) = get_json(&f.app, "/api/logos?set=B&method=ssim").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["message"].as_str().unwrap().starts_with("Format error"));
}

#[tokio::test]
async fn test_similar_ranks_neighbors() {
    let f = fixture();
    let (status, body) = get_json(&f.app, "/api/similar/b.png?set=A&method=block4").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!([[format!("{}a.png", PREFIX_A), 0.9], [format!("{}c.png", PREFIX_A), 0.4]])
    );

    let uri = format!("/api/similar/{}b.png", PREFIX_A);
    let (_, canonical) = get_json(&f.app, &uri).await;
    assert_eq!(canonical, body);
}

#[tokio::test]
async fn test_similar_unknown_anchor_is_empty() {
    let f = fixture();
    let (status, body) = get_json(&f.app, "/api/similar/zzz.png?method=ssim").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_serve_logo() {
    let f = fixture();
    let response = f
        .app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/logos/{}a.png", PREFIX_A))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert!(image::load_from_memory(&body).is_ok());
}

#[tokio::test]
async fn test_serve_missing_logo_is_plain_404() {
    let f = fixture();
    let (status, body) = get(&f.app, "/logos/missing.png").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(String::from_utf8(body).unwrap(), "File not found: missing.png");
}

async fn post_export(app: &Router, body: Value) -> axum::response::Response {
    app.clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/export_png")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap()
}

#[tokio::test]
async fn test_export_png() {
    let f = fixture();
    let response = post_export(
        &f.app,
        json!({
            "main_logo": "x.png",
            "similar_logos": [
                {"filename": format!("{}a.png", PREFIX_A), "label": "Similarity", "score": 0.812}
            ]
        }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"logos_compare.png\""
    );
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let img = image::load_from_memory(&body).unwrap();
    assert_eq!(img.width(), 2 * 256 + 3 * 48);
}

#[tokio::test]
async fn test_export_requires_neighbor_scores() {
    let f = fixture();
    let response = post_export(
        &f.app,
        json!({"main_logo": "x.png", "similar_logos": [{"filename": "a.png", "label": "Similarity"}]}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_export_rejects_too_many_logos() {
    let f = fixture();
    let max = Config::default().render.max_logos;
    let neighbors: Vec<Value> = (0..max)
        .map(|i| json!({"filename": format!("n{}.png", i), "score": 0.5}))
        .collect();

    let response = post_export(&f.app, json!({"main_logo": "x.png", "similar_logos": neighbors})).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = post_export(
        &f.app,
        json!({"main_logo": "x.png", "similar_logos": &neighbors[..max - 1]}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_health() {
    let f = fixture();
    let (status, body) = get_json(&f.app, "/api/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["status"], "ok");
}
