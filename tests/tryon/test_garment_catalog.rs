// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Garment catalog listing and GET /api/garments

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use dress_tryon::{
    api::http_server::{create_app, AppState},
    config::TryOnConfig,
    garment::{list_garments, GarmentReference, GarmentResolver},
};
use tempfile::TempDir;
use tower::util::ServiceExt; // for `oneshot`

fn catalog_dir() -> TempDir {
    let dir = TempDir::new().unwrap();
    for name in [
        "royal_purple.JPG",
        "linen-blue.png",
        "gold--trim_gown.webp",
        ".hidden.png",
        "readme.md",
        "sketch.gif",
        "Summer Linen.v2.jpg",
    ] {
        std::fs::write(dir.path().join(name), b"x").unwrap();
    }
    std::fs::create_dir(dir.path().join("archive.png")).unwrap();
    dir
}

#[tokio::test]
async fn test_catalog_lists_allowed_files_sorted() {
    let dir = catalog_dir();
    let entries = list_garments(dir.path(), "/assets/dresses").await;

    let ids: Vec<&str> = entries.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, vec!["gold--trim_gown", "linen-blue", "royal_purple"]);

    let gown = &entries[0];
    assert_eq!(gown.title, "Gold Trim Gown");
    assert_eq!(gown.description, "Reconstructed dress: Gold Trim Gown");
    assert_eq!(gown.src, "/assets/dresses/gold--trim_gown.webp");

    assert_eq!(entries[2].src, "/assets/dresses/royal_purple.JPG");
}

#[tokio::test]
async fn test_catalog_missing_directory_is_empty() {
    let entries = list_garments(std::path::Path::new("/nonexistent/dresses"), "/assets").await;
    assert!(entries.is_empty());
}

#[tokio::test]
async fn test_garments_route() {
    let dir = catalog_dir();
    let app = create_app(AppState::from_config(TryOnConfig::for_garment_dir(dir.path())).unwrap());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/garments")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    let dresses = body["dresses"].as_array().unwrap();
    assert_eq!(dresses.len(), 3);
    assert_eq!(dresses[1]["id"], "linen-blue");
    assert_eq!(dresses[1]["title"], "Linen Blue");
}

#[tokio::test]
async fn test_every_listed_garment_resolves() {
    let dir = catalog_dir();
    std::fs::write(dir.path().join("Wool_Red.JPEG"), b"x").unwrap();
    let entries = list_garments(dir.path(), "/assets/dresses").await;
    assert!(entries.iter().all(|e| e.id != "Summer Linen.v2"));
    assert!(entries.iter().any(|e| e.id == "Wool_Red"));

    let resolver = GarmentResolver::new(dir.path(), "/assets/dresses");
    for entry in &entries {
        let by_id = resolver
            .resolve(&GarmentReference::from_id(entry.id.as_str()))
            .await
            .unwrap_or_else(|e| panic!("{} not resolvable by id: {}", entry.id, e));
        assert_eq!(by_id.stem(), Some(entry.id.as_str()));

        let by_both = resolver
            .resolve(&GarmentReference::new(
                Some(entry.id.clone()),
                Some(entry.src.clone()),
            ))
            .await
            .unwrap_or_else(|e| panic!("{} not resolvable by id and src: {}", entry.id, e));
        assert_eq!(by_both.path, by_id.path);
    }
}
