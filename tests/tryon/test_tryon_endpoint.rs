// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! End-to-end tests for POST /api/tryon and the service routes
//!
//! Requests go through the real router via `oneshot` with hand-built
//! multipart bodies. The trusted garment root is a temp directory.

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    routing::post,
    Json, Router,
};
use base64::Engine as _;
use dress_tryon::{
    api::http_server::{create_app, AppState},
    config::{GenerationConfig, TryOnConfig},
};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use serde_json::{json, Value};
use std::io::Cursor;
use tempfile::TempDir;
use tower::util::ServiceExt; // for `oneshot`

const BOUNDARY: &str = "tryon-test-boundary-7d3f";

enum FormPart<'a> {
    Text(&'a str, &'a str),
    File {
        name: &'a str,
        filename: &'a str,
        content_type: &'a str,
        bytes: &'a [u8],
    },
}

fn multipart_body(parts: &[FormPart]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part {
            FormPart::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
            }
            FormPart::File {
                name,
                filename,
                content_type,
                bytes,
            } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                        name, filename, content_type
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(bytes);
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

fn tryon_request(parts: &[FormPart]) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/api/tryon")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(multipart_body(parts)))
        .unwrap()
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn encode(img: DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), format).unwrap();
    bytes
}

fn person_jpeg() -> Vec<u8> {
    let img = RgbImage::from_fn(320, 480, |x, y| Rgb([(x % 256) as u8, (y % 256) as u8, 128]));
    encode(DynamicImage::ImageRgb8(img), ImageFormat::Jpeg)
}

fn garment_png() -> Vec<u8> {
    let img = RgbImage::from_pixel(120, 200, Rgb([30, 60, 180]));
    encode(DynamicImage::ImageRgb8(img), ImageFormat::Png)
}

fn garment_dir() -> TempDir {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("linen-blue.png"), garment_png()).unwrap();
    std::fs::write(dir.path().join("royal_purple.jpg"), person_jpeg()).unwrap();
    dir
}

fn demo_app(dir: &TempDir) -> Router {
    let state = AppState::from_config(TryOnConfig::for_garment_dir(dir.path())).unwrap();
    create_app(state)
}

fn decode_data_uri(uri: &str) -> (String, Vec<u8>) {
    let rest = uri.strip_prefix("data:").unwrap();
    let (media_type, payload) = rest.split_once(";base64,").unwrap();
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(payload)
        .unwrap();
    (media_type.to_string(), bytes)
}

#[tokio::test]
async fn test_demo_overlay_returns_jpeg() {
    let dir = garment_dir();
    let photo = person_jpeg();
    let request = tryon_request(&[
        FormPart::File {
            name: "userImage",
            filename: "me.jpg",
            content_type: "image/jpeg",
            bytes: &photo,
        },
        FormPart::Text("dressId", "linen-blue"),
        FormPart::Text("demoMode", "true"),
        FormPart::Text("demoOverlay", "true"),
    ]);

    let (status, body) = send(demo_app(&dir), request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
    assert_eq!(body["status"], "demo_overlay");
    assert_eq!(body["dressId"], "linen-blue");
    assert_eq!(body["dressSrc"], "/assets/dresses/linen-blue.png");

    let image = body["image"].as_str().unwrap();
    assert!(image.starts_with("data:image/jpeg;base64,"));
    let (_, bytes) = decode_data_uri(image);
    let decoded = image::load_from_memory(&bytes).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (320, 480));
}

#[tokio::test]
async fn test_demo_echo_is_byte_identical() {
    let dir = garment_dir();
    let photo = person_jpeg();
    let request = tryon_request(&[
        FormPart::File {
            name: "userImage",
            filename: "me.jpg",
            content_type: "image/jpg",
            bytes: &photo,
        },
        FormPart::Text("dressSrc", "/assets/dresses/royal_purple.jpg"),
        FormPart::Text("demoMode", "true"),
        FormPart::Text("demoOverlay", "false"),
    ]);

    let (status, body) = send(demo_app(&dir), request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "demo_echo");
    assert_eq!(body["dressId"], "royal_purple");
    assert_eq!(body["dressSrc"], "/assets/dresses/royal_purple.jpg");

    let (media_type, bytes) = decode_data_uri(body["image"].as_str().unwrap());
    assert_eq!(media_type, "image/jpeg");
    assert_eq!(bytes, photo);
}

#[tokio::test]
async fn test_oversized_png_rejected() {
    let dir = garment_dir();
    let mut big = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
    big.resize(6 * 1024 * 1024, 0);
    let request = tryon_request(&[
        FormPart::File {
            name: "userImage",
            filename: "big.png",
            content_type: "image/png",
            bytes: &big,
        },
        FormPart::Text("dressId", "linen-blue"),
        FormPart::Text("demoMode", "true"),
    ]);

    let (status, body) = send(demo_app(&dir), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["ok"], false);
    assert_eq!(body["code"], "file_too_large");
    assert_eq!(body["error"], "Images must be 5MB or smaller.");
}

#[tokio::test]
async fn test_body_beyond_router_limit_is_file_too_large() {
    let dir = garment_dir();
    let huge = vec![0u8; 12 * 1024 * 1024];
    let request = tryon_request(&[FormPart::File {
        name: "userImage",
        filename: "huge.jpg",
        content_type: "image/jpeg",
        bytes: &huge,
    }]);

    let (status, body) = send(demo_app(&dir), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "file_too_large");
}

#[tokio::test]
async fn test_heic_upload_rejected() {
    let dir = garment_dir();
    let mut heic = vec![0, 0, 0, 0x18];
    heic.extend_from_slice(b"ftypheic");
    heic.extend_from_slice(&[0u8; 64]);
    let request = tryon_request(&[
        FormPart::File {
            name: "userImage",
            filename: "IMG_0001.jpg",
            content_type: "image/jpeg",
            bytes: &heic,
        },
        FormPart::Text("dressId", "linen-blue"),
    ]);

    let (status, body) = send(demo_app(&dir), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "unsupported_input_type");
}

#[tokio::test]
async fn test_missing_user_image() {
    let dir = garment_dir();
    let request = tryon_request(&[FormPart::Text("dressId", "linen-blue")]);

    let (status, body) = send(demo_app(&dir), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "missing_user_image");
}

#[tokio::test]
async fn test_non_multipart_body_rejected() {
    let dir = garment_dir();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/tryon")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{}"))
        .unwrap();

    let (status, body) = send(demo_app(&dir), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "missing_user_image");
}

#[tokio::test]
async fn test_traversal_identifier_rejected() {
    let dir = garment_dir();
    let photo = person_jpeg();
    let request = tryon_request(&[
        FormPart::File {
            name: "userImage",
            filename: "me.jpg",
            content_type: "image/jpeg",
            bytes: &photo,
        },
        FormPart::Text("dressId", "../../etc/passwd"),
        FormPart::Text("demoMode", "true"),
    ]);

    let (status, body) = send(demo_app(&dir), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "invalid_dress_id");
    assert!(body.get("image").is_none());
}

#[tokio::test]
async fn test_traversal_path_hint_rejected() {
    let dir = garment_dir();
    let photo = person_jpeg();
    let request = tryon_request(&[
        FormPart::File {
            name: "userImage",
            filename: "me.jpg",
            content_type: "image/jpeg",
            bytes: &photo,
        },
        FormPart::Text("dressSrc", "/assets/dresses/../../secret.png"),
        FormPart::Text("demoMode", "true"),
    ]);

    let (status, body) = send(demo_app(&dir), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "invalid_dress_path");
}

#[tokio::test]
async fn test_unknown_garment() {
    let dir = garment_dir();
    let photo = person_jpeg();
    let request = tryon_request(&[
        FormPart::File {
            name: "userImage",
            filename: "me.jpg",
            content_type: "image/jpeg",
            bytes: &photo,
        },
        FormPart::Text("dressId", "velvet-green"),
    ]);

    let (status, body) = send(demo_app(&dir), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "dress_not_found");
}

#[tokio::test]
async fn test_real_mode_unconfigured() {
    let dir = garment_dir();
    let photo = person_jpeg();
    let request = tryon_request(&[
        FormPart::File {
            name: "userImage",
            filename: "me.jpg",
            content_type: "image/jpeg",
            bytes: &photo,
        },
        FormPart::Text("dressId", "linen-blue"),
        FormPart::Text("demoMode", "false"),
    ]);

    let (status, body) = send(demo_app(&dir), request).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["code"], "openai_not_configured");
}

#[tokio::test]
async fn test_unspecified_mode_falls_back_to_demo() {
    let dir = garment_dir();
    let photo = person_jpeg();
    let request = tryon_request(&[
        FormPart::File {
            name: "userImage",
            filename: "me.jpg",
            content_type: "image/jpeg",
            bytes: &photo,
        },
        FormPart::Text("dressId", "linen-blue"),
    ]);

    let (status, body) = send(demo_app(&dir), request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "demo_overlay");
}

#[tokio::test]
async fn test_unreadable_garment_degrades() {
    let dir = garment_dir();
    std::fs::write(dir.path().join("torn.webp"), b"RIFF0000WEBPnot really").unwrap();
    let photo = person_jpeg();
    let request = tryon_request(&[
        FormPart::File {
            name: "userImage",
            filename: "me.jpg",
            content_type: "image/jpeg",
            bytes: &photo,
        },
        FormPart::Text("dressId", "torn"),
        FormPart::Text("demoMode", "true"),
    ]);

    let (status, body) = send(demo_app(&dir), request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "demo_fallback");
    assert!(body["error"].is_string());
    let (_, bytes) = decode_data_uri(body["image"].as_str().unwrap());
    assert_eq!(bytes, photo);
}

/// Stub image-edit service answering every edit with a fixed PNG payload
async fn spawn_edit_stub() -> String {
    async fn edits() -> Json<Value> {
        Json(json!({
            "data": [{ "b64_json": "aGVsbG8=" }],
            "output_format": "png"
        }))
    }

    let app = Router::new().route("/v1/images/edits", post(edits));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

#[tokio::test]
async fn test_real_mode_generates() {
    let dir = garment_dir();
    let base_url = spawn_edit_stub().await;
    let config = TryOnConfig {
        generation: Some(GenerationConfig {
            base_url,
            ..GenerationConfig::new("sk-test")
        }),
        ..TryOnConfig::for_garment_dir(dir.path())
    };
    let app = create_app(AppState::from_config(config).unwrap());

    let photo = person_jpeg();
    let request = tryon_request(&[
        FormPart::File {
            name: "userImage",
            filename: "me.jpg",
            content_type: "image/jpeg",
            bytes: &photo,
        },
        FormPart::Text("dressId", "linen-blue"),
    ]);

    let (status, body) = send(app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "generated");
    assert_eq!(body["image"], "data:image/png;base64,aGVsbG8=");
    assert_eq!(body["dressId"], "linen-blue");
}

#[tokio::test]
async fn test_health_and_root() {
    let dir = garment_dir();

    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(demo_app(&dir), request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert!(body["version"].is_string());

    let request = Request::builder().uri("/").body(Body::empty()).unwrap();
    let (status, body) = send(demo_app(&dir), request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Canaanite Dress Try-On API");
}

#[tokio::test]
async fn test_tryon_rejects_get() {
    let dir = garment_dir();
    let request = Request::builder()
        .method(Method::GET)
        .uri("/api/tryon")
        .body(Body::empty())
        .unwrap();
    let response = demo_app(&dir).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}
