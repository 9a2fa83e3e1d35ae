//! The chat proxy endpoint through the router.

mod common;

use std::io::Cursor;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use common::{body_json, json_request, RecordingBackend, TestApp};
use completions::{ContentPart, MessageContent};
use image::{DynamicImage, ImageFormat, RgbImage};
use rand::Rng;
use serde_json::json;

const BOUNDARY: &str = "chat-test-boundary";

fn png_bytes(width: u32, height: u32, noisy: bool) -> Vec<u8> {
    let mut rng = rand::thread_rng();
    let img = RgbImage::from_fn(width, height, |x, y| {
        if noisy {
            image::Rgb([rng.gen(), rng.gen(), rng.gen()])
        } else {
            image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
        }
    });
    let mut buf = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .unwrap();
    buf
}

fn multipart_request(messages: &str, image: Option<(&str, &[u8])>) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{}\r\nContent-Disposition: form-data; name=\"messages\"\r\n\r\n{}\r\n",
            BOUNDARY, messages
        )
        .as_bytes(),
    );
    if let Some((file_name, bytes)) = image {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
                BOUNDARY, file_name
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

    Request::builder()
        .method("POST")
        .uri("/chat")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

fn upload_count(app: &TestApp) -> usize {
    std::fs::read_dir(app.uploads.path()).unwrap().count()
}

#[tokio::test]
async fn test_text_chat_forwards_cleaned_messages() {
    let app = TestApp::new().await;

    let response = app
        .send(json_request(
            "POST",
            "/chat",
            json!({"messages": [{"role": "user", "content": "hi", "imageUrl": "http://x/y.png"}]}),
            None,
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["reply"], "Hello from the model");
    assert!(body["imageUrl"].is_null());

    let calls = app.backend.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].len(), 1);
    assert_eq!(calls[0][0].role, "user");
    assert_eq!(calls[0][0].content, MessageContent::Text("hi".to_string()));
}

#[tokio::test]
async fn test_multipart_messages_string() {
    let app = TestApp::new().await;
    let messages = json!([
        {"role": "system", "content": "be brief"},
        {"role": "user", "content": "hello"},
        {"role": "assistant", "content": "hi there"},
        {"role": "user", "content": "how are you?"}
    ])
    .to_string();

    let response = app.send(multipart_request(&messages, None)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let calls = app.backend.calls();
    let roles: Vec<_> = calls[0].iter().map(|m| m.role.as_str()).collect();
    assert_eq!(roles, ["system", "user", "assistant", "user"]);
}

#[tokio::test]
async fn test_missing_messages_rejected_before_backend() {
    let app = TestApp::new().await;

    for body in [json!({}), json!({"messages": []}), json!({"messages": "not json"})] {
        let response = app.send(json_request("POST", "/chat", body, None)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "Messages array required");
    }

    // An image without messages is not stored
    let png = png_bytes(10, 10, false);
    let response = app.send(multipart_request("[]", Some(("photo.png", &png)))).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    assert!(app.backend.calls().is_empty());
    assert_eq!(upload_count(&app), 0);
}

#[tokio::test]
async fn test_non_image_upload_rejected() {
    let app = TestApp::new().await;
    let messages = json!([{"role": "user", "content": "run this"}]).to_string();

    let response = app
        .send(multipart_request(&messages, Some(("payload.exe", b"MZ\x90\x00"))))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "Only image files are allowed!");

    assert!(app.backend.calls().is_empty());
    assert_eq!(upload_count(&app), 0);
}

#[tokio::test]
async fn test_image_attached_to_last_user_message() {
    let app = TestApp::new().await;
    let messages = json!([
        {"role": "user", "content": "first"},
        {"role": "assistant", "content": "ok"},
        {"role": "user", "content": ""}
    ])
    .to_string();
    let png = png_bytes(640, 480, false);

    let response = app
        .send(multipart_request(&messages, Some(("photo.PNG", &png))))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;

    let image_url = body["imageUrl"].as_str().unwrap();
    assert!(image_url.starts_with("http://localhost:5000/uploads/chat-image"));
    assert!(image_url.ends_with(".png"));
    assert_eq!(upload_count(&app), 1);

    let calls = app.backend.calls();
    let sent = &calls[0];
    assert_eq!(sent[0].content, MessageContent::Text("first".to_string()));

    let MessageContent::Parts(parts) = &sent[2].content else {
        panic!("last user message should carry parts");
    };
    assert_eq!(parts[0], ContentPart::text("What's in this image?"));
    match &parts[1] {
        ContentPart::ImageUrl { image_url } => {
            assert!(image_url.url.starts_with("data:image/jpeg;base64,"));
        }
        other => panic!("expected image part, got {:?}", other),
    }
}

#[tokio::test]
async fn test_oversized_compressed_image_rejected() {
    let app = TestApp::builder()
        .config(|c| c.compression.max_bytes = 1024)
        .build()
        .await;
    let messages = json!([{"role": "user", "content": "what is this?"}]).to_string();
    let png = png_bytes(800, 600, true);

    let response = app
        .send(multipart_request(&messages, Some(("noise.png", &png))))
        .await;
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    let body = body_json(response).await;
    assert!(body["error"].as_str().unwrap().starts_with("Image too large"));
    assert!(app.backend.calls().is_empty());
}

#[tokio::test]
async fn test_upload_over_limit_rejected() {
    let app = TestApp::builder()
        .config(|c| c.max_upload_bytes = 1024)
        .build()
        .await;
    let messages = json!([{"role": "user", "content": "look"}]).to_string();
    let png = png_bytes(200, 200, true);

    let response = app
        .send(multipart_request(&messages, Some(("big.png", &png))))
        .await;
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(upload_count(&app), 0);
}

#[tokio::test]
async fn test_undecodable_image_is_server_error() {
    let app = TestApp::new().await;
    let messages = json!([{"role": "user", "content": "look"}]).to_string();

    let response = app
        .send(multipart_request(&messages, Some(("broken.jpg", b"not really a jpeg"))))
        .await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_json(response).await["error"], "Failed to process image");
}

#[tokio::test]
async fn test_upstream_failure_is_generic() {
    let app = TestApp::builder()
        .backend(RecordingBackend::failing())
        .build()
        .await;

    let response = app
        .send(json_request(
            "POST",
            "/chat",
            json!({"messages": [{"role": "user", "content": "hi"}]}),
            None,
        ))
        .await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_json(response).await["error"], "Something went wrong.");
}

#[tokio::test]
async fn test_uploaded_image_is_served() {
    let app = TestApp::new().await;
    let messages = json!([{"role": "user", "content": "describe"}]).to_string();
    let png = png_bytes(32, 32, false);

    let response = app
        .send(multipart_request(&messages, Some(("tiny.png", &png))))
        .await;
    let body = body_json(response).await;
    let image_url = body["imageUrl"].as_str().unwrap();
    let path = image_url.trim_start_matches("http://localhost:5000");

    let response = app.send(common::get(path, None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(bytes.as_ref(), png.as_slice());
}
