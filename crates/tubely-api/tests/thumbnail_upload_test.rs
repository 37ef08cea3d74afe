//! Thumbnail upload integration tests.
//!
//! Run with: `cargo test -p tubely-api --test thumbnail_upload_test`

mod helpers;

use axum_test::multipart::{MultipartForm, Part};
use helpers::{png_bytes, setup_test_app, token_for};
use tubely_core::Video;
use uuid::Uuid;

fn thumbnail_form(data: Vec<u8>, file_name: &str, mime_type: &str) -> MultipartForm {
    let part = Part::bytes(bytes::Bytes::from(data))
        .file_name(file_name)
        .mime_type(mime_type);
    MultipartForm::new().add_part("thumbnail", part)
}

#[tokio::test]
async fn test_upload_png_thumbnail() {
    let app = setup_test_app().await;
    let user_id = Uuid::new_v4();
    let video = app.create_video(user_id);

    let response = app
        .client()
        .post(&format!("/api/thumbnail_upload/{}", video.id))
        .add_header("Authorization", format!("Bearer {}", token_for(user_id)))
        .multipart(thumbnail_form(png_bytes(), "boots.png", "image/png"))
        .await;

    assert_eq!(response.status_code(), 200);
    let body: Video = response.json();
    let expected_url = format!("http://localhost:8091/assets/{}.png", video.id);
    assert_eq!(body.id, video.id);
    assert_eq!(body.thumbnail_url.as_deref(), Some(expected_url.as_str()));
    assert_eq!(body.title, video.title);

    let stored = std::fs::read(app.asset_path(&format!("{}.png", video.id))).unwrap();
    assert_eq!(stored, png_bytes());

    let record = app.videos.get(video.id).unwrap();
    assert_eq!(record.thumbnail_url.as_deref(), Some(expected_url.as_str()));
}

#[tokio::test]
async fn test_jpeg_thumbnail_uses_subtype_extension() {
    let app = setup_test_app().await;
    let user_id = Uuid::new_v4();
    let video = app.create_video(user_id);

    let response = app
        .client()
        .post(&format!("/api/thumbnail_upload/{}", video.id))
        .add_header("Authorization", format!("Bearer {}", token_for(user_id)))
        .multipart(thumbnail_form(vec![0xFF, 0xD8, 0xFF, 0xE0], "boots.jpg", "image/jpeg"))
        .await;

    assert_eq!(response.status_code(), 200);
    assert!(app.asset_path(&format!("{}.jpeg", video.id)).exists());
}

#[tokio::test]
async fn test_reupload_overwrites_thumbnail() {
    let app = setup_test_app().await;
    let user_id = Uuid::new_v4();
    let video = app.create_video(user_id);
    let token = token_for(user_id);

    for data in [png_bytes(), b"second version".to_vec()] {
        let response = app
            .client()
            .post(&format!("/api/thumbnail_upload/{}", video.id))
            .add_header("Authorization", format!("Bearer {}", token))
            .multipart(thumbnail_form(data, "boots.png", "image/png"))
            .await;
        assert_eq!(response.status_code(), 200);
    }

    let stored = std::fs::read(app.asset_path(&format!("{}.png", video.id))).unwrap();
    assert_eq!(stored, b"second version".to_vec());
}

#[tokio::test]
async fn test_gif_thumbnail_rejected() {
    let app = setup_test_app().await;
    let user_id = Uuid::new_v4();
    let video = app.create_video(user_id);

    let response = app
        .client()
        .post(&format!("/api/thumbnail_upload/{}", video.id))
        .add_header("Authorization", format!("Bearer {}", token_for(user_id)))
        .multipart(thumbnail_form(b"GIF89a".to_vec(), "boots.gif", "image/gif"))
        .await;

    assert_eq!(response.status_code(), 400);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"], "Invalid file type");
    assert!(!app.asset_path(&format!("{}.gif", video.id)).exists());
    assert!(app.videos.get(video.id).unwrap().thumbnail_url.is_none());
}

#[tokio::test]
async fn test_thumbnail_for_other_users_video_unauthorized() {
    let app = setup_test_app().await;
    let owner = Uuid::new_v4();
    let video = app.create_video(owner);

    let response = app
        .client()
        .post(&format!("/api/thumbnail_upload/{}", video.id))
        .add_header("Authorization", format!("Bearer {}", token_for(Uuid::new_v4())))
        .multipart(thumbnail_form(png_bytes(), "boots.png", "image/png"))
        .await;

    assert_eq!(response.status_code(), 401);
    assert!(!app.asset_path(&format!("{}.png", video.id)).exists());
    assert_eq!(app.videos.get(video.id).unwrap(), video);
}

#[tokio::test]
async fn test_thumbnail_for_unknown_video_is_bad_request() {
    let app = setup_test_app().await;
    let user_id = Uuid::new_v4();

    let response = app
        .client()
        .post(&format!("/api/thumbnail_upload/{}", Uuid::new_v4()))
        .add_header("Authorization", format!("Bearer {}", token_for(user_id)))
        .multipart(thumbnail_form(png_bytes(), "boots.png", "image/png"))
        .await;

    assert_eq!(response.status_code(), 400);
}

#[tokio::test]
async fn test_malformed_video_id_checked_before_auth() {
    let app = setup_test_app().await;

    let response = app
        .client()
        .post("/api/thumbnail_upload/not-a-uuid")
        .multipart(thumbnail_form(png_bytes(), "boots.png", "image/png"))
        .await;

    assert_eq!(response.status_code(), 400);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"], "Invalid ID");
}

#[tokio::test]
async fn test_missing_token_unauthorized() {
    let app = setup_test_app().await;
    let video = app.create_video(Uuid::new_v4());

    let response = app
        .client()
        .post(&format!("/api/thumbnail_upload/{}", video.id))
        .multipart(thumbnail_form(png_bytes(), "boots.png", "image/png"))
        .await;

    assert_eq!(response.status_code(), 401);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"], "Couldn't find JWT");
}

#[tokio::test]
async fn test_token_signed_with_other_secret_unauthorized() {
    let app = setup_test_app().await;
    let user_id = Uuid::new_v4();
    let video = app.create_video(user_id);
    let forged = tubely_api::auth::make_jwt(
        user_id,
        "some-other-secret-value",
        chrono::Duration::hours(1),
    )
    .unwrap();

    let response = app
        .client()
        .post(&format!("/api/thumbnail_upload/{}", video.id))
        .add_header("Authorization", format!("Bearer {}", forged))
        .multipart(thumbnail_form(png_bytes(), "boots.png", "image/png"))
        .await;

    assert_eq!(response.status_code(), 401);
}

#[tokio::test]
async fn test_form_without_thumbnail_field_rejected() {
    let app = setup_test_app().await;
    let user_id = Uuid::new_v4();
    let video = app.create_video(user_id);

    let part = Part::bytes(bytes::Bytes::from(png_bytes()))
        .file_name("boots.png")
        .mime_type("image/png");
    let response = app
        .client()
        .post(&format!("/api/thumbnail_upload/{}", video.id))
        .add_header("Authorization", format!("Bearer {}", token_for(user_id)))
        .multipart(MultipartForm::new().add_part("image", part))
        .await;

    assert_eq!(response.status_code(), 400);
}
