// ABOUTME: End-to-end tests for the ask flow against a mocked chat-completions API
// ABOUTME: Covers image preparation, the initial multimodal request and follow-up history

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use mockito::{Matcher, Server, ServerGuard};
use partlens_cli::config::{Config, ConfigImages};
use partlens_cli::conversation::{Conversation, FormField};
use partlens_cli::images::{prepare_images, summarize};
use partlens_cli::session::{Reply, RequestSettings, Session};
use partlens_sdk::{ChatClient, ErrorKind, SecretString};
use serde_json::json;
use std::path::PathBuf;
use tempfile::TempDir;

const PATH: &str = "/v1/chat/completions";

fn write_photo(dir: &TempDir, name: &str, width: u32, height: u32) -> PathBuf {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
    });
    let path = dir.path().join(name);
    DynamicImage::ImageRgb8(img)
        .save_with_format(&path, ImageFormat::Png)
        .expect("Should write test image");
    path
}

fn settings(model: &str) -> RequestSettings {
    RequestSettings {
        model: model.to_string(),
        temperature: 0.2,
        max_tokens: 400,
    }
}

fn client(server: &ServerGuard) -> ChatClient {
    ChatClient::builder()
        .api_key(SecretString::new("sk-test".to_string().into_boxed_str()))
        .endpoint(Some(format!("{}{}", server.url(), PATH)))
        .build()
        .expect("Should build client")
}

#[tokio::test]
async fn test_prepare_images_compresses_in_order() {
    let dir = TempDir::new().unwrap();
    let paths = vec![
        write_photo(&dir, "wide.png", 400, 100),
        write_photo(&dir, "small.png", 20, 20),
    ];

    let config = Config {
        images: Some(ConfigImages {
            max_dimension: Some(200),
            ..Default::default()
        }),
        ..Default::default()
    };

    let images = prepare_images(&paths, config.ingest_config(), false)
        .await
        .expect("Should prepare images");

    assert_eq!(images.len(), 2);
    assert_eq!(images[0].index, 0);
    assert_eq!(images[0].name, "wide.png");
    assert_eq!(images[1].name, "small.png");
    assert!(images.iter().all(|image| image.mime_type == "image/jpeg"));
    assert!(images
        .iter()
        .all(|image| image.data_uri.as_deref().unwrap().starts_with("data:image/jpeg;base64,")));

    let summaries = summarize(&images, 1_500_000);
    assert!(summaries.iter().all(|summary| !summary.over_budget));
}

#[tokio::test]
async fn test_rejects_unsupported_file_type() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("notes.txt");
    std::fs::write(&path, "not an image").unwrap();

    let err = prepare_images(&[path], Config::default().ingest_config(), false)
        .await
        .unwrap_err();
    let sdk_err = err
        .downcast_ref::<partlens_sdk::PartlensError>()
        .expect("Should be an SDK error");
    assert_eq!(sdk_err.kind(), ErrorKind::Validation);
}

#[tokio::test]
async fn test_ask_then_follow_up() {
    let dir = TempDir::new().unwrap();
    let paths = vec![write_photo(&dir, "gear.png", 64, 64)];
    let images = prepare_images(&paths, Config::default().ingest_config(), false)
        .await
        .unwrap();

    let mut server = Server::new_async().await;
    let initial = server
        .mock("POST", PATH)
        .match_header("authorization", "Bearer sk-test")
        .match_body(Matcher::AllOf(vec![
            Matcher::PartialJson(json!({
                "model": "gpt-4o",
                "temperature": 0.2,
                "max_tokens": 400,
                "messages": [{ "role": "system", "content": "persona" }]
            })),
            Matcher::Regex(r#""type":"image_url""#.to_string()),
            Matcher::Regex(r#"\*\*Machine:\*\* Komori L-40"#.to_string()),
        ]))
        .with_status(200)
        .with_body(r#"{"choices":[{"message":{"content":"It is a gripper cam."}}]}"#)
        .expect(1)
        .create_async()
        .await;

    let mut session = Session::connected(client(&server), settings("gpt-4o"), Conversation::new("persona"));
    let reply = session
        .start(
            "Identify.",
            &[FormField::new("Machine", "Komori L-40")],
            &images,
        )
        .await
        .unwrap();

    initial.assert_async().await;
    assert_eq!(reply, Reply::Answer("It is a gripper cam.".to_string()));
    assert_eq!(session.conversation().history().len(), 2);

    initial.remove_async().await;
    let follow_up = server
        .mock("POST", PATH)
        .match_body(Matcher::PartialJson(json!({
            "messages": [
                { "role": "system", "content": "persona" },
                { "role": "user" },
                { "role": "assistant", "content": "It is a gripper cam." },
                { "role": "user", "content": "Which bearing does it use?" }
            ]
        })))
        .with_status(200)
        .with_body(r#"{"choices":[{"message":{"content":"A 6202-2RS bearing."}}]}"#)
        .expect(1)
        .create_async()
        .await;

    let reply = session.follow_up("Which bearing does it use?").await.unwrap();

    follow_up.assert_async().await;
    assert_eq!(reply, Reply::Answer("A 6202-2RS bearing.".to_string()));
    assert_eq!(session.conversation().history().len(), 4);
}

#[tokio::test]
async fn test_failed_turn_is_not_recorded() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", PATH)
        .with_status(401)
        .with_body(r#"{"error":{"message":"Incorrect API key provided"}}"#)
        .create_async()
        .await;

    let mut session = Session::connected(client(&server), settings("gpt-5"), Conversation::new("persona"));
    let err = session
        .start("Identify.", &[FormField::new("Machine", "GTO 46")], &[])
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(401));
    assert_eq!(err.user_message(), "Invalid API key.");
    assert!(session.conversation().history().is_empty());
}
