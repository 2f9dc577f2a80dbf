//! Runs the Craiyon and Stable Horde clients against a wiremock server.

use std::fs;

use color_eyre::{Report, Result};
use engine::{
    cache::{Cache, Outcome},
    config::{CraiyonConfig, HordeConfig},
    image_model::{Craiyon, ImageApiError, ImageModel, StableHorde},
    prompt::Prompt,
};
use serde_json::json;
use tempfile::tempdir;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_partial_json, header, method, path},
};

const WEBP: &[u8] = b"RIFF\0\0\0\0WEBPVP8 ";

fn horde_config(server: &MockServer) -> HordeConfig {
    HordeConfig {
        api_url: format!("{}/api/v2", server.uri()),
        api_key: "test-key".into(),
        n: 1,
        poll_interval_ms: 0,
        ..HordeConfig::default()
    }
}

fn craiyon_config(server: &MockServer) -> CraiyonConfig {
    CraiyonConfig {
        api_url: format!("{}/v3", server.uri()),
        image_url: server.uri(),
        ..CraiyonConfig::default()
    }
}

fn api_error(err: &Report) -> &ImageApiError {
    err.downcast_ref::<ImageApiError>()
        .unwrap_or_else(|| panic!("expected an ImageApiError, got {err:?}"))
}

async fn mount_submit(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/api/v2/generate/async"))
        .and(header("apikey", "test-key"))
        .and(body_partial_json(json!({"prompt": "a red fox", "params": {"n": 1}})))
        .respond_with(ResponseTemplate::new(202).set_body_json(json!({"id": "job-1", "kudos": 10.0})))
        .expect(1)
        .mount(server)
        .await;
}

async fn mount_check(server: &MockServer, body: serde_json::Value, times: u64) {
    Mock::given(method("GET"))
        .and(path("/api/v2/generate/check/job-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .up_to_n_times(times)
        .expect(times)
        .mount(server)
        .await;
}

#[tokio::test]
async fn horde_polls_until_done_then_downloads() -> Result<()> {
    let server = MockServer::start().await;
    mount_submit(&server).await;
    mount_check(&server, json!({"done": false, "queue_position": 2, "wait_time": 5}), 1).await;
    mount_check(&server, json!({"done": true}), 1).await;
    Mock::given(method("GET"))
        .and(path("/api/v2/generate/status/job-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "done": true,
            "faulted": false,
            "generations": [{"img": format!("{}/r2/fox.webp", server.uri()), "seed": "7", "censored": false}],
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/r2/fox.webp"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(WEBP, "image/webp"))
        .expect(1)
        .mount(&server)
        .await;

    let generation = StableHorde::new(horde_config(&server))
        .generate("a red fox")
        .await?;

    assert_eq!(generation.images.len(), 1);
    assert_eq!(generation.images[0].data, WEBP);
    assert_eq!(generation.images[0].extension, "webp");
    Ok(())
}

#[tokio::test]
async fn horde_faulted_job() {
    let server = MockServer::start().await;
    mount_submit(&server).await;
    mount_check(&server, json!({"done": false, "faulted": true}), 1).await;

    let err = StableHorde::new(horde_config(&server))
        .generate("a red fox")
        .await
        .unwrap_err();

    assert!(matches!(api_error(&err), ImageApiError::Faulted { id } if id == "job-1"));
}

#[tokio::test]
async fn horde_impossible_job() {
    let server = MockServer::start().await;
    mount_submit(&server).await;
    mount_check(&server, json!({"done": false, "is_possible": false}), 1).await;

    let err = StableHorde::new(horde_config(&server))
        .generate("a red fox")
        .await
        .unwrap_err();

    assert!(matches!(api_error(&err), ImageApiError::Impossible { .. }));
}

#[tokio::test]
async fn horde_moderated_prompt() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v2/generate/async"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "message": "This prompt appears to violate our terms of service and was moderated",
            "rc": "CorruptPrompt",
        })))
        .mount(&server)
        .await;

    let err = StableHorde::new(horde_config(&server))
        .generate("a red fox")
        .await
        .unwrap_err();

    assert!(matches!(api_error(&err), ImageApiError::Moderated { .. }));
}

#[tokio::test]
async fn craiyon_missing_image() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"images": ["img/gone.webp"]})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/img/gone.webp"))
        .respond_with(ResponseTemplate::new(404).set_body_string("not here"))
        .mount(&server)
        .await;

    let err = Craiyon::new(craiyon_config(&server))
        .generate("a red fox")
        .await
        .unwrap_err();

    assert!(matches!(
        api_error(&err),
        ImageApiError::Status { status: 404, body } if body == "not here"
    ));
}

#[tokio::test]
async fn craiyon_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v3"))
        .respond_with(ResponseTemplate::new(500).set_body_string("oops"))
        .mount(&server)
        .await;

    let err = Craiyon::new(craiyon_config(&server))
        .generate("a red fox")
        .await
        .unwrap_err();

    assert!(matches!(api_error(&err), ImageApiError::Status { status: 500, .. }));
}

#[tokio::test]
async fn craiyon_into_cache() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v3"))
        .and(body_partial_json(json!({"prompt": "a red fox", "version": "c4ue22fb7kb6wlac"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "images": ["img/fox-1.webp", "/img/fox-2.jpeg"],
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/img/fox-1.webp"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(WEBP, "image/webp"))
        .expect(1)
        .mount(&server)
        .await;
    // no usable content type, the extension comes from the url
    Mock::given(method("GET"))
        .and(path("/img/fox-2.jpeg"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(b"jpeg".to_vec(), "application/octet-stream"))
        .expect(1)
        .mount(&server)
        .await;

    let tmp = tempdir()?;
    let cache = Cache::new(tmp.path().join("public"));
    let model = Craiyon::new(craiyon_config(&server));
    let prompt = Prompt::from_args(["a", "red", "fox"]);

    let outcome = cache.generate(&prompt, &model).await?;
    let dir = tmp
        .path()
        .join("public/647c3a6520b87d387c85a08faff768cf92f436d1477dabb951d7c6417813beb4");
    assert_eq!(
        outcome,
        Outcome::Generated {
            dir: dir.clone(),
            images: vec![dir.join("image-1.webp"), dir.join("image-2.jpeg")],
        }
    );
    assert_eq!(fs::read(dir.join("image-1.webp"))?, WEBP);
    assert_eq!(fs::read(dir.join("image-2.jpeg"))?, b"jpeg");
    assert_eq!(fs::read_to_string(dir.join("query"))?, "a red fox");

    // the second run never reaches the server, the mocks above expect exactly one call
    assert_eq!(cache.generate(&prompt, &model).await?, Outcome::Cached { dir });
    Ok(())
}
