use std::time::Duration;

use color_eyre::Result;
use log::debug;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::time::sleep;

use crate::{config::HordeConfig, image_model::ImageApiError};

const CLIENT_AGENT: &str = concat!("tti:", env!("CARGO_PKG_VERSION"), ":unknown");

#[derive(Debug, Serialize)]
pub struct GenerationRequest<'a> {
    pub prompt: &'a str,
    pub params: GenerationParams,
    /// Return images as download urls instead of inline base64
    pub r2: bool,
}

#[derive(Debug, Serialize)]
pub struct GenerationParams {
    pub n: u32,
    pub width: u32,
    pub height: u32,
    pub steps: u32,
    pub cfg_scale: f32,
}

impl<'a> GenerationRequest<'a> {
    pub fn new(prompt: &'a str, cfg: &HordeConfig) -> Self {
        Self {
            prompt,
            params: GenerationParams {
                n: cfg.n,
                width: cfg.width,
                height: cfg.height,
                steps: cfg.steps,
                cfg_scale: cfg.cfg_scale,
            },
            r2: true,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SubmitResponse {
    pub id: String,
    #[serde(default)]
    pub kudos: Option<f64>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CheckResponse {
    pub done: bool,
    #[serde(default)]
    pub faulted: bool,
    #[serde(default = "is_possible_default")]
    pub is_possible: bool,
    #[serde(default)]
    pub queue_position: Option<u64>,
    #[serde(default)]
    pub wait_time: Option<u64>,
}

fn is_possible_default() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct StatusResponse {
    #[serde(default)]
    pub faulted: bool,
    #[serde(default)]
    pub generations: Vec<HordeGeneration>,
}

#[derive(Debug, Deserialize)]
pub struct HordeGeneration {
    /// Download url, since requests are sent with `r2: true`
    pub img: String,
    #[serde(default)]
    pub seed: Option<String>,
    #[serde(default)]
    pub censored: bool,
}

fn endpoint(cfg: &HordeConfig, path: &str) -> String {
    format!("{}/{}", cfg.api_url.trim_end_matches('/'), path)
}

async fn parse_response<T: serde::de::DeserializeOwned>(resp: reqwest::Response) -> Result<T> {
    let status = resp.status();
    let text = resp.text().await?;
    if !status.is_success() {
        return Err(ImageApiError::from_response(status.as_u16(), text).into());
    }
    Ok(serde_json::from_str(&text)?)
}

/// Queues an asynchronous generation and returns its id.
pub async fn submit(prompt: &str, cfg: &HordeConfig, client: &Client) -> Result<SubmitResponse> {
    let resp = client
        .post(endpoint(cfg, "generate/async"))
        .header("accept", "application/json")
        .header("apikey", &cfg.api_key)
        .header("Client-Agent", CLIENT_AGENT)
        .json(&GenerationRequest::new(prompt, cfg))
        .send()
        .await?;
    parse_response(resp).await
}

pub async fn check(id: &str, cfg: &HordeConfig, client: &Client) -> Result<CheckResponse> {
    let resp = client
        .get(endpoint(cfg, &format!("generate/check/{id}")))
        .header("Client-Agent", CLIENT_AGENT)
        .send()
        .await?;
    parse_response(resp).await
}

pub async fn status(id: &str, cfg: &HordeConfig, client: &Client) -> Result<StatusResponse> {
    let resp = client
        .get(endpoint(cfg, &format!("generate/status/{id}")))
        .header("Client-Agent", CLIENT_AGENT)
        .send()
        .await?;
    parse_response(resp).await
}

/// Polls the job until the horde reports it done, then returns the finished generations.
pub async fn wait_for_generations(
    id: &str,
    cfg: &HordeConfig,
    client: &Client,
) -> Result<StatusResponse> {
    loop {
        let progress = check(id, cfg, client).await?;
        debug!(
            "Horde job {id}: done: {}, queue position: {:?}, wait time: {:?}s",
            progress.done, progress.queue_position, progress.wait_time
        );

        if progress.faulted {
            return Err(ImageApiError::Faulted { id: id.into() }.into());
        }
        if !progress.is_possible {
            return Err(ImageApiError::Impossible { id: id.into() }.into());
        }
        if progress.done {
            break;
        }
        sleep(Duration::from_millis(cfg.poll_interval_ms)).await;
    }

    let result = status(id, cfg, client).await?;
    if result.faulted {
        return Err(ImageApiError::Faulted { id: id.into() }.into());
    }
    Ok(result)
}
