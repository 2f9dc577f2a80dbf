use color_eyre::Result;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::{
    config::CraiyonConfig,
    image_model::{Image, ImageApiError, download_image},
};

#[derive(Debug, Serialize)]
pub struct GenerateRequest<'a> {
    pub prompt: &'a str,
    pub version: &'a str,
    pub token: Option<&'a str>,
    pub model: &'a str,
    pub negative_prompt: &'a str,
}

impl<'a> GenerateRequest<'a> {
    pub fn new(prompt: &'a str, cfg: &'a CraiyonConfig) -> Self {
        Self {
            prompt,
            version: &cfg.version,
            token: cfg.token.as_deref(),
            model: &cfg.model,
            negative_prompt: &cfg.negative_prompt,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct GenerateResponse {
    /// Paths relative to the image host, e.g. `img/2024-01-01/abc.webp`
    pub images: Vec<String>,
}

/// Sends the prompt to Craiyon. The call blocks until the images are ready, which can take a minute.
pub async fn generate(prompt: &str, cfg: &CraiyonConfig, client: &Client) -> Result<GenerateResponse> {
    let resp = client
        .post(&cfg.api_url)
        .header("accept", "application/json")
        .json(&GenerateRequest::new(prompt, cfg))
        .send()
        .await?;

    let status = resp.status();
    let text = resp.text().await?;
    if !status.is_success() {
        return Err(ImageApiError::from_response(status.as_u16(), text).into());
    }

    Ok(serde_json::from_str(&text)?)
}

pub fn image_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}

pub async fn fetch_images(
    response: &GenerateResponse,
    cfg: &CraiyonConfig,
    client: &Client,
) -> Result<Vec<Image>> {
    let mut images = Vec::with_capacity(response.images.len());
    for path in &response.images {
        images.push(download_image(client, &image_url(&cfg.image_url, path)).await?);
    }
    Ok(images)
}
