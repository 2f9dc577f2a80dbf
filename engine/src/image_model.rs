use std::{
    fs,
    future::Future,
    path::{Path, PathBuf},
    pin::Pin,
};

use color_eyre::Result;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

pub mod craiyon;
pub use craiyon::Craiyon;

pub mod stable_horde;
pub use stable_horde::StableHorde;

mod error;
pub use error::ImageApiError;

use crate::{ImgModBox, config::Config};

#[derive(
    Debug,
    Clone,
    Copy,
    Display,
    clap::ValueEnum,
    Serialize,
    Deserialize,
    Hash,
    PartialEq,
    Eq,
    EnumIter,
    Default,
)]
#[serde(rename_all = "snake_case")]
pub enum Engine {
    #[default]
    Craiyon,
    #[strum(to_string = "Stable Horde")]
    StableHorde,
}

impl Engine {
    pub fn make(&self, config: &Config) -> ImgModBox {
        match self {
            Engine::Craiyon => Box::new(Craiyon::new(config.craiyon.clone())),
            Engine::StableHorde => Box::new(StableHorde::new(config.stable_horde.clone())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    pub data: Vec<u8>,
    /// File extension without the dot, e.g. `webp`
    pub extension: String,
}

/// Everything one request to an image service produced.
#[derive(Debug, Default)]
pub struct Generation {
    pub images: Vec<Image>,
}

impl Generation {
    /// Writes the images as `image-1.<ext>`, `image-2.<ext>`, ... into `dir`, which must exist.
    pub fn save_images(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let mut paths = Vec::with_capacity(self.images.len());
        for (i, image) in self.images.iter().enumerate() {
            let path = dir.join(format!("image-{}.{}", i + 1, image.extension));
            fs::write(&path, &image.data)?;
            debug!("Wrote {} bytes to {path:?}", image.data.len());
            paths.push(path);
        }
        info!("Saved {} images to {dir:?}", paths.len());
        Ok(paths)
    }
}

pub trait ImageModel {
    fn generate<'a>(
        &'a self,
        prompt: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Generation>> + Send + 'a>>;

    fn engine(&self) -> Engine;
}

/// Picks a file extension from the response's content type, then from the url.
pub fn image_extension(content_type: Option<&str>, url: &str) -> String {
    let from_mime = content_type
        .and_then(|ct| ct.split(';').next())
        .and_then(|mime| mime.trim().strip_prefix("image/"))
        .map(|sub| match sub {
            "jpeg" => "jpg",
            "svg+xml" => "svg",
            other => other,
        })
        .filter(|ext| !ext.is_empty());
    if let Some(ext) = from_mime {
        return ext.to_string();
    }

    let path = url.split(['?', '#']).next().unwrap_or(url);
    path.rsplit('/')
        .next()
        .and_then(|file| file.rsplit_once('.'))
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .unwrap_or_else(|| "png".to_string())
}

/// Fetches an image url and turns the body into an [`Image`].
pub(crate) async fn download_image(client: &reqwest::Client, url: &str) -> Result<Image> {
    let resp = client.get(url).send().await?;
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(ImageApiError::Status {
            status: status.as_u16(),
            body,
        }
        .into());
    }

    let content_type = resp
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let data = resp.bytes().await?.to_vec();
    debug!("Downloaded {} bytes from {url} ({content_type:?})", data.len());

    Ok(Image {
        extension: image_extension(content_type.as_deref(), url),
        data,
    })
}
