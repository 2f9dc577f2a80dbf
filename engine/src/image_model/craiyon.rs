use std::{future::Future, pin::Pin};

use color_eyre::Result;
use log::debug;

use crate::{
    config::CraiyonConfig,
    image_model::{Engine, Generation, ImageApiError, ImageModel},
};

pub mod craiyon_api;

#[derive(Clone)]
pub struct Craiyon {
    cfg: CraiyonConfig,
    client: reqwest::Client,
}

impl Craiyon {
    pub fn new(cfg: CraiyonConfig) -> Self {
        Self {
            cfg,
            client: reqwest::Client::new(),
        }
    }
}

impl ImageModel for Craiyon {
    fn generate<'a>(
        &'a self,
        prompt: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Generation>> + Send + 'a>> {
        Box::pin(async move {
            let response = craiyon_api::generate(prompt, &self.cfg, &self.client).await?;
            debug!("Craiyon response: {response:#?}");
            if response.images.is_empty() {
                return Err(ImageApiError::NoImages.into());
            }
            let images = craiyon_api::fetch_images(&response, &self.cfg, &self.client).await?;
            Ok(Generation { images })
        })
    }

    fn engine(&self) -> Engine {
        Engine::Craiyon
    }
}
