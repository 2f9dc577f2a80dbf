use std::{future::Future, pin::Pin};

use color_eyre::Result;
use log::{debug, info, warn};

use crate::{
    config::HordeConfig,
    image_model::{Engine, Generation, ImageApiError, ImageModel, download_image},
};

pub mod horde_api;

#[derive(Clone)]
pub struct StableHorde {
    cfg: HordeConfig,
    client: reqwest::Client,
}

impl StableHorde {
    pub fn new(cfg: HordeConfig) -> Self {
        Self {
            cfg,
            client: reqwest::Client::new(),
        }
    }
}

impl ImageModel for StableHorde {
    fn generate<'a>(
        &'a self,
        prompt: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Generation>> + Send + 'a>> {
        Box::pin(async move {
            let submitted = horde_api::submit(prompt, &self.cfg, &self.client).await?;
            info!(
                "Queued horde job {} ({} kudos)",
                submitted.id,
                submitted.kudos.unwrap_or_default()
            );
            if let Some(message) = &submitted.message {
                warn!("Horde: {message}");
            }

            let finished =
                horde_api::wait_for_generations(&submitted.id, &self.cfg, &self.client).await?;
            if finished.generations.is_empty() {
                return Err(ImageApiError::NoImages.into());
            }

            let mut images = Vec::with_capacity(finished.generations.len());
            for generation in &finished.generations {
                if generation.censored {
                    warn!("Horde censored an image of job {}", submitted.id);
                }
                debug!("Fetching {} (seed {:?})", generation.img, generation.seed);
                images.push(download_image(&self.client, &generation.img).await?);
            }
            Ok(Generation { images })
        })
    }

    fn engine(&self) -> Engine {
        Engine::StableHorde
    }
}
