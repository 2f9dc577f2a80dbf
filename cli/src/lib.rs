use color_eyre::Result;
use engine::{
    cache::{Cache, Outcome},
    config::{Config, load_config},
    image_model::ImageModel,
};
use log::{info, warn};

pub mod cli;
pub use cli::Cli;

/// Loads the config file and lets the command line win over it.
pub fn resolve_config(cli: &Cli) -> Result<Config> {
    let mut cfg = load_config(cli.config.as_deref())?;
    if let Some(engine) = cli.engine {
        cfg.engine = engine;
    }
    if let Some(root) = &cli.root {
        cfg.output_root = root.clone();
    }
    Ok(cfg)
}

pub async fn run(cli: &Cli, cfg: &Config, model: &dyn ImageModel) -> Result<Outcome> {
    let prompt = cli.prompt();
    if prompt.is_empty() {
        warn!("The prompt is empty");
    }
    let cache = Cache::new(&cfg.output_root);

    if cli.force && cache.remove(&prompt.cache_key())? {
        info!("Regenerating {:?}", prompt.as_str());
    }
    cache.generate(&prompt, model).await
}
