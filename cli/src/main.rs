use clap::Parser;
use color_eyre::Result;
use engine::cache::Outcome;
use log::debug;
use tti::{Cli, resolve_config, run};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    pretty_env_logger::init();
    color_eyre::install()?;
    let cli = Cli::parse();
    let cfg = resolve_config(&cli)?;
    debug!("Using {} with output root {:?}", cfg.engine, cfg.output_root);

    let model = cfg.engine.make(&cfg);
    match run(&cli, &cfg, &*model).await? {
        Outcome::Generated { dir, images } => {
            println!("Saved {} images to {}", images.len(), dir.display());
        }
        Outcome::Cached { dir } => debug!("{} exists, skipped", dir.display()),
    }

    Ok(())
}
