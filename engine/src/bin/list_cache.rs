use std::path::PathBuf;

use clap::Parser;
use color_eyre::Result;
use engine::{cache::Cache, config::load_config};

/// Prints every cached prompt with its number of images
#[derive(clap::Parser)]
struct Cli {
    /// Output root to scan, defaults to the configured one
    root: Option<PathBuf>,
}

pub fn main() -> Result<()> {
    pretty_env_logger::init();
    color_eyre::install()?;
    let Cli { root } = Cli::parse();
    let root = match root {
        Some(root) => root,
        None => load_config(None)?.output_root,
    };

    let cache = Cache::new(root);
    let entries = cache.entries()?;
    if entries.is_empty() {
        println!("No cached prompts in {}", cache.root().display());
    }
    for entry in entries {
        println!(
            "{}  {} images  {}",
            entry.key,
            entry.images.len(),
            entry.query.as_deref().unwrap_or("<no query>")
        );
    }
    Ok(())
}
