use std::path::PathBuf;

use engine::{image_model::Engine, prompt::Prompt};

/// Generates images for a prompt once and keeps them in a directory named by its sha256
#[derive(Debug, clap::Parser)]
#[command(version)]
pub struct Cli {
    /// Image service to use, overrides the config file
    #[arg(short, long)]
    pub engine: Option<Engine>,

    /// Directory the cache entries are created in [default: public]
    #[arg(short, long)]
    pub root: Option<PathBuf>,

    /// RON config file, defaults to tti.ron in the local config dir
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Replace everything but letters and spaces with spaces before hashing
    #[arg(long)]
    pub sanitize: bool,

    /// Delete an existing entry for the prompt and generate again
    #[arg(long)]
    pub force: bool,

    /// The prompt, words are joined with single spaces. Put `--` in front of a prompt
    /// that starts with something that looks like an option.
    #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
    pub words: Vec<String>,
}

impl Cli {
    pub fn prompt(&self) -> Prompt {
        let prompt = Prompt::from_args(&self.words);
        if self.sanitize {
            prompt.sanitized()
        } else {
            prompt
        }
    }
}
