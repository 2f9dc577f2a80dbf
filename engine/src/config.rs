use std::{
    fs,
    path::{Path, PathBuf},
};

use color_eyre::{
    Result,
    eyre::{WrapErr as _, eyre},
};
use log::debug;
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::image_model::Engine;

pub const CONFIG_FILE_NAME: &str = "tti.ron";
pub const DEFAULT_OUTPUT_ROOT: &str = "public";
/// Environment variable that overrides the Stable Horde api key
pub const API_KEY_VAR: &str = "API_KEY";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub engine: Engine,
    pub output_root: PathBuf,
    pub craiyon: CraiyonConfig,
    pub stable_horde: HordeConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            engine: Engine::default(),
            output_root: DEFAULT_OUTPUT_ROOT.into(),
            craiyon: CraiyonConfig::default(),
            stable_horde: HordeConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CraiyonConfig {
    pub api_url: String,
    /// Base url the relative image paths of a response are resolved against
    pub image_url: String,
    pub version: String,
    pub model: String,
    pub negative_prompt: String,
    pub token: Option<String>,
}

impl Default for CraiyonConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.craiyon.com/v3".into(),
            image_url: "https://img.craiyon.com".into(),
            version: "c4ue22fb7kb6wlac".into(),
            model: "none".into(),
            negative_prompt: String::new(),
            token: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HordeConfig {
    pub api_url: String,
    pub api_key: String,
    pub n: u32,
    pub width: u32,
    pub height: u32,
    pub steps: u32,
    pub cfg_scale: f32,
    pub poll_interval_ms: u64,
}

impl HordeConfig {
    /// The key anonymous users share, lowest priority in the queue.
    pub const ANONYMOUS_KEY: &'static str = "0000000000";
}

impl Default for HordeConfig {
    fn default() -> Self {
        Self {
            api_url: "https://stablehorde.net/api/v2".into(),
            api_key: Self::ANONYMOUS_KEY.into(),
            n: 9,
            width: 512,
            height: 512,
            steps: 7,
            cfg_scale: 7.5,
            poll_interval_ms: 2000,
        }
    }
}

impl Config {
    /// Replaces the Stable Horde key if one is given, empty strings are ignored.
    pub fn with_horde_key(mut self, key: Option<String>) -> Self {
        if let Some(key) = key.filter(|k| !k.is_empty()) {
            self.stable_horde.api_key = key;
        }
        self
    }
}

pub fn load_ron_file<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let src = fs::read_to_string(path)?;
    Ok(ron::from_str(&src)?)
}

pub fn config_path() -> Result<PathBuf> {
    Ok(dirs::config_local_dir()
        .ok_or(eyre!("Couldn't get config dir"))?
        .join(CONFIG_FILE_NAME))
}

/// Loads the config from `path`, or from the default location if none is given.
///
/// An explicitly given file has to exist. A missing file at the default location
/// just means defaults. In both cases `API_KEY` from the environment wins over the
/// Stable Horde key in the file.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let cfg = match path {
        Some(p) => load_ron_file(p).wrap_err_with(|| format!("Couldn't load config {p:?}"))?,
        None => {
            let default_path = config_path()?;
            if default_path.exists() {
                load_ron_file(&default_path)
                    .wrap_err_with(|| format!("Couldn't load config {default_path:?}"))?
            } else {
                debug!("No config at {default_path:?}, using defaults");
                Config::default()
            }
        }
    };
    Ok(cfg.with_horde_key(std::env::var(API_KEY_VAR).ok()))
}
