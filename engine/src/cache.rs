//! # Cache Module
//!
//! Generated images live in one directory per prompt, named by the prompt's
//! [`CacheKey`]:
//!
//! ```text
//! <root>/
//!   <sha256-hex>/
//!     query          the prompt, verbatim
//!     image-1.webp
//!     image-2.webp
//!     ...
//! ```
//!
//! The existence of `<root>/<key>` is the only thing that counts as a hit. A directory
//! left behind by a run that failed halfway is a hit as well, it has to be removed
//! (see [`Cache::remove`]) to generate again.

use std::{
    fs,
    path::{Path, PathBuf},
};

use color_eyre::{Result, eyre::WrapErr as _};
use log::{debug, info};

use crate::{
    image_model::ImageModel,
    prompt::{CacheKey, Prompt},
};

pub const QUERY_FILE_NAME: &str = "query";

#[derive(Debug, Clone)]
pub struct Cache {
    root: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    Hit(PathBuf),
    Miss(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The directory already existed, nothing was requested or written.
    Cached { dir: PathBuf },
    Generated { dir: PathBuf, images: Vec<PathBuf> },
}

impl Outcome {
    pub fn dir(&self) -> &Path {
        match self {
            Outcome::Cached { dir } | Outcome::Generated { dir, .. } => dir,
        }
    }
}

/// What a cache directory holds, as far as it can be read back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub key: CacheKey,
    /// `None` if the run died before the query file was written
    pub query: Option<String>,
    pub images: Vec<PathBuf>,
}

impl Cache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn entry_dir(&self, key: &CacheKey) -> PathBuf {
        self.root.join(key)
    }

    /// Anything at the entry path is a hit, including a symlink whose target is gone.
    pub fn status(&self, key: &CacheKey) -> Status {
        let dir = self.entry_dir(key);
        if fs::symlink_metadata(&dir).is_ok() {
            Status::Hit(dir)
        } else {
            Status::Miss(dir)
        }
    }

    /// Generates images for `prompt` unless its directory exists already.
    ///
    /// On a miss the directory and the query file are written before the model is
    /// called. Errors are passed on as they are and whatever was written stays on disk.
    pub async fn generate(&self, prompt: &Prompt, model: &dyn ImageModel) -> Result<Outcome> {
        let key = prompt.cache_key();
        let dir = match self.status(&key) {
            Status::Hit(dir) => {
                info!("Cache hit for {key}, nothing to do");
                return Ok(Outcome::Cached { dir });
            }
            Status::Miss(dir) => dir,
        };

        info!("Cache miss for {key}, generating with {}", model.engine());
        fs::create_dir_all(&self.root)
            .wrap_err_with(|| format!("Couldn't create output root {:?}", self.root))?;
        fs::create_dir(&dir).wrap_err_with(|| format!("Couldn't create {dir:?}"))?;
        fs::write(dir.join(QUERY_FILE_NAME), prompt.as_str())?;
        debug!("Wrote query to {dir:?}");

        let generation = model.generate(prompt.as_str()).await?;
        let images = generation.save_images(&dir)?;
        Ok(Outcome::Generated { dir, images })
    }

    /// Deletes the directory of `key`. Returns whether there was one.
    pub fn remove(&self, key: &CacheKey) -> Result<bool> {
        match self.status(key) {
            Status::Hit(dir) => {
                fs::remove_dir_all(&dir).wrap_err_with(|| format!("Couldn't remove {dir:?}"))?;
                info!("Removed cache entry {key}");
                Ok(true)
            }
            Status::Miss(_) => Ok(false),
        }
    }

    pub fn read_entry(&self, key: &CacheKey) -> Result<Option<Entry>> {
        let dir = match self.status(key) {
            Status::Hit(dir) => dir,
            Status::Miss(_) => return Ok(None),
        };

        let query_path = dir.join(QUERY_FILE_NAME);
        let query = if query_path.exists() {
            Some(fs::read_to_string(&query_path)?)
        } else {
            None
        };

        let mut images = vec![];
        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            if image_index(&path).is_some() {
                images.push(path);
            }
        }
        images.sort_by_key(|p| image_index(p));

        Ok(Some(Entry {
            key: key.clone(),
            query,
            images,
        }))
    }

    /// All entries under the root, sorted by key. A missing root is an empty cache.
    pub fn entries(&self) -> Result<Vec<Entry>> {
        if !self.root.exists() {
            return Ok(vec![]);
        }

        let mut res = vec![];
        for dir_entry in fs::read_dir(&self.root)? {
            let dir_entry = dir_entry?;
            if !dir_entry.file_type()?.is_dir() {
                continue;
            }
            let name = dir_entry.file_name();
            let Some(key) = name.to_str().and_then(CacheKey::parse) else {
                debug!("Skipping {:?}, not a cache key", dir_entry.path());
                continue;
            };
            if let Some(entry) = self.read_entry(&key)? {
                res.push(entry);
            }
        }
        res.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(res)
    }
}

/// `image-3.webp` -> `Some(3)`
fn image_index(path: &Path) -> Option<usize> {
    path.file_stem()?
        .to_str()?
        .strip_prefix("image-")?
        .parse()
        .ok()
}
