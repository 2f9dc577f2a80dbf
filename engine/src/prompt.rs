use std::fmt;

use sha2::{Digest, Sha256};

/// The text handed to the image model, built from the words given on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt(String);

impl Prompt {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    /// Joins the words with single spaces, without trimming or collapsing anything.
    pub fn from_args<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut text = String::new();
        for (i, word) in words.into_iter().enumerate() {
            if i > 0 {
                text.push(' ');
            }
            text.push_str(word.as_ref());
        }
        Self(text)
    }

    /// Replaces everything that is not an ASCII letter or a space with a space.
    pub fn sanitized(&self) -> Self {
        Self(
            self.0
                .chars()
                .map(|c| {
                    if c.is_ascii_alphabetic() || c == ' ' {
                        c
                    } else {
                        ' '
                    }
                })
                .collect(),
        )
    }

    pub fn cache_key(&self) -> CacheKey {
        let mut hasher = Sha256::new();
        hasher.update(self.0.as_bytes());
        CacheKey(hex::encode(hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Lowercase hex SHA-256 of a prompt. Doubles as the name of its cache directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    pub const LEN: usize = 64;

    /// Accepts a directory name if it looks like a key, i.e. 64 lowercase hex digits.
    pub fn parse(s: &str) -> Option<Self> {
        let valid = s.len() == Self::LEN
            && s.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
        valid.then(|| Self(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<std::path::Path> for CacheKey {
    fn as_ref(&self) -> &std::path::Path {
        self.0.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_of_known_prompt() {
        let key = Prompt::new("a red fox").cache_key();
        assert_eq!(
            key.as_str(),
            "647c3a6520b87d387c85a08faff768cf92f436d1477dabb951d7c6417813beb4"
        );
    }

    #[test]
    fn key_is_hex_of_utf8_bytes() {
        let key = Prompt::from_args(["café", "at", "night"]).cache_key();
        assert_eq!(
            key.as_str(),
            "1deced67c7bc98109ac874d47b91cb486e212180d031e106eebd145f95a091ee"
        );
        assert_eq!(key.as_str().len(), CacheKey::LEN);
        assert!(
            key.as_str()
                .chars()
                .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
        );
    }

    #[test]
    fn empty_prompt_still_hashes() {
        let prompt = Prompt::from_args(Vec::<String>::new());
        assert!(prompt.is_empty());
        assert_eq!(
            prompt.cache_key().as_str(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn args_are_joined_with_single_spaces() {
        let prompt = Prompt::from_args(["a", "cat", "wearing", "a", "hat"]);
        assert_eq!(prompt.as_str(), "a cat wearing a hat");
        assert_eq!(
            prompt.cache_key(),
            Prompt::new("a cat wearing a hat").cache_key()
        );

        // words that already contain spaces are kept verbatim
        let prompt = Prompt::from_args(["a  red", " fox"]);
        assert_eq!(prompt.as_str(), "a  red  fox");
    }

    #[test]
    fn different_prompts_different_keys() {
        assert_ne!(
            Prompt::new("a red fox").cache_key(),
            Prompt::new("a red fox ").cache_key()
        );
    }

    #[test]
    fn sanitize_replaces_non_letters() {
        let prompt = Prompt::new("R2-D2, 'on' Mars!");
        assert_eq!(prompt.sanitized().as_str(), "R  D    on  Mars ");
        assert_eq!(Prompt::new("é").sanitized().as_str(), " ");
    }

    #[test]
    fn parse_key() {
        let key = Prompt::new("a red fox").cache_key();
        assert_eq!(CacheKey::parse(key.as_str()), Some(key));
        assert_eq!(CacheKey::parse("not-a-key"), None);
        assert_eq!(
            CacheKey::parse("647C3A6520B87D387C85A08FAFF768CF92F436D1477DABB951D7C6417813BEB4"),
            None
        );
    }
}
