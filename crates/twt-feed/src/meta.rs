//! Feed metadata, scanned from comment lines.
//!
//! Feeds describe themselves in `# key = value` comments. Most keys
//! are single-valued and the *first* occurrence wins; `follow` is the
//! exception and accumulates every occurrence. That asymmetry is
//! observed behavior of deployed feeds, preserved here rather than
//! tidied up.

use crate::ast::Comment;
use crate::twter::Twter;

/// The reserved keys that name the feed's author.
const NICK_KEY: &str = "nick";
/// The reserved keys that carry the feed's canonical URL.
const URL_KEYS: [&str; 2] = ["url", "twturl"];
/// The reserved key for followed feeds; accumulates.
const FOLLOW_KEY: &str = "follow";
/// The reserved key for the author's avatar image.
const AVATAR_KEY: &str = "avatar";
/// The reserved key for the author's tagline.
const DESCRIPTION_KEY: &str = "description";

/// Key/value metadata scanned from a feed's comments, in file order.
#[derive(Clone, Debug, Default)]
pub struct Meta {
    /// Every `key = value` pair, in the order it appeared.
    pairs: Vec<(String, String)>,
}

impl Meta {
    /// Scan a feed's comment lines for metadata pairs.
    pub fn from_comments(comments: &[Comment]) -> Self {
        let mut pairs = Vec::new();
        for comment in comments {
            if let (Some(k), Some(v)) = (comment.key(), comment.value()) {
                pairs.push((k.to_string(), v.to_string()));
            }
        }
        Meta { pairs }
    }

    /// Every metadata pair, in file order.
    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    /// The first value for `key`, if any.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Every value for `key`, in file order.
    pub fn get_all(&self, key: &str) -> Vec<&str> {
        self.pairs
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    /// The feed's advertised nick, first occurrence wins.
    pub fn nick(&self) -> Option<&str> {
        self.get(NICK_KEY)
    }

    /// The feed's advertised canonical URL: the first `url` or
    /// `twturl` value, whichever appears first.
    pub fn url(&self) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| URL_KEYS.contains(&k.as_str()))
            .map(|(_, v)| v.as_str())
    }

    /// The feed's advertised avatar URL, first occurrence wins.
    pub fn avatar(&self) -> Option<&str> {
        self.get(AVATAR_KEY)
    }

    /// The feed's advertised tagline, first occurrence wins.
    pub fn description(&self) -> Option<&str> {
        self.get(DESCRIPTION_KEY)
    }

    /// Every feed the author follows, one `nick url` pair per
    /// `follow` value, accumulated across all occurrences.
    pub fn follows(&self) -> Vec<Twter> {
        self.get_all(FOLLOW_KEY)
            .into_iter()
            .map(|value| match value.split_once(char::is_whitespace) {
                Some((nick, url)) => Twter::new(nick.trim(), url.trim()),
                None => Twter::new("", value),
            })
            .collect()
    }
}
