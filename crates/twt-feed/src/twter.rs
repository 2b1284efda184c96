//! Feed author identities.

use crate::util::url_host;
use std::hash::{Hash, Hasher};

/// The identity of a feed's author: a nickname plus the canonical URL
/// of the feed it was seen in.
///
/// Two `Twter`s denote the same author exactly when their URLs are
/// equal; the nick, avatar, and tagline are presentation data. Fields
/// use the empty string for "unset".
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Twter {
    /// The author's nickname.
    pub nick: String,
    /// The canonical URL of the author's feed.
    pub url: String,
    /// URL of an avatar image, if the feed advertises one.
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "String::is_empty")
    )]
    pub avatar: String,
    /// A one-line description of the feed, if it advertises one.
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "String::is_empty")
    )]
    pub tagline: String,
}

impl Twter {
    /// Construct an identity from a nick and a feed URL.
    pub fn new(nick: &str, url: &str) -> Self {
        Twter {
            nick: nick.into(),
            url: url.into(),
            ..Twter::default()
        }
    }

    /// Return the host of the feed URL, or the empty string.
    pub fn domain(&self) -> &str {
        url_host(&self.url)
    }

    /// Return true if this identity carries no information at all.
    pub fn is_zero(&self) -> bool {
        self.nick.is_empty() && self.url.is_empty()
    }
}

impl PartialEq for Twter {
    fn eq(&self, other: &Self) -> bool {
        self.url == other.url
    }
}
impl Eq for Twter {}

impl Hash for Twter {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.url.hash(state);
    }
}
