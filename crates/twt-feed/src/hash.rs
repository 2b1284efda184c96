//! Content addressing for posts.
//!
//! A post's hash is a pure function of its author's feed URL, its
//! creation time, and its plain text. Independent implementations
//! across federated pods must reduce identical triples to identical
//! hashes: the hash is simultaneously the archive storage key, the
//! default reply-subject anchor, and the de-duplication identifier.
//! Nothing here may ever change without breaking federation.

use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};
use chrono::SecondsFormat;

use crate::ast::Twt;
use crate::fmt::TwtFormat;

/// Number of base-32 characters in a post's content hash.
pub const HASH_LENGTH: usize = 7;

/// BLAKE2b with a 256-bit output.
type Blake2b256 = Blake2b<U32>;

/// Hash an (author URL, creation time, plain text) triple.
///
/// The digest is BLAKE2b-256 over `url + "\n" + RFC 3339 time + "\n"
/// + text`, encoded in unpadded RFC 4648 base-32, lower-cased, and
/// truncated to its last [`HASH_LENGTH`] characters. Base-32 is
/// URL-safe, unlike base-64, and shorter than hex.
pub(crate) fn content_hash(
    url: &str,
    created: chrono::DateTime<chrono::FixedOffset>,
    text: &str,
) -> String {
    let stamp = created.to_rfc3339_opts(SecondsFormat::Secs, true);
    let payload = format!("{}\n{}\n{}", url, stamp, text);
    let mut hasher = Blake2b256::new();
    hasher.update(payload.as_bytes());
    let sum = hasher.finalize();
    let encoded = base32::encode(base32::Alphabet::Rfc4648Lower { padding: false }, &sum);
    encoded[encoded.len() - HASH_LENGTH..].to_string()
}

impl Twt {
    /// The post's 7-character content hash.
    ///
    /// Computed over the policy-free plain-text rendering, so the
    /// result is identical on every pod that sees the post.
    pub fn hash(&self) -> String {
        content_hash(
            &self.twter().url,
            self.created(),
            &self.format_text(TwtFormat::Plain, None),
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::parse::{make_twt, parse_twt};
    use crate::twter::Twter;

    #[test]
    fn reference_hash() {
        // The canonical cross-implementation vector: this exact value
        // is what every other implementation derives for this triple.
        let twter = Twter::new("example", "http://example.org/twtxt.txt");
        let twt = parse_twt("2016-02-03T23:05:00Z\twelcome to twtxt!", &twter).expect("parse");
        assert_eq!(twt.hash(), "wk5q77q");
        assert_eq!(twt.hash().len(), HASH_LENGTH);
    }

    #[test]
    fn composed_and_parsed_posts_hash_alike() {
        let twter = Twter::new("example", "http://example.org/twtxt.txt");
        let created = chrono::DateTime::parse_from_rfc3339("2016-02-03T23:05:00Z")
            .expect("valid timestamp");
        let composed = make_twt(&twter, created, "welcome to twtxt!").expect("compose");
        assert_eq!(composed.hash(), "wk5q77q");
    }

    #[test]
    fn mention_targets_do_not_change_the_hash() {
        // The hash is computed over plain text, so how a mention's
        // target was spelled (or whether it was resolved at all) does
        // not matter.
        let twter = Twter::new("example", "https://example.com/twtxt.txt");
        let resolved = parse_twt(
            "2020-11-13T16:13:22+01:00\t@<prologic https://twtxt.net/user/prologic/twtxt.txt> (#<pdrsg2q https://twtxt.net/search?tag=pdrsg2q>) Thanks!",
            &twter,
        )
        .expect("parse");
        assert_eq!(resolved.hash(), "3htgvza");
        let unresolved = parse_twt(
            "2020-11-13T16:13:22+01:00\t@prologic (#pdrsg2q) Thanks!",
            &twter,
        )
        .expect("parse");
        assert_eq!(unresolved.hash(), "3htgvza");
    }

    #[test]
    fn hash_is_stable_across_calls() {
        let twter = Twter::new("example", "https://example.com/twtxt.txt");
        let twt = parse_twt("2021-01-01T10:45:00Z\thello world", &twter).expect("parse");
        assert_eq!(twt.hash(), twt.hash());
    }

    #[test]
    fn hash_distinguishes_the_triple() {
        let a = Twter::new("a", "https://a.example/twtxt.txt");
        let b = Twter::new("b", "https://b.example/twtxt.txt");
        let t1 = parse_twt("2021-01-01T10:45:00Z\thello", &a).expect("parse");
        let t2 = parse_twt("2021-01-01T10:45:00Z\thello", &b).expect("parse");
        let t3 = parse_twt("2021-01-01T10:45:01Z\thello", &a).expect("parse");
        let t4 = parse_twt("2021-01-01T10:45:00Z\thello!", &a).expect("parse");
        assert_ne!(t1.hash(), t2.hash());
        assert_ne!(t1.hash(), t3.hash());
        assert_ne!(t1.hash(), t4.hash());
    }
}
