//! One-shot link expansion for composed posts.
//!
//! A locally written post mentions people by name (`@asdf`) and tags
//! topics without search targets (`#topic`). Before such a post is
//! served to other pods, its empty targets are filled in: names are
//! resolved through a caller-supplied lookup, tag search URLs come
//! from the [`UrlPolicy`]. This is the only place the engine consults
//! anything outside the post; the parser itself never does I/O.

use crate::ast::{Elem, Mention, Subject, Tag, Twt};
use crate::fmt::UrlPolicy;
use crate::twter::Twter;

impl Twt {
    /// Return a copy of this post with unresolved mention and tag
    /// targets filled in.
    ///
    /// Mentions that already carry a target, and tags that already
    /// carry one, are untouched, so the pass is idempotent. Rewritten
    /// elements take the canonical `@<nick url>` / `#<tag url>`
    /// spelling; everything else keeps its original bytes. The source
    /// post is not modified.
    pub fn expand_links<F>(&self, policy: &dyn UrlPolicy, lookup: F) -> Twt
    where
        F: Fn(&str) -> Option<Twter>,
    {
        let elems = self
            .elems()
            .iter()
            .map(|elem| expand_elem(elem, policy, &lookup))
            .collect();
        Twt::new(self.twter().clone(), self.date_time().clone(), elems)
    }
}

/// Expand a single element, cloning it when nothing applies.
fn expand_elem<F>(elem: &Elem, policy: &dyn UrlPolicy, lookup: &F) -> Elem
where
    F: Fn(&str) -> Option<Twter>,
{
    match elem {
        Elem::Mention(m) if m.is_unresolved() && !m.name().is_empty() => {
            let label = if m.explicit_domain().is_empty() {
                m.name().to_string()
            } else {
                format!("{}@{}", m.name(), m.explicit_domain())
            };
            match lookup(&label) {
                Some(twter) => Elem::Mention(Mention::new(&twter.nick, &twter.url)),
                None => elem.clone(),
            }
        }
        Elem::Tag(t) if t.is_unresolved() && !t.text().is_empty() => {
            Elem::Tag(Tag::new(t.text(), &policy.tag_url(t.text())))
        }
        Elem::Subject(s) => match s.tag() {
            Some(t) if t.is_unresolved() && !t.text().is_empty() => {
                Elem::Subject(Subject::from_tag(t.text(), &policy.tag_url(t.text())))
            }
            _ => elem.clone(),
        },
        _ => elem.clone(),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::parse::make_twt;

    /// A policy for a pod at example.com.
    struct TestPolicy;
    impl UrlPolicy for TestPolicy {
        fn is_local_url(&self, url: &str) -> bool {
            url.starts_with("http://example.com/")
        }
        fn user_url(&self, nick: &str) -> String {
            format!("http://example.com/user/{}", nick)
        }
        fn external_url(&self, nick: &str, uri: &str) -> String {
            format!("http://example.com/external?uri={}&nick={}", uri, nick)
        }
        fn tag_url(&self, tag: &str) -> String {
            format!("http://example.com/search?tag={}", tag)
        }
    }

    fn compose(body: &str) -> Twt {
        let twter = Twter::new("example", "http://example.com/example.txt");
        let created = chrono::DateTime::parse_from_rfc3339("2021-01-01T10:45:00Z")
            .expect("valid timestamp");
        make_twt(&twter, created, body).expect("compose")
    }

    #[test]
    fn fills_unresolved_mentions() {
        let twt = compose("@asdf hello");
        let expanded = twt.expand_links(&TestPolicy, |name| {
            assert_eq!(name, "asdf");
            Some(Twter::new("asdf", "http://example.com/asdf.txt"))
        });
        let mentions = expanded.mentions();
        assert_eq!(mentions.len(), 1);
        assert_eq!(mentions[0].name(), "asdf");
        assert_eq!(mentions[0].target(), "http://example.com/asdf.txt");
        assert_eq!(
            mentions[0].literal(),
            "@<asdf http://example.com/asdf.txt>"
        );
        // The source post is untouched.
        assert_eq!(twt.mentions()[0].target(), "");
    }

    #[test]
    fn fills_unresolved_tags_and_subjects() {
        let twt = compose("(#abcdefg) more on #topic");
        let expanded = twt.expand_links(&TestPolicy, |_| None);
        let tags = expanded.tags();
        assert_eq!(tags.len(), 2);
        assert_eq!(tags[0].target(), "http://example.com/search?tag=abcdefg");
        assert_eq!(tags[1].target(), "http://example.com/search?tag=topic");
        assert!(expanded.subject().is_some());
    }

    #[test]
    fn expansion_is_idempotent() {
        let twt = compose("@asdf (#abc) #topic and @<x http://example.com/x.txt>");
        let lookup = |name: &str| {
            if name == "asdf" {
                Some(Twter::new("asdf", "http://example.com/asdf.txt"))
            } else {
                None
            }
        };
        let once = twt.expand_links(&TestPolicy, lookup);
        let twice = once.expand_links(&TestPolicy, lookup);
        assert_eq!(once.literal(), twice.literal());
        // Resolved elements were left alone.
        assert_eq!(
            twice.mentions()[1].literal(),
            "@<x http://example.com/x.txt>"
        );
    }

    #[test]
    fn unknown_names_are_left_alone() {
        let twt = compose("@nobody hello");
        let expanded = twt.expand_links(&TestPolicy, |_| None);
        assert_eq!(expanded.literal(), twt.literal());
    }
}
