//! Render posts back to text.
//!
//! A post renders in one of three modes. Round-trip reproduces the
//! original bytes, which re-serialization and hashing depend on.
//! Plain text is the human-facing form; computed without a policy,
//! it is also the exact input of the content hash. Markdown turns
//! mentions, tags, and links into hyperlinks for a pod's HTML
//! pipeline. Rendering is a read-only traversal; the post is never
//! touched.

use crate::ast::{Elem, Mention, Subject, Tag, Twt, LINE_SEP};

/// Output modes for rendering a post body.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum TwtFormat {
    /// Reproduce the original spelling byte-for-byte.
    RoundTrip,
    /// Human-readable text: mention and tag targets are stripped.
    Plain,
    /// Markdown, with mentions/tags rendered as hyperlinks.
    Markdown,
}

/// How rendering resolves mention and tag targets.
///
/// The engine never guesses URLs: anything that depends on where a
/// pod lives comes in through this collaborator, supplied per call.
pub trait UrlPolicy {
    /// True if `url` is served by the local pod.
    fn is_local_url(&self, url: &str) -> bool;
    /// The profile URL for a local user.
    fn user_url(&self, nick: &str) -> String;
    /// The profile URL for an external author's feed URI.
    fn external_url(&self, nick: &str, uri: &str) -> String;
    /// The search URL for a tag.
    fn tag_url(&self, tag: &str) -> String;
}

impl Twt {
    /// Render the post body in the given mode.
    ///
    /// Plain mode with no policy is the exact text the content hash
    /// is computed over.
    pub fn format_text(&self, format: TwtFormat, policy: Option<&dyn UrlPolicy>) -> String {
        format_elems(self.elems(), format, policy)
    }
}

/// Render a list of body elements.
pub(crate) fn format_elems(
    elems: &[Elem],
    format: TwtFormat,
    policy: Option<&dyn UrlPolicy>,
) -> String {
    let mut out = String::new();
    for elem in elems {
        format_elem(elem, format, policy, &mut out);
    }
    out
}

/// Render one element into `out`.
fn format_elem(elem: &Elem, format: TwtFormat, policy: Option<&dyn UrlPolicy>, out: &mut String) {
    match elem {
        Elem::Text(t) => out.push_str(t.literal()),
        Elem::Code(c) => out.push_str(c.literal()),
        Elem::Link(l) => out.push_str(l.literal()),
        Elem::LineSep => match format {
            TwtFormat::RoundTrip => out.push_str(LINE_SEP),
            TwtFormat::Plain | TwtFormat::Markdown => out.push('\n'),
        },
        Elem::Mention(m) => format_mention(m, format, policy, out),
        Elem::Tag(t) => format_tag(t, format, policy, out),
        Elem::Subject(s) => format_subject(s, format, policy, out),
    }
}

/// Render a mention.
fn format_mention(m: &Mention, format: TwtFormat, policy: Option<&dyn UrlPolicy>, out: &mut String) {
    if format == TwtFormat::RoundTrip || m.name().is_empty() {
        out.push_str(m.literal());
        return;
    }
    let local = match policy {
        Some(p) => !m.target().is_empty() && p.is_local_url(m.target()),
        None => false,
    };
    match format {
        TwtFormat::Plain => match policy {
            // Local authors go by bare nick; external ones carry the
            // domain their feed resolves to.
            Some(_) if !local && !m.domain().is_empty() => {
                out.push_str(&format!("@{}@{}", m.name(), m.domain()));
            }
            Some(_) => out.push_str(&format!("@{}", m.name())),
            // Without a policy nothing is resolved: only a domain the
            // author actually wrote survives. The hash depends on this
            // spelling staying put.
            None if !m.explicit_domain().is_empty() => {
                out.push_str(&format!("@{}@{}", m.name(), m.explicit_domain()));
            }
            None => out.push_str(&format!("@{}", m.name())),
        },
        TwtFormat::Markdown => match policy {
            Some(p) if local => {
                out.push_str(&format!("[@{}]({})", m.name(), p.user_url(m.name())));
            }
            Some(p) if !m.target().is_empty() => {
                let href = p.external_url(m.name(), m.target());
                if m.domain().is_empty() {
                    out.push_str(&format!("[@{}]({})", m.name(), href));
                } else {
                    out.push_str(&format!("[@{}@{}]({})", m.name(), m.domain(), href));
                }
            }
            _ => {
                if m.target().is_empty() {
                    // Unresolved: render as plain text.
                    format_mention(m, TwtFormat::Plain, policy, out);
                } else {
                    out.push_str(&format!("[@{}]({})", m.name(), m.target()));
                }
            }
        },
        TwtFormat::RoundTrip => {}
    }
}

/// Render a tag.
fn format_tag(t: &Tag, format: TwtFormat, policy: Option<&dyn UrlPolicy>, out: &mut String) {
    if format == TwtFormat::RoundTrip || t.text().is_empty() {
        // Anonymous (target-only) tags have no better spelling than
        // their original one.
        out.push_str(t.literal());
        return;
    }
    match format {
        TwtFormat::Plain => out.push_str(&format!("#{}", t.text())),
        TwtFormat::Markdown => {
            if !t.target().is_empty() {
                out.push_str(&format!("[#{}]({})", t.text(), t.target()));
            } else if let Some(p) = policy {
                out.push_str(&format!("[#{}]({})", t.text(), p.tag_url(t.text())));
            } else {
                out.push_str(&format!("#{}", t.text()));
            }
        }
        TwtFormat::RoundTrip => {}
    }
}

/// Render a subject, recursing into its wrapped tag.
fn format_subject(s: &Subject, format: TwtFormat, policy: Option<&dyn UrlPolicy>, out: &mut String) {
    if format == TwtFormat::RoundTrip {
        out.push_str(s.literal());
        return;
    }
    out.push('(');
    match s.tag() {
        Some(tag) => format_tag(tag, format, policy, out),
        None => out.push_str(s.text()),
    }
    out.push(')');
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::parse::parse_twt;
    use crate::twter::Twter;

    /// A policy for a pod at example.com.
    struct TestPolicy;
    impl UrlPolicy for TestPolicy {
        fn is_local_url(&self, url: &str) -> bool {
            url.starts_with("https://example.com/")
        }
        fn user_url(&self, nick: &str) -> String {
            format!("https://example.com/user/{}", nick)
        }
        fn external_url(&self, nick: &str, uri: &str) -> String {
            format!("https://example.com/external?uri={}&nick={}", uri, nick)
        }
        fn tag_url(&self, tag: &str) -> String {
            format!("https://example.com/search?tag={}", tag)
        }
    }

    fn twter() -> Twter {
        Twter::new("example", "https://example.com/user/example/twtxt.txt")
    }

    const LINE: &str = "2020-11-13T16:13:22+01:00\t@<prologic https://twtxt.net/user/prologic/twtxt.txt> (#<pdrsg2q https://twtxt.net/search?tag=pdrsg2q>) Thanks!";

    #[test]
    fn round_trip_is_byte_exact() {
        let twt = parse_twt(LINE, &twter()).expect("parse");
        assert_eq!(
            twt.format_text(TwtFormat::RoundTrip, None),
            &LINE[26..],
            "body round-trips"
        );
        assert_eq!(twt.literal(), format!("{}\n", LINE));
    }

    #[test]
    fn plain_strips_targets() {
        let twt = parse_twt(LINE, &twter()).expect("parse");
        assert_eq!(
            twt.format_text(TwtFormat::Plain, None),
            "@prologic (#pdrsg2q) Thanks!"
        );
    }

    #[test]
    fn plain_with_policy_adds_external_domains() {
        let twt = parse_twt(LINE, &twter()).expect("parse");
        assert_eq!(
            twt.format_text(TwtFormat::Plain, Some(&TestPolicy)),
            "@prologic@twtxt.net (#pdrsg2q) Thanks!"
        );
        // A mention of a local feed stays a bare nick.
        let twt = parse_twt(
            "2021-01-01T10:45:00Z\t@<friend https://example.com/user/friend/twtxt.txt> hi",
            &twter(),
        )
        .expect("parse");
        assert_eq!(
            twt.format_text(TwtFormat::Plain, Some(&TestPolicy)),
            "@friend hi"
        );
    }

    #[test]
    fn markdown_resolves_through_the_policy() {
        let twt = parse_twt(
            "2021-01-01T10:45:00Z\t@<friend https://example.com/user/friend/twtxt.txt> \
             @<ext https://other.example/t.txt> #topic",
            &twter(),
        )
        .expect("parse");
        let md = twt.format_text(TwtFormat::Markdown, Some(&TestPolicy));
        assert_eq!(
            md,
            "[@friend](https://example.com/user/friend) \
             [@ext@other.example](https://example.com/external?uri=https://other.example/t.txt&nick=ext) \
             [#topic](https://example.com/search?tag=topic)"
        );
    }

    #[test]
    fn markdown_keeps_links_and_code_literal() {
        let twt = parse_twt(
            "2021-01-01T10:45:00Z\tsee [docs](https://example.com/docs) and `code`",
            &twter(),
        )
        .expect("parse");
        assert_eq!(
            twt.format_text(TwtFormat::Markdown, None),
            "see [docs](https://example.com/docs) and `code`"
        );
    }

    #[test]
    fn soft_break_renders_as_newline_outside_round_trip() {
        let twt = parse_twt("2021-01-01T10:45:00Z\tone\u{2028}two", &twter()).expect("parse");
        assert_eq!(twt.format_text(TwtFormat::Plain, None), "one\ntwo");
        assert_eq!(
            twt.format_text(TwtFormat::RoundTrip, None),
            "one\u{2028}two"
        );
    }

    #[test]
    fn rendering_does_not_change_the_post() {
        let twt = parse_twt(LINE, &twter()).expect("parse");
        let before = twt.literal();
        let _ = twt.format_text(TwtFormat::Markdown, Some(&TestPolicy));
        let _ = twt.format_text(TwtFormat::Plain, Some(&TestPolicy));
        assert_eq!(twt.literal(), before);
    }
}
