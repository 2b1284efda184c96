//! The syntax tree for feed content.
//!
//! A post body is an ordered list of [`Elem`] values: a closed set of
//! inline element kinds. Every element remembers the exact input text
//! it was parsed from (its *literal*), which is what makes byte-exact
//! round-trips and stable content hashes possible. Posts and feeds are
//! read-only once built; the only transform is link expansion, which
//! produces a new post.

use crate::err::Error;
use crate::meta::Meta;
use crate::twter::Twter;
use crate::util::url_host;
use chrono::SecondsFormat;

/// A span of ordinary text.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Text {
    /// The text as read from the input.
    lit: String,
}

impl Text {
    /// Construct a text element.
    pub fn new(lit: &str) -> Self {
        Text { lit: lit.into() }
    }
    /// Construct a text element from an owned string.
    pub(crate) fn from_string(lit: String) -> Self {
        Text { lit }
    }
    /// The text as read from the input.
    pub fn literal(&self) -> &str {
        &self.lit
    }
    /// True if the text is entirely whitespace.
    pub(crate) fn is_blank(&self) -> bool {
        self.lit.chars().all(char::is_whitespace)
    }
}

/// An inline reference to another feed author.
///
/// Mentions name an author (`@nick`, `@nick@domain`) or point straight
/// at a feed (`@<https://…>`), or both (`@<nick https://…>`). A
/// mention with a name but no target is unresolved until link
/// expansion fills it in.
#[derive(Clone, Debug)]
pub struct Mention {
    /// The mention as read from the input.
    lit: String,
    /// The display name, possibly empty.
    name: String,
    /// The explicit domain, possibly empty.
    domain: String,
    /// The target feed URL, possibly empty.
    target: String,
}

impl Mention {
    /// Construct a mention from a name (which may carry an `@domain`
    /// suffix) and a target URL, either of which may be empty.
    pub fn new(name: &str, target: &str) -> Self {
        let (name, domain) = match name.split_once('@') {
            Some((n, d)) => (n.to_string(), d.to_string()),
            None => (name.to_string(), String::new()),
        };
        let lit = Mention::render_lit(&name, &domain, target);
        Mention {
            lit,
            name,
            domain,
            target: target.into(),
        }
    }

    /// Construct a mention with an explicit literal, as parsed.
    pub(crate) fn from_parts(lit: String, name: String, domain: String, target: String) -> Self {
        Mention {
            lit,
            name,
            domain,
            target,
        }
    }

    /// The canonical spelling for a mention with these fields.
    fn render_lit(name: &str, domain: &str, target: &str) -> String {
        let label = if domain.is_empty() {
            name.to_string()
        } else {
            format!("{}@{}", name, domain)
        };
        match (label.is_empty(), target.is_empty()) {
            (false, false) => format!("@<{} {}>", label, target),
            (false, true) => format!("@{}", label),
            (true, false) => format!("@<{}>", target),
            (true, true) => String::from("@"),
        }
    }

    /// The mention as read from the input.
    pub fn literal(&self) -> &str {
        &self.lit
    }
    /// The display name, or the empty string.
    pub fn name(&self) -> &str {
        &self.name
    }
    /// The domain: explicit if one was written, otherwise inferred
    /// from the target URL's host.
    pub fn domain(&self) -> &str {
        if self.domain.is_empty() {
            url_host(&self.target)
        } else {
            &self.domain
        }
    }
    /// The domain exactly as written, without host inference.
    pub(crate) fn explicit_domain(&self) -> &str {
        &self.domain
    }
    /// The target feed URL, or the empty string if unresolved.
    pub fn target(&self) -> &str {
        &self.target
    }
    /// True if this mention still needs link expansion.
    pub fn is_unresolved(&self) -> bool {
        self.target.is_empty()
    }
    /// The identity this mention refers to.
    pub fn twter(&self) -> Twter {
        Twter::new(&self.name, &self.target)
    }
}

/// Mentions are references: two of them are the same mention when
/// they point at the same feed.
impl PartialEq for Mention {
    fn eq(&self, other: &Self) -> bool {
        self.target == other.target
    }
}
impl Eq for Mention {}

/// An inline topic reference (`#tag`, `#<tag search-url>`).
///
/// A tag may be target-only (`#<search-url>`): an anonymous reference
/// to whatever the search target names.
#[derive(Clone, Debug)]
pub struct Tag {
    /// The tag as read from the input.
    lit: String,
    /// The tag text, possibly empty.
    text: String,
    /// The search-anchor URL, possibly empty.
    target: String,
}

impl Tag {
    /// Construct a tag from its text and search target, either of
    /// which may be empty.
    pub fn new(text: &str, target: &str) -> Self {
        let lit = match (text.is_empty(), target.is_empty()) {
            (false, true) => format!("#{}", text),
            (false, false) => format!("#<{} {}>", text, target),
            (true, false) => format!("#<{}>", target),
            (true, true) => String::from("#"),
        };
        Tag {
            lit,
            text: text.into(),
            target: target.into(),
        }
    }

    /// Construct a tag with an explicit literal, as parsed.
    pub(crate) fn from_parts(lit: String, text: String, target: String) -> Self {
        Tag { lit, text, target }
    }

    /// The tag as read from the input.
    pub fn literal(&self) -> &str {
        &self.lit
    }
    /// The tag text, or the empty string for an anonymous reference.
    pub fn text(&self) -> &str {
        &self.text
    }
    /// The search-anchor URL, or the empty string.
    pub fn target(&self) -> &str {
        &self.target
    }
    /// True if this tag still needs a search target filled in.
    pub fn is_unresolved(&self) -> bool {
        self.target.is_empty()
    }
}

impl PartialEq for Tag {
    fn eq(&self, other: &Self) -> bool {
        self.text == other.text && self.target == other.target
    }
}
impl Eq for Tag {}

/// What a subject wraps: a reply-marker tag or free text.
#[derive(Clone, Debug)]
enum SubjectInner {
    /// A tag naming the post being replied to, usually by hash.
    Tag(Tag),
    /// Free text, e.g. `re: something`.
    Text(String),
}

/// A post's leading parenthesized reply marker.
///
/// At most one subject is recognized per post, and only before any
/// body content other than leading mentions.
#[derive(Clone, Debug)]
pub struct Subject {
    /// The subject as read from the input, parentheses included.
    lit: String,
    /// The wrapped tag or text.
    inner: SubjectInner,
}

impl Subject {
    /// Construct a free-text subject.
    pub fn new(text: &str) -> Self {
        Subject {
            lit: format!("({})", text),
            inner: SubjectInner::Text(text.into()),
        }
    }

    /// Construct a subject wrapping a reply tag.
    pub fn from_tag(text: &str, target: &str) -> Self {
        let tag = Tag::new(text, target);
        Subject {
            lit: format!("({})", tag.literal()),
            inner: SubjectInner::Tag(tag),
        }
    }

    /// Construct a subject with an explicit literal, as parsed.
    pub(crate) fn from_parts_tag(lit: String, tag: Tag) -> Self {
        Subject {
            lit,
            inner: SubjectInner::Tag(tag),
        }
    }

    /// Construct a free-text subject with an explicit literal.
    pub(crate) fn from_parts_text(lit: String, text: String) -> Self {
        Subject {
            lit,
            inner: SubjectInner::Text(text),
        }
    }

    /// The subject as read from the input, parentheses included.
    pub fn literal(&self) -> &str {
        &self.lit
    }
    /// The wrapped tag, if the subject is a reply marker.
    pub fn tag(&self) -> Option<&Tag> {
        match &self.inner {
            SubjectInner::Tag(t) => Some(t),
            SubjectInner::Text(_) => None,
        }
    }
    /// The subject's text: the tag text for reply markers, the free
    /// text otherwise.
    pub fn text(&self) -> &str {
        match &self.inner {
            SubjectInner::Tag(t) => t.text(),
            SubjectInner::Text(s) => s,
        }
    }
}

/// The lexical form a link was written in.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum LinkKind {
    /// `[text](target)`.
    Standard,
    /// `![alt](target)`: an inline media reference.
    Media,
    /// `<target>`.
    Plain,
    /// A bare `scheme://target` in running text.
    Naked,
}

/// An inline hyperlink in one of four lexical forms.
///
/// All four forms normalize to the same (text, target) shape so that
/// links to the same place match regardless of spelling.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Link {
    /// The link as read from the input.
    lit: String,
    /// The display text; empty for plain, naked, and bare-media links.
    text: String,
    /// The link target.
    target: String,
    /// Which lexical form the link was written in.
    kind: LinkKind,
}

impl Link {
    /// Construct a link of the given form.
    pub fn new(text: &str, target: &str, kind: LinkKind) -> Self {
        let lit = match kind {
            LinkKind::Standard => format!("[{}]({})", text, target),
            LinkKind::Media => format!("![{}]({})", text, target),
            LinkKind::Plain => format!("<{}>", target),
            LinkKind::Naked => target.to_string(),
        };
        Link {
            lit,
            text: text.into(),
            target: target.into(),
            kind,
        }
    }

    /// Construct a link with an explicit literal, as parsed.
    pub(crate) fn from_parts(lit: String, text: String, target: String, kind: LinkKind) -> Self {
        Link {
            lit,
            text,
            target,
            kind,
        }
    }

    /// The link as read from the input.
    pub fn literal(&self) -> &str {
        &self.lit
    }
    /// The display text, possibly empty.
    pub fn text(&self) -> &str {
        &self.text
    }
    /// The link target.
    pub fn target(&self) -> &str {
        &self.target
    }
    /// Which lexical form the link was written in.
    pub fn kind(&self) -> LinkKind {
        self.kind
    }
}

/// Whether a code span is inline or a block.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum CodeKind {
    /// A single-backtick span.
    Inline,
    /// A triple-backtick span, which may cross line breaks.
    Block,
}

/// A literal code span. Nothing inside it is parsed.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Code {
    /// The span as read from the input, backticks included.
    lit: String,
    /// The span's contents, backticks stripped.
    text: String,
    /// Inline or block.
    kind: CodeKind,
}

impl Code {
    /// Construct a code span from its contents.
    pub fn new(text: &str, kind: CodeKind) -> Self {
        let lit = match kind {
            CodeKind::Inline => format!("`{}`", text),
            CodeKind::Block => format!("```{}```", text),
        };
        Code {
            lit,
            text: text.into(),
            kind,
        }
    }

    /// Construct a code span with an explicit literal, as parsed.
    pub(crate) fn from_parts(lit: String, text: String, kind: CodeKind) -> Self {
        Code { lit, text, kind }
    }

    /// The span as read from the input, backticks included.
    pub fn literal(&self) -> &str {
        &self.lit
    }
    /// The span's contents.
    pub fn text(&self) -> &str {
        &self.text
    }
    /// Inline or block.
    pub fn kind(&self) -> CodeKind {
        self.kind
    }
}

/// The literal spelling of the soft line break.
pub const LINE_SEP: &str = "\u{2028}";

/// One inline element of a post body.
///
/// This is a closed set: renderers and other consumers match on it
/// exhaustively, so a new element kind is a compile-time event for
/// every output mode.
#[derive(Clone, Debug)]
pub enum Elem {
    /// Ordinary text.
    Text(Text),
    /// A reference to another author.
    Mention(Mention),
    /// A topic reference.
    Tag(Tag),
    /// A leading reply marker.
    Subject(Subject),
    /// A hyperlink.
    Link(Link),
    /// A literal code span.
    Code(Code),
    /// The U+2028 soft break: a line break inside one post.
    LineSep,
}

impl Elem {
    /// The element as read from the input.
    pub fn literal(&self) -> &str {
        match self {
            Elem::Text(t) => t.literal(),
            Elem::Mention(m) => m.literal(),
            Elem::Tag(t) => t.literal(),
            Elem::Subject(s) => s.literal(),
            Elem::Link(l) => l.literal(),
            Elem::Code(c) => c.literal(),
            Elem::LineSep => LINE_SEP,
        }
    }
}

/// A post's timestamp.
///
/// The original spelling is preserved for byte-exact round trips; the
/// parsed instant (with its UTC offset) is what everything else uses.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DateTime {
    /// The timestamp as read from the input.
    lit: String,
    /// The instant the literal denotes.
    dt: chrono::DateTime<chrono::FixedOffset>,
}

impl DateTime {
    /// Construct a timestamp from an instant. The literal becomes the
    /// RFC 3339 rendering of the instant.
    pub fn new(dt: chrono::DateTime<chrono::FixedOffset>) -> Self {
        DateTime {
            lit: dt.to_rfc3339_opts(SecondsFormat::Secs, true),
            dt,
        }
    }

    /// Construct a timestamp with an explicit literal, as parsed.
    pub(crate) fn from_parts(lit: String, dt: chrono::DateTime<chrono::FixedOffset>) -> Self {
        DateTime { lit, dt }
    }

    /// The timestamp as read from the input.
    pub fn literal(&self) -> &str {
        &self.lit
    }
    /// The instant the literal denotes.
    pub fn instant(&self) -> chrono::DateTime<chrono::FixedOffset> {
        self.dt
    }
}

/// One comment line of a feed.
///
/// Comments keep their raw text; lines of the form `# key = value`
/// additionally expose the key and value, which is how feed metadata
/// travels.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Comment {
    /// The comment line as read from the input, without the newline.
    lit: String,
    /// The parsed `key = value` pair, if the line had one.
    kv: Option<(String, String)>,
}

impl Comment {
    /// Construct a plain comment line.
    pub(crate) fn new(lit: String) -> Self {
        Comment { lit, kv: None }
    }
    /// Construct a comment line carrying a key/value pair.
    pub(crate) fn with_kv(lit: String, key: String, value: String) -> Self {
        Comment {
            lit,
            kv: Some((key, value)),
        }
    }
    /// The comment line as read from the input, without the newline.
    pub fn literal(&self) -> &str {
        &self.lit
    }
    /// The metadata key, if the line is a `key = value` pair.
    pub fn key(&self) -> Option<&str> {
        self.kv.as_ref().map(|(k, _)| k.as_str())
    }
    /// The metadata value, if the line is a `key = value` pair.
    pub fn value(&self) -> Option<&str> {
        self.kv.as_ref().map(|(_, v)| v.as_str())
    }
}

/// A single post: a timestamp, an author, and an ordered element list.
///
/// The derived views (subject, mentions, tags, links) are computed
/// once at construction. A `Twt` is immutable; link expansion returns
/// a new one.
#[derive(Clone, Debug)]
pub struct Twt {
    /// Who wrote the post.
    twter: Twter,
    /// When the post was created.
    dt: DateTime,
    /// The post body, in input order.
    elems: Vec<Elem>,
    /// Indices of mention elements.
    mention_idx: Vec<usize>,
    /// Indices of tag elements, including a subject's reply tag.
    tag_idx: Vec<usize>,
    /// Indices of link elements.
    link_idx: Vec<usize>,
    /// Index of the first subject element, if any.
    subject_idx: Option<usize>,
}

impl Twt {
    /// Construct a post from its parts, computing the derived views.
    pub fn new(twter: Twter, dt: DateTime, elems: Vec<Elem>) -> Self {
        let mut mention_idx = Vec::new();
        let mut tag_idx = Vec::new();
        let mut link_idx = Vec::new();
        let mut subject_idx = None;
        for (i, elem) in elems.iter().enumerate() {
            match elem {
                Elem::Mention(_) => mention_idx.push(i),
                Elem::Tag(_) => tag_idx.push(i),
                Elem::Link(_) => link_idx.push(i),
                Elem::Subject(s) => {
                    if subject_idx.is_none() {
                        subject_idx = Some(i);
                    }
                    if s.tag().is_some() {
                        tag_idx.push(i);
                    }
                }
                Elem::Text(_) | Elem::Code(_) | Elem::LineSep => {}
            }
        }
        Twt {
            twter,
            dt,
            elems,
            mention_idx,
            tag_idx,
            link_idx,
            subject_idx,
        }
    }

    /// The author of the post.
    pub fn twter(&self) -> &Twter {
        &self.twter
    }
    /// The post's timestamp.
    pub fn date_time(&self) -> &DateTime {
        &self.dt
    }
    /// The instant the post was created.
    pub fn created(&self) -> chrono::DateTime<chrono::FixedOffset> {
        self.dt.instant()
    }
    /// The post body, in input order.
    pub fn elems(&self) -> &[Elem] {
        &self.elems
    }
    /// The post's subject, if it has one.
    pub fn subject(&self) -> Option<&Subject> {
        match self.subject_idx {
            Some(i) => match &self.elems[i] {
                Elem::Subject(s) => Some(s),
                _ => None,
            },
            None => None,
        }
    }
    /// The post's mentions, in input order.
    pub fn mentions(&self) -> Vec<&Mention> {
        self.mention_idx
            .iter()
            .filter_map(|&i| match &self.elems[i] {
                Elem::Mention(m) => Some(m),
                _ => None,
            })
            .collect()
    }
    /// The post's tags, in input order. A subject's reply tag counts.
    pub fn tags(&self) -> Vec<&Tag> {
        self.tag_idx
            .iter()
            .filter_map(|&i| match &self.elems[i] {
                Elem::Tag(t) => Some(t),
                Elem::Subject(s) => s.tag(),
                _ => None,
            })
            .collect()
    }
    /// The post's links, in input order.
    pub fn links(&self) -> Vec<&Link> {
        self.link_idx
            .iter()
            .filter_map(|&i| match &self.elems[i] {
                Elem::Link(l) => Some(l),
                _ => None,
            })
            .collect()
    }

    /// The post body exactly as read from the input.
    pub fn body(&self) -> String {
        let mut out = String::new();
        for elem in &self.elems {
            out.push_str(elem.literal());
        }
        out
    }

    /// The whole post line, byte-for-byte as read from the input:
    /// timestamp, tab, body, newline.
    pub fn literal(&self) -> String {
        let mut out = String::with_capacity(self.dt.literal().len() + 1);
        out.push_str(self.dt.literal());
        out.push('\t');
        out.push_str(&self.body());
        out.push('\n');
        out
    }
}

/// An author's whole feed, as parsed from one source: identity,
/// comments, and posts in file order.
///
/// File order is not meaningful; callers sort posts by timestamp when
/// they need an order.
#[derive(Clone, Debug)]
pub struct Feed {
    /// The feed's author, back-filled from metadata when present.
    twter: Twter,
    /// The feed's comment lines, in file order.
    comments: Vec<Comment>,
    /// Metadata scanned from the comments.
    meta: Meta,
    /// The feed's posts, in file order.
    twts: Vec<Twt>,
    /// How many non-blank lines were attempted.
    lines: usize,
    /// How many attempted lines failed to parse.
    failed: usize,
    /// The errors recorded for failed lines.
    errors: Vec<Error>,
}

impl Feed {
    /// Construct a feed from parsed parts.
    pub(crate) fn from_parts(
        twter: Twter,
        comments: Vec<Comment>,
        meta: Meta,
        twts: Vec<Twt>,
        lines: usize,
        failed: usize,
        errors: Vec<Error>,
    ) -> Self {
        Feed {
            twter,
            comments,
            meta,
            twts,
            lines,
            failed,
            errors,
        }
    }

    /// The feed's author.
    pub fn twter(&self) -> &Twter {
        &self.twter
    }
    /// The feed's comment lines, in file order.
    pub fn comments(&self) -> &[Comment] {
        &self.comments
    }
    /// Metadata scanned from the comment lines.
    pub fn meta(&self) -> &Meta {
        &self.meta
    }
    /// The feed's posts, in file order.
    pub fn twts(&self) -> &[Twt] {
        &self.twts
    }
    /// The errors recorded while parsing.
    pub fn errors(&self) -> &[Error] {
        &self.errors
    }

    /// True if every attempted line of the feed failed to parse.
    ///
    /// This is a soft signal. One bad line never discards a feed; a
    /// feed where *nothing* parsed is probably not a feed at all, and
    /// callers that agree can reject it.
    pub fn is_erroneous(&self) -> bool {
        self.lines > 0 && self.failed == self.lines
    }

    /// The erroneous-feed classification as a hard error, for callers
    /// that want to reject such feeds.
    pub fn error(&self) -> Option<Error> {
        if self.is_erroneous() {
            Some(Error::ErroneousFeed { lines: self.lines })
        } else {
            None
        }
    }
}

#[cfg(feature = "serde")]
mod serde_impl {
    //! The JSON envelope posts (de)serialize through, with the hash
    //! included for consumers and ignored on the way back in.

    use super::Twt;
    use crate::twter::Twter;
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// The wire shape of a serialized post.
    #[derive(Serialize, Deserialize)]
    struct Envelope {
        /// The post's author.
        twter: Twter,
        /// The post body, soft breaks and all.
        text: String,
        /// The timestamp literal.
        created: String,
        /// The content hash. Recomputed on load, so optional.
        #[serde(default)]
        hash: String,
    }

    impl Serialize for Twt {
        fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            Envelope {
                twter: self.twter().clone(),
                text: self.body(),
                created: self.date_time().literal().to_string(),
                hash: self.hash(),
            }
            .serialize(serializer)
        }
    }

    impl<'de> Deserialize<'de> for Twt {
        fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
        where
            D: Deserializer<'de>,
        {
            let env = Envelope::deserialize(deserializer)?;
            let line = format!("{}\t{}", env.created, env.text);
            crate::parse::parse_twt(&line, &env.twter).map_err(D::Error::custom)
        }
    }
}
