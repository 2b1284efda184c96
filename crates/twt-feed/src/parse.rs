//! The recursive-descent parser for feed lines and post bodies.
//!
//! The parser pulls tokens with two tokens of lookahead and is
//! deliberately permissive: a sub-rule either returns a populated
//! node, or reports "no match" and the bytes it consumed are replayed
//! as plain text. Only a post's timestamp is load-bearing; a bad date
//! aborts that post (and only that post). Each call owns its whole
//! state, so any number of parses may run in parallel.

use crate::ast::{
    Code, CodeKind, Comment, DateTime, Elem, Feed, Link, LinkKind, Mention, Subject, Tag, Text,
    Twt, LINE_SEP,
};
use crate::err::{Error, Position};
use crate::meta::Meta;
use crate::tokenize::{Token, TokenKind, Tokenizer};
use crate::twter::Twter;
use chrono::{SecondsFormat, TimeZone, Timelike};
use std::io::Read;
use tracing::{debug, warn};

/// Parse a whole feed from a byte stream.
///
/// Comments and posts are accumulated in file order; the feed's
/// identity starts from `twter` and is back-filled from `nick` /
/// `url` / `twturl` metadata when the feed advertises them. Parsing
/// never fails outright: malformed lines are skipped and counted, and
/// a feed where every attempted line failed is flagged (see
/// [`Feed::is_erroneous`]). Callers bound input size; a read error is
/// treated as end of input.
pub fn parse_feed<R: Read>(src: R, twter: &Twter) -> Feed {
    let mut p = Parser::new(Tokenizer::new(src));
    let mut comments = Vec::new();
    let mut twts = Vec::new();
    let mut lines = 0_usize;
    let mut failed = 0_usize;
    loop {
        match p.cur.kind {
            TokenKind::Eof => break,
            TokenKind::Newline => p.next(),
            TokenKind::Hash => {
                lines += 1;
                comments.push(p.parse_comment());
                p.end_line();
            }
            TokenKind::Number => {
                lines += 1;
                let pos = p.cur.pos;
                match p.parse_twt_line(twter) {
                    Some(twt) => twts.push(twt),
                    None => {
                        failed += 1;
                        debug!(line = pos.line(), "skipping unparseable post line");
                    }
                }
                p.end_line();
            }
            _ => {
                // Neither a comment nor a post. Skip to the end of the
                // line; stray whitespace doesn't count against the feed.
                let pos = p.cur.pos;
                let mut blank = true;
                while !p.cur.kind.is_line_end() {
                    if !matches!(p.cur.kind, TokenKind::Space | TokenKind::Tab) {
                        blank = false;
                    }
                    p.next();
                }
                if !blank {
                    lines += 1;
                    failed += 1;
                    p.errs.push(Error::BadLine(pos));
                }
                p.end_line();
            }
        }
    }
    if lines > 0 && failed == lines {
        warn!(lines, "erroneous feed: every attempted line failed to parse");
    }
    let meta = Meta::from_comments(&comments);
    let twter = backfill(twter, &meta);
    Feed::from_parts(twter, comments, meta, twts, lines, failed, p.errs)
}

/// Parse a single post line of the form `<timestamp><TAB><body>`.
///
/// Returns the first recorded error when the line does not form a
/// post; there are no partial posts.
pub fn parse_twt(line: &str, twter: &Twter) -> crate::Result<Twt> {
    let mut p = Parser::new(Tokenizer::new(line.as_bytes()));
    if p.cur.kind != TokenKind::Number {
        return Err(Error::UnexpectedToken {
            expected: TokenKind::Number,
            found: p.cur.kind,
            pos: p.cur.pos,
        });
    }
    match p.parse_twt_line(twter) {
        Some(twt) => Ok(twt),
        None => match p.errs.into_iter().next() {
            Some(e) => Err(e),
            None => Err(Error::BadLine(Position::new(0, 0))),
        },
    }
}

/// Parse a bare post body into its elements.
///
/// The body grammar only: the line-start date/comment modes never
/// trigger, so a body may begin with a digit or `#`. Parsing stops at
/// a raw newline; normalize embedded newlines to [`LINE_SEP`] first
/// (as [`make_twt`] does) if the body should stay one post.
pub fn parse_text(body: &str) -> Vec<Elem> {
    let mut p = Parser::new(Tokenizer::for_body(body.as_bytes()));
    p.parse_elems()
}

/// Compose a post from locally written text.
///
/// Embedded newlines become soft breaks, the timestamp is rendered in
/// RFC 3339, and the result is parsed like any fetched line, so a
/// composed post and its re-parsed form are indistinguishable.
pub fn make_twt(
    twter: &Twter,
    created: chrono::DateTime<chrono::FixedOffset>,
    body: &str,
) -> crate::Result<Twt> {
    let body = body.replace('\n', LINE_SEP);
    let line = format!(
        "{}\t{}",
        created.to_rfc3339_opts(SecondsFormat::Secs, true),
        body
    );
    parse_twt(&line, twter)
}

/// Overlay a feed's advertised metadata onto the identity it was
/// fetched as.
fn backfill(twter: &Twter, meta: &Meta) -> Twter {
    let mut twter = twter.clone();
    if let Some(nick) = meta.nick() {
        twter.nick = nick.to_string();
    }
    if let Some(url) = meta.url() {
        twter.url = url.to_string();
    }
    if let Some(avatar) = meta.avatar() {
        twter.avatar = avatar.to_string();
    }
    if let Some(description) = meta.description() {
        twter.tagline = description.to_string();
    }
    twter
}

/// True if `prev` lets a `#`/`@` start a structural element.
///
/// Mentions and tags are recognized only after whitespace, a line
/// start, or an opening paren; anywhere else an `@`/`#` is running
/// text, so e-mail-like tokens and path fragments are not misread.
fn boundary(prev: TokenKind) -> bool {
    matches!(
        prev,
        TokenKind::Space
            | TokenKind::Tab
            | TokenKind::Newline
            | TokenKind::LineSep
            | TokenKind::LParen
    )
}

/// Split a `name@domain` label into its parts.
fn split_domain(label: String) -> (String, String) {
    match label.split_once('@') {
        Some((n, d)) => (n.to_string(), d.to_string()),
        None => (label, String::new()),
    }
}

/// Classify a code token's literal and strip its delimiters.
fn classify_code(lit: &str) -> (String, CodeKind) {
    if lit.starts_with("```") {
        let body = if lit.len() >= 6 && lit.ends_with("```") {
            &lit[3..lit.len() - 3]
        } else {
            // unterminated block: it ran to end of stream
            &lit[3..]
        };
        (body.to_string(), CodeKind::Block)
    } else {
        let body = lit.strip_prefix('`').unwrap_or(lit);
        let body = body.strip_suffix('`').unwrap_or(body);
        (body.to_string(), CodeKind::Inline)
    }
}

/// The parser: a cursor over tokens with one token of lookahead past
/// the current one.
struct Parser<R: Read> {
    /// Source of tokens.
    lex: Tokenizer<R>,
    /// The current token.
    cur: Token,
    /// The token after the current one.
    peek: Token,
    /// The kind of the token consumed just before `cur`.
    prev: TokenKind,
    /// Literal text consumed by the sub-rule currently being tried.
    /// When the sub-rule fails, this is replayed as plain text so
    /// that no input is ever lost.
    lit: String,
    /// Errors recorded so far.
    errs: Vec<Error>,
}

impl<R: Read> Parser<R> {
    /// Create a parser, priming the two-token window.
    fn new(mut lex: Tokenizer<R>) -> Self {
        let cur = lex.next_tok();
        let peek = lex.next_tok();
        Parser {
            lex,
            cur,
            peek,
            // A line start counts as a boundary.
            prev: TokenKind::Newline,
            lit: String::new(),
            errs: Vec::new(),
        }
    }

    /// Step the token window forward by one.
    fn next(&mut self) {
        self.prev = self.cur.kind;
        self.cur = std::mem::replace(&mut self.peek, self.lex.next_tok());
    }

    /// Consume the current token into the sub-rule literal buffer.
    fn take(&mut self) {
        self.lit.push_str(&self.cur.lit);
        self.next();
    }

    /// Record an expected/found mismatch at the current token.
    fn record(&mut self, expected: TokenKind) {
        self.errs.push(Error::UnexpectedToken {
            expected,
            found: self.cur.kind,
            pos: self.cur.pos,
        });
    }

    /// Skip any remaining tokens on this line, consuming the newline.
    fn end_line(&mut self) {
        while !self.cur.kind.is_line_end() {
            self.next();
        }
        if self.cur.kind == TokenKind::Newline {
            self.next();
        }
    }

    /// Parse a comment line. The current token is `#`.
    ///
    /// A `word = rest` shape anywhere in the comment makes it a
    /// key/value pair; the first `=` wins and everything after it is
    /// the value, trimmed.
    fn parse_comment(&mut self) -> Comment {
        let mut lit = String::new();
        lit.push_str(&self.cur.lit);
        self.next();
        let mut key = String::new();
        let mut value = String::new();
        let mut is_kv = false;
        while !self.cur.kind.is_line_end() {
            lit.push_str(&self.cur.lit);
            if is_kv && self.cur.kind == TokenKind::Text {
                value.push_str(&self.cur.lit);
            }
            if !is_kv && self.cur.kind == TokenKind::Text && self.peek.kind == TokenKind::Equal {
                is_kv = true;
                key = self.cur.lit.trim().to_string();
            }
            self.next();
        }
        if is_kv {
            Comment::with_kv(lit, key, value.trim().to_string())
        } else {
            Comment::new(lit)
        }
    }

    /// Parse a post line after its leading digit has been seen.
    ///
    /// A date-time failure (or a missing tab) aborts the whole post;
    /// the caller skips to the next line.
    fn parse_twt_line(&mut self, twter: &Twter) -> Option<Twt> {
        let dt = self.parse_date_time()?;
        if self.cur.kind != TokenKind::Tab {
            self.record(TokenKind::Tab);
            return None;
        }
        self.next();
        let elems = self.parse_elems();
        Some(Twt::new(twter.clone(), dt, elems))
    }

    /// Parse a timestamp:
    /// `YYYY-MM-DD 'T' HH ':' MM [':' SS ['.' FRAC]] ['Z' | ('+'|'-') HH [':' MM]]`.
    ///
    /// The zone defaults to UTC. A `+HHMM` offset written without a
    /// colon splits into hours and minutes by hundreds. Fractional
    /// digits are read as an integer nanosecond count, as the format
    /// has always (loosely) been written in the wild.
    fn parse_date_time(&mut self) -> Option<DateTime> {
        self.lit.clear();
        let start = self.cur.pos;
        let year = self.parse_number()? as i32;
        self.step(TokenKind::Hyphen)?;
        let month = self.parse_number()?;
        self.step(TokenKind::Hyphen)?;
        let day = self.parse_number()?;
        self.step(TokenKind::TimeT)?;
        let hour = self.parse_number()?;
        self.step(TokenKind::Colon)?;
        let minute = self.parse_number()?;
        let mut second = 0;
        let mut nanos = 0;
        if self.cur.kind == TokenKind::Colon {
            self.take();
            second = self.parse_number()?;
        }
        if self.cur.kind == TokenKind::Dot {
            self.take();
            nanos = self.parse_number()?;
        }
        let mut offset_secs = 0_i32;
        match self.cur.kind {
            TokenKind::ZoneZ => self.take(),
            TokenKind::Plus | TokenKind::Hyphen => {
                let sign: i32 = if self.cur.kind == TokenKind::Hyphen {
                    -1
                } else {
                    1
                };
                self.take();
                let mut tz_hour = self.parse_number()? as i32;
                let mut tz_min = 0_i32;
                if tz_hour > 24 {
                    tz_min = tz_hour % 100;
                    tz_hour /= 100;
                }
                if self.cur.kind == TokenKind::Colon {
                    self.take();
                    tz_min = self.parse_number()? as i32;
                }
                offset_secs = sign * tz_hour * 3600 + tz_min * 60;
            }
            _ => {}
        }
        let instant = chrono::FixedOffset::east_opt(offset_secs)
            .and_then(|off| {
                off.with_ymd_and_hms(year, month, day, hour, minute, second)
                    .single()
            })
            .and_then(|dt| dt.with_nanosecond(nanos));
        match instant {
            Some(dt) => Some(DateTime::from_parts(std::mem::take(&mut self.lit), dt)),
            None => {
                self.errs.push(Error::BadDateTime(start));
                None
            }
        }
    }

    /// Consume the current token as a number and return its value.
    fn parse_number(&mut self) -> Option<u32> {
        if self.cur.kind != TokenKind::Number {
            self.record(TokenKind::Number);
            return None;
        }
        let value = match self.cur.lit.parse::<u32>() {
            Ok(v) => v,
            Err(_) => {
                self.errs.push(Error::BadDateTime(self.cur.pos));
                return None;
            }
        };
        self.take();
        Some(value)
    }

    /// Consume the current token if it has the wanted kind.
    fn step(&mut self, kind: TokenKind) -> Option<()> {
        if self.cur.kind != kind {
            self.record(kind);
            return None;
        }
        self.take();
        Some(())
    }

    /// Parse body elements up to the end of the line.
    fn parse_elems(&mut self) -> Vec<Elem> {
        let mut elems = Vec::new();
        // A subject is only recognized before any body content other
        // than leading mentions and whitespace, and only once.
        let mut subject_ok = true;
        while !self.cur.kind.is_line_end() {
            let elem = self.parse_elem(subject_ok);
            match &elem {
                Elem::Mention(_) | Elem::LineSep => {}
                Elem::Text(t) if t.is_blank() => {}
                _ => subject_ok = false,
            }
            elems.push(elem);
        }
        elems
    }

    /// Parse one element, falling back to plain text on any
    /// structural failure.
    fn parse_elem(&mut self, subject_ok: bool) -> Elem {
        self.lit.clear();
        match self.cur.kind {
            TokenKind::Code => self.parse_code(),
            TokenKind::LineSep => {
                self.next();
                Elem::LineSep
            }
            TokenKind::LBrack | TokenKind::Bang | TokenKind::Lt => match self.try_link() {
                Some(link) => Elem::Link(link),
                None => self.text_fallback(),
            },
            TokenKind::Text if self.peek.kind == TokenKind::Scheme => {
                Elem::Link(self.naked_link())
            }
            TokenKind::LParen if subject_ok => match self.try_subject() {
                Some(subject) => Elem::Subject(subject),
                None => self.text_fallback(),
            },
            TokenKind::Hash if boundary(self.prev) => match self.try_tag() {
                Some(tag) => Elem::Tag(tag),
                None => self.text_fallback(),
            },
            TokenKind::Amp if boundary(self.prev) => match self.try_mention() {
                Some(mention) => Elem::Mention(mention),
                None => self.text_fallback(),
            },
            _ => self.text_fallback(),
        }
    }

    /// Wrap the current code token as an element.
    fn parse_code(&mut self) -> Elem {
        let lit = self.cur.lit.clone();
        self.next();
        let (text, kind) = classify_code(&lit);
        Elem::Code(Code::from_parts(lit, text, kind))
    }

    /// Turn whatever a failed sub-rule consumed, plus the rest of the
    /// text run, into a Text element.
    fn text_fallback(&mut self) -> Elem {
        let mut lit = std::mem::take(&mut self.lit);
        if !self.cur.kind.is_line_end() {
            lit.push_str(&self.cur.lit);
            self.next();
        }
        self.continue_text(&mut lit);
        Elem::Text(Text::from_string(lit))
    }

    /// Extend a text run as far as it goes.
    fn continue_text(&mut self, lit: &mut String) {
        loop {
            match self.cur.kind {
                // A word followed by `://` starts a naked link.
                TokenKind::Text if self.peek.kind == TokenKind::Scheme => break,
                TokenKind::Text | TokenKind::Space => {
                    lit.push_str(&self.cur.lit);
                    self.next();
                }
                TokenKind::Amp | TokenKind::Hash => {
                    // Only whitespace before `@`/`#` makes it structural.
                    if lit.ends_with(char::is_whitespace) {
                        break;
                    }
                    lit.push_str(&self.cur.lit);
                    self.next();
                }
                TokenKind::Backslash => {
                    // The backslash and whatever it escapes are content.
                    lit.push_str(&self.cur.lit);
                    self.next();
                    if !self.cur.kind.is_line_end() {
                        lit.push_str(&self.cur.lit);
                        self.next();
                    }
                }
                _ => break,
            }
        }
    }

    /// Try to parse a mention. The current token is `@`.
    ///
    /// Forms: `@name`, `@name@domain`, `@<target>`, `@<name target>`,
    /// where a name may carry an `@domain` suffix inside the brackets
    /// too.
    fn try_mention(&mut self) -> Option<Mention> {
        let mark = self.lit.len();
        self.take(); // '@'
        match self.cur.kind {
            TokenKind::Text => {
                let name = self.cur.lit.clone();
                self.take();
                let mut domain = String::new();
                if self.cur.kind == TokenKind::Amp && self.peek.kind == TokenKind::Text {
                    self.take(); // '@'
                    domain = self.cur.lit.clone();
                    self.take();
                }
                let lit = self.lit[mark..].to_string();
                Some(Mention::from_parts(lit, name, domain, String::new()))
            }
            TokenKind::Lt => {
                self.take(); // '<'
                let first = self.take_field();
                if first.is_empty() {
                    return None;
                }
                let mut name = String::new();
                let mut target = first;
                if self.cur.kind == TokenKind::Space {
                    self.take();
                    let second = self.take_field();
                    if second.is_empty() {
                        return None;
                    }
                    name = target;
                    target = second;
                }
                if name == target {
                    target = String::new();
                }
                if self.cur.kind != TokenKind::Gt {
                    return None;
                }
                self.take(); // '>'
                let (name, domain) = split_domain(name);
                let lit = self.lit[mark..].to_string();
                Some(Mention::from_parts(lit, name, domain, target))
            }
            _ => None,
        }
    }

    /// Try to parse a tag. The current token is `#`.
    ///
    /// Forms: `#tag`, `#<target>`, `#<tag target>`.
    fn try_tag(&mut self) -> Option<Tag> {
        let mark = self.lit.len();
        self.take(); // '#'
        match self.cur.kind {
            TokenKind::Text => {
                let text = self.cur.lit.clone();
                self.take();
                let lit = self.lit[mark..].to_string();
                Some(Tag::from_parts(lit, text, String::new()))
            }
            TokenKind::Lt => {
                self.take(); // '<'
                let first = self.take_field();
                if first.is_empty() {
                    return None;
                }
                let mut text = String::new();
                let mut target = first;
                if self.cur.kind == TokenKind::Space {
                    self.take();
                    let second = self.take_field();
                    if second.is_empty() {
                        return None;
                    }
                    text = target;
                    target = second;
                }
                if text == target {
                    target = String::new();
                }
                if self.cur.kind != TokenKind::Gt {
                    return None;
                }
                self.take(); // '>'
                let lit = self.lit[mark..].to_string();
                Some(Tag::from_parts(lit, text, target))
            }
            _ => None,
        }
    }

    /// Try to parse a subject. The current token is `(`.
    ///
    /// A subject wraps either a reply tag (`(#hash)`, `(#<hash url>)`)
    /// or free text (`(re: something)`).
    fn try_subject(&mut self) -> Option<Subject> {
        let mark = self.lit.len();
        self.take(); // '('
        if self.cur.kind == TokenKind::Hash {
            let tag = self.try_tag()?;
            if self.cur.kind != TokenKind::RParen {
                return None;
            }
            self.take(); // ')'
            let lit = self.lit[mark..].to_string();
            return Some(Subject::from_parts_tag(lit, tag));
        }
        let mut text = String::new();
        while self.cur.kind != TokenKind::RParen {
            if self.cur.kind.is_line_end() {
                return None;
            }
            text.push_str(&self.cur.lit);
            self.take();
        }
        if text.is_empty() {
            return None;
        }
        self.take(); // ')'
        let lit = self.lit[mark..].to_string();
        Some(Subject::from_parts_text(lit, text))
    }

    /// Try to parse a link. The current token is `[`, `!`, or `<`.
    fn try_link(&mut self) -> Option<Link> {
        let mark = self.lit.len();
        match self.cur.kind {
            TokenKind::LBrack => {
                self.take(); // '['
                self.bracket_link(mark, LinkKind::Standard)
            }
            TokenKind::Bang => {
                self.take(); // '!'
                if self.cur.kind != TokenKind::LBrack {
                    return None;
                }
                self.take(); // '['
                self.bracket_link(mark, LinkKind::Media)
            }
            TokenKind::Lt => {
                self.take(); // '<'
                // A plain link holds a URL: there must be a scheme
                // inside the angle brackets, and no whitespace.
                let mut target = String::new();
                let mut saw_scheme = false;
                loop {
                    match self.cur.kind {
                        TokenKind::Gt => break,
                        TokenKind::Scheme => {
                            saw_scheme = true;
                            target.push_str(&self.cur.lit);
                            self.take();
                        }
                        TokenKind::Space
                        | TokenKind::Tab
                        | TokenKind::LineSep
                        | TokenKind::Newline
                        | TokenKind::Eof
                        | TokenKind::Illegal => return None,
                        _ => {
                            target.push_str(&self.cur.lit);
                            self.take();
                        }
                    }
                }
                if !saw_scheme || target.is_empty() {
                    return None;
                }
                self.take(); // '>'
                let lit = self.lit[mark..].to_string();
                Some(Link::from_parts(lit, String::new(), target, LinkKind::Plain))
            }
            _ => None,
        }
    }

    /// Parse the `text](target)` remainder of a bracketed link form.
    fn bracket_link(&mut self, mark: usize, kind: LinkKind) -> Option<Link> {
        let text = self.delimited(TokenKind::RBrack)?;
        self.take(); // ']'
        if self.cur.kind != TokenKind::LParen {
            return None;
        }
        self.take(); // '('
        let target = self.delimited(TokenKind::RParen)?;
        self.take(); // ')'
        let lit = self.lit[mark..].to_string();
        Some(Link::from_parts(lit, text, target, kind))
    }

    /// Collect token literals up to (not including) `close`, honoring
    /// backslash escapes. Fails at end of line.
    fn delimited(&mut self, close: TokenKind) -> Option<String> {
        let mut out = String::new();
        loop {
            match self.cur.kind {
                k if k == close => return Some(out),
                TokenKind::Newline | TokenKind::Eof => return None,
                TokenKind::Backslash => {
                    out.push_str(&self.cur.lit);
                    self.take();
                    if self.cur.kind.is_line_end() {
                        return None;
                    }
                    out.push_str(&self.cur.lit);
                    self.take();
                }
                _ => {
                    out.push_str(&self.cur.lit);
                    self.take();
                }
            }
        }
    }

    /// Parse a naked link. The current token is a word and the next
    /// is `://`.
    fn naked_link(&mut self) -> Link {
        let mark = self.lit.len();
        let mut target = String::new();
        target.push_str(&self.cur.lit);
        self.take(); // the scheme word
        target.push_str(&self.cur.lit);
        self.take(); // '://'
        if self.cur.kind == TokenKind::Text {
            target.push_str(&self.cur.lit);
            self.take();
        }
        let lit = self.lit[mark..].to_string();
        Link::from_parts(lit, String::new(), target, LinkKind::Naked)
    }

    /// Consume a whitespace-free field inside `<…>`: everything up to
    /// a space, an angle bracket, or the end of the line.
    fn take_field(&mut self) -> String {
        let mut field = String::new();
        loop {
            match self.cur.kind {
                TokenKind::Space
                | TokenKind::Tab
                | TokenKind::Gt
                | TokenKind::Lt
                | TokenKind::LineSep
                | TokenKind::Newline
                | TokenKind::Eof
                | TokenKind::Illegal => break,
                _ => {
                    field.push_str(&self.cur.lit);
                    self.take();
                }
            }
        }
        field
    }
}
