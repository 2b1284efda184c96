//! Break feed input into typed tokens.
//!
//! The tokenizer is a pull-based, mode-switching lexer over the
//! code-point scanner. It has four modes. Default mode covers message
//! bodies and free text; Date mode is entered when a line begins with
//! a digit, Comment mode when a line begins with `#`, and End mode
//! once the input is exhausted. A tab or line terminator always
//! returns the lexer to Default mode; this is how the parser detects
//! that a date header has ended and a body begins.

use crate::err::Position;
use crate::scan::{Scanner, Sym};
use std::fmt;
use std::io::Read;

/// The kind of a single token.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum TokenKind {
    /// End of input. Returned indefinitely once reached.
    Eof,
    /// An undecodable byte sequence, or a stray character in Date mode.
    Illegal,
    /// A run of ASCII digits (Date mode only).
    Number,
    /// The U+2028 line separator: a soft break inside a post body.
    LineSep,
    /// A `\n` line terminator.
    Newline,
    /// A greedy run of ordinary text.
    Text,
    /// A run of whitespace starting with an ASCII space.
    Space,
    /// A tab, which ends a date header.
    Tab,
    /// `:` in Date mode.
    Colon,
    /// `-` in Date mode.
    Hyphen,
    /// `.` in Date mode.
    Dot,
    /// `+` in Date mode.
    Plus,
    /// The date/time separator `T`.
    TimeT,
    /// The UTC zone designator `Z`.
    ZoneZ,
    /// `#`.
    Hash,
    /// `=` in Comment mode.
    Equal,
    /// `@`.
    Amp,
    /// `<`.
    Lt,
    /// `>`.
    Gt,
    /// `(`.
    LParen,
    /// `)`.
    RParen,
    /// `[`.
    LBrack,
    /// `]`.
    RBrack,
    /// `!`.
    Bang,
    /// `\`, which escapes a following structural character.
    Backslash,
    /// The compound `://` following a bare word: marks a URL.
    Scheme,
    /// A backtick-delimited code span, delimiters included.
    Code,
}

impl TokenKind {
    /// Return true if this kind ends a line (newline or end of input).
    pub(crate) fn is_line_end(self) -> bool {
        matches!(self, TokenKind::Newline | TokenKind::Eof)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenKind::Eof => "end of input",
            TokenKind::Illegal => "illegal token",
            TokenKind::Number => "number",
            TokenKind::LineSep => "line separator",
            TokenKind::Newline => "newline",
            TokenKind::Text => "text",
            TokenKind::Space => "whitespace",
            TokenKind::Tab => "tab",
            TokenKind::Colon => "':'",
            TokenKind::Hyphen => "'-'",
            TokenKind::Dot => "'.'",
            TokenKind::Plus => "'+'",
            TokenKind::TimeT => "'T'",
            TokenKind::ZoneZ => "'Z'",
            TokenKind::Hash => "'#'",
            TokenKind::Equal => "'='",
            TokenKind::Amp => "'@'",
            TokenKind::Lt => "'<'",
            TokenKind::Gt => "'>'",
            TokenKind::LParen => "'('",
            TokenKind::RParen => "')'",
            TokenKind::LBrack => "'['",
            TokenKind::RBrack => "']'",
            TokenKind::Bang => "'!'",
            TokenKind::Backslash => "'\\'",
            TokenKind::Scheme => "'://'",
            TokenKind::Code => "code span",
        };
        write!(f, "{}", name)
    }
}

/// A token: its kind, the literal text it covers, and where it began.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct Token {
    /// What kind of token this is.
    pub(crate) kind: TokenKind,
    /// The exact input text the token covers.
    pub(crate) lit: String,
    /// The position of the token's first code point.
    pub(crate) pos: Position,
}

impl Token {
    /// Construct a token.
    fn new(kind: TokenKind, lit: String, pos: Position) -> Self {
        Token { kind, lit, pos }
    }
}

/// The lexer's mode.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum Mode {
    /// Message bodies and anything unrecognized.
    Default,
    /// A line that began with a digit: a date header.
    Date,
    /// A line that began with `#`.
    Comment,
    /// The input is exhausted.
    End,
}

/// A pull-based tokenizer: one token per `next_tok` call.
pub(crate) struct Tokenizer<R: Read> {
    /// Source of code points.
    scan: Scanner<R>,
    /// Current lexer mode.
    mode: Mode,
    /// When set, the line-start mode rule is suppressed: the input is
    /// a bare message body, not a feed of lines.
    bare_body: bool,
}

impl<R: Read> Tokenizer<R> {
    /// Create a tokenizer for feed input.
    pub(crate) fn new(src: R) -> Self {
        Tokenizer {
            scan: Scanner::new(src),
            mode: Mode::Default,
            bare_body: false,
        }
    }

    /// Create a tokenizer for a bare message body.
    ///
    /// Date and Comment modes never trigger, so a body may begin with
    /// a digit or `#` without being read as a date header or comment.
    pub(crate) fn for_body(src: R) -> Self {
        Tokenizer {
            scan: Scanner::new(src),
            mode: Mode::Default,
            bare_body: true,
        }
    }

    /// Read the next token from the input.
    pub(crate) fn next_tok(&mut self) -> Token {
        let pos = Position::new(self.scan.line(), self.scan.col());
        match self.scan.cur() {
            Sym::Char(' ') => self.space_run(pos),
            Sym::Char('\u{2028}') => self.single(TokenKind::LineSep, pos),
            Sym::Char('\t') => {
                self.mode = Mode::Default;
                self.single(TokenKind::Tab, pos)
            }
            Sym::Char('\n') => {
                self.mode = Mode::Default;
                self.single(TokenKind::Newline, pos)
            }
            Sym::Eof => {
                self.mode = Mode::End;
                Token::new(TokenKind::Eof, String::new(), pos)
            }
            Sym::Invalid => {
                self.scan.advance();
                Token::new(TokenKind::Illegal, '\u{fffd}'.to_string(), pos)
            }
            Sym::Char(c) => {
                if self.mode == Mode::Default && !self.bare_body && self.scan.col() == 0 {
                    if c.is_ascii_digit() {
                        self.mode = Mode::Date;
                    } else if c == '#' {
                        self.mode = Mode::Comment;
                    }
                }
                match self.mode {
                    Mode::Default => self.default_tok(c, pos),
                    Mode::Date => self.date_tok(c, pos),
                    Mode::Comment => self.comment_tok(c, pos),
                    Mode::End => Token::new(TokenKind::Eof, String::new(), pos),
                }
            }
        }
    }

    /// Consume the current code point as a one-character token.
    fn single(&mut self, kind: TokenKind, pos: Position) -> Token {
        let mut lit = String::new();
        if let Sym::Char(c) = self.scan.cur() {
            lit.push(c);
        }
        self.scan.advance();
        Token::new(kind, lit, pos)
    }

    /// Consume a run of whitespace. Tabs, newlines, and U+2028 are
    /// their own tokens and end the run.
    fn space_run(&mut self, pos: Position) -> Token {
        let mut lit = String::new();
        while let Sym::Char(c) = self.scan.cur() {
            if c == '\t' || c == '\n' || c == '\u{2028}' || !c.is_whitespace() {
                break;
            }
            lit.push(c);
            self.scan.advance();
        }
        Token::new(TokenKind::Space, lit, pos)
    }

    /// Tokenize in Default mode.
    fn default_tok(&mut self, c: char, pos: Position) -> Token {
        match c {
            '@' => self.single(TokenKind::Amp, pos),
            '#' => self.single(TokenKind::Hash, pos),
            '<' => self.single(TokenKind::Lt, pos),
            '>' => self.single(TokenKind::Gt, pos),
            '(' => self.single(TokenKind::LParen, pos),
            ')' => self.single(TokenKind::RParen, pos),
            '[' => self.single(TokenKind::LBrack, pos),
            ']' => self.single(TokenKind::RBrack, pos),
            '!' => self.single(TokenKind::Bang, pos),
            '\\' => self.single(TokenKind::Backslash, pos),
            '`' => self.code_run(pos),
            ':' => self.scheme_or_text(pos),
            _ => self.text_run(pos),
        }
    }

    /// Tokenize in Date mode.
    fn date_tok(&mut self, c: char, pos: Position) -> Token {
        match c {
            ':' => self.single(TokenKind::Colon, pos),
            '-' => self.single(TokenKind::Hyphen, pos),
            '+' => self.single(TokenKind::Plus, pos),
            '.' => self.single(TokenKind::Dot, pos),
            'T' => self.single(TokenKind::TimeT, pos),
            'Z' => self.single(TokenKind::ZoneZ, pos),
            '0'..='9' => self.number_run(pos),
            _ => {
                self.scan.advance();
                Token::new(TokenKind::Illegal, c.to_string(), pos)
            }
        }
    }

    /// Tokenize in Comment mode.
    fn comment_tok(&mut self, c: char, pos: Position) -> Token {
        match c {
            '#' => self.single(TokenKind::Hash, pos),
            '=' => self.single(TokenKind::Equal, pos),
            _ => {
                let mut lit = String::new();
                while let Sym::Char(c) = self.scan.cur() {
                    if c == '=' || c == '\n' {
                        break;
                    }
                    lit.push(c);
                    self.scan.advance();
                }
                Token::new(TokenKind::Text, lit, pos)
            }
        }
    }

    /// Consume a run of digits.
    fn number_run(&mut self, pos: Position) -> Token {
        let mut lit = String::new();
        while let Sym::Char(c) = self.scan.cur() {
            if !c.is_ascii_digit() {
                break;
            }
            lit.push(c);
            self.scan.advance();
        }
        Token::new(TokenKind::Number, lit, pos)
    }

    /// Consume a greedy run of ordinary text.
    fn text_run(&mut self, pos: Position) -> Token {
        let mut lit = String::new();
        while let Sym::Char(c) = self.scan.cur() {
            if ends_text(c) {
                break;
            }
            lit.push(c);
            self.scan.advance();
        }
        Token::new(TokenKind::Text, lit, pos)
    }

    /// Consume a `:`, which is a Scheme token when (and only when)
    /// `//` follows. Whatever else was consumed stays literal text.
    fn scheme_or_text(&mut self, pos: Position) -> Token {
        let mut lit = String::from(":");
        self.scan.advance();
        if self.scan.cur() == Sym::Char('/') {
            lit.push('/');
            self.scan.advance();
            if self.scan.cur() == Sym::Char('/') {
                lit.push('/');
                self.scan.advance();
                return Token::new(TokenKind::Scheme, lit, pos);
            }
        }
        Token::new(TokenKind::Text, lit, pos)
    }

    /// Consume a backtick-delimited code span.
    ///
    /// One backtick opens an inline span that closes at the next
    /// backtick (or gives up at a line break). Three backticks open a
    /// block span that closes only at another three backticks or the
    /// end of the stream, and so may cross line breaks. Two backticks
    /// are the empty inline span.
    fn code_run(&mut self, pos: Position) -> Token {
        let mut lit = String::from("`");
        self.scan.advance();
        if self.scan.cur() != Sym::Char('`') {
            self.inline_code(&mut lit);
            return Token::new(TokenKind::Code, lit, pos);
        }
        lit.push('`');
        self.scan.advance();
        if self.scan.cur() != Sym::Char('`') {
            return Token::new(TokenKind::Code, lit, pos);
        }
        lit.push('`');
        self.scan.advance();
        let mut run = 0;
        while let Sym::Char(c) = self.scan.cur() {
            lit.push(c);
            self.scan.advance();
            if c == '`' {
                run += 1;
                if run == 3 {
                    break;
                }
            } else {
                run = 0;
            }
        }
        Token::new(TokenKind::Code, lit, pos)
    }

    /// Consume the remainder of an inline code span.
    fn inline_code(&mut self, lit: &mut String) {
        while let Sym::Char(c) = self.scan.cur() {
            if c == '\n' || c == '\u{2028}' {
                break;
            }
            lit.push(c);
            self.scan.advance();
            if c == '`' {
                break;
            }
        }
    }
}

/// Return true if `c` ends a text run in Default mode.
fn ends_text(c: char) -> bool {
    matches!(
        c,
        ' ' | '\t'
            | '\n'
            | '\u{2028}'
            | '@'
            | '#'
            | '<'
            | '>'
            | '('
            | ')'
            | '['
            | ']'
            | '!'
            | '\\'
            | ':'
            | '`'
    )
}
