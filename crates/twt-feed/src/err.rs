//! Error types for feed parsing.

use thiserror::Error;

use crate::tokenize::TokenKind;
use std::fmt;

/// A position within a parsed feed. Used to tell where an error
/// occurred.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Position {
    /// Line number, 0-based.
    line: usize,
    /// Column within the line, 0-based, counted in code points.
    col: usize,
}

impl Position {
    /// Construct a Position from 0-based line/column coordinates.
    pub(crate) fn new(line: usize, col: usize) -> Self {
        Position { line, col }
    }
    /// Return the 1-based line number of this position.
    pub fn line(&self) -> usize {
        self.line + 1
    }
    /// Return the 1-based column of this position, in code points.
    pub fn column(&self) -> usize {
        self.col + 1
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, " at line {}, column {}", self.line + 1, self.col + 1)
    }
}

/// An error that occurred while parsing a feed or a single post.
///
/// Sub-rules that merely fail to match are not errors: the parser
/// falls back to plain text for those. An `Error` is only produced
/// where input cannot form a post at all (a bad timestamp, a line
/// that is neither comment nor post) or where a whole feed looks
/// dead on arrival.
#[derive(Error, Debug, Clone, Eq, PartialEq)]
#[non_exhaustive]
pub enum Error {
    /// A specific kind of token was required but another one was found.
    #[error("expected {expected}, found {found}{pos}")]
    UnexpectedToken {
        /// The kind of token the grammar needed here.
        expected: TokenKind,
        /// The kind of token that was actually found.
        found: TokenKind,
        /// Where the mismatch happened.
        pos: Position,
    },
    /// A timestamp matched the date-time grammar but did not denote a
    /// real instant (bad calendar field, bad zone offset, overflow).
    #[error("invalid timestamp{0}")]
    BadDateTime(Position),
    /// A line was neither a comment, a post, nor blank.
    #[error("unparseable line{0}")]
    BadLine(Position),
    /// Every line of the feed that was attempted failed to parse.
    ///
    /// This is a soft classification: the parser itself never refuses
    /// a feed over it. See [`Feed::is_erroneous`](crate::Feed::is_erroneous).
    #[error("erroneous feed: all {lines} attempted lines failed")]
    ErroneousFeed {
        /// How many lines were attempted (and failed).
        lines: usize,
    },
}
