//! Parse, render, and hash feeds in the twtxt line format.
//!
//! # Overview
//!
//! A twtxt feed is a plain-text file: comment lines starting with
//! `#` (some of which carry `key = value` metadata), blank lines, and
//! post lines of the form `<timestamp><TAB><message>`. The message
//! body is a small inline grammar of mentions (`@<nick url>`), tags
//! (`#<topic url>`), a leading reply subject (`(#hash)`), links in
//! four spellings, code spans, and soft line breaks.
//!
//! This crate is the engine for that format: a streaming UTF-8
//! scanner, a mode-switching tokenizer, a permissive recursive-descent
//! parser, a canonical multi-mode renderer, and the deterministic
//! content hash that federated pods use to identify posts. Parsing is
//! permissive: anything that fails to parse as structure is kept as
//! plain text, so no input is ever lost, and every parsed post
//! renders back to its original bytes.
//!
//! Fetching, caching, storage, templating, and accounts live
//! elsewhere; they consume [`Feed`] and [`Twt`] values through the
//! functions re-exported here and never influence parsing. Each parse
//! call owns its whole state, so parses of independent streams can
//! run concurrently without locking.
//!
//! # Example
//!
//! ```
//! use twt_feed::{parse_feed, TwtFormat, Twter};
//!
//! let src = "# nick = example\n2016-02-03T23:05:00Z\twelcome to twtxt!\n";
//! let twter = Twter::new("example", "http://example.org/twtxt.txt");
//! let feed = parse_feed(src.as_bytes(), &twter);
//!
//! assert_eq!(feed.twts().len(), 1);
//! let twt = &feed.twts()[0];
//! assert_eq!(twt.format_text(TwtFormat::Plain, None), "welcome to twtxt!");
//! assert_eq!(twt.hash(), "wk5q77q");
//! ```

#![deny(missing_docs)]
#![deny(unreachable_pub)]
#![warn(noop_method_call)]
#![warn(clippy::cognitive_complexity)]
#![deny(clippy::debug_assert_with_mut_call)]
#![deny(clippy::expl_impl_clone_on_copy)]
#![deny(clippy::fallible_impl_from)]
#![warn(clippy::manual_ok_or)]
#![deny(clippy::missing_docs_in_private_items)]
#![warn(clippy::needless_borrow)]
#![warn(clippy::option_option)]
#![warn(clippy::rc_buffer)]

mod ast;
mod err;
mod expand;
mod fmt;
mod hash;
mod meta;
mod parse;
mod scan;
mod tokenize;
mod twter;
mod util;

pub use ast::{
    Code, CodeKind, Comment, DateTime, Elem, Feed, Link, LinkKind, Mention, Subject, Tag, Text,
    Twt, LINE_SEP,
};
pub use err::{Error, Position};
pub use fmt::{TwtFormat, UrlPolicy};
pub use hash::HASH_LENGTH;
pub use meta::Meta;
pub use parse::{make_twt, parse_feed, parse_text, parse_twt};
pub use tokenize::TokenKind;
pub use twter::Twter;

/// Alias for the Result type returned by fallible operations in this
/// crate.
pub type Result<T> = std::result::Result<T, Error>;
