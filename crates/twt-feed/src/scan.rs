//! Decode a byte stream into Unicode code points, one symbol at a time.
//!
//! The scanner double-buffers raw bytes from an arbitrary
//! [`Read`] source and decodes UTF-8 incrementally. End of input and
//! undecodable bytes are ordinary symbols, not errors; the tokenizer
//! turns them into its own `Eof` and `Illegal` tokens. The scanner
//! also tracks the line and column of the current symbol, which the
//! tokenizer needs for its line-start mode rule.

use std::io::Read;

/// Size of the scanner's internal read buffer.
///
/// Values much lower than 2k measurably limit throughput on large feeds.
const BUF_LEN: usize = 4096;

/// One decoded symbol of input.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum Sym {
    /// A decoded Unicode code point.
    Char(char),
    /// The end of the input stream.
    Eof,
    /// A byte that is not part of any valid UTF-8 sequence.
    Invalid,
}

/// A cursor over the code points of a byte stream.
pub(crate) struct Scanner<R: Read> {
    /// The byte source.
    src: R,
    /// Raw bytes read from `src` but not yet decoded.
    buf: [u8; BUF_LEN],
    /// Offset of the first undecoded byte in `buf`.
    pos: usize,
    /// Number of valid bytes in `buf`.
    len: usize,
    /// Set once `src` has reported end of input (or an error).
    exhausted: bool,
    /// The current symbol.
    cur: Sym,
    /// Line number of the current symbol, 0-based.
    line: usize,
    /// Column of the current symbol within its line, in code points.
    col: usize,
}

impl<R: Read> Scanner<R> {
    /// Create a new Scanner over `src`, positioned on its first symbol.
    pub(crate) fn new(src: R) -> Self {
        let mut scan = Scanner {
            src,
            buf: [0_u8; BUF_LEN],
            pos: 0,
            len: 0,
            exhausted: false,
            cur: Sym::Eof,
            line: 0,
            col: 0,
        };
        scan.cur = scan.decode();
        scan
    }

    /// Return the current symbol.
    pub(crate) fn cur(&self) -> Sym {
        self.cur
    }

    /// Return the line number of the current symbol, 0-based.
    pub(crate) fn line(&self) -> usize {
        self.line
    }

    /// Return the column of the current symbol, 0-based.
    ///
    /// Column 0 is the line-start signal for the tokenizer's mode rule.
    pub(crate) fn col(&self) -> usize {
        self.col
    }

    /// Step to the next symbol. Does nothing once at end of input.
    pub(crate) fn advance(&mut self) {
        match self.cur {
            Sym::Eof => return,
            Sym::Char('\n') => {
                self.line += 1;
                self.col = 0;
            }
            _ => self.col += 1,
        }
        self.cur = self.decode();
    }

    /// Shift any unconsumed bytes to the front of the buffer and read
    /// more from the source.
    ///
    /// A short read is retried until at least one whole UTF-8 sequence
    /// can be buffered or the source is exhausted. A read error is
    /// treated as end of input: the caller bounds input size, not us.
    fn refill(&mut self) {
        self.buf.copy_within(self.pos..self.len, 0);
        self.len -= self.pos;
        self.pos = 0;
        while !self.exhausted && self.len < BUF_LEN {
            match self.src.read(&mut self.buf[self.len..]) {
                Ok(0) | Err(_) => self.exhausted = true,
                Ok(n) => {
                    self.len += n;
                    if self.len >= 4 {
                        break;
                    }
                }
            }
        }
    }

    /// Decode the symbol at the current buffer position.
    fn decode(&mut self) -> Sym {
        if self.pos == self.len {
            self.refill();
            if self.pos == self.len {
                return Sym::Eof;
            }
        }
        let width = match self.buf[self.pos] {
            0x00..=0x7f => 1,
            0xc0..=0xdf => 2,
            0xe0..=0xef => 3,
            0xf0..=0xf7 => 4,
            _ => {
                self.pos += 1;
                return Sym::Invalid;
            }
        };
        if self.pos + width > self.len {
            // The sequence is split across the buffer boundary.
            self.refill();
            if self.pos + width > self.len {
                // Truncated sequence at end of input.
                self.pos += 1;
                return Sym::Invalid;
            }
        }
        match std::str::from_utf8(&self.buf[self.pos..self.pos + width]) {
            Ok(s) => match s.chars().next() {
                Some(c) => {
                    self.pos += width;
                    Sym::Char(c)
                }
                None => {
                    self.pos += 1;
                    Sym::Invalid
                }
            },
            Err(_) => {
                self.pos += 1;
                Sym::Invalid
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    /// A reader that doles its contents out one byte at a time, to
    /// exercise sequences split across refills.
    struct OneByte<'a>(&'a [u8]);
    impl<'a> Read for OneByte<'a> {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.0.is_empty() || buf.is_empty() {
                return Ok(0);
            }
            buf[0] = self.0[0];
            self.0 = &self.0[1..];
            Ok(1)
        }
    }

    fn collect<R: Read>(mut s: Scanner<R>) -> Vec<Sym> {
        let mut out = Vec::new();
        while s.cur() != Sym::Eof {
            out.push(s.cur());
            s.advance();
        }
        out
    }

    #[test]
    fn decodes_code_points() {
        let scan = Scanner::new("hello\u{2028}there. 👋".as_bytes());
        let want: Vec<Sym> = "hello\u{2028}there. 👋".chars().map(Sym::Char).collect();
        assert_eq!(collect(scan), want);
    }

    #[test]
    fn eof_is_sticky() {
        let mut scan = Scanner::new(&b""[..]);
        assert_eq!(scan.cur(), Sym::Eof);
        scan.advance();
        assert_eq!(scan.cur(), Sym::Eof);
    }

    #[test]
    fn invalid_bytes_are_symbols() {
        // 0xff can never start a UTF-8 sequence; 0xc3 0x28 is a bad
        // continuation; both consume and keep going.
        let scan = Scanner::new(&b"a\xffb\xc3\x28c"[..]);
        assert_eq!(
            collect(scan),
            vec![
                Sym::Char('a'),
                Sym::Invalid,
                Sym::Char('b'),
                Sym::Invalid,
                Sym::Char('('),
                Sym::Char('c'),
            ]
        );
    }

    #[test]
    fn truncated_sequence_at_eof() {
        // A lone leading byte of a 3-byte sequence.
        let scan = Scanner::new(&b"ab\xe2\x80"[..]);
        assert_eq!(
            collect(scan),
            vec![Sym::Char('a'), Sym::Char('b'), Sym::Invalid, Sym::Invalid]
        );
    }

    #[test]
    fn multibyte_across_refills() {
        let text = "a👋\u{2028}z";
        let scan = Scanner::new(OneByte(text.as_bytes()));
        let want: Vec<Sym> = text.chars().map(Sym::Char).collect();
        assert_eq!(collect(scan), want);
    }

    #[test]
    fn tracks_line_and_column() {
        let mut scan = Scanner::new(&b"ab\ncd"[..]);
        assert_eq!((scan.line(), scan.col()), (0, 0));
        scan.advance(); // b
        assert_eq!((scan.line(), scan.col()), (0, 1));
        scan.advance(); // \n
        scan.advance(); // c
        assert_eq!((scan.line(), scan.col()), (1, 0));
        scan.advance(); // d
        assert_eq!((scan.line(), scan.col()), (1, 1));
    }
}
