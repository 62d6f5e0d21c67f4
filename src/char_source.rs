use std::io;

use crate::error::{Error, Result};

/// Returned by `read`/`look_ahead` when the stream is exhausted.
pub const END_OF_STREAM: i32 = -1;
/// Returned by `last_read_char` before the first `read` call.
pub const UNDEFINED: i32 = -2;

/// The default size, in bytes, of `CharSource`'s internal read buffer.
pub const DEFAULT_BUFFER_CAPACITY: usize = 8 * 1024;

/// A buffered, single-character-lookahead reader over a UTF-8 byte stream.
///
/// `CharSource` is the leaf of this crate: it owns the only place bytes get
/// decoded into `char`s, which is also the only place line numbers, the
/// character offset and the byte offset get tracked. Everything above it
/// (`Lexer`, `Parser`) only ever sees `char`s.
///
/// At most one character of lookahead is buffered at a time, matching the
/// guarantee the lexer's state machine relies on.
pub struct CharSource<R> {
    inner: R,
    buf: Vec<u8>,
    start: usize,
    end: usize,
    inner_eof: bool,
    lookahead: Option<i32>,
    last_char: i32,
    line: u64,
    char_offset: u64,
    byte_offset: u64,
}

impl<R: io::Read> CharSource<R> {
    /// Wraps `inner` with the default buffer capacity.
    pub fn new(inner: R) -> CharSource<R> {
        CharSource::with_capacity(inner, DEFAULT_BUFFER_CAPACITY)
    }

    /// Wraps `inner` with a buffer of the given byte capacity.
    pub fn with_capacity(inner: R, capacity: usize) -> CharSource<R> {
        CharSource {
            inner,
            buf: vec![0u8; capacity.max(4)],
            start: 0,
            end: 0,
            inner_eof: false,
            lookahead: None,
            last_char: UNDEFINED,
            line: 1,
            char_offset: 0,
            byte_offset: 0,
        }
    }

    /// Reads and consumes the next char, or `END_OF_STREAM` at EOF.
    ///
    /// Advances `line` when a full record-separator sequence is consumed:
    /// `\r` always advances the line; `\n` advances it unless the
    /// previous char was `\r` (so `\r\n` advances the line exactly once).
    pub fn read(&mut self) -> Result<i32> {
        let c = self.peek()?;
        self.lookahead = None;
        if c != END_OF_STREAM {
            self.char_offset += 1;
            let cr = b'\r' as i32;
            let lf = b'\n' as i32;
            if c == cr || (c == lf && self.last_char != cr) {
                self.line += 1;
            }
        }
        self.last_char = c;
        Ok(c)
    }

    /// Returns the next char without consuming it.
    pub fn look_ahead(&mut self) -> Result<i32> {
        self.peek()
    }

    /// Returns the char most recently returned by `read`, or `UNDEFINED`
    /// before the first call to `read`.
    pub fn last_read_char(&self) -> i32 {
        self.last_char
    }

    /// Reads and discards through the next `\n`, `\r\n` or EOF, returning
    /// the line's content without its terminator. Returns `None` only if
    /// called exactly at EOF (nothing left to read at all).
    pub fn read_line(&mut self) -> Result<Option<String>> {
        if self.peek()? == END_OF_STREAM {
            return Ok(None);
        }
        let mut line = String::new();
        loop {
            let c = self.read()?;
            if c == END_OF_STREAM {
                break;
            }
            if c == b'\n' as i32 {
                break;
            }
            if c == b'\r' as i32 {
                if self.look_ahead()? == b'\n' as i32 {
                    self.read()?;
                }
                break;
            }
            line.push(char_from_code(c));
        }
        Ok(Some(line))
    }

    /// The current 1-based line number.
    pub fn line(&self) -> u64 {
        self.line
    }

    /// The number of chars consumed so far (the position of the next
    /// char `read` will return).
    pub fn char_offset(&self) -> u64 {
        self.char_offset
    }

    /// The number of bytes consumed so far, equivalently the byte offset
    /// of the next char `read` will return.
    pub fn byte_offset(&self) -> u64 {
        self.byte_offset
    }

    fn peek(&mut self) -> Result<i32> {
        if let Some(c) = self.lookahead {
            return Ok(c);
        }
        let c = self.decode_char()?;
        self.lookahead = Some(c);
        Ok(c)
    }

    /// Ensures at least `want` bytes are available starting at `self.start`,
    /// short of true EOF. Compacts the buffer (and grows it, for the
    /// pathological case of a read smaller than 4 bytes) as needed.
    fn ensure(&mut self, want: usize) -> io::Result<()> {
        while self.end - self.start < want && !self.inner_eof {
            if self.start > 0 {
                self.buf.copy_within(self.start..self.end, 0);
                self.end -= self.start;
                self.start = 0;
            }
            if self.end == self.buf.len() {
                let new_len = self.buf.len() * 2;
                self.buf.resize(new_len, 0);
            }
            let n = self.inner.read(&mut self.buf[self.end..])?;
            if n == 0 {
                self.inner_eof = true;
            } else {
                self.end += n;
            }
        }
        Ok(())
    }

    fn decode_char(&mut self) -> Result<i32> {
        self.ensure(4)?;
        if self.start == self.end {
            return Ok(END_OF_STREAM);
        }
        let lead = self.buf[self.start];
        let len = utf8_len(lead).ok_or(Error::Utf8 {
            valid_up_to: self.byte_offset as usize,
        })?;
        self.ensure(len)?;
        if self.end - self.start < len {
            return Err(Error::Utf8 {
                valid_up_to: self.byte_offset as usize,
            });
        }
        let bytes = &self.buf[self.start..self.start + len];
        let s = std::str::from_utf8(bytes).map_err(|_| Error::Utf8 {
            valid_up_to: self.byte_offset as usize,
        })?;
        let ch = s.chars().next().expect("decoded at least one char");
        self.start += len;
        self.byte_offset += len as u64;
        Ok(ch as i32)
    }
}

fn char_from_code(c: i32) -> char {
    char::from_u32(c as u32).expect("code originated from a decoded char")
}

/// The number of UTF-8 bytes a char starting with `lead` occupies, or
/// `None` if `lead` cannot start a UTF-8 sequence.
fn utf8_len(lead: u8) -> Option<usize> {
    match lead {
        0x00..=0x7f => Some(1),
        0xc2..=0xdf => Some(2),
        0xe0..=0xef => Some(3),
        0xf0..=0xf4 => Some(4),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn src(s: &str) -> CharSource<Cursor<Vec<u8>>> {
        CharSource::new(Cursor::new(s.as_bytes().to_vec()))
    }

    #[test]
    fn reads_ascii() {
        let mut c = src("ab");
        assert_eq!(c.read().unwrap(), 'a' as i32);
        assert_eq!(c.read().unwrap(), 'b' as i32);
        assert_eq!(c.read().unwrap(), END_OF_STREAM);
    }

    #[test]
    fn lookahead_does_not_consume() {
        let mut c = src("xy");
        assert_eq!(c.look_ahead().unwrap(), 'x' as i32);
        assert_eq!(c.look_ahead().unwrap(), 'x' as i32);
        assert_eq!(c.read().unwrap(), 'x' as i32);
        assert_eq!(c.read().unwrap(), 'y' as i32);
    }

    #[test]
    fn last_read_char_starts_undefined() {
        let mut c = src("z");
        assert_eq!(c.last_read_char(), UNDEFINED);
        c.read().unwrap();
        assert_eq!(c.last_read_char(), 'z' as i32);
    }

    #[test]
    fn crlf_counts_as_one_line() {
        let mut c = src("a\r\nb");
        assert_eq!(c.read().unwrap(), 'a' as i32);
        assert_eq!(c.line(), 1);
        assert_eq!(c.read().unwrap(), '\r' as i32);
        assert_eq!(c.line(), 2);
        assert_eq!(c.read().unwrap(), '\n' as i32);
        assert_eq!(c.line(), 2);
        assert_eq!(c.read().unwrap(), 'b' as i32);
        assert_eq!(c.line(), 2);
    }

    #[test]
    fn lone_cr_and_lf_each_count() {
        let mut c = src("a\rb\nc");
        c.read().unwrap();
        assert_eq!(c.read().unwrap(), '\r' as i32);
        assert_eq!(c.line(), 2);
        c.read().unwrap();
        assert_eq!(c.read().unwrap(), '\n' as i32);
        assert_eq!(c.line(), 3);
    }

    #[test]
    fn decodes_multibyte_utf8_and_tracks_byte_offset() {
        // "あ" is U+3042, 3 bytes in UTF-8.
        let mut c = src("aあb");
        assert_eq!(c.read().unwrap(), 'a' as i32);
        assert_eq!(c.byte_offset(), 1);
        assert_eq!(c.read().unwrap(), 'あ' as i32);
        assert_eq!(c.byte_offset(), 4);
        assert_eq!(c.char_offset(), 2);
        assert_eq!(c.read().unwrap(), 'b' as i32);
        assert_eq!(c.byte_offset(), 5);
    }

    #[test]
    fn read_line_strips_terminator() {
        let mut c = src("one\r\ntwo\nthree");
        assert_eq!(c.read_line().unwrap().as_deref(), Some("one"));
        assert_eq!(c.read_line().unwrap().as_deref(), Some("two"));
        assert_eq!(c.read_line().unwrap().as_deref(), Some("three"));
        assert_eq!(c.read_line().unwrap(), None);
    }

    #[test]
    fn small_buffer_capacity_still_decodes_multibyte_across_refills() {
        let mut c = CharSource::with_capacity(Cursor::new("あい".as_bytes().to_vec()), 4);
        assert_eq!(c.read().unwrap(), 'あ' as i32);
        assert_eq!(c.read().unwrap(), 'い' as i32);
        assert_eq!(c.read().unwrap(), END_OF_STREAM);
    }

    #[test]
    fn invalid_utf8_is_an_error() {
        let mut c = CharSource::new(Cursor::new(vec![0xff, 0x61]));
        assert!(c.read().is_err());
    }
}
