use std::io;

use crate::char_source::{CharSource, END_OF_STREAM, UNDEFINED};
use crate::error::{Error, LexError, Result, EOF_CHAR};
use crate::format::Format;
use crate::token::{Token, TokenKind};

/// States of the tokenizer's state machine (spec §4.3).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    Begin,
    Plain,
    InQuote,
    AfterQuote,
    EscPlain,
    EscQuote,
}

/// Consumes a [`CharSource`] and emits [`Token`]s per a [`Format`].
///
/// `Lexer` is the hardest single piece of this crate: quoted fields,
/// escape sequences, embedded record separators, comments, empty-line
/// suppression and surrounding-space trimming all fall out of the state
/// table in spec §4.3, which this implementation follows transition for
/// transition.
pub struct Lexer<R> {
    source: CharSource<R>,
    format: Format,
    is_record_start: bool,
}

impl<R: io::Read> Lexer<R> {
    pub fn new(source: CharSource<R>, format: Format) -> Lexer<R> {
        Lexer {
            source,
            format,
            is_record_start: true,
        }
    }

    pub fn into_source(self) -> CharSource<R> {
        self.source
    }

    pub fn source(&self) -> &CharSource<R> {
        &self.source
    }

    /// Fills in `tok` with the next token. The caller supplies `tok` and
    /// is expected to have called `tok.reset()` (or use a fresh `Token`);
    /// this method will clear it regardless.
    pub fn next_token(&mut self, tok: &mut Token) -> Result<()> {
        tok.reset();
        let mut state = State::Begin;
        let mut trim_trailing = false;
        let mut start_line = self.source.line();

        loop {
            match state {
                State::Begin => {
                    if self.skip_blank_lines()? {
                        tok.kind = TokenKind::Eof;
                        return Ok(());
                    }
                    let c = self.source.read()?;
                    if c == END_OF_STREAM {
                        tok.kind = TokenKind::Eof;
                        return Ok(());
                    }
                    let ch = char_of(c);

                    if self.is_record_start {
                        if let Some(marker) = self.format.comment_marker() {
                            if ch == marker {
                                self.consume_comment_line(tok)?;
                                tok.kind = TokenKind::Comment;
                                return Ok(());
                            }
                        }
                    }
                    if let Some(quote) = self.format.quote() {
                        if ch == quote {
                            start_line = self.source.line();
                            state = State::InQuote;
                            continue;
                        }
                    }
                    if ch == self.format.delimiter() {
                        self.is_record_start = false;
                        tok.kind = TokenKind::Token;
                        return Ok(());
                    }
                    if is_eol(ch) {
                        self.consume_eol_pair(c)?;
                        self.is_record_start = true;
                        tok.kind = TokenKind::EoRecord;
                        return Ok(());
                    }
                    if let Some(escape) = self.format.escape() {
                        if ch == escape {
                            state = State::EscPlain;
                            continue;
                        }
                    }
                    if ch.is_whitespace() {
                        if self.format.ignore_surrounding_spaces() {
                            state = State::Begin;
                            continue;
                        }
                        tok.content.push(ch);
                        state = State::Plain;
                        continue;
                    }
                    tok.content.push(ch);
                    state = State::Plain;
                }

                State::Plain => {
                    let c = self.source.read()?;
                    if c == END_OF_STREAM {
                        if trim_trailing {
                            trim_trailing_whitespace(&mut tok.content);
                        }
                        self.is_record_start = false;
                        tok.kind = TokenKind::Eof;
                        return Ok(());
                    }
                    let ch = char_of(c);
                    if ch == self.format.delimiter() {
                        if trim_trailing {
                            trim_trailing_whitespace(&mut tok.content);
                        }
                        self.is_record_start = false;
                        tok.kind = TokenKind::Token;
                        return Ok(());
                    }
                    if is_eol(ch) {
                        self.consume_eol_pair(c)?;
                        if trim_trailing {
                            trim_trailing_whitespace(&mut tok.content);
                        }
                        self.is_record_start = true;
                        tok.kind = TokenKind::EoRecord;
                        return Ok(());
                    }
                    if let Some(escape) = self.format.escape() {
                        if ch == escape {
                            state = State::EscPlain;
                            continue;
                        }
                    }
                    tok.content.push(ch);
                    trim_trailing = self.format.ignore_surrounding_spaces();
                    state = State::Plain;
                }

                State::InQuote => {
                    let c = self.source.read()?;
                    if c == END_OF_STREAM {
                        return Err(Error::Lex(LexError::UnterminatedQuote {
                            line: start_line,
                            char: EOF_CHAR,
                            char_position: self.source.char_offset(),
                        }));
                    }
                    let ch = char_of(c);
                    if let Some(quote) = self.format.quote() {
                        if ch == quote {
                            state = State::AfterQuote;
                            continue;
                        }
                    }
                    if let Some(escape) = self.format.escape() {
                        if ch == escape {
                            state = State::EscQuote;
                            continue;
                        }
                    }
                    tok.content.push(ch);
                    state = State::InQuote;
                }

                State::AfterQuote => {
                    let c = self.source.read()?;
                    if c == END_OF_STREAM {
                        self.is_record_start = false;
                        tok.kind = TokenKind::Eof;
                        return Ok(());
                    }
                    let ch = char_of(c);
                    if ch == self.format.delimiter() {
                        self.is_record_start = false;
                        tok.kind = TokenKind::Token;
                        return Ok(());
                    }
                    if is_eol(ch) {
                        self.consume_eol_pair(c)?;
                        self.is_record_start = true;
                        tok.kind = TokenKind::EoRecord;
                        return Ok(());
                    }
                    if let Some(quote) = self.format.quote() {
                        if ch == quote {
                            tok.content.push(ch);
                            state = State::InQuote;
                            continue;
                        }
                    }
                    if ch.is_whitespace() {
                        if self.format.ignore_surrounding_spaces() {
                            state = State::AfterQuote;
                            continue;
                        }
                        return Err(Error::Lex(LexError::BadCharAfterQuote {
                            line: self.source.line(),
                            char: ch,
                            char_position: self.source.char_offset(),
                        }));
                    }
                    return Err(Error::Lex(LexError::BadCharAfterQuote {
                        line: self.source.line(),
                        char: ch,
                        char_position: self.source.char_offset(),
                    }));
                }

                State::EscPlain => {
                    let c = self.source.read()?;
                    if c == END_OF_STREAM {
                        return Err(Error::Lex(LexError::UnterminatedEscape {
                            line: start_line,
                            char: EOF_CHAR,
                            char_position: self.source.char_offset(),
                        }));
                    }
                    let ch = char_of(c);
                    let literal = ch == self.format.delimiter()
                        || is_eol(ch)
                        || self.format.escape() == Some(ch);
                    if !literal {
                        if let Some(escape) = self.format.escape() {
                            tok.content.push(escape);
                        }
                    }
                    tok.content.push(ch);
                    state = State::Plain;
                }

                State::EscQuote => {
                    let c = self.source.read()?;
                    if c == END_OF_STREAM {
                        return Err(Error::Lex(LexError::UnterminatedEscape {
                            line: start_line,
                            char: EOF_CHAR,
                            char_position: self.source.char_offset(),
                        }));
                    }
                    let ch = char_of(c);
                    let literal =
                        self.format.quote() == Some(ch) || self.format.escape() == Some(ch);
                    if !literal {
                        if let Some(escape) = self.format.escape() {
                            tok.content.push(escape);
                        }
                    }
                    tok.content.push(ch);
                    state = State::InQuote;
                }
            }
        }
    }

    /// Consumes leading blank lines when `ignore_empty_lines` is set.
    /// Returns `true` if the stream ended while skipping (caller should
    /// emit `Eof`).
    fn skip_blank_lines(&mut self) -> Result<bool> {
        if !self.format.ignore_empty_lines() {
            return Ok(false);
        }
        loop {
            let last = self.source.last_read_char();
            let at_boundary = last == UNDEFINED || last == '\n' as i32 || last == '\r' as i32;
            if !at_boundary {
                return Ok(false);
            }
            let la = self.source.look_ahead()?;
            if la == END_OF_STREAM {
                return Ok(true);
            }
            if la == '\n' as i32 || la == '\r' as i32 {
                let c = self.source.read()?;
                self.consume_eol_pair(c)?;
                continue;
            }
            return Ok(false);
        }
    }

    /// After consuming an EOL char `first`, also consumes the paired `\n`
    /// if `first` was `\r` and a `\n` immediately follows, so `\r\n` is
    /// treated as a single terminator by the caller.
    fn consume_eol_pair(&mut self, first: i32) -> Result<()> {
        if first == '\r' as i32 && self.source.look_ahead()? == '\n' as i32 {
            self.source.read()?;
        }
        Ok(())
    }

    /// Consumes the rest of the physical line (the comment marker itself
    /// was already consumed by the caller) into `tok.content`, stopping at
    /// (and swallowing) the line terminator or EOF.
    fn consume_comment_line(&mut self, tok: &mut Token) -> Result<()> {
        if self.source.look_ahead()? == ' ' as i32 {
            self.source.read()?;
        }
        loop {
            let la = self.source.look_ahead()?;
            if la == END_OF_STREAM {
                return Ok(());
            }
            if la == '\n' as i32 || la == '\r' as i32 {
                let c = self.source.read()?;
                self.consume_eol_pair(c)?;
                return Ok(());
            }
            let c = self.source.read()?;
            tok.content.push(char_of(c));
        }
    }
}

fn char_of(c: i32) -> char {
    char::from_u32(c as u32).expect("code originated from a decoded char")
}

fn is_eol(ch: char) -> bool {
    ch == '\r' || ch == '\n'
}

fn trim_trailing_whitespace(s: &mut String) {
    let trimmed_len = s.trim_end().len();
    s.truncate(trimmed_len);
}
