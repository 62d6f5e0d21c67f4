use std::fs::File;
use std::io::{self, Cursor};
use std::mem;
use std::path::Path;
use std::rc::Rc;

use crate::char_source::CharSource;
use crate::error::{Error, HeaderError, Result};
use crate::format::Format;
use crate::lexer::Lexer;
use crate::record::{Headers, Record};
use crate::token::{Token, TokenKind};

/// The raw result of assembling one line's worth of tokens into fields,
/// before record numbering, trimming or null-sentinel resolution.
struct RawRecord {
    values: Vec<String>,
    char_pos: i64,
    byte_pos: i64,
}

/// Drives a [`Lexer`], assembling [`Record`]s and resolving header
/// semantics (spec §4.4).
///
/// `Parser` is a one-pass, non-restartable, pull-based iterator: records
/// are produced only as the caller advances it (spec §5). Once an error
/// is returned, the parser is left in a terminated state — every
/// subsequent call returns `None`.
pub struct Parser<R> {
    lexer: Lexer<R>,
    format: Format,
    header: Option<Rc<Headers>>,
    record_number: u64,
    pending_comment: Option<String>,
    done: bool,
}

impl<R: io::Read> Parser<R> {
    /// Builds a parser over `source`, running header resolution
    /// immediately (spec §4.2's "executed once at Parser start").
    pub fn new(source: R, format: Format) -> Result<Parser<R>> {
        let lexer = Lexer::new(CharSource::new(source), format.clone());
        let mut parser = Parser {
            lexer,
            format,
            header: None,
            record_number: 0,
            pending_comment: None,
            done: false,
        };
        parser.resolve_header()?;
        Ok(parser)
    }

    /// The header map resolved at construction, if any.
    pub fn header(&self) -> Option<&[String]> {
        self.header.as_ref().map(|h| h.names())
    }

    fn resolve_header(&mut self) -> Result<()> {
        let configured = self.format.header().map(|h| h.to_vec());
        let mut names = match configured {
            None => return Ok(()),
            Some(ref h) if h.is_empty() => match self.next_raw_record()? {
                Some(raw) => raw.values,
                None => Vec::new(),
            },
            Some(h) => {
                if self.format.skip_header_record() {
                    self.next_raw_record()?;
                }
                h
            }
        };
        if self.format.trim() {
            for n in names.iter_mut() {
                *n = n.trim().to_string();
            }
        }
        let missing = names.iter().filter(|n| n.is_empty()).count();
        if missing > 0 && !self.format.allow_missing_column_names() {
            return Err(HeaderError::MissingColumn.into());
        }
        let headers = Headers::build(names, self.format.duplicate_header_mode())
            .map_err(HeaderError::DuplicateColumn)?;
        self.header = Some(Rc::new(headers));
        Ok(())
    }

    /// Assembles the next line's fields from the lexer, per spec §4.4's
    /// algorithm. Returns `Ok(None)` once the stream is exhausted.
    fn next_raw_record(&mut self) -> Result<Option<RawRecord>> {
        if self.done {
            return Ok(None);
        }
        let mut fields: Vec<String> = Vec::new();
        let mut tok = Token::new();
        let mut char_pos: i64 = -1;
        let mut byte_pos: i64 = -1;
        let mut have_position = false;

        loop {
            if !have_position {
                char_pos = self.lexer.source().char_offset() as i64;
                byte_pos = self.lexer.source().byte_offset() as i64;
            }
            self.lexer.next_token(&mut tok)?;
            match tok.kind {
                TokenKind::Token => {
                    have_position = true;
                    fields.push(mem::take(&mut tok.content));
                }
                TokenKind::EoRecord => {
                    have_position = true;
                    let content = mem::take(&mut tok.content);
                    if content.is_empty()
                        && !fields.is_empty()
                        && !self.format.trailing_delimiter_emits_empty()
                    {
                        // Drop the field a trailing delimiter implied.
                    } else {
                        fields.push(content);
                    }
                    if fields.len() == 1 && fields[0].is_empty() && self.format.ignore_empty_lines()
                    {
                        fields.clear();
                        have_position = false;
                        continue;
                    }
                    return Ok(Some(RawRecord {
                        values: fields,
                        char_pos,
                        byte_pos,
                    }));
                }
                TokenKind::Comment => {
                    let text = mem::take(&mut tok.content);
                    match &mut self.pending_comment {
                        Some(buf) => {
                            buf.push('\n');
                            buf.push_str(&text);
                        }
                        None => self.pending_comment = Some(text),
                    }
                    have_position = false;
                }
                TokenKind::Eof => {
                    self.done = true;
                    if fields.is_empty() {
                        return Ok(None);
                    }
                    return Ok(Some(RawRecord {
                        values: fields,
                        char_pos,
                        byte_pos,
                    }));
                }
                TokenKind::Invalid => unreachable!("lexer always sets a concrete kind"),
            }
        }
    }

    /// Produces the next record, applying field trimming and null-sentinel
    /// resolution and attaching accumulated comments.
    pub fn next_record(&mut self) -> Result<Option<Record>> {
        let raw = match self.next_raw_record() {
            Ok(Some(r)) => r,
            Ok(None) => return Ok(None),
            Err(err) => {
                // Spec §7: a lex error leaves the parser in a terminated
                // state — every subsequent call yields `None`, regardless
                // of how much of the stream the error left unconsumed.
                self.done = true;
                return Err(err);
            }
        };
        self.record_number += 1;
        let mut values = raw.values;
        let mut null_mask = vec![false; values.len()];
        for (i, v) in values.iter_mut().enumerate() {
            if self.format.trim() {
                *v = v.trim().to_string();
            }
            if let Some(ns) = self.format.null_string() {
                if v == ns {
                    null_mask[i] = true;
                }
            }
        }
        let comment = self.pending_comment.take();
        Ok(Some(Record {
            values,
            null_mask,
            header: self.header.clone(),
            record_number: self.record_number,
            character_position: raw.char_pos,
            byte_position: raw.byte_pos,
            comment,
        }))
    }
}

impl Parser<Cursor<Vec<u8>>> {
    /// Parses an in-memory string (spec §6's `Parser.of(string, format)`).
    pub fn from_str(s: &str, format: Format) -> Result<Parser<Cursor<Vec<u8>>>> {
        Parser::new(Cursor::new(s.as_bytes().to_vec()), format)
    }
}

impl Parser<File> {
    /// Parses a file, assumed to be UTF-8 (spec §1 places encoding
    /// conversion out of scope; BOM stripping is likewise assumed done
    /// upstream).
    pub fn from_path<P: AsRef<Path>>(path: P, format: Format) -> Result<Parser<File>> {
        Parser::new(File::open(path)?, format)
    }
}

impl<R: io::Read> Iterator for Parser<R> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Result<Record>> {
        match self.next_record() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => None,
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::{DuplicateHeaderMode, QuotePolicy};

    fn rows(p: Parser<Cursor<Vec<u8>>>) -> Vec<Vec<String>> {
        p.map(|r| r.unwrap().values().to_vec()).collect()
    }

    #[test]
    fn scenario_one_basic_two_records() {
        let p = Parser::from_str("a,b,c\n1,2,3\n", Format::default_format()).unwrap();
        let records: Vec<_> = p.map(|r| r.unwrap()).collect();
        assert_eq!(records[0].values(), &["a", "b", "c"]);
        assert_eq!(records[0].record_number(), 1);
        assert_eq!(records[1].values(), &["1", "2", "3"]);
        assert_eq!(records[1].record_number(), 2);
    }

    #[test]
    fn header_consumed_from_first_record() {
        let format = Format::builder()
            .header::<String>(Some(Vec::new()))
            .build()
            .unwrap();
        let mut p = Parser::from_str("name,age\nalice,30\n", format).unwrap();
        assert_eq!(p.header(), Some(&["name".to_string(), "age".to_string()][..]));
        let rec = p.next_record().unwrap().unwrap();
        assert_eq!(rec.get_by_name("age").unwrap(), Some("30"));
        assert_eq!(rec.record_number(), 1);
    }

    #[test]
    fn explicit_header_with_skip_header_record() {
        let format = Format::builder()
            .header(Some(vec!["name", "age"]))
            .skip_header_record(true)
            .build()
            .unwrap();
        let mut p = Parser::from_str("name,age\nalice,30\n", format).unwrap();
        let rec = p.next_record().unwrap().unwrap();
        assert_eq!(rec.values(), &["alice", "30"]);
        assert_eq!(rec.record_number(), 1);
    }

    #[test]
    fn missing_column_name_is_an_error_by_default() {
        let format = Format::builder().header(Some(vec!["a", ""])).build().unwrap();
        let err = Parser::from_str("1,2\n", format).unwrap_err();
        assert!(matches!(err, Error::Header(HeaderError::MissingColumn)));
    }

    #[test]
    fn missing_column_name_allowed_when_configured() {
        let format = Format::builder()
            .header(Some(vec!["a", ""]))
            .allow_missing_column_names(true)
            .build()
            .unwrap();
        assert!(Parser::from_str("1,2\n", format).is_ok());
    }

    #[test]
    fn duplicate_header_disallow_errors() {
        let format = Format::builder()
            .header(Some(vec!["a", "a"]))
            .duplicate_header_mode(DuplicateHeaderMode::Disallow)
            .build()
            .unwrap();
        let err = Parser::from_str("1,2\n", format).unwrap_err();
        assert!(matches!(
            err,
            Error::Header(HeaderError::DuplicateColumn(ref n)) if n == "a"
        ));
    }

    #[test]
    fn duplicate_header_allow_all_keeps_first() {
        let format = Format::builder()
            .header(Some(vec!["a", "a"]))
            .duplicate_header_mode(DuplicateHeaderMode::AllowAll)
            .build()
            .unwrap();
        let mut p = Parser::from_str("1,2\n", format).unwrap();
        let rec = p.next_record().unwrap().unwrap();
        assert_eq!(rec.get_by_name("a").unwrap(), Some("1"));
    }

    #[test]
    fn comments_attach_to_the_following_record() {
        let format = Format::builder()
            .comment_marker(Some('#'))
            .ignore_empty_lines(true)
            .build()
            .unwrap();
        let mut p = Parser::from_str("# hello\n\na,b\n# mid\n1,2\n", format).unwrap();
        let r1 = p.next_record().unwrap().unwrap();
        assert_eq!(r1.values(), &["a", "b"]);
        assert_eq!(r1.comment(), Some("hello"));
        let r2 = p.next_record().unwrap().unwrap();
        assert_eq!(r2.values(), &["1", "2"]);
        assert_eq!(r2.comment(), Some("mid"));
    }

    #[test]
    fn trailing_delimiter_emits_empty_by_default() {
        let p = Parser::from_str("a,b,\n", Format::default_format()).unwrap();
        assert_eq!(rows(p), vec![vec!["a", "b", ""]]);
    }

    #[test]
    fn trailing_delimiter_can_be_suppressed() {
        let format = Format::builder()
            .trailing_delimiter_emits_empty(false)
            .build()
            .unwrap();
        let p = Parser::from_str("a,b,\n", format).unwrap();
        assert_eq!(rows(p), vec![vec!["a", "b"]]);
    }

    #[test]
    fn trailing_data_without_terminator_still_yields_a_record() {
        let p = Parser::from_str("a,b,c", Format::default_format()).unwrap();
        assert_eq!(rows(p), vec![vec!["a", "b", "c"]]);
    }

    #[test]
    fn null_string_resolves_to_none() {
        let format = Format::builder()
            .null_string(Some("NULL"))
            .build()
            .unwrap();
        let mut p = Parser::from_str("a,NULL,c\n", format).unwrap();
        let rec = p.next_record().unwrap().unwrap();
        assert_eq!(rec.get(1).unwrap(), None);
        assert_eq!(rec.values()[1], "NULL");
    }

    #[test]
    fn trim_applies_before_null_comparison() {
        let format = Format::builder()
            .trim(true)
            .null_string(Some("NULL"))
            .ignore_surrounding_spaces(false)
            .quote_policy(QuotePolicy::Minimal)
            .build()
            .unwrap();
        let mut p = Parser::from_str("a, NULL ,c\n", format).unwrap();
        let rec = p.next_record().unwrap().unwrap();
        assert_eq!(rec.get(1).unwrap(), None);
    }

    #[test]
    fn record_number_is_strictly_increasing() {
        let p = Parser::from_str("1\n2\n3\n", Format::default_format()).unwrap();
        let nums: Vec<u64> = p.map(|r| r.unwrap().record_number()).collect();
        assert_eq!(nums, vec![1, 2, 3]);
    }

    #[test]
    fn error_leaves_parser_terminated() {
        let mut p = Parser::from_str("\"unterminated", Format::default_format()).unwrap();
        assert!(p.next().unwrap().is_err());
        assert!(p.next().is_none());
    }

    #[test]
    fn byte_position_tracks_utf8_records() {
        // Four records, matching spec §8 scenario 8's shape (byte offsets
        // grow by each record's encoded length rather than 1 byte/char).
        let data = "い,ろ\nは,に\nほ,へ\nと,ち\n";
        let p = Parser::from_str(data, Format::default_format()).unwrap();
        let positions: Vec<i64> = p.map(|r| r.unwrap().byte_position()).collect();
        assert_eq!(positions[0], 0);
        for w in positions.windows(2) {
            assert!(w[1] > w[0]);
        }
    }
}
