use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::error::{Error, FormatError, PrintError, Result};
use crate::format::{Format, QuotePolicy};

/// Writes records to a sink according to a [`Format`], the inverse of
/// [`crate::parser::Parser`].
///
/// Mirrors Apache Commons CSV's `CSVPrinter`: low-level `print`/`println`
/// primitives that `print_record`/`print_comment`/`print_headers` are
/// built from, so callers who need field-by-field control (streaming a
/// record whose fields aren't already collected into one `Vec`) aren't
/// forced through the higher-level API.
pub struct Printer<W> {
    sink: W,
    format: Format,
    header_printed: bool,
    fields_in_current_record: usize,
}

impl<W: io::Write> Printer<W> {
    /// Wraps `sink`. `format` must already be valid — [`FormatBuilder::build`]
    /// is the only place that's checked.
    pub fn new(sink: W, format: Format) -> Printer<W> {
        Printer {
            sink,
            format,
            header_printed: false,
            fields_in_current_record: 0,
        }
    }

    /// Writes one field, preceded by a delimiter if it isn't the first
    /// field of the current record.
    pub fn print(&mut self, value: &str) -> Result<()> {
        if self.fields_in_current_record > 0 {
            write!(self.sink, "{}", self.format.delimiter())?;
        }
        let is_first_field = self.fields_in_current_record == 0;
        let encoded = self.encode_field(value, is_first_field)?;
        self.sink.write_all(encoded.as_bytes())?;
        self.fields_in_current_record += 1;
        Ok(())
    }

    /// Ends the current record: writes the record separator (if the
    /// format has one) and resets the field counter.
    pub fn println(&mut self) -> Result<()> {
        if let Some(sep) = self.format.record_separator() {
            self.sink.write_all(sep.as_bytes())?;
        }
        self.fields_in_current_record = 0;
        Ok(())
    }

    /// Prints one full record: the header row first if one hasn't been
    /// printed yet and the format calls for it, then every field,
    /// terminated by `println`.
    pub fn print_record<I, S>(&mut self, values: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.print_headers()?;
        for value in values {
            self.print(value.as_ref())?;
        }
        self.println()
    }

    /// Prints the header row, preceded by any configured header comments,
    /// unless it has already been printed or the format has no header.
    pub fn print_headers(&mut self) -> Result<()> {
        if self.header_printed {
            return Ok(());
        }
        self.header_printed = true;
        let header = match self.format.header() {
            Some(h) if !h.is_empty() => h.to_vec(),
            _ => return Ok(()),
        };
        if let Some(comments) = self.format.header_comments() {
            for line in comments {
                self.print_comment(line)?;
            }
        }
        for name in &header {
            self.print(name)?;
        }
        self.println()
    }

    /// Prints `text` as one or more comment lines, each prefixed by the
    /// comment marker and a space. Requires `format.comment_marker()` to
    /// be set.
    pub fn print_comment(&mut self, text: &str) -> Result<()> {
        let marker = self
            .format
            .comment_marker()
            .ok_or(Error::Print(PrintError::NoCommentMarker))?;
        for line in text.split('\n') {
            write!(self.sink, "{} {}", marker, line)?;
            self.println()?;
        }
        Ok(())
    }

    /// Flushes the underlying sink.
    pub fn flush(&mut self) -> Result<()> {
        self.sink.flush()?;
        Ok(())
    }

    /// Consumes the printer, returning the underlying sink.
    pub fn into_inner(self) -> W {
        self.sink
    }

    fn encode_field(&self, value: &str, is_first_field: bool) -> Result<String> {
        match self.format.quote_policy() {
            QuotePolicy::Minimal => {
                if self.needs_quoting_minimal(value, is_first_field) {
                    self.wrap_quoted(value, false)
                } else {
                    Ok(value.to_string())
                }
            }
            QuotePolicy::All => self.wrap_or_escape(value),
            QuotePolicy::AllNonNull => {
                if self.format.null_string() == Some(value) {
                    Ok(value.to_string())
                } else {
                    self.wrap_or_escape(value)
                }
            }
            QuotePolicy::NonNumeric => {
                if is_numeric(value) {
                    Ok(value.to_string())
                } else {
                    self.wrap_or_escape(value)
                }
            }
            QuotePolicy::None => self.escape_value(value),
        }
    }

    fn needs_quoting_minimal(&self, value: &str, is_first_field: bool) -> bool {
        let delim = self.format.delimiter();
        if value.chars().any(|c| c == delim || c == '\r' || c == '\n') {
            return true;
        }
        if let Some(quote) = self.format.quote() {
            if value.contains(quote) {
                return true;
            }
        }
        if is_first_field {
            if let Some(marker) = self.format.comment_marker() {
                if value.starts_with(marker) {
                    return true;
                }
            }
        }
        false
    }

    /// Quotes or escapes `value`, whichever the format supports (falls
    /// back to escaping when there is no quote character, as the MYSQL
    /// preset requires).
    fn wrap_or_escape(&self, value: &str) -> Result<String> {
        if self.format.quote().is_some() {
            self.wrap_quoted(value, true)
        } else if self.format.escape().is_some() {
            self.escape_value(value)
        } else {
            Err(Error::Format(FormatError::QuotingRequiresQuoteOrEscape))
        }
    }

    /// Surrounds `value` in the quote character, doubling interior quote
    /// occurrences (or, if `use_escape_if_available` and an escape
    /// character is set, escape-prefixing them instead of doubling).
    fn wrap_quoted(&self, value: &str, use_escape_if_available: bool) -> Result<String> {
        let quote = self
            .format
            .quote()
            .expect("wrap_quoted called without a quote character");
        let escape = if use_escape_if_available {
            self.format.escape()
        } else {
            None
        };
        let mut out = String::with_capacity(value.len() + 2);
        out.push(quote);
        for c in value.chars() {
            if c == quote {
                match escape {
                    Some(e) => out.push(e),
                    None => out.push(quote),
                }
            }
            out.push(c);
        }
        out.push(quote);
        Ok(out)
    }

    /// Escape-prefixes delimiter, quote, escape and EOL characters;
    /// written with no surrounding quote at all (`QuotePolicy::None`, and
    /// the fallback path when no quote character is configured).
    fn escape_value(&self, value: &str) -> Result<String> {
        let escape = self
            .format
            .escape()
            .ok_or(Error::Format(FormatError::QuoteNoneRequiresEscape))?;
        let delim = self.format.delimiter();
        let quote = self.format.quote();
        let mut out = String::with_capacity(value.len());
        for c in value.chars() {
            let special = c == delim
                || c == escape
                || c == '\r'
                || c == '\n'
                || quote == Some(c);
            if special {
                out.push(escape);
            }
            out.push(c);
        }
        Ok(out)
    }
}

impl Printer<Vec<u8>> {
    /// Prints into an in-memory buffer and returns it as a `String` once
    /// the caller is done (spec §6's `Printer.of(format)` convenience
    /// form, specialized to buffer output rather than a stream).
    pub fn into_string(self) -> Result<String> {
        String::from_utf8(self.sink).map_err(|e| Error::Utf8 {
            valid_up_to: e.utf8_error().valid_up_to(),
        })
    }
}

impl Printer<File> {
    pub fn to_path<P: AsRef<Path>>(path: P, format: Format) -> Result<Printer<File>> {
        Ok(Printer::new(File::create(path)?, format))
    }
}

/// Whether `s` parses as a plain decimal number (optional sign, digits,
/// optional fractional part, optional exponent) — `QuotePolicy::NonNumeric`'s
/// definition of "numeric" (spec §4.5).
fn is_numeric(s: &str) -> bool {
    let mut chars = s.chars().peekable();
    if chars.peek().is_none() {
        return false;
    }
    if matches!(chars.peek(), Some('+') | Some('-')) {
        chars.next();
    }
    let mut saw_digit = false;
    while matches!(chars.peek(), Some(c) if c.is_ascii_digit()) {
        chars.next();
        saw_digit = true;
    }
    if chars.peek() == Some(&'.') {
        chars.next();
        while matches!(chars.peek(), Some(c) if c.is_ascii_digit()) {
            chars.next();
            saw_digit = true;
        }
    }
    if !saw_digit {
        return false;
    }
    if matches!(chars.peek(), Some('e') | Some('E')) {
        chars.next();
        if matches!(chars.peek(), Some('+') | Some('-')) {
            chars.next();
        }
        let mut saw_exp_digit = false;
        while matches!(chars.peek(), Some(c) if c.is_ascii_digit()) {
            chars.next();
            saw_exp_digit = true;
        }
        if !saw_exp_digit {
            return false;
        }
    }
    chars.next().is_none()
}
