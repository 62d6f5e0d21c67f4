use crate::error::FormatError;

/// How a field's value decides whether it gets quoted when printed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QuotePolicy {
    /// Quote only fields that contain the delimiter, the quote character,
    /// `\r`, `\n`, or (for the first field, when a comment marker is set)
    /// start with the comment marker.
    Minimal,
    /// Always quote every field.
    All,
    /// Quote every field except one that equals the null sentinel, which
    /// is written raw.
    AllNonNull,
    /// Quote every field that is not syntactically a number.
    NonNumeric,
    /// Never quote; special characters are escape-prefixed instead.
    None,
}

/// How duplicate non-empty header names are treated during header
/// resolution (spec §4.2).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DuplicateHeaderMode {
    /// Any duplicate non-empty name is an error.
    Disallow,
    /// Only empty names may repeat; a repeated non-empty name is an error.
    AllowEmpty,
    /// Any name may repeat; `get(name)` resolves to the first occurrence.
    AllowAll,
}

/// An immutable CSV format descriptor.
///
/// Build one with [`Format::builder`], or start from a preset
/// ([`Format::default_format`], [`Format::rfc4180`], [`Format::excel`],
/// [`Format::tdf`], [`Format::mysql`]) and adjust it via
/// [`FormatBuilder::from_format`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Format {
    pub(crate) delimiter: char,
    pub(crate) quote: Option<char>,
    pub(crate) escape: Option<char>,
    pub(crate) comment_marker: Option<char>,
    pub(crate) record_separator: Option<String>,
    pub(crate) ignore_surrounding_spaces: bool,
    pub(crate) ignore_empty_lines: bool,
    pub(crate) trailing_delimiter_emits_empty: bool,
    pub(crate) trim: bool,
    pub(crate) null_string: Option<String>,
    pub(crate) quote_policy: QuotePolicy,
    pub(crate) header: Option<Vec<String>>,
    pub(crate) skip_header_record: bool,
    pub(crate) allow_missing_column_names: bool,
    pub(crate) duplicate_header_mode: DuplicateHeaderMode,
    pub(crate) header_comments: Option<Vec<String>>,
}

impl Format {
    /// Starts building a new `Format` from scratch (delimiter `,`, no
    /// quote/escape/comment marker, CRLF separator, `QuotePolicy::Minimal`).
    ///
    /// Most callers want a preset instead; `builder()` exists for the rare
    /// case where none of the presets are close enough to be worth
    /// adjusting.
    pub fn builder() -> FormatBuilder {
        FormatBuilder::new(Format::raw())
    }

    fn raw() -> Format {
        Format {
            delimiter: ',',
            quote: Some('"'),
            escape: None,
            comment_marker: None,
            record_separator: Some("\r\n".to_string()),
            ignore_surrounding_spaces: false,
            ignore_empty_lines: true,
            trailing_delimiter_emits_empty: true,
            trim: false,
            null_string: None,
            quote_policy: QuotePolicy::Minimal,
            header: None,
            skip_header_record: false,
            allow_missing_column_names: false,
            duplicate_header_mode: DuplicateHeaderMode::Disallow,
            header_comments: None,
        }
    }

    /// `,` delimiter, `"` quote, CRLF separator, minimal quoting, empty
    /// lines ignored.
    pub fn default_format() -> Format {
        Format::raw()
    }

    /// [`Format::default_format`] with empty lines *not* ignored — strict
    /// RFC 4180.
    pub fn rfc4180() -> Format {
        let mut f = Format::raw();
        f.ignore_empty_lines = false;
        f
    }

    /// [`Format::default_format`] with empty lines not ignored and missing
    /// column names tolerated, matching Excel's CSV export quirks.
    pub fn excel() -> Format {
        let mut f = Format::raw();
        f.ignore_empty_lines = false;
        f.allow_missing_column_names = true;
        f
    }

    /// Tab-delimited, with surrounding spaces trimmed around each field.
    pub fn tdf() -> Format {
        let mut f = Format::raw();
        f.delimiter = '\t';
        f.ignore_surrounding_spaces = true;
        f
    }

    /// Tab-delimited, `\`-escaped, `\N` as the null sentinel, matching
    /// MySQL's `LOAD DATA`/`SELECT ... INTO OUTFILE` format. MySQL's
    /// format has no quote character at all (it relies entirely on
    /// `ESCAPED BY`), so quoting here falls back to escaping — see
    /// `Printer::wrap_or_escape`.
    pub fn mysql() -> Format {
        Format {
            delimiter: '\t',
            quote: None,
            escape: Some('\\'),
            comment_marker: None,
            record_separator: Some("\n".to_string()),
            ignore_surrounding_spaces: false,
            ignore_empty_lines: false,
            trailing_delimiter_emits_empty: true,
            trim: false,
            null_string: Some("\\N".to_string()),
            quote_policy: QuotePolicy::AllNonNull,
            header: None,
            skip_header_record: false,
            allow_missing_column_names: false,
            duplicate_header_mode: DuplicateHeaderMode::Disallow,
            header_comments: None,
        }
    }

    pub fn delimiter(&self) -> char {
        self.delimiter
    }

    pub fn quote(&self) -> Option<char> {
        self.quote
    }

    pub fn escape(&self) -> Option<char> {
        self.escape
    }

    pub fn comment_marker(&self) -> Option<char> {
        self.comment_marker
    }

    pub fn record_separator(&self) -> Option<&str> {
        self.record_separator.as_deref()
    }

    pub fn ignore_surrounding_spaces(&self) -> bool {
        self.ignore_surrounding_spaces
    }

    pub fn ignore_empty_lines(&self) -> bool {
        self.ignore_empty_lines
    }

    pub fn trailing_delimiter_emits_empty(&self) -> bool {
        self.trailing_delimiter_emits_empty
    }

    pub fn trim(&self) -> bool {
        self.trim
    }

    pub fn null_string(&self) -> Option<&str> {
        self.null_string.as_deref()
    }

    pub fn quote_policy(&self) -> QuotePolicy {
        self.quote_policy
    }

    pub fn header(&self) -> Option<&[String]> {
        self.header.as_deref()
    }

    pub fn skip_header_record(&self) -> bool {
        self.skip_header_record
    }

    pub fn allow_missing_column_names(&self) -> bool {
        self.allow_missing_column_names
    }

    pub fn duplicate_header_mode(&self) -> DuplicateHeaderMode {
        self.duplicate_header_mode
    }

    pub fn header_comments(&self) -> Option<&[String]> {
        self.header_comments.as_deref()
    }

    fn validate(&self) -> Result<(), FormatError> {
        let mut specials: Vec<(&'static str, char)> = vec![("delimiter", self.delimiter)];
        if let Some(q) = self.quote {
            specials.push(("quote", q));
        }
        if let Some(e) = self.escape {
            specials.push(("escape", e));
        }
        if let Some(c) = self.comment_marker {
            specials.push(("comment marker", c));
        }
        for &(name, c) in &specials {
            if c == '\r' || c == '\n' {
                return Err(FormatError::EolNotAllowed { which: name, char: c });
            }
        }
        for i in 0..specials.len() {
            for j in (i + 1)..specials.len() {
                if specials[i].1 == specials[j].1 {
                    return Err(FormatError::SpecialCharConflict {
                        a: specials[i].0,
                        b: specials[j].0,
                        char: specials[i].1,
                    });
                }
            }
        }
        match self.quote_policy {
            QuotePolicy::None => {
                if self.escape.is_none() {
                    return Err(FormatError::QuoteNoneRequiresEscape);
                }
            }
            QuotePolicy::Minimal => {
                if self.quote.is_none() {
                    return Err(FormatError::MinimalRequiresQuote);
                }
            }
            QuotePolicy::All | QuotePolicy::AllNonNull | QuotePolicy::NonNumeric => {
                if self.quote.is_none() && self.escape.is_none() {
                    return Err(FormatError::QuotingRequiresQuoteOrEscape);
                }
            }
        }
        Ok(())
    }
}

/// Builds a [`Format`].
///
/// Mirrors the teacher's `ReaderBuilder`: every setter takes `&mut self`
/// and returns `&mut Self` so calls chain, and `build()` is the only place
/// validation happens.
#[derive(Clone, Debug)]
pub struct FormatBuilder {
    fmt: Format,
}

impl FormatBuilder {
    fn new(fmt: Format) -> FormatBuilder {
        FormatBuilder { fmt }
    }

    /// Starts from an existing `Format`'s settings (used to verify that
    /// copying a `Format` through its builder round-trips to an equal
    /// value).
    pub fn from_format(format: &Format) -> FormatBuilder {
        FormatBuilder {
            fmt: format.clone(),
        }
    }

    pub fn delimiter(&mut self, delimiter: char) -> &mut FormatBuilder {
        self.fmt.delimiter = delimiter;
        self
    }

    pub fn quote(&mut self, quote: Option<char>) -> &mut FormatBuilder {
        self.fmt.quote = quote;
        self
    }

    pub fn escape(&mut self, escape: Option<char>) -> &mut FormatBuilder {
        self.fmt.escape = escape;
        self
    }

    pub fn comment_marker(&mut self, marker: Option<char>) -> &mut FormatBuilder {
        self.fmt.comment_marker = marker;
        self
    }

    pub fn record_separator<S: Into<String>>(&mut self, sep: Option<S>) -> &mut FormatBuilder {
        self.fmt.record_separator = sep.map(Into::into);
        self
    }

    pub fn ignore_surrounding_spaces(&mut self, yes: bool) -> &mut FormatBuilder {
        self.fmt.ignore_surrounding_spaces = yes;
        self
    }

    pub fn ignore_empty_lines(&mut self, yes: bool) -> &mut FormatBuilder {
        self.fmt.ignore_empty_lines = yes;
        self
    }

    pub fn trailing_delimiter_emits_empty(&mut self, yes: bool) -> &mut FormatBuilder {
        self.fmt.trailing_delimiter_emits_empty = yes;
        self
    }

    pub fn trim(&mut self, yes: bool) -> &mut FormatBuilder {
        self.fmt.trim = yes;
        self
    }

    pub fn null_string<S: Into<String>>(&mut self, null_string: Option<S>) -> &mut FormatBuilder {
        self.fmt.null_string = null_string.map(Into::into);
        self
    }

    pub fn quote_policy(&mut self, policy: QuotePolicy) -> &mut FormatBuilder {
        self.fmt.quote_policy = policy;
        self
    }

    /// `Some(&[])` means "read the header from the first record of the
    /// stream"; `Some(names)` sets it explicitly; `None` means no header.
    pub fn header<S: Into<String>>(&mut self, header: Option<Vec<S>>) -> &mut FormatBuilder {
        self.fmt.header = header.map(|h| h.into_iter().map(Into::into).collect());
        self
    }

    pub fn skip_header_record(&mut self, yes: bool) -> &mut FormatBuilder {
        self.fmt.skip_header_record = yes;
        self
    }

    pub fn allow_missing_column_names(&mut self, yes: bool) -> &mut FormatBuilder {
        self.fmt.allow_missing_column_names = yes;
        self
    }

    pub fn duplicate_header_mode(&mut self, mode: DuplicateHeaderMode) -> &mut FormatBuilder {
        self.fmt.duplicate_header_mode = mode;
        self
    }

    pub fn header_comments<S: Into<String>>(&mut self, comments: Option<Vec<S>>) -> &mut FormatBuilder {
        self.fmt.header_comments = comments.map(|c| c.into_iter().map(Into::into).collect());
        self
    }

    /// Validates the accumulated settings and produces an immutable
    /// `Format`.
    pub fn build(&self) -> Result<Format, FormatError> {
        self.fmt.validate()?;
        Ok(self.fmt.clone())
    }
}
