use std::error;
use std::fmt;
use std::io;
use std::result;

/// A type alias for `Result<T, Error>`.
pub type Result<T> = result::Result<T, Error>;

/// The error type for all fallible operations in this crate.
///
/// This is a single enum rather than one error type per component because
/// callers generally want to match on "what went wrong with this record",
/// not on which internal component detected it.
#[derive(Debug)]
pub enum Error {
    /// An I/O error reading from or writing to the underlying stream.
    Io(io::Error),
    /// The underlying byte stream was not valid UTF-8.
    Utf8 { valid_up_to: usize },
    /// The `Format` configuration itself was invalid.
    Format(FormatError),
    /// The lexer hit a malformed token.
    Lex(LexError),
    /// Header resolution failed.
    Header(HeaderError),
    /// Looking up a field by index or name failed.
    Field(FieldError),
    /// A `Printer` operation could not be expressed under the configured
    /// format.
    Print(PrintError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::Io(ref err) => err.fmt(f),
            Error::Utf8 { valid_up_to } => {
                write!(f, "invalid UTF-8 in input (valid up to byte {})", valid_up_to)
            }
            Error::Format(ref err) => err.fmt(f),
            Error::Lex(ref err) => err.fmt(f),
            Error::Header(ref err) => err.fmt(f),
            Error::Field(ref err) => err.fmt(f),
            Error::Print(ref err) => err.fmt(f),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match *self {
            Error::Io(ref err) => Some(err),
            Error::Format(ref err) => Some(err),
            Error::Lex(ref err) => Some(err),
            Error::Header(ref err) => Some(err),
            Error::Field(ref err) => Some(err),
            Error::Print(ref err) => Some(err),
            Error::Utf8 { .. } => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Error {
        Error::Io(err)
    }
}

impl From<FormatError> for Error {
    fn from(err: FormatError) -> Error {
        Error::Format(err)
    }
}

impl From<LexError> for Error {
    fn from(err: LexError) -> Error {
        Error::Lex(err)
    }
}

impl From<HeaderError> for Error {
    fn from(err: HeaderError) -> Error {
        Error::Header(err)
    }
}

impl From<FieldError> for Error {
    fn from(err: FieldError) -> Error {
        Error::Field(err)
    }
}

impl From<PrintError> for Error {
    fn from(err: PrintError) -> Error {
        Error::Print(err)
    }
}

/// Why a `Format` failed to build.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FormatError {
    /// A configured special character (delimiter, quote, escape or comment
    /// marker) was `\r` or `\n`.
    EolNotAllowed { which: &'static str, char: char },
    /// Two special characters were configured to the same character.
    SpecialCharConflict {
        a: &'static str,
        b: &'static str,
        char: char,
    },
    /// `QuotePolicy::None` was set without an `escape` character.
    QuoteNoneRequiresEscape,
    /// `QuotePolicy::Minimal` was set without a `quote` character.
    MinimalRequiresQuote,
    /// A quoting policy other than `Minimal`/`None` was set without either
    /// a `quote` or an `escape` character to express it with.
    QuotingRequiresQuoteOrEscape,
}

impl fmt::Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            FormatError::EolNotAllowed { which, char } => write!(
                f,
                "{} cannot be a carriage return or line feed (got {:?})",
                which, char
            ),
            FormatError::SpecialCharConflict { a, b, char } => write!(
                f,
                "{} and {} must not be the same character (both are {:?})",
                a, b, char
            ),
            FormatError::QuoteNoneRequiresEscape => {
                write!(f, "quote policy NONE requires an escape character")
            }
            FormatError::MinimalRequiresQuote => {
                write!(f, "quote policy MINIMAL requires a quote character")
            }
            FormatError::QuotingRequiresQuoteOrEscape => {
                write!(f, "this quote policy requires a quote or an escape character")
            }
        }
    }
}

impl error::Error for FormatError {}

/// Stands in for `char` on a `LexError` raised by reaching end-of-stream
/// rather than by reading an actual offending character.
pub const EOF_CHAR: char = '\u{FFFD}';

/// Why the lexer rejected the input.
///
/// Every variant carries the offending `char` and the character position it
/// was read at (spec §6's boundary error contract: "kind, offending char
/// (where applicable), line number, character position"). For the two
/// end-of-stream variants there is no literal offending character — `char`
/// is [`EOF_CHAR`] and `char_position` is where end-of-stream was reached.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LexError {
    /// End of stream reached while inside a quoted field.
    UnterminatedQuote {
        line: u64,
        char: char,
        char_position: u64,
    },
    /// A character other than a delimiter, record separator, whitespace or
    /// EOF followed a closing quote.
    BadCharAfterQuote {
        line: u64,
        char: char,
        char_position: u64,
    },
    /// End of stream reached immediately after an escape character.
    UnterminatedEscape {
        line: u64,
        char: char,
        char_position: u64,
    },
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            LexError::UnterminatedQuote {
                line,
                char_position,
                ..
            } => write!(
                f,
                "unterminated quoted field starting on line {} (end of input at character {})",
                line, char_position
            ),
            LexError::BadCharAfterQuote {
                line,
                char,
                char_position,
            } => write!(
                f,
                "invalid character {:?} after closing quote on line {} (character position {})",
                char, line, char_position
            ),
            LexError::UnterminatedEscape {
                line,
                char_position,
                ..
            } => write!(
                f,
                "unterminated escape sequence on line {} (end of input at character {})",
                line, char_position
            ),
        }
    }
}

impl error::Error for LexError {}

/// Why header resolution failed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HeaderError {
    /// A header entry was empty or missing and
    /// `allow_missing_column_names` was `false`.
    MissingColumn,
    /// A non-empty header name appeared more than once and
    /// `duplicate_header_mode` forbade it.
    DuplicateColumn(String),
}

impl fmt::Display for HeaderError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            HeaderError::MissingColumn => write!(f, "header contains a missing column name"),
            HeaderError::DuplicateColumn(ref name) => {
                write!(f, "duplicate header column name: {:?}", name)
            }
        }
    }
}

impl error::Error for HeaderError {}

/// Why a field lookup failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldError {
    /// The header has no column with the given name.
    UnknownName,
    /// The header (or index) names a column beyond this record's length.
    MissingIndex,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            FieldError::UnknownName => write!(f, "no column with that name"),
            FieldError::MissingIndex => write!(f, "record has no field at that index"),
        }
    }
}

impl error::Error for FieldError {}

/// Why a `Printer` call could not be satisfied.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PrintError {
    /// `print_comment` was called but `Format::comment_marker` is unset.
    NoCommentMarker,
}

impl fmt::Display for PrintError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            PrintError::NoCommentMarker => {
                write!(f, "cannot print a comment without a comment marker configured")
            }
        }
    }
}

impl error::Error for PrintError {}
