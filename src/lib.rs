//! A configurable CSV reader and writer.
//!
//! The core types are [`Format`] (how fields are delimited, quoted and
//! escaped), [`Parser`] (bytes → [`Record`]s) and [`Printer`] (the
//! inverse). Both are built around a small finite-state [`Lexer`] that
//! tokenizes one field or one comment line at a time, and a
//! single-character-lookahead [`CharSource`] that does the only UTF-8
//! decoding in the crate.
//!
//! ```
//! use csvfmt::{Format, Parser};
//!
//! let mut parser = Parser::from_str("name,age\nalice,30\n", Format::builder()
//!     .header::<String>(Some(Vec::new()))
//!     .build()
//!     .unwrap()).unwrap();
//! let record = parser.next_record().unwrap().unwrap();
//! assert_eq!(record.get_by_name("age").unwrap(), Some("30"));
//! ```

mod char_source;
mod error;
mod format;
mod lexer;
mod parser;
mod printer;
mod record;
mod token;

pub use char_source::{CharSource, DEFAULT_BUFFER_CAPACITY, END_OF_STREAM, UNDEFINED};
pub use error::{Error, FieldError, FormatError, HeaderError, LexError, PrintError, Result};
pub use format::{DuplicateHeaderMode, Format, FormatBuilder, QuotePolicy};
pub use lexer::Lexer;
pub use parser::Parser;
pub use printer::Printer;
pub use record::{Headers, Record};
pub use token::{Token, TokenKind};
