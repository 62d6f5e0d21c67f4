/// What kind of token the lexer just produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenKind {
    /// A token that has not yet been filled in by the lexer.
    Invalid,
    /// A field, terminated by a delimiter.
    Token,
    /// A field, terminated by a record separator (or immediately by EOF
    /// with trailing content).
    EoRecord,
    /// A whole comment line, with the comment marker stripped.
    Comment,
    /// The stream is exhausted.
    Eof,
}

impl Default for TokenKind {
    fn default() -> TokenKind {
        TokenKind::Invalid
    }
}

/// A reusable, mutable token.
///
/// `Lexer::next_token` fills in an existing `Token` rather than allocating
/// a new one per call — the caller owns the allocation and is responsible
/// for calling `reset` before each call, mirroring the hot-path
/// allocation-avoidance convention the teacher uses for `StringRecord`.
#[derive(Clone, Debug, Default)]
pub struct Token {
    pub kind: TokenKind,
    pub content: String,
}

impl Token {
    /// A fresh, empty token in the `Invalid` state.
    pub fn new() -> Token {
        Token::default()
    }

    /// Clears `content` and resets `kind` to `Invalid`, ready for reuse.
    pub fn reset(&mut self) {
        self.kind = TokenKind::Invalid;
        self.content.clear();
    }
}
