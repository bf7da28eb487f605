//! Token and fodder declarations.
//!
//! Fodder is the non-semantic material (whitespace and most comments)
//! collected in front of a token so that tooling can reproduce and document
//! the source. `//` comments are real tokens: the parser lifts them onto
//! object fields as heading comments.

use crate::source::LocationRange;
use serde::{Deserialize, Serialize};
use std::fmt;
use strum::Display;

/// All token kinds produced by the lexer.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display,
)]
pub enum TokenKind {
    #[strum(serialize = "\"{\"")]
    BraceL,
    #[strum(serialize = "\"}\"")]
    BraceR,
    #[strum(serialize = "\"[\"")]
    BracketL,
    #[strum(serialize = "\"]\"")]
    BracketR,
    #[strum(serialize = "\",\"")]
    Comma,
    #[strum(serialize = "\"$\"")]
    Dollar,
    #[strum(serialize = "\".\"")]
    Dot,
    #[strum(serialize = "\"(\"")]
    ParenL,
    #[strum(serialize = "\")\"")]
    ParenR,
    #[strum(serialize = "\";\"")]
    Semicolon,

    #[strum(serialize = "IDENTIFIER")]
    Identifier,
    #[strum(serialize = "NUMBER")]
    Number,
    #[strum(serialize = "OPERATOR")]
    Operator,

    #[strum(serialize = "STRING_DOUBLE")]
    StringDouble,
    #[strum(serialize = "STRING_SINGLE")]
    StringSingle,
    #[strum(serialize = "STRING_BLOCK")]
    StringBlock,

    #[strum(serialize = "COMMENT_CPP")]
    CommentCpp,

    #[strum(serialize = "assert")]
    Assert,
    #[strum(serialize = "else")]
    Else,
    #[strum(serialize = "error")]
    Error,
    #[strum(serialize = "false")]
    False,
    #[strum(serialize = "for")]
    For,
    #[strum(serialize = "function")]
    Function,
    #[strum(serialize = "if")]
    If,
    #[strum(serialize = "import")]
    Import,
    #[strum(serialize = "importstr")]
    ImportStr,
    #[strum(serialize = "in")]
    In,
    #[strum(serialize = "local")]
    Local,
    #[strum(serialize = "null")]
    Null,
    #[strum(serialize = "self")]
    SelfToken,
    #[strum(serialize = "super")]
    Super,
    #[strum(serialize = "tailstrict")]
    TailStrict,
    #[strum(serialize = "then")]
    Then,
    #[strum(serialize = "true")]
    True,

    #[strum(serialize = "end of file")]
    EndOfFile,
}

impl TokenKind {
    /// Look an identifier up in the keyword table.
    #[must_use]
    pub fn keyword(ident: &str) -> Option<TokenKind> {
        use TokenKind::*;
        Some(match ident {
            "assert" => Assert,
            "else" => Else,
            "error" => Error,
            "false" => False,
            "for" => For,
            "function" => Function,
            "if" => If,
            "import" => Import,
            "importstr" => ImportStr,
            "in" => In,
            "local" => Local,
            "null" => Null,
            "self" => SelfToken,
            "super" => Super,
            "tailstrict" => TailStrict,
            "then" => Then,
            "true" => True,
            _ => return None,
        })
    }
}

/// The flavor of a fodder comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FodderKind {
    /// A run of spaces, tabs, carriage returns and newlines.
    Whitespace,
    /// `/* ... */`
    CommentC,
    /// `# ...`
    CommentHash,
}

/// One element of the fodder preceding a token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FodderElement {
    pub kind: FodderKind,
    pub data: String,
}

pub type Fodder = Vec<FodderElement>;

/// A lexed token with its leading fodder and exact source range.
///
/// `data` holds the lexeme content and is empty for symbolic tokens. Block
/// strings additionally record their raw indent strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub kind: TokenKind,
    pub fodder: Fodder,
    pub data: String,
    pub string_block_indent: String,
    pub string_block_term_indent: String,
    pub loc: LocationRange,
}

impl Token {
    #[must_use]
    pub fn new(kind: TokenKind, data: impl Into<String>, loc: LocationRange) -> Self {
        Self {
            kind,
            fodder: Fodder::new(),
            data: data.into(),
            string_block_indent: String::new(),
            string_block_term_indent: String::new(),
            loc,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::Identifier
            | TokenKind::Number
            | TokenKind::Operator
            | TokenKind::StringDouble
            | TokenKind::StringSingle
            | TokenKind::StringBlock
            | TokenKind::CommentCpp => write!(f, "({}, \"{}\")", self.kind, self.data),
            _ => write!(f, "{}", self.kind),
        }
    }
}
