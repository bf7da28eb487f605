//! A precedence-climbing parser producing the tagged AST.
//!
//! Parsing consumes a token stream produced by [`crate::lexer`] and builds
//! nodes into an [`Ast`] arena. The first static error aborts the parse; the
//! arena and, where it helps completion, a partial `rest` tree survive in
//! the result.
//!
//! # Example
//!
//! ```
//! use jsonnet_syntax::{lexer, parser::Parser};
//!
//! let tokens = lexer::lex("demo.jsonnet", "local x = 1; x").unwrap();
//! let parse = Parser::new(tokens).parse();
//! assert!(parse.error.is_none());
//! ```

use crate::ast::{Ast, NodeId};
use crate::lexer::{Token, TokenKind};
use crate::source::LocationRange;
use thiserror::Error;

mod context;
mod grammar;

use context::Context;

/// Calls, indexing and brace-application bind at this strength.
pub const APPLY_PRECEDENCE: u8 = 2;
/// Unary operators bind at this strength.
pub const UNARY_PRECEDENCE: u8 = 4;
/// The loosest precedence; top-level expressions parse at it.
pub const MAX_PRECEDENCE: u8 = 16;

pub struct Parser {
    context: Context,
}

impl Parser {
    /// Create a parser over a lexed token stream.
    ///
    /// The stream is expected to be complete, ending with an
    /// [`TokenKind::EndOfFile`] token.
    #[must_use]
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            context: Context::new(tokens),
        }
    }

    /// Parse one document: a single expression followed by end of input.
    #[must_use]
    pub fn parse(mut self) -> Parse {
        let result = self.context.parse_document();
        let ast = self.context.into_ast();
        match result {
            Ok(root) => Parse {
                ast,
                root: Some(root),
                error: None,
            },
            Err(error) => Parse {
                ast,
                root: None,
                error: Some(error),
            },
        }
    }
}

/// The result of parsing: the node arena plus either a root or the first
/// error.
///
/// The arena is kept even on error so that a partial tree referenced by
/// [`ParseError::rest`] stays meaningful.
#[derive(Debug, Clone)]
pub struct Parse {
    pub ast: Ast,
    pub root: Option<NodeId>,
    pub error: Option<ParseError>,
}

impl Parse {
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// A fatal parse error.
#[derive(Debug, Clone, Error)]
#[error("{loc}: {kind}")]
pub struct ParseError {
    pub loc: LocationRange,
    pub kind: ParseErrorKind,
    /// A partial tree covering the source up to the error, when one could
    /// be salvaged; lets completion work on documents that no longer parse.
    pub rest: Option<NodeId>,
}

impl ParseError {
    fn new(loc: LocationRange, kind: ParseErrorKind) -> Self {
        Self {
            loc,
            kind,
            rest: None,
        }
    }
}

/// All the static errors the parser can raise.
#[derive(Debug, Clone, Error)]
pub enum ParseErrorKind {
    #[error("Expected a comma before next {0}.")]
    ExpectedComma(&'static str),

    #[error("Expected token {expected} but got {got}")]
    ExpectedToken { expected: TokenKind, got: Token },

    #[error("Expected operator {expected} but got {got}")]
    ExpectedOperator { expected: String, got: Token },

    #[error("Expected one of :, ::, :::, +:, +::, +:::, got: {0}")]
    ExpectedFieldColon(Token),

    #[error("Duplicate local var: {0}")]
    DuplicateLocalVar(String),

    #[error("Duplicate field: {0}")]
    DuplicateField(String),

    #[error("Object comprehension cannot have asserts.")]
    ObjectCompAsserts,

    #[error("Object comprehension can only have one field.")]
    ObjectCompOneField,

    #[error("Object comprehensions cannot have hidden fields.")]
    ObjectCompHiddenField,

    #[error("Object comprehensions can only have [e] fields.")]
    ObjectCompFieldKind,

    #[error("Object comprehensions cannot have +:.")]
    ObjectCompSuperSugar,

    #[error("Expected for, if or {end} after for clause, got: {got}")]
    ExpectedCompClause { end: TokenKind, got: Token },

    #[error("Cannot use +: syntax sugar in a method: {0}")]
    PlusColonMethod(String),

    #[error("Computed imports are not allowed")]
    ComputedImport,

    #[error("Block string literals not allowed in imports")]
    BlockStringImport,

    #[error("Not a unary operator: {0}")]
    NotAUnaryOperator(String),

    #[error("Not a binary operator: {0}")]
    NotABinaryOperator(String),

    #[error("Expected . or [ after super.")]
    ExpectedSuperIndex,

    #[error("Expected simple identifier but got a complex expression.")]
    ExpectedSimpleIdentifier,

    #[error("Positional argument after a named argument is not allowed")]
    PositionalAfterNamed,

    #[error("Expected , or ; but got {0}")]
    ExpectedCommaOrSemicolon(Token),

    #[error("Could not parse number \"{0}\"")]
    BadNumber(String),

    #[error("Unexpected: {0} while parsing terminal")]
    UnexpectedTerminal(Token),

    #[error("Unexpected: {0}")]
    Unexpected(Token),

    #[error("Did not expect: {0}")]
    DidNotExpect(Token),
}
