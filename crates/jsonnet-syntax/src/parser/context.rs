//! The parser context is a separate module to limit the API surface for the
//! grammar functions.

use crate::ast::{Ast, NodeId, NodeKind};
use crate::lexer::{Token, TokenKind};
use crate::source::{Location, LocationRange};

use super::{ParseError, ParseErrorKind};

/// Token-stream state shared by the grammar functions.
///
/// `//` comment tokens are invisible to [`Context::peek`] and
/// [`Context::pop`]; grammar positions that lift heading comments collect
/// them explicitly with [`Context::take_comments`] before peeking.
pub(crate) struct Context {
    tokens: Vec<Token>,
    pos: usize,
    file_name: String,
    last_end: Location,
    ast: Ast,
}

impl Context {
    pub(crate) fn new(mut tokens: Vec<Token>) -> Self {
        if tokens.is_empty() {
            tokens.push(Token::new(
                TokenKind::EndOfFile,
                "",
                LocationRange::new("", Location::new(1, 1), Location::new(1, 1)),
            ));
        }
        let file_name = tokens
            .first()
            .map(|t| t.loc.file_name.clone())
            .unwrap_or_default();
        Self {
            tokens,
            pos: 0,
            file_name,
            last_end: Location::new(1, 1),
            ast: Ast::new(),
        }
    }

    pub(crate) fn into_ast(self) -> Ast {
        self.ast
    }

    pub(crate) fn ast(&self) -> &Ast {
        &self.ast
    }

    pub(crate) fn add_node(&mut self, loc: LocationRange, kind: NodeKind) -> NodeId {
        self.ast.add(loc, kind)
    }

    /// The next significant token, leaving comments in place.
    pub(crate) fn peek(&self) -> &Token {
        self.peek_nth(0)
    }

    /// The significant token after [`Context::peek`].
    pub(crate) fn peek2(&self) -> &Token {
        self.peek_nth(1)
    }

    fn peek_nth(&self, n: usize) -> &Token {
        let mut remaining = n;
        let mut idx = self.pos;
        loop {
            match self.tokens.get(idx) {
                Some(t) if t.kind == TokenKind::CommentCpp => idx += 1,
                Some(t) => {
                    if remaining == 0 {
                        return t;
                    }
                    remaining -= 1;
                    idx += 1;
                }
                None => return self.tokens.last().expect("token stream is never empty"),
            }
        }
    }

    /// Consume and return the next significant token, discarding comments in
    /// front of it.
    pub(crate) fn pop(&mut self) -> Token {
        loop {
            match self.tokens.get(self.pos) {
                Some(t) if t.kind == TokenKind::CommentCpp => self.pos += 1,
                Some(t) => {
                    let token = t.clone();
                    if token.kind != TokenKind::EndOfFile {
                        self.pos += 1;
                    }
                    self.last_end = token.loc.end;
                    return token;
                }
                None => {
                    let token = self
                        .tokens
                        .last()
                        .expect("token stream is never empty")
                        .clone();
                    self.last_end = token.loc.end;
                    return token;
                }
            }
        }
    }

    /// Consume the run of `//` comment tokens in front of the next
    /// significant token.
    pub(crate) fn take_comments(&mut self) -> Vec<Token> {
        let mut out = Vec::new();
        while let Some(t) = self.tokens.get(self.pos) {
            if t.kind != TokenKind::CommentCpp {
                break;
            }
            out.push(t.clone());
            self.pos += 1;
        }
        out
    }

    /// Turn comment tokens into [`NodeKind::Comment`] nodes.
    pub(crate) fn comment_nodes(&mut self, comments: Vec<Token>) -> Vec<NodeId> {
        comments
            .into_iter()
            .map(|t| {
                let loc = t.loc.clone();
                self.ast.add(loc, NodeKind::Comment { text: t.data })
            })
            .collect()
    }

    pub(crate) fn pop_expect(&mut self, expected: TokenKind) -> Result<Token, ParseError> {
        let token = self.pop();
        if token.kind == expected {
            Ok(token)
        } else {
            Err(ParseError::new(
                token.loc.clone(),
                ParseErrorKind::ExpectedToken {
                    expected,
                    got: token,
                },
            ))
        }
    }

    pub(crate) fn pop_expect_operator(&mut self, op: &str) -> Result<Token, ParseError> {
        let token = self.pop();
        if token.kind == TokenKind::Operator && token.data == op {
            Ok(token)
        } else {
            Err(ParseError::new(
                token.loc.clone(),
                ParseErrorKind::ExpectedOperator {
                    expected: op.to_string(),
                    got: token,
                },
            ))
        }
    }

    /// Range from `begin` to the end of the last consumed token.
    pub(crate) fn span_from(&self, begin: Location) -> LocationRange {
        LocationRange::new(&self.file_name, begin, self.last_end)
    }

    /// Range from `begin` to the end of `end_node`.
    pub(crate) fn span_to_node(&self, begin: Location, end_node: NodeId) -> LocationRange {
        LocationRange::new(&self.file_name, begin, self.ast[end_node].loc.end)
    }

    pub(crate) fn error(&self, loc: LocationRange, kind: ParseErrorKind) -> ParseError {
        tracing::trace!(%loc, %kind, "syntax error");
        ParseError::new(loc, kind)
    }
}
