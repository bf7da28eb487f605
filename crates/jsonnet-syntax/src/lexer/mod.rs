//! A stateful scanner producing a [`Token`] stream with exact source
//! locations.
//!
//! The scanner advances one Unicode code point at a time so that column
//! numbers stay correct for multi-byte characters. Whitespace and `#` / `/*`
//! comments are accumulated as fodder on the next token; `//` comments are
//! emitted as tokens of their own.
//!
//! Lexing can be limited to a caller-supplied position: tokens that begin
//! strictly after the limit are discarded and scanning stops, which yields
//! the prefix of the full token stream up to (and including) the token under
//! the cursor.

mod tokens;

pub use tokens::{Fodder, FodderElement, FodderKind, Token, TokenKind};

use crate::source::{Location, LocationRange};
use std::str::Chars;
use thiserror::Error;

/// A fatal lexing error. The first error aborts the scan.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{loc}: {kind}")]
pub struct LexError {
    pub loc: LocationRange,
    pub kind: LexErrorKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexErrorKind {
    #[error("Could not lex the character {0:?}")]
    UnexpectedCharacter(char),

    #[error("Couldn't lex number, junk after decimal point: {0:?}")]
    JunkAfterDecimalPoint(char),

    #[error("Couldn't lex number, junk after 'E': {0:?}")]
    JunkAfterExponent(char),

    #[error("Couldn't lex number, junk after exponent sign: {0:?}")]
    JunkAfterExponentSign(char),

    #[error("Unterminated string")]
    UnterminatedString,

    #[error("Multi-line comment has no terminating */")]
    UnterminatedComment,

    #[error("Text block requires new line after |||")]
    MissingTextBlockNewLine,

    #[error("Text block's first line must start with whitespace")]
    MissingTextBlockIndent,

    #[error("Text block not terminated with |||")]
    UnterminatedTextBlock,

    #[error("Unexpected EOF")]
    UnexpectedEof,
}

/// Lex a whole document.
pub fn lex(file_name: &str, input: &str) -> Result<Vec<Token>, LexError> {
    let (tokens, error) = lex_partial(file_name, input, Location::UNBOUNDED);
    match error {
        None => Ok(tokens),
        Some(err) => Err(err),
    }
}

/// Lex up to `range_max`; [`Location::UNBOUNDED`] disables the limit.
pub fn lex_range(
    file_name: &str,
    input: &str,
    range_max: Location,
) -> Result<Vec<Token>, LexError> {
    let (tokens, error) = lex_partial(file_name, input, range_max);
    match error {
        None => Ok(tokens),
        Some(err) => Err(err),
    }
}

/// Lex, keeping the partial token stream on error.
pub fn lex_partial(
    file_name: &str,
    input: &str,
    range_max: Location,
) -> (Vec<Token>, Option<LexError>) {
    Lexer::new(file_name, input).with_range_max(range_max).run()
}

struct Lexer<'s> {
    file_name: &'s str,
    chars: Chars<'s>,
    line: i32,
    column: i32,
    range_max: Location,
    fodder: Fodder,
    tokens: Vec<Token>,
}

impl<'s> Lexer<'s> {
    fn new(file_name: &'s str, input: &'s str) -> Self {
        Self {
            file_name,
            chars: input.chars(),
            line: 1,
            column: 1,
            range_max: Location::UNBOUNDED,
            fodder: Fodder::new(),
            tokens: Vec::new(),
        }
    }

    fn with_range_max(mut self, range_max: Location) -> Self {
        self.range_max = range_max;
        self
    }

    fn run(mut self) -> (Vec<Token>, Option<LexError>) {
        loop {
            if let Err(err) = self.collect_fodder() {
                return (self.tokens, Some(err));
            }

            let begin = self.here();
            let token = match self.peek() {
                None => {
                    let mut token =
                        Token::new(TokenKind::EndOfFile, "", self.range_from(begin));
                    token.fodder = std::mem::take(&mut self.fodder);
                    self.tokens.push(token);
                    self.enforce_range_max();
                    break;
                }
                Some(c) => match c {
                    '{' => self.symbol_token(TokenKind::BraceL),
                    '}' => self.symbol_token(TokenKind::BraceR),
                    '[' => self.symbol_token(TokenKind::BracketL),
                    ']' => self.symbol_token(TokenKind::BracketR),
                    ',' => self.symbol_token(TokenKind::Comma),
                    '.' => self.symbol_token(TokenKind::Dot),
                    '(' => self.symbol_token(TokenKind::ParenL),
                    ')' => self.symbol_token(TokenKind::ParenR),
                    ';' => self.symbol_token(TokenKind::Semicolon),
                    '0'..='9' => self.number(),
                    '"' | '\'' => self.string(),
                    '|' if self.peek_is("|||") => self.text_block(),
                    '/' if self.peek_is("//") => Ok(self.cpp_comment()),
                    c if is_identifier_start(c) => Ok(self.identifier()),
                    c if is_symbol(c) => Ok(self.operator()),
                    c => Err(self.error_here(LexErrorKind::UnexpectedCharacter(c))),
                },
            };

            match token {
                Ok(mut token) => {
                    token.fodder = std::mem::take(&mut self.fodder);
                    self.tokens.push(token);
                }
                Err(err) => return (self.tokens, Some(err)),
            }

            if self.enforce_range_max() {
                break;
            }
        }

        (self.tokens, None)
    }

    /// Discard tokens beginning strictly after the range limit. Returns
    /// whether anything was discarded, in which case scanning stops: every
    /// later token would begin later still.
    fn enforce_range_max(&mut self) -> bool {
        if self.range_max.is_unbounded() {
            return false;
        }
        let mut truncated = false;
        while self
            .tokens
            .last()
            .map_or(false, |t| self.range_max < t.loc.begin)
        {
            self.tokens.pop();
            truncated = true;
        }
        truncated
    }

    fn here(&self) -> Location {
        Location::new(self.line, self.column)
    }

    fn range_from(&self, begin: Location) -> LocationRange {
        LocationRange::new(self.file_name, begin, self.here())
    }

    fn error_at(&self, begin: Location, kind: LexErrorKind) -> LexError {
        LexError {
            loc: LocationRange::new(self.file_name, begin, self.here()),
            kind,
        }
    }

    fn error_here(&self, kind: LexErrorKind) -> LexError {
        let begin = self.here();
        self.error_at(begin, kind)
    }

    fn peek(&self) -> Option<char> {
        self.chars.clone().next()
    }

    fn peek_is(&self, expected: &str) -> bool {
        self.chars.as_str().starts_with(expected)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    /// Accumulate whitespace and `#` / `/* */` comments as fodder.
    fn collect_fodder(&mut self) -> Result<(), LexError> {
        loop {
            match self.peek() {
                Some(' ' | '\t' | '\r' | '\n') => {
                    let mut data = String::new();
                    while let Some(c @ (' ' | '\t' | '\r' | '\n')) = self.peek() {
                        self.bump();
                        data.push(c);
                    }
                    self.fodder.push(FodderElement {
                        kind: FodderKind::Whitespace,
                        data,
                    });
                }
                Some('#') => {
                    let mut data = String::new();
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.bump();
                        data.push(c);
                    }
                    self.fodder.push(FodderElement {
                        kind: FodderKind::CommentHash,
                        data,
                    });
                }
                Some('/') if self.peek_is("/*") => {
                    let begin = self.here();
                    let mut data = String::new();
                    self.bump();
                    self.bump();
                    data.push_str("/*");
                    loop {
                        if self.peek_is("*/") {
                            self.bump();
                            self.bump();
                            data.push_str("*/");
                            break;
                        }
                        match self.bump() {
                            Some(c) => data.push(c),
                            None => {
                                return Err(
                                    self.error_at(begin, LexErrorKind::UnterminatedComment)
                                )
                            }
                        }
                    }
                    self.fodder.push(FodderElement {
                        kind: FodderKind::CommentC,
                        data,
                    });
                }
                _ => break,
            }
        }
        Ok(())
    }

    fn symbol_token(&mut self, kind: TokenKind) -> Result<Token, LexError> {
        let begin = self.here();
        self.bump();
        Ok(Token::new(kind, "", self.range_from(begin)))
    }

    fn cpp_comment(&mut self) -> Token {
        let begin = self.here();
        let mut data = String::new();
        while let Some(c) = self.peek() {
            if c == '\n' {
                break;
            }
            self.bump();
            data.push(c);
        }
        Token::new(TokenKind::CommentCpp, data, self.range_from(begin))
    }

    fn identifier(&mut self) -> Token {
        let begin = self.here();
        let mut data = String::new();
        while let Some(c) = self.peek() {
            if !is_identifier_char(c) {
                break;
            }
            self.bump();
            data.push(c);
        }
        let kind = TokenKind::keyword(&data).unwrap_or(TokenKind::Identifier);
        Token::new(kind, data, self.range_from(begin))
    }

    fn number(&mut self) -> Result<Token, LexError> {
        let begin = self.here();
        let mut data = String::new();

        match self.peek() {
            Some('0') => {
                self.bump();
                data.push('0');
                // A second digit starts a fresh number token: 0100 is 0, 100.
                if matches!(self.peek(), Some('0'..='9')) {
                    return Ok(Token::new(TokenKind::Number, data, self.range_from(begin)));
                }
            }
            _ => {
                while let Some(c @ '0'..='9') = self.peek() {
                    self.bump();
                    data.push(c);
                }
            }
        }

        if self.peek() == Some('.') {
            self.bump();
            data.push('.');
            match self.peek() {
                Some(c @ '0'..='9') => {
                    self.bump();
                    data.push(c);
                }
                Some(c) => return Err(self.error_at(begin, LexErrorKind::JunkAfterDecimalPoint(c))),
                None => return Err(self.error_at(begin, LexErrorKind::UnexpectedEof)),
            }
            while let Some(c @ '0'..='9') = self.peek() {
                self.bump();
                data.push(c);
            }
        }

        if let Some(e @ ('e' | 'E')) = self.peek() {
            self.bump();
            data.push(e);
            if let Some(sign @ ('+' | '-')) = self.peek() {
                self.bump();
                data.push(sign);
                match self.peek() {
                    Some('0'..='9') => {}
                    Some(c) => {
                        return Err(self.error_at(begin, LexErrorKind::JunkAfterExponentSign(c)))
                    }
                    None => return Err(self.error_at(begin, LexErrorKind::UnexpectedEof)),
                }
            }
            match self.peek() {
                Some(c @ '0'..='9') => {
                    self.bump();
                    data.push(c);
                }
                Some(c) => return Err(self.error_at(begin, LexErrorKind::JunkAfterExponent(c))),
                None => return Err(self.error_at(begin, LexErrorKind::UnexpectedEof)),
            }
            while let Some(c @ '0'..='9') = self.peek() {
                self.bump();
                data.push(c);
            }
        }

        Ok(Token::new(TokenKind::Number, data, self.range_from(begin)))
    }

    fn string(&mut self) -> Result<Token, LexError> {
        let begin = self.here();
        let quote = self.bump().unwrap_or('"');
        let kind = if quote == '"' {
            TokenKind::StringDouble
        } else {
            TokenKind::StringSingle
        };
        let mut data = String::new();
        loop {
            match self.bump() {
                None => {
                    return Err(LexError {
                        loc: LocationRange::new(
                            self.file_name,
                            begin,
                            Location::new(begin.line, begin.column + 1),
                        ),
                        kind: LexErrorKind::UnterminatedString,
                    })
                }
                Some('\\') => {
                    // The escape is preserved verbatim, interpretation is the
                    // evaluator's business; the character after the backslash
                    // never terminates the string.
                    data.push('\\');
                    match self.bump() {
                        Some(c) => data.push(c),
                        None => {
                            return Err(LexError {
                                loc: LocationRange::new(
                                    self.file_name,
                                    begin,
                                    Location::new(begin.line, begin.column + 1),
                                ),
                                kind: LexErrorKind::UnterminatedString,
                            })
                        }
                    }
                }
                Some(c) if c == quote => break,
                Some(c) => data.push(c),
            }
        }
        Ok(Token::new(kind, data, self.range_from(begin)))
    }

    fn text_block(&mut self) -> Result<Token, LexError> {
        let begin = self.here();
        self.bump();
        self.bump();
        self.bump();

        // Only trailing whitespace may share the ||| line.
        while let Some(' ' | '\t' | '\r') = self.peek() {
            self.bump();
        }
        match self.bump() {
            Some('\n') => {}
            Some(_) | None => {
                return Err(self.error_at(begin, LexErrorKind::MissingTextBlockNewLine))
            }
        }

        let mut data = String::new();

        // Leading blank lines are content, the indent comes from the first
        // line with anything on it.
        while self.peek() == Some('\n') {
            self.bump();
            data.push('\n');
        }

        let mut indent = String::new();
        while let Some(c @ (' ' | '\t')) = self.peek() {
            self.bump();
            indent.push(c);
        }
        if indent.is_empty() {
            return Err(self.error_at(begin, LexErrorKind::MissingTextBlockIndent));
        }

        loop {
            // Cursor sits right after a line's indent: consume the line.
            loop {
                match self.bump() {
                    None => return Err(self.error_at(begin, LexErrorKind::UnexpectedEof)),
                    Some('\n') => {
                        data.push('\n');
                        break;
                    }
                    Some(c) => data.push(c),
                }
            }

            while self.peek() == Some('\n') {
                self.bump();
                data.push('\n');
            }

            let mut prefix = String::new();
            while let Some(c @ (' ' | '\t')) = self.peek() {
                if prefix.len() == indent.len() {
                    break;
                }
                self.bump();
                prefix.push(c);
            }

            if prefix == indent {
                continue;
            }

            // A strictly shorter whitespace prefix must introduce the
            // terminator.
            if self.peek_is("|||") {
                self.bump();
                self.bump();
                self.bump();
                let mut token = Token::new(TokenKind::StringBlock, data, self.range_from(begin));
                token.string_block_indent = indent;
                token.string_block_term_indent = prefix;
                return Ok(token);
            }
            return Err(self.error_at(begin, LexErrorKind::UnterminatedTextBlock));
        }
    }

    fn operator(&mut self) -> Token {
        let begin = self.here();

        // Measure the run first so trailing + - ~ ! can be wound back
        // without ever consuming them.
        let mut run: Vec<char> = Vec::new();
        {
            let mut probe = self.chars.clone();
            loop {
                let mut ahead = probe.clone();
                let Some(c) = ahead.next() else { break };
                if !is_symbol(c) {
                    break;
                }
                // Comment and text block openers end an operator run.
                if c == '/' && matches!(ahead.clone().next(), Some('/' | '*')) {
                    break;
                }
                if c == '|' {
                    let mut rest = ahead.clone();
                    if rest.next() == Some('|') && rest.next() == Some('|') {
                        break;
                    }
                }
                run.push(c);
                probe = ahead;
            }
        }
        while run.len() > 1 && matches!(run.last(), Some('+' | '-' | '~' | '!')) {
            run.pop();
        }

        let mut data = String::new();
        for _ in 0..run.len() {
            if let Some(c) = self.bump() {
                data.push(c);
            }
        }

        let kind = if data == "$" {
            TokenKind::Dollar
        } else {
            TokenKind::Operator
        };
        Token::new(kind, data, self.range_from(begin))
    }
}

fn is_identifier_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_identifier_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn is_symbol(c: char) -> bool {
    matches!(
        c,
        '!' | '$' | ':' | '~' | '+' | '-' | '&' | '|' | '^' | '=' | '<' | '>' | '*' | '/' | '%'
    )
}
