//! Parsed documents and the lex → parse → annotate pipeline.

use crate::annotate::{self, Annotations};
use jsonnet_syntax::ast::{Ast, NodeId};
use jsonnet_syntax::lexer::{self, LexError, Token};
use jsonnet_syntax::parser::{ParseError, Parser};
use jsonnet_syntax::source::Location;
use url::Url;

/// A successfully parsed and annotated document snapshot.
#[derive(Debug, Clone)]
pub struct ParsedDocument {
    pub url: Url,
    pub text: String,
    pub version: Option<i32>,
    pub tokens: Vec<Token>,
    pub ast: Ast,
    pub root: NodeId,
    pub annotations: Annotations,
}

/// A document whose latest text does not lex or parse.
#[derive(Debug, Clone)]
pub struct FailedParsedDocument {
    pub url: Url,
    pub text: String,
    pub version: Option<i32>,
    pub failure: DocumentFailure,
}

#[derive(Debug, Clone)]
pub enum DocumentFailure {
    /// Lexing failed; the tokens before the error are kept.
    Lex { tokens: Vec<Token>, error: LexError },
    /// Parsing failed; the arena is kept so the error's partial `rest` tree
    /// stays meaningful.
    Parse {
        tokens: Vec<Token>,
        ast: Ast,
        error: ParseError,
    },
}

impl FailedParsedDocument {
    /// The static error of the failed stage.
    #[must_use]
    pub fn message(&self) -> String {
        match &self.failure {
            DocumentFailure::Lex { error, .. } => error.kind.to_string(),
            DocumentFailure::Parse { error, .. } => error.kind.to_string(),
        }
    }
}

/// Run the full pipeline on one document text.
#[tracing::instrument(skip(text))]
pub fn parse_document(
    url: &Url,
    text: &str,
    version: Option<i32>,
) -> Result<ParsedDocument, Box<FailedParsedDocument>> {
    let (tokens, lex_error) = lexer::lex_partial(url.as_str(), text, Location::UNBOUNDED);
    if let Some(error) = lex_error {
        tracing::debug!(%url, %error, "document failed to lex");
        return Err(Box::new(FailedParsedDocument {
            url: url.clone(),
            text: text.to_string(),
            version,
            failure: DocumentFailure::Lex { tokens, error },
        }));
    }

    let parse = Parser::new(tokens.clone()).parse();
    if let Some(error) = parse.error {
        tracing::debug!(%url, %error, "document failed to parse");
        return Err(Box::new(FailedParsedDocument {
            url: url.clone(),
            text: text.to_string(),
            version,
            failure: DocumentFailure::Parse {
                tokens,
                ast: parse.ast,
                error,
            },
        }));
    }

    let root = parse.root.expect("a parse without an error has a root");
    let annotations = annotate::annotate(&parse.ast, root);

    Ok(ParsedDocument {
        url: url.clone(),
        text: text.to_string(),
        version,
        tokens,
        ast: parse.ast,
        root,
        annotations,
    })
}
