//! Cursor queries: what lies under a `(line, column)` position.

use crate::document::ParsedDocument;
use jsonnet_syntax::ast::{Ast, NodeId};
use jsonnet_syntax::lexer::{Token, TokenKind};
use jsonnet_syntax::source::Location;

/// The outcome of locating a cursor in a document.
#[derive(Debug, Clone)]
pub enum CursorTarget {
    /// The tightest node whose range encloses the cursor.
    Found(NodeId),
    /// The cursor sits past the last token of its line; enough context is
    /// kept to drive completion while the user is mid-typing.
    AfterLineEnd(WhitespaceContext),
    /// The cursor floats in whitespace between tokens.
    InsideWhitespace(WhitespaceContext),
    /// Before the first token or otherwise outside the tree; nothing useful
    /// can be said.
    Outside,
}

/// Context for a cursor that is not inside any token.
#[derive(Debug, Clone)]
pub struct WhitespaceContext {
    /// The nearest token before the cursor.
    pub preceding: Token,
    /// The tightest enclosing node that is not a leaf.
    pub enclosing: Option<NodeId>,
}

/// The token whose range encloses the cursor, boundaries included.
#[must_use]
pub fn token_at(tokens: &[Token], cursor: Location) -> Option<&Token> {
    tokens
        .iter()
        .filter(|t| t.kind != TokenKind::EndOfFile)
        .find(|t| t.loc.encloses(cursor))
}

/// Locate the cursor in an annotated document.
#[must_use]
pub fn find_at(doc: &ParsedDocument, cursor: Location) -> CursorTarget {
    find_in(&doc.ast, &doc.tokens, doc.root, cursor)
}

/// Locate the cursor in a bare tree, e.g. the partial tree of a failed
/// parse.
#[must_use]
pub fn find_in(ast: &Ast, tokens: &[Token], root: NodeId, cursor: Location) -> CursorTarget {
    if token_at(tokens, cursor).is_some() {
        if !ast[root].loc.encloses(cursor) {
            return CursorTarget::Outside;
        }
        return CursorTarget::Found(descend(ast, root, cursor));
    }

    // The cursor floats between tokens.
    let preceding = tokens
        .iter()
        .filter(|t| t.kind != TokenKind::EndOfFile)
        .filter(|t| t.loc.end <= cursor)
        .last();
    let Some(preceding) = preceding else {
        return CursorTarget::Outside;
    };

    let enclosing = if ast[root].loc.encloses(cursor) {
        Some(descend(ast, root, cursor))
    } else {
        None
    };
    let enclosing = enclosing.filter(|node| !ast[*node].kind.is_leaf());
    let context = WhitespaceContext {
        preceding: preceding.clone(),
        enclosing,
    };

    let token_later_on_line = tokens.iter().any(|t| {
        t.kind != TokenKind::EndOfFile
            && t.loc.begin.line == cursor.line
            && t.loc.begin.column > cursor.column
    });
    if token_later_on_line {
        CursorTarget::InsideWhitespace(context)
    } else {
        CursorTarget::AfterLineEnd(context)
    }
}

/// Walk from `root` towards the tightest enclosing node. Among siblings
/// that both enclose the cursor the later one in source order wins.
fn descend(ast: &Ast, root: NodeId, cursor: Location) -> NodeId {
    let mut current = root;
    loop {
        let mut tighter = None;
        for child in ast.children(current) {
            if ast[child].loc.encloses(cursor) {
                tighter = Some(child);
            }
        }
        match tighter {
            Some(child) => current = child,
            None => return current,
        }
    }
}
