//! The grammar functions, one `impl` over [`Context`].
//!
//! `parse_expr` climbs the fixed precedence table; postfix forms (calls,
//! indexing, brace application) bind at [`APPLY_PRECEDENCE`], unary
//! operators at [`UNARY_PRECEDENCE`]. Statement-like forms (`local`,
//! `assert`, `if`, `function`, `error`, imports) extend maximally to the
//! right and are dispatched on their leading keyword.

use crate::ast::{
    BinaryOp, CompSpecKind, NamedArg, NodeId, NodeKind, ObjectField, ObjectFieldKind, StringKind,
    UnaryOp, Visibility,
};
use crate::lexer::{Token, TokenKind};
use std::collections::HashSet;

use super::context::Context;
use super::{
    ParseError, ParseErrorKind, APPLY_PRECEDENCE, MAX_PRECEDENCE, UNARY_PRECEDENCE,
};

impl Context {
    pub(crate) fn parse_document(&mut self) -> Result<NodeId, ParseError> {
        let root = self.parse_expr(MAX_PRECEDENCE)?;
        self.take_comments();
        let next = self.peek().clone();
        if next.kind != TokenKind::EndOfFile {
            return Err(self.error(next.loc.clone(), ParseErrorKind::DidNotExpect(next)));
        }
        Ok(root)
    }

    fn parse_expr(&mut self, prec: u8) -> Result<NodeId, ParseError> {
        self.take_comments();
        let begin = self.peek().clone();

        match begin.kind {
            // Statement-like forms bind everything to their right.
            TokenKind::Assert => {
                self.pop();
                let cond = self.parse_expr(MAX_PRECEDENCE)?;
                let message = if self.peek_operator(":") {
                    self.pop();
                    Some(self.parse_expr(MAX_PRECEDENCE)?)
                } else {
                    None
                };
                self.pop_expect(TokenKind::Semicolon)?;
                let rest = self.parse_expr(MAX_PRECEDENCE)?;
                let loc = self.span_from(begin.loc.begin);
                Ok(self.add_node(
                    loc,
                    NodeKind::Assert {
                        cond,
                        message,
                        rest,
                    },
                ))
            }
            TokenKind::Error => {
                self.pop();
                let expr = self.parse_expr(MAX_PRECEDENCE)?;
                let loc = self.span_from(begin.loc.begin);
                Ok(self.add_node(loc, NodeKind::Error { expr }))
            }
            TokenKind::If => {
                self.pop();
                let cond = self.parse_expr(MAX_PRECEDENCE)?;
                self.pop_expect(TokenKind::Then)?;
                let branch_true = self.parse_expr(MAX_PRECEDENCE)?;
                let branch_false = if self.peek().kind == TokenKind::Else {
                    self.pop();
                    Some(self.parse_expr(MAX_PRECEDENCE)?)
                } else {
                    None
                };
                let loc = self.span_from(begin.loc.begin);
                Ok(self.add_node(
                    loc,
                    NodeKind::Conditional {
                        cond,
                        branch_true,
                        branch_false,
                    },
                ))
            }
            TokenKind::Function => {
                self.pop();
                self.pop_expect(TokenKind::ParenL)?;
                let (params, trailing_comma) = self.parse_params()?;
                let body = self.parse_expr(MAX_PRECEDENCE)?;
                let loc = self.span_from(begin.loc.begin);
                Ok(self.add_node(
                    loc,
                    NodeKind::Function {
                        params,
                        trailing_comma,
                        body,
                    },
                ))
            }
            TokenKind::Import | TokenKind::ImportStr => {
                self.pop();
                let file = self.parse_expr(MAX_PRECEDENCE)?;
                let (is_string, is_block) = match &self.ast()[file].kind {
                    NodeKind::LiteralString { kind, .. } => (true, *kind == StringKind::Block),
                    _ => (false, false),
                };
                if !is_string {
                    return Err(self.error(
                        self.ast()[file].loc.clone(),
                        ParseErrorKind::ComputedImport,
                    ));
                }
                if is_block {
                    return Err(self.error(
                        self.ast()[file].loc.clone(),
                        ParseErrorKind::BlockStringImport,
                    ));
                }
                let loc = self.span_from(begin.loc.begin);
                let kind = if begin.kind == TokenKind::Import {
                    NodeKind::Import { file }
                } else {
                    NodeKind::ImportStr { file }
                };
                Ok(self.add_node(loc, kind))
            }
            TokenKind::Local => {
                self.pop();
                let mut binds = Vec::new();
                let mut seen = HashSet::new();
                loop {
                    let bind = self.parse_bind(&mut seen)?;
                    binds.push(bind);
                    let delim = self.pop();
                    match delim.kind {
                        TokenKind::Comma => {}
                        TokenKind::Semicolon => break,
                        _ => {
                            return Err(self.error(
                                delim.loc.clone(),
                                ParseErrorKind::ExpectedCommaOrSemicolon(delim),
                            ))
                        }
                    }
                }
                let body = match self.parse_expr(MAX_PRECEDENCE) {
                    Ok(body) => body,
                    Err(mut err) => {
                        // Re-wrap a salvaged body so the binds stay visible
                        // to completion.
                        if let Some(rest) = err.rest {
                            let loc = self.span_to_node(begin.loc.begin, rest);
                            err.rest =
                                Some(self.add_node(loc, NodeKind::Local { binds, body: rest }));
                        }
                        return Err(err);
                    }
                };
                let loc = self.span_from(begin.loc.begin);
                Ok(self.add_node(loc, NodeKind::Local { binds, body }))
            }
            _ => {
                if prec == 0 {
                    return self.parse_terminal();
                }

                if begin.kind == TokenKind::Operator && prec == UNARY_PRECEDENCE {
                    let Some(op) = UnaryOp::from_str(&begin.data) else {
                        return Err(self.error(
                            begin.loc.clone(),
                            ParseErrorKind::NotAUnaryOperator(begin.data),
                        ));
                    };
                    self.pop();
                    let expr = self.parse_expr(prec)?;
                    let loc = self.span_from(begin.loc.begin);
                    return Ok(self.add_node(loc, NodeKind::Unary { op, expr }));
                }

                let mut lhs = self.parse_expr(prec - 1)?;
                loop {
                    let next = self.peek().clone();
                    match next.kind {
                        TokenKind::In => {
                            if BinaryOp::In.precedence() != prec {
                                break;
                            }
                            self.pop();
                            let rhs = self.parse_expr(prec - 1)?;
                            lhs = self.binary(lhs, BinaryOp::In, rhs);
                        }
                        TokenKind::Operator => {
                            // Colons terminate the expression: the caller
                            // parses assert messages and field bodies.
                            if matches!(next.data.as_str(), ":" | "::" | ":::") {
                                break;
                            }
                            let Some(op) = BinaryOp::from_str(&next.data) else {
                                return Err(self.error(
                                    next.loc.clone(),
                                    ParseErrorKind::NotABinaryOperator(next.data),
                                ));
                            };
                            if op.precedence() != prec {
                                break;
                            }
                            self.pop();
                            let rhs = self.parse_expr(prec - 1)?;
                            lhs = self.binary(lhs, op, rhs);
                        }
                        TokenKind::Dot if prec == APPLY_PRECEDENCE => {
                            self.pop();
                            let id_tok = match self.pop_expect(TokenKind::Identifier) {
                                Ok(tok) => tok,
                                Err(mut err) => {
                                    err.rest = Some(lhs);
                                    return Err(err);
                                }
                            };
                            let id = self.add_node(
                                id_tok.loc.clone(),
                                NodeKind::Identifier { name: id_tok.data },
                            );
                            let begin_loc = self.ast()[lhs].loc.begin;
                            let loc = self.span_from(begin_loc);
                            lhs = self.add_node(loc, NodeKind::IndexDot { target: lhs, id });
                        }
                        TokenKind::BracketL if prec == APPLY_PRECEDENCE => {
                            self.pop();
                            let index = match self.parse_expr(MAX_PRECEDENCE) {
                                Ok(index) => index,
                                Err(mut err) => {
                                    err.rest.get_or_insert(lhs);
                                    return Err(err);
                                }
                            };
                            if let Err(mut err) = self.pop_expect(TokenKind::BracketR) {
                                err.rest.get_or_insert(lhs);
                                return Err(err);
                            }
                            let begin_loc = self.ast()[lhs].loc.begin;
                            let loc = self.span_from(begin_loc);
                            lhs = self
                                .add_node(loc, NodeKind::IndexSubscript { target: lhs, index });
                        }
                        TokenKind::ParenL if prec == APPLY_PRECEDENCE => {
                            self.pop();
                            let (args, named_args, trailing_comma) =
                                self.parse_args("function argument")?;
                            let tail_strict = if self.peek().kind == TokenKind::TailStrict {
                                self.pop();
                                true
                            } else {
                                false
                            };
                            let begin_loc = self.ast()[lhs].loc.begin;
                            let loc = self.span_from(begin_loc);
                            lhs = self.add_node(
                                loc,
                                NodeKind::Apply {
                                    target: lhs,
                                    args,
                                    named_args,
                                    trailing_comma,
                                    tail_strict,
                                },
                            );
                        }
                        TokenKind::BraceL if prec == APPLY_PRECEDENCE => {
                            let brace = self.pop();
                            let right = self.parse_object_remainder(&brace)?;
                            let begin_loc = self.ast()[lhs].loc.begin;
                            let loc = self.span_from(begin_loc);
                            lhs = self.add_node(loc, NodeKind::ApplyBrace { left: lhs, right });
                        }
                        _ => break,
                    }
                }
                Ok(lhs)
            }
        }
    }

    fn binary(&mut self, left: NodeId, op: BinaryOp, right: NodeId) -> NodeId {
        let begin_loc = self.ast()[left].loc.begin;
        let loc = self.span_to_node(begin_loc, right);
        self.add_node(loc, NodeKind::Binary { left, op, right })
    }

    fn peek_operator(&self, op: &str) -> bool {
        let next = self.peek();
        next.kind == TokenKind::Operator && next.data == op
    }

    fn parse_terminal(&mut self) -> Result<NodeId, ParseError> {
        self.take_comments();
        let tok = self.peek().clone();

        match tok.kind {
            TokenKind::ParenL => {
                self.pop();
                let inner = self.parse_expr(MAX_PRECEDENCE)?;
                self.pop_expect(TokenKind::ParenR)?;
                Ok(inner)
            }
            TokenKind::BraceL => {
                let brace = self.pop();
                self.parse_object_remainder(&brace)
            }
            TokenKind::BracketL => self.parse_array_remainder(),
            TokenKind::Number => {
                self.pop();
                let value: f64 = match tok.data.parse() {
                    Ok(value) => value,
                    Err(_) => {
                        return Err(
                            self.error(tok.loc.clone(), ParseErrorKind::BadNumber(tok.data))
                        )
                    }
                };
                Ok(self.add_node(
                    tok.loc.clone(),
                    NodeKind::LiteralNumber {
                        value,
                        original_string: tok.data,
                    },
                ))
            }
            TokenKind::StringSingle | TokenKind::StringDouble | TokenKind::StringBlock => {
                self.pop();
                Ok(self.string_literal(&tok))
            }
            TokenKind::False => {
                self.pop();
                Ok(self.add_node(tok.loc.clone(), NodeKind::LiteralBoolean { value: false }))
            }
            TokenKind::True => {
                self.pop();
                Ok(self.add_node(tok.loc.clone(), NodeKind::LiteralBoolean { value: true }))
            }
            TokenKind::Null => {
                self.pop();
                Ok(self.add_node(tok.loc.clone(), NodeKind::LiteralNull))
            }
            TokenKind::SelfToken => {
                self.pop();
                Ok(self.add_node(tok.loc.clone(), NodeKind::SelfExpr))
            }
            TokenKind::Dollar => {
                self.pop();
                Ok(self.add_node(tok.loc.clone(), NodeKind::Dollar))
            }
            TokenKind::Identifier => {
                self.pop();
                let id = self.add_node(
                    tok.loc.clone(),
                    NodeKind::Identifier { name: tok.data },
                );
                Ok(self.add_node(tok.loc.clone(), NodeKind::Var { id }))
            }
            TokenKind::Super => {
                self.pop();
                match self.peek().kind {
                    TokenKind::Dot => {
                        self.pop();
                        let id_tok = self.pop_expect(TokenKind::Identifier)?;
                        let id = self.add_node(
                            id_tok.loc.clone(),
                            NodeKind::Identifier { name: id_tok.data },
                        );
                        let loc = self.span_from(tok.loc.begin);
                        Ok(self.add_node(
                            loc,
                            NodeKind::SuperIndex {
                                id: Some(id),
                                index: None,
                            },
                        ))
                    }
                    TokenKind::BracketL => {
                        self.pop();
                        let index = self.parse_expr(MAX_PRECEDENCE)?;
                        self.pop_expect(TokenKind::BracketR)?;
                        let loc = self.span_from(tok.loc.begin);
                        Ok(self.add_node(
                            loc,
                            NodeKind::SuperIndex {
                                id: None,
                                index: Some(index),
                            },
                        ))
                    }
                    _ => Err(self.error(tok.loc.clone(), ParseErrorKind::ExpectedSuperIndex)),
                }
            }
            TokenKind::Operator => Err(self.error(
                tok.loc.clone(),
                ParseErrorKind::NotAUnaryOperator(tok.data),
            )),
            _ => Err(self.error(tok.loc.clone(), ParseErrorKind::UnexpectedTerminal(tok))),
        }
    }

    fn string_literal(&mut self, tok: &Token) -> NodeId {
        let kind = match tok.kind {
            TokenKind::StringSingle => StringKind::Single,
            TokenKind::StringBlock => StringKind::Block,
            _ => StringKind::Double,
        };
        self.add_node(
            tok.loc.clone(),
            NodeKind::LiteralString {
                value: tok.data.clone(),
                kind,
                block_indent: tok.string_block_indent.clone(),
                block_term_indent: tok.string_block_term_indent.clone(),
            },
        )
    }

    fn parse_array_remainder(&mut self) -> Result<NodeId, ParseError> {
        let bracket = self.pop();

        if self.peek().kind == TokenKind::BracketR {
            self.pop();
            let loc = self.span_from(bracket.loc.begin);
            return Ok(self.add_node(
                loc,
                NodeKind::Array {
                    elements: Vec::new(),
                    trailing_comma: false,
                },
            ));
        }

        let first = self.parse_expr(MAX_PRECEDENCE)?;
        let mut got_comma = false;
        if self.peek().kind == TokenKind::Comma {
            self.pop();
            got_comma = true;
        }

        if self.peek().kind == TokenKind::For {
            let specs = self.parse_comp_specs(TokenKind::BracketR)?;
            self.pop_expect(TokenKind::BracketR)?;
            let loc = self.span_from(bracket.loc.begin);
            return Ok(self.add_node(
                loc,
                NodeKind::ArrayComp {
                    body: first,
                    trailing_comma: got_comma,
                    specs,
                },
            ));
        }

        let mut elements = vec![first];
        loop {
            if self.peek().kind == TokenKind::BracketR {
                self.pop();
                break;
            }
            if !got_comma {
                let next = self.peek().clone();
                return Err(self.error(
                    next.loc,
                    ParseErrorKind::ExpectedComma("array element"),
                ));
            }
            let element = self.parse_expr(MAX_PRECEDENCE)?;
            elements.push(element);
            got_comma = false;
            if self.peek().kind == TokenKind::Comma {
                self.pop();
                got_comma = true;
            }
        }

        let loc = self.span_from(bracket.loc.begin);
        Ok(self.add_node(
            loc,
            NodeKind::Array {
                elements,
                trailing_comma: got_comma,
            },
        ))
    }

    /// Parse `( ... )` argument lists: positional expressions and
    /// `name = value` named arguments. The closing paren is consumed.
    fn parse_args(
        &mut self,
        element: &'static str,
    ) -> Result<(Vec<NodeId>, Vec<NamedArg>, bool), ParseError> {
        let mut positional = Vec::new();
        let mut named = Vec::new();
        let mut got_comma = false;
        let mut first = true;

        loop {
            if self.peek().kind == TokenKind::ParenR {
                self.pop();
                break;
            }
            if !first && !got_comma {
                let next = self.peek().clone();
                return Err(self.error(next.loc, ParseErrorKind::ExpectedComma(element)));
            }

            if self.peek().kind == TokenKind::Identifier
                && self.peek2().kind == TokenKind::Operator
                && self.peek2().data == "="
            {
                let name_tok = self.pop();
                self.pop();
                let name = self.add_node(
                    name_tok.loc.clone(),
                    NodeKind::Identifier {
                        name: name_tok.data,
                    },
                );
                let value = self.parse_expr(MAX_PRECEDENCE)?;
                named.push(NamedArg { name, value });
            } else {
                let expr = self.parse_expr(MAX_PRECEDENCE)?;
                if !named.is_empty() {
                    return Err(self.error(
                        self.ast()[expr].loc.clone(),
                        ParseErrorKind::PositionalAfterNamed,
                    ));
                }
                positional.push(expr);
            }

            first = false;
            got_comma = false;
            if self.peek().kind == TokenKind::Comma {
                self.pop();
                got_comma = true;
            }
        }

        Ok((positional, named, got_comma))
    }

    /// Parse a parameter list through [`Context::parse_args`], then insist
    /// every positional entry was a simple identifier.
    fn parse_params(&mut self) -> Result<(Vec<NodeId>, bool), ParseError> {
        let (positional, named, trailing_comma) = self.parse_args("parameter")?;
        let mut params = Vec::with_capacity(positional.len() + named.len());

        for arg in positional {
            let id = match &self.ast()[arg].kind {
                NodeKind::Var { id } => *id,
                _ => {
                    return Err(self.error(
                        self.ast()[arg].loc.clone(),
                        ParseErrorKind::ExpectedSimpleIdentifier,
                    ))
                }
            };
            let loc = self.ast()[arg].loc.clone();
            params.push(self.add_node(
                loc,
                NodeKind::FunctionParam {
                    id,
                    default_value: None,
                },
            ));
        }
        for NamedArg { name, value } in named {
            let begin_loc = self.ast()[name].loc.begin;
            let loc = self.span_to_node(begin_loc, value);
            params.push(self.add_node(
                loc,
                NodeKind::FunctionParam {
                    id: name,
                    default_value: Some(value),
                },
            ));
        }

        Ok((params, trailing_comma))
    }

    fn parse_bind(&mut self, seen: &mut HashSet<String>) -> Result<NodeId, ParseError> {
        let id_tok = self.pop_expect(TokenKind::Identifier)?;
        if !seen.insert(id_tok.data.clone()) {
            return Err(self.error(
                id_tok.loc.clone(),
                ParseErrorKind::DuplicateLocalVar(id_tok.data),
            ));
        }
        let variable = self.add_node(
            id_tok.loc.clone(),
            NodeKind::Identifier {
                name: id_tok.data.clone(),
            },
        );

        let mut function_sugar = false;
        let mut params = Vec::new();
        let mut trailing_comma = false;
        if self.peek().kind == TokenKind::ParenL {
            self.pop();
            let (p, t) = self.parse_params()?;
            params = p;
            trailing_comma = t;
            function_sugar = true;
        }

        self.pop_expect_operator("=")?;
        let body = self.parse_expr(MAX_PRECEDENCE)?;

        let loc = self.span_from(id_tok.loc.begin);
        Ok(self.add_node(
            loc,
            NodeKind::LocalBind {
                variable,
                body,
                function_sugar,
                params,
                trailing_comma,
            },
        ))
    }

    /// Parse `for x in expr` followed by further `for` / `if` clauses up to
    /// (but not consuming) the `end` token.
    fn parse_comp_specs(&mut self, end: TokenKind) -> Result<Vec<NodeId>, ParseError> {
        let mut specs = Vec::new();

        let parse_for = |ctx: &mut Self| -> Result<NodeId, ParseError> {
            let for_tok = ctx.pop_expect(TokenKind::For)?;
            let id_tok = ctx.pop_expect(TokenKind::Identifier)?;
            let var = ctx.add_node(
                id_tok.loc.clone(),
                NodeKind::Identifier { name: id_tok.data },
            );
            ctx.pop_expect(TokenKind::In)?;
            let expr = ctx.parse_expr(MAX_PRECEDENCE)?;
            let loc = ctx.span_from(for_tok.loc.begin);
            Ok(ctx.add_node(
                loc,
                NodeKind::CompSpec {
                    kind: CompSpecKind::For,
                    var: Some(var),
                    expr,
                },
            ))
        };

        specs.push(parse_for(self)?);

        loop {
            let next = self.peek().clone();
            match next.kind {
                TokenKind::For => specs.push(parse_for(self)?),
                TokenKind::If => {
                    let if_tok = self.pop();
                    let expr = self.parse_expr(MAX_PRECEDENCE)?;
                    let loc = self.span_from(if_tok.loc.begin);
                    specs.push(self.add_node(
                        loc,
                        NodeKind::CompSpec {
                            kind: CompSpecKind::If,
                            var: None,
                            expr,
                        },
                    ));
                }
                kind if kind == end => return Ok(specs),
                _ => {
                    return Err(self.error(
                        next.loc.clone(),
                        ParseErrorKind::ExpectedCompClause { end, got: next },
                    ))
                }
            }
        }
    }

    /// Parse an object body after its `{`.
    pub(crate) fn parse_object_remainder(&mut self, brace: &Token) -> Result<NodeId, ParseError> {
        let mut fields: Vec<NodeId> = Vec::new();
        let mut literal_fields: HashSet<String> = HashSet::new();
        let mut binds: HashSet<String> = HashSet::new();
        let mut got_comma = false;
        let mut first = true;

        loop {
            // Comments above the separator belong to the next field; a
            // comment after the comma takes priority.
            let mut heading = self.take_comments();
            if !first && !got_comma && self.peek().kind == TokenKind::Comma {
                self.pop();
                got_comma = true;
                let post = self.take_comments();
                if !post.is_empty() {
                    heading = post;
                }
            }

            let next = self.peek().clone();

            if next.kind == TokenKind::BraceR {
                self.pop();
                let loc = self.span_from(brace.loc.begin);
                return Ok(self.add_node(
                    loc,
                    NodeKind::Object {
                        fields,
                        trailing_comma: got_comma,
                    },
                ));
            }

            if next.kind == TokenKind::For {
                // Everything parsed so far becomes an object comprehension;
                // the accumulated fields are re-validated, never assumed.
                let mut num_asserts = 0usize;
                let mut plain = Vec::new();
                for field in &fields {
                    if let NodeKind::ObjectField(data) = &self.ast()[*field].kind {
                        match data.kind {
                            ObjectFieldKind::Local => {}
                            ObjectFieldKind::Assert => num_asserts += 1,
                            _ => plain.push((data.kind, data.hide, data.super_sugar)),
                        }
                    }
                }
                if num_asserts > 0 {
                    return Err(
                        self.error(next.loc.clone(), ParseErrorKind::ObjectCompAsserts)
                    );
                }
                if plain.len() != 1 {
                    return Err(
                        self.error(next.loc.clone(), ParseErrorKind::ObjectCompOneField)
                    );
                }
                let (kind, hide, super_sugar) = plain[0];
                if hide != Visibility::Inherit {
                    return Err(
                        self.error(next.loc.clone(), ParseErrorKind::ObjectCompHiddenField)
                    );
                }
                if kind != ObjectFieldKind::Expr {
                    return Err(
                        self.error(next.loc.clone(), ParseErrorKind::ObjectCompFieldKind)
                    );
                }
                if super_sugar {
                    return Err(
                        self.error(next.loc.clone(), ParseErrorKind::ObjectCompSuperSugar)
                    );
                }

                let specs = self.parse_comp_specs(TokenKind::BraceR)?;
                self.pop_expect(TokenKind::BraceR)?;
                let loc = self.span_from(brace.loc.begin);
                return Ok(self.add_node(
                    loc,
                    NodeKind::ObjectComp {
                        fields,
                        trailing_comma: got_comma,
                        specs,
                    },
                ));
            }

            if !first && !got_comma {
                return Err(self.error(next.loc, ParseErrorKind::ExpectedComma("field")));
            }
            first = false;
            got_comma = false;

            let field = self.parse_object_field(heading, &mut literal_fields, &mut binds)?;
            fields.push(field);
        }
    }

    fn parse_object_field(
        &mut self,
        heading: Vec<Token>,
        literal_fields: &mut HashSet<String>,
        binds: &mut HashSet<String>,
    ) -> Result<NodeId, ParseError> {
        let next = self.peek().clone();

        match next.kind {
            TokenKind::Identifier
            | TokenKind::StringDouble
            | TokenKind::StringSingle
            | TokenKind::StringBlock
            | TokenKind::BracketL => {
                let name_tok = self.pop();
                let (kind, id, expr1) = match name_tok.kind {
                    TokenKind::Identifier => {
                        let id = self.add_node(
                            name_tok.loc.clone(),
                            NodeKind::Identifier {
                                name: name_tok.data.clone(),
                            },
                        );
                        (ObjectFieldKind::Id, Some(id), None)
                    }
                    TokenKind::BracketL => {
                        let expr = self.parse_expr(MAX_PRECEDENCE)?;
                        self.pop_expect(TokenKind::BracketR)?;
                        (ObjectFieldKind::Expr, None, Some(expr))
                    }
                    _ => {
                        let lit = self.string_literal(&name_tok);
                        (ObjectFieldKind::Str, None, Some(lit))
                    }
                };

                if kind != ObjectFieldKind::Expr
                    && !literal_fields.insert(name_tok.data.clone())
                {
                    return Err(self.error(
                        name_tok.loc.clone(),
                        ParseErrorKind::DuplicateField(name_tok.data),
                    ));
                }

                let mut method_sugar = false;
                let mut ids = Vec::new();
                let mut params_trailing_comma = false;
                if self.peek().kind == TokenKind::ParenL {
                    self.pop();
                    let (params, trailing) = self.parse_params()?;
                    ids = params;
                    params_trailing_comma = trailing;
                    method_sugar = true;
                }

                let op_tok = self.pop();
                let colons = if op_tok.kind == TokenKind::Operator {
                    op_tok.data.as_str()
                } else {
                    ""
                };
                let (super_sugar, hide) = match colons {
                    ":" => (false, Visibility::Inherit),
                    "::" => (false, Visibility::Hidden),
                    ":::" => (false, Visibility::Visible),
                    "+:" => (true, Visibility::Inherit),
                    "+::" => (true, Visibility::Hidden),
                    "+:::" => (true, Visibility::Visible),
                    _ => {
                        return Err(self.error(
                            op_tok.loc.clone(),
                            ParseErrorKind::ExpectedFieldColon(op_tok),
                        ))
                    }
                };
                if method_sugar && super_sugar {
                    return Err(self.error(
                        name_tok.loc.clone(),
                        ParseErrorKind::PlusColonMethod(name_tok.data),
                    ));
                }

                let expr2 = self.parse_expr(MAX_PRECEDENCE)?;

                let mut field = ObjectField::new(kind, hide);
                field.super_sugar = super_sugar;
                field.method_sugar = method_sugar;
                field.expr1 = expr1;
                field.id = id;
                field.ids = ids;
                field.trailing_comma = params_trailing_comma;
                field.expr2 = Some(expr2);
                field.heading_comments = self.comment_nodes(heading);

                let loc = self.span_from(name_tok.loc.begin);
                Ok(self.add_node(loc, NodeKind::ObjectField(field)))
            }
            TokenKind::Local => {
                let local_tok = self.pop();
                let id_tok = self.pop_expect(TokenKind::Identifier)?;
                if !binds.insert(id_tok.data.clone()) {
                    return Err(self.error(
                        id_tok.loc.clone(),
                        ParseErrorKind::DuplicateLocalVar(id_tok.data),
                    ));
                }
                let id = self.add_node(
                    id_tok.loc.clone(),
                    NodeKind::Identifier {
                        name: id_tok.data.clone(),
                    },
                );

                let mut method_sugar = false;
                let mut ids = Vec::new();
                let mut params_trailing_comma = false;
                if self.peek().kind == TokenKind::ParenL {
                    self.pop();
                    let (params, trailing) = self.parse_params()?;
                    ids = params;
                    params_trailing_comma = trailing;
                    method_sugar = true;
                }

                self.pop_expect_operator("=")?;
                let body = self.parse_expr(MAX_PRECEDENCE)?;

                let mut field = ObjectField::new(ObjectFieldKind::Local, Visibility::Visible);
                field.method_sugar = method_sugar;
                field.id = Some(id);
                field.ids = ids;
                field.trailing_comma = params_trailing_comma;
                field.expr2 = Some(body);
                field.heading_comments = self.comment_nodes(heading);

                let loc = self.span_from(local_tok.loc.begin);
                Ok(self.add_node(loc, NodeKind::ObjectField(field)))
            }
            TokenKind::Assert => {
                let assert_tok = self.pop();
                let cond = self.parse_expr(MAX_PRECEDENCE)?;
                let message = if self.peek_operator(":") {
                    self.pop();
                    Some(self.parse_expr(MAX_PRECEDENCE)?)
                } else {
                    None
                };

                let mut field = ObjectField::new(ObjectFieldKind::Assert, Visibility::Visible);
                field.expr2 = Some(cond);
                field.expr3 = message;
                field.heading_comments = self.comment_nodes(heading);

                let loc = self.span_from(assert_tok.loc.begin);
                Ok(self.add_node(loc, NodeKind::ObjectField(field)))
            }
            _ => Err(self.error(next.loc.clone(), ParseErrorKind::Unexpected(next))),
        }
    }
}
