//! The annotated abstract syntax tree.
//!
//! Nodes live in a slotmap arena and refer to each other by [`NodeId`], so
//! the tree is cheap to store, copy and traverse in any direction once the
//! analyzer adds its parent links. One [`NodeData`] per node carries the
//! immutable source range and the tagged [`NodeKind`] sum.

use crate::source::LocationRange;
use serde::{Deserialize, Serialize};
use slotmap::SlotMap;
use std::fmt;
use std::ops;

slotmap::new_key_type! { pub struct NodeId; }

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeData {
    pub loc: LocationRange,
    pub kind: NodeKind,
}

/// The node arena of one document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Ast {
    nodes: SlotMap<NodeId, NodeData>,
}

impl Ast {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, loc: LocationRange, kind: NodeKind) -> NodeId {
        self.nodes.insert(NodeData { loc, kind })
    }

    #[must_use]
    pub fn get(&self, node: NodeId) -> Option<&NodeData> {
        self.nodes.get(node)
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &NodeData)> {
        self.nodes.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The name of an [`NodeKind::Identifier`] node.
    #[must_use]
    pub fn identifier_name(&self, node: NodeId) -> Option<&str> {
        match &self[node].kind {
            NodeKind::Identifier { name } => Some(name),
            _ => None,
        }
    }

    /// The statically known name of an object field: the identifier of an
    /// `Id` field or the literal of a `Str` field. Computed fields have no
    /// static name.
    #[must_use]
    pub fn field_name(&self, field: &ObjectField) -> Option<&str> {
        match field.kind {
            ObjectFieldKind::Id | ObjectFieldKind::Local => {
                field.id.and_then(|id| self.identifier_name(id))
            }
            ObjectFieldKind::Str => field.expr1.and_then(|e| match &self[e].kind {
                NodeKind::LiteralString { value, .. } => Some(value.as_str()),
                _ => None,
            }),
            _ => None,
        }
    }

    /// Direct children in source order.
    #[must_use]
    pub fn children(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let push_opt = |out: &mut Vec<NodeId>, n: &Option<NodeId>| {
            if let Some(n) = n {
                out.push(*n);
            }
        };
        match &self[node].kind {
            NodeKind::Comment { .. }
            | NodeKind::Dollar
            | NodeKind::SelfExpr
            | NodeKind::Identifier { .. }
            | NodeKind::LiteralBoolean { .. }
            | NodeKind::LiteralNull
            | NodeKind::LiteralNumber { .. }
            | NodeKind::LiteralString { .. }
            | NodeKind::Builtin { .. } => {}
            NodeKind::Apply {
                target,
                args,
                named_args,
                ..
            } => {
                out.push(*target);
                out.extend(args.iter().copied());
                for named in named_args {
                    out.push(named.name);
                    out.push(named.value);
                }
            }
            NodeKind::ApplyBrace { left, right } => {
                out.push(*left);
                out.push(*right);
            }
            NodeKind::Array { elements, .. } => out.extend(elements.iter().copied()),
            NodeKind::ArrayComp { body, specs, .. } => {
                out.push(*body);
                out.extend(specs.iter().copied());
            }
            NodeKind::Assert {
                cond,
                message,
                rest,
            } => {
                out.push(*cond);
                push_opt(&mut out, message);
                out.push(*rest);
            }
            NodeKind::Binary { left, right, .. } => {
                out.push(*left);
                out.push(*right);
            }
            NodeKind::Conditional {
                cond,
                branch_true,
                branch_false,
            } => {
                out.push(*cond);
                out.push(*branch_true);
                push_opt(&mut out, branch_false);
            }
            NodeKind::Error { expr } => out.push(*expr),
            NodeKind::Function { params, body, .. } => {
                out.extend(params.iter().copied());
                out.push(*body);
            }
            NodeKind::FunctionParam { id, default_value } => {
                out.push(*id);
                push_opt(&mut out, default_value);
            }
            NodeKind::Import { file } | NodeKind::ImportStr { file } => out.push(*file),
            NodeKind::IndexDot { target, id } => {
                out.push(*target);
                out.push(*id);
            }
            NodeKind::IndexSubscript { target, index } => {
                out.push(*target);
                out.push(*index);
            }
            NodeKind::SuperIndex { id, index } => {
                push_opt(&mut out, id);
                push_opt(&mut out, index);
            }
            NodeKind::Local { binds, body } => {
                out.extend(binds.iter().copied());
                out.push(*body);
            }
            NodeKind::LocalBind {
                variable,
                params,
                body,
                ..
            } => {
                out.push(*variable);
                out.extend(params.iter().copied());
                out.push(*body);
            }
            NodeKind::Object { fields, .. } => out.extend(fields.iter().copied()),
            NodeKind::DesugaredObject { asserts, fields } => {
                out.extend(asserts.iter().copied());
                out.extend(fields.iter().copied());
            }
            NodeKind::ObjectComp { fields, specs, .. } => {
                out.extend(fields.iter().copied());
                out.extend(specs.iter().copied());
            }
            NodeKind::ObjectField(field) => {
                out.extend(field.heading_comments.iter().copied());
                push_opt(&mut out, &field.expr1);
                push_opt(&mut out, &field.id);
                out.extend(field.ids.iter().copied());
                push_opt(&mut out, &field.expr2);
                push_opt(&mut out, &field.expr3);
            }
            NodeKind::CompSpec { var, expr, .. } => {
                push_opt(&mut out, var);
                out.push(*expr);
            }
            NodeKind::Unary { expr, .. } => out.push(*expr),
            NodeKind::Var { id } => out.push(*id),
        }
        out
    }
}

impl ops::Index<NodeId> for Ast {
    type Output = NodeData;

    fn index(&self, index: NodeId) -> &Self::Output {
        self.nodes.get(index).unwrap()
    }
}

/// A named argument in a call, `f(key=value)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedArg {
    pub name: NodeId,
    pub value: NodeId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StringKind {
    Single,
    Double,
    Block,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompSpecKind {
    For,
    If,
}

/// Field visibility, controlling JSON output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Visibility {
    /// `::`
    Hidden,
    /// `:`
    Inherit,
    /// `:::`
    Visible,
}

impl Visibility {
    #[must_use]
    pub const fn marker(self) -> &'static str {
        match self {
            Visibility::Hidden => "::",
            Visibility::Inherit => ":",
            Visibility::Visible => ":::",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObjectFieldKind {
    /// `assert cond [: message]`
    Assert,
    /// `name: value`
    Id,
    /// `[expr]: value`
    Expr,
    /// `"name": value`
    Str,
    /// `local name = value`
    Local,
}

/// One entry in an object body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectField {
    pub kind: ObjectFieldKind,
    pub hide: Visibility,
    /// `+:` field merge sugar.
    pub super_sugar: bool,
    /// `name(params): body` method sugar.
    pub method_sugar: bool,
    /// Field name expression for computed and string-keyed fields.
    pub expr1: Option<NodeId>,
    pub id: Option<NodeId>,
    /// Method parameters ([`NodeKind::FunctionParam`] nodes).
    pub ids: Vec<NodeId>,
    pub trailing_comma: bool,
    /// The value (or assert condition, or local body).
    pub expr2: Option<NodeId>,
    /// The assert message.
    pub expr3: Option<NodeId>,
    /// `//` comments directly above the field.
    pub heading_comments: Vec<NodeId>,
}

impl ObjectField {
    #[must_use]
    pub fn new(kind: ObjectFieldKind, hide: Visibility) -> Self {
        Self {
            kind,
            hide,
            super_sugar: false,
            method_sugar: false,
            expr1: None,
            id: None,
            ids: Vec::new(),
            trailing_comma: false,
            expr2: None,
            expr3: None,
            heading_comments: Vec::new(),
        }
    }
}

/// The tagged sum of node variants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum NodeKind {
    /// A retained `//` comment, kept as a node so fields can carry heading
    /// documentation.
    Comment { text: String },
    /// `for x in expr` / `if expr` inside a comprehension.
    CompSpec {
        kind: CompSpecKind,
        var: Option<NodeId>,
        expr: NodeId,
    },
    /// `target(args)`.
    Apply {
        target: NodeId,
        args: Vec<NodeId>,
        named_args: Vec<NamedArg>,
        trailing_comma: bool,
        tail_strict: bool,
    },
    /// `target { ... }`, sugar for `target + { ... }`.
    ApplyBrace { left: NodeId, right: NodeId },
    Array {
        elements: Vec<NodeId>,
        trailing_comma: bool,
    },
    ArrayComp {
        body: NodeId,
        trailing_comma: bool,
        specs: Vec<NodeId>,
    },
    /// `assert cond [: message]; rest`.
    Assert {
        cond: NodeId,
        message: Option<NodeId>,
        rest: NodeId,
    },
    Binary {
        left: NodeId,
        op: BinaryOp,
        right: NodeId,
    },
    /// An interpreter intrinsic; never produced by the parser.
    Builtin { name: String, params: Vec<String> },
    /// `if cond then a [else b]`.
    Conditional {
        cond: NodeId,
        branch_true: NodeId,
        branch_false: Option<NodeId>,
    },
    /// `$`.
    Dollar,
    /// `error expr`.
    Error { expr: NodeId },
    Function {
        params: Vec<NodeId>,
        trailing_comma: bool,
        body: NodeId,
    },
    FunctionParam {
        id: NodeId,
        default_value: Option<NodeId>,
    },
    Identifier { name: String },
    Import { file: NodeId },
    ImportStr { file: NodeId },
    /// `target.id`.
    IndexDot { target: NodeId, id: NodeId },
    /// `target[index]`.
    IndexSubscript { target: NodeId, index: NodeId },
    /// `super.id` / `super[index]`.
    SuperIndex {
        id: Option<NodeId>,
        index: Option<NodeId>,
    },
    /// `local binds; body`.
    Local { binds: Vec<NodeId>, body: NodeId },
    LocalBind {
        variable: NodeId,
        body: NodeId,
        function_sugar: bool,
        params: Vec<NodeId>,
        trailing_comma: bool,
    },
    LiteralBoolean { value: bool },
    LiteralNull,
    LiteralNumber { value: f64, original_string: String },
    LiteralString {
        value: String,
        kind: StringKind,
        block_indent: String,
        block_term_indent: String,
    },
    Object {
        fields: Vec<NodeId>,
        trailing_comma: bool,
    },
    /// Core object form with computed keys only; never produced by the
    /// parser.
    DesugaredObject {
        asserts: Vec<NodeId>,
        fields: Vec<NodeId>,
    },
    /// `{ [key]: value for x in expr ... }`.
    ObjectComp {
        fields: Vec<NodeId>,
        trailing_comma: bool,
        specs: Vec<NodeId>,
    },
    ObjectField(ObjectField),
    /// `self`.
    SelfExpr,
    Unary { op: UnaryOp, expr: NodeId },
    /// A use of a variable; wraps the [`NodeKind::Identifier`].
    Var { id: NodeId },
}

impl NodeKind {
    /// Whether this node can never contain the cursor deeper than itself.
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        matches!(
            self,
            NodeKind::Comment { .. }
                | NodeKind::Dollar
                | NodeKind::SelfExpr
                | NodeKind::Identifier { .. }
                | NodeKind::LiteralBoolean { .. }
                | NodeKind::LiteralNull
                | NodeKind::LiteralNumber { .. }
                | NodeKind::LiteralString { .. }
                | NodeKind::Builtin { .. }
        )
    }
}

/// Unary operators, binding at precedence 4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOp {
    Not,
    BitwiseNot,
    Plus,
    Minus,
}

impl UnaryOp {
    #[must_use]
    pub fn from_str(op: &str) -> Option<UnaryOp> {
        Some(match op {
            "!" => UnaryOp::Not,
            "~" => UnaryOp::BitwiseNot,
            "+" => UnaryOp::Plus,
            "-" => UnaryOp::Minus,
            _ => return None,
        })
    }
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            UnaryOp::Not => "!",
            UnaryOp::BitwiseNot => "~",
            UnaryOp::Plus => "+",
            UnaryOp::Minus => "-",
        })
    }
}

/// Binary operators with their fixed precedence table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOp {
    Mult,
    Div,
    Percent,
    Plus,
    Minus,
    ShiftL,
    ShiftR,
    Greater,
    GreaterEq,
    Less,
    LessEq,
    In,
    ManifestEqual,
    ManifestUnequal,
    BitwiseAnd,
    BitwiseXor,
    BitwiseOr,
    And,
    Or,
}

impl BinaryOp {
    #[must_use]
    pub fn from_str(op: &str) -> Option<BinaryOp> {
        Some(match op {
            "*" => BinaryOp::Mult,
            "/" => BinaryOp::Div,
            "%" => BinaryOp::Percent,
            "+" => BinaryOp::Plus,
            "-" => BinaryOp::Minus,
            "<<" => BinaryOp::ShiftL,
            ">>" => BinaryOp::ShiftR,
            ">" => BinaryOp::Greater,
            ">=" => BinaryOp::GreaterEq,
            "<" => BinaryOp::Less,
            "<=" => BinaryOp::LessEq,
            "in" => BinaryOp::In,
            "==" => BinaryOp::ManifestEqual,
            "!=" => BinaryOp::ManifestUnequal,
            "&" => BinaryOp::BitwiseAnd,
            "^" => BinaryOp::BitwiseXor,
            "|" => BinaryOp::BitwiseOr,
            "&&" => BinaryOp::And,
            "||" => BinaryOp::Or,
            _ => return None,
        })
    }

    /// The binding strength used by the precedence-climbing parser.
    #[must_use]
    pub const fn precedence(self) -> u8 {
        match self {
            BinaryOp::Mult | BinaryOp::Div | BinaryOp::Percent => 5,
            BinaryOp::Plus | BinaryOp::Minus => 6,
            BinaryOp::ShiftL | BinaryOp::ShiftR => 7,
            BinaryOp::Greater
            | BinaryOp::GreaterEq
            | BinaryOp::Less
            | BinaryOp::LessEq
            | BinaryOp::In => 8,
            BinaryOp::ManifestEqual | BinaryOp::ManifestUnequal => 9,
            BinaryOp::BitwiseAnd => 10,
            BinaryOp::BitwiseXor => 11,
            BinaryOp::BitwiseOr => 12,
            BinaryOp::And => 13,
            BinaryOp::Or => 14,
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BinaryOp::Mult => "*",
            BinaryOp::Div => "/",
            BinaryOp::Percent => "%",
            BinaryOp::Plus => "+",
            BinaryOp::Minus => "-",
            BinaryOp::ShiftL => "<<",
            BinaryOp::ShiftR => ">>",
            BinaryOp::Greater => ">",
            BinaryOp::GreaterEq => ">=",
            BinaryOp::Less => "<",
            BinaryOp::LessEq => "<=",
            BinaryOp::In => "in",
            BinaryOp::ManifestEqual => "==",
            BinaryOp::ManifestUnequal => "!=",
            BinaryOp::BitwiseAnd => "&",
            BinaryOp::BitwiseXor => "^",
            BinaryOp::BitwiseOr => "|",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        })
    }
}
