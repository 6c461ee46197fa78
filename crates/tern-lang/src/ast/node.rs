use crate::ast::Expr;
use crate::syntax::Span;
use crate::types::Type;
use std::sync::atomic::{AtomicU32, Ordering};

static NEXT_NODE_ID: AtomicU32 = AtomicU32::new(0);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub u32);

impl NodeId {
    pub fn next() -> Self {
        Self(NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// A checked-language expression. Inferred types are recorded in the
/// checker's side table, keyed by `id`.
#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    pub span: Span,
    pub id: NodeId,
}

impl Node {
    pub fn new(kind: NodeKind, span: Span) -> Self {
        Self {
            kind,
            span,
            id: NodeId::next(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum NodeKind {
    Lit(i64),
    Var(String),
    Lambda {
        params: Vec<String>,
        body: Box<Node>,
    },
    Apply {
        rator: Box<Node>,
        rands: Vec<Node>,
    },
    Let {
        bindings: Vec<(String, Node)>,
        body: Box<Node>,
    },
    Letrec {
        bindings: Vec<(String, Node)>,
        body: Box<Node>,
    },
    If {
        test: Box<Node>,
        then: Box<Node>,
        other: Box<Node>,
    },
    Seq(Vec<Node>),
    /// Host escape: a raw host form asserted to have the given type.
    Host {
        ty: Type,
        raw: Expr,
    },
}
