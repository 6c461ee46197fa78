pub mod node;

use crate::syntax::Span;
use std::fmt;

/// A surface form: an atom or a proper list of forms, as handed over by
/// the host (or read from text by the `parser` module).
#[derive(Debug, Clone)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// A form with no source position, for synthesised code (desugarings,
    /// type unparsing).
    pub fn synthetic(kind: ExprKind) -> Self {
        Self {
            kind,
            span: Span::default(),
        }
    }

    pub fn symbol(name: &str) -> Self {
        Self::synthetic(ExprKind::Symbol(name.to_string()))
    }

    pub fn list(items: Vec<Expr>) -> Self {
        Self::synthetic(ExprKind::List(items))
    }

    /// The head symbol of a list form, if there is one.
    pub fn head(&self) -> Option<&str> {
        match &self.kind {
            ExprKind::List(items) => match items.first().map(|e| &e.kind) {
                Some(ExprKind::Symbol(s)) => Some(s),
                _ => None,
            },
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub enum ExprKind {
    Int(i64),
    Str(String),
    Keyword(String),
    Symbol(String),
    List(Vec<Expr>),
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ExprKind::Int(n) => write!(f, "{n}"),
            ExprKind::Str(s) => write!(f, "\"{s}\""),
            ExprKind::Keyword(k) => write!(f, ":{k}"),
            ExprKind::Symbol(s) => write!(f, "{s}"),
            ExprKind::List(items) => {
                write!(f, "(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, ")")
            }
        }
    }
}
