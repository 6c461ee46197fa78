use std::collections::HashMap;
use std::fmt;

use crate::ast::Expr;
use crate::syntax::Span;

/// Unique type variable identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TyVar(pub u32);

/// Type representation for Tern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Type {
    /// Unification variable; its instance and display name live in the
    /// session's `Subst`, keyed by id.
    Var(TyVar),
    /// Saturated type-constructor application: name + ordered arguments.
    /// The argument count always equals the constructor's registered arity.
    App(String, Vec<Type>),
    /// Function type: argument list (possibly empty) and return type.
    Fun(Vec<Type>, Box<Type>),
}

impl Type {
    pub fn int() -> Type {
        Type::App("Int".to_string(), Vec::new())
    }

    pub fn bool() -> Type {
        Type::App("Bool".to_string(), Vec::new())
    }

    pub fn unit() -> Type {
        Type::App("Unit".to_string(), Vec::new())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeErrorKind {
    /// Incompatible structure or constructor names.
    Mismatch,
    /// Function types with different argument counts.
    FnArity,
    /// Occurs check failure.
    Infinite,
    /// Free term variable not in the environment.
    Unbound,
    /// Reference to an undefined type constructor.
    UnknownTyCon,
    /// Type constructor applied to the wrong number of arguments.
    TyConArity,
    /// Malformed surface form.
    BadForm,
}

#[derive(Debug, Clone)]
pub struct TypeError {
    pub kind: TypeErrorKind,
    pub message: String,
    pub span: Option<Span>,
}

impl TypeError {
    pub fn new(kind: TypeErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            span: None,
        }
    }

    pub fn at(kind: TypeErrorKind, message: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            message: message.into(),
            span: Some(span),
        }
    }

    /// Attach a span if this error does not already carry one.
    pub fn with_span(mut self, span: Span) -> Self {
        if self.span.is_none() {
            self.span = Some(span);
        }
        self
    }
}

impl fmt::Display for TypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TypeErrorKind::BadForm => write!(f, "parse error: {}", self.message),
            _ => write!(f, "type error: {}", self.message),
        }
    }
}

impl std::error::Error for TypeError {}

/// The session's substitution store: fresh-variable allocator, instance
/// table, and display-name cache, all indexed by variable id. This is the
/// external union-find encoding of the unification substitution.
pub struct Subst {
    bindings: Vec<Option<Type>>,
    names: Vec<Option<String>>,
    next_name: u32,
}

impl Subst {
    pub fn new() -> Self {
        Self {
            bindings: Vec::new(),
            names: Vec::new(),
            next_name: 0,
        }
    }

    /// Allocate a distinct fresh variable.
    pub fn fresh(&mut self) -> Type {
        let v = TyVar(self.bindings.len() as u32);
        self.bindings.push(None);
        self.names.push(None);
        Type::Var(v)
    }

    /// Allocate a fresh variable carrying a surface name for display.
    pub fn fresh_named(&mut self, name: &str) -> Type {
        let t = self.fresh();
        if let Type::Var(v) = &t {
            self.set_name(*v, name);
        }
        t
    }

    /// Set a variable's display name. A name, once set, is never replaced.
    pub fn set_name(&mut self, v: TyVar, name: &str) {
        let idx = v.0 as usize;
        if idx < self.names.len() && self.names[idx].is_none() {
            self.names[idx] = Some(name.to_string());
        }
    }

    pub fn bind(&mut self, v: TyVar, ty: Type) {
        let idx = v.0 as usize;
        if idx < self.bindings.len() {
            self.bindings[idx] = Some(ty);
        }
    }

    /// Follow instance indirections at the root of `ty`, path-compressing
    /// the chain, and return the terminal type. Children are left alone.
    pub fn prune(&mut self, ty: &Type) -> Type {
        if let Type::Var(v) = ty {
            let idx = v.0 as usize;
            if let Some(Some(inst)) = self.bindings.get(idx).cloned() {
                let t = self.prune(&inst);
                self.bindings[idx] = Some(t.clone());
                return t;
            }
        }
        ty.clone()
    }

    /// Non-mutating root lookup, used by the occurs check.
    fn root(&self, ty: &Type) -> Type {
        if let Type::Var(v) = ty {
            if let Some(Some(inst)) = self.bindings.get(v.0 as usize) {
                return self.root(inst);
            }
        }
        ty.clone()
    }

    /// Deep prune of an entire type, for final outputs and display.
    pub fn resolve(&self, ty: &Type) -> Type {
        match self.root(ty) {
            Type::Var(v) => Type::Var(v),
            Type::App(name, args) => {
                Type::App(name, args.iter().map(|a| self.resolve(a)).collect())
            }
            Type::Fun(params, ret) => Type::Fun(
                params.iter().map(|p| self.resolve(p)).collect(),
                Box::new(self.resolve(&ret)),
            ),
        }
    }

    /// Does variable `v` occur anywhere inside `ty`? Identity is by
    /// variable id, after following instances.
    pub fn occurs_in(&self, v: TyVar, ty: &Type) -> bool {
        match self.root(ty) {
            Type::Var(u) => u == v,
            Type::App(_, args) => args.iter().any(|a| self.occurs_in(v, a)),
            Type::Fun(params, ret) => {
                params.iter().any(|p| self.occurs_in(v, p)) || self.occurs_in(v, &ret)
            }
        }
    }

    fn occurs_in_any(&self, v: TyVar, tys: &[Type]) -> bool {
        tys.iter().any(|t| self.occurs_in(v, t))
    }

    /// Instantiate `ty`: copy it, replacing every generic variable (one
    /// that occurs in no `non_generic` type) with a fresh variable. The
    /// memo keeps multiple occurrences of one original variable mapped to
    /// one fresh variable, and is returned so callers can observe the
    /// substitution. Non-generic variables are preserved by identity.
    pub fn fresh_from(
        &mut self,
        ty: &Type,
        non_generic: &[Type],
    ) -> (Type, HashMap<TyVar, Type>) {
        let mut memo = HashMap::new();
        let t = self.fresh_rec(ty, non_generic, &mut memo);
        (t, memo)
    }

    fn fresh_rec(
        &mut self,
        ty: &Type,
        non_generic: &[Type],
        memo: &mut HashMap<TyVar, Type>,
    ) -> Type {
        match self.prune(ty) {
            Type::Var(v) => {
                if self.occurs_in_any(v, non_generic) {
                    Type::Var(v)
                } else if let Some(t) = memo.get(&v) {
                    t.clone()
                } else {
                    let t = self.fresh();
                    memo.insert(v, t.clone());
                    t
                }
            }
            Type::App(name, args) => Type::App(
                name,
                args.iter()
                    .map(|a| self.fresh_rec(a, non_generic, memo))
                    .collect(),
            ),
            Type::Fun(params, ret) => Type::Fun(
                params
                    .iter()
                    .map(|p| self.fresh_rec(p, non_generic, memo))
                    .collect(),
                Box::new(self.fresh_rec(&ret, non_generic, memo)),
            ),
        }
    }

    fn name_of(&mut self, v: TyVar) -> String {
        let idx = v.0 as usize;
        if let Some(Some(name)) = self.names.get(idx) {
            return name.clone();
        }
        let n = self.next_name;
        self.next_name += 1;
        let name = if n < 26 {
            ((b'a' + n as u8) as char).to_string()
        } else {
            format!("t{n}")
        };
        if idx < self.names.len() {
            self.names[idx] = Some(name.clone());
        }
        name
    }

    /// Render a type as a surface-syntax tree, following instances and
    /// synthesising (and caching) names for anonymous variables. Function
    /// types render as `(-> (args) ret)`.
    pub fn unparse(&mut self, ty: &Type) -> Expr {
        match self.prune(ty) {
            Type::Var(v) => Expr::symbol(&self.name_of(v)),
            Type::App(name, args) => {
                if args.is_empty() {
                    Expr::symbol(&name)
                } else {
                    let mut items = vec![Expr::symbol(&name)];
                    items.extend(args.iter().map(|a| self.unparse(a)));
                    Expr::list(items)
                }
            }
            Type::Fun(params, ret) => Expr::list(vec![
                Expr::symbol("->"),
                Expr::list(params.iter().map(|p| self.unparse(p)).collect()),
                self.unparse(&ret),
            ]),
        }
    }

    /// `unparse` printed to a string.
    pub fn show(&mut self, ty: &Type) -> String {
        self.unparse(ty).to_string()
    }
}

impl Default for Subst {
    fn default() -> Self {
        Self::new()
    }
}

/// Unify two types under the given substitution. Mutates variables in
/// place, left to right, depth first; there is no rollback on failure.
pub fn unify(subst: &mut Subst, a: &Type, b: &Type) -> Result<(), TypeError> {
    let a = subst.prune(a);
    let b = subst.prune(b);

    match (&a, &b) {
        (Type::Var(v), Type::Var(u)) if v == u => Ok(()),
        (Type::Var(v), _) => {
            if subst.occurs_in(*v, &b) {
                let msg = format!(
                    "infinite type: {} occurs in {}",
                    subst.show(&a),
                    subst.show(&b)
                );
                return Err(TypeError::new(TypeErrorKind::Infinite, msg));
            }
            subst.bind(*v, b.clone());
            Ok(())
        }
        // Swap a right-hand variable to the left so one arm handles both.
        (_, Type::Var(_)) => unify(subst, &b, &a),
        (Type::Fun(ap, ar), Type::Fun(bp, br)) => {
            if ap.len() != bp.len() {
                return Err(TypeError::new(
                    TypeErrorKind::FnArity,
                    format!(
                        "function arity mismatch: expected {}, got {}",
                        ap.len(),
                        bp.len()
                    ),
                ));
            }
            for (x, y) in ap.iter().zip(bp.iter()) {
                unify(subst, x, y)?;
            }
            unify(subst, ar, br)
        }
        (Type::App(n1, a1), Type::App(n2, a2)) => {
            if n1 != n2 || a1.len() != a2.len() {
                let msg = format!("cannot unify {} with {}", subst.show(&a), subst.show(&b));
                return Err(TypeError::new(TypeErrorKind::Mismatch, msg));
            }
            for (x, y) in a1.iter().zip(a2.iter()) {
                unify(subst, x, y)?;
            }
            Ok(())
        }
        _ => {
            let msg = format!("cannot unify {} with {}", subst.show(&a), subst.show(&b));
            Err(TypeError::new(TypeErrorKind::Mismatch, msg))
        }
    }
}
