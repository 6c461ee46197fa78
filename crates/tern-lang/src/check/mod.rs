use std::collections::HashMap;

use crate::ast::node::{Node, NodeId, NodeKind};
use crate::env::Env;
use crate::types::{unify, Subst, Type, TypeError, TypeErrorKind};

/// Walks the checked AST and assigns every node a type, solving
/// constraints by unification as it goes. Local bindings live in a scope
/// stack layered over the global environment; the non-generic set holds
/// the type variables captured by enclosing lambdas (and letrec
/// placeholders), which must stay unified across uses.
pub struct Checker {
    pub subst: Subst,
    pub env: Env,
    /// Inferred type per node, resolved on demand.
    pub type_of: HashMap<NodeId, Type>,
    scopes: Vec<HashMap<String, Type>>,
    non_generic: Vec<Type>,
}

impl Checker {
    pub fn new() -> Self {
        Self {
            subst: Subst::new(),
            env: Env::new(),
            type_of: HashMap::new(),
            scopes: Vec::new(),
            non_generic: Vec::new(),
        }
    }

    /// Infer the type of a top-level expression. Scope state from an
    /// aborted previous form is discarded first; the substitution is not
    /// rolled back (failed forms may leave variables specialised).
    pub fn infer_top(&mut self, node: &Node) -> Result<Type, TypeError> {
        self.scopes.clear();
        self.non_generic.clear();
        self.infer(node)
    }

    /// The principal type of an already-inferred node, deeply pruned.
    pub fn derive_type(&self, node: &Node) -> Option<Type> {
        self.type_of.get(&node.id).map(|t| self.subst.resolve(t))
    }

    pub fn infer(&mut self, node: &Node) -> Result<Type, TypeError> {
        let ty = match &node.kind {
            NodeKind::Lit(_) => Type::int(),

            NodeKind::Var(name) => {
                let known = self.lookup(name).ok_or_else(|| {
                    TypeError::at(
                        TypeErrorKind::Unbound,
                        format!("unbound symbol '{name}'"),
                        node.span,
                    )
                })?;
                let (instance, _) = self.subst.fresh_from(&known, &self.non_generic);
                instance
            }

            NodeKind::Lambda { params, body } => {
                let mut scope = HashMap::new();
                let mut param_tys = Vec::new();
                for p in params {
                    let v = self.subst.fresh();
                    scope.insert(p.clone(), v.clone());
                    self.non_generic.push(v.clone());
                    param_tys.push(v);
                }
                self.scopes.push(scope);
                let body_ty = self.infer(body);
                self.scopes.pop();
                self.non_generic
                    .truncate(self.non_generic.len() - params.len());
                Type::Fun(param_tys, Box::new(body_ty?))
            }

            NodeKind::Apply { rator, rands } => {
                let fun_ty = self.infer(rator)?;
                let mut arg_tys = Vec::new();
                for rand in rands {
                    arg_tys.push(self.infer(rand)?);
                }
                let result = self.subst.fresh();
                unify(
                    &mut self.subst,
                    &fun_ty,
                    &Type::Fun(arg_tys, Box::new(result.clone())),
                )
                .map_err(|e| e.with_span(node.span))?;
                result
            }

            NodeKind::Let { bindings, body } => {
                self.scopes.push(HashMap::new());
                let result = self.infer_let(bindings, body);
                self.scopes.pop();
                result?
            }

            NodeKind::Letrec { bindings, body } => {
                let mut scope = HashMap::new();
                let mut placeholders = Vec::new();
                for (name, _) in bindings {
                    let v = self.subst.fresh();
                    scope.insert(name.clone(), v.clone());
                    self.non_generic.push(v.clone());
                    placeholders.push(v);
                }
                self.scopes.push(scope);
                let result = self.infer_letrec(bindings, &placeholders, body);
                self.scopes.pop();
                result?
            }

            NodeKind::If { test, then, other } => {
                let test_ty = self.infer(test)?;
                unify(&mut self.subst, &test_ty, &Type::bool())
                    .map_err(|e| e.with_span(test.span))?;
                let then_ty = self.infer(then)?;
                let other_ty = self.infer(other)?;
                unify(&mut self.subst, &then_ty, &other_ty)
                    .map_err(|e| e.with_span(node.span))?;
                then_ty
            }

            NodeKind::Seq(body) => {
                let mut last = Type::unit();
                for item in body {
                    last = self.infer(item)?;
                }
                last
            }

            // The declared type is trusted; the raw form is the host's.
            NodeKind::Host { ty, .. } => ty.clone(),
        };

        self.type_of.insert(node.id, ty.clone());
        Ok(ty)
    }

    /// Bindings are inferred sequentially in the current environment and
    /// stay out of the non-generic set, which is what makes `let`
    /// polymorphic.
    fn infer_let(
        &mut self,
        bindings: &[(String, Node)],
        body: &Node,
    ) -> Result<Type, TypeError> {
        for (name, value) in bindings {
            let ty = self.infer(value)?;
            if let Some(scope) = self.scopes.last_mut() {
                scope.insert(name.clone(), ty);
            }
        }
        self.infer(body)
    }

    /// Each binding's type is unified with its placeholder while the
    /// placeholders are non-generic; they leave the non-generic set
    /// before the body, so uses there are polymorphic.
    fn infer_letrec(
        &mut self,
        bindings: &[(String, Node)],
        placeholders: &[Type],
        body: &Node,
    ) -> Result<Type, TypeError> {
        let result = self.unify_letrec_bindings(bindings, placeholders);
        self.non_generic
            .truncate(self.non_generic.len() - placeholders.len());
        result?;
        self.infer(body)
    }

    fn unify_letrec_bindings(
        &mut self,
        bindings: &[(String, Node)],
        placeholders: &[Type],
    ) -> Result<(), TypeError> {
        for ((_, value), placeholder) in bindings.iter().zip(placeholders) {
            let ty = self.infer(value)?;
            unify(&mut self.subst, placeholder, &ty).map_err(|e| e.with_span(value.span))?;
        }
        Ok(())
    }

    fn lookup(&self, name: &str) -> Option<Type> {
        for scope in self.scopes.iter().rev() {
            if let Some(t) = scope.get(name) {
                return Some(t.clone());
            }
        }
        self.env.lookup_type(name).cloned()
    }
}

impl Default for Checker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lower::Lowerer;
    use crate::macros::NullHost;
    use crate::parser::parse;

    /// Parse and infer one expression against a small hand-declared
    /// environment, returning the displayed type.
    fn infer_one(src: &str) -> Result<String, TypeError> {
        let forms = parse(src).unwrap();
        let mut checker = Checker::new();
        checker.env.declare("true").declared = Some(Type::bool());
        checker.env.declare("zero?").declared = Some(Type::Fun(
            vec![Type::int()],
            Box::new(Type::bool()),
        ));
        let node = {
            let mut lw = Lowerer::new(&mut checker.subst, &checker.env, &NullHost);
            lw.node(&forms[0])?
        };
        let ty = checker.infer_top(&node)?;
        Ok(checker.subst.show(&ty))
    }

    #[test]
    fn literals_are_integers() {
        assert_eq!(infer_one("42").unwrap(), "Int");
    }

    #[test]
    fn identity_function() {
        assert_eq!(infer_one("(fn (x) x)").unwrap(), "(-> (a) a)");
    }

    #[test]
    fn nullary_function() {
        assert_eq!(infer_one("(fn () 1)").unwrap(), "(-> () Int)");
    }

    #[test]
    fn application_resolves_the_result() {
        assert_eq!(infer_one("((fn (x) x) 1)").unwrap(), "Int");
    }

    #[test]
    fn let_bindings_are_polymorphic() {
        let ty = infer_one("(let ((id (fn (x) x))) (if (id true) (id 1) 0))").unwrap();
        assert_eq!(ty, "Int");
    }

    #[test]
    fn lambda_parameters_are_monomorphic() {
        let err = infer_one("(fn (id) (if (id true) (id 1) 0))").unwrap_err();
        assert_eq!(err.kind, TypeErrorKind::Mismatch);
    }

    #[test]
    fn self_application_is_an_infinite_type() {
        let err = infer_one("(fn (x) (x x))").unwrap_err();
        assert_eq!(err.kind, TypeErrorKind::Infinite);
    }

    #[test]
    fn unbound_symbols_are_reported() {
        let err = infer_one("(wibble 1)").unwrap_err();
        assert_eq!(err.kind, TypeErrorKind::Unbound);
        assert!(err.message.contains("wibble"));
    }

    #[test]
    fn if_test_must_be_boolean() {
        let err = infer_one("(if 1 2 3)").unwrap_err();
        assert_eq!(err.kind, TypeErrorKind::Mismatch);
    }

    #[test]
    fn if_branches_must_agree() {
        let err = infer_one("(if true 1 true)").unwrap_err();
        assert_eq!(err.kind, TypeErrorKind::Mismatch);
    }

    #[test]
    fn sequences_yield_the_last_type() {
        assert_eq!(infer_one("(progn 1 true)").unwrap(), "Bool");
        assert_eq!(infer_one("(progn)").unwrap(), "Unit");
    }

    #[test]
    fn host_escapes_are_trusted() {
        assert_eq!(infer_one("(lisp Bool (host-thing))").unwrap(), "Bool");
        assert_eq!(
            infer_one("(if (lisp Bool (coin-flip)) 1 2)").unwrap(),
            "Int"
        );
    }

    #[test]
    fn letrec_bindings_are_monomorphic_inside_polymorphic_after() {
        // Inside the group, f's placeholder is pinned to one use...
        let err = infer_one(
            "(letrec ((f (fn (x) (progn (f true) (f 1))))) f)",
        )
        .unwrap_err();
        assert_eq!(err.kind, TypeErrorKind::Mismatch);
        // ...but the body instantiates freshly.
        let ty = infer_one(
            "(letrec ((id (fn (x) x))) (if (id true) (id 1) 0))",
        )
        .unwrap();
        assert_eq!(ty, "Int");
    }

    #[test]
    fn letrec_recursion_unifies_with_the_placeholder() {
        let ty = infer_one(
            "(letrec ((count (fn (n) (if (zero? n) 0 (count n))))) count)",
        )
        .unwrap();
        assert_eq!(ty, "(-> (Int) Int)");
    }

    #[test]
    fn derive_type_resolves_through_the_substitution() {
        let forms = parse("((fn (x) x) 5)").unwrap();
        let mut checker = Checker::new();
        let node = {
            let mut lw = Lowerer::new(&mut checker.subst, &checker.env, &NullHost);
            lw.node(&forms[0]).unwrap()
        };
        checker.infer_top(&node).unwrap();
        assert_eq!(checker.derive_type(&node), Some(Type::int()));
    }
}
