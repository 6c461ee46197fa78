use std::collections::HashMap;

use crate::ast::node::{Node, NodeKind};
use crate::ast::{Expr, ExprKind};
use crate::env::Env;
use crate::macros::MacroHost;
use crate::syntax::Span;
use crate::types::{Subst, Type, TypeError, TypeErrorKind};

fn bad_form(message: impl Into<String>, span: Span) -> TypeError {
    TypeError::at(TypeErrorKind::BadForm, message, span)
}

/// Surface convention: lower-case symbols in type position are type
/// variables, anything else names a constructor.
pub fn is_type_variable(name: &str) -> bool {
    name.chars().next().map_or(false, |c| c.is_ascii_lowercase())
}

/// Lowers surface forms into the checked AST (`node`) and surface type
/// expressions into `Type` (`ty`), resolving constructor names against
/// the environment and consulting the host-macro hook on unknown
/// application heads.
pub struct Lowerer<'a> {
    pub subst: &'a mut Subst,
    pub env: &'a Env,
    pub host: &'a dyn MacroHost,
}

impl<'a> Lowerer<'a> {
    pub fn new(subst: &'a mut Subst, env: &'a Env, host: &'a dyn MacroHost) -> Self {
        Self { subst, env, host }
    }

    /// Value parser: surface form → checked AST.
    pub fn node(&mut self, form: &Expr) -> Result<Node, TypeError> {
        match &form.kind {
            ExprKind::Int(n) => Ok(Node::new(NodeKind::Lit(*n), form.span)),
            ExprKind::Symbol(s) => Ok(Node::new(NodeKind::Var(s.clone()), form.span)),
            ExprKind::Str(_) | ExprKind::Keyword(_) => Err(bad_form(
                "atom kind not recognised in an expression",
                form.span,
            )),
            ExprKind::List(items) => self.list(form, items),
        }
    }

    fn list(&mut self, form: &Expr, items: &[Expr]) -> Result<Node, TypeError> {
        if items.is_empty() {
            return Err(bad_form("empty application", form.span));
        }

        if let ExprKind::Symbol(head) = &items[0].kind {
            match head.as_str() {
                "fn" => return self.lambda(form, items),
                "let" => return self.let_form(form, items, false),
                "letrec" => return self.let_form(form, items, true),
                "if" => return self.if_form(form, items),
                "lisp" => return self.host_escape(form, items),
                "progn" => {
                    let body = items[1..]
                        .iter()
                        .map(|e| self.node(e))
                        .collect::<Result<Vec<_>, _>>()?;
                    return Ok(Node::new(NodeKind::Seq(body), form.span));
                }
                _ => {
                    if self.host.is_macro(head) {
                        let expanded = self
                            .host
                            .expand(form)
                            .map_err(|msg| bad_form(msg, form.span))?;
                        return self.node(&expanded);
                    }
                }
            }
        }

        // Function application
        let rator = self.node(&items[0])?;
        let rands = items[1..]
            .iter()
            .map(|e| self.node(e))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Node::new(
            NodeKind::Apply {
                rator: Box::new(rator),
                rands,
            },
            form.span,
        ))
    }

    fn lambda(&mut self, form: &Expr, items: &[Expr]) -> Result<Node, TypeError> {
        if items.len() != 3 {
            return Err(bad_form("expected (fn (params) body)", form.span));
        }
        let params = self.param_list(&items[1])?;
        let body = self.node(&items[2])?;
        Ok(Node::new(
            NodeKind::Lambda {
                params,
                body: Box::new(body),
            },
            form.span,
        ))
    }

    fn param_list(&mut self, form: &Expr) -> Result<Vec<String>, TypeError> {
        match &form.kind {
            ExprKind::List(params) => params
                .iter()
                .map(|p| match &p.kind {
                    ExprKind::Symbol(s) => Ok(s.clone()),
                    _ => Err(bad_form("parameter must be a symbol", p.span)),
                })
                .collect(),
            _ => Err(bad_form("expected a parameter list", form.span)),
        }
    }

    fn let_form(&mut self, form: &Expr, items: &[Expr], recursive: bool) -> Result<Node, TypeError> {
        if items.len() != 3 {
            return Err(bad_form("expected (let ((name expr) ...) body)", form.span));
        }
        let bindings = self.bindings(&items[1])?;
        let body = Box::new(self.node(&items[2])?);
        let kind = if recursive {
            NodeKind::Letrec { bindings, body }
        } else {
            NodeKind::Let { bindings, body }
        };
        Ok(Node::new(kind, form.span))
    }

    fn bindings(&mut self, form: &Expr) -> Result<Vec<(String, Node)>, TypeError> {
        let pairs = match &form.kind {
            ExprKind::List(pairs) => pairs,
            _ => return Err(bad_form("expected a binding list", form.span)),
        };
        let mut out = Vec::new();
        for pair in pairs {
            let parts = match &pair.kind {
                ExprKind::List(parts) if parts.len() == 2 => parts,
                _ => return Err(bad_form("expected a (name expr) binding", pair.span)),
            };
            let name = match &parts[0].kind {
                ExprKind::Symbol(s) => s.clone(),
                _ => return Err(bad_form("binding name must be a symbol", parts[0].span)),
            };
            out.push((name, self.node(&parts[1])?));
        }
        Ok(out)
    }

    fn if_form(&mut self, form: &Expr, items: &[Expr]) -> Result<Node, TypeError> {
        if items.len() != 4 {
            return Err(bad_form("expected (if test then else)", form.span));
        }
        Ok(Node::new(
            NodeKind::If {
                test: Box::new(self.node(&items[1])?),
                then: Box::new(self.node(&items[2])?),
                other: Box::new(self.node(&items[3])?),
            },
            form.span,
        ))
    }

    fn host_escape(&mut self, form: &Expr, items: &[Expr]) -> Result<Node, TypeError> {
        if items.len() != 3 {
            return Err(bad_form("expected (lisp type raw-form)", form.span));
        }
        let mut vars = HashMap::new();
        let ty = self.ty(&items[1], &mut vars)?;
        Ok(Node::new(
            NodeKind::Host {
                ty,
                raw: items[2].clone(),
            },
            form.span,
        ))
    }

    /// Type parser: surface type expression → `Type`. Free type variables
    /// are memoised by name into `vars`, so the same surface variable
    /// resolves to the same internal variable across calls sharing a map.
    pub fn ty(&mut self, form: &Expr, vars: &mut HashMap<String, Type>) -> Result<Type, TypeError> {
        match &form.kind {
            ExprKind::Symbol(s) => {
                if is_type_variable(s) {
                    if let Some(t) = vars.get(s) {
                        return Ok(t.clone());
                    }
                    let t = self.subst.fresh_named(s);
                    vars.insert(s.clone(), t.clone());
                    Ok(t)
                } else {
                    match self.env.tycon(s) {
                        Some(tc) if tc.arity == 0 => Ok(Type::App(s.clone(), Vec::new())),
                        Some(tc) => Err(TypeError::at(
                            TypeErrorKind::TyConArity,
                            format!("type constructor {s} expects {} argument(s)", tc.arity),
                            form.span,
                        )),
                        None => Err(TypeError::at(
                            TypeErrorKind::UnknownTyCon,
                            format!("unknown type constructor '{s}'"),
                            form.span,
                        )),
                    }
                }
            }
            ExprKind::List(items) => self.ty_list(form, items, vars),
            _ => Err(bad_form("expected a type expression", form.span)),
        }
    }

    fn ty_list(
        &mut self,
        form: &Expr,
        items: &[Expr],
        vars: &mut HashMap<String, Type>,
    ) -> Result<Type, TypeError> {
        let head = match items.first().map(|e| &e.kind) {
            Some(ExprKind::Symbol(s)) => s,
            _ => return Err(bad_form("expected a type expression", form.span)),
        };

        if head == "->" {
            if items.len() != 3 {
                return Err(bad_form("expected (-> args ret)", form.span));
            }
            // The argument position is a list of argument types (possibly
            // empty) or a single bare argument type.
            let params = match &items[1].kind {
                ExprKind::List(ps) => ps
                    .iter()
                    .map(|p| self.ty(p, vars))
                    .collect::<Result<Vec<_>, _>>()?,
                _ => vec![self.ty(&items[1], vars)?],
            };
            let ret = self.ty(&items[2], vars)?;
            return Ok(Type::Fun(params, Box::new(ret)));
        }

        let arity = match self.env.tycon(head) {
            Some(tc) => tc.arity,
            None => {
                return Err(TypeError::at(
                    TypeErrorKind::UnknownTyCon,
                    format!("unknown type constructor '{head}'"),
                    items[0].span,
                ))
            }
        };
        if arity != items.len() - 1 {
            return Err(TypeError::at(
                TypeErrorKind::TyConArity,
                format!(
                    "type constructor {head} expects {arity} argument(s), got {}",
                    items.len() - 1
                ),
                form.span,
            ));
        }
        let args = items[1..]
            .iter()
            .map(|a| self.ty(a, vars))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Type::App(head.clone(), args))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::TyCon;
    use crate::macros::NullHost;
    use crate::parser::parse;

    fn lower_one(src: &str) -> Result<Node, TypeError> {
        let forms = parse(src).unwrap();
        let mut subst = Subst::new();
        let env = Env::new();
        let mut lw = Lowerer::new(&mut subst, &env, &NullHost);
        lw.node(&forms[0])
    }

    fn lower_ty(src: &str) -> Result<Type, TypeError> {
        let forms = parse(src).unwrap();
        let mut subst = Subst::new();
        let mut env = Env::new();
        env.insert_tycon(TyCon::new("Maybe", 1));
        let mut lw = Lowerer::new(&mut subst, &env, &NullHost);
        let mut vars = HashMap::new();
        lw.ty(&forms[0], &mut vars)
    }

    #[test]
    fn lower_lambda() {
        let node = lower_one("(fn (x y) (x y))").unwrap();
        match node.kind {
            NodeKind::Lambda { params, body } => {
                assert_eq!(params, vec!["x".to_string(), "y".to_string()]);
                assert!(matches!(body.kind, NodeKind::Apply { .. }));
            }
            other => panic!("expected Lambda, got {other:?}"),
        }
    }

    #[test]
    fn lower_let_bindings_in_order() {
        let node = lower_one("(let ((a 1) (b 2)) b)").unwrap();
        match node.kind {
            NodeKind::Let { bindings, .. } => {
                assert_eq!(bindings[0].0, "a");
                assert_eq!(bindings[1].0, "b");
            }
            other => panic!("expected Let, got {other:?}"),
        }
    }

    #[test]
    fn lower_progn_and_empty_progn() {
        assert!(matches!(
            lower_one("(progn 1 2)").unwrap().kind,
            NodeKind::Seq(ref es) if es.len() == 2
        ));
        assert!(matches!(
            lower_one("(progn)").unwrap().kind,
            NodeKind::Seq(ref es) if es.is_empty()
        ));
    }

    #[test]
    fn lower_host_escape_parses_the_type() {
        let node = lower_one("(lisp Int (host-add 1 2))").unwrap();
        match node.kind {
            NodeKind::Host { ty, raw } => {
                assert_eq!(ty, Type::int());
                assert_eq!(raw.to_string(), "(host-add 1 2)");
            }
            other => panic!("expected Host, got {other:?}"),
        }
    }

    #[test]
    fn malformed_forms_are_rejected() {
        for src in ["()", "(fn (x))", "(fn x x)", "(if 1 2)", "(let (x 1) x)", "\"s\"", ":kw"] {
            let err = lower_one(src).unwrap_err();
            assert_eq!(err.kind, TypeErrorKind::BadForm, "source: {src}");
        }
    }

    #[test]
    fn macro_heads_are_expanded_and_reparsed() {
        struct Twice;
        impl MacroHost for Twice {
            fn is_macro(&self, name: &str) -> bool {
                name == "twice"
            }
            fn expand(&self, form: &Expr) -> Result<Expr, String> {
                match &form.kind {
                    ExprKind::List(items) if items.len() == 2 => Ok(Expr::list(vec![
                        Expr::symbol("progn"),
                        items[1].clone(),
                        items[1].clone(),
                    ])),
                    _ => Err("twice takes one argument".to_string()),
                }
            }
        }

        let forms = parse("(twice 1)").unwrap();
        let mut subst = Subst::new();
        let env = Env::new();
        let mut lw = Lowerer::new(&mut subst, &env, &Twice);
        let node = lw.node(&forms[0]).unwrap();
        assert!(matches!(node.kind, NodeKind::Seq(ref es) if es.len() == 2));

        let err = lw.node(&parse("(twice 1 2)").unwrap()[0]).unwrap_err();
        assert_eq!(err.kind, TypeErrorKind::BadForm);
    }

    #[test]
    fn type_variables_are_memoised_by_name() {
        let ty = lower_ty("(-> (a a) a)").unwrap();
        match ty {
            Type::Fun(params, ret) => {
                assert_eq!(params[0], params[1]);
                assert_eq!(params[0], *ret);
            }
            other => panic!("expected Fun, got {other:?}"),
        }
    }

    #[test]
    fn single_argument_may_be_bare() {
        let ty = lower_ty("(-> Int Bool)").unwrap();
        assert_eq!(
            ty,
            Type::Fun(vec![Type::int()], Box::new(Type::bool()))
        );
    }

    #[test]
    fn constructor_applications_check_arity() {
        assert!(lower_ty("(Maybe a)").is_ok());
        assert_eq!(
            lower_ty("(Maybe a b)").unwrap_err().kind,
            TypeErrorKind::TyConArity
        );
        assert_eq!(lower_ty("Maybe").unwrap_err().kind, TypeErrorKind::TyConArity);
    }

    #[test]
    fn unknown_constructors_are_rejected() {
        assert_eq!(
            lower_ty("(List a)").unwrap_err().kind,
            TypeErrorKind::UnknownTyCon
        );
        assert_eq!(lower_ty("Wibble").unwrap_err().kind, TypeErrorKind::UnknownTyCon);
    }
}
