use std::collections::HashMap;

use crate::ast::node::Node;
use crate::ast::{Expr, ExprKind};
use crate::check::Checker;
use crate::env::{CtorInfo, TyCon};
use crate::errors::codes::ErrorCode;
use crate::errors::TernDiagnostic;
use crate::lower::{is_type_variable, Lowerer};
use crate::macros::{MacroHost, NullHost};
use crate::parser;
use crate::prelude::PRELUDE;
use crate::syntax::Span;
use crate::types::{Type, TypeError, TypeErrorKind};

/// What the downstream code generator receives for one elaborated form.
#[derive(Debug, Clone)]
pub enum CodeDesc {
    /// Environment side effects only (`declare`).
    Nothing,
    /// First definition of a value: bind `internal` to the compiled body.
    Define {
        name: String,
        internal: String,
        node: Node,
        ty: Type,
    },
    /// Redefinition of an existing value: assign to `internal`.
    Assign {
        name: String,
        internal: String,
        node: Node,
        ty: Type,
    },
    /// A data-type definition: constructors and predicates to generate.
    DefineType {
        tycon: String,
        ctors: Vec<CtorDesc>,
    },
    /// A bare top-level expression, checked and handed over for effect.
    Eval { node: Node, ty: Type },
}

#[derive(Debug, Clone)]
pub struct CtorDesc {
    pub name: String,
    pub predicate: String,
    pub ty: Type,
}

/// A recoverable clobber outcome, carrying the prior entry. The driver
/// decides whether to warn, error, or stay quiet.
#[derive(Debug, Clone)]
pub enum Redefinition {
    TyCon {
        name: String,
        prior: TyCon,
        span: Span,
    },
    Term {
        name: String,
        prior: Option<Type>,
        span: Span,
    },
}

impl Redefinition {
    pub fn name(&self) -> &str {
        match self {
            Redefinition::TyCon { name, .. } | Redefinition::Term { name, .. } => name,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Redefinition::TyCon { span, .. } | Redefinition::Term { span, .. } => *span,
        }
    }

    pub fn to_diagnostic(&self) -> TernDiagnostic {
        let what = match self {
            Redefinition::TyCon { .. } => "type constructor",
            Redefinition::Term { .. } => "value",
        };
        let message = format!("redefinition of {what} '{}'", self.name());
        TernDiagnostic::new(ErrorCode::E0300, &message).with_label(
            self.span(),
            "redefined here",
            true,
        )
    }
}

#[derive(Debug, Clone)]
pub struct Elaborated {
    pub code: CodeDesc,
    pub warnings: Vec<Redefinition>,
}

impl Elaborated {
    fn plain(code: CodeDesc) -> Self {
        Self {
            code,
            warnings: Vec::new(),
        }
    }
}

/// Dispatches top-level forms, mutating the environment and emitting
/// code descriptors. One elaborator is one compilation session.
pub struct Elaborator {
    pub checker: Checker,
    host: Box<dyn MacroHost>,
}

impl Elaborator {
    /// A session with the prelude loaded and no host macros.
    pub fn new() -> Self {
        Self::with_host(Box::new(NullHost))
    }

    pub fn with_host(host: Box<dyn MacroHost>) -> Self {
        let mut elab = Self::empty(host);
        // The prelude is part of the crate; failing to elaborate it is a
        // build defect, not a user error.
        elab.load_prelude().expect("prelude must elaborate cleanly");
        elab
    }

    /// A session with an empty term environment (only the primitive type
    /// constructors exist).
    pub fn empty(host: Box<dyn MacroHost>) -> Self {
        Self {
            checker: Checker::new(),
            host,
        }
    }

    fn load_prelude(&mut self) -> Result<(), TypeError> {
        let forms = parser::parse(PRELUDE)
            .map_err(|e| TypeError::new(TypeErrorKind::BadForm, e.message))?;
        for form in &forms {
            self.elaborate(form)?;
        }
        Ok(())
    }

    /// Elaborate one top-level form. Grouping forms flatten into several
    /// results; everything else yields exactly one.
    pub fn elaborate(&mut self, form: &Expr) -> Result<Vec<Elaborated>, TypeError> {
        if let ExprKind::List(items) = &form.kind {
            if let Some(head) = form.head() {
                match head {
                    "begin" => {
                        let mut out = Vec::new();
                        for sub in &items[1..] {
                            out.extend(self.elaborate(sub)?);
                        }
                        return Ok(out);
                    }
                    "declare" => return Ok(vec![self.elab_declare(items, form.span)?]),
                    "define-type" => return Ok(vec![self.elab_define_type(items, form.span)?]),
                    "define" => return Ok(vec![self.elab_define(form, items)?]),
                    _ => {}
                }
            }
        }

        // Anything else is a bare expression, checked for its own sake.
        let node = self.lower(form)?;
        let ty = self.checker.infer_top(&node)?;
        let ty = self.checker.subst.resolve(&ty);
        Ok(vec![Elaborated::plain(CodeDesc::Eval { node, ty })])
    }

    /// Infer the type of a bare expression without emitting anything.
    pub fn infer_expr(&mut self, form: &Expr) -> Result<Type, TypeError> {
        let node = self.lower(form)?;
        let ty = self.checker.infer_top(&node)?;
        Ok(self.checker.subst.resolve(&ty))
    }

    pub fn show_type(&mut self, ty: &Type) -> String {
        self.checker.subst.show(ty)
    }

    fn lower(&mut self, form: &Expr) -> Result<Node, TypeError> {
        let mut lw = Lowerer::new(
            &mut self.checker.subst,
            &self.checker.env,
            self.host.as_ref(),
        );
        lw.node(form)
    }

    fn lower_ty(
        &mut self,
        form: &Expr,
        vars: &mut HashMap<String, Type>,
    ) -> Result<Type, TypeError> {
        let mut lw = Lowerer::new(
            &mut self.checker.subst,
            &self.checker.env,
            self.host.as_ref(),
        );
        lw.ty(form, vars)
    }

    // (declare v T)
    fn elab_declare(&mut self, items: &[Expr], span: Span) -> Result<Elaborated, TypeError> {
        if items.len() != 3 {
            return Err(TypeError::at(
                TypeErrorKind::BadForm,
                "expected (declare name type)",
                span,
            ));
        }
        let name = match &items[1].kind {
            ExprKind::Symbol(s) => s.clone(),
            _ => {
                return Err(TypeError::at(
                    TypeErrorKind::BadForm,
                    "declared name must be a symbol",
                    items[1].span,
                ))
            }
        };
        let mut vars = HashMap::new();
        let ty = self.lower_ty(&items[2], &mut vars)?;
        self.checker.env.declare(&name).declared = Some(ty);
        Ok(Elaborated::plain(CodeDesc::Nothing))
    }

    // (define-type (C v...) ctor...)
    fn elab_define_type(&mut self, items: &[Expr], span: Span) -> Result<Elaborated, TypeError> {
        if items.len() < 2 {
            return Err(TypeError::at(
                TypeErrorKind::BadForm,
                "expected (define-type (name params) ctor ...)",
                span,
            ));
        }
        let (name, params) = self.tycon_header(&items[1])?;

        let mut warnings = Vec::new();
        if let Some(prior) = self
            .checker
            .env
            .insert_tycon(TyCon::new(name.clone(), params.len()))
        {
            warnings.push(Redefinition::TyCon {
                name: name.clone(),
                prior,
                span,
            });
        }

        // One shared variable-assignment map, so the header variables
        // mean the same thing in every constructor.
        let mut vars = HashMap::new();
        let mut arg_tys = Vec::new();
        for p in &params {
            let t = self.checker.subst.fresh_named(p);
            vars.insert(p.clone(), t.clone());
            arg_tys.push(t);
        }
        let result_ty = Type::App(name.clone(), arg_tys);

        let mut ctor_infos = Vec::new();
        let mut descs = Vec::new();
        for ctor in &items[2..] {
            let (ctor_name, ctor_ty) = match &ctor.kind {
                ExprKind::Symbol(k) => (k.clone(), result_ty.clone()),
                ExprKind::List(parts) if !parts.is_empty() => {
                    let k = match &parts[0].kind {
                        ExprKind::Symbol(k) => k.clone(),
                        _ => {
                            return Err(TypeError::at(
                                TypeErrorKind::BadForm,
                                "constructor name must be a symbol",
                                parts[0].span,
                            ))
                        }
                    };
                    let mut fields = Vec::new();
                    for field in &parts[1..] {
                        fields.push(self.lower_ty(field, &mut vars)?);
                    }
                    (k, Type::Fun(fields, Box::new(result_ty.clone())))
                }
                _ => {
                    return Err(TypeError::at(
                        TypeErrorKind::BadForm,
                        "expected a constructor name or (name field ...)",
                        ctor.span,
                    ))
                }
            };

            let predicate = format!("{ctor_name}-P");
            let predicate_ty = Type::Fun(vec![result_ty.clone()], Box::new(Type::bool()));

            if let Some(info) = self.checker.env.term(&ctor_name) {
                if info.declared.is_some() || info.derived.is_some() {
                    warnings.push(Redefinition::Term {
                        name: ctor_name.clone(),
                        prior: info.declared.clone().or_else(|| info.derived.clone()),
                        span: ctor.span,
                    });
                }
            }
            self.checker.env.declare(&ctor_name).declared = Some(ctor_ty.clone());
            self.checker.env.declare(&predicate).declared = Some(predicate_ty);

            ctor_infos.push(CtorInfo {
                name: ctor_name.clone(),
                predicate: predicate.clone(),
            });
            descs.push(CtorDesc {
                name: ctor_name,
                predicate,
                ty: ctor_ty,
            });
        }

        if let Some(tc) = self.checker.env.tycon_mut(&name) {
            tc.ctors = ctor_infos;
        }

        Ok(Elaborated {
            code: CodeDesc::DefineType {
                tycon: name,
                ctors: descs,
            },
            warnings,
        })
    }

    fn tycon_header(&self, form: &Expr) -> Result<(String, Vec<String>), TypeError> {
        let parts = match &form.kind {
            ExprKind::Symbol(name) => return self.tycon_name(name, form.span).map(|n| (n, Vec::new())),
            ExprKind::List(parts) if !parts.is_empty() => parts,
            _ => {
                return Err(TypeError::at(
                    TypeErrorKind::BadForm,
                    "expected (name params...) after define-type",
                    form.span,
                ))
            }
        };
        let name = match &parts[0].kind {
            ExprKind::Symbol(name) => self.tycon_name(name, parts[0].span)?,
            _ => {
                return Err(TypeError::at(
                    TypeErrorKind::BadForm,
                    "type name must be a symbol",
                    parts[0].span,
                ))
            }
        };
        let mut params = Vec::new();
        for p in &parts[1..] {
            match &p.kind {
                ExprKind::Symbol(s) if is_type_variable(s) => params.push(s.clone()),
                _ => {
                    return Err(TypeError::at(
                        TypeErrorKind::BadForm,
                        "type parameters must be lower-case symbols",
                        p.span,
                    ))
                }
            }
        }
        Ok((name, params))
    }

    fn tycon_name(&self, name: &str, span: Span) -> Result<String, TypeError> {
        if is_type_variable(name) {
            return Err(TypeError::at(
                TypeErrorKind::BadForm,
                "type constructor names start with an upper-case letter",
                span,
            ));
        }
        Ok(name.to_string())
    }

    // (define v e) | (define (f a...) e...)
    fn elab_define(&mut self, form: &Expr, items: &[Expr]) -> Result<Elaborated, TypeError> {
        if items.len() < 3 {
            return Err(TypeError::at(
                TypeErrorKind::BadForm,
                "expected (define name expr)",
                form.span,
            ));
        }

        let (name, body_form) = match &items[1].kind {
            ExprKind::Symbol(v) => {
                if items.len() != 3 {
                    return Err(TypeError::at(
                        TypeErrorKind::BadForm,
                        "expected (define name expr)",
                        form.span,
                    ));
                }
                (v.clone(), items[2].clone())
            }
            ExprKind::List(_) => self.desugar_function_define(form, items)?,
            _ => {
                return Err(TypeError::at(
                    TypeErrorKind::BadForm,
                    "defined name must be a symbol",
                    items[1].span,
                ))
            }
        };

        let node = self.lower(&body_form)?;
        let ty = self.checker.infer_top(&node)?;
        let ty = self.checker.subst.resolve(&ty);

        let (was_defined, prior) = match self.checker.env.term(&name) {
            Some(info) => (info.node.is_some(), info.derived.clone()),
            None => (false, None),
        };

        let info = self.checker.env.declare(&name);
        info.derived = Some(ty.clone());
        info.source = Some(form.clone());
        info.node = Some(node.clone());
        let internal = info.internal.clone();

        let code = if was_defined {
            CodeDesc::Assign {
                name: name.clone(),
                internal,
                node,
                ty,
            }
        } else {
            CodeDesc::Define {
                name: name.clone(),
                internal,
                node,
                ty,
            }
        };
        let warnings = if was_defined {
            vec![Redefinition::Term {
                name,
                prior,
                span: form.span,
            }]
        } else {
            Vec::new()
        };
        Ok(Elaborated { code, warnings })
    }

    /// `(define (f a...) e...)` becomes
    /// `(define f (letrec ((f (fn (a...) e))) f))`, so the body may
    /// recurse through `f` while uses after the define stay polymorphic.
    fn desugar_function_define(
        &self,
        form: &Expr,
        items: &[Expr],
    ) -> Result<(String, Expr), TypeError> {
        let header = match &items[1].kind {
            ExprKind::List(parts) if !parts.is_empty() => parts,
            _ => {
                return Err(TypeError::at(
                    TypeErrorKind::BadForm,
                    "expected (define (name params...) expr)",
                    items[1].span,
                ))
            }
        };
        let name = match &header[0].kind {
            ExprKind::Symbol(f) => f.clone(),
            _ => {
                return Err(TypeError::at(
                    TypeErrorKind::BadForm,
                    "defined name must be a symbol",
                    header[0].span,
                ))
            }
        };

        let body = if items.len() == 3 {
            items[2].clone()
        } else {
            let mut seq = vec![Expr::symbol("progn")];
            seq.extend(items[2..].iter().cloned());
            Expr::new(ExprKind::List(seq), form.span)
        };

        let lambda = Expr::new(
            ExprKind::List(vec![
                Expr::symbol("fn"),
                Expr::new(ExprKind::List(header[1..].to_vec()), items[1].span),
                body,
            ]),
            form.span,
        );
        let binding = Expr::list(vec![Expr::symbol(&name), lambda]);
        let letrec = Expr::new(
            ExprKind::List(vec![
                Expr::symbol("letrec"),
                Expr::list(vec![binding]),
                Expr::symbol(&name),
            ]),
            form.span,
        );
        Ok((name, letrec))
    }
}

impl Default for Elaborator {
    fn default() -> Self {
        Self::new()
    }
}
