use std::collections::HashMap;

use crate::ast::node::Node;
use crate::ast::Expr;
use crate::types::Type;

/// A data-constructor entry on a type constructor: the constructor name
/// and the name of its membership predicate.
#[derive(Debug, Clone)]
pub struct CtorInfo {
    pub name: String,
    pub predicate: String,
}

/// A named n-ary type constructor. Created with an empty constructor
/// list, which is filled in once the data constructors are elaborated.
#[derive(Debug, Clone)]
pub struct TyCon {
    pub name: String,
    pub arity: usize,
    pub ctors: Vec<CtorInfo>,
}

impl TyCon {
    pub fn new(name: impl Into<String>, arity: usize) -> Self {
        Self {
            name: name.into(),
            arity,
            ctors: Vec::new(),
        }
    }
}

/// Everything known about a term name: the user-supplied declared type,
/// the inferred derived type, the defining source form and its lowered
/// AST, and the opaque internal name handed to the code generator.
#[derive(Debug, Clone)]
pub struct TermInfo {
    pub declared: Option<Type>,
    pub derived: Option<Type>,
    pub source: Option<Expr>,
    pub node: Option<Node>,
    pub internal: String,
}

/// The session environment: the type-constructor table and the term
/// table. `Int`, `Bool` and `Unit` are preregistered.
#[derive(Debug, Clone)]
pub struct Env {
    tycons: HashMap<String, TyCon>,
    terms: HashMap<String, TermInfo>,
    gensym: u32,
}

impl Env {
    pub fn new() -> Self {
        let mut env = Self {
            tycons: HashMap::new(),
            terms: HashMap::new(),
            gensym: 0,
        };
        for name in ["Int", "Bool", "Unit"] {
            env.tycons.insert(name.to_string(), TyCon::new(name, 0));
        }
        env
    }

    pub fn tycon(&self, name: &str) -> Option<&TyCon> {
        self.tycons.get(name)
    }

    pub fn tycon_mut(&mut self, name: &str) -> Option<&mut TyCon> {
        self.tycons.get_mut(name)
    }

    /// Register a type constructor, returning the clobbered prior entry
    /// if there was one.
    pub fn insert_tycon(&mut self, tycon: TyCon) -> Option<TyCon> {
        self.tycons.insert(tycon.name.clone(), tycon)
    }

    pub fn term(&self, name: &str) -> Option<&TermInfo> {
        self.terms.get(name)
    }

    /// Fetch a term's info record, forward-declaring it (with a fresh
    /// internal name) if unknown. Internal names are allocated once and
    /// survive redefinition.
    pub fn declare(&mut self, name: &str) -> &mut TermInfo {
        let gensym = &mut self.gensym;
        self.terms.entry(name.to_string()).or_insert_with(|| {
            *gensym += 1;
            TermInfo {
                declared: None,
                derived: None,
                source: None,
                node: None,
                internal: format!("__{name}_{gensym}"),
            }
        })
    }

    /// The type a variable reference resolves to: the declared type wins
    /// over the derived one when both exist.
    pub fn lookup_type(&self, name: &str) -> Option<&Type> {
        self.terms
            .get(name)
            .and_then(|info| info.declared.as_ref().or(info.derived.as_ref()))
    }
}

impl Default for Env {
    fn default() -> Self {
        Self::new()
    }
}
