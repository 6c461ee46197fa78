use tern_lang::elab::{CodeDesc, Elaborator};
use tern_lang::parser::parse;
use tern_lang::types::{TypeError, TypeErrorKind};

/// Run forms through a session and return the displayed type of the last
/// descriptor that carries one.
fn infer(elab: &mut Elaborator, src: &str) -> Result<String, TypeError> {
    let forms = parse(src).expect("read");
    let mut last = None;
    for form in &forms {
        for result in elab.elaborate(form)? {
            match result.code {
                CodeDesc::Define { ty, .. }
                | CodeDesc::Assign { ty, .. }
                | CodeDesc::Eval { ty, .. } => last = Some(ty),
                _ => {}
            }
        }
    }
    let ty = last.expect("expected a typed result");
    Ok(elab.show_type(&ty))
}

fn infer_fresh(src: &str) -> Result<String, TypeError> {
    infer(&mut Elaborator::new(), src)
}

#[test]
fn identity_is_polymorphic() {
    assert_eq!(infer_fresh("(fn (x) x)").unwrap(), "(-> (a) a)");
}

#[test]
fn let_bound_identity_is_used_at_two_types() {
    let ty = infer_fresh("(let ((id (fn (x) x))) (if (id true) (id 1) 0))").unwrap();
    assert_eq!(ty, "Int");
}

#[test]
fn lambda_bound_identity_is_monomorphic() {
    let err = infer_fresh("(fn (id) (if (id true) (id 1) 0))").unwrap_err();
    assert_eq!(err.kind, TypeErrorKind::Mismatch);
}

#[test]
fn factorial_gets_a_ground_type() {
    let ty = infer_fresh(
        "(letrec ((f (fn (n) (if (= n 0) 1 (* n (f (- n 1))))))) f)",
    )
    .unwrap();
    assert_eq!(ty, "(-> (Int) Int)");
}

#[test]
fn data_constructors_instantiate_per_use() {
    let mut elab = Elaborator::new();
    infer(&mut elab, "(define-type (Maybe a) Nothing (Just a)) 0").unwrap();

    assert_eq!(infer(&mut elab, "(Just 1)").unwrap(), "(Maybe Int)");
    assert_eq!(infer(&mut elab, "Nothing").unwrap(), "(Maybe a)");

    let pred = elab.checker.env.lookup_type("Just-P").cloned().unwrap();
    assert_eq!(elab.show_type(&pred), "(-> ((Maybe a)) Bool)");

    // two uses of Just at different element types coexist
    let ty = infer(&mut elab, "(progn (Just true) (Just 2))").unwrap();
    assert_eq!(ty, "(Maybe Int)");
}

#[test]
fn self_application_is_an_infinite_type() {
    let err = infer_fresh("(fn (x) (x x))").unwrap_err();
    assert_eq!(err.kind, TypeErrorKind::Infinite);
}

#[test]
fn defined_names_are_polymorphic_at_later_uses() {
    let mut elab = Elaborator::new();
    infer(&mut elab, "(define id (fn (x) x))").unwrap();
    assert_eq!(infer(&mut elab, "(id 1)").unwrap(), "Int");
    assert_eq!(infer(&mut elab, "(id true)").unwrap(), "Bool");
}

#[test]
fn declared_operators_drive_inference() {
    let mut elab = Elaborator::new();
    infer(&mut elab, "(declare length (-> ((Maybe a)) Int)) 0").unwrap_err();
    // Maybe is unknown until defined
    infer(&mut elab, "(define-type (Maybe a) Nothing (Just a)) 0").unwrap();
    infer(&mut elab, "(declare length (-> ((Maybe a)) Int)) 0").unwrap();
    assert_eq!(infer(&mut elab, "(length (Just 3))").unwrap(), "Int");
}

#[test]
fn host_escapes_take_the_asserted_type() {
    let ty = infer_fresh("((lisp (-> (Int) Int) host-negate) 3)").unwrap();
    assert_eq!(ty, "Int");
}

#[test]
fn equality_is_polymorphic_but_consistent() {
    assert_eq!(infer_fresh("(= 1 2)").unwrap(), "Bool");
    assert_eq!(infer_fresh("(= true false)").unwrap(), "Bool");
    let err = infer_fresh("(= 1 true)").unwrap_err();
    assert_eq!(err.kind, TypeErrorKind::Mismatch);
}

#[test]
fn unbound_names_fail_fast() {
    let err = infer_fresh("(frobnicate 1)").unwrap_err();
    assert_eq!(err.kind, TypeErrorKind::Unbound);
}
