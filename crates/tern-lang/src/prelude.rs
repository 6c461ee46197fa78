/// Declarations for the host-supplied primitives, elaborated at session
/// start. Everything here is a plain `declare`: the values themselves
/// live on the host side.
pub const PRELUDE: &str = r#"
(declare true Bool)
(declare false Bool)
(declare + (-> (Int Int) Int))
(declare - (-> (Int Int) Int))
(declare * (-> (Int Int) Int))
(declare < (-> (Int Int) Bool))
(declare > (-> (Int Int) Bool))
(declare <= (-> (Int Int) Bool))
(declare >= (-> (Int Int) Bool))
(declare = (-> (a a) Bool))
(declare not (-> (Bool) Bool))
"#;
