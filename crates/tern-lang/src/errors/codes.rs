/// Error codes for Tern diagnostics.
/// E01xx = reader errors
/// E02xx = type errors
/// E03xx = elaboration warnings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Reader errors
    E0100, // unexpected character
    E0101, // unexpected token
    E0102, // unclosed delimiter

    // Type errors
    E0200, // type mismatch
    E0201, // unbound symbol
    E0202, // function arity mismatch
    E0203, // infinite type
    E0204, // unknown type constructor
    E0205, // type constructor arity mismatch
    E0206, // malformed form

    // Elaboration warnings
    E0300, // redefinition
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::E0100 => "E0100",
            ErrorCode::E0101 => "E0101",
            ErrorCode::E0102 => "E0102",
            ErrorCode::E0200 => "E0200",
            ErrorCode::E0201 => "E0201",
            ErrorCode::E0202 => "E0202",
            ErrorCode::E0203 => "E0203",
            ErrorCode::E0204 => "E0204",
            ErrorCode::E0205 => "E0205",
            ErrorCode::E0206 => "E0206",
            ErrorCode::E0300 => "E0300",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            ErrorCode::E0100 => "unexpected character",
            ErrorCode::E0101 => "unexpected token",
            ErrorCode::E0102 => "unclosed delimiter",
            ErrorCode::E0200 => "type mismatch",
            ErrorCode::E0201 => "unbound symbol",
            ErrorCode::E0202 => "function arity mismatch",
            ErrorCode::E0203 => "infinite type",
            ErrorCode::E0204 => "unknown type constructor",
            ErrorCode::E0205 => "type constructor arity mismatch",
            ErrorCode::E0206 => "malformed form",
            ErrorCode::E0300 => "redefinition",
        }
    }

    pub fn category(&self) -> &'static str {
        match self {
            ErrorCode::E0100 | ErrorCode::E0101 | ErrorCode::E0102 => "reader",
            ErrorCode::E0200
            | ErrorCode::E0201
            | ErrorCode::E0202
            | ErrorCode::E0203
            | ErrorCode::E0204
            | ErrorCode::E0205
            | ErrorCode::E0206 => "type",
            ErrorCode::E0300 => "elaboration",
        }
    }

    pub fn is_warning(&self) -> bool {
        matches!(self, ErrorCode::E0300)
    }

    pub fn parse(s: &str) -> Option<ErrorCode> {
        let all = [
            ErrorCode::E0100,
            ErrorCode::E0101,
            ErrorCode::E0102,
            ErrorCode::E0200,
            ErrorCode::E0201,
            ErrorCode::E0202,
            ErrorCode::E0203,
            ErrorCode::E0204,
            ErrorCode::E0205,
            ErrorCode::E0206,
            ErrorCode::E0300,
        ];
        all.into_iter().find(|c| c.as_str().eq_ignore_ascii_case(s))
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
