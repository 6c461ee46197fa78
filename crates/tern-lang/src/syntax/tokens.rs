use logos::Logos;

fn unescape(s: &str) -> String {
    let mut out = String::new();
    let mut chars = s[1..s.len() - 1].chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some('\\') => out.push('\\'),
                Some('"') => out.push('"'),
                Some(other) => {
                    out.push('\\');
                    out.push(other);
                }
                None => out.push('\\'),
            }
        } else {
            out.push(c);
        }
    }
    out
}

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n]+")]
#[logos(skip r";[^\n]*")]
pub enum Token {
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,

    // Literals — higher priority than Symbol so `-1` lexes as a number
    #[regex(r"-?[0-9]+", priority = 10, callback = |lex| lex.slice().to_string())]
    Int(String),
    #[regex(r#""([^"\\]|\\.)*""#, |lex| unescape(lex.slice()))]
    Str(String),

    // Host-style :keyword atoms; accepted by the reader, rejected later
    #[regex(r":[a-zA-Z_][a-zA-Z0-9_\-]*", |lex| lex.slice()[1..].to_string())]
    Keyword(String),

    // Symbols, including operator names like `+`, `<=`, `->` and
    // constructor predicates like `Just-P`
    #[regex(r"[a-zA-Z_+\-*/!<>=?.][a-zA-Z0-9_+\-*/!<>=?.']*", priority = 1, callback = |lex| lex.slice().to_string())]
    Symbol(String),
}
