use crate::ast::{Expr, ExprKind};
use crate::syntax::{Span, Token};
use logos::Logos;

#[derive(Debug, Clone)]
pub struct ParseError {
    pub message: String,
    pub span: Span,
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "parse error at {}..{}: {}",
            self.span.start, self.span.end, self.message
        )
    }
}

impl std::error::Error for ParseError {}

struct Reader<'a> {
    tokens: Vec<(Token, Span)>,
    pos: usize,
    source: &'a str,
}

impl<'a> Reader<'a> {
    fn new(source: &'a str) -> Result<Self, ParseError> {
        let mut tokens = Vec::new();
        let mut lexer = Token::lexer(source);
        while let Some(tok) = lexer.next() {
            let span = lexer.span();
            let span = Span::new(span.start, span.end);
            match tok {
                Ok(t) => tokens.push((t, span)),
                Err(()) => {
                    return Err(ParseError {
                        message: format!(
                            "unexpected character: {:?}",
                            &source[span.start..span.end]
                        ),
                        span,
                    });
                }
            }
        }
        Ok(Self {
            tokens,
            pos: 0,
            source,
        })
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(t, _)| t)
    }

    fn advance(&mut self) -> Option<(Token, Span)> {
        let item = self.tokens.get(self.pos).cloned();
        if item.is_some() {
            self.pos += 1;
        }
        item
    }

    fn eof_span(&self) -> Span {
        Span::new(self.source.len(), self.source.len())
    }

    fn expect(&mut self, expected: &Token) -> Result<Span, ParseError> {
        match self.advance() {
            Some((ref tok, span)) if tok == expected => Ok(span),
            Some((tok, span)) => Err(ParseError {
                message: format!("expected {expected:?}, got {tok:?}"),
                span,
            }),
            None => Err(ParseError {
                message: format!("expected {expected:?}, got EOF"),
                span: self.eof_span(),
            }),
        }
    }

    fn read_form(&mut self) -> Result<Expr, ParseError> {
        let Some((tok, span)) = self.advance() else {
            return Err(ParseError {
                message: "unexpected EOF".to_string(),
                span: self.eof_span(),
            });
        };

        match tok {
            Token::Int(s) => {
                let n: i64 = s.parse().map_err(|e| ParseError {
                    message: format!("invalid integer: {e}"),
                    span,
                })?;
                Ok(Expr::new(ExprKind::Int(n), span))
            }
            Token::Str(s) => Ok(Expr::new(ExprKind::Str(s), span)),
            Token::Keyword(k) => Ok(Expr::new(ExprKind::Keyword(k), span)),
            Token::Symbol(s) => Ok(Expr::new(ExprKind::Symbol(s), span)),

            Token::LParen => {
                let mut items = Vec::new();
                while self.peek() != Some(&Token::RParen) {
                    if self.peek().is_none() {
                        return Err(ParseError {
                            message: "unclosed (".to_string(),
                            span,
                        });
                    }
                    items.push(self.read_form()?);
                }
                let end = self.expect(&Token::RParen)?;
                Ok(Expr::new(ExprKind::List(items), span.merge(end)))
            }

            Token::RParen => Err(ParseError {
                message: "unexpected )".to_string(),
                span,
            }),
        }
    }

    fn read_program(&mut self) -> Result<Vec<Expr>, ParseError> {
        let mut forms = Vec::new();
        while self.peek().is_some() {
            forms.push(self.read_form()?);
        }
        Ok(forms)
    }
}

/// Read a source string into a list of top-level forms.
pub fn parse(source: &str) -> Result<Vec<Expr>, ParseError> {
    let mut reader = Reader::new(source)?;
    reader.read_program()
}
