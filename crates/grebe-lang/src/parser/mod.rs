pub mod forms;

use crate::ast::{Datum, DatumKind, Expr};
use crate::errors::ErrorCode;
use crate::syntax::{Span, Token};
use logos::Logos;

#[derive(Debug, Clone)]
pub struct ParseError {
    pub code: ErrorCode,
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

struct Reader {
    tokens: Vec<(Token, Span)>,
    pos: usize,
    end: usize,
}

impl Reader {
    fn new(source: &str) -> Result<Self, ParseError> {
        let mut tokens = Vec::new();
        let mut lexer = Token::lexer(source);
        while let Some(tok) = lexer.next() {
            let span = lexer.span();
            let span = Span::new(span.start, span.end);
            match tok {
                Ok(t) => tokens.push((t, span)),
                Err(()) => {
                    return Err(ParseError {
                        code: ErrorCode::E0100,
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
            end: source.len(),
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
        Span::new(self.end, self.end)
    }

    fn read_datum(&mut self) -> Result<Datum, ParseError> {
        let Some((tok, span)) = self.advance() else {
            return Err(ParseError {
                code: ErrorCode::E0101,
                message: "unexpected EOF".to_string(),
                span: self.eof_span(),
            });
        };

        match tok {
            Token::Number(n) => Ok(Datum::new(DatumKind::Number(n), span)),
            Token::True => Ok(Datum::new(DatumKind::Bool(true), span)),
            Token::False => Ok(Datum::new(DatumKind::Bool(false), span)),
            Token::Str(s) => Ok(Datum::new(DatumKind::Str(s), span)),
            Token::Symbol(s) => Ok(Datum::new(DatumKind::Symbol(s), span)),

            // 'datum is sugar for (quote datum)
            Token::Quote => {
                let inner = self.read_datum()?;
                let full_span = span.merge(inner.span);
                Ok(Datum::new(
                    DatumKind::List(vec![
                        Datum::new(DatumKind::Symbol("quote".to_string()), span),
                        inner,
                    ]),
                    full_span,
                ))
            }

            // Parens and brackets are interchangeable, but must match
            Token::LParen => self.read_list(span, &Token::RParen),
            Token::LBracket => self.read_list(span, &Token::RBracket),

            Token::Dot => Err(ParseError {
                code: ErrorCode::E0101,
                message: "'.' is only valid inside a list".to_string(),
                span,
            }),
            other => Err(ParseError {
                code: ErrorCode::E0101,
                message: format!("unexpected token: {other:?}"),
                span,
            }),
        }
    }

    fn read_list(&mut self, open: Span, closer: &Token) -> Result<Datum, ParseError> {
        let mut items = Vec::new();
        let mut tail = None;

        let close = loop {
            match self.peek() {
                None => {
                    return Err(ParseError {
                        code: ErrorCode::E0102,
                        message: "unclosed delimiter".to_string(),
                        span: open,
                    });
                }
                Some(t) if t == closer => {
                    let (_, span) = self.advance().unwrap_or((closer.clone(), self.eof_span()));
                    break span;
                }
                Some(Token::Dot) => {
                    let (_, dot_span) = self.advance().unwrap_or((Token::Dot, self.eof_span()));
                    if items.is_empty() {
                        return Err(ParseError {
                            code: ErrorCode::E0101,
                            message: "'.' needs a preceding datum".to_string(),
                            span: dot_span,
                        });
                    }
                    tail = Some(Box::new(self.read_datum()?));
                    match self.advance() {
                        Some((ref t, span)) if t == closer => break span,
                        Some((_, span)) => {
                            return Err(ParseError {
                                code: ErrorCode::E0101,
                                message: "expected exactly one datum after '.'".to_string(),
                                span,
                            });
                        }
                        None => {
                            return Err(ParseError {
                                code: ErrorCode::E0102,
                                message: "unclosed delimiter".to_string(),
                                span: open,
                            });
                        }
                    }
                }
                Some(_) => items.push(self.read_datum()?),
            }
        };

        let span = open.merge(close);
        match tail {
            Some(tail) => Ok(Datum::new(DatumKind::DottedList(items, tail), span)),
            None => Ok(Datum::new(DatumKind::List(items), span)),
        }
    }

    fn read_program(&mut self) -> Result<Vec<Datum>, ParseError> {
        let mut data = Vec::new();
        while self.peek().is_some() {
            data.push(self.read_datum()?);
        }
        Ok(data)
    }
}

/// Read a source string into a list of top-level datums.
pub fn read_program(source: &str) -> Result<Vec<Datum>, ParseError> {
    Reader::new(source)?.read_program()
}

/// Parse a source string into a list of top-level expressions.
pub fn parse(source: &str) -> Result<Vec<Expr>, ParseError> {
    read_program(source)?
        .iter()
        .map(forms::expr_from_datum)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_atoms() {
        let data = read_program("5 #t #f \"hi\" foo").unwrap();
        assert_eq!(data.len(), 5);
        assert!(matches!(data[0].kind, DatumKind::Number(n) if n == 5.0));
        assert!(matches!(data[1].kind, DatumKind::Bool(true)));
        assert!(matches!(data[2].kind, DatumKind::Bool(false)));
        assert!(matches!(data[3].kind, DatumKind::Str(ref s) if s == "hi"));
        assert!(matches!(data[4].kind, DatumKind::Symbol(ref s) if s == "foo"));
    }

    #[test]
    fn read_nested_list() {
        let data = read_program("(+ 1 (* 2 3))").unwrap();
        assert_eq!(data.len(), 1);
        assert_eq!(data[0].to_string(), "(+ 1 (* 2 3))");
    }

    #[test]
    fn quote_sugar_expands() {
        let data = read_program("'(1 2)").unwrap();
        assert_eq!(data[0].to_string(), "(quote (1 2))");
    }

    #[test]
    fn read_dotted_pair() {
        let data = read_program("(5 . 6)").unwrap();
        assert_eq!(data[0].to_string(), "(5 . 6)");
    }

    #[test]
    fn read_improper_list() {
        let data = read_program("(1 2 . 3)").unwrap();
        assert_eq!(data[0].to_string(), "(1 2 . 3)");
    }

    #[test]
    fn brackets_read_like_parens() {
        let data = read_program("[number -> number]").unwrap();
        assert_eq!(data[0].to_string(), "(number -> number)");
    }

    #[test]
    fn comments_are_skipped() {
        let data = read_program("; a comment\n42 ; trailing\n").unwrap();
        assert_eq!(data.len(), 1);
        assert!(matches!(data[0].kind, DatumKind::Number(n) if n == 42.0));
    }

    #[test]
    fn negative_number_is_not_a_symbol() {
        let data = read_program("-5").unwrap();
        assert!(matches!(data[0].kind, DatumKind::Number(n) if n == -5.0));
    }

    #[test]
    fn minus_alone_is_a_symbol() {
        let data = read_program("-").unwrap();
        assert!(matches!(data[0].kind, DatumKind::Symbol(ref s) if s == "-"));
    }

    #[test]
    fn unclosed_list_errors() {
        let err = read_program("(+ 1 2").unwrap_err();
        assert_eq!(err.code, ErrorCode::E0102);
    }

    #[test]
    fn stray_close_paren_errors() {
        let err = read_program(")").unwrap_err();
        assert_eq!(err.code, ErrorCode::E0101);
    }

    #[test]
    fn dot_outside_list_errors() {
        let err = read_program(".").unwrap_err();
        assert_eq!(err.code, ErrorCode::E0101);
    }

    #[test]
    fn two_datums_after_dot_errors() {
        let err = read_program("(1 . 2 3)").unwrap_err();
        assert_eq!(err.code, ErrorCode::E0101);
    }

    #[test]
    fn unexpected_character_errors() {
        let err = read_program("@").unwrap_err();
        assert_eq!(err.code, ErrorCode::E0100);
    }
}
