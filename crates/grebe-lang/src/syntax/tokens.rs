use logos::Logos;

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n]+")]
#[logos(skip r";[^\n]*")]
pub enum Token {
    // Delimiters — brackets are interchangeable with parens
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,

    // Quote sugar: 'datum
    #[token("'")]
    Quote,

    // Dotted-pair marker, only valid inside a list
    #[token(".")]
    Dot,

    #[token("#t")]
    True,
    #[token("#f")]
    False,

    // Literals — higher priority than Symbol
    #[regex(r"-?[0-9]+(\.[0-9]+)?", priority = 10, callback = |lex| lex.slice().parse::<f64>().ok())]
    Number(f64),
    #[regex(r#""([^"\\]|\\.)*""#, |lex| {
        let s = lex.slice();
        s[1..s.len()-1].to_string()
    })]
    Str(String),

    // Symbols: identifiers, operators like +, ->, and the `:` annotation marker
    #[token(":", |_| ":".to_string())]
    #[regex(r"[a-zA-Z!$%&*/<=>?^_~+\-][a-zA-Z0-9!$%&*/<=>?^_~+\-]*", priority = 1, callback = |lex| lex.slice().to_string())]
    Symbol(String),
}
