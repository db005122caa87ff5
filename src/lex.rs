use std::str::FromStr;

use combine::{
    attempt, choice, eof, from_str, many, many1, optional,
    parser::{
        byte::{bytes, digit, hex_digit, spaces},
        combinator::recognize,
    },
    token, Parser, Stream,
};

pub trait ByteStream<'a>: Stream<Token = u8, Range = &'a [u8]> + 'a {}
impl<'a, T: Stream<Token = u8, Range = &'a [u8]> + 'a> ByteStream<'a> for T {}

#[derive(Debug, PartialEq)]
pub enum Token {
    // operators
    Add,
    Sub,
    Mul,
    Div,
    Idiv,
    Mod,
    Pow,
    ParL,
    ParR,

    // constant values
    Integer(i64),
    Float(f64),

    // end
    Eos,
}

pub struct Lex<S> {
    input: Option<S>,
    ahead: Token,
}

impl<'a, S: ByteStream<'a>> Lex<S> {
    pub fn new(input: S) -> Self {
        Self {
            input: Some(input),
            ahead: Token::Eos,
        }
    }

    pub fn next(&mut self) -> anyhow::Result<Token> {
        if self.ahead == Token::Eos {
            self.do_next()
        } else {
            Ok(std::mem::replace(&mut self.ahead, Token::Eos))
        }
    }

    pub fn peek(&mut self) -> anyhow::Result<&Token> {
        if self.ahead == Token::Eos {
            self.ahead = self.do_next()?;
        }
        Ok(&self.ahead)
    }

    fn do_next(&mut self) -> anyhow::Result<Token> {
        let Some(input) = self.input.take() else {
            anyhow::bail!("lexer used after a failed token");
        };
        let (t, rest) = expr_token()
            .parse(input)
            .map_err(|_| anyhow::anyhow!("invalid token"))?;
        self.input = Some(rest);
        Ok(t)
    }
}

fn expr_token<'a, Input>() -> impl Parser<Input, Output = Token> + 'a
where
    Input: ByteStream<'a>,
{
    let eos = eof().map(|_| Token::Eos);
    spaces().with(choice((operators(), attempt(hex()), decimal(), eos)))
}

fn operators<'a, Input>() -> impl Parser<Input, Output = Token> + 'a
where
    Input: ByteStream<'a>,
{
    choice((
        choice((
            attempt(bytes(&b"//"[..])).map(|_| Token::Idiv),
            attempt(bytes(&b"**"[..])).map(|_| Token::Pow),
        )),
        choice((
            token(b'+').map(|_| Token::Add),
            token(b'-').map(|_| Token::Sub),
            token(b'*').map(|_| Token::Mul),
            token(b'/').map(|_| Token::Div),
            token(b'%').map(|_| Token::Mod),
            token(b'^').map(|_| Token::Pow),
            token(b'(').map(|_| Token::ParL),
            token(b')').map(|_| Token::ParR),
        )),
    ))
}

/// Decimal numeral: digits with optional fraction and exponent, or a
/// leading-dot fraction.
fn decimal<Input>() -> impl Parser<Input, Output = Token>
where
    Input: Stream<Token = u8>,
{
    let int_first = recognize::<Vec<_>, _, _>((
        many1::<Vec<_>, _, _>(digit()),
        optional((token(b'.'), many::<Vec<_>, _, _>(digit()))),
        optional(exponent()),
    ));
    let dot_first = recognize::<Vec<_>, _, _>((
        token(b'.'),
        many1::<Vec<_>, _, _>(digit()),
        optional(exponent()),
    ));
    from_str(choice((int_first, dot_first))).map(|Numeral(t)| t)
}

fn exponent<Input>() -> impl Parser<Input, Output = ()>
where
    Input: Stream<Token = u8>,
{
    attempt((
        choice((token(b'e'), token(b'E'))),
        optional(choice((token(b'+'), token(b'-')))),
        many1::<Vec<_>, _, _>(digit()),
    ))
    .map(|_| ())
}

/// Hex integer. Wraps around on overflow, as Lua does.
fn hex<Input>() -> impl Parser<Input, Output = Token>
where
    Input: Stream<Token = u8>,
{
    (
        token(b'0'),
        choice((token(b'x'), token(b'X'))),
        many1::<Vec<u8>, _, _>(hex_digit()),
    )
        .map(|(_, _, digits): (u8, u8, Vec<u8>)| {
            let n = digits.iter().fold(0u64, |n, &c| {
                let d = (c as char).to_digit(16).unwrap_or(0) as u64;
                n.wrapping_mul(16).wrapping_add(d)
            });
            Token::Integer(n as i64)
        })
}

/// Integers that do not fit in `i64` become floats.
struct Numeral(Token);

impl FromStr for Numeral {
    type Err = std::num::ParseFloatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.bytes().all(|c| c.is_ascii_digit()) {
            if let Ok(i) = s.parse() {
                return Ok(Self(Token::Integer(i)));
            }
        }
        s.parse().map(|f| Self(Token::Float(f)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_idiv() {
        let (tok, rest) = expr_token().parse(&b"//"[..]).unwrap();
        assert_eq!(tok, Token::Idiv);
        assert!(rest.is_empty());
    }

    #[test]
    fn parse_pow_alias() {
        let (tok, rest) = expr_token().parse(&b"**"[..]).unwrap();
        assert_eq!(tok, Token::Pow);
        assert!(rest.is_empty());
    }

    #[test]
    fn parse_integer() {
        let (tok, rest) = expr_token().parse(&b"123"[..]).unwrap();
        assert_eq!(tok, Token::Integer(123));
        assert!(rest.is_empty());
    }

    #[test]
    fn parse_float() {
        let (tok, rest) = expr_token().parse(&b"123.45"[..]).unwrap();
        assert_eq!(tok, Token::Float(123.45));
        assert!(rest.is_empty());
    }

    #[test]
    fn parse_exponent() {
        let (tok, rest) = expr_token().parse(&b"1e3"[..]).unwrap();
        assert_eq!(tok, Token::Float(1000.0));
        assert!(rest.is_empty());
        let (tok, _) = expr_token().parse(&b"2.5E-1"[..]).unwrap();
        assert_eq!(tok, Token::Float(0.25));
        let (tok, _) = expr_token().parse(&b"1e+2"[..]).unwrap();
        assert_eq!(tok, Token::Float(100.0));
    }

    #[test]
    fn parse_dot_forms() {
        let (tok, rest) = expr_token().parse(&b".5"[..]).unwrap();
        assert_eq!(tok, Token::Float(0.5));
        assert!(rest.is_empty());
        let (tok, rest) = expr_token().parse(&b"5."[..]).unwrap();
        assert_eq!(tok, Token::Float(5.0));
        assert!(rest.is_empty());
    }

    #[test]
    fn parse_hex() {
        let (tok, rest) = expr_token().parse(&b"0x10"[..]).unwrap();
        assert_eq!(tok, Token::Integer(16));
        assert!(rest.is_empty());
        let (tok, _) = expr_token().parse(&b"0XfF"[..]).unwrap();
        assert_eq!(tok, Token::Integer(255));
        let (tok, _) = expr_token().parse(&b"0xffffffffffffffff"[..]).unwrap();
        assert_eq!(tok, Token::Integer(-1));
    }

    #[test]
    fn large_integer_becomes_float() {
        let (tok, rest) = expr_token().parse(&b"9223372036854775808"[..]).unwrap();
        assert_eq!(tok, Token::Float(9223372036854775808.0));
        assert!(rest.is_empty());
        let (tok, _) = expr_token().parse(&b"9223372036854775807"[..]).unwrap();
        assert_eq!(tok, Token::Integer(i64::MAX));
    }

    #[test]
    fn zero_is_not_hex() {
        let mut lex = Lex::new(&b"0 + 0x1"[..]);
        assert_eq!(lex.next().unwrap(), Token::Integer(0));
        assert_eq!(lex.next().unwrap(), Token::Add);
        assert_eq!(lex.next().unwrap(), Token::Integer(1));
    }

    #[test]
    fn skips_leading_spaces() {
        let (tok, rest) = expr_token().parse(&b"   7 "[..]).unwrap();
        assert_eq!(tok, Token::Integer(7));
        let (tok, rest) = expr_token().parse(rest).unwrap();
        assert_eq!(tok, Token::Eos);
        assert!(rest.is_empty());
    }

    #[test]
    fn lex_sum() {
        let mut lex = Lex::new(&b"4+4"[..]);
        assert_eq!(lex.next().unwrap(), Token::Integer(4));
        assert_eq!(lex.peek().unwrap(), &Token::Add);
        assert_eq!(lex.next().unwrap(), Token::Add);
        assert_eq!(lex.next().unwrap(), Token::Integer(4));
        assert_eq!(lex.next().unwrap(), Token::Eos);
    }

    #[test]
    fn rejects_unknown_character() {
        let mut lex = Lex::new(&b"4 $ 4"[..]);
        assert_eq!(lex.next().unwrap(), Token::Integer(4));
        assert!(lex.next().is_err());
    }
}
