use anyhow::bail;

use crate::{
    bytecode::ByteCode,
    lex::{Lex, Token},
    value::Value,
};

const UNARY_PRI: i32 = 12;

/// Nesting limit for parentheses, unary operators and right operands.
const MAX_DEPTH: usize = 200;

#[derive(Debug)]
pub struct ParseProto {
    pub constants: Vec<Value>,
    pub byte_codes: Vec<ByteCode>,
}

impl ParseProto {
    /// Compiles one arithmetic expression. The result lands in register 0.
    pub fn load(src: &str) -> anyhow::Result<Self> {
        let mut proto = Self {
            constants: Vec::new(),
            byte_codes: Vec::new(),
        };
        let mut lex = Lex::new(src.as_bytes());

        if lex.peek()? == &Token::Eos {
            bail!("empty expression");
        }
        proto.subexp(&mut lex, 0, 0, 0)?;

        match lex.next()? {
            Token::Eos => {}
            t => bail!("unexpected token after expression: {t:?}"),
        }

        tracing::trace!(constants = ?proto.constants, byte_codes = ?proto.byte_codes, "compiled");
        Ok(proto)
    }

    fn subexp(
        &mut self,
        lex: &mut Lex<&[u8]>,
        dst: usize,
        limit: i32,
        depth: usize,
    ) -> anyhow::Result<()> {
        if depth > MAX_DEPTH || dst > u8::MAX as usize - 1 {
            bail!("expression too complex");
        }

        match lex.peek()? {
            Token::Sub => {
                lex.next()?;
                self.subexp(lex, dst, UNARY_PRI, depth + 1)?;
                self.byte_codes.push(ByteCode::Neg(dst as u8, dst as u8));
            }
            Token::Add => {
                lex.next()?;
                self.subexp(lex, dst, UNARY_PRI, depth + 1)?;
            }
            _ => self.simple(lex, dst, depth)?,
        }

        loop {
            let (left, right) = binop_pri(lex.peek()?);
            if left <= limit {
                return Ok(());
            }
            let op = lex.next()?;
            self.subexp(lex, dst + 1, right, depth + 1)?;

            let (d, a, b) = (dst as u8, dst as u8, dst as u8 + 1);
            let code = match op {
                Token::Add => ByteCode::Add(d, a, b),
                Token::Sub => ByteCode::Sub(d, a, b),
                Token::Mul => ByteCode::Mul(d, a, b),
                Token::Div => ByteCode::Div(d, a, b),
                Token::Idiv => ByteCode::Idiv(d, a, b),
                Token::Mod => ByteCode::Mod(d, a, b),
                Token::Pow => ByteCode::Pow(d, a, b),
                t => bail!("invalid operator: {t:?}"),
            };
            self.byte_codes.push(code);
        }
    }

    fn simple(&mut self, lex: &mut Lex<&[u8]>, dst: usize, depth: usize) -> anyhow::Result<()> {
        let code = match lex.next()? {
            Token::Integer(i) => {
                if let Ok(ii) = i16::try_from(i) {
                    ByteCode::LoadInt(dst as u8, ii)
                } else {
                    self.load_const(dst, i.into())?
                }
            }
            Token::Float(f) => self.load_const(dst, f.into())?,
            Token::ParL => {
                self.subexp(lex, dst, 0, depth + 1)?;
                if lex.next()? != Token::ParR {
                    bail!("expected `)`");
                }
                return Ok(());
            }
            t => bail!("unexpected token: {t:?}"),
        };
        self.byte_codes.push(code);
        Ok(())
    }

    fn add_const(&mut self, c: Value) -> anyhow::Result<u8> {
        let i = self.constants.iter().position(|v| v == &c).unwrap_or_else(|| {
            self.constants.push(c);
            self.constants.len() - 1
        });
        match u8::try_from(i) {
            Ok(i) => Ok(i),
            Err(_) => bail!("too many constants"),
        }
    }

    fn load_const(&mut self, dst: usize, c: Value) -> anyhow::Result<ByteCode> {
        Ok(ByteCode::LoadConst(dst as u8, self.add_const(c)?))
    }
}

/// Left and right binding priorities, as in Lua's `subexpr`.
fn binop_pri(t: &Token) -> (i32, i32) {
    match t {
        Token::Add | Token::Sub => (10, 10),
        Token::Mul | Token::Div | Token::Idiv | Token::Mod => (11, 11),
        Token::Pow => (14, 13),
        _ => (-1, -1),
    }
}
