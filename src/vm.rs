use anyhow::Context;

use crate::{bytecode::ByteCode, parse::ParseProto, value::Value};

#[derive(Debug, Default)]
pub struct ExeState {
    stack: Vec<Value>,
}

impl ExeState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn execute(&mut self, proto: &ParseProto) -> anyhow::Result<Value> {
        for code in &proto.byte_codes {
            match *code {
                ByteCode::LoadConst(dst, c) => {
                    let v = proto.constants[c as usize];
                    self.set_stack(dst, v);
                }
                ByteCode::LoadInt(dst, i) => self.set_stack(dst, Value::Integer(i as i64)),
                ByteCode::Neg(dst, src) => self.set_stack(dst, self.get(src)?.neg()),
                ByteCode::Add(dst, a, b) => self.set_stack(dst, self.get(a)?.add(self.get(b)?)),
                ByteCode::Sub(dst, a, b) => self.set_stack(dst, self.get(a)?.sub(self.get(b)?)),
                ByteCode::Mul(dst, a, b) => self.set_stack(dst, self.get(a)?.mul(self.get(b)?)),
                ByteCode::Div(dst, a, b) => self.set_stack(dst, self.get(a)?.div(self.get(b)?)),
                ByteCode::Idiv(dst, a, b) => {
                    let v = self.get(a)?.idiv(self.get(b)?)?;
                    self.set_stack(dst, v);
                }
                ByteCode::Mod(dst, a, b) => {
                    let v = self.get(a)?.rem(self.get(b)?)?;
                    self.set_stack(dst, v);
                }
                ByteCode::Pow(dst, a, b) => self.set_stack(dst, self.get(a)?.pow(self.get(b)?)),
            }
        }
        self.get(0)
    }

    fn get(&self, src: u8) -> anyhow::Result<Value> {
        self.stack
            .get(src as usize)
            .copied()
            .with_context(|| format!("read of empty register {src}"))
    }

    fn set_stack(&mut self, dst: u8, v: Value) {
        let dst = dst as usize;
        if self.stack.len() <= dst {
            self.stack.resize(dst + 1, Value::Integer(0));
        }
        self.stack[dst] = v;
    }
}

/// Compiles and runs `src`, the entry point the host shim uses.
pub fn eval(src: &str) -> anyhow::Result<Value> {
    let proto = ParseProto::load(src).with_context(|| format!("invalid expression `{src}`"))?;
    ExeState::new()
        .execute(&proto)
        .with_context(|| format!("failed to evaluate `{src}`"))
}
