/// Register instructions. Binary operations read `(dst, lhs, rhs)`.
#[derive(Debug, PartialEq)]
pub enum ByteCode {
    LoadConst(u8, u8),
    LoadInt(u8, i16),

    Neg(u8, u8),
    Add(u8, u8, u8),
    Sub(u8, u8, u8),
    Mul(u8, u8, u8),
    Div(u8, u8, u8),
    Idiv(u8, u8, u8),
    Mod(u8, u8, u8),
    Pow(u8, u8, u8),
}
