use std::fmt;

use anyhow::bail;
use mlua::{FromLua, IntoLua, Lua};

/// A number produced on the host side. Arithmetic follows Lua 5.4 so the
/// value reads back the same once it crosses into the embedded session.
#[derive(Clone, Copy, PartialEq)]
pub enum Value {
    Integer(i64),
    Float(f64),
}

impl Value {
    pub fn as_float(self) -> f64 {
        match self {
            Self::Integer(i) => i as f64,
            Self::Float(f) => f,
        }
    }

    pub fn add(self, rhs: Self) -> Self {
        match (self, rhs) {
            (Self::Integer(a), Self::Integer(b)) => Self::Integer(a.wrapping_add(b)),
            (a, b) => Self::Float(a.as_float() + b.as_float()),
        }
    }

    pub fn sub(self, rhs: Self) -> Self {
        match (self, rhs) {
            (Self::Integer(a), Self::Integer(b)) => Self::Integer(a.wrapping_sub(b)),
            (a, b) => Self::Float(a.as_float() - b.as_float()),
        }
    }

    pub fn mul(self, rhs: Self) -> Self {
        match (self, rhs) {
            (Self::Integer(a), Self::Integer(b)) => Self::Integer(a.wrapping_mul(b)),
            (a, b) => Self::Float(a.as_float() * b.as_float()),
        }
    }

    pub fn div(self, rhs: Self) -> Self {
        Self::Float(self.as_float() / rhs.as_float())
    }

    pub fn idiv(self, rhs: Self) -> anyhow::Result<Self> {
        match (self, rhs) {
            (Self::Integer(_), Self::Integer(0)) => bail!("attempt to perform 'n//0'"),
            (Self::Integer(a), Self::Integer(b)) => {
                let q = a.wrapping_div(b);
                // round toward negative infinity
                if a.wrapping_rem(b) != 0 && (a < 0) != (b < 0) {
                    Ok(Self::Integer(q - 1))
                } else {
                    Ok(Self::Integer(q))
                }
            }
            (a, b) => Ok(Self::Float((a.as_float() / b.as_float()).floor())),
        }
    }

    pub fn rem(self, rhs: Self) -> anyhow::Result<Self> {
        match (self, rhs) {
            (Self::Integer(_), Self::Integer(0)) => bail!("attempt to perform 'n%0'"),
            (Self::Integer(a), Self::Integer(b)) => {
                let r = a.wrapping_rem(b);
                if r != 0 && (r < 0) != (b < 0) {
                    Ok(Self::Integer(r + b))
                } else {
                    Ok(Self::Integer(r))
                }
            }
            (a, b) => {
                let (a, b) = (a.as_float(), b.as_float());
                let r = a % b;
                if r != 0.0 && (r < 0.0) != (b < 0.0) {
                    Ok(Self::Float(r + b))
                } else {
                    Ok(Self::Float(r))
                }
            }
        }
    }

    pub fn pow(self, rhs: Self) -> Self {
        Self::Float(self.as_float().powf(rhs.as_float()))
    }

    pub fn neg(self) -> Self {
        match self {
            Self::Integer(i) => Self::Integer(i.wrapping_neg()),
            Self::Float(f) => Self::Float(-f),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(i) => write!(f, "{i}"),
            Self::Float(n) => f.write_str(&lua_number(*n)),
        }
    }
}

/// Formats a float the way Lua's `tostring` does: `%.14g`, plus `.0` when
/// the result would read back as an integer.
fn lua_number(n: f64) -> String {
    if n.is_nan() {
        return if n.is_sign_negative() { "-nan" } else { "nan" }.into();
    }
    if n.is_infinite() {
        return if n < 0.0 { "-inf" } else { "inf" }.into();
    }

    // 14 significant digits, rounded, decides the exponent
    let sci = format!("{n:.13e}");
    let (mantissa, exp) = sci.split_once('e').unwrap_or((&sci, "0"));
    let exp: i32 = exp.parse().unwrap_or(0);

    let mut s = if !(-4..14).contains(&exp) {
        let sign = if exp < 0 { '-' } else { '+' };
        format!("{}e{sign}{:02}", trim_fraction(mantissa), exp.abs())
    } else {
        let prec = (13 - exp) as usize;
        trim_fraction(&format!("{n:.prec$}")).to_owned()
    };

    if s.bytes().all(|c| c == b'-' || c.is_ascii_digit()) {
        s.push_str(".0");
    }
    s
}

fn trim_fraction(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Integer(n)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Float(n)
    }
}

impl IntoLua for Value {
    fn into_lua(self, _: &Lua) -> mlua::Result<mlua::Value> {
        Ok(match self {
            Self::Integer(i) => mlua::Value::Integer(i),
            Self::Float(f) => mlua::Value::Number(f),
        })
    }
}

impl FromLua for Value {
    fn from_lua(value: mlua::Value, _: &Lua) -> mlua::Result<Self> {
        match value {
            mlua::Value::Integer(i) => Ok(Self::Integer(i)),
            mlua::Value::Number(f) => Ok(Self::Float(f)),
            v => Err(mlua::Error::runtime(format!(
                "expected a number, got {}",
                v.type_name()
            ))),
        }
    }
}
