//! Host-interop module for the embedded session.
//!
//! Lua code reaches the host through `require(<name>)`, which yields a table
//! with a single `eval(expr)` function backed by [`crate::vm::eval`].

use mlua::{Lua, MultiValue, Table};

use crate::{value::Value, vm};

/// Installs the module loader in `package.preload[name]`.
pub fn register(lua: &Lua, name: &str) -> mlua::Result<()> {
    let package: Table = lua.globals().get("package")?;
    let preload: Table = package.get("preload")?;
    let loader = lua.create_function(|lua, _: MultiValue| module(lua))?;
    preload.set(name, loader)
}

fn module(lua: &Lua) -> mlua::Result<Table> {
    let t = lua.create_table()?;
    t.set(
        "eval",
        lua.create_function(|_, expr: String| -> mlua::Result<Value> {
            // the full chain, since Lua only keeps the message
            let v = vm::eval(&expr).map_err(|e| mlua::Error::external(format!("{e:#}")))?;
            tracing::debug!(%expr, value = %v, "host eval");
            Ok(v)
        })?,
    )?;
    Ok(t)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lua_with_shim() -> Lua {
        let lua = Lua::new();
        register(&lua, "host").unwrap();
        lua
    }

    #[test]
    fn eval_from_lua() {
        let lua = lua_with_shim();
        let n: i64 = lua.load("return require('host').eval('4+4')").eval().unwrap();
        assert_eq!(n, 8);
    }

    #[test]
    fn floats_cross_as_numbers() {
        let lua = lua_with_shim();
        let is_float: bool = lua
            .load("return math.type(require('host').eval('1/2')) == 'float'")
            .eval()
            .unwrap();
        assert!(is_float);
    }

    #[test]
    fn bad_expression_raises() {
        let lua = lua_with_shim();
        let err = lua
            .load("return require('host').eval('4 +')")
            .eval::<i64>()
            .unwrap_err();
        assert!(format!("{err} {err:?}").contains("invalid expression"));
    }

    #[test]
    fn nesting_error_reaches_lua() {
        let lua = lua_with_shim();
        let msg: String = lua
            .load("local ok, err = pcall(require('host').eval, string.rep('(', 5000) .. '1' .. string.rep(')', 5000)) return tostring(err)")
            .eval()
            .unwrap();
        assert!(msg.contains("too complex"), "{msg}");
    }

    #[test]
    fn module_is_cached() {
        let lua = lua_with_shim();
        let same: bool = lua
            .load("return require('host') == require('host')")
            .eval()
            .unwrap();
        assert!(same);
    }
}
