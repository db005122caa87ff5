//! The interpreter bridge: one embedded Lua session and the boundary calls
//! made against the zencode engine living inside it.
//!
//! Calls are valid in one order only: [`Session::new`],
//! [`Session::load_modules`], [`Session::expose`], then [`Session::begin`],
//! [`Session::parse`] and [`Session::run`]. The bridge refuses to touch the
//! engine before its modules are loaded; ordering between `begin`, `parse`
//! and `run` is enforced by the engine itself.

use std::path::PathBuf;

use anyhow::{bail, Context};
use mlua::{FromLua, Function, IntoLuaMulti, Lua, MultiValue, Table};
use tracing::{debug, info};

use crate::{shim, value::Value};

#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Directories prepended to `package.path`.
    pub module_paths: Vec<PathBuf>,
    pub engine_module: String,
    pub host_module: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            module_paths: Vec::new(),
            engine_module: "zencode".into(),
            host_module: "host".into(),
        }
    }
}

struct Modules {
    engine: Table,
    host: Table,
}

pub struct Session {
    lua: Lua,
    config: SessionConfig,
    modules: Option<Modules>,
}

impl Session {
    pub fn new(config: SessionConfig) -> anyhow::Result<Self> {
        let lua = Lua::new();

        if !config.module_paths.is_empty() {
            let package: Table = lua.globals().get("package")?;
            let path: String = package.get("path")?;
            let mut search = String::new();
            for dir in &config.module_paths {
                let Some(dir) = dir.to_str() else {
                    bail!("module path {} is not valid UTF-8", dir.display());
                };
                if dir.contains([';', '?']) {
                    bail!("module path `{dir}` cannot contain `;` or `?`");
                }
                search.push_str(&format!("{dir}/?.lua;{dir}/?/init.lua;"));
            }
            search.push_str(&path);
            debug!(path = %search, "module search path");
            package.set("path", search)?;
        }

        shim::register(&lua, &config.host_module)
            .with_context(|| format!("failed to register host module `{}`", config.host_module))?;

        info!("embedded session initialized");
        Ok(Self {
            lua,
            config,
            modules: None,
        })
    }

    pub fn load_modules(&mut self) -> anyhow::Result<()> {
        let engine = self.require(&self.config.engine_module)?;
        let host = self.require(&self.config.host_module)?;
        self.lua
            .globals()
            .set(self.config.engine_module.as_str(), engine.clone())?;
        info!(engine = %self.config.engine_module, host = %self.config.host_module, "modules loaded");
        self.modules = Some(Modules { engine, host });
        Ok(())
    }

    /// Evaluates `expr` through the host module, publishes the result as
    /// global `name` and returns the copy held by the host.
    pub fn expose(&self, name: &str, expr: &str) -> anyhow::Result<Value> {
        let modules = self.modules()?;
        let eval: Function = modules.host.get("eval")?;
        let value: Value = eval
            .call(expr)
            .with_context(|| format!("host evaluation of `{expr}` failed"))?;
        self.lua.globals().set(name, value)?;
        info!(%name, %value, "exposed host value");
        Ok(value)
    }

    pub fn begin(&self, level: i64) -> anyhow::Result<()> {
        self.call_engine("begin", level)
    }

    pub fn parse(&self, script: &str) -> anyhow::Result<()> {
        self.call_engine("parse", script)
    }

    /// Runs the parsed script with empty keys and data tables.
    pub fn run(&self) -> anyhow::Result<()> {
        let keys = self.lua.create_table()?;
        let data = self.lua.create_table()?;
        self.call_engine("run", (keys, data))
    }

    /// Executes a chunk and returns every value it produced.
    pub fn eval(&self, chunk: &str) -> anyhow::Result<MultiValue> {
        Ok(self.lua.load(chunk).set_name("=eval").eval::<MultiValue>()?)
    }

    pub fn global<T: FromLua>(&self, name: &str) -> anyhow::Result<T> {
        Ok(self.lua.globals().get(name)?)
    }

    fn require(&self, name: &str) -> anyhow::Result<Table> {
        let require: Function = self.lua.globals().get("require")?;
        require
            .call(name)
            .with_context(|| format!("failed to load module `{name}`"))
    }

    fn modules(&self) -> anyhow::Result<&Modules> {
        match &self.modules {
            Some(m) => Ok(m),
            None => bail!("engine modules are not loaded"),
        }
    }

    fn call_engine(&self, method: &str, args: impl IntoLuaMulti) -> anyhow::Result<()> {
        let engine = &self.modules()?.engine;
        let f: Function = engine
            .get(method)
            .with_context(|| format!("`{}` has no `{method}` function", self.config.engine_module))?;
        // method call: the engine table is `self`
        let args = std::iter::once(mlua::Value::Table(engine.clone()))
            .chain(args.into_lua_multi(&self.lua)?)
            .collect::<MultiValue>();
        let ret: MultiValue = f
            .call(args)
            .with_context(|| format!("{}:{method} failed", self.config.engine_module))?;
        debug!(%method, returned = ret.len(), "engine call");
        Ok(())
    }
}
