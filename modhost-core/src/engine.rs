use mlua::{Lua, Table, Value};

/// The Lua state every mod runs in.
///
/// Mods share one interpreter so that values handed between them through the
/// extra-API table stay usable. Each mod chunk gets its own environment table
/// so top-level globals a mod defines do not leak into other mods.
pub struct LuaEngine {
    lua: Lua,
    isolate_globals: bool,
}

impl LuaEngine {
    pub fn new() -> Self {
        Self::with_isolation(true)
    }

    pub fn with_isolation(isolate_globals: bool) -> Self {
        Self {
            lua: Lua::new(),
            isolate_globals,
        }
    }

    /// Evaluate a chunk and return whatever it produced.
    pub fn evaluate(&self, chunk_name: &str, source: &str) -> mlua::Result<Value> {
        let chunk = self.lua.load(source).set_name(chunk_name);
        if self.isolate_globals {
            chunk.set_environment(isolated_environment(&self.lua)?).eval()
        } else {
            chunk.eval()
        }
    }

    pub fn set_package_path(&self, path: &str) -> mlua::Result<()> {
        let package: Table = self.lua.globals().get("package")?;
        package.set("path", path)
    }

    pub fn lua(&self) -> &Lua {
        &self.lua
    }
}

impl Default for LuaEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// A fresh environment whose reads fall back to the shared globals and whose
/// writes stay local.
pub fn isolated_environment(lua: &Lua) -> mlua::Result<Table> {
    let env = lua.create_table()?;
    let meta = lua.create_table()?;
    meta.set("__index", lua.globals())?;
    env.set_metatable(Some(meta));
    Ok(env)
}
