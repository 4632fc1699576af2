//! Manifest Loader
//!
//! Turns mod source text into a [`ModManifest`]. A mod chunk must return a
//! table shaped like this:
//!
//! ```lua
//! return {
//!     id = "example-mod",              -- required
//!     name = "Example Mod",            -- default: title-cased id
//!     description = "An example mod.", -- default: "No description provided."
//!     version = "1.0",                 -- default: "0.0"
//!     author = "Your Name",            -- default: "Anonymous"
//!     depends = {},                    -- ids of mods that must already be loaded
//!     doMenu = true,                   -- give the mod its own menu handle
//!     main = function(self, api) end,  -- required entry point
//!     cleanupFuncs = { function() end },
//! }
//! ```
//!
//! Loading never touches the registry and never fires events.

use mlua::{Function, Table, Value};

use super::ModManifest;
use crate::engine::LuaEngine;
use crate::error::{ModError, ModResult};

pub const DEFAULT_DESCRIPTION: &str = "No description provided.";
pub const DEFAULT_VERSION: &str = "0.0";
pub const DEFAULT_AUTHOR: &str = "Anonymous";

pub struct ManifestLoader;

impl ManifestLoader {
    /// Evaluate `source` in an isolated scope and parse the table it returns.
    pub fn load(engine: &LuaEngine, chunk_name: &str, source: &str) -> ModResult<ModManifest> {
        let value = engine
            .evaluate(chunk_name, source)
            .map_err(ModError::ManifestEvaluation)?;
        match value {
            Value::Table(table) => Self::from_table(table),
            other => Err(ModError::InvalidManifestShape {
                found: other.type_name().to_string(),
            }),
        }
    }

    /// Parse an already evaluated manifest table.
    pub fn from_table(table: Table) -> ModResult<ModManifest> {
        let id = match table.get::<Value>("id")? {
            Value::String(s) => s.to_str()?.to_string(),
            _ => String::new(),
        };
        if id.trim().is_empty() {
            return Err(ModError::MissingId);
        }

        let entry_point = match table.get::<Value>("main")? {
            Value::Function(f) => f,
            _ => return Err(ModError::MissingEntryPoint),
        };

        let name = optional_string(&table, "name")?.unwrap_or_else(|| display_name(&id));
        let description =
            optional_string(&table, "description")?.unwrap_or_else(|| DEFAULT_DESCRIPTION.into());
        let version = optional_string(&table, "version")?.unwrap_or_else(|| DEFAULT_VERSION.into());
        let author = optional_string(&table, "author")?.unwrap_or_else(|| DEFAULT_AUTHOR.into());
        let dependencies = string_list(&table, "depends")?;
        let wants_menu = match table.get::<Value>("doMenu")? {
            Value::Nil => false,
            Value::Boolean(b) => b,
            other => return Err(invalid("doMenu", "a boolean", &other)),
        };
        let cleanup_actions = function_list(&table, "cleanupFuncs")?;

        Ok(ModManifest {
            id,
            name,
            description,
            version,
            author,
            dependencies,
            wants_menu,
            entry_point,
            cleanup_actions,
            module: table,
        })
    }
}

/// Human-readable name derived from an id: separators become spaces and each
/// word is capitalised, so `example-mod` reads as `Example Mod`.
pub fn display_name(id: &str) -> String {
    id.split(|c: char| c.is_whitespace() || matches!(c, '-' | '_' | '.' | ':' | '/'))
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn invalid(field: &'static str, expected: &'static str, found: &Value) -> ModError {
    ModError::InvalidField {
        field,
        expected,
        found: found.type_name().to_string(),
    }
}

fn optional_string(table: &Table, field: &'static str) -> ModResult<Option<String>> {
    match table.get::<Value>(field)? {
        Value::Nil => Ok(None),
        Value::String(s) => Ok(Some(s.to_str()?.to_string())),
        // `version = 1.2` is common enough to accept.
        Value::Integer(i) => Ok(Some(i.to_string())),
        Value::Number(n) => Ok(Some(n.to_string())),
        other => Err(invalid(field, "a string", &other)),
    }
}

fn string_list(table: &Table, field: &'static str) -> ModResult<Vec<String>> {
    let list = match table.get::<Value>(field)? {
        Value::Nil => return Ok(Vec::new()),
        Value::Table(list) => list,
        other => return Err(invalid(field, "a list of mod ids", &other)),
    };
    let mut out = Vec::new();
    for item in list.sequence_values::<Value>() {
        match item? {
            Value::String(s) => out.push(s.to_str()?.to_string()),
            other => return Err(invalid(field, "a list of mod ids", &other)),
        }
    }
    Ok(out)
}

fn function_list(table: &Table, field: &'static str) -> ModResult<Vec<Function>> {
    let list = match table.get::<Value>(field)? {
        Value::Nil => return Ok(Vec::new()),
        Value::Table(list) => list,
        other => return Err(invalid(field, "a list of functions", &other)),
    };
    let mut out = Vec::new();
    for item in list.sequence_values::<Value>() {
        match item? {
            Value::Function(f) => out.push(f),
            other => return Err(invalid(field, "a list of functions", &other)),
        }
    }
    Ok(out)
}
