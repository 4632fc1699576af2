//! Conversions between JSON event payloads and Lua values.
//!
//! Event details cross the host/mod boundary in both directions: the host
//! emits JSON details that listeners read as Lua tables, and mods emitting
//! events through their API hand in Lua values that the host stores as JSON.

use mlua::{Lua, Table, Value};

/// Nested tables deeper than this are rejected; Lua tables may be cyclic.
const MAX_DEPTH: usize = 64;

pub fn json_to_lua(lua: &Lua, value: &serde_json::Value) -> mlua::Result<Value> {
    Ok(match value {
        serde_json::Value::Null => Value::Nil,
        serde_json::Value::Bool(b) => Value::Boolean(*b),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => Value::Integer(i),
            None => n.as_f64().map(Value::Number).unwrap_or(Value::Nil),
        },
        serde_json::Value::String(s) => Value::String(lua.create_string(s)?),
        serde_json::Value::Array(items) => {
            let table = lua.create_table_with_capacity(items.len(), 0)?;
            for item in items {
                table.raw_push(json_to_lua(lua, item)?)?;
            }
            Value::Table(table)
        }
        serde_json::Value::Object(map) => {
            let table = lua.create_table_with_capacity(0, map.len())?;
            for (key, item) in map {
                table.raw_set(key.as_str(), json_to_lua(lua, item)?)?;
            }
            Value::Table(table)
        }
    })
}

pub fn lua_to_json(value: &Value) -> mlua::Result<serde_json::Value> {
    lua_to_json_at(value, 0)
}

fn lua_to_json_at(value: &Value, depth: usize) -> mlua::Result<serde_json::Value> {
    match value {
        Value::Nil => Ok(serde_json::Value::Null),
        Value::Boolean(b) => Ok(serde_json::Value::Bool(*b)),
        Value::Integer(i) => Ok(serde_json::json!(*i)),
        Value::Number(f) => Ok(serde_json::json!(*f)),
        Value::String(s) => Ok(serde_json::Value::String(s.to_str()?.to_string())),
        Value::Table(table) => {
            if depth >= MAX_DEPTH {
                return Err(mlua::Error::runtime(
                    "table nesting too deep to convert (cyclic table?)",
                ));
            }
            table_to_json(table, depth + 1)
        }
        other => Err(mlua::Error::runtime(format!(
            "cannot convert a Lua {} into event data",
            other.type_name()
        ))),
    }
}

fn table_to_json(table: &Table, depth: usize) -> mlua::Result<serde_json::Value> {
    let len = table.raw_len();
    let mut pair_count = 0usize;
    for pair in table.clone().pairs::<Value, Value>() {
        pair?;
        pair_count += 1;
    }

    // A table is a sequence when every key is one of 1..=len.
    if len > 0 && pair_count == len {
        let mut items = Vec::with_capacity(len);
        for item in table.clone().sequence_values::<Value>() {
            items.push(lua_to_json_at(&item?, depth)?);
        }
        return Ok(serde_json::Value::Array(items));
    }

    let mut map = serde_json::Map::new();
    for pair in table.clone().pairs::<Value, Value>() {
        let (key, item) = pair?;
        let key = match key {
            Value::String(s) => s.to_str()?.to_string(),
            Value::Integer(i) => i.to_string(),
            other => {
                log::debug!("skipping {} key in event data", other.type_name());
                continue;
            }
        };
        map.insert(key, lua_to_json_at(&item, depth)?);
    }
    Ok(serde_json::Value::Object(map))
}
