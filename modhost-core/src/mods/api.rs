//! Capability API
//!
//! Every mod's `main` receives its own API object. Methods are called with
//! Lua's method syntax:
//!
//! | Method | Effect |
//! |--------|--------|
//! | `api:inform(text, title)` | titled message through the host (title defaults to "Information") |
//! | `api:showMsg(text)` | short host status message |
//! | `api:addApi(name, value)` | publish `value` to this and every later API object |
//! | `api:registerMenuHook(name, fn)` | contribute `fn(menu)` to menus named `name` |
//! | `api:addEventListener(name, fn)` | receive host events named `name` |
//! | `api:removeEventListener(name, fn)` | undo one `addEventListener` |
//! | `api:loadMod(source)` | load another mod, returns its id |
//! | `api:unloadMod(id)` | unload a mod |
//! | `api:emit(name, cancelable, detail)` | fire an event at all mods, returns `delivered` |
//! | `api:findMod(id)` | info table of a loaded mod, or nil |
//! | `api:listMods()` | ids of loaded mods in registry order |
//!
//! `api.modId` is the owning mod's id. Any other key is looked up among the
//! extra APIs that existed when this object was built, plus those this object
//! published itself. A name published twice keeps the newer value.

use mlua::{Function, LuaSerdeExt, MetaMethod, UserData, UserDataFields, UserDataMethods, Value};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, Weak};

use super::hooks::MenuHook;
use super::registry::ModRegistry;
use super::LoadedMod;
use crate::convert::lua_to_json;
use crate::error::lock;
use crate::messaging::HostMessenger;

const DEFAULT_INFORM_TITLE: &str = "Information";

/// Process-wide table of services published by mods through `addApi`.
///
/// Starts empty, only grows, and is shared by every API object the factory
/// builds. Objects copy the table when they are built, so a later `addApi`
/// is invisible to them.
#[derive(Debug, Clone, Default)]
pub struct ExtraApiTable(Arc<Mutex<BTreeMap<String, Value>>>);

impl ExtraApiTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, name: &str, value: Value) {
        if lock(&self.0, "extra api").insert(name.to_string(), value).is_some() {
            log::debug!("extra api \"{}\" replaced", name);
        }
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        lock(&self.0, "extra api").get(name).cloned()
    }

    pub fn names(&self) -> Vec<String> {
        lock(&self.0, "extra api").keys().cloned().collect()
    }

    pub fn snapshot(&self) -> BTreeMap<String, Value> {
        lock(&self.0, "extra api").clone()
    }

    pub fn len(&self) -> usize {
        lock(&self.0, "extra api").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The object a mod's `main` receives.
pub struct CapabilityApi {
    mod_id: String,
    owner: Weak<LoadedMod>,
    registry: Weak<ModRegistry>,
    messenger: Arc<dyn HostMessenger>,
    shared: ExtraApiTable,
    extras: Mutex<BTreeMap<String, Value>>,
}

impl CapabilityApi {
    pub fn mod_id(&self) -> &str {
        &self.mod_id
    }

    /// Extra API visible on this object.
    pub fn extra(&self, name: &str) -> Option<Value> {
        lock(&self.extras, "api extras").get(name).cloned()
    }

    pub fn inform(&self, text: &str, title: Option<&str>) {
        self.messenger
            .inform(title.unwrap_or(DEFAULT_INFORM_TITLE), text);
    }

    pub fn add_api(&self, name: &str, value: Value) {
        self.shared.insert(name, value.clone());
        lock(&self.extras, "api extras").insert(name.to_string(), value);
    }

    fn owner(&self) -> mlua::Result<Arc<LoadedMod>> {
        self.owner.upgrade().ok_or_else(|| {
            mlua::Error::runtime(format!("mod \"{}\" is no longer loaded", self.mod_id))
        })
    }

    fn registry(&self) -> mlua::Result<Arc<ModRegistry>> {
        self.registry
            .upgrade()
            .ok_or_else(|| mlua::Error::runtime("mod host has shut down"))
    }
}

impl UserData for CapabilityApi {
    fn add_fields<F: UserDataFields<Self>>(fields: &mut F) {
        fields.add_field_method_get("modId", |_, this| Ok(this.mod_id.clone()));
    }

    fn add_methods<M: UserDataMethods<Self>>(methods: &mut M) {
        methods.add_method("inform", |_, this, (text, title): (String, Option<String>)| {
            this.inform(&text, title.as_deref());
            Ok(())
        });

        methods.add_method("showMsg", |_, this, text: String| {
            this.messenger.show_message(&text);
            Ok(())
        });

        methods.add_method("addApi", |_, this, (name, value): (String, Value)| {
            this.add_api(&name, value);
            Ok(())
        });

        methods.add_method(
            "registerMenuHook",
            |_, this, (name, func): (String, Function)| {
                this.owner()?
                    .add_menu_hook(MenuHook::new(&this.mod_id, &name, func));
                Ok(())
            },
        );

        methods.add_method(
            "addEventListener",
            |_, this, (name, func): (String, Function)| {
                this.owner()?.add_listener(&name, func);
                Ok(())
            },
        );

        methods.add_method(
            "removeEventListener",
            |_, this, (name, func): (String, Function)| {
                Ok(this.owner()?.remove_listener(&name, &func))
            },
        );

        methods.add_method(
            "loadMod",
            |_, this, (source, chunk_name): (String, Option<String>)| {
                let name = chunk_name.unwrap_or_else(|| format!("loaded by {}", this.mod_id));
                let loaded = this.registry()?.load_source(&name, &source)?;
                Ok(loaded.id().to_string())
            },
        );

        methods.add_method("unloadMod", |_, this, id: String| {
            this.registry()?.unload(&id)?;
            Ok(())
        });

        methods.add_method(
            "emit",
            |_, this, (name, cancelable, detail): (String, Option<bool>, Value)| {
                let detail = match detail {
                    Value::Nil => None,
                    other => Some(lua_to_json(&other)?),
                };
                Ok(this
                    .registry()?
                    .emit(&name, cancelable.unwrap_or(false), detail)?)
            },
        );

        methods.add_method("findMod", |lua, this, id: String| {
            match this.registry()?.find(&id) {
                Some(m) => lua.to_value(&m.info()),
                None => Ok(Value::Nil),
            }
        });

        methods.add_method("listMods", |_, this, ()| Ok(this.registry()?.ids()));

        methods.add_meta_method(MetaMethod::Index, |_, this, key: Value| {
            Ok(match key {
                Value::String(key) => this.extra(&key.to_str()?).unwrap_or(Value::Nil),
                _ => Value::Nil,
            })
        });
    }
}

/// Builds one [`CapabilityApi`] per mod.
pub struct CapabilityApiFactory {
    extra: ExtraApiTable,
    messenger: Arc<dyn HostMessenger>,
}

impl CapabilityApiFactory {
    pub fn new(extra: ExtraApiTable, messenger: Arc<dyn HostMessenger>) -> Self {
        Self { extra, messenger }
    }

    pub fn extra_api(&self) -> &ExtraApiTable {
        &self.extra
    }

    pub fn build(&self, registry: Weak<ModRegistry>, owner: &Arc<LoadedMod>) -> CapabilityApi {
        CapabilityApi {
            mod_id: owner.id().to_string(),
            owner: Arc::downgrade(owner),
            registry,
            messenger: Arc::clone(&self.messenger),
            shared: self.extra.clone(),
            extras: Mutex::new(self.extra.snapshot()),
        }
    }
}
