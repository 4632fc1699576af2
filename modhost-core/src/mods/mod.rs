//! Mod lifecycle
//!
//! A mod is a Lua chunk that returns a manifest table (see [`manifest`]). The
//! lifecycle is:
//!
//! 1. **Load**: the [`ManifestLoader`] evaluates the chunk and validates the
//!    returned table.
//! 2. **Validate**: every id in `depends` must name a mod that is loaded right
//!    now. This is checked once; unloading a dependency later does not affect
//!    mods that were validated against it.
//! 3. **Register**: an already loaded mod with the same id is unloaded first,
//!    then `main(self, api)` runs with a fresh [`CapabilityApi`] and the mod is
//!    appended to the [`ModRegistry`].
//! 4. **Run**: the mod receives host events through listeners it attached with
//!    `api:addEventListener` and customises menus through hooks registered with
//!    `api:registerMenuHook`.
//! 5. **Unload**: `cleanupFuncs` run in order, then the mod leaves the registry.
//!
//! # Example
//!
//! ```lua
//! return {
//!     id = "example-mod",
//!     doMenu = true,
//!     main = function(self, api)
//!         self.menu:addItem("Say hello", function()
//!             api:inform("Hello, world!", "Example Mod")
//!         end)
//!
//!         api:addEventListener("categoryCreating", function(event)
//!             if event.detail.name == "Hello" then
//!                 event:preventDefault()
//!             end
//!         end)
//!     end,
//!     cleanupFuncs = {
//!         function() print("Goodbye!") end,
//!     },
//! }
//! ```
//!
//! # Known limitation
//!
//! Reloading a mod whose new `main` fails leaves no mod under that id: the
//! previous instance has already been cleaned up and is not restored.

pub mod api;
pub mod dependency;
pub mod events;
pub mod hooks;
pub mod manifest;
pub mod menu;
pub mod registry;

pub use api::{CapabilityApi, CapabilityApiFactory, ExtraApiTable};
pub use dependency::DependencyValidator;
pub use events::{EventBus, GuardedEvent, ModEvent};
pub use hooks::{MenuHook, MenuHookRegistry};
pub use manifest::ManifestLoader;
pub use menu::MenuHandle;
pub use registry::ModRegistry;

use mlua::{Function, Table};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use crate::error::lock;

/// Parsed and validated mod declaration.
#[derive(Debug, Clone)]
pub struct ModManifest {
    /// Unique key in the registry
    pub id: String,
    pub name: String,
    pub description: String,
    pub version: String,
    pub author: String,
    /// Ids that must be loaded before this mod
    pub dependencies: Vec<String>,
    /// Whether the mod gets its own menu handle
    pub wants_menu: bool,
    /// `main(self, api)`
    pub entry_point: Function,
    /// Run in order on unload
    pub cleanup_actions: Vec<Function>,
    /// The table the chunk returned; passed to `main` as `self`
    pub module: Table,
}

/// Serializable summary of a loaded mod.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModInfo {
    pub id: String,
    pub name: String,
    pub description: String,
    pub version: String,
    pub author: String,
    pub dependencies: Vec<String>,
    pub has_menu: bool,
}

impl ModInfo {
    /// Text for a "mod information" dialog.
    pub fn info_text(&self) -> String {
        format!(
            "Name: {}\nID: {}\nDescription: {}\nVersion: {}\nAuthor: {}",
            self.name, self.id, self.description, self.version, self.author
        )
    }
}

/// A mod that has passed validation and is (or was) in the registry.
#[derive(Debug)]
pub struct LoadedMod {
    manifest: ModManifest,
    listeners: Mutex<HashMap<String, Vec<Function>>>,
    menu_hooks: Mutex<Vec<MenuHook>>,
    menu: Option<MenuHandle>,
    active: AtomicBool,
}

impl LoadedMod {
    pub(crate) fn new(manifest: ModManifest) -> Self {
        let menu = manifest.wants_menu.then(|| MenuHandle::new(&manifest.name));
        Self {
            manifest,
            listeners: Mutex::new(HashMap::new()),
            menu_hooks: Mutex::new(Vec::new()),
            menu,
            active: AtomicBool::new(false),
        }
    }

    pub fn id(&self) -> &str {
        &self.manifest.id
    }

    pub fn name(&self) -> &str {
        &self.manifest.name
    }

    pub fn manifest(&self) -> &ModManifest {
        &self.manifest
    }

    /// The mod's own menu, present only when it declared `doMenu = true`.
    pub fn menu(&self) -> Option<&MenuHandle> {
        self.menu.as_ref()
    }

    /// True while the mod is in the registry.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    pub(crate) fn set_active(&self, active: bool) {
        self.active.store(active, Ordering::Release);
    }

    pub fn info(&self) -> ModInfo {
        ModInfo {
            id: self.manifest.id.clone(),
            name: self.manifest.name.clone(),
            description: self.manifest.description.clone(),
            version: self.manifest.version.clone(),
            author: self.manifest.author.clone(),
            dependencies: self.manifest.dependencies.clone(),
            has_menu: self.menu.is_some(),
        }
    }

    pub(crate) fn add_listener(&self, event: &str, listener: Function) {
        lock(&self.listeners, "listener")
            .entry(event.to_string())
            .or_default()
            .push(listener);
    }

    /// Remove the first registration of `listener` for `event`.
    pub(crate) fn remove_listener(&self, event: &str, listener: &Function) -> bool {
        let mut listeners = lock(&self.listeners, "listener");
        let Some(list) = listeners.get_mut(event) else {
            return false;
        };
        let target = listener.to_pointer();
        match list.iter().position(|f| f.to_pointer() == target) {
            Some(index) => {
                list.remove(index);
                true
            }
            None => false,
        }
    }

    /// Snapshot of the listeners for one event, in registration order.
    pub fn listeners_for(&self, event: &str) -> Vec<Function> {
        lock(&self.listeners, "listener")
            .get(event)
            .cloned()
            .unwrap_or_default()
    }

    pub fn listener_count(&self) -> usize {
        lock(&self.listeners, "listener").values().map(Vec::len).sum()
    }

    pub(crate) fn add_menu_hook(&self, hook: MenuHook) {
        lock(&self.menu_hooks, "menu hook").push(hook);
    }

    /// Snapshot of this mod's menu hooks, in registration order.
    pub fn menu_hooks(&self) -> Vec<MenuHook> {
        lock(&self.menu_hooks, "menu hook").clone()
    }

    /// Drop every listener and hook; called once the mod leaves the registry.
    pub(crate) fn detach(&self) {
        self.set_active(false);
        lock(&self.listeners, "listener").clear();
        lock(&self.menu_hooks, "menu hook").clear();
    }
}
