//! Menu-Hook Registry
//!
//! Mods register named callbacks with `api:registerMenuHook(name, fn)`. The
//! menu host asks for the hooks of a given name each time it is about to show
//! that kind of menu and calls each one with the menu it is building:
//!
//! ```rust,no_run
//! # fn demo(host: &modhost_core::ModHost) -> modhost_core::ModResult<()> {
//! use modhost_core::mods::MenuHandle;
//!
//! let menu = MenuHandle::new("Scripts");
//! for hook in host.hooks_for("scriptsMenu") {
//!     hook.invoke(&menu)?;
//! }
//! # Ok(())
//! # }
//! ```
//!
//! Nothing is cached: a hook registered after a menu was materialised only
//! shows up the next time that menu is built.

use mlua::Function;
use std::sync::Arc;

use super::menu::MenuHandle;
use super::LoadedMod;

/// A named callback contributed by one mod.
#[derive(Debug, Clone)]
pub struct MenuHook {
    pub mod_id: String,
    pub name: String,
    func: Function,
}

impl MenuHook {
    pub fn new(mod_id: &str, name: &str, func: Function) -> Self {
        Self {
            mod_id: mod_id.to_string(),
            name: name.to_string(),
            func,
        }
    }

    /// Call the hook with the menu being built.
    pub fn invoke(&self, menu: &MenuHandle) -> mlua::Result<()> {
        self.func.call::<()>(menu.clone())
    }

    pub fn function(&self) -> &Function {
        &self.func
    }
}

pub struct MenuHookRegistry;

impl MenuHookRegistry {
    /// Hooks named `hook_name`, in registry order then registration order.
    pub fn hooks_for(mods: &[Arc<LoadedMod>], hook_name: &str) -> Vec<MenuHook> {
        mods.iter()
            .filter(|m| m.is_active())
            .flat_map(|m| m.menu_hooks())
            .filter(|hook| hook.name == hook_name)
            .collect()
    }

    /// Run every matching hook against `menu`.
    ///
    /// A failing hook is logged and skipped so one broken mod cannot keep the
    /// menu from opening. Returns how many hooks ran successfully.
    pub fn apply(mods: &[Arc<LoadedMod>], hook_name: &str, menu: &MenuHandle) -> usize {
        let mut applied = 0;
        for hook in Self::hooks_for(mods, hook_name) {
            match hook.invoke(menu) {
                Ok(()) => applied += 1,
                Err(e) => log::error!(
                    "menu hook \"{}\" of mod \"{}\" failed: {}",
                    hook.name,
                    hook.mod_id,
                    e
                ),
            }
        }
        applied
    }
}
