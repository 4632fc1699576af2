//! Event Bus
//!
//! Host events are delivered to every loaded mod. Mods subscribe from their
//! entry point:
//!
//! ```lua
//! api:addEventListener("categoryCreating", function(event)
//!     if event.detail.name == "Hello" then
//!         event:preventDefault()
//!     end
//! end)
//! ```
//!
//! # Delivery contract
//!
//! - Mods are visited in registry order, each mod's listeners for the event
//!   in the order they were added.
//! - One event object is shared by all listeners. Calling `preventDefault` on
//!   a cancelable event makes [`EventBus::dispatch`] return `false`, but the
//!   remaining listeners of every mod still receive the event.
//! - Non-cancelable events always report `true`; `preventDefault` is ignored.
//! - A listener that raises is logged and skipped; it does not stop delivery.
//! - The listener lists are fixed when dispatch starts: a listener added while
//!   the event is in flight only sees later events.

use mlua::{AnyUserData, Lua, UserData, UserDataFields, UserDataMethods};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::LoadedMod;
use crate::convert::json_to_lua;
use crate::error::ModResult;

pub const PROJECT_CREATING: &str = "projectCreating";
pub const PROJECT_CREATED: &str = "projectCreated";
pub const CATEGORY_CREATING: &str = "categoryCreating";
pub const CATEGORY_CREATED: &str = "categoryCreated";

/// Event object handed to listeners.
///
/// `detail` is rebuilt for each read, so a listener editing the table it gets
/// back cannot change what later listeners see.
#[derive(Debug)]
pub struct ModEvent {
    name: String,
    cancelable: bool,
    detail: Option<serde_json::Value>,
    prevented: AtomicBool,
}

impl ModEvent {
    pub fn new(name: &str, cancelable: bool, detail: Option<serde_json::Value>) -> Self {
        Self {
            name: name.to_string(),
            cancelable,
            detail,
            prevented: AtomicBool::new(false),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn cancelable(&self) -> bool {
        self.cancelable
    }

    pub fn detail(&self) -> Option<&serde_json::Value> {
        self.detail.as_ref()
    }

    pub fn prevent_default(&self) {
        if self.cancelable {
            self.prevented.store(true, Ordering::Release);
        }
    }

    pub fn default_prevented(&self) -> bool {
        self.prevented.load(Ordering::Acquire)
    }
}

impl UserData for ModEvent {
    fn add_fields<F: UserDataFields<Self>>(fields: &mut F) {
        fields.add_field_method_get("type", |_, this| Ok(this.name.clone()));
        fields.add_field_method_get("cancelable", |_, this| Ok(this.cancelable));
        fields.add_field_method_get("defaultPrevented", |_, this| Ok(this.default_prevented()));
        fields.add_field_method_get("detail", |lua, this| match &this.detail {
            Some(detail) => json_to_lua(lua, detail),
            None => Ok(mlua::Value::Nil),
        });
    }

    fn add_methods<M: UserDataMethods<Self>>(methods: &mut M) {
        methods.add_method("preventDefault", |_, this, ()| {
            this.prevent_default();
            Ok(())
        });
    }
}

pub struct EventBus;

impl EventBus {
    /// Deliver `event` to every active mod in `mods`; returns `delivered`.
    pub fn dispatch(lua: &Lua, mods: &[Arc<LoadedMod>], event: ModEvent) -> ModResult<bool> {
        let name = event.name.clone();
        let cancelable = event.cancelable;
        let event: AnyUserData = lua.create_userdata(event)?;

        // Listeners added while the event is in flight wait for the next one.
        let targets: Vec<_> = mods
            .iter()
            .map(|m| (m, m.listeners_for(&name)))
            .collect();

        let mut delivered_to = 0usize;
        for (m, listeners) in targets {
            // Unloaded by an earlier listener of this same dispatch.
            if !m.is_active() {
                continue;
            }
            for listener in listeners {
                delivered_to += 1;
                if let Err(e) = listener.call::<()>(event.clone()) {
                    log::error!("listener for \"{}\" in mod \"{}\" failed: {}", name, m.id(), e);
                }
            }
        }

        let prevented = event.borrow::<ModEvent>()?.default_prevented();
        log::debug!(
            "dispatched \"{}\" to {} listeners (prevented: {})",
            name,
            delivered_to,
            prevented
        );
        Ok(!(cancelable && prevented))
    }
}

/// A host action bracketed by a cancelable "creating" event and a
/// non-cancelable "created" event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardedEvent {
    ProjectCreation,
    CategoryCreation,
}

impl GuardedEvent {
    pub fn before(self) -> &'static str {
        match self {
            Self::ProjectCreation => PROJECT_CREATING,
            Self::CategoryCreation => CATEGORY_CREATING,
        }
    }

    pub fn after(self) -> &'static str {
        match self {
            Self::ProjectCreation => PROJECT_CREATED,
            Self::CategoryCreation => CATEGORY_CREATED,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prevent_default_is_ignored_for_non_cancelable_events() {
        let event = ModEvent::new(PROJECT_CREATED, false, None);
        event.prevent_default();
        assert!(!event.default_prevented());
    }

    #[test]
    fn lua_can_read_fields_and_prevent() {
        let lua = Lua::new();
        let event = lua
            .create_userdata(ModEvent::new(
                CATEGORY_CREATING,
                true,
                Some(serde_json::json!({ "name": "Hello", "color": "red" })),
            ))
            .unwrap();
        lua.globals().set("event", event.clone()).unwrap();
        lua.load(
            r#"
            assert(event.type == "categoryCreating")
            assert(event.cancelable)
            assert(event.detail.name == "Hello")
            event.detail.name = "changed"
            assert(event.detail.name == "Hello")
            event:preventDefault()
            assert(event.defaultPrevented)
            "#,
        )
        .exec()
        .unwrap();
        assert!(event.borrow::<ModEvent>().unwrap().default_prevented());
    }

    #[test]
    fn dispatch_with_no_mods_is_delivered() {
        let lua = Lua::new();
        let delivered =
            EventBus::dispatch(&lua, &[], ModEvent::new(PROJECT_CREATED, false, None)).unwrap();
        assert!(delivered);
    }

    #[test]
    fn guarded_events_pair_up() {
        assert_eq!(GuardedEvent::CategoryCreation.before(), "categoryCreating");
        assert_eq!(GuardedEvent::CategoryCreation.after(), "categoryCreated");
        assert_eq!(GuardedEvent::ProjectCreation.before(), "projectCreating");
        assert_eq!(GuardedEvent::ProjectCreation.after(), "projectCreated");
    }
}
