//! Lua mod host
//!
//! Loads mods written in Lua, keeps them in an ordered registry, gives each a
//! capability API and delivers host events to the listeners they attach.
//!
//! ```no_run
//! use std::sync::Arc;
//! use modhost_core::{LogMessenger, ModHost};
//!
//! # fn main() -> modhost_core::ModResult<()> {
//! let host = ModHost::new(Arc::new(LogMessenger));
//! host.load_mod(r#"return { id = "hello", main = function(self, api) api:showMsg("hi") end }"#)?;
//! let delivered = host.emit("categoryCreating", true, Some(serde_json::json!({ "name": "Work" })))?;
//! println!("category created: {}", delivered);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod convert;
pub mod engine;
pub mod error;
pub mod host;
pub mod messaging;
pub mod mods;
pub mod readiness;

pub use config::HostConfig;
pub use engine::LuaEngine;
pub use error::{IntoAnyhow, ModError, ModResult};
pub use host::{DirectoryLoadReport, ModHost};
pub use messaging::{HostMessenger, LogMessenger};
pub use mods::events::{CATEGORY_CREATED, CATEGORY_CREATING, PROJECT_CREATED, PROJECT_CREATING};
pub use mods::{GuardedEvent, LoadedMod, MenuHandle, MenuHook, ModInfo, ModManifest, ModRegistry};
pub use readiness::{wait_until_ready, ReadinessProbe, ReadyFlag};

pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
