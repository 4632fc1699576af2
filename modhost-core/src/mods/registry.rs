//! Mod Registry
//!
//! The authoritative, ordered list of loaded mods. Ids are unique: registering
//! an id that is already loaded unloads the old instance first.
//!
//! Mod code may call back into the registry while it runs (`main`, cleanup
//! actions and listeners all hold an API that can load, unload and emit). The
//! registry lock is therefore never held while Lua code executes; operations
//! work on snapshots and re-check the list before they mutate it.

use mlua::Lua;
use std::sync::{Arc, Mutex, Weak};

use super::api::{CapabilityApiFactory, ExtraApiTable};
use super::dependency::DependencyValidator;
use super::events::{EventBus, ModEvent};
use super::hooks::{MenuHook, MenuHookRegistry};
use super::manifest::ManifestLoader;
use super::{LoadedMod, ModManifest};
use crate::engine::LuaEngine;
use crate::error::{lock, ModError, ModResult};
use crate::messaging::HostMessenger;

const RELOAD_MESSAGE: &str =
    "Mod already loaded, reloading it.. (deleting the current instance before loading it)";

pub struct ModRegistry {
    mods: Mutex<Vec<Arc<LoadedMod>>>,
    apis: CapabilityApiFactory,
    messenger: Arc<dyn HostMessenger>,
    engine: LuaEngine,
    this: Weak<ModRegistry>,
}

impl ModRegistry {
    pub fn new(engine: LuaEngine, messenger: Arc<dyn HostMessenger>) -> Arc<Self> {
        Arc::new_cyclic(|this| Self {
            mods: Mutex::new(Vec::new()),
            apis: CapabilityApiFactory::new(ExtraApiTable::new(), Arc::clone(&messenger)),
            messenger,
            engine,
            this: this.clone(),
        })
    }

    pub fn lua(&self) -> &Lua {
        self.engine.lua()
    }

    pub fn engine(&self) -> &LuaEngine {
        &self.engine
    }

    pub fn messenger(&self) -> &Arc<dyn HostMessenger> {
        &self.messenger
    }

    pub fn extra_api(&self) -> &ExtraApiTable {
        self.apis.extra_api()
    }

    /// Parse `source` and register the resulting manifest.
    pub fn load_source(&self, chunk_name: &str, source: &str) -> ModResult<Arc<LoadedMod>> {
        let manifest = ManifestLoader::load(&self.engine, chunk_name, source)?;
        self.register(manifest)
    }

    /// Validate, replace any previous instance, run `main`, then insert.
    ///
    /// Failure points, in order:
    /// - a missing dependency: nothing changes;
    /// - a failing cleanup of the previous instance: that instance is gone and
    ///   the new one is not registered;
    /// - a failing `main`: the new mod is not registered, and a previous
    ///   instance with the same id stays unloaded.
    pub fn register(&self, manifest: ModManifest) -> ModResult<Arc<LoadedMod>> {
        DependencyValidator::validate(&manifest.dependencies, |id| self.contains(id))?;

        if self.contains(&manifest.id) {
            self.messenger.show_message(RELOAD_MESSAGE);
            log::info!("Reloading mod \"{}\"", manifest.id);
            self.unload(&manifest.id)?;
        }

        let loaded = Arc::new(LoadedMod::new(manifest));
        let api = self.apis.build(self.this.clone(), &loaded);
        let api = self.lua().create_userdata(api)?;

        let manifest = loaded.manifest();
        if let Some(menu) = loaded.menu() {
            manifest.module.set("menu", menu.clone())?;
        }
        if let Err(source) = manifest
            .entry_point
            .call::<()>((manifest.module.clone(), api))
        {
            loaded.detach();
            return Err(ModError::EntryPointExecution {
                id: manifest.id.clone(),
                source,
            });
        }

        let mut mods = lock(&self.mods, "mod registry");
        // `main` may have loaded another instance of its own id; the outer load wins.
        let displaced = mods
            .iter()
            .position(|m| m.id() == loaded.id())
            .map(|index| mods.remove(index));
        loaded.set_active(true);
        mods.push(Arc::clone(&loaded));
        drop(mods);

        if let Some(inner) = displaced {
            log::warn!(
                "mod \"{}\" was registered again while starting; keeping the outer instance",
                loaded.id()
            );
            inner.set_active(false);
            if let Err(e) = run_cleanup(&inner) {
                log::error!("Cleanup of displaced mod \"{}\" failed: {}", inner.id(), e);
            }
            inner.detach();
        }

        log::info!(
            "Loaded mod \"{}\" ({} v{} by {})",
            loaded.id(),
            manifest.name,
            manifest.version,
            manifest.author
        );
        Ok(loaded)
    }

    /// Run the mod's cleanup actions and drop it from the registry.
    ///
    /// The mod leaves the list before its cleanup runs, so a cleanup action
    /// that reaches back into the registry already sees it as gone. The first
    /// failing action stops the rest and is returned; the mod stays removed.
    pub fn unload(&self, id: &str) -> ModResult<()> {
        let target = {
            let mut mods = lock(&self.mods, "mod registry");
            let index = mods
                .iter()
                .position(|m| m.id() == id)
                .ok_or_else(|| ModError::NotFound(id.to_string()))?;
            mods.remove(index)
        };
        target.set_active(false);

        let result = run_cleanup(&target);
        target.detach();

        match &result {
            Ok(()) => log::info!("Unloaded mod \"{}\"", id),
            Err(e) => log::error!("Unloaded mod \"{}\" with failed cleanup: {}", id, e),
        }
        result
    }

    /// Unload every mod, most recently registered first.
    ///
    /// Keeps going past failures and returns the first one.
    pub fn unload_all(&self) -> ModResult<()> {
        let mut first_error = None;
        for m in self.list().into_iter().rev() {
            if let Err(e) = self.unload(m.id()) {
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    pub fn find(&self, id: &str) -> Option<Arc<LoadedMod>> {
        lock(&self.mods, "mod registry")
            .iter()
            .find(|m| m.id() == id)
            .cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        lock(&self.mods, "mod registry").iter().any(|m| m.id() == id)
    }

    /// Snapshot in registration order.
    pub fn list(&self) -> Vec<Arc<LoadedMod>> {
        lock(&self.mods, "mod registry").clone()
    }

    pub fn ids(&self) -> Vec<String> {
        lock(&self.mods, "mod registry")
            .iter()
            .map(|m| m.id().to_string())
            .collect()
    }

    pub fn len(&self) -> usize {
        lock(&self.mods, "mod registry").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fire an event at every loaded mod; see [`EventBus`].
    pub fn emit(
        &self,
        name: &str,
        cancelable: bool,
        detail: Option<serde_json::Value>,
    ) -> ModResult<bool> {
        let mods = self.list();
        EventBus::dispatch(self.lua(), &mods, ModEvent::new(name, cancelable, detail))
    }

    pub fn hooks_for(&self, hook_name: &str) -> Vec<MenuHook> {
        MenuHookRegistry::hooks_for(&self.list(), hook_name)
    }
}

fn run_cleanup(m: &LoadedMod) -> ModResult<()> {
    for (index, action) in m.manifest().cleanup_actions.iter().enumerate() {
        action
            .call::<()>(())
            .map_err(|source| ModError::CleanupExecution {
                id: m.id().to_string(),
                index,
                source,
            })?;
    }
    Ok(())
}
