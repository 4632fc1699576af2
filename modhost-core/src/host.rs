//! Host facade tying the registry, event bus and menu hooks together.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::HostConfig;
use crate::engine::LuaEngine;
use crate::error::{ModError, ModResult};
use crate::messaging::HostMessenger;
use crate::mods::events::GuardedEvent;
use crate::mods::hooks::{MenuHook, MenuHookRegistry};
use crate::mods::manifest::ManifestLoader;
use crate::mods::menu::MenuHandle;
use crate::mods::registry::ModRegistry;
use crate::mods::{DependencyValidator, LoadedMod, ModInfo, ModManifest};
use crate::readiness::{wait_until_ready, ReadinessProbe};

const MOD_EXTENSION: &str = "lua";

/// Outcome of [`ModHost::load_mods_from_dir`].
#[derive(Debug, Default)]
pub struct DirectoryLoadReport {
    /// Ids registered, in load order
    pub loaded: Vec<String>,
    pub failed: Vec<(PathBuf, ModError)>,
}

/// Entry point for embedding hosts. Clones share the same mods.
#[derive(Clone)]
pub struct ModHost {
    registry: Arc<ModRegistry>,
}

impl ModHost {
    pub fn new(messenger: Arc<dyn HostMessenger>) -> Self {
        Self {
            registry: ModRegistry::new(LuaEngine::new(), messenger),
        }
    }

    pub fn with_config(config: &HostConfig, messenger: Arc<dyn HostMessenger>) -> ModResult<Self> {
        let engine = LuaEngine::with_isolation(config.isolate_mod_globals);
        if let Some(path) = &config.lua_package_path {
            engine.set_package_path(path)?;
        }
        Ok(Self {
            registry: ModRegistry::new(engine, messenger),
        })
    }

    /// Wait for the host environment once, then build the host and load the
    /// configured mod directory.
    pub async fn start<P>(
        config: &HostConfig,
        messenger: Arc<dyn HostMessenger>,
        probe: &P,
    ) -> ModResult<Self>
    where
        P: ReadinessProbe + ?Sized,
    {
        wait_until_ready(probe, config.ready_poll_interval(), config.ready_timeout()).await?;
        let host = Self::with_config(config, messenger)?;
        if config.autoload {
            let report = host.load_mods_from_dir(&config.mod_dir)?;
            log::info!(
                "Autoloaded {} mods from {} ({} failed)",
                report.loaded.len(),
                config.mod_dir.display(),
                report.failed.len()
            );
        }
        Ok(host)
    }

    pub fn registry(&self) -> &Arc<ModRegistry> {
        &self.registry
    }

    pub fn load_mod(&self, source: &str) -> ModResult<Arc<LoadedMod>> {
        self.registry.load_source("mod", source)
    }

    pub fn load_mod_named(&self, chunk_name: &str, source: &str) -> ModResult<Arc<LoadedMod>> {
        self.registry.load_source(chunk_name, source)
    }

    pub fn load_mod_file(&self, path: &Path) -> ModResult<Arc<LoadedMod>> {
        let manifest = self.parse_file(path)?;
        self.registry.register(manifest)
    }

    /// Load every `*.lua` file in `dir`.
    ///
    /// Files are parsed first, then registered so that mods follow the mods
    /// of the same directory they depend on. A mod that fails is recorded in
    /// the report and the rest still load.
    pub fn load_mods_from_dir(&self, dir: &Path) -> ModResult<DirectoryLoadReport> {
        let mut report = DirectoryLoadReport::default();

        if !dir.exists() {
            log::warn!("Mod directory does not exist: {}", dir.display());
            return Ok(report);
        }

        let read_err = |source| ModError::ReadSource {
            path: dir.to_path_buf(),
            source,
        };
        let mut paths = Vec::new();
        for entry in std::fs::read_dir(dir).map_err(read_err)? {
            let path = entry.map_err(read_err)?.path();
            if is_mod_file(&path) {
                paths.push(path);
            }
        }
        paths.sort();

        let mut parsed: Vec<(PathBuf, ModManifest)> = Vec::new();
        for path in paths {
            match self.parse_file(&path) {
                Ok(manifest) => parsed.push((path, manifest)),
                Err(e) => {
                    log::error!("Failed to load mod {}: {}", path.display(), e);
                    report.failed.push((path, e));
                }
            }
        }

        let ordered = DependencyValidator::load_order(
            parsed,
            |(_, m)| m.id.as_str(),
            |(_, m)| m.dependencies.as_slice(),
        );
        for (path, manifest) in ordered {
            match self.registry.register(manifest) {
                Ok(loaded) => report.loaded.push(loaded.id().to_string()),
                Err(e) => {
                    log::error!("Failed to load mod {}: {}", path.display(), e);
                    report.failed.push((path, e));
                }
            }
        }

        Ok(report)
    }

    fn parse_file(&self, path: &Path) -> ModResult<ModManifest> {
        let source = std::fs::read_to_string(path).map_err(|source| ModError::ReadSource {
            path: path.to_path_buf(),
            source,
        })?;
        ManifestLoader::load(
            self.registry.engine(),
            &path.display().to_string(),
            &source,
        )
    }

    pub fn unload(&self, id: &str) -> ModResult<()> {
        self.registry.unload(id)
    }

    pub fn unload_all(&self) -> ModResult<()> {
        self.registry.unload_all()
    }

    pub fn find(&self, id: &str) -> Option<Arc<LoadedMod>> {
        self.registry.find(id)
    }

    pub fn list(&self) -> Vec<Arc<LoadedMod>> {
        self.registry.list()
    }

    pub fn mod_info(&self, id: &str) -> Option<ModInfo> {
        self.registry.find(id).map(|m| m.info())
    }

    pub fn extra_api_names(&self) -> Vec<String> {
        self.registry.extra_api().names()
    }

    /// Fire a host event; `delivered` is meaningful only for cancelable events.
    pub fn emit(
        &self,
        name: &str,
        cancelable: bool,
        detail: Option<serde_json::Value>,
    ) -> ModResult<bool> {
        self.registry.emit(name, cancelable, detail)
    }

    /// Run `action` unless a mod cancels the "creating" event, then announce
    /// it with the "created" event. Returns `None` when a mod cancelled.
    pub fn run_guarded<R>(
        &self,
        event: GuardedEvent,
        detail: Option<serde_json::Value>,
        action: impl FnOnce() -> R,
    ) -> ModResult<Option<R>> {
        if !self.emit(event.before(), true, detail.clone())? {
            log::info!("\"{}\" was cancelled by a mod", event.before());
            return Ok(None);
        }
        let result = action();
        self.emit(event.after(), false, detail)?;
        Ok(Some(result))
    }

    pub fn hooks_for(&self, hook_name: &str) -> Vec<MenuHook> {
        self.registry.hooks_for(hook_name)
    }

    /// Let every mod hooked on `hook_name` customise `menu`.
    pub fn apply_menu_hooks(&self, hook_name: &str, menu: &MenuHandle) -> usize {
        MenuHookRegistry::apply(&self.registry.list(), hook_name, menu)
    }

    /// `(name, menu)` of every loaded mod that asked for a menu.
    pub fn mod_menus(&self) -> Vec<(String, MenuHandle)> {
        self.registry
            .list()
            .iter()
            .filter_map(|m| m.menu().map(|menu| (m.name().to_string(), menu.clone())))
            .collect()
    }
}

fn is_mod_file(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .map(|ext| ext.to_string_lossy().eq_ignore_ascii_case(MOD_EXTENSION))
            .unwrap_or(false)
}
