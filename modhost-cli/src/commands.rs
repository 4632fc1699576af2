// CLI command handlers
use anyhow::{Context, Result};
use modhost_core::{GuardedEvent, HostMessenger, IntoAnyhow, MenuHandle, ModHost};
use std::path::PathBuf;

/// Prints host messages to the terminal.
pub struct ConsoleMessenger;

impl HostMessenger for ConsoleMessenger {
    fn show_message(&self, text: &str) {
        println!("{}", text);
    }

    fn inform(&self, title: &str, text: &str) {
        println!("[{}] {}", title, text);
    }
}

pub fn list_mods(host: &ModHost) -> Result<()> {
    let mods = host.list();
    if mods.is_empty() {
        println!("No mods loaded");
        return Ok(());
    }

    println!("Loaded mods: {}", mods.len());
    for m in &mods {
        let info = m.info();
        println!(
            "  {} ({}) v{} by {}",
            info.id, info.name, info.version, info.author
        );
        if !info.dependencies.is_empty() {
            println!("    depends on: {}", info.dependencies.join(", "));
        }
    }

    let menus = host.mod_menus();
    if !menus.is_empty() {
        println!("\nMods menu:");
        for (name, menu) in menus {
            println!("  {} ({} entries)", name, menu.len());
        }
    }

    let extras = host.extra_api_names();
    if !extras.is_empty() {
        println!("\nExtra APIs: {}", extras.join(", "));
    }
    Ok(())
}

pub fn show_info(host: &ModHost, id: &str) -> Result<()> {
    let info = host
        .mod_info(id)
        .with_context(|| format!("No mod with id \"{}\" is loaded", id))?;
    println!("{}", info.info_text());
    Ok(())
}

pub fn emit_event(
    host: &ModHost,
    event: &str,
    cancelable: bool,
    detail: Option<&str>,
) -> Result<()> {
    let detail = detail
        .map(|text| serde_json::from_str::<serde_json::Value>(text))
        .transpose()
        .context("Failed to parse event detail as JSON")?;

    let delivered = host.emit(event, cancelable, detail)?;
    if cancelable {
        println!(
            "Event \"{}\" {}",
            event,
            if delivered { "delivered" } else { "cancelled by a mod" }
        );
    } else {
        println!("Event \"{}\" delivered", event);
    }
    Ok(())
}

pub fn show_menu(host: &ModHost, hook: &str, activate: Option<&str>) -> Result<()> {
    let menu = MenuHandle::new(hook);
    let applied = host.apply_menu_hooks(hook, &menu);
    println!("Menu \"{}\" ({} hooks applied)", hook, applied);
    for label in menu.labels() {
        println!("  {}", label);
    }

    if let Some(label) = activate {
        if !menu.activate(label).into_anyhow()? {
            anyhow::bail!("Menu \"{}\" has no item \"{}\"", hook, label);
        }
    }
    Ok(())
}

pub fn create_category(host: &ModHost, name: &str, color: Option<&str>) -> Result<()> {
    let detail = serde_json::json!({ "name": name, "color": color });
    match host.run_guarded(GuardedEvent::CategoryCreation, Some(detail), || {
        log::info!("Creating category \"{}\"", name)
    })? {
        Some(()) => println!("Category \"{}\" created", name),
        None => println!("Category \"{}\" was cancelled by a mod", name),
    }
    Ok(())
}

pub fn load_files(host: &ModHost, files: &[PathBuf]) -> Result<()> {
    for file in files {
        let loaded = host
            .load_mod_file(file)
            .with_context(|| format!("Failed to load mod {}", file.display()))?;
        println!("Loaded \"{}\" from {}", loaded.id(), file.display());
    }
    list_mods(host)
}
