//! Integration tests for loading, replacing and unloading mods

mod common;

use common::{simple_mod, test_host, Message};
use modhost_core::ModError;

#[test]
fn test_register_then_find_fills_defaults() {
    let t = test_host();
    t.host
        .load_mod(r#"return { id = "my-cool_mod", main = function() end }"#)
        .unwrap();

    let info = t.host.mod_info("my-cool_mod").expect("mod should be loaded");
    assert_eq!(info.name, "My Cool Mod");
    assert_eq!(info.description, "No description provided.");
    assert_eq!(info.version, "0.0");
    assert_eq!(info.author, "Anonymous");
    assert!(info.dependencies.is_empty());
    assert!(!info.has_menu);
}

#[test]
fn test_register_then_find_keeps_declared_values() {
    let t = test_host();
    t.host
        .load_mod(
            r#"
            return {
                id = "declared",
                name = "Declared Mod",
                description = "Has everything.",
                version = "2.1",
                author = "Someone",
                doMenu = true,
                main = function() end,
            }
            "#,
        )
        .unwrap();

    let found = t.host.find("declared").unwrap();
    assert_eq!(found.name(), "Declared Mod");
    assert!(found.menu().is_some());
    assert_eq!(
        found.info().info_text(),
        "Name: Declared Mod\nID: declared\nDescription: Has everything.\nVersion: 2.1\nAuthor: Someone"
    );
}

#[test]
fn test_missing_id_leaves_registry_unchanged() {
    let t = test_host();
    t.host.load_mod(&simple_mod("present", &[])).unwrap();

    let err = t
        .host
        .load_mod(r#"return { main = function() record("should not run") end }"#)
        .unwrap_err();
    assert!(matches!(err, ModError::MissingId), "got {:?}", err);
    assert_eq!(t.host.list().len(), 1);
    assert_eq!(t.trace.count("should not run"), 0);
}

#[test]
fn test_non_table_source_is_rejected() {
    let t = test_host();
    let err = t.host.load_mod("return 42").unwrap_err();
    assert!(matches!(err, ModError::InvalidManifestShape { .. }));
    assert!(t.host.list().is_empty());
}

#[test]
fn test_unknown_dependency_is_not_inserted() {
    let t = test_host();
    let err = t.host.load_mod(&simple_mod("needy", &["ghost"])).unwrap_err();
    match err {
        ModError::UnsatisfiedDependency(dep) => assert_eq!(dep, "ghost"),
        other => panic!("expected UnsatisfiedDependency, got {:?}", other),
    }
    assert!(t.host.find("needy").is_none());
    assert_eq!(t.trace.count("main:needy"), 0);
}

#[test]
fn test_registering_twice_replaces_the_first_instance() {
    let t = test_host();
    t.host
        .load_mod(
            r#"
            return {
                id = "A", version = "1",
                main = function() end,
                cleanupFuncs = { function() record("cleanup:A1") end },
            }
            "#,
        )
        .unwrap();
    t.host
        .load_mod(
            r#"
            return {
                id = "A", version = "2",
                main = function() end,
                cleanupFuncs = { function() record("cleanup:A2") end },
            }
            "#,
        )
        .unwrap();

    assert_eq!(t.trace.count("cleanup:A1"), 1);
    assert_eq!(t.trace.count("cleanup:A2"), 0);
    assert_eq!(t.host.mod_info("A").unwrap().version, "2");
    assert_eq!(t.host.list().len(), 1);
    assert!(t.messenger.messages().iter().any(|m| matches!(
        m,
        Message::Status(text) if text.starts_with("Mod already loaded")
    )));
}

#[test]
fn test_dependency_scenario() {
    let t = test_host();
    t.host.load_mod(&simple_mod("m1", &[])).unwrap();
    t.host.load_mod(&simple_mod("m2", &["m1"])).unwrap();

    let ids: Vec<String> = t.host.list().iter().map(|m| m.id().to_string()).collect();
    assert_eq!(ids, vec!["m1", "m2"]);

    t.host.unload("m1").unwrap();
    assert_eq!(t.trace.count("cleanup:m1"), 1);
    let ids: Vec<String> = t.host.list().iter().map(|m| m.id().to_string()).collect();
    assert_eq!(ids, vec!["m2"]);

    let err = t.host.load_mod(&simple_mod("m3", &["m1"])).unwrap_err();
    assert!(matches!(err, ModError::UnsatisfiedDependency(ref dep) if dep == "m1"));
}

#[test]
fn test_cleanup_runs_in_order_and_stops_at_first_failure() {
    let t = test_host();
    t.host
        .load_mod(
            r#"
            return {
                id = "messy",
                main = function() end,
                cleanupFuncs = {
                    function() record("first") end,
                    function() error("boom") end,
                    function() record("third") end,
                },
            }
            "#,
        )
        .unwrap();

    let err = t.host.unload("messy").unwrap_err();
    match err {
        ModError::CleanupExecution { id, index, .. } => {
            assert_eq!(id, "messy");
            assert_eq!(index, 1);
        }
        other => panic!("expected CleanupExecution, got {:?}", other),
    }
    assert_eq!(t.trace.entries(), vec!["first"]);
    assert!(t.host.find("messy").is_none(), "mod is dropped even on failure");
}

#[test]
fn test_unload_unknown_id_is_not_found() {
    let t = test_host();
    let err = t.host.unload("nobody").unwrap_err();
    assert!(matches!(err, ModError::NotFound(ref id) if id == "nobody"));
}

#[test]
fn test_failing_main_is_not_registered() {
    let t = test_host();
    let err = t
        .host
        .load_mod(r#"return { id = "broken", main = function() error("nope") end }"#)
        .unwrap_err();
    assert!(matches!(err, ModError::EntryPointExecution { ref id, .. } if id == "broken"));
    assert!(t.host.find("broken").is_none());
}

#[test]
fn test_failed_reload_leaves_the_id_absent() {
    let t = test_host();
    t.host.load_mod(&simple_mod("fragile", &[])).unwrap();
    let err = t
        .host
        .load_mod(r#"return { id = "fragile", main = function() error("bad update") end }"#)
        .unwrap_err();

    assert!(matches!(err, ModError::EntryPointExecution { .. }));
    assert_eq!(t.trace.count("cleanup:fragile"), 1);
    assert!(t.host.find("fragile").is_none());
}

#[test]
fn test_main_receives_its_own_module_table() {
    let t = test_host();
    t.host
        .load_mod(
            r#"
            return {
                id = "selfish",
                greeting = "hi",
                main = function(self, api)
                    record(self.id .. ":" .. self.greeting .. ":" .. api.modId)
                end,
            }
            "#,
        )
        .unwrap();
    assert_eq!(t.trace.entries(), vec!["selfish:hi:selfish"]);
}

#[test]
fn test_unload_all_runs_cleanups_newest_first() {
    let t = test_host();
    t.host.load_mod(&simple_mod("base", &[])).unwrap();
    t.host.load_mod(&simple_mod("addon", &["base"])).unwrap();

    t.host.unload_all().unwrap();
    assert!(t.host.list().is_empty());
    assert_eq!(
        t.trace.entries(),
        vec!["main:base", "main:addon", "cleanup:addon", "cleanup:base"]
    );
}

#[test]
fn test_mod_globals_do_not_leak_between_mods() {
    let t = test_host();
    t.host
        .load_mod(r#"secret = "first" return { id = "one", main = function() end }"#)
        .unwrap();
    t.host
        .load_mod(
            r#"
            return {
                id = "two",
                main = function() record(tostring(secret)) end,
            }
            "#,
        )
        .unwrap();
    assert_eq!(t.trace.entries(), vec!["nil"]);
}

#[test]
fn test_failing_cleanup_aborts_replace() {
    let t = test_host();
    t.host
        .load_mod(
            r#"
            return {
                id = "A",
                main = function() end,
                cleanupFuncs = {
                    function() error("boom") end,
                    function() record("second") end,
                },
            }
            "#,
        )
        .unwrap();

    let err = t
        .host
        .load_mod(r#"return { id = "A", main = function() record("new main") end }"#)
        .unwrap_err();
    assert!(
        matches!(err, ModError::CleanupExecution { ref id, index: 0, .. } if id == "A"),
        "got {:?}",
        err
    );
    assert!(t.host.find("A").is_none(), "old instance should be gone");
    assert!(t.trace.entries().is_empty(), "no later cleanup and no new main");
}

#[test]
fn test_same_id_loaded_from_main_is_cleaned_up() {
    let t = test_host();
    t.host
        .registry()
        .lua()
        .globals()
        .set(
            "inner_source",
            r#"
            return {
                id = "dup",
                main = function() record("inner main") end,
                cleanupFuncs = { function() record("inner cleanup") end },
            }
            "#,
        )
        .unwrap();

    t.host
        .load_mod(
            r#"
            return {
                id = "dup",
                main = function(self, api)
                    api:loadMod(inner_source)
                    record("outer main")
                end,
                cleanupFuncs = { function() record("outer cleanup") end },
            }
            "#,
        )
        .unwrap();

    assert_eq!(t.trace.count("inner cleanup"), 1);
    assert_eq!(t.trace.count("outer cleanup"), 0);
    assert_eq!(t.host.list().len(), 1);

    t.host.unload("dup").unwrap();
    assert_eq!(t.trace.count("outer cleanup"), 1);
    assert_eq!(t.trace.count("inner cleanup"), 1);
}

#[test]
fn test_declared_id_is_kept_verbatim() {
    let t = test_host();
    t.host
        .load_mod(r#"return { id = " spaced ", main = function() end }"#)
        .unwrap();
    assert!(t.host.find(" spaced ").is_some());
    assert!(t.host.find("spaced").is_none());
}
