//! Integration tests for the API object mods receive

mod common;

use common::{simple_mod, test_host, Message};

#[test]
fn test_inform_goes_through_the_messenger() {
    let t = test_host();
    t.host
        .load_mod(
            r#"
            return {
                id = "chatty",
                main = function(self, api)
                    api:inform("Hello, world!", "Example Mod")
                    api:inform("No title")
                    api:showMsg("status line")
                end,
            }
            "#,
        )
        .unwrap();

    assert_eq!(
        t.messenger.messages(),
        vec![
            Message::Inform {
                title: "Example Mod".into(),
                text: "Hello, world!".into()
            },
            Message::Inform {
                title: "Information".into(),
                text: "No title".into()
            },
            Message::Status("status line".into()),
        ]
    );
}

#[test]
fn test_add_api_is_visible_to_later_mods_only() {
    let t = test_host();
    t.host
        .load_mod(
            r#"
            return {
                id = "early",
                main = function(self, api)
                    _G.early_api = api
                end,
            }
            "#,
        )
        .unwrap();
    t.host
        .load_mod(
            r#"
            return {
                id = "provider",
                main = function(self, api)
                    api:addApi("greeter", { greet = function(name) return "hello " .. name end })
                    record("self sees " .. type(api.greeter))
                end,
            }
            "#,
        )
        .unwrap();
    t.host
        .load_mod(
            r#"
            return {
                id = "consumer",
                main = function(self, api)
                    record(api.greeter.greet("consumer"))
                    record("early sees " .. type(early_api.greeter))
                end,
            }
            "#,
        )
        .unwrap();

    assert_eq!(
        t.trace.entries(),
        vec!["self sees table", "hello consumer", "early sees nil"]
    );
    assert_eq!(t.host.extra_api_names(), vec!["greeter"]);
}

#[test]
fn test_extra_api_survives_its_provider_being_unloaded() {
    let t = test_host();
    t.host
        .load_mod(
            r#"
            return {
                id = "provider",
                main = function(self, api) api:addApi("answer", 42) end,
            }
            "#,
        )
        .unwrap();
    t.host.unload("provider").unwrap();
    t.host
        .load_mod(
            r#"
            return {
                id = "late",
                main = function(self, api) record(tostring(api.answer)) end,
            }
            "#,
        )
        .unwrap();
    assert_eq!(t.trace.entries(), vec!["42"]);
}

#[test]
fn test_mod_can_load_and_unload_other_mods() {
    let t = test_host();
    let child = simple_mod("child", &[]);
    let lua = t.host.registry().lua();
    lua.globals().set("child_source", child).unwrap();

    t.host
        .load_mod(
            r#"
            return {
                id = "parent",
                main = function(self, api)
                    local id = api:loadMod(child_source)
                    record("loaded " .. id)
                    record("mods " .. table.concat(api:listMods(), ","))
                    record("child author " .. api:findMod("child").author)
                    api:unloadMod("child")
                    record("after unload " .. tostring(api:findMod("child")))
                end,
            }
            "#,
        )
        .unwrap();

    assert_eq!(
        t.trace.entries(),
        vec![
            "main:child",
            "loaded child",
            "mods child",
            "child author Anonymous",
            "cleanup:child",
            "after unload nil",
        ]
    );
    let ids: Vec<String> = t.host.list().iter().map(|m| m.id().to_string()).collect();
    assert_eq!(ids, vec!["parent"]);
}

#[test]
fn test_lua_sees_host_errors_from_api_calls() {
    let t = test_host();
    t.host
        .load_mod(
            r#"
            return {
                id = "careful",
                main = function(self, api)
                    local ok, err = pcall(function() api:unloadMod("missing") end)
                    record(tostring(ok))
                    record(tostring(err):find("missing", 1, true) and "mentions id" or tostring(err))
                end,
            }
            "#,
        )
        .unwrap();
    assert_eq!(t.trace.entries(), vec!["false", "mentions id"]);
}

#[test]
fn test_mods_can_emit_events_to_each_other() {
    let t = test_host();
    t.host
        .load_mod(
            r#"
            return {
                id = "listener",
                main = function(self, api)
                    api:addEventListener("custom", function(event)
                        record("got " .. event.detail.value)
                        event:preventDefault()
                    end)
                end,
            }
            "#,
        )
        .unwrap();
    t.host
        .load_mod(
            r#"
            return {
                id = "emitter",
                main = function(self, api)
                    local delivered = api:emit("custom", true, { value = "ping" })
                    record("delivered " .. tostring(delivered))
                end,
            }
            "#,
        )
        .unwrap();

    assert_eq!(t.trace.entries(), vec!["got ping", "delivered false"]);
}

#[test]
fn test_listener_can_unload_a_later_mod_mid_dispatch() {
    let t = test_host();
    t.host
        .load_mod(
            r#"
            return {
                id = "killer",
                main = function(self, api)
                    api:addEventListener("ping", function()
                        record("killer")
                        api:unloadMod("victim")
                    end)
                end,
            }
            "#,
        )
        .unwrap();
    t.host
        .load_mod(
            r#"
            return {
                id = "victim",
                main = function(self, api)
                    api:addEventListener("ping", function() record("victim") end)
                end,
            }
            "#,
        )
        .unwrap();

    assert!(t.host.emit("ping", false, None).unwrap());
    assert_eq!(t.trace.entries(), vec!["killer"]);
    assert!(t.host.find("victim").is_none());
}

#[test]
fn test_cleanup_can_reach_the_registry() {
    let t = test_host();
    t.host
        .load_mod(
            r#"
            local host
            return {
                id = "tidy",
                main = function(self, api) host = api end,
                cleanupFuncs = {
                    function() record("still listed: " .. tostring(host:findMod("tidy") ~= nil)) end,
                },
            }
            "#,
        )
        .unwrap();
    t.host.unload("tidy").unwrap();
    assert_eq!(t.trace.entries(), vec!["still listed: false"]);
}
