//! Shared helpers for the integration tests

#![allow(dead_code)]

use modhost_core::{HostMessenger, ModHost};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    Status(String),
    Inform { title: String, text: String },
}

/// Messenger that keeps everything it was asked to show.
#[derive(Debug, Default)]
pub struct RecordingMessenger {
    messages: Mutex<Vec<Message>>,
}

impl RecordingMessenger {
    pub fn messages(&self) -> Vec<Message> {
        self.messages.lock().unwrap().clone()
    }
}

impl HostMessenger for RecordingMessenger {
    fn show_message(&self, text: &str) {
        self.messages
            .lock()
            .unwrap()
            .push(Message::Status(text.to_string()));
    }

    fn inform(&self, title: &str, text: &str) {
        self.messages.lock().unwrap().push(Message::Inform {
            title: title.to_string(),
            text: text.to_string(),
        });
    }
}

/// Ordered list of strings mods push through the global `record(text)`.
#[derive(Debug, Clone, Default)]
pub struct Trace(Arc<Mutex<Vec<String>>>);

impl Trace {
    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn count(&self, entry: &str) -> usize {
        self.0.lock().unwrap().iter().filter(|e| *e == entry).count()
    }
}

pub struct TestHost {
    pub host: ModHost,
    pub messenger: Arc<RecordingMessenger>,
    pub trace: Trace,
}

pub fn test_host() -> TestHost {
    let messenger = Arc::new(RecordingMessenger::default());
    let host = ModHost::new(messenger.clone());
    let trace = Trace::default();

    let sink = trace.clone();
    let lua = host.registry().lua();
    let record = lua
        .create_function(move |_, text: String| {
            sink.0.lock().unwrap().push(text);
            Ok(())
        })
        .unwrap();
    lua.globals().set("record", record).unwrap();

    TestHost {
        host,
        messenger,
        trace,
    }
}

/// Minimal mod source with an id, optional dependencies and a cleanup that
/// records `cleanup:<id>`.
pub fn simple_mod(id: &str, depends: &[&str]) -> String {
    let depends = depends
        .iter()
        .map(|d| format!("{:?}", d))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        r#"
        return {{
            id = "{id}",
            depends = {{ {depends} }},
            main = function(self, api) record("main:{id}") end,
            cleanupFuncs = {{ function() record("cleanup:{id}") end }},
        }}
        "#
    )
}
