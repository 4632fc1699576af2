//! Host messaging collaborator.
//!
//! Mods talk to the user through `api:inform` and `api:showMsg`; how the text
//! is presented is up to the embedding host.

/// Fire-and-forget user messaging provided by the host.
pub trait HostMessenger: Send + Sync {
    /// Short status message.
    fn show_message(&self, text: &str);

    /// Titled informational dialog.
    fn inform(&self, title: &str, text: &str);
}

/// Messenger that writes everything to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogMessenger;

impl HostMessenger for LogMessenger {
    fn show_message(&self, text: &str) {
        log::info!("{}", text);
    }

    fn inform(&self, title: &str, text: &str) {
        log::info!("[{}] {}", title, text);
    }
}
