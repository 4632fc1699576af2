//! One-shot startup gate.
//!
//! Mods must not be loaded before the host environment is initialised. The
//! host hands in a probe; startup polls it on a fixed interval until it
//! reports ready, then never looks at it again.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::error::{ModError, ModResult};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

pub trait ReadinessProbe {
    fn is_ready(&self) -> bool;
}

impl<F: Fn() -> bool> ReadinessProbe for F {
    fn is_ready(&self) -> bool {
        self()
    }
}

/// Flag the host flips once it has finished initialising.
#[derive(Debug, Clone, Default)]
pub struct ReadyFlag(Arc<AtomicBool>);

impl ReadyFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ready() -> Self {
        let flag = Self::new();
        flag.mark_ready();
        flag
    }

    pub fn mark_ready(&self) {
        self.0.store(true, Ordering::Release);
    }
}

impl ReadinessProbe for ReadyFlag {
    fn is_ready(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Poll `probe` every `poll` until it is ready or `timeout` elapses.
pub async fn wait_until_ready<P>(
    probe: &P,
    poll: Duration,
    timeout: Option<Duration>,
) -> ModResult<()>
where
    P: ReadinessProbe + ?Sized,
{
    let wait = async {
        let mut ticker = tokio::time::interval(poll.max(Duration::from_millis(1)));
        loop {
            ticker.tick().await;
            if probe.is_ready() {
                return;
            }
        }
    };

    match timeout {
        Some(limit) => tokio::time::timeout(limit, wait)
            .await
            .map_err(|_| ModError::ReadinessTimeout(limit)),
        None => {
            wait.await;
            Ok(())
        }
    }
}
