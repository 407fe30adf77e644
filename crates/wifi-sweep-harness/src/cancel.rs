use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Result;
use tracing::warn;

/// Cooperative stop signal checked between simulator invocations.
///
/// A running invocation is never killed. The sweep stops at the next
/// combination boundary and still writes its report, keeping everything
/// finished up to that point.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Route Ctrl-C into this token. Can only be installed once per process.
    pub fn install_ctrlc_handler(&self) -> Result<()> {
        let token = self.clone();
        ctrlc::set_handler(move || {
            warn!("interrupt received; stopping after the current invocation");
            token.cancel();
        })?;
        Ok(())
    }
}
