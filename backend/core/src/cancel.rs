use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::{DocsiftError, DocsiftResult};

/// Shared, cloneable cancellation flag checked between pipeline stages.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag {
    cancelled: Arc<AtomicBool>,
}

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Return `Err(Cancelled)` once the flag has been raised.
    pub fn check(&self) -> DocsiftResult<()> {
        if self.is_cancelled() {
            Err(DocsiftError::Cancelled)
        } else {
            Ok(())
        }
    }
}
