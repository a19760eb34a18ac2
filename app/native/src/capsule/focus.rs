//! Best-effort focusability requests.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::platform::CapsuleWindow;

/// Issues focus requests without blocking state transitions.
///
/// Each request is tagged with a generation so a failure of a request that
/// has since been superseded is logged quietly.
pub struct FocusCoordinator {
    window: Arc<dyn CapsuleWindow>,
    generation: Arc<AtomicU64>,
    focusable: bool,
}

impl FocusCoordinator {
    #[must_use]
    pub fn new(window: Arc<dyn CapsuleWindow>) -> Self {
        Self {
            window,
            generation: Arc::new(AtomicU64::new(0)),
            focusable: false,
        }
    }

    /// Last requested focusability.
    #[must_use]
    pub const fn focusable(&self) -> bool { self.focusable }

    /// Generation of the most recent request.
    #[must_use]
    pub fn generation(&self) -> u64 { self.generation.load(Ordering::SeqCst) }

    /// Requests the window to become (or stop being) focusable.
    ///
    /// Returns immediately; the request completes on a spawned task.
    pub fn set_focusable(&mut self, focusable: bool) -> u64 {
        self.focusable = focusable;
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let latest = Arc::clone(&self.generation);
        let request = self.window.request_focus(focusable);

        tokio::spawn(async move {
            if let Err(err) = request.await {
                if latest.load(Ordering::SeqCst) == generation {
                    tracing::warn!(error = %err, focusable, "focus request failed");
                } else {
                    tracing::debug!(error = %err, focusable, generation, "superseded focus request failed");
                }
            }
        });

        generation
    }
}
