//! Handle for communicating with the expansion controller.
//!
//! The `CapsuleHandle` provides a cheap, cloneable interface for sending
//! requests to the controller and observing the published panel view.

use std::time::Duration;

use eyeball::{SharedObservable, Subscriber};
use tokio::sync::{mpsc, oneshot};

use super::messages::{ControllerMessage, ControllerSnapshot};
use crate::capsule::geometry::{HoverSignal, PointerSample};
use crate::capsule::state::PanelView;

/// Error types for controller communication.
#[derive(Debug, thiserror::Error)]
pub enum ActorError {
    /// Failed to send message to the controller.
    #[error("Failed to send message to controller: channel closed")]
    SendFailed,

    /// Failed to receive response from the controller.
    #[error("Failed to receive response from controller: channel closed")]
    ReceiveFailed,

    /// Query timed out.
    #[error("Query timed out after {0:?}")]
    Timeout(Duration),
}

/// Handle for communicating with an [`ExpansionController`](super::ExpansionController).
///
/// This handle is cheap to clone and can be shared across threads.
#[derive(Clone)]
pub struct CapsuleHandle {
    sender: mpsc::Sender<ControllerMessage>,
    view: SharedObservable<PanelView>,
}

impl CapsuleHandle {
    pub(crate) const fn new(
        sender: mpsc::Sender<ControllerMessage>,
        view: SharedObservable<PanelView>,
    ) -> Self {
        Self { sender, view }
    }

    // ========================================================================
    // Fire-and-forget sending
    // ========================================================================

    /// Send a message to the controller without waiting for delivery.
    ///
    /// # Errors
    ///
    /// Returns [`ActorError::SendFailed`] if the channel is closed or full.
    pub fn send(&self, msg: ControllerMessage) -> Result<(), ActorError> {
        self.sender.try_send(msg).map_err(|_| ActorError::SendFailed)
    }

    /// Send a message to the controller and wait for delivery.
    ///
    /// # Errors
    ///
    /// Returns [`ActorError::SendFailed`] if the channel is closed.
    pub async fn send_async(&self, msg: ControllerMessage) -> Result<(), ActorError> {
        self.sender.send(msg).await.map_err(|_| ActorError::SendFailed)
    }

    /// Reports a hover edge observed now.
    ///
    /// # Errors
    ///
    /// Returns an error if the controller has stopped.
    pub fn hover(&self, inside: bool) -> Result<(), ActorError> {
        self.send(ControllerMessage::Hover(HoverSignal::now(inside)))
    }

    /// Reports a hover edge with an explicit timestamp.
    ///
    /// # Errors
    ///
    /// Returns an error if the controller has stopped.
    pub fn hover_signal(&self, signal: HoverSignal) -> Result<(), ActorError> {
        self.send(ControllerMessage::Hover(signal))
    }

    /// Reports the pointer position in physical pixels.
    ///
    /// # Errors
    ///
    /// Returns an error if the controller has stopped.
    pub fn pointer(&self, sample: PointerSample) -> Result<(), ActorError> {
        self.send(ControllerMessage::Pointer(sample))
    }

    /// Expands immediately, skipping the hover delay.
    ///
    /// # Errors
    ///
    /// Returns an error if the controller has stopped.
    pub fn request_expand(&self) -> Result<(), ActorError> {
        self.send(ControllerMessage::RequestExpand)
    }

    /// Collapses unless a guard holds the panel open.
    ///
    /// # Errors
    ///
    /// Returns an error if the controller has stopped.
    pub fn request_collapse(&self) -> Result<(), ActorError> {
        self.send(ControllerMessage::RequestCollapse { force: false })
    }

    /// Collapses even while held or hovered. The developer pin still wins.
    ///
    /// # Errors
    ///
    /// Returns an error if the controller has stopped.
    pub fn force_collapse(&self) -> Result<(), ActorError> {
        self.send(ControllerMessage::RequestCollapse { force: true })
    }

    /// Holds the panel open, or releases the hold.
    ///
    /// # Errors
    ///
    /// Returns an error if the controller has stopped.
    pub fn set_manual_hold(&self, held: bool) -> Result<(), ActorError> {
        self.send(ControllerMessage::SetManualHold { held })
    }

    /// Pins the panel expanded, or unpins it.
    ///
    /// # Errors
    ///
    /// Returns an error if the controller has stopped.
    pub fn set_dev_force_expanded(&self, enabled: bool) -> Result<(), ActorError> {
        self.send(ControllerMessage::SetDevForceExpanded { enabled })
    }

    /// Sets the collapsed width used from the next collapse on.
    ///
    /// # Errors
    ///
    /// Returns an error if the controller has stopped.
    pub fn set_collapsed_width_hint(&self, width: Option<f64>) -> Result<(), ActorError> {
        self.send(ControllerMessage::SetCollapsedWidthHint { width })
    }

    /// Jumps the native mask to `progress`.
    ///
    /// # Errors
    ///
    /// Returns an error if the controller has stopped.
    pub fn set_native_progress(&self, progress: f64) -> Result<(), ActorError> {
        self.send(ControllerMessage::SetNativeProgress { progress })
    }

    /// Attaches the native mask animator again after a failure.
    ///
    /// # Errors
    ///
    /// Returns an error if the controller has stopped.
    pub fn reattach_native(&self) -> Result<(), ActorError> {
        self.send(ControllerMessage::AttachNative)
    }

    /// Stops the controller.
    ///
    /// # Errors
    ///
    /// Returns an error if the controller has already stopped.
    pub async fn shutdown(&self) -> Result<(), ActorError> {
        self.send_async(ControllerMessage::Shutdown).await
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Snapshot of the controller internals.
    ///
    /// # Errors
    ///
    /// Returns [`ActorError::SendFailed`] if the channel is closed, or
    /// [`ActorError::ReceiveFailed`] if the response channel is closed.
    pub async fn snapshot(&self) -> Result<ControllerSnapshot, ActorError> {
        let (tx, rx) = oneshot::channel();

        self.sender
            .send(ControllerMessage::Query { respond_to: tx })
            .await
            .map_err(|_| ActorError::SendFailed)?;

        rx.await.map_err(|_| ActorError::ReceiveFailed)
    }

    /// Snapshot with a timeout.
    ///
    /// # Errors
    ///
    /// Returns [`ActorError::Timeout`] if the query doesn't complete in time,
    /// or any error from [`Self::snapshot`].
    pub async fn snapshot_timeout(&self, timeout: Duration) -> Result<ControllerSnapshot, ActorError> {
        tokio::time::timeout(timeout, self.snapshot())
            .await
            .map_err(|_| ActorError::Timeout(timeout))?
    }

    // ========================================================================
    // Published view
    // ========================================================================

    /// The current panel view.
    #[must_use]
    pub fn view(&self) -> PanelView { self.view.get() }

    /// Subscribes to panel view changes.
    #[must_use]
    pub fn subscribe(&self) -> Subscriber<PanelView> { self.view.subscribe() }

    /// Whether the controller is still running.
    #[must_use]
    pub fn is_running(&self) -> bool { !self.sender.is_closed() }
}
