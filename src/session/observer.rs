use super::commands::SessionCommand;
use crate::platform::CaptureDevice;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

/// Registration for subject-area change notifications of one device.
///
/// Notifications are forwarded onto the session queue until the handle is
/// released or dropped.
pub(crate) struct SubjectAreaObserver {
    token: CancellationToken,
}

impl SubjectAreaObserver {
    pub fn register(
        device: &dyn CaptureDevice,
        commands: mpsc::WeakUnboundedSender<SessionCommand>,
        parent: &CancellationToken,
    ) -> Self {
        let mut changes = device.subject_area_changes();
        let token = parent.child_token();
        let task_token = token.clone();
        let device_id = device.unique_id();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = task_token.cancelled() => break,
                    change = changes.recv() => {
                        match change {
                            Ok(()) => {}
                            Err(RecvError::Lagged(n)) => {
                                trace!("Coalesced {} subject area changes on {}", n, device_id);
                            }
                            Err(RecvError::Closed) => break,
                        }

                        let Some(sender) = commands.upgrade() else {
                            break;
                        };
                        if sender.send(SessionCommand::SubjectAreaChanged).is_err() {
                            break;
                        }
                    }
                }
            }
            debug!("Subject area observation on {} ended", device_id);
        });

        debug!("Observing subject area changes");
        Self { token }
    }

    /// Stop forwarding notifications
    pub fn release(self) {
        self.token.cancel();
        debug!("Released subject area observation");
    }
}

impl Drop for SubjectAreaObserver {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
