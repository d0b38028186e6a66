use notify_rust::Notification;
use tracing::{debug, warn};

use super::OverlayPresenter;
use crate::ws::protocol::{PushEvent, SurfaceAction};
use crate::ws::websocket_server::EventSender;

/// Drives overlay clients over the bridge and raises a desktop notification when a break starts.
pub struct BridgeOverlay {
    events: EventSender,
    visible: bool,
    notify: bool,
}

impl BridgeOverlay {
    pub fn new(events: EventSender, notify: bool) -> Self {
        Self {
            events,
            visible: false,
            notify,
        }
    }

    fn broadcast(&self, action: SurfaceAction) {
        if self.events.send(PushEvent::Overlay { action }).is_err() {
            debug!("no overlay client connected for {:?}", action);
        }
    }
}

impl OverlayPresenter for BridgeOverlay {
    fn show(&mut self) {
        // Clients treat a repeated show as "raise and keep on top".
        self.broadcast(SurfaceAction::Show);
        if self.visible {
            debug!("overlay already visible, re-asserting");
            return;
        }
        self.visible = true;
        if self.notify {
            // D-Bus can stall; keep it off the controller task.
            tokio::task::spawn_blocking(|| {
                if let Err(e) = send_notification("Time to rest your eyes.") {
                    warn!("Failed to send notification: {}", e);
                }
            });
        }
    }

    fn hide(&mut self) {
        self.broadcast(SurfaceAction::Hide);
        self.visible = false;
    }
}

fn send_notification(message: &str) -> Result<(), Box<dyn std::error::Error>> {
    Notification::new()
        .summary("Eye Rest - Break time")
        .body(message)
        .show()?;
    Ok(())
}
