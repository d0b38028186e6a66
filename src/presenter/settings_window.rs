use tracing::debug;

use super::SettingsPresenter;
use crate::ws::protocol::{PushEvent, SurfaceAction};
use crate::ws::websocket_server::EventSender;

pub struct BridgeSettingsWindow {
    events: EventSender,
}

impl BridgeSettingsWindow {
    pub fn new(events: EventSender) -> Self {
        Self { events }
    }

    fn push(&self, event: PushEvent) {
        if let Err(e) = self.events.send(event) {
            debug!("no settings client connected, dropped {:?}", e.0);
        }
    }
}

impl SettingsPresenter for BridgeSettingsWindow {
    fn show(&mut self) {
        self.push(PushEvent::Settings {
            action: SurfaceAction::Show,
        });
    }

    fn hide(&mut self) {
        self.push(PushEvent::Settings {
            action: SurfaceAction::Hide,
        });
    }

    fn next_rest_time(&mut self, timestamp_ms: i64) {
        self.push(PushEvent::NextRestTime {
            timestamp: timestamp_ms,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ws::websocket_server::create_event_channel;

    #[test]
    fn test_pushes_reach_subscribers() {
        let events = create_event_channel();
        let mut rx = events.subscribe();
        let mut window = BridgeSettingsWindow::new(events);

        window.next_rest_time(1_800_000);
        window.show();

        assert_eq!(
            rx.try_recv().unwrap(),
            PushEvent::NextRestTime {
                timestamp: 1_800_000
            }
        );
        assert_eq!(
            rx.try_recv().unwrap(),
            PushEvent::Settings {
                action: SurfaceAction::Show
            }
        );
    }
}
