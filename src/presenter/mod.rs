pub mod overlay;
pub mod settings_window;

pub use overlay::BridgeOverlay;
pub use settings_window::BridgeSettingsWindow;

/// The full-screen break surface. Calls are fire-and-forget.
pub trait OverlayPresenter: Send {
    /// Must be idempotent: showing a visible overlay only re-asserts focus.
    fn show(&mut self);
    fn hide(&mut self);
}

/// The configuration surface.
pub trait SettingsPresenter: Send {
    fn show(&mut self);
    fn hide(&mut self);
    fn next_rest_time(&mut self, timestamp_ms: i64);
}
