pub mod clock;
pub mod controller;
pub mod countdown;
pub mod phase;

pub use clock::SystemClock;
pub use controller::{ControllerHandle, Reply, Request, TimerController};
