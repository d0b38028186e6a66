use serde::Serialize;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

use super::clock::{Clock, format_timestamp};
use super::countdown::{Countdown, CountdownKind};
use super::phase::{PREPARE_HIDE, Phase, minutes};
use crate::autolaunch::AutoLauncher;
use crate::error::{AppError, AppResult};
use crate::presenter::{OverlayPresenter, SettingsPresenter};
use crate::settings::{Settings, SettingsPatch, SettingsStore};

/// Everything the outside world can ask of the controller.
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    GetConfig,
    UpdateConfig(SettingsPatch),
    CloseBreak,
    PrepareBreak,
    RestNow,
    Status,
    ShowSettings,
    HideSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Reply {
    Ack,
    Settings(Settings),
    Status(Status),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Status {
    pub phase: Phase,
    pub settings: Settings,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub break_ends_at: Option<i64>,
}

pub enum ControllerEvent {
    Elapsed { kind: CountdownKind, generation: u64 },
    Request(Request, oneshot::Sender<AppResult<Reply>>),
}

/// Cloneable way in for the bridge and the CLI.
#[derive(Clone)]
pub struct ControllerHandle {
    tx: mpsc::UnboundedSender<ControllerEvent>,
}

impl ControllerHandle {
    pub async fn request(&self, request: Request) -> AppResult<Reply> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(ControllerEvent::Request(request, reply_tx))
            .map_err(|_| AppError::ControllerGone)?;
        reply_rx.await.map_err(|_| AppError::ControllerGone)?
    }
}

/// Owns the work/break cycle. Runs on a single task; all state changes happen in `handle`.
pub struct TimerController {
    phase: Phase,
    store: SettingsStore,
    overlay: Box<dyn OverlayPresenter>,
    settings_window: Box<dyn SettingsPresenter>,
    launcher: Box<dyn AutoLauncher>,
    clock: Box<dyn Clock>,
    work: Countdown,
    rest: Countdown,
    reshow: Countdown,
    break_ends_at: Option<i64>,
    tx: mpsc::UnboundedSender<ControllerEvent>,
    rx: mpsc::UnboundedReceiver<ControllerEvent>,
}

impl TimerController {
    pub fn new(
        store: SettingsStore,
        overlay: Box<dyn OverlayPresenter>,
        settings_window: Box<dyn SettingsPresenter>,
        launcher: Box<dyn AutoLauncher>,
        clock: Box<dyn Clock>,
    ) -> (Self, ControllerHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = ControllerHandle { tx: tx.clone() };
        let controller = Self {
            phase: Phase::Idle,
            store,
            overlay,
            settings_window,
            launcher,
            clock,
            work: Countdown::new(CountdownKind::Work),
            rest: Countdown::new(CountdownKind::Break),
            reshow: Countdown::new(CountdownKind::Reshow),
            break_ends_at: None,
            tx,
            rx,
        };
        (controller, handle)
    }

    /// Starts the cycle and processes events until the task is dropped.
    pub async fn run(mut self) {
        self.start();
        while let Some(event) = self.rx.recv().await {
            self.handle(event);
        }
    }

    fn start(&mut self) {
        let settings = self.store.get();
        info!(
            "Starting break cycle: {}min work / {}min break",
            settings.work_minutes, settings.break_minutes
        );
        self.apply_auto_launch(settings.auto_launch_enabled);
        self.begin_work();
    }

    fn handle(&mut self, event: ControllerEvent) {
        match event {
            ControllerEvent::Elapsed { kind, generation } => self.on_elapsed(kind, generation),
            ControllerEvent::Request(request, reply) => {
                let result = self.on_request(request);
                if let Err(ref e) = result {
                    error!("request failed: {}", e);
                }
                if reply.send(result).is_err() {
                    debug!("requester went away before the reply");
                }
            }
        }
    }

    fn on_elapsed(&mut self, kind: CountdownKind, generation: u64) {
        let countdown = match kind {
            CountdownKind::Work => &mut self.work,
            CountdownKind::Break => &mut self.rest,
            CountdownKind::Reshow => &mut self.reshow,
        };
        if !countdown.claim(generation) {
            debug!("ignoring stale {:?} countdown #{}", kind, generation);
            return;
        }

        match kind {
            CountdownKind::Work => {
                info!("Work session complete, time for a break");
                self.begin_break();
            }
            CountdownKind::Break => {
                info!("Break is over");
                self.begin_work();
            }
            CountdownKind::Reshow => {
                if self.phase == Phase::OnBreak {
                    debug!("prepare window over, showing overlay again");
                    self.overlay.show();
                }
            }
        }
    }

    fn on_request(&mut self, request: Request) -> AppResult<Reply> {
        debug!("request: {:?}", request);
        match request {
            Request::GetConfig => Ok(Reply::Settings(self.store.get())),
            Request::UpdateConfig(patch) => {
                let settings = self.store.update(&patch)?;
                info!(
                    "Settings updated: {}min work / {}min break, auto-launch {}",
                    settings.work_minutes, settings.break_minutes, settings.auto_launch_enabled
                );
                self.apply_auto_launch(settings.auto_launch_enabled);
                if self.phase == Phase::OnBreak {
                    info!("Abandoning current break to apply new settings");
                }
                self.begin_work();
                Ok(Reply::Ack)
            }
            Request::CloseBreak => {
                if self.phase == Phase::OnBreak {
                    info!("Break ended early");
                    self.begin_work();
                } else {
                    warn!("close requested while {}, nothing to end", self.phase);
                }
                Ok(Reply::Ack)
            }
            Request::PrepareBreak => {
                if self.phase == Phase::OnBreak {
                    if self.reshow.is_pending() {
                        debug!("prepare repeated, restarting the grace window");
                    }
                    self.overlay.hide();
                    self.reshow.schedule(PREPARE_HIDE, &self.tx);
                } else {
                    debug!("prepare requested while {}, ignoring", self.phase);
                }
                Ok(Reply::Ack)
            }
            Request::RestNow => {
                info!("Break requested now");
                self.begin_break();
                Ok(Reply::Ack)
            }
            Request::Status => Ok(Reply::Status(Status {
                phase: self.phase,
                settings: self.store.get(),
                break_ends_at: self.break_ends_at,
            })),
            Request::ShowSettings => {
                self.settings_window.show();
                Ok(Reply::Ack)
            }
            Request::HideSettings => {
                self.settings_window.hide();
                Ok(Reply::Ack)
            }
        }
    }

    /// (Re)enters the work phase from any state, dropping every pending countdown.
    fn begin_work(&mut self) {
        self.work.cancel();
        self.rest.cancel();
        self.reshow.cancel();
        if self.phase == Phase::OnBreak {
            self.overlay.hide();
        }
        self.break_ends_at = None;
        self.set_phase(Phase::Working);

        let settings = self.store.get();
        let next_break = self.clock.now_ms().saturating_add(settings.work_ms());
        self.store.record_next_break(next_break);
        self.work.schedule(minutes(settings.work_minutes), &self.tx);

        info!("Next break at {}", format_timestamp(next_break));
        self.settings_window.next_rest_time(next_break);
    }

    fn begin_break(&mut self) {
        self.work.cancel();
        self.reshow.cancel();
        self.set_phase(Phase::OnBreak);
        self.overlay.show();

        let settings = self.store.get();
        self.break_ends_at = Some(self.clock.now_ms().saturating_add(settings.break_ms()));
        self.rest.schedule(minutes(settings.break_minutes), &self.tx);
    }

    fn set_phase(&mut self, phase: Phase) {
        if self.phase != phase {
            info!("Switched to {}", phase);
            self.phase = phase;
        }
    }

    fn apply_auto_launch(&self, enabled: bool) {
        if let Err(e) = self.launcher.set_enabled(enabled) {
            warn!("{}", e);
        }
    }
}
