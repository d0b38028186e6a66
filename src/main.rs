use clap::Parser;
use serde_json::Value;
use std::io::ErrorKind;
use tracing::{error, info};

mod autolaunch;
mod config;
mod error;
mod logging;
mod presenter;
mod settings;
mod timer;
mod ws;

use config::{Cli, Command};
use presenter::{BridgeOverlay, BridgeSettingsWindow};
use settings::{JsonFileBackend, SettingsStore};
use timer::{SystemClock, TimerController};
use ws::protocol::Channel;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match client_request(cli.command())? {
        None => run_daemon_mode(cli).await,
        Some(request) => {
            logging::init(cli.verbose, None);
            run_client(&cli, request).await
        }
    }
}

/// Run in daemon mode - WebSocket bridge + break timer
async fn run_daemon_mode(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let log_dir = cli.log_dir();
    let _guard = logging::init(cli.verbose, Some(&log_dir));
    logging::install_panic_hook();

    let listener = match ws::websocket_server::bind(cli.listen).await {
        Ok(listener) => listener,
        Err(e) if e.kind() == ErrorKind::AddrInUse => {
            info!("Another instance owns {}, asking it to open settings", cli.listen);
            ws::client::call(cli.listen, Channel::App, "showSettings", None).await?;
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    info!("👁 Eye Rest - Daemon Mode");
    info!("Logging to: {}", log_dir.display());

    let events = ws::websocket_server::create_event_channel();
    let store = SettingsStore::open(Box::new(JsonFileBackend::new(cli.config_dir())));
    let (controller, handle) = TimerController::new(
        store,
        Box::new(BridgeOverlay::new(events.clone(), !cli.no_notify)),
        Box::new(BridgeSettingsWindow::new(events.clone())),
        autolaunch::platform_launcher(),
        Box::new(SystemClock),
    );

    let server = tokio::spawn(ws::websocket_server::start_websocket_server(
        listener, handle, events,
    ));

    tokio::select! {
        _ = controller.run() => error!("Timer controller stopped unexpectedly"),
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                error!("Failed to listen for shutdown signal: {}", e);
            }
            info!("Shutting down");
        }
    }

    server.abort();
    Ok(())
}

type ClientRequest = (Channel, &'static str, Option<Value>);

/// Maps a subcommand onto a bridge call. `None` means run the daemon.
fn client_request(command: Command) -> Result<Option<ClientRequest>, serde_json::Error> {
    let request = match command {
        Command::Daemon => return Ok(None),
        Command::Status => (Channel::App, "status", None),
        Command::RestNow => (Channel::App, "restNow", None),
        Command::EndBreak => (Channel::Break, "close", None),
        Command::Prepare => (Channel::Break, "prepare", None),
        Command::Settings => (Channel::App, "showSettings", None),
        Command::Set {
            work,
            break_minutes,
            auto_launch,
        } => {
            let patch = settings::SettingsPatch {
                work_minutes: work,
                break_minutes,
                auto_launch_enabled: auto_launch,
            };
            (Channel::Config, "update", Some(serde_json::to_value(patch)?))
        }
    };
    Ok(Some(request))
}

async fn run_client(
    cli: &Cli,
    (channel, method, params): ClientRequest,
) -> Result<(), Box<dyn std::error::Error>> {
    let result = ws::client::call(cli.listen, channel, method, params).await?;
    match result {
        Some(value) if method == "status" => print_status(&value),
        Some(value) => println!("{}", serde_json::to_string_pretty(&value)?),
        None => println!("ok"),
    }
    Ok(())
}

fn print_status(status: &Value) {
    let phase = status["phase"].as_str().unwrap_or("unknown");
    let settings = &status["settings"];
    println!(
        "Phase: {}  ({}min work / {}min break, auto-launch {})",
        phase,
        settings["workMinutes"],
        settings["breakMinutes"],
        settings["autoLaunchEnabled"]
    );
    if let Some(ts) = settings["nextBreakTimestamp"].as_i64() {
        if phase == "working" {
            println!("Next break: {}", timer::clock::format_timestamp(ts));
        }
    }
    if let Some(ts) = status["breakEndsAt"].as_i64() {
        println!("Break ends: {}", timer::clock::format_timestamp(ts));
    }
}
