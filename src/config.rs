use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::ws::websocket_server::DEFAULT_LISTEN;

const APP_DIR: &str = "eye-rest";

#[derive(Parser, Debug)]
#[command(name = "eye-rest", version, about = "Reminds you to look away from the screen")]
pub struct Cli {
    /// Bridge address. Also acts as the single-instance lock.
    #[arg(long, default_value = DEFAULT_LISTEN)]
    pub listen: SocketAddr,

    /// Directory holding settings.json.
    #[arg(long)]
    pub config_dir: Option<PathBuf>,

    /// Directory for daily log files.
    #[arg(long)]
    pub log_dir: Option<PathBuf>,

    /// Debug-level logging; honours RUST_LOG.
    #[arg(short, long)]
    pub verbose: bool,

    /// Skip desktop notifications when a break starts.
    #[arg(long)]
    pub no_notify: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Run the background timer (default).
    Daemon,
    /// Show the current phase and settings.
    Status,
    /// Start a break right away.
    RestNow,
    /// End the current break early.
    EndBreak,
    /// Hide the break overlay for a moment without ending the break.
    Prepare,
    /// Ask the settings surface to open.
    Settings,
    /// Change durations or auto-launch.
    Set {
        #[arg(long)]
        work: Option<i64>,
        #[arg(long = "break")]
        break_minutes: Option<i64>,
        #[arg(long)]
        auto_launch: Option<bool>,
    },
}

impl Cli {
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Daemon)
    }

    pub fn config_dir(&self) -> PathBuf {
        self.config_dir.clone().unwrap_or_else(|| {
            dirs::config_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(APP_DIR)
        })
    }

    pub fn log_dir(&self) -> PathBuf {
        self.log_dir.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(APP_DIR)
                .join("logs")
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_to_daemon() {
        let cli = Cli::try_parse_from(["eye-rest"]).unwrap();
        assert_eq!(cli.command(), Command::Daemon);
        assert_eq!(cli.listen, DEFAULT_LISTEN.parse::<SocketAddr>().unwrap());
        assert!(cli.config_dir().ends_with(APP_DIR));
        assert!(cli.log_dir().ends_with("logs"));
    }

    #[test]
    fn test_set_subcommand() {
        let cli = Cli::try_parse_from([
            "eye-rest",
            "--config-dir",
            "/tmp/eye",
            "set",
            "--work",
            "45",
            "--break",
            "10",
            "--auto-launch",
            "false",
        ])
        .unwrap();
        assert_eq!(cli.config_dir(), PathBuf::from("/tmp/eye"));
        assert_eq!(
            cli.command(),
            Command::Set {
                work: Some(45),
                break_minutes: Some(10),
                auto_launch: Some(false),
            }
        );
    }

    #[test]
    fn test_rejects_bad_listen_address() {
        assert!(Cli::try_parse_from(["eye-rest", "--listen", "nowhere"]).is_err());
    }
}
