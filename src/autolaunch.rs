use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{AppError, AppResult};

pub const DESKTOP_FILE_NAME: &str = "eye-rest.desktop";

/// Registers the process to start at login.
pub trait AutoLauncher: Send {
    fn set_enabled(&self, enabled: bool) -> AppResult<()>;
}

/// XDG autostart entry (`~/.config/autostart/eye-rest.desktop`).
pub struct XdgAutostart {
    desktop_file: PathBuf,
    exe: PathBuf,
}

impl XdgAutostart {
    pub fn new(autostart_dir: &Path, exe: PathBuf) -> Self {
        Self {
            desktop_file: autostart_dir.join(DESKTOP_FILE_NAME),
            exe,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.desktop_file.exists()
    }

    fn entry(&self) -> String {
        format!(
            "[Desktop Entry]\n\
             Type=Application\n\
             Name=Eye Rest\n\
             Comment=Reminds you to take screen breaks\n\
             Exec=\"{}\" daemon\n\
             X-GNOME-Autostart-enabled=true\n\
             Hidden=false\n\
             NoDisplay=false\n",
            self.exe.display()
        )
    }
}

impl AutoLauncher for XdgAutostart {
    fn set_enabled(&self, enabled: bool) -> AppResult<()> {
        let failed = |e: std::io::Error| {
            AppError::AutoLaunchRegistrationFailed(format!("{}: {}", self.desktop_file.display(), e))
        };

        if enabled {
            let entry = self.entry();
            if fs::read_to_string(&self.desktop_file).ok().as_deref() == Some(entry.as_str()) {
                debug!("autostart entry already current");
                return Ok(());
            }
            if let Some(parent) = self.desktop_file.parent() {
                fs::create_dir_all(parent).map_err(failed)?;
            }
            fs::write(&self.desktop_file, entry).map_err(failed)?;
            info!("Registered autostart entry {}", self.desktop_file.display());
        } else if self.is_enabled() {
            fs::remove_file(&self.desktop_file).map_err(failed)?;
            info!("Removed autostart entry {}", self.desktop_file.display());
        }
        Ok(())
    }
}

pub struct Unsupported;

impl AutoLauncher for Unsupported {
    fn set_enabled(&self, _enabled: bool) -> AppResult<()> {
        Err(AppError::AutoLaunchRegistrationFailed(format!(
            "login registration is not supported on {}",
            std::env::consts::OS
        )))
    }
}

pub fn platform_launcher() -> Box<dyn AutoLauncher> {
    if !cfg!(any(target_os = "linux", target_os = "freebsd", target_os = "openbsd")) {
        return Box::new(Unsupported);
    }
    match (dirs::config_dir(), std::env::current_exe()) {
        (Some(config), Ok(exe)) => Box::new(XdgAutostart::new(&config.join("autostart"), exe)),
        _ => Box::new(Unsupported),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enable_then_disable() {
        let dir = tempfile::tempdir().unwrap();
        let autostart = dir.path().join("autostart");
        let launcher = XdgAutostart::new(&autostart, PathBuf::from("/opt/eye-rest/eye-rest"));

        launcher.set_enabled(true).unwrap();
        assert!(launcher.is_enabled());
        let entry = fs::read_to_string(autostart.join(DESKTOP_FILE_NAME)).unwrap();
        assert!(entry.starts_with("[Desktop Entry]"));
        assert!(entry.contains("Exec=\"/opt/eye-rest/eye-rest\" daemon"));

        // Enabling twice is harmless.
        launcher.set_enabled(true).unwrap();

        launcher.set_enabled(false).unwrap();
        assert!(!launcher.is_enabled());
        launcher.set_enabled(false).unwrap();
    }

    #[test]
    fn test_unwritable_dir_reports_registration_failure() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("autostart");
        fs::write(&blocker, "not a directory").unwrap();
        let launcher = XdgAutostart::new(&blocker, PathBuf::from("/bin/true"));

        let err = launcher.set_enabled(true).unwrap_err();
        assert!(matches!(err, AppError::AutoLaunchRegistrationFailed(_)));
    }
}
