//! Location dispatch for iOS simulators (`xcrun simctl`) and Android
//! emulators (`adb emu geo fix`).

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use engine::PlatformDispatcher;
use shared::{
    domain::{Coordinate, Platform, PlatformTarget},
    error::DispatchError,
};
use tokio::process::Command;
use tracing::debug;

pub mod tools;

pub use tools::{ensure_tool_available, find_executable, list_devices, tool_for};

/// Program and arguments that set one location on a target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationCommand {
    pub platform: Platform,
    pub args: Vec<String>,
}

pub fn location_command(target: &PlatformTarget, coordinate: Coordinate) -> LocationCommand {
    match target {
        PlatformTarget::Ios { udid } => LocationCommand {
            platform: Platform::Ios,
            args: vec![
                "simctl".into(),
                "location".into(),
                udid.clone(),
                "set".into(),
                format!("{},{}", coordinate.latitude, coordinate.longitude),
            ],
        },
        PlatformTarget::Android { serial } => {
            let mut args = Vec::with_capacity(6);
            if let Some(serial) = serial {
                args.push("-s".to_string());
                args.push(serial.clone());
            }
            // geo fix takes longitude first.
            args.extend([
                "emu".to_string(),
                "geo".to_string(),
                "fix".to_string(),
                coordinate.longitude.to_string(),
                coordinate.latitude.to_string(),
            ]);
            LocationCommand {
                platform: Platform::Android,
                args,
            }
        }
    }
}

/// Runs the platform's location command once per fix.
#[derive(Debug, Clone)]
pub struct CommandDispatcher {
    xcrun: PathBuf,
    adb: PathBuf,
}

impl Default for CommandDispatcher {
    fn default() -> Self {
        Self {
            xcrun: PathBuf::from(tool_for(Platform::Ios).0),
            adb: PathBuf::from(tool_for(Platform::Android).0),
        }
    }
}

impl CommandDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses explicit program paths instead of resolving `xcrun`/`adb` on `PATH`.
    pub fn with_programs(xcrun: impl Into<PathBuf>, adb: impl Into<PathBuf>) -> Self {
        Self {
            xcrun: xcrun.into(),
            adb: adb.into(),
        }
    }

    pub fn program_for(&self, platform: Platform) -> &Path {
        match platform {
            Platform::Ios => &self.xcrun,
            Platform::Android => &self.adb,
        }
    }
}

#[async_trait]
impl PlatformDispatcher for CommandDispatcher {
    async fn set_location(
        &self,
        target: &PlatformTarget,
        coordinate: Coordinate,
    ) -> Result<(), DispatchError> {
        let command = location_command(target, coordinate);
        let program = self.program_for(command.platform);
        debug!(program = %program.display(), args = ?command.args, "dispatching location");

        let output = Command::new(program)
            .args(&command.args)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| DispatchError::Spawn {
                program: program.display().to_string(),
                message: e.to_string(),
            })?;

        if output.status.success() {
            return Ok(());
        }

        Err(DispatchError::CommandFailed {
            program: program.display().to_string(),
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sf() -> Coordinate {
        Coordinate::new(37.7749, -122.4194)
    }

    #[test]
    fn ios_command_sets_lat_lon_on_simulator() {
        let command = location_command(&PlatformTarget::ios(None), sf());
        assert_eq!(command.platform, Platform::Ios);
        assert_eq!(
            command.args,
            vec!["simctl", "location", "booted", "set", "37.7749,-122.4194"]
        );
    }

    #[test]
    fn android_command_puts_longitude_first() {
        let command = location_command(&PlatformTarget::android(None), sf());
        assert_eq!(command.platform, Platform::Android);
        assert_eq!(
            command.args,
            vec!["emu", "geo", "fix", "-122.4194", "37.7749"]
        );
    }

    #[test]
    fn android_command_targets_serial_when_given() {
        let command = location_command(
            &PlatformTarget::android(Some("emulator-5556".into())),
            Coordinate::new(1.5, 2.25),
        );
        assert_eq!(
            command.args,
            vec!["-s", "emulator-5556", "emu", "geo", "fix", "2.25", "1.5"]
        );
    }

    #[test]
    fn default_dispatcher_uses_platform_tools() {
        let dispatcher = CommandDispatcher::new();
        assert_eq!(dispatcher.program_for(Platform::Ios), Path::new("xcrun"));
        assert_eq!(dispatcher.program_for(Platform::Android), Path::new("adb"));
    }

    #[tokio::test]
    async fn missing_program_is_a_spawn_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let dispatcher =
            CommandDispatcher::with_programs(dir.path().join("no-xcrun"), dir.path().join("no-adb"));

        let err = dispatcher
            .set_location(&PlatformTarget::ios(None), sf())
            .await
            .expect_err("should fail");

        assert!(matches!(err, DispatchError::Spawn { .. }), "{err:?}");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn exit_status_decides_success() {
        let ok = CommandDispatcher::with_programs("true", "true");
        ok.set_location(&PlatformTarget::android(None), sf())
            .await
            .expect("true exits 0");

        let failing = CommandDispatcher::with_programs("false", "false");
        let err = failing
            .set_location(&PlatformTarget::android(None), sf())
            .await
            .expect_err("false exits 1");
        assert!(matches!(err, DispatchError::CommandFailed { .. }), "{err:?}");
    }
}
