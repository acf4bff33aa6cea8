use std::{
    ffi::OsStr,
    path::{Path, PathBuf},
};

use shared::{domain::Platform, error::DispatchError};
use tokio::process::Command;
use tracing::debug;

/// Program name and install hint for a platform's command-line tool.
pub fn tool_for(platform: Platform) -> (&'static str, &'static str) {
    match platform {
        Platform::Ios => ("xcrun", "Install Xcode Command Line Tools."),
        Platform::Android => ("adb", "Install Android SDK Platform Tools."),
    }
}

/// Searches `path_var` (a `PATH`-style list) for an executable called `name`.
pub fn find_executable(name: &str, path_var: Option<&OsStr>) -> Option<PathBuf> {
    let path_var = path_var?;
    std::env::split_paths(path_var)
        .filter(|dir| !dir.as_os_str().is_empty())
        .flat_map(|dir| {
            let plain = dir.join(name);
            let suffixed = dir.join(format!("{name}{}", std::env::consts::EXE_SUFFIX));
            [plain, suffixed]
        })
        .find(|candidate| is_executable(candidate))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    path.metadata()
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

/// Fails with an install hint when the platform tool is not on `PATH`.
pub fn ensure_tool_available(platform: Platform) -> Result<PathBuf, DispatchError> {
    let (tool, hint) = tool_for(platform);
    match find_executable(tool, std::env::var_os("PATH").as_deref()) {
        Some(path) => {
            debug!(%platform, path = %path.display(), "found platform tool");
            Ok(path)
        }
        None => Err(DispatchError::ToolMissing {
            tool: tool.to_string(),
            hint: hint.to_string(),
        }),
    }
}

/// Raw device listing from `xcrun simctl list devices booted` or `adb devices -l`.
pub async fn list_devices(platform: Platform) -> Result<String, DispatchError> {
    let (tool, _) = tool_for(platform);
    let args: &[&str] = match platform {
        Platform::Ios => &["simctl", "list", "devices", "booted"],
        Platform::Android => &["devices", "-l"],
    };

    let output = Command::new(tool)
        .args(args)
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|e| DispatchError::Spawn {
            program: tool.to_string(),
            message: e.to_string(),
        })?;

    if !output.status.success() {
        return Err(DispatchError::CommandFailed {
            program: tool.to_string(),
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

#[cfg(test)]
mod tests {
    use std::ffi::OsString;

    use super::*;

    #[test]
    fn hints_name_the_sdk() {
        assert_eq!(tool_for(Platform::Ios).0, "xcrun");
        assert!(tool_for(Platform::Ios).1.contains("Xcode"));
        assert_eq!(tool_for(Platform::Android).0, "adb");
        assert!(tool_for(Platform::Android).1.contains("Platform Tools"));
    }

    #[test]
    fn missing_path_finds_nothing() {
        assert_eq!(find_executable("adb", None), None);
    }

    #[test]
    fn searches_each_path_entry_in_order() {
        let first = tempfile::tempdir().expect("temp dir");
        let second = tempfile::tempdir().expect("temp dir");
        let tool = second.path().join("adb");
        std::fs::write(&tool, "#!/bin/sh\n").expect("write");
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&tool, std::fs::Permissions::from_mode(0o755))
                .expect("chmod");
        }

        let path_var: OsString =
            std::env::join_paths([first.path(), second.path()]).expect("join paths");

        assert_eq!(find_executable("adb", Some(path_var.as_os_str())), Some(tool));
        assert_eq!(find_executable("xcrun", Some(path_var.as_os_str())), None);
    }

    #[cfg(unix)]
    #[test]
    fn non_executable_files_are_ignored() {
        let dir = tempfile::tempdir().expect("temp dir");
        std::fs::write(dir.path().join("xcrun"), "not a program").expect("write");

        let path_var = dir.path().as_os_str().to_owned();
        assert_eq!(find_executable("xcrun", Some(path_var.as_os_str())), None);
    }
}
