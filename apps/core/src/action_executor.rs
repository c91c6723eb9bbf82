use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LaunchError {
    #[error("empty path")]
    EmptyPath,
    #[error("path does not exist: {}", .0.display())]
    MissingPath(PathBuf),
    #[error("launch failed: {message}")]
    LaunchFailed { message: String, code: Option<i32> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Verb {
    Open,
    Elevated,
}

pub fn launch_path(path: &Path) -> Result<(), LaunchError> {
    let candidate = validate_target(path)?;
    shell_open(candidate, Verb::Open)
}

/// Opens `path` with elevated rights where the platform has a notion of it.
pub fn launch_path_elevated(path: &Path) -> Result<(), LaunchError> {
    let candidate = validate_target(path)?;
    shell_open(candidate, Verb::Elevated)
}

pub fn validate_target(path: &Path) -> Result<&Path, LaunchError> {
    if path.as_os_str().is_empty() {
        return Err(LaunchError::EmptyPath);
    }

    if !path.exists() {
        return Err(LaunchError::MissingPath(path.to_path_buf()));
    }

    Ok(path)
}

#[cfg(target_os = "windows")]
fn shell_open(target: &Path, verb: Verb) -> Result<(), LaunchError> {
    use std::os::windows::ffi::OsStrExt;

    use windows_sys::Win32::UI::Shell::ShellExecuteW;
    use windows_sys::Win32::UI::WindowsAndMessaging::SW_SHOWNORMAL;

    let verb_wide = to_wide(match verb {
        Verb::Open => "open",
        Verb::Elevated => "runas",
    });
    let target_wide: Vec<u16> = target
        .as_os_str()
        .encode_wide()
        .chain(std::iter::once(0))
        .collect();

    let result = unsafe {
        ShellExecuteW(
            std::ptr::null_mut(),
            verb_wide.as_ptr(),
            target_wide.as_ptr(),
            std::ptr::null(),
            std::ptr::null(),
            SW_SHOWNORMAL,
        )
    };

    // Values above 32 signal success.
    let code = result as isize;
    if code <= 32 {
        return Err(LaunchError::LaunchFailed {
            message: format!("ShellExecuteW failed for {}", target.display()),
            code: Some(code as i32),
        });
    }
    Ok(())
}

#[cfg(target_os = "windows")]
fn to_wide(value: &str) -> Vec<u16> {
    value.encode_utf16().chain(std::iter::once(0)).collect()
}

#[cfg(not(target_os = "windows"))]
fn shell_open(target: &Path, verb: Verb) -> Result<(), LaunchError> {
    if verb == Verb::Elevated {
        tracing::debug!(target = %target.display(), "no elevation verb on this platform; opening normally");
    }

    let opener = if cfg!(target_os = "macos") {
        "open"
    } else {
        "xdg-open"
    };

    std::process::Command::new(opener)
        .arg(target)
        .spawn()
        .map(|_| ())
        .map_err(|error| LaunchError::LaunchFailed {
            message: format!("{opener} failed for {}: {error}", target.display()),
            code: error.raw_os_error(),
        })
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::{validate_target, LaunchError};

    #[test]
    fn empty_target_is_rejected() {
        assert_eq!(validate_target(Path::new("")), Err(LaunchError::EmptyPath));
    }

    #[test]
    fn existing_directory_validates_to_itself() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(validate_target(dir.path()), Ok(dir.path()));
    }
}
