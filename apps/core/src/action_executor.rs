use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ActionError {
    #[error("empty target")]
    EmptyTarget,
    #[error("path does not exist: {}", .0.display())]
    MissingPath(PathBuf),
    #[error("launch failed: {message}")]
    LaunchFailed { message: String, code: Option<i32> },
    #[error("clipboard error: {0}")]
    Clipboard(String),
}

/// OS-level side effects a committed result can trigger.
pub trait ActionExecutor {
    fn open_path(&mut self, target: &str) -> Result<(), ActionError>;
    fn copy_to_clipboard(&mut self, text: &str) -> Result<(), ActionError>;
}

/// Checks a target before handing it to the OS. URIs pass through; absolute
/// filesystem paths must exist.
pub fn validate_open_target(target: &str) -> Result<&str, ActionError> {
    let trimmed = target.trim();
    if trimmed.is_empty() {
        return Err(ActionError::EmptyTarget);
    }

    if trimmed.contains("://") {
        return Ok(trimmed);
    }

    let candidate = Path::new(trimmed);
    if candidate.is_absolute() && !candidate.exists() {
        return Err(ActionError::MissingPath(candidate.to_path_buf()));
    }

    Ok(trimmed)
}

#[derive(Debug, Default)]
pub struct SystemActionExecutor;

impl ActionExecutor for SystemActionExecutor {
    fn open_path(&mut self, target: &str) -> Result<(), ActionError> {
        let target = validate_open_target(target)?;
        launch_with_system(target)
    }

    fn copy_to_clipboard(&mut self, text: &str) -> Result<(), ActionError> {
        let mut clipboard =
            arboard::Clipboard::new().map_err(|e| ActionError::Clipboard(e.to_string()))?;
        clipboard
            .set_text(text.to_string())
            .map_err(|e| ActionError::Clipboard(e.to_string()))
    }
}

#[cfg(target_os = "windows")]
fn launch_with_system(target: &str) -> Result<(), ActionError> {
    use windows_sys::Win32::UI::Shell::ShellExecuteW;
    use windows_sys::Win32::UI::WindowsAndMessaging::SW_SHOWNORMAL;

    let operation = to_wide("open");
    let target_wide = to_wide(target);
    let result = unsafe {
        ShellExecuteW(
            std::ptr::null_mut(),
            operation.as_ptr(),
            target_wide.as_ptr(),
            std::ptr::null(),
            std::ptr::null(),
            SW_SHOWNORMAL,
        )
    } as isize;

    // ShellExecuteW reports success with values above 32.
    if result <= 32 {
        return Err(ActionError::LaunchFailed {
            message: format!("ShellExecuteW rejected '{target}'"),
            code: Some(result as i32),
        });
    }
    Ok(())
}

#[cfg(target_os = "windows")]
fn to_wide(value: &str) -> Vec<u16> {
    value.encode_utf16().chain(std::iter::once(0)).collect()
}

#[cfg(not(target_os = "windows"))]
fn launch_with_system(target: &str) -> Result<(), ActionError> {
    let opener = if cfg!(target_os = "macos") {
        "open"
    } else {
        "xdg-open"
    };

    let mut command = std::process::Command::new(opener);
    command.arg(target);
    spawn_reaped(command).map(|_| ())
}

/// Spawns `command` and waits for it on a background thread so the child is
/// reaped without blocking the caller. The handle yields the exit status, or
/// `None` when waiting failed.
pub fn spawn_reaped(
    mut command: std::process::Command,
) -> Result<std::thread::JoinHandle<Option<std::process::ExitStatus>>, ActionError> {
    let program = command.get_program().to_string_lossy().into_owned();
    let mut child = command.spawn().map_err(|error| ActionError::LaunchFailed {
        message: format!("{program} failed: {error}"),
        code: error.raw_os_error(),
    })?;

    let reaper_program = program.clone();
    let reaper = std::thread::Builder::new()
        .name(format!("reap-{program}"))
        .spawn(move || {
            let program = reaper_program;
            match child.wait() {
                Ok(status) => {
                    tracing::debug!(%program, %status, "launcher exited");
                    Some(status)
                }
                Err(error) => {
                    tracing::warn!(%program, %error, "failed to wait for launcher");
                    None
                }
            }
        })
        .map_err(|error| ActionError::LaunchFailed {
            message: format!("could not watch {program}: {error}"),
            code: error.raw_os_error(),
        })?;
    Ok(reaper)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutedAction {
    Open(String),
    Copy(String),
}

/// Records effects instead of performing them. Failures can be queued with
/// [`MockActionExecutor::fail_next`].
#[derive(Debug, Default)]
pub struct MockActionExecutor {
    executed: Vec<ExecutedAction>,
    failures: Vec<ActionError>,
}

impl MockActionExecutor {
    pub fn executed(&self) -> &[ExecutedAction] {
        &self.executed
    }

    pub fn fail_next(&mut self, error: ActionError) {
        self.failures.push(error);
    }

    fn take_failure(&mut self) -> Result<(), ActionError> {
        if self.failures.is_empty() {
            return Ok(());
        }
        Err(self.failures.remove(0))
    }
}

impl ActionExecutor for MockActionExecutor {
    fn open_path(&mut self, target: &str) -> Result<(), ActionError> {
        self.take_failure()?;
        self.executed.push(ExecutedAction::Open(target.to_string()));
        Ok(())
    }

    fn copy_to_clipboard(&mut self, text: &str) -> Result<(), ActionError> {
        self.take_failure()?;
        self.executed.push(ExecutedAction::Copy(text.to_string()));
        Ok(())
    }
}
