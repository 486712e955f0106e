use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::thread;
use std::time::Instant;

use clap::Parser;
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use tracing::{info, warn};

use crate::action_executor::{ActionExecutor, SystemActionExecutor};
use crate::backend::BackendError;
use crate::config::{AppPaths, ConfigError, ConfigStore, ControllerOptions};
use crate::contract::{HostEvent, HostRequest, SessionView};
use crate::controller::{ControllerError, SessionController};
use crate::logging::{self, LoggingError};
use crate::transport::{decode_event, JsonLineBackend};

#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("logging error: {0}")]
    Logging(#[from] LoggingError),
    #[error("controller error: {0}")]
    Controller(#[from] ControllerError),
    #[error("host channel error: {0}")]
    Backend(#[from] BackendError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Session controller sidecar: reads host events as JSON lines on stdin and
/// writes requests and render snapshots as JSON lines on stdout.
#[derive(Debug, Clone, Default, Parser)]
#[command(name = "lumina-core", version, about, long_about = None)]
pub struct Cli {
    /// Directory holding config.json and options.toml
    #[arg(long, env = "LUMINA_CONFIG_DIR")]
    pub config_dir: Option<PathBuf>,

    /// Quiet period before a typed query is searched
    #[arg(long)]
    pub debounce_ms: Option<u64>,

    /// Shortest time the loading state stays visible
    #[arg(long)]
    pub min_loading_ms: Option<u64>,

    /// Log filter, e.g. "debug" or "lumina_core=trace"
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log to stderr instead of the log file
    #[arg(long)]
    pub no_log_file: bool,
}

impl Cli {
    /// Flags take precedence over options.toml.
    pub fn apply(&self, options: &mut ControllerOptions) {
        if let Some(debounce_ms) = self.debounce_ms {
            options.debounce_ms = debounce_ms;
        }
        if let Some(min_loading_ms) = self.min_loading_ms {
            options.min_loading_ms = min_loading_ms;
        }
        if let Some(level) = &self.log_level {
            options.log_level = level.clone();
        }
    }
}

pub fn run(cli: Cli) -> Result<(), RuntimeError> {
    let paths = AppPaths::resolve(cli.config_dir.as_deref())?;
    let mut options = ControllerOptions::load(&paths.options_file())?;
    cli.apply(&mut options);

    let logs_dir = (!cli.no_log_file).then_some(paths.logs_dir.as_path());
    let log_path = logging::init(logs_dir, &options.log_level)?;
    info!(
        config_dir = %paths.config_dir.display(),
        log_file = ?log_path,
        "lumina-core starting"
    );

    let (tx, rx) = crossbeam_channel::unbounded();
    thread::Builder::new()
        .name("stdin-reader".into())
        .spawn(move || read_lines(std::io::stdin().lock(), tx))?;

    let backend = JsonLineBackend::new(std::io::stdout(), ConfigStore::new(paths.config_file()));
    let mut controller = SessionController::new(options, backend, SystemActionExecutor)?;
    serve(&mut controller, &rx)
}

/// Forwards lines until the reader ends or the receiving side is gone.
pub fn read_lines<R: BufRead>(reader: R, tx: Sender<String>) {
    for line in reader.lines() {
        match line {
            Ok(line) => {
                if tx.send(line).is_err() {
                    break;
                }
            }
            Err(error) => {
                warn!(%error, "stdin read failed");
                break;
            }
        }
    }
}

/// Drives the controller until shutdown or end of input. Waits on the event
/// channel no longer than the controller's next deadline.
pub fn serve<W: Write, E: ActionExecutor>(
    controller: &mut SessionController<JsonLineBackend<W>, E>,
    events: &Receiver<String>,
) -> Result<(), RuntimeError> {
    controller.start()?;
    let mut last_view = None;
    publish_view(controller, &mut last_view)?;

    loop {
        let received = match controller.next_deadline() {
            Some(deadline) => {
                match events.recv_timeout(deadline.saturating_duration_since(Instant::now())) {
                    Ok(line) => Some(line),
                    Err(RecvTimeoutError::Timeout) => None,
                    Err(RecvTimeoutError::Disconnected) => break,
                }
            }
            None => match events.recv() {
                Ok(line) => Some(line),
                Err(_) => break,
            },
        };

        let now = Instant::now();
        match received {
            None => controller.poll(now),
            Some(line) if line.trim().is_empty() => {}
            Some(line) => match decode_event(&line) {
                Ok(HostEvent::Shutdown) => {
                    info!("shutdown requested");
                    break;
                }
                Ok(event) => controller.handle(event, now),
                Err(error) => {
                    warn!(%error, "rejected host line");
                    controller.backend_mut().emit(&error.into())?;
                }
            },
        }
        publish_view(controller, &mut last_view)?;
    }

    controller.stop();
    info!("lumina-core stopped");
    Ok(())
}

fn publish_view<W: Write, E: ActionExecutor>(
    controller: &mut SessionController<JsonLineBackend<W>, E>,
    last_view: &mut Option<SessionView>,
) -> Result<(), BackendError> {
    let view = controller.view();
    if last_view.as_ref() == Some(&view) {
        return Ok(());
    }
    controller
        .backend_mut()
        .emit(&HostRequest::Render(view.clone()))?;
    *last_view = Some(view);
    Ok(())
}
