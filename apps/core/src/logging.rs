use std::fs;
use std::path::{Path, PathBuf};
use std::any::Any;
use std::sync::Once;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::Config;

const LOG_FILE_PREFIX: &str = "slingshot.log";

static PANIC_HOOK: Once = Once::new();

pub fn logs_dir(cfg: &Config) -> PathBuf {
    cfg.log_dir
        .clone()
        .unwrap_or_else(|| crate::config::stable_app_data_dir().join("logs"))
}

/// Installs the global subscriber: stderr plus a daily-rolling file.
///
/// The returned guard flushes the file writer on drop and must be held for
/// the lifetime of the process.
pub fn init(cfg: &Config) -> Result<WorkerGuard, std::io::Error> {
    let dir = logs_dir(cfg);
    fs::create_dir_all(&dir)?;

    let appender = tracing_appender::rolling::daily(&dir, LOG_FILE_PREFIX);
    let (file_writer, guard) = tracing_appender::non_blocking(appender);

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cfg.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(fmt::layer().with_writer(file_writer).with_ansi(false))
        .try_init();
    if let Err(error) = installed {
        eprintln!("[slingshot] logging already initialized: {error}");
    }

    install_panic_hook();
    tracing::info!(logs_dir = %dir.display(), "logging initialized");
    Ok(guard)
}

pub fn latest_log_file(dir: &Path) -> Option<PathBuf> {
    fs::read_dir(dir)
        .ok()?
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            entry
                .file_name()
                .to_str()
                .is_some_and(|name| name.starts_with(LOG_FILE_PREFIX))
        })
        .filter_map(|entry| {
            let modified = entry.metadata().ok()?.modified().ok()?;
            Some((modified, entry.path()))
        })
        .max()
        .map(|(_, path)| path)
}

fn install_panic_hook() {
    PANIC_HOOK.call_once(|| {
        let previous = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            let current = std::thread::current();
            let thread = current.name().unwrap_or("unnamed");
            let payload = panic_message(info.payload());
            match info.location() {
                Some(at) => {
                    tracing::error!(thread, file = at.file(), line = at.line(), payload, "panic")
                }
                None => tracing::error!(thread, payload, "panic"),
            }
            previous(info);
        }));
    });
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(text) = payload.downcast_ref::<&'static str>() {
        *text
    } else if let Some(text) = payload.downcast_ref::<String>() {
        text.as_str()
    } else {
        "non-string panic payload"
    }
}
