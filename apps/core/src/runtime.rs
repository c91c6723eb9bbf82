use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::mpsc;

use thiserror::Error;

use crate::action_registry::{built_in_actions, ActionRegistry};
use crate::config::{self, Config, ConfigError};
use crate::discovery::{collect_items, DirectoryProvider, DiscoveryProvider, StaticProvider};
use crate::dispatcher::{Direction, Dispatcher, DispatcherOptions, IntentQueue, ListModel, UiMessage};
use crate::frecency::FrecencyStore;
use crate::icon_cache::{cache_key, IconCache};
use crate::logging;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuntimeOptions {
    pub config_path: Option<PathBuf>,
    pub show_help: bool,
}

pub const USAGE: &str = "usage: slingshot-core [--config <path>]\n\n\
type to search; :down / :up move the selection, :run launches it, :quit exits";

pub fn parse_cli_args(args: &[String]) -> Result<RuntimeOptions, String> {
    let mut options = RuntimeOptions::default();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => {
                let value = iter
                    .next()
                    .ok_or_else(|| "--config requires a path".to_string())?;
                options.config_path = Some(PathBuf::from(value));
            }
            "-h" | "--help" => options.show_help = true,
            other => return Err(format!("unknown argument '{other}'")),
        }
    }
    Ok(options)
}

/// Console commands understood by the line host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCommand {
    Search(String),
    Move(Direction),
    Run,
    Quit,
}

pub fn parse_host_line(line: &str) -> HostCommand {
    match line.trim_end_matches(['\r', '\n']) {
        ":down" | ":j" => HostCommand::Move(Direction::Down),
        ":up" | ":k" => HostCommand::Move(Direction::Up),
        ":run" | ":r" => HostCommand::Run,
        ":quit" | ":q" => HostCommand::Quit,
        query => HostCommand::Search(query.to_string()),
    }
}

pub fn run_with_options(options: RuntimeOptions) -> Result<(), RuntimeError> {
    if options.show_help {
        println!("{USAGE}");
        return Ok(());
    }

    let cfg = config::load(options.config_path.as_deref())?;
    if !cfg.config_path.exists() {
        config::save(&cfg)?;
    }
    let _log_guard = logging::init(&cfg)?;
    tracing::info!(
        config_path = %cfg.config_path.display(),
        frecency_path = %cfg.frecency_path.display(),
        "starting"
    );

    let providers = providers_for(&cfg);
    let items = collect_items(&providers);
    tracing::info!(items = items.len(), "index ready");

    let (ui_sender, ui_receiver) = mpsc::channel::<UiMessage>();
    let dispatcher = Dispatcher::new(
        items,
        FrecencyStore::open(&cfg.frecency_path),
        ActionRegistry::with_default_handlers(),
        ui_sender,
        DispatcherOptions {
            display_limit: cfg.max_results as usize,
        },
    );
    let (queue, worker) = dispatcher.spawn()?;

    let input_queue = queue.clone();
    std::thread::Builder::new()
        .name("console-input".to_string())
        .spawn(move || read_console(input_queue))?;

    let icons = IconCache::new();
    let mut model = ListModel::new();
    println!("{USAGE}");
    while let Ok(message) = ui_receiver.recv() {
        let rows_changed = changes_rows(&message);
        if let Some(on_shutdown) = model.apply(message) {
            on_shutdown();
            break;
        }
        if rows_changed {
            request_icons(&model, &icons);
        }
        render(&model, &icons);
    }
    tracing::debug!(icons = icons.len(), "releasing icon cache");
    icons.clear();

    drop(queue);
    if worker.join().is_err() {
        tracing::error!("dispatcher thread panicked");
    }
    Ok(())
}

fn providers_for(cfg: &Config) -> Vec<Box<dyn DiscoveryProvider>> {
    let built_in = StaticProvider::new("built-in", built_in_actions(&logging::logs_dir(cfg)));
    let directories = DirectoryProvider::new(cfg.search_roots.clone(), cfg.max_depth);
    let mut providers: Vec<Box<dyn DiscoveryProvider>> = Vec::with_capacity(2);
    providers.push(Box::new(built_in));
    providers.push(Box::new(directories));
    providers
}

fn read_console(queue: IntentQueue) {
    let stdin = std::io::stdin();
    let mut last_query = String::new();
    for line in stdin.lock().lines() {
        let Ok(line) = line else {
            break;
        };
        let accepted = match parse_host_line(&line) {
            HostCommand::Search(query) => {
                last_query = query.clone();
                queue.search(query)
            }
            HostCommand::Move(direction) => queue.move_selection(direction),
            HostCommand::Run => queue.execute(last_query.clone()),
            HostCommand::Quit => {
                queue.shutdown(|| println!("bye"));
                return;
            }
        };
        if !accepted {
            return;
        }
    }
    // Closing stdin ends the session the same way :quit does.
    queue.shutdown(|| println!("bye"));
}

// Selection moves reuse the rows already requested.
fn changes_rows(message: &UiMessage) -> bool {
    matches!(message, UiMessage::ResultsChanged { .. })
}

fn request_icons(model: &ListModel, icons: &IconCache) {
    for result in model.results() {
        let name = result.name.clone();
        icons.resolve(&result.item, move |icon| {
            tracing::trace!(item = %name, found = icon.is_some(), "icon resolved");
        });
    }
}

fn render(model: &ListModel, icons: &IconCache) {
    let mut out = std::io::stdout().lock();
    let _ = writeln!(out, "----");
    for (index, result) in model.results().iter().enumerate() {
        let marker = if model.selected() == Some(index) { '>' } else { ' ' };
        let glyph = if icons.get(&cache_key(result.item.as_ref())).is_some() {
            '*'
        } else {
            ' '
        };
        let detail = result.item.details().unwrap_or_default();
        let _ = writeln!(
            out,
            "{marker}{glyph} {:<32} [{}] {}",
            result.name,
            result.item.category(),
            detail
        );
    }
    let _ = out.flush();
}
