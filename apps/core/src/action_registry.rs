use std::collections::HashMap;
use std::fmt::Debug;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;

use crate::action_executor::{launch_path, launch_path_elevated, LaunchError};
use crate::model::{Category, Indexable, ItemRef, StandaloneAction};

pub const ACTION_OPEN_LOG_FOLDER_ID: &str = "slingshot:action:open-log-folder";
pub const ACTION_OPEN_LAST_LOG_ID: &str = "slingshot:action:open-last-log";

#[derive(Debug, Error)]
pub enum ActionError {
    #[error(transparent)]
    Launch(#[from] LaunchError),
    #[error("item has no launchable target: {0}")]
    NoTarget(String),
    #[error("no log file found in {}", .0.display())]
    NoLogFile(PathBuf),
}

/// Something that can be run against an item of a given category.
pub trait ActionHandler: Send + Sync + Debug {
    fn name(&self) -> &'static str;
    fn run(&self, item: &dyn Indexable) -> Result<(), ActionError>;
}

#[derive(Debug, Default)]
pub struct ActionRegistry {
    handlers: HashMap<Category, Vec<Arc<dyn ActionHandler>>>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_default_handlers() -> Self {
        let mut registry = Self::new();
        for category in [Category::Application, Category::File, Category::Folder] {
            registry.register(category, Arc::new(OpenHandler));
            registry.register(category, Arc::new(OpenAsAdminHandler));
        }
        registry
    }

    pub fn register(&mut self, category: Category, handler: Arc<dyn ActionHandler>) {
        self.handlers.entry(category).or_default().push(handler);
    }

    /// Handlers eligible for `category`, in registration order.
    pub fn actions_for(&self, category: Category) -> &[Arc<dyn ActionHandler>] {
        self.handlers
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

#[derive(Debug)]
pub struct OpenHandler;

impl ActionHandler for OpenHandler {
    fn name(&self) -> &'static str {
        "open"
    }

    fn run(&self, item: &dyn Indexable) -> Result<(), ActionError> {
        let target = launch_target(item)?;
        launch_path(target)?;
        Ok(())
    }
}

#[derive(Debug)]
pub struct OpenAsAdminHandler;

impl ActionHandler for OpenAsAdminHandler {
    fn name(&self) -> &'static str {
        "open-as-admin"
    }

    fn run(&self, item: &dyn Indexable) -> Result<(), ActionError> {
        let target = launch_target(item)?;
        launch_path_elevated(target)?;
        Ok(())
    }
}

fn launch_target(item: &dyn Indexable) -> Result<&Path, ActionError> {
    item.target()
        .filter(|target| !target.as_os_str().is_empty())
        .ok_or_else(|| ActionError::NoTarget(item.name().to_string()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltInKind {
    OpenLogFolder,
    OpenLastLog,
}

/// Launcher maintenance actions that run themselves.
#[derive(Debug, Clone)]
pub struct BuiltInAction {
    kind: BuiltInKind,
    logs_dir: PathBuf,
}

impl BuiltInAction {
    pub fn new(kind: BuiltInKind, logs_dir: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            logs_dir: logs_dir.into(),
        }
    }
}

impl Indexable for BuiltInAction {
    fn name(&self) -> &str {
        match self.kind {
            BuiltInKind::OpenLogFolder => "Open Log Folder",
            BuiltInKind::OpenLastLog => "Open Last Log",
        }
    }

    fn details(&self) -> Option<&str> {
        Some(match self.kind {
            BuiltInKind::OpenLogFolder => "Show the launcher log directory",
            BuiltInKind::OpenLastLog => "Open the most recent launcher log file",
        })
    }

    fn boost_id(&self) -> Option<&str> {
        Some(match self.kind {
            BuiltInKind::OpenLogFolder => ACTION_OPEN_LOG_FOLDER_ID,
            BuiltInKind::OpenLastLog => ACTION_OPEN_LAST_LOG_ID,
        })
    }

    fn category(&self) -> Category {
        Category::Action
    }

    fn as_standalone(&self) -> Option<&dyn StandaloneAction> {
        Some(self)
    }
}

impl StandaloneAction for BuiltInAction {
    fn run(&self) -> Result<(), ActionError> {
        match self.kind {
            BuiltInKind::OpenLogFolder => {
                std::fs::create_dir_all(&self.logs_dir).map_err(|error| {
                    LaunchError::LaunchFailed {
                        message: format!("failed to create logs dir: {error}"),
                        code: error.raw_os_error(),
                    }
                })?;
                launch_path(&self.logs_dir)?;
            }
            BuiltInKind::OpenLastLog => {
                let latest = crate::logging::latest_log_file(&self.logs_dir)
                    .ok_or_else(|| ActionError::NoLogFile(self.logs_dir.clone()))?;
                launch_path(&latest)?;
            }
        }
        Ok(())
    }
}

pub fn built_in_actions(logs_dir: &Path) -> Vec<ItemRef> {
    [BuiltInKind::OpenLogFolder, BuiltInKind::OpenLastLog]
        .into_iter()
        .map(|kind| Arc::new(BuiltInAction::new(kind, logs_dir)) as ItemRef)
        .collect()
}
