use std::path::{Path, PathBuf};

use thiserror::Error;
use walkdir::{DirEntry, WalkDir};

use crate::model::{Category, FileItem, ItemRef};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ProviderError {
    message: String,
}

impl ProviderError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

pub trait DiscoveryProvider: Send + Sync {
    fn provider_name(&self) -> &'static str;
    fn discover(&self) -> Result<Vec<ItemRef>, ProviderError>;
}

/// Fixed list of items, e.g. the built-in actions.
pub struct StaticProvider {
    name: &'static str,
    items: Vec<ItemRef>,
}

impl StaticProvider {
    pub fn new(name: &'static str, items: Vec<ItemRef>) -> Self {
        Self { name, items }
    }
}

impl DiscoveryProvider for StaticProvider {
    fn provider_name(&self) -> &'static str {
        self.name
    }

    fn discover(&self) -> Result<Vec<ItemRef>, ProviderError> {
        Ok(self.items.clone())
    }
}

/// Walks configured roots for applications, files and folders.
pub struct DirectoryProvider {
    roots: Vec<PathBuf>,
    max_depth: usize,
}

impl DirectoryProvider {
    pub fn new(roots: Vec<PathBuf>, max_depth: usize) -> Self {
        Self { roots, max_depth }
    }
}

impl DiscoveryProvider for DirectoryProvider {
    fn provider_name(&self) -> &'static str {
        "directory"
    }

    fn discover(&self) -> Result<Vec<ItemRef>, ProviderError> {
        let mut items = Vec::new();
        for root in &self.roots {
            if !root.is_dir() {
                tracing::debug!(root = %root.display(), "search root missing; skipping");
                continue;
            }

            let walker = WalkDir::new(root)
                .min_depth(1)
                .max_depth(self.max_depth)
                .into_iter()
                .filter_entry(|entry| !is_hidden(entry));
            for entry in walker {
                match entry {
                    Ok(entry) => items.push(item_for(&entry).into_ref()),
                    Err(error) => {
                        tracing::debug!(root = %root.display(), %error, "skipping unreadable entry");
                    }
                }
            }
        }
        Ok(items)
    }
}

// Roots themselves are never treated as hidden.
fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.starts_with('.'))
}

fn item_for(entry: &DirEntry) -> FileItem {
    let path = entry.path();
    let category = classify(path, entry.file_type().is_dir());
    let name = display_name(path, category);
    FileItem::new(name, path, category)
}

pub fn classify(path: &Path, is_dir: bool) -> Category {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());
    match (is_dir, extension.as_deref()) {
        (_, Some("app")) => Category::Application,
        (true, _) => Category::Folder,
        (false, Some("exe" | "lnk" | "desktop" | "appref-ms")) => Category::Application,
        _ => Category::File,
    }
}

fn display_name(path: &Path, category: Category) -> String {
    let raw = if category == Category::Application {
        path.file_stem()
    } else {
        path.file_name()
    };
    raw.map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

/// Concatenates provider output in order. Failing providers are skipped.
pub fn collect_items(providers: &[Box<dyn DiscoveryProvider>]) -> Vec<ItemRef> {
    let mut items = Vec::new();
    for provider in providers {
        match provider.discover() {
            Ok(found) => {
                tracing::info!(provider = provider.provider_name(), count = found.len(), "discovered items");
                items.extend(found);
            }
            Err(error) => {
                tracing::warn!(provider = provider.provider_name(), %error, "provider failed");
            }
        }
    }
    items
}
