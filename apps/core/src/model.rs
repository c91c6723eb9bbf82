use std::collections::BTreeSet;
use std::fmt::{self, Debug, Display, Formatter};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::action_registry::ActionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    Application,
    File,
    Folder,
    Action,
}

impl Category {
    pub fn label(self) -> &'static str {
        match self {
            Self::Application => "app",
            Self::File => "file",
            Self::Folder => "folder",
            Self::Action => "action",
        }
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Encoded icon image as handed back by an item's resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Icon {
    pub media_type: Option<&'static str>,
    pub bytes: Vec<u8>,
}

/// Anything the launcher can rank and run.
///
/// Implementations must be immutable once constructed; the same item is
/// shared between the search worker, icon resolver threads and the owner.
pub trait Indexable: Send + Sync + Debug {
    fn name(&self) -> &str;

    fn details(&self) -> Option<&str> {
        None
    }

    /// Filesystem path the registry's handlers open. Display text lives in
    /// `details` and is never launched.
    fn target(&self) -> Option<&Path> {
        None
    }

    /// Stable key used to accumulate usage counts across sessions.
    fn boost_id(&self) -> Option<&str> {
        None
    }

    fn category(&self) -> Category;

    /// Potentially slow; callers run it off the owner thread.
    fn resolve_icon(&self) -> Option<Icon> {
        None
    }

    fn as_standalone(&self) -> Option<&dyn StandaloneAction> {
        None
    }
}

/// Items that know how to run themselves without a registry lookup.
pub trait StandaloneAction {
    fn run(&self) -> Result<(), ActionError>;
}

pub type ItemRef = Arc<dyn Indexable>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileItem {
    name: String,
    path: PathBuf,
    category: Category,
    boost_id: String,
}

impl FileItem {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>, category: Category) -> Self {
        let path = path.into();
        let boost_id = path.to_string_lossy().into_owned();
        Self {
            name: name.into(),
            path,
            category,
            boost_id,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn into_ref(self) -> ItemRef {
        Arc::new(self)
    }
}

impl Indexable for FileItem {
    fn name(&self) -> &str {
        &self.name
    }

    fn details(&self) -> Option<&str> {
        self.path.to_str()
    }

    fn target(&self) -> Option<&Path> {
        Some(&self.path)
    }

    fn boost_id(&self) -> Option<&str> {
        if self.boost_id.is_empty() {
            None
        } else {
            Some(&self.boost_id)
        }
    }

    fn category(&self) -> Category {
        self.category
    }

    fn resolve_icon(&self) -> Option<Icon> {
        let media_type = match self
            .path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .as_deref()
        {
            Some("ico") => "image/x-icon",
            Some("png") => "image/png",
            _ => return None,
        };

        let bytes = std::fs::read(&self.path).ok()?;
        Some(Icon {
            media_type: Some(media_type),
            bytes,
        })
    }
}

/// One ranked row. Rebuilt on every query, never edited in place.
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub name: String,
    pub score: i64,
    pub item: ItemRef,
    pub highlight: BTreeSet<usize>,
}

#[cfg(test)]
mod tests {
    use super::{Category, FileItem, Indexable};

    #[test]
    fn file_item_uses_path_as_boost_id() {
        let item = FileItem::new("Notes", "/home/me/Notes.txt", Category::File);
        assert_eq!(item.boost_id(), Some("/home/me/Notes.txt"));
        assert_eq!(item.details(), Some("/home/me/Notes.txt"));
        assert_eq!(item.target(), Some(std::path::Path::new("/home/me/Notes.txt")));
    }

    #[test]
    fn non_image_files_resolve_no_icon() {
        let item = FileItem::new("Notes", "/home/me/Notes.txt", Category::File);
        assert!(item.resolve_icon().is_none());
    }

    #[test]
    fn image_files_resolve_their_own_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tool.png");
        std::fs::write(&path, b"\x89PNG").unwrap();

        let item = FileItem::new("tool", &path, Category::File);
        let icon = item.resolve_icon().expect("png should resolve");
        assert_eq!(icon.media_type, Some("image/png"));
        assert_eq!(icon.bytes, b"\x89PNG");
    }

    #[test]
    fn category_labels_are_stable() {
        assert_eq!(Category::Application.to_string(), "app");
        assert_eq!(Category::Folder.label(), "folder");
    }
}
