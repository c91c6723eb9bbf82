use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::model::{Icon, Indexable, ItemRef};

pub type IconCallback = Box<dyn FnOnce(Option<Arc<Icon>>) + Send + 'static>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IconLookup {
    /// The callback already ran on the calling thread.
    Ready,
    /// The callback will run once, from a resolver thread.
    Pending,
}

#[derive(Default)]
struct CacheState {
    icons: HashMap<String, Arc<Icon>>,
    in_flight: HashMap<String, Vec<IconCallback>>,
}

/// Shared memo of resolved icons.
///
/// Clones share the same storage. Concurrent misses for one key wait on a
/// single resolution instead of each running the resolver.
#[derive(Clone, Default)]
pub struct IconCache {
    state: Arc<Mutex<CacheState>>,
}

pub fn cache_key(item: &dyn Indexable) -> String {
    match item.boost_id() {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => format!("{}: {}", item.category(), item.name()),
    }
}

impl IconCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resolve<F>(&self, item: &ItemRef, on_ready: F) -> IconLookup
    where
        F: FnOnce(Option<Arc<Icon>>) + Send + 'static,
    {
        let key = cache_key(item.as_ref());

        let mut state = self.state.lock();
        if let Some(icon) = state.icons.get(&key).cloned() {
            drop(state);
            on_ready(Some(icon));
            return IconLookup::Ready;
        }

        if let Some(waiters) = state.in_flight.get_mut(&key) {
            waiters.push(Box::new(on_ready));
            return IconLookup::Pending;
        }
        state.in_flight.insert(key.clone(), vec![Box::new(on_ready)]);
        drop(state);

        let cache = self.clone();
        let item = Arc::clone(item);
        let thread_key = key.clone();
        let spawned = std::thread::Builder::new()
            .name("icon-resolver".to_string())
            .spawn(move || {
                let icon = resolve_contained(item.as_ref());
                cache.complete(&thread_key, icon);
            });

        if let Err(error) = spawned {
            tracing::warn!(%key, %error, "failed to start icon resolver");
            self.complete(&key, None);
        }
        IconLookup::Pending
    }

    pub fn get(&self, key: &str) -> Option<Arc<Icon>> {
        self.state.lock().icons.get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.state.lock().icons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.state.lock().icons.clear();
    }

    fn complete(&self, key: &str, icon: Option<Icon>) {
        let icon = icon.map(Arc::new);
        let waiters = {
            let mut state = self.state.lock();
            if let Some(icon) = &icon {
                state.icons.insert(key.to_string(), Arc::clone(icon));
            }
            state.in_flight.remove(key).unwrap_or_default()
        };

        for waiter in waiters {
            waiter(icon.clone());
        }
    }
}

fn resolve_contained(item: &dyn Indexable) -> Option<Icon> {
    match catch_unwind(AssertUnwindSafe(|| item.resolve_icon())) {
        Ok(icon) => icon,
        Err(_) => {
            tracing::warn!(item = item.name(), "icon resolver panicked");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::cache_key;
    use crate::model::{Category, FileItem};

    #[derive(Debug)]
    struct Anonymous;

    impl crate::model::Indexable for Anonymous {
        fn name(&self) -> &str {
            "Calculator"
        }

        fn category(&self) -> Category {
            Category::Application
        }
    }

    #[test]
    fn key_prefers_boost_id() {
        let item = FileItem::new("Notes", "/tmp/Notes.txt", Category::File);
        assert_eq!(cache_key(&item), "/tmp/Notes.txt");
    }

    #[test]
    fn key_falls_back_to_category_and_name() {
        assert_eq!(cache_key(&Anonymous), "app: Calculator");
    }
}
