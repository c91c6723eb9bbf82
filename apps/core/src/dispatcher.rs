use std::fmt::{self, Debug, Formatter};
use std::ops::ControlFlow;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread::JoinHandle;

use crate::action_registry::{ActionError, ActionRegistry};
use crate::frecency::FrecencyStore;
use crate::model::{Indexable, ItemRef, SearchResult};
use crate::search::SearchSession;

pub const DEFAULT_DISPLAY_LIMIT: usize = 10;

pub type ShutdownFn = Box<dyn FnOnce() + Send + 'static>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

pub enum Intent {
    Search(String),
    Execute(String),
    MoveSelection(Direction),
    Shutdown(ShutdownFn),
}

impl Debug for Intent {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Search(query) => f.debug_tuple("Search").field(query).finish(),
            Self::Execute(query) => f.debug_tuple("Execute").field(query).finish(),
            Self::MoveSelection(direction) => {
                f.debug_tuple("MoveSelection").field(direction).finish()
            }
            Self::Shutdown(_) => f.write_str("Shutdown"),
        }
    }
}

/// State changes the worker hands to the owner thread.
pub enum UiMessage {
    ResultsChanged {
        results: Vec<SearchResult>,
        selected: Option<usize>,
    },
    SelectionChanged(usize),
    Shutdown(ShutdownFn),
}

impl Debug for UiMessage {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::ResultsChanged { results, selected } => f
                .debug_struct("ResultsChanged")
                .field("results", &results.len())
                .field("selected", selected)
                .finish(),
            Self::SelectionChanged(index) => f.debug_tuple("SelectionChanged").field(index).finish(),
            Self::Shutdown(_) => f.write_str("Shutdown"),
        }
    }
}

/// Posts a message to the thread that owns the visible list.
///
/// Delivery must preserve the order of `post` calls.
pub trait OwnerContext: Send + 'static {
    fn post(&self, message: UiMessage);
}

impl OwnerContext for Sender<UiMessage> {
    fn post(&self, message: UiMessage) {
        if let Err(error) = self.send(message) {
            tracing::warn!(update = ?error.0, "owner context is gone; dropping update");
        }
    }
}

/// Owner-side view of the ranked list.
#[derive(Debug, Default)]
pub struct ListModel {
    results: Vec<SearchResult>,
    selected: Option<usize>,
}

impl ListModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies one update. A shutdown message hands its closure back so the
    /// owner runs it on its own thread.
    pub fn apply(&mut self, message: UiMessage) -> Option<ShutdownFn> {
        match message {
            UiMessage::ResultsChanged { results, selected } => {
                self.results = results;
                self.selected = selected;
                None
            }
            UiMessage::SelectionChanged(index) => {
                self.selected = Some(index);
                None
            }
            UiMessage::Shutdown(on_shutdown) => Some(on_shutdown),
        }
    }

    pub fn results(&self) -> &[SearchResult] {
        &self.results
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }
}

/// Producer handle. Cheap to clone and safe to use from any thread.
#[derive(Debug, Clone)]
pub struct IntentQueue {
    sender: Sender<Intent>,
}

impl IntentQueue {
    /// Enqueues without blocking. Returns `false` once the worker has stopped.
    pub fn push(&self, intent: Intent) -> bool {
        match self.sender.send(intent) {
            Ok(()) => true,
            Err(rejected) => {
                tracing::debug!(intent = ?rejected.0, "dispatcher stopped; intent discarded");
                false
            }
        }
    }

    pub fn search(&self, query: impl Into<String>) -> bool {
        self.push(Intent::Search(query.into()))
    }

    pub fn execute(&self, query: impl Into<String>) -> bool {
        self.push(Intent::Execute(query.into()))
    }

    pub fn move_selection(&self, direction: Direction) -> bool {
        self.push(Intent::MoveSelection(direction))
    }

    pub fn shutdown(&self, on_shutdown: impl FnOnce() + Send + 'static) -> bool {
        self.push(Intent::Shutdown(Box::new(on_shutdown)))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DispatcherOptions {
    pub display_limit: usize,
}

impl Default for DispatcherOptions {
    fn default() -> Self {
        Self {
            display_limit: DEFAULT_DISPLAY_LIMIT,
        }
    }
}

/// Single consumer of the intent queue.
///
/// Owns the search session, the usage store and a mirror of what it last
/// posted to the owner, so every intent sees the effects of all earlier ones.
pub struct Dispatcher<C: OwnerContext> {
    items: Arc<[ItemRef]>,
    session: Option<SearchSession>,
    frecency: FrecencyStore,
    registry: ActionRegistry,
    context: C,
    options: DispatcherOptions,
    displayed: Vec<SearchResult>,
    selected: Option<usize>,
}

impl<C: OwnerContext> Dispatcher<C> {
    pub fn new(
        items: impl Into<Arc<[ItemRef]>>,
        frecency: FrecencyStore,
        registry: ActionRegistry,
        context: C,
        options: DispatcherOptions,
    ) -> Self {
        Self {
            items: items.into(),
            session: None,
            frecency,
            registry,
            context,
            options,
            displayed: Vec::new(),
            selected: None,
        }
    }

    /// Starts the worker thread and returns the producer side of its queue.
    pub fn spawn(self) -> std::io::Result<(IntentQueue, JoinHandle<()>)> {
        let (sender, receiver) = mpsc::channel();
        let handle = std::thread::Builder::new()
            .name("intent-dispatcher".to_string())
            .spawn(move || self.run(receiver))?;
        Ok((IntentQueue { sender }, handle))
    }

    fn run(mut self, receiver: Receiver<Intent>) {
        tracing::info!(items = self.items.len(), "dispatcher started");
        while let Ok(intent) = receiver.recv() {
            tracing::trace!(?intent, "dequeued");
            if self.handle(intent).is_break() {
                break;
            }
        }
        tracing::info!("dispatcher stopped");
    }

    fn handle(&mut self, intent: Intent) -> ControlFlow<()> {
        match intent {
            Intent::Search(query) => self.on_search(&query),
            Intent::Execute(query) => self.on_execute(&query),
            Intent::MoveSelection(direction) => self.on_move(direction),
            Intent::Shutdown(on_shutdown) => {
                self.context.post(UiMessage::Shutdown(on_shutdown));
                return ControlFlow::Break(());
            }
        }
        ControlFlow::Continue(())
    }

    fn on_search(&mut self, query: &str) {
        let counts = self.frecency.get_all();
        let boost = |item: &dyn Indexable| {
            item.boost_id()
                .and_then(|id| counts.get(id))
                .map(|count| i64::from(*count))
                .unwrap_or(0)
        };

        let current = self
            .session
            .take()
            .unwrap_or_else(|| SearchSession::new(Arc::clone(&self.items)));
        let next = current.search(query, boost);

        self.displayed = next
            .results()
            .iter()
            .take(self.options.display_limit)
            .cloned()
            .collect();
        self.selected = if self.displayed.is_empty() {
            None
        } else {
            Some(0)
        };
        self.session = Some(next);

        self.context.post(UiMessage::ResultsChanged {
            results: self.displayed.clone(),
            selected: self.selected,
        });
    }

    fn on_move(&mut self, direction: Direction) {
        let Some(current) = self.selected else {
            return;
        };
        let last = self.displayed.len().saturating_sub(1);
        let next = match direction {
            Direction::Up => current.saturating_sub(1),
            Direction::Down => (current + 1).min(last),
        };
        self.selected = Some(next);
        self.context.post(UiMessage::SelectionChanged(next));
    }

    fn on_execute(&mut self, query: &str) {
        let Some(index) = self.selected else {
            tracing::debug!(query, "execute with no results; ignoring");
            return;
        };
        let Some(item) = self.displayed.get(index).map(|result| Arc::clone(&result.item)) else {
            return;
        };

        if let Some(id) = item.boost_id() {
            if let Err(error) = self.frecency.record_use(id, query, index) {
                tracing::warn!(%error, item = item.name(), "failed to persist usage");
            }
        }

        if let Some(standalone) = item.as_standalone() {
            tracing::info!(item = item.name(), action = "standalone", "launching");
            run_guarded(item.as_ref(), "standalone", || standalone.run());
            return;
        }

        let Some(handler) = self.registry.actions_for(item.category()).first().cloned() else {
            tracing::warn!(
                item = item.name(),
                category = %item.category(),
                "no action registered for category"
            );
            return;
        };

        tracing::info!(item = item.name(), action = handler.name(), "launching");
        run_guarded(item.as_ref(), handler.name(), || handler.run(item.as_ref()));
    }
}

fn run_guarded<F>(item: &dyn Indexable, action: &str, run: F)
where
    F: FnOnce() -> Result<(), ActionError>,
{
    match catch_unwind(AssertUnwindSafe(run)) {
        Ok(Ok(())) => {}
        Ok(Err(error)) => {
            tracing::error!(item = item.name(), action, %error, "action failed");
        }
        Err(_) => {
            tracing::error!(item = item.name(), action, "action panicked");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;

    use super::{Direction, Dispatcher, DispatcherOptions, Intent, ListModel, UiMessage};
    use crate::action_registry::ActionRegistry;
    use crate::frecency::FrecencyStore;
    use crate::model::{Category, FileItem, ItemRef};

    fn pool(names: &[&str]) -> Vec<ItemRef> {
        names
            .iter()
            .map(|name| FileItem::new(*name, format!("/apps/{name}"), Category::Application).into_ref())
            .collect()
    }

    fn dispatcher(
        names: &[&str],
        display_limit: usize,
    ) -> (Dispatcher<mpsc::Sender<UiMessage>>, mpsc::Receiver<UiMessage>) {
        let (sender, receiver) = mpsc::channel();
        let dispatcher = Dispatcher::new(
            pool(names),
            FrecencyStore::in_memory(),
            ActionRegistry::new(),
            sender,
            DispatcherOptions { display_limit },
        );
        (dispatcher, receiver)
    }

    fn drain(receiver: &mpsc::Receiver<UiMessage>, model: &mut ListModel) {
        while let Ok(message) = receiver.try_recv() {
            assert!(model.apply(message).is_none());
        }
    }

    #[test]
    fn search_selects_first_result() {
        let (mut dispatcher, receiver) = dispatcher(&["Alpha", "Beta"], 10);
        let mut model = ListModel::new();

        let _ = dispatcher.handle(Intent::Search("a".into()));
        drain(&receiver, &mut model);

        assert_eq!(model.results().len(), 2);
        assert_eq!(model.selected(), Some(0));
    }

    #[test]
    fn search_without_matches_leaves_selection_unset() {
        let (mut dispatcher, receiver) = dispatcher(&["Alpha"], 10);
        let mut model = ListModel::new();

        let _ = dispatcher.handle(Intent::Search("zzz".into()));
        let _ = dispatcher.handle(Intent::MoveSelection(Direction::Down));
        drain(&receiver, &mut model);

        assert!(model.results().is_empty());
        assert_eq!(model.selected(), None);
    }

    #[test]
    fn selection_stops_at_last_displayed_row() {
        let (mut dispatcher, receiver) = dispatcher(&["Ab", "Abc", "Abcd"], 10);
        let mut model = ListModel::new();

        let _ = dispatcher.handle(Intent::Search("ab".into()));
        for _ in 0..5 {
            let _ = dispatcher.handle(Intent::MoveSelection(Direction::Down));
        }
        drain(&receiver, &mut model);
        assert_eq!(model.selected(), Some(2));

        for _ in 0..5 {
            let _ = dispatcher.handle(Intent::MoveSelection(Direction::Up));
        }
        drain(&receiver, &mut model);
        assert_eq!(model.selected(), Some(0));
    }

    #[test]
    fn display_limit_bounds_posted_rows() {
        let (mut dispatcher, receiver) = dispatcher(&["a1", "a2", "a3", "a4"], 2);
        let mut model = ListModel::new();

        let _ = dispatcher.handle(Intent::Search("a".into()));
        let _ = dispatcher.handle(Intent::MoveSelection(Direction::Down));
        let _ = dispatcher.handle(Intent::MoveSelection(Direction::Down));
        drain(&receiver, &mut model);

        assert_eq!(model.results().len(), 2);
        assert_eq!(model.selected(), Some(1));
    }

    #[test]
    fn shutdown_breaks_the_loop() {
        let (mut dispatcher, receiver) = dispatcher(&[], 10);
        let flow = dispatcher.handle(Intent::Shutdown(Box::new(|| {})));
        assert!(flow.is_break());
        assert!(matches!(receiver.try_recv(), Ok(UiMessage::Shutdown(_))));
    }
}
