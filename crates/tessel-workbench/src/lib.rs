// Workbench: the pane layout wired to its observers and to persistence.
// Applied mutations are published to subscribers and queued for saving;
// rejected ones publish nothing.

mod registry;

pub use registry::{DocumentEvent, DocumentRegistry};

use tessel_core::{
    Direction, DocumentId, LayoutSnapshot, LayoutState, LayoutStore, Outcome, PaneId,
};
use tessel_layout::PaneLayout;
use tessel_persist::{LayoutSaver, PersistenceBridge};

pub type SubscriptionId = u64;

type Subscriber = Box<dyn FnMut(&LayoutState)>;

pub struct Workbench {
    layout: PaneLayout,
    subscribers: Vec<(SubscriptionId, Subscriber)>,
    next_subscription: SubscriptionId,
    saver: Option<LayoutSaver>,
}

impl Workbench {
    /// In-memory workbench with nothing persisted.
    pub fn new() -> Self {
        Self {
            layout: PaneLayout::new(),
            subscribers: Vec::new(),
            next_subscription: 1,
            saver: None,
        }
    }

    /// Workbench whose applied mutations are saved through `bridge` on a
    /// background thread. Runs unpersisted if the thread cannot start.
    pub fn with_persistence(bridge: PersistenceBridge) -> Self {
        let mut workbench = Self::new();
        match LayoutSaver::spawn(bridge) {
            Ok(saver) => workbench.saver = Some(saver),
            Err(e) => log::error!("Failed to start layout saver: {}", e),
        }
        workbench
    }

    pub fn layout(&self) -> &PaneLayout {
        &self.layout
    }

    pub fn state(&self) -> &LayoutState {
        self.layout.state()
    }

    pub fn snapshot(&self) -> LayoutSnapshot {
        self.layout.snapshot()
    }

    pub fn is_persistent(&self) -> bool {
        self.saver.is_some()
    }

    // ── Subscriptions ──

    /// Register `callback`. It runs right away with the current state and
    /// again after every applied mutation.
    pub fn subscribe(
        &mut self,
        mut callback: impl FnMut(&LayoutState) + 'static,
    ) -> SubscriptionId {
        let id = self.next_subscription;
        self.next_subscription += 1;
        callback(self.layout.state());
        self.subscribers.push((id, Box::new(callback)));
        id
    }

    /// Returns false if `id` was not subscribed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sid, _)| *sid != id);
        self.subscribers.len() != before
    }

    fn notify(&mut self) {
        let state = self.layout.state();
        for (_, callback) in &mut self.subscribers {
            callback(state);
        }
    }

    fn publish(&mut self) {
        self.notify();
        if let Some(saver) = &self.saver {
            saver.save(self.layout.snapshot());
        }
    }

    fn apply(&mut self, op: impl FnOnce(&mut PaneLayout) -> Outcome) -> Outcome {
        let outcome = op(&mut self.layout);
        if outcome.is_applied() {
            self.publish();
        }
        outcome
    }

    // ── Persistence ──

    /// Replace the layout with the stored one. Falls back to a single empty
    /// pane when nothing usable is stored. Returns whether a stored layout
    /// was restored.
    pub fn restore(&mut self) -> bool {
        let stored = self.saver.as_ref().and_then(|saver| saver.load());
        let restored = match stored {
            Some(snapshot) => match self.layout.hydrate(snapshot) {
                Outcome::Applied => true,
                Outcome::Rejected(reason) => {
                    log::warn!("Discarding stored editor layout: {:?}", reason);
                    false
                }
            },
            None => {
                log::debug!("No stored editor layout");
                false
            }
        };
        if !restored {
            self.layout.init_single_group();
        }
        self.notify();
        restored
    }

    /// Block until queued saves have been written.
    pub fn flush(&self) {
        if let Some(saver) = &self.saver {
            saver.flush();
        }
    }

    // ── Mutators ──

    pub fn init_single_group(&mut self) {
        self.layout.init_single_group();
        self.publish();
    }

    pub fn set_active_pane(&mut self, pane: PaneId) -> Outcome {
        self.apply(|layout| layout.set_active_pane(pane))
    }

    pub fn set_active_document(&mut self, pane: PaneId, document: &DocumentId) -> Outcome {
        self.apply(|layout| layout.set_active_document(pane, document))
    }

    pub fn add_document_to_pane(&mut self, pane: PaneId, document: DocumentId) -> Outcome {
        self.apply(|layout| layout.add_document_to_pane(pane, document))
    }

    pub fn remove_document(&mut self, document: &DocumentId) -> Outcome {
        self.apply(|layout| layout.remove_document(document))
    }

    pub fn reorder_within_pane(&mut self, pane: PaneId, from: usize, to: usize) -> Outcome {
        self.apply(|layout| layout.reorder_within_pane(pane, from, to))
    }

    pub fn move_document_between_panes(
        &mut self,
        document: &DocumentId,
        source: PaneId,
        target: PaneId,
        target_index: Option<usize>,
    ) -> Outcome {
        self.apply(|layout| {
            layout.move_document_between_panes(document, source, target, target_index)
        })
    }

    pub fn split_right_from_active(&mut self) -> Outcome {
        self.apply(|layout| layout.split_right_from_active())
    }

    pub fn close_pane(&mut self, pane: PaneId) -> Outcome {
        self.apply(|layout| layout.close_pane(pane))
    }

    pub fn update_proportions(&mut self, pane_index: usize, delta: f32) -> Outcome {
        self.apply(|layout| layout.update_proportions(pane_index, delta))
    }

    pub fn reconcile_with_open_documents(&mut self, open: &[DocumentId]) -> Outcome {
        self.apply(|layout| layout.reconcile_with_open_documents(open))
    }

    pub fn hydrate(&mut self, snapshot: LayoutSnapshot) -> Outcome {
        self.apply(|layout| layout.hydrate(snapshot))
    }

    pub fn focus_relative(&mut self, direction: Direction) -> Outcome {
        self.apply(|layout| layout.focus_relative(direction))
    }

    pub fn focus_pane_at(&mut self, index: usize) -> Outcome {
        self.apply(|layout| layout.focus_pane_at(index))
    }
}

impl Default for Workbench {
    fn default() -> Self {
        Self::new()
    }
}
