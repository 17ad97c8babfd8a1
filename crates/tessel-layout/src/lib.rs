// Pane state store: a single row of editor panes, each with its own tab strip.
// Implements tessel_core::LayoutStore.

mod proportions;
mod repair;
mod snapshot;

use std::collections::HashSet;

use tessel_core::{
    Direction, DocumentId, LayoutSnapshot, LayoutState, LayoutStore, Outcome, Pane, PaneId,
    Rejection, MAX_PANES,
};

pub use repair::{check_invariants, PROPORTION_EPSILON};

// ──────────────────────────────────────────────
// PaneLayout
// ──────────────────────────────────────────────

/// Id of the pane every fresh layout starts with.
const FIRST_PANE_ID: PaneId = 1;

pub struct PaneLayout {
    state: LayoutState,
    /// Last id handed out. Ids are never reused, even after a pane closes.
    last_id: PaneId,
}

impl PaneLayout {
    /// One empty pane at full width.
    pub fn new() -> Self {
        Self {
            state: LayoutState::single(FIRST_PANE_ID),
            last_id: FIRST_PANE_ID,
        }
    }

    /// Build a layout straight from a persisted snapshot.
    /// Returns None when the snapshot is rejected.
    pub fn from_snapshot(snapshot: LayoutSnapshot) -> Option<Self> {
        let mut layout = Self::new();
        layout.hydrate(snapshot).is_applied().then_some(layout)
    }

    /// Next unused pane id, or None once the id space is exhausted.
    pub fn alloc_id(&mut self) -> Option<PaneId> {
        let id = self.last_id.checked_add(1)?;
        self.last_id = id;
        Some(id)
    }

    pub fn pane(&self, id: PaneId) -> Option<&Pane> {
        self.state.pane(id)
    }

    pub fn pane_index(&self, id: PaneId) -> Option<usize> {
        self.state.pane_index(id)
    }

    pub fn pane_count(&self) -> usize {
        self.state.panes.len()
    }

    pub fn pane_ids(&self) -> Vec<PaneId> {
        self.state.panes.iter().map(|p| p.id).collect()
    }

    /// Every placed document once, in pane order then tab order.
    pub fn all_document_ids(&self) -> Vec<DocumentId> {
        let mut seen = HashSet::new();
        self.state
            .panes
            .iter()
            .flat_map(|p| p.document_ids.iter())
            .filter(|d| seen.insert(*d))
            .cloned()
            .collect()
    }

    /// Activate the pane next to the active one.
    pub fn focus_relative(&mut self, direction: Direction) -> Outcome {
        let index = match self.state.pane_index(self.state.active_pane_id) {
            Some(i) => i,
            None => return reject("focus_relative", Rejection::UnknownPane),
        };
        let target = match direction {
            Direction::Left => index.checked_sub(1),
            Direction::Right => Some(index + 1).filter(|i| *i < self.state.panes.len()),
        };
        match target {
            Some(i) => {
                let id = self.state.panes[i].id;
                self.set_active_pane(id)
            }
            None => reject("focus_relative", Rejection::IndexOutOfRange),
        }
    }

    /// Activate the pane at a visual position (0 = leftmost).
    pub fn focus_pane_at(&mut self, index: usize) -> Outcome {
        match self.state.panes.get(index) {
            Some(pane) => {
                let id = pane.id;
                self.set_active_pane(id)
            }
            None => reject("focus_pane_at", Rejection::IndexOutOfRange),
        }
    }

    fn pane_mut(&mut self, id: PaneId) -> Option<&mut Pane> {
        self.state.panes.iter_mut().find(|p| p.id == id)
    }

    /// Run the shape-repair pass and report success.
    fn commit(&mut self, op: &str) -> Outcome {
        repair::repair_shape(&mut self.state);
        debug_assert_eq!(check_invariants(&self.state), Ok(()));
        log::debug!(
            "{} applied: {} pane(s), active {}",
            op,
            self.state.panes.len(),
            self.state.active_pane_id
        );
        Outcome::Applied
    }
}

fn reject(op: &str, reason: Rejection) -> Outcome {
    log::debug!("{} rejected: {:?}", op, reason);
    Outcome::Rejected(reason)
}

impl Default for PaneLayout {
    fn default() -> Self {
        Self::new()
    }
}

impl LayoutStore for PaneLayout {
    fn state(&self) -> &LayoutState {
        &self.state
    }

    fn snapshot(&self) -> LayoutSnapshot {
        LayoutSnapshot::from_state(&self.state)
    }

    fn init_single_group(&mut self) {
        self.state = LayoutState::single(FIRST_PANE_ID);
        self.last_id = FIRST_PANE_ID;
    }

    fn set_active_pane(&mut self, pane: PaneId) -> Outcome {
        if self.state.pane(pane).is_none() {
            return reject("set_active_pane", Rejection::UnknownPane);
        }
        if self.state.active_pane_id == pane {
            return reject("set_active_pane", Rejection::NoChange);
        }
        self.state.active_pane_id = pane;
        self.commit("set_active_pane")
    }

    fn set_active_document(&mut self, pane: PaneId, document: &DocumentId) -> Outcome {
        let target = match self.pane_mut(pane) {
            Some(p) => p,
            None => return reject("set_active_document", Rejection::UnknownPane),
        };
        if !target.contains(document) {
            return reject("set_active_document", Rejection::UnknownDocument);
        }
        if target.active_document.as_ref() == Some(document) {
            return reject("set_active_document", Rejection::NoChange);
        }
        target.active_document = Some(document.clone());
        self.commit("set_active_document")
    }

    fn add_document_to_pane(&mut self, pane: PaneId, document: DocumentId) -> Outcome {
        let target = match self.pane_mut(pane) {
            Some(p) => p,
            None => return reject("add_document_to_pane", Rejection::UnknownPane),
        };
        if target.contains(&document) {
            return reject("add_document_to_pane", Rejection::NoChange);
        }
        if target.active_document.is_none() {
            target.active_document = Some(document.clone());
        }
        target.document_ids.push(document);
        self.commit("add_document_to_pane")
    }

    fn remove_document(&mut self, document: &DocumentId) -> Outcome {
        let mut touched = false;
        for pane in &mut self.state.panes {
            touched |= repair::remove_from_pane(pane, document);
        }
        if !touched {
            return reject("remove_document", Rejection::UnknownDocument);
        }
        self.commit("remove_document")
    }

    fn reorder_within_pane(&mut self, pane: PaneId, from: usize, to: usize) -> Outcome {
        let target = match self.pane_mut(pane) {
            Some(p) => p,
            None => return reject("reorder_within_pane", Rejection::UnknownPane),
        };
        let len = target.document_ids.len();
        if from >= len || to >= len {
            return reject("reorder_within_pane", Rejection::IndexOutOfRange);
        }
        if from == to {
            return reject("reorder_within_pane", Rejection::NoChange);
        }
        let moved = target.document_ids.remove(from);
        target.document_ids.insert(to, moved);
        self.commit("reorder_within_pane")
    }

    fn move_document_between_panes(
        &mut self,
        document: &DocumentId,
        source: PaneId,
        target: PaneId,
        target_index: Option<usize>,
    ) -> Outcome {
        const OP: &str = "move_document_between_panes";

        let (source_idx, target_idx) =
            match (self.state.pane_index(source), self.state.pane_index(target)) {
                (Some(s), Some(t)) => (s, t),
                _ => return reject(OP, Rejection::UnknownPane),
            };
        let from = match self.state.panes[source_idx]
            .document_ids
            .iter()
            .position(|d| d == document)
        {
            Some(i) => i,
            None => return reject(OP, Rejection::UnknownDocument),
        };

        if source_idx == target_idx {
            let pane = &mut self.state.panes[source_idx];
            let to = target_index
                .unwrap_or(pane.document_ids.len() - 1)
                .min(pane.document_ids.len() - 1);
            let unchanged = from == to
                && pane.active_document.as_ref() == Some(document)
                && self.state.active_pane_id == target;
            if unchanged {
                return reject(OP, Rejection::NoChange);
            }
            let moved = pane.document_ids.remove(from);
            pane.document_ids.insert(to, moved);
            pane.active_document = Some(document.clone());
            self.state.active_pane_id = target;
            return self.commit(OP);
        }

        repair::remove_from_pane(&mut self.state.panes[source_idx], document);

        let dest = &mut self.state.panes[target_idx];
        dest.document_ids.retain(|d| d != document);
        let at = target_index
            .unwrap_or(dest.document_ids.len())
            .min(dest.document_ids.len());
        dest.document_ids.insert(at, document.clone());
        dest.active_document = Some(document.clone());
        self.state.active_pane_id = target;

        self.commit(OP)
    }

    fn split_right_from_active(&mut self) -> Outcome {
        const OP: &str = "split_right_from_active";

        let index = match self.state.pane_index(self.state.active_pane_id) {
            Some(i) => i,
            None => return reject(OP, Rejection::UnknownPane),
        };
        let document = match &self.state.panes[index].active_document {
            Some(d) => d.clone(),
            None => return reject(OP, Rejection::NoActiveDocument),
        };
        if self.state.panes.len() >= MAX_PANES {
            return reject(OP, Rejection::PaneLimitReached);
        }

        let id = match self.alloc_id() {
            Some(id) => id,
            None => return reject(OP, Rejection::PaneLimitReached),
        };
        let shares = proportions::normalize(&self.state.proportions, self.state.panes.len());
        self.state.proportions = proportions::split(&shares, index);
        self.state
            .panes
            .insert(index + 1, Pane::with_document(id, document));
        self.state.active_pane_id = id;

        self.commit(OP)
    }

    fn close_pane(&mut self, pane: PaneId) -> Outcome {
        const OP: &str = "close_pane";

        let index = match self.state.pane_index(pane) {
            Some(i) => i,
            None => return reject(OP, Rejection::UnknownPane),
        };
        if self.state.panes.len() == 1 {
            return reject(OP, Rejection::LastPane);
        }

        // Left neighbour, or the right one when closing the leftmost pane.
        let neighbor = if index == 0 { 1 } else { index - 1 };
        let shares = proportions::normalize(&self.state.proportions, self.state.panes.len());
        self.state.proportions = proportions::merge(&shares, index, neighbor);

        let closing = self.state.panes.remove(index);
        let neighbor = if index == 0 { 0 } else { neighbor };
        let dest = &mut self.state.panes[neighbor];

        let prior_active = dest.active_document.take();
        for doc in closing.document_ids {
            repair::push_unique(dest, doc);
        }
        dest.active_document = closing
            .active_document
            .or(prior_active)
            .or_else(|| dest.document_ids.last().cloned());

        if self.state.active_pane_id == closing.id {
            self.state.active_pane_id = dest.id;
        }

        self.commit(OP)
    }

    fn update_proportions(&mut self, pane_index: usize, delta: f32) -> Outcome {
        let shares = proportions::normalize(&self.state.proportions, self.state.panes.len());
        match proportions::shift(&shares, pane_index, delta) {
            Ok(shares) => {
                self.state.proportions = shares;
                self.commit("update_proportions")
            }
            Err(reason) => reject("update_proportions", reason),
        }
    }

    fn reconcile_with_open_documents(&mut self, open: &[DocumentId]) -> Outcome {
        let open: HashSet<&DocumentId> = open.iter().collect();
        let mut removed = 0usize;
        for pane in &mut self.state.panes {
            let stale: Vec<DocumentId> = pane
                .document_ids
                .iter()
                .filter(|d| !open.contains(d))
                .cloned()
                .collect();
            for doc in &stale {
                repair::remove_from_pane(pane, doc);
            }
            removed += stale.len();
        }
        if removed == 0 {
            return reject("reconcile_with_open_documents", Rejection::NoChange);
        }
        log::debug!("reconciliation dropped {} stale placement(s)", removed);
        self.commit("reconcile_with_open_documents")
    }

    fn hydrate(&mut self, snapshot: LayoutSnapshot) -> Outcome {
        match snapshot::sanitize(snapshot) {
            Ok(sanitized) => {
                self.state = sanitized.state;
                self.last_id = sanitized.last_id;
                log::info!(
                    "restored editor layout with {} pane(s)",
                    self.state.panes.len()
                );
                Outcome::Applied
            }
            Err(reason) => reject("hydrate", reason),
        }
    }
}
