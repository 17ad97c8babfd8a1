use std::fmt;

use serde::{Deserialize, Serialize};

// ──────────────────────────────────────────────
// Limits
// ──────────────────────────────────────────────

/// Maximum number of panes in the editor row.
pub const MAX_PANES: usize = 4;

/// Smallest width share a pane may be squeezed to.
pub const MIN_PROPORTION: f32 = 0.12;

/// Current version of the persisted layout schema.
pub const LAYOUT_SCHEMA_VERSION: u16 = 1;

// ──────────────────────────────────────────────
// Identity
// ──────────────────────────────────────────────

pub type PaneId = u64;

/// Opaque document identifier handed out by the document registry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DocumentId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for DocumentId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

// ──────────────────────────────────────────────
// Layout state
// ──────────────────────────────────────────────

/// A horizontal slot in the editor row holding an ordered tab strip.
#[derive(Debug, Clone, PartialEq)]
pub struct Pane {
    pub id: PaneId,
    pub document_ids: Vec<DocumentId>,
    pub active_document: Option<DocumentId>,
}

impl Pane {
    pub fn new(id: PaneId) -> Self {
        Self {
            id,
            document_ids: Vec::new(),
            active_document: None,
        }
    }

    pub fn with_document(id: PaneId, document: DocumentId) -> Self {
        Self {
            id,
            document_ids: vec![document.clone()],
            active_document: Some(document),
        }
    }

    pub fn contains(&self, document: &DocumentId) -> bool {
        self.document_ids.contains(document)
    }

    pub fn is_empty(&self) -> bool {
        self.document_ids.is_empty()
    }
}

/// The whole pane row: panes in visual order, the focused pane, and width shares.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutState {
    pub panes: Vec<Pane>,
    pub active_pane_id: PaneId,
    pub proportions: Vec<f32>,
}

impl LayoutState {
    /// One empty pane at full width.
    pub fn single(id: PaneId) -> Self {
        Self {
            panes: vec![Pane::new(id)],
            active_pane_id: id,
            proportions: vec![1.0],
        }
    }

    pub fn pane(&self, id: PaneId) -> Option<&Pane> {
        self.panes.iter().find(|p| p.id == id)
    }

    pub fn pane_index(&self, id: PaneId) -> Option<usize> {
        self.panes.iter().position(|p| p.id == id)
    }

    pub fn active_pane(&self) -> Option<&Pane> {
        self.pane(self.active_pane_id)
    }

    pub fn active_document(&self) -> Option<&DocumentId> {
        self.active_pane()?.active_document.as_ref()
    }
}

// ──────────────────────────────────────────────
// Mutation outcome
// ──────────────────────────────────────────────

/// Why a mutation left the layout untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    UnknownPane,
    UnknownDocument,
    IndexOutOfRange,
    NoActiveDocument,
    PaneLimitReached,
    LastPane,
    EmptySnapshot,
    UnsupportedVersion,
    InvalidDelta,
    NoChange,
}

/// Result of a layout mutation. A rejected call left the layout untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Applied,
    Rejected(Rejection),
}

impl Outcome {
    pub fn is_applied(self) -> bool {
        matches!(self, Outcome::Applied)
    }

    pub fn rejection(self) -> Option<Rejection> {
        match self {
            Outcome::Applied => None,
            Outcome::Rejected(reason) => Some(reason),
        }
    }
}

impl From<Rejection> for Outcome {
    fn from(reason: Rejection) -> Self {
        Outcome::Rejected(reason)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Left,
    Right,
}

// ──────────────────────────────────────────────
// Persisted snapshot schema
// ──────────────────────────────────────────────

/// Serialized form of one pane.
///
/// The aliases accept snapshots written before the schema was versioned,
/// when panes were called groups and documents were tabs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaneRecord {
    #[serde(default)]
    pub id: PaneId,
    #[serde(default, alias = "tabIds")]
    pub document_ids: Vec<DocumentId>,
    #[serde(default, alias = "activeTabId")]
    pub active_document_id: Option<DocumentId>,
}

/// Serialized layout. `version` 0 marks a legacy unversioned snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutSnapshot {
    #[serde(default)]
    pub version: u16,
    #[serde(default, alias = "groups")]
    pub panes: Vec<PaneRecord>,
    #[serde(default, alias = "activeGroupId")]
    pub active_pane_id: PaneId,
    #[serde(default)]
    pub proportions: Vec<f32>,
}

impl LayoutSnapshot {
    pub fn from_state(state: &LayoutState) -> Self {
        Self {
            version: LAYOUT_SCHEMA_VERSION,
            panes: state
                .panes
                .iter()
                .map(|p| PaneRecord {
                    id: p.id,
                    document_ids: p.document_ids.clone(),
                    active_document_id: p.active_document.clone(),
                })
                .collect(),
            active_pane_id: state.active_pane_id,
            proportions: state.proportions.clone(),
        }
    }
}

// ──────────────────────────────────────────────
// Trait: LayoutStore
// ──────────────────────────────────────────────

/// Owner of the pane row. Every mutator leaves the layout invariant-clean,
/// whether it applied or was rejected.
pub trait LayoutStore {
    fn state(&self) -> &LayoutState;
    fn snapshot(&self) -> LayoutSnapshot;
    fn init_single_group(&mut self);

    fn set_active_pane(&mut self, pane: PaneId) -> Outcome;
    fn set_active_document(&mut self, pane: PaneId, document: &DocumentId) -> Outcome;
    fn add_document_to_pane(&mut self, pane: PaneId, document: DocumentId) -> Outcome;
    fn remove_document(&mut self, document: &DocumentId) -> Outcome;
    fn reorder_within_pane(&mut self, pane: PaneId, from: usize, to: usize) -> Outcome;
    fn move_document_between_panes(
        &mut self,
        document: &DocumentId,
        source: PaneId,
        target: PaneId,
        target_index: Option<usize>,
    ) -> Outcome;
    fn split_right_from_active(&mut self) -> Outcome;
    fn close_pane(&mut self, pane: PaneId) -> Outcome;
    fn update_proportions(&mut self, pane_index: usize, delta: f32) -> Outcome;
    fn reconcile_with_open_documents(&mut self, open: &[DocumentId]) -> Outcome;
    fn hydrate(&mut self, snapshot: LayoutSnapshot) -> Outcome;

    fn active_pane(&self) -> Option<&Pane> {
        self.state().active_pane()
    }

    fn active_document(&self) -> Option<&DocumentId> {
        self.state().active_document()
    }
}
