// Inbound side of the document registry: lifecycle events and the open set.

use tessel_core::{DocumentId, LayoutStore, Outcome, PaneId, Rejection};

use crate::Workbench;

/// Document lifecycle change reported by the registry.
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentEvent {
    /// A document was opened. `pane` defaults to the active pane.
    Opened {
        document: DocumentId,
        pane: Option<PaneId>,
        activate: bool,
    },
    Closed(DocumentId),
    /// The full set of open documents, e.g. after a bulk close.
    OpenSetChanged(Vec<DocumentId>),
}

/// Source of truth for which documents are open.
pub trait DocumentRegistry {
    fn open_documents(&self) -> Vec<DocumentId>;
}

impl DocumentRegistry for [DocumentId] {
    fn open_documents(&self) -> Vec<DocumentId> {
        self.to_vec()
    }
}

impl DocumentRegistry for Vec<DocumentId> {
    fn open_documents(&self) -> Vec<DocumentId> {
        self.clone()
    }
}

/// Applied if either step applied, otherwise the first rejection.
fn either(first: Outcome, second: Outcome) -> Outcome {
    if first.is_applied() || second.is_applied() {
        Outcome::Applied
    } else {
        first
    }
}

impl Workbench {
    pub fn handle_document_event(&mut self, event: DocumentEvent) -> Outcome {
        match event {
            DocumentEvent::Opened {
                document,
                pane,
                activate,
            } => self.apply(|layout| {
                let pane = pane.unwrap_or(layout.state().active_pane_id);
                let added = layout.add_document_to_pane(pane, document.clone());
                if added.rejection().is_some_and(|r| r != Rejection::NoChange) || !activate {
                    return added;
                }
                let focused = either(
                    layout.set_active_document(pane, &document),
                    layout.set_active_pane(pane),
                );
                either(added, focused)
            }),
            DocumentEvent::Closed(document) => self.remove_document(&document),
            DocumentEvent::OpenSetChanged(open) => self.reconcile_with_open_documents(&open),
        }
    }

    /// Drop every placement the registry no longer reports as open.
    pub fn reconcile_with<R: DocumentRegistry + ?Sized>(&mut self, registry: &R) -> Outcome {
        let open = registry.open_documents();
        self.reconcile_with_open_documents(&open)
    }
}
