use std::collections::HashSet;

use tessel_core::{DocumentId, LayoutState, Pane, MAX_PANES, MIN_PROPORTION};

use crate::proportions;

// ──────────────────────────────────────────────
// Per-pane helpers
// ──────────────────────────────────────────────

/// Keep `active_document` pointing at a member of the pane, preferring the
/// current choice and otherwise the last tab.
pub(crate) fn ensure_active_document(pane: &mut Pane) {
    let valid = match &pane.active_document {
        Some(doc) => pane.document_ids.contains(doc),
        None => false,
    };
    if !valid {
        pane.active_document = pane.document_ids.last().cloned();
    }
}

/// Remove `document` from the pane. Returns true if it was present.
/// When the removed document was active, the last remaining one takes over.
pub(crate) fn remove_from_pane(pane: &mut Pane, document: &DocumentId) -> bool {
    let before = pane.document_ids.len();
    pane.document_ids.retain(|d| d != document);
    if pane.document_ids.len() == before {
        return false;
    }
    if pane.active_document.as_ref() == Some(document) {
        pane.active_document = pane.document_ids.last().cloned();
    }
    true
}

/// Append `document` unless the pane already holds it.
pub(crate) fn push_unique(pane: &mut Pane, document: DocumentId) {
    if !pane.contains(&document) {
        pane.document_ids.push(document);
    }
}

// ──────────────────────────────────────────────
// Shape repair
// ──────────────────────────────────────────────

/// Drop empty panes unless one would be left with nothing. When every pane is
/// empty the active one survives. Proportions follow their panes when the two
/// vectors line up; otherwise they are discarded and rebuilt as equal shares.
fn prune_empty_panes(state: &mut LayoutState) {
    if state.panes.len() <= 1 || !state.panes.iter().any(Pane::is_empty) {
        return;
    }

    let survivor = if state.panes.iter().all(Pane::is_empty) {
        Some(
            state
                .active_pane()
                .map(|p| p.id)
                .unwrap_or(state.panes[0].id),
        )
    } else {
        None
    };

    let aligned = state.proportions.len() == state.panes.len();
    let old_shares = std::mem::take(&mut state.proportions);
    let mut panes = Vec::with_capacity(state.panes.len());
    let mut shares = Vec::with_capacity(old_shares.len());

    for (i, pane) in std::mem::take(&mut state.panes).into_iter().enumerate() {
        if !pane.is_empty() || survivor == Some(pane.id) {
            if aligned {
                shares.push(old_shares[i]);
            }
            panes.push(pane);
        } else {
            log::debug!("pruning empty pane {}", pane.id);
        }
    }

    state.panes = panes;
    state.proportions = shares;
}

/// Restore every layout invariant after a structural change.
///
/// 1. prune empty panes unless sole survivor
/// 2. point the active pane at an existing pane (first one as fallback)
/// 3. fix each pane's active document
/// 4. renormalize proportions to the pane count
///
/// The caller guarantees `state.panes` is non-empty.
pub(crate) fn repair_shape(state: &mut LayoutState) {
    prune_empty_panes(state);

    if state.pane(state.active_pane_id).is_none() {
        if let Some(first) = state.panes.first() {
            state.active_pane_id = first.id;
        }
    }

    for pane in &mut state.panes {
        ensure_active_document(pane);
    }

    state.proportions = proportions::normalize(&state.proportions, state.panes.len());
}

// ──────────────────────────────────────────────
// Invariant check
// ──────────────────────────────────────────────

/// Tolerance for proportion sums and minimums.
pub const PROPORTION_EPSILON: f32 = 1e-4;

/// Verify every layout invariant, describing the first violation found.
pub fn check_invariants(state: &LayoutState) -> Result<(), String> {
    let count = state.panes.len();
    if count == 0 || count > MAX_PANES {
        return Err(format!("pane count {} outside [1, {}]", count, MAX_PANES));
    }
    if state.pane(state.active_pane_id).is_none() {
        return Err(format!("active pane {} does not exist", state.active_pane_id));
    }

    let mut ids = HashSet::new();
    for pane in &state.panes {
        if !ids.insert(pane.id) {
            return Err(format!("duplicate pane id {}", pane.id));
        }
        let mut docs = HashSet::new();
        for doc in &pane.document_ids {
            if !docs.insert(doc) {
                return Err(format!("pane {} holds {} twice", pane.id, doc));
            }
        }
        match &pane.active_document {
            None if !pane.is_empty() => {
                return Err(format!("pane {} has documents but none active", pane.id));
            }
            Some(doc) if !pane.contains(doc) => {
                return Err(format!("pane {} activates foreign document {}", pane.id, doc));
            }
            _ => {}
        }
        if pane.is_empty() && count > 1 {
            return Err(format!("empty pane {} next to {} others", pane.id, count - 1));
        }
    }

    if state.proportions.len() != count {
        return Err(format!(
            "{} proportions for {} panes",
            state.proportions.len(),
            count
        ));
    }
    if let Some(share) = state
        .proportions
        .iter()
        .find(|s| **s < MIN_PROPORTION - PROPORTION_EPSILON)
    {
        return Err(format!("proportion {} below minimum", share));
    }
    let sum: f32 = state.proportions.iter().sum();
    if (sum - 1.0).abs() > PROPORTION_EPSILON {
        return Err(format!("proportions sum to {}", sum));
    }

    Ok(())
}
