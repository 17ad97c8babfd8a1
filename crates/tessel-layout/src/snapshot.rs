// Snapshot sanitizer: turns whatever was persisted into a layout that
// satisfies every invariant, or refuses it outright.

use std::collections::HashSet;

use tessel_core::{
    LayoutSnapshot, LayoutState, Pane, PaneId, Rejection, LAYOUT_SCHEMA_VERSION, MAX_PANES,
};

use crate::repair;

pub(crate) struct Sanitized {
    pub state: LayoutState,
    /// Highest pane id in use; the allocator continues from here.
    pub last_id: PaneId,
}

/// Highest stored pane id accepted as is. Snapshots above it are renumbered
/// from 1 so the allocator keeps room to grow.
const ID_CEILING: PaneId = PaneId::MAX / 2;

/// Keep the stored ids, handing a fresh id above the highest one to every
/// pane whose id is 0 or already taken. None when fresh ids run out.
///
/// Id 0 is what a legacy record without an id deserializes to.
fn dedupe_ids(stored: &[PaneId]) -> Option<(Vec<PaneId>, PaneId)> {
    let mut last_id = stored.iter().copied().max().unwrap_or(0);
    let mut seen = HashSet::new();
    let mut ids = Vec::with_capacity(stored.len());
    for &id in stored {
        if id != 0 && seen.insert(id) {
            ids.push(id);
            continue;
        }
        last_id = last_id.checked_add(1)?;
        seen.insert(last_id);
        log::debug!("reassigned pane id {} to {}", id, last_id);
        ids.push(last_id);
    }
    Some((ids, last_id))
}

pub(crate) fn sanitize(snapshot: LayoutSnapshot) -> Result<Sanitized, Rejection> {
    if snapshot.version > LAYOUT_SCHEMA_VERSION {
        log::warn!(
            "layout snapshot version {} is newer than supported version {}",
            snapshot.version,
            LAYOUT_SCHEMA_VERSION
        );
        return Err(Rejection::UnsupportedVersion);
    }
    if snapshot.panes.is_empty() {
        return Err(Rejection::EmptySnapshot);
    }
    if snapshot.version == 0 {
        log::debug!("migrating unversioned layout snapshot");
    }

    let mut proportions = snapshot.proportions;
    let aligned = proportions.len() == snapshot.panes.len();

    let stored: Vec<PaneId> = snapshot.panes.iter().map(|p| p.id).collect();
    let mut active_pane_id = snapshot.active_pane_id;
    let (ids, last_id) = match dedupe_ids(&stored) {
        Some((ids, last_id)) if last_id <= ID_CEILING => (ids, last_id),
        _ => {
            log::warn!("layout snapshot pane ids exhaust the id space, renumbering");
            let ids: Vec<PaneId> = (1..).take(stored.len()).collect();
            active_pane_id = stored
                .iter()
                .position(|id| *id == snapshot.active_pane_id)
                .map_or(0, |i| ids[i]);
            let last_id = ids.len() as PaneId;
            (ids, last_id)
        }
    };

    let mut panes: Vec<Pane> = Vec::with_capacity(ids.len());
    for (record, id) in snapshot.panes.into_iter().zip(ids) {
        let mut pane = Pane::new(id);
        for doc in record.document_ids {
            repair::push_unique(&mut pane, doc);
        }
        pane.active_document = record.active_document_id;
        repair::ensure_active_document(&mut pane);
        panes.push(pane);
    }

    if panes.len() > MAX_PANES {
        log::warn!(
            "layout snapshot has {} panes, folding the overflow into pane {}",
            panes.len(),
            panes[MAX_PANES - 1].id
        );
        let overflow = panes.split_off(MAX_PANES);
        let last = &mut panes[MAX_PANES - 1];
        for pane in overflow {
            for doc in pane.document_ids {
                repair::push_unique(last, doc);
            }
        }
        repair::ensure_active_document(last);

        if aligned {
            let extra: f32 = proportions[MAX_PANES..].iter().sum();
            proportions.truncate(MAX_PANES);
            proportions[MAX_PANES - 1] += extra;
        }
    }

    let mut state = LayoutState {
        panes,
        active_pane_id,
        proportions,
    };
    repair::repair_shape(&mut state);

    Ok(Sanitized { state, last_id })
}
