//! Plate navigation state machine.
//!
//! A [`NavigationEngine`] walks an operator through a sorted, non-empty
//! [`RequestStore`] one plate group at a time. The whole state is a cursor
//! into the store; every transition command moves the cursor, refreshes
//! the panel for the new group (clear, one well_on per member, update),
//! and returns a [`TransitionOutcome`] the presentation layer can render.
//!
//! The refresh is best-effort: a failed well frame does not abort the
//! remaining wells. Each frame's boolean folds into the outcome's
//! `panel_ok` flag, and the cursor is never disturbed by communication
//! failure.

use std::ops::Range;

use tracing::debug;

use crate::error::{PlatelightError, Result};
use crate::panel::PanelConnection;
use crate::protocol::{encode_brightness, encode_positional, Opcode};
use crate::request::{CompoundRequest, RequestStore};

/// Result of one plate transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionOutcome {
    /// Indices stepped over on the way out of the previous group, in
    /// visit order. The presentation layer marks these rows done.
    pub visited: Vec<usize>,
    /// Cursor position after the transition.
    pub cursor: usize,
    /// The contiguous run of requests forming the current plate group.
    pub group: Range<usize>,
    /// AND of every frame acknowledgement in the panel refresh.
    pub panel_ok: bool,
}

/// Result of a barcode search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    /// The cursor moved to the matching index (verbatim, no seek-back)
    /// and the panel was refreshed.
    Found {
        index: usize,
        transition: TransitionOutcome,
    },
    /// No request carries that plate barcode; the cursor is unchanged.
    NotFound,
}

/// Cursor over a sorted request store, driving one indicator panel.
pub struct NavigationEngine {
    store: RequestStore,
    panel: PanelConnection,
    cursor: usize,
}

impl NavigationEngine {
    /// Build an engine over a sorted store. An empty store is a
    /// construction error: every navigation operation assumes at least
    /// one request.
    pub fn new(store: RequestStore, panel: PanelConnection) -> Result<Self> {
        if store.is_empty() {
            return Err(PlatelightError::EmptyStore);
        }
        Ok(Self {
            store,
            panel,
            cursor: 0,
        })
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        // Construction rejects empty stores.
        self.store.is_empty()
    }

    pub fn store(&self) -> &RequestStore {
        &self.store
    }

    /// The request under the cursor.
    pub fn current_request(&self) -> &CompoundRequest {
        &self.store.as_slice()[self.cursor]
    }

    /// The contiguous run of requests sharing the cursor's plate.
    pub fn current_plate_group(&self) -> &[CompoundRequest] {
        let range = self.group_range();
        &self.store.as_slice()[range]
    }

    fn group_range(&self) -> Range<usize> {
        let requests = self.store.as_slice();
        let representative = &requests[self.cursor].location;
        let mut end = self.cursor + 1;
        while end < requests.len() && requests[end].location.same_plate(representative) {
            end += 1;
        }
        self.cursor..end
    }

    /// Walk forward out of the current plate group.
    ///
    /// Steps over every remaining member of the cursor's plate, reporting
    /// each index in `visited`, and stops on the first request of a
    /// different plate or at the end of the sequence (the cursor clamps
    /// at the last index).
    pub fn advance_plate(&mut self) -> TransitionOutcome {
        let requests = self.store.as_slice();
        let origin = requests[self.cursor].location.clone();
        let mut visited = Vec::new();
        while self.cursor < self.store.len() - 1
            && requests[self.cursor].location.same_plate(&origin)
        {
            visited.push(self.cursor);
            self.cursor += 1;
        }
        self.finish_transition(visited)
    }

    /// Move to the first member of the previous plate group.
    ///
    /// Decrements once (if possible), then seeks back to the start of
    /// whatever group the cursor landed in.
    pub fn retreat_plate(&mut self) -> TransitionOutcome {
        if self.cursor > 0 {
            self.cursor -= 1;
            self.seek_back_to_group_start();
        }
        self.finish_transition(Vec::new())
    }

    /// Jump to an index, normalized to the first member of its plate
    /// group. Out-of-range indices clamp to the last request.
    pub fn seek_to_index(&mut self, index: usize) -> TransitionOutcome {
        self.cursor = index.min(self.store.len() - 1);
        self.seek_back_to_group_start();
        self.finish_transition(Vec::new())
    }

    /// Linear scan for the first request whose plate barcode matches.
    ///
    /// On a hit the cursor lands on that index verbatim — deliberately
    /// without seek-back normalization, so a barcode matching a row in
    /// the middle of its group leaves the cursor mid-group. On a miss
    /// the cursor does not move.
    pub fn find_by_barcode(&mut self, barcode: &str) -> SearchOutcome {
        let found = self
            .store
            .iter()
            .position(|request| request.location.barcode.as_deref() == Some(barcode));
        match found {
            Some(index) => {
                self.cursor = index;
                SearchOutcome::Found {
                    index,
                    transition: self.finish_transition(Vec::new()),
                }
            }
            None => {
                debug!(barcode, "barcode not found, cursor unchanged");
                SearchOutcome::NotFound
            }
        }
    }

    /// Re-issue the panel refresh for the current group without moving.
    pub fn refresh(&mut self) -> TransitionOutcome {
        self.finish_transition(Vec::new())
    }

    /// Send a brightness level to the panel.
    pub fn set_brightness(&mut self, level: u8) -> bool {
        self.panel
            .send(encode_brightness(level, Opcode::SetBrightness))
    }

    /// Blank the panel, push the blank state, and release the transport.
    pub fn shutdown(self) {
        crate::panel::close_panels(vec![self.panel]);
    }

    fn seek_back_to_group_start(&mut self) {
        let requests = self.store.as_slice();
        while self.cursor > 0
            && requests[self.cursor - 1]
                .location
                .same_plate(&requests[self.cursor].location)
        {
            self.cursor -= 1;
        }
    }

    fn finish_transition(&mut self, visited: Vec<usize>) -> TransitionOutcome {
        let group = self.group_range();
        let panel_ok = self.refresh_panel(group.clone());
        debug!(
            cursor = self.cursor,
            group_start = group.start,
            group_len = group.len(),
            panel_ok,
            "plate transition"
        );
        TransitionOutcome {
            visited,
            cursor: self.cursor,
            group,
            panel_ok,
        }
    }

    /// Clear, light every well in the group, update. Best-effort: every
    /// frame is attempted regardless of earlier failures, and the AND of
    /// all acknowledgements is returned.
    fn refresh_panel(&mut self, group: Range<usize>) -> bool {
        let mut ok = self.panel.send(encode_positional('a', 1, Opcode::Clear));
        for index in group {
            let request = &self.store.as_slice()[index];
            let lit = match (request.location.row(), request.location.column_number()) {
                (Some(row), Some(column)) if column >= 1 => {
                    self.panel.send(encode_positional(row, column, Opcode::WellOn))
                }
                _ => {
                    debug!(
                        well = request.location.well.as_deref().unwrap_or("<none>"),
                        "well not addressable, skipping illumination"
                    );
                    false
                }
            };
            ok &= lit;
        }
        ok & self.panel.send(encode_positional('a', 1, Opcode::Update))
    }
}
