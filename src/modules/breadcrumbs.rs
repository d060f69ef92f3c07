// Read-only view of a tracker, shaped for a breadcrumb bar.

use serde::{Deserialize, Serialize};

use crate::history::HistoryEntry;
use crate::state::HistoryState;

/// Payload handed to subscribers and emitted to the front end.
///
/// `previous` is oldest first, `next` is nearest first, so
/// `previous ++ [current] ++ next` reads left to right as the trail.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Breadcrumbs {
    pub previous: Vec<HistoryEntry>,
    pub current: Option<HistoryEntry>,
    pub next: Vec<HistoryEntry>,
    pub can_go_backward: bool,
    pub can_go_forward: bool,
}

impl Breadcrumbs {
    pub fn from_state(state: &HistoryState) -> Self {
        Self {
            previous: state.previous().to_vec(),
            current: state.current().cloned(),
            next: state.next().cloned().collect(),
            can_go_backward: state.can_go_backward(),
            can_go_forward: state.can_go_forward(),
        }
    }

    /// Every entry of the trail, left to right.
    pub fn trail(&self) -> impl Iterator<Item = &HistoryEntry> + '_ {
        self.previous
            .iter()
            .chain(self.current.iter())
            .chain(self.next.iter())
    }

    pub fn to_json(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}
