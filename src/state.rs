// Pure history state: the three containers and their transitions.
// No navigator or event wiring lives here, so every transition can be unit tested directly.

use crate::history::HistoryEntry;

/// Back stack, current page and forward stack of one session.
///
/// Both stacks are plain vectors with push/pop at the end:
/// `previous` keeps the oldest entry at index 0, `next` keeps the
/// entry that will be restored first at the end.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HistoryState {
    previous: Vec<HistoryEntry>,
    current: Option<HistoryEntry>,
    next: Vec<HistoryEntry>,
}

impl HistoryState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entries behind the current page, oldest first.
    pub fn previous(&self) -> &[HistoryEntry] {
        &self.previous
    }

    pub fn current(&self) -> Option<&HistoryEntry> {
        self.current.as_ref()
    }

    /// Entries ahead of the current page, in the order forward navigation restores them.
    pub fn next(&self) -> impl Iterator<Item = &HistoryEntry> + '_ {
        self.next.iter().rev()
    }

    pub fn can_go_backward(&self) -> bool {
        !self.previous.is_empty()
    }

    pub fn can_go_forward(&self) -> bool {
        !self.next.is_empty()
    }

    /// Drops both stacks and makes `home` the only entry.
    pub fn reset_to(&mut self, home: HistoryEntry) {
        self.previous.clear();
        self.next.clear();
        self.current = Some(home);
    }

    /// Records that the host now shows `uri`.
    ///
    /// Returns false when `uri` is already the current page. A URI found in the
    /// back stack is treated as an out-of-band backward jump: everything above it
    /// moves onto the forward stack.
    pub fn record_visit(&mut self, uri: &str, caption: &str) -> bool {
        if self.current.as_ref().is_some_and(|c| c.uri() == uri) {
            return false;
        }

        if self.next.last().is_some_and(|n| n.uri() == uri) {
            self.next.pop();
        } else {
            self.next.clear();
        }

        if let Some(current) = self.current.take() {
            if self.previous.iter().any(|p| p.uri() == uri) {
                self.next.push(current);
                while let Some(entry) = self.previous.pop() {
                    if entry.uri() == uri {
                        break;
                    }
                    self.next.push(entry);
                }
            } else {
                self.previous.push(current);
            }
        }

        self.current = Some(HistoryEntry::new(uri, caption));
        true
    }

    /// Moves one step back. Returns the new current entry, or `None` if the back stack is empty.
    pub fn step_backward(&mut self) -> Option<&HistoryEntry> {
        let entry = self.previous.pop()?;
        if let Some(current) = self.current.replace(entry) {
            self.next.push(current);
        }
        self.current.as_ref()
    }

    /// Moves one step forward. Returns the new current entry, or `None` if the forward stack is empty.
    pub fn step_forward(&mut self) -> Option<&HistoryEntry> {
        let entry = self.next.pop()?;
        if let Some(current) = self.current.replace(entry) {
            self.previous.push(current);
        }
        self.current.as_ref()
    }

    /// Walks either stack until `target` becomes current.
    ///
    /// Returns false without touching anything when `target` is already current
    /// or is not in either stack.
    pub fn jump_to(&mut self, target: &HistoryEntry) -> bool {
        if self.current.as_ref() == Some(target) {
            return false;
        }

        if self.next.contains(target) {
            while let Some(entry) = self.next.pop() {
                let reached = entry == *target;
                if let Some(current) = self.current.replace(entry) {
                    self.previous.push(current);
                }
                if reached {
                    break;
                }
            }
            true
        } else if self.previous.contains(target) {
            while let Some(entry) = self.previous.pop() {
                let reached = entry == *target;
                if let Some(current) = self.current.replace(entry) {
                    self.next.push(current);
                }
                if reached {
                    break;
                }
            }
            true
        } else {
            false
        }
    }
}
