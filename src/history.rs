use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use serde::{Deserialize, Serialize};

use crate::modules::breadcrumbs::Breadcrumbs;
use crate::modules::events::{HistoryEvents, SubscriptionId};
use crate::modules::navigation::{NavigationError, Navigator};
use crate::settings::Settings;
use crate::state::HistoryState;

/// One visited page: where it lives and what the breadcrumb shows for it.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
pub struct HistoryEntry {
    uri: String,
    title: String,
}

impl HistoryEntry {
    pub fn new(uri: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            title: title.into(),
        }
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn title(&self) -> &str {
        &self.title
    }
}

/// Session-scoped breadcrumb history.
///
/// Cloning gives another handle to the same history. Every method takes `&self`
/// because the navigator is allowed to call back into the tracker (usually
/// [`add_current_page_to_history`](Self::add_current_page_to_history) from a
/// re-render) while a navigation started here is still running. No internal
/// borrow is held across a navigator or subscriber call.
#[derive(Clone)]
pub struct HistoryTracker {
    inner: Rc<TrackerInner>,
}

/// Non-owning handle, for navigators that need to reach the tracker that drives them.
#[derive(Clone)]
pub struct WeakHistoryTracker {
    inner: Weak<TrackerInner>,
}

struct TrackerInner {
    state: RefCell<HistoryState>,
    navigating: Cell<bool>,
    navigator: Rc<dyn Navigator>,
    events: HistoryEvents,
    home_title: String,
    home_uri: Option<String>,
}

/// Raises the navigating flag for the lifetime of a navigator call.
/// The previous value comes back on drop, including during unwinding.
struct NavigatingGuard<'a> {
    flag: &'a Cell<bool>,
    restore: bool,
}

impl<'a> NavigatingGuard<'a> {
    fn engage(flag: &'a Cell<bool>) -> Self {
        let restore = flag.replace(true);
        Self { flag, restore }
    }
}

impl Drop for NavigatingGuard<'_> {
    fn drop(&mut self) {
        self.flag.set(self.restore);
    }
}

impl HistoryTracker {
    pub fn new<N: Navigator + 'static>(navigator: Rc<N>) -> Self {
        Self::with_settings(navigator, &Settings::default())
    }

    pub fn with_settings<N: Navigator + 'static>(navigator: Rc<N>, settings: &Settings) -> Self {
        Self {
            inner: Rc::new(TrackerInner {
                state: RefCell::new(HistoryState::new()),
                navigating: Cell::new(false),
                navigator,
                events: HistoryEvents::new(),
                home_title: settings.home_title.clone(),
                home_uri: settings.base_uri.clone(),
            }),
        }
    }

    pub fn downgrade(&self) -> WeakHistoryTracker {
        WeakHistoryTracker {
            inner: Rc::downgrade(&self.inner),
        }
    }

    /// Forgets everything and starts over from the Home entry.
    pub fn clear(&self) {
        let home_uri = self
            .inner
            .home_uri
            .clone()
            .unwrap_or_else(|| self.inner.navigator.base_uri());
        let home = HistoryEntry::new(home_uri, self.inner.home_title.as_str());
        log::info!("[History] clear: reset to {} ({})", home.uri(), home.title());

        self.inner.state.borrow_mut().reset_to(home);
        self.notify();
    }

    /// Records the page the host is showing right now under `caption`.
    ///
    /// Meant to run after every page render. It does nothing while the tracker
    /// itself is navigating, or when the host still shows the current entry.
    pub fn add_current_page_to_history(&self, caption: &str) {
        if self.inner.navigating.get() {
            log::debug!("[History] add_current_page: navigation in progress, skipping '{}'", caption);
            return;
        }

        let uri = self.inner.navigator.current_uri();
        let changed = self.inner.state.borrow_mut().record_visit(&uri, caption);
        if changed {
            log::debug!("[History] add_current_page: {} ({})", uri, caption);
            self.notify();
        }
    }

    /// Returns to the most recent entry of the back stack.
    ///
    /// # Panics
    ///
    /// Panics when there is nothing to go back to; check
    /// [`can_go_backward`](Self::can_go_backward) first.
    pub fn go_backward(&self) -> Result<(), NavigationError> {
        let target = {
            let mut state = self.inner.state.borrow_mut();
            match state.step_backward() {
                Some(entry) => entry.uri().to_string(),
                None => panic!("go_backward called with an empty back stack; check can_go_backward() first"),
            }
        };
        log::debug!("[History] go_backward: {}", target);

        self.notify();
        self.navigate_guarded(&target)
    }

    /// Re-opens the entry most recently left by going backward.
    ///
    /// # Panics
    ///
    /// Panics when there is nothing to go forward to; check
    /// [`can_go_forward`](Self::can_go_forward) first.
    pub fn go_forward(&self) -> Result<(), NavigationError> {
        let target = {
            let mut state = self.inner.state.borrow_mut();
            match state.step_forward() {
                Some(entry) => entry.uri().to_string(),
                None => panic!("go_forward called with an empty forward stack; check can_go_forward() first"),
            }
        };
        log::debug!("[History] go_forward: {}", target);

        self.notify();
        self.navigate_guarded(&target)
    }

    /// Jumps straight to an entry taken from [`previous`](Self::previous) or [`next`](Self::next).
    ///
    /// Entries the tracker does not know about, and the current entry, are ignored.
    /// The resulting page render is not suppressed; it finds the URI already
    /// current and records nothing.
    pub fn jump_to(&self, entry: &HistoryEntry) -> Result<(), NavigationError> {
        let target = {
            let mut state = self.inner.state.borrow_mut();
            if !state.jump_to(entry) {
                log::debug!("[History] jump_to: {} is current or unknown, ignoring", entry.uri());
                return Ok(());
            }
            state.current().map(|c| c.uri().to_string())
        };

        self.notify();
        match target {
            Some(uri) => {
                log::info!("[History] jump_to: {}", uri);
                self.inner.navigator.navigate_to(&uri)
            }
            None => Ok(()),
        }
    }

    /// Entries behind the current page, oldest first.
    pub fn previous(&self) -> Vec<HistoryEntry> {
        self.inner.state.borrow().previous().to_vec()
    }

    pub fn current(&self) -> Option<HistoryEntry> {
        self.inner.state.borrow().current().cloned()
    }

    /// Entries ahead of the current page, nearest first.
    pub fn next(&self) -> Vec<HistoryEntry> {
        self.inner.state.borrow().next().cloned().collect()
    }

    pub fn can_go_backward(&self) -> bool {
        self.inner.state.borrow().can_go_backward()
    }

    pub fn can_go_forward(&self) -> bool {
        self.inner.state.borrow().can_go_forward()
    }

    /// True only while a back/forward navigation started by this tracker is running.
    pub fn is_navigating(&self) -> bool {
        self.inner.navigating.get()
    }

    pub fn breadcrumbs(&self) -> Breadcrumbs {
        Breadcrumbs::from_state(&self.inner.state.borrow())
    }

    /// Number of changes published so far.
    pub fn version(&self) -> u64 {
        self.inner.events.version()
    }

    /// Registers a callback that runs after every history change.
    pub fn subscribe(&self, callback: impl Fn(&Breadcrumbs) + 'static) -> SubscriptionId {
        self.inner.events.subscribe(callback)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.inner.events.unsubscribe(id)
    }

    fn notify(&self) {
        let snapshot = self.breadcrumbs();
        self.inner.events.emit(&snapshot);
    }

    fn navigate_guarded(&self, uri: &str) -> Result<(), NavigationError> {
        let _guard = NavigatingGuard::engage(&self.inner.navigating);
        self.inner.navigator.navigate_to(uri).map_err(|e| {
            log::warn!("[History] navigation to {} failed: {}", uri, e);
            e
        })
    }
}

impl WeakHistoryTracker {
    pub fn upgrade(&self) -> Option<HistoryTracker> {
        self.inner.upgrade().map(|inner| HistoryTracker { inner })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::navigation::InMemoryNavigator;
    use std::panic::{catch_unwind, AssertUnwindSafe};

    const BASE: &str = "https://admin.example.com/";

    fn tracker() -> (Rc<InMemoryNavigator>, HistoryTracker) {
        let navigator = Rc::new(InMemoryNavigator::new(BASE));
        let tracker = HistoryTracker::new(navigator.clone());
        (navigator, tracker)
    }

    fn visit(navigator: &InMemoryNavigator, tracker: &HistoryTracker, uri: &str, caption: &str) {
        navigator.set_location(uri);
        tracker.add_current_page_to_history(caption);
    }

    fn counter(tracker: &HistoryTracker) -> Rc<Cell<usize>> {
        let fired = Rc::new(Cell::new(0));
        let seen = fired.clone();
        tracker.subscribe(move |_| seen.set(seen.get() + 1));
        fired
    }

    #[test]
    fn test_clear_uses_base_uri_and_home_title() {
        let (_navigator, tracker) = tracker();
        let fired = counter(&tracker);

        tracker.clear();

        assert_eq!(tracker.current(), Some(HistoryEntry::new(BASE, "Home")));
        assert!(!tracker.can_go_backward());
        assert!(!tracker.can_go_forward());
        assert_eq!(fired.get(), 1);
    }

    #[test]
    fn test_clear_honours_settings() {
        let navigator = Rc::new(InMemoryNavigator::new(BASE));
        let settings = Settings {
            home_title: "Dashboard".to_string(),
            base_uri: Some("/admin".to_string()),
            ..Settings::default()
        };
        let tracker = HistoryTracker::with_settings(navigator, &settings);

        tracker.clear();

        assert_eq!(tracker.current(), Some(HistoryEntry::new("/admin", "Dashboard")));
    }

    #[test]
    fn test_configs_items_back_scenario() {
        let (navigator, tracker) = tracker();
        tracker.clear();
        visit(&navigator, &tracker, "/configs", "Configs");
        visit(&navigator, &tracker, "/items", "Items");

        tracker.go_backward().unwrap();

        assert_eq!(tracker.current().unwrap().uri(), "/configs");
        assert!(tracker.can_go_forward());
        assert_eq!(navigator.visits(), vec!["/configs".to_string()]);
        assert!(!tracker.is_navigating());
    }

    #[test]
    fn test_duplicate_render_fires_nothing() {
        let (navigator, tracker) = tracker();
        visit(&navigator, &tracker, "/configs", "Configs");
        let fired = counter(&tracker);
        let before = tracker.breadcrumbs();

        tracker.add_current_page_to_history("Configs");

        assert_eq!(tracker.breadcrumbs(), before);
        assert_eq!(fired.get(), 0);
    }

    #[test]
    fn test_back_then_forward_round_trip() {
        let (navigator, tracker) = tracker();
        tracker.clear();
        visit(&navigator, &tracker, "/a", "A");
        visit(&navigator, &tracker, "/b", "B");
        let before = tracker.breadcrumbs();

        tracker.go_backward().unwrap();
        tracker.go_forward().unwrap();

        assert_eq!(tracker.breadcrumbs(), before);
        assert_eq!(navigator.visits(), vec!["/a".to_string(), "/b".to_string()]);
    }

    #[test]
    fn test_jump_to_current_is_silent() {
        let (navigator, tracker) = tracker();
        visit(&navigator, &tracker, "/a", "A");
        visit(&navigator, &tracker, "/b", "B");
        let fired = counter(&tracker);

        tracker.jump_to(&HistoryEntry::new("/b", "B")).unwrap();

        assert_eq!(fired.get(), 0);
        assert!(navigator.visits().is_empty());
    }

    #[test]
    fn test_jump_to_notifies_then_navigates() {
        let (navigator, tracker) = tracker();
        tracker.clear();
        visit(&navigator, &tracker, "/a", "A");
        visit(&navigator, &tracker, "/b", "B");

        // The subscriber sees the new state before the host has moved.
        let seen_location = Rc::new(RefCell::new(String::new()));
        let nav = navigator.clone();
        let seen = seen_location.clone();
        tracker.subscribe(move |_| *seen.borrow_mut() = nav.current_uri());

        tracker.jump_to(&HistoryEntry::new(BASE, "Home")).unwrap();

        assert_eq!(seen_location.borrow().as_str(), "/b");
        assert_eq!(navigator.visits(), vec![BASE.to_string()]);
        assert_eq!(tracker.current().unwrap().title(), "Home");
        assert_eq!(tracker.next().len(), 2);

        // The render after the jump finds the page already current.
        tracker.add_current_page_to_history("Home again");
        assert_eq!(tracker.current().unwrap().title(), "Home");
    }

    #[test]
    fn test_reentrant_render_during_back_is_ignored() {
        let (navigator, tracker) = tracker();
        tracker.clear();
        visit(&navigator, &tracker, "/a", "A");
        visit(&navigator, &tracker, "/b", "B");

        let weak = tracker.downgrade();
        let flags = Rc::new(RefCell::new(Vec::new()));
        let recorded = flags.clone();
        navigator.set_render_hook(move |_| {
            if let Some(tracker) = weak.upgrade() {
                recorded.borrow_mut().push(tracker.is_navigating());
                tracker.add_current_page_to_history("Rendered");
            }
        });

        tracker.go_backward().unwrap();

        assert_eq!(*flags.borrow(), vec![true]);
        assert_eq!(tracker.current(), Some(HistoryEntry::new("/a", "A")));
        assert_eq!(tracker.previous().len(), 1);
        assert_eq!(tracker.next(), vec![HistoryEntry::new("/b", "B")]);
    }

    #[test]
    fn test_failed_navigation_resets_flag_and_keeps_state() {
        let (navigator, tracker) = tracker();
        visit(&navigator, &tracker, "/a", "A");
        visit(&navigator, &tracker, "/b", "B");
        navigator.reject("/a");

        let result = tracker.go_backward();

        assert!(matches!(result, Err(NavigationError::Rejected { .. })));
        assert!(!tracker.is_navigating());
        assert_eq!(tracker.current().unwrap().uri(), "/a");
    }

    #[test]
    fn test_failed_forward_resets_flag_and_keeps_state() {
        let (navigator, tracker) = tracker();
        visit(&navigator, &tracker, "/a", "A");
        visit(&navigator, &tracker, "/b", "B");
        tracker.go_backward().unwrap();
        navigator.reject("/b");

        let result = tracker.go_forward();

        assert_eq!(
            result,
            Err(NavigationError::Rejected {
                uri: "/b".to_string(),
                reason: "blocked by host".to_string(),
            })
        );
        assert!(!tracker.is_navigating());
        assert_eq!(tracker.current(), Some(HistoryEntry::new("/b", "B")));
        assert!(tracker.can_go_backward());
        assert!(!tracker.can_go_forward());
    }

    #[test]
    fn test_failed_jump_keeps_state_and_returns_error() {
        let (navigator, tracker) = tracker();
        visit(&navigator, &tracker, "/a", "A");
        visit(&navigator, &tracker, "/b", "B");
        visit(&navigator, &tracker, "/c", "C");
        let fired = counter(&tracker);
        navigator.reject("/a");

        let result = tracker.jump_to(&HistoryEntry::new("/a", "A"));

        assert_eq!(
            result,
            Err(NavigationError::Rejected {
                uri: "/a".to_string(),
                reason: "blocked by host".to_string(),
            })
        );
        assert_eq!(fired.get(), 1);
        assert_eq!(tracker.current(), Some(HistoryEntry::new("/a", "A")));
        assert!(tracker.previous().is_empty());
        assert_eq!(
            tracker.next(),
            vec![HistoryEntry::new("/b", "B"), HistoryEntry::new("/c", "C")]
        );
        assert!(navigator.visits().is_empty());
        assert!(!tracker.is_navigating());
    }

    #[test]
    fn test_reentrant_render_during_forward_is_ignored() {
        let (navigator, tracker) = tracker();
        visit(&navigator, &tracker, "/a", "A");
        visit(&navigator, &tracker, "/b", "B");
        tracker.go_backward().unwrap();

        let weak = tracker.downgrade();
        let flags = Rc::new(RefCell::new(Vec::new()));
        let recorded = flags.clone();
        navigator.set_render_hook(move |_| {
            if let Some(tracker) = weak.upgrade() {
                recorded.borrow_mut().push(tracker.is_navigating());
                tracker.add_current_page_to_history("Rendered");
            }
        });

        tracker.go_forward().unwrap();

        assert_eq!(*flags.borrow(), vec![true]);
        assert_eq!(tracker.current(), Some(HistoryEntry::new("/b", "B")));
        assert_eq!(tracker.previous(), vec![HistoryEntry::new("/a", "A")]);
        assert!(tracker.next().is_empty());
        assert!(!tracker.is_navigating());
    }

    #[test]
    fn test_panicking_navigator_resets_flag() {
        let (navigator, tracker) = tracker();
        visit(&navigator, &tracker, "/a", "A");
        visit(&navigator, &tracker, "/b", "B");
        navigator.set_render_hook(|_| panic!("host blew up"));

        let outcome = catch_unwind(AssertUnwindSafe(|| tracker.go_backward()));

        assert!(outcome.is_err());
        assert!(!tracker.is_navigating());
    }

    #[test]
    #[should_panic(expected = "empty back stack")]
    fn test_go_backward_without_history_panics() {
        let (_navigator, tracker) = tracker();
        tracker.clear();
        let _ = tracker.go_backward();
    }

    #[test]
    #[should_panic(expected = "empty forward stack")]
    fn test_go_forward_without_history_panics() {
        let (_navigator, tracker) = tracker();
        tracker.clear();
        let _ = tracker.go_forward();
    }

    #[test]
    fn test_unsubscribe_stops_notifications() {
        let (navigator, tracker) = tracker();
        let fired = Rc::new(Cell::new(0));
        let seen = fired.clone();
        let id = tracker.subscribe(move |_| seen.set(seen.get() + 1));

        visit(&navigator, &tracker, "/a", "A");
        assert!(tracker.unsubscribe(id));
        visit(&navigator, &tracker, "/b", "B");

        assert_eq!(fired.get(), 1);
        assert_eq!(tracker.version(), 2);
    }
}
