// Host navigation contract - no UI framework imports allowed.
// The tracker only ever talks to the host through `Navigator`; `InMemoryNavigator`
// stands in for a real host in tests and in the demo binary.

use std::cell::RefCell;
use std::rc::Rc;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NavigationError {
    #[error("Navigation to {uri} was rejected: {reason}")]
    Rejected { uri: String, reason: String },
    #[error("Invalid URI: {0:?}")]
    InvalidUri(String),
}

/// What the hosting framework provides to the history tracker.
///
/// Methods take `&self`: a host may re-render synchronously inside
/// `navigate_to` and call back into the tracker from there.
pub trait Navigator {
    /// The location currently displayed.
    fn current_uri(&self) -> String;

    /// The application's root location; used for the Home entry.
    fn base_uri(&self) -> String;

    /// Changes the displayed location.
    fn navigate_to(&self, uri: &str) -> Result<(), NavigationError>;
}

type RenderHook = Rc<dyn Fn(&str)>;

/// A host that only remembers where it is.
///
/// Locations are stored verbatim; there is no resolution against the base URI.
pub struct InMemoryNavigator {
    base_uri: String,
    location: RefCell<String>,
    visits: RefCell<Vec<String>>,
    rejected: RefCell<Vec<String>>,
    render_hook: RefCell<Option<RenderHook>>,
}

impl InMemoryNavigator {
    pub fn new(base_uri: impl Into<String>) -> Self {
        let base_uri = base_uri.into();
        Self {
            location: RefCell::new(base_uri.clone()),
            base_uri,
            visits: RefCell::new(Vec::new()),
            rejected: RefCell::new(Vec::new()),
            render_hook: RefCell::new(None),
        }
    }

    /// Moves the host without going through `navigate_to`, like a link click or
    /// the browser's own back button.
    pub fn set_location(&self, uri: &str) {
        *self.location.borrow_mut() = uri.to_string();
    }

    /// Every URI passed to a successful `navigate_to`, oldest first.
    pub fn visits(&self) -> Vec<String> {
        self.visits.borrow().clone()
    }

    /// Makes later `navigate_to(uri)` calls fail.
    pub fn reject(&self, uri: &str) {
        self.rejected.borrow_mut().push(uri.to_string());
    }

    /// Runs `hook` after each successful `navigate_to`, standing in for the
    /// page render the host would trigger.
    pub fn set_render_hook(&self, hook: impl Fn(&str) + 'static) {
        *self.render_hook.borrow_mut() = Some(Rc::new(hook));
    }
}

impl Navigator for InMemoryNavigator {
    fn current_uri(&self) -> String {
        self.location.borrow().clone()
    }

    fn base_uri(&self) -> String {
        self.base_uri.clone()
    }

    fn navigate_to(&self, uri: &str) -> Result<(), NavigationError> {
        if uri.trim().is_empty() {
            return Err(NavigationError::InvalidUri(uri.to_string()));
        }
        if self.rejected.borrow().iter().any(|r| r == uri) {
            return Err(NavigationError::Rejected {
                uri: uri.to_string(),
                reason: "blocked by host".to_string(),
            });
        }

        self.set_location(uri);
        self.visits.borrow_mut().push(uri.to_string());

        let hook = self.render_hook.borrow().clone();
        if let Some(hook) = hook {
            hook(uri);
        }
        Ok(())
    }
}
