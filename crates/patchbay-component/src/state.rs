//! Watchable state container.
//!
//! Each component owns exactly one [`StateCell`]: the only mutable
//! resource in its record. Handlers mutate it through [`swap`](StateCell::swap);
//! the change detector subscribes to it to schedule snapshot publication.
//!
//! Reads are always permitted concurrently. The runtime adds no implicit
//! lock across a component's two handler loops - components that mutate
//! state from both must serialize at the application level.

use parking_lot::{Mutex, RwLock};
use std::sync::Arc;

type Watcher = Box<dyn Fn() + Send + Sync>;

/// A mutable, watchable container for component state.
///
/// Cloning the cell clones the handle, not the state: all clones observe
/// the same value.
///
/// # Example
///
/// ```
/// use patchbay_component::StateCell;
///
/// let cell = StateCell::new(vec![1, 2]);
/// cell.swap(|v| v.push(3));
/// assert_eq!(cell.read(|v| v.len()), 3);
/// ```
#[derive(Debug)]
pub struct StateCell<S> {
    inner: Arc<CellInner<S>>,
}

struct CellInner<S> {
    state: RwLock<S>,
    watchers: Mutex<Vec<Watcher>>,
}

impl<S> std::fmt::Debug for CellInner<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CellInner")
            .field("watchers", &self.watchers.lock().len())
            .finish_non_exhaustive()
    }
}

impl<S> Clone for StateCell<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: Send + Sync + 'static> StateCell<S> {
    /// Creates a cell holding `state`.
    #[must_use]
    pub fn new(state: S) -> Self {
        Self {
            inner: Arc::new(CellInner {
                state: RwLock::new(state),
                watchers: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Reads the state through a closure, under a shared lock.
    pub fn read<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        f(&self.inner.state.read())
    }

    /// Returns a clone of the current state.
    #[must_use]
    pub fn get(&self) -> S
    where
        S: Clone,
    {
        self.inner.state.read().clone()
    }

    /// Mutates the state and notifies every watcher.
    ///
    /// The write lock is released before watchers run, so a watcher may
    /// read the cell without deadlocking. Watchers run on the caller's
    /// task and should be cheap - the change detector only raises a flag.
    pub fn swap(&self, f: impl FnOnce(&mut S)) {
        {
            let mut state = self.inner.state.write();
            f(&mut state);
        }
        for watcher in self.inner.watchers.lock().iter() {
            watcher();
        }
    }

    /// Registers a watcher invoked after every [`swap`](Self::swap).
    pub fn subscribe(&self, f: impl Fn() + Send + Sync + 'static) {
        self.inner.watchers.lock().push(Box::new(f));
    }
}
