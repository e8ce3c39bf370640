//! Lazily materialized objects
//!
//! A lazy object is a handle whose representation is produced by a factory
//! the first time any operation needs it. The factory runs at most once and
//! receives the handle itself, so the built object can refer back to its own
//! identity. Operations on the handle issued while the factory is running
//! fail with a `TypeError` instead of recursing. If the factory panics, the
//! object is poisoned and every later operation fails with a `TypeError`.

use std::thread;

use tracing::{debug, warn};

use crate::error::{JsError, JsResult};
use crate::runtime::object::{Object, Representation, busy};

type Factory = Box<dyn FnOnce(&Object) -> Representation>;

/// A deferred object definition
pub struct LazyObject {
    factory: Factory,
}

impl LazyObject {
    pub fn new(factory: impl FnOnce(&Object) -> Representation + 'static) -> Self {
        LazyObject {
            factory: Box::new(factory),
        }
    }

    fn create(self, shell: &Object) -> Representation {
        (self.factory)(shell)
    }
}

/// What an object handle currently holds
pub(crate) enum ShellState {
    Unmaterialized(LazyObject),
    /// The factory is running
    Materializing,
    Materialized(Representation),
    /// The factory panicked
    Poisoned,
}

fn poisoned() -> JsError {
    JsError::TypeError("object initializer panicked".to_string())
}

/// Marks the shell poisoned if the factory unwinds
struct PoisonOnUnwind<'a>(&'a Object);

impl Drop for PoisonOnUnwind<'_> {
    fn drop(&mut self) {
        if thread::panicking() {
            if let Ok(mut state) = self.0.0.state.try_borrow_mut() {
                warn!(object = ?self.0, "lazy object factory panicked");
                *state = ShellState::Poisoned;
            }
        }
    }
}

impl Object {
    /// Build the representation if it does not exist yet
    pub(crate) fn materialize(&self) -> JsResult<()> {
        match &*self.0.state.try_borrow().map_err(|_| busy())? {
            ShellState::Materialized(_) => return Ok(()),
            ShellState::Materializing => return Err(busy()),
            ShellState::Poisoned => return Err(poisoned()),
            ShellState::Unmaterialized(_) => {}
        }

        match self.0.state.replace(ShellState::Materializing) {
            ShellState::Unmaterialized(lazy) => {
                debug!(object = ?self, "materializing lazy object");
                let guard = PoisonOnUnwind(self);
                let repr = lazy.create(self);
                drop(guard);
                self.install(repr);
            }
            other => drop(self.0.state.replace(other)),
        }
        Ok(())
    }
}
