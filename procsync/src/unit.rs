//! Execution units.
//!
//! A unit runs a `'static` closure on its own thread of execution. Because
//! the closure cannot borrow from its surroundings, every primitive a unit
//! uses has to be moved into it explicitly, typically as a clone of a
//! handle created by the coordinating unit beforehand.
use std::any::Any;

use tracing::{debug, warn};

use crate::sync::thread;
use crate::{Error, Result};

/// A running execution unit that produces a `T`.
///
/// Dropping a `Unit` detaches it; call [`join`](Unit::join) to wait for it.
pub struct Unit<T> {
    name: String,
    handle: thread::JoinHandle<T>,
}

/// Starts a new execution unit running `f`.
///
/// # Examples
///
/// ```
/// use procsync::unit;
///
/// let units: Vec<_> = ["process1", "process2"]
///     .into_iter()
///     .map(|name| unit::spawn(name, move || (0..3).map(|i| format!("{name} Number: {i}")).count()))
///     .collect();
///
/// for unit in units {
///     assert_eq!(unit.join().unwrap(), 3);
/// }
/// ```
pub fn spawn<F, T>(name: impl Into<String>, f: F) -> Unit<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    let name = name.into();
    debug!(unit = %name, "spawning unit");
    Unit {
        name,
        handle: thread::spawn(f),
    }
}

impl<T> Unit<T> {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Waits for the unit to finish and returns what it produced.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnitPanicked`] if the unit panicked.
    pub fn join(self) -> Result<T> {
        match self.handle.join() {
            Ok(value) => {
                debug!(unit = %self.name, "joined unit");
                Ok(value)
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                warn!(unit = %self.name, %message, "unit panicked");
                Err(Error::UnitPanicked {
                    name: self.name,
                    message,
                })
            }
        }
    }
}

/// Extracts a readable message from a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_owned()
    }
}
