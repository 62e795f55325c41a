use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::{Arc, PoisonError, TryLockError};
use std::time::{Duration, Instant};

use num::traits::WrappingAdd;

use crate::sync::{thread, Mutex, MutexGuard};
use crate::{Error, Result};

use super::Register;

/// An integer cell shared between execution units, backed by a [`Mutex`].
///
/// Every read-modify-write, such as [`apply`](SharedRegister::apply), holds
/// the lock for its whole span, so concurrent deltas are never lost. Arithmetic
/// wraps around on overflow.
///
/// Cloning a register produces another handle to the *same* cell. Hand a clone
/// to each execution unit that needs it; the cell is released once the last
/// handle is dropped.
///
/// A lock abandoned by a panicking holder is recovered rather than reported:
/// the register keeps whatever value the holder last stored.
///
/// # Examples
///
/// ```
/// use procsync::{unit, SharedRegister};
///
/// let counter: SharedRegister<i32> = SharedRegister::new(0);
///
/// let units: Vec<_> = (0..4)
///     .map(|i| {
///         let counter = counter.clone();
///         unit::spawn(format!("adder-{i}"), move || {
///             for _ in 0..100 {
///                 counter.apply(1);
///             }
///         })
///     })
///     .collect();
///
/// for unit in units {
///     unit.join().unwrap();
/// }
/// assert_eq!(counter.read(), 400);
/// ```
///
/// Overflow wraps around.
///
/// ```
/// use procsync::SharedRegister;
///
/// let register = SharedRegister::new(i32::MAX);
/// register.apply(1);
/// assert_eq!(register.read(), i32::MIN);
/// ```
pub struct SharedRegister<T = i32> {
    cell: Arc<Mutex<T>>,
}

impl<T: Copy + WrappingAdd> SharedRegister<T> {
    /// Creates a register containing `value`.
    pub fn new(value: T) -> Self {
        Self {
            cell: Arc::new(Mutex::new(value)),
        }
    }

    /// Adds `delta` to the contents of the register, blocking until the lock
    /// is available.
    pub fn apply(&self, delta: T) {
        let mut value = self.lock();
        *value = value.wrapping_add(&delta);
    }

    /// Adds `delta` to the contents of the register, giving up if the lock
    /// cannot be acquired within `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LockTimeout`] if the lock stayed held by another unit
    /// for the whole of `timeout`. The register is left untouched.
    pub fn apply_timeout(&self, delta: T, timeout: Duration) -> Result<()> {
        let mut value = self.try_lock_for(timeout)?;
        *value = value.wrapping_add(&delta);
        Ok(())
    }

    /// Acquires the lock of the register, blocking until it is available.
    ///
    /// The lock is held until the returned guard is dropped, which makes the
    /// guard suitable for compound updates spanning several reads and writes.
    ///
    /// # Examples
    ///
    /// ```
    /// use procsync::SharedRegister;
    ///
    /// let balance = SharedRegister::new(100);
    /// {
    ///     let mut balance = balance.lock();
    ///     if *balance >= 30 {
    ///         *balance -= 30;
    ///     }
    /// }
    /// assert_eq!(balance.read(), 70);
    /// ```
    pub fn lock(&self) -> RegisterGuard<'_, T> {
        RegisterGuard {
            guard: self.cell.lock().unwrap_or_else(PoisonError::into_inner),
        }
    }

    /// Attempts to acquire the lock of the register for at most `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LockTimeout`] if the lock could not be acquired in time.
    /// A `timeout` too large to be represented as a deadline waits without a
    /// bound, like [`lock`](SharedRegister::lock).
    pub fn try_lock_for(&self, timeout: Duration) -> Result<RegisterGuard<'_, T>> {
        let Some(deadline) = Instant::now().checked_add(timeout) else {
            return Ok(self.lock());
        };
        loop {
            match self.cell.try_lock() {
                Ok(guard) => return Ok(RegisterGuard { guard }),
                Err(TryLockError::Poisoned(poisoned)) => {
                    return Ok(RegisterGuard {
                        guard: poisoned.into_inner(),
                    })
                }
                Err(TryLockError::WouldBlock) => {
                    if Instant::now() >= deadline {
                        return Err(Error::LockTimeout(timeout));
                    }
                    thread::yield_now();
                }
            }
        }
    }
}

impl<T: Copy + WrappingAdd> Register for SharedRegister<T> {
    type Value = T;

    /// Returns the value currently contained in the register.
    ///
    /// The lock is only held for the duration of the load.
    fn read(&self) -> T {
        *self.lock()
    }

    /// Sets contents of the register to the specified value.
    fn write(&self, value: T) {
        *self.lock() = value;
    }
}

// Inherent shortcuts, so callers do not need the trait in scope.
impl<T: Copy + WrappingAdd> SharedRegister<T> {
    /// Returns the value currently contained in the register.
    pub fn read(&self) -> T {
        Register::read(self)
    }

    /// Sets contents of the register to the specified value.
    pub fn write(&self, value: T) {
        Register::write(self, value)
    }
}

impl<T> Clone for SharedRegister<T> {
    fn clone(&self) -> Self {
        Self {
            cell: Arc::clone(&self.cell),
        }
    }
}

impl<T: Copy + WrappingAdd + Default> Default for SharedRegister<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: fmt::Debug> fmt::Debug for SharedRegister<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut debug = f.debug_struct("SharedRegister");
        match self.cell.try_lock() {
            Ok(value) => debug.field("value", &*value),
            Err(TryLockError::Poisoned(poisoned)) => debug.field("value", &*poisoned.into_inner()),
            Err(TryLockError::WouldBlock) => debug.field("value", &format_args!("<locked>")),
        };
        debug.finish()
    }
}

/// Exclusive access to the contents of a [`SharedRegister`].
///
/// The lock is released when the guard is dropped, including during unwinding.
pub struct RegisterGuard<'a, T> {
    guard: MutexGuard<'a, T>,
}

impl<T> Deref for RegisterGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.guard
    }
}

impl<T> DerefMut for RegisterGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.guard
    }
}
