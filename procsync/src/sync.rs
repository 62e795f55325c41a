//! Swaps the blocking primitives for `shuttle`'s when model checking.
#[cfg(feature = "shuttle")]
pub(crate) use shuttle::sync::{
    atomic::{AtomicU64, Ordering},
    mpsc, Condvar, Mutex, MutexGuard,
};
#[cfg(feature = "shuttle")]
pub(crate) use shuttle::thread;
#[cfg(not(feature = "shuttle"))]
pub(crate) use std::sync::{
    atomic::{AtomicU64, Ordering},
    mpsc, Condvar, Mutex, MutexGuard,
};
#[cfg(not(feature = "shuttle"))]
pub(crate) use std::thread;
